//! Kitchen display (KDS)
//!
//! The board is recomputed on every poll; clients poll on the interval the
//! HTTP layer advertises.

pub mod board;
pub mod service;

pub use service::{KitchenError, KitchenService};
