//! Order lifecycle
//!
//! - [`OrderManager`]: create / read / status / payment / cancel
//! - [`aggregate`]: the unit of work a new order is persisted through
//! - [`status`]: state machine edges
//! - [`merge`], [`money`]: line merging and totals

pub mod aggregate;
pub mod error;
pub mod manager;
pub mod merge;
pub mod money;
pub mod status;

pub use aggregate::NewOrderAggregate;
pub use error::{OrderError, OrderResult};
pub use manager::OrderManager;
