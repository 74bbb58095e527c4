//! Dining table allocation

pub mod allocator;

pub use allocator::AllocError;
