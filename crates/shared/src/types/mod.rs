//! Common types used across the application.

pub mod coins;
pub mod id;
pub mod pagination;

pub use coins::Coins;
pub use id::*;
pub use pagination::{PageMeta, PageRequest, PageResponse};
