//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{Currency, MONEY_SCALE, floor_at_zero, round_money};
pub use pagination::{PageMeta, PageRequest, PageResponse};
