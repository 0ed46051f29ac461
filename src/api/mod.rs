// src/api/mod.rs
// Wire types and error mapping for the HTTP layer

pub mod error;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use types::*;
