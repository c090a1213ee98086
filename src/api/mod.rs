//! TabbyAPI request/response layer.
//!
//! - [`types`]: wire request/response shapes
//! - [`client`]: the reqwest-backed HTTP client with credential roles

pub mod client;
pub mod types;

pub use client::{ApiClient, ApiError};
pub use types::{
    DraftLoadRequest, LoadRequest, LoraLoadEntry, LoraLoadRequest,
};
