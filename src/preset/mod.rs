//! Named preset persistence.
//!
//! - [`document`]: the preset JSON document format
//! - [`store`]: the one-file-per-preset directory store

pub mod document;
pub mod store;

pub use document::{CacheMode, Preset};
pub use store::{PresetError, PresetStore};
