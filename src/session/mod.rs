//! Operator session and controller operations.
//!
//! - [`state`]: owned session context — connect, catalogs, current status
//! - [`controller`]: form validation and the two-step load/unload protocol

pub mod controller;
pub mod state;

pub use controller::{
    build_load_request, build_lora_load_list, FormError, LoadError, LoadForm,
    StatusSnapshot,
};
pub use state::{Catalogs, LoraStatus, ModelStatus, Session, SessionError};
