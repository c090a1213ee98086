//! tabby-loader: loader front-end for TabbyAPI inference servers.
//!
//! Connects to a remote server, inspects the model/draft-model/LoRA
//! catalogs, issues load/unload commands with the full set of tuning
//! parameters, and saves/restores those parameters as named presets on
//! local disk.
//!
//! The server API is consumed, never implemented: all real inference
//! work happens remotely. What lives here is the session context, the
//! request validation, and the preset persistence.

pub mod api;
pub mod config;
pub mod preset;
pub mod session;
