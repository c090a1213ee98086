//! Preset document format.
//!
//! A preset is a named snapshot of model-loading fields, stored as one
//! JSON file per preset. Missing keys always parse to defaults so that
//! documents written by older versions (or by hand) never fail to load.

use serde::{Deserialize, Serialize};

/// KV cache quantization mode offered by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheMode {
    #[serde(rename = "FP8")]
    Fp8,
    #[serde(rename = "FP16")]
    Fp16,
}

impl CacheMode {
    /// Wire string as the server expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fp8 => "FP8",
            Self::Fp16 => "FP16",
        }
    }
}

/// A saved model-loading configuration.
///
/// Every field defaults on deserialization, and absent optionals are
/// written back as explicit `null`s so a write/read round-trip returns
/// the document unchanged. The preset's identity is its file stem, not
/// a field of the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Model identifier to load.
    #[serde(default)]
    pub name: Option<String>,

    /// Maximum sequence length in tokens.
    #[serde(default)]
    pub max_seq_len: Option<u32>,

    /// Override for the base sequence length used in auto-ROPE scaling.
    #[serde(default)]
    pub override_base_seq_len: Option<u32>,

    /// Let the server pick the GPU split.
    #[serde(default)]
    pub gpu_split_auto: bool,

    /// Per-device memory allocation, in order.
    #[serde(default)]
    pub gpu_split: Option<Vec<f32>>,

    /// ROPE scale factor (>= 1).
    #[serde(default)]
    pub rope_scale: Option<f32>,

    /// ROPE alpha factor (>= 1).
    #[serde(default)]
    pub rope_alpha: Option<f32>,

    /// Disable flash attention.
    #[serde(default)]
    pub no_flash_attention: bool,

    /// KV cache quantization mode.
    #[serde(default)]
    pub cache_mode: Option<CacheMode>,

    /// Prompt template name.
    #[serde(default)]
    pub prompt_template: Option<String>,

    /// Experts per token (MoE models only).
    #[serde(default)]
    pub num_experts_per_token: Option<u32>,

    /// Draft model identifier for speculative decoding.
    #[serde(default)]
    pub draft_model_name: Option<String>,

    /// ROPE scale for the draft model.
    #[serde(default)]
    pub draft_rope_scale: Option<f32>,

    /// ROPE alpha for the draft model.
    #[serde(default)]
    pub draft_rope_alpha: Option<f32>,
}
