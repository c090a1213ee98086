//! Runtime configuration for tabby-loader.
//!
//! Configuration can be loaded from a JSON file or constructed
//! programmatically; command-line flags override the file for the
//! connection settings.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "tabby-loader", about = "Loader front-end for TabbyAPI inference servers")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Server endpoint URL (overrides the config file).
    #[arg(long)]
    pub url: Option<String>,

    /// Admin API key (overrides the config file).
    #[arg(long)]
    pub admin_key: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the current model and LoRA status.
    Status,

    /// Load a model from a preset and/or inline field flags.
    Load {
        #[command(flatten)]
        fields: LoadFields,
    },

    /// Unload the current model.
    Unload,

    /// Load LoRA adapters with per-adapter scaling.
    LoadLoras {
        /// Adapter names, in order.
        #[arg(long = "lora", required = true)]
        loras: Vec<String>,

        /// Scaling per adapter, paired by position (defaults to 1.0 each).
        #[arg(long = "scaling")]
        scalings: Vec<String>,
    },

    /// Unload all LoRA adapters.
    UnloadLoras,

    /// List saved presets.
    Presets,

    /// Print a saved preset document.
    ShowPreset {
        /// Preset name.
        name: String,
    },

    /// Save the given field flags as a named preset.
    SavePreset {
        /// Preset name.
        name: String,

        #[command(flatten)]
        fields: LoadFields,
    },

    /// Delete a saved preset.
    DeletePreset {
        /// Preset name.
        name: String,
    },
}

/// Load-form field flags, shared by `load` and `save-preset`.
///
/// When `--preset` is given the form is hydrated from the stored
/// document first and the remaining flags override individual fields.
#[derive(Args, Debug, Default)]
pub struct LoadFields {
    /// Preset to hydrate the form from.
    #[arg(long)]
    pub preset: Option<String>,

    /// Model identifier to load.
    #[arg(long)]
    pub model: Option<String>,

    /// Maximum sequence length in tokens.
    #[arg(long)]
    pub max_seq_len: Option<u32>,

    /// Override base sequence length for auto-ROPE scaling.
    #[arg(long)]
    pub override_base_seq_len: Option<u32>,

    /// Comma-separated per-device GPU split (disables auto split).
    #[arg(long)]
    pub gpu_split: Option<String>,

    /// ROPE scale factor.
    #[arg(long)]
    pub rope_scale: Option<f32>,

    /// ROPE alpha factor.
    #[arg(long)]
    pub rope_alpha: Option<f32>,

    /// Disable flash attention.
    #[arg(long)]
    pub no_flash_attention: bool,

    /// KV cache quantization mode.
    #[arg(long, value_parser = ["FP8", "FP16"])]
    pub cache_mode: Option<String>,

    /// Prompt template name.
    #[arg(long)]
    pub prompt_template: Option<String>,

    /// Experts per token (MoE models only).
    #[arg(long)]
    pub num_experts_per_token: Option<u32>,

    /// Draft model for speculative decoding.
    #[arg(long)]
    pub draft_model: Option<String>,

    /// ROPE scale for the draft model.
    #[arg(long)]
    pub draft_rope_scale: Option<f32>,

    /// ROPE alpha for the draft model.
    #[arg(long)]
    pub draft_rope_alpha: Option<f32>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server endpoint URL.
    pub endpoint: String,

    /// Admin API key sent with every server call.
    pub admin_key: String,

    /// Directory holding preset files.
    pub preset_dir: PathBuf,

    /// Transport timeout in seconds for server calls.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000".to_string(),
            admin_key: String::new(),
            preset_dir: PathBuf::from("presets"),
            request_timeout_secs: 60,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults
    /// when the file is absent.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.endpoint, "http://127.0.0.1:5000");
        assert_eq!(cfg.preset_dir, PathBuf::from("presets"));
        assert_eq!(cfg.request_timeout_secs, 60);
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let cfg = Config::load(std::path::Path::new("/nonexistent/config.json")).unwrap();
        assert_eq!(cfg.endpoint, Config::default().endpoint);
    }
}
