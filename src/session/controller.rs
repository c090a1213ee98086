//! Load-form validation and model/LoRA slot orchestration.
//!
//! Pure builders assemble and validate request bodies before any
//! network call happens; the slot operations on [`Session`] then drive
//! the server's two-step unload-then-load protocol. The server has no
//! atomic swap, so a load whose unload step succeeded but whose load
//! step failed leaves the slot unloaded and is reported as the distinct
//! [`LoadError::PartialLoadFailure`] outcome.

use thiserror::Error;
use tracing::info;

use crate::api::client::ApiError;
use crate::api::types::{DraftLoadRequest, LoadRequest, LoraLoadEntry, LoraLoadRequest};
use crate::preset::{CacheMode, Preset};
use crate::session::state::{LoraStatus, ModelStatus, Session, SessionError};

/// Refreshed model/LoRA status returned after every slot mutation.
pub type StatusSnapshot = (Option<ModelStatus>, Vec<LoraStatus>);

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Specify a model to load")]
    MissingModel,

    #[error("Invalid GPU split value: {0:?}")]
    InvalidGpuSplit(String),

    #[error("Specify at least one LoRA to load")]
    MissingLoras,

    #[error("Invalid LoRA scaling value: {0}")]
    InvalidScaling(String),
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Not connected: call connect before issuing server operations")]
    NotConnected,

    #[error("Partial load failure: the slot was unloaded but the load step failed")]
    PartialLoadFailure(#[source] ApiError),

    #[error("Server call failed: {0}")]
    Remote(ApiError),
}

impl From<SessionError> for LoadError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotConnected => Self::NotConnected,
            SessionError::ConnectionFailed(e) | SessionError::Remote(e) => Self::Remote(e),
        }
    }
}

/// Snapshot of the load-form fields as the operator filled them in.
///
/// `gpu_split` stays raw comma-separated text here; it is parsed only
/// when a request is built, so a half-typed split never corrupts state.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadForm {
    pub model_name: String,
    pub max_seq_len: Option<u32>,
    pub override_base_seq_len: Option<u32>,
    pub gpu_split_auto: bool,
    pub gpu_split: String,
    pub rope_scale: Option<f32>,
    pub rope_alpha: Option<f32>,
    pub no_flash_attention: bool,
    pub cache_mode: Option<CacheMode>,
    pub prompt_template: Option<String>,
    pub num_experts_per_token: Option<u32>,
    pub draft_model_name: String,
    pub draft_rope_scale: Option<f32>,
    pub draft_rope_alpha: Option<f32>,
}

impl Default for LoadForm {
    fn default() -> Self {
        // Form-level defaults; stored presets leave these unset.
        Self {
            model_name: String::new(),
            max_seq_len: None,
            override_base_seq_len: None,
            gpu_split_auto: true,
            gpu_split: String::new(),
            rope_scale: None,
            rope_alpha: None,
            no_flash_attention: false,
            cache_mode: Some(CacheMode::Fp16),
            prompt_template: None,
            num_experts_per_token: None,
            draft_model_name: String::new(),
            draft_rope_scale: None,
            draft_rope_alpha: None,
        }
    }
}

impl LoadForm {
    /// Hydrate the form from a stored preset.
    pub fn from_preset(preset: &Preset) -> Self {
        Self {
            model_name: preset.name.clone().unwrap_or_default(),
            max_seq_len: preset.max_seq_len,
            override_base_seq_len: preset.override_base_seq_len,
            gpu_split_auto: preset.gpu_split_auto,
            gpu_split: preset
                .gpu_split
                .as_ref()
                .map(|split| {
                    split
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                })
                .unwrap_or_default(),
            rope_scale: preset.rope_scale,
            rope_alpha: preset.rope_alpha,
            no_flash_attention: preset.no_flash_attention,
            cache_mode: preset.cache_mode,
            prompt_template: preset.prompt_template.clone(),
            num_experts_per_token: preset.num_experts_per_token,
            draft_model_name: preset.draft_model_name.clone().unwrap_or_default(),
            draft_rope_scale: preset.draft_rope_scale,
            draft_rope_alpha: preset.draft_rope_alpha,
        }
    }

    /// Snapshot the form into a preset document.
    ///
    /// Fails with [`FormError::InvalidGpuSplit`] rather than persisting
    /// an unparsable split.
    pub fn to_preset(&self) -> Result<Preset, FormError> {
        let split = parse_gpu_split(&self.gpu_split)?;
        Ok(Preset {
            name: non_empty(&self.model_name),
            max_seq_len: self.max_seq_len,
            override_base_seq_len: self.override_base_seq_len,
            gpu_split_auto: self.gpu_split_auto,
            gpu_split: if split.is_empty() { None } else { Some(split) },
            rope_scale: self.rope_scale,
            rope_alpha: self.rope_alpha,
            no_flash_attention: self.no_flash_attention,
            cache_mode: self.cache_mode,
            prompt_template: self.prompt_template.clone(),
            num_experts_per_token: self.num_experts_per_token,
            draft_model_name: non_empty(&self.draft_model_name),
            draft_rope_scale: self.draft_rope_scale,
            draft_rope_alpha: self.draft_rope_alpha,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse a comma-separated GPU split into an ordered float list.
///
/// Empty text means no split. Any non-numeric token aborts the whole
/// parse; no partial list is ever returned.
fn parse_gpu_split(text: &str) -> Result<Vec<f32>, FormError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(|token| {
            let token = token.trim();
            token
                .parse::<f32>()
                .map_err(|_| FormError::InvalidGpuSplit(token.to_string()))
        })
        .collect()
}

/// Validate the form and assemble a model load request.
///
/// All validation happens here, before any network call is issued. The
/// draft sub-object is built only when a draft model is named;
/// otherwise the request carries no draft field at all.
pub fn build_load_request(form: &LoadForm) -> Result<LoadRequest, FormError> {
    if form.model_name.is_empty() {
        return Err(FormError::MissingModel);
    }

    let gpu_split = parse_gpu_split(&form.gpu_split)?;

    let draft = if form.draft_model_name.is_empty() {
        None
    } else {
        Some(DraftLoadRequest {
            draft_model_name: form.draft_model_name.clone(),
            draft_rope_scale: form.draft_rope_scale,
            draft_rope_alpha: form.draft_rope_alpha,
        })
    };

    Ok(LoadRequest {
        name: form.model_name.clone(),
        max_seq_len: form.max_seq_len,
        override_base_seq_len: form.override_base_seq_len,
        gpu_split_auto: form.gpu_split_auto,
        gpu_split,
        rope_scale: form.rope_scale,
        rope_alpha: form.rope_alpha,
        no_flash_attention: form.no_flash_attention,
        cache_mode: form.cache_mode,
        prompt_template: form.prompt_template.clone(),
        num_experts_per_token: form.num_experts_per_token,
        draft,
    })
}

/// Pair selected LoRA names with their scaling values by position.
///
/// The whole batch aborts on the first missing or non-numeric scaling;
/// no partial list is ever returned.
pub fn build_lora_load_list(
    selected: &[String],
    scalings: &[String],
) -> Result<Vec<LoraLoadEntry>, FormError> {
    if selected.is_empty() {
        return Err(FormError::MissingLoras);
    }

    selected
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let raw = scalings.get(index).ok_or_else(|| {
                FormError::InvalidScaling(format!("no value for {name:?}"))
            })?;
            let scaling = raw
                .trim()
                .parse::<f32>()
                .map_err(|_| FormError::InvalidScaling(raw.clone()))?;
            Ok(LoraLoadEntry {
                name: name.clone(),
                scaling,
            })
        })
        .collect()
}

impl Session {
    /// Refreshed status snapshot after a slot mutation.
    async fn refresh(&self) -> Result<StatusSnapshot, SessionError> {
        Ok((self.current_model().await?, self.current_loras().await?))
    }

    /// Load a model: unload the slot, then load the requested model.
    ///
    /// A failed unload leaves the slot unchanged and surfaces as
    /// [`LoadError::Remote`]; a failed load after a successful unload
    /// leaves the slot empty and surfaces as
    /// [`LoadError::PartialLoadFailure`].
    pub async fn load_model(
        &mut self,
        request: &LoadRequest,
    ) -> Result<StatusSnapshot, LoadError> {
        let client = self.client()?;

        client.unload_model().await.map_err(LoadError::Remote)?;
        client
            .load_model(request)
            .await
            .map_err(LoadError::PartialLoadFailure)?;

        info!(model = %request.name, "Model loaded");
        Ok(self.refresh().await?)
    }

    /// Unload the model slot.
    pub async fn unload_model(&mut self) -> Result<StatusSnapshot, LoadError> {
        self.client()?
            .unload_model()
            .await
            .map_err(LoadError::Remote)?;

        info!("Model unloaded");
        Ok(self.refresh().await?)
    }

    /// Load a LoRA batch: unload all adapters, then load the batch.
    /// Same two-step discipline as [`Session::load_model`].
    pub async fn load_loras(
        &mut self,
        request: &LoraLoadRequest,
    ) -> Result<StatusSnapshot, LoadError> {
        let client = self.client()?;

        client.unload_loras().await.map_err(LoadError::Remote)?;
        client
            .load_loras(request)
            .await
            .map_err(LoadError::PartialLoadFailure)?;

        info!(loras = request.loras.len(), "LoRAs loaded");
        Ok(self.refresh().await?)
    }

    /// Unload all LoRAs.
    pub async fn unload_loras(&mut self) -> Result<StatusSnapshot, LoadError> {
        self.client()?
            .unload_loras()
            .await
            .map_err(LoadError::Remote)?;

        info!("All LoRAs unloaded");
        Ok(self.refresh().await?)
    }
}
