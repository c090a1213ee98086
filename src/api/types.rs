//! Wire types for the TabbyAPI admin endpoints.
//!
//! Response shapes are deliberately loose: every sub-field the server
//! might omit is an `Option`, so a sparse model card or an empty LoRA
//! list never fails to parse.

use serde::{Deserialize, Serialize};

use crate::preset::CacheMode;

// ─── Catalog Responses ─────────────────────────────────────────────────────

/// Response of the model/draft-model/LoRA list endpoints.
#[derive(Debug, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub data: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
}

impl CatalogResponse {
    /// Flatten into the bare id list the session keeps.
    pub fn into_ids(self) -> Vec<String> {
        self.data.into_iter().map(|e| e.id).collect()
    }
}

// ─── Current Status Responses ──────────────────────────────────────────────

/// Response of GET /v1/model. An unloaded slot reports no id.
#[derive(Debug, Deserialize)]
pub struct ModelCard {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub parameters: Option<ModelParams>,
}

/// Nested parameters of a loaded model. All optional.
#[derive(Debug, Default, Deserialize)]
pub struct ModelParams {
    #[serde(default)]
    pub max_seq_len: Option<u32>,
    #[serde(default)]
    pub rope_scale: Option<f32>,
    #[serde(default)]
    pub rope_alpha: Option<f32>,
    #[serde(default)]
    pub draft: Option<serde_json::Value>,
}

/// Response of GET /v1/lora.
#[derive(Debug, Deserialize)]
pub struct LoraCard {
    #[serde(default)]
    pub data: Vec<LoraCardEntry>,
}

#[derive(Debug, Deserialize)]
pub struct LoraCardEntry {
    pub id: String,
    #[serde(default)]
    pub scaling: Option<f32>,
}

// ─── Load Request Bodies ───────────────────────────────────────────────────

/// Body of POST /v1/model/load.
///
/// Unset tuning fields are sent as explicit nulls; only the draft
/// sub-object is omitted entirely when no draft model is requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRequest {
    pub name: String,
    pub max_seq_len: Option<u32>,
    pub override_base_seq_len: Option<u32>,
    pub gpu_split_auto: bool,
    pub gpu_split: Vec<f32>,
    pub rope_scale: Option<f32>,
    pub rope_alpha: Option<f32>,
    pub no_flash_attention: bool,
    pub cache_mode: Option<CacheMode>,
    pub prompt_template: Option<String>,
    pub num_experts_per_token: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub draft: Option<DraftLoadRequest>,
}

/// Draft-model sub-object for speculative decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftLoadRequest {
    pub draft_model_name: String,
    pub draft_rope_scale: Option<f32>,
    pub draft_rope_alpha: Option<f32>,
}

/// Body of POST /v1/lora/load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoraLoadRequest {
    pub loras: Vec<LoraLoadEntry>,
}

/// One adapter in a LoRA load batch. Order matters: the scaling was
/// paired to the name positionally by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraLoadEntry {
    pub name: String,
    pub scaling: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_request() -> LoadRequest {
        LoadRequest {
            name: "llama-70b".to_string(),
            max_seq_len: None,
            override_base_seq_len: None,
            gpu_split_auto: true,
            gpu_split: vec![],
            rope_scale: None,
            rope_alpha: None,
            no_flash_attention: false,
            cache_mode: None,
            prompt_template: None,
            num_experts_per_token: None,
            draft: None,
        }
    }

    #[test]
    fn test_absent_draft_is_omitted_not_null() {
        let json = serde_json::to_value(bare_request()).unwrap();
        assert!(json.get("draft").is_none());
        // Other unset fields stay present as nulls.
        assert!(json.get("max_seq_len").unwrap().is_null());
    }

    #[test]
    fn test_present_draft_serializes_nested() {
        let mut req = bare_request();
        req.draft = Some(DraftLoadRequest {
            draft_model_name: "tinyllama".to_string(),
            draft_rope_scale: Some(1.0),
            draft_rope_alpha: None,
        });
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json["draft"]["draft_model_name"],
            serde_json::json!("tinyllama")
        );
    }

    #[test]
    fn test_sparse_model_card_parses() {
        let card: ModelCard = serde_json::from_str("{}").unwrap();
        assert!(card.id.is_none());
        assert!(card.parameters.is_none());

        let card: ModelCard =
            serde_json::from_str(r#"{"id": "m", "parameters": {}}"#).unwrap();
        assert_eq!(card.id.as_deref(), Some("m"));
        assert!(card.parameters.unwrap().max_seq_len.is_none());
    }

    #[test]
    fn test_catalog_into_ids() {
        let catalog: CatalogResponse =
            serde_json::from_str(r#"{"data": [{"id": "a"}, {"id": "b"}]}"#).unwrap();
        assert_eq!(catalog.into_ids(), vec!["a", "b"]);
    }
}
