//! Operator session: endpoint, credential, and server catalogs.
//!
//! The session is an explicitly owned context handed to every
//! operation, not process-wide state. Mutating operations take
//! `&mut self`, so two mutations can never be in flight at once for a
//! given session; callers that share a session across tasks wrap it in
//! a mutex and get the same serialization.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::api::client::{ApiClient, ApiError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Not connected: call connect before issuing server operations")]
    NotConnected,

    #[error("Connection failed: could not fetch server catalogs")]
    ConnectionFailed(#[source] ApiError),

    #[error("Server call failed: {0}")]
    Remote(#[from] ApiError),
}

/// The three id catalogs a connect fetches.
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    pub models: Vec<String>,
    pub draft_models: Vec<String>,
    pub loras: Vec<String>,
}

/// Display-ready summary of the currently loaded model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelStatus {
    pub id: String,
    pub max_seq_len: Option<u32>,
    pub rope_scale: Option<f32>,
    pub rope_alpha: Option<f32>,
    pub speculative_decoding: bool,
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (context: {}, rope scale: {}, rope alpha: {}, speculative decoding: {})",
            self.id,
            OptField(self.max_seq_len),
            OptField(self.rope_scale),
            OptField(self.rope_alpha),
            self.speculative_decoding
        )
    }
}

/// Display-ready summary of one loaded LoRA.
#[derive(Debug, Clone, PartialEq)]
pub struct LoraStatus {
    pub id: String,
    pub scaling: Option<f32>,
}

impl fmt::Display for LoraStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (scaling: {})", self.id, OptField(self.scaling))
    }
}

/// Renders `None` as "None" in status lines.
struct OptField<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for OptField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => v.fmt(f),
            None => f.write_str("None"),
        }
    }
}

/// One operator session against one TabbyAPI server.
pub struct Session {
    timeout: Duration,
    client: Option<ApiClient>,
    catalogs: Catalogs,
}

impl Session {
    /// Create an unconnected session. The timeout applies to every
    /// transport call made on behalf of this session.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            client: None,
            catalogs: Catalogs::default(),
        }
    }

    /// Whether a connect has succeeded.
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Endpoint of the connected server, if any.
    pub fn endpoint(&self) -> Option<&str> {
        self.client.as_ref().map(|c| c.base_url())
    }

    /// Catalogs fetched by the last successful connect.
    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    /// Client for the connected endpoint, or [`SessionError::NotConnected`].
    pub(crate) fn client(&self) -> Result<&ApiClient, SessionError> {
        self.client.as_ref().ok_or(SessionError::NotConnected)
    }

    /// Connect to a server and fetch all three catalogs.
    ///
    /// All-or-nothing: the three list calls run against a candidate
    /// client, and the session is only updated (endpoint, credential,
    /// catalogs together) once every call has succeeded. A failure
    /// leaves the previous connection fully intact.
    pub async fn connect(
        &mut self,
        endpoint: &str,
        admin_key: &str,
    ) -> Result<&Catalogs, SessionError> {
        let candidate = ApiClient::new(endpoint, admin_key, self.timeout)
            .map_err(SessionError::ConnectionFailed)?;

        let models = candidate
            .list_models()
            .await
            .map_err(SessionError::ConnectionFailed)?;
        let draft_models = candidate
            .list_draft_models()
            .await
            .map_err(SessionError::ConnectionFailed)?;
        let loras = candidate
            .list_loras()
            .await
            .map_err(SessionError::ConnectionFailed)?;

        info!(
            endpoint,
            models = models.len(),
            draft_models = draft_models.len(),
            loras = loras.len(),
            "Connected"
        );

        self.client = Some(candidate);
        self.catalogs = Catalogs {
            models,
            draft_models,
            loras,
        };
        Ok(&self.catalogs)
    }

    /// Summary of the currently loaded model, `None` when the slot is
    /// unloaded. Absent optional sub-fields never fail the query.
    pub async fn current_model(&self) -> Result<Option<ModelStatus>, SessionError> {
        let card = self.client()?.get_model().await?;

        let Some(id) = card.id.filter(|id| !id.is_empty()) else {
            return Ok(None);
        };

        let params = card.parameters.unwrap_or_default();
        Ok(Some(ModelStatus {
            id,
            max_seq_len: params.max_seq_len,
            rope_scale: params.rope_scale,
            rope_alpha: params.rope_alpha,
            speculative_decoding: params
                .draft
                .map(|d| !d.is_null())
                .unwrap_or(false),
        }))
    }

    /// Summaries of the currently loaded LoRAs; empty when none are.
    pub async fn current_loras(&self) -> Result<Vec<LoraStatus>, SessionError> {
        let card = self.client()?.get_loras().await?;
        Ok(card
            .data
            .into_iter()
            .map(|entry| LoraStatus {
                id: entry.id,
                scaling: entry.scaling,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconnected_session_has_no_client() {
        let session = Session::new(Duration::from_secs(5));
        assert!(!session.is_connected());
        assert!(matches!(session.client(), Err(SessionError::NotConnected)));
        assert!(session.catalogs().models.is_empty());
    }

    #[test]
    fn test_model_status_display() {
        let status = ModelStatus {
            id: "llama-70b".to_string(),
            max_seq_len: Some(4096),
            rope_scale: Some(1.0),
            rope_alpha: None,
            speculative_decoding: true,
        };
        assert_eq!(
            status.to_string(),
            "llama-70b (context: 4096, rope scale: 1, rope alpha: None, speculative decoding: true)"
        );
    }

    #[test]
    fn test_lora_status_display() {
        let status = LoraStatus {
            id: "style-lora".to_string(),
            scaling: Some(0.8),
        };
        assert_eq!(status.to_string(), "style-lora (scaling: 0.8)");
    }
}
