//! HTTP client for the TabbyAPI admin surface.
//!
//! One endpoint, one key, two credential roles: read-only calls send
//! the key as `x-api-key`, admin-mutating calls as `x-admin-key`. The
//! server distinguishes the roles by header name, so the split is kept
//! even though the value is the same.
//!
//! Raw transport failures never escape this module as anything but
//! [`ApiError`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::api::types::{
    CatalogResponse, LoadRequest, LoraCard, LoraLoadRequest, ModelCard,
};

/// Header carrying the key for read-only calls.
const READ_KEY_HEADER: &str = "x-api-key";

/// Header carrying the key for admin-mutating calls.
const ADMIN_KEY_HEADER: &str = "x-admin-key";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Credential role a call is made under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyRole {
    Read,
    Admin,
}

impl KeyRole {
    fn header(self) -> &'static str {
        match self {
            Self::Read => READ_KEY_HEADER,
            Self::Admin => ADMIN_KEY_HEADER,
        }
    }
}

/// Client bound to one server endpoint and one admin key.
pub struct ApiClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Build a client for the given endpoint.
    ///
    /// The timeout is the only place a time bound is imposed; callers
    /// above this boundary block until the transport gives up.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        })
    }

    /// Endpoint this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ─── Read Calls ────────────────────────────────────────────────────────

    /// GET /v1/model/list — available model ids.
    pub async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        let catalog: CatalogResponse = self.get("/v1/model/list", KeyRole::Read).await?;
        Ok(catalog.into_ids())
    }

    /// GET /v1/model/draft/list — available draft model ids.
    pub async fn list_draft_models(&self) -> Result<Vec<String>, ApiError> {
        let catalog: CatalogResponse =
            self.get("/v1/model/draft/list", KeyRole::Read).await?;
        Ok(catalog.into_ids())
    }

    /// GET /v1/lora/list — available LoRA ids.
    pub async fn list_loras(&self) -> Result<Vec<String>, ApiError> {
        let catalog: CatalogResponse = self.get("/v1/lora/list", KeyRole::Read).await?;
        Ok(catalog.into_ids())
    }

    /// GET /v1/model — card of the currently loaded model, if any.
    pub async fn get_model(&self) -> Result<ModelCard, ApiError> {
        self.get("/v1/model", KeyRole::Read).await
    }

    /// GET /v1/lora — currently loaded LoRAs.
    pub async fn get_loras(&self) -> Result<LoraCard, ApiError> {
        self.get("/v1/lora", KeyRole::Read).await
    }

    // ─── Admin Calls ───────────────────────────────────────────────────────

    /// POST /v1/model/load — load a model into the slot.
    pub async fn load_model(&self, request: &LoadRequest) -> Result<(), ApiError> {
        self.post("/v1/model/load", request).await
    }

    /// GET /v1/model/unload — unload the model slot.
    pub async fn unload_model(&self) -> Result<(), ApiError> {
        self.get_ok("/v1/model/unload", KeyRole::Admin).await
    }

    /// POST /v1/lora/load — load a batch of LoRAs.
    pub async fn load_loras(&self, request: &LoraLoadRequest) -> Result<(), ApiError> {
        self.post("/v1/lora/load", request).await
    }

    /// GET /v1/lora/unload — unload all LoRAs.
    pub async fn unload_loras(&self) -> Result<(), ApiError> {
        self.get_ok("/v1/lora/unload", KeyRole::Admin).await
    }

    // ─── Transport ─────────────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        role: KeyRole,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, role = role.header(), "GET");

        let response = self
            .http
            .get(&url)
            .header(role.header(), &self.api_key)
            .send()
            .await?;

        Self::decode(response).await
    }

    /// GET where only a success status matters; the body is discarded.
    async fn get_ok(&self, path: &str, role: KeyRole) -> Result<(), ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, role = role.header(), "GET");

        let response = self
            .http
            .get(&url)
            .header(role.header(), &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, role = ADMIN_KEY_HEADER, "POST");

        let response = self
            .http
            .post(&url)
            .header(ADMIN_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
