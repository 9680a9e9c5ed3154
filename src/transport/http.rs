use crate::tts::{ConnectionTarget, SpeakerDirectory, SynthesisRequest, SynthesisSettings};
use crate::{Error, Result};
use bytes::Bytes;
use reqwest::Proxy;
use std::env;
use std::time::Duration;
use tracing::{info, warn};

pub const SWITCH_MODEL_PATH: &str = "/switch_model";
pub const TTS_TO_AUDIO_PATH: &str = "/tts_to_audio/";
pub const SET_TTS_SETTINGS_PATH: &str = "/set_tts_settings";
pub const MODELS_LIST_PATH: &str = "/get_models_list";
pub const SPEAKERS_LIST_PATH: &str = "/speakers_list";

/// Thin wrapper over the XTTS API server endpoints.
///
/// Every call is a single request with no retries.
pub struct HttpTransport {
    client: reqwest::Client,
    target: ConnectionTarget,
    base_url: String,
}

impl HttpTransport {
    pub fn new(target: ConnectionTarget) -> Result<Self> {
        let base_url = target.base_url();
        url::Url::parse(&base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid server address {}: {}", target, e),
                crate::ErrorContext::new()
                    .with_field_path("host")
                    .with_source("transport"),
            )
        })?;

        // No timeout unless asked for; synthesis of long texts can take minutes.
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = env::var("XTTS_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if let Ok(proxy_url) = env::var("XTTS_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            target,
            base_url,
        })
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn switch_model(&self, model_name: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url(SWITCH_MODEL_PATH))
            .json(&serde_json::json!({ "model_name": model_name }))
            .send()
            .await
            .map_err(TransportError::Http)?;
        ensure_success(response, SWITCH_MODEL_PATH).await?;
        info!(model = model_name, server = %self.target, "Model switched");
        Ok(())
    }

    /// Request audio for `request`; the body is returned verbatim.
    pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes> {
        let response = self
            .client
            .post(self.url(TTS_TO_AUDIO_PATH))
            .json(request)
            .send()
            .await
            .map_err(TransportError::Http)?;
        let response = ensure_success(response, TTS_TO_AUDIO_PATH).await?;
        let audio = response.bytes().await.map_err(TransportError::Http)?;
        Ok(audio)
    }

    pub async fn apply_settings(&self, settings: &SynthesisSettings) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(self.url(SET_TTS_SETTINGS_PATH))
            .json(settings)
            .send()
            .await
            .map_err(TransportError::Http)?;
        let response = ensure_success(response, SET_TTS_SETTINGS_PATH).await?;
        let json = response.json().await.map_err(TransportError::Http)?;
        info!(server = %self.target, "TTS settings applied");
        Ok(json)
    }

    /// Model identifiers known to the server; empty on a non-200 status.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.url(MODELS_LIST_PATH))
            .send()
            .await
            .map_err(TransportError::Http)?;
        if response.status() != reqwest::StatusCode::OK {
            warn!(
                http_status = response.status().as_u16(),
                endpoint = MODELS_LIST_PATH,
                "model list unavailable"
            );
            return Ok(Vec::new());
        }
        let models = response.json().await.map_err(TransportError::Http)?;
        Ok(models)
    }

    /// Speakers per language; empty on a non-200 status.
    pub async fn list_speakers(&self) -> Result<SpeakerDirectory> {
        let response = self
            .client
            .get(self.url(SPEAKERS_LIST_PATH))
            .send()
            .await
            .map_err(TransportError::Http)?;
        if response.status() != reqwest::StatusCode::OK {
            warn!(
                http_status = response.status().as_u16(),
                endpoint = SPEAKERS_LIST_PATH,
                "speaker list unavailable"
            );
            return Ok(SpeakerDirectory::new());
        }
        let raw: serde_json::Value = response.json().await.map_err(TransportError::Http)?;
        Ok(SpeakerDirectory::from_server_json(&raw))
    }
}

async fn ensure_success(response: reqwest::Response, endpoint: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(
        http_status = status.as_u16(),
        endpoint = endpoint,
        "XTTS request failed"
    );
    Err(Error::Remote {
        status: status.as_u16(),
        endpoint: endpoint.to_string(),
        message: body,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
