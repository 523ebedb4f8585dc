//! Stable backend construction surface for facade consumers.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::{BackendCredentialStore, BackendError, BackendId, ChatBackend};

#[derive(Debug, Clone)]
pub struct BackendBuildConfig {
    pub backend_id: BackendId,
    pub api_key: String,
    pub timeout: Duration,
}

impl BackendBuildConfig {
    pub fn new(backend_id: BackendId, api_key: impl Into<String>) -> Self {
        Self {
            backend_id,
            api_key: api_key.into(),
            timeout: Duration::from_secs(90),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub fn build_backend_from_api_key(
    backend_id: BackendId,
    api_key: impl Into<String>,
) -> Result<Arc<dyn ChatBackend>, BackendError> {
    build_backend_with_config(BackendBuildConfig::new(backend_id, api_key))
}

pub fn build_backend_with_config(
    config: BackendBuildConfig,
) -> Result<Arc<dyn ChatBackend>, BackendError> {
    let api_key = config.api_key.trim().to_string();
    if api_key.is_empty() {
        return Err(BackendError::authentication(
            "backend API key must not be empty",
        ));
    }

    let credentials = Arc::new(BackendCredentialStore::new());
    let http = Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|err| BackendError::unavailable(err.to_string()))?;

    match config.backend_id {
        BackendId::Anthropic => build_anthropic_backend(credentials, api_key, http),
        BackendId::OpenAi => build_openai_backend(credentials, api_key, http),
        BackendId::Gemini => build_gemini_backend(credentials, api_key, http),
    }
}

#[cfg(feature = "backend-anthropic")]
fn build_anthropic_backend(
    credentials: Arc<BackendCredentialStore>,
    api_key: String,
    http: Client,
) -> Result<Arc<dyn ChatBackend>, BackendError> {
    credentials.set_anthropic_api_key(api_key)?;
    Ok(Arc::new(
        mwprovider::adapters::anthropic::AnthropicBackend::new(credentials, http),
    ))
}

#[cfg(not(feature = "backend-anthropic"))]
fn build_anthropic_backend(
    _credentials: Arc<BackendCredentialStore>,
    _api_key: String,
    _http: Client,
) -> Result<Arc<dyn ChatBackend>, BackendError> {
    Err(BackendError::invalid_request(
        "backend-anthropic feature is not enabled on millwright",
    ))
}

#[cfg(feature = "backend-openai")]
fn build_openai_backend(
    credentials: Arc<BackendCredentialStore>,
    api_key: String,
    http: Client,
) -> Result<Arc<dyn ChatBackend>, BackendError> {
    credentials.set_openai_api_key(api_key)?;
    Ok(Arc::new(mwprovider::adapters::openai::OpenAiBackend::new(
        credentials,
        http,
    )))
}

#[cfg(not(feature = "backend-openai"))]
fn build_openai_backend(
    _credentials: Arc<BackendCredentialStore>,
    _api_key: String,
    _http: Client,
) -> Result<Arc<dyn ChatBackend>, BackendError> {
    Err(BackendError::invalid_request(
        "backend-openai feature is not enabled on millwright",
    ))
}

#[cfg(feature = "backend-gemini")]
fn build_gemini_backend(
    credentials: Arc<BackendCredentialStore>,
    api_key: String,
    http: Client,
) -> Result<Arc<dyn ChatBackend>, BackendError> {
    credentials.set_gemini_api_key(api_key)?;
    Ok(Arc::new(mwprovider::adapters::gemini::GeminiBackend::new(
        credentials,
        http,
    )))
}

#[cfg(not(feature = "backend-gemini"))]
fn build_gemini_backend(
    _credentials: Arc<BackendCredentialStore>,
    _api_key: String,
    _http: Client,
) -> Result<Arc<dyn ChatBackend>, BackendError> {
    Err(BackendError::invalid_request(
        "backend-gemini feature is not enabled on millwright",
    ))
}
