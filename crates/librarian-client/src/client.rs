use async_trait::async_trait;
use eyre::{Context, Result};
use reqwest::Url;
use tracing::{debug, instrument};

use crate::api::{ChatRequest, ChatResponse, HealthResponse};
use crate::error::ApiError;
use crate::settings::normalize_api_base;
use crate::tls::ensure_crypto_provider;

const CHAT_PATH: &str = "api/chat";
const HEALTH_PATH: &str = "api/health";

/// The two operations the UI needs from the backend.
///
/// [`ApiClient`] talks HTTP; tests substitute in-memory implementations.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Ask a question, resolving to the answer text
    async fn chat(&self, request: &ChatRequest) -> Result<String, ApiError>;

    /// Probe the backend, resolving to its `ok` flag
    async fn health(&self) -> Result<bool, ApiError>;
}

/// HTTP client for the backend at a fixed base URL.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    chat_url: Url,
    health_url: Url,
}

impl ApiClient {
    pub fn new(api_base: &str) -> Result<Self> {
        ensure_crypto_provider();

        let base = base_url(api_base)?;
        let chat_url = base
            .join(CHAT_PATH)
            .wrap_err("failed to build chat URL")?;
        let health_url = base
            .join(HEALTH_PATH)
            .wrap_err("failed to build health URL")?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("librarian/", env!("CARGO_PKG_VERSION")))
            .build()
            .wrap_err("failed to build HTTP client")?;

        Ok(Self {
            http,
            chat_url,
            health_url,
        })
    }

    pub fn chat_url(&self) -> &Url {
        &self.chat_url
    }

    pub fn health_url(&self) -> &Url {
        &self.health_url
    }
}

#[async_trait]
impl Backend for ApiClient {
    #[instrument(skip_all, fields(k = request.k))]
    async fn chat(&self, request: &ChatRequest) -> Result<String, ApiError> {
        debug!("sending chat request to {}", self.chat_url);

        let response = self
            .http
            .post(self.chat_url.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(%status, "chat request rejected");
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = serde_json::from_str(&body)?;
        Ok(reply.answer)
    }

    #[instrument(skip_all)]
    async fn health(&self) -> Result<bool, ApiError> {
        debug!("probing {}", self.health_url);

        let response = self.http.get(self.health_url.clone()).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let reply: HealthResponse = serde_json::from_str(&body)?;
        Ok(reply.ok)
    }
}

/// Parse the configured base into a URL that paths can be joined onto.
fn base_url(api_base: &str) -> Result<Url> {
    let with_slash = format!("{}/", normalize_api_base(api_base));
    Url::parse(&with_slash).wrap_err_with(|| format!("invalid backend URL: {api_base}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_endpoints_join_onto_base() {
        let client = ApiClient::new("http://localhost:8000").unwrap();
        assert_eq!(client.chat_url().as_str(), "http://localhost:8000/api/chat");
        assert_eq!(
            client.health_url().as_str(),
            "http://localhost:8000/api/health"
        );
    }

    #[test]
    fn test_trailing_slash_does_not_double() {
        let client = ApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.chat_url().as_str(), "http://localhost:8000/api/chat");
    }

    #[test]
    fn test_base_path_is_preserved() {
        let client = ApiClient::new("https://books.example.com/librarian").unwrap();
        assert_eq!(
            client.health_url().as_str(),
            "https://books.example.com/librarian/api/health"
        );
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
