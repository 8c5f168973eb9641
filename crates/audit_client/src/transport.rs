use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use reqwest::Client;
use shared::protocol::StartAuditRequest;
use tracing::{info, warn};
use url::Url;

use crate::error::AuditError;

pub const START_AUDIT_PATH: &str = "qualiopi-audit/start";

pub type FragmentStream = BoxStream<'static, Result<Vec<u8>, AuditError>>;

/// Opens the server-pushed progress stream for one audit request.
#[async_trait]
pub trait AuditTransport: Send + Sync {
    async fn open_stream(&self, request: &StartAuditRequest)
        -> Result<FragmentStream, AuditError>;
}

pub struct MissingTransport;

#[async_trait]
impl AuditTransport for MissingTransport {
    async fn open_stream(
        &self,
        _request: &StartAuditRequest,
    ) -> Result<FragmentStream, AuditError> {
        Err(AuditError::Transport(
            "audit transport is unavailable".to_string(),
        ))
    }
}

pub struct HttpTransport {
    http: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(server_url: &str) -> Result<Self, AuditError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, AuditError> {
        Ok(Self {
            http,
            endpoint: start_endpoint(server_url)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl AuditTransport for HttpTransport {
    async fn open_stream(
        &self,
        request: &StartAuditRequest,
    ) -> Result<FragmentStream, AuditError> {
        info!(
            endpoint = %self.endpoint,
            chat_session_id = %request.chat_session_id,
            "audit: opening progress stream"
        );
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "audit: start request rejected");
            return Err(AuditError::RequestRejected {
                status: status.as_u16(),
                body,
            });
        }
        if response.content_length() == Some(0) {
            return Err(AuditError::StreamUnavailable);
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(AuditError::from))
            .boxed())
    }
}

/// Resolves the start endpoint below `server_url`, keeping any path prefix.
pub fn start_endpoint(server_url: &str) -> Result<Url, AuditError> {
    let invalid = |source| AuditError::InvalidServerUrl {
        url: server_url.to_string(),
        source,
    };
    let base = format!("{}/", server_url.trim().trim_end_matches('/'));
    let base = Url::parse(&base).map_err(invalid)?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(AuditError::UnsupportedScheme(base.scheme().to_string()));
    }
    base.join(START_AUDIT_PATH).map_err(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_path_prefix() {
        let url = start_endpoint("http://127.0.0.1:8080/api").expect("url");
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/qualiopi-audit/start");
        let url = start_endpoint("https://audit.example.fr/").expect("url");
        assert_eq!(url.as_str(), "https://audit.example.fr/qualiopi-audit/start");
    }

    #[test]
    fn endpoint_rejects_invalid_urls() {
        assert!(matches!(
            start_endpoint("not a url"),
            Err(AuditError::InvalidServerUrl { .. })
        ));
        assert!(matches!(
            start_endpoint("ftp://example.fr"),
            Err(AuditError::UnsupportedScheme(scheme)) if scheme == "ftp"
        ));
    }
}
