use shared::error::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("chat session id is required to start an audit")]
    MissingChatSessionId,
    #[error("onboarding data is required to start an audit")]
    MissingOnboardingData,
    #[error("invalid onboarding data: {0}")]
    InvalidOnboardingData(#[from] DomainError),
    #[error("an audit is already running")]
    AlreadyRunning,
    #[error("invalid server url '{url}': {source}")]
    InvalidServerUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("server url must use http or https, got '{0}'")]
    UnsupportedScheme(String),
    #[error("audit request failed: {status}")]
    RequestRejected { status: u16, body: String },
    #[error("audit response has no readable body")]
    StreamUnavailable,
    #[error("audit stream transport failed: {0}")]
    Transport(String),
    #[error("malformed audit record '{payload}': {source}")]
    MalformedRecord {
        payload: String,
        source: serde_json::Error,
    },
}

impl AuditError {
    /// Rejections raised before any session state is touched.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::MissingChatSessionId
                | Self::MissingOnboardingData
                | Self::InvalidOnboardingData(_)
                | Self::AlreadyRunning
        )
    }
}

impl From<reqwest::Error> for AuditError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}
