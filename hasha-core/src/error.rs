use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    #[error("No response configured for {method} {path}")]
    Unscripted { method: String, path: String },
}

/// Errors surfaced by the recipe data client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("User is not authenticated")]
    Unauthenticated,

    #[error("Recipe {0}")]
    RequestFailed(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid JSON: {0}")]
    Json(String),
}

impl ClientError {
    /// True for every failure that came back from (or on the way to) the API,
    /// as opposed to the missing-token precondition.
    pub fn is_request_failure(&self) -> bool {
        !matches!(self, ClientError::Unauthenticated)
    }
}

/// Errors from identity provider operations.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication failed: {0}")]
    OperationFailed(String),

    #[error("Auth provider not configured: {0}")]
    NotConfigured(String),

    #[error("No pending sign-up to complete")]
    NoPendingSignIn,

    #[error("Session storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        AuthError::OperationFailed(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },
}
