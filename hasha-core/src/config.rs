//! Client configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default recipe API root.
pub const DEFAULT_API_URL: &str = "https://hasha.onrender.com";

/// Default Cognito region.
pub const DEFAULT_COGNITO_REGION: &str = "us-east-1";

#[derive(Debug, Clone)]
pub struct HashaConfig {
    /// Recipe API root (paths like `/recipes` are appended).
    pub api_url: String,
    pub cognito_region: String,
    /// App client id of the user pool. Without it only the fake provider is usable.
    pub cognito_client_id: Option<String>,
    /// Overrides the regional Cognito endpoint, e.g. for a local emulator.
    pub cognito_endpoint: Option<String>,
    /// Where the signed-in session is kept between runs.
    pub session_file: PathBuf,
    /// Request timeout. None leaves requests to the transport's defaults.
    pub http_timeout: Option<Duration>,
}

impl Default for HashaConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            cognito_region: DEFAULT_COGNITO_REGION.to_string(),
            cognito_client_id: None,
            cognito_endpoint: None,
            session_file: Self::default_session_file(),
            http_timeout: None,
        }
    }
}

impl HashaConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `HASHA_API_URL`: recipe API root (default: "https://hasha.onrender.com")
    /// - `HASHA_COGNITO_REGION`: user pool region (default: "us-east-1")
    /// - `HASHA_COGNITO_CLIENT_ID`: user pool app client id
    /// - `HASHA_COGNITO_ENDPOINT`: identity API URL (default: regional Cognito endpoint)
    /// - `HASHA_SESSION_FILE`: session path (default: "~/.hasha/session.json")
    /// - `HASHA_HTTP_TIMEOUT_SECS`: request timeout in seconds (default: none)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`HashaConfig::from_env`] but reading from any lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("HASHA_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.api_url);

        let cognito_region = lookup("HASHA_COGNITO_REGION")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.cognito_region);

        let cognito_client_id =
            lookup("HASHA_COGNITO_CLIENT_ID").filter(|v| !v.trim().is_empty());
        let cognito_endpoint =
            lookup("HASHA_COGNITO_ENDPOINT").filter(|v| !v.trim().is_empty());

        let session_file = lookup("HASHA_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.session_file);

        let http_timeout = match lookup("HASHA_HTTP_TIMEOUT_SECS") {
            Some(value) => {
                let secs: u64 = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    var: "HASHA_HTTP_TIMEOUT_SECS".to_string(),
                    value: value.clone(),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            api_url,
            cognito_region,
            cognito_client_id,
            cognito_endpoint,
            session_file,
            http_timeout,
        })
    }

    /// Get the default session file: ~/.hasha/session.json
    pub fn default_session_file() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".hasha").join("session.json"))
            .unwrap_or_else(|| PathBuf::from(".hasha/session.json"))
    }
}
