//! Amazon Cognito user pool provider.
//!
//! Talks to the Cognito Identity Provider JSON API directly. Tokens from a
//! successful sign-in are written to a [`SessionFile`] so the next process can
//! resolve the session without signing in again.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::session_store::{SessionFile, StoredSession};
use super::{AuthProvider, AuthUser, BearerToken, ConfirmOutcome, SignInStep, SignUpStep};
use crate::error::AuthError;

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Credentials kept between sign-up and auto sign-in, in memory only.
#[derive(Clone)]
struct PendingSignIn {
    username: String,
    password: String,
}

impl std::fmt::Debug for PendingSignIn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSignIn")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct CognitoProvider {
    endpoint: String,
    client_id: String,
    client: reqwest::Client,
    sessions: SessionFile,
    pending: Mutex<Option<PendingSignIn>>,
}

impl CognitoProvider {
    pub fn new(region: &str, client_id: String, sessions: SessionFile) -> Self {
        Self {
            endpoint: format!("https://cognito-idp.{}.amazonaws.com/", region),
            client_id,
            client: reqwest::Client::new(),
            sessions,
            pending: Mutex::new(None),
        }
    }

    /// Point at a different endpoint (e.g. a local emulator).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Apply a request timeout to every identity call. None keeps reqwest's default.
    pub fn with_timeout(
        mut self,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self, AuthError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        self.client = builder
            .build()
            .map_err(|e| AuthError::NotConfigured(e.to_string()))?;
        Ok(self)
    }

    fn set_pending(&self, pending: Option<PendingSignIn>) {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = pending;
    }

    fn pending_username(&self) -> Option<String> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|p| p.username.clone())
    }

    async fn call<Req, Resp>(&self, action: &str, body: &Req) -> Result<Resp, CallError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body)
            .map_err(|e| AuthError::OperationFailed(e.to_string()))?;

        tracing::debug!(action, "cognito: request");
        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", CONTENT_TYPE)
            .header("x-amz-target", format!("{}.{}", TARGET_PREFIX, action))
            .body(payload)
            .send()
            .await
            .map_err(AuthError::from)?;

        let status = response.status();
        let body = response.text().await.map_err(AuthError::from)?;

        if !status.is_success() {
            let error = serde_json::from_str::<CognitoErrorResponse>(&body)
                .map(CognitoApiError::from)
                .unwrap_or_else(|_| CognitoApiError {
                    kind: format!("HTTP {}", status.as_u16()),
                    message: body,
                });
            tracing::debug!(action, kind = %error.kind, "cognito: error");
            return Err(CallError::Api(error));
        }

        serde_json::from_str(&body).map_err(|e| {
            CallError::Auth(AuthError::OperationFailed(format!("Invalid response: {e}")))
        })
    }

    async fn initiate_auth(
        &self,
        flow: &str,
        params: HashMap<&'static str, String>,
    ) -> Result<InitiateAuthResponse, CallError> {
        let request = InitiateAuthRequest {
            auth_flow: flow,
            client_id: &self.client_id,
            auth_parameters: params,
        };
        self.call("InitiateAuth", &request).await
    }

    async fn fetch_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let response: GetUserResponse = self
            .call("GetUser", &AccessTokenRequest { access_token })
            .await?;
        let user_id = response
            .user_attributes
            .iter()
            .find(|a| a.name == "sub")
            .map(|a| a.value.clone())
            .ok_or_else(|| AuthError::OperationFailed("User has no sub attribute".to_string()))?;
        Ok(AuthUser {
            user_id,
            username: response.username,
        })
    }

    async fn refresh(&self, stored: StoredSession) -> Result<Option<StoredSession>, AuthError> {
        let Some(refresh_token) = stored.refresh_token.clone() else {
            return Ok(None);
        };
        let mut params = HashMap::new();
        params.insert("REFRESH_TOKEN", refresh_token.as_str().to_string());
        let response = self.initiate_auth("REFRESH_TOKEN_AUTH", params).await?;
        let Some(result) = response.authentication_result else {
            return Ok(None);
        };
        let refreshed = StoredSession {
            id_token: BearerToken::new(result.id_token),
            access_token: BearerToken::new(result.access_token),
            // Cognito does not rotate refresh tokens on this flow.
            refresh_token: result
                .refresh_token
                .map(BearerToken::new)
                .or(Some(refresh_token)),
            expires_at: Some(Utc::now() + Duration::seconds(result.expires_in)),
            user: stored.user,
        };
        self.sessions.save(&refreshed)?;
        tracing::debug!("cognito: tokens refreshed");
        Ok(Some(refreshed))
    }
}

#[async_trait]
impl AuthProvider for CognitoProvider {
    async fn sign_up(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<SignUpStep, AuthError> {
        let request = SignUpRequest {
            client_id: &self.client_id,
            username,
            password,
            user_attributes: vec![AttributeType {
                name: "email".to_string(),
                value: email.to_string(),
            }],
        };
        let response: SignUpResponse = self.call("SignUp", &request).await?;

        self.set_pending(Some(PendingSignIn {
            username: username.to_string(),
            password: password.to_string(),
        }));

        if response.user_confirmed {
            return Ok(SignUpStep::CompleteAutoSignIn);
        }
        Ok(SignUpStep::ConfirmSignUp {
            destination: response.code_delivery_details.and_then(|d| d.destination),
        })
    }

    async fn confirm_sign_up(
        &self,
        username: &str,
        code: &str,
    ) -> Result<ConfirmOutcome, AuthError> {
        let request = ConfirmSignUpRequest {
            client_id: &self.client_id,
            username,
            confirmation_code: code,
        };
        let _: serde_json::Value = self.call("ConfirmSignUp", &request).await?;

        let next_step = if self.pending_username().as_deref() == Some(username) {
            SignUpStep::CompleteAutoSignIn
        } else {
            SignUpStep::Done
        };
        Ok(ConfirmOutcome {
            is_sign_up_complete: true,
            next_step,
        })
    }

    async fn auto_sign_in(&self) -> Result<SignInStep, AuthError> {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(AuthError::NoPendingSignIn)?;
        self.sign_in(&pending.username, &pending.password).await
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<SignInStep, AuthError> {
        let mut params = HashMap::new();
        params.insert("USERNAME", username.to_string());
        params.insert("PASSWORD", password.to_string());

        let response = match self.initiate_auth("USER_PASSWORD_AUTH", params).await {
            Ok(response) => response,
            Err(CallError::Api(e)) if e.kind == "UserNotConfirmedException" => {
                return Ok(SignInStep::ConfirmSignUp)
            }
            Err(CallError::Api(e)) if e.kind == "PasswordResetRequiredException" => {
                return Ok(SignInStep::ResetPassword)
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(challenge) = response.challenge_name {
            return Ok(match challenge.as_str() {
                "NEW_PASSWORD_REQUIRED" => SignInStep::NewPasswordRequired,
                _ => SignInStep::Challenge(challenge),
            });
        }

        let result = response.authentication_result.ok_or_else(|| {
            AuthError::OperationFailed("No authentication result returned".to_string())
        })?;
        let user = self.fetch_user(&result.access_token).await?;

        self.sessions.save(&StoredSession {
            user,
            id_token: BearerToken::new(result.id_token),
            access_token: BearerToken::new(result.access_token),
            refresh_token: result.refresh_token.map(BearerToken::new),
            expires_at: Some(Utc::now() + Duration::seconds(result.expires_in)),
        })?;
        Ok(SignInStep::Done)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let stored = self.sessions.load().ok().flatten();
        self.set_pending(None);

        let remote = match &stored {
            Some(session) => self
                .call::<_, serde_json::Value>(
                    "GlobalSignOut",
                    &AccessTokenRequest {
                        access_token: session.access_token.as_str(),
                    },
                )
                .await
                .map(|_| ())
                .map_err(AuthError::from),
            None => Ok(()),
        };

        // Local state goes regardless of what the provider said.
        self.sessions.clear()?;
        remote
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, AuthError> {
        Ok(self.sessions.load()?.map(|s| s.user))
    }

    async fn current_token(&self) -> Result<Option<BearerToken>, AuthError> {
        let Some(stored) = self.sessions.load()? else {
            return Ok(None);
        };
        if !stored.is_expired(Utc::now()) {
            return Ok(Some(stored.id_token));
        }
        Ok(self.refresh(stored).await?.map(|s| s.id_token))
    }

    fn provider_name(&self) -> &'static str {
        "cognito"
    }
}

/// Cognito error: exception name plus message.
#[derive(Debug)]
struct CognitoApiError {
    kind: String,
    message: String,
}

#[derive(Debug)]
enum CallError {
    Api(CognitoApiError),
    Auth(AuthError),
}

impl From<AuthError> for CallError {
    fn from(e: AuthError) -> Self {
        CallError::Auth(e)
    }
}

impl From<CallError> for AuthError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::Api(api) => AuthError::OperationFailed(api.message),
            CallError::Auth(auth) => auth,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CognitoErrorResponse {
    #[serde(rename = "__type")]
    kind: String,
    #[serde(default, alias = "Message")]
    message: String,
}

impl From<CognitoErrorResponse> for CognitoApiError {
    fn from(e: CognitoErrorResponse) -> Self {
        // "__type" is sometimes namespaced: "com.amazonaws...#NotAuthorizedException"
        let kind = e.kind.rsplit('#').next().unwrap_or_default().to_string();
        let message = if e.message.is_empty() {
            kind.clone()
        } else {
            e.message
        };
        CognitoApiError { kind, message }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeType {
    name: String,
    value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SignUpRequest<'a> {
    client_id: &'a str,
    username: &'a str,
    password: &'a str,
    user_attributes: Vec<AttributeType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SignUpResponse {
    #[serde(default)]
    user_confirmed: bool,
    #[serde(default)]
    code_delivery_details: Option<CodeDeliveryDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CodeDeliveryDetails {
    #[serde(default)]
    destination: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ConfirmSignUpRequest<'a> {
    client_id: &'a str,
    username: &'a str,
    confirmation_code: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthRequest<'a> {
    auth_flow: &'a str,
    client_id: &'a str,
    auth_parameters: HashMap<&'static str, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    #[serde(default)]
    authentication_result: Option<AuthenticationResult>,
    #[serde(default)]
    challenge_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    id_token: String,
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AccessTokenRequest<'a> {
    access_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetUserResponse {
    username: String,
    #[serde(default)]
    user_attributes: Vec<AttributeType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_strips_namespace() {
        let raw: CognitoErrorResponse = serde_json::from_str(
            r#"{"__type": "com.amazonaws.cognito#UserNotConfirmedException", "message": "User is not confirmed."}"#,
        )
        .unwrap();
        let error = CognitoApiError::from(raw);
        assert_eq!(error.kind, "UserNotConfirmedException");
        assert_eq!(error.message, "User is not confirmed.");
    }

    #[test]
    fn test_sign_up_request_shape() {
        let request = SignUpRequest {
            client_id: "client",
            username: "chef_anna",
            password: "password123",
            user_attributes: vec![AttributeType {
                name: "email".to_string(),
                value: "a@example.com".to_string(),
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["ClientId"], "client");
        assert_eq!(json["UserAttributes"][0]["Name"], "email");
    }

    #[test]
    fn test_initiate_auth_response_variants() {
        let done: InitiateAuthResponse = serde_json::from_str(
            r#"{"AuthenticationResult": {"IdToken": "i", "AccessToken": "a", "RefreshToken": "r", "ExpiresIn": 60}, "ChallengeParameters": {}}"#,
        )
        .unwrap();
        assert_eq!(done.authentication_result.unwrap().expires_in, 60);

        let challenge: InitiateAuthResponse =
            serde_json::from_str(r#"{"ChallengeName": "NEW_PASSWORD_REQUIRED", "Session": "s"}"#)
                .unwrap();
        assert_eq!(challenge.challenge_name.as_deref(), Some("NEW_PASSWORD_REQUIRED"));
        assert!(challenge.authentication_result.is_none());
    }

    #[tokio::test]
    async fn test_signed_out_without_session_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let provider = CognitoProvider::new(
            "us-east-1",
            "client".to_string(),
            SessionFile::new(dir.path().join("session.json")),
        );
        assert_eq!(provider.current_user().await.unwrap(), None);
        assert_eq!(provider.current_token().await.unwrap(), None);
        assert!(matches!(
            provider.auto_sign_in().await,
            Err(AuthError::NoPendingSignIn)
        ));
    }

    #[tokio::test]
    async fn test_unexpired_session_token_is_returned() {
        let dir = tempfile::TempDir::new().unwrap();
        let sessions = SessionFile::new(dir.path().join("session.json"));
        sessions
            .save(&StoredSession {
                user: AuthUser {
                    user_id: "sub-1".to_string(),
                    username: "chef_anna".to_string(),
                },
                id_token: BearerToken::new("id-token"),
                access_token: BearerToken::new("access-token"),
                refresh_token: None,
                expires_at: Some(Utc::now() + Duration::minutes(30)),
            })
            .unwrap();
        let provider = CognitoProvider::new("us-east-1", "client".to_string(), sessions);

        assert_eq!(
            provider.current_token().await.unwrap(),
            Some(BearerToken::new("id-token"))
        );
        assert_eq!(
            provider.current_user().await.unwrap().map(|u| u.username),
            Some("chef_anna".to_string())
        );
    }

    #[tokio::test]
    async fn test_expired_session_without_refresh_token() {
        let dir = tempfile::TempDir::new().unwrap();
        let sessions = SessionFile::new(dir.path().join("session.json"));
        sessions
            .save(&StoredSession {
                user: AuthUser {
                    user_id: "sub-1".to_string(),
                    username: "chef_anna".to_string(),
                },
                id_token: BearerToken::new("id-token"),
                access_token: BearerToken::new("access-token"),
                refresh_token: None,
                expires_at: Some(Utc::now() - Duration::minutes(1)),
            })
            .unwrap();
        let provider = CognitoProvider::new("us-east-1", "client".to_string(), sessions);
        assert_eq!(provider.current_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_timeout_applies_to_identity_calls() {
        // Accepted by the kernel backlog but never answered.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/", listener.local_addr().unwrap());
        let dir = tempfile::TempDir::new().unwrap();

        let provider = CognitoProvider::new(
            "us-east-1",
            "client".to_string(),
            SessionFile::new(dir.path().join("session.json")),
        )
        .with_endpoint(endpoint)
        .with_timeout(Some(std::time::Duration::from_millis(200)))
        .unwrap();

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            provider.sign_in("chef_anna", "password123"),
        )
        .await
        .expect("sign in should give up after the configured timeout");
        assert!(matches!(result, Err(AuthError::OperationFailed(_))));
        assert_eq!(provider.current_user().await.unwrap(), None);
        drop(listener);
    }
}
