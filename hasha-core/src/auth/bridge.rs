use std::sync::Arc;

use super::{AuthProvider, AuthUser, BearerToken, ConfirmOutcome, SignInStep, SignUpStep};
use crate::error::AuthError;

/// Snapshot of who is signed in and with which token.
///
/// Immutable: a new value comes out of every [`AuthBridge`] transition and
/// is handed to whatever needs it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthSession {
    user: Option<AuthUser>,
    id_token: Option<BearerToken>,
}

impl AuthSession {
    pub fn new(user: Option<AuthUser>, id_token: Option<BearerToken>) -> Self {
        Self { user, id_token }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    /// The id token, if one is present and non-empty.
    pub fn id_token(&self) -> Option<&BearerToken> {
        self.id_token.as_ref().filter(|t| !t.is_empty())
    }
}

/// Result of a sign-in attempt and the session it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInOutcome {
    pub step: SignInStep,
    /// Authenticated only when `step` is `Done`.
    pub session: AuthSession,
}

/// Gate between the views and the identity provider.
#[derive(Debug, Clone)]
pub struct AuthBridge {
    provider: Arc<dyn AuthProvider>,
}

impl AuthBridge {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Resolve the current session. Run once at startup, before anything
    /// protected is shown. Provider failures resolve to signed out.
    pub async fn resolve(&self) -> AuthSession {
        let user = self.check_current_user().await;
        let id_token = match user {
            Some(_) => self.current_token().await,
            None => None,
        };
        AuthSession::new(user, id_token)
    }

    pub async fn check_current_user(&self) -> Option<AuthUser> {
        match self.provider.current_user().await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(
                    provider = self.provider_name(),
                    error = %e,
                    "failed to get current user"
                );
                None
            }
        }
    }

    pub async fn current_token(&self) -> Option<BearerToken> {
        match self.provider.current_token().await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(
                    provider = self.provider_name(),
                    error = %e,
                    "failed to fetch auth session"
                );
                None
            }
        }
    }

    pub async fn sign_up(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<SignUpStep, AuthError> {
        let step = self
            .provider
            .sign_up(username, email, password)
            .await
            .inspect_err(|e| tracing::error!(username, error = %e, "sign up failed"))?;
        tracing::info!(username, next_step = step.as_str(), "user signed up");
        Ok(step)
    }

    pub async fn confirm_sign_up(
        &self,
        username: &str,
        code: &str,
    ) -> Result<ConfirmOutcome, AuthError> {
        let outcome = self
            .provider
            .confirm_sign_up(username, code)
            .await
            .inspect_err(|e| tracing::error!(username, error = %e, "sign up confirmation failed"))?;
        tracing::info!(
            username,
            complete = outcome.is_sign_up_complete,
            next_step = outcome.next_step.as_str(),
            "user confirmed"
        );
        Ok(outcome)
    }

    pub async fn auto_sign_in(&self) -> Result<SignInOutcome, AuthError> {
        let step = self
            .provider
            .auto_sign_in()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "auto sign in failed"))?;
        self.finish_sign_in(step).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, AuthError> {
        let step = self
            .provider
            .sign_in(email, password)
            .await
            .inspect_err(|e| tracing::error!(email, error = %e, "sign in failed"))?;
        self.finish_sign_in(step).await
    }

    async fn finish_sign_in(&self, step: SignInStep) -> Result<SignInOutcome, AuthError> {
        let session = if step.is_done() {
            self.resolve().await
        } else {
            AuthSession::signed_out()
        };
        tracing::info!(
            next_step = step.as_str(),
            signed_in = session.is_signed_in(),
            "sign in step"
        );
        Ok(SignInOutcome { step, session })
    }

    /// Sign out. Provider failures are logged and never block; the result is
    /// always the signed-out session, which callers use to drop cached data.
    pub async fn sign_out(&self, session: &AuthSession) -> AuthSession {
        let username = session.user().map(|u| u.username.as_str()).unwrap_or("");
        match self.provider.sign_out().await {
            Ok(()) => tracing::info!(username, "user signed out"),
            Err(e) => tracing::warn!(username, error = %e, "failed to sign out user"),
        }
        AuthSession::signed_out()
    }
}
