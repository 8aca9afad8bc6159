//! Identity provider abstraction and the auth context bridge.
//!
//! The hosted identity service sits behind [`AuthProvider`]. Views never talk
//! to a provider directly; they go through [`AuthBridge`], which turns each
//! operation into a fresh, immutable [`AuthSession`].

mod bridge;
mod cognito;
mod fake;
mod session_store;

pub use bridge::{AuthBridge, AuthSession, SignInOutcome};
pub use cognito::CognitoProvider;
pub use fake::FakeAuthProvider;
pub use session_store::{SessionFile, StoredSession};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AuthError;

/// Opaque bearer credential. Never printed in full.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "BearerToken(<empty>)")
        } else {
            write!(f, "BearerToken(***)")
        }
    }
}

/// Signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Provider subject id; the recipe API keys rows by it.
    pub user_id: String,
    pub username: String,
}

/// What the sign-up flow needs next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpStep {
    /// A code was sent; `destination` is the masked address when known.
    ConfirmSignUp { destination: Option<String> },
    /// Confirmed; call `auto_sign_in` to finish.
    CompleteAutoSignIn,
    Done,
}

impl SignUpStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignUpStep::ConfirmSignUp { .. } => "CONFIRM_SIGN_UP",
            SignUpStep::CompleteAutoSignIn => "COMPLETE_AUTO_SIGN_IN",
            SignUpStep::Done => "DONE",
        }
    }
}

/// What the sign-in flow needs next. `Done` means the session is authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInStep {
    Done,
    ConfirmSignUp,
    ResetPassword,
    NewPasswordRequired,
    /// Any other provider challenge, by name.
    Challenge(String),
}

impl SignInStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignInStep::Done => "DONE",
            SignInStep::ConfirmSignUp => "CONFIRM_SIGN_UP",
            SignInStep::ResetPassword => "RESET_PASSWORD",
            SignInStep::NewPasswordRequired => "CONFIRM_SIGN_IN_WITH_NEW_PASSWORD_REQUIRED",
            SignInStep::Challenge(_) => "CONFIRM_SIGN_IN",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, SignInStep::Done)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmOutcome {
    pub is_sign_up_complete: bool,
    pub next_step: SignUpStep,
}

/// Trait for identity providers.
///
/// Every call is single-shot. Implementations must not retry.
#[async_trait]
pub trait AuthProvider: Send + Sync + fmt::Debug {
    async fn sign_up(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<SignUpStep, AuthError>;

    async fn confirm_sign_up(&self, username: &str, code: &str)
        -> Result<ConfirmOutcome, AuthError>;

    /// Finish a sign-up that was confirmed in this process.
    async fn auto_sign_in(&self) -> Result<SignInStep, AuthError>;

    async fn sign_in(&self, username: &str, password: &str) -> Result<SignInStep, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    async fn current_user(&self) -> Result<Option<AuthUser>, AuthError>;

    /// Current id token, refreshed if the provider supports it.
    async fn current_token(&self) -> Result<Option<BearerToken>, AuthError>;

    /// Provider name (e.g., "cognito", "fake").
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = BearerToken::new("eyJhbGciOi.secret");
        assert_eq!(format!("{:?}", token), "BearerToken(***)");
        assert!(!token.is_empty());
        assert!(BearerToken::new("  ").is_empty());
    }

    #[test]
    fn test_step_indicators() {
        assert_eq!(
            SignUpStep::ConfirmSignUp { destination: None }.as_str(),
            "CONFIRM_SIGN_UP"
        );
        assert_eq!(SignUpStep::CompleteAutoSignIn.as_str(), "COMPLETE_AUTO_SIGN_IN");
        assert_eq!(SignInStep::Done.as_str(), "DONE");
        assert!(SignInStep::Done.is_done());
        assert!(!SignInStep::ConfirmSignUp.is_done());
    }
}
