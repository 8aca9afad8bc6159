//! Fake identity provider for testing.
//!
//! Keeps accounts and the current session in memory. Confirmation always
//! expects [`FakeAuthProvider::DEFAULT_CODE`] unless overridden. Issued tokens
//! are deterministic (`fake-id-token-<user_id>`) so they can be registered with
//! [`crate::http::FakeBackend::with_user`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{AuthProvider, AuthUser, BearerToken, ConfirmOutcome, SignInStep, SignUpStep};
use crate::error::AuthError;

#[derive(Debug, Clone)]
struct Account {
    user_id: String,
    email: String,
    password: String,
    confirmed: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    accounts: HashMap<String, Account>,
    current: Option<AuthUser>,
    pending_auto_sign_in: Option<String>,
}

#[derive(Debug)]
pub struct FakeAuthProvider {
    state: Mutex<FakeState>,
    code: String,
    fail_sign_out: AtomicBool,
}

impl Default for FakeAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeAuthProvider {
    pub const DEFAULT_CODE: &'static str = "123456";

    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            code: Self::DEFAULT_CODE.to_string(),
            fail_sign_out: AtomicBool::new(false),
        }
    }

    /// Token issued to a user id.
    pub fn token_for(user_id: &str) -> BearerToken {
        BearerToken::new(format!("fake-id-token-{}", user_id))
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = code.to_string();
        self
    }

    /// Register an account that can sign in straight away.
    pub fn with_confirmed_user(self, username: &str, email: &str, password: &str) -> Self {
        self.lock().accounts.insert(
            username.to_string(),
            Account {
                user_id: format!("sub-{}", username),
                email: email.to_string(),
                password: password.to_string(),
                confirmed: true,
            },
        );
        self
    }

    /// Start with `username` already signed in.
    pub fn with_signed_in(self, username: &str) -> Self {
        {
            let mut state = self.lock();
            let user_id = state
                .accounts
                .get(username)
                .map(|a| a.user_id.clone())
                .unwrap_or_else(|| format!("sub-{}", username));
            state.current = Some(AuthUser {
                user_id,
                username: username.to_string(),
            });
        }
        self
    }

    pub fn fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn find_by_login<'a>(state: &'a FakeState, login: &str) -> Option<(&'a String, &'a Account)> {
        state
            .accounts
            .iter()
            .find(|(username, account)| username.as_str() == login || account.email == login)
    }

    fn sign_in_locked(
        state: &mut FakeState,
        login: &str,
        password: &str,
    ) -> Result<SignInStep, AuthError> {
        let (username, account) = Self::find_by_login(state, login).ok_or_else(|| {
            AuthError::OperationFailed("Incorrect username or password.".to_string())
        })?;
        if account.password != password {
            return Err(AuthError::OperationFailed(
                "Incorrect username or password.".to_string(),
            ));
        }
        if !account.confirmed {
            return Ok(SignInStep::ConfirmSignUp);
        }
        let user = AuthUser {
            user_id: account.user_id.clone(),
            username: username.clone(),
        };
        state.current = Some(user);
        Ok(SignInStep::Done)
    }
}

#[async_trait]
impl AuthProvider for FakeAuthProvider {
    async fn sign_up(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<SignUpStep, AuthError> {
        let mut state = self.lock();
        if state.accounts.contains_key(username) {
            return Err(AuthError::OperationFailed("User already exists".to_string()));
        }
        state.accounts.insert(
            username.to_string(),
            Account {
                user_id: format!("sub-{}", username),
                email: email.to_string(),
                password: password.to_string(),
                confirmed: false,
            },
        );
        Ok(SignUpStep::ConfirmSignUp {
            destination: Some(email.to_string()),
        })
    }

    async fn confirm_sign_up(
        &self,
        username: &str,
        code: &str,
    ) -> Result<ConfirmOutcome, AuthError> {
        let mut state = self.lock();
        let account = state.accounts.get_mut(username).ok_or_else(|| {
            AuthError::OperationFailed("Username/client id combination not found.".to_string())
        })?;
        if code != self.code {
            return Err(AuthError::OperationFailed(
                "Invalid verification code provided, please try again.".to_string(),
            ));
        }
        account.confirmed = true;
        state.pending_auto_sign_in = Some(username.to_string());
        Ok(ConfirmOutcome {
            is_sign_up_complete: true,
            next_step: SignUpStep::CompleteAutoSignIn,
        })
    }

    async fn auto_sign_in(&self) -> Result<SignInStep, AuthError> {
        let mut state = self.lock();
        let username = state
            .pending_auto_sign_in
            .take()
            .ok_or(AuthError::NoPendingSignIn)?;
        let password = state
            .accounts
            .get(&username)
            .map(|a| a.password.clone())
            .ok_or(AuthError::NoPendingSignIn)?;
        Self::sign_in_locked(&mut state, &username, &password)
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<SignInStep, AuthError> {
        let mut state = self.lock();
        Self::sign_in_locked(&mut state, username, password)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.lock().current = None;
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AuthError::OperationFailed("network unreachable".to_string()));
        }
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, AuthError> {
        Ok(self.lock().current.clone())
    }

    async fn current_token(&self) -> Result<Option<BearerToken>, AuthError> {
        Ok(self
            .lock()
            .current
            .as_ref()
            .map(|u| Self::token_for(&u.user_id)))
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_sign_up_fails() {
        let provider = FakeAuthProvider::new();
        provider
            .sign_up("chef_anna", "a@example.com", "password123")
            .await
            .unwrap();
        let result = provider
            .sign_up("chef_anna", "a@example.com", "password123")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sign_in_by_username_or_email() {
        let provider = FakeAuthProvider::new().with_confirmed_user(
            "chef_anna",
            "a@example.com",
            "password123",
        );
        assert_eq!(
            provider.sign_in("a@example.com", "password123").await.unwrap(),
            SignInStep::Done
        );
        provider.sign_out().await.unwrap();
        assert_eq!(provider.sign_in("chef_anna", "password123").await.unwrap(), SignInStep::Done);
        assert_eq!(
            provider.current_token().await.unwrap(),
            Some(FakeAuthProvider::token_for("sub-chef_anna"))
        );
    }

    #[tokio::test]
    async fn test_auto_sign_in_without_confirmation() {
        let provider = FakeAuthProvider::new();
        assert!(matches!(
            provider.auto_sign_in().await,
            Err(AuthError::NoPendingSignIn)
        ));
    }

    #[tokio::test]
    async fn test_custom_code() {
        let provider = FakeAuthProvider::new().with_code("654321");
        provider
            .sign_up("chef_anna", "a@example.com", "password123")
            .await
            .unwrap();
        assert!(provider.confirm_sign_up("chef_anna", "123456").await.is_err());
        assert!(provider.confirm_sign_up("chef_anna", "654321").await.is_ok());
    }
}
