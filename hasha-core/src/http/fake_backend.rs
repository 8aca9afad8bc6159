//! In-memory recipe API for tests.
//!
//! Behaves like the hosted service: bearer tokens map to user ids, recipes are
//! stored in the grouped [`StoredRecipe`] shape, and listing only returns the
//! caller's rows. Deleting an id the caller does not own answers 404.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::TransportError;
use crate::types::{Recipe, RecipeId, StoredRecipe};

use super::transport::{ApiRequest, ApiResponse, Method, Transport};

#[derive(Debug, Deserialize)]
struct DeleteBody {
    id: RecipeId,
}

#[derive(Default)]
struct BackendState {
    users_by_token: HashMap<String, String>,
    recipes: Vec<StoredRecipe>,
    fail_next: Option<u16>,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<BackendState>,
    requests: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as the bearer credential for `user_id`.
    pub fn with_user(self, token: &str, user_id: &str) -> Self {
        self.lock()
            .users_by_token
            .insert(token.to_string(), user_id.to_string());
        self
    }

    /// Seed a stored row directly, bypassing the API.
    pub fn with_recipe(self, recipe: StoredRecipe) -> Self {
        self.lock().recipes.push(recipe);
        self
    }

    /// Answer the next request with `status` and an error body, whatever it is.
    pub fn fail_next(&self, status: u16) {
        self.lock().fail_next = Some(status);
    }

    /// Number of requests received, including rejected ones.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Vec<StoredRecipe> {
        self.lock().recipes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn error(status: u16, detail: &str) -> ApiResponse {
        ApiResponse::json(status, &serde_json::json!({ "detail": detail }))
    }

    fn handle(&self, request: ApiRequest) -> ApiResponse {
        let mut state = self.lock();

        if let Some(status) = state.fail_next.take() {
            return Self::error(status, "injected failure");
        }

        let user_id = match request
            .bearer
            .as_deref()
            .and_then(|t| state.users_by_token.get(t))
        {
            Some(user_id) => user_id.clone(),
            None => return Self::error(401, "Invalid user token"),
        };

        match (request.method, request.path.trim_end_matches('/')) {
            (Method::Get, "/recipes") => {
                let rows: Vec<&StoredRecipe> = state
                    .recipes
                    .iter()
                    .filter(|r| r.user_id == user_id)
                    .collect();
                match serde_json::to_value(rows) {
                    Ok(body) => ApiResponse::json(200, &body),
                    Err(e) => Self::error(500, &e.to_string()),
                }
            }
            (Method::Post, "/recipes/create-recipe") => {
                let recipe: Recipe = match request.body.map(serde_json::from_value) {
                    Some(Ok(recipe)) => recipe,
                    Some(Err(e)) => return Self::error(422, &e.to_string()),
                    None => return Self::error(422, "missing body"),
                };
                state
                    .recipes
                    .push(StoredRecipe::from_recipe(&recipe, &user_id));
                ApiResponse::json(200, &serde_json::json!({ "status": "success" }))
            }
            (Method::Delete, "/recipes/delete-recipe") => {
                let body: DeleteBody = match request.body.map(serde_json::from_value) {
                    Some(Ok(body)) => body,
                    Some(Err(e)) => return Self::error(422, &e.to_string()),
                    None => return Self::error(422, "missing body"),
                };
                let before = state.recipes.len();
                state
                    .recipes
                    .retain(|r| !(r.id == body.id && r.user_id == user_id));
                if state.recipes.len() == before {
                    return Self::error(404, "Recipe not found");
                }
                ApiResponse::json(200, &serde_json::json!({ "status": "success" }))
            }
            _ => Self::error(404, "Not Found"),
        }
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.handle(request))
    }
}
