//! Recipe data client: the only code that talks to the recipe API.
//!
//! Every operation needs the bearer token captured from the [`AuthSession`]
//! the client was built with; without one it fails with
//! [`ClientError::Unauthenticated`] before touching the transport.
//!
//! Consistency is refetch-based: a successful create or delete invalidates the
//! cached list and nothing is merged into it locally.

mod cache;

pub use cache::{CacheStats, ListCache, RECIPES_QUERY_KEY};

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

use crate::auth::{AuthSession, BearerToken};
use crate::error::ClientError;
use crate::http::{ApiRequest, Method, Transport};
use crate::types::{NewRecipe, Recipe, RecipeId, StoredRecipe};

pub const LIST_PATH: &str = "/recipes";
pub const CREATE_PATH: &str = "/recipes/create-recipe";
pub const DELETE_PATH: &str = "/recipes/delete-recipe";

/// Notifications emitted after successful mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeEvent {
    Created(RecipeId),
    Deleted(RecipeId),
}

pub struct RecipeClient {
    transport: Arc<dyn Transport>,
    token: Option<BearerToken>,
    cache: Mutex<ListCache>,
    events: broadcast::Sender<RecipeEvent>,
}

impl RecipeClient {
    /// Build a client for one session. The token is read once here and used for
    /// every call until the client is dropped.
    pub fn new(transport: Arc<dyn Transport>, session: &AuthSession) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            transport,
            token: session.id_token().cloned(),
            cache: Mutex::new(ListCache::new()),
            events,
        }
    }

    /// Whether calls will be attempted at all.
    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RecipeEvent> {
        self.events.subscribe()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.lock().await.stats()
    }

    fn bearer(&self) -> Result<&str, ClientError> {
        self.token
            .as_ref()
            .filter(|t| !t.is_empty())
            .map(BearerToken::as_str)
            .ok_or(ClientError::Unauthenticated)
    }

    /// Fetch the signed-in user's recipes, served from cache until invalidated.
    pub async fn list_recipes(&self) -> Result<Vec<Recipe>, ClientError> {
        let token = self.bearer()?;

        // Held across the fetch so an invalidation can't interleave with it.
        let mut cache = self.cache.lock().await;
        if let Some(recipes) = cache.get_fresh() {
            tracing::debug!(key = cache.key(), count = recipes.len(), "recipe list cache hit");
            return Ok(recipes);
        }

        let response = self
            .transport
            .send(ApiRequest::new(Method::Get, LIST_PATH).bearer(token))
            .await?;
        if !response.is_success() {
            tracing::warn!(status = response.status, "failed to fetch recipes");
            return Err(ClientError::RequestFailed("fetch failed".to_string()));
        }

        let stored: Vec<StoredRecipe> = response
            .parse()
            .map_err(|e| ClientError::Json(e.to_string()))?;
        let recipes: Vec<Recipe> = stored.into_iter().map(Recipe::from).collect();
        tracing::debug!(key = cache.key(), count = recipes.len(), "recipe list fetched");

        cache.store(recipes.clone());
        Ok(recipes)
    }

    /// Send a validated recipe. The list is not updated locally; it is
    /// invalidated and refetched on next read.
    pub async fn create_recipe(&self, recipe: NewRecipe) -> Result<Recipe, ClientError> {
        let token = self.bearer()?;

        let recipe = recipe.into_recipe(RecipeId(Utc::now().timestamp_millis()));
        let body = serde_json::to_value(&recipe)
            .map_err(|e| ClientError::Json(e.to_string()))?;

        let response = self
            .transport
            .send(ApiRequest::new(Method::Post, CREATE_PATH).bearer(token).json(body))
            .await?;
        if !response.is_success() {
            tracing::error!(
                status = response.status,
                name = %recipe.name,
                "failed to create recipe"
            );
            return Err(ClientError::RequestFailed("creation failed".to_string()));
        }

        tracing::info!(id = %recipe.id, name = %recipe.name, "recipe created");
        self.invalidate().await;
        let _ = self.events.send(RecipeEvent::Created(recipe.id));
        Ok(recipe)
    }

    /// Delete by id. On failure the cached list is left as it was.
    pub async fn delete_recipe(&self, id: RecipeId) -> Result<(), ClientError> {
        let token = self.bearer()?;

        let response = self
            .transport
            .send(
                ApiRequest::new(Method::Delete, DELETE_PATH)
                    .bearer(token)
                    .json(serde_json::json!({ "id": id })),
            )
            .await?;
        if !response.is_success() {
            tracing::error!(status = response.status, %id, "failed to delete recipe");
            return Err(ClientError::RequestFailed("deletion failed".to_string()));
        }

        tracing::info!(%id, "recipe deleted");
        self.invalidate().await;
        let _ = self.events.send(RecipeEvent::Deleted(id));
        Ok(())
    }

    /// Mark the cached list stale. Waits for any fetch in progress.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.lock().await;
        cache.invalidate();
        tracing::debug!(key = cache.key(), "recipe list invalidated");
    }
}
