pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod http;
pub mod types;
pub mod validation;
pub mod view;

pub use auth::{
    AuthBridge, AuthProvider, AuthSession, AuthUser, BearerToken, CognitoProvider,
    ConfirmOutcome, FakeAuthProvider, SessionFile, SignInOutcome, SignInStep, SignUpStep,
    StoredSession,
};
pub use client::{CacheStats, RecipeClient, RecipeEvent, RECIPES_QUERY_KEY};
pub use config::HashaConfig;
pub use error::{AuthError, ClientError, ConfigError, TransportError};
pub use form::{FormStep, RecipeForm, SubmitOutcome};
pub use http::{
    ApiRequest, ApiResponse, FakeBackend, Method, MockTransport, ReqwestTransport, Transport,
};
pub use types::{
    Ingredient, NewRecipe, PreparationStep, Recipe, RecipeId, RecipeMetadata, StoredRecipe,
    CUISINES, RECIPE_TYPES,
};
pub use validation::{
    validate_recipe, ConfirmationInput, FieldError, FieldPath, IngredientField, RecipeInput,
    SignInInput, SignUpInput, ValidationErrors,
};
pub use view::{render_detail, FormSubmission, ListState, RecipeCard, RecipeListView};
