//! End-to-end flows through the auth bridge, recipe client and fake backend.
//!
//! The backend keys recipes by the bearer token it was given, and the fake
//! identity provider issues deterministic tokens, so signing in through the
//! bridge and then calling the client exercises the same wiring the CLI uses.

use std::sync::Arc;

use hasha_core::{
    AuthBridge, AuthSession, ClientError, FakeAuthProvider, FakeBackend, FieldPath,
    IngredientField, RecipeClient, RecipeEvent, RecipeForm, RecipeId, SignInStep, SignUpStep,
    SubmitOutcome,
};

fn filled_form(name: &str) -> RecipeForm {
    let mut form = RecipeForm::new();
    form.set_name(name);
    form.update_ingredient(0, IngredientField::Name, "Pasta");
    form.update_ingredient(0, IngredientField::Amount, "1 lb");
    form.add_ingredient();
    form.update_ingredient(1, IngredientField::Name, "Tomato sauce");
    form.update_ingredient(1, IngredientField::Amount, "2 cups");
    form.next();
    form.update_step(0, "Boil the pasta until tender");
    form.add_step();
    form.update_step(1, "Stir in the warmed sauce");
    form.next();
    form.set_total_time("30");
    form.set_recipe_type("entree");
    form.set_cuisine("italian");
    form
}

/// Sign in `username` through the bridge and register their token with the backend.
async fn signed_in(username: &str) -> (AuthSession, Arc<FakeBackend>) {
    let provider = Arc::new(FakeAuthProvider::new().with_confirmed_user(
        username,
        &format!("{username}@example.com"),
        "password123",
    ));
    let bridge = AuthBridge::new(provider);
    let outcome = bridge.sign_in(username, "password123").await.unwrap();
    assert_eq!(outcome.step, SignInStep::Done);

    let user_id = outcome.session.user().unwrap().user_id.clone();
    let token = FakeAuthProvider::token_for(&user_id);
    let backend = Arc::new(FakeBackend::new().with_user(token.as_str(), &user_id));
    (outcome.session, backend)
}

#[tokio::test]
async fn test_created_recipe_round_trips() {
    let (session, backend) = signed_in("chef_anna").await;
    let client = RecipeClient::new(backend.clone(), &session);

    let recipe = match filled_form("Pasta Night").submit() {
        SubmitOutcome::Submitted(recipe) => recipe,
        SubmitOutcome::Invalid(errors) => panic!("unexpected errors: {errors:?}"),
    };
    let created = client.create_recipe(recipe).await.unwrap();

    let listed = client.list_recipes().await.unwrap();
    assert_eq!(listed.len(), 1);
    let fetched = &listed[0];
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.name, "Pasta Night");
    assert_eq!(fetched.ingredients, created.ingredients);
    assert_eq!(fetched.preparation, created.preparation);
    assert_eq!(fetched.total_time, "30");
    assert_eq!(fetched.recipe_type, "entree");
    assert_eq!(fetched.cuisine, "italian");

    let stored = backend.stored();
    assert_eq!(stored[0].user_id, "sub-chef_anna");
}

#[tokio::test]
async fn test_invalid_form_never_reaches_network() {
    let (session, backend) = signed_in("chef_anna").await;
    let _client = RecipeClient::new(backend.clone(), &session);

    let mut form = filled_form("P");
    form.update_step(1, "Stir");
    let errors = match form.submit() {
        SubmitOutcome::Invalid(errors) => errors,
        SubmitOutcome::Submitted(_) => panic!("short name should be rejected"),
    };
    assert!(errors.contains(FieldPath::Name));
    assert!(errors.contains(FieldPath::Step(1)));
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test]
async fn test_signed_out_session_is_unauthenticated() {
    let backend = Arc::new(FakeBackend::new());
    let client = RecipeClient::new(backend.clone(), &AuthSession::signed_out());

    assert!(matches!(
        client.list_recipes().await,
        Err(ClientError::Unauthenticated)
    ));
    assert!(matches!(
        client.delete_recipe(RecipeId(1)).await,
        Err(ClientError::Unauthenticated)
    ));
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test]
async fn test_delete_missing_recipe_fails() {
    let (session, backend) = signed_in("chef_anna").await;
    let client = RecipeClient::new(backend, &session);

    let error = client.delete_recipe(RecipeId(12345)).await.unwrap_err();
    assert!(matches!(error, ClientError::RequestFailed(_)));
    assert!(error.is_request_failure());
}

#[tokio::test]
async fn test_create_then_delete_refetches_each_time() {
    let (session, backend) = signed_in("chef_anna").await;
    let client = RecipeClient::new(backend.clone(), &session);
    let mut events = client.subscribe();

    assert!(client.list_recipes().await.unwrap().is_empty());
    assert!(client.list_recipes().await.unwrap().is_empty());
    assert_eq!(backend.request_count(), 1);

    let recipe = match filled_form("Pasta Night").submit() {
        SubmitOutcome::Submitted(recipe) => recipe,
        SubmitOutcome::Invalid(errors) => panic!("unexpected errors: {errors:?}"),
    };
    let created = client.create_recipe(recipe).await.unwrap();
    assert_eq!(client.list_recipes().await.unwrap().len(), 1);
    assert_eq!(backend.request_count(), 3);

    client.delete_recipe(created.id).await.unwrap();
    assert!(client.list_recipes().await.unwrap().is_empty());
    assert_eq!(backend.request_count(), 5);

    assert_eq!(events.recv().await.unwrap(), RecipeEvent::Created(created.id));
    assert_eq!(events.recv().await.unwrap(), RecipeEvent::Deleted(created.id));
}

#[tokio::test]
async fn test_backend_failure_surfaces_as_request_failure() {
    let (session, backend) = signed_in("chef_anna").await;
    let client = RecipeClient::new(backend.clone(), &session);

    backend.fail_next(503);
    assert!(matches!(
        client.list_recipes().await,
        Err(ClientError::RequestFailed(_))
    ));
    assert!(client.list_recipes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_users_only_see_their_own_recipes() {
    let (anna, backend) = signed_in("chef_anna").await;
    let other = FakeAuthProvider::token_for("sub-bruno");
    let backend = Arc::new(
        Arc::try_unwrap(backend)
            .unwrap_or_else(|_| panic!("backend still shared"))
            .with_user(other.as_str(), "sub-bruno"),
    );

    let anna_client = RecipeClient::new(backend.clone(), &anna);
    let recipe = match filled_form("Pasta Night").submit() {
        SubmitOutcome::Submitted(recipe) => recipe,
        SubmitOutcome::Invalid(errors) => panic!("unexpected errors: {errors:?}"),
    };
    let created = anna_client.create_recipe(recipe).await.unwrap();

    let bruno = AuthSession::new(None, Some(other));
    let bruno_client = RecipeClient::new(backend.clone(), &bruno);
    assert!(bruno_client.list_recipes().await.unwrap().is_empty());
    assert!(matches!(
        bruno_client.delete_recipe(created.id).await,
        Err(ClientError::RequestFailed(_))
    ));
    assert_eq!(anna_client.list_recipes().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_sign_up_flow_produces_usable_session() {
    let provider = Arc::new(FakeAuthProvider::new());
    let bridge = AuthBridge::new(provider);

    let step = bridge
        .sign_up("new_cook", "new_cook@example.com", "password123")
        .await
        .unwrap();
    assert!(matches!(step, SignUpStep::ConfirmSignUp { .. }));

    let confirmed = bridge
        .confirm_sign_up("new_cook", FakeAuthProvider::DEFAULT_CODE)
        .await
        .unwrap();
    assert_eq!(confirmed.next_step, SignUpStep::CompleteAutoSignIn);

    let outcome = bridge.auto_sign_in().await.unwrap();
    assert_eq!(outcome.step, SignInStep::Done);
    let token = outcome.session.id_token().unwrap().clone();
    assert_eq!(token, FakeAuthProvider::token_for("sub-new_cook"));

    let backend = Arc::new(FakeBackend::new().with_user(token.as_str(), "sub-new_cook"));
    let client = RecipeClient::new(backend, &outcome.session);
    assert!(client.list_recipes().await.unwrap().is_empty());

    let signed_out = bridge.sign_out(&outcome.session).await;
    assert!(!signed_out.is_signed_in());
    let client = RecipeClient::new(Arc::new(FakeBackend::new()), &signed_out);
    assert!(matches!(
        client.list_recipes().await,
        Err(ClientError::Unauthenticated)
    ));
}
