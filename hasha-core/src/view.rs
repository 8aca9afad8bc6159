//! Recipe list screen state: the loaded list, an optional open form, and an
//! inline error line. Client failures end up here as text, never as panics.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::client::RecipeClient;
use crate::form::{RecipeForm, SubmitOutcome};
use crate::types::{Recipe, RecipeId};
use crate::validation::ValidationErrors;

const UNTITLED: &str = "Untitled Recipe";
const NO_DESCRIPTION: &str = "No description";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListState {
    Idle,
    Loaded(Vec<Recipe>),
    Failed(String),
}

/// What happened when the open form was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormSubmission {
    Created(RecipeId),
    /// Validation failed; the form stays open with its errors.
    Invalid(ValidationErrors),
    /// The API call failed; the form stays open and the error is inline.
    Failed(String),
    NoFormOpen,
}

/// Display-ready view of one recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeCard {
    pub id: RecipeId,
    pub title: String,
    pub description: String,
    /// "{type} • {cuisine} • {total} mins" when all three are set, otherwise the description.
    pub subtitle: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
}

impl RecipeCard {
    pub fn from_recipe(recipe: &Recipe) -> Self {
        let title = non_empty(&recipe.name).unwrap_or(UNTITLED).to_string();
        let description = recipe
            .description
            .as_deref()
            .and_then(non_empty)
            .unwrap_or(NO_DESCRIPTION)
            .to_string();

        let subtitle = if [&recipe.recipe_type, &recipe.cuisine, &recipe.total_time]
            .iter()
            .all(|v| !v.trim().is_empty())
        {
            format!(
                "{} • {} • {} mins",
                recipe.recipe_type, recipe.cuisine, recipe.total_time
            )
        } else {
            description.clone()
        };

        let ingredients = recipe
            .ingredients
            .iter()
            .map(|i| format!("{} ({})", i.name, i.amount))
            .collect();

        // A single blank step counts as no instructions.
        let steps = match recipe.preparation.first() {
            Some(first) if !first.text.is_empty() => {
                recipe.preparation.iter().map(|s| s.text.clone()).collect()
            }
            _ => Vec::new(),
        };

        Self {
            id: recipe.id,
            title,
            description,
            subtitle,
            ingredients,
            steps,
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

pub struct RecipeListView {
    client: Arc<RecipeClient>,
    state: ListState,
    form: Option<RecipeForm>,
    inline_error: Option<String>,
}

impl RecipeListView {
    pub fn new(client: Arc<RecipeClient>) -> Self {
        Self {
            client,
            state: ListState::Idle,
            form: None,
            inline_error: None,
        }
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn inline_error(&self) -> Option<&str> {
        self.inline_error.as_deref()
    }

    pub fn recipes(&self) -> &[Recipe] {
        match &self.state {
            ListState::Loaded(recipes) => recipes,
            _ => &[],
        }
    }

    pub fn cards(&self) -> Vec<RecipeCard> {
        self.recipes().iter().map(RecipeCard::from_recipe).collect()
    }

    /// Load the list through the client cache.
    pub async fn refresh(&mut self) {
        match self.client.list_recipes().await {
            Ok(recipes) => {
                self.state = ListState::Loaded(recipes);
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not load recipes");
                self.state = ListState::Failed(e.to_string());
            }
        }
    }

    /// Open a blank form. An already-open form is kept as is.
    pub fn open_form(&mut self) -> &mut RecipeForm {
        self.form.get_or_insert_with(RecipeForm::new)
    }

    pub fn form(&self) -> Option<&RecipeForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut RecipeForm> {
        self.form.as_mut()
    }

    /// Discard the open form and its contents.
    pub fn close_form(&mut self) {
        self.form = None;
    }

    /// Validate the open form; on success close it, send the recipe, and reload the list.
    pub async fn submit_form(&mut self) -> FormSubmission {
        let Some(form) = self.form.as_mut() else {
            return FormSubmission::NoFormOpen;
        };

        let recipe = match form.submit() {
            SubmitOutcome::Submitted(recipe) => recipe,
            SubmitOutcome::Invalid(errors) => return FormSubmission::Invalid(errors),
        };

        match self.client.create_recipe(recipe).await {
            Ok(created) => {
                self.form = None;
                self.inline_error = None;
                self.refresh().await;
                FormSubmission::Created(created.id)
            }
            Err(e) => {
                let message = e.to_string();
                self.inline_error = Some(message.clone());
                FormSubmission::Failed(message)
            }
        }
    }

    /// Delete and reload. Returns false if the deletion failed.
    pub async fn delete(&mut self, id: RecipeId) -> bool {
        match self.client.delete_recipe(id).await {
            Ok(()) => {
                self.inline_error = None;
                self.refresh().await;
                true
            }
            Err(e) => {
                self.inline_error = Some(e.to_string());
                false
            }
        }
    }

    /// Plain-text rendering of the screen.
    pub fn render(&self) -> String {
        let mut out = String::new();

        match &self.state {
            ListState::Idle => out.push_str("Loading recipes...\n"),
            ListState::Failed(message) => {
                let _ = writeln!(out, "Error loading recipes: {message}");
            }
            ListState::Loaded(recipes) if recipes.is_empty() => {
                out.push_str("No recipes yet.\n");
            }
            ListState::Loaded(_) => {
                for card in self.cards() {
                    let _ = writeln!(out, "[{}] {}", card.id, card.title);
                    let _ = writeln!(out, "    {}", card.subtitle);
                }
            }
        }

        if let Some(error) = &self.inline_error {
            let _ = writeln!(out, "! {error}");
        }

        if let Some(form) = &self.form {
            let _ = writeln!(out, "{}", form.header());
            let _ = writeln!(out, "    {}", form.step().hint());
            for error in form.errors().iter() {
                let _ = writeln!(out, "    {}: {}", error.path, error.message);
            }
        }

        out
    }
}

/// Multi-line detail text for one recipe.
pub fn render_detail(recipe: &Recipe) -> String {
    let card = RecipeCard::from_recipe(recipe);
    let mut out = String::new();
    let _ = writeln!(out, "{}", card.title);
    let _ = writeln!(out, "{}", card.subtitle);
    let _ = writeln!(out);

    out.push_str("Ingredients\n");
    if card.ingredients.is_empty() {
        out.push_str("  No ingredients listed\n");
    }
    for line in &card.ingredients {
        let _ = writeln!(out, "  - {line}");
    }

    out.push_str("Instructions\n");
    if card.steps.is_empty() {
        out.push_str("  No instructions provided\n");
    }
    for (i, step) in card.steps.iter().enumerate() {
        let _ = writeln!(out, "  {}. {step}", i + 1);
    }
    out
}
