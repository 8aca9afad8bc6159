//! Field constraints for the recipe and account forms.
//!
//! Every check here is synchronous and side-effect free. Failures are collected
//! per field so a form can mark the exact ingredient or step row that is wrong.

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use crate::types::{Ingredient, NewRecipe, PreparationStep};

pub const NAME_LEN: (usize, usize) = (2, 100);
pub const DESCRIPTION_MAX: usize = 500;
pub const INGREDIENT_NAME_LEN: (usize, usize) = (2, 100);
pub const INGREDIENT_AMOUNT_LEN: (usize, usize) = (1, 50);
pub const STEP_TEXT_LEN: (usize, usize) = (5, 500);
pub const CLASSIFICATION_MAX: usize = 50;

pub const USERNAME_MIN: usize = 5;
pub const PASSWORD_MIN: usize = 8;
pub const CONFIRMATION_CODE_MIN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IngredientField {
    Name,
    Amount,
}

impl IngredientField {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientField::Name => "name",
            IngredientField::Amount => "amount",
        }
    }
}

/// Address of a form field, including the row index for collection entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    Name,
    Description,
    /// The ingredient list as a whole (e.g. empty).
    Ingredients,
    Ingredient(usize, IngredientField),
    /// The preparation list as a whole.
    Preparation,
    Step(usize),
    TotalTime,
    Type,
    Cuisine,
    Username,
    Email,
    Password,
    Code,
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Name => write!(f, "name"),
            FieldPath::Description => write!(f, "description"),
            FieldPath::Ingredients => write!(f, "ingredients"),
            FieldPath::Ingredient(i, field) => write!(f, "ingredients[{}].{}", i, field.as_str()),
            FieldPath::Preparation => write!(f, "preparation"),
            FieldPath::Step(i) => write!(f, "preparation[{}].text", i),
            FieldPath::TotalTime => write!(f, "totalTime"),
            FieldPath::Type => write!(f, "type"),
            FieldPath::Cuisine => write!(f, "cuisine"),
            FieldPath::Username => write!(f, "username"),
            FieldPath::Email => write!(f, "email"),
            FieldPath::Password => write!(f, "password"),
            FieldPath::Code => write!(f, "code"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub path: FieldPath,
    pub message: String,
}

/// Structured set of field-level failures, in the order fields were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: FieldPath, message: impl Into<String>) {
        self.errors.push(FieldError {
            path,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// First message recorded for a field.
    pub fn get(&self, path: FieldPath) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.message.as_str())
    }

    pub fn contains(&self, path: FieldPath) -> bool {
        self.get(path).is_some()
    }

    /// Distinct failing fields, in check order.
    pub fn fields(&self) -> Vec<FieldPath> {
        let mut out: Vec<FieldPath> = Vec::new();
        for e in &self.errors {
            if !out.contains(&e.path) {
                out.push(e.path);
            }
        }
        out
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Raw recipe payload as entered in the form. Nothing about it is trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipeInput {
    pub name: String,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub preparation: Vec<PreparationStep>,
    pub total_time: String,
    #[serde(rename = "type")]
    pub recipe_type: String,
    pub cuisine: String,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn check_range(
    errors: &mut ValidationErrors,
    path: FieldPath,
    label: &str,
    value: &str,
    (min, max): (usize, usize),
) {
    let len = char_len(value);
    if len < min {
        errors.push(path, format!("{} must be at least {} characters", label, min));
    } else if len > max {
        errors.push(path, format!("{} must be at most {} characters", label, max));
    }
}

fn check_required(
    errors: &mut ValidationErrors,
    path: FieldPath,
    label: &str,
    value: &str,
    max: usize,
) {
    if value.is_empty() {
        errors.push(path, format!("{} is required", label));
    } else if char_len(value) > max {
        errors.push(path, format!("{} must be at most {} characters", label, max));
    }
}

/// Validate a recipe payload, returning the trimmed recipe or every field error.
pub fn validate_recipe(input: &RecipeInput) -> Result<NewRecipe, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = input.name.trim().to_string();
    check_range(&mut errors, FieldPath::Name, "Name", &name, NAME_LEN);

    let description = input.description.trim().to_string();
    if char_len(&description) > DESCRIPTION_MAX {
        errors.push(
            FieldPath::Description,
            format!("Description must be at most {} characters", DESCRIPTION_MAX),
        );
    }

    if input.ingredients.is_empty() {
        errors.push(FieldPath::Ingredients, "At least one ingredient is required");
    }
    let ingredients: Vec<Ingredient> = input
        .ingredients
        .iter()
        .enumerate()
        .map(|(i, ingredient)| {
            let name = ingredient.name.trim().to_string();
            let amount = ingredient.amount.trim().to_string();
            check_range(
                &mut errors,
                FieldPath::Ingredient(i, IngredientField::Name),
                "Ingredient name",
                &name,
                INGREDIENT_NAME_LEN,
            );
            check_range(
                &mut errors,
                FieldPath::Ingredient(i, IngredientField::Amount),
                "Amount",
                &amount,
                INGREDIENT_AMOUNT_LEN,
            );
            Ingredient { name, amount }
        })
        .collect();

    if input.preparation.is_empty() {
        errors.push(FieldPath::Preparation, "At least one step is required");
    }
    let preparation: Vec<PreparationStep> = input
        .preparation
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let text = step.text.trim().to_string();
            check_range(&mut errors, FieldPath::Step(i), "Step", &text, STEP_TEXT_LEN);
            PreparationStep { text }
        })
        .collect();

    let total_time = input.total_time.trim().to_string();
    let recipe_type = input.recipe_type.trim().to_string();
    let cuisine = input.cuisine.trim().to_string();
    check_required(
        &mut errors,
        FieldPath::TotalTime,
        "Total time",
        &total_time,
        CLASSIFICATION_MAX,
    );
    check_required(
        &mut errors,
        FieldPath::Type,
        "Type",
        &recipe_type,
        CLASSIFICATION_MAX,
    );
    check_required(
        &mut errors,
        FieldPath::Cuisine,
        "Cuisine",
        &cuisine,
        CLASSIFICATION_MAX,
    );

    let description = if description.is_empty() {
        format!("{} • {} • {} mins", recipe_type, cuisine, total_time)
    } else {
        description
    };

    errors.into_result(NewRecipe {
        name,
        description,
        ingredients,
        preparation,
        total_time,
        recipe_type,
        cuisine,
    })
}

/// Loose shape check: one `@`, non-empty local part, dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && tld.len() >= 2 && !host.starts_with('.'),
        None => false,
    }
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if !is_valid_email(email) {
        errors.push(FieldPath::Email, "Invalid email address");
    }
}

fn check_password(errors: &mut ValidationErrors, password: &str) {
    if char_len(password) < PASSWORD_MIN {
        errors.push(
            FieldPath::Password,
            format!("Password must be at least {} characters", PASSWORD_MIN),
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignUpInput {
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let input = Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
        };
        if char_len(&input.username) < USERNAME_MIN {
            errors.push(
                FieldPath::Username,
                format!("Username must be at least {} characters", USERNAME_MIN),
            );
        }
        check_email(&mut errors, &input.email);
        check_password(&mut errors, &input.password);
        errors.into_result(input)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

impl SignInInput {
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let input = Self {
            email: self.email.trim().to_string(),
            password: self.password,
        };
        check_email(&mut errors, &input.email);
        check_password(&mut errors, &input.password);
        errors.into_result(input)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationInput {
    pub code: String,
}

impl ConfirmationInput {
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let code = self.code.trim().to_string();
        if char_len(&code) < CONFIRMATION_CODE_MIN {
            errors.push(
                FieldPath::Code,
                format!(
                    "Verification code must be {} characters long",
                    CONFIRMATION_CODE_MIN
                ),
            );
        }
        errors.into_result(Self { code })
    }
}
