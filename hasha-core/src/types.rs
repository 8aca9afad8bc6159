use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recipe types offered by the authoring form.
pub const RECIPE_TYPES: &[&str] = &["appetizer", "entree", "dessert", "side", "beverage"];

/// Cuisines offered by the authoring form.
pub const CUISINES: &[&str] = &[
    "american", "italian", "chinese", "mexican", "indian", "french", "japanese", "thai", "other",
];

/// Numeric recipe identifier. Assigned by the client at creation time or by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(pub i64);

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparationStep {
    pub text: String,
}

/// Client-side recipe shape, as sent to the create endpoint and shown in the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub preparation: Vec<PreparationStep>,
    pub total_time: String,
    #[serde(rename = "type")]
    pub recipe_type: String,
    pub cuisine: String,
}

/// A recipe that passed validation but has not been assigned an id yet.
///
/// Only [`crate::validation::validate_recipe`] produces these, so holding one
/// means every field constraint already holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) ingredients: Vec<Ingredient>,
    pub(crate) preparation: Vec<PreparationStep>,
    pub(crate) total_time: String,
    pub(crate) recipe_type: String,
    pub(crate) cuisine: String,
}

impl NewRecipe {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn preparation(&self) -> &[PreparationStep] {
        &self.preparation
    }

    pub fn total_time(&self) -> &str {
        &self.total_time
    }

    pub fn recipe_type(&self) -> &str {
        &self.recipe_type
    }

    pub fn cuisine(&self) -> &str {
        &self.cuisine
    }

    pub fn into_recipe(self, id: RecipeId) -> Recipe {
        Recipe {
            id,
            name: self.name,
            description: Some(self.description),
            image: None,
            ingredients: self.ingredients,
            preparation: self.preparation,
            total_time: self.total_time,
            recipe_type: self.recipe_type,
            cuisine: self.cuisine,
        }
    }
}

/// Metadata grouping used by the storage side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeMetadata {
    #[serde(default)]
    pub total_time: String,
    #[serde(default, rename = "type")]
    pub recipe_type: String,
    #[serde(default)]
    pub cuisine: String,
}

/// Server-side persisted recipe, keyed by the owning user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecipe {
    pub id: RecipeId,
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub preparation: Vec<PreparationStep>,
    pub metadata: RecipeMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl StoredRecipe {
    /// Group a client recipe into the storage shape.
    ///
    /// Description and image have no storage column and are dropped.
    pub fn from_recipe(recipe: &Recipe, user_id: &str) -> Self {
        Self {
            id: recipe.id,
            user_id: user_id.to_string(),
            name: Some(recipe.name.clone()),
            ingredients: recipe.ingredients.clone(),
            preparation: recipe.preparation.clone(),
            metadata: RecipeMetadata {
                total_time: recipe.total_time.clone(),
                recipe_type: recipe.recipe_type.clone(),
                cuisine: recipe.cuisine.clone(),
            },
            created_at: Some(Utc::now()),
        }
    }
}

impl From<StoredRecipe> for Recipe {
    fn from(stored: StoredRecipe) -> Self {
        Recipe {
            id: stored.id,
            name: stored.name.unwrap_or_default(),
            description: None,
            image: None,
            ingredients: stored.ingredients,
            preparation: stored.preparation,
            total_time: stored.metadata.total_time,
            recipe_type: stored.metadata.recipe_type,
            cuisine: stored.metadata.cuisine,
        }
    }
}
