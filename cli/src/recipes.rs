use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use hasha_core::{
    render_detail, FormSubmission, IngredientField, RecipeForm, RecipeId, RecipeInput,
    RecipeListView, CUISINES, RECIPE_TYPES,
};

use crate::App;

#[derive(Args)]
pub struct CreateArgs {
    /// Read the whole recipe from a JSON file instead of flags
    #[arg(long, conflicts_with_all = ["name", "ingredient", "step"])]
    from_json: Option<PathBuf>,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Ingredient as "name=amount"; repeat for more
    #[arg(long = "ingredient")]
    ingredient: Vec<String>,

    /// Preparation step; repeat for more
    #[arg(long = "step")]
    step: Vec<String>,

    /// Total time in minutes
    #[arg(long)]
    total_time: Option<String>,

    #[arg(long = "type")]
    recipe_type: Option<String>,

    #[arg(long)]
    cuisine: Option<String>,
}

fn split_ingredient(raw: &str) -> Result<(String, String)> {
    let (name, amount) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Ingredient '{raw}' must look like name=amount"))?;
    Ok((name.to_string(), amount.to_string()))
}

/// Walk the form the way a user would: details, then steps, then classification.
fn fill_form(form: &mut RecipeForm, input: RecipeInput) {
    form.set_name(input.name);
    form.set_description(input.description);
    for (i, ingredient) in input.ingredients.into_iter().enumerate() {
        if i > 0 {
            form.add_ingredient();
        }
        form.update_ingredient(i, IngredientField::Name, ingredient.name);
        form.update_ingredient(i, IngredientField::Amount, ingredient.amount);
    }
    form.next();

    for (i, step) in input.preparation.into_iter().enumerate() {
        if i > 0 {
            form.add_step();
        }
        form.update_step(i, step.text);
    }
    form.next();

    form.set_total_time(input.total_time);
    form.set_recipe_type(input.recipe_type);
    form.set_cuisine(input.cuisine);
}

impl CreateArgs {
    fn into_input(self) -> Result<RecipeInput> {
        if let Some(path) = self.from_json {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            return serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse {}", path.display()));
        }

        let ingredients = self
            .ingredient
            .iter()
            .map(|raw| split_ingredient(raw))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .map(|(name, amount)| hasha_core::Ingredient { name, amount })
            .collect();
        let preparation = self
            .step
            .into_iter()
            .map(|text| hasha_core::PreparationStep { text })
            .collect();

        Ok(RecipeInput {
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            ingredients,
            preparation,
            total_time: self.total_time.unwrap_or_default(),
            recipe_type: self.recipe_type.unwrap_or_default(),
            cuisine: self.cuisine.unwrap_or_default(),
        })
    }
}

async fn view(app: &App) -> Result<RecipeListView> {
    Ok(RecipeListView::new(Arc::new(app.recipe_client().await?)))
}

pub async fn list(app: &App) -> Result<()> {
    let mut view = view(app).await?;
    view.refresh().await;
    print!("{}", view.render());
    Ok(())
}

pub async fn show(app: &App, id: i64) -> Result<()> {
    let mut view = view(app).await?;
    view.refresh().await;
    let recipe = view
        .recipes()
        .iter()
        .find(|r| r.id == RecipeId(id))
        .ok_or_else(|| anyhow!("No recipe with id {id}"))?;
    print!("{}", render_detail(recipe));
    Ok(())
}

pub async fn create(app: &App, args: CreateArgs) -> Result<()> {
    let input = args.into_input()?;
    for (value, allowed, label) in [
        (&input.recipe_type, RECIPE_TYPES, "type"),
        (&input.cuisine, CUISINES, "cuisine"),
    ] {
        if !value.is_empty() && !allowed.contains(&value.as_str()) {
            tracing::warn!(value = %value, "{label} is not one of the suggested values");
        }
    }

    let mut view = view(app).await?;
    fill_form(view.open_form(), input);

    match view.submit_form().await {
        FormSubmission::Created(id) => {
            println!("Created recipe {id}");
            print!("{}", view.render());
            Ok(())
        }
        FormSubmission::Invalid(errors) => {
            for error in errors.iter() {
                eprintln!("  {}: {}", error.path, error.message);
            }
            bail!("Recipe has {} invalid field(s)", errors.len())
        }
        FormSubmission::Failed(message) => bail!(message),
        FormSubmission::NoFormOpen => bail!("No recipe form open"),
    }
}

pub async fn delete(app: &App, id: i64) -> Result<()> {
    let mut view = view(app).await?;
    if !view.delete(RecipeId(id)).await {
        bail!(view
            .inline_error()
            .unwrap_or("Recipe deletion failed")
            .to_string());
    }
    println!("Deleted recipe {id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hasha_core::{FieldPath, SubmitOutcome};

    #[test]
    fn test_split_ingredient() {
        assert_eq!(
            split_ingredient("Flour=2 cups").unwrap(),
            ("Flour".to_string(), "2 cups".to_string())
        );
        assert!(split_ingredient("Flour").is_err());
    }

    #[test]
    fn test_fill_form_reaches_last_step() {
        let input: RecipeInput = serde_json::from_value(serde_json::json!({
            "name": "Pancakes",
            "ingredients": [
                {"name": "Flour", "amount": "2 cups"},
                {"name": "Milk", "amount": "1 cup"}
            ],
            "preparation": [{"text": "Whisk everything together"}],
            "totalTime": "20",
            "type": "dessert",
            "cuisine": "american"
        }))
        .unwrap();

        let mut form = RecipeForm::new();
        fill_form(&mut form, input);
        assert!(form.is_last_step());
        assert_eq!(form.ingredients().len(), 2);
        assert!(matches!(form.submit(), SubmitOutcome::Submitted(_)));
    }

    #[test]
    fn test_fill_form_with_no_rows_reports_errors() {
        let mut form = RecipeForm::new();
        fill_form(&mut form, RecipeInput::default());
        assert!(matches!(form.submit(), SubmitOutcome::Invalid(_)));
        assert!(form.error_for(FieldPath::Name).is_some());
    }
}
