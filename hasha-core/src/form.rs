//! Multi-step recipe authoring form.
//!
//! Three ordered steps: name and ingredients, preparation steps, then
//! timing and classification. Navigation never validates; validation only
//! happens on [`RecipeForm::submit`].

use crate::types::{Ingredient, NewRecipe, PreparationStep};
use crate::validation::{validate_recipe, FieldPath, IngredientField, RecipeInput, ValidationErrors};

/// Wizard steps in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStep {
    Details,
    Preparation,
    Classification,
}

impl FormStep {
    pub const ALL: &'static [FormStep] = &[
        FormStep::Details,
        FormStep::Preparation,
        FormStep::Classification,
    ];

    /// 1-based position.
    pub fn number(&self) -> usize {
        match self {
            FormStep::Details => 1,
            FormStep::Preparation => 2,
            FormStep::Classification => 3,
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            FormStep::Details => "Start by adding the recipe title and ingredients",
            FormStep::Preparation => "Add the cooking steps for your recipe",
            FormStep::Classification => "Add final details like timing and categories",
        }
    }

    fn next(self) -> Self {
        match self {
            FormStep::Details => FormStep::Preparation,
            FormStep::Preparation | FormStep::Classification => FormStep::Classification,
        }
    }

    fn previous(self) -> Self {
        match self {
            FormStep::Details | FormStep::Preparation => FormStep::Details,
            FormStep::Classification => FormStep::Preparation,
        }
    }
}

/// Result of pressing "Create Recipe".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input validated. The caller should close the form and send the recipe.
    Submitted(NewRecipe),
    /// Input rejected. Errors are kept on the form for display.
    Invalid(ValidationErrors),
}

/// In-progress recipe wizard state. Never persisted.
#[derive(Debug, Clone)]
pub struct RecipeForm {
    step: FormStep,
    input: RecipeInput,
    errors: ValidationErrors,
}

impl Default for RecipeForm {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeForm {
    /// A blank form on step 1 with one empty ingredient row and one empty step row.
    pub fn new() -> Self {
        Self {
            step: FormStep::Details,
            input: RecipeInput {
                ingredients: vec![empty_ingredient()],
                preparation: vec![empty_step()],
                ..RecipeInput::default()
            },
            errors: ValidationErrors::new(),
        }
    }

    pub fn step(&self) -> FormStep {
        self.step
    }

    pub fn input(&self) -> &RecipeInput {
        &self.input
    }

    /// "Create Recipe - Step N of 3"
    pub fn header(&self) -> String {
        format!(
            "Create Recipe - Step {} of {}",
            self.step.number(),
            FormStep::ALL.len()
        )
    }

    pub fn is_last_step(&self) -> bool {
        self.step == FormStep::Classification
    }

    pub fn next(&mut self) {
        self.step = self.step.next();
    }

    pub fn previous(&mut self) {
        self.step = self.step.previous();
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.input.name = value.into();
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.input.description = value.into();
    }

    pub fn set_total_time(&mut self, value: impl Into<String>) {
        self.input.total_time = value.into();
    }

    pub fn set_recipe_type(&mut self, value: impl Into<String>) {
        self.input.recipe_type = value.into();
    }

    pub fn set_cuisine(&mut self, value: impl Into<String>) {
        self.input.cuisine = value.into();
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.input.ingredients
    }

    pub fn steps(&self) -> &[PreparationStep] {
        &self.input.preparation
    }

    pub fn add_ingredient(&mut self) {
        self.input.ingredients.push(empty_ingredient());
    }

    /// Whether the remove control should be offered for ingredient rows.
    pub fn can_remove_ingredient(&self) -> bool {
        self.input.ingredients.len() > 1
    }

    /// Removes the row at `index`. Does nothing when it is the last row or out of range.
    pub fn remove_ingredient(&mut self, index: usize) {
        if self.can_remove_ingredient() && index < self.input.ingredients.len() {
            self.input.ingredients.remove(index);
        }
    }

    pub fn update_ingredient(
        &mut self,
        index: usize,
        field: IngredientField,
        value: impl Into<String>,
    ) {
        if let Some(row) = self.input.ingredients.get_mut(index) {
            match field {
                IngredientField::Name => row.name = value.into(),
                IngredientField::Amount => row.amount = value.into(),
            }
        }
    }

    pub fn add_step(&mut self) {
        self.input.preparation.push(empty_step());
    }

    pub fn can_remove_step(&self) -> bool {
        self.input.preparation.len() > 1
    }

    /// Removes the step at `index`. Does nothing when it is the last step or out of range.
    pub fn remove_step(&mut self, index: usize) {
        if self.can_remove_step() && index < self.input.preparation.len() {
            self.input.preparation.remove(index);
        }
    }

    pub fn update_step(&mut self, index: usize, value: impl Into<String>) {
        if let Some(row) = self.input.preparation.get_mut(index) {
            row.text = value.into();
        }
    }

    /// Errors from the last failed submit.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error_for(&self, path: FieldPath) -> Option<&str> {
        self.errors.get(path)
    }

    /// Validate everything. The step does not change either way.
    pub fn submit(&mut self) -> SubmitOutcome {
        match validate_recipe(&self.input) {
            Ok(recipe) => {
                self.errors = ValidationErrors::new();
                SubmitOutcome::Submitted(recipe)
            }
            Err(errors) => {
                tracing::debug!(fields = errors.len(), "recipe form rejected");
                self.errors = errors.clone();
                SubmitOutcome::Invalid(errors)
            }
        }
    }
}

fn empty_ingredient() -> Ingredient {
    Ingredient {
        name: String::new(),
        amount: String::new(),
    }
}

fn empty_step() -> PreparationStep {
    PreparationStep {
        text: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> RecipeForm {
        let mut form = RecipeForm::new();
        form.set_name("Pasta Night");
        form.update_ingredient(0, IngredientField::Name, "Pasta");
        form.update_ingredient(0, IngredientField::Amount, "1 lb");
        form.next();
        form.update_step(0, "Boil water thoroughly");
        form.next();
        form.set_total_time("30");
        form.set_recipe_type("entree");
        form.set_cuisine("italian");
        form
    }

    #[test]
    fn test_navigation_clamps() {
        let mut form = RecipeForm::new();
        assert_eq!(form.step(), FormStep::Details);
        form.previous();
        assert_eq!(form.step(), FormStep::Details);

        form.next();
        form.next();
        form.next();
        assert_eq!(form.step(), FormStep::Classification);
        assert!(form.is_last_step());
        assert_eq!(form.header(), "Create Recipe - Step 3 of 3");

        form.previous();
        assert_eq!(form.step(), FormStep::Preparation);
    }

    #[test]
    fn test_next_does_not_validate() {
        let mut form = RecipeForm::new();
        form.next();
        form.next();
        assert_eq!(form.step(), FormStep::Classification);
        assert!(form.errors().is_empty());
    }

    #[test]
    fn test_remove_last_ingredient_is_noop() {
        let mut form = RecipeForm::new();
        assert!(!form.can_remove_ingredient());
        form.remove_ingredient(0);
        assert_eq!(form.ingredients().len(), 1);

        form.remove_step(0);
        assert_eq!(form.steps().len(), 1);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut form = RecipeForm::new();
        form.add_ingredient();
        form.add_ingredient();
        for (i, name) in ["Flour", "Sugar", "Eggs"].iter().enumerate() {
            form.update_ingredient(i, IngredientField::Name, *name);
        }
        form.remove_ingredient(1);
        let names: Vec<&str> = form.ingredients().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Flour", "Eggs"]);

        form.remove_ingredient(9);
        assert_eq!(form.ingredients().len(), 2);
    }

    #[test]
    fn test_steps_add_update_remove() {
        let mut form = RecipeForm::new();
        form.add_step();
        form.add_step();
        form.update_step(0, "Preheat the oven");
        form.update_step(2, "Bake for an hour");
        form.remove_step(1);
        let texts: Vec<&str> = form.steps().iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Preheat the oven", "Bake for an hour"]);

        form.update_step(5, "ignored");
        assert_eq!(form.steps().len(), 2);
    }

    #[test]
    fn test_submit_success() {
        let mut form = filled_form();
        match form.submit() {
            SubmitOutcome::Submitted(recipe) => {
                assert_eq!(recipe.name(), "Pasta Night");
                assert_eq!(recipe.ingredients().len(), 1);
                assert_eq!(recipe.preparation()[0].text, "Boil water thoroughly");
            }
            other => panic!("expected submission, got {:?}", other),
        }
    }

    #[test]
    fn test_submit_failure_keeps_step_and_errors() {
        let mut form = filled_form();
        form.previous();
        form.update_step(0, "Boil");
        let outcome = form.submit();
        assert!(matches!(outcome, SubmitOutcome::Invalid(_)));
        assert_eq!(form.step(), FormStep::Preparation);
        assert!(form.error_for(FieldPath::Step(0)).is_some());

        form.update_step(0, "Boil the water");
        assert!(matches!(form.submit(), SubmitOutcome::Submitted(_)));
        assert!(form.errors().is_empty());
    }

    #[test]
    fn test_blank_form_reports_row_errors() {
        let mut form = RecipeForm::new();
        let SubmitOutcome::Invalid(errors) = form.submit() else {
            panic!("blank form should not validate");
        };
        assert!(errors.contains(FieldPath::Name));
        assert!(errors.contains(FieldPath::Ingredient(0, IngredientField::Name)));
        assert!(errors.contains(FieldPath::Step(0)));
    }
}
