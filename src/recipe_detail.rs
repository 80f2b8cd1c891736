//! Serving adjustment state for the recipe detail view.

use crate::ingredient_grouper::{GroupedIngredients, GroupingMemo};
use crate::quantity_scaler::serving_ratio;
use crate::recipe_model::Recipe;

/// Smallest serving count the adjuster allows
pub const MIN_SERVINGS: u32 = 1;

/// A recipe on screen together with the servings the user asked for
///
/// The recipe itself is never modified; scaled amounts are derived from its
/// base values on every read.
#[derive(Debug)]
pub struct RecipeDetail {
    recipe: Recipe,
    servings: u32,
    memo: GroupingMemo,
}

impl RecipeDetail {
    /// Open a recipe at its own serving count
    pub fn new(recipe: Recipe) -> Self {
        let servings = recipe.servings.max(MIN_SERVINGS);
        Self {
            recipe,
            servings,
            memo: GroupingMemo::new(),
        }
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn servings(&self) -> u32 {
        self.servings
    }

    /// Set the desired servings, clamped to [`MIN_SERVINGS`]
    pub fn set_servings(&mut self, servings: u32) {
        self.servings = servings.max(MIN_SERVINGS);
    }

    /// Step the desired servings up or down, never below [`MIN_SERVINGS`]
    pub fn adjust_servings(&mut self, delta: i32) -> u32 {
        let next = i64::from(self.servings) + i64::from(delta);
        self.servings = u32::try_from(next.max(i64::from(MIN_SERVINGS))).unwrap_or(u32::MAX);
        self.servings
    }

    /// Desired servings divided by the recipe's base servings
    pub fn ratio(&self) -> f64 {
        serving_ratio(self.servings, self.recipe.servings)
    }

    /// Ingredients grouped and scaled for the current servings
    pub fn grouped(&mut self) -> &GroupedIngredients {
        let ratio = self.ratio();
        self.memo.get(&self.recipe.ingredients, ratio)
    }

    /// Calorie estimate for the current servings, whole kcal
    pub fn scaled_calories(&self) -> f64 {
        (self.recipe.calories_estimate_kcal * self.ratio()).round()
    }
}
