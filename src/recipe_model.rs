//! # Recipe Data Model
//!
//! This module defines the value types exchanged between the recipe catalog,
//! the external generation service and the detail view. Field names follow the
//! JSON shape the generation service returns, so a response body deserializes
//! straight into these types.
//!
//! ## Core Concepts
//!
//! - **Recipe**: A fully detailed dish with ingredients, substitutions and steps
//! - **Ingredient**: A free-text name and amount; the name may carry a group tag
//! - **Step**: A numbered cooking step with an optional countdown timer
//! - **SeedRecipe**: A bundled stub that only primes a generation request
//!
//! ## Usage
//!
//! ```rust
//! use recipe_chef::recipe_model::{Category, Ingredient, Recipe, Step};
//!
//! let recipe = Recipe::new("demo-1", "番茄炒蛋", Category::Rice)
//!     .with_servings(2)
//!     .with_ingredient(Ingredient::new("雞蛋", "3 顆"))
//!     .with_step(Step::new(1, "打蛋", "將蛋打散"));
//!
//! assert_eq!(recipe.ingredients.len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dish category used for browsing and as a generation preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Noodle dishes
    #[serde(rename = "麵類", alias = "noodles")]
    Noodles,
    /// Rice dishes
    #[serde(rename = "飯類", alias = "rice")]
    Rice,
    /// Soups
    #[serde(rename = "湯品", alias = "soup")]
    Soup,
    /// Hot pots
    #[serde(rename = "火鍋", alias = "hotpot")]
    Hotpot,
    /// Desserts
    #[serde(rename = "甜點", alias = "dessert")]
    Dessert,
}

impl Category {
    /// Every category in browse order
    pub const ALL: [Category; 5] = [
        Category::Noodles,
        Category::Rice,
        Category::Soup,
        Category::Hotpot,
        Category::Dessert,
    ];

    /// Display label, identical to the wire name
    pub fn label(&self) -> &'static str {
        match self {
            Category::Noodles => "麵類",
            Category::Rice => "飯類",
            Category::Soup => "湯品",
            Category::Hotpot => "火鍋",
            Category::Dessert => "甜點",
        }
    }

    /// Parse either the display label or the English key (case-insensitive)
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        Self::ALL.into_iter().find(|category| {
            category.label() == trimmed || category.key().eq_ignore_ascii_case(trimmed)
        })
    }

    /// Stable ASCII key, used on the command line
    pub fn key(&self) -> &'static str {
        match self {
            Category::Noodles => "noodles",
            Category::Rice => "rice",
            Category::Soup => "soup",
            Category::Hotpot => "hotpot",
            Category::Dessert => "dessert",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Where a recipe came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Bundled seed catalog entry
    Seed,
    /// Produced by the generation service
    #[default]
    Ai,
}

/// How far a substitution departs from the original ingredient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

/// How verbose generated steps should be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    #[default]
    Detailed,
    Concise,
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailLevel::Detailed => write!(f, "detailed"),
            DetailLevel::Concise => write!(f, "concise"),
        }
    }
}

/// Confidence reported for a detected ingredient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Low,
}

/// An ingredient the generation service reports having recognised
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedIngredient {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub confidence: Confidence,
}

/// A single ingredient line of a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Display name, possibly prefixed with a group tag such as 【調味】
    #[serde(default)]
    pub name: String,

    /// Free-text amount (e.g. "2 顆", "1.5 杯", "100-150 克")
    #[serde(default)]
    pub amount: String,

    /// Whether the dish works without it
    #[serde(default)]
    pub optional: bool,

    /// Hint on how the amount can be adjusted to taste
    #[serde(default)]
    pub adjustable_note: String,
}

/// A suggested replacement for an ingredient the user lacks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    #[serde(default)]
    pub missing: String,
    #[serde(default)]
    pub substitute: String,
    #[serde(default)]
    pub severity: Severity,
}

/// One numbered cooking step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based step number; 0 when the service left it out
    #[serde(default)]
    pub step: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub estimated_minutes: u32,
    /// Countdown length; `None` means the step offers no timer
    #[serde(default)]
    pub timer_seconds: Option<f64>,
}

/// A fully detailed recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub recipe_id: String,
    #[serde(default)]
    pub source: Provenance,
    pub title: String,
    pub category: Category,
    #[serde(default)]
    pub short_description: String,
    #[serde(default = "default_servings")]
    pub servings: u32,
    #[serde(default)]
    pub total_time_minutes: u32,
    #[serde(default)]
    pub calories_estimate_kcal: f64,
    /// Confidence marker for the calorie figure; the service always says "estimate"
    #[serde(default = "default_calories_confidence")]
    pub calories_confidence: String,
    #[serde(default)]
    pub equipment_needed: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub missing_or_substitutions: Vec<Substitution>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub safety_notes: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
}

fn default_servings() -> u32 {
    1
}

fn default_calories_confidence() -> String {
    "estimate".to_string()
}

/// A bundled catalog entry used only to prime a generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRecipe {
    pub recipe_id: String,
    pub title: String,
    pub category: Category,
    pub short_description: String,
    pub servings: u32,
    pub total_time_minutes: u32,
    pub calories_estimate_kcal: f64,
    pub equipment_needed: Vec<String>,
    /// Raw ingredient names, no amounts
    pub seed_ingredients: Vec<String>,
    pub rating: Option<f32>,
    pub review_count: Option<u32>,
}

impl Ingredient {
    /// Create an ingredient with a name and a free-text amount
    pub fn new(name: &str, amount: &str) -> Self {
        Self {
            name: name.to_string(),
            amount: amount.to_string(),
            optional: false,
            adjustable_note: String::new(),
        }
    }

    /// Mark this ingredient as optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Attach an adjustment hint
    pub fn with_note(mut self, note: &str) -> Self {
        self.adjustable_note = note.to_string();
        self
    }
}

impl Step {
    /// Create a step without a timer
    pub fn new(step: u32, title: &str, text: &str) -> Self {
        Self {
            step,
            title: title.to_string(),
            text: text.to_string(),
            estimated_minutes: 0,
            timer_seconds: None,
        }
    }

    /// Attach a countdown timer
    pub fn with_timer(mut self, seconds: u32) -> Self {
        self.timer_seconds = Some(f64::from(seconds));
        self
    }

    /// Timer length in whole seconds, if the step has a usable timer
    pub fn timer_duration_secs(&self) -> Option<u64> {
        self.timer_seconds
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(|secs| secs.round() as u64)
    }
}

impl Recipe {
    /// Create an empty AI recipe with the given identity
    pub fn new(recipe_id: &str, title: &str, category: Category) -> Self {
        Self {
            recipe_id: recipe_id.to_string(),
            source: Provenance::Ai,
            title: title.to_string(),
            category,
            short_description: String::new(),
            servings: 1,
            total_time_minutes: 0,
            calories_estimate_kcal: 0.0,
            calories_confidence: default_calories_confidence(),
            equipment_needed: Vec::new(),
            ingredients: Vec::new(),
            missing_or_substitutions: Vec::new(),
            steps: Vec::new(),
            safety_notes: Vec::new(),
            tags: Vec::new(),
            rating: None,
            review_count: None,
        }
    }

    /// Set the base serving count
    pub fn with_servings(mut self, servings: u32) -> Self {
        self.servings = servings;
        self
    }

    /// Append an ingredient
    pub fn with_ingredient(mut self, ingredient: Ingredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }

    /// Append a step
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Set the calorie estimate
    pub fn with_calories(mut self, kcal: f64) -> Self {
        self.calories_estimate_kcal = kcal;
        self
    }

    /// Whether the recipe has any steps to cook through
    pub fn has_steps(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Number unnumbered steps by their position
    pub fn fill_step_numbers(&mut self) {
        for (index, step) in self.steps.iter_mut().enumerate() {
            if step.step == 0 {
                step.step = u32::try_from(index + 1).unwrap_or(u32::MAX);
            }
        }
    }
}

impl SeedRecipe {
    /// Free-text description embedded in a seed-based generation request
    pub fn prompt_description(&self) -> String {
        format!(
            "參考食譜「{}」：{}。主要食材：{}。",
            self.title,
            self.short_description,
            self.seed_ingredients.join("、")
        )
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.amount.is_empty() {
            write!(f, "{}", self.name)?;
        } else {
            write!(f, "{} {}", self.name, self.amount)?;
        }

        if self.optional {
            write!(f, " (optional)")?;
        }

        Ok(())
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} 人份, {} 分鐘, {:.0} kcal",
            self.title, self.category, self.servings, self.total_time_minutes, self.calories_estimate_kcal
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_names() {
        let json = serde_json::to_string(&Category::Soup).unwrap();
        assert_eq!(json, "\"湯品\"");

        let parsed: Category = serde_json::from_str("\"hotpot\"").unwrap();
        assert_eq!(parsed, Category::Hotpot);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("麵類"), Some(Category::Noodles));
        assert_eq!(Category::parse("Dessert"), Some(Category::Dessert));
        assert_eq!(Category::parse("pizza"), None);
    }

    #[test]
    fn test_recipe_deserializes_with_missing_optional_fields() {
        let json = r#"{
            "recipe_id": "r1",
            "title": "蛋炒飯",
            "category": "飯類",
            "servings": 2,
            "steps": [{"step": 1, "title": "炒", "text": "下鍋", "estimated_minutes": 3, "timer_seconds": null}]
        }"#;

        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.source, Provenance::Ai);
        assert_eq!(recipe.calories_confidence, "estimate");
        assert!(recipe.ingredients.is_empty());
        assert_eq!(recipe.steps[0].timer_seconds, None);
    }

    #[test]
    fn test_sparse_steps_and_substitutions_deserialize() {
        let json = r#"{
            "recipe_id": "r2",
            "title": "炒青菜",
            "category": "飯類",
            "ingredients": [{"amount": "1 把"}],
            "missing_or_substitutions": [{"substitute": "醬油"}],
            "steps": [{"title": "洗", "text": "洗菜"}, {"step": 2, "title": "炒", "text": "下鍋"}, {"title": "盛", "text": "起鍋"}]
        }"#;

        let mut recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.ingredients[0].name, "");
        assert_eq!(recipe.missing_or_substitutions[0].missing, "");
        assert_eq!(recipe.missing_or_substitutions[0].substitute, "醬油");
        assert_eq!(recipe.steps[0].step, 0);

        recipe.fill_step_numbers();
        let numbers: Vec<u32> = recipe.steps.iter().map(|s| s.step).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_step_timer_duration() {
        assert_eq!(Step::new(1, "a", "b").timer_duration_secs(), None);
        assert_eq!(Step::new(1, "a", "b").with_timer(90).timer_duration_secs(), Some(90));

        let mut step = Step::new(2, "a", "b");
        step.timer_seconds = Some(0.0);
        assert_eq!(step.timer_duration_secs(), None);
    }

    #[test]
    fn test_seed_prompt_description() {
        let seed = SeedRecipe {
            recipe_id: "seed-x".to_string(),
            title: "咖哩飯".to_string(),
            category: Category::Rice,
            short_description: "濃郁".to_string(),
            servings: 2,
            total_time_minutes: 40,
            calories_estimate_kcal: 700.0,
            equipment_needed: vec![],
            seed_ingredients: vec!["咖哩塊".to_string(), "馬鈴薯".to_string()],
            rating: None,
            review_count: None,
        };

        let description = seed.prompt_description();
        assert!(description.contains("咖哩飯"));
        assert!(description.contains("濃郁"));
        assert!(description.contains("咖哩塊、馬鈴薯"));
    }

    #[test]
    fn test_ingredient_display() {
        let ingredient = Ingredient::new("蔥", "1 根").optional();
        assert_eq!(format!("{}", ingredient), "蔥 1 根 (optional)");
    }
}
