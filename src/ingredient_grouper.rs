//! # Ingredient Grouper
//!
//! Splits a recipe's ingredient list into the three sections shown on the
//! detail view. The generation service marks grouping by prefixing a name with
//! a bracketed tag:
//!
//! | Tag | Group |
//! |-----|-------|
//! | 【備料】 / 【主料】 | [`IngredientGroup::Main`] |
//! | 【輔料】 / 【配料】 | [`IngredientGroup::Auxiliary`] |
//! | 【調味】 / 【調味料】 | [`IngredientGroup::Seasoning`] |
//!
//! Square brackets (`[調味]`) are accepted as well. Untagged names land in
//! `Main`. Tags are stripped from the displayed name and each amount is run
//! through the quantity scaler in the same pass.
//!
//! ## Usage
//!
//! ```rust
//! use recipe_chef::ingredient_grouper::group_ingredients;
//! use recipe_chef::recipe_model::Ingredient;
//!
//! let ingredients = vec![
//!     Ingredient::new("雞蛋", "2 顆"),
//!     Ingredient::new("【調味】鹽", "1 克"),
//! ];
//!
//! let grouped = group_ingredients(&ingredients, 2.0);
//! assert_eq!(grouped.main[0].amount, "4 顆");
//! assert_eq!(grouped.seasoning[0].name, "鹽");
//! assert_eq!(grouped.seasoning[0].amount, "2 克");
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::quantity_scaler::scale_amount;
use crate::recipe_model::Ingredient;

/// Presentation bucket for an ingredient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IngredientGroup {
    /// Main and preparatory ingredients
    Main,
    /// Supporting ingredients
    Auxiliary,
    /// Sauces and seasonings
    Seasoning,
}

/// Tag label (without brackets) and the group it selects
const GROUP_TAGS: &[(&str, IngredientGroup)] = &[
    ("備料", IngredientGroup::Main),
    ("主料", IngredientGroup::Main),
    ("輔料", IngredientGroup::Auxiliary),
    ("配料", IngredientGroup::Auxiliary),
    ("調味料", IngredientGroup::Seasoning),
    ("調味", IngredientGroup::Seasoning),
];

const BRACKETS: &[(char, char)] = &[('【', '】'), ('[', ']')];

/// Classify an ingredient name and return it with the tag removed
///
/// # Examples
///
/// ```rust
/// use recipe_chef::ingredient_grouper::{classify, IngredientGroup};
///
/// assert_eq!(classify("【調味】醬油"), (IngredientGroup::Seasoning, "醬油".to_string()));
/// assert_eq!(classify("豬肉"), (IngredientGroup::Main, "豬肉".to_string()));
/// ```
pub fn classify(name: &str) -> (IngredientGroup, String) {
    let trimmed = name.trim_start();

    for (open, close) in BRACKETS {
        let Some(inner) = trimmed.strip_prefix(*open) else {
            continue;
        };
        let Some((label, rest)) = inner.split_once(*close) else {
            continue;
        };
        let label = label.trim();
        if let Some((_, group)) = GROUP_TAGS.iter().find(|(tag, _)| *tag == label) {
            return (*group, rest.trim().to_string());
        }
    }

    (IngredientGroup::Main, name.trim().to_string())
}

/// Ingredients partitioned into display sections, original order preserved
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedIngredients {
    pub main: Vec<Ingredient>,
    pub auxiliary: Vec<Ingredient>,
    pub seasoning: Vec<Ingredient>,
}

impl GroupedIngredients {
    /// Total number of ingredients across all sections
    pub fn len(&self) -> usize {
        self.main.len() + self.auxiliary.len() + self.seasoning.len()
    }

    /// Whether every section is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ingredients of one section
    pub fn group(&self, group: IngredientGroup) -> &[Ingredient] {
        match group {
            IngredientGroup::Main => &self.main,
            IngredientGroup::Auxiliary => &self.auxiliary,
            IngredientGroup::Seasoning => &self.seasoning,
        }
    }

    fn push(&mut self, group: IngredientGroup, ingredient: Ingredient) {
        match group {
            IngredientGroup::Main => self.main.push(ingredient),
            IngredientGroup::Auxiliary => self.auxiliary.push(ingredient),
            IngredientGroup::Seasoning => self.seasoning.push(ingredient),
        }
    }
}

/// Group and scale in a single pass; the input is never modified
pub fn group_ingredients(ingredients: &[Ingredient], ratio: f64) -> GroupedIngredients {
    let mut grouped = GroupedIngredients::default();

    for ingredient in ingredients {
        let (group, name) = classify(&ingredient.name);
        grouped.push(
            group,
            Ingredient {
                name,
                amount: scale_amount(&ingredient.amount, ratio),
                optional: ingredient.optional,
                adjustable_note: ingredient.adjustable_note.clone(),
            },
        );
    }

    grouped
}

/// Memoized [`group_ingredients`] keyed on the ingredient list and the ratio
///
/// The cached result is reused until either input changes.
#[derive(Debug, Default)]
pub struct GroupingMemo {
    key: Option<(Vec<Ingredient>, u64)>,
    value: GroupedIngredients,
    computations: usize,
}

impl GroupingMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grouped ingredients for `(ingredients, ratio)`, recomputed only on change
    pub fn get(&mut self, ingredients: &[Ingredient], ratio: f64) -> &GroupedIngredients {
        let ratio_bits = ratio.to_bits();
        let fresh = matches!(
            &self.key,
            Some((cached, bits)) if *bits == ratio_bits && cached.as_slice() == ingredients
        );

        if !fresh {
            debug!(ingredients = ingredients.len(), ratio, "Regrouping ingredients");
            self.value = group_ingredients(ingredients, ratio);
            self.key = Some((ingredients.to_vec(), ratio_bits));
            self.computations += 1;
        }

        &self.value
    }

    /// How many times the grouping has actually been computed
    pub fn computations(&self) -> usize {
        self.computations
    }
}
