//! # Seed Catalog
//!
//! Static, read-only recipe stubs bundled with the application. Seeds carry
//! only a title, summary and raw ingredient names; selecting one asks the
//! generation service for fully detailed variations.

use lazy_static::lazy_static;

use crate::recipe_model::{Category, SeedRecipe};

/// Number of entries in the home ranking
pub const TOP_RANKING_SIZE: usize = 5;

/// Ordering options for the home ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankingOrder {
    /// Rating weighted by review volume
    #[default]
    Overall,
    HighestRated,
    MostReviewed,
}

#[allow(clippy::too_many_arguments)]
fn seed(
    id: &str,
    title: &str,
    category: Category,
    description: &str,
    servings: u32,
    minutes: u32,
    kcal: f64,
    equipment: &[&str],
    ingredients: &[&str],
    rating: f32,
    reviews: u32,
) -> SeedRecipe {
    SeedRecipe {
        recipe_id: id.to_string(),
        title: title.to_string(),
        category,
        short_description: description.to_string(),
        servings,
        total_time_minutes: minutes,
        calories_estimate_kcal: kcal,
        equipment_needed: equipment.iter().map(|s| s.to_string()).collect(),
        seed_ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
        rating: Some(rating),
        review_count: Some(reviews),
    }
}

lazy_static! {
    static ref SEEDS: Vec<SeedRecipe> = vec![
        seed("seed-1", "日式黃金咖哩飯", Category::Rice, "濃郁咖哩香氣，經典家常料理。",
             2, 40, 750.0, &["電鍋"], &["咖哩塊", "馬鈴薯", "紅蘿蔔", "洋蔥", "雞腿肉", "白飯"], 4.8, 125),
        seed("seed-2", "清燉番茄牛肉麵", Category::Noodles, "番茄清甜與軟嫩牛肉的完美結合。",
             2, 90, 620.0, &["燉鍋"], &["牛腱", "番茄", "洋蔥", "薑", "麵條"], 4.9, 89),
        seed("seed-3", "蒜香蛤蜊雞湯", Category::Soup, "鮮甜海味，暖心補身首選。",
             4, 50, 350.0, &["湯鍋"], &["蛤蜊", "雞腿", "蒜頭", "薑片", "米酒"], 4.7, 56),
        seed("seed-4", "麻辣鴛鴦火鍋", Category::Hotpot, "一鍋兩味，麻辣與清湯一次滿足。",
             4, 60, 900.0, &["湯鍋"], &["火鍋底料", "豬五花", "豆腐", "高麗菜", "金針菇"], 4.6, 74),
        seed("seed-5", "蜂蜜檸檬奶酪", Category::Dessert, "清爽酸甜，冰涼滑順的飯後甜點。",
             4, 20, 280.0, &["小湯鍋"], &["鮮奶", "鮮奶油", "吉利丁", "蜂蜜", "檸檬"], 4.5, 41),
        seed("seed-6", "三杯雞炊飯", Category::Rice, "九層塔香氣十足的一鍋到底炊飯。",
             3, 45, 680.0, &["電鍋"], &["雞腿肉", "九層塔", "米", "麻油", "醬油"], 4.4, 38),
        seed("seed-7", "古早味麻油麵線", Category::Noodles, "薑香麻油暖胃暖身。",
             2, 20, 520.0, &["炒鍋"], &["麵線", "麻油", "老薑", "雞蛋"], 4.3, 27),
    ];
}

/// Every seed, in catalog order
pub fn all() -> &'static [SeedRecipe] {
    &SEEDS
}

/// Seeds of one category, in catalog order
pub fn by_category(category: Category) -> Vec<&'static SeedRecipe> {
    SEEDS.iter().filter(|seed| seed.category == category).collect()
}

/// Look up a seed by identifier
pub fn find(recipe_id: &str) -> Option<&'static SeedRecipe> {
    SEEDS.iter().find(|seed| seed.recipe_id == recipe_id)
}

fn overall_score(seed: &SeedRecipe) -> f64 {
    let rating = f64::from(seed.rating.unwrap_or(0.0));
    let reviews = f64::from(seed.review_count.unwrap_or(0));
    rating * (1.0 + reviews).ln()
}

/// Best seeds under the given order, at most `limit` entries
pub fn top_ranked(limit: usize, order: RankingOrder) -> Vec<&'static SeedRecipe> {
    let mut ranked: Vec<&'static SeedRecipe> = SEEDS.iter().collect();

    match order {
        RankingOrder::Overall => ranked.sort_by(|a, b| overall_score(b).total_cmp(&overall_score(a))),
        RankingOrder::HighestRated => ranked.sort_by(|a, b| {
            b.rating.unwrap_or(0.0).total_cmp(&a.rating.unwrap_or(0.0))
        }),
        RankingOrder::MostReviewed => {
            ranked.sort_by_key(|seed| std::cmp::Reverse(seed.review_count.unwrap_or(0)))
        }
    }

    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_a_seed() {
        for category in Category::ALL {
            assert!(!by_category(category).is_empty(), "no seed for {category}");
        }
    }

    #[test]
    fn test_seed_ids_are_unique() {
        let mut ids: Vec<&str> = all().iter().map(|s| s.recipe_id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), all().len());
    }

    #[test]
    fn test_find() {
        assert_eq!(find("seed-2").map(|s| s.category), Some(Category::Noodles));
        assert!(find("missing").is_none());
    }

    #[test]
    fn test_top_ranked_orders() {
        let top = top_ranked(TOP_RANKING_SIZE, RankingOrder::HighestRated);
        assert_eq!(top.len(), TOP_RANKING_SIZE);
        assert_eq!(top[0].recipe_id, "seed-2");

        let most = top_ranked(1, RankingOrder::MostReviewed);
        assert_eq!(most[0].recipe_id, "seed-1");

        let overall = top_ranked(1, RankingOrder::Overall);
        assert_eq!(overall[0].recipe_id, "seed-1");
    }
}
