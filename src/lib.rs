//! # Recipe Chef
//!
//! Turns a list of ingredients (or a seed recipe from the bundled catalog)
//! into AI-generated recipe candidates that respect the user's dietary
//! profile, then presents them grouped, scaled to the desired servings and
//! ready for a step-by-step cook mode.

pub mod circuit_breaker;
pub mod cli;
pub mod cook_mode;
pub mod gemini_client;
pub mod generation;
pub mod generation_config;
pub mod ingredient_capture;
pub mod ingredient_grouper;
pub mod localization;
pub mod onboarding;
pub mod quantity_scaler;
pub mod recipe_detail;
pub mod recipe_model;
pub mod resolution;
pub mod seed_catalog;
pub mod user_profile;
