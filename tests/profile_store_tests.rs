//! # Profile Store Tests
//!
//! JSON file persistence of the user profile and the startup routing that
//! depends on it.

use anyhow::Result;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

use recipe_chef::recipe_model::DetailLevel;
use recipe_chef::user_profile::{
    startup_route, InMemoryProfileStore, JsonFileProfileStore, ProfileStore, StartupRoute,
    UserProfile, PROFILE_KEY,
};

fn sample_profile() -> UserProfile {
    UserProfile {
        display_name: "小明".to_string(),
        allergies: vec!["花生".to_string()],
        dietary_rules: vec!["不吃牛".to_string()],
        equipment: vec!["電鍋".to_string()],
        detail_level: DetailLevel::Concise,
        language: "en".to_string(),
        opt_in_cloud: true,
        ..Default::default()
    }
}

#[test]
fn test_missing_file_routes_to_onboarding() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileProfileStore::new(dir.path().join("profile.json"));

    assert!(store.load().is_none());
    assert_eq!(startup_route(&store), StartupRoute::Onboarding);
}

#[test]
fn test_save_and_load_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let store = JsonFileProfileStore::new(dir.path().join("nested/profile.json"));

    let profile = sample_profile();
    store.save(&profile)?;

    let loaded = store.load().expect("profile was just saved");
    assert_eq!(loaded.display_name, "小明");
    assert_eq!(loaded.allergies, profile.allergies);
    assert_eq!(loaded.detail_level, DetailLevel::Concise);
    assert_eq!(
        loaded.updated_at.timestamp_millis(),
        profile.updated_at.timestamp_millis()
    );
    assert_eq!(startup_route(&store), StartupRoute::Home);

    Ok(())
}

#[test]
fn test_profile_is_stored_under_versioned_key() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("profile.json");
    fs::write(&path, r#"{"other_setting": 42}"#)?;

    let store = JsonFileProfileStore::new(&path);
    store.save(&sample_profile())?;

    let document: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(document["other_setting"], json!(42));
    assert_eq!(document[PROFILE_KEY]["displayName"], json!("小明"));
    assert_eq!(document[PROFILE_KEY]["optInCloud"], json!(true));

    Ok(())
}

#[test]
fn test_malformed_record_routes_to_onboarding() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("profile.json");

    fs::write(&path, "not json at all")?;
    let store = JsonFileProfileStore::new(&path);
    assert!(store.load().is_none());
    assert_eq!(startup_route(&store), StartupRoute::Onboarding);

    fs::write(&path, json!({ PROFILE_KEY: { "allergies": "oops" } }).to_string())?;
    assert!(store.load().is_none());

    // A broken file is replaced on the next save
    store.save(&sample_profile())?;
    assert_eq!(startup_route(&store), StartupRoute::Home);

    Ok(())
}

#[test]
fn test_only_an_empty_name_routes_to_onboarding() -> Result<()> {
    let unnamed = UserProfile {
        display_name: String::new(),
        ..Default::default()
    };
    let store = InMemoryProfileStore::with_profile(&unnamed)?;
    assert_eq!(startup_route(&store), StartupRoute::Onboarding);

    let spaces = UserProfile {
        display_name: "  ".to_string(),
        ..Default::default()
    };
    let store = InMemoryProfileStore::with_profile(&spaces)?;
    assert_eq!(startup_route(&store), StartupRoute::Home);

    let garbage = InMemoryProfileStore::with_raw("{\"displayName\": 7}");
    assert_eq!(startup_route(&garbage), StartupRoute::Onboarding);

    Ok(())
}

#[test]
fn test_missing_optional_fields_take_defaults() {
    let store = InMemoryProfileStore::with_raw(r#"{"displayName": "阿華"}"#);
    let profile = store.load().expect("minimal record decodes");

    assert_eq!(profile.display_name, "阿華");
    assert_eq!(profile.language, "zh-TW");
    assert_eq!(profile.detail_level, DetailLevel::Detailed);
    assert!(profile.allergies.is_empty());
}
