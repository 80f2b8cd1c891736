//! # User Profile
//!
//! The single user's dietary profile and the store it persists in. The profile
//! is written once when onboarding completes and read every time a generation
//! request is built.
//!
//! Stores are injected wherever the profile is needed (see
//! [`crate::resolution::RecipeResolutionController`]), so tests can swap the
//! JSON file for [`InMemoryProfileStore`].
//!
//! A stored record that cannot be parsed is treated as "no profile": the
//! caller routes to onboarding instead of failing.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::recipe_model::DetailLevel;

/// Versioned key the profile record lives under
pub const PROFILE_KEY: &str = "user_profile_v1";

/// Language used when a profile does not name one
pub const DEFAULT_LANGUAGE: &str = "zh-TW";

/// Persisted dietary profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub display_name: String,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub dietary_rules: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub detail_level: DetailLevel,
    #[serde(default = "default_language")]
    pub language: String,
    /// Cloud sync opt-in; recorded only, nothing is synced
    #[serde(default)]
    pub opt_in_cloud: bool,
    #[serde(default = "Utc::now", with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl Default for UserProfile {
    /// Profile used for requests made before onboarding has been completed
    fn default() -> Self {
        Self {
            display_name: "廚藝新秀".to_string(),
            allergies: Vec::new(),
            dietary_rules: Vec::new(),
            equipment: vec!["電鍋".to_string(), "炒鍋".to_string(), "烤箱".to_string()],
            detail_level: DetailLevel::Detailed,
            language: default_language(),
            opt_in_cloud: false,
            updated_at: Utc::now(),
        }
    }
}

impl UserProfile {
    /// Whether the profile is complete enough to skip onboarding
    ///
    /// Any non-empty stored name counts; names are validated by the wizard
    /// before they are ever saved.
    pub fn is_onboarded(&self) -> bool {
        !self.display_name.is_empty()
    }

    /// Refresh the modification timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Persistence seam for the user profile
pub trait ProfileStore: Send + Sync {
    /// The stored profile, or `None` when absent or unreadable
    fn load(&self) -> Option<UserProfile>;

    /// Replace the stored profile
    fn save(&self, profile: &UserProfile) -> Result<()>;
}

/// Where the application should start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupRoute {
    Onboarding,
    Home,
}

/// Decide the first screen from what the store holds
pub fn startup_route(store: &dyn ProfileStore) -> StartupRoute {
    match store.load() {
        Some(profile) if profile.is_onboarded() => StartupRoute::Home,
        _ => StartupRoute::Onboarding,
    }
}

/// Decode a raw stored record, treating garbage as absent
fn decode_profile(raw: &str) -> Option<UserProfile> {
    match serde_json::from_str::<UserProfile>(raw) {
        Ok(profile) => Some(profile),
        Err(e) => {
            warn!(error = %e, "Stored profile is malformed, ignoring it");
            None
        }
    }
}

/// Key-value JSON document on disk, profile stored under [`PROFILE_KEY`]
///
/// Other keys in the document are preserved on save.
#[derive(Debug, Clone)]
pub struct JsonFileProfileStore {
    path: PathBuf,
}

impl JsonFileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Option<Map<String, Value>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read profile file {}", self.path.display()))?;
        let document: Value = serde_json::from_str(&content)
            .with_context(|| format!("Profile file {} is not valid JSON", self.path.display()))?;
        match document {
            Value::Object(map) => Ok(Some(map)),
            _ => anyhow::bail!("Profile file {} is not a JSON object", self.path.display()),
        }
    }
}

impl ProfileStore for JsonFileProfileStore {
    fn load(&self) -> Option<UserProfile> {
        let document = match self.read_document() {
            Ok(Some(document)) => document,
            Ok(None) => {
                debug!(path = %self.path.display(), "No profile file yet");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Treating unreadable profile store as empty");
                return None;
            }
        };

        let raw = document.get(PROFILE_KEY)?;
        match serde_json::from_value::<UserProfile>(raw.clone()) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(error = %e, key = PROFILE_KEY, "Stored profile is malformed, ignoring it");
                None
            }
        }
    }

    fn save(&self, profile: &UserProfile) -> Result<()> {
        let mut document = self.read_document().unwrap_or_default().unwrap_or_default();
        document.insert(
            PROFILE_KEY.to_string(),
            serde_json::to_value(profile).context("Failed to serialize profile")?,
        );

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(&Value::Object(document))
            .context("Failed to serialize profile document")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write profile file {}", self.path.display()))?;

        info!(path = %self.path.display(), display_name = %profile.display_name, "Profile saved");
        Ok(())
    }
}

/// In-memory store holding the serialized record, for tests and previews
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    raw: Mutex<Option<String>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a profile
    pub fn with_profile(profile: &UserProfile) -> Result<Self> {
        let store = Self::new();
        store.save(profile)?;
        Ok(store)
    }

    /// Store pre-populated with an arbitrary raw record
    pub fn with_raw(raw: &str) -> Self {
        Self {
            raw: Mutex::new(Some(raw.to_string())),
        }
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn load(&self) -> Option<UserProfile> {
        let guard = self.raw.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.as_deref().and_then(decode_profile)
    }

    fn save(&self, profile: &UserProfile) -> Result<()> {
        let encoded = serde_json::to_string(profile).context("Failed to serialize profile")?;
        let mut guard = self.raw.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(encoded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = UserProfile::default();
        assert_eq!(profile.display_name, "廚藝新秀");
        assert_eq!(profile.equipment.len(), 3);
        assert_eq!(profile.language, "zh-TW");
        assert!(!profile.opt_in_cloud);
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = serde_json::to_value(UserProfile::default()).unwrap();
        assert!(json.get("displayName").is_some());
        assert!(json.get("dietaryRules").is_some());
        assert!(json.get("optInCloud").is_some());
        assert!(json.get("updatedAt").unwrap().is_i64());
    }

    #[test]
    fn test_partial_record_fills_defaults() {
        let profile = decode_profile(r#"{"displayName": "小明"}"#).unwrap();
        assert_eq!(profile.display_name, "小明");
        assert!(profile.allergies.is_empty());
        assert_eq!(profile.detail_level, DetailLevel::Detailed);
    }

    #[test]
    fn test_in_memory_malformed_is_absent() {
        let store = InMemoryProfileStore::with_raw("{not json");
        assert!(store.load().is_none());
        assert_eq!(startup_route(&store), StartupRoute::Onboarding);
    }

    #[test]
    fn test_empty_name_routes_to_onboarding() {
        let store = InMemoryProfileStore::with_raw(r#"{"displayName": ""}"#);
        assert!(store.load().is_some());
        assert_eq!(startup_route(&store), StartupRoute::Onboarding);
    }
}
