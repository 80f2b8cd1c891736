//! Onboarding wizard collecting the user's dietary profile.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::recipe_model::DetailLevel;
use crate::user_profile::{UserProfile, DEFAULT_LANGUAGE};

/// Longest accepted display name, in characters
pub const MAX_NAME_CHARS: usize = 40;

pub const ALLERGY_OPTIONS: &[&str] = &["蝦", "蟹", "花生", "牛奶", "蛋", "大豆", "堅果", "麩質"];

pub const DIETARY_RULE_OPTIONS: &[&str] = &[
    "全素食",
    "蛋奶素",
    "不吃牛",
    "低醣 (Low Carb)",
    "低脂",
    "低鈉",
];

pub const EQUIPMENT_OPTIONS: &[&str] = &["電鍋", "氣炸鍋", "烤箱", "微波爐", "平底鍋", "燉鍋"];

/// Wizard pages in order
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnboardingStep {
    #[default]
    Name,
    Allergies,
    DietaryRules,
    Equipment,
    Preferences,
}

impl OnboardingStep {
    /// 1-based page number
    pub fn number(&self) -> usize {
        match self {
            OnboardingStep::Name => 1,
            OnboardingStep::Allergies => 2,
            OnboardingStep::DietaryRules => 3,
            OnboardingStep::Equipment => 4,
            OnboardingStep::Preferences => 5,
        }
    }

    pub const COUNT: usize = 5;

    fn next(self) -> Option<Self> {
        match self {
            OnboardingStep::Name => Some(OnboardingStep::Allergies),
            OnboardingStep::Allergies => Some(OnboardingStep::DietaryRules),
            OnboardingStep::DietaryRules => Some(OnboardingStep::Equipment),
            OnboardingStep::Equipment => Some(OnboardingStep::Preferences),
            OnboardingStep::Preferences => None,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            OnboardingStep::Name => None,
            OnboardingStep::Allergies => Some(OnboardingStep::Name),
            OnboardingStep::DietaryRules => Some(OnboardingStep::Allergies),
            OnboardingStep::Equipment => Some(OnboardingStep::DietaryRules),
            OnboardingStep::Preferences => Some(OnboardingStep::Equipment),
        }
    }
}

/// Multi-select lists on the wizard
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionList {
    Allergies,
    DietaryRules,
    Equipment,
}

/// Why the wizard refused to advance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingError {
    EmptyName,
    NameTooLong,
    AlreadyComplete,
}

impl OnboardingError {
    /// Localization key for the message shown to the user
    pub fn message_key(&self) -> &'static str {
        match self {
            OnboardingError::EmptyName => "onboarding-name-empty",
            OnboardingError::NameTooLong => "onboarding-name-too-long",
            OnboardingError::AlreadyComplete => "onboarding-complete",
        }
    }
}

impl std::fmt::Display for OnboardingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OnboardingError::EmptyName => write!(f, "Display name must not be empty"),
            OnboardingError::NameTooLong => {
                write!(f, "Display name must be at most {MAX_NAME_CHARS} characters")
            }
            OnboardingError::AlreadyComplete => write!(f, "Onboarding is already complete"),
        }
    }
}

impl std::error::Error for OnboardingError {}

/// Validates a display name input
pub fn validate_display_name(name: &str) -> Result<String, OnboardingError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(OnboardingError::EmptyName);
    }

    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(OnboardingError::NameTooLong);
    }

    Ok(trimmed.to_string())
}

/// Outcome of pressing "next"
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Moved on to this page
    Step(OnboardingStep),
    /// Last page confirmed; persist this profile
    Complete(UserProfile),
}

/// Form state across the wizard pages
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OnboardingWizard {
    step: OnboardingStep,
    display_name: String,
    allergies: Vec<String>,
    dietary_rules: Vec<String>,
    equipment: Vec<String>,
    detail_level: DetailLevel,
    opt_in_cloud: bool,
    complete: bool,
}

impl OnboardingWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    /// Fraction of the wizard reached, for the progress bar
    pub fn progress(&self) -> f32 {
        self.step.number() as f32 / OnboardingStep::COUNT as f32
    }

    pub fn set_display_name(&mut self, name: &str) {
        self.display_name = name.to_string();
    }

    pub fn set_detail_level(&mut self, level: DetailLevel) {
        self.detail_level = level;
    }

    pub fn set_opt_in_cloud(&mut self, opt_in: bool) {
        self.opt_in_cloud = opt_in;
    }

    fn list_mut(&mut self, list: SelectionList) -> &mut Vec<String> {
        match list {
            SelectionList::Allergies => &mut self.allergies,
            SelectionList::DietaryRules => &mut self.dietary_rules,
            SelectionList::Equipment => &mut self.equipment,
        }
    }

    pub fn selected(&self, list: SelectionList) -> &[String] {
        match list {
            SelectionList::Allergies => &self.allergies,
            SelectionList::DietaryRules => &self.dietary_rules,
            SelectionList::Equipment => &self.equipment,
        }
    }

    /// Select an item, or deselect it if already selected; returns the new state
    pub fn toggle(&mut self, list: SelectionList, item: &str) -> bool {
        let items = self.list_mut(list);
        if let Some(pos) = items.iter().position(|existing| existing == item) {
            items.remove(pos);
            false
        } else {
            items.push(item.to_string());
            true
        }
    }

    /// Move to the next page; the name page blocks until the name is valid
    pub fn advance(&mut self) -> Result<Advance, OnboardingError> {
        if self.complete {
            return Err(OnboardingError::AlreadyComplete);
        }

        if self.step == OnboardingStep::Name {
            self.display_name = validate_display_name(&self.display_name)?;
        }

        match self.step.next() {
            Some(next) => {
                debug!(step = next.number(), "Onboarding advanced");
                self.step = next;
                Ok(Advance::Step(next))
            }
            None => {
                self.complete = true;
                Ok(Advance::Complete(self.build_profile()))
            }
        }
    }

    /// Go back one page; returns `false` on the first page
    pub fn back(&mut self) -> bool {
        match self.step.previous() {
            Some(previous) if !self.complete => {
                self.step = previous;
                true
            }
            _ => false,
        }
    }

    fn build_profile(&self) -> UserProfile {
        UserProfile {
            display_name: self.display_name.clone(),
            allergies: self.allergies.clone(),
            dietary_rules: self.dietary_rules.clone(),
            equipment: self.equipment.clone(),
            detail_level: self.detail_level,
            language: DEFAULT_LANGUAGE.to_string(),
            opt_in_cloud: self.opt_in_cloud,
            updated_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_validation() {
        assert_eq!(validate_display_name("  阿明 "), Ok("阿明".to_string()));
        assert_eq!(validate_display_name("   "), Err(OnboardingError::EmptyName));
        assert_eq!(
            validate_display_name(&"廚".repeat(MAX_NAME_CHARS + 1)),
            Err(OnboardingError::NameTooLong)
        );
        assert!(validate_display_name(&"廚".repeat(MAX_NAME_CHARS)).is_ok());
    }

    #[test]
    fn test_empty_name_blocks_first_page() {
        let mut wizard = OnboardingWizard::new();
        assert_eq!(wizard.advance(), Err(OnboardingError::EmptyName));
        assert_eq!(wizard.step(), OnboardingStep::Name);
    }

    #[test]
    fn test_toggle() {
        let mut wizard = OnboardingWizard::new();
        assert!(wizard.toggle(SelectionList::Allergies, "蝦"));
        assert!(wizard.toggle(SelectionList::Allergies, "花生"));
        assert!(!wizard.toggle(SelectionList::Allergies, "蝦"));
        assert_eq!(wizard.selected(SelectionList::Allergies), ["花生".to_string()]);
    }

    #[test]
    fn test_back_stops_at_first_page() {
        let mut wizard = OnboardingWizard::new();
        assert!(!wizard.back());
        wizard.set_display_name("阿明");
        wizard.advance().unwrap();
        assert!(wizard.back());
        assert_eq!(wizard.step(), OnboardingStep::Name);
    }
}
