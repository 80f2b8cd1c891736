use anyhow::Result;

use recipe_chef::localization::t_lang;
use recipe_chef::onboarding::{
    validate_display_name, Advance, OnboardingError, OnboardingStep, OnboardingWizard, SelectionList,
    MAX_NAME_CHARS,
};
use recipe_chef::recipe_model::DetailLevel;
use recipe_chef::user_profile::{startup_route, InMemoryProfileStore, ProfileStore, StartupRoute};

/// Display name validation on the first onboarding page
#[tokio::test]
async fn test_display_name_validation() -> Result<()> {
    assert_eq!(validate_display_name("  小明  "), Ok("小明".to_string()));
    assert_eq!(validate_display_name(""), Err(OnboardingError::EmptyName));
    assert_eq!(validate_display_name("   "), Err(OnboardingError::EmptyName));
    assert_eq!(
        validate_display_name(&"廚".repeat(MAX_NAME_CHARS + 1)),
        Err(OnboardingError::NameTooLong)
    );
    assert!(validate_display_name(&"廚".repeat(MAX_NAME_CHARS)).is_ok());

    Ok(())
}

/// Full wizard run ending in a saved profile and a home-screen start
#[tokio::test]
async fn test_onboarding_completes_into_store() -> Result<()> {
    let store = InMemoryProfileStore::new();
    assert_eq!(startup_route(&store), StartupRoute::Onboarding);

    let mut wizard = OnboardingWizard::new();
    assert_eq!(wizard.advance(), Err(OnboardingError::EmptyName));
    assert_eq!(wizard.step(), OnboardingStep::Name);

    wizard.set_display_name("小明");
    assert_eq!(wizard.advance()?, Advance::Step(OnboardingStep::Allergies));
    wizard.toggle(SelectionList::Allergies, "花生");
    wizard.toggle(SelectionList::Allergies, "蝦");
    wizard.toggle(SelectionList::Allergies, "蝦");

    assert_eq!(wizard.advance()?, Advance::Step(OnboardingStep::DietaryRules));
    assert!(wizard.back());
    assert_eq!(wizard.step(), OnboardingStep::Allergies);
    assert_eq!(wizard.selected(SelectionList::Allergies), ["花生".to_string()]);

    wizard.advance()?;
    wizard.advance()?;
    wizard.toggle(SelectionList::Equipment, "氣炸鍋");
    assert_eq!(wizard.advance()?, Advance::Step(OnboardingStep::Preferences));
    wizard.set_detail_level(DetailLevel::Concise);

    let profile = match wizard.advance()? {
        Advance::Complete(profile) => profile,
        other => panic!("Expected completion, got {other:?}"),
    };
    assert_eq!(profile.display_name, "小明");
    assert_eq!(profile.allergies, vec!["花生".to_string()]);
    assert!(profile.equipment.contains(&"氣炸鍋".to_string()));
    assert_eq!(profile.detail_level, DetailLevel::Concise);
    assert_eq!(wizard.advance(), Err(OnboardingError::AlreadyComplete));

    store.save(&profile)?;
    assert_eq!(startup_route(&store), StartupRoute::Home);

    Ok(())
}

#[tokio::test]
async fn test_errors_map_to_localized_messages() -> Result<()> {
    for error in [
        OnboardingError::EmptyName,
        OnboardingError::NameTooLong,
        OnboardingError::AlreadyComplete,
    ] {
        let message = t_lang(error.message_key(), "en");
        assert!(!message.starts_with("Missing translation"), "{error:?}");
    }

    Ok(())
}
