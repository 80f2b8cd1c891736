use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use lazy_static::lazy_static;
use std::collections::HashMap;
use tracing::warn;
use unic_langid::LanguageIdentifier;

/// Language used when none is requested or the requested one is unknown
pub const FALLBACK_LANGUAGE: &str = "zh-TW";

/// Bundled message catalogs, keyed by language tag
const RESOURCES: &[(&str, &str)] = &[
    ("zh-TW", include_str!("../locales/zh-TW/main.ftl")),
    ("en", include_str!("../locales/en/main.ftl")),
];

/// Localization manager for user-facing messages
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a manager with every bundled language loaded
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for (tag, source) in RESOURCES {
            let locale: LanguageIdentifier = tag.parse()?;
            bundles.insert(tag.to_string(), Self::create_bundle(locale, source)?);
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(locale: LanguageIdentifier, source: &str) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Invalid resource for {locale}: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Duplicate messages for {locale}: {errors:?}"))?;

        Ok(bundle)
    }

    /// Resolve a language tag to a loaded one, matching on the primary subtag
    fn resolve_language<'a>(&'a self, language: &'a str) -> &'a str {
        if self.bundles.contains_key(language) {
            return language;
        }

        let primary = language.split(['-', '_']).next().unwrap_or_default();
        self.bundles
            .keys()
            .find(|tag| tag.split('-').next() == Some(primary))
            .map(String::as_str)
            .unwrap_or(FALLBACK_LANGUAGE)
    }

    /// Get a localized message in the given language
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let tag = self.resolve_language(language);
        let Some(bundle) = self.bundles.get(tag) else {
            return format!("Missing translation: {}", key);
        };

        let msg = match bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (k, v) in args {
                fluent_args.set(*k, FluentValue::from(*v));
            }
            fluent_args
        });

        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, fluent_args.as_ref(), &mut errors);
        if !errors.is_empty() {
            warn!(key, language = tag, ?errors, "Problems formatting message");
        }

        value.into_owned()
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, language: &str, args: &[(&str, &str)]) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, language, Some(&args_map))
    }
}

lazy_static! {
    static ref LOCALIZATION_MANAGER: Option<LocalizationManager> = match LocalizationManager::new() {
        Ok(manager) => Some(manager),
        Err(e) => {
            warn!(error = %e, "Bundled translations failed to load");
            None
        }
    };
}

/// Convenience function to get a localized message
pub fn t_lang(key: &str, language: &str) -> String {
    match LOCALIZATION_MANAGER.as_ref() {
        Some(manager) => manager.get_message_in_language(key, language, None),
        None => key.to_string(),
    }
}

/// Convenience function to get a localized message with arguments
pub fn t_args_lang(key: &str, language: &str, args: &[(&str, &str)]) -> String {
    match LOCALIZATION_MANAGER.as_ref() {
        Some(manager) => manager.get_message_with_args(key, language, args),
        None => key.to_string(),
    }
}
