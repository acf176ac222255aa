//! Translation lookup used for segment and payload auto-translation

use std::collections::{BTreeMap, HashMap};

/// Parameters substituted into translated strings (`:name` placeholders)
pub type TranslationParameters = BTreeMap<String, String>;

/// Source of localized strings
///
/// The tree only asks two things: whether a key exists for a locale, and
/// what it translates to. Implementations are expected to be side-effect free.
pub trait Translator: Send + Sync {
    fn has(&self, key: &str, locale: &str) -> bool;

    fn translate(&self, key: &str, parameters: &TranslationParameters, locale: &str) -> String;
}

/// Translator that knows no keys
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTranslator;

impl Translator for NullTranslator {
    fn has(&self, _key: &str, _locale: &str) -> bool {
        false
    }

    fn translate(&self, key: &str, _parameters: &TranslationParameters, _locale: &str) -> String {
        key.to_string()
    }
}

/// In-memory translator backed by `(locale, key) → text` entries
///
/// Placeholders of the form `:name` are replaced by the matching parameter.
///
/// # Examples
///
/// ```
/// use rhtmx_routetree::{MapTranslator, Translator, TranslationParameters};
///
/// let translator = MapTranslator::new()
///     .with("de", "pages.segment.about", "ueber-uns")
///     .with("en", "pages.title.article", "Article :article");
///
/// assert!(translator.has("pages.segment.about", "de"));
/// assert!(!translator.has("pages.segment.about", "en"));
///
/// let mut params = TranslationParameters::new();
/// params.insert("article".to_string(), "rust".to_string());
/// assert_eq!(translator.translate("pages.title.article", &params, "en"), "Article rust");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapTranslator {
    entries: HashMap<String, HashMap<String, String>>,
}

impl MapTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        locale: impl Into<String>,
        key: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.insert(locale, key, text);
        self
    }

    pub fn insert(
        &mut self,
        locale: impl Into<String>,
        key: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.entries
            .entry(locale.into())
            .or_default()
            .insert(key.into(), text.into());
    }
}

impl Translator for MapTranslator {
    fn has(&self, key: &str, locale: &str) -> bool {
        self.entries
            .get(locale)
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    fn translate(&self, key: &str, parameters: &TranslationParameters, locale: &str) -> String {
        let text = self
            .entries
            .get(locale)
            .and_then(|entries| entries.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string());

        // Longest names first so `:id` does not clobber `:identifier`
        let mut names: Vec<&String> = parameters.keys().collect();
        names.sort_by_key(|name| std::cmp::Reverse(name.len()));

        names.into_iter().fold(text, |text, name| {
            text.replace(&format!(":{}", name), &parameters[name])
        })
    }
}
