//! Locale-keyed values
//!
//! [`LanguageMapping`] is the atomic unit behind every per-locale setting in
//! the tree: path segments, compiled paths, parameter key lists and payload
//! values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A map from locale to value
///
/// # Examples
///
/// ```
/// use rhtmx_routetree::LanguageMapping;
///
/// let segment: LanguageMapping<String> = LanguageMapping::new()
///     .with("de", "ueber-uns")
///     .with("en", "about-us");
///
/// assert_eq!(segment.get("de"), Some(&"ueber-uns".to_string()));
/// assert_eq!(segment.get("fr"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageMapping<T> {
    values: BTreeMap<String, T>,
}

impl<T> Default for LanguageMapping<T> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<T> LanguageMapping<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value for a locale (builder style)
    pub fn with(mut self, locale: impl Into<String>, value: impl Into<T>) -> Self {
        self.values.insert(locale.into(), value.into());
        self
    }

    /// Creates a mapping holding the same value for every given locale
    pub fn uniform<I, S>(locales: I, value: T) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        T: Clone,
    {
        Self {
            values: locales
                .into_iter()
                .map(|locale| (locale.into(), value.clone()))
                .collect(),
        }
    }

    pub fn set(&mut self, locale: impl Into<String>, value: T) {
        self.values.insert(locale.into(), value);
    }

    pub fn get(&self, locale: &str) -> Option<&T> {
        self.values.get(locale)
    }

    pub fn has(&self, locale: &str) -> bool {
        self.values.contains_key(locale)
    }

    pub fn remove(&mut self, locale: &str) -> Option<T> {
        self.values.remove(locale)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Locales with a value, in sorted order
    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.values.iter().map(|(locale, value)| (locale.as_str(), value))
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl<T, S: Into<String>> FromIterator<(S, T)> for LanguageMapping<T> {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(locale, value)| (locale.into(), value))
                .collect(),
        }
    }
}
