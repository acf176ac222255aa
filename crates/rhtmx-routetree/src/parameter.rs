//! Route parameters: named path variables and their value sources

use crate::context::RequestContext;
use crate::language::LanguageMapping;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Resolved parameter values, keyed by parameter name
pub type ParameterMap = BTreeMap<String, String>;

/// External source of parameter values, typically backed by a model layer
///
/// Only `route_keys` is required. `translate_route_key` lets a provider map a
/// key between locales (e.g. a slug stored per language), and `payload` lets
/// it answer payload lookups such as titles for the concrete record.
pub trait ValueProvider: Send + Sync {
    /// Ordered list of possible values for `locale`, given the values already
    /// chosen for other parameters of the root line
    fn route_keys(&self, locale: &str, context: &ParameterMap) -> Vec<String>;

    fn translate_route_key(&self, _key: &str, _from: &str, _to: &str) -> Option<String> {
        None
    }

    fn payload(
        &self,
        _key: &str,
        _parameters: &ParameterMap,
        _locale: &str,
        _action: Option<&str>,
    ) -> Option<Value> {
        None
    }
}

/// Where a parameter's possible values come from
#[derive(Clone, Default)]
pub enum ParameterSource {
    /// No enumerable values; any value matches
    #[default]
    Free,
    /// The same keys for every locale
    Keys(Vec<String>),
    /// Keys per locale; entries at the same index are translations of each other
    LocalizedKeys(LanguageMapping<Vec<String>>),
    /// Values supplied by an external provider
    Provider(Arc<dyn ValueProvider>),
}

impl fmt::Debug for ParameterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterSource::Free => write!(f, "Free"),
            ParameterSource::Keys(keys) => f.debug_tuple("Keys").field(keys).finish(),
            ParameterSource::LocalizedKeys(keys) => {
                f.debug_tuple("LocalizedKeys").field(keys).finish()
            }
            ParameterSource::Provider(_) => write!(f, "Provider(..)"),
        }
    }
}

/// A named path variable owned by a node (or a resource)
#[derive(Debug, Clone)]
pub struct RouteParameter {
    name: String,
    source: ParameterSource,
}

impl RouteParameter {
    /// Creates a parameter without an enumerable value source
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: ParameterSource::Free,
        }
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source = ParameterSource::Keys(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_localized_keys(mut self, keys: LanguageMapping<Vec<String>>) -> Self {
        self.source = ParameterSource::LocalizedKeys(keys);
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn ValueProvider>) -> Self {
        self.source = ParameterSource::Provider(provider);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &ParameterSource {
        &self.source
    }

    /// The `{name}` placeholder this parameter occupies in a path
    pub fn placeholder(&self) -> String {
        format!("{{{}}}", self.name)
    }

    /// Whether the possible values can be listed (sitemaps, expansion)
    pub fn is_enumerable(&self) -> bool {
        !matches!(self.source, ParameterSource::Free)
    }

    pub fn provider(&self) -> Option<&Arc<dyn ValueProvider>> {
        match &self.source {
            ParameterSource::Provider(provider) => Some(provider),
            _ => None,
        }
    }

    /// Possible values for `locale`, in source order
    ///
    /// `context` carries the values already resolved for the other parameters
    /// of the root line, so a provider can scope its keys (articles of one
    /// category, for instance). Free parameters yield no keys.
    pub fn route_keys(&self, locale: &str, context: &ParameterMap) -> Vec<String> {
        match &self.source {
            ParameterSource::Free => Vec::new(),
            ParameterSource::Keys(keys) => keys.clone(),
            ParameterSource::LocalizedKeys(keys) => keys.get(locale).cloned().unwrap_or_default(),
            ParameterSource::Provider(provider) => provider.route_keys(locale, context),
        }
    }

    /// Translates a key from one locale to another
    ///
    /// Falls back to the untranslated key when the source cannot map it.
    pub fn translate_route_key(&self, key: &str, from: &str, to: &str) -> String {
        if from == to {
            return key.to_string();
        }

        let translated = match &self.source {
            ParameterSource::LocalizedKeys(keys) => keys
                .get(from)
                .and_then(|source_keys| source_keys.iter().position(|k| k == key))
                .and_then(|index| keys.get(to).and_then(|target| target.get(index)))
                .cloned(),
            ParameterSource::Provider(provider) => provider.translate_route_key(key, from, to),
            ParameterSource::Free | ParameterSource::Keys(_) => None,
        };

        translated.unwrap_or_else(|| key.to_string())
    }

    /// Value of this parameter on the active request, translated to `locale`
    ///
    /// Returns `None` when the matched route does not carry the parameter.
    pub fn active_route_key(&self, context: &RequestContext, locale: &str) -> Option<String> {
        let value = context.active_parameter(&self.name)?;
        Some(self.translate_route_key(value, context.locale(), locale))
    }
}
