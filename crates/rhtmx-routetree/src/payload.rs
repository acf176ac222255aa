//! Arbitrary per-node and per-action metadata (titles, sitemap hints, ...)

use crate::language::LanguageMapping;
use crate::parameter::ParameterMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Closure computing a payload value from the route parameters and locale
pub type ComputedPayload = Arc<dyn Fn(&ParameterMap, &str) -> Option<Value> + Send + Sync>;

/// A single payload entry
#[derive(Clone)]
pub enum PayloadValue {
    /// Same value for every locale
    Plain(Value),
    /// One value per locale
    Localized(LanguageMapping<Value>),
    /// Computed on demand from `(parameters, locale)`
    Computed(ComputedPayload),
}

impl PayloadValue {
    /// Resolves the entry for a locale
    pub fn resolve(&self, parameters: &ParameterMap, locale: &str) -> Option<Value> {
        match self {
            PayloadValue::Plain(value) => Some(value.clone()),
            PayloadValue::Localized(values) => values.get(locale).cloned(),
            PayloadValue::Computed(compute) => compute(parameters, locale),
        }
    }
}

impl fmt::Debug for PayloadValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadValue::Plain(value) => f.debug_tuple("Plain").field(value).finish(),
            PayloadValue::Localized(values) => f.debug_tuple("Localized").field(values).finish(),
            PayloadValue::Computed(_) => write!(f, "Computed(..)"),
        }
    }
}

impl From<Value> for PayloadValue {
    fn from(value: Value) -> Self {
        PayloadValue::Plain(value)
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        PayloadValue::Plain(Value::String(value.to_string()))
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        PayloadValue::Plain(Value::String(value))
    }
}

impl From<LanguageMapping<Value>> for PayloadValue {
    fn from(values: LanguageMapping<Value>) -> Self {
        PayloadValue::Localized(values)
    }
}

impl From<LanguageMapping<String>> for PayloadValue {
    fn from(values: LanguageMapping<String>) -> Self {
        PayloadValue::Localized(
            values
                .iter()
                .map(|(locale, value)| (locale, Value::String(value.clone())))
                .collect(),
        )
    }
}

/// Named payload entries of a node or an action
#[derive(Debug, Clone, Default)]
pub struct RoutePayload {
    entries: BTreeMap<String, PayloadValue>,
}

impl RoutePayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PayloadValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Stores a value computed from `(parameters, locale)` at lookup time
    pub fn set_computed<F>(&mut self, key: impl Into<String>, compute: F)
    where
        F: Fn(&ParameterMap, &str) -> Option<Value> + Send + Sync + 'static,
    {
        self.entries
            .insert(key.into(), PayloadValue::Computed(Arc::new(compute)));
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn entry(&self, key: &str) -> Option<&PayloadValue> {
        self.entries.get(key)
    }

    /// Resolves a directly set entry, without any fallback
    pub fn get(&self, key: &str, parameters: &ParameterMap, locale: &str) -> Option<Value> {
        self.entries
            .get(key)
            .and_then(|value| value.resolve(parameters, locale))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// One step of the payload fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PayloadResolver {
    /// Entry on the action's own payload
    Action,
    /// Entry on the owning node's payload
    Node,
    /// Answer from the value provider of the node's parameter
    Provider,
    /// Auto-translation under the node's locale-file path
    Translation,
}

/// Order in which payload lookups fall back
pub(crate) const RESOLUTION_ORDER: [PayloadResolver; 4] = [
    PayloadResolver::Action,
    PayloadResolver::Node,
    PayloadResolver::Provider,
    PayloadResolver::Translation,
];

/// Descends into a map-valued payload using root-line parameter values
///
/// `values` lists the parameter values root first; lookup starts with the
/// innermost one. Descent stops at the first non-map value or missing key.
pub(crate) fn select_by_parameters(value: Value, values: &[String]) -> Value {
    values.iter().rev().fold(value, |current, key| match current {
        Value::Object(mut map) => match map.remove(key) {
            Some(selected) => selected,
            None => Value::Object(map),
        },
        other => other,
    })
}
