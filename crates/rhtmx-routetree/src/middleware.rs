//! Middleware declarations attached to nodes and actions
//!
//! Middleware names are opaque to the tree: they are carried through to the
//! registrar together with their parameters and never interpreted here.

use serde::{Deserialize, Serialize};

/// A single middleware declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Middleware {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    /// Whether child nodes attached later receive a copy
    #[serde(default = "default_true")]
    pub inherit: bool,
}

fn default_true() -> bool {
    true
}

impl Middleware {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            inherit: true,
        }
    }

    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    pub fn inheritable(mut self, inherit: bool) -> Self {
        self.inherit = inherit;
        self
    }

    /// Registrar notation: `name` or `name:param1,param2`
    pub fn to_registrar_string(&self) -> String {
        if self.parameters.is_empty() {
            self.name.clone()
        } else {
            format!("{}:{}", self.name, self.parameters.join(","))
        }
    }
}

/// Ordered middleware map keyed by name
///
/// Inserting an existing name replaces the entry in place, so declaration
/// order is kept stable for the registrar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MiddlewareMap {
    entries: Vec<Middleware>,
}

impl MiddlewareMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, middleware: Middleware) {
        match self.entries.iter_mut().find(|m| m.name == middleware.name) {
            Some(existing) => *existing = middleware,
            None => self.entries.push(middleware),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Middleware> {
        let index = self.entries.iter().position(|m| m.name == name)?;
        Some(self.entries.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&Middleware> {
        self.entries.iter().find(|m| m.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Middleware> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries a child node receives when attached below this map's owner
    ///
    /// Only inheritable entries are copied; names in `skip` are left out.
    pub fn inheritable_except(&self, skip: &[String]) -> MiddlewareMap {
        MiddlewareMap {
            entries: self
                .entries
                .iter()
                .filter(|m| m.inherit && !skip.contains(&m.name))
                .cloned()
                .collect(),
        }
    }

    /// Merges `other` over `self`; entries of `other` win on equal names
    pub fn merged_with(&self, other: &MiddlewareMap) -> MiddlewareMap {
        let mut merged = self.clone();
        for middleware in other.iter() {
            merged.insert(middleware.clone());
        }
        merged
    }

    /// Copy of this map without the named entries
    pub fn without(&self, skip: &[String]) -> MiddlewareMap {
        MiddlewareMap {
            entries: self
                .entries
                .iter()
                .filter(|m| !skip.contains(&m.name))
                .cloned()
                .collect(),
        }
    }
}
