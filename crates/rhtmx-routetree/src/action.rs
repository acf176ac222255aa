//! Route actions: one HTTP method / handler pairing on a node

use crate::language::LanguageMapping;
use crate::middleware::{Middleware, MiddlewareMap};
use crate::payload::{PayloadValue, RoutePayload};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// HTTP method an action responds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    /// Lowercase name, also the default action name
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
            Method::Delete => "delete",
            Method::Options => "options",
        }
    }

    /// Parses a method name, case-insensitively
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_ascii_lowercase().as_str() {
            "get" => Some(Method::Get),
            "post" => Some(Method::Post),
            "put" => Some(Method::Put),
            "patch" => Some(Method::Patch),
            "delete" => Some(Method::Delete),
            "options" => Some(Method::Options),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_ascii_uppercase())
    }
}

/// What an action does when its route is hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActionTarget {
    /// Opaque handler reference resolved by the registrar
    Handler { handler: String },
    /// Controller method; the controller is namespaced at generation time
    Controller { controller: String, method: String },
    /// Renders a view with static data
    View { view: String, data: Value },
    /// Redirects to another node's default action
    Redirect { target: String, status: u16 },
}

/// One method/handler pairing on a node
#[derive(Debug, Clone)]
pub struct RouteAction {
    method: Method,
    name: String,
    target: ActionTarget,
    segment: LanguageMapping<String>,
    middleware: MiddlewareMap,
    skip_middleware: Vec<String>,
    constraints: BTreeMap<String, String>,
    payload: RoutePayload,
    pub(crate) paths: LanguageMapping<String>,
}

impl RouteAction {
    /// Creates an action named after its method
    pub fn new(method: Method, target: ActionTarget) -> Self {
        Self {
            method,
            name: method.as_str().to_string(),
            target,
            segment: LanguageMapping::new(),
            middleware: MiddlewareMap::new(),
            skip_middleware: Vec::new(),
            constraints: BTreeMap::new(),
            payload: RoutePayload::new(),
            paths: LanguageMapping::new(),
        }
    }

    pub fn handler(method: Method, handler: impl Into<String>) -> Self {
        Self::new(
            method,
            ActionTarget::Handler {
                handler: handler.into(),
            },
        )
    }

    /// Controller action written as `Controller@method`
    ///
    /// A reference without `@` calls the controller's method of the same name
    /// as the HTTP method.
    pub fn controller(method: Method, reference: &str) -> Self {
        let (controller, controller_method) = match reference.split_once('@') {
            Some((controller, controller_method)) => (controller, controller_method),
            None => (reference, method.as_str()),
        };
        Self::new(
            method,
            ActionTarget::Controller {
                controller: controller.to_string(),
                method: controller_method.to_string(),
            },
        )
    }

    pub fn view(view: impl Into<String>, data: Value) -> Self {
        Self::new(
            Method::Get,
            ActionTarget::View {
                view: view.into(),
                data,
            },
        )
    }

    pub fn redirect(target: impl Into<String>, status: u16) -> Self {
        Self::new(
            Method::Get,
            ActionTarget::Redirect {
                target: target.into(),
                status,
            },
        )
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Renames the action (the default name is the method name)
    pub fn named(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Sets the path suffix for one locale
    pub fn segment(&mut self, locale: impl Into<String>, segment: impl Into<String>) -> &mut Self {
        self.segment.set(locale, segment.into());
        self
    }

    /// Sets the path suffix for every locale at once
    pub fn segments(&mut self, segments: LanguageMapping<String>) -> &mut Self {
        self.segment = segments;
        self
    }

    pub fn middleware(&mut self, middleware: Middleware) -> &mut Self {
        self.middleware.insert(middleware);
        self
    }

    pub fn skip_middleware(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.middleware.remove(&name);
        self.skip_middleware.push(name);
        self
    }

    /// Constrains a path parameter with a regular expression
    pub fn constraint(&mut self, parameter: impl Into<String>, pattern: impl Into<String>) -> &mut Self {
        self.constraints.insert(parameter.into(), pattern.into());
        self
    }

    pub fn set_payload(&mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> &mut Self {
        self.payload.set(key, value);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn target(&self) -> &ActionTarget {
        &self.target
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.target, ActionTarget::Redirect { .. })
    }

    pub fn segment_for(&self, locale: &str) -> Option<&str> {
        self.segment.get(locale).map(String::as_str)
    }

    pub fn own_middleware(&self) -> &MiddlewareMap {
        &self.middleware
    }

    pub fn skipped_middleware(&self) -> &[String] {
        &self.skip_middleware
    }

    pub fn constraints(&self) -> &BTreeMap<String, String> {
        &self.constraints
    }

    pub fn payload(&self) -> &RoutePayload {
        &self.payload
    }

    /// Compiled path for a locale (available after compilation)
    pub fn path(&self, locale: &str) -> Option<&str> {
        self.paths.get(locale).map(String::as_str)
    }

    pub fn paths(&self) -> &LanguageMapping<String> {
        &self.paths
    }

    /// Registrar route name: `locale.nodeId.actionName`, empty parts omitted
    pub fn route_name(&self, locale: &str, node_id: &str) -> String {
        route_name(locale, node_id, &self.name)
    }
}

pub(crate) fn route_name(locale: &str, node_id: &str, action: &str) -> String {
    [locale, node_id, action]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(".")
}
