//! Error types for route tree construction, compilation and URL generation

use thiserror::Error;

/// Errors raised while building, compiling or querying a route tree
///
/// Build-time variants (duplicate names, name collisions, bad constraints)
/// describe configuration bugs and should abort start-up. Request-time
/// variants (`UrlParametersMissing`, `ActionNotFound`) are returned to the
/// caller, which decides whether to render a fallback.
#[derive(Debug, Error)]
pub enum RouteTreeError {
    /// No node exists under the given dotted id
    #[error("Node not found: '{0}'")]
    NodeNotFound(String),

    /// The node has no action with the given name
    #[error("Action '{action}' not found on node '{node}'")]
    ActionNotFound { node: String, action: String },

    /// A sibling with the same name is already attached
    #[error("Node '{parent}' already has a child named '{name}'")]
    NodeAlreadyHasChildWithSameName { parent: String, name: String },

    /// The node already declares an action with the same name
    #[error("Node '{node}' already has an action named '{action}'")]
    ActionAlreadyExists { node: String, action: String },

    /// Two actions compiled to the same registrar route name
    #[error("Route name already registered: '{0}'")]
    RouteNameAlreadyRegistered(String),

    /// URL generation could not satisfy every required parameter
    #[error("Missing parameters for route '{route}': {}", .missing.join(", "))]
    UrlParametersMissing { route: String, missing: Vec<String> },

    /// A value lies outside the domain accepted for a setting
    #[error("Invalid value '{value}' for '{parameter}': {reason}")]
    InvalidParameterValueDomain {
        parameter: String,
        value: String,
        reason: String,
    },

    /// A parameter constraint is not a valid regular expression
    #[error("Invalid constraint for parameter '{parameter}': {pattern}")]
    InvalidConstraint {
        parameter: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The node is not generated for the requested locale
    #[error("Node '{node}' is not available in locale '{locale}'")]
    LocaleNotAvailable { node: String, locale: String },

    /// The registrar knows no route under the given name
    #[error("Route not registered: '{0}'")]
    RouteNotRegistered(String),
}

impl RouteTreeError {
    pub(crate) fn invalid_value(
        parameter: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        RouteTreeError::InvalidParameterValueDomain {
            parameter: parameter.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, RouteTreeError>;
