// File: src/context.rs
// Purpose: Per-request view of the matched route

use crate::parameter::ParameterMap;
use crate::tree::NodeIndex;

/// The route matched for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRoute {
    pub(crate) route_name: String,
    pub(crate) node: NodeIndex,
    pub(crate) node_id: String,
    pub(crate) action: String,
    pub(crate) parameters: ParameterMap,
}

impl ActiveRoute {
    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    pub fn node_index(&self) -> NodeIndex {
        self.node
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }
}

/// Request-scoped state: locale and the matched route, if any
///
/// Created once per request (see `CompiledRouteTree::resolve`) and never
/// mutated afterwards, so each concurrently handled request carries its own
/// copy instead of sharing a global "current route".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    locale: String,
    active: Option<ActiveRoute>,
}

impl RequestContext {
    /// Context for a request that matched no route
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            active: None,
        }
    }

    pub(crate) fn with_active(locale: impl Into<String>, active: ActiveRoute) -> Self {
        Self {
            locale: locale.into(),
            active: Some(active),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn active(&self) -> Option<&ActiveRoute> {
        self.active.as_ref()
    }

    pub fn is_matched(&self) -> bool {
        self.active.is_some()
    }

    /// Value of a path parameter on the matched route
    pub fn active_parameter(&self, name: &str) -> Option<&str> {
        self.active
            .as_ref()
            .and_then(|active| active.parameters.get(name))
            .map(String::as_str)
    }

    pub fn active_parameters(&self) -> Option<&ParameterMap> {
        self.active.as_ref().map(|active| &active.parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_context_has_no_parameters() {
        let context = RequestContext::new("de");
        assert_eq!(context.locale(), "de");
        assert!(!context.is_matched());
        assert_eq!(context.active_parameter("article"), None);
    }

    #[test]
    fn test_active_parameter_lookup() {
        let mut parameters = ParameterMap::new();
        parameters.insert("article".to_string(), "ownership".to_string());
        let context = RequestContext::with_active(
            "en",
            ActiveRoute {
                route_name: "en.blog.article.get".to_string(),
                node: NodeIndex(2),
                node_id: "blog.article".to_string(),
                action: "get".to_string(),
                parameters,
            },
        );

        assert_eq!(context.active_parameter("article"), Some("ownership"));
        assert_eq!(context.active().unwrap().action(), "get");
    }
}
