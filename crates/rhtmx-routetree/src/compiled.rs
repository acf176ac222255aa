//! Serve phase: the read-only compiled tree
//!
//! A [`CompiledRouteTree`] is produced once by [`RouteTree::compile`] and can
//! be shared across threads. Everything request-specific is passed in as a
//! [`RequestContext`], which [`CompiledRouteTree::resolve`] creates for each
//! incoming request.
//!
//! [`RouteTree::compile`]: crate::RouteTree::compile

use crate::action::{ActionTarget, Method, RouteAction};
use crate::config::RouteTreeConfig;
use crate::context::{ActiveRoute, RequestContext};
use crate::error::{Result, RouteTreeError};
use crate::node::RouteNode;
use crate::parameter::{ParameterMap, RouteParameter};
use crate::payload::{select_by_parameters, PayloadResolver, RESOLUTION_ORDER};
use crate::registrar::{RouteRegistrar, RouteRegistration};
use crate::resource::RouteResource;
use crate::translator::Translator;
use crate::tree::{translation_key, NodeIndex};
use crate::url::RouteUrlBuilder;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

/// Reverse-lookup entry for one compiled (action, locale) route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredRoute {
    name: String,
    method: Method,
    node: NodeIndex,
    node_id: String,
    action: String,
    locale: String,
    uri: String,
}

impl RegisteredRoute {
    pub(crate) fn new(node: NodeIndex, registration: &RouteRegistration) -> Self {
        Self {
            name: registration.name.clone(),
            method: registration.method,
            node,
            node_id: registration.node_id.clone(),
            action: registration.action.clone(),
            locale: registration.locale.clone(),
            uri: registration.uri.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> Method {
        self.method
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

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Compiled path, e.g. `de/blog/{article}`
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// The compiled, read-only route tree
pub struct CompiledRouteTree {
    config: RouteTreeConfig,
    translator: Arc<dyn Translator>,
    nodes: Vec<RouteNode>,
    index: HashMap<String, NodeIndex>,
    routes: BTreeMap<String, RegisteredRoute>,
    registrations: Vec<RouteRegistration>,
    registrar: Box<dyn RouteRegistrar>,
}

impl fmt::Debug for CompiledRouteTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRouteTree")
            .field("nodes", &self.nodes.len())
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CompiledRouteTree {
    pub(crate) fn new(
        config: RouteTreeConfig,
        translator: Arc<dyn Translator>,
        nodes: Vec<RouteNode>,
        index: HashMap<String, NodeIndex>,
        routes: BTreeMap<String, RegisteredRoute>,
        registrations: Vec<RouteRegistration>,
        registrar: Box<dyn RouteRegistrar>,
    ) -> Self {
        Self {
            config,
            translator,
            nodes,
            index,
            routes,
            registrations,
            registrar,
        }
    }

    pub fn config(&self) -> &RouteTreeConfig {
        &self.config
    }

    pub fn registrar(&self) -> &dyn RouteRegistrar {
        self.registrar.as_ref()
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    pub fn root_index(&self) -> NodeIndex {
        NodeIndex(0)
    }

    pub fn root(&self) -> &RouteNode {
        &self.nodes[0]
    }

    pub fn node_at(&self, index: NodeIndex) -> &RouteNode {
        &self.nodes[index.0]
    }

    pub fn node_index(&self, id: &str) -> Result<NodeIndex> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| RouteTreeError::NodeNotFound(id.to_string()))
    }

    pub fn get_node(&self, id: &str) -> Result<&RouteNode> {
        self.node_index(id).map(|index| self.node_at(index))
    }

    pub fn does_node_exist(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Nodes from the root down to `index`, inclusive
    pub fn root_line(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut line = vec![index];
        let mut current = self.node_at(index).parent_index();
        while let Some(parent) = current {
            line.push(parent);
            current = self.node_at(parent).parent_index();
        }
        line.reverse();
        line
    }

    /// Parameters bound along the root line of a node, root first
    ///
    /// A resource child contributes its parent resource's parameter right
    /// before its own.
    pub fn root_line_parameters(&self, index: NodeIndex) -> Vec<&RouteParameter> {
        let mut parameters = Vec::new();
        for position in self.root_line(index) {
            let node = self.node_at(position);
            if node.is_resource_child() {
                let resource = node
                    .parent_index()
                    .and_then(|parent| self.node_at(parent).get_resource());
                if let Some(resource) = resource {
                    parameters.push(resource.parameter());
                }
            }
            if let Some(parameter) = node.get_parameter() {
                parameters.push(parameter);
            }
        }
        parameters
    }

    /// Parameters of an action's path: the root line plus, for resource item
    /// actions, the resource parameter
    pub fn action_parameters(&self, index: NodeIndex, action: &str) -> Vec<&RouteParameter> {
        let mut parameters = self.root_line_parameters(index);
        if let Some(resource) = self.node_at(index).get_resource() {
            if RouteResource::is_item_action(action) {
                parameters.push(resource.parameter());
            }
        }
        parameters
    }

    // ========================================================================
    // Routes
    // ========================================================================

    /// Every registered route, ordered by name
    pub fn registered_routes(&self) -> impl Iterator<Item = &RegisteredRoute> {
        self.routes.values()
    }

    pub fn registered_route(&self, name: &str) -> Option<&RegisteredRoute> {
        self.routes.get(name)
    }

    /// Looks a route up by method and name
    pub fn route(&self, method: Method, name: &str) -> Option<&RegisteredRoute> {
        self.routes.get(name).filter(|route| route.method == method)
    }

    /// Registrations issued during compilation, in issue order
    pub fn registrations(&self) -> &[RouteRegistration] {
        &self.registrations
    }

    /// Re-issues every registration into another registrar
    pub fn replay_into(&self, registrar: &mut dyn RouteRegistrar) -> Result<()> {
        for registration in &self.registrations {
            registrar.register(registration)?;
        }
        Ok(())
    }

    // ========================================================================
    // Request resolution
    // ========================================================================

    /// Builds the request context for an incoming request
    ///
    /// Unmatched requests get a context in the default locale without an
    /// active route.
    pub fn resolve(&self, method: Method, path: &str) -> RequestContext {
        match self.registrar.match_route(method, path) {
            Some(found) => match self.activate(&found.name, found.parameters) {
                Ok(context) => context,
                Err(err) => {
                    warn!(error = %err, "Registrar matched a route unknown to the tree");
                    RequestContext::new(self.config.default_locale())
                }
            },
            None => RequestContext::new(self.config.default_locale()),
        }
    }

    /// Builds the request context for a route matched by an external router
    pub fn activate(&self, route_name: &str, parameters: ParameterMap) -> Result<RequestContext> {
        let route = self
            .routes
            .get(route_name)
            .ok_or_else(|| RouteTreeError::RouteNotRegistered(route_name.to_string()))?;

        trace!(route = route_name, "Activated route");
        Ok(RequestContext::with_active(
            route.locale.clone(),
            ActiveRoute {
                route_name: route.name.clone(),
                node: route.node,
                node_id: route.node_id.clone(),
                action: route.action.clone(),
                parameters,
            },
        ))
    }

    pub fn current_node(&self, context: &RequestContext) -> Option<&RouteNode> {
        context
            .active()
            .map(|active| self.node_at(active.node_index()))
    }

    pub fn current_action(&self, context: &RequestContext) -> Option<&RouteAction> {
        let active = context.active()?;
        self.node_at(active.node_index()).action(active.action())
    }

    /// Active values of a node's root-line parameters, in the context locale
    pub fn active_parameters_for(&self, context: &RequestContext, index: NodeIndex) -> ParameterMap {
        self.root_line_parameters(index)
            .into_iter()
            .filter_map(|parameter| {
                parameter
                    .active_route_key(context, context.locale())
                    .map(|value| (parameter.name().to_string(), value))
            })
            .collect()
    }

    /// Whether `node_id` is the active node or one of its ancestors
    ///
    /// Every entry of `parameters` must also equal the active value of the
    /// same parameter.
    pub fn is_active(&self, context: &RequestContext, node_id: &str, parameters: &ParameterMap) -> bool {
        let (Some(active), Ok(target)) = (context.active(), self.node_index(node_id)) else {
            return false;
        };

        let on_line = self.root_line(active.node_index()).contains(&target);
        on_line
            && parameters
                .iter()
                .all(|(name, value)| context.active_parameter(name) == Some(value.as_str()))
    }

    // ========================================================================
    // URLs
    // ========================================================================

    /// Starts building a URL in the given request context
    pub fn url<'a>(&'a self, context: &'a RequestContext) -> RouteUrlBuilder<'a> {
        RouteUrlBuilder::new(self, context)
    }

    /// Target URL and status of the active action, if it is a redirect
    pub fn redirect_url(&self, context: &RequestContext) -> Result<Option<(String, u16)>> {
        match self.current_action(context).map(RouteAction::target) {
            Some(ActionTarget::Redirect { target, status }) => {
                let url = self.url(context).node(target.as_str()).generate()?;
                Ok(Some((url, *status)))
            }
            _ => Ok(None),
        }
    }

    // ========================================================================
    // Payload
    // ========================================================================

    /// Resolves a payload value for a node (and optionally one of its actions)
    ///
    /// Falls back from the action's payload to the node's payload, the
    /// node parameter's value provider and finally the auto-translation key.
    /// Map values of parameterized nodes are narrowed by the parameter values.
    pub fn payload(
        &self,
        parameters: &ParameterMap,
        index: NodeIndex,
        action: Option<&str>,
        key: &str,
        locale: &str,
    ) -> Option<Value> {
        let node = self.node_at(index);
        let node_action = action.and_then(|name| node.action(name));

        let resolved = RESOLUTION_ORDER.iter().find_map(|resolver| match resolver {
            PayloadResolver::Action => {
                node_action.and_then(|a| a.payload().get(key, parameters, locale))
            }
            PayloadResolver::Node => node.payload().get(key, parameters, locale),
            PayloadResolver::Provider => node
                .get_parameter()
                .and_then(RouteParameter::provider)
                .and_then(|provider| provider.payload(key, parameters, locale, action)),
            PayloadResolver::Translation => self.translated_payload(node, key, action, parameters, locale),
        })?;

        if node.get_parameter().is_none() || !(resolved.is_object() || resolved.is_array()) {
            return Some(resolved);
        }

        let values: Vec<String> = self
            .root_line_parameters(index)
            .iter()
            .filter_map(|parameter| parameters.get(parameter.name()).cloned())
            .collect();
        Some(select_by_parameters(resolved, &values))
    }

    /// Payload value of the active action in the request context
    pub fn active_payload(&self, context: &RequestContext, key: &str) -> Option<Value> {
        let active = context.active()?;
        self.payload(
            active.parameters(),
            active.node_index(),
            Some(active.action()),
            key,
            context.locale(),
        )
    }

    fn translated_payload(
        &self,
        node: &RouteNode,
        key: &str,
        action: Option<&str>,
        parameters: &ParameterMap,
        locale: &str,
    ) -> Option<Value> {
        let base = &self.config.translation_base;
        let mut keys = Vec::new();
        if action.is_some() {
            keys.push(translation_key(base, node.id(), key, action));
        }
        keys.push(translation_key(base, node.id(), key, None));

        keys.into_iter()
            .find(|candidate| self.translator.has(candidate, locale))
            .map(|found| Value::String(self.translator.translate(&found, parameters, locale)))
    }

    /// Title of a node for explicit parameters and locale
    ///
    /// Without a payload value, parameterized nodes fall back to their
    /// parameter value and all others to their name.
    pub fn title_for(
        &self,
        parameters: &ParameterMap,
        index: NodeIndex,
        action: Option<&str>,
        locale: &str,
    ) -> String {
        if let Some(title) = self.payload(parameters, index, action, "title", locale) {
            return value_to_string(title);
        }

        let node = self.node_at(index);
        node.get_parameter()
            .and_then(|parameter| parameters.get(parameter.name()).cloned())
            .unwrap_or_else(|| node.name().to_string())
    }

    /// Title of a node as seen from the request context
    pub fn title(&self, context: &RequestContext, index: NodeIndex) -> String {
        let parameters = self.active_parameters_for(context, index);
        self.title_for(&parameters, index, self.active_action_on(context, index), context.locale())
    }

    /// Navigation title (`navTitle`), falling back to the title
    pub fn navigation_title(&self, context: &RequestContext, index: NodeIndex) -> String {
        let parameters = self.active_parameters_for(context, index);
        let action = self.active_action_on(context, index);
        match self.payload(&parameters, index, action, "navTitle", context.locale()) {
            Some(title) => value_to_string(title),
            None => self.title_for(&parameters, index, action, context.locale()),
        }
    }

    // Active action name when `index` is the active node
    fn active_action_on<'c>(&self, context: &'c RequestContext, index: NodeIndex) -> Option<&'c str> {
        context
            .active()
            .filter(|active| active.node_index() == index)
            .map(|active| active.action())
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
