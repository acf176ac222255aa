//! Route nodes: the building blocks of the tree

use crate::action::RouteAction;
use crate::language::LanguageMapping;
use crate::middleware::{Middleware, MiddlewareMap};
use crate::parameter::RouteParameter;
use crate::payload::{PayloadValue, RoutePayload};
use crate::resource::RouteResource;
use crate::sitemap::SitemapSettings;
use crate::tree::NodeIndex;
use serde_json::Value;
use std::collections::BTreeMap;

/// Separator between namespace components
pub const NAMESPACE_SEPARATOR: &str = "::";

/// A node of the route tree
///
/// Nodes can be configured before they are attached (useful to pre-declare
/// skipped middleware) or through a `NodeBuilder` once they are part of the
/// tree. Identity (`name`, `id`, parent) is fixed at attach time.
#[derive(Debug, Clone)]
pub struct RouteNode {
    pub(crate) name: String,
    pub(crate) id: String,
    pub(crate) parent: Option<NodeIndex>,
    pub(crate) children: BTreeMap<String, NodeIndex>,
    pub(crate) attached: bool,

    pub(crate) locales: Vec<String>,
    pub(crate) only_locales: Option<Vec<String>>,
    pub(crate) except_locales: Vec<String>,
    pub(crate) no_locale_prefix: bool,

    pub(crate) segment: LanguageMapping<String>,
    pub(crate) default_segment: Option<String>,
    pub(crate) inherit_segment: bool,
    pub(crate) resource_child: bool,

    pub(crate) namespace: Option<String>,
    pub(crate) pending_namespace: Option<String>,
    pub(crate) middleware: MiddlewareMap,
    pub(crate) skip_middleware: Vec<String>,
    pub(crate) constraints: BTreeMap<String, String>,

    pub(crate) parameter: Option<RouteParameter>,
    pub(crate) resource: Option<RouteResource>,
    pub(crate) actions: Vec<RouteAction>,
    pub(crate) payload: RoutePayload,
    pub(crate) sitemap: SitemapSettings,

    pub(crate) paths: LanguageMapping<String>,
}

impl RouteNode {
    /// Creates a detached node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: String::new(),
            parent: None,
            children: BTreeMap::new(),
            attached: false,
            locales: Vec::new(),
            only_locales: None,
            except_locales: Vec::new(),
            no_locale_prefix: false,
            segment: LanguageMapping::new(),
            default_segment: None,
            inherit_segment: true,
            resource_child: false,
            namespace: None,
            pending_namespace: None,
            middleware: MiddlewareMap::new(),
            skip_middleware: Vec::new(),
            constraints: BTreeMap::new(),
            parameter: None,
            resource: None,
            actions: Vec::new(),
            payload: RoutePayload::new(),
            sitemap: SitemapSettings::default(),
            paths: LanguageMapping::new(),
        }
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Sets the path segment for one locale
    pub fn segment(&mut self, locale: impl Into<String>, segment: impl Into<String>) -> &mut Self {
        self.segment.set(locale, segment.into());
        self
    }

    /// Sets the per-locale path segments at once
    pub fn segments(&mut self, segments: LanguageMapping<String>) -> &mut Self {
        self.segment = segments;
        self
    }

    /// Sets a segment used for every locale without a specific one
    ///
    /// An empty segment turns the node into a pure grouping node.
    pub fn default_segment(&mut self, segment: impl Into<String>) -> &mut Self {
        self.default_segment = Some(segment.into());
        self
    }

    /// Whether ancestor segments are part of this node's path (default: true)
    pub fn inherit_segment(&mut self, inherit: bool) -> &mut Self {
        self.inherit_segment = inherit;
        self
    }

    /// Marks the node as a child of its parent's resource
    ///
    /// The parent resource's `{parameter}` is injected before this node's
    /// own segment.
    pub fn resource_child(&mut self, resource_child: bool) -> &mut Self {
        self.resource_child = resource_child;
        self
    }

    /// Sets the controller namespace
    ///
    /// A value starting with `::` replaces the inherited namespace; anything
    /// else is appended to it.
    pub fn namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        let namespace = namespace.into();
        if self.attached {
            self.namespace = Some(apply_namespace(self.namespace.as_deref(), &namespace));
        } else {
            self.pending_namespace = Some(namespace);
        }
        self
    }

    pub fn middleware(&mut self, middleware: Middleware) -> &mut Self {
        self.middleware.insert(middleware);
        self
    }

    /// Excludes a middleware from this node and from nodes attached below it
    pub fn skip_middleware(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.middleware.remove(&name);
        if !self.skip_middleware.contains(&name) {
            self.skip_middleware.push(name);
        }
        self
    }

    /// Constrains a path parameter for every action of this node
    pub fn constraint(&mut self, parameter: impl Into<String>, pattern: impl Into<String>) -> &mut Self {
        self.constraints.insert(parameter.into(), pattern.into());
        self
    }

    /// Binds a path variable; the node's segment becomes `{name}`
    pub fn parameter(&mut self, parameter: RouteParameter) -> &mut Self {
        self.parameter = Some(parameter);
        self
    }

    pub fn set_payload(&mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> &mut Self {
        self.payload.set(key, value);
        self
    }

    pub fn set_computed_payload<F>(&mut self, key: impl Into<String>, compute: F) -> &mut Self
    where
        F: Fn(&crate::ParameterMap, &str) -> Option<Value> + Send + Sync + 'static,
    {
        self.payload.set_computed(key, compute);
        self
    }

    pub fn title(&mut self, title: impl Into<PayloadValue>) -> &mut Self {
        self.set_payload("title", title)
    }

    pub fn navigation_title(&mut self, title: impl Into<PayloadValue>) -> &mut Self {
        self.set_payload("navTitle", title)
    }

    pub fn sitemap(&mut self) -> &mut SitemapSettings {
        &mut self.sitemap
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dot-joined names from the root; empty for the root itself
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_root(&self) -> bool {
        self.attached && self.parent.is_none()
    }

    pub fn parent_index(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub(crate) fn child_index(&self, name: &str) -> Option<NodeIndex> {
        self.children.get(name).copied()
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    pub fn has_locale(&self, locale: &str) -> bool {
        self.locales.iter().any(|l| l == locale)
    }

    pub fn has_no_locale_prefix(&self) -> bool {
        self.no_locale_prefix
    }

    pub fn inherits_segment(&self) -> bool {
        self.inherit_segment
    }

    pub fn is_resource_child(&self) -> bool {
        self.resource_child
    }

    pub fn get_namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn own_middleware(&self) -> &MiddlewareMap {
        &self.middleware
    }

    pub fn skipped_middleware(&self) -> &[String] {
        &self.skip_middleware
    }

    /// Middleware applying to this node: own and inherited entries, minus skips
    pub fn effective_middleware(&self) -> MiddlewareMap {
        self.middleware.without(&self.skip_middleware)
    }

    pub fn constraints(&self) -> &BTreeMap<String, String> {
        &self.constraints
    }

    pub fn get_parameter(&self) -> Option<&RouteParameter> {
        self.parameter.as_ref()
    }

    pub fn get_resource(&self) -> Option<&RouteResource> {
        self.resource.as_ref()
    }

    pub fn actions(&self) -> &[RouteAction] {
        &self.actions
    }

    pub fn action(&self, name: &str) -> Option<&RouteAction> {
        self.actions.iter().find(|a| a.name() == name)
    }

    pub fn action_mut(&mut self, name: &str) -> Option<&mut RouteAction> {
        self.actions.iter_mut().find(|a| a.name() == name)
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.action(name).is_some()
    }

    /// Action used when no action name is given: `index`, `get`, or the first one
    pub fn default_action(&self) -> Option<&RouteAction> {
        self.action("index")
            .or_else(|| self.action("get"))
            .or_else(|| self.actions.first())
    }

    pub fn payload(&self) -> &RoutePayload {
        &self.payload
    }

    pub fn sitemap_settings(&self) -> &SitemapSettings {
        &self.sitemap
    }

    pub fn segment_for(&self, locale: &str) -> Option<&str> {
        self.segment
            .get(locale)
            .map(String::as_str)
            .or(self.default_segment.as_deref())
    }

    /// Compiled path for a locale (available after compilation)
    pub fn path(&self, locale: &str) -> Option<&str> {
        self.paths.get(locale).map(String::as_str)
    }

    pub fn paths(&self) -> &LanguageMapping<String> {
        &self.paths
    }

    /// Recomputes the locale set from the parent's locales and this node's filters
    pub(crate) fn narrow_locales(&mut self, parent_locales: &[String], default_locale: &str) {
        if self.no_locale_prefix {
            self.locales = vec![default_locale.to_string()];
            return;
        }

        self.locales = parent_locales
            .iter()
            .filter(|locale| {
                self.only_locales
                    .as_ref()
                    .map(|only| only.contains(locale))
                    .unwrap_or(true)
            })
            .filter(|locale| !self.except_locales.contains(locale))
            .cloned()
            .collect();
    }
}

/// Applies a configured namespace to the current one
///
/// # Examples
///
/// ```
/// use rhtmx_routetree::node::apply_namespace;
///
/// assert_eq!(apply_namespace(Some("app::controllers"), "admin"), "app::controllers::admin");
/// assert_eq!(apply_namespace(Some("app::controllers"), "::api"), "api");
/// assert_eq!(apply_namespace(None, "blog"), "blog");
/// ```
pub fn apply_namespace(current: Option<&str>, configured: &str) -> String {
    if let Some(absolute) = configured.strip_prefix(NAMESPACE_SEPARATOR) {
        return absolute.to_string();
    }

    match current {
        Some(current) if !current.is_empty() && !configured.is_empty() => {
            format!("{}{}{}", current, NAMESPACE_SEPARATOR, configured)
        }
        Some(current) if configured.is_empty() => current.to_string(),
        _ => configured.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Method;

    #[test]
    fn test_default_action_preference() {
        let mut node = RouteNode::new("blog");
        node.actions.push(RouteAction::handler(Method::Post, "store"));
        assert_eq!(node.default_action().unwrap().name(), "post");

        node.actions.push(RouteAction::handler(Method::Get, "list"));
        assert_eq!(node.default_action().unwrap().name(), "get");

        let mut index = RouteAction::handler(Method::Get, "index");
        index.named("index");
        node.actions.push(index);
        assert_eq!(node.default_action().unwrap().name(), "index");
    }

    #[test]
    fn test_narrow_locales() {
        let mut node = RouteNode::new("blog");
        node.except_locales.push("fr".to_string());
        let parent = vec!["de".to_string(), "en".to_string(), "fr".to_string()];
        node.narrow_locales(&parent, "de");
        assert_eq!(node.locales(), ["de".to_string(), "en".to_string()]);

        node.only_locales = Some(vec!["en".to_string()]);
        node.narrow_locales(&parent, "de");
        assert_eq!(node.locales(), ["en".to_string()]);

        node.no_locale_prefix = true;
        node.narrow_locales(&parent, "de");
        assert_eq!(node.locales(), ["de".to_string()]);
    }

    #[test]
    fn test_detached_namespace_is_pending() {
        let mut node = RouteNode::new("admin");
        node.namespace("admin");
        assert_eq!(node.get_namespace(), None);
        assert_eq!(node.pending_namespace.as_deref(), Some("admin"));
    }

    #[test]
    fn test_skip_removes_and_records() {
        let mut node = RouteNode::new("public");
        node.middleware(Middleware::new("auth"));
        node.skip_middleware("auth").skip_middleware("auth");
        assert!(node.own_middleware().is_empty());
        assert_eq!(node.skipped_middleware().len(), 1);
    }
}
