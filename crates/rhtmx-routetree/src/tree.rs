//! Build phase: the mutable route tree and its node builder
//!
//! Configuration code attaches nodes through [`NodeBuilder`] callbacks and then
//! calls [`RouteTree::compile`], which derives every per-locale path, issues
//! the registrations and returns a read-only [`CompiledRouteTree`].

use crate::action::{ActionTarget, Method, RouteAction};
use crate::compiled::{CompiledRouteTree, RegisteredRoute};
use crate::config::RouteTreeConfig;
use crate::error::{Result, RouteTreeError};
use crate::language::LanguageMapping;
use crate::node::{apply_namespace, RouteNode};
use crate::parameter::RouteParameter;
use crate::path::{find_embedded_placeholder, join_segments};
use crate::registrar::{compile_constraint, InMemoryRegistrar, RouteRegistrar, RouteRegistration};
use crate::resource::{RouteResource, RESOURCE_ACTIONS};
use crate::translator::{NullTranslator, TranslationParameters, Translator};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Position of a node in the tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

/// The route tree during configuration
pub struct RouteTree {
    config: RouteTreeConfig,
    translator: Arc<dyn Translator>,
    nodes: Vec<RouteNode>,
    index: HashMap<String, NodeIndex>,
}

impl fmt::Debug for RouteTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTree")
            .field("config", &self.config)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl RouteTree {
    /// Creates a tree holding only the root node
    pub fn new(config: RouteTreeConfig) -> Self {
        let mut root = RouteNode::new("");
        root.attached = true;
        root.locales = config.locales.clone();

        let mut index = HashMap::new();
        index.insert(String::new(), NodeIndex(0));

        Self {
            config,
            translator: Arc::new(NullTranslator),
            nodes: vec![root],
            index,
        }
    }

    /// Sets the translator used for segment, resource and payload lookups
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn config(&self) -> &RouteTreeConfig {
        &self.config
    }

    pub fn root_index(&self) -> NodeIndex {
        NodeIndex(0)
    }

    pub fn root(&self) -> &RouteNode {
        &self.nodes[0]
    }

    pub fn node_at(&self, index: NodeIndex) -> &RouteNode {
        &self.nodes[index.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Index of the node with the given dotted id; `""` is the root
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

    /// Finds a node, creating empty nodes for every missing segment of `id`
    pub fn get_or_generate_node(&mut self, id: &str) -> Result<NodeIndex> {
        if let Some(index) = self.index.get(id) {
            return Ok(*index);
        }

        let mut current = self.root_index();
        for name in id.split('.') {
            current = match self.nodes[current.0].child_index(name) {
                Some(child) => child,
                None => self.attach(current, RouteNode::new(name))?,
            };
        }
        Ok(current)
    }

    // ========================================================================
    // Building
    // ========================================================================

    /// Configures the root node
    pub fn configure_root<F>(&mut self, configure: F) -> Result<()>
    where
        F: FnOnce(&mut NodeBuilder<'_>) -> Result<()>,
    {
        let root = self.root_index();
        configure(&mut NodeBuilder::new(self, root))
    }

    /// Configures the node at `id`, generating it and any missing ancestors
    pub fn node<F>(&mut self, id: &str, configure: F) -> Result<NodeIndex>
    where
        F: FnOnce(&mut NodeBuilder<'_>) -> Result<()>,
    {
        let index = self.get_or_generate_node(id)?;
        configure(&mut NodeBuilder::new(self, index))?;
        Ok(index)
    }

    /// Attaches a new child named `name` below the root
    pub fn child<F>(&mut self, name: &str, configure: F) -> Result<NodeIndex>
    where
        F: FnOnce(&mut NodeBuilder<'_>) -> Result<()>,
    {
        let root = self.root_index();
        NodeBuilder::new(self, root).child(name, configure)
    }

    /// Attaches a detached node below `parent`
    ///
    /// Inherited middleware and namespace are copied from the parent at this
    /// point; later changes to the parent do not reach the child. Nothing is
    /// modified when the parent already has a child of the same name.
    pub fn attach(&mut self, parent: NodeIndex, mut node: RouteNode) -> Result<NodeIndex> {
        let parent_node = &self.nodes[parent.0];

        if node.name.is_empty() || node.name.contains('.') {
            return Err(RouteTreeError::invalid_value(
                "name",
                &node.name,
                "node names must be non-empty and must not contain '.'",
            ));
        }

        if parent_node.has_child(&node.name) {
            return Err(RouteTreeError::NodeAlreadyHasChildWithSameName {
                parent: parent_node.id.clone(),
                name: node.name.clone(),
            });
        }

        node.id = if parent_node.id.is_empty() {
            node.name.clone()
        } else {
            format!("{}.{}", parent_node.id, node.name)
        };
        node.parent = Some(parent);
        node.attached = true;

        let inherited = parent_node
            .middleware
            .inheritable_except(&node.skip_middleware);
        node.middleware = inherited.merged_with(&node.middleware);

        node.namespace = match node.pending_namespace.take() {
            Some(configured) => Some(apply_namespace(parent_node.namespace.as_deref(), &configured)),
            None => parent_node.namespace.clone(),
        };

        node.no_locale_prefix |= parent_node.no_locale_prefix;
        let parent_locales = parent_node.locales.clone();
        node.narrow_locales(&parent_locales, self.config.default_locale());

        let index = NodeIndex(self.nodes.len());
        debug!(
            id = %node.id,
            locales = ?node.locales,
            middleware = ?node.middleware.names(),
            "Attached route node"
        );

        self.index.insert(node.id.clone(), index);
        self.nodes[parent.0].children.insert(node.name.clone(), index);
        self.nodes.push(node);
        Ok(index)
    }

    // ========================================================================
    // Compilation
    // ========================================================================

    /// Compiles the tree against an [`InMemoryRegistrar`]
    pub fn compile(&self) -> Result<CompiledRouteTree> {
        self.compile_with(Box::new(InMemoryRegistrar::new(self.config.base_url.clone())))
    }

    /// Compiles every path and registers every (action, locale) pair
    ///
    /// The tree itself is left untouched, so compiling twice produces the
    /// same paths and route names.
    pub fn compile_with(&self, mut registrar: Box<dyn RouteRegistrar>) -> Result<CompiledRouteTree> {
        let mut nodes = self.nodes.clone();

        for (position, node) in nodes.iter_mut().enumerate() {
            let index = NodeIndex(position);
            node.paths = node
                .locales
                .iter()
                .map(|locale| (locale.as_str(), self.compile_path(index, locale)))
                .collect();

            let node_paths = node.paths.clone();
            for action in node.actions.iter_mut() {
                action.paths = node_paths
                    .iter()
                    .map(|(locale, path)| {
                        let suffix = action.segment_for(locale).unwrap_or("");
                        (locale, join_segments([path.as_str(), suffix]))
                    })
                    .collect();
            }
        }

        let mut registrations = Vec::new();
        let mut routes = BTreeMap::new();
        let mut names = HashSet::new();

        for (position, node) in nodes.iter().enumerate() {
            if node.actions.is_empty() {
                continue;
            }
            if node.locales.is_empty() {
                warn!(id = %node.id, "Node has actions but no locales; nothing registered");
                continue;
            }

            let mut action_names = HashSet::new();
            for action in &node.actions {
                if !action_names.insert(action.name()) {
                    return Err(RouteTreeError::ActionAlreadyExists {
                        node: node.id.clone(),
                        action: action.name().to_string(),
                    });
                }

                let mut constraints = node.constraints.clone();
                constraints.extend(
                    action
                        .constraints()
                        .iter()
                        .map(|(parameter, pattern)| (parameter.clone(), pattern.clone())),
                );
                for (parameter, pattern) in &constraints {
                    compile_constraint(parameter, pattern)?;
                }

                let skipped: Vec<String> = node
                    .skipped_middleware()
                    .iter()
                    .chain(action.skipped_middleware())
                    .cloned()
                    .collect();
                let middleware: Vec<String> = node
                    .effective_middleware()
                    .merged_with(action.own_middleware())
                    .without(&skipped)
                    .iter()
                    .map(|m| m.to_registrar_string())
                    .collect();

                let target = match action.target() {
                    ActionTarget::Controller { controller, method } => ActionTarget::Controller {
                        controller: apply_namespace(node.namespace.as_deref(), controller),
                        method: method.clone(),
                    },
                    ActionTarget::Redirect { target, status } => {
                        self.node_index(target)?;
                        ActionTarget::Redirect {
                            target: target.clone(),
                            status: *status,
                        }
                    }
                    other => other.clone(),
                };

                for locale in &node.locales {
                    let name = action.route_name(locale, &node.id);
                    if !names.insert(name.clone()) {
                        return Err(RouteTreeError::RouteNameAlreadyRegistered(name));
                    }

                    let uri = action.path(locale).unwrap_or_default();
                    if let Some(segment) = find_embedded_placeholder(uri) {
                        return Err(RouteTreeError::invalid_value(
                            "segment",
                            segment,
                            "placeholders must span a whole path segment",
                        ));
                    }

                    let registration = RouteRegistration {
                        name: name.clone(),
                        method: action.method(),
                        uri: uri.to_string(),
                        locale: locale.clone(),
                        node_id: node.id.clone(),
                        action: action.name().to_string(),
                        target: target.clone(),
                        middleware: middleware.clone(),
                        constraints: constraints.clone(),
                    };
                    trace!(name = %name, uri = %registration.uri, "Registering route");
                    registrar.register(&registration)?;

                    routes.insert(
                        name,
                        RegisteredRoute::new(
                            NodeIndex(position),
                            &registration,
                        ),
                    );
                    registrations.push(registration);
                }
            }
        }

        debug!(
            nodes = nodes.len(),
            routes = registrations.len(),
            "Compiled route tree"
        );

        Ok(CompiledRouteTree::new(
            self.config.clone(),
            Arc::clone(&self.translator),
            nodes,
            self.index.clone(),
            routes,
            registrations,
            registrar,
        ))
    }

    /// Full path of a node for one locale
    ///
    /// Segments are collected upwards until (and including) the first node
    /// that does not inherit its ancestors' segments.
    fn compile_path(&self, index: NodeIndex, locale: &str) -> String {
        let mut segments = Vec::new();
        let mut current = Some(index);

        while let Some(position) = current {
            let node = &self.nodes[position.0];
            segments.push(self.resolve_segment(NodeIndex(position.0), locale));

            if node.resource_child {
                let resource = node
                    .parent
                    .and_then(|parent| self.nodes[parent.0].resource.as_ref());
                if let Some(resource) = resource {
                    segments.push(resource.parameter().placeholder());
                }
            }

            if !node.inherit_segment {
                break;
            }
            current = node.parent;
        }
        segments.reverse();

        let node = &self.nodes[index.0];
        let prefixed = !self.config.is_single_locale()
            && !node.no_locale_prefix
            && !self.config.is_prefix_exempt(locale);
        let prefix = if prefixed { locale } else { "" };

        join_segments(std::iter::once(prefix.to_string()).chain(segments))
    }

    /// Segment a node contributes for a locale
    fn resolve_segment(&self, index: NodeIndex, locale: &str) -> String {
        let node = &self.nodes[index.0];

        if index == self.root_index() {
            return node.segment_for(locale).unwrap_or("").to_string();
        }
        if let Some(parameter) = &node.parameter {
            return parameter.placeholder();
        }
        if let Some(segment) = node.segment_for(locale) {
            return segment.to_string();
        }

        let key = translation_key(&self.config.translation_base, &node.id, "segment", None);
        if self.translator.has(&key, locale) {
            return self
                .translator
                .translate(&key, &TranslationParameters::new(), locale);
        }
        node.name.clone()
    }

    /// Recomputes the locale set and prefix flag of a node and its subtree
    ///
    /// Descendants attached before the node's locale policy changed pick up
    /// the new policy here.
    fn refresh_locales(&mut self, index: NodeIndex) {
        let default_locale = self.config.default_locale().to_string();
        let mut pending = vec![index];

        while let Some(current) = pending.pop() {
            let (parent_locales, parent_unprefixed) = match self.nodes[current.0].parent {
                Some(parent) => {
                    let parent = &self.nodes[parent.0];
                    (parent.locales.clone(), parent.no_locale_prefix)
                }
                None => (self.config.locales.clone(), false),
            };

            let node = &mut self.nodes[current.0];
            node.no_locale_prefix |= parent_unprefixed;
            node.narrow_locales(&parent_locales, &default_locale);
            trace!(id = %node.id, locales = ?node.locales, "Refreshed node locales");
            pending.extend(node.children.values().copied());
        }
    }

    fn translate_or(&self, key: &str, locale: &str, fallback: &str) -> String {
        if self.translator.has(key, locale) {
            self.translator
                .translate(key, &TranslationParameters::new(), locale)
        } else {
            fallback.to_string()
        }
    }
}

/// Translation key for a node-level value
///
/// The node's ancestry becomes the locale-file path below `base`, e.g.
/// `pages/blog.segment.article` for node `blog.article`, or
/// `pages/blog.title.article_show` with an action.
pub(crate) fn translation_key(base: &str, node_id: &str, key: &str, action: Option<&str>) -> String {
    let (ancestry, name) = match node_id.rsplit_once('.') {
        Some((ancestors, name)) => (format!("/{}", ancestors.replace('.', "/")), name),
        None => (String::new(), node_id),
    };
    let suffix = action.map(|action| format!("_{}", action)).unwrap_or_default();
    format!("{}{}.{}.{}{}", base, ancestry, key, name, suffix)
}

/// Mutable handle on one attached node during configuration
///
/// Dereferences to [`RouteNode`], so every node setter is available directly;
/// the methods here additionally need the surrounding tree.
pub struct NodeBuilder<'a> {
    tree: &'a mut RouteTree,
    index: NodeIndex,
}

impl<'a> Deref for NodeBuilder<'a> {
    type Target = RouteNode;

    fn deref(&self) -> &RouteNode {
        &self.tree.nodes[self.index.0]
    }
}

impl<'a> DerefMut for NodeBuilder<'a> {
    fn deref_mut(&mut self) -> &mut RouteNode {
        &mut self.tree.nodes[self.index.0]
    }
}

impl<'a> NodeBuilder<'a> {
    fn new(tree: &'a mut RouteTree, index: NodeIndex) -> Self {
        Self { tree, index }
    }

    pub fn index(&self) -> NodeIndex {
        self.index
    }

    pub fn config(&self) -> &RouteTreeConfig {
        &self.tree.config
    }

    // ========================================================================
    // Children
    // ========================================================================

    /// Attaches a child node and configures it
    pub fn child<F>(&mut self, name: &str, configure: F) -> Result<NodeIndex>
    where
        F: FnOnce(&mut NodeBuilder<'_>) -> Result<()>,
    {
        self.attach(RouteNode::new(name), configure)
    }

    /// Attaches a node prepared beforehand (e.g. with pre-declared skips)
    pub fn attach<F>(&mut self, node: RouteNode, configure: F) -> Result<NodeIndex>
    where
        F: FnOnce(&mut NodeBuilder<'_>) -> Result<()>,
    {
        let index = self.tree.attach(self.index, node)?;
        configure(&mut NodeBuilder::new(self.tree, index))?;
        Ok(index)
    }

    // ========================================================================
    // Locales
    // ========================================================================

    /// Restricts the node to the given locales
    pub fn only_locales<I, S>(&mut self, locales: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.node_mut().only_locales = Some(locales.into_iter().map(Into::into).collect());
        self.refresh_locales();
        self
    }

    /// Removes the given locales from the node
    pub fn except_locales<I, S>(&mut self, locales: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.node_mut()
            .except_locales
            .extend(locales.into_iter().map(Into::into));
        self.refresh_locales();
        self
    }

    /// Generates the node (and nodes attached below it) for the default
    /// locale only, without locale prefix
    pub fn no_locale_prefix(&mut self) -> &mut Self {
        self.node_mut().no_locale_prefix = true;
        self.refresh_locales();
        self
    }

    fn refresh_locales(&mut self) {
        self.tree.refresh_locales(self.index);
    }

    fn node_mut(&mut self) -> &mut RouteNode {
        &mut self.tree.nodes[self.index.0]
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Adds an action; names must be unique within the node
    pub fn add_action(&mut self, action: RouteAction) -> Result<&mut RouteAction> {
        if self.has_action(action.name()) {
            return Err(RouteTreeError::ActionAlreadyExists {
                node: self.id.clone(),
                action: action.name().to_string(),
            });
        }

        let node = self.node_mut();
        node.actions.push(action);
        let last = node.actions.len() - 1;
        Ok(&mut node.actions[last])
    }

    pub fn get(&mut self, handler: impl Into<String>) -> Result<&mut RouteAction> {
        self.add_action(RouteAction::handler(Method::Get, handler))
    }

    pub fn post(&mut self, handler: impl Into<String>) -> Result<&mut RouteAction> {
        self.add_action(RouteAction::handler(Method::Post, handler))
    }

    pub fn put(&mut self, handler: impl Into<String>) -> Result<&mut RouteAction> {
        self.add_action(RouteAction::handler(Method::Put, handler))
    }

    pub fn patch(&mut self, handler: impl Into<String>) -> Result<&mut RouteAction> {
        self.add_action(RouteAction::handler(Method::Patch, handler))
    }

    pub fn delete(&mut self, handler: impl Into<String>) -> Result<&mut RouteAction> {
        self.add_action(RouteAction::handler(Method::Delete, handler))
    }

    pub fn options(&mut self, handler: impl Into<String>) -> Result<&mut RouteAction> {
        self.add_action(RouteAction::handler(Method::Options, handler))
    }

    /// Adds a controller action written as `Controller@method`
    pub fn controller(&mut self, method: Method, reference: &str) -> Result<&mut RouteAction> {
        self.add_action(RouteAction::controller(method, reference))
    }

    /// Adds a GET action rendering `view` with static data
    pub fn view(&mut self, view: impl Into<String>, data: Value) -> Result<&mut RouteAction> {
        self.add_action(RouteAction::view(view, data))
    }

    /// Adds a GET action redirecting (302) to another node's default action
    pub fn redirect(&mut self, target: impl Into<String>) -> Result<&mut RouteAction> {
        self.redirect_with_status(target, 302)
    }

    pub fn redirect_with_status(
        &mut self,
        target: impl Into<String>,
        status: u16,
    ) -> Result<&mut RouteAction> {
        self.add_action(RouteAction::redirect(target, status))
    }

    // ========================================================================
    // Resources
    // ========================================================================

    /// Declares all seven RESTful actions for `controller`
    pub fn resource(&mut self, parameter: RouteParameter, controller: &str) -> Result<()> {
        self.resource_only(parameter, controller, &RESOURCE_ACTIONS)
    }

    /// Declares the listed RESTful actions only
    pub fn resource_only(
        &mut self,
        parameter: RouteParameter,
        controller: &str,
        only: &[&str],
    ) -> Result<()> {
        let resource = RouteResource::new(parameter, controller);
        let locales = self.locales.clone();

        let base = &self.tree.config.translation_base;
        let create_key = format!("{}.resource.create", base);
        let edit_key = format!("{}.resource.edit", base);
        let create: LanguageMapping<String> = locales
            .iter()
            .map(|locale| (locale.as_str(), self.tree.translate_or(&create_key, locale, "create")))
            .collect();
        let edit: LanguageMapping<String> = locales
            .iter()
            .map(|locale| (locale.as_str(), self.tree.translate_or(&edit_key, locale, "edit")))
            .collect();

        for action in resource.actions(only, &locales, &create, &edit) {
            self.add_action(action)?;
        }

        debug!(id = %self.id, controller, actions = ?only, "Declared resource");
        self.node_mut().resource = Some(resource);
        Ok(())
    }

    /// Declares every RESTful action except the listed ones
    pub fn resource_except(
        &mut self,
        parameter: RouteParameter,
        controller: &str,
        except: &[&str],
    ) -> Result<()> {
        let only: Vec<&str> = RESOURCE_ACTIONS
            .iter()
            .copied()
            .filter(|name| !except.contains(name))
            .collect();
        self.resource_only(parameter, controller, &only)
    }
}
