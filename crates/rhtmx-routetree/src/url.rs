//! Reverse URL generation with auto-filled parameters

use crate::compiled::CompiledRouteTree;
use crate::context::RequestContext;
use crate::error::{Result, RouteTreeError};
use crate::language::LanguageMapping;
use crate::parameter::ParameterMap;
use crate::path::required_parameters;
use crate::tree::NodeIndex;
use tracing::trace;

#[derive(Debug, Clone)]
enum NodeTarget {
    Id(String),
    Index(NodeIndex),
}

/// Fluent URL builder for one target action
///
/// Defaults: the active node (or the root), the node's default action
/// (`index`, then `get`, then the first declared one), the request locale
/// and the configured absolute/relative setting. Required parameters not
/// given explicitly are taken from the active request when the target's root
/// line carries a parameter of the same name.
///
/// # Examples
///
/// ```
/// use rhtmx_routetree::{Method, RouteParameter, RouteTree, RouteTreeConfig};
///
/// let mut tree = RouteTree::new(RouteTreeConfig::with_locales(["de", "en"]));
/// tree.child("blog", |blog| {
///     blog.child("article", |article| {
///         article.parameter(RouteParameter::new("article"));
///         article.get("show_article")?;
///         article.child("comments", |comments| {
///             comments.get("list_comments")?;
///             Ok(())
///         })?;
///         Ok(())
///     })?;
///     Ok(())
/// })?;
/// let tree = tree.compile()?;
///
/// let context = tree.resolve(Method::Get, "/en/blog/ownership");
/// let url = tree.url(&context).node("blog.article.comments").generate()?;
/// assert_eq!(url, "/en/blog/ownership/comments");
///
/// let url = tree.url(&context).node("blog.article").parameter("article", "traits").generate()?;
/// assert_eq!(url, "/en/blog/traits");
/// # Ok::<(), rhtmx_routetree::RouteTreeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RouteUrlBuilder<'a> {
    tree: &'a CompiledRouteTree,
    context: &'a RequestContext,
    node: Option<NodeTarget>,
    action: Option<String>,
    parameters: ParameterMap,
    locale: Option<String>,
    absolute: Option<bool>,
}

impl<'a> RouteUrlBuilder<'a> {
    pub(crate) fn new(tree: &'a CompiledRouteTree, context: &'a RequestContext) -> Self {
        Self {
            tree,
            context,
            node: None,
            action: None,
            parameters: ParameterMap::new(),
            locale: None,
            absolute: None,
        }
    }

    /// Targets the node with the given dotted id
    pub fn node(mut self, id: impl Into<String>) -> Self {
        self.node = Some(NodeTarget::Id(id.into()));
        self
    }

    pub fn node_index(mut self, index: NodeIndex) -> Self {
        self.node = Some(NodeTarget::Index(index));
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Sets one parameter explicitly; explicit values win over active ones
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn parameters(mut self, parameters: ParameterMap) -> Self {
        self.parameters.extend(parameters);
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn absolute(mut self, absolute: bool) -> Self {
        self.absolute = Some(absolute);
        self
    }

    /// Resolves the URL
    pub fn generate(self) -> Result<String> {
        let tree = self.tree;
        let context = self.context;

        let index = match &self.node {
            Some(NodeTarget::Id(id)) => tree.node_index(id)?,
            Some(NodeTarget::Index(index)) => *index,
            None => context
                .active()
                .map(|active| active.node_index())
                .unwrap_or_else(|| tree.root_index()),
        };
        let node = tree.node_at(index);

        let action = match &self.action {
            Some(name) => node.action(name),
            None => node.default_action(),
        }
        .ok_or_else(|| RouteTreeError::ActionNotFound {
            node: node.id().to_string(),
            action: self.action.clone().unwrap_or_else(|| "index".to_string()),
        })?;

        // Unprefixed nodes have one URL serving every locale
        let requested = self.locale.as_deref().unwrap_or_else(|| context.locale());
        let locale = match node.locales().first() {
            Some(only) if node.has_no_locale_prefix() && !node.has_locale(requested) => {
                only.as_str()
            }
            _ => requested,
        };
        let path = action
            .path(locale)
            .ok_or_else(|| RouteTreeError::LocaleNotAvailable {
                node: node.id().to_string(),
                locale: locale.to_string(),
            })?;
        let route_name = action.route_name(locale, node.id());

        let root_line = tree.action_parameters(index, action.name());
        let mut parameters = self.parameters;
        let mut missing = Vec::new();

        for name in required_parameters(path) {
            if parameters.contains_key(&name) {
                continue;
            }

            let active = root_line
                .iter()
                .find(|parameter| parameter.name() == name)
                .and_then(|parameter| parameter.active_route_key(context, locale));
            match active {
                Some(value) => {
                    parameters.insert(name, value);
                }
                None => missing.push(name),
            }
        }

        if !missing.is_empty() {
            return Err(RouteTreeError::UrlParametersMissing {
                route: route_name,
                missing,
            });
        }

        let absolute = self.absolute.unwrap_or(tree.config().absolute_urls);
        trace!(route = %route_name, ?parameters, absolute, "Building URL");
        tree.registrar().url(&route_name, &parameters, absolute)
    }
}

impl CompiledRouteTree {
    /// URLs of the active action in every locale of the active node
    ///
    /// Active parameters are translated to each locale; locales whose URL
    /// cannot be built are left out.
    pub fn alternate_urls(&self, context: &RequestContext) -> LanguageMapping<String> {
        let Some(active) = context.active() else {
            return LanguageMapping::new();
        };
        let node = self.node_at(active.node_index());

        node.locales()
            .iter()
            .filter_map(|locale| {
                self.url(context)
                    .node_index(active.node_index())
                    .action(active.action())
                    .locale(locale.as_str())
                    .generate()
                    .ok()
                    .map(|url| (locale.as_str(), url))
            })
            .collect()
    }
}
