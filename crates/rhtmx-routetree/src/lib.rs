//! # RHTMX RouteTree
//!
//! A hierarchical, multi-locale model of an application's URL space:
//! - Nodes with per-locale segments, compiled into one path per locale
//! - Middleware and controller namespaces inherited down the tree
//! - Path parameters with enumerable value sources
//! - Reverse URL generation that fills parameters from the active request
//! - Payloads (titles, metadata) with a fallback chain
//! - Sitemap generation through cartesian parameter expansion
//!
//! ## Build phase and serve phase
//!
//! A [`RouteTree`] is configured through [`NodeBuilder`] callbacks and then
//! compiled once into a [`CompiledRouteTree`]. The compiled tree is
//! read-only and `Send + Sync`; request-scoped state lives in a
//! [`RequestContext`] created per request by [`CompiledRouteTree::resolve`].
//!
//! ## Example
//!
//! ```
//! use rhtmx_routetree::{Method, Middleware, RouteParameter, RouteTree, RouteTreeConfig};
//!
//! let mut tree = RouteTree::new(RouteTreeConfig::with_locales(["de", "en"]));
//! tree.child("blog", |blog| {
//!     blog.segment("de", "magazin").middleware(Middleware::new("web"));
//!     blog.get("list_articles")?;
//!     blog.child("article", |article| {
//!         article.parameter(RouteParameter::new("article").with_keys(["ownership", "traits"]));
//!         article.get("show_article")?;
//!         Ok(())
//!     })?;
//!     Ok(())
//! })?;
//!
//! let tree = tree.compile()?;
//! assert_eq!(tree.get_node("blog.article")?.path("de"), Some("de/magazin/{article}"));
//!
//! let context = tree.resolve(Method::Get, "/de/magazin/traits");
//! assert_eq!(context.active_parameter("article"), Some("traits"));
//!
//! let english = tree.url(&context).locale("en").generate()?;
//! assert_eq!(english, "/en/blog/traits");
//! # Ok::<(), rhtmx_routetree::RouteTreeError>(())
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

mod action;
mod compiled;
mod config;
mod context;
mod error;
mod expansion;
mod language;
mod middleware;
pub mod node;
mod parameter;
pub mod path;
mod payload;
mod registrar;
mod resource;
mod sitemap;
mod translator;
mod tree;
mod url;

// Re-export public types
pub use action::{ActionTarget, Method, RouteAction};
pub use compiled::{CompiledRouteTree, RegisteredRoute};
pub use config::{RouteTreeConfig, SitemapConfig};
pub use context::{ActiveRoute, RequestContext};
pub use error::{Result, RouteTreeError};
pub use expansion::{expand_parameters, ResolvedRoute};
pub use language::LanguageMapping;
pub use middleware::{Middleware, MiddlewareMap};
pub use node::RouteNode;
pub use parameter::{ParameterMap, ParameterSource, RouteParameter, ValueProvider};
pub use payload::{ComputedPayload, PayloadValue, RoutePayload};
pub use registrar::{InMemoryRegistrar, RouteMatch, RouteRegistrar, RouteRegistration};
pub use resource::{RouteResource, RESOURCE_ACTIONS};
pub use sitemap::{ChangeFrequency, SitemapEntry, SitemapSettings};
pub use translator::{MapTranslator, NullTranslator, TranslationParameters, Translator};
pub use tree::{NodeBuilder, NodeIndex, RouteTree};
pub use url::RouteUrlBuilder;
