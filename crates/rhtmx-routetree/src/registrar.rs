//! The route registrar seam and an in-memory implementation
//!
//! Compilation hands every (action, locale) pair to a [`RouteRegistrar`] as a
//! [`RouteRegistration`]. An HTTP framework adapter implements the trait to
//! install real routes; [`InMemoryRegistrar`] matches and generates URLs on
//! its own and is what [`RouteTree::compile`](crate::RouteTree::compile) uses.

use crate::action::{ActionTarget, Method};
use crate::error::{Result, RouteTreeError};
use crate::parameter::ParameterMap;
use crate::path::{calculate_priority, normalize_path, parse_pattern, PatternSegment};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// One route issued at compile time
///
/// Serializable so a compiled registration list can be cached and replayed
/// verbatim into a registrar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRegistration {
    /// Globally unique name: `locale.nodeId.actionName`
    pub name: String,
    pub method: Method,
    /// Compiled path without leading slash, e.g. `de/blog/{article}`
    pub uri: String,
    pub locale: String,
    pub node_id: String,
    pub action: String,
    pub target: ActionTarget,
    /// Middleware in `name:param1,param2` form, in declaration order
    pub middleware: Vec<String>,
    pub constraints: BTreeMap<String, String>,
}

/// A registrar's answer to an incoming request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub name: String,
    pub parameters: ParameterMap,
}

/// Receives compiled routes and resolves requests and URLs against them
pub trait RouteRegistrar: Send + Sync {
    /// Installs a route; names must be unique
    fn register(&mut self, registration: &RouteRegistration) -> Result<()>;

    /// Finds the route serving `method` and `path`
    fn match_route(&self, method: Method, path: &str) -> Option<RouteMatch>;

    /// Builds the URL of a named route from already complete parameters
    fn url(&self, name: &str, parameters: &ParameterMap, absolute: bool) -> Result<String>;
}

#[derive(Debug)]
struct CompiledRoute {
    registration: RouteRegistration,
    segments: Vec<PatternSegment>,
    priority: usize,
    constraints: Vec<(String, Regex)>,
}

impl CompiledRoute {
    fn new(registration: &RouteRegistration) -> Result<Self> {
        let segments = parse_pattern(&registration.uri);
        let priority = calculate_priority(&segments);
        let constraints = registration
            .constraints
            .iter()
            .map(|(parameter, pattern)| {
                compile_constraint(parameter, pattern).map(|regex| (parameter.clone(), regex))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            registration: registration.clone(),
            segments,
            priority,
            constraints,
        })
    }

    fn matches(&self, path_segments: &[&str]) -> Option<ParameterMap> {
        let params = match_segments(&self.segments, path_segments, ParameterMap::new())?;

        let all_valid = params.iter().all(|(name, value)| {
            self.constraints
                .iter()
                .find(|(parameter, _)| parameter == name)
                .map(|(_, regex)| regex.is_match(value))
                .unwrap_or(true)
        });

        if all_valid {
            Some(params)
        } else {
            None
        }
    }
}

/// Anchored regex for a parameter constraint
pub(crate) fn compile_constraint(parameter: &str, pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| RouteTreeError::InvalidConstraint {
        parameter: parameter.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

// Walks pattern and path segments together
fn match_segments(
    pattern: &[PatternSegment],
    path: &[&str],
    mut params: ParameterMap,
) -> Option<ParameterMap> {
    let Some((segment, rest)) = pattern.split_first() else {
        return if path.is_empty() { Some(params) } else { None };
    };

    match segment {
        PatternSegment::Static(text) => {
            let (first, remaining) = path.split_first()?;
            if *first != text.as_str() {
                return None;
            }
            match_segments(rest, remaining, params)
        }
        PatternSegment::Required(name) => {
            let (first, remaining) = path.split_first()?;
            params.insert(name.clone(), decode(first));
            match_segments(rest, remaining, params)
        }
        PatternSegment::Optional(name) => {
            if let Some((first, remaining)) = path.split_first() {
                let mut consumed = params.clone();
                consumed.insert(name.clone(), decode(first));
                if let Some(found) = match_segments(rest, remaining, consumed) {
                    return Some(found);
                }
            }
            match_segments(rest, path, params)
        }
    }
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

/// Self-contained registrar: segment matching and URL generation in memory
#[derive(Debug, Default)]
pub struct InMemoryRegistrar {
    base_url: String,
    routes: Vec<CompiledRoute>,
    by_name: HashMap<String, usize>,
    match_order: Vec<usize>,
}

impl InMemoryRegistrar {
    /// Creates a registrar prefixing absolute URLs with `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&RouteRegistration> {
        self.by_name
            .get(name)
            .map(|&index| &self.routes[index].registration)
    }

    /// Registrations in the order they were installed
    pub fn registrations(&self) -> impl Iterator<Item = &RouteRegistration> {
        self.routes.iter().map(|route| &route.registration)
    }
}

impl RouteRegistrar for InMemoryRegistrar {
    fn register(&mut self, registration: &RouteRegistration) -> Result<()> {
        if self.by_name.contains_key(&registration.name) {
            return Err(RouteTreeError::RouteNameAlreadyRegistered(
                registration.name.clone(),
            ));
        }

        let route = CompiledRoute::new(registration)?;
        let index = self.routes.len();
        trace!(name = %registration.name, uri = %registration.uri, "Registered route");

        self.routes.push(route);
        self.by_name.insert(registration.name.clone(), index);
        self.match_order.push(index);

        // Stable sort keeps registration order within a priority class
        let routes = &self.routes;
        self.match_order.sort_by_key(|&i| routes[i].priority);
        Ok(())
    }

    fn match_route(&self, method: Method, path: &str) -> Option<RouteMatch> {
        let normalized = normalize_path(path);
        let path_segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();

        self.match_order.iter().find_map(|&index| {
            let route = &self.routes[index];
            if route.registration.method != method {
                return None;
            }
            route.matches(&path_segments).map(|parameters| RouteMatch {
                name: route.registration.name.clone(),
                parameters,
            })
        })
    }

    fn url(&self, name: &str, parameters: &ParameterMap, absolute: bool) -> Result<String> {
        let route = self
            .by_name
            .get(name)
            .map(|&index| &self.routes[index])
            .ok_or_else(|| RouteTreeError::RouteNotRegistered(name.to_string()))?;

        let mut used = Vec::new();
        let mut missing = Vec::new();
        let mut segments = Vec::new();

        for segment in &route.segments {
            match segment {
                PatternSegment::Static(text) => segments.push(text.clone()),
                PatternSegment::Required(param) => match parameters.get(param) {
                    Some(value) => {
                        segments.push(urlencoding::encode(value).into_owned());
                        used.push(param.as_str());
                    }
                    None => missing.push(param.clone()),
                },
                PatternSegment::Optional(param) => {
                    if let Some(value) = parameters.get(param) {
                        segments.push(urlencoding::encode(value).into_owned());
                        used.push(param.as_str());
                    }
                }
            }
        }

        if !missing.is_empty() {
            return Err(RouteTreeError::UrlParametersMissing {
                route: name.to_string(),
                missing,
            });
        }

        let query = parameters
            .iter()
            .filter(|(key, _)| !used.contains(&key.as_str()))
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&");

        let mut url = format!("/{}", segments.join("/"));
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        if absolute {
            url = format!("{}{}", self.base_url, url);
        }

        trace!(route = name, url = %url, "Generated URL");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn registration(name: &str, method: Method, uri: &str) -> RouteRegistration {
        RouteRegistration {
            name: name.to_string(),
            method,
            uri: uri.to_string(),
            locale: "en".to_string(),
            node_id: String::new(),
            action: method.as_str().to_string(),
            target: ActionTarget::Handler {
                handler: "h".to_string(),
            },
            middleware: Vec::new(),
            constraints: BTreeMap::new(),
        }
    }

    fn params(pairs: &[(&str, &str)]) -> ParameterMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_static_route_wins_over_dynamic() {
        let mut registrar = InMemoryRegistrar::new("https://example.com");
        registrar
            .register(&registration("en.blog.article.get", Method::Get, "en/blog/{article}"))
            .unwrap();
        registrar
            .register(&registration("en.blog.new.get", Method::Get, "en/blog/new"))
            .unwrap();

        let found = registrar.match_route(Method::Get, "/en/blog/new").unwrap();
        assert_eq!(found.name, "en.blog.new.get");

        let found = registrar.match_route(Method::Get, "/en/blog/ownership/").unwrap();
        assert_eq!(found.name, "en.blog.article.get");
        assert_eq!(found.parameters, params(&[("article", "ownership")]));
    }

    #[test]
    fn test_method_must_match() {
        let mut registrar = InMemoryRegistrar::default();
        registrar
            .register(&registration("en.contact.post", Method::Post, "en/contact"))
            .unwrap();
        assert!(registrar.match_route(Method::Get, "/en/contact").is_none());
        assert!(registrar.match_route(Method::Post, "/en/contact").is_some());
    }

    #[test]
    fn test_optional_segment() {
        let mut registrar = InMemoryRegistrar::default();
        registrar
            .register(&registration("en.news.get", Method::Get, "en/news/{page?}"))
            .unwrap();

        let without = registrar.match_route(Method::Get, "/en/news").unwrap();
        assert!(without.parameters.is_empty());
        let with = registrar.match_route(Method::Get, "/en/news/2").unwrap();
        assert_eq!(with.parameters, params(&[("page", "2")]));
    }

    #[test]
    fn test_constraint_rejects_match() {
        let mut registrar = InMemoryRegistrar::default();
        let mut route = registration("en.user.get", Method::Get, "en/user/{id}");
        route.constraints.insert("id".to_string(), r"\d+".to_string());
        registrar.register(&route).unwrap();

        assert!(registrar.match_route(Method::Get, "/en/user/42").is_some());
        assert!(registrar.match_route(Method::Get, "/en/user/abc").is_none());
    }

    #[test]
    fn test_invalid_constraint_fails_registration() {
        let mut registrar = InMemoryRegistrar::default();
        let mut route = registration("en.user.get", Method::Get, "en/user/{id}");
        route.constraints.insert("id".to_string(), "(".to_string());
        let err = registrar.register(&route).unwrap_err();
        assert!(matches!(err, RouteTreeError::InvalidConstraint { .. }));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registrar = InMemoryRegistrar::default();
        registrar
            .register(&registration("en.get", Method::Get, "en"))
            .unwrap();
        let err = registrar
            .register(&registration("en.get", Method::Get, "en/other"))
            .unwrap_err();
        assert!(matches!(err, RouteTreeError::RouteNameAlreadyRegistered(name) if name == "en.get"));
    }

    #[test]
    fn test_url_generation_with_query_and_encoding() {
        let mut registrar = InMemoryRegistrar::new("https://example.com/");
        registrar
            .register(&registration("en.search.get", Method::Get, "en/search/{term}"))
            .unwrap();

        let url = registrar
            .url(
                "en.search.get",
                &params(&[("term", "rust lang"), ("page", "2")]),
                false,
            )
            .unwrap();
        assert_eq!(url, "/en/search/rust%20lang?page=2");

        let url = registrar
            .url("en.search.get", &params(&[("term", "x")]), true)
            .unwrap();
        assert_eq!(url, "https://example.com/en/search/x");
    }

    #[test]
    fn test_url_missing_and_unknown() {
        let mut registrar = InMemoryRegistrar::default();
        registrar
            .register(&registration("en.search.get", Method::Get, "en/search/{term}"))
            .unwrap();

        let err = registrar
            .url("en.search.get", &ParameterMap::new(), false)
            .unwrap_err();
        assert!(matches!(
            err,
            RouteTreeError::UrlParametersMissing { missing, .. } if missing == vec!["term".to_string()]
        ));

        let err = registrar.url("en.nope", &ParameterMap::new(), false).unwrap_err();
        assert!(matches!(err, RouteTreeError::RouteNotRegistered(_)));
    }

    #[test]
    fn test_root_route_matches_slash() {
        let mut registrar = InMemoryRegistrar::default();
        registrar.register(&registration("get", Method::Get, "")).unwrap();
        assert_eq!(registrar.match_route(Method::Get, "/").unwrap().name, "get");
        assert_eq!(registrar.url("get", &ParameterMap::new(), false).unwrap(), "/");
    }

    #[test]
    fn test_registration_serializes() {
        let route = registration("en.get", Method::Get, "en");
        let value = serde_json::to_value(&route).unwrap();
        assert_eq!(value["method"], json!("GET"));
        assert_eq!(value["target"], json!({"type": "handler", "handler": "h"}));

        let back: RouteRegistration = serde_json::from_value(value).unwrap();
        assert_eq!(back, route);
    }
}
