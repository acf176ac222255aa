//! Cartesian expansion of parameterized routes into concrete parameter sets

use crate::compiled::CompiledRouteTree;
use crate::error::{Result, RouteTreeError};
use crate::parameter::{ParameterMap, RouteParameter};

/// One concrete combination of parameter values for a registered route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub route_name: String,
    pub locale: String,
    pub parameters: ParameterMap,
}

/// Every combination of values for `parameters`, root-most parameter first
///
/// Depth-first: the first parameter's keys are listed once, and for each key
/// the remaining parameters are expanded with the values chosen so far as
/// context. Duplicate keys yield duplicate combinations; a parameter without
/// listable values yields none.
///
/// # Examples
///
/// ```
/// use rhtmx_routetree::{expand_parameters, RouteParameter};
///
/// let category = RouteParameter::new("category").with_keys(["books", "games"]);
/// let page = RouteParameter::new("page").with_keys(["1", "2", "3"]);
///
/// let combinations = expand_parameters(&[&category, &page], "en");
/// assert_eq!(combinations.len(), 6);
/// assert_eq!(combinations[0]["category"], "books");
/// assert_eq!(combinations[0]["page"], "1");
/// ```
pub fn expand_parameters(parameters: &[&RouteParameter], locale: &str) -> Vec<ParameterMap> {
    let mut combinations = Vec::new();
    expand(parameters, locale, ParameterMap::new(), &mut combinations);
    combinations
}

fn expand(
    parameters: &[&RouteParameter],
    locale: &str,
    chosen: ParameterMap,
    combinations: &mut Vec<ParameterMap>,
) {
    let Some((first, rest)) = parameters.split_first() else {
        combinations.push(chosen);
        return;
    };

    for key in first.route_keys(locale, &chosen) {
        let mut next = chosen.clone();
        next.insert(first.name().to_string(), key);
        expand(rest, locale, next, combinations);
    }
}

impl CompiledRouteTree {
    /// Expands a registered route over all its parameter combinations
    pub fn resolved_routes(&self, route_name: &str) -> Result<Vec<ResolvedRoute>> {
        let route = self
            .registered_route(route_name)
            .ok_or_else(|| RouteTreeError::RouteNotRegistered(route_name.to_string()))?;

        let parameters = self.action_parameters(route.node_index(), route.action());
        Ok(expand_parameters(&parameters, route.locale())
            .into_iter()
            .map(|parameters| ResolvedRoute {
                route_name: route.name().to_string(),
                locale: route.locale().to_string(),
                parameters,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ValueProvider;
    use rstest::rstest;
    use std::sync::Arc;

    struct ArticlesByCategory;

    impl ValueProvider for ArticlesByCategory {
        fn route_keys(&self, _locale: &str, context: &ParameterMap) -> Vec<String> {
            match context.get("category").map(String::as_str) {
                Some("rust") => vec!["ownership".into(), "traits".into(), "macros".into()],
                Some("go") => vec!["channels".into()],
                _ => Vec::new(),
            }
        }
    }

    #[rstest]
    #[case(vec![2, 3], 6)]
    #[case(vec![1, 1, 1], 1)]
    #[case(vec![4, 0], 0)]
    #[case(vec![], 1)]
    fn test_product_of_key_counts(#[case] counts: Vec<usize>, #[case] expected: usize) {
        let parameters: Vec<RouteParameter> = counts
            .iter()
            .enumerate()
            .map(|(i, &n)| {
                RouteParameter::new(format!("p{}", i)).with_keys((0..n).map(|k| k.to_string()))
            })
            .collect();
        let refs: Vec<&RouteParameter> = parameters.iter().collect();

        assert_eq!(expand_parameters(&refs, "en").len(), expected);
    }

    #[test]
    fn test_dependent_keys_see_chosen_values() {
        let category = RouteParameter::new("category").with_keys(["rust", "go"]);
        let article = RouteParameter::new("article").with_provider(Arc::new(ArticlesByCategory));

        let combinations = expand_parameters(&[&category, &article], "en");
        let pairs: Vec<(String, String)> = combinations
            .iter()
            .map(|c| (c["category"].clone(), c["article"].clone()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("rust".to_string(), "ownership".to_string()),
                ("rust".to_string(), "traits".to_string()),
                ("rust".to_string(), "macros".to_string()),
                ("go".to_string(), "channels".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        let tag = RouteParameter::new("tag").with_keys(["a", "a"]);
        assert_eq!(expand_parameters(&[&tag], "en").len(), 2);
    }

    #[test]
    fn test_free_parameter_yields_nothing() {
        let free = RouteParameter::new("slug");
        assert!(expand_parameters(&[&free], "en").is_empty());
    }
}
