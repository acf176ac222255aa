//! Integration tests for URL generation, request resolution and payloads
//!
//! Covers:
//! - Auto-filling parameters from the active request
//! - Explicit overrides and missing parameters
//! - Parameter translation between locales
//! - Payload fallback chain and titles
//! - Concurrent use of one compiled tree

use pretty_assertions::assert_eq;
use rhtmx_routetree::*;
use serde_json::{json, Value};
use std::sync::Arc;

struct Articles;

impl ValueProvider for Articles {
    fn route_keys(&self, locale: &str, _context: &ParameterMap) -> Vec<String> {
        match locale {
            "de" => vec!["eigentum".to_string(), "merkmale".to_string()],
            _ => vec!["ownership".to_string(), "traits".to_string()],
        }
    }

    fn translate_route_key(&self, key: &str, from: &str, to: &str) -> Option<String> {
        let de = ["eigentum", "merkmale"];
        let en = ["ownership", "traits"];
        let (source, target) = match (from, to) {
            ("de", "en") => (de, en),
            ("en", "de") => (en, de),
            _ => return None,
        };
        source
            .iter()
            .position(|k| *k == key)
            .map(|index| target[index].to_string())
    }

    fn payload(
        &self,
        key: &str,
        parameters: &ParameterMap,
        _locale: &str,
        _action: Option<&str>,
    ) -> Option<Value> {
        match key {
            "author" => parameters
                .get("article")
                .map(|article| json!(format!("author of {}", article))),
            _ => None,
        }
    }
}

fn blog() -> CompiledRouteTree {
    let mut tree = RouteTree::new(RouteTreeConfig::with_locales(["de", "en"]));
    tree.child("blog", |blog| {
        blog.segment("de", "magazin");
        blog.get("blog_index")?;
        blog.child("category", |category| {
            category.parameter(RouteParameter::new("category").with_keys(["rust", "go"]));
            category.get("show_category")?;
            category.child("article", |article| {
                article.parameter(RouteParameter::new("article").with_provider(Arc::new(Articles)));
                article.get("show_article")?;
                article
                    .post("store_comment")?
                    .named("comment")
                    .segment("de", "kommentar")
                    .segment("en", "comment");
                Ok(())
            })?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    tree.compile().unwrap()
}

#[test]
fn test_active_parameters_fill_missing_ones() {
    let tree = blog();
    let context = tree.resolve(Method::Get, "/en/blog/rust/ownership");

    let url = tree
        .url(&context)
        .node("blog.category.article")
        .action("comment")
        .generate()
        .unwrap();
    assert_eq!(url, "/en/blog/rust/ownership/comment");
}

#[test]
fn test_explicit_parameter_wins() {
    let tree = blog();
    let context = tree.resolve(Method::Get, "/en/blog/rust/ownership");

    let url = tree
        .url(&context)
        .node("blog.category.article")
        .parameter("article", "traits")
        .generate()
        .unwrap();
    assert_eq!(url, "/en/blog/rust/traits");
}

#[test]
fn test_missing_parameter_is_named() {
    let tree = blog();
    let context = tree.resolve(Method::Get, "/en/blog/rust");

    let err = tree
        .url(&context)
        .node("blog.category.article")
        .generate()
        .unwrap_err();
    match err {
        RouteTreeError::UrlParametersMissing { route, missing } => {
            assert_eq!(route, "en.blog.category.article.get");
            assert_eq!(missing, vec!["article".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_all_missing_parameters_listed() {
    let tree = blog();
    let context = RequestContext::new("en");

    let err = tree
        .url(&context)
        .node("blog.category.article")
        .generate()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Missing parameters for route 'en.blog.category.article.get': category, article"
    );
}

#[test]
fn test_active_parameter_translated_to_target_locale() {
    let tree = blog();
    let context = tree.resolve(Method::Get, "/de/magazin/rust/eigentum");
    assert_eq!(context.locale(), "de");

    let url = tree.url(&context).locale("en").generate().unwrap();
    assert_eq!(url, "/en/blog/rust/ownership");

    let alternates = tree.alternate_urls(&context);
    assert_eq!(alternates.len(), 2);
    assert_eq!(
        alternates.get("de").map(String::as_str),
        Some("/de/magazin/rust/eigentum")
    );
}

#[test]
fn test_link_to_parent_ignores_child_parameters() {
    let tree = blog();
    let context = tree.resolve(Method::Get, "/en/blog/go/traits");

    let url = tree.url(&context).node("blog.category").generate().unwrap();
    assert_eq!(url, "/en/blog/go");
    let url = tree.url(&context).node("blog").generate().unwrap();
    assert_eq!(url, "/en/blog");
}

#[test]
fn test_link_to_unprefixed_node_from_other_locale() {
    let mut tree = RouteTree::new(RouteTreeConfig::with_locales(["de", "en"]));
    tree.child("blog", |blog| {
        blog.get("blog_index")?;
        Ok(())
    })
    .unwrap();
    tree.child("api", |api| {
        api.no_locale_prefix();
        api.get("api_index")?;
        Ok(())
    })
    .unwrap();
    tree.child("impressum", |impressum| {
        impressum.only_locales(["de"]);
        impressum.get("impressum")?;
        Ok(())
    })
    .unwrap();
    let tree = tree.compile().unwrap();

    let context = tree.resolve(Method::Get, "/en/blog");
    assert_eq!(context.locale(), "en");
    assert_eq!(tree.url(&context).node("api").generate().unwrap(), "/api");
    assert_eq!(
        tree.url(&context).node("api").locale("en").generate().unwrap(),
        "/api"
    );

    let err = tree.url(&context).node("impressum").generate().unwrap_err();
    assert!(matches!(
        err,
        RouteTreeError::LocaleNotAvailable { ref node, ref locale } if node == "impressum" && locale == "en"
    ));
}

#[test]
fn test_resource_item_urls() {
    let mut tree = RouteTree::new(RouteTreeConfig::default());
    tree.child("photos", |photos| {
        photos.resource(RouteParameter::new("photo"), "PhotoController")
    })
    .unwrap();
    let tree = tree.compile().unwrap();

    let context = tree.resolve(Method::Get, "/photos/42/edit");
    assert_eq!(tree.current_action(&context).unwrap().name(), "edit");

    let url = tree.url(&context).node("photos").action("show").generate().unwrap();
    assert_eq!(url, "/photos/42");
    let url = tree.url(&context).node("photos").generate().unwrap();
    assert_eq!(url, "/photos");
}

// ============================================================================
// Payloads
// ============================================================================

#[test]
fn test_payload_from_provider() {
    let tree = blog();
    let context = tree.resolve(Method::Get, "/en/blog/rust/traits");
    assert_eq!(
        tree.active_payload(&context, "author"),
        Some(json!("author of traits"))
    );
}

#[test]
fn test_payload_from_translation() {
    let translator = MapTranslator::new()
        .with("en", "pages.title.blog", "The Blog")
        .with("en", "pages/blog.title.category", "Category :category")
        .with("en", "pages/blog.title.category_get", "Showing :category");
    let mut tree = RouteTree::new(RouteTreeConfig::with_locales(["de", "en"]))
        .with_translator(Arc::new(translator));
    tree.child("blog", |blog| {
        blog.get("blog_index")?;
        blog.child("category", |category| {
            category.parameter(RouteParameter::new("category"));
            category.get("show_category")?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    let tree = tree.compile().unwrap();

    let blog = tree.node_index("blog").unwrap();
    let category = tree.node_index("blog.category").unwrap();
    let context = tree.resolve(Method::Get, "/en/blog/rust");

    assert_eq!(tree.title(&context, blog), "The Blog");
    assert_eq!(tree.title(&context, category), "Showing rust");

    let mut params = ParameterMap::new();
    params.insert("category".to_string(), "go".to_string());
    assert_eq!(tree.title_for(&params, category, None, "en"), "Category go");
    assert_eq!(tree.title_for(&params, category, None, "de"), "go");
}

#[test]
fn test_map_payload_selected_by_parameter() {
    let mut tree = RouteTree::new(RouteTreeConfig::default());
    tree.child("category", |category| {
        category.parameter(RouteParameter::new("category").with_keys(["rust", "go"]));
        category.set_payload(
            "description",
            json!({ "rust": "Memory safety", "go": "Goroutines" }),
        );
        category.navigation_title("Topics");
        category.get("show")?;
        Ok(())
    })
    .unwrap();
    let tree = tree.compile().unwrap();

    let context = tree.resolve(Method::Get, "/category/go");
    assert_eq!(
        tree.active_payload(&context, "description"),
        Some(json!("Goroutines"))
    );

    let category = tree.node_index("category").unwrap();
    assert_eq!(tree.navigation_title(&context, category), "Topics");
    assert_eq!(tree.title(&context, category), "go");
}

#[test]
fn test_localized_and_computed_payload() {
    let mut tree = RouteTree::new(RouteTreeConfig::with_locales(["de", "en"]));
    tree.child("about", |about| {
        let titles: LanguageMapping<String> = LanguageMapping::new()
            .with("de", "Ueber uns")
            .with("en", "About us");
        about.title(titles);
        about.set_computed_payload("canonical", |_, locale| Some(json!(format!("/{}/about", locale))));
        about.get("about")?;
        Ok(())
    })
    .unwrap();
    let tree = tree.compile().unwrap();

    let context = tree.resolve(Method::Get, "/de/about");
    let about = tree.node_index("about").unwrap();
    assert_eq!(tree.title(&context, about), "Ueber uns");
    assert_eq!(
        tree.active_payload(&context, "canonical"),
        Some(json!("/de/about"))
    );
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_contexts_are_isolated_across_threads() {
    let tree = Arc::new(blog());

    let handles: Vec<_> = [
        ("/en/blog/rust/ownership", "/en/blog/rust/ownership/comment"),
        ("/de/magazin/go/merkmale", "/de/magazin/go/merkmale/kommentar"),
    ]
    .into_iter()
    .map(|(request, expected)| {
        let tree = Arc::clone(&tree);
        std::thread::spawn(move || {
            let context = tree.resolve(Method::Get, request);
            let url = tree.url(&context).action("comment").generate().unwrap();
            assert_eq!(url, expected);
        })
    })
    .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
