//! Integration tests for cartesian expansion and sitemap generation

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rhtmx_routetree::*;
use rstest::rstest;
use std::sync::Arc;

struct ProductsByCategory;

impl ValueProvider for ProductsByCategory {
    fn route_keys(&self, _locale: &str, context: &ParameterMap) -> Vec<String> {
        match context.get("category").map(String::as_str) {
            Some("books") => vec!["dune".to_string(), "emma".to_string()],
            Some("games") => vec!["chess".to_string()],
            _ => Vec::new(),
        }
    }
}

fn shop(config: RouteTreeConfig) -> CompiledRouteTree {
    let mut tree = RouteTree::new(config);
    tree.configure_root(|root| {
        root.get("home")?;
        root.sitemap().priority(1.0)?.change_frequency("daily")?;
        Ok(())
    })
    .unwrap();
    tree.child("shop", |shop| {
        shop.get("shop_index")?;
        shop.child("category", |category| {
            category.parameter(RouteParameter::new("category").with_keys(["books", "games"]));
            category.get("show_category")?;
            category.child("product", |product| {
                product.parameter(
                    RouteParameter::new("product").with_provider(Arc::new(ProductsByCategory)),
                );
                product.get("show_product")?;
                product.post("add_to_cart")?;
                product
                    .sitemap()
                    .priority(0.6)?
                    .lastmod(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
                Ok(())
            })?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    tree.child("account", |account| {
        account.sitemap().exclude(true);
        account.get("account")?;
        Ok(())
    })
    .unwrap();
    tree.child("search", |search| {
        search.parameter(RouteParameter::new("term"));
        search.get("search")?;
        Ok(())
    })
    .unwrap();
    tree.child("old-shop", |old| {
        old.redirect("shop")?;
        Ok(())
    })
    .unwrap();
    tree.compile().unwrap()
}

#[test]
fn test_resolved_routes_follow_dependent_keys() {
    let tree = shop(RouteTreeConfig::default());
    let resolved = tree.resolved_routes("en.shop.category.product.get").unwrap();

    let products: Vec<&str> = resolved
        .iter()
        .map(|r| r.parameters["product"].as_str())
        .collect();
    assert_eq!(products, vec!["dune", "emma", "chess"]);
    assert!(resolved.iter().all(|r| r.locale == "en"));
}

#[rstest]
#[case("en.get", 1)]
#[case("en.shop.category.get", 2)]
#[case("en.shop.category.product.get", 3)]
#[case("en.search.get", 0)]
fn test_resolved_route_counts(#[case] route: &str, #[case] expected: usize) {
    let tree = shop(RouteTreeConfig::default());
    assert_eq!(tree.resolved_routes(route).unwrap().len(), expected);
}

#[test]
fn test_resolved_routes_unknown_name() {
    let tree = shop(RouteTreeConfig::default());
    assert!(matches!(
        tree.resolved_routes("en.nothing"),
        Err(RouteTreeError::RouteNotRegistered(_))
    ));
}

#[test]
fn test_sitemap_entries() {
    let config = RouteTreeConfig::default().with_base_url("https://shop.example");
    let tree = shop(config);
    let entries = tree.sitemap_entries().unwrap();

    let locs: Vec<&str> = entries.iter().map(|e| e.loc.as_str()).collect();
    assert_eq!(
        locs,
        vec![
            "https://shop.example/",
            "https://shop.example/shop",
            "https://shop.example/shop/books",
            "https://shop.example/shop/games",
            "https://shop.example/shop/books/dune",
            "https://shop.example/shop/books/emma",
            "https://shop.example/shop/games/chess",
        ]
    );

    assert_eq!(entries[0].priority, Some(1.0));
    assert_eq!(entries[0].change_frequency, Some(ChangeFrequency::Daily));
    assert_eq!(entries[4].priority, Some(0.6));
    assert_eq!(entries[4].lastmod, NaiveDate::from_ymd_opt(2024, 5, 1));
    assert_eq!(entries[1].priority, None);
}

#[test]
fn test_sitemap_defaults_from_config() {
    let mut config = RouteTreeConfig::with_locales(["de", "en"]);
    config.sitemap.default_priority = Some(0.5);
    config.sitemap.default_change_frequency = Some("weekly".to_string());
    config.sitemap.exclude_redirects = false;

    let tree = shop(config);
    let entries = tree.sitemap_entries().unwrap();

    assert_eq!(entries.len(), 16);
    let shop_de = entries
        .iter()
        .find(|e| e.route_name == "de.shop.get")
        .unwrap();
    assert_eq!(shop_de.loc, "http://localhost/de/shop");
    assert_eq!(shop_de.priority, Some(0.5));
    assert_eq!(shop_de.change_frequency, Some(ChangeFrequency::Weekly));
    assert!(entries.iter().any(|e| e.route_name == "en.old-shop.get"));
}

#[test]
fn test_invalid_default_frequency() {
    let mut config = RouteTreeConfig::default();
    config.sitemap.default_change_frequency = Some("often".to_string());
    let tree = shop(config);

    assert!(matches!(
        tree.sitemap_entries(),
        Err(RouteTreeError::InvalidParameterValueDomain { .. })
    ));
}

#[rstest]
#[case(5.0)]
#[case(-0.1)]
fn test_out_of_range_default_priority(#[case] priority: f32) {
    let mut config = RouteTreeConfig::default();
    config.sitemap.default_priority = Some(priority);
    let tree = shop(config);

    assert!(matches!(
        tree.sitemap_entries(),
        Err(RouteTreeError::InvalidParameterValueDomain { .. })
    ));
    assert!(tree.sitemap_xml().is_err());
}

#[test]
fn test_sitemap_xml() {
    let tree = shop(RouteTreeConfig::default());
    let xml = tree.sitemap_xml().unwrap();

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset"));
    assert!(xml.contains("<loc>http://localhost/shop/books/dune</loc>"));
    assert!(xml.contains("<lastmod>2024-05-01</lastmod>"));
    assert!(xml.contains("<changefreq>daily</changefreq>"));
    assert!(xml.contains("<priority>0.6</priority>"));
    assert!(!xml.contains("account"));
    assert!(xml.trim_end().ends_with("</urlset>"));
}

#[test]
fn test_sitemap_entry_serializes() {
    let tree = shop(RouteTreeConfig::default());
    let entries = tree.sitemap_entries().unwrap();
    let value = serde_json::to_value(&entries[0]).unwrap();

    assert_eq!(value["change_frequency"], "daily");
    assert!(value.get("lastmod").is_none());
}
