//! Sitemap hints per node and sitemap generation over the compiled tree

use crate::action::Method;
use crate::compiled::CompiledRouteTree;
use crate::error::{Result, RouteTreeError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// How often a page is expected to change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFrequency::Always => "always",
            ChangeFrequency::Hourly => "hourly",
            ChangeFrequency::Daily => "daily",
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
            ChangeFrequency::Yearly => "yearly",
            ChangeFrequency::Never => "never",
        }
    }

    /// Parses a sitemap `changefreq` token
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_routetree::ChangeFrequency;
    ///
    /// assert_eq!(ChangeFrequency::parse("weekly").unwrap(), ChangeFrequency::Weekly);
    /// assert!(ChangeFrequency::parse("fortnightly").is_err());
    /// ```
    pub fn parse(token: &str) -> Result<Self> {
        match token {
            "always" => Ok(ChangeFrequency::Always),
            "hourly" => Ok(ChangeFrequency::Hourly),
            "daily" => Ok(ChangeFrequency::Daily),
            "weekly" => Ok(ChangeFrequency::Weekly),
            "monthly" => Ok(ChangeFrequency::Monthly),
            "yearly" => Ok(ChangeFrequency::Yearly),
            "never" => Ok(ChangeFrequency::Never),
            other => Err(RouteTreeError::invalid_value(
                "changefreq",
                other,
                "expected one of always, hourly, daily, weekly, monthly, yearly, never",
            )),
        }
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sitemap hints configured on a node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SitemapSettings {
    priority: Option<f32>,
    change_frequency: Option<ChangeFrequency>,
    lastmod: Option<NaiveDate>,
    exclude: bool,
}

impl SitemapSettings {
    /// Sets the priority; must lie within `0.0..=1.0`
    pub fn priority(&mut self, priority: f32) -> Result<&mut Self> {
        self.priority = Some(check_priority(priority)?);
        Ok(self)
    }

    pub fn change_frequency(&mut self, token: &str) -> Result<&mut Self> {
        self.change_frequency = Some(ChangeFrequency::parse(token)?);
        Ok(self)
    }

    pub fn lastmod(&mut self, date: NaiveDate) -> &mut Self {
        self.lastmod = Some(date);
        self
    }

    /// Leaves every route of the node out of the sitemap
    pub fn exclude(&mut self, exclude: bool) -> &mut Self {
        self.exclude = exclude;
        self
    }

    pub fn get_priority(&self) -> Option<f32> {
        self.priority
    }

    pub fn get_change_frequency(&self) -> Option<ChangeFrequency> {
        self.change_frequency
    }

    pub fn get_lastmod(&self) -> Option<NaiveDate> {
        self.lastmod
    }

    pub fn is_excluded(&self) -> bool {
        self.exclude
    }
}

fn check_priority(priority: f32) -> Result<f32> {
    if !(0.0..=1.0).contains(&priority) {
        return Err(RouteTreeError::invalid_value(
            "priority",
            priority,
            "must be between 0.0 and 1.0",
        ));
    }
    Ok(priority)
}

/// One `<url>` of a sitemap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub loc: String,
    pub locale: String,
    pub route_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_frequency: Option<ChangeFrequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<NaiveDate>,
}

impl CompiledRouteTree {
    /// Every concrete GET URL of the tree, in registration order
    ///
    /// Parameterized routes are expanded over all parameter combinations;
    /// routes with a parameter whose values cannot be listed produce no entry.
    pub fn sitemap_entries(&self) -> Result<Vec<SitemapEntry>> {
        let sitemap_config = &self.config().sitemap;
        let default_frequency = sitemap_config
            .default_change_frequency
            .as_deref()
            .map(ChangeFrequency::parse)
            .transpose()?;
        let default_priority = sitemap_config
            .default_priority
            .map(check_priority)
            .transpose()?;

        let mut entries = Vec::new();
        for registration in self.registrations() {
            if registration.method != Method::Get {
                continue;
            }

            let Some(route) = self.registered_route(&registration.name) else {
                continue;
            };
            let node = self.node_at(route.node_index());
            let settings = node.sitemap_settings();
            if settings.is_excluded() {
                continue;
            }

            let is_redirect = node
                .action(route.action())
                .map(|action| action.is_redirect())
                .unwrap_or(false);
            if is_redirect && sitemap_config.exclude_redirects {
                continue;
            }

            for resolved in self.resolved_routes(&registration.name)? {
                let loc = self
                    .registrar()
                    .url(&registration.name, &resolved.parameters, true)?;
                entries.push(SitemapEntry {
                    loc,
                    locale: registration.locale.clone(),
                    route_name: registration.name.clone(),
                    priority: settings.get_priority().or(default_priority),
                    change_frequency: settings.get_change_frequency().or(default_frequency),
                    lastmod: settings.get_lastmod(),
                });
            }
        }

        debug!(entries = entries.len(), "Generated sitemap entries");
        Ok(entries)
    }

    /// Renders the sitemap as a `<urlset>` XML document
    pub fn sitemap_xml(&self) -> Result<String> {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
        );

        for entry in self.sitemap_entries()? {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
            if let Some(lastmod) = entry.lastmod {
                xml.push_str(&format!("    <lastmod>{}</lastmod>\n", lastmod.format("%Y-%m-%d")));
            }
            if let Some(frequency) = entry.change_frequency {
                xml.push_str(&format!("    <changefreq>{}</changefreq>\n", frequency));
            }
            if let Some(priority) = entry.priority {
                xml.push_str(&format!("    <priority>{:.1}</priority>\n", priority));
            }
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        Ok(xml)
    }
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(-0.1)]
    #[case(1.5)]
    #[case(f32::NAN)]
    fn test_priority_out_of_range(#[case] priority: f32) {
        let mut settings = SitemapSettings::default();
        let err = settings.priority(priority).unwrap_err();
        assert!(matches!(err, RouteTreeError::InvalidParameterValueDomain { .. }));
        assert_eq!(settings.get_priority(), None);
    }

    #[test]
    fn test_valid_settings() {
        let mut settings = SitemapSettings::default();
        settings
            .priority(0.8)
            .unwrap()
            .change_frequency("daily")
            .unwrap()
            .exclude(false);

        assert_eq!(settings.get_priority(), Some(0.8));
        assert_eq!(settings.get_change_frequency(), Some(ChangeFrequency::Daily));
        assert!(!settings.is_excluded());
    }

    #[test]
    fn test_unknown_change_frequency() {
        let mut settings = SitemapSettings::default();
        assert!(settings.change_frequency("sometimes").is_err());
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("/a?b=1&c=<2>"), "/a?b=1&amp;c=&lt;2&gt;");
    }
}
