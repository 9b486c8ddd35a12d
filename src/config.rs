use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Site-wide settings loaded from `site.toml`.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SiteConfig {
    /// Default document title, used as-is on the home page.
    pub title: String,
    /// Template for subpage titles; `{page}` is replaced with the page title.
    pub title_template: String,
    pub description: String,
    /// Absolute origin used for sitemap URLs, no trailing slash.
    pub base_url: String,
    pub author: String,
    pub language: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Statistics".to_string(),
            title_template: "{page} | My Mini-blog".to_string(),
            description: "This blog discusses statistics.".to_string(),
            base_url: "http://localhost:8080".to_string(),
            author: String::new(),
            language: "en".to_string(),
        }
    }
}

impl SiteConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading {}", path.as_ref().display()))?;
        let config: SiteConfig = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.as_ref().display()))?;
        Ok(config)
    }

    /// Document title for a route: the site title on the home page, the
    /// template with `{page}` substituted everywhere else.
    pub fn document_title(&self, page_title: Option<&str>) -> String {
        match page_title {
            Some(title) => self.title_template.replace("{page}", title),
            None => self.title.clone(),
        }
    }

    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
