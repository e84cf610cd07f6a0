//! Breadcrumb trails and their schema.org `BreadcrumbList`

use serde::Serialize;
use serde_json::json;

use super::seo::embed_json_ld;
use crate::config::SiteConfig;
use crate::helpers::{full_url_for, url_for};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Crumb {
    pub name: String,
    /// Root-relative link
    pub path: String,
    /// Absolute URL, used in structured data
    pub url: String,
}

/// Trail from the home page to the current page, root first
#[derive(Debug, Clone, PartialEq)]
pub struct Breadcrumbs {
    items: Vec<Crumb>,
}

impl Breadcrumbs {
    /// A trail holding only the home page
    pub fn home(config: &SiteConfig) -> Self {
        let mut trail = Self { items: Vec::new() };
        trail.push(config, &config.title, "");
        trail
    }

    pub fn then(mut self, config: &SiteConfig, name: &str, path: &str) -> Self {
        self.push(config, name, path);
        self
    }

    fn push(&mut self, config: &SiteConfig, name: &str, path: &str) {
        self.items.push(Crumb {
            name: name.to_string(),
            path: url_for(config, path),
            url: full_url_for(config, path),
        });
    }

    pub fn items(&self) -> &[Crumb] {
        &self.items
    }

    /// JSON-LD payload, safe to embed in a `<script>` element
    pub fn json_ld(&self) -> String {
        let elements: Vec<_> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, crumb)| {
                json!({
                    "@type": "ListItem",
                    "position": i + 1,
                    "name": crumb.name,
                    "item": crumb.url,
                })
            })
            .collect();

        embed_json_ld(&json!({
            "@context": "https://schema.org",
            "@type": "BreadcrumbList",
            "itemListElement": elements,
        }))
    }
}
