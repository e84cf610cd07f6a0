//! Site configuration (_config.yml)

use anyhow::{bail, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::ThemeConfig;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    /// Profile link for the author in article metadata
    pub author_url: String,
    pub language: String,
    /// Default `og:image` for pages without their own `image`
    pub image: String,
    /// Message shown on the home page
    pub welcome: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub content_dir: String,
    pub public_dir: String,

    // Writing
    pub render_drafts: bool,
    pub new_post_collection: String,
    pub date_format: String,
    #[serde(default)]
    pub highlight: HighlightConfig,

    // Home page
    #[serde(default)]
    pub home: HomeConfig,

    /// Listed collections, keyed by their directory under `content_dir`.
    /// The key doubles as the URL segment.
    pub sections: IndexMap<String, SectionConfig>,

    // Styling
    #[serde(default)]
    pub theme: ThemeConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let mut sections = IndexMap::new();
        sections.insert(
            "blog".to_string(),
            SectionConfig {
                title: "Blog".to_string(),
                description: String::new(),
            },
        );

        Self {
            title: "My Blog".to_string(),
            subtitle: String::new(),
            description: String::new(),
            author: "John Doe".to_string(),
            author_url: String::new(),
            language: "en".to_string(),
            image: String::new(),
            welcome: "Welcome to my corner of the web.".to_string(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            content_dir: "content".to_string(),
            public_dir: "public".to_string(),

            render_drafts: false,
            new_post_collection: "blog".to_string(),
            date_format: "MMMM DD, YYYY".to_string(),
            highlight: HighlightConfig::default(),

            home: HomeConfig::default(),
            sections,
            theme: ThemeConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Section keys become a single URL segment, so they must be one
    /// non-empty path component.
    pub fn validate(&self) -> Result<()> {
        for key in self.sections.keys() {
            if !is_section_name(key) {
                bail!("Invalid section name {:?}: must be a single directory name", key);
            }
        }

        if !self.root.starts_with('/') {
            bail!("`root` must start with '/', got {:?}", self.root);
        }

        Ok(())
    }

    /// Title of a section, falling back to its key
    pub fn section_title(&self, key: &str) -> String {
        self.sections
            .get(key)
            .map(|s| s.title.clone())
            .unwrap_or_else(|| key.to_string())
    }
}

/// A section name is exactly one non-hidden path component
pub fn is_section_name(key: &str) -> bool {
    !(key.is_empty() || key.contains('/') || key.contains('\\') || key.starts_with('.'))
}

/// A listed collection of documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionConfig {
    pub title: String,
    pub description: String,
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// syntect theme name
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

/// Home page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeConfig {
    /// How many posts to link from the home page
    pub recent_posts: usize,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self { recent_posts: 5 }
    }
}
