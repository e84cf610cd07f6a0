//! Generator module - writes the static site using the built-in templates

use anyhow::{Context as _, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::content::{in_collection, ContentResolver, ContentStore};
use crate::render::SitePages;
use crate::Blog;

/// Counts reported after a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub listings: usize,
    pub posts: usize,
    pub assets: usize,
}

/// Static site generator
pub struct Generator {
    blog: Blog,
    pages: SitePages,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            pages: SitePages::new(&blog.config)?,
        })
    }

    /// Generate the entire site
    pub fn generate(&self, store: &ContentStore) -> Result<BuildSummary> {
        let public_dir = &self.blog.public_dir;
        fs::create_dir_all(public_dir)?;

        let resolver = ContentResolver::new(store);
        for (collection, slug) in resolver.duplicate_slugs() {
            tracing::warn!(
                "Duplicate slug {:?} in {:?}: only the first document is published",
                slug,
                collection
            );
        }

        let mut summary = BuildSummary::default();

        write_page(&public_dir.join("index.html"), &self.pages.home(store)?)?;

        for collection in self.blog.config.sections.keys() {
            if let Some(html) = self.pages.listing(store, collection)? {
                write_page(&public_dir.join(collection).join("index.html"), &html)?;
                summary.listings += 1;
            }

            let mut written = HashSet::new();
            for document in resolver.list_by(in_collection(collection)) {
                if !document.is_routable() {
                    tracing::warn!("Not publishing {}: unusable slug", document.source());
                    continue;
                }
                if !written.insert(document.slug()) {
                    continue;
                }

                let page = self.pages.post(store, collection, document.slug())?;
                let output_path = public_dir
                    .join(collection)
                    .join(document.slug())
                    .join("index.html");
                write_page(&output_path, &page.html)?;
                tracing::debug!("Generated: {:?}", output_path);
                summary.posts += 1;
            }
        }

        self.report_unlisted(store);

        write_page(&public_dir.join("404.html"), &self.pages.not_found()?)?;
        write_page(
            &public_dir.join("css").join("style.css"),
            &self.pages.stylesheet(),
        )?;

        summary.assets = self.copy_content_assets()?;

        Ok(summary)
    }

    /// Documents outside every configured section get no page
    fn report_unlisted(&self, store: &ContentStore) {
        let sections = &self.blog.config.sections;
        for document in store.iter() {
            let listed = sections.keys().any(|key| document.is_under(key));
            if !listed && document.source() != crate::render::HOME_DOCUMENT {
                tracing::debug!("Skipping {:?}: not in a configured section", document.source());
            }
        }
    }

    /// Copy content assets (images, etc.) to the public directory
    fn copy_content_assets(&self) -> Result<usize> {
        let content_dir = &self.blog.content_dir;
        if !content_dir.is_dir() {
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(content_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            // Markdown is rendered, not copied
            let ext = path.extension().and_then(|e| e.to_str());
            if matches!(ext, Some("md") | Some("markdown")) {
                continue;
            }

            let relative = path.strip_prefix(content_dir)?;
            let dest = self.blog.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)
                .with_context(|| format!("Failed to copy {:?} to {:?}", path, dest))?;
            copied += 1;
        }

        Ok(copied)
    }
}

fn write_page(output_path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, contents)
        .with_context(|| format!("Failed to write {:?}", output_path))
}
