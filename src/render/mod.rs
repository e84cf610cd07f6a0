//! Page rendering: views from resolved content, then HTML through the
//! embedded templates

mod breadcrumbs;
mod menu;
pub mod navigation;
mod seo;
pub mod views;

pub use breadcrumbs::{Breadcrumbs, Crumb};
pub use menu::{navigation_menu, Location, NavItem};
pub use navigation::{Navigator, PageState, Snapshot, Ticket};
pub use seo::{ArticleMeta, Author, MetaTag, OpenGraph};
pub use views::{ArticleView, DetailView, HomeView, LinkRow, ListingView, PageRenderer};

use anyhow::Result;
use tera::Context;

use crate::config::SiteConfig;
use crate::content::{in_collection, ContentDocument, ContentResolver, ContentStore, Resolution};
use crate::helpers::{encode_segment, url_for};
use crate::templates::TemplateRenderer;

/// Source of the optional home page body
pub const HOME_DOCUMENT: &str = "index.md";

/// A detail page together with whether its document exists
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub found: bool,
    pub html: String,
}

/// Full HTML pages for a site, shared by the generator and the server
pub struct SitePages {
    config: SiteConfig,
    views: PageRenderer,
    templates: TemplateRenderer,
}

impl SitePages {
    pub fn new(config: &SiteConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            views: PageRenderer::new(config),
            templates: TemplateRenderer::new()?,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Welcome page with the most recent documents across all sections
    pub fn home(&self, store: &ContentStore) -> Result<String> {
        let resolver = ContentResolver::new(store);

        let mut recent: Vec<(&str, &ContentDocument)> = self
            .config
            .sections
            .keys()
            .flat_map(|key| {
                resolver
                    .list_by(in_collection(key))
                    .into_iter()
                    .map(move |document| (key.as_str(), document))
            })
            .collect();
        // Newest first; undated documents sink to the end in store order
        recent.sort_by(|a, b| b.1.date().cmp(&a.1.date()));
        recent.truncate(self.config.home.recent_posts);

        let view = self.views.home(store.by_source(HOME_DOCUMENT), &recent);

        let trail = Breadcrumbs::home(&self.config);
        let mut context = self.context(Location::Home, &trail, &view.title);
        let og = OpenGraph::website(&self.config, &self.config.title, "", &self.config.description);
        context.insert("og", &og.tags());
        context.insert("home", &view);
        self.templates.render("home.html", &context)
    }

    /// Index of one configured section, `None` for an unknown section
    pub fn listing(&self, store: &ContentStore, collection: &str) -> Result<Option<String>> {
        if !self.config.sections.contains_key(collection) {
            return Ok(None);
        }

        let resolver = ContentResolver::new(store);
        let documents = resolver.list_by(in_collection(collection));
        let view = self.views.listing(collection, &documents);

        let trail =
            Breadcrumbs::home(&self.config).then(&self.config, &view.title, &encode_segment(collection));
        let mut context = self.context(Location::Section(collection), &trail, &view.title);
        if !view.description.is_empty() {
            context.insert("meta_description", &view.description);
        }
        let og = OpenGraph::website(
            &self.config,
            &view.title,
            &encode_segment(collection),
            &view.description,
        );
        context.insert("og", &og.tags());
        context.insert("listing", &view);
        self.templates.render("listing.html", &context).map(Some)
    }

    /// Detail page for `slug` in `collection`. A missing document, or a
    /// collection that is not a configured section, still renders as an
    /// empty detail view.
    pub fn post(&self, store: &ContentStore, collection: &str, slug: &str) -> Result<RenderedPage> {
        if !self.config.sections.contains_key(collection) {
            tracing::debug!("{:?} is not a configured section", collection);
            return Ok(RenderedPage {
                found: false,
                html: self.not_found()?,
            });
        }

        let resolver = ContentResolver::new(store);
        let resolution = resolver.find_by_slug(collection, slug);
        let view = self
            .views
            .detail(collection, resolution, resolver.neighbours(collection, slug));

        let section_title = self.config.section_title(collection);
        let mut trail = Breadcrumbs::home(&self.config).then(
            &self.config,
            &section_title,
            &encode_segment(collection),
        );

        let mut context = match (&view, resolution) {
            (DetailView::Document(article), Resolution::Found(document)) => {
                let path = format!("{}/{}", encode_segment(collection), encode_segment(slug));
                trail = trail.then(&self.config, &article.title, &path);
                let mut context =
                    self.context(Location::Section(collection), &trail, &article.title);
                if let Some(description) = &article.description {
                    context.insert("meta_description", description);
                }

                let og = OpenGraph::article(&self.config, document, &article.title, &path);
                let meta = ArticleMeta::new(&self.config, document, &section_title);
                let mut tags = og.tags();
                tags.extend(meta.tags());
                context.insert("og", &tags);
                context.insert(
                    "structured_data",
                    &[trail.json_ld(), meta.json_ld(&self.config, &og)],
                );
                context
            }
            _ => {
                tracing::debug!("No document {:?} in {:?}", slug, collection);
                self.context(Location::Section(collection), &trail, "Not found")
            }
        };
        context.insert("detail", &view);

        Ok(RenderedPage {
            found: resolution.is_found(),
            html: self.templates.render("post.html", &context)?,
        })
    }

    /// Page served for any unknown route
    pub fn not_found(&self) -> Result<String> {
        let trail = Breadcrumbs::home(&self.config);
        let mut context = self.context(Location::Elsewhere, &trail, "Not found");
        context.insert("detail", &DetailView::Empty);
        self.templates.render("post.html", &context)
    }

    pub fn stylesheet(&self) -> String {
        self.config.theme.stylesheet()
    }

    /// Variables shared by every page
    fn context(&self, location: Location<'_>, trail: &Breadcrumbs, page_title: &str) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.config);
        context.insert("nav", &navigation_menu(&self.config, location));
        context.insert("breadcrumbs", trail.items());
        context.insert("structured_data", &[trail.json_ld()]);
        context.insert("og", &Vec::<MetaTag>::new());
        context.insert("page_title", page_title);
        context.insert("meta_description", &self.config.description);
        context.insert("stylesheet", &url_for(&self.config, "css/style.css"));
        context.insert("home_url", &url_for(&self.config, ""));
        context.insert(
            "current_year",
            &chrono::Local::now().format("%Y").to_string(),
        );
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FrontMatter;

    fn doc(source: &str, raw: &str) -> ContentDocument {
        let (fm, body) = FrontMatter::parse(raw).unwrap();
        ContentDocument::new(source, fm.attributes, body)
    }

    fn store() -> ContentStore {
        ContentStore::from_documents(vec![
            doc(
                "blog/hello-world.md",
                "---\ntitle: Hello World\ndate: 2024-01-15\n---\nFirst post.",
            ),
            doc(
                "blog/second-post.md",
                "---\ntitle: Second Post\ndate: 2024-02-01\n---\nSecond.",
            ),
            doc("index.md", "---\ntitle: Welcome\n---\nAbout this site."),
        ])
    }

    fn pages() -> SitePages {
        let config = SiteConfig {
            title: "Test Blog".to_string(),
            ..SiteConfig::default()
        };
        SitePages::new(&config).unwrap()
    }

    #[test]
    fn test_listing_links() {
        let html = pages().listing(&store(), "blog").unwrap().unwrap();
        assert!(html.contains(r#"<a href="/blog/hello-world">Hello World</a>"#));
        assert!(html.contains(r#"<a href="/blog/second-post">Second Post</a>"#));
        let first = html.find("/blog/hello-world\"").unwrap();
        let second = html.find("/blog/second-post\"").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_unknown_section_has_no_listing() {
        assert!(pages().listing(&store(), "recipes").unwrap().is_none());
    }

    #[test]
    fn test_post_found() {
        let page = pages().post(&store(), "blog", "hello-world").unwrap();
        assert!(page.found);
        assert!(page.html.contains("<h2>Hello World</h2>"));
        assert!(page.html.contains("<p>First post.</p>"));
        assert!(page.html.contains("BreadcrumbList"));
    }

    #[test]
    fn test_post_open_graph_and_article() {
        let page = pages().post(&store(), "blog", "hello-world").unwrap();
        assert!(page
            .html
            .contains(r#"<meta property="og:type" content="article">"#));
        assert!(page
            .html
            .contains(r#"<meta property="og:url" content="http://example.com/blog/hello-world">"#));
        assert!(page
            .html
            .contains(r#"<meta property="article:section" content="Blog">"#));
        assert!(page
            .html
            .contains(r#"<meta property="article:author" content="John Doe">"#));
        assert!(page.html.contains(r#""@type":"Article""#));
        assert!(page.html.contains(r#""headline":"Hello World""#));
    }

    #[test]
    fn test_home_is_a_website() {
        let html = pages().home(&store()).unwrap();
        assert!(html.contains(r#"<meta property="og:type" content="website">"#));
        assert!(html.contains(r#"<meta property="og:site_name" content="Test Blog">"#));
        assert!(!html.contains(r#""@type":"Article""#));
    }

    #[test]
    fn test_post_outside_sections_is_not_found() {
        let store = ContentStore::from_documents(vec![doc(
            "notes/secret.md",
            "---\ntitle: Secret\n---\nHidden.",
        )]);
        let page = pages().post(&store, "notes", "secret").unwrap();
        assert!(!page.found);
        assert!(!page.html.contains("<article"));
        assert!(!page.html.contains("Hidden."));
    }

    #[test]
    fn test_post_missing_has_no_article() {
        let page = pages().post(&store(), "blog", "missing").unwrap();
        assert!(!page.found);
        assert!(!page.html.contains("<article"));
        assert!(page.html.contains("not-found"));
    }

    #[test]
    fn test_home_lists_newest_first() {
        let html = pages().home(&store()).unwrap();
        assert!(html.contains("<h1>Welcome</h1>"));
        assert!(html.contains("About this site."));
        let newer = html.find("/blog/second-post\"").unwrap();
        let older = html.find("/blog/hello-world\"").unwrap();
        assert!(newer < older);
    }

    #[test]
    fn test_titles_are_escaped() {
        let store = ContentStore::from_documents(vec![doc(
            "blog/tricky.md",
            "---\ntitle: \"<script>alert(1)</script>\"\n---\nBody",
        )]);
        let html = pages().listing(&store, "blog").unwrap().unwrap();
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>alert(1)"));
    }

    #[test]
    fn test_not_found_page() {
        let html = pages().not_found().unwrap();
        assert!(!html.contains("<article"));
        assert!(html.contains("Test Blog"));
    }
}
