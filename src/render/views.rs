//! Display structures built from resolved content
//!
//! Everything here is a pure function of its inputs: no I/O, no clock,
//! no shared state. Templates turn these values into markup.

use serde::Serialize;

use crate::config::SiteConfig;
use crate::content::{ContentDocument, MarkdownRenderer, Resolution};
use crate::helpers::{date_xml, document_url, format_date};

/// One entry of a listing: a link to a document plus its title
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkRow {
    pub href: String,
    pub title: String,
    pub date: Option<String>,
    pub datetime: Option<String>,
    pub description: Option<String>,
}

/// A collection index page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingView {
    pub collection: String,
    pub title: String,
    pub description: String,
    pub rows: Vec<LinkRow>,
}

/// A rendered document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleView {
    pub title: String,
    pub date: Option<String>,
    pub datetime: Option<String>,
    pub reading_time: String,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub body_html: String,
    pub prev: Option<LinkRow>,
    pub next: Option<LinkRow>,
}

/// Detail page state; `Empty` renders no content block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "article", rename_all = "snake_case")]
pub enum DetailView {
    Empty,
    Document(ArticleView),
}

impl DetailView {
    pub fn is_empty(&self) -> bool {
        matches!(self, DetailView::Empty)
    }
}

/// The welcome page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeView {
    pub title: String,
    pub subtitle: String,
    pub welcome: String,
    pub body_html: Option<String>,
    pub recent: Vec<LinkRow>,
}

/// Builds views from documents
pub struct PageRenderer {
    config: SiteConfig,
    markdown: MarkdownRenderer,
}

impl PageRenderer {
    pub fn new(config: &SiteConfig) -> Self {
        let markdown =
            MarkdownRenderer::with_options(&config.highlight.theme, config.highlight.line_number);
        Self {
            config: config.clone(),
            markdown,
        }
    }

    /// Title from attributes, falling back to the slug
    fn title_of(document: &ContentDocument) -> String {
        document
            .title()
            .unwrap_or_else(|| document.slug().to_string())
    }

    pub fn row(&self, collection: &str, document: &ContentDocument) -> LinkRow {
        let date = document.date();
        LinkRow {
            href: document_url(&self.config, collection, document.slug()),
            title: Self::title_of(document),
            date: date
                .as_ref()
                .map(|d| format_date(d, &self.config.date_format)),
            datetime: date.as_ref().map(date_xml),
            description: document.description(),
        }
    }

    pub fn listing(&self, collection: &str, documents: &[&ContentDocument]) -> ListingView {
        let section = self.config.sections.get(collection);
        ListingView {
            collection: collection.to_string(),
            title: self.config.section_title(collection),
            description: section.map(|s| s.description.clone()).unwrap_or_default(),
            rows: documents
                .iter()
                .map(|document| self.row(collection, document))
                .collect(),
        }
    }

    /// Detail view for a lookup result. `NotFound` maps to
    /// [`DetailView::Empty`].
    pub fn detail(
        &self,
        collection: &str,
        resolution: Resolution<'_>,
        neighbours: (Option<&ContentDocument>, Option<&ContentDocument>),
    ) -> DetailView {
        let Resolution::Found(document) = resolution else {
            return DetailView::Empty;
        };

        let (prev, next) = neighbours;
        let date = document.date();

        DetailView::Document(ArticleView {
            title: Self::title_of(document),
            date: date
                .as_ref()
                .map(|d| format_date(d, &self.config.date_format)),
            datetime: date.as_ref().map(date_xml),
            reading_time: document.reading_time(),
            tags: document.tags(),
            description: document.description(),
            body_html: self.markdown.render(document.content()),
            prev: prev.map(|d| self.row(collection, d)),
            next: next.map(|d| self.row(collection, d)),
        })
    }

    /// Home page. `index` is the optional root document whose body is
    /// shown below the welcome message; `recent` is `(collection, doc)`.
    pub fn home(
        &self,
        index: Option<&ContentDocument>,
        recent: &[(&str, &ContentDocument)],
    ) -> HomeView {
        HomeView {
            title: index
                .and_then(|d| d.title())
                .unwrap_or_else(|| self.config.title.clone()),
            subtitle: self.config.subtitle.clone(),
            welcome: self.config.welcome.clone(),
            body_html: index
                .map(|d| d.content())
                .filter(|body| !body.trim().is_empty())
                .map(|body| self.markdown.render(body)),
            recent: recent
                .iter()
                .map(|(collection, document)| self.row(collection, document))
                .collect(),
        }
    }
}
