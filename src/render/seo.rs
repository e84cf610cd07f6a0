//! Open Graph tags and schema.org structured data

use serde::Serialize;
use serde_json::json;
use serde_yaml::Value;

use crate::config::SiteConfig;
use crate::content::ContentDocument;
use crate::helpers::{date_xml, full_url_for};

/// One `<meta property="..." content="...">` element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaTag {
    pub property: String,
    pub content: String,
}

impl MetaTag {
    fn new(property: &str, content: impl Into<String>) -> Self {
        Self {
            property: property.to_string(),
            content: content.into(),
        }
    }
}

/// Page-level Open Graph data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenGraph {
    pub title: String,
    /// `website` or `article`
    pub kind: &'static str,
    pub url: String,
    pub locale: String,
    pub description: Option<String>,
    pub site_name: Option<String>,
    pub image: Option<String>,
}

impl OpenGraph {
    /// Home and section pages
    pub fn website(config: &SiteConfig, title: &str, path: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            kind: "website",
            url: full_url_for(config, path),
            locale: config.language.clone(),
            description: non_empty(description),
            site_name: non_empty(&config.title),
            image: non_empty(&config.image).map(|image| absolute(config, &image)),
        }
    }

    /// A document's own page. `language` and `image` in the front
    /// matter override the site values.
    pub fn article(config: &SiteConfig, document: &ContentDocument, title: &str, path: &str) -> Self {
        let image = match document.attributes().get("image") {
            Some(Value::String(src)) => non_empty(src),
            Some(Value::Mapping(map)) => map
                .get("src")
                .and_then(Value::as_str)
                .and_then(non_empty),
            _ => None,
        }
        .or_else(|| non_empty(&config.image));

        Self {
            title: title.to_string(),
            kind: "article",
            url: full_url_for(config, path),
            locale: document
                .attribute("language")
                .unwrap_or_else(|| config.language.clone()),
            description: document.description().as_deref().and_then(non_empty),
            site_name: non_empty(&config.title),
            image: image.map(|image| absolute(config, &image)),
        }
    }

    pub fn tags(&self) -> Vec<MetaTag> {
        let mut tags = vec![
            MetaTag::new("og:title", &self.title),
            MetaTag::new("og:type", self.kind),
            MetaTag::new("og:url", &self.url),
            MetaTag::new("og:locale", &self.locale),
        ];
        let optional = [
            ("og:description", &self.description),
            ("og:site_name", &self.site_name),
            ("og:image", &self.image),
        ];
        for (property, value) in optional {
            if let Some(value) = value {
                tags.push(MetaTag::new(property, value));
            }
        }
        tags
    }
}

/// A person credited on an article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub url: Option<String>,
}

impl Author {
    /// Authors listed under `authors`, or the site author
    pub fn of(config: &SiteConfig, document: &ContentDocument) -> Vec<Author> {
        let listed: Vec<Author> = match document.attributes().get("authors") {
            Some(Value::Sequence(items)) => items.iter().filter_map(Self::from_value).collect(),
            Some(value) => Self::from_value(value).into_iter().collect(),
            None => Vec::new(),
        };
        if !listed.is_empty() {
            return listed;
        }

        non_empty(&config.author)
            .map(|name| Author {
                name,
                url: non_empty(&config.author_url),
            })
            .into_iter()
            .collect()
    }

    /// A bare name, or a mapping with `name` (or `first_name` and
    /// `last_name`, or `username`) and an optional `url`
    fn from_value(value: &Value) -> Option<Author> {
        match value {
            Value::String(name) => non_empty(name).map(|name| Author { name, url: None }),
            Value::Mapping(map) => {
                let field = |key: &str| map.get(key).and_then(Value::as_str).and_then(non_empty);
                let full_name = match (field("first_name"), field("last_name")) {
                    (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
                    (first, last) => first.or(last),
                };
                let name = field("name").or(full_name).or_else(|| field("username"))?;
                Some(Author {
                    name,
                    url: field("url"),
                })
            }
            _ => None,
        }
    }
}

/// `article:*` Open Graph data for a document page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleMeta {
    pub published_time: Option<String>,
    pub modified_time: Option<String>,
    pub section: String,
    pub authors: Vec<Author>,
    pub tags: Vec<String>,
}

impl ArticleMeta {
    pub fn new(config: &SiteConfig, document: &ContentDocument, section: &str) -> Self {
        Self {
            published_time: document.date().as_ref().map(date_xml),
            modified_time: document.updated().as_ref().map(date_xml),
            section: section.to_string(),
            authors: Author::of(config, document),
            tags: document.tags(),
        }
    }

    pub fn tags(&self) -> Vec<MetaTag> {
        let mut tags = Vec::new();
        if let Some(published) = &self.published_time {
            tags.push(MetaTag::new("article:published_time", published));
        }
        if let Some(modified) = &self.modified_time {
            tags.push(MetaTag::new("article:modified_time", modified));
        }
        tags.push(MetaTag::new("article:section", &self.section));
        for author in &self.authors {
            tags.push(MetaTag::new(
                "article:author",
                author.url.as_deref().unwrap_or(&author.name),
            ));
        }
        for tag in &self.tags {
            tags.push(MetaTag::new("article:tag", tag));
        }
        tags
    }

    /// schema.org `Article` for the page described by `og`
    pub fn json_ld(&self, config: &SiteConfig, og: &OpenGraph) -> String {
        let mut article = json!({
            "@context": "https://schema.org",
            "@type": "Article",
            "headline": og.title,
        });
        if let Some(image) = &og.image {
            article["image"] = json!(image);
        }
        article["author"] = self
            .authors
            .iter()
            .map(|author| {
                let mut person = json!({ "@type": "Person", "name": author.name });
                if let Some(url) = &author.url {
                    person["url"] = json!(url);
                }
                person
            })
            .collect();
        if let Some(published) = &self.published_time {
            article["datePublished"] = json!(published);
        }
        if let Some(modified) = &self.modified_time {
            article["dateModified"] = json!(modified);
        }

        let mut publisher = json!({ "@type": "Organization", "name": config.title });
        if let Some(logo) = non_empty(&config.image) {
            publisher["logo"] = json!(absolute(config, &logo));
        }
        article["publisher"] = publisher;
        article["mainEntityOfPage"] = json!(og.url);

        embed_json_ld(&article)
    }
}

/// Serialise JSON-LD so it cannot close its `<script>` element
pub(crate) fn embed_json_ld(value: &serde_json::Value) -> String {
    value.to_string().replace('<', "\\u003c")
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Site-relative image paths become absolute URLs
fn absolute(config: &SiteConfig, src: &str) -> String {
    if src.contains("://") {
        src.to_string()
    } else {
        full_url_for(config, src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FrontMatter;

    fn config() -> SiteConfig {
        SiteConfig {
            title: "Electric Toolbox".to_string(),
            author: "Jane Roe".to_string(),
            url: "https://example.com".to_string(),
            ..SiteConfig::default()
        }
    }

    fn doc(raw: &str) -> ContentDocument {
        let (fm, body) = FrontMatter::parse(raw).unwrap();
        ContentDocument::new("blog/hello-world.md", fm.attributes, body)
    }

    fn property<'a>(tags: &'a [MetaTag], name: &str) -> Vec<&'a str> {
        tags.iter()
            .filter(|t| t.property == name)
            .map(|t| t.content.as_str())
            .collect()
    }

    #[test]
    fn test_website_tags() {
        let og = OpenGraph::website(&config(), "Blog", "blog", "");
        let tags = og.tags();
        assert_eq!(property(&tags, "og:type"), vec!["website"]);
        assert_eq!(property(&tags, "og:url"), vec!["https://example.com/blog"]);
        assert_eq!(property(&tags, "og:locale"), vec!["en"]);
        assert_eq!(property(&tags, "og:site_name"), vec!["Electric Toolbox"]);
        assert!(property(&tags, "og:description").is_empty());
        assert!(property(&tags, "og:image").is_empty());
    }

    #[test]
    fn test_article_tags() {
        let config = config();
        let document = doc(
            "---\ntitle: Hello\ndescription: First words\nlanguage: pt\nimage:\n  src: /images/cover.png\ndate: 2024-01-15\ntags: [rust, intro]\n---\n",
        );
        let og = OpenGraph::article(&config, &document, "Hello", "blog/hello-world");
        let tags = og.tags();
        assert_eq!(property(&tags, "og:type"), vec!["article"]);
        assert_eq!(property(&tags, "og:locale"), vec!["pt"]);
        assert_eq!(property(&tags, "og:description"), vec!["First words"]);
        assert_eq!(
            property(&tags, "og:image"),
            vec!["https://example.com/images/cover.png"]
        );

        let article = ArticleMeta::new(&config, &document, "Blog").tags();
        assert_eq!(property(&article, "article:section"), vec!["Blog"]);
        assert_eq!(property(&article, "article:author"), vec!["Jane Roe"]);
        assert_eq!(property(&article, "article:tag"), vec!["rust", "intro"]);
        assert_eq!(property(&article, "article:published_time").len(), 1);
        assert_eq!(
            property(&article, "article:modified_time"),
            property(&article, "article:published_time")
        );
    }

    #[test]
    fn test_front_matter_authors() {
        let document = doc(
            "---\nauthors:\n  - first_name: Ada\n    last_name: Lovelace\n    url: https://example.org/ada\n  - Grace\n---\n",
        );
        assert_eq!(
            Author::of(&config(), &document),
            vec![
                Author {
                    name: "Ada Lovelace".to_string(),
                    url: Some("https://example.org/ada".to_string()),
                },
                Author {
                    name: "Grace".to_string(),
                    url: None,
                },
            ]
        );
    }

    #[test]
    fn test_site_author_is_the_default() {
        let config = SiteConfig {
            author_url: "https://example.com/about".to_string(),
            ..config()
        };
        let article = ArticleMeta::new(&config, &doc("---\ntitle: Hi\n---\n"), "Blog");
        assert_eq!(
            property(&article.tags(), "article:author"),
            vec!["https://example.com/about"]
        );
    }

    #[test]
    fn test_article_json_ld() {
        let config = config();
        let document = doc("---\ntitle: \"</script>\"\ndate: 2024-01-15\n---\n");
        let og = OpenGraph::article(&config, &document, "</script>", "blog/hello-world");
        let json = ArticleMeta::new(&config, &document, "Blog").json_ld(&config, &og);

        assert!(!json.contains("</script>"));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["@type"], "Article");
        assert_eq!(value["headline"], "</script>");
        assert_eq!(value["author"][0]["@type"], "Person");
        assert_eq!(value["author"][0]["name"], "Jane Roe");
        assert_eq!(value["publisher"]["name"], "Electric Toolbox");
        assert_eq!(value["mainEntityOfPage"], "https://example.com/blog/hello-world");
        assert!(value["datePublished"].as_str().unwrap().starts_with("2024-01-15T"));
        assert!(value.get("image").is_none());
    }
}
