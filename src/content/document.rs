//! Content document model

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_yaml::Value;
use std::path::Path;

use super::Attributes;

/// Words per minute used for reading time estimates
const WORDS_PER_MINUTE: usize = 200;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\w+").expect("word pattern is valid");
}

/// A single piece of content loaded from the content directory.
///
/// Documents are immutable once built: the fields are private and only
/// exposed through accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentDocument {
    slug: String,
    source: String,
    attributes: Attributes,
    content: String,
}

impl ContentDocument {
    /// Build a document from its path relative to the content root.
    ///
    /// The slug is the file stem as written, so `blog/Hello-World.md`
    /// is reachable as `Hello-World` and nothing else.
    pub fn new(source: impl Into<String>, attributes: Attributes, content: impl Into<String>) -> Self {
        let source = source.into().replace('\\', "/");
        let stem = Path::new(&source)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled");

        Self {
            slug: stem.to_string(),
            source,
            attributes,
            content: content.into(),
        }
    }

    /// URL-safe identifier, unique within a collection
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Path relative to the content root, `/`-separated
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the slug can name its own page under a section.
    ///
    /// Stems such as `.` (from `..md`) would resolve onto the section
    /// listing or its parent.
    pub fn is_routable(&self) -> bool {
        !matches!(self.slug.as_str(), "" | "." | "..")
    }

    /// Author-supplied metadata
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Raw markdown body
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Directory holding the document, relative to the content root.
    /// Empty for documents at the root.
    pub fn collection(&self) -> &str {
        self.source
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("")
    }

    /// Whether the document's path lies under `subdirectory`
    pub fn is_under(&self, subdirectory: &str) -> bool {
        let subdirectory = subdirectory.trim_matches('/');
        subdirectory.is_empty() || Path::new(&self.source).starts_with(subdirectory)
    }

    /// Look up an attribute and render scalar values as a string
    pub fn attribute(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn title(&self) -> Option<String> {
        self.attribute("title").filter(|t| !t.trim().is_empty())
    }

    pub fn description(&self) -> Option<String> {
        self.attribute("description")
    }

    /// Publication date from `date` or `publication_time`
    pub fn date(&self) -> Option<DateTime<Local>> {
        self.attribute("date")
            .or_else(|| self.attribute("publication_time"))
            .and_then(|s| parse_date_string(&s))
    }

    /// Last modification from `updated` or `modified_time`, else the
    /// publication date
    pub fn updated(&self) -> Option<DateTime<Local>> {
        self.attribute("updated")
            .or_else(|| self.attribute("modified_time"))
            .and_then(|s| parse_date_string(&s))
            .or_else(|| self.date())
    }

    /// Tags, accepting either a single string or a list
    pub fn tags(&self) -> Vec<String> {
        match self.attributes.get("tags") {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Drafts are flagged with `draft: true` or `published: false`
    pub fn is_draft(&self) -> bool {
        let flag = |key: &str| self.attributes.get(key).and_then(Value::as_bool);
        flag("draft") == Some(true) || flag("published") == Some(false)
    }

    /// Estimated reading time, e.g. `"3 min"` or `"2 h"`
    pub fn reading_time(&self) -> String {
        let words = WORD.find_iter(&self.content).count();
        let minutes = words / WORDS_PER_MINUTE + 1;
        if minutes > 60 {
            format!("{} h", minutes / 60)
        } else {
            format!("{} min", minutes)
        }
    }
}

/// Parse a date string in various formats
fn parse_date_string(s: &str) -> Option<DateTime<Local>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Local.from_local_datetime(&dt).earliest();
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Local.from_local_datetime(&d.and_hms_opt(0, 0, 0)?).earliest();
        }
    }

    None
}
