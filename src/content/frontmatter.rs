//! Front-matter parsing
//!
//! A document may open with a YAML block fenced by `---` lines or a JSON
//! object (either bare or fenced by `;;;`). Whatever it holds becomes the
//! document's attribute map; the rest of the file is the body.

use indexmap::IndexMap;
use serde_yaml::Value;
use thiserror::Error;

/// Author-supplied metadata, in the order it was written.
pub type Attributes = IndexMap<String, Value>;

/// Errors raised while reading a front-matter block
#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("invalid YAML front-matter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON front-matter: {0}")]
    Json(#[from] serde_json::Error),

    #[error("front-matter must be a mapping of keys to values")]
    NotAMapping,

    #[error("unterminated JSON front-matter")]
    Unterminated,
}

/// Front-matter data from a content file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub attributes: Attributes,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let content = content.trim_start();

        if content.starts_with("---") {
            return Self::parse_yaml(content);
        }

        if content.starts_with(";;;") || content.starts_with('{') {
            return Self::parse_json(content);
        }

        Ok((FrontMatter::default(), content))
    }

    fn parse_yaml(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let rest = content[3..].trim_start_matches(['\n', '\r']);

        let Some(end_pos) = rest.find("\n---") else {
            return Ok((FrontMatter::default(), content));
        };

        let yaml_content = &rest[..end_pos];
        let remaining = rest[end_pos + 4..].trim_start_matches(['\n', '\r']);

        if yaml_content.trim().is_empty() {
            return Ok((FrontMatter::default(), remaining));
        }

        // A leading `---` is also a markdown thematic break. Only treat the
        // block as front-matter when at least one line reads like `key: value`.
        if !yaml_content.lines().any(looks_like_yaml_entry) {
            return Ok((FrontMatter::default(), content));
        }

        let value: Value = serde_yaml::from_str(yaml_content)?;
        Ok((Self::from_value(value)?, remaining))
    }

    fn parse_json(content: &str) -> Result<(Self, &str), FrontMatterError> {
        if let Some(rest) = content.strip_prefix(";;;") {
            let end_pos = rest.find(";;;").ok_or(FrontMatterError::Unterminated)?;
            let json_content = rest[..end_pos].trim();
            let remaining = rest[end_pos + 3..].trim_start_matches(['\n', '\r']);

            // `;;;` blocks may omit the surrounding braces
            let json: serde_json::Value = if json_content.starts_with('{') {
                serde_json::from_str(json_content)?
            } else {
                serde_json::from_str(&format!("{{{}}}", json_content))?
            };
            return Ok((Self::from_value(serde_yaml::to_value(json)?)?, remaining));
        }

        let end_pos = matching_brace(content).ok_or(FrontMatterError::Unterminated)?;
        let json: serde_json::Value = serde_json::from_str(&content[..end_pos])?;
        let remaining = content[end_pos..].trim_start_matches(['\n', '\r']);

        Ok((Self::from_value(serde_yaml::to_value(json)?)?, remaining))
    }

    fn from_value(value: Value) -> Result<Self, FrontMatterError> {
        let mapping = match value {
            Value::Mapping(mapping) => mapping,
            Value::Null => return Ok(Self::default()),
            _ => return Err(FrontMatterError::NotAMapping),
        };

        let mut attributes = Attributes::with_capacity(mapping.len());
        for (key, value) in mapping {
            let key = match key {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return Err(FrontMatterError::NotAMapping),
            };
            attributes.insert(key, value);
        }

        Ok(Self { attributes })
    }
}

/// Whether a line has the shape of a YAML `key: value` entry.
/// URLs (`https://...`) and prose with colons are rejected.
fn looks_like_yaml_entry(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return false;
    }

    let Some(colon_pos) = trimmed.find(':') else {
        return false;
    };

    let key = &trimmed[..colon_pos];
    let is_valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && !matches!(key, "http" | "https" | "ftp");

    let after_colon = &trimmed[colon_pos + 1..];
    is_valid_key && (after_colon.is_empty() || after_colon.starts_with(' '))
}

/// Byte offset just past the brace closing the object that opens `content`.
fn matching_brace(content: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in content.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}
