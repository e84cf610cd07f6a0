//! Content store - the read-only set of documents for one build

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use super::frontmatter::FrontMatterError;
use super::{ContentDocument, FrontMatter};

/// Failure to load the content set. Reported to the operator; readers
/// see an empty store.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("content directory {0:?} does not exist or is not a directory")]
    Unreachable(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed front-matter in {path:?}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },
}

/// Anything that can produce the full, ordered set of documents
pub trait ContentSource {
    fn load_all(&self) -> Result<Vec<ContentDocument>, LoadError>;
}

/// Loads markdown documents from a directory tree
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    root: PathBuf,
    include_drafts: bool,
}

impl FileSystemSource {
    pub fn new<P: AsRef<Path>>(root: P, include_drafts: bool) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            include_drafts,
        }
    }

    fn load_document(&self, path: &Path) -> Result<ContentDocument, LoadError> {
        let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let (fm, body) = FrontMatter::parse(&raw).map_err(|source| LoadError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        let source = path
            .strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        Ok(ContentDocument::new(source, fm.attributes, body))
    }
}

impl ContentSource for FileSystemSource {
    fn load_all(&self) -> Result<Vec<ContentDocument>, LoadError> {
        if !self.root.is_dir() {
            return Err(LoadError::Unreachable(self.root.clone()));
        }

        let mut documents = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() || !is_markdown_file(path) {
                continue;
            }

            let document = self.load_document(path)?;
            if document.is_draft() && !self.include_drafts {
                tracing::debug!("Skipping draft {}", document.source());
                continue;
            }
            if !document.is_routable() {
                tracing::warn!(
                    "Skipping {}: {:?} cannot be used as a slug",
                    document.source(),
                    document.slug()
                );
                continue;
            }

            tracing::debug!("Loaded {} as {:?}", document.source(), document.slug());
            documents.push(document);
        }

        Ok(documents)
    }
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

/// Every document known to this build, in source order.
///
/// Populated once and never mutated; a reload builds a new store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentStore {
    documents: Vec<ContentDocument>,
}

impl ContentStore {
    /// Load from `source`. A [`LoadError`] is logged and yields an empty
    /// store.
    pub fn load(source: &dyn ContentSource) -> Self {
        match Self::try_load(source) {
            Ok(store) => store,
            Err(e) => {
                tracing::error!("Failed to load content: {}", e);
                Self::default()
            }
        }
    }

    pub fn try_load(source: &dyn ContentSource) -> Result<Self, LoadError> {
        Ok(Self::from_documents(source.load_all()?))
    }

    pub fn from_documents(documents: Vec<ContentDocument>) -> Self {
        Self { documents }
    }

    pub fn documents(&self) -> &[ContentDocument] {
        &self.documents
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContentDocument> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Document loaded from exactly this relative path
    pub fn by_source(&self, source: &str) -> Option<&ContentDocument> {
        self.documents.iter().find(|d| d.source() == source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, body: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_load_in_path_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "blog/second-post.md", "---\ntitle: Second Post\n---\nTwo");
        write(dir.path(), "blog/hello-world.md", "---\ntitle: Hello World\n---\nOne");
        write(dir.path(), "index.md", "Welcome");
        write(dir.path(), "blog/notes.txt", "ignored");

        let store = ContentStore::try_load(&FileSystemSource::new(dir.path(), false)).unwrap();
        let sources: Vec<_> = store.iter().map(|d| d.source()).collect();
        assert_eq!(
            sources,
            vec!["blog/hello-world.md", "blog/second-post.md", "index.md"]
        );
        assert_eq!(store.by_source("index.md").map(|d| d.content()), Some("Welcome"));
    }

    #[test]
    fn test_drafts_are_skipped_unless_requested() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "blog/wip.md", "---\ntitle: WIP\ndraft: true\n---\n");
        write(dir.path(), "blog/done.md", "---\ntitle: Done\n---\n");

        let published = ContentStore::try_load(&FileSystemSource::new(dir.path(), false)).unwrap();
        assert_eq!(published.len(), 1);

        let all = ContentStore::try_load(&FileSystemSource::new(dir.path(), true)).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_unroutable_stems_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "blog/..md", "---\ntitle: Dots\n---\n");
        write(dir.path(), "blog/!!!.md", "---\ntitle: Bangs\n---\n");
        write(dir.path(), "blog/Hello-World.md", "---\ntitle: Hello\n---\n");

        let store = ContentStore::try_load(&FileSystemSource::new(dir.path(), false)).unwrap();
        let slugs: Vec<_> = store.iter().map(|d| d.slug()).collect();
        assert_eq!(slugs, vec!["!!!", "Hello-World"]);
    }

    #[test]
    fn test_missing_root_is_unreachable() {
        let dir = TempDir::new().unwrap();
        let source = FileSystemSource::new(dir.path().join("nope"), false);
        assert!(matches!(
            ContentStore::try_load(&source),
            Err(LoadError::Unreachable(_))
        ));
        assert!(ContentStore::load(&source).is_empty());
    }

    #[test]
    fn test_malformed_frontmatter_fails_the_load() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "blog/good.md", "---\ntitle: Good\n---\n");
        write(dir.path(), "blog/bad.md", "---\ntitle: [oops\n---\n");

        let source = FileSystemSource::new(dir.path(), false);
        assert!(matches!(
            ContentStore::try_load(&source),
            Err(LoadError::Malformed { .. })
        ));
        assert!(ContentStore::load(&source).is_empty());
    }
}
