//! Content module - documents, front-matter, markdown and resolution

mod document;
mod frontmatter;
mod markdown;
pub mod resolver;
pub mod store;

pub use document::ContentDocument;
pub use frontmatter::{Attributes, FrontMatter, FrontMatterError};
pub use markdown::{MarkdownRenderer, CODE_BLOCK_CLASS};
pub use resolver::{in_collection, ContentResolver, Resolution};
pub use store::{ContentSource, ContentStore, FileSystemSource, LoadError};
