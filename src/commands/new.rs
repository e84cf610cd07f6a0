//! Create a new post

use anyhow::{bail, Result};
use std::fs;
use std::path::PathBuf;

use crate::config::is_section_name;
use crate::Blog;

/// Write `<content_dir>/<collection>/<slug>.md` with title and date
/// front matter
pub fn create_post(blog: &Blog, title: &str, collection: &str) -> Result<PathBuf> {
    let slug = slug::slugify(title);
    if slug.is_empty() {
        bail!("Cannot derive a file name from title {:?}", title);
    }
    if !is_section_name(collection) {
        bail!(
            "Invalid collection {:?}: must be a single directory name",
            collection
        );
    }
    if !blog.config.sections.contains_key(collection) {
        tracing::warn!(
            "Section {:?} is not configured; the post will not be published",
            collection
        );
    }

    let target_dir = blog.content_dir.join(collection);
    fs::create_dir_all(&target_dir)?;

    let file_path = target_dir.join(format!("{}.md", slug));
    if file_path.exists() {
        bail!("File already exists: {:?}", file_path);
    }

    let now = chrono::Local::now();
    // Serialising the title keeps quotes and colons valid YAML
    let title_yaml = serde_yaml::to_string(title)?;
    let content = format!(
        "---\ntitle: {}\ndate: {}\ntags:\n---\n",
        title_yaml.trim_end(),
        now.format("%Y-%m-%d %H:%M:%S")
    );

    fs::write(&file_path, content)?;
    println!("Created: {:?}", file_path);

    Ok(file_path)
}

/// Run the new command
pub fn run(blog: &Blog, title: &str, collection: Option<&str>) -> Result<PathBuf> {
    let collection = collection.unwrap_or(&blog.config.new_post_collection);
    create_post(blog, title, collection)
}
