//! List site content

use anyhow::Result;
use indexmap::IndexMap;

use crate::content::{in_collection, ContentResolver, ContentStore};
use crate::Blog;

/// List site content by type
pub fn run(blog: &Blog, content_type: &str) -> Result<()> {
    let store = blog.load_store();
    for line in report(blog, &store, content_type)? {
        println!("{}", line);
    }
    Ok(())
}

/// Lines printed by `list`
pub fn report(blog: &Blog, store: &ContentStore, content_type: &str) -> Result<Vec<String>> {
    let resolver = ContentResolver::new(store);
    let sections = &blog.config.sections;
    let mut lines = Vec::new();

    match content_type {
        "post" | "posts" => {
            let posts: Vec<_> = sections
                .keys()
                .flat_map(|key| {
                    resolver
                        .list_by(in_collection(key))
                        .into_iter()
                        .map(move |doc| (key, doc))
                })
                .collect();
            lines.push(format!("Posts ({}):", posts.len()));
            for (collection, doc) in posts {
                let date = doc
                    .date()
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "----------".to_string());
                lines.push(format!(
                    "  {} - {} [/{}/{}]",
                    date,
                    doc.title().unwrap_or_else(|| doc.slug().to_string()),
                    collection,
                    doc.slug()
                ));
            }
        }
        "section" | "sections" => {
            lines.push(format!("Sections ({}):", sections.len()));
            for (key, section) in sections {
                let count = resolver.list_by(in_collection(key)).len();
                lines.push(format!("  {} - {} ({})", key, section.title, count));
            }
        }
        "tag" | "tags" => {
            let mut tags: IndexMap<String, usize> = IndexMap::new();
            for doc in store.iter() {
                for tag in doc.tags() {
                    *tags.entry(tag).or_insert(0) += 1;
                }
            }
            lines.push(format!("Tags ({}):", tags.len()));
            // Stable sort keeps first-seen order among equal counts
            tags.sort_by(|_, a, _, b| b.cmp(a));
            for (tag, count) in tags {
                lines.push(format!("  {} ({})", tag, count));
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, section, tag",
                content_type
            );
        }
    }

    for (collection, slug) in resolver.duplicate_slugs() {
        lines.push(format!("warning: duplicate slug {}/{}", collection, slug));
    }

    Ok(lines)
}
