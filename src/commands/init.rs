//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

const DEFAULT_CONFIG: &str = r#"# Site
title: My Blog
subtitle: ''
description: ''
author: John Doe
author_url: ''
language: en
image: ''
welcome: Welcome to my corner of the web.

# URL
url: http://example.com
root: /

# Directory
content_dir: content
public_dir: public

# Writing
render_drafts: false
new_post_collection: blog
date_format: MMMM DD, YYYY
highlight:
  theme: base16-ocean.dark
  line_number: false

# Home page
home:
  recent_posts: 5

# Sections listed in the navigation, keyed by directory under content_dir
sections:
  blog:
    title: Blog
    description: ''
"#;

const HOME_PAGE: &str = r#"---
title: Welcome
---

This is the home page. Edit `content/index.md` to change this text.
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("content/blog"))?;

    write_if_missing(&target_dir.join(CONFIG_FILE), DEFAULT_CONFIG)?;
    write_if_missing(&target_dir.join("content/index.md"), HOME_PAGE)?;

    let now = chrono::Local::now();
    let sample_post = format!(
        r#"---
title: Hello World
date: {}
tags:
  - welcome
---

Welcome to your new blog! This is your very first post.

## Quick Start

### Create a new post

```bash
$ inkwell new "My New Post"
```

### Run server

```bash
$ inkwell server
```

### Generate static files

```bash
$ inkwell generate
```
"#,
        now.format("%Y-%m-%d %H:%M:%S")
    );
    write_if_missing(&target_dir.join("content/blog/hello-world.md"), &sample_post)?;

    Ok(())
}

/// Existing files are left alone so `init` never destroys content
fn write_if_missing(path: &Path, contents: &str) -> Result<()> {
    if path.exists() {
        tracing::warn!("Skipping existing file: {:?}", path);
        return Ok(());
    }
    fs::write(path, contents)?;
    tracing::debug!("Created: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentResolver, Resolution};
    use crate::Blog;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_loadable_site() {
        let dir = TempDir::new().unwrap();
        init_site(dir.path()).unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "My Blog");
        assert_eq!(blog.config.sections.len(), 1);

        let store = blog.load_store();
        assert_eq!(store.len(), 2);
        let resolver = ContentResolver::new(&store);
        match resolver.find_by_slug("blog", "hello-world") {
            Resolution::Found(doc) => assert_eq!(doc.title().as_deref(), Some("Hello World")),
            Resolution::NotFound => panic!("sample post missing"),
        }
    }

    #[test]
    fn test_init_keeps_existing_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "title: Mine\n").unwrap();
        init_site(dir.path()).unwrap();

        let config = fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, "title: Mine\n");
    }
}
