//! Generate static files

use anyhow::Result;
use notify::Watcher;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use crate::generator::Generator;
use crate::Blog;

/// Load the content and write the whole site
pub fn run(blog: &Blog) -> Result<()> {
    let start = Instant::now();

    let store = blog.load_store();
    let summary = Generator::new(blog)?.generate(&store)?;

    tracing::info!(
        "Generated {} posts, {} listings and {} assets in {:.2}s",
        summary.posts,
        summary.listings,
        summary.assets,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Watch for file changes and regenerate
pub async fn watch(blog: &Blog) -> Result<()> {
    let (tx, rx) = channel();

    let mut watcher = notify::recommended_watcher(move |res| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    if blog.content_dir.exists() {
        watcher.watch(&blog.content_dir, notify::RecursiveMode::Recursive)?;
    }

    let config_path = blog.config_path();
    if config_path.exists() {
        watcher.watch(&config_path, notify::RecursiveMode::NonRecursive)?;
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    let mut last_rebuild = Instant::now();

    tokio::task::block_in_place(|| loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(_event) => {
                // Debounce: only rebuild if more than 500ms since last rebuild
                if last_rebuild.elapsed() > Duration::from_millis(500) {
                    tracing::info!("File changed, regenerating...");
                    let current = reload(blog);
                    if let Err(e) = run(&current) {
                        tracing::error!("Generation failed: {}", e);
                    }
                    last_rebuild = Instant::now();
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }
    });

    Ok(())
}

/// Re-read the configuration, keeping the previous one if it is invalid
pub(crate) fn reload(blog: &Blog) -> Blog {
    match Blog::new(&blog.base_dir) {
        Ok(fresh) => fresh,
        Err(e) => {
            tracing::warn!("Keeping previous configuration: {}", e);
            blog.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_run_generates_index() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("content/blog")).unwrap();
        fs::write(
            dir.path().join("content/blog/hello-world.md"),
            "---\ntitle: Hello World\n---\nHi",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        run(&blog).unwrap();
        assert!(blog.public_dir.join("blog/hello-world/index.html").exists());
    }

    #[test]
    fn test_reload_keeps_previous_config_when_invalid() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_config.yml"), "title: First\n").unwrap();
        let blog = Blog::new(dir.path()).unwrap();

        fs::write(dir.path().join("_config.yml"), "root: no-slash\n").unwrap();
        assert_eq!(reload(&blog).config.title, "First");

        fs::write(dir.path().join("_config.yml"), "title: Second\n").unwrap();
        assert_eq!(reload(&blog).config.title, "Second");
    }
}
