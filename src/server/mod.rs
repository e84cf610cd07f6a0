//! Development server with live reload
//!
//! Pages are rendered on request from an in-memory content store. File
//! changes load a fresh store in the background and swap it in whole.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::{header, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, RwLock};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::ContentStore;
use crate::render::{Navigator, SitePages, Ticket};
use crate::Blog;

/// Live reload script injected into HTML pages
const LIVE_RELOAD_SCRIPT: &str = r#"
<script>
(function() {
    var ws = new WebSocket('ws://' + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        console.log('Live reload disconnected. Attempting to reconnect...');
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// Everything needed to answer requests for one version of the site
pub struct LiveSite {
    blog: Blog,
    pages: SitePages,
    store: ContentStore,
}

impl LiveSite {
    /// Read configuration and content from `base_dir`
    pub fn load(base_dir: &std::path::Path) -> Result<Self> {
        let blog = Blog::new(base_dir)?;
        let store = blog.load_store();
        Self::from_store(blog, store)
    }

    pub fn from_store(blog: Blog, store: ContentStore) -> Result<Self> {
        let pages = SitePages::new(&blog.config)?;
        Ok(Self { blog, pages, store })
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }
}

/// Server state
pub struct ServerState {
    base_dir: PathBuf,
    site: RwLock<Arc<LiveSite>>,
    /// Each reload is a navigation; only the newest one may be applied
    reloads: Navigator<u64, usize>,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

impl ServerState {
    pub fn new(base_dir: PathBuf, site: LiveSite, live_reload: bool) -> Self {
        let (reload_tx, _) = broadcast::channel::<()>(16);
        Self {
            base_dir,
            site: RwLock::new(Arc::new(site)),
            reloads: Navigator::new(),
            reload_tx,
            live_reload,
        }
    }

    /// The site currently being served
    pub async fn current(&self) -> Arc<LiveSite> {
        self.site.read().await.clone()
    }

    /// Begin a reload for change batch `batch`
    pub fn begin_reload(&self, batch: u64) -> Ticket<u64> {
        self.reloads.navigate(batch)
    }

    /// Swap in `site` if `ticket` is still the newest reload. A failed
    /// load leaves the served site unchanged.
    pub async fn apply(&self, ticket: &Ticket<u64>, site: Option<LiveSite>) -> bool {
        // Held across the check so an older reload can never land after a newer one
        let mut current = self.site.write().await;
        let count = site.as_ref().map(|s| s.store.len());
        if !self.reloads.complete(ticket, count) {
            return false;
        }

        if let Some(site) = site {
            *current = Arc::new(site);
            let _ = self.reload_tx.send(());
        }
        true
    }
}

/// Build the application router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/__livereload", get(livereload_handler))
        .route("/css/style.css", get(stylesheet_handler))
        .route("/:collection", get(listing_handler))
        .route("/:collection/", get(listing_handler))
        .route("/:collection/:slug", get(post_handler))
        .route("/:collection/:slug/", get(post_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the development server
pub async fn start(blog: &Blog, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    let site = LiveSite::from_store(blog.clone(), blog.load_store())?;
    let state = Arc::new(ServerState::new(blog.base_dir.clone(), site, watch));
    let app = router(Arc::clone(&state));

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    if watch {
        println!("Live reload enabled. Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if watch {
        let content_dir = blog.content_dir.clone();
        let config_path = blog.config_path();
        tokio::spawn(async move {
            if let Err(e) = watch_and_reload(content_dir, config_path, state).await {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Watch for file changes and reload the served site
async fn watch_and_reload(
    content_dir: PathBuf,
    config_path: PathBuf,
    state: Arc<ServerState>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<DebounceEventResult>();

    // Create debouncer to avoid multiple rapid reloads
    let mut debouncer = new_debouncer(Duration::from_millis(500), move |res| {
        let _ = tx.send(res);
    })?;

    if content_dir.exists() {
        debouncer
            .watcher()
            .watch(&content_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", content_dir);
    }

    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    let mut batch = 0u64;
    while let Some(result) = rx.recv().await {
        let events = match result {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Watch error: {:?}", e);
                continue;
            }
        };

        // Filter out irrelevant events (like .git, .DS_Store, etc.)
        let relevant: Vec<_> = events
            .iter()
            .filter(|e| {
                let path_str = e.path.to_string_lossy();
                !path_str.contains(".git")
                    && !path_str.contains(".DS_Store")
                    && !path_str.ends_with('~')
            })
            .collect();

        if relevant.is_empty() {
            continue;
        }

        for event in &relevant {
            tracing::info!("File changed: {}", event.path.display());
        }

        batch += 1;
        let ticket = state.begin_reload(batch);
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let base_dir = state.base_dir.clone();
            let site = match tokio::task::spawn_blocking(move || LiveSite::load(&base_dir)).await
            {
                Ok(Ok(site)) => Some(site),
                Ok(Err(e)) => {
                    tracing::error!("Reload failed: {}", e);
                    None
                }
                Err(e) => {
                    tracing::error!("Reload task failed: {}", e);
                    None
                }
            };

            let loaded = site.is_some();
            if state.apply(&ticket, site).await && loaded {
                tracing::info!("Reloaded site (change batch {})", ticket.target());
            }
        });
    }

    Ok(())
}

async fn home_handler(State(state): State<Arc<ServerState>>) -> Response {
    let site = state.current().await;
    html_page(&state, StatusCode::OK, site.pages.home(&site.store))
}

async fn listing_handler(
    State(state): State<Arc<ServerState>>,
    Path(collection): Path<String>,
    request: Request<Body>,
) -> Response {
    let site = state.current().await;
    match site.pages.listing(&site.store, &collection) {
        Ok(Some(html)) => html_page(&state, StatusCode::OK, Ok(html)),
        Ok(None) => serve_asset(&state, &site, request).await,
        Err(e) => html_page(&state, StatusCode::INTERNAL_SERVER_ERROR, Err(e)),
    }
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path((collection, slug)): Path<(String, String)>,
    request: Request<Body>,
) -> Response {
    let site = state.current().await;
    match site.pages.post(&site.store, &collection, &slug) {
        Ok(page) if page.found => html_page(&state, StatusCode::OK, Ok(page.html)),
        // Files such as `/blog/cover.png` share the shape of a post URL
        Ok(page) if slug.contains('.') => {
            let response = serve_asset(&state, &site, request).await;
            if response.status() == StatusCode::NOT_FOUND {
                html_page(&state, StatusCode::NOT_FOUND, Ok(page.html))
            } else {
                response
            }
        }
        Ok(page) => html_page(&state, StatusCode::NOT_FOUND, Ok(page.html)),
        Err(e) => html_page(&state, StatusCode::INTERNAL_SERVER_ERROR, Err(e)),
    }
}

async fn stylesheet_handler(State(state): State<Arc<ServerState>>) -> Response {
    let site = state.current().await;
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        site.pages.stylesheet(),
    )
        .into_response()
}

/// Content assets, then the not-found page
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let site = state.current().await;
    serve_asset(&state, &site, request).await
}

async fn serve_asset(state: &ServerState, site: &LiveSite, request: Request<Body>) -> Response {
    // Markdown sources are rendered, never served raw
    let path = request.uri().path();
    if path.ends_with(".md") || path.ends_with(".markdown") {
        return html_page(state, StatusCode::NOT_FOUND, site.pages.not_found());
    }

    let mut service = ServeDir::new(&site.blog.content_dir);
    match service.try_call(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => response.into_response(),
        Ok(_) => html_page(state, StatusCode::NOT_FOUND, site.pages.not_found()),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

/// Wrap rendered HTML in a response, injecting live reload when enabled
fn html_page(state: &ServerState, status: StatusCode, html: Result<String>) -> Response {
    match html {
        Ok(html) if state.live_reload => (status, Html(inject_live_reload(&html))).into_response(),
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Render failed: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Render failed").into_response()
        }
    }
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

/// Handle WebSocket connection for live reload
async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replacen("</body>", LIVE_RELOAD_SCRIPT, 1)
    } else {
        format!("{}{}", html, LIVE_RELOAD_SCRIPT)
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn write(dir: &std::path::Path, rel: &str, body: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn fixture(live_reload: bool) -> (TempDir, Arc<ServerState>) {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "content/blog/hello-world.md",
            "---\ntitle: Hello World\n---\nFirst post.",
        );
        write(
            dir.path(),
            "content/blog/second-post.md",
            "---\ntitle: Second Post\n---\nSecond.",
        );
        write(dir.path(), "content/blog/cover.png", "png bytes");
        write(
            dir.path(),
            "content/notes/secret.md",
            "---\ntitle: Secret\n---\nUnlisted notes.",
        );

        let blog = Blog::with_config(dir.path().to_path_buf(), SiteConfig::default());
        let site = LiveSite::from_store(blog.clone(), blog.load_store()).unwrap();
        let state = Arc::new(ServerState::new(blog.base_dir.clone(), site, live_reload));
        (dir, state)
    }

    async fn get(state: &Arc<ServerState>, uri: &str) -> (StatusCode, String) {
        let response = router(Arc::clone(state))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_listing_and_post_routes() {
        let (_dir, state) = fixture(false);

        let (status, body) = get(&state, "/blog").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"<a href="/blog/hello-world">Hello World</a>"#));
        assert!(body.contains(r#"<a href="/blog/second-post">Second Post</a>"#));

        let (status, body) = get(&state, "/blog/hello-world").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h2>Hello World</h2>"));
        assert!(!body.contains("__livereload"));

        let (status, _) = get(&state, "/blog/hello-world/").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_post_is_empty_404() {
        let (_dir, state) = fixture(false);
        let (status, body) = get(&state, "/blog/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.contains("<article"));

        let (status, _) = get(&state, "/recipes").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get(&state, "/a/b/c").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unconfigured_section_serves_no_posts() {
        let (_dir, state) = fixture(false);

        let (status, body) = get(&state, "/notes/secret").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.contains("<article"));
        assert!(!body.contains("Unlisted notes."));

        let (status, body) = get(&state, "/notes/secret.md").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.contains("Unlisted notes."));
    }

    #[tokio::test]
    async fn test_slugs_are_case_sensitive() {
        let (_dir, state) = fixture(false);
        let (status, body) = get(&state, "/blog/Hello-World").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.contains("<h2>Hello World</h2>"));
    }

    #[tokio::test]
    async fn test_assets_and_stylesheet() {
        let (_dir, state) = fixture(false);

        let (status, body) = get(&state, "/blog/cover.png").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "png bytes");

        let (status, body) = get(&state, "/css/style.css").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(":root"));
    }

    #[tokio::test]
    async fn test_live_reload_injected() {
        let (_dir, state) = fixture(true);
        let (_, body) = get(&state, "/").await;
        assert!(body.contains("__livereload"));
        assert!(body.trim_end().ends_with("</html>"));
    }

    #[tokio::test]
    async fn test_superseded_reload_is_discarded() {
        let (dir, state) = fixture(false);
        let mut reloaded = state.reload_tx.subscribe();

        let older = state.begin_reload(1);
        let newer = state.begin_reload(2);

        write(
            dir.path(),
            "content/blog/third-post.md",
            "---\ntitle: Third Post\n---\nThree.",
        );
        let fresh = LiveSite::load(dir.path()).unwrap();
        assert!(state.apply(&newer, Some(fresh)).await);
        assert_eq!(state.current().await.store().len(), 4);
        assert!(reloaded.try_recv().is_ok());

        let stale = LiveSite::from_store(
            Blog::with_config(dir.path().to_path_buf(), SiteConfig::default()),
            ContentStore::default(),
        )
        .unwrap();
        assert!(!state.apply(&older, Some(stale)).await);
        assert_eq!(state.current().await.store().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_site() {
        let (_dir, state) = fixture(false);
        let ticket = state.begin_reload(1);
        assert!(state.apply(&ticket, None).await);
        assert_eq!(state.current().await.store().len(), 3);
    }

    #[test]
    fn test_inject_live_reload() {
        let html = inject_live_reload("<html><body><p>x</p></body></html>");
        assert!(html.contains("new WebSocket"));
        assert!(html.ends_with("</body>\n</html>"));

        let bare = inject_live_reload("<p>x</p>");
        assert!(bare.starts_with("<p>x</p>"));
        assert!(bare.contains("__livereload"));
    }
}
