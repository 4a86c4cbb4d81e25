//! HTTP server rendering pages on demand from the content store

use anyhow::Result;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode, Uri},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::SiteConfig;
use crate::content::ContentLoader;
use crate::generator::PageBuilder;
use crate::helpers::decode_segment;
use crate::Folio;

/// Server state
pub struct AppState {
    config: SiteConfig,
    loader: ContentLoader,
    pages: PageBuilder,
}

impl AppState {
    pub fn new(config: SiteConfig, loader: ContentLoader) -> Result<Self> {
        let pages = PageBuilder::new(&config)?;
        Ok(Self {
            config,
            loader,
            pages,
        })
    }

    /// `Cache-Control` value telling caches to revalidate after the fetch window
    fn cache_control(&self) -> String {
        format!(
            "public, s-maxage={}, stale-while-revalidate",
            self.loader.revalidate().as_secs()
        )
    }
}

/// Build the router for the given state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/blog", get(blog_handler))
        .route("/blog/:id", get(post_handler))
        .route("/projects", get(projects_handler))
        .route("/sitemap.xml", get(sitemap_handler))
        .fallback(fallback_handler)
        .layer(middleware::from_fn_with_state(state.clone(), preview_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(folio: &Folio, ip: &str, port: u16) -> Result<()> {
    folio.config.validate()?;

    let state = Arc::new(AppState::new(folio.config.clone(), folio.content_loader()?)?);
    if state.config.preview.path_prefix().is_some()
        && (state.config.preview.username.is_none() || state.config.preview.password.is_none())
    {
        tracing::warn!("Preview credentials are not set; the preview post will always return 401");
    }

    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn home_handler(State(state): State<Arc<AppState>>) -> Response {
    let posts = state.loader.get_sorted_posts_data().await;
    page(&state, StatusCode::OK, state.pages.home(&posts))
}

async fn blog_handler(State(state): State<Arc<AppState>>) -> Response {
    let posts = state.loader.get_sorted_posts_data().await;
    page(&state, StatusCode::OK, state.pages.blog_index(&posts))
}

/// Post detail; the raw route segment is handed to the loader, which decodes it
async fn post_handler(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let not_found = || {
        page(
            &state,
            StatusCode::NOT_FOUND,
            state.pages.not_found("記事が見つかりませんでした"),
        )
    };
    let Some(id) = uri.path().strip_prefix("/blog/") else {
        return not_found();
    };

    // get_post_data logs its own failures
    match state.loader.get_post_data(id).await {
        Ok(post) => page(&state, StatusCode::OK, state.pages.post(&post)),
        Err(_) => not_found(),
    }
}

async fn projects_handler(State(state): State<Arc<AppState>>) -> Response {
    page(&state, StatusCode::OK, state.pages.projects())
}

async fn sitemap_handler(State(state): State<Arc<AppState>>) -> Response {
    let posts = state.loader.get_sorted_posts_data().await;
    (
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        state.pages.sitemap(&posts),
    )
        .into_response()
}

async fn fallback_handler(State(state): State<Arc<AppState>>) -> Response {
    page(
        &state,
        StatusCode::NOT_FOUND,
        state.pages.not_found("ページが見つかりませんでした"),
    )
}

/// Turn a rendered page into a response with caching headers
fn page(state: &AppState, status: StatusCode, rendered: Result<String>) -> Response {
    match rendered {
        Ok(html) => {
            let mut response = (status, Html(html)).into_response();
            if status.is_success() {
                if let Ok(value) = HeaderValue::from_str(&state.cache_control()) {
                    response.headers_mut().insert(header::CACHE_CONTROL, value);
                }
            }
            response
        }
        Err(e) => {
            tracing::error!("Failed to render page: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// Basic auth in front of the preview post
async fn preview_guard(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    if let Some(prefix) = state.config.preview.post_id.as_deref().filter(|id| !id.is_empty()) {
        if is_preview_path(request.uri().path(), prefix) {
            let authorized = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_basic_auth)
                .map(|(user, password)| state.config.preview.accepts(&user, &password))
                .unwrap_or(false);

            if !authorized {
                tracing::info!("Rejected unauthenticated request for {}", request.uri().path());
                return unauthorized();
            }
        }
    }

    next.run(request).await
}

/// Whether `path` addresses the preview post, compared after percent-decoding
fn is_preview_path(path: &str, post_id: &str) -> bool {
    let Some(decoded) = decode_segment(path) else {
        return false;
    };
    let prefix = format!("/blog/{}", post_id);
    match decoded.strip_prefix(&prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Decode a `Basic` authorization header into username and password
fn parse_basic_auth(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"Secure Area\"")],
        "Auth Required.",
    )
        .into_response()
}
