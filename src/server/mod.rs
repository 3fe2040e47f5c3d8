//! Site server with on-demand article pages and periodic revalidation

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::client::RequestContext;
use crate::content::{ArticleState, ListingLoader};
use crate::generator::Generator;
use crate::helpers::{post_path, uid_from_path};
use crate::{Error, Site};

/// Server state
pub struct ServerState {
    site: Site,
    generator: Generator,
    loader: ListingLoader,
    /// Articles currently being built on demand
    in_flight: Mutex<HashSet<String>>,
    /// Uids the repository did not know, until the next revalidation
    missing: Mutex<HashSet<String>>,
}

impl ServerState {
    pub fn new(site: &Site, generator: Generator) -> Self {
        let loader = ListingLoader::new(generator.client().clone());
        Self {
            site: site.clone(),
            generator,
            loader,
            in_flight: Mutex::new(HashSet::new()),
            missing: Mutex::new(HashSet::new()),
        }
    }

    fn is_missing(&self, uid: &str) -> bool {
        lock(&self.missing).contains(uid)
    }

    fn is_generated(&self, uid: &str) -> bool {
        self.site
            .public_dir
            .join(post_path(uid))
            .join("index.html")
            .exists()
    }
}

/// Start the server
pub async fn start(site: &Site, ip: &str, port: u16) -> Result<()> {
    let generator = Generator::new(site)?;
    let state = Arc::new(ServerState::new(site, generator));

    let period = Duration::from_secs(site.config.repository.revalidate.max(1));
    tokio::spawn(revalidate(state.clone(), period));

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// Routes of the site
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/posts/more", get(load_more_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Rebuild article pages every `period`
async fn revalidate(state: Arc<ServerState>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; the site was just generated
    interval.tick().await;

    loop {
        interval.tick().await;
        tracing::info!("Revalidating posts...");
        lock(&state.missing).clear();
        if let Err(e) = state.generator.generate_articles().await {
            tracing::error!("Revalidation failed: {:#}", e);
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoadMoreParams {
    cursor: String,
}

/// Next listing page as display records
async fn load_more_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<LoadMoreParams>,
) -> Response {
    match state.loader.fetch_page(&params.cursor).await {
        Ok(page) => Json(state.generator.renderer().listing_data(&page)).into_response(),
        Err(e @ (Error::ForeignCursor(_) | Error::Url(_))) => {
            tracing::warn!("Rejected cursor: {}", e);
            (StatusCode::BAD_REQUEST, "Invalid cursor").into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to load next page: {}", e);
            (StatusCode::BAD_GATEWAY, "Failed to load posts").into_response()
        }
    }
}

/// Serves generated files; article pages not built yet get the fallback page
async fn fallback_handler(State(state): State<Arc<ServerState>>, request: Request<Body>) -> Response {
    if let Some(uid) = uid_from_path(&state.site.config, request.uri().path()) {
        let context = request
            .headers()
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(RequestContext::from_cookie_header)
            .filter(|ctx| ctx.preview_ref().is_some());

        if let Some(context) = context {
            return render_preview(&state, &uid, context).await;
        }

        if !state.is_generated(&uid) {
            if state.is_missing(&uid) {
                return render_state(&state, &ArticleState::NotFound);
            }
            schedule_generation(&state, uid);
            return render_state(&state, &ArticleState::Pending);
        }
    }

    let mut service =
        ServeDir::new(&state.site.public_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

/// Render an article from the preview ref without writing it to disk
async fn render_preview(state: &ServerState, uid: &str, context: RequestContext) -> Response {
    let client = state.generator.client().with_context(Some(context));
    match state.generator.fetch_article_with(&client, uid).await {
        Ok(article) => render_state(state, &article),
        Err(e) => {
            tracing::warn!("Preview of {:?} failed: {:#}", uid, e);
            (StatusCode::BAD_GATEWAY, "Preview unavailable").into_response()
        }
    }
}

fn render_state(state: &ServerState, article: &ArticleState) -> Response {
    let status = match article {
        ArticleState::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::OK,
    };

    match state.generator.render_article(article) {
        Ok(html) => (status, [(header::CACHE_CONTROL, "no-store")], Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render article page: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// Build an article page in the background, once per uid at a time
fn schedule_generation(state: &Arc<ServerState>, uid: String) {
    if !lock(&state.in_flight).insert(uid.clone()) {
        return;
    }

    let state = state.clone();
    tokio::spawn(async move {
        match state.generator.generate_article(&uid).await {
            Ok(ArticleState::Ready(_)) => tracing::info!("Generated post on demand: {}", uid),
            Ok(_) => {
                tracing::debug!("Requested post does not exist: {}", uid);
                lock(&state.missing).insert(uid.clone());
            }
            Err(e) => tracing::error!("On-demand generation of {:?} failed: {:#}", uid, e),
        }
        lock(&state.in_flight).remove(&uid);
    });
}

fn lock(set: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    set.lock().unwrap_or_else(PoisonError::into_inner)
}
