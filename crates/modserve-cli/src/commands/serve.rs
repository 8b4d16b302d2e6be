//! `modserve serve` command implementation.
//!
//! Hosts the core [`Middleware`] in an axum server:
//!
//! ```text
//! GET /node_modules/lit-element/lit-element.js
//!   → route (prefix table, first existing regular file wins)
//!   → read fresh from disk
//!   → rewrite bare specifiers (JavaScript only)
//!   → respond with Content-Type from the extension
//! ```
//!
//! Requests the middleware declines fall through to a plain 404 fallback.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use miette::{IntoDiagnostic, Result};
use modserve_core::config::find_config_file;
use modserve_core::{Handled, Middleware, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Serve action.
#[derive(Debug, Clone)]
pub struct ServeAction {
    /// Working directory; relative roots and config paths are anchored here.
    pub cwd: PathBuf,
    /// Explicit config file path (overrides auto-discovery).
    pub config: Option<PathBuf>,
    /// Route table from `--path`, replacing the config file's table if non-empty.
    pub paths: Vec<(String, PathBuf)>,
    /// Base directory override.
    pub base_dir: Option<String>,
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

/// Parse a `PREFIX=ROOT` route argument.
pub fn parse_route(s: &str) -> Result<(String, PathBuf), String> {
    let (prefix, root) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PREFIX=ROOT, got `{s}`"))?;

    if prefix.is_empty() || root.is_empty() {
        return Err(format!("expected PREFIX=ROOT, got `{s}`"));
    }

    Ok((prefix.to_string(), PathBuf::from(root)))
}

/// Assemble the server configuration from the config file and flags.
pub fn build_config(action: &ServeAction) -> Result<ServerConfig> {
    let cwd = &action.cwd;

    let config_path = match &action.config {
        Some(p) => Some(super::absolute(cwd, p)),
        None => find_config_file(cwd),
    };

    let mut config = match config_path {
        Some(path) => {
            let config = ServerConfig::load(&path).into_diagnostic()?;
            tracing::info!(path = %path.display(), "loaded config");
            config
        }
        None => ServerConfig::new(),
    };

    if !action.paths.is_empty() {
        config.paths = None;
        for (prefix, root) in &action.paths {
            config = config.with_path(prefix.clone(), super::absolute(cwd, root));
        }
    }

    if let Some(base_dir) = &action.base_dir {
        config = config.with_base_dir(base_dir.clone());
    }

    Ok(config)
}

/// Build the axum application around a middleware instance.
pub fn app(modules: Arc<Middleware>) -> Router {
    Router::new()
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(modules, serve_modules))
        .layer(TraceLayer::new_for_http())
}

/// Answer from the module middleware, or hand the request on.
async fn serve_modules(
    State(modules): State<Arc<Middleware>>,
    request: Request,
    next: Next,
) -> Response {
    let Ok(path) = urlencoding::decode(request.uri().path()).map(|p| p.into_owned()) else {
        return next.run(request).await;
    };

    // Filesystem probing and reading are blocking.
    let handled = tokio::task::spawn_blocking(move || modules.handle(&path)).await;

    match handled {
        Ok(Handled::Serve(file)) => (
            [
                (header::CONTENT_TYPE, file.content_type),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            file.body,
        )
            .into_response(),
        Ok(Handled::Decline) => next.run(request).await,
        Err(e) => {
            tracing::error!(error = %e, "module handler task failed");
            next.run(request).await
        }
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// Run the server.
pub async fn run(action: ServeAction) -> Result<()> {
    let config = build_config(&action)?;
    let modules = Middleware::new(&config).into_diagnostic()?;

    for entry in modules.router().table() {
        println!("  {} -> {}", entry.prefix, entry.root.display());
    }

    let listener = tokio::net::TcpListener::bind((action.host.as_str(), action.port))
        .await
        .into_diagnostic()?;
    let addr = listener.local_addr().into_diagnostic()?;

    println!("  modserve listening on http://{addr}");
    tracing::info!(address = %addr, "server started");

    axum::serve(listener, app(Arc::new(modules)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
