//! Host-agnostic request handling.
//!
//! [`Middleware::handle`] either declines a request, leaving it to the next
//! handler in the host's chain, or produces a [`ServedFile`]. JavaScript is
//! passed through the [`Rewriter`]; everything else is served as read.

use crate::config::ServerConfig;
use crate::error::Result;
use crate::mime;
use crate::rewrite::{ResolutionFailure, Rewriter};
use crate::router::Router;
use std::path::{Path, PathBuf};

/// Outcome of handling one request.
#[derive(Debug)]
pub enum Handled {
    /// Not ours; the host should try its next handler.
    Decline,
    /// Respond with this file.
    Serve(ServedFile),
}

/// A file ready to be written to the response.
#[derive(Debug, Clone)]
pub struct ServedFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Value for the `Content-Type` header.
    pub content_type: &'static str,
    /// Response body (rewritten for JavaScript).
    pub body: Vec<u8>,
    /// Specifiers left unchanged during rewriting.
    pub failures: Vec<ResolutionFailure>,
}

/// Routes requests to files and rewrites JavaScript on the way out.
#[derive(Debug, Clone)]
pub struct Middleware {
    router: Router,
    rewriter: Rewriter,
}

impl Middleware {
    /// Build the middleware. Configuration errors surface here, not on the
    /// first request.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        Ok(Self {
            router: Router::new(config)?,
            rewriter: Rewriter::new(),
        })
    }

    /// Use a custom rewriter.
    #[must_use]
    pub fn with_rewriter(mut self, rewriter: Rewriter) -> Self {
        self.rewriter = rewriter;
        self
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Handle a decoded request path.
    #[must_use]
    pub fn handle(&self, request_path: &str) -> Handled {
        let Some(path) = self.router.route(request_path) else {
            return Handled::Decline;
        };

        match self.serve_file(&path) {
            Ok(file) => Handled::Serve(file),
            Err(e) => {
                tracing::debug!(file = %path.display(), error = %e, "failed to read routed file");
                Handled::Decline
            }
        }
    }

    /// Read a file fresh from disk, rewriting it if it is JavaScript.
    pub fn serve_file(&self, path: &Path) -> Result<ServedFile> {
        let content_type = mime::content_type_for(path);
        let bytes = std::fs::read(path)?;

        if !mime::is_javascript(content_type) {
            return Ok(ServedFile {
                path: path.to_path_buf(),
                content_type,
                body: bytes,
                failures: Vec::new(),
            });
        }

        let source = String::from_utf8_lossy(&bytes);
        let output = self.rewriter.rewrite(path, &source);

        Ok(ServedFile {
            path: path.to_path_buf(),
            content_type,
            body: output.code.into_bytes(),
            failures: output.failures,
        })
    }
}
