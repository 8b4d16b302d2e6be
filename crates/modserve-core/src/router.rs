//! Request path routing onto configured filesystem roots.
//!
//! The first table entry whose prefix matches the request path and whose
//! joined candidate is an existing regular file wins. Directory candidates
//! are skipped so several roots can be probed for the same logical path;
//! there is no `index.html` inference.

use crate::config::{RouteEntry, ServerConfig};
use crate::error::Result;
use std::path::{Component, Path, PathBuf};

/// Maps request paths onto files under the configured roots.
#[derive(Debug, Clone)]
pub struct Router {
    table: Vec<RouteEntry>,
    base_dir: Option<String>,
}

impl Router {
    /// Build a router from configuration. Fails if `paths` is missing.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let table = config.route_table()?.to_vec();
        let base_dir = config.normalized_base_dir().map(|b| format!("/{b}"));

        Ok(Self { table, base_dir })
    }

    /// The route table in match order.
    #[must_use]
    pub fn table(&self) -> &[RouteEntry] {
        &self.table
    }

    /// Resolve a (decoded) request path to a file on disk.
    ///
    /// Returns `None` when the router declines: the path is outside the base
    /// directory, or no entry yields an existing non-directory file.
    #[must_use]
    pub fn route(&self, request_path: &str) -> Option<PathBuf> {
        let path = self.strip_base_dir(request_path)?;

        for entry in &self.table {
            let Some(rest) = path.strip_prefix(entry.prefix.as_str()) else {
                continue;
            };

            let Some(candidate) = join_under_root(&entry.root, rest) else {
                tracing::debug!(path, prefix = %entry.prefix, "rejected path escaping its root");
                continue;
            };

            match candidate.metadata() {
                Ok(meta) if meta.is_dir() => {
                    tracing::trace!(candidate = %candidate.display(), "skipping directory");
                }
                Ok(_) => {
                    tracing::debug!(path, file = %candidate.display(), "routed");
                    return Some(candidate);
                }
                Err(_) => {
                    tracing::trace!(candidate = %candidate.display(), "no such file");
                }
            }
        }

        None
    }

    /// Strip the `/<baseDir>` marker, keeping the slash that follows it.
    fn strip_base_dir<'a>(&self, request_path: &'a str) -> Option<&'a str> {
        let Some(base) = self.base_dir.as_deref() else {
            return Some(request_path);
        };

        request_path
            .strip_prefix(base)
            .filter(|rest| rest.starts_with('/'))
    }
}

/// Join a request remainder onto a root, refusing `..` components.
fn join_under_root(root: &Path, rest: &str) -> Option<PathBuf> {
    let rest = rest.trim_start_matches('/');
    let rel = Path::new(rest);

    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    Some(root.join(rel))
}
