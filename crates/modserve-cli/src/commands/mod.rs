pub mod resolve;
pub mod rewrite;
pub mod serve;
pub mod version;

use modserve_core::resolver::normalize;
use std::path::{Path, PathBuf};

/// Anchor `path` at `cwd`, folding `.` and `..` but keeping symlinks.
pub(crate) fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    normalize(&cwd.join(path))
}
