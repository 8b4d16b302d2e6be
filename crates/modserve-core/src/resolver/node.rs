//! Node-style resolution with ES module entry field preference.
//!
//! Supports:
//! - Relative specifiers: `./`, `../`, `.` and `..`
//! - Absolute filesystem specifiers
//! - Bare specifiers (`pkg`, `pkg/sub/path`, `@scope/pkg`) via `node_modules`
//!   lookup through every ancestor of the importing directory
//! - Extension probing and `index.*` fallback
//! - Package entry points from `module` > `jsnext:main` > `main`
//!
//! `exports` maps are deliberately not consulted.
//!
//! Paths stay lexical: `.` and `..` are folded but symlinks are never
//! followed, so a result lives under the same directories the importing
//! file was reached through.

use super::package_json::{entry_field, read_package_json};
use serde::Serialize;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Default extensions for probing, appended to the candidate path.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".mjs", ".json"];

/// Entry fields in order of preference.
pub const DEFAULT_MAIN_FIELDS: &[&str] = &["module", "jsnext:main", "main"];

/// Maximum number of tried paths to record.
const MAX_TRIED_PATHS: usize = 20;

/// Resolver configuration.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Extensions to probe (in order).
    pub extensions: &'static [&'static str],
    /// `package.json` fields naming the entry point (in order).
    pub main_fields: &'static [&'static str],
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS,
            main_fields: DEFAULT_MAIN_FIELDS,
        }
    }
}

/// Context for resolution.
#[derive(Debug, Clone)]
pub struct ResolveContext<'a> {
    /// Directory containing the importing file.
    pub parent: PathBuf,
    /// Resolver configuration.
    pub config: &'a ResolverConfig,
}

impl<'a> ResolveContext<'a> {
    /// Context for specifiers found in `file`.
    #[must_use]
    pub fn for_file(file: &Path, config: &'a ResolverConfig) -> Self {
        Self {
            parent: normalize(file.parent().unwrap_or(Path::new("/"))),
            config,
        }
    }
}

/// Resolution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStatus {
    Resolved,
    Unresolved,
}

/// Reason codes for unresolved specifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolveReasonCode {
    SpecifierInvalid,
    NotFound,
    IsDirectory,
    NodeModulesNotFound,
    PackageJsonInvalid,
    PackageMainNotFound,
}

impl fmt::Display for ResolveReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SpecifierInvalid => "SPECIFIER_INVALID",
            Self::NotFound => "NOT_FOUND",
            Self::IsDirectory => "IS_DIRECTORY",
            Self::NodeModulesNotFound => "NODE_MODULES_NOT_FOUND",
            Self::PackageJsonInvalid => "PACKAGE_JSON_INVALID",
            Self::PackageMainNotFound => "PACKAGE_MAIN_NOT_FOUND",
        };
        write!(f, "{s}")
    }
}

/// Resolution result.
#[derive(Debug, Clone)]
pub struct ResolveResult {
    /// Resolved path, lexically normalized (if successful).
    pub resolved: Option<PathBuf>,
    /// Status.
    pub status: ResolveStatus,
    /// Reason code if unresolved.
    pub reason: Option<ResolveReasonCode>,
    /// Candidate paths tried (capped).
    pub tried: Vec<PathBuf>,
}

impl ResolveResult {
    fn resolved(path: &Path, tried: &[PathBuf]) -> Self {
        Self {
            resolved: Some(normalize(path)),
            status: ResolveStatus::Resolved,
            reason: None,
            tried: tried.to_vec(),
        }
    }

    fn unresolved(reason: ResolveReasonCode, tried: &[PathBuf]) -> Self {
        Self {
            resolved: None,
            status: ResolveStatus::Unresolved,
            reason: Some(reason),
            tried: tried.to_vec(),
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status == ResolveStatus::Resolved
    }
}

/// Resolve a specifier relative to `ctx.parent`.
#[must_use]
pub fn resolve(ctx: &ResolveContext<'_>, spec: &str) -> ResolveResult {
    let mut tried = Vec::new();

    if spec.is_empty() || spec.contains('\0') {
        return ResolveResult::unresolved(ResolveReasonCode::SpecifierInvalid, &tried);
    }

    if is_relative(spec) {
        let base = ctx.parent.join(spec);
        return resolve_path(ctx, &base, &mut tried);
    }

    if Path::new(spec).is_absolute() {
        return resolve_path(ctx, Path::new(spec), &mut tried);
    }

    resolve_bare(ctx, spec, &mut tried)
}

/// `./x`, `../x`, `.` and `..`.
fn is_relative(spec: &str) -> bool {
    spec == "." || spec == ".." || spec.starts_with("./") || spec.starts_with("../")
}

/// Resolve a path as a file, then as a directory.
fn resolve_path(ctx: &ResolveContext<'_>, base: &Path, tried: &mut Vec<PathBuf>) -> ResolveResult {
    if let Some(file) = load_as_file(ctx, base, tried) {
        return ResolveResult::resolved(&file, tried);
    }

    if base.is_dir() {
        return resolve_directory(ctx, base, tried);
    }

    ResolveResult::unresolved(ResolveReasonCode::NotFound, tried)
}

/// Exact file, then each configured extension appended.
fn load_as_file(ctx: &ResolveContext<'_>, base: &Path, tried: &mut Vec<PathBuf>) -> Option<PathBuf> {
    add_tried(tried, base);
    if base.is_file() {
        return Some(base.to_path_buf());
    }

    for ext in ctx.config.extensions {
        let with_ext = with_appended_extension(base, ext);
        add_tried(tried, &with_ext);

        if with_ext.is_file() {
            return Some(with_ext);
        }
    }

    None
}

/// `index.*` inside `dir`.
fn load_index(ctx: &ResolveContext<'_>, dir: &Path, tried: &mut Vec<PathBuf>) -> Option<PathBuf> {
    for ext in ctx.config.extensions {
        let index = dir.join(format!("index{ext}"));
        add_tried(tried, &index);

        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Resolve a directory (package.json entry field > index.*).
fn resolve_directory(
    ctx: &ResolveContext<'_>,
    dir: &Path,
    tried: &mut Vec<PathBuf>,
) -> ResolveResult {
    let pkg_json_path = dir.join("package.json");
    let mut entry_missing = false;

    if pkg_json_path.is_file() {
        add_tried(tried, &pkg_json_path);

        let pkg_json = match read_package_json(&pkg_json_path) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(path = %pkg_json_path.display(), error = %e, "unusable package.json");
                return ResolveResult::unresolved(ResolveReasonCode::PackageJsonInvalid, tried);
            }
        };

        if let Some((field, entry)) = entry_field(&pkg_json, ctx.config.main_fields) {
            tracing::trace!(dir = %dir.display(), field, entry, "package entry field");
            let entry_path = dir.join(entry);

            if let Some(file) = load_as_file(ctx, &entry_path, tried) {
                return ResolveResult::resolved(&file, tried);
            }
            if entry_path.is_dir() {
                if let Some(index) = load_index(ctx, &entry_path, tried) {
                    return ResolveResult::resolved(&index, tried);
                }
            }

            entry_missing = true;
        }
    }

    if let Some(index) = load_index(ctx, dir, tried) {
        return ResolveResult::resolved(&index, tried);
    }

    if entry_missing {
        ResolveResult::unresolved(ResolveReasonCode::PackageMainNotFound, tried)
    } else {
        ResolveResult::unresolved(ResolveReasonCode::IsDirectory, tried)
    }
}

/// Resolve a bare specifier via `node_modules`.
fn resolve_bare(ctx: &ResolveContext<'_>, spec: &str, tried: &mut Vec<PathBuf>) -> ResolveResult {
    // e.g., "lodash/fp" -> "lodash", "@scope/pkg/sub" -> "@scope/pkg"
    let (pkg_name, subpath) = parse_bare_specifier(spec);

    let mut found_node_modules = false;
    let mut specific_error: Option<ResolveReasonCode> = None;

    for dir in ctx.parent.ancestors() {
        // Never look for node_modules/node_modules
        if dir.file_name() == Some(OsStr::new("node_modules")) {
            continue;
        }

        let node_modules = dir.join("node_modules");
        if !node_modules.is_dir() {
            continue;
        }
        found_node_modules = true;

        let pkg_dir = node_modules.join(pkg_name);
        let target = match subpath {
            Some(sub) => pkg_dir.join(sub),
            None => pkg_dir,
        };

        let result = resolve_path(ctx, &target, tried);
        if result.is_resolved() {
            return result;
        }

        // A broken package shadows nothing, but it is the more useful error.
        if let Some(
            reason @ (ResolveReasonCode::PackageJsonInvalid
            | ResolveReasonCode::PackageMainNotFound),
        ) = result.reason
        {
            specific_error.get_or_insert(reason);
        }
    }

    if let Some(error) = specific_error {
        return ResolveResult::unresolved(error, tried);
    }

    if found_node_modules {
        ResolveResult::unresolved(ResolveReasonCode::NotFound, tried)
    } else {
        ResolveResult::unresolved(ResolveReasonCode::NodeModulesNotFound, tried)
    }
}

/// Parse a bare specifier into package name and optional subpath.
#[must_use]
pub fn parse_bare_specifier(spec: &str) -> (&str, Option<&str>) {
    // Scoped package: @scope/pkg or @scope/pkg/subpath
    if spec.starts_with('@') {
        let mut slash_count = 0;
        for (i, c) in spec.char_indices() {
            if c == '/' {
                slash_count += 1;
                if slash_count == 2 {
                    return (&spec[..i], Some(&spec[i + 1..]));
                }
            }
        }
        return (spec, None);
    }

    // Regular package: pkg or pkg/subpath
    if let Some(pos) = spec.find('/') {
        (&spec[..pos], Some(&spec[pos + 1..]))
    } else {
        (spec, None)
    }
}

/// `foo/bar` + `.js` -> `foo/bar.js`, keeping any existing extension.
fn with_appended_extension(base: &Path, ext: &str) -> PathBuf {
    let mut s = base.as_os_str().to_os_string();
    s.push(ext);
    PathBuf::from(s)
}

/// Fold `.` and `..` components without touching the filesystem.
///
/// `..` at the root is dropped; leading `..` of a relative path is kept.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            _ => parts.push(component),
        }
    }

    parts.iter().collect()
}

/// Add a path to tried list (with cap).
fn add_tried(tried: &mut Vec<PathBuf>, path: &Path) {
    if tried.len() < MAX_TRIED_PATHS {
        tried.push(path.to_path_buf());
    }
}
