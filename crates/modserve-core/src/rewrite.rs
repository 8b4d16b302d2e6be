//! Import rewriting for unbundled browser serving.
//!
//! Scans JavaScript for two statement shapes and rewrites their specifier:
//! - `import <bindings> from '<spec>'` and side-effect `import '<spec>'`
//! - `export <bindings> from '<spec>'`
//!
//! `<bindings>` may contain identifiers, `*`, `,`, `$`, spaces and one or
//! more `{ ... }` groups. Newlines are only allowed inside braces, so a
//! multi-line named import matches but a statement never swallows the line
//! before it. Whitespace around `from` and the quotes is optional, which
//! covers minified output such as `import{a}from"x"`. The statement must
//! start a line and may be followed by whitespace, a `;`
//! and a `//` or single-line `/* */` comment. Anything else on the line
//! after the closing quote, dynamic `import()` and `require()` are left
//! alone.
//!
//! This is a textual pass: string, comment and template literal context is
//! not tracked, so a matching line inside a template literal is rewritten
//! too.
//!
//! Specifiers that parse as absolute URLs, or that start with `/`, are
//! already loadable by the browser and kept. Everything else is resolved
//! and replaced by a `./` or `../` path relative to the importing file's
//! directory, quoted with `'`. Unresolvable specifiers are kept byte for byte
//! and reported.

use crate::resolver::{normalize, resolve, ResolveContext, ResolveReasonCode, ResolverConfig};
use regex_lite::{Captures, Regex};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Statement head, quote, specifier, quote, tail.
const STATEMENT_PATTERN: &str = concat!(
    r#"(?m)^([ \t]*(?:"#,
    r#"import\b(?:[ \t]*(?:[\w$*,]|[ \t]|\{[\w$,\s]*\})+?\s*\bfrom[ \t]*|[ \t]*)"#,
    r#"|export\b[ \t]*(?:[\w$*,]|[ \t]|\{[\w$,\s]*\})+?\s*\bfrom[ \t]*"#,
    r#"))"#,
    r#"(['"])([^'"\r\n]+)(['"])"#,
    r#"([ \t]*;?[ \t]*(?://[^\r\n]*|/\*[^\r\n]*?\*/)?[ \t]*\r?)$"#,
);

fn statement_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(STATEMENT_PATTERN).expect("statement pattern is valid"))
}

/// A specifier left unchanged because it could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionFailure {
    /// Specifier exactly as written.
    pub specifier: String,
    /// File containing the statement.
    pub source: PathBuf,
    /// 1-indexed line the statement starts on.
    pub line: usize,
    /// Why resolution failed.
    pub reason: ResolveReasonCode,
    /// Candidate paths tried (capped).
    pub tried: Vec<PathBuf>,
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot resolve '{}' from {}:{} ({})",
            self.specifier,
            self.source.display(),
            self.line,
            self.reason
        )
    }
}

/// Result of rewriting one file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RewriteOutput {
    /// Rewritten source text.
    pub code: String,
    /// Specifiers that were kept because resolution failed.
    pub failures: Vec<ResolutionFailure>,
}

impl RewriteOutput {
    /// True if every specifier was either resolved or intentionally kept.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Import rewriter for served modules.
#[derive(Debug, Clone, Default)]
pub struct Rewriter {
    config: ResolverConfig,
}

impl Rewriter {
    /// Create a rewriter with the default resolver configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a rewriter with a custom resolver configuration.
    #[must_use]
    pub fn with_config(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Rewrite module specifiers in `code`, which was read from `source_path`.
    ///
    /// Never fails: each unresolvable specifier is logged, kept and listed in
    /// [`RewriteOutput::failures`].
    #[must_use]
    pub fn rewrite(&self, source_path: &Path, code: &str) -> RewriteOutput {
        let mut failures = Vec::new();
        let mut lines = LineCounter::new(code);

        let rewritten = statement_regex().replace_all(code, |caps: &Captures<'_>| {
            let whole = &caps[0];
            let (open, specifier, close) = (&caps[2], &caps[3], &caps[4]);
            if open != close {
                return whole.to_string();
            }

            match self.rewrite_specifier(specifier, source_path) {
                Ok(Some(rewritten)) => format!("{}'{rewritten}'{}", &caps[1], &caps[5]),
                Ok(None) => whole.to_string(),
                Err(mut failure) => {
                    failure.line = caps.get(0).map_or(1, |m| lines.line_at(m.start()));
                    tracing::warn!(
                        specifier = %failure.specifier,
                        source = %failure.source.display(),
                        line = failure.line,
                        reason = %failure.reason,
                        tried = ?failure.tried,
                        "could not resolve module specifier, leaving it unchanged"
                    );
                    failures.push(failure);
                    whole.to_string()
                }
            }
        });

        RewriteOutput {
            code: rewritten.into_owned(),
            failures,
        }
    }

    /// Rewrite a single specifier found in `source_path`.
    ///
    /// `Ok(None)` means the specifier is kept as written (absolute URL or
    /// server-absolute path). The failure's `line` is left at 0.
    pub fn rewrite_specifier(
        &self,
        specifier: &str,
        source_path: &Path,
    ) -> Result<Option<String>, ResolutionFailure> {
        if is_absolute_url(specifier) || specifier.starts_with('/') {
            return Ok(None);
        }

        let ctx = ResolveContext::for_file(source_path, &self.config);
        let result = resolve(&ctx, specifier);

        let failure = |reason| ResolutionFailure {
            specifier: specifier.to_string(),
            source: source_path.to_path_buf(),
            line: 0,
            reason,
            tried: result.tried.clone(),
        };

        let Some(resolved) = result.resolved.as_deref() else {
            return Err(failure(
                result.reason.unwrap_or(ResolveReasonCode::NotFound),
            ));
        };

        relative_specifier(resolved, &ctx.parent)
            .map(Some)
            .ok_or_else(|| failure(ResolveReasonCode::NotFound))
    }
}

/// Whether `specifier` parses as a URL with a scheme.
#[must_use]
pub fn is_absolute_url(specifier: &str) -> bool {
    url::Url::parse(specifier).is_ok()
}

/// Express `target` relative to `from_dir` as a `./` or `../` path with `/`
/// separators.
///
/// Both paths are compared as written, after folding `.` and `..`. Symlinks
/// are not resolved, since the browser only ever sees the URL layout.
#[must_use]
pub fn relative_specifier(target: &Path, from_dir: &Path) -> Option<String> {
    let rel = pathdiff::diff_paths(normalize(target), normalize(from_dir))?;

    let joined = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    if joined.is_empty() {
        return None;
    }

    if joined.starts_with("../") {
        Some(joined)
    } else {
        Some(format!("./{joined}"))
    }
}

/// Maps byte offsets to line numbers for offsets visited in increasing order.
struct LineCounter<'a> {
    code: &'a str,
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(code: &'a str) -> Self {
        Self {
            code,
            offset: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, offset: usize) -> usize {
        if offset >= self.offset {
            self.line += self.code[self.offset..offset].matches('\n').count();
            self.offset = offset;
        }
        self.line
    }
}
