//! `modserve resolve` command implementation.

use miette::{miette, IntoDiagnostic, Result};
use modserve_core::Rewriter;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// JSON output of `modserve resolve --json`.
#[derive(Debug, Serialize)]
struct ResolveOutput<'a> {
    ok: bool,
    specifier: &'a str,
    from: &'a Path,
    rewritten: Option<String>,
    reason: Option<String>,
    tried: Vec<PathBuf>,
}

pub fn run(cwd: &Path, specifier: &str, from: &Path, json: bool) -> Result<()> {
    let from = super::absolute(cwd, from);

    let outcome = Rewriter::new().rewrite_specifier(specifier, &from);

    let output = match &outcome {
        Ok(rewritten) => ResolveOutput {
            ok: true,
            specifier,
            from: &from,
            rewritten: Some(rewritten.clone().unwrap_or_else(|| specifier.to_string())),
            reason: None,
            tried: Vec::new(),
        },
        Err(failure) => ResolveOutput {
            ok: false,
            specifier,
            from: &from,
            rewritten: None,
            reason: Some(failure.reason.to_string()),
            tried: failure.tried.clone(),
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
    } else if let Some(rewritten) = &output.rewritten {
        println!("{rewritten}");
    } else {
        for path in &output.tried {
            eprintln!("  tried {}", path.display());
        }
    }

    match outcome {
        Ok(_) => Ok(()),
        Err(failure) => Err(miette!("{failure}")),
    }
}
