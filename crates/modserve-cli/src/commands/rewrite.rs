//! `modserve rewrite` command implementation.

use miette::{IntoDiagnostic, Result, WrapErr};
use modserve_core::Rewriter;
use std::path::Path;

pub fn run(cwd: &Path, file: &Path, json: bool) -> Result<()> {
    let path = super::absolute(cwd, file);
    let bytes = std::fs::read(&path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let source = String::from_utf8_lossy(&bytes);

    let output = Rewriter::new().rewrite(&path, &source);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).into_diagnostic()?
        );
    } else {
        print!("{}", output.code);
        if !output.is_clean() {
            eprintln!(
                "  {} specifier{} left unchanged",
                output.failures.len(),
                if output.failures.len() == 1 { "" } else { "s" }
            );
        }
    }

    Ok(())
}
