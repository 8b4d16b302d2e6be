//! `package.json` reading and entry field selection.

use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Why a `package.json` could not be used.
#[derive(Debug, Error)]
pub enum PackageJsonError {
    /// The file could not be read.
    #[error("failed to read package.json: {0}")]
    Read(#[source] std::io::Error),

    /// The file is not valid JSON, or not a JSON object.
    #[error("invalid package.json: {0}")]
    Invalid(String),
}

/// Read and parse a `package.json`.
///
/// The top level must be an object; anything else is reported as invalid.
pub fn read_package_json(path: &Path) -> Result<Value, PackageJsonError> {
    let content = std::fs::read_to_string(path).map_err(PackageJsonError::Read)?;
    let value: Value =
        serde_json::from_str(&content).map_err(|e| PackageJsonError::Invalid(e.to_string()))?;

    if !value.is_object() {
        return Err(PackageJsonError::Invalid(
            "top-level value is not an object".to_string(),
        ));
    }

    Ok(value)
}

/// Pick the entry point from the first of `fields` holding a non-empty string.
///
/// Returns the field name alongside its value.
#[must_use]
pub fn entry_field<'a, 'f>(pkg_json: &'a Value, fields: &[&'f str]) -> Option<(&'f str, &'a str)> {
    fields.iter().find_map(|&field| {
        pkg_json
            .get(field)
            .and_then(Value::as_str)
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| (field, entry))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::DEFAULT_MAIN_FIELDS;
    use serde_json::json;

    #[test]
    fn test_module_preferred_over_main() {
        let pkg = json!({
            "main": "dist/index.cjs",
            "jsnext:main": "dist/index.next.js",
            "module": "dist/index.mjs"
        });
        assert_eq!(
            entry_field(&pkg, DEFAULT_MAIN_FIELDS),
            Some(("module", "dist/index.mjs"))
        );
    }

    #[test]
    fn test_jsnext_main_before_main() {
        let pkg = json!({ "main": "index.cjs", "jsnext:main": "index.next.js" });
        assert_eq!(
            entry_field(&pkg, DEFAULT_MAIN_FIELDS),
            Some(("jsnext:main", "index.next.js"))
        );
    }

    #[test]
    fn test_main_fallback() {
        let pkg = json!({ "main": "lib/main.js" });
        assert_eq!(
            entry_field(&pkg, DEFAULT_MAIN_FIELDS),
            Some(("main", "lib/main.js"))
        );
    }

    #[test]
    fn test_non_string_and_empty_fields_skipped() {
        let pkg = json!({ "module": false, "jsnext:main": "", "main": "ok.js" });
        assert_eq!(
            entry_field(&pkg, DEFAULT_MAIN_FIELDS),
            Some(("main", "ok.js"))
        );
        assert_eq!(entry_field(&json!({ "name": "x" }), DEFAULT_MAIN_FIELDS), None);
    }

    #[test]
    fn test_read_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");

        std::fs::write(&path, "{ \"main\": ").unwrap();
        assert!(matches!(
            read_package_json(&path),
            Err(PackageJsonError::Invalid(_))
        ));

        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            read_package_json(&path),
            Err(PackageJsonError::Invalid(_))
        ));

        std::fs::write(&path, r#"{"module": "a.js"}"#).unwrap();
        assert!(read_package_json(&path).is_ok());
    }

    #[test]
    fn test_error_messages() {
        let dir = tempfile::tempdir().unwrap();

        let err = read_package_json(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, PackageJsonError::Read(_)));
        assert!(err.to_string().starts_with("failed to read package.json"));

        let err = PackageJsonError::Invalid("top-level value is not an object".into());
        assert_eq!(
            err.to_string(),
            "invalid package.json: top-level value is not an object"
        );
    }
}
