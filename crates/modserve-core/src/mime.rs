//! Content-type inference from file extensions.

use std::path::Path;

/// Fallback for unknown extensions.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type for a path, by extension (case-insensitive).
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "js" | "mjs" | "cjs" => "application/javascript",
        "json" | "map" => "application/json",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "wasm" => "application/wasm",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "pdf" => "application/pdf",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Whether a content type denotes JavaScript that should be rewritten.
#[must_use]
pub fn is_javascript(content_type: &str) -> bool {
    content_type.starts_with("text/javascript") || content_type.starts_with("application/javascript")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_javascript_extensions() {
        assert_eq!(content_type_for(Path::new("a/lit-element.js")), "application/javascript");
        assert_eq!(content_type_for(Path::new("a.mjs")), "application/javascript");
        assert_eq!(content_type_for(Path::new("A.JS")), "application/javascript");
    }

    #[test]
    fn test_common_types() {
        assert_eq!(content_type_for(Path::new("index.html")), "text/html");
        assert_eq!(content_type_for(Path::new("style.css")), "text/css");
        assert_eq!(content_type_for(Path::new("package.json")), "application/json");
        assert_eq!(content_type_for(Path::new("logo.svg")), "image/svg+xml");
    }

    #[test]
    fn test_unknown_falls_back() {
        assert_eq!(content_type_for(Path::new("LICENSE")), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("a.unknownext")), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_is_javascript() {
        assert!(is_javascript("application/javascript"));
        assert!(is_javascript("text/javascript; charset=utf-8"));
        assert!(!is_javascript("application/json"));
        assert!(!is_javascript("text/html"));
    }
}
