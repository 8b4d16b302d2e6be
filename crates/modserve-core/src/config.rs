//! Server configuration.
//!
//! The configuration is a JSON object with a required `paths` table mapping
//! URL prefixes to filesystem roots, and an optional `baseDir` that scopes
//! which requests are handled at all:
//!
//! ```json
//! {
//!   "baseDir": "app",
//!   "paths": {
//!     "/node_modules": "./node_modules",
//!     "/": "./src"
//!   }
//! }
//! ```
//!
//! Table order follows the order of keys in the file, since the first
//! matching prefix wins.

use crate::error::{Error, Result};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given.
pub const CONFIG_FILE: &str = "modserve.json";

/// One `prefix -> root` mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// URL path prefix, matched textually.
    pub prefix: String,
    /// Filesystem root the remainder of the path is joined to.
    pub root: PathBuf,
}

impl RouteEntry {
    #[must_use]
    pub fn new(prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            root: root.into(),
        }
    }
}

/// Middleware configuration, passed once at construction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Ordered route table. `None` means the key was absent, which is fatal.
    #[serde(default, deserialize_with = "deserialize_route_table")]
    pub paths: Option<Vec<RouteEntry>>,

    /// Requests not under `/<baseDir>/` are declined.
    #[serde(default)]
    pub base_dir: Option<String>,
}

impl ServerConfig {
    /// Create an empty config (no `paths` yet).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route table entry.
    #[must_use]
    pub fn with_path(mut self, prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        self.paths
            .get_or_insert_with(Vec::new)
            .push(RouteEntry::new(prefix, root));
        self
    }

    /// Set the base directory marker.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<String>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Parse a config from JSON text.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Load a config file. Relative roots are anchored at the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_json_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        let base = path.parent().unwrap_or(Path::new("."));
        Ok(config.resolve_roots(base))
    }

    /// Join every relative root onto `base`.
    #[must_use]
    pub fn resolve_roots(mut self, base: &Path) -> Self {
        if let Some(paths) = self.paths.as_mut() {
            for entry in paths {
                if entry.root.is_relative() {
                    entry.root = base.join(&entry.root);
                }
            }
        }
        self
    }

    /// Return the route table, failing if it was never configured.
    pub fn route_table(&self) -> Result<&[RouteEntry]> {
        let paths = self
            .paths
            .as_deref()
            .ok_or_else(|| Error::config("missing required `paths` mapping"))?;

        if let Some(entry) = paths.iter().find(|e| e.prefix.is_empty()) {
            return Err(Error::config(format!(
                "empty path prefix for root {}",
                entry.root.display()
            )));
        }

        Ok(paths)
    }

    /// The base directory without surrounding slashes, if one is set.
    #[must_use]
    pub fn normalized_base_dir(&self) -> Option<&str> {
        self.base_dir
            .as_deref()
            .map(|b| b.trim_matches('/'))
            .filter(|b| !b.is_empty())
    }
}

/// Find the default config file in `root`.
#[must_use]
pub fn find_config_file(root: &Path) -> Option<PathBuf> {
    let path = root.join(CONFIG_FILE);
    path.is_file().then_some(path)
}

/// Deserialize a JSON object into an ordered list of route entries.
fn deserialize_route_table<'de, D>(deserializer: D) -> Result<Option<Vec<RouteEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    struct RouteTableVisitor;

    impl<'de> Visitor<'de> for RouteTableVisitor {
        type Value = Option<Vec<RouteEntry>>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object mapping URL prefixes to filesystem roots")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((prefix, root)) = map.next_entry::<String, PathBuf>()? {
                entries.push(RouteEntry { prefix, root });
            }
            Ok(Some(entries))
        }
    }

    deserializer.deserialize_any(RouteTableVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_keep_file_order() {
        let config = ServerConfig::from_json_str(
            r#"{"paths": {"/z": "/srv/z", "/a": "/srv/a", "/m": "/srv/m"}}"#,
        )
        .unwrap();

        let prefixes: Vec<_> = config
            .route_table()
            .unwrap()
            .iter()
            .map(|e| e.prefix.as_str())
            .collect();
        assert_eq!(prefixes, ["/z", "/a", "/m"]);
    }

    #[test]
    fn test_missing_paths_is_config_error() {
        let config = ServerConfig::from_json_str(r#"{"baseDir": "app"}"#).unwrap();
        assert!(config.paths.is_none());

        let err = config.route_table().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("paths"));
    }

    #[test]
    fn test_null_paths_is_missing() {
        let config = ServerConfig::from_json_str(r#"{"paths": null}"#).unwrap();
        assert!(config.route_table().is_err());
    }

    #[test]
    fn test_empty_paths_table_is_allowed() {
        let config = ServerConfig::from_json_str(r#"{"paths": {}}"#).unwrap();
        assert!(config.route_table().unwrap().is_empty());
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let config = ServerConfig::new().with_path("", "/srv");
        assert!(config.route_table().is_err());
    }

    #[test]
    fn test_paths_must_be_object() {
        assert!(ServerConfig::from_json_str(r#"{"paths": ["/a"]}"#).is_err());
    }

    #[test]
    fn test_base_dir_normalized() {
        let config = ServerConfig::new().with_base_dir("/app/");
        assert_eq!(config.normalized_base_dir(), Some("app"));

        let config = ServerConfig::new().with_base_dir("/");
        assert_eq!(config.normalized_base_dir(), None);

        assert_eq!(ServerConfig::new().normalized_base_dir(), None);
    }

    #[test]
    fn test_load_resolves_relative_roots() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{"paths": {"/node_modules": "./node_modules", "/abs": "/srv/abs"}}"#,
        )
        .unwrap();

        assert_eq!(find_config_file(dir.path()), Some(path.clone()));

        let config = ServerConfig::load(&path).unwrap();
        let table = config.route_table().unwrap();
        assert_eq!(table[0].root, dir.path().join("./node_modules"));
        assert_eq!(table[1].root, PathBuf::from("/srv/abs"));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        let err = ServerConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_load_reports_missing_file() {
        let dir = tempdir().unwrap();
        let err = ServerConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
        assert!(find_config_file(dir.path()).is_none());
    }
}
