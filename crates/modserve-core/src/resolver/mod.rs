//! Module resolver for browser-bound ES modules.
//!
//! Node-style resolution (relative, absolute and bare specifiers with
//! `node_modules` lookup) with one twist: a package's entry point is taken
//! from `module`, then `jsnext:main`, then `main`, so that packages shipping
//! both a CommonJS bundle and an ES module build resolve to the latter.

mod node;
mod package_json;

pub use node::{
    normalize, parse_bare_specifier, resolve, ResolveContext, ResolveReasonCode, ResolveResult,
    ResolveStatus, ResolverConfig, DEFAULT_EXTENSIONS, DEFAULT_MAIN_FIELDS,
};
pub use package_json::{entry_field, read_package_json, PackageJsonError};
