#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::return_self_not_must_use)]

//! Development-time module server core.
//!
//! Maps request paths onto configured filesystem roots and rewrites bare
//! ES module specifiers in served JavaScript into relative paths a browser
//! can load directly. Nothing here installs a tracing subscriber; that is
//! left to the binary.

pub mod config;
pub mod error;
pub mod middleware;
pub mod mime;
pub mod resolver;
pub mod rewrite;
pub mod router;
pub mod version;

pub use config::{RouteEntry, ServerConfig};
pub use error::{Error, Result};
pub use middleware::{Handled, Middleware, ServedFile};
pub use resolver::{
    resolve, ResolveContext, ResolveReasonCode, ResolveResult, ResolveStatus, ResolverConfig,
};
pub use rewrite::{ResolutionFailure, RewriteOutput, Rewriter};
pub use router::Router;
pub use version::VERSION;
