//! Persistent method body cache for incremental compilation.
//!
//! An incremental build reuses method bodies emitted by the previous run
//! instead of generating them again. Cached bodies are matched through
//! position-derived scope ids rather than names, invalidated per source
//! module through content fingerprints, and have every embedded type, method,
//! field and catch reference rewritten into the current compilation's symbol
//! space. The cache is purely an optimization: every failure degrades to
//! compiling the method normally.

#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod container_index;
pub mod error;
pub mod freshness;
mod gate;
pub mod paths;
pub mod rewriter;
pub mod symbols;

pub use cache::{CacheEntry, CacheState, CacheStatistics, Lookup, MethodBodyCache, MissReason};
pub use config::{load_config, load_config_from_str, CacheConfig};
pub use container_index::{ContainerIndex, IndexedMethod};
pub use error::{CacheError, ConfigError, ResolveError};
pub use freshness::FreshnessOracle;
pub use paths::CachePaths;
pub use rewriter::ReferenceRewriter;
pub use symbols::{SourceMethod, SourceModule, TargetSymbols};
