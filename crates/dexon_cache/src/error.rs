//! Error types for the method body cache.
//!
//! None of these ever fail a build. Initialization errors disable the cache
//! for the session, resolution errors turn a single lookup into a miss.

use dexon_dex::DexError;
use dexon_map::MapError;

/// Errors that prevent the cache from initializing.
///
/// Any of these permanently disables the cache for the session and is logged
/// as a warning.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cached container could not be read.
    #[error("unable to read cached container: {0}")]
    Container(#[from] DexError),

    /// The map file could not be read.
    #[error("unable to read map file: {0}")]
    Map(#[from] MapError),

    /// The initialization thread panicked or could not be started.
    #[error("cache initialization aborted: {reason}")]
    Aborted {
        /// Description of the failure.
        reason: String,
    },
}

/// A reference inside an otherwise matched body that cannot be rewritten.
///
/// Recoverable: the method is compiled normally instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No type with the given scope id exists in the current compilation.
    #[error("unable to resolve type {descriptor} (scope {scope})")]
    UnresolvedType {
        /// Descriptor in the cached container.
        descriptor: String,
        /// The type scope id that was looked up.
        scope: String,
    },

    /// No method with the given scope id exists in the current compilation.
    #[error("unable to resolve method {method} by its scope id ({scope})")]
    UnresolvedMethod {
        /// The method reference in the cached container.
        method: String,
        /// The scope id that was looked up.
        scope: String,
    },

    /// The referenced method has no stable identity.
    #[error("unable to resolve method without scope: {method}")]
    MissingScope {
        /// The method reference in the cached container.
        method: String,
    },

    /// Fields of the generated container class have no map entries.
    #[error("unable to resolve fields in the generated class: {field}")]
    GeneratedField {
        /// The field reference in the cached container.
        field: String,
    },

    /// The delegate adapter type could not be materialized.
    #[error("unable to materialize delegate adapter {descriptor} (scope {scope})")]
    UnresolvedDelegate {
        /// Descriptor of the adapter in the cached container.
        descriptor: String,
        /// The delegate closure scope id.
        scope: String,
    },

    /// A delegate adapter entry carries a scope id that cannot be decoded.
    #[error("malformed delegate scope id on {descriptor}")]
    MalformedDelegateKey {
        /// Descriptor of the adapter in the cached container.
        descriptor: String,
    },
}

/// Errors that can occur when loading or validating cache configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}
