//! Typed error handling for typegraph.
//!
//! Provides structured errors that library consumers can match on,
//! with enough context to tell which node, member or file was involved.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for typegraph operations.
///
/// Hosts that only want to report a failure can wrap it in `anyhow::Error`;
/// library code matches on the variants.
#[derive(Error, Debug)]
pub enum TypegraphError {
    /// I/O error when reading configuration or declaration files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration errors (invalid mode names, bad patterns, empty marker)
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Invalid argument provided
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A referenced type could not be resolved and the policy says fail
    #[error("Unresolved type '{name}' referenced by '{referenced_by}'")]
    UnresolvedType { name: String, referenced_by: String },

    /// Out-of-scope member found while computing reachability
    #[error("Out of scope member '{member}' in '{node}': {message}")]
    OutOfScope {
        node: String,
        member: String,
        message: String,
    },

    /// Annotation validation failed with the `fail` action
    #[error("Validation failed with {errors} error(s): {message}")]
    Validation { errors: usize, message: String },

    /// A generation plugin reported a failure
    #[error("Plugin '{plugin}' failed: {message}")]
    Plugin { plugin: String, message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl TypegraphError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an unresolved type error.
    pub fn unresolved(name: impl Into<String>, referenced_by: impl Into<String>) -> Self {
        Self::UnresolvedType {
            name: name.into(),
            referenced_by: referenced_by.into(),
        }
    }

    /// Create an out-of-scope error for a member of a node.
    pub fn out_of_scope(
        node: impl Into<String>,
        member: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::OutOfScope {
            node: node.into(),
            member: member.into(),
            message: message.into(),
        }
    }

    /// Create a plugin error.
    pub fn plugin(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Plugin {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error (the run may continue).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnresolvedType { .. } | Self::Plugin { .. })
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Convenience type alias for typegraph results.
pub type TypegraphResult<T> = Result<T, TypegraphError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> TypegraphResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> TypegraphResult<T> {
        self.map_err(|e| TypegraphError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error() {
        let err = TypegraphError::io(
            PathBuf::from("/cfg/typegraph.toml"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        assert!(matches!(err, TypegraphError::Io { .. }));
        assert_eq!(err.path(), Some(&PathBuf::from("/cfg/typegraph.toml")));
        assert!(err.to_string().contains("/cfg/typegraph.toml"));
    }

    #[test]
    fn test_out_of_scope_message() {
        let err = TypegraphError::out_of_scope("app.Page[T]", "Items", "unresolved type parameter T");
        let text = err.to_string();
        assert!(text.contains("app.Page[T]"));
        assert!(text.contains("Items"));
        assert_eq!(err.path(), None);
    }

    #[test]
    fn test_is_recoverable() {
        assert!(TypegraphError::unresolved("time.Time", "app.User").is_recoverable());
        assert!(TypegraphError::plugin("openapi", "boom").is_recoverable());
        assert!(!TypegraphError::config("typegraph.toml", "bad mode").is_recoverable());
        assert!(!TypegraphError::internal("oops").is_recoverable());
    }

    #[test]
    fn test_io_result_ext() {
        let result: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let mapped = result.with_path("/missing/decls.json");
        assert!(matches!(mapped, Err(TypegraphError::Io { .. })));
    }
}
