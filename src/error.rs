//! Error types for stack construction.
//!
//! Every variant is fatal: a declaration set is either fully valid and handed
//! off, or the run fails before anything is emitted.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = StackError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum StackError {
    /// A filesystem call failed while enumerating or reading.
    #[error("{path}: {source}")]
    Fs {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("asset root is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Symlink found while the symlink policy is `error`.
    #[error("symlink not allowed in asset tree: {path}")]
    SymlinkRejected { path: PathBuf },

    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path { path: PathBuf },

    #[error("{path} is not a file below asset root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("failed to parse config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("invalid config field '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    #[error("{message}")]
    Token { message: String },

    #[error("duplicate declaration '{name}'")]
    DuplicateDeclaration { name: String },

    #[error("{from}.{field}: reference to undeclared resource '{target}'")]
    UnresolvedReference {
        from: String,
        field: String,
        target: String,
    },

    #[error("{name}.parent: '{parent}' is not declared")]
    UnknownParent { name: String, parent: String },

    #[error("{name}.provider: '{provider}' is not a declared provider")]
    UnknownProvider { name: String, provider: String },

    #[error("cycle detected in declaration graph: {0:?}")]
    Cycle(Vec<String>),

    #[error("declarations '{first}' and '{second}' both map to terraform name '{ident}'")]
    NameCollision {
        first: String,
        second: String,
        ident: String,
    },

    #[error("template render failed: {0}")]
    Render(#[from] minijinja::Error),

    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl StackError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Fs {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// True for the filesystem branch of the taxonomy.
    pub fn is_filesystem(&self) -> bool {
        matches!(
            self,
            Self::Fs { .. }
                | Self::NotADirectory { .. }
                | Self::SymlinkRejected { .. }
                | Self::NonUtf8Path { .. }
                | Self::OutsideRoot { .. }
        )
    }

    /// True for graph-construction errors (a programming error in the builder).
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateDeclaration { .. }
                | Self::UnresolvedReference { .. }
                | Self::UnknownParent { .. }
                | Self::UnknownProvider { .. }
                | Self::Cycle(_)
                | Self::NameCollision { .. }
        )
    }
}
