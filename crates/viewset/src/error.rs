//! Error types for the template registry crate.

use std::path::PathBuf;

/// Errors that can occur while compiling or rendering a template set.
#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    /// The template root could not be walked.
    #[error("failed to walk template directory {path}")]
    Traversal {
        /// Path of the root that failed.
        path: PathBuf,
        /// Underlying walk error.
        #[source]
        source: walkdir::Error,
    },

    /// A matched template file could not be read.
    #[error("failed to read template {path}")]
    Read {
        /// Path to the template that failed to load.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A template file failed to compile.
    #[error("syntax error in template {path}")]
    Parse {
        /// Path to the offending template file.
        path: PathBuf,
        /// Engine error describing the syntax problem.
        #[source]
        source: minijinja::Error,
    },

    /// Two files under the root derived the same template name.
    #[error("template name {name:?} derived from both {first} and {second}")]
    DuplicateName {
        /// The colliding derived name.
        name: String,
        /// File that claimed the name first.
        first: PathBuf,
        /// File that tried to claim it again.
        second: PathBuf,
    },

    /// No template with this name exists in the installed set.
    #[error("template not found: {0}")]
    Lookup(String),

    /// The engine failed while executing a template.
    #[error("failed to render template {name}")]
    Render {
        /// Name of the template being rendered.
        name: String,
        /// Engine error.
        #[source]
        source: minijinja::Error,
    },

    /// Writing rendered output failed.
    #[error("failed to write rendered output")]
    Write(#[source] std::io::Error),

    /// The extension selector can never match a file.
    #[error("invalid template extension {0:?} (expected a dot-prefixed suffix like \".tmpl\")")]
    InvalidExtension(String),

    /// Configuration file does not exist or is not readable.
    #[error("config file not found: {path}")]
    ConfigNotFound {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for [`RegistryConfig`](crate::RegistryConfig).
    #[error("config parse error in {path}: {message}")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Render data could not be loaded or assembled.
    #[error("invalid render data: {0}")]
    InvalidData(String),
}

/// Result type alias for template registry operations.
pub type Result<T> = std::result::Result<T, TemplateError>;
