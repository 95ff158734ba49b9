//! Registry configuration.
//!
//! Configuration is usually loaded from a TOML file such as `viewset.toml`, with
//! defaults applied for every missing field:
//!
//! ```toml
//! root = "templates"
//! extension = ".tmpl"
//! reload = false
//! strict_undefined = true
//! default_template = "index"
//! auto_escape = "extension" # or "html", "none"
//! ```

use crate::{
    discovery::{CompileOptions, EscapeMode},
    error::{Result, TemplateError},
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings for building a [`TemplateRegistry`](crate::TemplateRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Directory walked for template files.
    pub root: PathBuf,

    /// File extension selecting templates, including the leading dot.
    pub extension: String,

    /// Whether every render recompiles the set first.
    pub reload: bool,

    /// Whether undefined variables are render errors.
    pub strict_undefined: bool,

    /// Template used for default renders instead of the first discovered file.
    pub default_template: Option<String>,

    /// Auto-escaping mode for every template.
    pub auto_escape: EscapeMode,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("templates"),
            extension: ".tmpl".to_string(),
            reload: false,
            strict_undefined: true,
            default_template: None,
            auto_escape: EscapeMode::Extension,
        }
    }
}

impl RegistryConfig {
    /// Creates a configuration for `root` with default settings.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Loads configuration from a TOML file.
    ///
    /// Relative `root` paths are kept as written; they are resolved against the
    /// process working directory when the registry walks them.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::ConfigNotFound`] if the file cannot be read and
    /// [`TemplateError::ConfigParse`] if it is not a valid config.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|source| TemplateError::ConfigNotFound {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&content).map_err(|message| TemplateError::ConfigParse {
            path: path.to_path_buf(),
            message,
        })
    }

    fn from_toml_str(content: &str) -> std::result::Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Sets the template file extension.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Sets the reload-before-render flag.
    #[must_use]
    pub fn with_reload(mut self, reload: bool) -> Self {
        self.reload = reload;
        self
    }

    /// Sets whether undefined variables fail the render.
    #[must_use]
    pub fn with_strict_undefined(mut self, strict: bool) -> Self {
        self.strict_undefined = strict;
        self
    }

    /// Sets the template used for default renders.
    #[must_use]
    pub fn with_default_template(mut self, name: impl Into<String>) -> Self {
        self.default_template = Some(name.into());
        self
    }

    /// Sets the auto-escaping mode.
    #[must_use]
    pub fn with_auto_escape(mut self, mode: EscapeMode) -> Self {
        self.auto_escape = mode;
        self
    }

    /// Engine options derived from this configuration.
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            strict_undefined: self.strict_undefined,
            default_template: self.default_template.clone(),
            auto_escape: self.auto_escape,
        }
    }
}
