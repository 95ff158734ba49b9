//! Template registry with live reload.
//!
//! This crate discovers template files under a directory, compiles them with
//! minijinja into one immutable [`TemplateSet`], and serves renders against it.
//! A [`TemplateRegistry`] can recompile before every render so edits on disk show
//! up without restarting the host. Renders never see a half-built set: new sets
//! are compiled off to the side and swapped in whole.
//!
//! Template names come from file paths relative to the root with the extension
//! removed, so `templates/foo/bar/index.tmpl` is rendered as `foo/bar/index`.
//!
//! # Examples
//!
//! ```no_run
//! use viewset::{TemplateRegistry, ViewData, ViewEngine};
//!
//! let registry = TemplateRegistry::new("./templates", ".tmpl", true)?;
//!
//! let data = ViewData::new().with("title", "Home");
//! let page = registry.render_to_string("foo/bar/index", &data)?;
//! println!("{page}");
//! # Ok::<(), viewset::TemplateError>(())
//! ```

pub mod config;
pub mod context;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod name;
pub mod registry;
pub mod set;

// Re-export public types for convenience
pub use config::RegistryConfig;
pub use context::ViewData;
pub use discovery::{CompileOptions, EscapeMode};
pub use engine::ViewEngine;
pub use error::{Result, TemplateError};
pub use registry::TemplateRegistry;
pub use set::TemplateSet;
