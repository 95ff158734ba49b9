//! Core render trait shared by template sets and registries.

use crate::error::{Result, TemplateError};
use serde::Serialize;
use std::io::Write;

/// Trait for rendering named templates against serializable data.
///
/// Implemented by [`TemplateSet`](crate::TemplateSet), which renders a fixed
/// snapshot, and by [`TemplateRegistry`](crate::TemplateRegistry), which may
/// recompile before every render.
///
/// # Examples
///
/// ```no_run
/// use viewset::{TemplateRegistry, ViewData, ViewEngine};
///
/// fn render_home(engine: &impl ViewEngine) -> Result<String, viewset::TemplateError> {
///     let data = ViewData::new().with("title", "Home");
///     engine.render_to_string("pages/home", &data)
/// }
///
/// let registry = TemplateRegistry::new("./templates", ".tmpl", false)?;
/// println!("{}", render_home(&registry)?);
/// # Ok::<(), viewset::TemplateError>(())
/// ```
pub trait ViewEngine {
    /// Renders the template called `name` into a string.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A reload was requested and the compile pass failed
    /// - No template called `name` exists
    /// - The engine fails while executing the template
    fn render_to_string<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<String>;

    /// Renders the default template into a string.
    ///
    /// # Errors
    ///
    /// Same as [`render_to_string`](Self::render_to_string); a set without any
    /// template has no default and yields [`TemplateError::Lookup`].
    fn render_default_to_string<T: Serialize + ?Sized>(&self, data: &T) -> Result<String>;

    /// Lists the names of every template available for rendering, sorted.
    fn list_templates(&self) -> Vec<String>;

    /// Renders the template called `name` into `writer`.
    ///
    /// Output is produced in full before the first byte is written, so a failed
    /// lookup or render leaves `writer` untouched.
    fn render_named<W: Write + ?Sized, T: Serialize + ?Sized>(
        &self,
        writer: &mut W,
        name: &str,
        data: &T,
    ) -> Result<()> {
        let output = self.render_to_string(name, data)?;
        writer
            .write_all(output.as_bytes())
            .map_err(TemplateError::Write)
    }

    /// Renders the default template into `writer`.
    fn render_default<W: Write + ?Sized, T: Serialize + ?Sized>(
        &self,
        writer: &mut W,
        data: &T,
    ) -> Result<()> {
        let output = self.render_default_to_string(data)?;
        writer
            .write_all(output.as_bytes())
            .map_err(TemplateError::Write)
    }
}
