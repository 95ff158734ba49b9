//! Template name derivation.
//!
//! A template's name is computed from its path by plain string surgery, not by
//! path arithmetic: the root is trimmed of dots and separators, its first literal
//! occurrence is cut out of the file path, leading separators are dropped and the
//! extension is removed by length.
//!
//! ```
//! use viewset::name::derive_name;
//!
//! let name = derive_name("templates/", "templates/foo/bar/index.tmpl", ".tmpl");
//! assert_eq!(name.as_deref(), Some("foo/bar/index"));
//! ```

use crate::error::{Result, TemplateError};

fn is_separator(c: char) -> bool {
    c == '/' || c == std::path::MAIN_SEPARATOR
}

/// Returns the extension of `path`: the suffix of its final component starting
/// at the last `.`, or `""` when the final component has no dot.
pub fn extension_of(path: &str) -> &str {
    let start = path.rfind(is_separator).map_or(0, |i| i + 1);
    match path[start..].rfind('.') {
        Some(dot) => &path[start + dot..],
        None => "",
    }
}

/// Checks that `ext` is a selector that can match files.
///
/// Extensions are compared literally against [`extension_of`], so they must
/// include the leading dot.
pub fn validate_extension(ext: &str) -> Result<()> {
    if ext.len() < 2 || !ext.starts_with('.') || ext[1..].contains(['.', '/']) {
        return Err(TemplateError::InvalidExtension(ext.to_string()));
    }
    Ok(())
}

/// Derives the template name for `path` under `root`.
///
/// Returns `None` if the remaining string is too short to hold the extension,
/// which only happens for paths that did not match the selector.
///
/// Both strings are matched as written. [`discover`](crate::discovery::discover)
/// cleans `.` components and doubled separators out of the root and each path
/// before calling this.
pub fn derive_name(root: &str, path: &str, ext: &str) -> Option<String> {
    let trimmed_root = root.trim_matches(|c| c == '.' || is_separator(c));
    let relative = if trimmed_root.is_empty() {
        path.to_string()
    } else {
        path.replacen(trimmed_root, "", 1)
    };
    let relative = relative.trim_start_matches(is_separator);

    let end = relative.len().checked_sub(ext.len())?;
    let name = relative.get(..end)?;
    if std::path::MAIN_SEPARATOR == '/' {
        Some(name.to_string())
    } else {
        Some(name.replace(std::path::MAIN_SEPARATOR, "/"))
    }
}
