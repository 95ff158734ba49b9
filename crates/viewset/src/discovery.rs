//! Template discovery and compilation.
//!
//! A compile pass walks the root directory, keeps every file whose extension
//! matches the selector, derives its name and adds it to a fresh minijinja
//! environment. The pass is all-or-nothing: the first read, parse or naming
//! failure aborts it and no [`TemplateSet`] is produced.

use crate::{
    error::{Result, TemplateError},
    name::{derive_name, extension_of},
    set::TemplateSet,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// How values printed with `{{ ... }}` are escaped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscapeMode {
    /// Picked from the template extension: `.html`, `.htm` and `.xml` escape
    /// HTML, everything else is left alone.
    #[default]
    Extension,
    /// HTML-escape every template regardless of extension.
    Html,
    /// Never escape.
    #[serde(rename = "none")]
    Disabled,
}

/// Engine settings applied to every compiled set.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Fail renders that touch undefined variables instead of printing nothing.
    pub strict_undefined: bool,

    /// Template used by default renders; the first discovered file when unset.
    pub default_template: Option<String>,

    /// Auto-escaping applied to every template in the set.
    pub auto_escape: EscapeMode,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            strict_undefined: true,
            default_template: None,
            auto_escape: EscapeMode::Extension,
        }
    }
}

/// A template file selected for compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    /// Derived template name (e.g. `"foo/bar/index"`).
    pub name: String,
    /// Path the file was found at.
    pub path: PathBuf,
}

/// Drops `.` components so walked paths look like the ones a user would write.
fn clean(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
enum Candidate<'a> {
    Skip,
    /// Has the selected extension but the path is not valid UTF-8.
    NonUtf8,
    Template(&'a str),
}

fn classify<'a>(path: &'a Path, ext: &str) -> Candidate<'a> {
    match path.to_str() {
        Some(path_str) if extension_of(path_str) == ext => Candidate::Template(path_str),
        Some(_) => Candidate::Skip,
        // Lossy decoding keeps the extension intact unless the bad bytes are in it.
        None if extension_of(&path.to_string_lossy()) == ext => Candidate::NonUtf8,
        None => Candidate::Skip,
    }
}

/// Lists every template under `root` whose extension equals `ext`, in walk order.
///
/// Entries below the root that cannot be read are logged and skipped. A failure
/// on the root itself is returned as [`TemplateError::Traversal`]. The root is
/// cleaned the same way as walked paths before names are derived, so
/// `views/./pages` and `views//pages` behave like `views/pages`.
pub fn discover(root: &Path, ext: &str) -> Result<Vec<TemplateSource>> {
    let root_str = clean(root).to_string_lossy().into_owned();
    let mut sources = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(TemplateError::Traversal {
                    path: root.to_path_buf(),
                    source,
                });
            }
            Err(err) => {
                tracing::warn!(root = %root.display(), "error while walking template dir: {err}");
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let path = clean(entry.path());
        let path_str = match classify(&path, ext) {
            Candidate::Template(path_str) => path_str,
            Candidate::NonUtf8 => {
                tracing::warn!(path = %path.display(), "skipping template with non UTF-8 path");
                continue;
            }
            Candidate::Skip => continue,
        };

        match derive_name(&root_str, path_str, ext) {
            Some(name) => sources.push(TemplateSource { name, path }),
            None => tracing::warn!(path = %path.display(), "cannot derive template name"),
        }
    }

    Ok(sources)
}

/// Discovers and compiles every template under `root` into a new set.
///
/// # Errors
///
/// Returns an error if the root cannot be walked, a matched file cannot be read,
/// any file fails to parse, two files derive the same name, or the configured
/// default template does not exist.
#[tracing::instrument(skip(root, options), fields(root = %root.display()))]
pub fn compile(
    root: &Path,
    ext: &str,
    options: &CompileOptions,
    generation: u64,
) -> Result<TemplateSet> {
    let sources = discover(root, ext)?;
    build_set(&sources, ext, options, generation)
}

/// Reads and parses already discovered sources into a new set.
///
/// The order of `sources` decides the default template when none is configured.
pub fn build_set(
    sources: &[TemplateSource],
    ext: &str,
    options: &CompileOptions,
    generation: u64,
) -> Result<TemplateSet> {
    let mut env = minijinja::Environment::new();
    env.set_keep_trailing_newline(true);
    env.set_undefined_behavior(if options.strict_undefined {
        minijinja::UndefinedBehavior::Strict
    } else {
        minijinja::UndefinedBehavior::Lenient
    });
    match options.auto_escape {
        EscapeMode::Extension => {
            let escape_ext = ext.to_string();
            env.set_auto_escape_callback(move |_| {
                minijinja::default_auto_escape_callback(&escape_ext)
            });
        }
        EscapeMode::Html => env.set_auto_escape_callback(|_| minijinja::AutoEscape::Html),
        EscapeMode::Disabled => env.set_auto_escape_callback(|_| minijinja::AutoEscape::None),
    }

    let mut by_name: BTreeMap<String, PathBuf> = BTreeMap::new();
    for TemplateSource { name, path } in sources {
        if let Some(first) = by_name.get(name) {
            return Err(TemplateError::DuplicateName {
                name: name.clone(),
                first: first.clone(),
                second: path.clone(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.clone(),
            source,
        })?;
        env.add_template_owned(name.clone(), content)
            .map_err(|source| TemplateError::Parse {
                path: path.clone(),
                source,
            })?;
        by_name.insert(name.clone(), path.clone());
    }

    let default_name = match &options.default_template {
        Some(name) if by_name.contains_key(name) => Some(name.clone()),
        Some(name) => return Err(TemplateError::Lookup(name.clone())),
        None => sources.first().map(|s| s.name.clone()),
    };

    tracing::debug!(
        templates = by_name.len(),
        generation,
        "compiled template set"
    );

    Ok(TemplateSet::new(env, by_name, default_name, generation))
}
