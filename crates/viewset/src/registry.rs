//! Live template registry with optional reload-before-render.

use crate::{
    config::RegistryConfig,
    discovery::{self, CompileOptions},
    engine::ViewEngine,
    error::Result,
    name::validate_extension,
    set::TemplateSet,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// State shared between renders, guarded by one lock.
struct RegistryState {
    reload: bool,
    current: Arc<TemplateSet>,
}

/// Owner of the compiled templates under one root directory.
///
/// Construction compiles every template once. Afterwards the installed
/// [`TemplateSet`] is swapped wholesale by [`recompile`](Self::recompile), or
/// before every render while reload is enabled. Compiling happens outside the
/// lock; the lock only covers reading the reload flag and swapping the set, so
/// renders against the old set keep going while a new one is being built.
///
/// A failed compile installs nothing and the previous set stays in service.
///
/// # Examples
///
/// ```no_run
/// use viewset::{TemplateRegistry, ViewData, ViewEngine};
///
/// let registry = TemplateRegistry::new("./templates", ".tmpl", cfg!(debug_assertions))?;
///
/// let data = ViewData::new().with("title", "Home");
/// let mut out = Vec::new();
/// registry.render_named(&mut out, "pages/home", &data)?;
/// # Ok::<(), viewset::TemplateError>(())
/// ```
pub struct TemplateRegistry {
    root: PathBuf,
    extension: String,
    options: CompileOptions,
    next_generation: AtomicU64,
    state: Mutex<RegistryState>,
}

impl TemplateRegistry {
    /// Creates a registry and compiles every template under `root`.
    ///
    /// # Arguments
    ///
    /// * `root` - Directory walked for templates
    /// * `extension` - Dot-prefixed file extension selecting templates (e.g. `".tmpl"`)
    /// * `reload` - Whether every render recompiles first
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is invalid or the first compile pass fails.
    pub fn new(
        root: impl Into<PathBuf>,
        extension: impl Into<String>,
        reload: bool,
    ) -> Result<Self> {
        Self::with_options(root, extension, reload, CompileOptions::default())
    }

    /// Creates a registry from a loaded [`RegistryConfig`].
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        Self::with_options(
            config.root.clone(),
            config.extension.clone(),
            config.reload,
            config.compile_options(),
        )
    }

    /// Creates a registry with explicit engine options.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_options(
        root: impl Into<PathBuf>,
        extension: impl Into<String>,
        reload: bool,
        options: CompileOptions,
    ) -> Result<Self> {
        let root = root.into();
        let extension = extension.into();
        validate_extension(&extension)?;

        let first = discovery::compile(&root, &extension, &options, 1)?;
        tracing::debug!(
            root = %root.display(),
            templates = first.len(),
            reload,
            "template registry ready"
        );

        Ok(Self {
            root,
            extension,
            options,
            next_generation: AtomicU64::new(2),
            state: Mutex::new(RegistryState {
                reload,
                current: Arc::new(first),
            }),
        })
    }

    /// Directory walked for templates.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extension selecting template files.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether renders recompile before rendering.
    pub fn reload_enabled(&self) -> bool {
        self.lock().reload
    }

    /// Enables or disables recompiling before every render.
    ///
    /// Renders already in progress keep the setting they started with.
    pub fn set_reload(&self, enabled: bool) {
        self.lock().reload = enabled;
        tracing::info!(root = %self.root.display(), enabled, "template reload toggled");
    }

    /// Returns the currently installed template set.
    pub fn snapshot(&self) -> Arc<TemplateSet> {
        Arc::clone(&self.lock().current)
    }

    /// Names of every template in the installed set, sorted.
    pub fn template_names(&self) -> Vec<String> {
        self.snapshot().list_templates()
    }

    /// Recompiles every template and installs the result.
    ///
    /// Works whether or not reload is enabled.
    ///
    /// # Errors
    ///
    /// Returns the compile error; the previously installed set is kept.
    pub fn recompile(&self) -> Result<()> {
        self.compile_and_install().map(|_| ())
    }

    /// Runs one compile pass and installs it unless a newer pass already has.
    ///
    /// Returns the set this pass built, which the caller may render against even
    /// when a newer set was installed in the meantime.
    fn compile_and_install(&self) -> Result<Arc<TemplateSet>> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let set = Arc::new(discovery::compile(
            &self.root,
            &self.extension,
            &self.options,
            generation,
        )?);
        self.install(Arc::clone(&set));
        Ok(set)
    }

    /// Swaps in `set` if it is newer than the installed one.
    fn install(&self, set: Arc<TemplateSet>) -> bool {
        let mut state = self.lock();
        if set.generation() > state.current.generation() {
            state.current = set;
            true
        } else {
            tracing::debug!(
                generation = set.generation(),
                installed = state.current.generation(),
                "newer template set already installed"
            );
            false
        }
    }

    /// Returns the set a render should use, recompiling first if reload is on.
    fn acquire(&self) -> Result<Arc<TemplateSet>> {
        let (reload, current) = {
            let state = self.lock();
            (state.reload, Arc::clone(&state.current))
        };
        if reload {
            self.compile_and_install()
        } else {
            Ok(current)
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // Every critical section is a plain field read or assignment, so a
        // poisoned lock still guards consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ViewEngine for TemplateRegistry {
    fn render_to_string<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<String> {
        self.acquire()?.render_to_string(name, data)
    }

    fn render_default_to_string<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        self.acquire()?.render_default_to_string(data)
    }

    fn list_templates(&self) -> Vec<String> {
        self.template_names()
    }
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("TemplateRegistry")
            .field("root", &self.root)
            .field("extension", &self.extension)
            .field("reload", &state.reload)
            .field("generation", &state.current.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_template_dir() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let templates_path = temp_dir.path().join("templates");
        fs::create_dir(&templates_path).expect("failed to create templates dir");

        fs::write(templates_path.join("test.tmpl"), "Hello {{ name }}!")
            .expect("failed to write test template");

        (temp_dir, templates_path)
    }

    #[test]
    fn test_new_with_valid_directory() {
        let (_temp, templates_path) = create_test_template_dir();
        let registry = TemplateRegistry::new(templates_path.clone(), ".tmpl", false)
            .expect("failed to create registry");

        assert_eq!(registry.root(), templates_path);
        assert_eq!(registry.extension(), ".tmpl");
        assert!(!registry.reload_enabled());
        assert_eq!(registry.template_names(), vec!["test"]);
        assert_eq!(registry.snapshot().generation(), 1);
    }

    #[test]
    fn test_new_with_nonexistent_directory() {
        let result = TemplateRegistry::new("/nonexistent/path", ".tmpl", false);
        match result {
            Err(TemplateError::Traversal { .. }) => {}
            other => panic!("expected Traversal error, got {other:?}"),
        }
    }

    #[test]
    fn test_new_with_invalid_extension() {
        let (_temp, templates_path) = create_test_template_dir();
        match TemplateRegistry::new(templates_path, "tmpl", false) {
            Err(TemplateError::InvalidExtension(ext)) => assert_eq!(ext, "tmpl"),
            other => panic!("expected InvalidExtension error, got {other:?}"),
        }
    }

    #[test]
    fn test_render_named() {
        let (_temp, templates_path) = create_test_template_dir();
        let registry = TemplateRegistry::new(templates_path, ".tmpl", false)
            .expect("failed to create registry");

        let mut out = Vec::new();
        registry
            .render_named(&mut out, "test", &json!({ "name": "World" }))
            .expect("render failed");
        assert_eq!(String::from_utf8(out).unwrap(), "Hello World!");
    }

    #[test]
    fn test_render_default() {
        let (_temp, templates_path) = create_test_template_dir();
        let registry = TemplateRegistry::new(templates_path, ".tmpl", false)
            .expect("failed to create registry");

        let mut out = Vec::new();
        registry
            .render_default(&mut out, &json!({ "name": "you" }))
            .expect("render failed");
        assert_eq!(String::from_utf8(out).unwrap(), "Hello you!");
    }

    #[test]
    fn test_recompile_advances_generation() {
        let (_temp, templates_path) = create_test_template_dir();
        let registry = TemplateRegistry::new(templates_path.clone(), ".tmpl", false)
            .expect("failed to create registry");

        fs::write(templates_path.join("other.tmpl"), "other").unwrap();
        registry.recompile().expect("recompile failed");

        assert_eq!(registry.snapshot().generation(), 2);
        assert_eq!(registry.template_names(), vec!["other", "test"]);
    }

    #[test]
    fn test_stale_pass_does_not_replace_newer_set() {
        let (_temp, templates_path) = create_test_template_dir();
        let registry = TemplateRegistry::new(templates_path.clone(), ".tmpl", false)
            .expect("failed to create registry");

        registry.recompile().expect("recompile failed");

        // A pass that started before the installed one but finished after it.
        let stale = discovery::compile(&templates_path, ".tmpl", &CompileOptions::default(), 1)
            .expect("compile failed");
        assert!(!registry.install(Arc::new(stale)));
        assert_eq!(registry.snapshot().generation(), 2);

        let newer = discovery::compile(&templates_path, ".tmpl", &CompileOptions::default(), 7)
            .expect("compile failed");
        assert!(registry.install(Arc::new(newer)));
        assert_eq!(registry.snapshot().generation(), 7);
    }

    #[test]
    fn test_set_reload_toggles() {
        let (_temp, templates_path) = create_test_template_dir();
        let registry = TemplateRegistry::new(templates_path, ".tmpl", false)
            .expect("failed to create registry");

        registry.set_reload(true);
        assert!(registry.reload_enabled());

        registry
            .render_to_string("test", &json!({ "name": "x" }))
            .expect("render failed");
        assert_eq!(registry.snapshot().generation(), 2);

        registry.set_reload(false);
        registry
            .render_to_string("test", &json!({ "name": "x" }))
            .expect("render failed");
        assert_eq!(registry.snapshot().generation(), 2);
    }

    #[test]
    fn test_from_config() {
        let (_temp, templates_path) = create_test_template_dir();
        let config = RegistryConfig::new(templates_path)
            .with_reload(true)
            .with_default_template("test");
        let registry = TemplateRegistry::from_config(&config).expect("failed to create registry");

        assert!(registry.reload_enabled());
        assert_eq!(registry.snapshot().default_name(), Some("test"));
    }
}
