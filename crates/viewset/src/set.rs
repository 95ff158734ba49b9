//! Immutable compiled template collections.

use crate::{
    engine::ViewEngine,
    error::{Result, TemplateError},
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One compiled snapshot of every template under a root.
///
/// A `TemplateSet` is produced by a single compile pass and never changes
/// afterwards. The registry hands it out as `Arc<TemplateSet>`, so any number of
/// renders can share it while a newer pass builds its replacement.
pub struct TemplateSet {
    env: minijinja::Environment<'static>,
    sources: BTreeMap<String, PathBuf>,
    default_name: Option<String>,
    generation: u64,
}

impl TemplateSet {
    pub(crate) fn new(
        env: minijinja::Environment<'static>,
        sources: BTreeMap<String, PathBuf>,
        default_name: Option<String>,
        generation: u64,
    ) -> Self {
        Self {
            env,
            sources,
            default_name,
            generation,
        }
    }

    /// Number of templates in the set.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the set holds no templates at all.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Whether a template with `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Template names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// File a template was compiled from.
    pub fn source_path(&self, name: &str) -> Option<&Path> {
        self.sources.get(name).map(PathBuf::as_path)
    }

    /// Template rendered when no name is given.
    ///
    /// This is the first file in walk order unless a default was configured.
    /// Empty sets have no default.
    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// Sequence number of the compile pass that built this set.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl ViewEngine for TemplateSet {
    fn render_to_string<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<String> {
        if !self.contains(name) {
            return Err(TemplateError::Lookup(name.to_string()));
        }
        let tmpl = self
            .env
            .get_template(name)
            .map_err(|_| TemplateError::Lookup(name.to_string()))?;
        tmpl.render(data).map_err(|source| TemplateError::Render {
            name: name.to_string(),
            source,
        })
    }

    fn render_default_to_string<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        let name = self
            .default_name()
            .ok_or_else(|| TemplateError::Lookup("<default>".to_string()))?;
        self.render_to_string(name, data)
    }

    fn list_templates(&self) -> Vec<String> {
        self.names().map(str::to_string).collect()
    }
}

impl std::fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateSet")
            .field("templates", &self.sources.keys().collect::<Vec<_>>())
            .field("default_name", &self.default_name)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build_set(templates: &[(&str, &str)]) -> TemplateSet {
        let mut env = minijinja::Environment::new();
        env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
        let mut sources = BTreeMap::new();
        for (name, source) in templates {
            env.add_template_owned(name.to_string(), source.to_string())
                .expect("failed to add template");
            sources.insert(name.to_string(), PathBuf::from(format!("{name}.tmpl")));
        }
        let default_name = templates.first().map(|(name, _)| name.to_string());
        TemplateSet::new(env, sources, default_name, 1)
    }

    #[test]
    fn test_render_named() {
        let set = build_set(&[("greeting", "Hello {{ name }}!")]);
        let out = set.render_to_string("greeting", &json!({ "name": "World" }));
        assert_eq!(out.unwrap(), "Hello World!");
    }

    #[test]
    fn test_render_default_uses_first_template() {
        let set = build_set(&[("b", "first"), ("a", "second")]);
        assert_eq!(set.default_name(), Some("b"));
        assert_eq!(set.render_default_to_string(&json!({})).unwrap(), "first");
    }

    #[test]
    fn test_render_default_on_empty_set() {
        let set = build_set(&[]);
        assert!(set.is_empty());
        match set.render_default_to_string(&json!({})) {
            Err(TemplateError::Lookup(_)) => {}
            other => panic!("expected Lookup error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_name_writes_nothing() {
        let set = build_set(&[("page", "content")]);
        let mut out = Vec::new();
        let result = set.render_named(&mut out, "missing", &json!({}));

        match result {
            Err(TemplateError::Lookup(name)) => assert_eq!(name, "missing"),
            other => panic!("expected Lookup error, got {other:?}"),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_missing_field_is_render_error() {
        let set = build_set(&[("page", "{{ user.name }}")]);
        let mut out = Vec::new();
        let result = set.render_named(&mut out, "page", &json!({}));

        match result {
            Err(TemplateError::Render { name, .. }) => assert_eq!(name, "page"),
            other => panic!("expected Render error, got {other:?}"),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_include_by_derived_name() {
        let set = build_set(&[
            ("partials/header", "<h1>{{ title }}</h1>"),
            ("index", "{% include \"partials/header\" %}body"),
        ]);
        let out = set.render_to_string("index", &json!({ "title": "Home" }));
        assert_eq!(out.unwrap(), "<h1>Home</h1>body");
    }

    #[test]
    fn test_names_are_sorted() {
        let set = build_set(&[("zeta", ""), ("alpha", ""), ("mid/x", "")]);
        assert_eq!(set.list_templates(), vec!["alpha", "mid/x", "zeta"]);
        assert_eq!(set.source_path("alpha"), Some(Path::new("alpha.tmpl")));
        assert_eq!(set.generation(), 1);
    }
}
