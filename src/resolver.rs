//! Component dependency resolution.
//!
//! Two strategies, selected by `optimize_dependencies`:
//!
//! - [`DependencyResolver::resolve`] — transitive closure of the requested
//!   component over tag references, emitted dependency-before-dependent.
//! - [`join_vue_files`] — the whole-bundle fallback: every component file,
//!   in FileSet order.
//!
//! Both prefix each emitted file with a `<!-- name -->` marker comment.

use dashmap::DashMap;
use regex::Regex;

use crate::files::FileSet;
use crate::PageError;

/// One component file's text, loaded at resolver construction.
#[derive(Debug, Clone)]
struct ComponentSource {
    file_name: String,
    content: String,
}

/// Resolves the minimal ordered set of component files needed to render a
/// component. Built once per [`FileSet`]; stateless afterwards except for
/// the per-id memo cache, so a cached resolver can serve concurrent
/// requests without re-reading anything.
#[derive(Debug)]
pub struct DependencyResolver {
    sources: Vec<ComponentSource>,
    /// Declared component id → index into `sources`, in discovery order.
    declarations: Vec<(String, usize)>,
    /// Dependency keys of component files with no recognizable
    /// registration — unreachable through `resolve`, so worth surfacing.
    unregistered: Vec<String>,
    /// Memoized bundles keyed by requested component id.
    cache: DashMap<String, String>,
}

impl DependencyResolver {
    /// Read every component file in `files` once and index its component
    /// registrations (`Vue.component("id", …)` / `app.component("id", …)`).
    pub fn new(files: &FileSet) -> Result<Self, PageError> {
        let registration = Regex::new(r#"(?:Vue|app)\.component\(\s*["']([\w-]+)["']"#).unwrap();
        let mut sources = Vec::new();
        let mut declarations = Vec::new();
        let mut unregistered = Vec::new();
        for file in files.component_files() {
            let content = file.content()?.to_string();
            let idx = sources.len();
            let mut declared_any = false;
            for cap in registration.captures_iter(&content) {
                declarations.push((cap[1].to_string(), idx));
                declared_any = true;
            }
            if !declared_any {
                unregistered.push(file.key().to_string());
            }
            sources.push(ComponentSource {
                file_name: file.file_name(),
                content,
            });
        }
        Ok(Self {
            sources,
            declarations,
            unregistered,
            cache: DashMap::new(),
        })
    }

    /// Component files that register nothing. They can never appear in an
    /// optimized bundle.
    pub fn unregistered_files(&self) -> &[String] {
        &self.unregistered
    }

    /// Component source text for `component_id` and everything it
    /// transitively references, dependencies first. An unknown id yields a
    /// bundle without it; the orchestrator's containment check surfaces
    /// that as [`PageError::ComponentNotFound`].
    pub fn resolve(&self, component_id: &str) -> String {
        if let Some(hit) = self.cache.get(component_id) {
            return hit.value().clone();
        }
        let mut visited_ids = Vec::new();
        let mut ordered_files = Vec::new();
        self.collect(component_id, &mut visited_ids, &mut ordered_files);
        let bundle: String = ordered_files
            .iter()
            .map(|&idx| {
                let src = &self.sources[idx];
                format!("\n<!-- {} -->\n{}", src.file_name, src.content)
            })
            .collect();
        self.cache.insert(component_id.to_string(), bundle.clone());
        bundle
    }

    /// Post-order walk: referenced components land before the one that
    /// references them. Cycles terminate via the visited set; a file shared
    /// by several components is emitted once.
    fn collect(&self, id: &str, visited_ids: &mut Vec<String>, ordered_files: &mut Vec<usize>) {
        if visited_ids.iter().any(|v| v == id) {
            return;
        }
        visited_ids.push(id.to_string());
        let Some(&(_, file_idx)) = self.declarations.iter().find(|(decl, _)| decl == id) else {
            return;
        };
        let content = &self.sources[file_idx].content;
        let referenced: Vec<String> = self
            .declarations
            .iter()
            .filter(|(decl, idx)| *idx != file_idx && references_tag(content, decl))
            .map(|(decl, _)| decl.clone())
            .collect();
        for dep in referenced {
            self.collect(&dep, visited_ids, ordered_files);
        }
        if !ordered_files.contains(&file_idx) {
            ordered_files.push(file_idx);
        }
    }
}

/// True when `content` uses `<id …>` / `<id/>` / `<id>` as a tag. The
/// boundary check keeps `<my-comp-extended>` from counting as a reference
/// to `my-comp`.
fn references_tag(content: &str, id: &str) -> bool {
    let needle = format!("<{id}");
    let mut search_from = 0;
    while let Some(pos) = content[search_from..].find(&needle) {
        let after = search_from + pos + needle.len();
        match content[after..].chars().next() {
            None => return true,
            Some(c) if c.is_whitespace() || c == '>' || c == '/' => return true,
            _ => search_from = after,
        }
    }
    false
}

/// Whole-bundle mode: concatenate every component file in FileSet order,
/// each preceded by a marker comment naming the source file.
pub fn join_vue_files(files: &FileSet) -> Result<String, PageError> {
    let mut bundle = String::new();
    for file in files.component_files() {
        bundle.push_str(&format!("\n<!-- {} -->\n", file.file_name()));
        bundle.push_str(file.content()?);
    }
    Ok(bundle)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
