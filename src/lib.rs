//! # Vue Page
//!
//! Server-side renderer that bootstraps a named Vue component into an HTML
//! page. Given a component id, it inlines exactly the static assets that
//! component transitively needs, injects a JSON snapshot of request state
//! for client hydration, and returns the finished document.
//!
//! The renderer owns no HTTP surface. Callers hand it a [`RequestContext`]
//! and a component name; it hands back a [`RenderedPage`] (HTML plus a
//! cache-control header value). In dev mode every render re-walks the asset
//! directory so edits show up without a restart; in production the file set
//! and resolver are computed once and reused for the process lifetime.

pub mod files;
pub mod inline;
pub mod render;
pub mod resolver;
pub mod state;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use render::VuePage;

// ---------------------------------------------------------------------------
// Render Mode
// ---------------------------------------------------------------------------

/// The render mode determines caching behavior and CDN asset resolution.
///
/// Resolved once, on the first render, and frozen for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderMode {
    /// Development — assets re-walked every render, webjars served locally.
    Dev,
    /// Production — file set and resolver cached, webjars served from CDN.
    Prod,
}

// ---------------------------------------------------------------------------
// Request Context
// ---------------------------------------------------------------------------

/// The narrow slice of an inbound request the renderer consumes.
///
/// Built by the surrounding HTTP layer; never retained past one render.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Full request URL — used by the default dev-mode probe.
    pub url: String,
    /// Path parameters extracted by the router.
    pub path_params: BTreeMap<String, String>,
    /// Query parameters (a key may repeat).
    pub query_params: BTreeMap<String, Vec<String>>,
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// A structured diagnostic emitted during a render.
///
/// Conditions that abort the render surface as [`PageError`], never as a
/// diagnostic, so the levels stop at `Warning`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Warning,
    Info,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Probe deciding whether the process runs in dev mode. Called exactly once,
/// on the first render.
pub type IsDevFn = Arc<dyn Fn(&RequestContext) -> bool + Send + Sync>;

/// Provider for the page state when the caller supplies none.
pub type StateFn = Arc<dyn Fn(&RequestContext) -> serde_json::Value + Send + Sync>;

/// Process-wide renderer configuration. Fixed after construction.
#[derive(Clone)]
pub struct VuePageConfig {
    /// Root directory walked for `.vue` components and auxiliary assets.
    pub root_dir: PathBuf,
    /// Value returned alongside the HTML for the Cache-Control header.
    pub cache_control: String,
    /// Resolve only the transitive dependencies of the requested component
    /// instead of shipping every component file.
    pub optimize_dependencies: bool,
    /// Dev-mode probe, evaluated on the first render only.
    pub is_dev_fn: IsDevFn,
    /// Default page-state provider, used when no explicit state is given.
    pub state_fn: StateFn,
}

impl Default for VuePageConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("vue"),
            cache_control: "no-cache, no-store, must-revalidate".to_string(),
            optimize_dependencies: true,
            is_dev_fn: Arc::new(|ctx| {
                ctx.url.contains("localhost") || ctx.url.contains("127.0.0.1")
            }),
            state_fn: Arc::new(|_| serde_json::Value::Object(Default::default())),
        }
    }
}

impl std::fmt::Debug for VuePageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VuePageConfig")
            .field("root_dir", &self.root_dir)
            .field("cache_control", &self.cache_control)
            .field("optimize_dependencies", &self.optimize_dependencies)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// RenderedPage
// ---------------------------------------------------------------------------

/// The sealed output of a successful render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedPage {
    /// The final HTML document.
    pub html: String,
    /// Cache-Control header value for the response.
    pub cache_control: String,
    /// Diagnostics collected during the render.
    pub diagnostics: Vec<Diagnostic>,
}

// ---------------------------------------------------------------------------
// PageError
// ---------------------------------------------------------------------------

/// Errors that abort a render. All are deterministic configuration or
/// deployment defects — none are retried, and no partial page is returned.
#[derive(Debug, Error)]
pub enum PageError {
    /// An inline directive references a path not present among the
    /// discovered auxiliary files. The offending template line is included.
    #[error("Invalid path found: {0}")]
    MalformedTemplate(String),

    /// The resolved dependency bundle does not contain the requested
    /// route component.
    #[error("Route component not found: {0}")]
    ComponentNotFound(String),

    /// No `layout.html` under the asset root.
    #[error("Layout file not found under {0}")]
    LayoutNotFound(String),

    /// A discovered file's path carries no `/vue/` root marker, so no
    /// dependency key can be derived for it.
    #[error("Asset path has no /vue/ root marker: {0}")]
    InvalidAssetPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
