//! Render orchestration.
//!
//! One [`VuePage`] instance holds the process-lifetime state: the mode flag
//! and, in production, the cached [`FileSet`] and [`DependencyResolver`].
//! All three are write-once. Racing first requests may compute a value
//! twice; `OnceLock` publishes exactly one copy and the duplicates are
//! discarded, so concurrent initializers always converge. A failed render
//! publishes nothing and leaves the caches untouched.

use std::sync::OnceLock;

use crate::files::FileSet;
use crate::inline::inline_files;
use crate::resolver::{join_vue_files, DependencyResolver};
use crate::state::serialize_state;
use crate::{
    Diagnostic, DiagnosticLevel, PageError, RenderMode, RenderedPage, RequestContext,
    VuePageConfig,
};

/// Rewrite target for `@cdnWebjar/` in dev mode.
const WEBJAR_LOCAL: &str = "/webjars/";
/// Rewrite target for `@cdnWebjar/` in production.
const WEBJAR_CDN: &str = "https://cdn.jsdelivr.net/webjars/org.webjars.npm/";

/// The render entry point plus the process-lifetime caches.
///
/// Dev mode rebuilds the file set and resolver every render so edits are
/// visible without a restart; production computes both once, on the first
/// request, and reuses them for the process lifetime.
pub struct VuePage {
    config: VuePageConfig,
    mode: OnceLock<RenderMode>,
    cached_files: OnceLock<FileSet>,
    cached_resolver: OnceLock<DependencyResolver>,
}

impl VuePage {
    pub fn new(config: VuePageConfig) -> Self {
        Self {
            config,
            mode: OnceLock::new(),
            cached_files: OnceLock::new(),
            cached_resolver: OnceLock::new(),
        }
    }

    /// The mode this process froze on, if the first render happened yet.
    pub fn mode(&self) -> Option<RenderMode> {
        self.mode.get().copied()
    }

    /// Render the page bootstrapping `component`.
    ///
    /// `component` is either a bare name (`"my-comp"`) or a literal tag
    /// string (`"<my-comp attr=\"1\"></my-comp>"`). `explicit_state`
    /// overrides the configured default-state provider for this render.
    pub fn render(
        &self,
        ctx: &RequestContext,
        component: &str,
        explicit_state: Option<serde_json::Value>,
    ) -> Result<RenderedPage, PageError> {
        let mut diagnostics = Vec::new();

        let mode = *self.mode.get_or_init(|| {
            if (self.config.is_dev_fn)(ctx) {
                RenderMode::Dev
            } else {
                RenderMode::Prod
            }
        });
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Info,
            message: format!("Render started in {mode:?} mode"),
            context: None,
        });

        let route_component = if component.starts_with('<') {
            component.to_string()
        } else {
            format!("<{component}></{component}>")
        };
        let component_id = extract_component_id(&route_component);

        // Dev walks fresh every render; production publishes one FileSet
        // via the compute-then-get_or_init pattern so a racing duplicate
        // is simply discarded.
        let fresh_files;
        let files: &FileSet = match mode {
            RenderMode::Dev => {
                fresh_files = FileSet::walk(&self.config.root_dir)?;
                &fresh_files
            }
            RenderMode::Prod => match self.cached_files.get() {
                Some(cached) => cached,
                None => {
                    let walked = FileSet::walk(&self.config.root_dir)?;
                    self.cached_files.get_or_init(|| walked)
                }
            },
        };
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Info,
            message: format!("File set contains {} assets", files.len()),
            context: None,
        });

        let dependencies = if self.config.optimize_dependencies {
            let fresh_resolver;
            let resolver: &DependencyResolver = match mode {
                RenderMode::Dev => {
                    fresh_resolver = DependencyResolver::new(files)?;
                    &fresh_resolver
                }
                RenderMode::Prod => match self.cached_resolver.get() {
                    Some(cached) => cached,
                    None => {
                        let built = DependencyResolver::new(files)?;
                        self.cached_resolver.get_or_init(|| built)
                    }
                },
            };
            for key in resolver.unregistered_files() {
                diagnostics.push(Diagnostic {
                    level: DiagnosticLevel::Warning,
                    message: "Component file registers no component; unreachable in optimized mode"
                        .to_string(),
                    context: Some(key.clone()),
                });
            }
            resolver.resolve(component_id)
        } else {
            join_vue_files(files)?
        };

        if !dependencies.contains(component_id) {
            return Err(PageError::ComponentNotFound(route_component));
        }
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Info,
            message: format!(
                "Resolved {} bytes of component dependencies for '{component_id}'",
                dependencies.len()
            ),
            context: None,
        });

        let layout = files
            .layout()
            .ok_or_else(|| {
                PageError::LayoutNotFound(self.config.root_dir.to_string_lossy().into_owned())
            })?
            .content()?;

        let auxiliary: Vec<_> = files.auxiliary_files().collect();
        let state_script = serialize_state(ctx, explicit_state, &self.config.state_fn)?;

        // Substitution order is load-bearing: the registration anchor is
        // split in two so the state script lands after the dependency
        // bundle and before the route component mounts.
        let html = inline_files(layout, &auxiliary, Some(mode))?
            .replace("@componentRegistration", "@componentRegistration@serverState")
            .replace("@componentRegistration", &dependencies)
            .replace("@serverState", &state_script)
            .replace("@routeComponent", &route_component)
            .replace(
                "@cdnWebjar/",
                if mode == RenderMode::Dev {
                    WEBJAR_LOCAL
                } else {
                    WEBJAR_CDN
                },
            );

        Ok(RenderedPage {
            html,
            cache_control: self.config.cache_control.clone(),
            diagnostics,
        })
    }
}

/// Local name of the route component tag: strip the `<`, take until the
/// tag ends or attributes begin.
fn extract_component_id(route_component: &str) -> &str {
    let name = route_component.trim_start_matches('<');
    let end = name
        .find(|c: char| c == '>' || c == ' ' || c == '/')
        .unwrap_or(name.len());
    &name[..end]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
