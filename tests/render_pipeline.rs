use std::path::PathBuf;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use vue_page::{
    DiagnosticLevel, PageError, RenderMode, RequestContext, VuePage, VuePageConfig,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const LAYOUT: &str = r#"<html>
<head>
<script>@inlineFile("/vue/scripts.js")</script>
<script>@inlineFileDev("/vue/dev-tools.js")</script>
<script>@inlineFileNotDev("/vue/analytics.js")</script>
<script src="@cdnWebjar/vue/dist/vue.min.js"></script>
</head>
<body>
<main id="app">@routeComponent</main>
@componentRegistration
</body>
</html>"#;

fn component(id: &str, template: &str) -> String {
    format!(
        "<template id=\"{id}\">{template}</template>\n<script>Vue.component(\"{id}\", {{template: \"#{id}\"}});</script>"
    )
}

/// Build a realistic `vue/` asset tree inside a tempdir and return the
/// root plus the tempdir guard.
fn asset_tree() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let root = dir.path().join("vue");
    let write = |rel: &str, content: &str| {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    };
    write("layout.html", LAYOUT);
    write("scripts.js", "console.log('shared');");
    write("dev-tools.js", "console.log('dev only');");
    write("analytics.js", "console.log('prod only');");
    write("components/view-one.vue", &component("view-one", "<widget></widget>"));
    write("components/widget.vue", &component("widget", "<p>w</p>"));
    write("components/unrelated.vue", &component("unrelated", "<p>x</p>"));
    (dir, root)
}

fn page_for(root: PathBuf) -> VuePage {
    VuePage::new(VuePageConfig {
        root_dir: root,
        ..Default::default()
    })
}

fn dev_ctx() -> RequestContext {
    RequestContext {
        url: "http://localhost:8080/view-one".to_string(),
        ..Default::default()
    }
}

fn prod_ctx() -> RequestContext {
    RequestContext {
        url: "https://example.com/view-one".to_string(),
        ..Default::default()
    }
}

// ============================================================================
// Happy path
// ============================================================================

#[test]
fn dev_render_inlines_dev_assets_and_local_webjars() {
    let (_dir, root) = asset_tree();
    let page = page_for(root);

    let rendered = page.render(&dev_ctx(), "view-one", None).unwrap();
    assert_eq!(page.mode(), Some(RenderMode::Dev));

    assert!(rendered.html.contains("console.log('shared');"));
    assert!(rendered.html.contains("console.log('dev only');"));
    assert!(!rendered.html.contains("console.log('prod only');"));
    assert!(rendered.html.contains("/webjars/vue/dist/vue.min.js"));
    assert!(!rendered.html.contains("cdn.jsdelivr.net"));
    assert!(rendered.html.contains("<view-one></view-one>"));
    // No unexpanded placeholder survives.
    assert!(!rendered.html.contains("@inlineFile"));
    assert!(!rendered.html.contains("@componentRegistration"));
    assert!(!rendered.html.contains("@serverState"));
    assert!(!rendered.html.contains("@routeComponent"));
    assert!(!rendered.html.contains("@cdnWebjar"));
}

#[test]
fn prod_render_inlines_prod_assets_and_cdn_webjars() {
    let (_dir, root) = asset_tree();
    let page = page_for(root);

    let rendered = page.render(&prod_ctx(), "view-one", None).unwrap();
    assert_eq!(page.mode(), Some(RenderMode::Prod));

    assert!(rendered.html.contains("console.log('prod only');"));
    assert!(!rendered.html.contains("console.log('dev only');"));
    assert!(rendered
        .html
        .contains("https://cdn.jsdelivr.net/webjars/org.webjars.npm/vue/dist/vue.min.js"));
}

#[test]
fn literal_tag_string_is_used_verbatim() {
    let (_dir, root) = asset_tree();
    let page = page_for(root);

    let rendered = page
        .render(&dev_ctx(), "<view-one kind=\"inline\"></view-one>", None)
        .unwrap();
    assert!(rendered.html.contains("<view-one kind=\"inline\"></view-one>"));
}

#[test]
fn cache_control_comes_from_config() {
    let (_dir, root) = asset_tree();
    let page = VuePage::new(VuePageConfig {
        root_dir: root,
        cache_control: "max-age=60".to_string(),
        ..Default::default()
    });
    let rendered = page.render(&dev_ctx(), "view-one", None).unwrap();
    assert_eq!(rendered.cache_control, "max-age=60");
}

// ============================================================================
// Substitution order
// ============================================================================

#[test]
fn dependencies_then_state_then_route_component() {
    let (_dir, root) = asset_tree();
    let page = page_for(root);

    let rendered = page.render(&dev_ctx(), "view-one", None).unwrap();
    let deps_at = rendered.html.find("Vue.component(\"view-one\"").unwrap();
    let state_at = rendered.html.find("Vue.prototype.$server").unwrap();
    assert!(
        deps_at < state_at,
        "state script must come after component registration"
    );
    // The decode block follows the assignment block.
    let decode_at = rendered.html.find("____decode").unwrap();
    assert!(state_at < decode_at);
}

// ============================================================================
// Dependency modes
// ============================================================================

#[test]
fn optimized_mode_omits_unreferenced_components() {
    let (_dir, root) = asset_tree();
    let page = page_for(root);

    let rendered = page.render(&dev_ctx(), "view-one", None).unwrap();
    assert!(rendered.html.contains("Vue.component(\"view-one\""));
    assert!(rendered.html.contains("Vue.component(\"widget\""));
    assert!(!rendered.html.contains("Vue.component(\"unrelated\""));
}

#[test]
fn unoptimized_mode_ships_every_component() {
    let (_dir, root) = asset_tree();
    let page = VuePage::new(VuePageConfig {
        root_dir: root,
        optimize_dependencies: false,
        ..Default::default()
    });

    let rendered = page.render(&dev_ctx(), "view-one", None).unwrap();
    assert!(rendered.html.contains("Vue.component(\"view-one\""));
    assert!(rendered.html.contains("Vue.component(\"unrelated\""));
    assert!(rendered.html.contains("<!-- unrelated.vue -->"));
}

#[test]
fn unregistered_component_file_yields_a_warning_diagnostic() {
    let (_dir, root) = asset_tree();
    std::fs::write(
        root.join("components/fragment.vue"),
        "<template><p>never registered</p></template>",
    )
    .unwrap();
    let page = page_for(root);

    let rendered = page.render(&dev_ctx(), "view-one", None).unwrap();
    let warning = rendered
        .diagnostics
        .iter()
        .find(|d| d.level == DiagnosticLevel::Warning)
        .expect("missing warning for unregistered component file");
    assert_eq!(warning.context.as_deref(), Some("/vue/components/fragment.vue"));

    // Every other entry is informational.
    assert!(rendered
        .diagnostics
        .iter()
        .filter(|d| d.level == DiagnosticLevel::Info)
        .count()
        >= 3);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn missing_component_names_the_route_tag() {
    let (_dir, root) = asset_tree();
    let page = page_for(root);

    let err = page.render(&dev_ctx(), "ghost", None).unwrap_err();
    match err {
        PageError::ComponentNotFound(tag) => assert_eq!(tag, "<ghost></ghost>"),
        other => panic!("expected ComponentNotFound, got {other:?}"),
    }
}

#[test]
fn unresolvable_directive_aborts_the_render() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("vue");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(
        root.join("layout.html"),
        "@inlineFile(\"/vue/nonexistent.js\")\n@componentRegistration\n@routeComponent",
    )
    .unwrap();
    std::fs::write(root.join("solo.vue"), component("solo", "<p>s</p>")).unwrap();

    let page = page_for(root);
    let err = page.render(&dev_ctx(), "solo", None).unwrap_err();
    match err {
        PageError::MalformedTemplate(line) => assert!(line.contains("nonexistent.js")),
        other => panic!("expected MalformedTemplate, got {other:?}"),
    }
}

#[test]
fn missing_layout_fails_loudly() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("vue");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("solo.vue"), component("solo", "<p>s</p>")).unwrap();

    let page = page_for(root);
    let err = page.render(&dev_ctx(), "solo", None).unwrap_err();
    assert!(matches!(err, PageError::LayoutNotFound(_)));
}

// ============================================================================
// Caching semantics
// ============================================================================

#[test]
fn dev_mode_sees_edits_between_renders() {
    let (_dir, root) = asset_tree();
    let page = page_for(root.clone());

    let first = page.render(&dev_ctx(), "widget", None).unwrap();
    assert!(first.html.contains("<p>w</p>"));

    std::fs::write(
        root.join("components/widget.vue"),
        component("widget", "<p>edited</p>"),
    )
    .unwrap();

    let second = page.render(&dev_ctx(), "widget", None).unwrap();
    assert!(second.html.contains("<p>edited</p>"));
}

#[test]
fn prod_mode_serves_the_first_snapshot_forever() {
    let (_dir, root) = asset_tree();
    let page = page_for(root.clone());

    let first = page.render(&prod_ctx(), "widget", None).unwrap();
    assert!(first.html.contains("<p>w</p>"));

    std::fs::write(
        root.join("components/widget.vue"),
        component("widget", "<p>edited</p>"),
    )
    .unwrap();

    let second = page.render(&prod_ctx(), "widget", None).unwrap();
    assert!(second.html.contains("<p>w</p>"));
    assert!(!second.html.contains("<p>edited</p>"));
}

#[test]
fn mode_is_frozen_after_first_render() {
    let (_dir, root) = asset_tree();
    let page = page_for(root);

    page.render(&prod_ctx(), "view-one", None).unwrap();
    // A later request that looks like dev cannot flip the process back.
    let rendered = page.render(&dev_ctx(), "view-one", None).unwrap();
    assert_eq!(page.mode(), Some(RenderMode::Prod));
    assert!(rendered.html.contains("cdn.jsdelivr.net"));
}

#[test]
fn failed_render_leaves_cache_usable() {
    let (_dir, root) = asset_tree();
    let page = page_for(root);

    assert!(page.render(&prod_ctx(), "ghost", None).is_err());
    let rendered = page.render(&prod_ctx(), "view-one", None).unwrap();
    assert!(rendered.html.contains("<view-one></view-one>"));
}

#[test]
fn concurrent_renders_converge() {
    let (_dir, root) = asset_tree();
    let page = Arc::new(page_for(root));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let page = Arc::clone(&page);
            std::thread::spawn(move || page.render(&prod_ctx(), "view-one", None).unwrap())
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for rendered in &results[1..] {
        assert_eq!(rendered.html, results[0].html);
    }
}
