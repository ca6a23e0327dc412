//! Directive-based file inlining.
//!
//! Rewrites a template line by line, replacing the three inline directives
//! with the contents of referenced auxiliary files:
//!
//! - `@inlineFile("/vue/…")` — always inlined
//! - `@inlineFileDev("/vue/…")` — inlined in dev mode, empty line otherwise
//! - `@inlineFileNotDev("/vue/…")` — inlined outside dev mode, empty line
//!   otherwise (and when the mode is still undetermined)

use regex::{NoExpand, Regex};

use crate::files::AssetFile;
use crate::{PageError, RenderMode};

/// Directive flavor, classified from the marker shape on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Unconditional,
    DevOnly,
    NotDevOnly,
}

/// Classify the directive on a line. `None` when the line carries no
/// inline marker at all.
pub fn classify_line(line: &str) -> Option<DirectiveKind> {
    if !line.contains("@inlineFile") {
        return None;
    }
    if line.contains("@inlineFileDev(") {
        Some(DirectiveKind::DevOnly)
    } else if line.contains("@inlineFileNotDev(") {
        Some(DirectiveKind::NotDevOnly)
    } else {
        Some(DirectiveKind::Unconditional)
    }
}

/// Expand every inline directive in `template` against `auxiliary_files`.
///
/// Lines without a marker pass through untouched. A marker line must name a
/// known dependency key, or the whole render aborts with
/// [`PageError::MalformedTemplate`] — an unresolvable reference is a
/// deployment defect, not something to paper over. Replacement is literal
/// (`NoExpand`), so file content containing `$1` and friends survives
/// unmangled. File content is read at most once per matching line, and
/// memoized by the [`AssetFile`] itself across lines.
pub fn inline_files(
    template: &str,
    auxiliary_files: &[&AssetFile],
    mode: Option<RenderMode>,
) -> Result<String, PageError> {
    let newline = Regex::new(r"\r?\n").unwrap();
    let unconditional = Regex::new(r#"@inlineFile\(".*"\)"#).unwrap();
    let dev_only = Regex::new(r#"@inlineFileDev\(".*"\)"#).unwrap();
    let not_dev_only = Regex::new(r#"@inlineFileNotDev\(".*"\)"#).unwrap();

    let is_dev = mode.map(|m| m == RenderMode::Dev);

    let mut out_lines = Vec::new();
    for line in newline.split(template) {
        let kind = match classify_line(line) {
            None => {
                out_lines.push(line.to_string());
                continue;
            }
            Some(kind) => kind,
        };
        // Directive-to-file matching works by exact containment of the
        // quoted dependency key.
        let matching = auxiliary_files
            .iter()
            .find(|f| line.contains(&format!("\"{}\"", f.key())))
            .ok_or_else(|| PageError::MalformedTemplate(line.to_string()))?;
        let rewritten = match kind {
            DirectiveKind::Unconditional => {
                let content = matching.content()?;
                unconditional.replace_all(line, NoExpand(content)).into_owned()
            }
            DirectiveKind::DevOnly => {
                if is_dev == Some(true) {
                    let content = matching.content()?;
                    dev_only.replace_all(line, NoExpand(content)).into_owned()
                } else {
                    String::new()
                }
            }
            DirectiveKind::NotDevOnly => {
                if is_dev == Some(false) {
                    let content = matching.content()?;
                    not_dev_only.replace_all(line, NoExpand(content)).into_owned()
                } else {
                    String::new()
                }
            }
        };
        out_lines.push(rewritten);
    }
    Ok(out_lines.join("\n"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
