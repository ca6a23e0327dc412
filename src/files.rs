//! Asset discovery and classification.
//!
//! - `.vue` suffix predicate splitting component files from auxiliary assets
//! - dependency-key normalization against the `/vue/` root marker
//! - lazily-read, memoized file content
//! - deterministic directory walk

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use walkdir::WalkDir;

use crate::PageError;

/// Fixed root marker. Everything from this segment onward forms a file's
/// dependency key, so keys stay stable across machines and platforms.
pub const ROOT_MARKER: &str = "/vue/";

/// Dependency key of the layout template every render starts from.
pub const LAYOUT_KEY: &str = "/vue/layout.html";

// ---------------------------------------------------------------------------
// Path Classifier
// ---------------------------------------------------------------------------

/// Check if a path names a component definition file.
pub fn is_vue_file(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".vue")
}

/// Derive the canonical dependency key for a path: forward-slash normalized,
/// suffix from the `/vue/` root marker onward (marker included).
///
/// A relative path starting with `vue/` keys as `/vue/...`. Returns `None`
/// when no root marker is present — callers fail loudly rather than letting
/// a mis-keyed file break directive lookups later.
pub fn normalize_key(path: &Path) -> Option<String> {
    let normalized = path.to_string_lossy().replace('\\', "/");
    if let Some(idx) = normalized.find(ROOT_MARKER) {
        Some(normalized[idx..].to_string())
    } else if normalized.starts_with("vue/") {
        Some(format!("/{normalized}"))
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// AssetFile
// ---------------------------------------------------------------------------

/// A discovered asset. Identity is the normalized dependency key; content
/// is read on first access and memoized for the life of the owning
/// [`FileSet`] (one render in dev, the process in production).
#[derive(Debug)]
pub struct AssetFile {
    path: PathBuf,
    key: String,
    is_component: bool,
    content: OnceLock<String>,
}

impl AssetFile {
    fn new(path: PathBuf) -> Result<Self, PageError> {
        let key = normalize_key(&path)
            .ok_or_else(|| PageError::InvalidAssetPath(path.to_string_lossy().into_owned()))?;
        let is_component = is_vue_file(&path);
        Ok(Self {
            path,
            key,
            is_component,
            content: OnceLock::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Canonical dependency key, e.g. `/vue/js/app.js`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// True for `.vue` component definition files.
    pub fn is_component(&self) -> bool {
        self.is_component
    }

    /// File name only, for human-readable bundle markers.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.key.clone())
    }

    /// Read the file's text, at most once per FileSet lifetime.
    ///
    /// Two racing readers may both hit the disk; the loser's copy is
    /// discarded, so the published content is written exactly once.
    pub fn content(&self) -> Result<&str, PageError> {
        if let Some(text) = self.content.get() {
            return Ok(text);
        }
        let text = fs::read_to_string(&self.path)?;
        Ok(self.content.get_or_init(|| text))
    }
}

// ---------------------------------------------------------------------------
// FileSet
// ---------------------------------------------------------------------------

/// The complete collection of discovered assets used for one or more
/// renders. Iteration order is sorted by path, so every downstream
/// concatenation is deterministic.
#[derive(Debug)]
pub struct FileSet {
    files: Vec<AssetFile>,
}

impl FileSet {
    /// Enumerate every regular file under `root`.
    pub fn walk(root: &Path) -> Result<Self, PageError> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() {
                paths.push(entry.into_path());
            }
        }
        paths.sort();
        Self::from_paths(paths)
    }

    /// Build a FileSet from pre-enumerated paths (custom walkers, tests).
    pub fn from_paths(paths: Vec<PathBuf>) -> Result<Self, PageError> {
        let files = paths
            .into_iter()
            .map(AssetFile::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { files })
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Component definition files, in FileSet order.
    pub fn component_files(&self) -> impl Iterator<Item = &AssetFile> {
        self.files.iter().filter(|f| f.is_component())
    }

    /// Everything that is not a component file — eligible for inlining.
    pub fn auxiliary_files(&self) -> impl Iterator<Item = &AssetFile> {
        self.files.iter().filter(|f| !f.is_component())
    }

    /// The layout template every render starts from.
    pub fn layout(&self) -> Option<&AssetFile> {
        self.files.iter().find(|f| f.key() == LAYOUT_KEY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
