//! Local package discovery for Go imports.
//!
//! Answers one question for the conversion engine: "given an import path seen
//! in a Go file, which directory on disk holds that package's sources?"
//!
//! Lookup goes through the [`PackageResolver`] trait so the engine can be
//! driven by a fixed table in tests. [`GoResolver`] is the real implementation
//! and understands go.mod (module path, `require`, `replace`), `vendor/`,
//! the module cache, `GOROOT/src` and `GOPATH/src`.

pub mod go;
pub mod go_mod;

pub use go::GoResolver;
pub use go_mod::{GoModule, Replace, Require};

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Where a resolved package was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageOrigin {
    /// Inside the main module (path prefix matches the `module` line).
    Module,
    /// A `replace` directive pointing at a local directory.
    Replace,
    /// `<module root>/vendor/<import path>`.
    Vendor,
    /// `$GOMODCACHE/<module>@<version>/...`.
    ModCache,
    /// `$GOROOT/src/<import path>`.
    Stdlib,
    /// `$GOPATH/src/<import path>`.
    GoPath,
}

/// Result of resolving an import path.
#[derive(Debug, Clone)]
pub struct ResolvedPackage {
    /// Directory holding the package sources
    pub path: PathBuf,
    pub origin: PackageOrigin,
}

/// Maps import paths to package directories.
pub trait PackageResolver: Send + Sync {
    /// Resolve an import path. `None` means the package cannot be found.
    fn resolve_package(&self, import_path: &str) -> Option<ResolvedPackage>;
}

/// Toolchain locations used during resolution.
///
/// Every field is optional; unset fields fall back to the environment
/// (`GOROOT`, `GOPATH`, `GOMODCACHE`, `HOME`) when a [`GoResolver`] is built.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GoEnv {
    pub goroot: Option<PathBuf>,
    pub gopath: Option<PathBuf>,
    pub gomodcache: Option<PathBuf>,
    /// Consult `<module root>/vendor` before the module cache.
    pub vendor: bool,
}

impl Default for GoEnv {
    fn default() -> Self {
        Self {
            goroot: None,
            gopath: None,
            gomodcache: None,
            vendor: true,
        }
    }
}

impl GoEnv {
    /// Fill unset fields from the process environment.
    pub fn with_process_env(mut self) -> Self {
        if self.goroot.is_none() {
            self.goroot = go::find_go_root();
        }
        if self.gopath.is_none() {
            self.gopath = go::find_go_path();
        }
        if self.gomodcache.is_none() {
            self.gomodcache = go::find_go_mod_cache(self.gopath.as_deref());
        }
        self
    }
}

/// Check if name is a dotfile/dotdir (starts with '.').
pub fn skip_dotfiles(name: &str) -> bool {
    name.starts_with('.')
}

/// Whether a directory entry is a Go source file that belongs to the package
/// proper (test files are compiled separately and never define its API).
pub fn is_package_source(name: &str) -> bool {
    !skip_dotfiles(name)
        && !name.starts_with('_')
        && name.ends_with(".go")
        && !name.ends_with("_test.go")
}

/// List the package source files in a directory, sorted by file name.
pub fn package_source_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter(|entry| is_package_source(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .collect();
    files.sort();
    files
}
