//! Go package resolution.
//!
//! Import paths are looked up in this order:
//! 1. the main module (`module` line of the nearest go.mod)
//! 2. `replace` directives (local directories, or module cache for module targets)
//! 3. `<module root>/vendor`
//! 4. `$GOROOT/src` for standard library paths (no dot in the first segment)
//! 5. the module cache, preferring the version listed in `require`
//! 6. `$GOPATH/src`

use crate::go_mod::{self, GoModule};
use crate::{GoEnv, PackageOrigin, PackageResolver, ResolvedPackage};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Resolver for imports made by one Go file.
#[derive(Debug, Clone)]
pub struct GoResolver {
    /// Nearest go.mod and the directory that contains it
    module: Option<(GoModule, PathBuf)>,
    env: GoEnv,
}

impl GoResolver {
    /// Build a resolver for `file`, locating its go.mod by walking up.
    pub fn for_file(file: &Path, env: GoEnv) -> Self {
        let module = go_mod::find_go_mod(file).and_then(|go_mod_path| {
            let module = go_mod::parse_go_mod(&go_mod_path)?;
            let root = go_mod_path.parent()?.to_path_buf();
            tracing::debug!(module = %module.path, root = %root.display(), "found go.mod");
            Some((module, root))
        });
        Self { module, env }
    }

    /// Build a resolver from an already parsed module.
    pub fn new(module: Option<(GoModule, PathBuf)>, env: GoEnv) -> Self {
        Self { module, env }
    }

    pub fn module(&self) -> Option<&GoModule> {
        self.module.as_ref().map(|(m, _)| m)
    }

    pub fn module_root(&self) -> Option<&Path> {
        self.module.as_ref().map(|(_, root)| root.as_path())
    }

    fn found(path: PathBuf, import_path: &str, origin: PackageOrigin) -> Option<ResolvedPackage> {
        if !path.is_dir() {
            return None;
        }
        tracing::debug!(import = import_path, dir = %path.display(), ?origin, "resolved import");
        Some(ResolvedPackage {
            path,
            origin,
        })
    }

    fn resolve_in_module(&self, import_path: &str) -> Option<ResolvedPackage> {
        let (module, root) = self.module.as_ref()?;
        let dir = go_mod::resolve_module_import(import_path, module, root)?;
        Self::found(dir, import_path, PackageOrigin::Module)
    }

    fn resolve_replaced(&self, import_path: &str) -> Option<ResolvedPackage> {
        let (module, root) = self.module.as_ref()?;
        let replace = module.replacement_for(import_path)?;
        let rest = import_path[replace.old.len()..].trim_start_matches('/');

        if replace.is_local() {
            let base = root.join(&replace.new);
            let dir = if rest.is_empty() { base } else { base.join(rest) };
            return Self::found(dir, import_path, PackageOrigin::Replace);
        }

        let cache = self.env.gomodcache.as_deref()?;
        let version = replace.new_version.as_deref()?;
        let dir = module_cache_dir(cache, &replace.new, version, rest);
        Self::found(dir, import_path, PackageOrigin::Replace)
    }

    fn resolve_vendored(&self, import_path: &str) -> Option<ResolvedPackage> {
        if !self.env.vendor {
            return None;
        }
        let root = self.module_root()?;
        Self::found(
            root.join("vendor").join(import_path),
            import_path,
            PackageOrigin::Vendor,
        )
    }

    fn resolve_stdlib(&self, import_path: &str) -> Option<ResolvedPackage> {
        if !is_go_stdlib_import(import_path) {
            return None;
        }
        let goroot = self.env.goroot.as_deref()?;
        Self::found(
            goroot.join("src").join(import_path),
            import_path,
            PackageOrigin::Stdlib,
        )
    }

    fn resolve_cached(&self, import_path: &str) -> Option<ResolvedPackage> {
        let cache = self.env.gomodcache.as_deref()?;

        if let Some(require) = self.module().and_then(|m| m.requirement_for(import_path)) {
            let rest = import_path[require.module.len()..].trim_start_matches('/');
            let dir = module_cache_dir(cache, &require.module, &require.version, rest);
            if let Some(found) = Self::found(dir, import_path, PackageOrigin::ModCache) {
                return Some(found);
            }
        }

        let dir = scan_module_cache(import_path, cache)?;
        Self::found(dir, import_path, PackageOrigin::ModCache)
    }

    fn resolve_gopath(&self, import_path: &str) -> Option<ResolvedPackage> {
        let gopath = self.env.gopath.as_deref()?;
        Self::found(
            gopath.join("src").join(import_path),
            import_path,
            PackageOrigin::GoPath,
        )
    }
}

impl PackageResolver for GoResolver {
    fn resolve_package(&self, import_path: &str) -> Option<ResolvedPackage> {
        self.resolve_in_module(import_path)
            .or_else(|| self.resolve_replaced(import_path))
            .or_else(|| self.resolve_vendored(import_path))
            .or_else(|| self.resolve_stdlib(import_path))
            .or_else(|| self.resolve_cached(import_path))
            .or_else(|| self.resolve_gopath(import_path))
    }
}

/// Check if a Go import is a stdlib import (no dots in first path segment).
pub fn is_go_stdlib_import(import_path: &str) -> bool {
    let first_segment = import_path.split('/').next().unwrap_or(import_path);
    !first_segment.contains('.')
}

/// Find the Go root (the directory containing `src/`).
///
/// Tries `GOROOT`, then `go env GOROOT`, then common install locations.
pub fn find_go_root() -> Option<PathBuf> {
    if let Ok(goroot) = std::env::var("GOROOT") {
        let root = PathBuf::from(goroot);
        if root.join("src").is_dir() {
            return Some(root);
        }
    }

    if let Ok(output) = Command::new("go").args(["env", "GOROOT"]).output()
        && output.status.success()
    {
        let root = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
        if root.join("src").is_dir() {
            return Some(root);
        }
    }

    for path in &["/usr/local/go", "/usr/lib/go", "/opt/go"] {
        let root = PathBuf::from(path);
        if root.join("src").is_dir() {
            return Some(root);
        }
    }

    None
}

/// Find GOPATH: `GOPATH` env var (first entry), falling back to ~/go.
pub fn find_go_path() -> Option<PathBuf> {
    if let Some(first) = std::env::var_os("GOPATH")
        .and_then(|paths| std::env::split_paths(&paths).next())
        && !first.as_os_str().is_empty()
    {
        return Some(first);
    }
    let home = dirs::home_dir()?.join("go");
    home.is_dir().then_some(home)
}

/// Find Go module cache directory.
///
/// Uses GOMODCACHE env var, falls back to `<gopath>/pkg/mod`.
pub fn find_go_mod_cache(gopath: Option<&Path>) -> Option<PathBuf> {
    if let Ok(cache) = std::env::var("GOMODCACHE") {
        let path = PathBuf::from(cache);
        if path.is_dir() {
            return Some(path);
        }
    }

    let mod_cache = gopath?.join("pkg").join("mod");
    mod_cache.is_dir().then_some(mod_cache)
}

/// Escape a module path the way the module cache stores it on disk:
/// every upper-case letter becomes `!` followed by its lower-case form.
pub fn escape_module_path(module: &str) -> String {
    let mut escaped = String::with_capacity(module.len());
    for c in module.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

fn module_cache_dir(cache: &Path, module: &str, version: &str, rest: &str) -> PathBuf {
    let base = cache.join(format!("{}@{}", escape_module_path(module), version));
    if rest.is_empty() { base } else { base.join(rest) }
}

/// Resolve an import against any cached version of its module.
///
/// Import paths like "github.com/user/repo/pkg" are mapped to
/// `$GOMODCACHE/github.com/user/repo@version/pkg`; the longest module prefix
/// with a cached version wins.
pub fn scan_module_cache(import_path: &str, mod_cache: &Path) -> Option<PathBuf> {
    if is_go_stdlib_import(import_path) {
        return None;
    }

    let parts: Vec<&str> = import_path.split('/').collect();

    for i in (2..=parts.len()).rev() {
        let module_prefix = parts[..i].join("/");
        let module_dir = mod_cache.join(escape_module_path(&module_prefix));
        let Some(parent) = module_dir.parent() else {
            continue;
        };
        let Some(module_name) = module_dir.file_name() else {
            continue;
        };
        let marker = format!("{}@", module_name.to_string_lossy());

        let Ok(entries) = std::fs::read_dir(parent) else {
            continue;
        };
        let mut candidates: Vec<PathBuf> = entries
            .flatten()
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&marker))
            .map(|entry| entry.path())
            .collect();
        // Highest version sorts last for the common vX.Y.Z layout.
        candidates.sort();

        let remainder = parts[i..].join("/");
        for versioned in candidates.into_iter().rev() {
            let full_path = if remainder.is_empty() {
                versioned
            } else {
                versioned.join(&remainder)
            };
            if full_path.is_dir() {
                return Some(full_path);
            }
        }
    }

    None
}
