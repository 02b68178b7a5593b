//! Go module parsing for import resolution.
//!
//! Parses go.mod files to understand module paths, required versions and
//! local replacements.

use std::path::{Path, PathBuf};

/// Information from a go.mod file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoModule {
    /// Module path (e.g., "github.com/user/project")
    pub path: String,
    /// Go version (e.g., "1.21")
    pub go_version: Option<String>,
    pub requires: Vec<Require>,
    pub replaces: Vec<Replace>,
}

/// A `require` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
    pub module: String,
    pub version: String,
}

/// A `replace old [v] => new [v]` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    pub old: String,
    pub new: String,
    /// Only set when `new` is a module path rather than a directory
    pub new_version: Option<String>,
}

impl Replace {
    /// Local replacements are written as filesystem paths.
    pub fn is_local(&self) -> bool {
        self.new.starts_with("./") || self.new.starts_with("../") || Path::new(&self.new).is_absolute()
    }
}

impl GoModule {
    /// Longest `require` whose module path is a prefix of `import_path`.
    pub fn requirement_for(&self, import_path: &str) -> Option<&Require> {
        self.requires
            .iter()
            .filter(|r| has_path_prefix(import_path, &r.module))
            .max_by_key(|r| r.module.len())
    }

    /// Longest `replace` whose old path is a prefix of `import_path`.
    pub fn replacement_for(&self, import_path: &str) -> Option<&Replace> {
        self.replaces
            .iter()
            .filter(|r| has_path_prefix(import_path, &r.old))
            .max_by_key(|r| r.old.len())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Block {
    None,
    Require,
    Replace,
}

/// Parse a go.mod file to extract module information.
pub fn parse_go_mod(path: &Path) -> Option<GoModule> {
    let content = std::fs::read_to_string(path).ok()?;
    parse_go_mod_content(&content)
}

/// Parse go.mod content string.
pub fn parse_go_mod_content(content: &str) -> Option<GoModule> {
    let mut module = GoModule::default();
    let mut module_path = None;
    let mut block = Block::None;

    for line in content.lines() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        if block != Block::None {
            if line == ")" {
                block = Block::None;
                continue;
            }
            match block {
                Block::Require => module.requires.extend(parse_require(line)),
                Block::Replace => module.replaces.extend(parse_replace(line)),
                Block::None => {}
            }
            continue;
        }

        // module github.com/user/project
        if let Some(rest) = line.strip_prefix("module ") {
            module_path = Some(unquote(rest.trim()).to_string());
        }
        // go 1.21
        else if let Some(rest) = line.strip_prefix("go ") {
            module.go_version = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("require") {
            let rest = rest.trim();
            if rest == "(" {
                block = Block::Require;
            } else {
                module.requires.extend(parse_require(rest));
            }
        } else if let Some(rest) = line.strip_prefix("replace") {
            let rest = rest.trim();
            if rest == "(" {
                block = Block::Replace;
            } else {
                module.replaces.extend(parse_replace(rest));
            }
        }
    }

    module.path = module_path?;
    Some(module)
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn unquote(s: &str) -> &str {
    s.trim_matches('"')
}

fn parse_require(line: &str) -> Option<Require> {
    let mut parts = line.split_whitespace();
    let module = unquote(parts.next()?).to_string();
    let version = parts.next()?.to_string();
    Some(Require { module, version })
}

fn parse_replace(line: &str) -> Option<Replace> {
    let (old, new) = line.split_once("=>")?;
    let old = unquote(old.split_whitespace().next()?).to_string();
    let mut new_parts = new.split_whitespace();
    let new = unquote(new_parts.next()?).to_string();
    let new_version = new_parts.next().map(str::to_string);
    Some(Replace {
        old,
        new,
        new_version,
    })
}

/// `import_path` equals `prefix` or continues it with a `/` boundary.
pub fn has_path_prefix(import_path: &str, prefix: &str) -> bool {
    match import_path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Find go.mod by walking up from a file or directory.
pub fn find_go_mod(start: &Path) -> Option<PathBuf> {
    let mut current = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start.to_path_buf()
    };

    loop {
        let go_mod = current.join("go.mod");
        if go_mod.exists() {
            return Some(go_mod);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Resolve a Go import path to a directory inside the module.
///
/// Returns the computed path if the import is within the module, None for external imports.
/// Does not check if the path exists - caller should verify.
pub fn resolve_module_import(
    import_path: &str,
    module: &GoModule,
    module_root: &Path,
) -> Option<PathBuf> {
    if !has_path_prefix(import_path, &module.path) {
        return None;
    }

    let rel_path = import_path.strip_prefix(&module.path)?;
    let rel_path = rel_path.trim_start_matches('/');

    let target = if rel_path.is_empty() {
        module_root.to_path_buf()
    } else {
        module_root.join(rel_path)
    };

    Some(target)
}
