//! Dependency packages loaded from a directory.

use super::go::{GoFile, TypeSpec, parse_go_file};
use crate::error::ConvertError;
use capnconvert_local_deps::package_source_files;
use std::path::Path;

/// The type declarations of one Go package, across all its source files.
#[derive(Debug)]
pub struct GoPackage {
    pub import_path: String,
    /// Name from the package clause
    pub name: String,
    pub files: Vec<GoFile>,
}

impl GoPackage {
    /// Parse every package source file in `dir`.
    ///
    /// Returns `None` when the directory holds no usable Go file.
    pub fn load(import_path: &str, dir: &Path) -> Result<Option<Self>, ConvertError> {
        std::fs::read_dir(dir).map_err(|e| ConvertError::io(dir, e))?;

        let mut name: Option<String> = None;
        let mut files = Vec::new();
        for path in package_source_files(dir) {
            let file = parse_go_file(&path)?;
            if file.build_ignored {
                tracing::debug!(file = %path.display(), "skipping build-ignored file");
                continue;
            }
            match &name {
                None => name = Some(file.package.clone()),
                Some(expected) if *expected != file.package => {
                    tracing::warn!(
                        file = %path.display(),
                        expected = %expected,
                        found = %file.package,
                        "skipping file with mismatched package clause"
                    );
                    continue;
                }
                Some(_) => {}
            }
            files.push(file);
        }

        let Some(name) = name else {
            return Ok(None);
        };
        tracing::debug!(
            import_path,
            package = %name,
            files = files.len(),
            "loaded package"
        );
        Ok(Some(Self {
            import_path: import_path.to_string(),
            name,
            files,
        }))
    }

    /// Find a top-level type declaration, with the index of its file.
    pub fn lookup(&self, name: &str) -> Option<(usize, &TypeSpec)> {
        self.files
            .iter()
            .enumerate()
            .find_map(|(i, file)| file.type_spec(name).map(|spec| (i, spec)))
    }

    pub fn declares(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

/// Exported Go identifiers start with an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
