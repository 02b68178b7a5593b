//! Configuration system for capnconvert.
//!
//! Loads config from:
//! 1. Global: ~/.config/capnconvert/config.toml
//! 2. Per-project: .capnconvert/config.toml in the input's module root (the
//!    directory holding the nearest go.mod, else the input's own directory)
//! 3. An explicit `--config` file
//!
//! Later sources override earlier ones field by field; command-line flags
//! override all of them.
//!
//! Example config.toml:
//! ```toml
//! [schema]
//! go_package = "contract_impl"
//! go_import = "github.com/RedUndercover/capnconvert-go/testdata/contract"
//!
//! [resolve]
//! gopath = "/home/me/go"
//! vendor = false
//! ```

use anyhow::{Context, Result};
use capnconvert_local_deps::GoEnv;
use capnconvert_local_deps::go_mod::find_go_mod;
use capnconvert_typegen::EmitOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Schema header annotations.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    pub go_package: Option<String>,
    pub go_import: Option<String>,
}

/// Toolchain locations used to resolve imports.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ResolveConfig {
    pub goroot: Option<PathBuf>,
    pub gopath: Option<PathBuf>,
    pub gomodcache: Option<PathBuf>,
    /// Look in `<module root>/vendor` (default true)
    pub vendor: Option<bool>,
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CapnconvertConfig {
    pub schema: SchemaConfig,
    pub resolve: ResolveConfig,
}

impl CapnconvertConfig {
    /// Load configuration for converting `input`.
    pub fn load(input: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut layers = Vec::new();
        if let Some(global) = Self::global_config_path() {
            layers.push(global);
        }
        layers.push(
            Self::project_root(input)
                .join(".capnconvert")
                .join("config.toml"),
        );

        let mut config = Self::load_layers(&layers)?;
        if let Some(path) = explicit {
            let file = Self::load_file(path)?
                .with_context(|| format!("config file {} does not exist", path.display()))?;
            config = config.merge(file);
        }
        Ok(config)
    }

    /// Directory holding the nearest go.mod above `input`, else its directory.
    pub fn project_root(input: &Path) -> PathBuf {
        find_go_mod(input)
            .and_then(|go_mod| go_mod.parent().map(Path::to_path_buf))
            .or_else(|| input.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Merge config files in order; missing files are skipped.
    fn load_layers(paths: &[PathBuf]) -> Result<Self> {
        let mut config = Self::default();
        for path in paths {
            if let Some(layer) = Self::load_file(path)? {
                tracing::debug!(path = %path.display(), "loaded config");
                config = config.merge(layer);
            }
        }
        Ok(config)
    }

    /// Get the global config path.
    fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("capnconvert").join("config.toml"))
    }

    /// Load config from a file path. `Ok(None)` if the file does not exist.
    fn load_file(path: &Path) -> Result<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        let config = toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(Some(config))
    }

    /// Merge another config into this one; fields set in `other` win.
    fn merge(self, other: Self) -> Self {
        Self {
            schema: SchemaConfig {
                go_package: other.schema.go_package.or(self.schema.go_package),
                go_import: other.schema.go_import.or(self.schema.go_import),
            },
            resolve: ResolveConfig {
                goroot: other.resolve.goroot.or(self.resolve.goroot),
                gopath: other.resolve.gopath.or(self.resolve.gopath),
                gomodcache: other.resolve.gomodcache.or(self.resolve.gomodcache),
                vendor: other.resolve.vendor.or(self.resolve.vendor),
            },
        }
    }

    pub fn emit_options(&self) -> EmitOptions {
        let defaults = EmitOptions::default();
        EmitOptions {
            go_package: self
                .schema
                .go_package
                .clone()
                .unwrap_or(defaults.go_package),
            go_import: self.schema.go_import.clone().unwrap_or(defaults.go_import),
        }
    }

    pub fn go_env(&self) -> GoEnv {
        GoEnv {
            goroot: self.resolve.goroot.clone(),
            gopath: self.resolve.gopath.clone(),
            gomodcache: self.resolve.gomodcache.clone(),
            vendor: self.resolve.vendor.unwrap_or(true),
        }
    }
}
