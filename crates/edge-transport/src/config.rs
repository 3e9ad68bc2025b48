//! Transport configuration.
//!
//! A small TOML file naming the library to load, the load policy and
//! information entries applied with `set_info` after construction:
//!
//! ```toml
//! library = "/opt/transports/libmy_transport.so"
//!
//! [policy]
//! allowed_dirs = ["/opt/transports"]
//! check_extension = true
//!
//! [info]
//! device_name = "gateway-01"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EdgeError, Result};
use crate::security::LoadPolicy;

/// Environment variable names
pub mod env_vars {
    /// Library path, overrides `library`
    pub const LIBRARY: &str = "EDGE_TRANSPORT_LIBRARY";
    /// Extra allowed library directory
    pub const PLUGIN_DIR: &str = "EDGE_TRANSPORT_DIR";
    /// Emit JSON logs from the CLI when set to `1` or `true`
    pub const LOG_JSON: &str = "EDGE_TRANSPORT_LOG_JSON";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Path of the transport library
    pub library: Option<PathBuf>,

    pub policy: LoadPolicy,

    /// Key/value pairs passed to `set_info` after the handle is created
    pub info: BTreeMap<String, String>,
}

impl TransportConfig {
    pub fn new(library: impl Into<PathBuf>) -> Self {
        Self {
            library: Some(library.into()),
            ..Self::default()
        }
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| EdgeError::Config(e.to_string()))
    }

    /// Read and parse a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EdgeError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| EdgeError::Config(e.to_string()))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(library) = lookup(env_vars::LIBRARY).filter(|v| !v.is_empty()) {
            tracing::debug!("Library path overridden by {}", env_vars::LIBRARY);
            self.library = Some(PathBuf::from(library));
        }

        if let Some(dir) = lookup(env_vars::PLUGIN_DIR).filter(|v| !v.is_empty()) {
            self.policy.add_allowed_dir(dir);
        }
    }

    /// The configured library path.
    pub fn library_path(&self) -> Result<&Path> {
        match self.library.as_deref() {
            Some(path) if !path.as_os_str().is_empty() => Ok(path),
            _ => Err(EdgeError::Config("no transport library configured".to_string())),
        }
    }
}
