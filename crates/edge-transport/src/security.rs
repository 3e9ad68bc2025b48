//! Load policy for transport libraries.
//!
//! An optional gate applied before a library is opened: allowed directories,
//! platform extension and file size. The default policy is empty and touches
//! nothing on the filesystem.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EdgeError, Result};

/// Shared library extension for the current platform.
pub const LIBRARY_EXTENSION: &str = if cfg!(target_os = "macos") {
    "dylib"
} else if cfg!(windows) {
    "dll"
} else {
    "so"
};

/// Check if a path names a shared library for this platform.
pub fn is_library_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(LIBRARY_EXTENSION)
}

/// Restrictions applied to library paths before loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadPolicy {
    /// Libraries must live under one of these directories (empty: anywhere)
    pub allowed_dirs: Vec<PathBuf>,

    /// Require the platform shared library extension
    pub check_extension: bool,

    /// Maximum library file size in bytes
    pub max_file_size: Option<u64>,
}

impl LoadPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an allowed directory.
    pub fn add_allowed_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        self.allowed_dirs.push(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_extension_check(mut self, check: bool) -> Self {
        self.check_extension = check;
        self
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = Some(size);
        self
    }

    /// True when the policy imposes no restriction.
    pub fn is_permissive(&self) -> bool {
        self.allowed_dirs.is_empty() && !self.check_extension && self.max_file_size.is_none()
    }

    /// Validate a library path.
    ///
    /// Violations are `InvalidParameter`; a path that cannot be inspected
    /// is `Unknown`, like any other open failure.
    pub fn validate(&self, path: &Path) -> Result<()> {
        if self.is_permissive() {
            return Ok(());
        }

        if self.check_extension && !is_library_file(path) {
            return Err(EdgeError::invalid(format!(
                "Invalid library extension: {}, expected .{}",
                path.display(),
                LIBRARY_EXTENSION
            )));
        }

        if let Some(max) = self.max_file_size {
            let metadata = std::fs::metadata(path).map_err(|e| {
                EdgeError::unknown(format!("Cannot read metadata of {}: {}", path.display(), e))
            })?;
            if metadata.len() > max {
                return Err(EdgeError::invalid(format!(
                    "Library too large: {} bytes (max: {})",
                    metadata.len(),
                    max
                )));
            }
        }

        if !self.allowed_dirs.is_empty() {
            let canonical = path.canonicalize().map_err(|e| {
                EdgeError::unknown(format!("Cannot canonicalize {}: {}", path.display(), e))
            })?;

            let allowed = self.allowed_dirs.iter().any(|dir| {
                dir.canonicalize()
                    .map(|dir| canonical.starts_with(dir))
                    .unwrap_or(false)
            });

            if !allowed {
                return Err(EdgeError::invalid(format!(
                    "Library is outside allowed directories: {}",
                    path.display()
                )));
            }
        }

        Ok(())
    }
}
