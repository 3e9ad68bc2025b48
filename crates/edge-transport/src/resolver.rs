//! Library resolver.
//!
//! Opens a transport library, resolves [`ENTRY_SYMBOL`], calls it and
//! validates the returned table. This is the only place where a raw table
//! pointer is read; everything after it works with [`CapabilityTable`].

use std::path::{Path, PathBuf};

use edge_transport_sdk::table::{EntryPointFn, ENTRY_SYMBOL, TRANSPORT_ABI_VERSION};

use crate::capability::CapabilityTable;
use crate::error::{EdgeError, Result};
use crate::security::LoadPolicy;

/// A loaded shared library. Dropping it unloads the library.
pub trait SharedLibrary {
    /// Resolve the transport entry point by name.
    fn entry_point(&self, symbol: &str) -> std::result::Result<EntryPointFn, String>;
}

/// Opens shared libraries. Errors carry the dynamic loader diagnostic.
pub trait LibraryOpener {
    fn open(&self, path: &Path) -> std::result::Result<Box<dyn SharedLibrary>, String>;
}

/// [`LibraryOpener`] backed by the platform dynamic loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeOpener;

/// Library opened through `libloading`.
struct NativeLibrary {
    library: libloading::Library,
    path: PathBuf,
}

#[cfg(unix)]
fn open_library(path: &Path) -> std::result::Result<libloading::Library, libloading::Error> {
    use libloading::os::unix::{Library, RTLD_LAZY, RTLD_LOCAL};

    // SAFETY: running library initializers is inherent to loading a transport.
    unsafe { Library::open(Some(path), RTLD_LAZY | RTLD_LOCAL) }.map(Into::into)
}

#[cfg(not(unix))]
fn open_library(path: &Path) -> std::result::Result<libloading::Library, libloading::Error> {
    // SAFETY: see the unix variant.
    unsafe { libloading::Library::new(path) }
}

impl LibraryOpener for NativeOpener {
    fn open(&self, path: &Path) -> std::result::Result<Box<dyn SharedLibrary>, String> {
        let library = open_library(path).map_err(|e| e.to_string())?;
        Ok(Box::new(NativeLibrary {
            library,
            path: path.to_path_buf(),
        }))
    }
}

impl SharedLibrary for NativeLibrary {
    fn entry_point(&self, symbol: &str) -> std::result::Result<EntryPointFn, String> {
        // SAFETY: the entry point signature is fixed by the transport ABI.
        let entry = unsafe { self.library.get::<EntryPointFn>(symbol.as_bytes()) }
            .map_err(|e| e.to_string())?;
        Ok(*entry)
    }
}

impl Drop for NativeLibrary {
    fn drop(&mut self) {
        tracing::debug!("Unloading transport library {}", self.path.display());
    }
}

/// A validated transport library: the library handle plus its table.
///
/// The table can be inspected but not copied out, so it never outlives the
/// library:
///
/// ```compile_fail,E0507
/// use edge_transport::Resolver;
///
/// let loaded = Resolver::new().load("/opt/transports/libstub.so").unwrap();
/// let table = *loaded.table();
/// drop(loaded);
/// ```
pub struct LoadedTransport {
    table: CapabilityTable,
    library: Box<dyn SharedLibrary>,
}

impl LoadedTransport {
    pub fn table(&self) -> &CapabilityTable {
        &self.table
    }

    pub(crate) fn into_parts(self) -> (CapabilityTable, Box<dyn SharedLibrary>) {
        (self.table, self.library)
    }
}

impl std::fmt::Debug for LoadedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedTransport")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

/// Resolves transport libraries into capability tables.
pub struct Resolver {
    opener: Box<dyn LibraryOpener>,
    policy: LoadPolicy,
}

impl Resolver {
    /// Resolver using the platform loader and no load policy.
    pub fn new() -> Self {
        Self::with_opener(NativeOpener)
    }

    /// Resolver using a custom opener.
    pub fn with_opener(opener: impl LibraryOpener + 'static) -> Self {
        Self {
            opener: Box::new(opener),
            policy: LoadPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: LoadPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &LoadPolicy {
        &self.policy
    }

    /// Load a transport library.
    ///
    /// An empty path fails with `InvalidParameter` before anything is opened.
    /// Open, symbol, null-table and table validation failures are `Unknown`;
    /// the library is closed again before the error is returned.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<LoadedTransport> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(EdgeError::invalid("library path is empty"));
        }

        self.policy.validate(path)?;

        let library = self.opener.open(path).map_err(|e| {
            tracing::error!("Failed to open transport library: {}", e);
            EdgeError::unknown(format!("Failed to open {}: {}", path.display(), e))
        })?;

        // From here on every early return drops `library`, which closes it.
        let entry = library.entry_point(ENTRY_SYMBOL).map_err(|e| {
            tracing::error!("Failed to find {}: {}", ENTRY_SYMBOL, e);
            EdgeError::unknown(format!("Missing entry symbol {}: {}", ENTRY_SYMBOL, e))
        })?;

        // SAFETY: the entry point takes no arguments and returns null or a
        // pointer to a table that lives as long as the library.
        let raw = unsafe { entry() };
        if raw.is_null() {
            tracing::error!("Failed to get transport table from library.");
            return Err(EdgeError::unknown("Entry point returned a null table"));
        }

        // A table from another ABI version may be shorter than ours; only the
        // leading version field is read until it matches.
        let abi_version = unsafe { std::ptr::addr_of!((*raw).abi_version).read() };
        if abi_version != TRANSPORT_ABI_VERSION {
            tracing::error!(
                "Rejected transport table: ABI version {}, expected {}",
                abi_version,
                TRANSPORT_ABI_VERSION
            );
            return Err(EdgeError::unknown(format!(
                "ABI version mismatch: expected {}, found {}",
                TRANSPORT_ABI_VERSION, abi_version
            )));
        }

        let table = CapabilityTable::from_raw(unsafe { &*raw }).map_err(|e| {
            tracing::error!("Rejected transport table: {}", e);
            e
        })?;

        tracing::debug!("Loaded transport library {}", path.display());
        Ok(LoadedTransport { table, library })
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}
