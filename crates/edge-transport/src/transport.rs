//! Transport interface.
//!
//! [`Transport`] is the capability table seen as an ordinary Rust trait. The
//! loader resolves a library once and wraps its table in [`FfiTransport`];
//! after that the dispatcher only talks to `dyn Transport`. In-process
//! implementations plug in through the same trait.

use std::ffi::CString;
use std::os::raw::{c_char, c_void};

use edge_transport_sdk::free_c_string;
use edge_transport_sdk::status::RawStatus;

use crate::capability::{Capability, CapabilityTable};
use crate::data::DataHandle;
use crate::error::{check, EdgeError, Result};
use crate::event::RawEventCallback;
use crate::resolver::{LoadedTransport, SharedLibrary};

/// Opaque private state produced by a transport's `create`.
///
/// The loader stores it and hands it back on every call; it never reads
/// through the pointer.
#[derive(Debug, PartialEq, Eq)]
pub struct PrivateState(*mut c_void);

impl PrivateState {
    /// Wrap a state pointer produced by a transport. Null is allowed.
    pub fn from_raw(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub fn as_raw(&self) -> *mut c_void {
        self.0
    }

    /// Give the pointer back, e.g. to a close routine that destroys it.
    pub fn into_raw(self) -> *mut c_void {
        self.0
    }
}

/// Operations a transport backend provides.
///
/// Mirrors the capability table entry for entry. `set_info` and `get_info`
/// are optional and default to [`Capability::Unsupported`].
pub trait Transport {
    /// Construct private state.
    fn create(&self) -> Result<PrivateState>;

    /// Destroy private state.
    fn close(&self, state: PrivateState) -> Result<()>;

    fn start(&self, state: &PrivateState) -> Result<()>;

    fn stop(&self, state: &PrivateState) -> Result<()>;

    /// Register the asynchronous event sink.
    fn set_event_callback(
        &self,
        state: &PrivateState,
        callback: Option<RawEventCallback>,
        user_data: *mut c_void,
    ) -> Result<()>;

    fn start_discovery(&self, state: &PrivateState) -> Result<()>;

    fn stop_discovery(&self, state: &PrivateState) -> Result<()>;

    fn connect(&self, state: &PrivateState) -> Result<()>;

    fn disconnect(&self, state: &PrivateState) -> Result<()>;

    /// Raw connectivity status, not reinterpreted.
    fn is_connected(&self, state: &PrivateState) -> RawStatus;

    /// Send an already validated data object.
    fn send_data(&self, state: &PrivateState, data: &dyn DataHandle) -> Result<()>;

    fn set_info(&self, _state: &PrivateState, _key: &str, _value: &str) -> Capability<Result<()>> {
        Capability::Unsupported
    }

    fn get_info(&self, _state: &PrivateState, _key: &str) -> Capability<Result<String>> {
        Capability::Unsupported
    }
}

/// [`Transport`] backed by a loaded library.
///
/// Owns the library handle, so the table's function pointers stay valid for
/// as long as this value exists.
pub struct FfiTransport {
    table: CapabilityTable,
    // Dropped after `table`; unloads the library.
    _library: Box<dyn SharedLibrary>,
}

impl FfiTransport {
    pub fn new(loaded: LoadedTransport) -> Self {
        let (table, library) = loaded.into_parts();
        Self {
            table,
            _library: library,
        }
    }

    pub fn table(&self) -> &CapabilityTable {
        &self.table
    }
}

impl From<LoadedTransport> for FfiTransport {
    fn from(loaded: LoadedTransport) -> Self {
        Self::new(loaded)
    }
}

impl std::fmt::Debug for FfiTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfiTransport")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

fn c_string(value: &str, what: &str) -> Result<CString> {
    CString::new(value).map_err(|_| EdgeError::invalid(format!("{} contains a NUL byte", what)))
}

// SAFETY (all entries below): the table was validated at load time and
// `self._library` keeps it loaded.
impl Transport for FfiTransport {
    fn create(&self) -> Result<PrivateState> {
        let mut state: *mut c_void = std::ptr::null_mut();
        check(unsafe { (self.table.create)(&mut state) })?;
        Ok(PrivateState::from_raw(state))
    }

    fn close(&self, state: PrivateState) -> Result<()> {
        check(unsafe { (self.table.close)(state.into_raw()) })
    }

    fn start(&self, state: &PrivateState) -> Result<()> {
        check(unsafe { (self.table.start)(state.as_raw()) })
    }

    fn stop(&self, state: &PrivateState) -> Result<()> {
        check(unsafe { (self.table.stop)(state.as_raw()) })
    }

    fn set_event_callback(
        &self,
        state: &PrivateState,
        callback: Option<RawEventCallback>,
        user_data: *mut c_void,
    ) -> Result<()> {
        check(unsafe { (self.table.set_event_callback)(state.as_raw(), callback, user_data) })
    }

    fn start_discovery(&self, state: &PrivateState) -> Result<()> {
        check(unsafe { (self.table.start_discovery)(state.as_raw()) })
    }

    fn stop_discovery(&self, state: &PrivateState) -> Result<()> {
        check(unsafe { (self.table.stop_discovery)(state.as_raw()) })
    }

    fn connect(&self, state: &PrivateState) -> Result<()> {
        check(unsafe { (self.table.connect)(state.as_raw()) })
    }

    fn disconnect(&self, state: &PrivateState) -> Result<()> {
        check(unsafe { (self.table.disconnect)(state.as_raw()) })
    }

    fn is_connected(&self, state: &PrivateState) -> RawStatus {
        unsafe { (self.table.is_connected)(state.as_raw()) }
    }

    fn send_data(&self, state: &PrivateState, data: &dyn DataHandle) -> Result<()> {
        check(unsafe { (self.table.send_data)(state.as_raw(), data.as_raw()) })
    }

    fn set_info(&self, state: &PrivateState, key: &str, value: &str) -> Capability<Result<()>> {
        self.table.set_info.map(|set_info| {
            let key = c_string(key, "key")?;
            let value = c_string(value, "value")?;
            check(unsafe { set_info(state.as_raw(), key.as_ptr(), value.as_ptr()) })
        })
    }

    fn get_info(&self, state: &PrivateState, key: &str) -> Capability<Result<String>> {
        self.table.get_info.map(|get_info| {
            let key = c_string(key, "key")?;
            let mut value: *mut c_char = std::ptr::null_mut();
            let result = check(unsafe { get_info(state.as_raw(), key.as_ptr(), &mut value) });

            // The transport hands over a malloc'ed string; free it even on failure.
            let owned = unsafe { free_c_string(value) };
            result?;
            owned.ok_or_else(|| EdgeError::unknown("Transport returned a null or non UTF-8 value"))
        })
    }
}
