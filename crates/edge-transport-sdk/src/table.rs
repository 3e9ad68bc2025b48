//! Transport capability table.
//!
//! This module defines the table a transport library must export. The loader
//! resolves [`ENTRY_SYMBOL`], calls it once, and dispatches every connection
//! operation through the returned table.

use std::os::raw::{c_char, c_void};

use crate::event::RawEventCallback;
use crate::status::RawStatus;

/// Current transport ABI version.
/// Tables reporting any other version are rejected at load time.
pub const TRANSPORT_ABI_VERSION: u32 = 1;

/// Name of the function every transport library must export.
///
/// Signature: [`EntryPointFn`].
pub const ENTRY_SYMBOL: &str = "edge_transport_get_instance";

/// Entry point exported by a transport library.
/// Returns a pointer to a table with static lifetime, or null on failure.
pub type EntryPointFn = unsafe extern "C" fn() -> *const RawTransportTable;

/// Construct private state. The transport writes its state pointer into `state`.
pub type CreateFn = unsafe extern "C" fn(state: *mut *mut c_void) -> RawStatus;

/// Any operation taking only the private state (close, start, stop, ...).
pub type StateFn = unsafe extern "C" fn(state: *mut c_void) -> RawStatus;

/// Register the event callback and its user data.
pub type SetEventCallbackFn = unsafe extern "C" fn(
    state: *mut c_void,
    callback: Option<RawEventCallback>,
    user_data: *mut c_void,
) -> RawStatus;

/// Send a data object (a [`crate::RawEdgeData`] pointer).
pub type SendDataFn = unsafe extern "C" fn(state: *mut c_void, data: *mut c_void) -> RawStatus;

/// Set a key/value pair. Both strings are NUL-terminated.
pub type SetInfoFn =
    unsafe extern "C" fn(state: *mut c_void, key: *const c_char, value: *const c_char) -> RawStatus;

/// Get the value for a key. On success the transport stores a `malloc`ed
/// NUL-terminated string in `value`; the caller frees it.
pub type GetInfoFn = unsafe extern "C" fn(
    state: *mut c_void,
    key: *const c_char,
    value: *mut *mut c_char,
) -> RawStatus;

/// Capability table exported by transport libraries.
///
/// Every entry is nullable at the ABI level. All entries except `set_info`
/// and `get_info` are mandatory; the loader rejects tables missing any of them.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawTransportTable {
    /// ABI version - must match TRANSPORT_ABI_VERSION
    pub abi_version: u32,

    /// Construct the private state
    pub create: Option<CreateFn>,

    /// Destroy the private state
    pub close: Option<StateFn>,

    pub start: Option<StateFn>,
    pub stop: Option<StateFn>,

    /// Register the asynchronous event sink
    pub set_event_callback: Option<SetEventCallbackFn>,

    pub start_discovery: Option<StateFn>,
    pub stop_discovery: Option<StateFn>,
    pub connect: Option<StateFn>,
    pub disconnect: Option<StateFn>,

    /// Raw connectivity query; the result is not reinterpreted by the loader
    pub is_connected: Option<StateFn>,

    pub send_data: Option<SendDataFn>,

    /// Optional
    pub set_info: Option<SetInfoFn>,

    /// Optional
    pub get_info: Option<GetInfoFn>,
}

impl RawTransportTable {
    /// A table with the current ABI version and no entries.
    ///
    /// Useful as a base for struct update syntax in plugins and tests.
    pub const EMPTY: Self = Self {
        abi_version: TRANSPORT_ABI_VERSION,
        create: None,
        close: None,
        start: None,
        stop: None,
        set_event_callback: None,
        start_discovery: None,
        stop_discovery: None,
        connect: None,
        disconnect: None,
        is_connected: None,
        send_data: None,
        set_info: None,
        get_info: None,
    };

    /// Names of the mandatory entries that are missing from this table.
    pub fn missing_mandatory(&self) -> Vec<&'static str> {
        let entries = [
            ("create", self.create.is_some()),
            ("close", self.close.is_some()),
            ("start", self.start.is_some()),
            ("stop", self.stop.is_some()),
            ("set_event_callback", self.set_event_callback.is_some()),
            ("start_discovery", self.start_discovery.is_some()),
            ("stop_discovery", self.stop_discovery.is_some()),
            ("connect", self.connect.is_some()),
            ("disconnect", self.disconnect.is_some()),
            ("is_connected", self.is_connected.is_some()),
            ("send_data", self.send_data.is_some()),
        ];

        entries
            .into_iter()
            .filter(|(_, present)| !present)
            .map(|(name, _)| name)
            .collect()
    }
}
