//! C API.
//!
//! Exported by the `cdylib` build for callers outside Rust. A handle is a
//! boxed [`Connection`]; every function checks its pointers and reports
//! failures as raw status codes.

use std::ffi::CStr;
use std::os::raw::{c_char, c_void};

use edge_transport_sdk::malloc_c_string;
use edge_transport_sdk::status::{self, RawStatus};

use crate::connection::Connection;
use crate::data::RawDataRef;
use crate::error::{to_status, EdgeError, Result};
use crate::event::RawEventCallback;

/// Opaque connection handle.
pub type EdgeCustomHandle = Connection;

/// Borrow a handle or fail with `INVALID_PARAMETER`.
unsafe fn handle_ref<'a>(handle: *const EdgeCustomHandle) -> Result<&'a Connection> {
    unsafe { handle.as_ref() }.ok_or_else(|| EdgeError::invalid("handle is null"))
}

/// Borrow a non-empty UTF-8 C string.
unsafe fn c_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(EdgeError::invalid(format!("{} is null", what)));
    }
    let value = unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| EdgeError::invalid(format!("{} is not valid UTF-8", what)))?;
    if value.is_empty() {
        return Err(EdgeError::invalid(format!("{} is empty", what)));
    }
    Ok(value)
}

/// Load a transport library and create a handle.
///
/// # Safety
/// `path` must be a valid C string and `handle_out` a writable pointer.
#[no_mangle]
pub unsafe extern "C" fn edge_custom_load(
    path: *const c_char,
    handle_out: *mut *mut EdgeCustomHandle,
) -> RawStatus {
    if handle_out.is_null() {
        return status::INVALID_PARAMETER;
    }
    unsafe { *handle_out = std::ptr::null_mut() };

    let result = unsafe { c_str(path, "library path") }.and_then(|path| Connection::create(path));
    match result {
        Ok(connection) => {
            unsafe { *handle_out = Box::into_raw(Box::new(connection)) };
            status::NONE
        }
        Err(e) => e.code(),
    }
}

/// Close the transport, unload its library and free the handle.
///
/// # Safety
/// `handle` must come from [`edge_custom_load`] and must not be used again.
#[no_mangle]
pub unsafe extern "C" fn edge_custom_release(handle: *mut EdgeCustomHandle) -> RawStatus {
    if handle.is_null() {
        return status::INVALID_PARAMETER;
    }
    let mut connection = unsafe { Box::from_raw(handle) };
    to_status(&connection.release())
}

macro_rules! forward {
    ($(#[$meta:meta])* $name:ident => $method:ident) => {
        $(#[$meta])*
        ///
        /// # Safety
        /// `handle` must be null or a live handle from [`edge_custom_load`].
        #[no_mangle]
        pub unsafe extern "C" fn $name(handle: *mut EdgeCustomHandle) -> RawStatus {
            to_status(&unsafe { handle_ref(handle) }.and_then(|c| c.$method()))
        }
    };
}

forward!(
    /// Start the transport.
    edge_custom_start => start
);
forward!(
    /// Stop the transport.
    edge_custom_stop => stop
);
forward!(
    /// Start device discovery.
    edge_custom_start_discovery => start_discovery
);
forward!(
    /// Stop device discovery.
    edge_custom_stop_discovery => stop_discovery
);
forward!(
    /// Connect to the destination.
    edge_custom_connect => connect
);
forward!(
    /// Disconnect from the destination.
    edge_custom_disconnect => disconnect
);

/// Register the transport event callback.
///
/// # Safety
/// `handle` must be null or a live handle; `user_data` must stay valid for
/// as long as the transport may invoke `callback`.
#[no_mangle]
pub unsafe extern "C" fn edge_custom_set_event_callback(
    handle: *mut EdgeCustomHandle,
    callback: Option<RawEventCallback>,
    user_data: *mut c_void,
) -> RawStatus {
    let result =
        unsafe { handle_ref(handle) }.and_then(|c| c.set_event_callback(callback, user_data));
    to_status(&result)
}

/// The transport's raw connectivity status.
///
/// # Safety
/// `handle` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn edge_custom_is_connected(handle: *mut EdgeCustomHandle) -> RawStatus {
    match unsafe { handle_ref(handle) }.and_then(|c| c.is_connected()) {
        Ok(raw) => raw,
        Err(e) => e.code(),
    }
}

/// Send a data object.
///
/// # Safety
/// `handle` must be null or a live handle; `data` must be null or point to
/// a `RawEdgeData`.
#[no_mangle]
pub unsafe extern "C" fn edge_custom_send_data(
    handle: *mut EdgeCustomHandle,
    data: *mut c_void,
) -> RawStatus {
    let data = RawDataRef::new(data);
    to_status(&unsafe { handle_ref(handle) }.and_then(|c| c.send_data(&data)))
}

/// Set transport information.
///
/// # Safety
/// `handle` must be null or a live handle; `key` and `value` must be null
/// or valid C strings.
#[no_mangle]
pub unsafe extern "C" fn edge_custom_set_info(
    handle: *mut EdgeCustomHandle,
    key: *const c_char,
    value: *const c_char,
) -> RawStatus {
    let result = unsafe { handle_ref(handle) }.and_then(|c| {
        let key = unsafe { c_str(key, "key") }?;
        let value = unsafe { c_str(value, "value") }?;
        c.set_info(key, value)
    });
    to_status(&result)
}

/// Get transport information.
///
/// On success `*value_out` holds a `malloc`ed string the caller must `free`.
///
/// # Safety
/// `handle` must be null or a live handle; `key` must be null or a valid C
/// string; `value_out` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn edge_custom_get_info(
    handle: *mut EdgeCustomHandle,
    key: *const c_char,
    value_out: *mut *mut c_char,
) -> RawStatus {
    if value_out.is_null() {
        return status::INVALID_PARAMETER;
    }
    unsafe { *value_out = std::ptr::null_mut() };

    let result = unsafe { handle_ref(handle) }.and_then(|c| {
        let key = unsafe { c_str(key, "key") }?;
        c.get_info(key)
    });

    match result {
        Ok(value) => {
            let ptr = malloc_c_string(&value);
            if ptr.is_null() {
                return status::OUT_OF_MEMORY;
            }
            unsafe { *value_out = ptr };
            status::NONE
        }
        Err(e) => e.code(),
    }
}

/// Version of the loader.
///
/// # Safety
/// Each pointer must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn edge_transport_get_version(
    major: *mut u32,
    minor: *mut u32,
    micro: *mut u32,
) -> RawStatus {
    if major.is_null() || minor.is_null() || micro.is_null() {
        return status::INVALID_PARAMETER;
    }
    let (ma, mi, mc) = crate::version();
    unsafe {
        *major = ma;
        *minor = mi;
        *micro = mc;
    }
    status::NONE
}
