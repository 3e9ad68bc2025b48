//! Edge Transport SDK
//!
//! The ABI contract shared by the transport loader and the shared libraries
//! it loads. A transport library fills in a [`RawTransportTable`] and exports
//! it through the [`ENTRY_SYMBOL`] function, usually with
//! [`export_transport!`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use edge_transport_sdk::prelude::*;
//!
//! static TABLE: RawTransportTable = RawTransportTable {
//!     abi_version: TRANSPORT_ABI_VERSION,
//!     create: Some(my_create),
//!     close: Some(my_close),
//!     // ...
//!     set_info: None,
//!     get_info: None,
//! };
//!
//! export_transport!(TABLE);
//! ```

pub mod data;
pub mod event;
#[macro_use]
pub mod macros;
pub mod status;
pub mod table;

use std::ffi::CStr;
use std::os::raw::c_char;

pub use data::{RawDataChunk, RawEdgeData, EDGE_DATA_MAGIC, MAX_DATA_CHUNKS};
pub use event::{RawEvent, RawEventCallback, RawEventKind};
pub use status::RawStatus;
pub use table::{
    CreateFn, EntryPointFn, GetInfoFn, RawTransportTable, SendDataFn, SetEventCallbackFn,
    SetInfoFn, StateFn, ENTRY_SYMBOL, TRANSPORT_ABI_VERSION,
};

/// Prelude module with common imports
pub mod prelude {
    pub use crate::data::{RawDataChunk, RawEdgeData, EDGE_DATA_MAGIC, MAX_DATA_CHUNKS};
    pub use crate::event::{RawEvent, RawEventCallback, RawEventKind};
    pub use crate::status::{self, RawStatus};
    pub use crate::table::{
        CreateFn, EntryPointFn, GetInfoFn, RawTransportTable, SendDataFn, SetEventCallbackFn,
        SetInfoFn, StateFn, ENTRY_SYMBOL, TRANSPORT_ABI_VERSION,
    };
    pub use crate::{free_c_string, malloc_c_string};
}

/// Copy `value` into a NUL-terminated buffer allocated with C `malloc`.
///
/// This is how `get_info` hands strings across the boundary: the receiver
/// takes ownership and releases the buffer with [`free_c_string`] (C `free`).
/// Returns null when `value` contains an interior NUL or allocation fails.
pub fn malloc_c_string(value: &str) -> *mut c_char {
    if value.as_bytes().contains(&0) {
        return std::ptr::null_mut();
    }

    let len = value.len();
    // SAFETY: the buffer is len + 1 bytes and fully initialized below.
    unsafe {
        let buf = libc::malloc(len + 1) as *mut u8;
        if buf.is_null() {
            return std::ptr::null_mut();
        }
        std::ptr::copy_nonoverlapping(value.as_ptr(), buf, len);
        *buf.add(len) = 0;
        buf as *mut c_char
    }
}

/// Take ownership of a `malloc`ed C string: copy it out and `free` it.
///
/// Returns `None` for null pointers or non UTF-8 content; the buffer is freed
/// in both non-null cases.
///
/// # Safety
/// `ptr` must be null or a NUL-terminated buffer allocated with C `malloc`
/// that no one else will free.
pub unsafe fn free_c_string(ptr: *mut c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }

    // SAFETY: caller guarantees a valid, malloc-owned C string.
    unsafe {
        let value = CStr::from_ptr(ptr).to_str().ok().map(str::to_owned);
        libc::free(ptr as *mut libc::c_void);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malloc_round_trip() {
        let ptr = malloc_c_string("127.0.0.1");
        assert!(!ptr.is_null());
        let value = unsafe { free_c_string(ptr) };
        assert_eq!(value.as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn test_malloc_rejects_interior_nul() {
        assert!(malloc_c_string("bad\0value").is_null());
    }

    #[test]
    fn test_free_null_is_none() {
        assert_eq!(unsafe { free_c_string(std::ptr::null_mut()) }, None);
    }
}
