//! Status codes exchanged across the transport boundary.
//!
//! Every table entry returns one of these as a C `int`. Transports may return
//! other negative values too; the loader passes them through untouched.

use std::os::raw::c_int;

/// Raw status code returned by a table entry.
pub type RawStatus = c_int;

/// Successful.
pub const NONE: RawStatus = 0;

/// Given parameter is invalid.
pub const INVALID_PARAMETER: RawStatus = -libc::EINVAL;

/// Failed to allocate required memory.
pub const OUT_OF_MEMORY: RawStatus = -libc::ENOMEM;

/// Failed to transfer data, or no available connection.
pub const IO: RawStatus = -libc::EIO;

/// Failed to connect to the destination.
pub const CONNECTION_FAILURE: RawStatus = -libc::ECONNREFUSED;

/// Generic failure.
pub const UNKNOWN: RawStatus = -0x4000_0000;

/// Capability not provided by the transport.
pub const NOT_SUPPORTED: RawStatus = UNKNOWN + 2;

/// Human readable name of a status code, for diagnostics.
pub fn describe(code: RawStatus) -> &'static str {
    match code {
        NONE => "none",
        INVALID_PARAMETER => "invalid parameter",
        OUT_OF_MEMORY => "out of memory",
        IO => "i/o error",
        CONNECTION_FAILURE => "connection failure",
        UNKNOWN => "unknown error",
        NOT_SUPPORTED => "not supported",
        _ => "transport specific",
    }
}
