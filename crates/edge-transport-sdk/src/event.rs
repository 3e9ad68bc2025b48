//! Event notifications sent from a transport to its registered callback.

use std::os::raw::{c_int, c_void};

/// Raw event kind.
pub type RawEventKind = c_int;

/// Peer capability announcement; payload is the capability string.
pub const EVENT_CAPABILITY: RawEventKind = 0;
/// New data arrived; payload is the received bytes.
pub const EVENT_NEW_DATA_RECEIVED: RawEventKind = 1;
/// The callback is being unregistered and will not be called again.
pub const EVENT_CALLBACK_RELEASED: RawEventKind = 2;
pub const EVENT_CONNECTION_CLOSED: RawEventKind = 3;
pub const EVENT_CONNECTION_COMPLETED: RawEventKind = 4;
/// Transport specific notification.
pub const EVENT_CUSTOM: RawEventKind = 5;

/// Event passed to the callback. Only valid for the duration of the call.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawEvent {
    pub kind: RawEventKind,
    pub data: *const u8,
    pub len: usize,
}

impl RawEvent {
    /// An event without payload.
    pub const fn new(kind: RawEventKind) -> Self {
        Self {
            kind,
            data: std::ptr::null(),
            len: 0,
        }
    }

    /// An event borrowing `payload`.
    pub fn with_payload(kind: RawEventKind, payload: &[u8]) -> Self {
        Self {
            kind,
            data: payload.as_ptr(),
            len: payload.len(),
        }
    }
}

/// Event sink registered through `set_event_callback`.
///
/// Invoked by the transport on a thread of its choosing.
pub type RawEventCallback = unsafe extern "C" fn(event: *const RawEvent, user_data: *mut c_void);
