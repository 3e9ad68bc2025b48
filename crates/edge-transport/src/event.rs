//! Events delivered by a transport.
//!
//! The loader never queues or dispatches events itself. It only threads a
//! callback registration through; [`EventHandler`] adapts a Rust closure to
//! the C callback signature.

use std::os::raw::c_void;
use std::panic::{catch_unwind, AssertUnwindSafe};

use edge_transport_sdk::event::{self as raw_event, RawEvent, RawEventKind};

pub use edge_transport_sdk::event::RawEventCallback;

/// Kind of a transport event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Capability,
    NewDataReceived,
    CallbackReleased,
    ConnectionClosed,
    ConnectionCompleted,
    Custom,
    Unknown(RawEventKind),
}

impl From<RawEventKind> for EventKind {
    fn from(kind: RawEventKind) -> Self {
        match kind {
            raw_event::EVENT_CAPABILITY => EventKind::Capability,
            raw_event::EVENT_NEW_DATA_RECEIVED => EventKind::NewDataReceived,
            raw_event::EVENT_CALLBACK_RELEASED => EventKind::CallbackReleased,
            raw_event::EVENT_CONNECTION_CLOSED => EventKind::ConnectionClosed,
            raw_event::EVENT_CONNECTION_COMPLETED => EventKind::ConnectionCompleted,
            raw_event::EVENT_CUSTOM => EventKind::Custom,
            other => EventKind::Unknown(other),
        }
    }
}

/// A borrowed transport event.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    pub kind: EventKind,
    pub payload: &'a [u8],
}

impl<'a> Event<'a> {
    /// # Safety
    /// `raw.data` must be null or point to `raw.len` readable bytes for `'a`.
    pub unsafe fn from_raw(raw: &'a RawEvent) -> Self {
        let payload = if raw.data.is_null() || raw.len == 0 {
            &[][..]
        } else {
            unsafe { std::slice::from_raw_parts(raw.data, raw.len) }
        };
        Self {
            kind: raw.kind.into(),
            payload,
        }
    }

    /// Payload as UTF-8 text, e.g. a capability string.
    pub fn payload_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.payload).ok()
    }
}

type HandlerFn = dyn Fn(&Event<'_>) + Send + Sync;

/// A boxed Rust event handler with a stable address.
///
/// The address is registered as `user_data`; the handler must stay alive
/// until the transport has been closed.
pub(crate) struct EventHandler {
    handler: Box<HandlerFn>,
}

impl EventHandler {
    pub(crate) fn new<F>(handler: F) -> Box<Self>
    where
        F: Fn(&Event<'_>) + Send + Sync + 'static,
    {
        Box::new(Self {
            handler: Box::new(handler),
        })
    }

    pub(crate) fn user_data(&self) -> *mut c_void {
        self as *const EventHandler as *mut c_void
    }

    pub(crate) fn callback() -> RawEventCallback {
        trampoline
    }
}

unsafe extern "C" fn trampoline(event: *const RawEvent, user_data: *mut c_void) {
    if event.is_null() || user_data.is_null() {
        return;
    }

    // SAFETY: user_data is the address of a live EventHandler (see
    // Connection::set_event_handler) and the event is valid for this call.
    let handler = unsafe { &*(user_data as *const EventHandler) };
    let event = unsafe { Event::from_raw(&*event) };

    if catch_unwind(AssertUnwindSafe(|| (handler.handler)(&event))).is_err() {
        tracing::error!("Event handler panicked while handling {:?}", event.kind);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_event_kind_mapping() {
        assert_eq!(EventKind::from(raw_event::EVENT_CAPABILITY), EventKind::Capability);
        assert_eq!(
            EventKind::from(raw_event::EVENT_CONNECTION_COMPLETED),
            EventKind::ConnectionCompleted
        );
        assert_eq!(EventKind::from(99), EventKind::Unknown(99));
    }

    #[test]
    fn test_trampoline_invokes_handler() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_handler = seen.clone();
        let handler = EventHandler::new(move |event| {
            assert_eq!(event.kind, EventKind::NewDataReceived);
            seen_in_handler.fetch_add(event.payload.len(), Ordering::SeqCst);
        });

        let payload = [1u8, 2, 3, 4];
        let raw_ev = RawEvent::with_payload(raw_event::EVENT_NEW_DATA_RECEIVED, &payload);
        unsafe { EventHandler::callback()(&raw_ev, handler.user_data()) };

        assert_eq!(seen.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_trampoline_contains_panics() {
        let handler = EventHandler::new(|_| panic!("boom"));
        let raw_ev = RawEvent::new(raw_event::EVENT_CUSTOM);
        unsafe { EventHandler::callback()(&raw_ev, handler.user_data()) };
    }

    #[test]
    fn test_payload_str() {
        let raw_ev = RawEvent::with_payload(raw_event::EVENT_CAPABILITY, b"video/x-raw");
        let event = unsafe { Event::from_raw(&raw_ev) };
        assert_eq!(event.payload_str(), Some("video/x-raw"));
    }
}
