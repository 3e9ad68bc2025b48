//! Stub transport.
//!
//! Implements the full capability table without any networking. Every call
//! is appended to a per-thread journal, and failures can be injected per
//! operation, which makes it suitable for exercising the loader from tests.
//!
//! Built as a `cdylib` it is also a loadable transport library:
//!
//! ```text
//! cargo build -p edge-transport-stub
//! edge-transport inspect target/debug/libedge_transport_stub.so
//! ```
//!
//! Events are emitted synchronously from within the calls that cause them:
//! `start` sends a capability event, `connect`/`disconnect` send
//! connection-completed/closed, and `close` sends callback-released.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::ffi::CStr;
use std::os::raw::{c_char, c_void};

use edge_transport_sdk::event::{
    EVENT_CALLBACK_RELEASED, EVENT_CAPABILITY, EVENT_CONNECTION_CLOSED, EVENT_CONNECTION_COMPLETED,
};
use edge_transport_sdk::export_transport;
use edge_transport_sdk::prelude::*;

/// Capability string reported on `start`.
pub const CAPABILITY: &str = "stub/raw";

/// Value of the built-in `name` info key.
pub const NAME: &str = "edge-transport-stub";

#[derive(Default)]
struct Recorder {
    calls: Vec<&'static str>,
    failures: HashMap<&'static str, RawStatus>,
    sent: Vec<Vec<u8>>,
    live_states: usize,
}

thread_local! {
    static RECORDER: RefCell<Recorder> = RefCell::new(Recorder::default());
}

/// Clear the journal and all injected failures of the current thread.
pub fn reset() {
    RECORDER.with(|r| *r.borrow_mut() = Recorder::default());
}

/// Operations called on the current thread, in order.
pub fn calls() -> Vec<&'static str> {
    RECORDER.with(|r| r.borrow().calls.clone())
}

/// Number of times `op` was called on the current thread.
pub fn count(op: &str) -> usize {
    RECORDER.with(|r| r.borrow().calls.iter().filter(|c| **c == op).count())
}

/// Make `op` return `code` until [`reset`].
///
/// `create` fails without producing state and `close` still frees it.
pub fn fail(op: &'static str, code: RawStatus) {
    RECORDER.with(|r| {
        r.borrow_mut().failures.insert(op, code);
    });
}

/// Payloads received by `send_data`, chunks concatenated.
pub fn sent() -> Vec<Vec<u8>> {
    RECORDER.with(|r| r.borrow().sent.clone())
}

/// Private states created and not yet closed.
pub fn live_states() -> usize {
    RECORDER.with(|r| r.borrow().live_states)
}

/// Record `op` and return its injected status.
fn enter(op: &'static str) -> RawStatus {
    tracing::trace!("stub transport: {}", op);
    RECORDER.with(|r| {
        let mut r = r.borrow_mut();
        r.calls.push(op);
        r.failures.get(op).copied().unwrap_or(status::NONE)
    })
}

struct StubState {
    callback: Option<RawEventCallback>,
    user_data: *mut c_void,
    connected: bool,
    info: BTreeMap<String, String>,
}

impl StubState {
    fn emit(&self, kind: RawEventKind, payload: &[u8]) {
        if let Some(callback) = self.callback {
            let event = RawEvent::with_payload(kind, payload);
            // SAFETY: the registrant keeps user_data valid while registered.
            unsafe { callback(&event, self.user_data) };
        }
    }
}

unsafe fn state_mut<'a>(state: *mut c_void) -> Option<&'a mut StubState> {
    unsafe { (state as *mut StubState).as_mut() }
}

unsafe fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

unsafe extern "C" fn create(state_out: *mut *mut c_void) -> RawStatus {
    let code = enter("create");
    if code != status::NONE {
        return code;
    }
    if state_out.is_null() {
        return status::INVALID_PARAMETER;
    }

    let mut info = BTreeMap::new();
    info.insert("name".to_string(), NAME.to_string());
    let state = Box::new(StubState {
        callback: None,
        user_data: std::ptr::null_mut(),
        connected: false,
        info,
    });

    unsafe { *state_out = Box::into_raw(state) as *mut c_void };
    RECORDER.with(|r| r.borrow_mut().live_states += 1);
    status::NONE
}

unsafe extern "C" fn close(state: *mut c_void) -> RawStatus {
    let code = enter("close");
    if state.is_null() {
        return status::INVALID_PARAMETER;
    }

    let state = unsafe { Box::from_raw(state as *mut StubState) };
    state.emit(EVENT_CALLBACK_RELEASED, &[]);
    drop(state);
    RECORDER.with(|r| {
        let mut r = r.borrow_mut();
        r.live_states = r.live_states.saturating_sub(1);
    });
    code
}

unsafe extern "C" fn start(state: *mut c_void) -> RawStatus {
    let code = enter("start");
    match unsafe { state_mut(state) } {
        Some(state) if code == status::NONE => {
            state.emit(EVENT_CAPABILITY, CAPABILITY.as_bytes());
            status::NONE
        }
        Some(_) => code,
        None => status::INVALID_PARAMETER,
    }
}

unsafe extern "C" fn stop(state: *mut c_void) -> RawStatus {
    let code = enter("stop");
    if state.is_null() {
        return status::INVALID_PARAMETER;
    }
    code
}

unsafe extern "C" fn set_event_callback(
    state: *mut c_void,
    callback: Option<RawEventCallback>,
    user_data: *mut c_void,
) -> RawStatus {
    let code = enter("set_event_callback");
    match unsafe { state_mut(state) } {
        Some(state) if code == status::NONE => {
            state.callback = callback;
            state.user_data = user_data;
            status::NONE
        }
        Some(_) => code,
        None => status::INVALID_PARAMETER,
    }
}

unsafe extern "C" fn start_discovery(state: *mut c_void) -> RawStatus {
    let code = enter("start_discovery");
    if state.is_null() {
        return status::INVALID_PARAMETER;
    }
    code
}

unsafe extern "C" fn stop_discovery(state: *mut c_void) -> RawStatus {
    let code = enter("stop_discovery");
    if state.is_null() {
        return status::INVALID_PARAMETER;
    }
    code
}

unsafe extern "C" fn connect(state: *mut c_void) -> RawStatus {
    let code = enter("connect");
    match unsafe { state_mut(state) } {
        Some(state) if code == status::NONE => {
            state.connected = true;
            state.emit(EVENT_CONNECTION_COMPLETED, &[]);
            status::NONE
        }
        Some(_) => code,
        None => status::INVALID_PARAMETER,
    }
}

unsafe extern "C" fn disconnect(state: *mut c_void) -> RawStatus {
    let code = enter("disconnect");
    match unsafe { state_mut(state) } {
        Some(state) if code == status::NONE => {
            state.connected = false;
            state.emit(EVENT_CONNECTION_CLOSED, &[]);
            status::NONE
        }
        Some(_) => code,
        None => status::INVALID_PARAMETER,
    }
}

/// `NONE` while connected, `IO` otherwise, unless a failure is injected.
unsafe extern "C" fn is_connected(state: *mut c_void) -> RawStatus {
    let code = enter("is_connected");
    match unsafe { state_mut(state) } {
        Some(_) if code != status::NONE => code,
        Some(state) if state.connected => status::NONE,
        Some(_) => status::IO,
        None => status::INVALID_PARAMETER,
    }
}

unsafe extern "C" fn send_data(state: *mut c_void, data: *mut c_void) -> RawStatus {
    let code = enter("send_data");
    if state.is_null() {
        return status::INVALID_PARAMETER;
    }
    if code != status::NONE {
        return code;
    }

    let Some(data) = (unsafe { RawEdgeData::from_ptr(data) }) else {
        return status::INVALID_PARAMETER;
    };

    let mut payload = Vec::with_capacity(unsafe { data.total_len() });
    for chunk in unsafe { data.chunks() } {
        payload.extend_from_slice(unsafe { chunk.as_slice() });
    }
    RECORDER.with(|r| r.borrow_mut().sent.push(payload));
    status::NONE
}

unsafe extern "C" fn set_info(
    state: *mut c_void,
    key: *const c_char,
    value: *const c_char,
) -> RawStatus {
    let code = enter("set_info");
    let key = unsafe { c_str(key) };
    let value = unsafe { c_str(value) };
    let (Some(state), Some(key), Some(value)) = (unsafe { state_mut(state) }, key, value) else {
        return status::INVALID_PARAMETER;
    };
    if code != status::NONE {
        return code;
    }

    state.info.insert(key.to_string(), value.to_string());
    status::NONE
}

unsafe extern "C" fn get_info(
    state: *mut c_void,
    key: *const c_char,
    value_out: *mut *mut c_char,
) -> RawStatus {
    let code = enter("get_info");
    let (Some(state), Some(key)) = (unsafe { state_mut(state) }, unsafe { c_str(key) }) else {
        return status::INVALID_PARAMETER;
    };
    if value_out.is_null() {
        return status::INVALID_PARAMETER;
    }
    if code != status::NONE {
        return code;
    }

    let Some(value) = state.info.get(key) else {
        return status::INVALID_PARAMETER;
    };
    let ptr = malloc_c_string(value);
    if ptr.is_null() {
        return status::OUT_OF_MEMORY;
    }
    unsafe { *value_out = ptr };
    status::NONE
}

const FULL: RawTransportTable = RawTransportTable {
    abi_version: TRANSPORT_ABI_VERSION,
    create: Some(create),
    close: Some(close),
    start: Some(start),
    stop: Some(stop),
    set_event_callback: Some(set_event_callback),
    start_discovery: Some(start_discovery),
    stop_discovery: Some(stop_discovery),
    connect: Some(connect),
    disconnect: Some(disconnect),
    is_connected: Some(is_connected),
    send_data: Some(send_data),
    set_info: Some(set_info),
    get_info: Some(get_info),
};

/// Full table, including `set_info` and `get_info`.
pub static TABLE: RawTransportTable = FULL;

/// Table without the optional information entries.
pub static MINIMAL_TABLE: RawTransportTable = RawTransportTable {
    set_info: None,
    get_info: None,
    ..FULL
};

export_transport!(TABLE);

/// Entry point returning [`MINIMAL_TABLE`].
pub extern "C" fn minimal_transport_instance() -> *const RawTransportTable {
    &MINIMAL_TABLE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_is_recorded() {
        reset();
        let mut state = std::ptr::null_mut();
        unsafe {
            assert_eq!(create(&mut state), status::NONE);
            assert_eq!(live_states(), 1);
            assert_eq!(is_connected(state), status::IO);
            assert_eq!(connect(state), status::NONE);
            assert_eq!(is_connected(state), status::NONE);
            assert_eq!(close(state), status::NONE);
        }
        assert_eq!(live_states(), 0);
        assert_eq!(
            calls(),
            vec!["create", "is_connected", "connect", "is_connected", "close"]
        );
    }

    #[test]
    fn test_injected_failure() {
        reset();
        fail("create", status::OUT_OF_MEMORY);
        let mut state = std::ptr::null_mut();
        assert_eq!(unsafe { create(&mut state) }, status::OUT_OF_MEMORY);
        assert!(state.is_null());
        assert_eq!(live_states(), 0);
    }

    #[test]
    fn test_info_round_trip() {
        reset();
        let mut state = std::ptr::null_mut();
        unsafe {
            assert_eq!(create(&mut state), status::NONE);
            assert_eq!(set_info(state, c"mode".as_ptr(), c"fast".as_ptr()), status::NONE);

            let mut value = std::ptr::null_mut();
            assert_eq!(get_info(state, c"mode".as_ptr(), &mut value), status::NONE);
            assert_eq!(free_c_string(value).as_deref(), Some("fast"));

            assert_eq!(
                get_info(state, c"missing".as_ptr(), &mut value),
                status::INVALID_PARAMETER
            );
            close(state);
        }
    }

    #[test]
    fn test_tables() {
        assert!(TABLE.missing_mandatory().is_empty());
        assert!(MINIMAL_TABLE.missing_mandatory().is_empty());
        assert!(MINIMAL_TABLE.get_info.is_none());
        assert!(std::ptr::eq(edge_transport_get_instance(), &TABLE));
    }
}
