//! End-to-end tests against the stub transport built as a shared library.
//!
//! Build it first with `cargo build -p edge-transport-stub`; the tests are
//! skipped when the library is not found.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use edge_transport::security::LIBRARY_EXTENSION;
use edge_transport::status;
use edge_transport::{Connection, EdgeData, EdgeError, EventKind, LoadPolicy, Resolver};

fn stub_library_path() -> PathBuf {
    let prefix = if cfg!(windows) { "" } else { "lib" };
    let name = format!("{}edge_transport_stub.{}", prefix, LIBRARY_EXTENSION);

    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("..");
    path.push("..");
    path.push("target");
    path.push("debug");
    path.push(&name);

    if !path.exists() {
        path.pop();
        path.pop();
        path.push("release");
        path.push(&name);
    }
    path
}

macro_rules! stub_or_skip {
    () => {{
        let path = stub_library_path();
        if !path.exists() {
            println!("Skipping test: stub library not found at {:?}", path);
            return;
        }
        path
    }};
}

#[test]
fn test_full_session_through_dlopen() {
    let path = stub_or_skip!();

    let mut conn = Connection::create(&path).unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    conn.set_event_handler(move |event| sink.lock().unwrap().push(event.kind))
        .unwrap();

    conn.start().unwrap();
    assert_eq!(conn.is_connected(), Ok(status::IO));
    conn.connect().unwrap();
    assert_eq!(conn.is_connected(), Ok(status::NONE));

    let data = EdgeData::from_bytes(b"over the wire".to_vec()).unwrap();
    conn.send_data(&data).unwrap();

    assert_eq!(conn.get_info("name").unwrap(), "edge-transport-stub");
    conn.set_info("mode", "fast").unwrap();
    assert_eq!(conn.get_info("mode").unwrap(), "fast");

    conn.release().unwrap();
    assert_eq!(conn.start(), Err(EdgeError::Released));

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            EventKind::Capability,
            EventKind::ConnectionCompleted,
            EventKind::CallbackReleased,
        ]
    );
}

#[test]
fn test_policy_with_allowed_directory() {
    let path = stub_or_skip!();
    let dir = path.parent().map(PathBuf::from).unwrap_or_default();

    let mut allowed = LoadPolicy::new().with_extension_check(true);
    allowed.add_allowed_dir(&dir);
    let resolver = Resolver::new().with_policy(allowed);
    let mut conn = Connection::create_with(&resolver, &path).unwrap();
    conn.release().unwrap();

    let other = tempfile::tempdir().unwrap();
    let mut denied = LoadPolicy::new();
    denied.add_allowed_dir(other.path());
    let resolver = Resolver::new().with_policy(denied);
    assert!(matches!(
        Connection::create_with(&resolver, &path),
        Err(EdgeError::InvalidParameter(_))
    ));
}

#[test]
fn test_repeated_load_and_release() {
    let path = stub_or_skip!();

    for _ in 0..3 {
        let mut conn = Connection::create(&path).unwrap();
        conn.connect().unwrap();
        conn.release().unwrap();
    }
}
