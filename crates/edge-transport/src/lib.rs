//! Edge Transport
//!
//! Loads transport backends from shared libraries and dispatches connection
//! operations to them.
//!
//! A transport library exports `edge_transport_get_instance`, which returns
//! a capability table (see `edge-transport-sdk`). The [`Resolver`] opens the
//! library and validates the table; a [`Connection`] owns the library, the
//! table and the transport's private state, and forwards every operation.
//!
//! ```rust,ignore
//! use edge_transport::prelude::*;
//!
//! let mut conn = Connection::create("/opt/transports/libmy_transport.so")?;
//! conn.set_event_handler(|event| println!("{:?}", event.kind))?;
//! conn.start()?;
//! conn.connect()?;
//! conn.send_data(&EdgeData::from_bytes(b"hello".to_vec())?)?;
//! conn.release()?;
//! ```

pub mod capability;
pub mod capi;
pub mod config;
pub mod connection;
pub mod data;
pub mod error;
pub mod event;
pub mod resolver;
pub mod security;
pub mod transport;

pub use capability::{Capability, CapabilityTable};
pub use config::TransportConfig;
pub use connection::Connection;
pub use data::{DataHandle, EdgeData, RawDataRef};
pub use error::{EdgeError, Result};
pub use event::{Event, EventKind, RawEventCallback};
pub use resolver::{LibraryOpener, LoadedTransport, NativeOpener, Resolver, SharedLibrary};
pub use security::LoadPolicy;
pub use transport::{FfiTransport, PrivateState, Transport};

pub use edge_transport_sdk::status::{self, RawStatus};

/// Prelude module with common imports
pub mod prelude {
    pub use crate::{
        Capability, Connection, DataHandle, EdgeData, EdgeError, Event, EventKind, LoadPolicy,
        PrivateState, Resolver, Result, Transport, TransportConfig,
    };
}

/// Version of this crate as `(major, minor, micro)`.
pub fn version() -> (u32, u32, u32) {
    fn part(value: &str) -> u32 {
        value.parse().unwrap_or(0)
    }
    (
        part(env!("CARGO_PKG_VERSION_MAJOR")),
        part(env!("CARGO_PKG_VERSION_MINOR")),
        part(env!("CARGO_PKG_VERSION_PATCH")),
    )
}
