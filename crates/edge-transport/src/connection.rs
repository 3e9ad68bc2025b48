//! Connection handle and dispatcher.
//!
//! A [`Connection`] owns a transport, the private state its `create`
//! returned and, for loaded transports, the library handle. Every operation
//! validates its arguments, forwards to the transport and returns the
//! transport's status verbatim; failures are logged here.

use std::os::raw::c_void;
use std::path::Path;

use edge_transport_sdk::status::{self, RawStatus};

use crate::config::TransportConfig;
use crate::data::DataHandle;
use crate::error::{EdgeError, Result};
use crate::event::{Event, EventHandler, RawEventCallback};
use crate::resolver::Resolver;
use crate::transport::{FfiTransport, PrivateState, Transport};

/// Handle to one transport connection.
///
/// Released explicitly with [`Connection::release`] or implicitly on drop.
/// After release every operation fails with [`EdgeError::Released`].
///
/// Not `Send`/`Sync`: thread safety is whatever the transport provides.
pub struct Connection {
    inner: Option<Inner>,
}

// Field order is drop order: the transport, and with it the library, goes last.
struct Inner {
    state: PrivateState,
    handler: Option<Box<EventHandler>>,
    transport: Box<dyn Transport>,
}

impl Connection {
    /// Load the transport library at `path` and construct a connection.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::create_with(&Resolver::new(), path)
    }

    /// Like [`Connection::create`] with a custom resolver.
    pub fn create_with(resolver: &Resolver, path: impl AsRef<Path>) -> Result<Self> {
        let loaded = resolver.load(path).map_err(|e| {
            tracing::error!(
                "Failed to load custom library. Please check the library path or permission."
            );
            e
        })?;

        Self::construct(Box::new(FfiTransport::new(loaded)))
    }

    /// Construct a connection over an in-process transport.
    pub fn from_transport(transport: Box<dyn Transport>) -> Result<Self> {
        Self::construct(transport)
    }

    /// Create a connection from configuration and apply its `info` entries.
    pub fn from_config(config: &TransportConfig) -> Result<Self> {
        Self::from_config_with(Resolver::new(), config)
    }

    /// Like [`Connection::from_config`] with a custom resolver. The
    /// resolver's policy is replaced by the configured one.
    pub fn from_config_with(resolver: Resolver, config: &TransportConfig) -> Result<Self> {
        let path = config.library_path()?;
        let resolver = resolver.with_policy(config.policy.clone());
        let mut connection = Self::create_with(&resolver, path)?;

        for (key, value) in &config.info {
            if let Err(e) = connection.set_info(key, value) {
                tracing::error!("Failed to apply configured info {}: {}", key, e);
                if let Err(close) = connection.release() {
                    tracing::warn!("Release after info failure failed: {}", close);
                }
                return Err(e);
            }
        }

        Ok(connection)
    }

    fn construct(transport: Box<dyn Transport>) -> Result<Self> {
        match transport.create() {
            Ok(state) => Ok(Self {
                inner: Some(Inner {
                    state,
                    handler: None,
                    transport,
                }),
            }),
            Err(e) => {
                log_failure(&e, "create custom connection handle");
                // No private state exists, so there is nothing to close;
                // dropping the transport unloads the library.
                drop(transport);
                Err(e)
            }
        }
    }

    fn inner(&self) -> Result<&Inner> {
        self.inner.as_ref().ok_or(EdgeError::Released)
    }

    /// Forward one operation and log a failure with `what`.
    fn dispatch(
        &self,
        what: &str,
        op: impl FnOnce(&dyn Transport, &PrivateState) -> Result<()>,
    ) -> Result<()> {
        let inner = self.inner()?;
        op(inner.transport.as_ref(), &inner.state).map_err(|e| {
            log_failure(&e, what);
            e
        })
    }

    /// Check if the handle has been released.
    pub fn is_released(&self) -> bool {
        self.inner.is_none()
    }

    /// Close the private state and unload the library.
    ///
    /// `close` is best effort: its error is logged and returned, but the
    /// library is unloaded regardless. Releasing twice yields `Released`.
    pub fn release(&mut self) -> Result<()> {
        let Inner {
            state,
            handler,
            transport,
        } = self.inner.take().ok_or(EdgeError::Released)?;

        let result = transport.close(state);
        if let Err(e) = &result {
            log_failure(e, "stop custom connection");
        }

        // The handler must outlive close.
        drop(handler);
        drop(transport);

        result
    }

    pub fn start(&self) -> Result<()> {
        self.dispatch("start custom connection", |t, s| t.start(s))
    }

    pub fn stop(&self) -> Result<()> {
        self.dispatch("stop custom connection", |t, s| t.stop(s))
    }

    /// Register a raw event callback with the transport.
    ///
    /// `user_data` is handed back to `callback` untouched; keeping it valid
    /// is the caller's job.
    pub fn set_event_callback(
        &self,
        callback: Option<RawEventCallback>,
        user_data: *mut c_void,
    ) -> Result<()> {
        self.dispatch("set event callback to custom connection", |t, s| {
            t.set_event_callback(s, callback, user_data)
        })
    }

    /// Register a Rust closure as event sink.
    ///
    /// The closure replaces any previous one and is kept alive until the
    /// transport has been closed.
    pub fn set_event_handler<F>(&mut self, handler: F) -> Result<()>
    where
        F: Fn(&Event<'_>) + Send + Sync + 'static,
    {
        let handler = EventHandler::new(handler);
        self.set_event_callback(Some(EventHandler::callback()), handler.user_data())?;

        if let Some(inner) = self.inner.as_mut() {
            inner.handler = Some(handler);
        }
        Ok(())
    }

    pub fn start_discovery(&self) -> Result<()> {
        self.dispatch("start discovery devices of custom connection", |t, s| {
            t.start_discovery(s)
        })
    }

    pub fn stop_discovery(&self) -> Result<()> {
        self.dispatch("stop discovery devices of custom connection", |t, s| {
            t.stop_discovery(s)
        })
    }

    pub fn connect(&self) -> Result<()> {
        self.dispatch("connect custom connection", |t, s| t.connect(s))
    }

    pub fn disconnect(&self) -> Result<()> {
        self.dispatch("disconnect custom connection", |t, s| t.disconnect(s))
    }

    /// The transport's raw connectivity status.
    ///
    /// Only handle validation errors are `Err`; whatever the transport
    /// returns, including negative codes, comes back as `Ok`.
    pub fn is_connected(&self) -> Result<RawStatus> {
        let inner = self.inner()?;
        Ok(inner.transport.is_connected(&inner.state))
    }

    /// Validate `data` and send it.
    ///
    /// Invalid data is rejected with its own validation error and never
    /// reaches the transport.
    pub fn send_data(&self, data: &dyn DataHandle) -> Result<()> {
        self.inner()?;
        data.validate()?;
        self.dispatch("send data to custom connection", |t, s| t.send_data(s, data))
    }

    /// Set transport information. `NotSupported` if the transport lacks it.
    pub fn set_info(&self, key: &str, value: &str) -> Result<()> {
        let inner = self.inner()?;
        validate_str(key, "key")?;
        validate_str(value, "value")?;

        inner
            .transport
            .set_info(&inner.state, key, value)
            .supported()?
            .map_err(|e| {
                log_failure(&e, "set information to custom connection");
                e
            })
    }

    /// Get transport information. `NotSupported` if the transport lacks it.
    pub fn get_info(&self, key: &str) -> Result<String> {
        let inner = self.inner()?;
        validate_str(key, "key")?;

        inner
            .transport
            .get_info(&inner.state, key)
            .supported()?
            .map_err(|e| {
                log_failure(&e, "get information from custom connection");
                e
            })
    }
}

fn log_failure(e: &EdgeError, what: &str) {
    let code = e.code();
    tracing::error!(code, status = status::describe(code), "Failed to {}.", what);
}

fn validate_str(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(EdgeError::invalid(format!("{} is empty", what)));
    }
    if value.contains('\0') {
        return Err(EdgeError::invalid(format!("{} contains a NUL byte", what)));
    }
    Ok(())
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.inner.is_some() {
            if let Err(e) = self.release() {
                tracing::warn!("Connection released on drop with error: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Connection");
        match &self.inner {
            Some(inner) => s
                .field("state", &inner.state)
                .field("event_handler", &inner.handler.is_some()),
            None => s.field("released", &true),
        };
        s.finish()
    }
}
