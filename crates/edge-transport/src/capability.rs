//! Validated capability table.
//!
//! [`CapabilityTable`] is built once from the raw table a library exports.
//! Mandatory entries become plain function pointers; the two optional entries
//! become [`Capability`] values so "not supported" is checked, never a null
//! call.

use edge_transport_sdk::table::{
    CreateFn, GetInfoFn, RawTransportTable, SendDataFn, SetEventCallbackFn, SetInfoFn, StateFn,
    TRANSPORT_ABI_VERSION,
};

use crate::error::{EdgeError, Result};

/// An optional capability of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability<T> {
    Supported(T),
    Unsupported,
}

impl<T> Capability<T> {
    pub fn is_supported(&self) -> bool {
        matches!(self, Capability::Supported(_))
    }

    pub fn as_ref(&self) -> Capability<&T> {
        match self {
            Capability::Supported(value) => Capability::Supported(value),
            Capability::Unsupported => Capability::Unsupported,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Capability<U> {
        match self {
            Capability::Supported(value) => Capability::Supported(f(value)),
            Capability::Unsupported => Capability::Unsupported,
        }
    }

    /// `NotSupported` when absent.
    pub fn supported(self) -> Result<T> {
        match self {
            Capability::Supported(value) => Ok(value),
            Capability::Unsupported => Err(EdgeError::NotSupported),
        }
    }
}

impl<T> From<Option<T>> for Capability<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Capability::Supported(value),
            None => Capability::Unsupported,
        }
    }
}

/// Capability table with every mandatory entry present.
///
/// Function pointers point into the loaded library. The table is only
/// reachable through the [`LoadedTransport`](crate::resolver::LoadedTransport)
/// or [`FfiTransport`](crate::transport::FfiTransport) that owns the library,
/// and cannot be copied out of it.
#[derive(Debug)]
pub struct CapabilityTable {
    pub(crate) create: CreateFn,
    pub(crate) close: StateFn,
    pub(crate) start: StateFn,
    pub(crate) stop: StateFn,
    pub(crate) set_event_callback: SetEventCallbackFn,
    pub(crate) start_discovery: StateFn,
    pub(crate) stop_discovery: StateFn,
    pub(crate) connect: StateFn,
    pub(crate) disconnect: StateFn,
    pub(crate) is_connected: StateFn,
    pub(crate) send_data: SendDataFn,
    pub(crate) set_info: Capability<SetInfoFn>,
    pub(crate) get_info: Capability<GetInfoFn>,
}

impl CapabilityTable {
    /// Validate a raw table.
    ///
    /// Rejects ABI version mismatches and tables missing a mandatory entry.
    pub fn from_raw(raw: &RawTransportTable) -> Result<Self> {
        if raw.abi_version != TRANSPORT_ABI_VERSION {
            return Err(EdgeError::unknown(format!(
                "ABI version mismatch: expected {}, found {}",
                TRANSPORT_ABI_VERSION, raw.abi_version
            )));
        }

        let missing = raw.missing_mandatory();
        if !missing.is_empty() {
            return Err(EdgeError::unknown(format!(
                "Transport table is missing mandatory entries: {}",
                missing.join(", ")
            )));
        }

        match (
            raw.create,
            raw.close,
            raw.start,
            raw.stop,
            raw.set_event_callback,
            raw.start_discovery,
            raw.stop_discovery,
            raw.connect,
            raw.disconnect,
            raw.is_connected,
            raw.send_data,
        ) {
            (
                Some(create),
                Some(close),
                Some(start),
                Some(stop),
                Some(set_event_callback),
                Some(start_discovery),
                Some(stop_discovery),
                Some(connect),
                Some(disconnect),
                Some(is_connected),
                Some(send_data),
            ) => Ok(Self {
                create,
                close,
                start,
                stop,
                set_event_callback,
                start_discovery,
                stop_discovery,
                connect,
                disconnect,
                is_connected,
                send_data,
                set_info: raw.set_info.into(),
                get_info: raw.get_info.into(),
            }),
            _ => Err(EdgeError::unknown("Transport table is incomplete")),
        }
    }

    pub fn supports_set_info(&self) -> bool {
        self.set_info.is_supported()
    }

    pub fn supports_get_info(&self) -> bool {
        self.get_info.is_supported()
    }
}
