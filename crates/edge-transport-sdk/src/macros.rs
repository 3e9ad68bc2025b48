//! Declarative macros for transport library development.

/// Export a capability table as the transport entry point.
///
/// Generates the `edge_transport_get_instance` symbol returning a pointer to
/// the given `static` table.
///
/// # Example
///
/// ```rust,ignore
/// use edge_transport_sdk::prelude::*;
///
/// static TABLE: RawTransportTable = RawTransportTable {
///     create: Some(create),
///     close: Some(close),
///     ..RawTransportTable::EMPTY
/// };
///
/// export_transport!(TABLE);
/// ```
#[macro_export]
macro_rules! export_transport {
    ($table:path) => {
        #[no_mangle]
        pub extern "C" fn edge_transport_get_instance() -> *const $crate::table::RawTransportTable {
            &$table
        }
    };
}
