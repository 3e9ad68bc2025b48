//! Shared test doubles.
//!
//! `CountingOpener` replaces the platform loader: it hands out libraries
//! whose entry point is an ordinary function linked into the test binary
//! and counts every open and close.

#![allow(dead_code)]

use std::cell::Cell;
use std::path::Path;
use std::io::Write;
use std::rc::Rc;
use std::sync::{Arc, Mutex, OnceLock};

use edge_transport::resolver::{LibraryOpener, SharedLibrary};
use edge_transport::Resolver;
use edge_transport_sdk::table::{EntryPointFn, RawTransportTable};

pub const STUB_PATH: &str = "/opt/transports/libstub.so";

#[derive(Debug, Default)]
pub struct Counters {
    pub opens: Cell<usize>,
    pub closes: Cell<usize>,
}

impl Counters {
    /// Libraries opened and not yet closed.
    pub fn live(&self) -> usize {
        self.opens.get() - self.closes.get()
    }
}

#[derive(Clone, Copy)]
pub enum Entry {
    Symbol(EntryPointFn),
    Missing,
    OpenFails,
}

pub struct CountingOpener {
    counters: Rc<Counters>,
    entry: Entry,
}

struct CountingLibrary {
    counters: Rc<Counters>,
    entry: Entry,
}

impl LibraryOpener for CountingOpener {
    fn open(&self, _path: &Path) -> Result<Box<dyn SharedLibrary>, String> {
        if let Entry::OpenFails = self.entry {
            return Err("cannot open shared object file: No such file or directory".into());
        }
        self.counters.opens.set(self.counters.opens.get() + 1);
        Ok(Box::new(CountingLibrary {
            counters: self.counters.clone(),
            entry: self.entry,
        }))
    }
}

impl SharedLibrary for CountingLibrary {
    fn entry_point(&self, symbol: &str) -> Result<EntryPointFn, String> {
        match self.entry {
            Entry::Symbol(entry) => Ok(entry),
            _ => Err(format!("undefined symbol: {}", symbol)),
        }
    }
}

impl Drop for CountingLibrary {
    fn drop(&mut self) {
        self.counters.closes.set(self.counters.closes.get() + 1);
    }
}

/// A resolver backed by a counting opener with the given entry point.
pub fn counting_resolver(entry: Entry) -> (Resolver, Rc<Counters>) {
    let counters = Rc::new(Counters::default());
    let opener = CountingOpener {
        counters: counters.clone(),
        entry,
    };
    (Resolver::with_opener(opener), counters)
}

/// Resolver handing out the full stub transport.
pub fn stub_resolver() -> (Resolver, Rc<Counters>) {
    edge_transport_stub::reset();
    counting_resolver(Entry::Symbol(edge_transport_stub::edge_transport_get_instance))
}

/// Resolver handing out the stub transport without the info entries.
pub fn minimal_stub_resolver() -> (Resolver, Rc<Counters>) {
    edge_transport_stub::reset();
    counting_resolver(Entry::Symbol(edge_transport_stub::minimal_transport_instance))
}

pub extern "C" fn null_instance() -> *const RawTransportTable {
    std::ptr::null()
}

pub extern "C" fn wrong_abi_instance() -> *const RawTransportTable {
    static TABLE: OnceLock<RawTransportTable> = OnceLock::new();
    TABLE.get_or_init(|| RawTransportTable {
        abi_version: 99,
        ..edge_transport_stub::TABLE
    })
}

pub extern "C" fn no_connect_instance() -> *const RawTransportTable {
    static TABLE: OnceLock<RawTransportTable> = OnceLock::new();
    TABLE.get_or_init(|| RawTransportTable {
        connect: None,
        ..edge_transport_stub::TABLE
    })
}

/// A table from a different ABI that is only a version field long.
#[repr(C, align(8))]
pub struct ShortTable {
    pub abi_version: u32,
}

pub static SHORT_TABLE: ShortTable = ShortTable { abi_version: 7 };

pub extern "C" fn short_table_instance() -> *const RawTransportTable {
    &SHORT_TABLE as *const ShortTable as *const RawTransportTable
}

/// In-memory log sink.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a subscriber that records every log line.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}
