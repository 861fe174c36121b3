//! Layered Resource Streams
//!
//! Turns a logical path plus an access mode into a concrete byte stream by
//! trying a chain of backends in registration order:
//! - `mem@[<capacity>]` → fresh in-memory buffer
//! - packed-archive entries → read-only streams served by the resource manager
//! - everything else → plain filesystem (catch-all)
//!
//! Backends never raise on "not mine" or on recoverable I/O trouble; they
//! decline, and the chain moves on. The caller only ever sees the stream from
//! the first backend that accepts, or `ResolveError::NotFound` once every
//! backend has declined.

pub mod archive;
pub mod file;
pub mod memory;
pub mod pack;

pub use archive::{ArchiveFactory, ResourceManager};
pub use file::FileFactory;
pub use memory::{MemoryFactory, DEFAULT_BUFFER_CAPACITY, MEMORY_PREFIX};
pub use pack::{PackError, PackFile, PackMounts};

use crate::diag::{DiagnosticSink, Severity};
use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

/// How the caller wants to access the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// The target must already exist; opened for reading and writing
    Open,
    /// Create if missing, position writes at end-of-file
    Append,
    /// Create if missing, reset length to zero
    Truncate,
}

impl AccessMode {
    /// Short label for diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            AccessMode::Open => "open",
            AccessMode::Append => "append",
            AccessMode::Truncate => "truncate",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A (logical path, access mode) pair describing a desired byte stream
///
/// Immutable; constructed per resolve call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub path: String,
    pub mode: AccessMode,
}

impl StreamRequest {
    pub fn new(path: impl Into<String>, mode: AccessMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }
}

/// A concrete byte stream produced by one of the backends
///
/// Read-only streams (archive entries) accept reads and seeks but reject
/// writes with a `PermissionDenied` I/O error.
#[derive(Debug)]
pub enum Stream {
    /// Backed by a filesystem handle
    File(std::fs::File),
    /// Backed by a fresh growable buffer
    Memory(Cursor<Vec<u8>>),
    /// Backed by immutable archive bytes
    ReadOnly(Cursor<Vec<u8>>),
}

impl Stream {
    /// Whether writes are rejected on this stream
    pub fn is_read_only(&self) -> bool {
        matches!(self, Stream::ReadOnly(_))
    }

    /// Capacity of the backing buffer, for memory streams
    pub fn buffer_capacity(&self) -> Option<usize> {
        match self {
            Stream::Memory(cursor) => Some(cursor.get_ref().capacity()),
            _ => None,
        }
    }

    /// Read the remaining bytes into a vector
    pub fn read_to_end_vec(&mut self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::File(file) => file.read(buf),
            Stream::Memory(cursor) => cursor.read(buf),
            Stream::ReadOnly(cursor) => cursor.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::File(file) => file.write(buf),
            Stream::Memory(cursor) => cursor.write(buf),
            Stream::ReadOnly(_) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "stream is read-only",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::File(file) => file.flush(),
            Stream::Memory(_) | Stream::ReadOnly(_) => Ok(()),
        }
    }
}

impl Seek for Stream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Stream::File(file) => file.seek(pos),
            Stream::Memory(cursor) => cursor.seek(pos),
            Stream::ReadOnly(cursor) => cursor.seek(pos),
        }
    }
}

/// Terminal resolver failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Every registered backend declined the request
    NotFound(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NotFound(path) => write!(f, "no backend produced '{}'", path),
        }
    }
}

impl std::error::Error for ResolveError {}

/// A backend that may produce a stream for a request, or decline
///
/// `None` is the decline: "not mine" and "recoverable failure" look the same
/// to the chain. Implementations must absorb I/O faults on requests they
/// logically own and report them to the sink instead of propagating. A
/// decline is never an empty stream.
pub trait StreamFactory {
    /// Backend name used in diagnostics
    fn name(&self) -> &'static str;

    /// Try to satisfy the request; `None` lets the chain continue
    fn attempt(&self, request: &StreamRequest, diag: &dyn DiagnosticSink) -> Option<Stream>;
}

/// Ordered chain of stream backends
///
/// An explicit owned object: startup code constructs one, registers backends
/// in the order they should be tried, and hands it to whatever needs streams.
/// Registration order is the only priority mechanism; there is no dedup and
/// no reordering.
pub struct StreamResolver {
    factories: Vec<Box<dyn StreamFactory>>,
    diag: Box<dyn DiagnosticSink>,
}

impl StreamResolver {
    /// Create an empty chain reporting through the given sink
    pub fn new(diag: Box<dyn DiagnosticSink>) -> Self {
        Self {
            factories: Vec::new(),
            diag,
        }
    }

    /// Append a backend to the end of the chain
    ///
    /// Registering the same backend twice tries it twice.
    pub fn register(&mut self, factory: Box<dyn StreamFactory>) {
        self.factories.push(factory);
    }

    /// Number of registered backends
    pub fn factory_count(&self) -> usize {
        self.factories.len()
    }

    /// Resolve a request to a stream
    ///
    /// Backends are tried in registration order; the first non-decline wins.
    /// `NotFound` only after every backend has declined.
    pub fn resolve(&self, request: &StreamRequest) -> Result<Stream, ResolveError> {
        for factory in &self.factories {
            if let Some(stream) = factory.attempt(request, &*self.diag) {
                return Ok(stream);
            }
        }
        self.diag.log(
            Severity::Error,
            &format!(
                "resolve failed: no backend for '{}' ({})",
                request.path, request.mode
            ),
        );
        Err(ResolveError::NotFound(request.path.clone()))
    }

    /// Resolve convenience taking path + mode directly
    pub fn open(&self, path: &str, mode: AccessMode) -> Result<Stream, ResolveError> {
        self.resolve(&StreamRequest::new(path, mode))
    }
}
