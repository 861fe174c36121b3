//! Memory-backed stream factory
//!
//! Claims the reserved `mem@` namespace. Every resolution yields a new,
//! empty, independent buffer regardless of access mode: `Open` on a memory
//! path never reattaches to previously written content. That is a documented
//! property of the namespace, not an accident, and scratch-buffer users rely
//! on each resolution being isolated.

use super::{Stream, StreamFactory, StreamRequest};
use crate::diag::{DiagnosticSink, Severity};
use std::io::Cursor;

/// Reserved path prefix for memory streams (matched case-insensitively)
pub const MEMORY_PREFIX: &str = "mem@";

/// Buffer capacity when no hint follows the prefix, or the hint is unparsable
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

/// Memory backend for the `mem@` namespace
///
/// `mem@` alone gives a buffer with the default capacity; `mem@<int>`
/// pre-sizes the buffer to that capacity. An unparsable suffix falls back to
/// the default capacity rather than declining.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryFactory;

impl MemoryFactory {
    pub fn new() -> Self {
        Self
    }

    /// Check whether a path starts with the reserved prefix, ignoring case
    fn claims(path: &str) -> bool {
        path.get(..MEMORY_PREFIX.len())
            .map(|head| head.eq_ignore_ascii_case(MEMORY_PREFIX))
            .unwrap_or(false)
    }
}

impl StreamFactory for MemoryFactory {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn attempt(&self, request: &StreamRequest, diag: &dyn DiagnosticSink) -> Option<Stream> {
        if !Self::claims(&request.path) {
            return None;
        }

        let suffix = &request.path[MEMORY_PREFIX.len()..];
        let capacity = if suffix.is_empty() {
            DEFAULT_BUFFER_CAPACITY
        } else {
            match suffix.parse::<usize>() {
                Ok(capacity) => capacity,
                Err(_) => {
                    // Malformed hint is tolerated, never an error
                    diag.log(
                        Severity::Info,
                        &format!(
                            "memory backend: unparsable capacity hint in '{}', using default",
                            request.path
                        ),
                    );
                    DEFAULT_BUFFER_CAPACITY
                }
            }
        };

        Some(Stream::Memory(Cursor::new(Vec::with_capacity(capacity))))
    }
}
