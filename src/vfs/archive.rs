//! Archive-backed stream factory
//!
//! Serves read-only streams for paths that live inside mounted pack
//! archives. Existence checks and entry lookup are delegated to the resource
//! manager; the factory itself only decides accept/decline.

use super::{AccessMode, Stream, StreamFactory, StreamRequest};
use crate::diag::{DiagnosticSink, Severity};
use std::io;

/// Lookup interface over mounted archives
///
/// The entry-naming scheme inside archives is owned by the implementation;
/// the factory treats paths as opaque keys.
pub trait ResourceManager {
    /// Whether the path exists inside any mounted archive
    fn exists(&self, path: &str) -> bool;

    /// Open a read-only stream for an entry
    fn open_read(&self, path: &str) -> io::Result<Stream>;
}

/// Archive backend delegating to a resource manager
///
/// Archive entries are immutable, so write modes (`Append`/`Truncate`) are
/// declined outright instead of handing back a read-only stream the caller
/// cannot write to; the filesystem catch-all then owns those requests.
pub struct ArchiveFactory {
    manager: Box<dyn ResourceManager>,
}

impl ArchiveFactory {
    pub fn new(manager: Box<dyn ResourceManager>) -> Self {
        Self { manager }
    }
}

impl StreamFactory for ArchiveFactory {
    fn name(&self) -> &'static str {
        "archive"
    }

    fn attempt(&self, request: &StreamRequest, diag: &dyn DiagnosticSink) -> Option<Stream> {
        if request.mode != AccessMode::Open {
            if self.manager.exists(&request.path) {
                diag.log(
                    Severity::Info,
                    &format!(
                        "archive backend declined '{}': entries are read-only ({})",
                        request.path, request.mode
                    ),
                );
            }
            return None;
        }

        if !self.manager.exists(&request.path) {
            return None;
        }

        match self.manager.open_read(&request.path) {
            Ok(stream) => Some(stream),
            Err(e) => {
                // The manager said the entry exists but could not serve it;
                // absorb and decline per the chain's fail-soft contract.
                diag.log(
                    Severity::Warning,
                    &format!("archive backend failed on '{}': {}", request.path, e),
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::MemorySink;
    use std::collections::HashMap;
    use std::io::{Cursor, Read};

    /// Manager over a fixed set of entries
    struct FixedEntries {
        entries: HashMap<String, Vec<u8>>,
    }

    impl FixedEntries {
        fn new(entries: &[(&str, &[u8])]) -> Self {
            Self {
                entries: entries
                    .iter()
                    .map(|(path, bytes)| (path.to_string(), bytes.to_vec()))
                    .collect(),
            }
        }
    }

    impl ResourceManager for FixedEntries {
        fn exists(&self, path: &str) -> bool {
            self.entries.contains_key(path)
        }

        fn open_read(&self, path: &str) -> io::Result<Stream> {
            self.entries
                .get(path)
                .map(|bytes| Stream::ReadOnly(Cursor::new(bytes.clone())))
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
        }
    }

    /// Manager that claims existence but fails to serve
    struct Corrupted;

    impl ResourceManager for Corrupted {
        fn exists(&self, _path: &str) -> bool {
            true
        }

        fn open_read(&self, path: &str) -> io::Result<Stream> {
            Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("corrupt entry: {}", path),
            ))
        }
    }

    #[test]
    fn test_serves_existing_entry() {
        let factory = ArchiveFactory::new(Box::new(FixedEntries::new(&[(
            "assets/tex.png",
            b"png bytes",
        )])));
        let sink = MemorySink::new();

        let request = StreamRequest::new("assets/tex.png", AccessMode::Open);
        let mut stream = factory.attempt(&request, &sink).unwrap();
        assert!(stream.is_read_only());

        let mut contents = Vec::new();
        stream.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"png bytes");
    }

    #[test]
    fn test_declines_missing_entry() {
        let factory = ArchiveFactory::new(Box::new(FixedEntries::new(&[])));
        let sink = MemorySink::new();

        let request = StreamRequest::new("assets/tex.png", AccessMode::Open);
        assert!(factory.attempt(&request, &sink).is_none());
    }

    #[test]
    fn test_declines_write_modes() {
        let factory = ArchiveFactory::new(Box::new(FixedEntries::new(&[(
            "assets/tex.png",
            b"png bytes",
        )])));
        let sink = MemorySink::new();

        for mode in [AccessMode::Append, AccessMode::Truncate] {
            let request = StreamRequest::new("assets/tex.png", mode);
            assert!(factory.attempt(&request, &sink).is_none());
        }
        assert!(sink.contains("read-only"));
    }

    #[test]
    fn test_manager_failure_becomes_decline() {
        let factory = ArchiveFactory::new(Box::new(Corrupted));
        let sink = MemorySink::new();

        let request = StreamRequest::new("assets/tex.png", AccessMode::Open);
        assert!(factory.attempt(&request, &sink).is_none());
        assert!(sink.contains("corrupt entry"));
    }
}
