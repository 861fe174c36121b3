//! Filesystem-backed stream factory
//!
//! The catch-all backend: it never declines on path shape, only on
//! mode-specific failure. Register it last so more specific backends
//! (memory, archive) get first claim on their namespaces.

use super::{AccessMode, Stream, StreamFactory, StreamRequest};
use crate::diag::{DiagnosticSink, Severity};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Filesystem backend rooted at a base directory
///
/// All logical paths resolve relative to the base directory (usually the
/// working directory, or the project's data directory).
#[derive(Debug, Clone)]
pub struct FileFactory {
    base_dir: PathBuf,
}

impl Default for FileFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl FileFactory {
    /// Create a filesystem backend rooted at the current directory
    pub fn new() -> Self {
        Self {
            base_dir: PathBuf::from("."),
        }
    }

    /// Create a filesystem backend with a custom base directory
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Resolve a logical path relative to the base directory
    fn resolve_path(&self, path: &str) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Create the parent directory chain for a file about to be created
    fn ensure_parent(path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Open per mode, with parent creation for the writing modes
    fn open_with_mode(&self, path: &Path, mode: AccessMode) -> std::io::Result<std::fs::File> {
        match mode {
            AccessMode::Open => OpenOptions::new().read(true).write(true).open(path),
            AccessMode::Append => {
                Self::ensure_parent(path)?;
                OpenOptions::new()
                    .read(true)
                    .create(true)
                    .append(true)
                    .open(path)
            }
            AccessMode::Truncate => {
                Self::ensure_parent(path)?;
                OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
            }
        }
    }
}

impl StreamFactory for FileFactory {
    fn name(&self) -> &'static str {
        "file"
    }

    fn attempt(&self, request: &StreamRequest, diag: &dyn DiagnosticSink) -> Option<Stream> {
        let full_path = self.resolve_path(&request.path);

        match self.open_with_mode(&full_path, request.mode) {
            Ok(file) => Some(Stream::File(file)),
            Err(e) => {
                // Absorb the fault and decline; the chain may still have a
                // backend that owns this path.
                diag.log(
                    Severity::Info,
                    &format!(
                        "file backend declined '{}' ({}): {}",
                        request.path, request.mode, e
                    ),
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
    use std::io::{Read, Seek, SeekFrom, Write};
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileFactory, MemorySink) {
        let dir = TempDir::new().unwrap();
        let factory = FileFactory::with_base_dir(dir.path());
        (dir, factory, MemorySink::new())
    }

    #[test]
    fn test_open_missing_file_declines() {
        let (_dir, factory, sink) = setup();

        let request = StreamRequest::new("nope.dat", AccessMode::Open);
        assert!(factory.attempt(&request, &sink).is_none());
        assert!(sink.contains("nope.dat"));
    }

    #[test]
    fn test_open_existing_file() {
        let (dir, factory, sink) = setup();
        std::fs::write(dir.path().join("save.dat"), b"hello").unwrap();

        let request = StreamRequest::new("save.dat", AccessMode::Open);
        let mut stream = factory.attempt(&request, &sink).unwrap();

        let mut contents = String::new();
        stream.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "hello");
    }

    #[test]
    fn test_append_creates_parents_and_file() {
        let (dir, factory, sink) = setup();

        let request = StreamRequest::new("logs/run/latest.log", AccessMode::Append);
        let mut stream = factory.attempt(&request, &sink).unwrap();
        stream.write_all(b"first").unwrap();
        drop(stream);

        assert!(dir.path().join("logs/run").is_dir());
        let contents = std::fs::read(dir.path().join("logs/run/latest.log")).unwrap();
        assert_eq!(contents, b"first");
    }

    #[test]
    fn test_append_does_not_overwrite() {
        let (dir, factory, sink) = setup();

        let request = StreamRequest::new("notes.txt", AccessMode::Append);
        let mut stream = factory.attempt(&request, &sink).unwrap();
        stream.write_all(b"one,").unwrap();
        drop(stream);

        // Second resolution appends after the first write
        let mut stream = factory.attempt(&request, &sink).unwrap();
        stream.write_all(b"two").unwrap();
        drop(stream);

        let contents = std::fs::read_to_string(dir.path().join("notes.txt")).unwrap();
        assert_eq!(contents, "one,two");
    }

    #[test]
    fn test_truncate_resets_existing_content() {
        let (dir, factory, sink) = setup();
        std::fs::write(dir.path().join("data.bin"), b"previous contents").unwrap();

        let request = StreamRequest::new("data.bin", AccessMode::Truncate);
        let mut stream = factory.attempt(&request, &sink).unwrap();
        stream.write_all(b"new").unwrap();
        stream.seek(SeekFrom::Start(0)).unwrap();

        let mut contents = String::new();
        stream.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "new");
    }

    #[test]
    fn test_truncate_creates_missing_file() {
        let (dir, factory, sink) = setup();

        let request = StreamRequest::new("fresh/empty.dat", AccessMode::Truncate);
        let stream = factory.attempt(&request, &sink).unwrap();
        drop(stream);

        assert!(dir.path().join("fresh/empty.dat").is_file());
    }
}
