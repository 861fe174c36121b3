//! Pack archive files
//!
//! On-disk format for packed assets: a RON manifest mapping entry paths to
//! base64 payloads, brotli-compressed as a whole. Plain uncompressed RON is
//! also accepted so packs can be hand-authored during development.
//! - Reading: detects format by leading byte (RON starts with '(' or whitespace)
//! - Writing: always compresses
//!
//! `PackMounts` layers several packs into one `ResourceManager`: mount order
//! is lookup order, first pack containing a path wins.

use super::archive::ResourceManager;
use super::Stream;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Cursor};
use std::path::Path;

/// Manifest version understood by this loader
const PACK_VERSION: u32 = 1;

/// Pack file errors
#[derive(Debug)]
pub enum PackError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
    /// An entry payload was not valid base64
    DecodeError(String),
    /// Manifest written by a newer engine
    UnsupportedVersion(u32),
}

impl From<std::io::Error> for PackError {
    fn from(e: std::io::Error) -> Self {
        PackError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for PackError {
    fn from(e: ron::error::SpannedError) -> Self {
        PackError::ParseError(e)
    }
}

impl From<ron::Error> for PackError {
    fn from(e: ron::Error) -> Self {
        PackError::SerializeError(e)
    }
}

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackError::IoError(e) => write!(f, "IO error: {}", e),
            PackError::ParseError(e) => write!(f, "Parse error: {}", e),
            PackError::SerializeError(e) => write!(f, "Serialize error: {}", e),
            PackError::DecodeError(msg) => write!(f, "Decode error: {}", msg),
            PackError::UnsupportedVersion(v) => write!(f, "Unsupported pack version: {}", v),
        }
    }
}

impl std::error::Error for PackError {}

/// Serialized manifest shape
#[derive(Debug, Serialize, Deserialize)]
struct PackManifest {
    version: u32,
    entries: Vec<PackEntry>,
}

/// One packed asset: logical path + base64 payload
#[derive(Debug, Serialize, Deserialize)]
struct PackEntry {
    path: String,
    data: String,
}

/// A loaded pack archive
///
/// Entries are fully decoded at load time; lookups are map hits.
#[derive(Debug, Default)]
pub struct PackFile {
    entries: HashMap<String, Vec<u8>>,
}

impl PackFile {
    /// Create an empty pack
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Build a pack from in-memory entries (tools and tests)
    pub fn from_entries<I, P, B>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, B)>,
        P: Into<String>,
        B: Into<Vec<u8>>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(path, bytes)| (path.into(), bytes.into()))
                .collect(),
        }
    }

    /// Load a pack from disk (compressed or plain RON)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PackError> {
        let bytes = fs::read(path.as_ref())?;

        // Detect format: RON files start with '(' or whitespace, brotli is binary
        let is_plain_ron = bytes
            .first()
            .map(|&b| b == b'(' || b == b' ' || b == b'\n' || b == b'\r' || b == b'\t')
            .unwrap_or(false);

        let contents = if is_plain_ron {
            String::from_utf8(bytes).map_err(|e| {
                PackError::IoError(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid UTF-8: {}", e),
                ))
            })?
        } else {
            let mut decompressed = Vec::new();
            brotli::BrotliDecompress(&mut Cursor::new(&bytes), &mut decompressed).map_err(|e| {
                PackError::IoError(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("brotli decompression failed: {}", e),
                ))
            })?;
            String::from_utf8(decompressed).map_err(|e| {
                PackError::IoError(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid UTF-8 after decompression: {}", e),
                ))
            })?
        };

        Self::from_manifest_str(&contents)
    }

    /// Parse a plain RON manifest string
    pub fn from_manifest_str(contents: &str) -> Result<Self, PackError> {
        let manifest: PackManifest = ron::from_str(contents)?;

        if manifest.version > PACK_VERSION {
            return Err(PackError::UnsupportedVersion(manifest.version));
        }

        let mut entries = HashMap::with_capacity(manifest.entries.len());
        for entry in manifest.entries {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&entry.data)
                .map_err(|e| PackError::DecodeError(format!("{}: {}", entry.path, e)))?;
            entries.insert(entry.path, bytes);
        }

        Ok(Self { entries })
    }

    /// Save the pack as compressed RON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PackError> {
        let mut entry_list: Vec<PackEntry> = self
            .entries
            .iter()
            .map(|(path, bytes)| PackEntry {
                path: path.clone(),
                data: base64::engine::general_purpose::STANDARD.encode(bytes),
            })
            .collect();
        // Stable on-disk ordering
        entry_list.sort_by(|a, b| a.path.cmp(&b.path));

        let manifest = PackManifest {
            version: PACK_VERSION,
            entries: entry_list,
        };

        let config = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .indentor("  ".to_string());
        let ron_string = ron::ser::to_string_pretty(&manifest, config)?;

        // Compress with brotli (quality 6, window 22 - good balance of speed/ratio)
        let mut compressed = Vec::new();
        brotli::BrotliCompress(
            &mut Cursor::new(ron_string.as_bytes()),
            &mut compressed,
            &brotli::enc::BrotliEncoderParams {
                quality: 6,
                lgwin: 22,
                ..Default::default()
            },
        )
        .map_err(|e| {
            PackError::IoError(io::Error::new(
                io::ErrorKind::Other,
                format!("brotli compression failed: {}", e),
            ))
        })?;

        fs::write(path, compressed)?;
        Ok(())
    }

    /// Number of entries in the pack
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Logical paths of all entries (unordered)
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }
}

impl ResourceManager for PackFile {
    fn exists(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    fn open_read(&self, path: &str) -> io::Result<Stream> {
        self.entries
            .get(path)
            .map(|bytes| Stream::ReadOnly(Cursor::new(bytes.clone())))
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("no pack entry: {}", path))
            })
    }
}

/// Ordered mount table over several pack archives
///
/// Lookup walks packs in mount order; the first pack containing the path
/// serves it, so earlier mounts shadow later ones.
#[derive(Debug, Default)]
pub struct PackMounts {
    packs: Vec<PackFile>,
}

impl PackMounts {
    pub fn new() -> Self {
        Self { packs: Vec::new() }
    }

    /// Mount a pack at the end of the table
    pub fn mount(&mut self, pack: PackFile) {
        self.packs.push(pack);
    }

    /// Number of mounted packs
    pub fn pack_count(&self) -> usize {
        self.packs.len()
    }
}

impl ResourceManager for PackMounts {
    fn exists(&self, path: &str) -> bool {
        self.packs.iter().any(|pack| pack.exists(path))
    }

    fn open_read(&self, path: &str) -> io::Result<Stream> {
        for pack in &self.packs {
            if pack.exists(path) {
                return pack.open_read(path);
            }
        }
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no pack entry: {}", path),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_pack() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("assets.pack");

        let pack = PackFile::from_entries([
            ("assets/tex.png", b"fake png".to_vec()),
            ("levels/one.lvl", vec![0u8, 1, 2, 255]),
        ]);
        pack.save(&path).unwrap();

        let loaded = PackFile::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.exists("assets/tex.png"));

        let mut stream = loaded.open_read("levels/one.lvl").unwrap();
        let mut contents = Vec::new();
        stream.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, vec![0u8, 1, 2, 255]);
    }

    #[test]
    fn test_load_plain_ron_manifest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dev.pack");

        // "hi" is aGk= in base64
        let manifest = r#"(
  version: 1,
  entries: [
    (path: "readme.txt", data: "aGk="),
  ],
)"#;
        std::fs::write(&path, manifest).unwrap();

        let pack = PackFile::load(&path).unwrap();
        assert!(pack.exists("readme.txt"));

        let mut stream = pack.open_read("readme.txt").unwrap();
        let mut contents = String::new();
        stream.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "hi");
    }

    #[test]
    fn test_invalid_base64_is_decode_error() {
        let manifest = r#"(
  version: 1,
  entries: [
    (path: "bad.bin", data: "!!not base64!!"),
  ],
)"#;
        let result = PackFile::from_manifest_str(manifest);
        assert!(matches!(result, Err(PackError::DecodeError(_))));
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let manifest = "(version: 99, entries: [])";
        let result = PackFile::from_manifest_str(manifest);
        assert!(matches!(result, Err(PackError::UnsupportedVersion(99))));
    }

    #[test]
    fn test_missing_entry_is_not_found() {
        let pack = PackFile::new();
        assert!(!pack.exists("ghost.dat"));
        let err = pack.open_read("ghost.dat").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_mount_order_shadows() {
        let mut mounts = PackMounts::new();
        mounts.mount(PackFile::from_entries([("shared.dat", b"patch".to_vec())]));
        mounts.mount(PackFile::from_entries([
            ("shared.dat", b"base".to_vec()),
            ("only_base.dat", b"x".to_vec()),
        ]));

        assert!(mounts.exists("only_base.dat"));

        let mut stream = mounts.open_read("shared.dat").unwrap();
        let mut contents = String::new();
        stream.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "patch");
    }
}
