use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::errors::{ImportError, Result};

/// A readable, seekable byte stream.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// Byte-stream provider the importer reads every file through.
pub trait AssetReader: Send + Sync {
    /// Opens `path` for reading.
    fn open(&self, path: &Path) -> Result<Box<dyn ReadSeek>>;

    /// Reads the whole file at `path`.
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        let mut stream = self.open(path)?;
        let mut bytes = Vec::new();
        stream
            .read_to_end(&mut bytes)
            .map_err(|e| ImportError::io(format!("reading {}", path.display()), e))?;
        Ok(bytes)
    }
}

/// Local file reader
pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl AssetReader for FileAssetReader {
    fn open(&self, path: &Path) -> Result<Box<dyn ReadSeek>> {
        let full = self.root_path.join(path);
        let file = std::fs::File::open(&full)
            .map_err(|e| ImportError::io(format!("opening {}", full.display()), e))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// In-memory reader, keyed by normalized relative path.
#[derive(Default)]
pub struct MemoryAssetReader {
    files: RwLock<FxHashMap<PathBuf, Arc<[u8]>>>,
}

impl MemoryAssetReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn insert(&self, path: impl AsRef<Path>, bytes: impl Into<Arc<[u8]>>) {
        self.files
            .write()
            .insert(normalize_path(path.as_ref()), bytes.into());
    }

    #[must_use]
    pub fn with_file(self, path: impl AsRef<Path>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(path, bytes);
        self
    }

    #[must_use]
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.files.read().contains_key(&normalize_path(path.as_ref()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl AssetReader for MemoryAssetReader {
    fn open(&self, path: &Path) -> Result<Box<dyn ReadSeek>> {
        let key = normalize_path(path);
        let bytes = self.files.read().get(&key).cloned().ok_or_else(|| {
            ImportError::io(
                format!("opening {}", path.display()),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such in-memory file"),
            )
        })?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}

/// Resolves `.` and `..` lexically.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Reads the target of a URI found inside a source file.
///
/// `data:` URIs are decoded in place (base64 payloads only); anything else is
/// a path relative to `base`, opened through `reader`.
pub fn read_uri(reader: &dyn AssetReader, base: &Path, uri: &str) -> Result<Vec<u8>> {
    if let Some(rest) = uri.strip_prefix("data:") {
        let Some((_, payload)) = rest.split_once(";base64,") else {
            return Err(ImportError::format(format!(
                "unsupported data URI (only base64 is accepted): {}",
                truncate(uri, 48)
            )));
        };
        return Ok(base64::engine::general_purpose::STANDARD.decode(payload)?);
    }
    reader.read_bytes(&base.join(uri))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_relative_segments() {
        assert_eq!(normalize_path(Path::new("./a/../b/c.bin")), PathBuf::from("b/c.bin"));
    }

    #[test]
    fn memory_reader_resolves_normalized_paths() {
        let reader = MemoryAssetReader::new().with_file("models/a.bin", vec![1u8, 2, 3]);
        let bytes = reader.read_bytes(Path::new("models/./a.bin")).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        assert!(reader.read_bytes(Path::new("missing.bin")).is_err());
    }

    #[test]
    fn data_uri_is_decoded_without_reader() {
        let reader = MemoryAssetReader::new();
        let bytes = read_uri(&reader, Path::new(""), "data:application/octet-stream;base64,AQID").unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }
}
