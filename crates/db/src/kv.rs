//! File-backed [`KeyValueStore`]: one file per key under a directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use studio_core::source::{KeyValueStore, SourceError};

/// Longest encoded key used verbatim as a file name stem.
const MAX_STEM_LEN: usize = 200;

/// Durable key-value storage in a local directory.
///
/// Writes go to a temporary file which is then renamed over the target, so
/// a reader never observes a half-written value.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

/// File name stem for `key`: the encoded key, or a digest when that is too long.
///
/// `~` never survives encoding, so digest stems cannot collide with encoded ones.
fn file_stem(key: &str) -> String {
    let encoded = encode_key(key);
    if encoded.len() <= MAX_STEM_LEN {
        encoded
    } else {
        let hash = Sha256::digest(key.as_bytes());
        format!("~{hash:x}")
    }
}

/// Percent-encode anything outside `[A-Za-z0-9_-]` so keys map to safe file names.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn io_error(path: &Path, err: std::io::Error) -> SourceError {
    SourceError::Unavailable(format!("{}: {err}", path.display()))
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, SourceError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SourceError> {
        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error(&path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path());
        assert_eq!(store.get("catalog_votes").unwrap(), None);
    }

    #[test]
    fn set_then_get_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("nested"));
        store.set("catalog_votes", "{\"counts\":{}}").unwrap();
        assert_eq!(
            store.get("catalog_votes").unwrap().as_deref(),
            Some("{\"counts\":{}}")
        );
        store.set("catalog_votes", "{}").unwrap();
        assert_eq!(store.get("catalog_votes").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn keys_are_encoded_as_safe_file_names() {
        assert_eq!(encode_key("client-a:catalog_votes"), "client-a%3Acatalog_votes");
        assert_eq!(encode_key("../etc"), "%2E%2E%2Fetc");
    }

    #[test]
    fn long_keys_get_short_stable_file_names() {
        let key = format!("{}:catalog_votes", "%".repeat(128));
        let stem = file_stem(&key);
        assert_eq!(stem.len(), 65);
        assert!(stem.starts_with('~'));
        assert_eq!(stem, file_stem(&key));
        assert_ne!(stem, file_stem(&format!("{}:catalog_comments", "%".repeat(128))));
        assert_eq!(file_stem("catalog_votes"), "catalog_votes");
    }

    #[test]
    fn long_keys_are_stored() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path());
        let key = format!("{}:catalog_votes", "/".repeat(128));
        store.set(&key, "{}").unwrap();
        assert_eq!(store.get(&key).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn namespaced_keys_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path());
        store.set("a:b", "one").unwrap();
        store.set("a_b", "two").unwrap();
        assert_eq!(store.get("a:b").unwrap().as_deref(), Some("one"));
        assert_eq!(store.get("a_b").unwrap().as_deref(), Some("two"));
    }
}
