//! File-backed storage

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::debug;

use super::{CartStorage, DEFAULT_QUOTA_BYTES, StorageError, entry_size};

const TEMP_PREFIX: &str = ".tmp-";
const ESCAPED_DOT: &str = "%2E";

/// Key/value store keeping one file per key inside a directory.
///
/// Keys are percent-encoded into file names, so any string is a valid key.
/// Writes go through a temporary file and a rename, so a failed write never
/// leaves a truncated value behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    quota: u64,
}

impl FileStorage {
    /// Opens (creating if needed) a store rooted at `root` with the default quota.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Self::with_quota(root, DEFAULT_QUOTA_BYTES)
    }

    /// Opens (creating if needed) a store rooted at `root` limited to `quota` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn with_quota(root: impl Into<PathBuf>, quota: u64) -> Result<Self, StorageError> {
        let root = root.into();

        fs::create_dir_all(&root)?;

        Ok(Self { root, quota })
    }

    /// Directory holding the entries.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configured quota in bytes.
    pub fn quota(&self) -> u64 {
        self.quota
    }

    /// Bytes currently used, counted as key length plus file size per entry.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be read.
    pub fn used_bytes(&self) -> Result<u64, StorageError> {
        let mut used = 0_u64;

        for (key, path) in self.entries()? {
            used = used.saturating_add(stored_size(&key, &path)?);
        }

        Ok(used)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(encode_key(key))
    }

    fn entries(&self) -> Result<Vec<(String, PathBuf)>, StorageError> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;

            if !entry.file_type()?.is_file() {
                continue;
            }

            let file_name = entry.file_name();

            let Some(key) = file_name.to_str().and_then(decode_key) else {
                debug!(file = ?file_name, "skipping unrecognised file in storage directory");
                continue;
            };

            entries.push((key, entry.path()));
        }

        Ok(entries)
    }
}

impl CartStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);

        let existing = match fs::metadata(&path) {
            Ok(_) => stored_size(key, &path)?,
            Err(error) if error.kind() == io::ErrorKind::NotFound => 0,
            Err(error) => return Err(error.into()),
        };

        let required = self
            .used_bytes()?
            .saturating_sub(existing)
            .saturating_add(entry_size(key, value));

        if required > self.quota {
            return Err(StorageError::QuotaExceeded {
                required,
                quota: self.quota,
            });
        }

        let temp = self.root.join(format!("{TEMP_PREFIX}{}", encode_key(key)));

        if let Err(error) = fs::write(&temp, value).and_then(|()| fs::rename(&temp, &path)) {
            discard_temp(&temp);

            // A full disk is quota exhaustion as far as callers are concerned.
            if error.kind() == io::ErrorKind::StorageFull {
                return Err(StorageError::QuotaExceeded {
                    required,
                    quota: self.quota,
                });
            }

            return Err(error.into());
        }

        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self.entries()?.into_iter().map(|(key, _)| key).collect();

        keys.sort();

        Ok(keys)
    }
}

fn discard_temp(temp: &Path) {
    match fs::remove_file(temp) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => debug!(%error, path = ?temp, "failed to remove temporary storage file"),
    }
}

fn stored_size(key: &str, path: &Path) -> Result<u64, StorageError> {
    let key_len = u64::try_from(key.len()).unwrap_or(u64::MAX);

    Ok(key_len.saturating_add(fs::metadata(path)?.len()))
}

/// Percent-encodes a key into a file name.
///
/// A leading `.` is escaped too, so encoded names never collide with temp
/// files and are never `.` or `..`.
fn encode_key(key: &str) -> String {
    let encoded = urlencoding::encode(key);

    match encoded.strip_prefix('.') {
        Some(rest) => format!("{ESCAPED_DOT}{rest}"),
        None => encoded.into_owned(),
    }
}

/// Reverses [`encode_key`]. Returns `None` for names it could not have produced.
fn decode_key(name: &str) -> Option<String> {
    if name.is_empty() || name.starts_with('.') {
        return None;
    }

    let decoded = urlencoding::decode(name).ok()?.into_owned();

    (encode_key(&decoded) == name).then_some(decoded)
}
