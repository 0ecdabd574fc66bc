use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use tempfile::NamedTempFile;

use super::collection::Store;
use super::entry::Entry;
use super::error::StoreError;
use crate::constants::STORE_MAGIC;

/// On-disk layout. Field order is the file order: magic, entries, checksum.
#[derive(Serialize)]
struct StoreFileRef<'a> {
    magic: &'a str,
    entries: &'a [Entry],
    checksum: &'a str,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StoreFile {
    magic: String,
    entries: Vec<Entry>,
    checksum: String,
}

#[derive(Deserialize)]
struct MagicProbe {
    magic: Option<String>,
}

impl Store {
    /// Loads and verifies a store file.
    ///
    /// The magic marker is checked before anything else, then the checksum,
    /// then every entry id against its torrent bytes. Any failure is reported
    /// and the file is left untouched.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] if the file cannot be read; a corruption error
    /// (see [`StoreError::is_corruption`]) if it is not a valid store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        load(path.as_ref(), true)
    }

    /// Like [`Store::load`], but a checksum mismatch is only logged.
    ///
    /// Meant for recovering a store that was edited by hand.
    pub fn load_unchecked(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        load(path.as_ref(), false)
    }

    /// Loads the store at `path`, or returns an empty store if there is none yet.
    ///
    /// # Errors
    ///
    /// [`StoreError::MissingParent`] if the directory that would hold the
    /// store does not exist, plus anything [`Store::load`] returns.
    pub fn open_or_default(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let parent = parent_dir(path);
        if !parent.is_dir() {
            return Err(StoreError::MissingParent(parent.to_path_buf()));
        }

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no store yet, starting empty");
            return Ok(Self::new());
        }

        Self::load(path)
    }

    /// Writes the store atomically.
    ///
    /// The data goes to a temporary file in the destination directory, is
    /// synced, and then renamed over `path`. The directory is synced after the
    /// rename. A failed save leaves the previous file as it was.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        self.validate()?;

        let checksum = self.checksum()?;
        let data = serde_json::to_vec(&StoreFileRef {
            magic: STORE_MAGIC,
            entries: &self.entries,
            checksum: &checksum,
        })?;

        let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        sync_dir(parent_dir(path))?;

        tracing::debug!(
            path = %path.display(),
            entries = self.entries.len(),
            checksum = %checksum,
            "saved store"
        );
        Ok(())
    }

    /// Uppercase hex SHA-1 over the serialized store with an empty checksum field.
    pub fn checksum(&self) -> Result<String, StoreError> {
        checksum_of(&self.entries)
    }
}

fn checksum_of(entries: &[Entry]) -> Result<String, StoreError> {
    let blanked = serde_json::to_vec(&StoreFileRef {
        magic: STORE_MAGIC,
        entries,
        checksum: "",
    })?;
    Ok(hex::encode_upper(Sha1::digest(&blanked)))
}

/// Returns the file bytes with the checksum value emptied, as they were hashed
/// when the file was saved.
fn blank_checksum(data: &[u8], checksum: &str) -> Option<Vec<u8>> {
    let needle = format!("\"checksum\":\"{checksum}\"");
    let needle = needle.as_bytes();
    let start = data.windows(needle.len()).rposition(|w| w == needle)?;

    let mut blanked = Vec::with_capacity(data.len());
    blanked.extend_from_slice(&data[..start]);
    blanked.extend_from_slice(br#""checksum":"""#);
    blanked.extend_from_slice(&data[start + needle.len()..]);
    Some(blanked)
}

fn load(path: &Path, verify_checksum: bool) -> Result<Store, StoreError> {
    let data = std::fs::read(path)?;

    let probe: MagicProbe = serde_json::from_slice(&data)?;
    if probe.magic.as_deref() != Some(STORE_MAGIC) {
        return Err(StoreError::InvalidMagic);
    }

    let file: StoreFile = serde_json::from_slice(&data)?;
    if file.magic != STORE_MAGIC {
        return Err(StoreError::InvalidMagic);
    }

    let actual = match blank_checksum(&data, &file.checksum) {
        Some(blanked) => hex::encode_upper(Sha1::digest(&blanked)),
        None => checksum_of(&file.entries)?,
    };
    if actual != file.checksum {
        if verify_checksum {
            return Err(StoreError::ChecksumMismatch {
                expected: file.checksum,
                actual,
            });
        }
        tracing::warn!(
            path = %path.display(),
            expected = %file.checksum,
            actual = %actual,
            "ignoring checksum mismatch"
        );
    }

    let store = Store {
        entries: file.entries,
    };
    store.validate()?;

    tracing::debug!(path = %path.display(), entries = store.len(), "loaded store");
    Ok(store)
}

/// Makes a rename inside `dir` durable.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}
