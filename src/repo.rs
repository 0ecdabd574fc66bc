//! The add and verify workflows.
//!
//! These tie the pieces together the way a command-line front end uses
//! them: parse a torrent, decide where its store goes, record it, and later
//! re-hash the release and write the outcome back into the store.
//!
//! # Examples
//!
//! ```
//! use nx::config::Config;
//! use nx::metainfo::TorrentBuilder;
//! use nx::placement::PlacementOptions;
//! use nx::verify::Status;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! let release = dir.path().join("Release");
//! std::fs::create_dir(&release)?;
//! std::fs::write(release.join("a.bin"), [1u8; 40])?;
//! std::fs::write(release.join("b.bin"), [2u8; 24])?;
//!
//! let torrent = TorrentBuilder::new("Release")
//!     .piece_length(16)
//!     .add_file("a.bin", vec![1u8; 40])
//!     .add_file("b.bin", vec![2u8; 24])
//!     .build()?;
//!
//! let config = Config::default();
//! let added = nx::repo::add(&config, torrent, &release, &PlacementOptions::default()).await?;
//! assert_eq!(added.strip_components, 1);
//!
//! let report = nx::repo::verify(&config, &added.store_path, &added.id.to_hex()[..8]).await?;
//! assert_eq!(report.status, Status::Match);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;

use crate::config::Config;
use crate::metainfo::{InfoHash, Metainfo, MetainfoError};
use crate::placement::{resolve_placement, PlacementError, PlacementOptions};
use crate::store::{Entry, Store, StoreError, TorrentEntry, Upsert};
use crate::verify::{self, match_files, VerificationReport, VerifyError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Metainfo(#[from] MetainfoError),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    /// The torrent is already in the store with a different strip depth.
    #[error("entry {id} already uses strip depth {existing}, not {requested}")]
    StripMismatch {
        id: InfoHash,
        existing: usize,
        requested: usize,
    },

    #[error("entry {0} is already verified and ready")]
    AlreadyReady(InfoHash),
}

#[derive(Debug, Clone)]
pub struct AddOutcome {
    pub id: InfoHash,
    pub store_path: PathBuf,
    pub strip_components: usize,
    pub upsert: Upsert,
    /// Present when the release was hashed as part of the add.
    pub report: Option<VerificationReport>,
}

/// Adds a torrent to the store that belongs next to `source`.
///
/// The store is created if it does not exist. Re-adding a torrent keeps its
/// custom metadata. With [`Config::verify_on_add`], the release is hashed
/// right away when all of its files are present.
pub async fn add(
    config: &Config,
    torrent: impl Into<Bytes>,
    source: impl AsRef<Path>,
    options: &PlacementOptions,
) -> Result<AddOutcome, Error> {
    let torrent = torrent.into();
    let metainfo = Metainfo::from_bytes(&torrent)?;
    let id = metainfo.info_hash;

    let options = PlacementOptions {
        store_file_name: config.store_file_name.clone(),
        ..options.clone()
    };
    let placement = resolve_placement(&metainfo, source, &options)?;
    let strip = placement.strip_components;

    let mut store = Store::open_or_default(&placement.store_path)?;
    let mut entry = TorrentEntry::new(&metainfo, torrent, strip);

    if let Some(Entry::Torrent(existing)) = store.get(&id) {
        if existing.strip_components() != strip {
            return Err(Error::StripMismatch {
                id,
                existing: existing.strip_components(),
                requested: strip,
            });
        }
        if existing.is_ready() {
            return Err(Error::AlreadyReady(id));
        }
        entry.nx.custom = existing.nx.custom.clone();
    }

    let mut report = None;
    if config.verify_on_add {
        let files = match_files(&metainfo, &placement.store_dir, strip)?;
        if files.is_complete() {
            let result = verify::verify(&entry, &placement.store_dir, config).await?;
            entry.record_verification(&result);
            report = Some(result);
        } else {
            tracing::info!(
                %id,
                missing = files.missing.len(),
                invalid = files.invalid.len(),
                "release incomplete, skipping verification"
            );
        }
    }

    let upsert = store.upsert(entry)?;
    store.save(&placement.store_path)?;

    tracing::info!(
        %id,
        name = %metainfo.info.name,
        store = %placement.store_path.display(),
        strip,
        ?upsert,
        "added torrent"
    );

    Ok(AddOutcome {
        id,
        store_path: placement.store_path,
        strip_components: strip,
        upsert,
        report,
    })
}

/// Verifies the entry matching `identifier` (an id or unique id prefix) and
/// records the outcome in the store.
pub async fn verify(
    config: &Config,
    store_path: impl AsRef<Path>,
    identifier: &str,
) -> Result<VerificationReport, Error> {
    let store_path = store_path.as_ref();
    let mut store = Store::load(store_path)?;
    let id = store.find(identifier)?.id();

    let report = verify_entry(&mut store, &id, store_dir(store_path), config).await?;
    store.save(store_path)?;
    Ok(report)
}

/// Verifies every entry in the store, in order, and saves once at the end.
pub async fn verify_all(
    config: &Config,
    store_path: impl AsRef<Path>,
) -> Result<Vec<VerificationReport>, Error> {
    let store_path = store_path.as_ref();
    let mut store = Store::load(store_path)?;
    let dir = store_dir(store_path);

    let ids: Vec<InfoHash> = store.iter().map(Entry::id).collect();
    let mut reports = Vec::with_capacity(ids.len());
    for id in &ids {
        reports.push(verify_entry(&mut store, id, dir, config).await?);
    }

    store.save(store_path)?;
    Ok(reports)
}

async fn verify_entry(
    store: &mut Store,
    id: &InfoHash,
    dir: &Path,
    config: &Config,
) -> Result<VerificationReport, Error> {
    let Some(Entry::Torrent(torrent)) = store.get_mut(id) else {
        return Err(StoreError::NotFound(id.to_hex()).into());
    };

    let report = verify::verify(torrent, dir, config).await?;
    torrent.record_verification(&report);
    Ok(report)
}

fn store_dir(store_path: &Path) -> &Path {
    match store_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests;
