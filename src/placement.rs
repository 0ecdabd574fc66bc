//! Deciding where a store lives relative to a release.
//!
//! A multi-file torrent records paths that start with its root directory
//! (`Release/disc1/a.mkv`). When the store sits inside that directory, the
//! first component has to be dropped to find the files, so the default
//! `strip_components` is 1. A single-file torrent records just the file name;
//! its store sits next to the file with nothing stripped.
//!
//! Placing a store beside an arbitrary single file is easy to get wrong, so
//! it is refused unless the caller sets [`PlacementOptions::force`].
//!
//! # Examples
//!
//! ```
//! use nx::metainfo::{Metainfo, TorrentBuilder};
//! use nx::placement::{resolve_placement, PlacementOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! std::fs::create_dir(dir.path().join("Release"))?;
//!
//! let data = TorrentBuilder::new("Release")
//!     .add_file("a.bin", vec![0; 4])
//!     .add_file("b.bin", vec![1; 4])
//!     .build()?;
//! let metainfo = Metainfo::from_bytes(&data)?;
//!
//! // Pointing at the parent finds the release directory inside it.
//! let placement = resolve_placement(&metainfo, dir.path(), &PlacementOptions::default())?;
//! assert_eq!(placement.strip_components, 1);
//! assert!(placement.store_path.ends_with("Release/.nx_store"));
//! # Ok(())
//! # }
//! ```

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::constants::{ROOT_SEARCH_DEPTH, STORE_FILE_NAME};
use crate::metainfo::Metainfo;

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("source does not exist: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("refusing to place a store next to single file {} without force", .0.display())]
    SingleFileNotForced(PathBuf),

    #[error("an explicit strip depth cannot be combined with auto-strip-root")]
    ConflictingStripOptions,

    #[error("stripping {strip} components would remove all of {}", .path.display())]
    StripTooDeep { strip: usize, path: PathBuf },

    #[error("multi-file source is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementOptions {
    /// Allow a store next to a single-file torrent's target.
    pub force: bool,
    /// Detect whether the source already is, sits in, or contains the release root.
    /// The store always ends up inside the root.
    pub auto_strip_root: bool,
    /// Use this depth instead of computing one.
    pub strip_components: Option<usize>,
    pub store_file_name: String,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            force: false,
            auto_strip_root: true,
            strip_components: None,
            store_file_name: STORE_FILE_NAME.to_string(),
        }
    }
}

impl PlacementOptions {
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn auto_strip_root(mut self, enabled: bool) -> Self {
        self.auto_strip_root = enabled;
        self
    }

    /// Sets an explicit depth and turns off auto-strip-root.
    pub fn strip_components(mut self, strip: usize) -> Self {
        self.strip_components = Some(strip);
        self.auto_strip_root = false;
        self
    }
}

/// Where a store goes and how its torrent paths map onto disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Directory that holds the store; torrent paths resolve against it.
    pub store_dir: PathBuf,
    pub store_path: PathBuf,
    pub strip_components: usize,
}

/// Decides the store location and strip depth for `metainfo` added from `source`.
///
/// `source` is the release directory (or, for single-file torrents, the file
/// or the directory containing it). It is canonicalized first, so relative
/// paths and symlinks resolve the way the filesystem sees them.
pub fn resolve_placement(
    metainfo: &Metainfo,
    source: impl AsRef<Path>,
    options: &PlacementOptions,
) -> Result<Placement, PlacementError> {
    if options.strip_components.is_some() && options.auto_strip_root {
        return Err(PlacementError::ConflictingStripOptions);
    }

    let source = source.as_ref();
    let source = match source.canonicalize() {
        Ok(path) => path,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(PlacementError::SourceNotFound(source.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let (store_dir, strip) = if metainfo.is_multi_file() {
        place_multi_file(metainfo, source, options)?
    } else {
        place_single_file(metainfo, source, options)?
    };

    check_strip_depth(metainfo, strip)?;

    let store_path = store_dir.join(&options.store_file_name);
    tracing::info!(
        id = %metainfo.info_hash,
        store = %store_path.display(),
        strip,
        "resolved store placement"
    );

    Ok(Placement {
        store_dir,
        store_path,
        strip_components: strip,
    })
}

fn place_single_file(
    metainfo: &Metainfo,
    source: PathBuf,
    options: &PlacementOptions,
) -> Result<(PathBuf, usize), PlacementError> {
    if !options.force {
        return Err(PlacementError::SingleFileNotForced(source));
    }

    let name = metainfo.info.name.as_str();
    let dir = if source.is_dir() {
        source
    } else {
        if source.file_name().is_some_and(|n| n != name) {
            tracing::warn!(
                source = %source.display(),
                expected = name,
                "target file name differs from the torrent, verification will look for the torrent name"
            );
        }
        match source.parent() {
            Some(parent) => parent.to_path_buf(),
            None => return Err(PlacementError::NotADirectory(source)),
        }
    };

    Ok((dir, options.strip_components.unwrap_or(0)))
}

fn place_multi_file(
    metainfo: &Metainfo,
    source: PathBuf,
    options: &PlacementOptions,
) -> Result<(PathBuf, usize), PlacementError> {
    if !source.is_dir() {
        return Err(PlacementError::NotADirectory(source));
    }

    if let Some(strip) = options.strip_components {
        return Ok((source, strip));
    }

    if !options.auto_strip_root {
        return Ok((source, 1));
    }

    let root = metainfo
        .common_root()
        .unwrap_or(metainfo.info.name.as_str());

    if source.file_name().is_some_and(|n| n == root) {
        tracing::debug!(root, "source is the release root");
        return Ok((source, 1));
    }

    if let Some(ancestor) = source
        .ancestors()
        .skip(1)
        .take(ROOT_SEARCH_DEPTH)
        .find(|a| a.file_name().is_some_and(|n| n == root))
    {
        tracing::debug!(root, ancestor = %ancestor.display(), "source is inside the release root");
        return Ok((ancestor.to_path_buf(), 1));
    }

    let inner = source.join(root);
    if inner.is_dir() {
        tracing::debug!(root, "source contains the release root");
        return Ok((inner, 1));
    }

    Ok((source, 1))
}

fn check_strip_depth(metainfo: &Metainfo, strip: usize) -> Result<(), PlacementError> {
    for file in &metainfo.info.files {
        if strip_path(&file.path, strip).is_none() {
            return Err(PlacementError::StripTooDeep {
                strip,
                path: file.path.clone(),
            });
        }
    }
    Ok(())
}

/// Drops the first `strip` components of a torrent path.
///
/// Returns `None` if nothing would be left.
pub fn strip_path(path: &Path, strip: usize) -> Option<PathBuf> {
    let rest: PathBuf = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .skip(strip)
        .collect();

    if rest.as_os_str().is_empty() {
        None
    } else {
        Some(rest)
    }
}

#[cfg(test)]
mod tests;
