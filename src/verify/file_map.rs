use std::ops::Range;
use std::path::{Component, Path, PathBuf};

use super::error::{is_access_error, VerifyError};
use crate::metainfo::Metainfo;
use crate::placement::strip_path;

/// A torrent file and where it lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedFile {
    /// Path as recorded in the torrent, root directory included.
    pub torrent_path: PathBuf,
    /// On-disk location; `None` for padding files, which are never read.
    pub disk_path: Option<PathBuf>,
    pub length: u64,
    /// Offset in the concatenated content.
    pub offset: u64,
    pub padding: bool,
}

impl MappedFile {
    pub fn byte_range(&self) -> Range<u64> {
        self.offset..self.offset + self.length
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSpan {
    pub file_index: usize,
    pub file_offset: u64,
    pub length: u64,
}

/// Prefix-sum index from content offsets to files.
#[derive(Debug, Clone)]
pub struct FileMap {
    files: Vec<MappedFile>,
    total_length: u64,
}

impl FileMap {
    /// Maps the files of `metainfo` under `base`, dropping `strip` leading
    /// components from each torrent path.
    pub fn new(metainfo: &Metainfo, base: &Path, strip: usize) -> Result<Self, VerifyError> {
        let mut files = Vec::with_capacity(metainfo.info.files.len());
        let mut offset = 0u64;

        for file in &metainfo.info.files {
            if file
                .path
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
            {
                return Err(VerifyError::PathTraversal(file.path.clone()));
            }

            let disk_path = if file.padding {
                None
            } else {
                let relative = strip_path(&file.path, strip).ok_or_else(|| {
                    VerifyError::StripTooDeep {
                        strip,
                        path: file.path.clone(),
                    }
                })?;
                Some(base.join(relative))
            };

            files.push(MappedFile {
                torrent_path: file.path.clone(),
                disk_path,
                length: file.length,
                offset,
                padding: file.padding,
            });
            offset += file.length;
        }

        Ok(Self {
            files,
            total_length: offset,
        })
    }

    pub fn files(&self) -> &[MappedFile] {
        &self.files
    }

    pub fn file(&self, index: usize) -> Option<&MappedFile> {
        self.files.get(index)
    }

    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    /// Splits a content range into per-file spans, in file order.
    ///
    /// Zero-length files never appear. The part of `range` past the end of
    /// the content is ignored.
    pub fn spans(&self, range: Range<u64>) -> Vec<FileSpan> {
        let end = range.end.min(self.total_length);
        let mut pos = range.start;
        let mut spans = Vec::new();

        let first = self.files.partition_point(|f| f.offset + f.length <= pos);
        for (file_index, file) in self.files.iter().enumerate().skip(first) {
            if pos >= end {
                break;
            }
            if file.length == 0 {
                continue;
            }

            let take = (file.offset + file.length).min(end) - pos;
            spans.push(FileSpan {
                file_index,
                file_offset: pos - file.offset,
                length: take,
            });
            pos += take;
        }

        spans
    }

    /// File indices whose data overlaps `range`.
    pub fn files_in(&self, range: Range<u64>) -> impl Iterator<Item = usize> + '_ {
        self.spans(range).into_iter().map(|s| s.file_index)
    }
}

/// Presence of a torrent's files on disk, without hashing anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMatch {
    /// Regular files with the expected length.
    pub found: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
    /// Present, but not a regular file or of the wrong length.
    pub invalid: Vec<PathBuf>,
}

impl FileMatch {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }
}

/// Checks which files of `metainfo` exist under `base`. Padding files are skipped.
pub fn match_files(metainfo: &Metainfo, base: &Path, strip: usize) -> Result<FileMatch, VerifyError> {
    let map = FileMap::new(metainfo, base, strip)?;
    let mut result = FileMatch::default();

    for file in map.files() {
        let Some(path) = &file.disk_path else {
            continue;
        };

        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() && meta.len() == file.length => {
                result.found.push(path.clone())
            }
            Ok(_) => result.invalid.push(path.clone()),
            Err(e) if is_access_error(&e) => {
                return Err(VerifyError::FileAccess {
                    path: path.clone(),
                    source: e,
                })
            }
            Err(_) => result.missing.push(path.clone()),
        }
    }

    tracing::debug!(
        id = %metainfo.info_hash,
        found = result.found.len(),
        missing = result.missing.len(),
        invalid = result.invalid.len(),
        "matched files"
    );
    Ok(result)
}
