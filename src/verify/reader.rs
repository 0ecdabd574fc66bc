use std::io::{self, SeekFrom};
use std::sync::Arc;
use std::time::Instant;

use dashmap::{DashMap, DashSet};
use sha1::{Digest, Sha1};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::Mutex as TokioMutex;

use super::error::{is_access_error, VerifyError};
use super::file_map::{FileMap, FileSpan};

struct FileHandle {
    file: TokioMutex<File>,
    last_used: parking_lot::Mutex<Instant>,
    len: u64,
}

/// Whether a span could be hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SpanRead {
    Complete,
    Missing,
}

/// Read handles for one verification.
///
/// At most `max_open` files stay open; the least recently used handle is
/// closed to make room. Files that turned out to be absent are remembered so
/// they are only looked up once. Everything is closed when the cache drops.
pub(super) struct HandleCache<'a> {
    map: &'a FileMap,
    handles: DashMap<usize, Arc<FileHandle>>,
    missing: DashSet<usize>,
    max_open: usize,
}

impl<'a> HandleCache<'a> {
    pub(super) fn new(map: &'a FileMap, max_open: usize) -> Self {
        Self {
            map,
            handles: DashMap::new(),
            missing: DashSet::new(),
            max_open: max_open.max(1),
        }
    }

    /// Returns `true` if the file exists as a regular file.
    pub(super) async fn is_present(&self, file_index: usize) -> Result<bool, VerifyError> {
        Ok(self.get_or_open(file_index).await?.is_some())
    }

    async fn get_or_open(&self, file_index: usize) -> Result<Option<Arc<FileHandle>>, VerifyError> {
        if let Some(handle) = self.handles.get(&file_index) {
            *handle.last_used.lock() = Instant::now();
            return Ok(Some(handle.clone()));
        }
        if self.missing.contains(&file_index) {
            return Ok(None);
        }

        let Some(path) = self.map.file(file_index).and_then(|f| f.disk_path.as_ref()) else {
            return Ok(None);
        };

        let opened = match File::open(path).await {
            Ok(file) => match file.metadata().await {
                Ok(meta) if meta.is_file() => Some((file, meta.len())),
                Ok(_) => None,
                Err(e) => return Err(e.into()),
            },
            Err(e) if is_access_error(&e) => {
                return Err(VerifyError::FileAccess {
                    path: path.clone(),
                    source: e,
                });
            }
            Err(_) => None,
        };

        let Some((file, len)) = opened else {
            tracing::debug!(path = %path.display(), "file missing");
            self.missing.insert(file_index);
            return Ok(None);
        };

        if self.handles.len() >= self.max_open {
            self.evict_lru();
        }

        let handle = Arc::new(FileHandle {
            file: TokioMutex::new(file),
            last_used: parking_lot::Mutex::new(Instant::now()),
            len,
        });
        self.handles.insert(file_index, handle.clone());
        Ok(Some(handle))
    }

    fn evict_lru(&self) {
        let oldest = self
            .handles
            .iter()
            .min_by_key(|r| *r.last_used.lock())
            .map(|r| *r.key());

        if let Some(idx) = oldest {
            self.handles.remove(&idx);
            tracing::trace!(file_index = idx, "closed idle handle");
        }
    }

    /// Feeds the bytes of `span` into `hasher`, `buf.len()` bytes at a time.
    ///
    /// Padding files contribute zeros without touching the disk.
    pub(super) async fn hash_span(
        &self,
        span: &FileSpan,
        hasher: &mut Sha1,
        buf: &mut [u8],
    ) -> Result<SpanRead, VerifyError> {
        let padding = self.map.file(span.file_index).is_some_and(|f| f.padding);
        if padding {
            let zeros = [0u8; 4096];
            let mut remaining = span.length;
            while remaining > 0 {
                let take = remaining.min(zeros.len() as u64) as usize;
                hasher.update(&zeros[..take]);
                remaining -= take as u64;
            }
            return Ok(SpanRead::Complete);
        }

        let Some(handle) = self.get_or_open(span.file_index).await? else {
            return Ok(SpanRead::Missing);
        };
        if span.file_offset + span.length > handle.len {
            return Ok(SpanRead::Missing);
        }

        // Seek and reads must not interleave with another piece on this file.
        let mut file = handle.file.lock().await;
        file.seek(SeekFrom::Start(span.file_offset)).await?;

        let mut remaining = span.length;
        while remaining > 0 {
            let take = remaining.min(buf.len() as u64) as usize;
            match file.read_exact(&mut buf[..take]).await {
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Ok(SpanRead::Missing);
                }
                Err(e) => return Err(e.into()),
            }
            hasher.update(&buf[..take]);
            remaining -= take as u64;
        }

        Ok(SpanRead::Complete)
    }
}
