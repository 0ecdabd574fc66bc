use std::path::Path;

use chrono::{SubsecRound, Utc};
use sha1::{Digest, Sha1};

use super::error::VerifyError;
use super::file_map::FileMap;
use super::reader::{HandleCache, SpanRead};
use super::report::{FileReport, Status, VerificationReport};
use crate::config::Config;
use crate::metainfo::{Info, Metainfo};
use crate::store::TorrentEntry;

/// Verifies a store entry against the files under `store_dir`.
///
/// The entry's `strip_components` maps torrent paths onto the directory.
/// The entry itself is not modified; apply the report with
/// [`TorrentEntry::record_verification`].
pub async fn verify(
    entry: &TorrentEntry,
    store_dir: &Path,
    config: &Config,
) -> Result<VerificationReport, VerifyError> {
    let metainfo = entry.metainfo()?;
    verify_torrent(&metainfo, store_dir, entry.strip_components(), config).await
}

/// Hashes every piece of `metainfo` from the files under `base`.
pub async fn verify_torrent(
    metainfo: &Metainfo,
    base: &Path,
    strip: usize,
    config: &Config,
) -> Result<VerificationReport, VerifyError> {
    let config = config.clone().normalized();
    let info = &metainfo.info;
    let map = FileMap::new(metainfo, base, strip)?;
    let cache = HandleCache::new(&map, config.max_open_files);

    let piece_count = info.piece_count();
    tracing::debug!(
        id = %metainfo.info_hash,
        pieces = piece_count,
        files = map.files().len(),
        base = %base.display(),
        "verifying"
    );

    let mut pieces = Vec::with_capacity(piece_count);
    for batch_start in (0..piece_count).step_by(config.verify_concurrency) {
        let batch_end = (batch_start + config.verify_concurrency).min(piece_count);
        let batch = (batch_start..batch_end)
            .map(|index| verify_piece(info, &map, &cache, index, config.read_chunk_size));

        for status in futures::future::join_all(batch).await {
            pieces.push(status?);
        }
    }

    let mut file_status = vec![Status::Match; map.files().len()];
    let mut bad_pieces = Vec::new();
    let mut bad_bytes = 0u64;
    for (index, &status) in pieces.iter().enumerate() {
        let range = info.piece_range(index);
        if status != Status::Match {
            bad_pieces.push(index);
            bad_bytes += range.end - range.start;
        }
        for file_index in map.files_in(range) {
            file_status[file_index] = file_status[file_index].worst(status);
        }
    }

    let mut files = Vec::with_capacity(map.files().len());
    for (index, file) in map.files().iter().enumerate() {
        let Some(disk_path) = &file.disk_path else {
            continue;
        };
        if file.length == 0 && !cache.is_present(index).await? {
            file_status[index] = Status::MissingData;
        }
        files.push(FileReport {
            path: file.torrent_path.clone(),
            disk_path: disk_path.clone(),
            length: file.length,
            status: file_status[index],
        });
    }
    drop(cache);

    let status = pieces
        .iter()
        .chain(files.iter().map(|f| &f.status))
        .fold(Status::Match, |acc, &s| acc.worst(s));

    let report = VerificationReport {
        id: metainfo.info_hash,
        status,
        pieces,
        files,
        bad_pieces,
        bad_bytes,
        total_bytes: info.total_length,
        checked_at: Utc::now().trunc_subsecs(0),
    };

    tracing::info!(
        id = %report.id,
        status = %report.status,
        bad_pieces = report.bad_pieces.len(),
        bad_bytes = report.bad_bytes,
        total_bytes = report.total_bytes,
        "verification finished"
    );
    Ok(report)
}

async fn verify_piece(
    info: &Info,
    map: &FileMap,
    cache: &HandleCache<'_>,
    index: usize,
    chunk_size: usize,
) -> Result<Status, VerifyError> {
    let range = info.piece_range(index);
    let piece_len = (range.end - range.start) as usize;
    let mut buf = vec![0u8; chunk_size.min(piece_len).max(1)];
    let mut hasher = Sha1::new();

    for span in map.spans(range) {
        if cache.hash_span(&span, &mut hasher, &mut buf).await? == SpanRead::Missing {
            tracing::trace!(piece = index, file_index = span.file_index, "missing data");
            return Ok(Status::MissingData);
        }
    }

    let actual: [u8; 20] = hasher.finalize().into();
    let expected = &info.pieces[index];
    if &actual == expected {
        Ok(Status::Match)
    } else {
        tracing::warn!(
            piece = index,
            expected = %hex::encode(expected),
            actual = %hex::encode(actual),
            "piece hash mismatch"
        );
        Ok(Status::Mismatch)
    }
}
