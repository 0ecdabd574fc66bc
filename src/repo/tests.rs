use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::*;
use crate::metainfo::TorrentBuilder;
use crate::verify::Status;

fn release_torrent(name: &str, seed: u8) -> Vec<u8> {
    TorrentBuilder::new(name)
        .piece_length(16)
        .add_file("a.bin", vec![seed; 40])
        .add_file("sub/b.bin", vec![seed.wrapping_add(1); 24])
        .build()
        .unwrap()
}

fn write_release(dir: &Path, seed: u8) {
    std::fs::create_dir_all(dir.join("sub")).unwrap();
    std::fs::write(dir.join("a.bin"), vec![seed; 40]).unwrap();
    std::fs::write(dir.join("sub/b.bin"), vec![seed.wrapping_add(1); 24]).unwrap();
}

fn release_dir(temp: &TempDir) -> PathBuf {
    let dir = temp.path().join("Release");
    write_release(&dir, 1);
    dir
}

fn no_verify() -> Config {
    Config {
        verify_on_add: false,
        ..Config::default()
    }
}

#[tokio::test]
async fn test_add_creates_store_and_verifies() {
    let temp = TempDir::new().unwrap();
    let dir = release_dir(&temp);

    let added = add(
        &Config::default(),
        release_torrent("Release", 1),
        &dir,
        &PlacementOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(added.upsert, Upsert::Inserted);
    assert_eq!(added.strip_components, 1);
    assert_eq!(added.store_path, dir.canonicalize().unwrap().join(".nx_store"));
    assert_eq!(added.report.as_ref().unwrap().status, Status::Match);

    let store = Store::load(&added.store_path).unwrap();
    let entry = store.get(&added.id).unwrap().as_torrent().unwrap();
    assert!(entry.is_ready());
    assert_eq!(entry.strip_components(), 1);
    assert_eq!(
        entry.nx.internal.last_verified.unwrap().status,
        Status::Match
    );
}

#[tokio::test]
async fn test_add_without_data() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("Release");
    std::fs::create_dir(&dir).unwrap();

    let added = add(
        &Config::default(),
        release_torrent("Release", 1),
        &dir,
        &PlacementOptions::default(),
    )
    .await
    .unwrap();

    assert!(added.report.is_none());
    let store = Store::load(&added.store_path).unwrap();
    let entry = store.get(&added.id).unwrap().as_torrent().unwrap();
    assert!(!entry.is_ready());
    assert!(entry.nx.internal.last_verified.is_none());
}

#[tokio::test]
async fn test_add_single_file() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("movie.mkv");
    std::fs::write(&file, vec![5u8; 50]).unwrap();
    let torrent = TorrentBuilder::new("movie.mkv")
        .piece_length(16)
        .add_file("movie.mkv", vec![5u8; 50])
        .build()
        .unwrap();

    let err = add(
        &Config::default(),
        torrent.clone(),
        &file,
        &PlacementOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        Error::Placement(PlacementError::SingleFileNotForced(_))
    ));
    assert!(!temp.path().join(".nx_store").exists());

    let added = add(
        &Config::default(),
        torrent,
        &file,
        &PlacementOptions::default().force(true),
    )
    .await
    .unwrap();
    assert_eq!(added.strip_components, 0);
    assert_eq!(
        added.store_path,
        temp.path().canonicalize().unwrap().join(".nx_store")
    );
    assert_eq!(added.report.unwrap().status, Status::Match);
}

#[tokio::test]
async fn test_readd_rules() {
    let temp = TempDir::new().unwrap();
    let dir = release_dir(&temp);
    let torrent = release_torrent("Release", 1);

    let added = add(&no_verify(), torrent.clone(), &dir, &PlacementOptions::default())
        .await
        .unwrap();

    // Custom metadata survives a re-add of an entry that is not ready yet.
    let mut store = Store::load(&added.store_path).unwrap();
    store
        .get_mut(&added.id)
        .unwrap()
        .nx_mut()
        .custom
        .insert("note".to_string(), serde_json::json!("keep me"));
    store.save(&added.store_path).unwrap();

    let again = add(&no_verify(), torrent.clone(), &dir, &PlacementOptions::default())
        .await
        .unwrap();
    assert_eq!(again.upsert, Upsert::Replaced);
    let store = Store::load(&again.store_path).unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(&added.id).unwrap().nx().custom["note"], "keep me");

    let err = add(
        &no_verify(),
        torrent.clone(),
        &dir,
        &PlacementOptions::default().strip_components(0),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        Error::StripMismatch {
            existing: 1,
            requested: 0,
            ..
        }
    ));

    verify(&Config::default(), &added.store_path, &added.id.to_hex())
        .await
        .unwrap();
    let err = add(&no_verify(), torrent, &dir, &PlacementOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyReady(id) if id == added.id));
}

#[tokio::test]
async fn test_verify_records_outcome() {
    let temp = TempDir::new().unwrap();
    let dir = release_dir(&temp);
    let added = add(
        &Config::default(),
        release_torrent("Release", 1),
        &dir,
        &PlacementOptions::default(),
    )
    .await
    .unwrap();

    let path = dir.join("sub/b.bin");
    let mut data = std::fs::read(&path).unwrap();
    data[3] ^= 0x01;
    std::fs::write(&path, data).unwrap();

    let prefix = added.id.to_hex()[..6].to_lowercase();
    let report = verify(&Config::default(), &added.store_path, &prefix)
        .await
        .unwrap();
    assert_eq!(report.status, Status::Mismatch);
    // b.bin starts at byte 40; offset 3 is byte 43, in piece 2.
    assert_eq!(report.bad_pieces, vec![2]);

    let store = Store::load(&added.store_path).unwrap();
    let entry = store.get(&added.id).unwrap().as_torrent().unwrap();
    assert!(!entry.is_ready());
    let last = entry.nx.internal.last_verified.unwrap();
    assert_eq!(last.status, Status::Mismatch);
    assert_eq!(last.timestamp, report.checked_at);
}

#[tokio::test]
async fn test_verify_unknown_identifier() {
    let temp = TempDir::new().unwrap();
    let dir = release_dir(&temp);
    let added = add(
        &Config::default(),
        release_torrent("Release", 1),
        &dir,
        &PlacementOptions::default(),
    )
    .await
    .unwrap();

    let unused = if added.id.to_hex().starts_with('0') { "1" } else { "0" };
    let err = verify(&Config::default(), &added.store_path, unused)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::NotFound(_))));

    let err = verify(&Config::default(), temp.path().join("missing"), "00")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::Io(_))));
}

#[tokio::test]
async fn test_verify_all() {
    let temp = TempDir::new().unwrap();
    let dir = release_dir(&temp);

    let first = add(
        &Config::default(),
        release_torrent("Release", 1),
        &dir,
        &PlacementOptions::default(),
    )
    .await
    .unwrap();
    // Same layout, different content: this one never matches.
    let second = add(
        &Config::default(),
        release_torrent("Release", 9),
        &dir,
        &PlacementOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(first.store_path, second.store_path);

    let reports = verify_all(&Config::default(), &first.store_path)
        .await
        .unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].id, first.id);
    assert_eq!(reports[0].status, Status::Match);
    assert_eq!(reports[1].id, second.id);
    assert_eq!(reports[1].status, Status::Mismatch);

    let store = Store::load(&first.store_path).unwrap();
    let ready: Vec<bool> = store
        .iter()
        .map(|e| e.as_torrent().unwrap().is_ready())
        .collect();
    assert_eq!(ready, vec![true, false]);
}

#[tokio::test]
async fn test_custom_store_name() {
    let temp = TempDir::new().unwrap();
    let dir = release_dir(&temp);
    let config = Config {
        store_file_name: ".release_store".to_string(),
        ..Config::default()
    };

    let added = add(
        &config,
        release_torrent("Release", 1),
        &dir,
        &PlacementOptions::default(),
    )
    .await
    .unwrap();
    assert!(added.store_path.ends_with(".release_store"));
    assert!(added.store_path.exists());
}

#[tokio::test]
async fn test_invalid_torrent() {
    let temp = TempDir::new().unwrap();
    let err = add(
        &Config::default(),
        b"not a torrent".to_vec(),
        temp.path(),
        &PlacementOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Metainfo(_)));
}
