use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::*;
use crate::metainfo::TorrentBuilder;

fn multi_file() -> Metainfo {
    let data = TorrentBuilder::new("Release")
        .piece_length(16)
        .add_file("disc1/a.bin", vec![1; 20])
        .add_file("b.bin", vec![2; 10])
        .build()
        .unwrap();
    Metainfo::from_bytes(&data).unwrap()
}

fn single_file() -> Metainfo {
    let data = TorrentBuilder::new("movie.mkv")
        .piece_length(16)
        .add_file("movie.mkv", vec![3; 40])
        .build()
        .unwrap();
    Metainfo::from_bytes(&data).unwrap()
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap()
}

#[test]
fn test_single_file_requires_force() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("movie.mkv");
    std::fs::write(&file, [3; 40]).unwrap();

    let err = resolve_placement(&single_file(), &file, &PlacementOptions::default()).unwrap_err();
    assert!(matches!(err, PlacementError::SingleFileNotForced(_)));

    let placement = resolve_placement(
        &single_file(),
        &file,
        &PlacementOptions::default().force(true),
    )
    .unwrap();
    assert_eq!(placement.strip_components, 0);
    assert_eq!(placement.store_dir, canonical(temp.path()));
    assert_eq!(placement.store_path, canonical(temp.path()).join(".nx_store"));
}

#[test]
fn test_single_file_from_directory() {
    let temp = TempDir::new().unwrap();
    let placement = resolve_placement(
        &single_file(),
        temp.path(),
        &PlacementOptions::default().force(true),
    )
    .unwrap();
    assert_eq!(placement.store_dir, canonical(temp.path()));
    assert_eq!(placement.strip_components, 0);
}

#[test]
fn test_multi_file_default_strip() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("renamed");
    std::fs::create_dir(&source).unwrap();

    let placement =
        resolve_placement(&multi_file(), &source, &PlacementOptions::default()).unwrap();
    assert_eq!(placement.store_dir, canonical(&source));
    assert_eq!(placement.strip_components, 1);
}

#[test]
fn test_auto_strip_source_is_root() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("Release");
    std::fs::create_dir(&root).unwrap();

    let placement = resolve_placement(&multi_file(), &root, &PlacementOptions::default()).unwrap();
    assert_eq!(placement.store_dir, canonical(&root));
    assert_eq!(placement.strip_components, 1);
}

#[test]
fn test_auto_strip_source_inside_root() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("Release");
    let inner = root.join("disc1");
    std::fs::create_dir_all(&inner).unwrap();

    let placement =
        resolve_placement(&multi_file(), &inner, &PlacementOptions::default()).unwrap();
    assert_eq!(placement.store_dir, canonical(&root));
    assert_eq!(placement.strip_components, 1);

    let disabled = resolve_placement(
        &multi_file(),
        &inner,
        &PlacementOptions::default().auto_strip_root(false),
    )
    .unwrap();
    assert_eq!(disabled.store_dir, canonical(&inner));
    assert_eq!(disabled.strip_components, 1);
}

#[test]
fn test_auto_strip_source_contains_root() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("Release");
    std::fs::create_dir(&root).unwrap();

    let placement =
        resolve_placement(&multi_file(), temp.path(), &PlacementOptions::default()).unwrap();
    assert_eq!(placement.store_dir, canonical(&root));
    assert_eq!(placement.store_path, canonical(&root).join(".nx_store"));
    assert_eq!(placement.strip_components, 1);
}

#[test]
fn test_auto_strip_search_depth() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("Release");

    let near = root.join("a/b/c");
    std::fs::create_dir_all(&near).unwrap();
    let placement = resolve_placement(&multi_file(), &near, &PlacementOptions::default()).unwrap();
    assert_eq!(placement.store_dir, canonical(&root));

    // Five levels below the root is past the search depth.
    let far = root.join("a/b/c/d/e");
    std::fs::create_dir_all(&far).unwrap();
    let placement = resolve_placement(&multi_file(), &far, &PlacementOptions::default()).unwrap();
    assert_eq!(placement.store_dir, canonical(&far));
    assert_eq!(placement.strip_components, 1);
}

#[test]
fn test_single_file_forced_with_other_name() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("renamed.mkv");
    std::fs::write(&file, [3; 40]).unwrap();

    let placement = resolve_placement(
        &single_file(),
        &file,
        &PlacementOptions::default().force(true),
    )
    .unwrap();
    assert_eq!(placement.store_dir, canonical(temp.path()));
    assert_eq!(placement.strip_components, 0);
}

#[test]
fn test_explicit_strip() {
    let temp = TempDir::new().unwrap();

    let placement = resolve_placement(
        &multi_file(),
        temp.path(),
        &PlacementOptions::default().strip_components(0),
    )
    .unwrap();
    assert_eq!(placement.store_dir, canonical(temp.path()));
    assert_eq!(placement.strip_components, 0);

    // Release/b.bin has only two components.
    let err = resolve_placement(
        &multi_file(),
        temp.path(),
        &PlacementOptions::default().strip_components(2),
    );
    assert!(matches!(err, Err(PlacementError::StripTooDeep { strip: 2, .. })));

    let conflicting = PlacementOptions {
        strip_components: Some(1),
        ..PlacementOptions::default()
    };
    assert!(matches!(
        resolve_placement(&multi_file(), temp.path(), &conflicting),
        Err(PlacementError::ConflictingStripOptions)
    ));
}

#[test]
fn test_source_errors() {
    let temp = TempDir::new().unwrap();

    let missing = temp.path().join("missing");
    assert!(matches!(
        resolve_placement(&multi_file(), &missing, &PlacementOptions::default()),
        Err(PlacementError::SourceNotFound(p)) if p == missing
    ));

    let file = temp.path().join("file");
    std::fs::write(&file, b"x").unwrap();
    assert!(matches!(
        resolve_placement(&multi_file(), &file, &PlacementOptions::default()),
        Err(PlacementError::NotADirectory(_))
    ));
}

#[test]
fn test_custom_store_name() {
    let temp = TempDir::new().unwrap();
    let options = PlacementOptions {
        store_file_name: ".release_store".to_string(),
        ..PlacementOptions::default()
    };

    let placement = resolve_placement(&multi_file(), temp.path(), &options).unwrap();
    assert_eq!(placement.store_path.file_name().unwrap(), ".release_store");
}

#[test]
fn test_strip_path() {
    let path = Path::new("Release/disc1/a.bin");
    assert_eq!(strip_path(path, 0).unwrap(), PathBuf::from("Release/disc1/a.bin"));
    assert_eq!(strip_path(path, 1).unwrap(), PathBuf::from("disc1/a.bin"));
    assert_eq!(strip_path(path, 2).unwrap(), PathBuf::from("a.bin"));
    assert!(strip_path(path, 3).is_none());
}
