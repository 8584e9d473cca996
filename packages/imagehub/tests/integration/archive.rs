use common::SourceType;
use imagehub::ImageHubError;
use imagehub::config::ImportConfig;
use imagehub::models::asset::{NewAssetMetadata, Upload};
use imagehub::models::source::NewSource;

use crate::common::{TestHub, build_zip};

#[tokio::test]
async fn archive_import_end_to_end() {
    let app = TestHub::spawn().await;
    let source = app.create_source("Archive").await;
    let manifest = br#"[
        {"filename": "img1.png", "title": "First", "tags": ["a", "b"]},
        {"filename": "nope.png", "title": "Ghost"}
    ]"#;
    let zip = build_zip(&[
        ("img1.png", b"one".as_slice()),
        ("img2.png", b"two".as_slice()),
        ("metadata.json", manifest.as_slice()),
    ]);

    let result = app.hub.import_archive(&zip, source, false).await.unwrap();

    assert_eq!(result.sync.created, vec!["/img1.png", "/img2.png"]);
    assert_eq!(result.metadata.manifests, vec!["/metadata.json"]);
    assert_eq!(result.metadata.applied, vec!["/img1.png"]);
    assert_eq!(result.metadata.unresolved.len(), 1);
    assert!(!result.is_clean());

    assert_eq!(app.asset_paths(source).await, vec!["/img1.png", "/img2.png"]);
    let first = app.asset_at(source, "/img1.png").await.unwrap();
    assert_eq!(first.title, "First");
    assert_eq!(first.tags, vec!["a", "b"]);
    assert!(app.scratch_entries(source).await.is_empty());
}

#[tokio::test]
async fn nested_directories_are_kept() {
    let app = TestHub::spawn().await;
    let source = app.create_source("Archive").await;
    let zip = build_zip(&[
        ("cats/", b"".as_slice()),
        ("cats/tabby.png", b"tabby".as_slice()),
        ("empty/", b"".as_slice()),
        ("__MACOSX/cats/._tabby.png", b"junk".as_slice()),
    ]);

    let result = app.hub.import_archive(&zip, source, false).await.unwrap();

    assert_eq!(result.sync.created, vec!["/cats/tabby.png"]);
    assert!(result.is_clean());
    assert_eq!(app.asset_paths(source).await, vec!["/cats/tabby.png"]);
    assert!(app.scratch_entries(source).await.is_empty());
}

#[tokio::test]
async fn reimporting_the_same_archive_changes_nothing() {
    let app = TestHub::spawn().await;
    let source = app.create_source("Archive").await;
    let zip = build_zip(&[("a.png", b"aaa".as_slice()), ("b.png", b"bbb".as_slice())]);

    app.hub.import_archive(&zip, source, false).await.unwrap();
    let second = app.hub.import_archive(&zip, source, false).await.unwrap();

    assert_eq!(second.sync.changed(), 0);
    assert_eq!(second.sync.unchanged, vec!["/a.png", "/b.png"]);
}

#[tokio::test]
async fn updated_archive_replaces_content_and_can_prune() {
    let app = TestHub::spawn().await;
    let source = app.create_source("Archive").await;
    app.hub
        .import_archive(
            &build_zip(&[("a.png", b"v1".as_slice()), ("b.png", b"bbb".as_slice())]),
            source,
            false,
        )
        .await
        .unwrap();
    let original = app.asset_at(source, "/a.png").await.unwrap();

    let result = app
        .hub
        .import_archive(&build_zip(&[("a.png", b"v2".as_slice())]), source, true)
        .await
        .unwrap();

    assert_eq!(result.sync.updated, vec!["/a.png"]);
    assert_eq!(result.sync.deleted, vec!["/b.png"]);
    let updated = app.asset_at(source, "/a.png").await.unwrap();
    assert_eq!(updated.id, original.id);
    assert_ne!(updated.content_hash, original.content_hash);
    assert_eq!(app.asset_paths(source).await, vec!["/a.png"]);
}

#[tokio::test]
async fn conflicting_entry_does_not_stop_the_rest() {
    let app = TestHub::spawn().await;
    let source = app.create_source("Archive").await;
    app.hub
        .add_item(
            Upload::new("photos", b"a file".to_vec()),
            "/",
            source,
            NewAssetMetadata::default(),
        )
        .await
        .unwrap();

    let zip = build_zip(&[
        ("photos/a.png", b"a".as_slice()),
        ("b.png", b"b".as_slice()),
    ]);
    let result = app.hub.import_archive(&zip, source, false).await.unwrap();

    assert_eq!(result.sync.created, vec!["/b.png"]);
    assert_eq!(result.sync.conflicts.len(), 1);
    assert_eq!(result.sync.conflicts[0].path, "/photos/a.png");
    assert!(app.scratch_entries(source).await.is_empty());
}

#[tokio::test]
async fn invalid_archive_changes_nothing() {
    let app = TestHub::spawn().await;
    let source = app.create_source("Archive").await;
    app.hub
        .import_archive(&build_zip(&[("a.png", b"aaa".as_slice())]), source, false)
        .await
        .unwrap();

    let err = app
        .hub
        .import_archive(b"definitely not a zip", source, true)
        .await
        .unwrap_err();

    assert!(matches!(err, ImageHubError::InvalidArchive(_)));
    assert_eq!(app.asset_paths(source).await, vec!["/a.png"]);
    assert!(app.scratch_entries(source).await.is_empty());
}

#[tokio::test]
async fn oversized_entry_is_an_invalid_archive() {
    let app = TestHub::spawn_with(ImportConfig {
        max_file_size: 4,
        ..Default::default()
    })
    .await;
    let source = app.create_source("Archive").await;
    let zip = build_zip(&[("small.png", b"ok".as_slice()), ("big.png", [7u8; 32].as_slice())]);

    let err = app.hub.import_archive(&zip, source, false).await.unwrap_err();

    assert!(matches!(err, ImageHubError::InvalidArchive(_)));
    assert!(app.asset_paths(source).await.is_empty());
}

#[tokio::test]
async fn entry_larger_than_blob_store_limit_is_an_invalid_archive() {
    let app = TestHub::spawn_with_limits(ImportConfig::default(), 8).await;
    let source = app.create_source("Archive").await;
    assert_eq!(app.hub.import_config().max_file_size, 8);
    let zip = build_zip(&[("small.png", b"ok".as_slice()), ("big.png", [7u8; 32].as_slice())]);

    let err = app.hub.import_archive(&zip, source, false).await.unwrap_err();

    assert!(matches!(err, ImageHubError::InvalidArchive(_)));
    assert!(app.asset_paths(source).await.is_empty());
    assert!(app.scratch_entries(source).await.is_empty());
}

#[tokio::test]
async fn unknown_source_is_rejected() {
    let app = TestHub::spawn().await;
    let zip = build_zip(&[("a.png", b"aaa".as_slice())]);

    let err = app.hub.import_archive(&zip, 4242, false).await.unwrap_err();

    assert!(matches!(err, ImageHubError::SourceNotFound(4242)));
}

#[tokio::test]
async fn manual_source_still_accepts_archives() {
    let app = TestHub::spawn().await;
    let source = app
        .hub
        .create_source(NewSource::new("Uploads", SourceType::Manual))
        .await
        .unwrap();

    let result = app
        .hub
        .import_archive(&build_zip(&[("a.png", b"aaa".as_slice())]), source.id, false)
        .await
        .unwrap();

    assert_eq!(result.sync.created, vec!["/a.png"]);
}

#[tokio::test]
async fn manifest_blob_is_reclaimed_by_garbage_collection() {
    let app = TestHub::spawn().await;
    let source = app.create_source("Archive").await;
    let zip = build_zip(&[
        ("a.png", b"aaa".as_slice()),
        ("metadata.json", br#"[{"filename": "a.png", "title": "A"}]"#.as_slice()),
    ]);

    app.hub.import_archive(&zip, source, false).await.unwrap();

    assert_eq!(app.hub.files().collect_garbage().await.unwrap(), 1);
    assert_eq!(app.hub.files().collect_garbage().await.unwrap(), 0);
    assert_eq!(app.asset_at(source, "/a.png").await.unwrap().title, "A");
}
