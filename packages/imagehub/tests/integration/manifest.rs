use imagehub::entity::stored_file::Area;
use imagehub::files::FileLocation;
use imagehub::models::asset::AssetPatch;
use imagehub::models::report::ApplyReport;

use crate::common::TestHub;

/// Stage `files`, synchronize them and apply manifests.
async fn import_and_apply(
    app: &TestHub,
    source: i32,
    files: &[(&str, &[u8])],
) -> ApplyReport {
    let dir = app.stage(source, files).await;
    app.hub.import_directory(&dir, source, false).await.unwrap();
    app.hub.apply_manifest(source).await.unwrap()
}

async fn manifest_exists(app: &TestHub, source: i32, filepath: &str) -> bool {
    let location = FileLocation::image(source, filepath, "metadata.json").unwrap();
    app.hub.files().get_file(&location).await.unwrap().is_some()
}

#[tokio::test]
async fn array_manifest_applies_and_reports_missing_files() {
    let app = TestHub::spawn().await;
    let source = app.create_source("Photos").await;
    let manifest = br#"[
        {"filename": "a.png", "title": "Cat"},
        {"filename": "missing.png", "title": "X"}
    ]"#;

    let report = import_and_apply(
        &app,
        source,
        &[
            ("a.png", b"aaa".as_slice()),
            ("b.png", b"bbb".as_slice()),
            ("metadata.json", manifest.as_slice()),
        ],
    )
    .await;

    assert_eq!(report.manifests, vec!["/metadata.json"]);
    assert_eq!(report.applied, vec!["/a.png"]);
    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(report.unresolved[0].filename, "missing.png");
    assert_eq!(report.unresolved[0].manifest, "/metadata.json");
    assert!(report.invalid.is_empty());

    assert_eq!(app.asset_at(source, "/a.png").await.unwrap().title, "Cat");
    assert_eq!(app.asset_at(source, "/b.png").await.unwrap().title, "b.png");
    assert!(!manifest_exists(&app, source, "/").await);
    assert_eq!(app.asset_paths(source).await, vec!["/a.png", "/b.png"]);
}

#[tokio::test]
async fn single_object_manifest_is_one_entry() {
    let app = TestHub::spawn().await;
    let source = app.create_source("Photos").await;
    let manifest = br#"{"filename": "a.png", "title": "Cat", "author": "Ann", "license": "cc-by", "tags": ["pet", "orange"]}"#;

    let report = import_and_apply(
        &app,
        source,
        &[("a.png", b"aaa".as_slice()), ("metadata.json", manifest.as_slice())],
    )
    .await;

    assert_eq!(report.applied, vec!["/a.png"]);
    assert!(report.is_clean());

    let asset = app.asset_at(source, "/a.png").await.unwrap();
    assert_eq!(asset.title, "Cat");
    assert_eq!(asset.author.as_deref(), Some("Ann"));
    assert_eq!(asset.license, "cc-by");
    assert_eq!(asset.tags, vec!["orange", "pet"]);
}

#[tokio::test]
async fn keyed_manifest_uses_keys_as_filenames() {
    let app = TestHub::spawn().await;
    let source = app.create_source("Photos").await;
    let manifest = br#"{
        "a.png": {"title": "First"},
        "other": {"filename": "b.png", "title": "Second"}
    }"#;

    let report = import_and_apply(
        &app,
        source,
        &[
            ("a.png", b"aaa".as_slice()),
            ("b.png", b"bbb".as_slice()),
            ("metadata.json", manifest.as_slice()),
        ],
    )
    .await;

    assert_eq!(report.applied.len(), 2);
    assert_eq!(app.asset_at(source, "/a.png").await.unwrap().title, "First");
    assert_eq!(app.asset_at(source, "/b.png").await.unwrap().title, "Second");
}

#[tokio::test]
async fn entries_resolve_relative_to_manifest_directory() {
    let app = TestHub::spawn().await;
    let source = app.create_source("Photos").await;
    let manifest = br#"[{"filename": "a.png", "title": "Nested"}, {"filename": "deeper/c.png", "title": "Deeper"}]"#;

    let report = import_and_apply(
        &app,
        source,
        &[
            ("a.png", b"top".as_slice()),
            ("sub/a.png", b"nested".as_slice()),
            ("sub/deeper/c.png", b"c".as_slice()),
            ("sub/metadata.json", manifest.as_slice()),
        ],
    )
    .await;

    assert_eq!(report.manifests, vec!["/sub/metadata.json"]);
    assert_eq!(report.applied, vec!["/sub/a.png", "/sub/deeper/c.png"]);
    assert_eq!(app.asset_at(source, "/a.png").await.unwrap().title, "a.png");
    assert_eq!(app.asset_at(source, "/sub/a.png").await.unwrap().title, "Nested");
    assert_eq!(
        app.asset_at(source, "/sub/deeper/c.png").await.unwrap().title,
        "Deeper"
    );
    assert!(!manifest_exists(&app, source, "/sub/").await);
}

#[tokio::test]
async fn unknown_keys_reject_only_that_entry() {
    let app = TestHub::spawn().await;
    let source = app.create_source("Photos").await;
    let manifest = br#"[
        {"filename": "a.png", "title": "Cat", "rating": 5},
        {"filename": "b.png", "title": "Dog"}
    ]"#;

    let report = import_and_apply(
        &app,
        source,
        &[
            ("a.png", b"aaa".as_slice()),
            ("b.png", b"bbb".as_slice()),
            ("metadata.json", manifest.as_slice()),
        ],
    )
    .await;

    assert_eq!(report.invalid.len(), 1);
    assert_eq!(report.invalid[0].index, Some(0));
    assert_eq!(report.applied, vec!["/b.png"]);
    assert_eq!(app.asset_at(source, "/a.png").await.unwrap().title, "a.png");
    assert_eq!(app.asset_at(source, "/b.png").await.unwrap().title, "Dog");
}

#[tokio::test]
async fn unparseable_manifest_is_reported_and_still_removed() {
    let app = TestHub::spawn().await;
    let source = app.create_source("Photos").await;

    let report = import_and_apply(
        &app,
        source,
        &[("a.png", b"aaa".as_slice()), ("metadata.json", b"{not json".as_slice())],
    )
    .await;

    assert_eq!(report.manifests, vec!["/metadata.json"]);
    assert_eq!(report.invalid.len(), 1);
    assert_eq!(report.invalid[0].index, None);
    assert!(report.applied.is_empty());
    assert!(!manifest_exists(&app, source, "/").await);
    assert_eq!(app.asset_paths(source).await, vec!["/a.png"]);
}

#[tokio::test]
async fn manifest_cannot_describe_itself() {
    let app = TestHub::spawn().await;
    let source = app.create_source("Photos").await;
    let manifest = br#"{"filename": "metadata.json", "title": "Me"}"#;

    let report = import_and_apply(&app, source, &[("metadata.json", manifest.as_slice())]).await;

    assert_eq!(report.unresolved.len(), 1);
    assert!(app.asset_paths(source).await.is_empty());
}

#[tokio::test]
async fn other_manifests_are_not_targets() {
    let app = TestHub::spawn().await;
    let source = app.create_source("Photos").await;
    let root = br#"[{"filename": "sub/metadata.json", "title": "T"}, {"filename": "a.png", "title": "A"}]"#;
    let nested = br#"[{"filename": "b.png", "title": "B"}]"#;

    let report = import_and_apply(
        &app,
        source,
        &[
            ("a.png", b"aaa".as_slice()),
            ("metadata.json", root.as_slice()),
            ("sub/b.png", b"bbb".as_slice()),
            ("sub/metadata.json", nested.as_slice()),
        ],
    )
    .await;

    assert_eq!(report.manifests, vec!["/metadata.json", "/sub/metadata.json"]);
    assert_eq!(report.applied, vec!["/a.png", "/sub/b.png"]);
    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(report.unresolved[0].filename, "sub/metadata.json");
    assert_eq!(app.asset_paths(source).await, vec!["/a.png", "/sub/b.png"]);
    assert!(!manifest_exists(&app, source, "/sub/").await);
}

#[tokio::test]
async fn no_manifest_is_a_no_op() {
    let app = TestHub::spawn().await;
    let source = app.create_source("Photos").await;

    let report = import_and_apply(&app, source, &[("a.png", b"aaa".as_slice())]).await;

    assert_eq!(report, ApplyReport::default());
    assert_eq!(app.asset_paths(source).await, vec!["/a.png"]);
}

#[tokio::test]
async fn manifest_fields_merge_without_clearing_others() {
    let app = TestHub::spawn().await;
    let source = app.create_source("Photos").await;
    let dir = app.stage(source, &[("a.png", b"aaa".as_slice())]).await;
    app.hub.import_directory(&dir, source, false).await.unwrap();
    let asset = app.asset_at(source, "/a.png").await.unwrap();
    app.hub
        .update_asset(
            asset.id,
            AssetPatch {
                title: Some("Kept".into()),
                tags: Some(vec!["kept".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let report = import_and_apply(
        &app,
        source,
        &[("metadata.json", br#"[{"filename": "a.png", "author": "Ann"}]"#.as_slice())],
    )
    .await;

    assert_eq!(report.applied, vec!["/a.png"]);
    let asset = app.hub.get_asset(asset.id).await.unwrap();
    assert_eq!(asset.title, "Kept");
    assert_eq!(asset.tags, vec!["kept"]);
    assert_eq!(asset.author.as_deref(), Some("Ann"));
    assert_eq!(
        app.hub
            .files()
            .list_files(Area::Images, source, "/")
            .await
            .unwrap()
            .len(),
        1
    );
}
