mod common;

use std::sync::Arc;

use folderzip::{
    CancellationToken, CompressionMethod, Error, TransferOptions, ZipReader, create_from_folder,
};
use tempfile::TempDir;

use common::{CancelAfter, Recorder, create_dummy_file};

#[tokio::test]
async fn create_with_bad_arguments_fails() {
    for arg in ["", "   \t   "] {
        let err = create_from_folder(arg, "well.zip", TransferOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { param: "folder_path" }));

        let err = create_from_folder("somestuff", arg, TransferOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { param: "archive_file_path" }));
    }
}

#[tokio::test]
async fn create_from_nonexisting_folder_fails() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing");
    let archive = temp.path().join("well.zip");

    let err = create_from_folder(&missing, &archive, TransferOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { param: "folder_path", .. }));
    assert!(!archive.exists());
}

#[tokio::test]
async fn create_from_empty_folder_results_in_minimal_zip_file() {
    let source = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let archive = out.path().join("empty.zip");
    let progress = Arc::new(Recorder::default());

    let options = TransferOptions::default().with_progress(progress.clone());
    create_from_folder(source.path(), &archive, options).await.unwrap();

    assert_eq!(std::fs::metadata(&archive).unwrap().len(), 22);
    assert!(progress.reports().is_empty());
}

#[tokio::test]
async fn create_from_non_empty_folder_results_in_nonempty_zip_file() {
    let source = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let archive = out.path().join("one.zip");
    create_dummy_file(source.path(), "dummy.bin", 234);

    create_from_folder(source.path(), &archive, TransferOptions::default())
        .await
        .unwrap();

    assert!(std::fs::metadata(&archive).unwrap().len() > 22);
    let entries = ZipReader::open(&archive).unwrap().entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].file_name, "dummy.bin");
    assert_eq!(entries[0].uncompressed_size, 234);
}

#[tokio::test]
async fn create_reports_granular_progress() {
    let source = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let archive = out.path().join("progress.zip");
    create_dummy_file(source.path(), "dummy.bin", 234);
    create_dummy_file(source.path(), "dummy2.bin", 143_000);
    let progress = Arc::new(Recorder::default());

    let options = TransferOptions::default().with_progress(progress.clone());
    create_from_folder(source.path(), &archive, options).await.unwrap();

    let reports = progress.reports();
    assert_eq!(reports.len(), 3);
    assert!(reports.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*reports.last().unwrap(), 1.0);
}

#[tokio::test]
async fn create_can_be_canceled() {
    let source = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let archive = out.path().join("canceled.zip");
    create_dummy_file(source.path(), "dummy1.bin", 234);
    create_dummy_file(source.path(), "dummy2.bin", 345);
    create_dummy_file(source.path(), "dummy3.bin", 456);

    let token = CancellationToken::new();
    let progress = Arc::new(CancelAfter::new(2, token.clone()));
    let options = TransferOptions::default()
        .with_progress(progress.clone())
        .with_cancel(token);

    let err = create_from_folder(source.path(), &archive, options)
        .await
        .unwrap_err();
    assert!(err.is_canceled());
    assert_eq!(progress.count(), 2);

    // The archive is still finalized and holds the entries completed so far
    let entries = ZipReader::open(&archive).unwrap().entries().unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
    assert_eq!(names, ["dummy1.bin", "dummy2.bin"]);
}

#[tokio::test]
async fn create_canceled_before_start_writes_no_entries() {
    let source = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let archive = out.path().join("never.zip");
    create_dummy_file(source.path(), "dummy.bin", 10);

    let token = CancellationToken::new();
    token.cancel();
    let progress = Arc::new(Recorder::default());
    let options = TransferOptions::default()
        .with_progress(progress.clone())
        .with_cancel(token);

    let err = create_from_folder(source.path(), &archive, options)
        .await
        .unwrap_err();
    assert!(err.is_canceled());
    assert!(progress.reports().is_empty());
    assert!(!archive.exists());
}

#[tokio::test]
async fn entry_names_are_relative_and_mark_empty_directories() {
    let source = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let archive = out.path().join("tree.zip");
    create_dummy_file(source.path(), "sub/dummy.bin", 421);
    create_dummy_file(source.path(), "top.bin", 1);
    std::fs::create_dir_all(source.path().join("empty/inner")).unwrap();

    let options = TransferOptions::default().with_compression(CompressionMethod::Stored);
    create_from_folder(source.path(), &archive, options).await.unwrap();

    let entries = ZipReader::open(&archive).unwrap().entries().unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
    assert_eq!(names, ["empty/inner/", "sub/dummy.bin", "top.bin"]);
    assert!(entries[0].is_directory);
    assert!(
        entries
            .iter()
            .all(|e| e.is_directory || e.compression_method == CompressionMethod::Stored)
    );
}

#[tokio::test]
async fn archive_inside_source_folder_is_skipped() {
    let source = TempDir::new().unwrap();
    create_dummy_file(source.path(), "a.bin", 100);
    let archive = source.path().join("self.zip");

    create_from_folder(source.path(), &archive, TransferOptions::default())
        .await
        .unwrap();

    let entries = ZipReader::open(&archive).unwrap().entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].file_name, "a.bin");
}

#[tokio::test]
async fn folder_holding_only_the_archive_keeps_its_marker() {
    let source = TempDir::new().unwrap();
    create_dummy_file(source.path(), "a.bin", 100);
    std::fs::create_dir(source.path().join("out")).unwrap();
    let archive = source.path().join("out/self.zip");

    create_from_folder(source.path(), &archive, TransferOptions::default())
        .await
        .unwrap();

    let entries = ZipReader::open(&archive).unwrap().entries().unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
    assert_eq!(names, ["a.bin", "out/"]);
    assert!(entries[1].is_directory);
}
