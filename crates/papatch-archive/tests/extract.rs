use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use flate2::Compression;
use flate2::write::GzEncoder;
use papatch_archive::{Error, ExtractOptions, Extractor};
use papatch_manifest::{Bundle, Entry};
use tempfile::TempDir;

fn entry(filename: &str, offset: u64, size: u64, size_z: u64) -> Entry {
    Entry {
        filename: filename.into(),
        offset,
        size,
        size_z,
        executable: false,
    }
}

fn bundle(entries: Vec<Entry>) -> Bundle {
    Bundle {
        checksum: "0000000000000000000000000000000000000000".into(),
        size: 0,
        entries,
    }
}

fn write_blob(dir: &Path, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.join("blob");
    std::fs::write(&path, bytes).unwrap();
    path
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn test_entries_tile_the_blob() {
    let scratch = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let data: Vec<u8> = (0u8..30).collect();
    let blob = write_blob(scratch.path(), &data);
    // declared out of order; extraction sorts by offset
    let bundle = bundle(vec![entry("/b/second", 10, 20, 0), entry("/a/first", 0, 10, 0)]);

    let report = Extractor::new(root.path()).extract("stable", &bundle, &blob).unwrap();

    assert_eq!(report.entries, 2);
    assert_eq!(report.bytes, 30);
    let base = root.path().join("stable");
    assert_eq!(std::fs::read(base.join("a/first")).unwrap(), &data[0..10]);
    assert_eq!(std::fs::read(base.join("b/second")).unwrap(), &data[10..30]);
}

#[test]
fn test_nested_entry_is_inflated() {
    let scratch = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let payload = b"forty bytes of highly repetitive payload".to_vec();
    assert_eq!(payload.len(), 40);
    let packed = gzip(&payload);

    let mut data = b"raw!".to_vec();
    data.extend_from_slice(&packed);
    let blob = write_blob(scratch.path(), &data);
    let bundle = bundle(vec![
        entry("/raw.txt", 0, 4, 0),
        entry("/packed.txt", 4, 40, packed.len() as u64),
    ]);

    Extractor::new(root.path()).extract("stable", &bundle, &blob).unwrap();

    let base = root.path().join("stable");
    assert_eq!(std::fs::read(base.join("packed.txt")).unwrap(), payload);
    assert_eq!(std::fs::read(base.join("raw.txt")).unwrap(), b"raw!");
}

#[cfg(unix)]
#[test]
fn test_executable_flag_sets_owner_execute_only_when_present() {
    use std::os::unix::fs::PermissionsExt;

    let scratch = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let blob = write_blob(scratch.path(), b"#!/bin/sh\nplain");
    let mut launcher = entry("/bin/launch", 0, 10, 0);
    launcher.executable = true;
    let bundle = bundle(vec![launcher, entry("/readme", 10, 5, 0)]);

    Extractor::new(root.path()).extract("stable", &bundle, &blob).unwrap();

    let base = root.path().join("stable");
    let exec_mode = std::fs::metadata(base.join("bin/launch")).unwrap().permissions().mode();
    let plain_mode = std::fs::metadata(base.join("readme")).unwrap().permissions().mode();
    assert_ne!(exec_mode & 0o100, 0);
    assert_eq!(plain_mode & 0o100, 0);
    // other bits are preserved
    assert_eq!(exec_mode & 0o600, plain_mode & 0o600);
}

#[test]
fn test_existing_files_are_replaced() {
    let scratch = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let target = root.path().join("stable/config.json");
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
    std::fs::write(&target, b"a much longer stale file that must vanish").unwrap();
    let blob = write_blob(scratch.path(), b"{}");

    Extractor::new(root.path())
        .extract("stable", &bundle(vec![entry("/config.json", 0, 2, 0)]), &blob)
        .unwrap();

    assert_eq!(std::fs::read(&target).unwrap(), b"{}");
}

#[test]
fn test_escaping_entry_is_rejected() {
    let scratch = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let blob = write_blob(scratch.path(), b"evil");

    let result = Extractor::new(root.path().join("game")).extract(
        "stable",
        &bundle(vec![entry("/../../evil", 0, 4, 0)]),
        &blob,
    );

    assert!(matches!(result, Err(Error::PathEscape { .. })));
    assert!(!root.path().join("evil").exists());
}

#[test]
fn test_stream_name_cannot_leave_the_install_root() {
    let scratch = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let game = root.path().join("game");
    let blob = write_blob(scratch.path(), b"evil");

    for stream in ["..", "../other", "/abs", "a/b", ""] {
        let result = Extractor::new(&game).extract(stream, &bundle(vec![entry("/evil", 0, 4, 0)]), &blob);
        assert!(matches!(result, Err(Error::InvalidStream { .. })), "{stream}");
    }
    assert!(!root.path().join("evil").exists());
    assert!(!game.exists());
}

#[test]
fn test_oversized_entry_fails_instead_of_allocating() {
    let scratch = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let blob = write_blob(scratch.path(), &gzip(b"small"));

    let result = Extractor::new(root.path()).extract(
        "stable",
        &bundle(vec![entry("/huge", 0, 5, u64::MAX / 2)]),
        &blob,
    );

    assert!(matches!(result, Err(Error::ShortRead { .. })), "{result:?}");
    assert!(!root.path().join("stable/huge").exists());
}

#[test]
fn test_missing_blob_fails() {
    let root = TempDir::new().unwrap();
    let result = Extractor::new(root.path()).extract(
        "stable",
        &bundle(vec![entry("/a", 0, 1, 0)]),
        &root.path().join("absent"),
    );
    assert!(matches!(result, Err(Error::OpenBlob { .. })));
}

#[test]
fn test_progress_reports_every_entry() {
    let scratch = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let blob = write_blob(scratch.path(), b"abc");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let extractor = Extractor::new(root.path()).with_options(
        ExtractOptions::default().on_progress(move |p| sink.lock().unwrap().push((p.entries_done, p.entries_total))),
    );

    extractor
        .extract(
            "stable",
            &bundle(vec![entry("/a", 0, 1, 0), entry("/b", 1, 1, 0), entry("/c", 2, 1, 0)]),
            &blob,
        )
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
}
