use excavation_persistence::{
    FileStorage, MemoryStorage, Storage, StorageError, DEFAULT_SAVE_FILE_NAME,
};

#[test]
fn file_storage_round_trips_bytes() {
    let directory = tempfile::tempdir().expect("temp dir");
    let mut storage = FileStorage::in_directory(directory.path());
    assert!(!storage.exists(), "fresh directory must not contain a save");

    storage.write_all(&[1, 2, 3, 4]).expect("write");

    assert!(storage.exists());
    assert_eq!(storage.read_all().expect("read"), vec![1, 2, 3, 4]);
    assert_eq!(
        storage.path().file_name().and_then(|name| name.to_str()),
        Some(DEFAULT_SAVE_FILE_NAME)
    );
}

#[test]
fn file_storage_replaces_previous_save_without_leaving_temp_file() {
    let directory = tempfile::tempdir().expect("temp dir");
    let mut storage = FileStorage::in_directory(directory.path());

    storage.write_all(&[9; 64]).expect("first write");
    storage.write_all(&[7]).expect("second write");

    assert_eq!(storage.read_all().expect("read"), vec![7]);
    let leftovers: Vec<_> = std::fs::read_dir(directory.path())
        .expect("list dir")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp file should be renamed away");
}

#[test]
fn file_storage_creates_missing_parent_directories() {
    let directory = tempfile::tempdir().expect("temp dir");
    let mut storage = FileStorage::new(directory.path().join("slots").join("save.dat"));

    storage.write_all(b"payload").expect("write");

    assert_eq!(storage.read_all().expect("read"), b"payload".to_vec());
}

#[test]
fn missing_file_reads_as_missing() {
    let directory = tempfile::tempdir().expect("temp dir");
    let storage = FileStorage::in_directory(directory.path());

    assert!(matches!(storage.read_all(), Err(StorageError::Missing)));
}

#[test]
fn memory_storage_tracks_presence() {
    let mut storage = MemoryStorage::new();
    assert!(!storage.exists());
    assert!(matches!(storage.read_all(), Err(StorageError::Missing)));

    storage.write_all(&[5, 6]).expect("write");

    assert!(storage.exists());
    assert_eq!(storage.bytes(), Some([5_u8, 6].as_slice()));
    assert_eq!(
        MemoryStorage::with_bytes(vec![5, 6]),
        storage,
        "pre-populated storage should match written storage"
    );
}

#[test]
fn failed_write_leaves_previous_save_readable() {
    let directory = tempfile::tempdir().expect("temp dir");
    let mut storage = FileStorage::in_directory(directory.path());
    storage.write_all(&[4, 2]).expect("first write");

    // A directory squatting on the temp path makes the next write fail.
    let blocker = directory.path().join(format!("{DEFAULT_SAVE_FILE_NAME}.tmp"));
    std::fs::create_dir(&blocker).expect("block temp path");

    assert!(matches!(
        storage.write_all(&[9, 9, 9]),
        Err(StorageError::Io { .. })
    ));
    assert!(storage.exists());
    assert_eq!(storage.read_all().expect("read"), vec![4, 2]);
}
