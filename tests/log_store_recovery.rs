use std::fs::OpenOptions;
use std::io::Write;

use flowstore::store::LOG_FILE_NAME;
use flowstore::{LogStore, LogStoreConfig, Reading, Repository, StoreError};
use tempfile::tempdir;

#[test]
fn torn_tail_is_truncated_on_open() {
    let dir = tempdir().expect("tempdir");
    let log_path = dir.path().join(LOG_FILE_NAME);
    {
        let repo = Repository::new(LogStore::open(dir.path()).expect("open"));
        repo.store("D1", &[Reading::new(1_000, 5), Reading::new(2_000, 7)])
            .expect("store");
    }
    let intact_len = std::fs::metadata(&log_path).expect("metadata").len();

    // Half-written frame: header claims 64 payload bytes, only 3 follow.
    let mut file = OpenOptions::new().append(true).open(&log_path).expect("append");
    file.write_all(&64u32.to_le_bytes()).expect("len");
    file.write_all(&0u32.to_le_bytes()).expect("crc");
    file.write_all(b"abc").expect("payload");
    drop(file);

    let repo = Repository::new(LogStore::open(dir.path()).expect("reopen"));
    assert_eq!(std::fs::metadata(&log_path).expect("metadata").len(), intact_len);
    assert_eq!(
        repo.query("D1", 0, 2_000).expect("query"),
        vec![Reading::new(1_000, 5), Reading::new(2_000, 7)]
    );

    repo.store("D1", &[Reading::new(3_000, 9)]).expect("store after recovery");
    drop(repo);

    let repo = Repository::new(LogStore::open(dir.path()).expect("reopen again"));
    assert_eq!(repo.query("D1", 0, 3_000).expect("query").len(), 3);
}

#[test]
fn checksum_mismatch_stops_replay() {
    let dir = tempdir().expect("tempdir");
    let log_path = dir.path().join(LOG_FILE_NAME);
    {
        let repo = Repository::new(LogStore::open(dir.path()).expect("open"));
        repo.store("D1", &[Reading::new(1_000, 5)]).expect("store");
    }
    let first_len = std::fs::metadata(&log_path).expect("metadata").len();
    {
        let repo = Repository::new(LogStore::open(dir.path()).expect("open"));
        repo.store("D1", &[Reading::new(2_000, 7)]).expect("store");
    }

    // Flip the last byte of the second frame's payload.
    let mut bytes = std::fs::read(&log_path).expect("read");
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    std::fs::write(&log_path, &bytes).expect("write");

    let store = LogStore::open(dir.path()).expect("reopen");
    assert_eq!(store.cell_count().expect("cells"), 1);
    assert_eq!(std::fs::metadata(&log_path).expect("metadata").len(), first_len);
}

#[test]
fn synced_writes_survive_reopen() {
    let dir = tempdir().expect("tempdir");
    let config = LogStoreConfig {
        sync_on_write: true,
    };
    {
        let store = LogStore::open_with_config(dir.path(), config.clone()).expect("open");
        let repo = Repository::new(store);
        repo.store_payload("meter-7,1000,3,2000,0,3000,4")
            .expect("store payload");
        repo.backend().sync().expect("sync");
    }
    let store = LogStore::open_with_config(dir.path(), config).expect("reopen");
    assert_eq!(store.cell_count().expect("cells"), 2);
}

#[test]
fn open_fails_when_path_is_a_file() {
    let dir = tempdir().expect("tempdir");
    let file_path = dir.path().join("not_a_dir");
    std::fs::write(&file_path, b"x").expect("write");
    let err = LogStore::open(&file_path).err().expect("open must fail");
    assert!(matches!(err, StoreError::Io(_)));
}
