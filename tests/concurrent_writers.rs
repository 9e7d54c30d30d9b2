use std::sync::Arc;
use std::thread;

use flowstore::{MemoryStore, Reading, Repository};

const WRITERS: i64 = 4;
const READINGS_PER_WRITER: i64 = 500;

#[test]
fn concurrent_writers_same_device_and_hour() {
    let repo = Arc::new(Repository::new(MemoryStore::new()));

    let handles: Vec<_> = (0..WRITERS)
        .map(|w| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                // Interleaved seconds so every writer lands in the same rows.
                let readings: Vec<Reading> = (0..READINGS_PER_WRITER)
                    .map(|i| Reading::new((i * WRITERS + w) * 1_000, w + 1))
                    .collect();
                repo.store("shared-meter", &readings).expect("store");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread");
    }

    let total = WRITERS * READINGS_PER_WRITER;
    let got = repo
        .query("shared-meter", 0, (total - 1) * 1_000)
        .expect("query");
    assert_eq!(got.len() as i64, total);
    for (i, reading) in got.iter().enumerate() {
        assert_eq!(reading.timestamp_ms, i as i64 * 1_000);
        assert_eq!(reading.volume, i as i64 % WRITERS + 1);
    }
}

#[test]
fn concurrent_readers_and_writers_on_different_devices() {
    let repo = Arc::new(Repository::new(MemoryStore::new()));

    let handles: Vec<_> = (0..8)
        .map(|d| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                let device = format!("device-{d:04}");
                for i in 0..50_i64 {
                    repo.store(&device, &[Reading::new(i * 60_000, i + 1)])
                        .expect("store");
                    let seen = repo.query(&device, 0, i * 60_000).expect("query");
                    assert_eq!(seen.len() as i64, i + 1);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker thread");
    }
}
