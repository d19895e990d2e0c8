use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};

// One spooled batch per stream. The spool file survives interim flushes (it is
// truncated, not replaced) so the stream keeps appending to the same handle,
// and Drop removes every spool on all exit paths.
pub struct StreamBatch {
    spool: NamedTempFile,
    sequence: u64,
    records: u64,
}

impl StreamBatch {
    pub fn path(&self) -> &Path {
        self.spool.path()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    pub fn truncate(&mut self) -> Result<()> {
        let file = self.spool.as_file_mut();
        file.set_len(0).context("failed to truncate spool file")?;
        file.seek(SeekFrom::Start(0))
            .context("failed to rewind spool file")?;
        Ok(())
    }
}

pub struct BatchStore {
    dir: TempDir,
    streams: HashMap<String, StreamBatch>,
}

impl BatchStore {
    pub fn new() -> Result<Self> {
        let dir = TempDir::new().context("failed to create spool directory")?;
        Ok(Self {
            dir,
            streams: HashMap::new(),
        })
    }

    // Appends one serialized record line, creating the stream entry on first
    // sight (sequence 1, zero records). Returns the records-since-last-flush
    // count including this append.
    pub fn append(&mut self, stream: &str, record: &Map<String, Value>) -> Result<u64> {
        let batch = match self.streams.entry(stream.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let spool = NamedTempFile::new_in(self.dir.path())
                    .with_context(|| format!("failed to create spool file for stream {stream}"))?;
                entry.insert(StreamBatch {
                    spool,
                    sequence: 1,
                    records: 0,
                })
            }
        };

        let mut line = serde_json::to_vec(record).context("failed to encode flattened record")?;
        line.push(b'\n');
        batch
            .spool
            .as_file_mut()
            .write_all(&line)
            .with_context(|| format!("failed to append to spool for stream {stream}"))?;

        batch.records += 1;
        Ok(batch.records)
    }

    pub fn sequence(&self, stream: &str) -> u64 {
        self.streams.get(stream).map_or(1, |batch| batch.sequence)
    }

    pub fn records(&self, stream: &str) -> u64 {
        self.streams.get(stream).map_or(0, |batch| batch.records)
    }

    // Called only after a batch actually uploaded.
    pub fn advance(&mut self, stream: &str) {
        if let Some(batch) = self.streams.get_mut(stream) {
            batch.sequence += 1;
            batch.records = 0;
        }
    }

    pub fn batch_mut(&mut self, stream: &str) -> Option<&mut StreamBatch> {
        self.streams.get_mut(stream)
    }

    // Sorted so the end-of-run flush order is deterministic.
    pub fn stream_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.streams.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn first_append_creates_stream_at_sequence_one() {
        let mut store = BatchStore::new().expect("batch store");
        assert_eq!(store.sequence("users"), 1);
        assert_eq!(store.records("users"), 0);

        let count = store
            .append("users", &record(json!({"id": 1})))
            .expect("append");
        assert_eq!(count, 1);
        assert_eq!(store.sequence("users"), 1);
        assert_eq!(store.records("users"), 1);
    }

    #[test]
    fn appends_write_newline_delimited_json() {
        let mut store = BatchStore::new().expect("batch store");
        store
            .append("users", &record(json!({"id": 1})))
            .expect("append first");
        store
            .append("users", &record(json!({"id": 2})))
            .expect("append second");

        let contents =
            std::fs::read_to_string(store.batch_mut("users").expect("batch").path())
                .expect("read spool");
        assert_eq!(contents, "{\"id\":1}\n{\"id\":2}\n");
    }

    #[test]
    fn streams_count_independently() {
        let mut store = BatchStore::new().expect("batch store");
        store
            .append("users", &record(json!({"id": 1})))
            .expect("append users");
        store
            .append("orders", &record(json!({"id": 10})))
            .expect("append orders");
        store
            .append("users", &record(json!({"id": 2})))
            .expect("append users again");

        assert_eq!(store.records("users"), 2);
        assert_eq!(store.records("orders"), 1);
    }

    #[test]
    fn advance_bumps_sequence_and_resets_count() {
        let mut store = BatchStore::new().expect("batch store");
        store
            .append("users", &record(json!({"id": 1})))
            .expect("append");
        store.advance("users");

        assert_eq!(store.sequence("users"), 2);
        assert_eq!(store.records("users"), 0);
    }

    #[test]
    fn truncated_spool_keeps_accepting_appends() {
        let mut store = BatchStore::new().expect("batch store");
        store
            .append("users", &record(json!({"id": 1})))
            .expect("append before flush");

        store
            .batch_mut("users")
            .expect("batch")
            .truncate()
            .expect("truncate");
        store.advance("users");

        store
            .append("users", &record(json!({"id": 2})))
            .expect("append after flush");

        let contents =
            std::fs::read_to_string(store.batch_mut("users").expect("batch").path())
                .expect("read spool");
        assert_eq!(contents, "{\"id\":2}\n");
        assert_eq!(store.records("users"), 1);
        assert_eq!(store.sequence("users"), 2);
    }

    #[test]
    fn stream_names_are_sorted() {
        let mut store = BatchStore::new().expect("batch store");
        store
            .append("orders", &record(json!({"id": 1})))
            .expect("append orders");
        store
            .append("users", &record(json!({"id": 1})))
            .expect("append users");
        store
            .append("events", &record(json!({"id": 1})))
            .expect("append events");

        assert_eq!(store.stream_names(), vec!["events", "orders", "users"]);
    }

    #[test]
    fn spool_files_are_removed_with_the_store() {
        let mut store = BatchStore::new().expect("batch store");
        store
            .append("users", &record(json!({"id": 1})))
            .expect("append");
        let path = store.batch_mut("users").expect("batch").path().to_path_buf();
        assert!(path.exists());

        drop(store);
        assert!(!path.exists());
    }
}
