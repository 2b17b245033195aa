use std::path::{Path, PathBuf};

use crate::error::RoundError;
use crate::models::RoundRecord;
use crate::msgpack;

const ROUND_FILE_EXTENSION: &str = "msgpack";

/// Directory of MessagePack round files, one per round, named `<round id>.msgpack`
#[derive(Debug, Clone)]
pub struct RoundStore {
    dir: PathBuf,
}

impl RoundStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a round's file. Ids that could escape the directory are rejected.
    pub fn round_path(&self, round_id: &str) -> Result<PathBuf, RoundError> {
        let invalid = round_id.is_empty()
            || round_id.contains("..")
            || round_id.contains(['/', '\\', '\0']);
        if invalid {
            return Err(RoundError::InvalidRoundId(round_id.to_string()));
        }
        Ok(self
            .dir
            .join(format!("{}.{}", round_id, ROUND_FILE_EXTENSION)))
    }

    /// Read and decode a single round
    pub async fn load_round(&self, round_id: &str) -> Result<RoundRecord, RoundError> {
        let path = self.round_path(round_id)?;
        read_record(path).await
    }

    /// Read every round file in the directory.
    ///
    /// Files are read concurrently, one task each, and collected in directory-listing order.
    /// A file that cannot be read or decoded is logged and left out; only failing to list the
    /// directory itself is an error.
    pub async fn load_all(&self) -> Result<Vec<RoundRecord>, RoundError> {
        let list_err = |source| RoundError::ReadDir {
            path: self.dir.clone(),
            source,
        };
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(list_err)?;

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
            let path = entry.path();
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => paths.push(path),
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "cannot stat round file, skipping");
                }
            }
        }

        let handles: Vec<_> = paths
            .into_iter()
            .map(|path| tokio::spawn(read_record(path)))
            .collect();

        let mut records = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await.map_err(RoundError::from) {
                Ok(Ok(record)) => records.push(record),
                Ok(Err(err)) | Err(err) => {
                    tracing::warn!(error = ?err, "skipping unreadable round file");
                }
            }
        }

        tracing::debug!(dir = %self.dir.display(), rounds = records.len(), "loaded round index");
        Ok(records)
    }
}

async fn read_record(path: PathBuf) -> Result<RoundRecord, RoundError> {
    let bytes = tokio::fs::read(&path).await.map_err(|source| RoundError::Read {
        path: path.clone(),
        source,
    })?;
    let value =
        msgpack::from_slice(&bytes).map_err(|source| RoundError::Decode { path, source })?;
    RoundRecord::from_value(value)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    pub(crate) fn write_round(dir: &Path, round: &Value) {
        let id = round["id"].as_str().unwrap();
        let bytes = rmp_serde::to_vec_named(round).unwrap();
        std::fs::write(dir.join(format!("{id}.msgpack")), bytes).unwrap();
    }

    fn round(id: &str) -> Value {
        json!({
            "id": id,
            "map": "de_dust2",
            "st": 100,
            "end": 200,
            "events": [{"e_type": "plant", "data": {"ts": 150}}],
        })
    }

    #[tokio::test]
    async fn test_load_round_from_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_round(dir.path(), &round("r1"));

        let store = RoundStore::new(dir.path());
        let record = store.load_round("r1").await.unwrap();

        assert_eq!(record.id, "r1");
        assert_eq!(record.events().len(), 1);
    }

    #[tokio::test]
    async fn test_load_round_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = RoundStore::new(dir.path());

        let err = store.load_round("nope").await.unwrap_err();
        assert!(matches!(err, RoundError::Read { .. }));
    }

    #[tokio::test]
    async fn test_load_round_undecodable() {
        let dir = tempfile::tempdir().unwrap();
        // 0xc1 is never used in MessagePack
        std::fs::write(dir.path().join("bad.msgpack"), [0xc1, 0x00]).unwrap();
        let store = RoundStore::new(dir.path());

        let err = store.load_round("bad").await.unwrap_err();
        assert!(matches!(err, RoundError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_load_round_with_integer_keyed_data() {
        #[derive(Serialize)]
        struct Data {
            ts: u64,
            scores: BTreeMap<u32, u32>,
        }
        #[derive(Serialize)]
        struct Event {
            e_type: &'static str,
            data: Data,
        }
        #[derive(Serialize)]
        struct Round {
            id: &'static str,
            map: u32,
            st: u64,
            end: u64,
            events: Vec<Event>,
        }

        let dir = tempfile::tempdir().unwrap();
        let bytes = rmp_serde::to_vec_named(&Round {
            id: "r1",
            map: 3,
            st: 100,
            end: 200,
            events: vec![Event {
                e_type: "score",
                data: Data {
                    ts: 150,
                    scores: BTreeMap::from([(1, 16), (2, 14)]),
                },
            }],
        })
        .unwrap();
        std::fs::write(dir.path().join("r1.msgpack"), bytes).unwrap();

        let store = RoundStore::new(dir.path());
        let record = store.load_round("r1").await.unwrap();

        assert_eq!(record.map, "3");
        assert_eq!(record.events()[0]["data"]["scores"], json!({"1": 16, "2": 14}));
        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }

    #[test]
    fn test_round_path_rejects_traversal() {
        let store = RoundStore::new("/srv/rounds");

        for id in ["", "..", "../etc/passwd", "a/b", "a\\b", "x\0y"] {
            let err = store.round_path(id).unwrap_err();
            assert!(matches!(err, RoundError::InvalidRoundId(_)), "{id:?}");
        }
        assert_eq!(
            store.round_path("r-1").unwrap(),
            PathBuf::from("/srv/rounds/r-1.msgpack")
        );
    }

    #[tokio::test]
    async fn test_load_all_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        write_round(dir.path(), &round("a"));
        write_round(dir.path(), &round("b"));
        write_round(dir.path(), &round("c"));
        std::fs::write(dir.path().join("broken.msgpack"), b"\xc1garbage").unwrap();
        let not_a_round = rmp_serde::to_vec_named(&json!({"id": "x"})).unwrap();
        std::fs::write(dir.path().join("x.msgpack"), not_a_round).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let store = RoundStore::new(dir.path());
        let records = store.load_all().await.unwrap();

        let mut ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_load_all_keeps_listing_order() {
        let dir = tempfile::tempdir().unwrap();
        for id in ["r1", "r2", "r3", "r4", "r5"] {
            write_round(dir.path(), &round(id));
        }

        let listed: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .map(|p| p.file_stem().unwrap().to_string_lossy().into_owned())
            .collect();

        let store = RoundStore::new(dir.path());
        let records = store.load_all().await.unwrap();
        let ids: Vec<String> = records.into_iter().map(|r| r.id).collect();

        assert_eq!(ids, listed);
    }

    #[tokio::test]
    async fn test_load_all_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = RoundStore::new(dir.path().join("missing"));

        let err = store.load_all().await.unwrap_err();
        assert!(matches!(err, RoundError::ReadDir { .. }));
    }
}
