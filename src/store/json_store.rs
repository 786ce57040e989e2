use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Serialize, de::DeserializeOwned};

use crate::store::schema::{HistoryData, ProgressData, UsedQuestionsData};

/// File-backed key-value persistence for cross-session state. Loads fall
/// back to defaults on any corruption; saves are atomic (tmp + rename) so a
/// crash mid-write never leaves a torn document. The app treats save
/// failures as non-fatal; losing progress beats blocking practice.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("phrasedr");
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    #[allow(dead_code)] // Used by integration tests
    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.file_path(name);
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
                Err(_) => T::default(),
            }
        } else {
            T::default()
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    pub fn load_progress(&self) -> ProgressData {
        let data: ProgressData = self.load("progress.json");
        if data.needs_reset() {
            ProgressData::default()
        } else {
            data
        }
    }

    pub fn save_progress(&self, data: &ProgressData) -> Result<()> {
        self.save("progress.json", data)
    }

    pub fn load_used_questions(&self) -> UsedQuestionsData {
        self.load("used_questions.json")
    }

    pub fn save_used_questions(&self, data: &UsedQuestionsData) -> Result<()> {
        self.save("used_questions.json", data)
    }

    pub fn load_history(&self) -> HistoryData {
        self.load("session_history.json")
    }

    pub fn save_history(&self, data: &HistoryData) -> Result<()> {
        self.save("session_history.json", data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::record::SessionSummary;
    use crate::store::schema::SkillProgress;
    use chrono::Utc;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_files_load_as_defaults() {
        let (_dir, store) = make_test_store();
        assert!(store.load_progress().exercises.is_empty());
        assert!(store.load_used_questions().exercises.is_empty());
        assert!(store.load_history().exercises.is_empty());
    }

    #[test]
    fn progress_round_trip() {
        let (_dir, store) = make_test_store();

        let mut data = ProgressData::default();
        let mut progress = SkillProgress::new(3);
        progress.increment(2);
        data.exercises.insert("vocab".to_string(), progress);
        store.save_progress(&data).unwrap();

        let loaded = store.load_progress();
        assert_eq!(loaded.exercises["vocab"].completed, 2);
        assert_eq!(loaded.exercises["vocab"].total, 3);
    }

    #[test]
    fn used_questions_round_trip() {
        let (_dir, store) = make_test_store();

        let mut data = UsedQuestionsData::default();
        data.exercises.insert(
            "dictation".to_string(),
            vec!["d1".to_string(), "d2".to_string()],
        );
        store.save_used_questions(&data).unwrap();

        let loaded = store.load_used_questions();
        assert_eq!(loaded.exercises["dictation"], vec!["d1", "d2"]);
    }

    #[test]
    fn history_round_trip_preserves_order() {
        let (_dir, store) = make_test_store();

        let mut data = HistoryData::default();
        for score in [40, 55, 70] {
            data.push(
                "vocab",
                SessionSummary {
                    timestamp: Utc::now(),
                    score,
                    correct: 8,
                    total: 10,
                    elapsed_ms: 90_000,
                },
            );
        }
        store.save_history(&data).unwrap();

        let loaded = store.load_history();
        let scores: Vec<u32> = loaded
            .for_exercise("vocab")
            .iter()
            .map(|s| s.score)
            .collect();
        assert_eq!(scores, vec![40, 55, 70]);
    }

    #[test]
    fn corrupt_file_loads_as_default() {
        let (_dir, store) = make_test_store();
        fs::write(store.file_path("progress.json"), "{not json").unwrap();
        assert!(store.load_progress().exercises.is_empty());
    }

    #[test]
    fn stale_schema_resets_progress() {
        let (_dir, store) = make_test_store();
        fs::write(
            store.file_path("progress.json"),
            r#"{"schema_version": 99, "exercises": {"vocab": {"completed": 2, "total": 3, "last_updated": "2026-01-01T00:00:00Z"}}}"#,
        )
        .unwrap();
        assert!(store.load_progress().exercises.is_empty());
    }

    #[test]
    fn save_replaces_atomically() {
        let (_dir, store) = make_test_store();
        let data = ProgressData::default();
        store.save_progress(&data).unwrap();
        store.save_progress(&data).unwrap();
        // No .tmp residue after successful saves.
        assert!(!store.file_path("progress.tmp").exists());
        assert!(store.file_path("progress.json").exists());
    }
}
