use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::record::SessionSummary;

const SCHEMA_VERSION: u32 = 1;

/// Most recent session summaries kept per exercise; oldest evicted first.
pub const HISTORY_CAP: usize = 20;

/// Cross-session stage completion for one exercise. `completed` never
/// exceeds `total`, no matter how increments arrive.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkillProgress {
    pub completed: u32,
    pub total: u32,
    pub last_updated: DateTime<Utc>,
}

impl SkillProgress {
    pub fn new(total: u32) -> Self {
        Self {
            completed: 0,
            total,
            last_updated: Utc::now(),
        }
    }

    pub fn increment(&mut self, stages: u32) {
        self.completed = (self.completed.saturating_add(stages)).min(self.total);
        self.last_updated = Utc::now();
    }

    #[allow(dead_code)] // Used by integration tests
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

/// progress.json: exercise key to SkillProgress.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressData {
    pub schema_version: u32,
    pub exercises: HashMap<String, SkillProgress>,
}

impl Default for ProgressData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            exercises: HashMap::new(),
        }
    }
}

impl ProgressData {
    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}

/// used_questions.json: exercise key to the ids already presented. Stored
/// as sorted vecs for stable files; the engine works on HashSets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UsedQuestionsData {
    pub schema_version: u32,
    pub exercises: HashMap<String, Vec<String>>,
}

impl Default for UsedQuestionsData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            exercises: HashMap::new(),
        }
    }
}

/// session_history.json: exercise key to bounded, oldest-first summaries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryData {
    pub schema_version: u32,
    pub exercises: HashMap<String, Vec<SessionSummary>>,
}

impl Default for HistoryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            exercises: HashMap::new(),
        }
    }
}

impl HistoryData {
    /// Append a summary, evicting from the front past the cap.
    pub fn push(&mut self, exercise_key: &str, summary: SessionSummary) {
        let list = self.exercises.entry(exercise_key.to_string()).or_default();
        list.push(summary);
        while list.len() > HISTORY_CAP {
            list.remove(0);
        }
    }

    pub fn for_exercise(&self, exercise_key: &str) -> &[SessionSummary] {
        self.exercises
            .get(exercise_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
