use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One answered question. Appended by the state machine, never mutated.
/// `is_timeout` implies `is_correct == false`: a forced submission is
/// always judged incorrect without consulting the verifier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub is_timeout: bool,
    pub time_spent_ms: u64,
    /// Delay from question shown to first keystroke; None if the user never
    /// typed. Feeds the preparation-time metric of free-response scoring.
    pub time_to_first_input_ms: Option<u64>,
}

/// Aggregate of one completed stage, consumed by scoring and persistence.
#[derive(Clone, Debug)]
pub struct StageResult {
    pub correct: usize,
    pub total: usize,
    pub elapsed_ms: u64,
    pub records: Vec<AnswerRecord>,
}

impl StageResult {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64 * 100.0
    }
}

/// Compact per-session entry kept in the bounded history log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSummary {
    pub timestamp: DateTime<Utc>,
    pub score: u32,
    pub correct: usize,
    pub total: usize,
    pub elapsed_ms: u64,
}

impl SessionSummary {
    pub fn from_stage(result: &StageResult, score: u32) -> Self {
        Self {
            timestamp: Utc::now(),
            score,
            correct: result.correct,
            total: result.total,
            elapsed_ms: result.elapsed_ms,
        }
    }
}
