//! Stage scoring and longitudinal skill assessment.
//!
//! A stage score is a weighted sum of sub-metrics, each on a 0–100 scale,
//! clamped and rounded to an integer. The two metric families share the
//! combination rule; only the metric set and weights differ. Assessment
//! folds up to 20 stored session scores into a level label.

use crate::content::Question;
use crate::engine::difficulty::{self, DifficultyPolicy};
use crate::exercise::{ExerciseDefinition, ExerciseKind};
use crate::session::record::{SessionSummary, StageResult};

/// Weights for verified-answer exercises. Must sum to 1.0.
#[derive(Clone, Copy, Debug)]
pub struct AccuracyWeights {
    pub accuracy: f64,
    pub difficulty: f64,
    pub consistency: f64,
    pub timing: f64,
}

/// Weights for free-response exercises. Must sum to 1.0.
#[derive(Clone, Copy, Debug)]
pub struct FreeResponseWeights {
    pub utilization: f64,
    pub content: f64,
    pub preparation: f64,
}

pub const ACCURACY_WEIGHTS: AccuracyWeights = AccuracyWeights {
    accuracy: 0.4,
    difficulty: 0.25,
    consistency: 0.2,
    timing: 0.15,
};

pub const FREE_RESPONSE_WEIGHTS: FreeResponseWeights = FreeResponseWeights {
    utilization: 0.4,
    content: 0.35,
    preparation: 0.25,
};

/// Answering in about this fraction of the allotted time is considered
/// ideal pacing for verified exercises.
const OPTIMAL_TIME_FRACTION: f64 = 0.4;

/// Word count at which the content proxy saturates at 100.
const CONTENT_TARGET_WORDS: f64 = 20.0;

/// Target bands (as fractions of allotted time) for free-response pacing.
const UTILIZATION_BAND: (f64, f64) = (0.5, 0.9);
const PREPARATION_BAND: (f64, f64) = (0.05, 0.25);

/// Compute the 0–100 score for a completed stage. `questions` is the working
/// set the stage ran against (difficulty classification needs the content,
/// records only carry ids).
pub fn stage_score(result: &StageResult, def: &ExerciseDefinition, questions: &[Question]) -> u32 {
    stage_score_with_policy(result, def, questions, difficulty::classify_by_length)
}

pub fn stage_score_with_policy(
    result: &StageResult,
    def: &ExerciseDefinition,
    questions: &[Question],
    policy: DifficultyPolicy,
) -> u32 {
    if result.total == 0 {
        return 0;
    }
    let raw = match def.kind {
        ExerciseKind::Accuracy => {
            let w = ACCURACY_WEIGHTS;
            result.accuracy() * w.accuracy
                + difficulty_weighted_accuracy(result, questions, policy) * w.difficulty
                + time_consistency(result) * w.consistency
                + timing_efficiency(result, def.config.question_timeout_ms) * w.timing
        }
        ExerciseKind::FreeResponse => {
            let w = FREE_RESPONSE_WEIGHTS;
            let allotted = def.config.question_timeout_ms;
            time_utilization(result, allotted) * w.utilization
                + content_proxy(result) * w.content
                + preparation_efficiency(result, allotted) * w.preparation
        }
    };
    raw.clamp(0.0, 100.0).round() as u32
}

/// Correctness weighted 1x/1.5x/2x by classified difficulty, as a
/// percentage of the achievable weighted total.
fn difficulty_weighted_accuracy(
    result: &StageResult,
    questions: &[Question],
    policy: DifficultyPolicy,
) -> f64 {
    let mut earned = 0.0;
    let mut possible = 0.0;
    for record in &result.records {
        let weight = questions
            .iter()
            .find(|q| q.id == record.question_id)
            .map(|q| policy(q).weight())
            .unwrap_or(1.0);
        possible += weight;
        if record.is_correct {
            earned += weight;
        }
    }
    if possible == 0.0 {
        return 0.0;
    }
    earned / possible * 100.0
}

/// 100 minus the mean absolute deviation of response times, normalized by
/// the mean response time. Uniform pacing scores 100.
fn time_consistency(result: &StageResult) -> f64 {
    let times: Vec<f64> = result
        .records
        .iter()
        .map(|r| r.time_spent_ms as f64)
        .collect();
    if times.len() < 2 {
        return 100.0;
    }
    let mean = times.iter().sum::<f64>() / times.len() as f64;
    if mean <= 0.0 {
        return 100.0;
    }
    let avg_dev = times.iter().map(|t| (t - mean).abs()).sum::<f64>() / times.len() as f64;
    (100.0 - avg_dev / mean * 100.0).clamp(0.0, 100.0)
}

/// Penalize distance from the optimal per-question duration, averaged over
/// the stage. Answering instantly or riding the timeout both cost points.
fn timing_efficiency(result: &StageResult, timeout_ms: u64) -> f64 {
    if result.records.is_empty() || timeout_ms == 0 {
        return 0.0;
    }
    let optimal = timeout_ms as f64 * OPTIMAL_TIME_FRACTION;
    let per_question: f64 = result
        .records
        .iter()
        .map(|r| {
            let distance = (r.time_spent_ms as f64 - optimal).abs() / timeout_ms as f64;
            (100.0 - distance * 100.0).clamp(0.0, 100.0)
        })
        .sum();
    per_question / result.records.len() as f64
}

/// Score a value against a target band: 100 inside, linear falloff outside.
fn band_score(value: f64, lo: f64, hi: f64) -> f64 {
    if value >= lo && value <= hi {
        100.0
    } else if value < lo {
        (value / lo * 100.0).clamp(0.0, 100.0)
    } else {
        let over = (value - hi) / (1.0 - hi).max(f64::EPSILON);
        (100.0 - over * 100.0).clamp(0.0, 100.0)
    }
}

/// How much of the allotted time was used: a target band, not
/// more-is-better.
fn time_utilization(result: &StageResult, allotted_ms: u64) -> f64 {
    if result.records.is_empty() || allotted_ms == 0 {
        return 0.0;
    }
    let (lo, hi) = UTILIZATION_BAND;
    let per_record: f64 = result
        .records
        .iter()
        .map(|r| band_score(r.time_spent_ms as f64 / allotted_ms as f64, lo, hi))
        .sum();
    per_record / result.records.len() as f64
}

/// Length-based proxy for response substance. Timed-out empty responses
/// score zero.
fn content_proxy(result: &StageResult) -> f64 {
    if result.records.is_empty() {
        return 0.0;
    }
    let per_record: f64 = result
        .records
        .iter()
        .map(|r| {
            let words = r.user_answer.split_whitespace().count() as f64;
            (words / CONTENT_TARGET_WORDS * 100.0).min(100.0)
        })
        .sum();
    per_record / result.records.len() as f64
}

/// Time before the first keystroke, against a small target band of the
/// allotted time: some planning is good, stalling is not.
fn preparation_efficiency(result: &StageResult, allotted_ms: u64) -> f64 {
    if result.records.is_empty() || allotted_ms == 0 {
        return 0.0;
    }
    let (lo, hi) = PREPARATION_BAND;
    let per_record: f64 = result
        .records
        .iter()
        .map(|r| match r.time_to_first_input_ms {
            Some(prep) => band_score(prep as f64 / allotted_ms as f64, lo, hi),
            None => 0.0,
        })
        .sum();
    per_record / result.records.len() as f64
}

// --- Longitudinal assessment ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SkillLevel {
    Beginner,
    Elementary,
    LowerIntermediate,
    Intermediate,
    UpperIntermediate,
    Advanced,
}

impl SkillLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            SkillLevel::Advanced
        } else if score >= 75.0 {
            SkillLevel::UpperIntermediate
        } else if score >= 60.0 {
            SkillLevel::Intermediate
        } else if score >= 45.0 {
            SkillLevel::LowerIntermediate
        } else if score >= 30.0 {
            SkillLevel::Elementary
        } else {
            SkillLevel::Beginner
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Elementary => "Elementary",
            SkillLevel::LowerIntermediate => "Lower-Intermediate",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::UpperIntermediate => "Upper-Intermediate",
            SkillLevel::Advanced => "Advanced",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SkillAssessment {
    pub mean_score: f64,
    pub consistency: f64,
    pub improvement: f64,
    pub overall: f64,
    pub level: SkillLevel,
    pub sessions: usize,
}

const ASSESS_MEAN_WEIGHT: f64 = 0.5;
const ASSESS_CONSISTENCY_WEIGHT: f64 = 0.25;
const ASSESS_IMPROVEMENT_WEIGHT: f64 = 0.25;

/// Fold stored session summaries (oldest first, at most the history cap)
/// into a skill assessment. None with no history.
pub fn assess(history: &[SessionSummary]) -> Option<SkillAssessment> {
    if history.is_empty() {
        return None;
    }
    let scores: Vec<f64> = history.iter().map(|s| s.score as f64).collect();
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;

    // Population stddev; a steady performer has low spread.
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    let consistency = (100.0 - variance.sqrt()).max(0.0);

    // Last minus first, re-centered on 50 so regressions still land in 0-100.
    let improvement = (scores[scores.len() - 1] - scores[0] + 50.0).clamp(0.0, 100.0);

    let overall = (mean * ASSESS_MEAN_WEIGHT
        + consistency * ASSESS_CONSISTENCY_WEIGHT
        + improvement * ASSESS_IMPROVEMENT_WEIGHT)
        .clamp(0.0, 100.0);

    Some(SkillAssessment {
        mean_score: mean,
        consistency,
        improvement,
        overall,
        level: SkillLevel::from_score(overall),
        sessions: history.len(),
    })
}
