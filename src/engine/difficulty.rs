//! Content-difficulty classification feeding the weighted scoring terms.
//! The heuristic is a pluggable policy, not a fixed algorithm: exercises can
//! supply their own classifier, and scoring only relies on the three-way
//! split existing at all.

use crate::content::Question;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Correctness weight used by difficulty-weighted accuracy.
    pub fn weight(self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 1.5,
            Difficulty::Hard => 2.0,
        }
    }
}

pub type DifficultyPolicy = fn(&Question) -> Difficulty;

/// Default policy: length and word count of the expected answer (prompt for
/// free-response questions, which carry no answer).
pub fn classify_by_length(q: &Question) -> Difficulty {
    let basis = if q.answers.is_empty() {
        q.prompt.as_str()
    } else {
        q.canonical_answer()
    };
    let chars = basis.chars().count();
    let words = basis.split_whitespace().count();

    if words >= 3 || chars >= 12 {
        Difficulty::Hard
    } else if words == 2 || chars >= 7 {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    }
}
