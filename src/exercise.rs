//! Static registry of the practice exercises and their session parameters.
//! Continuation after the last stage of one exercise routes to the next entry
//! in `ALL_EXERCISES` order.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExerciseId {
    Vocab,
    Dictation,
    Scenario,
    Composition,
}

impl ExerciseId {
    pub fn to_key(self) -> &'static str {
        match self {
            ExerciseId::Vocab => "vocab",
            ExerciseId::Dictation => "dictation",
            ExerciseId::Scenario => "scenario",
            ExerciseId::Composition => "composition",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "vocab" => Some(ExerciseId::Vocab),
            "dictation" => Some(ExerciseId::Dictation),
            "scenario" => Some(ExerciseId::Scenario),
            "composition" => Some(ExerciseId::Composition),
            _ => None,
        }
    }

    #[allow(dead_code)] // Used by tests
    pub fn all() -> &'static [ExerciseId] {
        &[
            ExerciseId::Vocab,
            ExerciseId::Dictation,
            ExerciseId::Scenario,
            ExerciseId::Composition,
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExerciseKind {
    /// Answers are verified against the bank (exact or fuzzy).
    Accuracy,
    /// Timed prompts with no single correct answer; scored on time use and
    /// response substance instead of correctness.
    FreeResponse,
}

/// Per-exercise constants, immutable for the lifetime of a session.
#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    pub questions_per_stage: usize,
    pub stages_total: u32,
    pub question_timeout_ms: u64,
    /// Fraction of the timeout after which the one-shot warning fires.
    pub warning_fraction: f64,
}

pub struct ExerciseDefinition {
    pub id: ExerciseId,
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ExerciseKind,
    pub bank_file: &'static str,
    pub config: SessionConfig,
    /// Similarity floor for fuzzy acceptance; unused by FreeResponse.
    pub match_threshold: f64,
}

pub const ALL_EXERCISES: &[ExerciseDefinition] = &[
    ExerciseDefinition {
        id: ExerciseId::Vocab,
        name: "Vocabulary Recall",
        description: "Translate the word or phrase",
        kind: ExerciseKind::Accuracy,
        bank_file: "vocab.json",
        config: SessionConfig {
            questions_per_stage: 10,
            stages_total: 3,
            question_timeout_ms: 30_000,
            warning_fraction: 0.75,
        },
        match_threshold: 0.8,
    },
    ExerciseDefinition {
        id: ExerciseId::Dictation,
        name: "Dictation",
        description: "Transcribe the sentence word for word",
        kind: ExerciseKind::Accuracy,
        bank_file: "dictation.json",
        config: SessionConfig {
            questions_per_stage: 5,
            stages_total: 3,
            question_timeout_ms: 60_000,
            warning_fraction: 0.8,
        },
        match_threshold: 0.9,
    },
    ExerciseDefinition {
        id: ExerciseId::Scenario,
        name: "Scenario Response",
        description: "Answer the situation with a suitable phrase",
        kind: ExerciseKind::Accuracy,
        bank_file: "scenario.json",
        config: SessionConfig {
            questions_per_stage: 8,
            stages_total: 2,
            question_timeout_ms: 45_000,
            warning_fraction: 0.75,
        },
        match_threshold: 0.7,
    },
    ExerciseDefinition {
        id: ExerciseId::Composition,
        name: "Timed Composition",
        description: "Write freely on the prompt before time runs out",
        kind: ExerciseKind::FreeResponse,
        bank_file: "composition.json",
        config: SessionConfig {
            questions_per_stage: 2,
            stages_total: 2,
            question_timeout_ms: 180_000,
            warning_fraction: 0.9,
        },
        match_threshold: 0.0,
    },
];

pub fn definition(id: ExerciseId) -> &'static ExerciseDefinition {
    ALL_EXERCISES
        .iter()
        .find(|d| d.id == id)
        .expect("every ExerciseId has a definition")
}

/// The exercise that follows `id` in the fixed practice sequence.
pub fn next_in_sequence(id: ExerciseId) -> Option<ExerciseId> {
    let pos = ALL_EXERCISES.iter().position(|d| d.id == id)?;
    ALL_EXERCISES.get(pos + 1).map(|d| d.id)
}
