pub mod remote;

use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::exercise::{ExerciseDefinition, ExerciseKind};

#[derive(Embed)]
#[folder = "assets/banks/"]
struct BankAssets;

/// One immutable content unit. `answers[0]` is the canonical answer shown in
/// feedback; the rest are accepted alternates. Free-response prompts carry no
/// answers at all.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub answers: Vec<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl Question {
    pub fn canonical_answer(&self) -> &str {
        self.answers.first().map(String::as_str).unwrap_or("")
    }

    pub fn alternates(&self) -> &[String] {
        if self.answers.len() > 1 {
            &self.answers[1..]
        } else {
            &[]
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuestionBank {
    pub questions: Vec<Question>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no question bank bundled for '{0}'")]
    MissingBank(String),
    #[error("question bank for '{exercise}' is not valid JSON: {source}")]
    Parse {
        exercise: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("question bank for '{0}' contains no questions")]
    EmptyBank(String),
    #[error("question {index} in '{exercise}' is malformed: {reason}")]
    Malformed {
        exercise: String,
        index: usize,
        reason: String,
    },
}

/// Load and validate the bank for an exercise. When the `network` feature is
/// enabled and a refresh URL is configured, a cached remote copy takes
/// precedence over the bundled asset; a bad remote copy falls back rather
/// than erroring.
pub fn load_bank(
    def: &ExerciseDefinition,
    remote_base_url: Option<&str>,
) -> Result<QuestionBank, LoadError> {
    if let Some(base) = remote_base_url
        && let Some(raw) = remote::fetch_bank_json(base, def.bank_file)
        && let Ok(bank) = parse_bank(def, &raw)
    {
        return Ok(bank);
    }

    let file = BankAssets::get(def.bank_file)
        .ok_or_else(|| LoadError::MissingBank(def.id.to_key().to_string()))?;
    let raw = String::from_utf8_lossy(file.data.as_ref()).to_string();
    parse_bank(def, &raw)
}

fn parse_bank(def: &ExerciseDefinition, raw: &str) -> Result<QuestionBank, LoadError> {
    let bank: QuestionBank = serde_json::from_str(raw).map_err(|e| LoadError::Parse {
        exercise: def.id.to_key().to_string(),
        source: e,
    })?;
    validate_bank(def, &bank)?;
    Ok(bank)
}

/// Load-time validation: the state machine never has to defend against a
/// malformed working set, because nothing malformed survives this gate.
pub fn validate_bank(def: &ExerciseDefinition, bank: &QuestionBank) -> Result<(), LoadError> {
    if bank.questions.is_empty() {
        return Err(LoadError::EmptyBank(def.id.to_key().to_string()));
    }
    for (index, q) in bank.questions.iter().enumerate() {
        let reason = if q.id.trim().is_empty() {
            Some("empty id")
        } else if q.prompt.trim().is_empty() {
            Some("empty prompt")
        } else if def.kind == ExerciseKind::Accuracy && q.answers.is_empty() {
            Some("no accepted answers")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(LoadError::Malformed {
                exercise: def.id.to_key().to_string(),
                index,
                reason: reason.to_string(),
            });
        }
    }
    let mut seen = std::collections::HashSet::new();
    for (index, q) in bank.questions.iter().enumerate() {
        if !seen.insert(q.id.as_str()) {
            return Err(LoadError::Malformed {
                exercise: def.id.to_key().to_string(),
                index,
                reason: format!("duplicate id '{}'", q.id),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::{self, ExerciseId};

    fn question(id: &str, prompt: &str, answers: &[&str]) -> Question {
        Question {
            id: id.to_string(),
            prompt: prompt.to_string(),
            detail: None,
            answers: answers.iter().map(|s| s.to_string()).collect(),
            hint: None,
        }
    }

    #[test]
    fn bundled_banks_load_and_validate() {
        for def in exercise::ALL_EXERCISES {
            let bank = load_bank(def, None).unwrap_or_else(|e| {
                panic!("bank for {} failed to load: {e}", def.id.to_key())
            });
            assert!(
                bank.questions.len() >= def.config.questions_per_stage,
                "bank for {} is smaller than one stage",
                def.id.to_key()
            );
        }
    }

    #[test]
    fn empty_bank_is_a_load_error() {
        let def = exercise::definition(ExerciseId::Vocab);
        let bank = QuestionBank { questions: vec![] };
        assert!(matches!(
            validate_bank(def, &bank),
            Err(LoadError::EmptyBank(_))
        ));
    }

    #[test]
    fn accuracy_question_without_answers_is_malformed() {
        let def = exercise::definition(ExerciseId::Vocab);
        let bank = QuestionBank {
            questions: vec![question("v1", "the house", &[])],
        };
        let err = validate_bank(def, &bank).unwrap_err();
        assert!(err.to_string().contains("no accepted answers"));
    }

    #[test]
    fn free_response_question_without_answers_is_fine() {
        let def = exercise::definition(ExerciseId::Composition);
        let bank = QuestionBank {
            questions: vec![question("c1", "Describe your morning", &[])],
        };
        assert!(validate_bank(def, &bank).is_ok());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let def = exercise::definition(ExerciseId::Vocab);
        let bank = QuestionBank {
            questions: vec![
                question("v1", "the house", &["la casa"]),
                question("v1", "the dog", &["el perro"]),
            ],
        };
        let err = validate_bank(def, &bank).unwrap_err();
        assert!(err.to_string().contains("duplicate id"));
    }

    #[test]
    fn canonical_and_alternates_split() {
        let q = question("v1", "the house", &["la casa", "una casa"]);
        assert_eq!(q.canonical_answer(), "la casa");
        assert_eq!(q.alternates(), &["una casa".to_string()]);

        let bare = question("c1", "prompt", &[]);
        assert_eq!(bare.canonical_answer(), "");
        assert!(bare.alternates().is_empty());
    }
}
