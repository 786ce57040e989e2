use std::collections::HashSet;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tempfile::TempDir;

use phrasedr::content::Question;
use phrasedr::engine::{scoring, selector};
use phrasedr::exercise::{ExerciseDefinition, ExerciseId, ExerciseKind, SessionConfig};
use phrasedr::session::machine::{Phase, QuizSession, SessionEvent};
use phrasedr::session::record::SessionSummary;
use phrasedr::store::json_store::JsonStore;
use phrasedr::store::schema::{HistoryData, ProgressData, SkillProgress, UsedQuestionsData};

static DRILL: ExerciseDefinition = ExerciseDefinition {
    id: ExerciseId::Vocab,
    name: "Flow Drill",
    description: "integration",
    kind: ExerciseKind::Accuracy,
    bank_file: "vocab.json",
    config: SessionConfig {
        questions_per_stage: 3,
        stages_total: 2,
        question_timeout_ms: 30_000,
        warning_fraction: 0.75,
    },
    match_threshold: 0.8,
};

static SLOW_DRILL: ExerciseDefinition = ExerciseDefinition {
    id: ExerciseId::Dictation,
    name: "Slow Drill",
    description: "integration",
    kind: ExerciseKind::Accuracy,
    bank_file: "dictation.json",
    config: SessionConfig {
        questions_per_stage: 1,
        stages_total: 1,
        question_timeout_ms: 60_000,
        warning_fraction: 0.8,
    },
    match_threshold: 0.9,
};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn bank_of(n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| Question {
            id: format!("q{i:02}"),
            prompt: format!("prompt {i}"),
            detail: None,
            answers: vec![format!("answer {i}")],
            hint: None,
        })
        .collect()
}

/// 20-question bank, 15 per stage: the first stage consumes 15 distinct ids,
/// the second takes the 5 leftovers plus 10 fresh picks after the pool
/// reset, and the used set ends holding exactly those 10.
#[test]
fn two_stage_selection_exhausts_then_resets_the_pool() {
    let bank = bank_of(20);
    let mut used: HashSet<String> = HashSet::new();
    let mut rng = SmallRng::seed_from_u64(1);

    let stage_one = selector::select_stage(&bank, &mut used, 15, &mut rng);
    assert_eq!(stage_one.len(), 15);
    let stage_one_ids: HashSet<String> = stage_one.iter().map(|q| q.id.clone()).collect();
    assert_eq!(stage_one_ids.len(), 15);
    assert_eq!(used, stage_one_ids);

    let stage_two = selector::select_stage(&bank, &mut used, 15, &mut rng);
    assert_eq!(stage_two.len(), 15);
    let stage_two_ids: HashSet<String> = stage_two.iter().map(|q| q.id.clone()).collect();
    assert_eq!(stage_two_ids.len(), 15, "stage two picks are distinct");

    // The 5 questions stage one left behind all appear in stage two.
    let leftovers: HashSet<String> = bank
        .iter()
        .map(|q| q.id.clone())
        .filter(|id| !stage_one_ids.contains(id))
        .collect();
    assert_eq!(leftovers.len(), 5);
    assert!(leftovers.is_subset(&stage_two_ids));

    // After the mid-selection reset, used holds exactly the topped-up ids.
    assert_eq!(used.len(), 10);
    assert!(used.is_disjoint(&leftovers));
    assert!(used.is_subset(&stage_two_ids));
}

/// A question with a 60s timeout and no input: at 60s the machine holds one
/// AnswerRecord with is_timeout and not is_correct, and sits in Feedback.
#[test]
fn unanswered_question_times_out_into_feedback() {
    let t0 = Instant::now();
    let mut session = QuizSession::new(&SLOW_DRILL, bank_of(1), 2_000, t0);

    // Ticks up to just before the deadline do nothing but warn.
    let mut fired = Vec::new();
    for elapsed in [10_000u64, 48_000, 59_999] {
        fired.extend(session.tick(t0 + ms(elapsed)));
    }
    assert_eq!(fired, vec![SessionEvent::Warning]);
    assert!(session.records().is_empty());

    let events = session.tick(t0 + ms(60_000));
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        SessionEvent::Feedback {
            is_correct: false,
            ..
        }
    ));

    assert_eq!(session.records().len(), 1);
    let record = &session.records()[0];
    assert!(record.is_timeout);
    assert!(!record.is_correct);
    assert_eq!(record.time_spent_ms, 60_000);
    assert!(matches!(session.phase(), Phase::Feedback { .. }));

    // The dead timer never fires again.
    assert!(session.tick(t0 + ms(61_000)).is_empty());
    assert_eq!(session.records().len(), 1);
}

/// Walk a two-stage visit the way the app drives it: select, answer, score,
/// persist, continue, and verify what lands in the store.
#[test]
fn full_visit_persists_progress_history_and_used_questions() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    let bank = bank_of(8);
    let mut rng = SmallRng::seed_from_u64(9);

    let mut used_data = UsedQuestionsData::default();
    let mut progress_data = ProgressData::default();
    let mut history_data = HistoryData::default();
    let key = DRILL.id.to_key();

    let t0 = Instant::now();
    let mut now = t0;

    let mut used: HashSet<String> = HashSet::new();
    let working_set = selector::select_stage(&bank, &mut used, 3, &mut rng);
    let mut session = QuizSession::new(&DRILL, working_set, 2_000, now);

    for stage in 0..2u32 {
        // Answer every question correctly, 10s per question.
        while session.phase() != Phase::StageComplete {
            now += ms(10_000);
            if let Phase::Presenting = session.phase() {
                let answer = session.current_question().unwrap().answers[0].clone();
                session.note_input(now - ms(4_000));
                session.submit(&answer, now).unwrap();
            }
            now += ms(2_500);
            session.tick(now);
        }
        assert_eq!(session.stages_completed(), stage + 1);

        // What the app does at StageComplete.
        let result = session.last_stage_result().unwrap().clone();
        assert_eq!(result.correct, 3);
        let score = scoring::stage_score(&result, &DRILL, session.working_set());
        assert!(score <= 100);

        history_data.push(key, SessionSummary::from_stage(&result, score));
        progress_data
            .exercises
            .entry(key.to_string())
            .or_insert_with(|| SkillProgress::new(DRILL.config.stages_total))
            .increment(1);

        let mut ids: Vec<String> = used.iter().cloned().collect();
        ids.sort();
        used_data.exercises.insert(key.to_string(), ids);

        store.save_used_questions(&used_data).unwrap();
        store.save_progress(&progress_data).unwrap();
        store.save_history(&history_data).unwrap();

        if stage == 0 {
            let next_set = selector::select_stage(&bank, &mut used, 3, &mut rng);
            assert_eq!(next_set.len(), 3);
            session.begin_stage(next_set, now);
        }
    }

    // Reload from disk and check the persisted picture.
    let progress = store.load_progress();
    assert_eq!(progress.exercises[key].completed, 2);
    assert_eq!(progress.exercises[key].total, 2);
    assert!(progress.exercises[key].is_complete());

    let history = store.load_history();
    assert_eq!(history.for_exercise(key).len(), 2);
    for summary in history.for_exercise(key) {
        assert_eq!(summary.correct, 3);
        assert_eq!(summary.total, 3);
    }

    let used_loaded = store.load_used_questions();
    assert_eq!(used_loaded.exercises[key].len(), 6, "6 of 8 ids used");

    // The assessment over this history has a level label.
    let assessment = scoring::assess(history.for_exercise(key)).unwrap();
    assert_eq!(assessment.sessions, 2);
    assert!(!assessment.level.label().is_empty());
}

/// Leaving mid-stage keeps the credit from stages that already completed:
/// the write-through at stage completion means an interrupted visit loses
/// only the unfinished stage.
#[test]
fn exit_mid_session_keeps_completed_stage_credit() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    let key = DRILL.id.to_key();

    let t0 = Instant::now();
    let mut session = QuizSession::new(&DRILL, bank_of(3), 2_000, t0);
    let mut now = t0;

    // Finish stage one.
    while session.phase() != Phase::StageComplete {
        now += ms(5_000);
        if session.phase() == Phase::Presenting {
            let answer = session.current_question().unwrap().answers[0].clone();
            session.submit(&answer, now).unwrap();
        }
        now += ms(2_500);
        session.tick(now);
    }
    let mut progress_data = ProgressData::default();
    progress_data
        .exercises
        .entry(key.to_string())
        .or_insert_with(|| SkillProgress::new(DRILL.config.stages_total))
        .increment(1);
    store.save_progress(&progress_data).unwrap();

    // Start stage two, answer one question, then bail out.
    session.begin_stage(bank_of(3), now);
    now += ms(4_000);
    session.submit("wrong", now);
    session.request_exit();
    assert_eq!(session.phase(), Phase::Done);
    store.save_progress(&progress_data).unwrap();

    let reloaded = store.load_progress();
    assert_eq!(reloaded.exercises[key].completed, 1);
    assert_eq!(reloaded.exercises[key].total, 2);

    // Nothing fires on a dead session.
    assert!(session.tick(now + ms(600_000)).is_empty());
}

/// The stage-cap invariant holds end to end: replaying more stage
/// completions than the exercise owns never pushes completed past total.
#[test]
fn repeated_visits_never_exceed_the_stage_cap() {
    let key = DRILL.id.to_key();
    let mut progress_data = ProgressData::default();

    for _ in 0..5 {
        progress_data
            .exercises
            .entry(key.to_string())
            .or_insert_with(|| SkillProgress::new(DRILL.config.stages_total))
            .increment(1);
    }

    let progress = &progress_data.exercises[key];
    assert_eq!(progress.completed, progress.total);
    assert_eq!(progress.completed, 2);
}
