//! The per-visit session lifecycle: Presenting → Feedback → next question or
//! StageComplete → (new stage | Done). One machine instance per active
//! exercise visit owns its working set, its answer records, and exactly one
//! question timer; every transition out of a phase cancels the timing that
//! belonged to it.

use std::time::{Duration, Instant};

use crate::content::Question;
use crate::engine::verifier;
use crate::exercise::{ExerciseDefinition, ExerciseKind};
use crate::session::record::{AnswerRecord, StageResult};
use crate::session::timer::{QuestionTimer, TimerFire};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for one submission (user or timeout) on the current question.
    Presenting,
    /// Showing the verdict; auto-advances when the deadline passes.
    Feedback { until: Instant },
    /// Stage finished; results on screen, continuation pending.
    StageComplete,
    /// Terminal for this visit.
    Done,
}

/// Notifications for the rendering collaborator. The machine's state is read
/// directly each frame; these only mark the moments a frame can't infer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    QuestionReady,
    Warning,
    Feedback {
        is_correct: bool,
        correct_answer: String,
    },
    StageComplete,
}

pub struct QuizSession {
    def: &'static ExerciseDefinition,
    feedback_delay: Duration,
    working_set: Vec<Question>,
    current: usize,
    records: Vec<AnswerRecord>,
    phase: Phase,
    timer: QuestionTimer,
    presented_at: Instant,
    first_input_at: Option<Instant>,
    stage_started_at: Instant,
    correct_cumulative: usize,
    answered_cumulative: usize,
    stages_completed: u32,
    last_stage: Option<StageResult>,
}

impl QuizSession {
    /// Start a visit with the first stage's working set. The set must be
    /// non-empty; emptiness is a load error the caller surfaces before a
    /// session exists.
    pub fn new(
        def: &'static ExerciseDefinition,
        working_set: Vec<Question>,
        feedback_delay_ms: u64,
        now: Instant,
    ) -> Self {
        debug_assert!(!working_set.is_empty());
        let mut session = Self {
            def,
            feedback_delay: Duration::from_millis(feedback_delay_ms),
            working_set: Vec::new(),
            current: 0,
            records: Vec::new(),
            phase: Phase::Done,
            timer: QuestionTimer::new(),
            presented_at: now,
            first_input_at: None,
            stage_started_at: now,
            correct_cumulative: 0,
            answered_cumulative: 0,
            stages_completed: 0,
            last_stage: None,
        };
        session.begin_stage(working_set, now);
        session
    }

    /// Enter a fresh stage. Records are cleared; the cumulative counters and
    /// completed-stage count persist for the rest of the visit.
    pub fn begin_stage(&mut self, working_set: Vec<Question>, now: Instant) {
        self.timer.cancel();
        self.working_set = working_set;
        self.current = 0;
        self.records.clear();
        self.stage_started_at = now;
        self.present_current(now);
    }

    fn present_current(&mut self, now: Instant) {
        self.presented_at = now;
        self.first_input_at = None;
        self.timer.start(
            self.def.config.question_timeout_ms,
            self.def.config.warning_fraction,
            now,
        );
        self.phase = Phase::Presenting;
    }

    /// The app calls this on the first keystroke of each question; feeds the
    /// preparation-time metric.
    pub fn note_input(&mut self, now: Instant) {
        if self.phase == Phase::Presenting && self.first_input_at.is_none() {
            self.first_input_at = Some(now);
        }
    }

    /// User-initiated submission. Rejected outside Presenting, so a double
    /// submit (or a submit racing an expired timer) is a no-op.
    pub fn submit(&mut self, text: &str, now: Instant) -> Option<SessionEvent> {
        if self.phase != Phase::Presenting {
            return None;
        }
        Some(self.record_answer(Some(text), now))
    }

    /// Drive time-based transitions. Call on every tick of the event loop.
    pub fn tick(&mut self, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        match self.phase {
            Phase::Presenting => match self.timer.poll(now) {
                Some(TimerFire::Warning) => events.push(SessionEvent::Warning),
                Some(TimerFire::Expired) => {
                    // Forced submission; the not-already-submitted guard is
                    // the phase check inside record_answer's callers; here
                    // we know we are still Presenting.
                    events.push(self.record_answer(None, now));
                }
                None => {}
            },
            Phase::Feedback { until } => {
                if now >= until {
                    events.push(self.advance(now));
                }
            }
            Phase::StageComplete | Phase::Done => {}
        }
        events
    }

    fn record_answer(&mut self, text: Option<&str>, now: Instant) -> SessionEvent {
        self.timer.cancel();
        let question = &self.working_set[self.current];
        let correct_answer = question.canonical_answer().to_string();
        let is_timeout = text.is_none();
        let user_answer = text.unwrap_or("").to_string();

        // Timeouts skip the verifier outright. Free-response submissions are
        // "correct" whenever anything was written; substance is judged by
        // scoring, not the verifier.
        let is_correct = if is_timeout {
            false
        } else {
            match self.def.kind {
                ExerciseKind::Accuracy => verifier::is_correct(
                    &user_answer,
                    &correct_answer,
                    question.alternates(),
                    self.def.match_threshold,
                ),
                ExerciseKind::FreeResponse => !user_answer.trim().is_empty(),
            }
        };

        self.records.push(AnswerRecord {
            question_id: question.id.clone(),
            user_answer,
            correct_answer: correct_answer.clone(),
            is_correct,
            is_timeout,
            time_spent_ms: now.duration_since(self.presented_at).as_millis() as u64,
            time_to_first_input_ms: self
                .first_input_at
                .map(|t| t.duration_since(self.presented_at).as_millis() as u64),
        });
        if is_correct {
            self.correct_cumulative += 1;
        }
        self.answered_cumulative += 1;

        self.phase = Phase::Feedback {
            until: now + self.feedback_delay,
        };
        SessionEvent::Feedback {
            is_correct,
            correct_answer,
        }
    }

    fn advance(&mut self, now: Instant) -> SessionEvent {
        if self.current + 1 < self.working_set.len() {
            self.current += 1;
            self.present_current(now);
            SessionEvent::QuestionReady
        } else {
            self.complete_stage(now)
        }
    }

    fn complete_stage(&mut self, now: Instant) -> SessionEvent {
        self.timer.cancel();
        self.stages_completed += 1;
        let correct = self.records.iter().filter(|r| r.is_correct).count();
        self.last_stage = Some(StageResult {
            correct,
            total: self.records.len(),
            elapsed_ms: now.duration_since(self.stage_started_at).as_millis() as u64,
            records: self.records.clone(),
        });
        self.phase = Phase::StageComplete;
        SessionEvent::StageComplete
    }

    /// User-initiated exit from any phase. Cancels pending timing so nothing
    /// fires against a dead session; the caller persists partial credit.
    pub fn request_exit(&mut self) {
        self.timer.cancel();
        self.phase = Phase::Done;
    }

    // --- Read-only views for the app and the renderer ---

    pub fn definition(&self) -> &'static ExerciseDefinition {
        self.def
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::Presenting | Phase::Feedback { .. } => self.working_set.get(self.current),
            _ => None,
        }
    }

    pub fn question_number(&self) -> usize {
        self.current + 1
    }

    pub fn working_set(&self) -> &[Question] {
        &self.working_set
    }

    #[allow(dead_code)] // Used by integration tests
    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    pub fn last_record(&self) -> Option<&AnswerRecord> {
        self.records.last()
    }

    pub fn last_stage_result(&self) -> Option<&StageResult> {
        self.last_stage.as_ref()
    }

    pub fn stages_completed(&self) -> u32 {
        self.stages_completed
    }

    /// Correct/answered across all stages of this visit.
    pub fn cumulative(&self) -> (usize, usize) {
        (self.correct_cumulative, self.answered_cumulative)
    }

    pub fn timer(&self) -> &QuestionTimer {
        &self.timer
    }
}
