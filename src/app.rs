use std::collections::{HashMap, HashSet};
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::Config;
use crate::content::{self, QuestionBank};
use crate::engine::scoring::{self, SkillAssessment};
use crate::engine::selector;
use crate::exercise::{self, ExerciseId};
use crate::session::continuation::{self, ContinueTarget};
use crate::session::machine::{Phase, QuizSession, SessionEvent};
use crate::session::record::SessionSummary;
use crate::store::json_store::JsonStore;
use crate::store::schema::{HistoryData, ProgressData, SkillProgress, UsedQuestionsData};
use crate::ui::components::menu::{Menu, MenuRow};
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Home,
    Quiz,
    Results,
    LoadFailed,
}

/// One App owns at most one live QuizSession; concurrent visits would each
/// get their own App (and thus their own machine and timer).
pub struct App {
    pub screen: AppScreen,
    pub session: Option<QuizSession>,
    pub input: LineInput,
    pub menu: Menu<'static>,
    pub theme: &'static Theme,
    pub config: Config,
    pub store: Option<JsonStore>,
    pub progress: ProgressData,
    pub used_questions: UsedQuestionsData,
    pub history: HistoryData,
    pub should_quit: bool,
    pub load_error: Option<String>,
    pub last_score: Option<u32>,
    pub last_assessment: Option<SkillAssessment>,
    pub flash: Option<String>,
    current_exercise: Option<ExerciseId>,
    banks: HashMap<ExerciseId, QuestionBank>,
    rng: SmallRng,
}

impl App {
    pub fn new() -> Self {
        let mut config = Config::load().unwrap_or_default();
        config.validate();
        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));
        let menu = Menu::new(theme);

        let store = JsonStore::new().ok();
        let (progress, used_questions, history) = if let Some(ref s) = store {
            (s.load_progress(), s.load_used_questions(), s.load_history())
        } else {
            (
                ProgressData::default(),
                UsedQuestionsData::default(),
                HistoryData::default(),
            )
        };

        let mut app = Self {
            screen: AppScreen::Home,
            session: None,
            input: LineInput::new(),
            menu,
            theme,
            config,
            store,
            progress,
            used_questions,
            history,
            should_quit: false,
            load_error: None,
            last_score: None,
            last_assessment: None,
            flash: None,
            current_exercise: None,
            banks: HashMap::new(),
            rng: SmallRng::from_entropy(),
        };
        app.rebuild_menu();
        app
    }

    pub fn rebuild_menu(&mut self) {
        self.menu.rows = exercise::ALL_EXERCISES
            .iter()
            .enumerate()
            .map(|(i, def)| {
                let key = def.id.to_key();
                let completed = self
                    .progress
                    .exercises
                    .get(key)
                    .map(|p| p.completed)
                    .unwrap_or(0);
                let level = scoring::assess(self.history.for_exercise(key))
                    .map(|a| a.level.label().to_string());
                MenuRow {
                    key: format!("{}", i + 1),
                    name: def.name.to_string(),
                    description: def.description.to_string(),
                    progress: format!("{}/{} stages", completed, def.config.stages_total),
                    level,
                }
            })
            .collect();
        if self.menu.selected >= self.menu.rows.len() {
            self.menu.selected = 0;
        }
    }

    pub fn selected_exercise(&self) -> Option<ExerciseId> {
        exercise::ALL_EXERCISES
            .get(self.menu.selected)
            .map(|d| d.id)
    }

    /// Enter an exercise: fetch its bank, draw a working set, spin up the
    /// state machine. Failures land on the LoadFailed screen with a retry.
    pub fn start_exercise(&mut self, id: ExerciseId, now: Instant) {
        self.current_exercise = Some(id);
        let def = exercise::definition(id);

        if !self.banks.contains_key(&id) {
            match content::load_bank(def, self.config.remote_bank_url()) {
                Ok(bank) => {
                    self.banks.insert(id, bank);
                }
                Err(e) => {
                    self.load_error = Some(e.to_string());
                    self.screen = AppScreen::LoadFailed;
                    return;
                }
            }
        }

        let working_set = self.draw_working_set(id);
        if working_set.is_empty() {
            self.load_error = Some(format!("no questions available for '{}'", id.to_key()));
            self.screen = AppScreen::LoadFailed;
            return;
        }

        self.session = Some(QuizSession::new(
            def,
            working_set,
            self.config.feedback_delay_ms,
            now,
        ));
        self.input.clear();
        self.flash = None;
        self.load_error = None;
        self.screen = AppScreen::Quiz;
    }

    pub fn retry_load(&mut self, now: Instant) {
        if let Some(id) = self.current_exercise {
            self.start_exercise(id, now);
        } else {
            self.go_home();
        }
    }

    /// Select the next stage's questions and persist the updated used set.
    fn draw_working_set(&mut self, id: ExerciseId) -> Vec<crate::content::Question> {
        let def = exercise::definition(id);
        let key = id.to_key();
        let Some(bank) = self.banks.get(&id) else {
            return Vec::new();
        };

        let mut used: HashSet<String> = self
            .used_questions
            .exercises
            .get(key)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();

        let working_set = selector::select_stage(
            &bank.questions,
            &mut used,
            def.config.questions_per_stage,
            &mut self.rng,
        );

        let mut ids: Vec<String> = used.into_iter().collect();
        ids.sort();
        self.used_questions.exercises.insert(key.to_string(), ids);
        if let Some(ref store) = self.store {
            // Progress loss is preferred over blocking the user.
            let _ = store.save_used_questions(&self.used_questions);
        }

        working_set
    }

    /// Route a keystroke's side effects into the machine (first-input timing).
    pub fn note_input(&mut self, now: Instant) {
        if let Some(ref mut session) = self.session {
            session.note_input(now);
        }
    }

    pub fn submit_answer(&mut self, now: Instant) {
        let text = self.input.value().to_string();
        let event = match self.session {
            Some(ref mut session) => session.submit(&text, now),
            None => None,
        };
        if let Some(event) = event {
            self.apply_event(event, now);
        }
    }

    /// Advance time-driven transitions; call on every tick.
    pub fn tick(&mut self, now: Instant) {
        let events = match self.session {
            Some(ref mut session) if self.screen == AppScreen::Quiz => session.tick(now),
            _ => Vec::new(),
        };
        for event in events {
            self.apply_event(event, now);
        }
    }

    fn apply_event(&mut self, event: SessionEvent, _now: Instant) {
        match event {
            SessionEvent::QuestionReady => {
                self.input.clear();
                self.flash = None;
            }
            SessionEvent::Warning => {
                self.flash = Some("time is almost up".to_string());
            }
            SessionEvent::Feedback { .. } => {
                // Verdict is rendered from the machine's state.
            }
            SessionEvent::StageComplete => {
                self.on_stage_complete();
            }
        }
    }

    /// Score the finished stage, persist history and capped progress through
    /// the store, and move to the results screen.
    fn on_stage_complete(&mut self) {
        let Some(ref session) = self.session else {
            return;
        };
        let Some(result) = session.last_stage_result() else {
            return;
        };
        let def = session.definition();
        let key = def.id.to_key();

        let score = scoring::stage_score(result, def, session.working_set());
        let summary = SessionSummary::from_stage(result, score);

        self.history.push(key, summary);
        self.progress
            .exercises
            .entry(key.to_string())
            .or_insert_with(|| SkillProgress::new(def.config.stages_total))
            .increment(1);

        self.persist();

        self.last_score = Some(score);
        self.last_assessment = scoring::assess(self.history.for_exercise(key));
        self.flash = None;
        self.screen = AppScreen::Results;
    }

    /// Continue from the results screen: another stage, or the next exercise
    /// in the sequence. An empty re-selection sends the user home instead of
    /// erroring.
    pub fn request_continue(&mut self, now: Instant) {
        let Some(ref session) = self.session else {
            return;
        };
        let def = session.definition();
        let target = continuation::continue_target(
            def.id,
            session.stages_completed(),
            def.config.stages_total,
        );

        match target {
            ContinueTarget::NextStage => {
                let working_set = self.draw_working_set(def.id);
                if working_set.is_empty() {
                    self.go_home();
                    return;
                }
                if let Some(ref mut session) = self.session {
                    session.begin_stage(working_set, now);
                }
                self.input.clear();
                self.screen = AppScreen::Quiz;
            }
            ContinueTarget::NextExercise(next) => {
                self.finish_session();
                self.start_exercise(next, now);
            }
            ContinueTarget::Finished => {
                self.request_done();
            }
        }
    }

    /// Whether the results screen offers a continue affordance, and with
    /// what label.
    pub fn continue_affordance(&self) -> (bool, Option<String>) {
        let Some(ref session) = self.session else {
            return (false, None);
        };
        let def = session.definition();
        if !continuation::can_continue(
            def.id,
            session.stages_completed(),
            def.config.stages_total,
        ) {
            return (false, None);
        }
        let label = match continuation::continue_target(
            def.id,
            session.stages_completed(),
            def.config.stages_total,
        ) {
            ContinueTarget::NextStage => Some("Next stage".to_string()),
            ContinueTarget::NextExercise(next) => {
                Some(format!("Next: {}", exercise::definition(next).name))
            }
            ContinueTarget::Finished => None,
        };
        (label.is_some(), label)
    }

    /// Done from the results screen: progress is already persisted per
    /// stage; flush once more and go home.
    pub fn request_done(&mut self) {
        self.finish_session();
        self.go_home();
    }

    /// User backs out mid-session. Stage completions were written through as
    /// they happened, so the flush here is what guarantees an interrupted
    /// visit loses nothing.
    pub fn exit_session(&mut self) {
        if let Some(ref mut session) = self.session {
            session.request_exit();
        }
        self.persist();
        self.go_home();
    }

    fn finish_session(&mut self) {
        if let Some(ref mut session) = self.session {
            session.request_exit();
        }
        self.persist();
    }

    fn go_home(&mut self) {
        self.session = None;
        self.input.clear();
        self.flash = None;
        self.last_score = None;
        self.last_assessment = None;
        self.current_exercise = None;
        self.rebuild_menu();
        self.screen = AppScreen::Home;
    }

    fn persist(&self) {
        if let Some(ref store) = self.store {
            let _ = store.save_progress(&self.progress);
            let _ = store.save_used_questions(&self.used_questions);
            let _ = store.save_history(&self.history);
        }
    }

    /// Feedback currently on screen, for rendering.
    pub fn in_feedback(&self) -> bool {
        matches!(
            self.session.as_ref().map(|s| s.phase()),
            Some(Phase::Feedback { .. })
        )
    }
}
