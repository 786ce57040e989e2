mod app;
mod config;
mod content;
mod engine;
mod event;
mod exercise;
mod session;
mod store;
mod ui;

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use app::{App, AppScreen};
use event::{AppEvent, EventHandler};
use exercise::ExerciseId;
use ui::components::quiz_area::QuizArea;
use ui::components::results_panel::ResultsPanel;
use ui::components::timer_bar::TimerBar;
use ui::layout::AppLayout;
use ui::line_input::{InputResult, LineInput};

#[derive(Parser)]
#[command(
    name = "phrasedr",
    version,
    about = "Terminal language-practice tutor with timed quiz sessions"
)]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Jump straight into an exercise (e.g. vocab)")]
    exercise: Option<String>,

    #[arg(long, help = "List available exercises and exit")]
    list_exercises: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_exercises {
        for def in exercise::ALL_EXERCISES {
            println!(
                "{:12} {} — {} ({} stages of {})",
                def.id.to_key(),
                def.name,
                def.description,
                def.config.stages_total,
                def.config.questions_per_stage,
            );
        }
        return Ok(());
    }

    let mut app = App::new();

    if let Some(theme_name) = cli.theme
        && let Some(theme) = ui::theme::Theme::load(&theme_name)
    {
        let theme: &'static ui::theme::Theme = Box::leak(Box::new(theme));
        app.theme = theme;
        app.menu.theme = theme;
    }

    if let Some(ref key) = cli.exercise {
        match ExerciseId::from_key(key) {
            Some(id) => app.start_exercise(id, Instant::now()),
            None => {
                eprintln!("Unknown exercise '{key}'; try --list-exercises");
                return Ok(());
            }
        }
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(100));

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        let now = Instant::now();
        terminal.draw(|frame| render(frame, app, now))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key, Instant::now()),
            AppEvent::Tick => app.tick(Instant::now()),
            AppEvent::Resize(_, _) => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent, now: Instant) {
    // Only process Press events; ignore Repeat/Release to avoid double input
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::Home => handle_home_key(app, key, now),
        AppScreen::Quiz => handle_quiz_key(app, key, now),
        AppScreen::Results => handle_results_key(app, key, now),
        AppScreen::LoadFailed => handle_load_failed_key(app, key, now),
    }
}

fn handle_home_key(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Enter => {
            if let Some(id) = app.selected_exercise() {
                app.start_exercise(id, now);
            }
        }
        KeyCode::Char(ch @ '1'..='9') => {
            let index = ch as usize - '1' as usize;
            if let Some(def) = exercise::ALL_EXERCISES.get(index) {
                app.start_exercise(def.id, now);
            }
        }
        _ => {}
    }
}

fn handle_quiz_key(app: &mut App, key: KeyEvent, now: Instant) {
    // Feedback is display-only; keys other than Esc are swallowed until
    // the auto-advance fires.
    if app.in_feedback() {
        if key.code == KeyCode::Esc {
            app.exit_session();
        }
        return;
    }

    if LineInput::last_key_was_insert(&key) {
        app.note_input(now);
    }

    match app.input.handle(key) {
        InputResult::Submit => app.submit_answer(now),
        InputResult::Cancel => app.exit_session(),
        InputResult::Continue => {}
    }
}

fn handle_results_key(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Char('c') => app.request_continue(now),
        KeyCode::Char('d') | KeyCode::Char('q') | KeyCode::Esc => app.request_done(),
        _ => {}
    }
}

fn handle_load_failed_key(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Char('r') => app.retry_load(now),
        KeyCode::Char('q') | KeyCode::Esc => app.request_done(),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App, now: Instant) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Home => render_home(frame, app),
        AppScreen::Quiz => render_quiz(frame, app, now),
        AppScreen::Results => render_results(frame, app),
        AppScreen::LoadFailed => render_load_failed(frame, app),
    }
}

fn render_home(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let layout = AppLayout::new(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " phrasedr ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            " language practice",
            Style::default()
                .fg(colors.text_pending())
                .bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, layout.header);

    let menu_area = ui::layout::centered_rect(60, 80, layout.main);
    frame.render_widget(&app.menu, menu_area);

    let footer = Paragraph::new(Line::from(Span::styled(
        " [Enter/1-4] Start  [j/k] Move  [q] Quit ",
        Style::default().fg(colors.text_pending()),
    )));
    frame.render_widget(footer, layout.footer);
}

fn render_quiz(frame: &mut ratatui::Frame, app: &App, now: Instant) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let Some(ref session) = app.session else {
        return;
    };

    let layout = AppLayout::new(area);
    let def = session.definition();

    let (correct, answered) = session.cumulative();
    let header_text = format!(
        " {} | Stage {}/{} | {}/{} correct ",
        def.name,
        session.stages_completed() + 1,
        def.config.stages_total,
        correct,
        answered,
    );
    let header = Paragraph::new(Line::from(Span::styled(
        header_text,
        Style::default()
            .fg(colors.header_fg())
            .bg(colors.header_bg())
            .add_modifier(Modifier::BOLD),
    )))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, layout.header);

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(layout.main);

    let timer = session.timer();
    let bar = TimerBar::new(
        timer.remaining_ms(now) / 1000,
        timer.fraction_remaining(now),
        timer.in_warning_zone(now),
        app.theme,
    );
    frame.render_widget(bar, main_layout[0]);

    let quiz = QuizArea::new(session, &app.input, app.theme, now);
    frame.render_widget(quiz, main_layout[1]);

    let footer_text = match app.flash {
        Some(ref flash) => format!(" {flash} "),
        None => " [Enter] Submit  [Esc] Leave ".to_string(),
    };
    let footer_style = if app.flash.is_some() {
        Style::default().fg(colors.warning())
    } else {
        Style::default().fg(colors.text_pending())
    };
    let footer = Paragraph::new(Line::from(Span::styled(footer_text, footer_style)));
    frame.render_widget(footer, layout.footer);
}

fn render_results(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let Some(ref session) = app.session else {
        return;
    };
    let Some(result) = session.last_stage_result() else {
        return;
    };

    let def = session.definition();
    let (can_continue, continue_label) = app.continue_affordance();

    let centered = ui::layout::centered_rect(60, 70, area);
    let panel = ResultsPanel {
        exercise_name: def.name,
        result,
        score: app.last_score.unwrap_or(0),
        stages_completed: session.stages_completed(),
        stages_total: def.config.stages_total,
        assessment: app.last_assessment,
        can_continue,
        continue_label,
        theme: app.theme,
    };
    frame.render_widget(panel, centered);
}

fn render_load_failed(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let centered = ui::layout::centered_rect(50, 40, area);
    let block = Block::bordered()
        .title(" Could not load exercise ")
        .border_style(Style::default().fg(colors.error()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(centered);
    block.render(centered, frame.buffer_mut());

    let message = app
        .load_error
        .clone()
        .unwrap_or_else(|| "unknown error".to_string());
    let lines = vec![
        Line::from(Span::styled(message, Style::default().fg(colors.fg()))),
        Line::from(""),
        Line::from(Span::styled(
            "[r] Retry   [Esc] Back",
            Style::default().fg(colors.text_pending()),
        )),
    ];
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}
