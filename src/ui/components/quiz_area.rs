use std::time::Instant;

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::session::machine::{Phase, QuizSession};
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

/// The question screen: prompt, answer line, and the verdict while in
/// Feedback. The countdown bar is rendered separately above this area.
pub struct QuizArea<'a> {
    session: &'a QuizSession,
    input: &'a LineInput,
    theme: &'a Theme,
    now: Instant,
}

impl<'a> QuizArea<'a> {
    pub fn new(
        session: &'a QuizSession,
        input: &'a LineInput,
        theme: &'a Theme,
        now: Instant,
    ) -> Self {
        Self {
            session,
            input,
            theme,
            now,
        }
    }
}

impl Widget for QuizArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let Some(question) = self.session.current_question() else {
            return;
        };

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),
                Constraint::Length(3),
                Constraint::Length(2),
            ])
            .split(area);

        // Prompt block with optional detail and hint.
        let mut prompt_lines = vec![
            Line::from(Span::styled(
                question.prompt.clone(),
                Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
            )),
        ];
        if let Some(ref detail) = question.detail {
            prompt_lines.push(Line::from(""));
            prompt_lines.push(Line::from(Span::styled(
                detail.clone(),
                Style::default().fg(colors.fg()),
            )));
        }
        if let Some(ref hint) = question.hint {
            prompt_lines.push(Line::from(""));
            prompt_lines.push(Line::from(Span::styled(
                format!("hint: {hint}"),
                Style::default().fg(colors.text_pending()),
            )));
        }
        let prompt_block = Block::bordered()
            .title(format!(
                " Question {}/{} ",
                self.session.question_number(),
                self.session.working_set().len()
            ))
            .border_style(Style::default().fg(colors.border()));
        let prompt = Paragraph::new(prompt_lines)
            .block(prompt_block)
            .wrap(Wrap { trim: true });
        prompt.render(layout[0], buf);

        // Answer line with a styled cursor cell.
        let (before, cursor_ch, after) = self.input.render_parts();
        let answer_line = Line::from(vec![
            Span::styled(before.to_string(), Style::default().fg(colors.fg())),
            Span::styled(
                cursor_ch.map(String::from).unwrap_or_else(|| " ".to_string()),
                Style::default()
                    .fg(colors.text_cursor_fg())
                    .bg(colors.text_cursor_bg()),
            ),
            Span::styled(after.to_string(), Style::default().fg(colors.fg())),
        ]);
        let answer_block = Block::bordered()
            .title(" Your answer ")
            .border_style(Style::default().fg(colors.accent_dim()));
        Paragraph::new(answer_line)
            .block(answer_block)
            .render(layout[1], buf);

        // Verdict while feedback is showing.
        if matches!(self.session.phase(), Phase::Feedback { .. })
            && let Some(record) = self.session.last_record()
        {
            let verdict = if record.is_timeout {
                Line::from(vec![
                    Span::styled(
                        " Time's up! ",
                        Style::default()
                            .fg(colors.error())
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("Answer: {}", record.correct_answer),
                        Style::default().fg(colors.fg()),
                    ),
                ])
            } else if record.is_correct {
                Line::from(Span::styled(
                    " Correct! ",
                    Style::default()
                        .fg(colors.success())
                        .add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(vec![
                    Span::styled(
                        " Not quite. ",
                        Style::default()
                            .fg(colors.error())
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("Answer: {}", record.correct_answer),
                        Style::default().fg(colors.fg()),
                    ),
                ])
            };
            Paragraph::new(verdict).render(layout[2], buf);
        } else {
            let elapsed = self.session.timer().elapsed_ms(self.now) / 1000;
            let status = Line::from(Span::styled(
                format!(" {elapsed}s elapsed. [Enter] Submit [Esc] Leave "),
                Style::default().fg(colors.text_pending()),
            ));
            Paragraph::new(status).render(layout[2], buf);
        }
    }
}
