use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::engine::scoring::SkillAssessment;
use crate::session::record::StageResult;
use crate::ui::theme::Theme;

/// Stage results with the longitudinal assessment and continuation hints.
pub struct ResultsPanel<'a> {
    pub exercise_name: &'a str,
    pub result: &'a StageResult,
    pub score: u32,
    pub stages_completed: u32,
    pub stages_total: u32,
    pub assessment: Option<SkillAssessment>,
    pub can_continue: bool,
    pub continue_label: Option<String>,
    pub theme: &'a Theme,
}

impl Widget for ResultsPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" {} — Stage Complete ", self.exercise_name))
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(inner);

        let score_color = if self.score >= 75 {
            colors.success()
        } else if self.score >= 45 {
            colors.warning()
        } else {
            colors.error()
        };
        let title = Paragraph::new(Line::from(vec![
            Span::styled("Score: ", Style::default().fg(colors.fg())),
            Span::styled(
                format!("{}", self.score),
                Style::default()
                    .fg(score_color)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" / 100", Style::default().fg(colors.text_pending())),
        ]))
        .alignment(Alignment::Center);
        title.render(layout[0], buf);

        let correct_line = Line::from(vec![
            Span::styled("  Correct:  ", Style::default().fg(colors.fg())),
            Span::styled(
                format!("{}/{}", self.result.correct, self.result.total),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  ({:.0}%)", self.result.accuracy()),
                Style::default().fg(colors.text_pending()),
            ),
        ]);
        Paragraph::new(correct_line).render(layout[1], buf);

        let time_line = Line::from(vec![
            Span::styled("  Time:     ", Style::default().fg(colors.fg())),
            Span::styled(
                format!("{:.0}s", self.result.elapsed_ms as f64 / 1000.0),
                Style::default().fg(colors.fg()),
            ),
        ]);
        Paragraph::new(time_line).render(layout[2], buf);

        let stage_line = Line::from(vec![
            Span::styled("  Stages:   ", Style::default().fg(colors.fg())),
            Span::styled(
                format!("{}/{}", self.stages_completed, self.stages_total),
                Style::default().fg(colors.accent()),
            ),
        ]);
        Paragraph::new(stage_line).render(layout[3], buf);

        if let Some(assessment) = self.assessment {
            let lines = vec![
                Line::from(vec![
                    Span::styled("  Level:    ", Style::default().fg(colors.fg())),
                    Span::styled(
                        assessment.level.label(),
                        Style::default()
                            .fg(colors.warning())
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  (over {} sessions)", assessment.sessions),
                        Style::default().fg(colors.text_pending()),
                    ),
                ]),
                Line::from(Span::styled(
                    format!(
                        "  skill {:.0} · avg {:.0} · consistency {:.0} · trend {:+.0}",
                        assessment.overall,
                        assessment.mean_score,
                        assessment.consistency,
                        assessment.improvement - 50.0
                    ),
                    Style::default().fg(colors.text_pending()),
                )),
            ];
            Paragraph::new(lines).render(layout[4], buf);
        }

        let mut footer_spans = Vec::new();
        if self.can_continue {
            let label = self
                .continue_label
                .clone()
                .unwrap_or_else(|| "Continue".to_string());
            footer_spans.push(Span::styled(
                format!(" [c] {label} "),
                Style::default().fg(colors.accent()),
            ));
        }
        footer_spans.push(Span::styled(
            " [d] Done ",
            Style::default().fg(colors.text_pending()),
        ));
        Paragraph::new(Line::from(footer_spans))
            .alignment(Alignment::Center)
            .render(layout[6], buf);
    }
}
