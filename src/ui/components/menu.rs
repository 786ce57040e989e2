use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::ui::theme::Theme;

/// One selectable exercise row; progress and level are rebuilt by the app
/// whenever the home screen is entered.
pub struct MenuRow {
    pub key: String,
    pub name: String,
    pub description: String,
    pub progress: String,
    pub level: Option<String>,
}

pub struct Menu<'a> {
    pub rows: Vec<MenuRow>,
    pub selected: usize,
    pub theme: &'a Theme,
}

impl<'a> Menu<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            rows: Vec::new(),
            selected: 0,
            theme,
        }
    }

    pub fn next(&mut self) {
        if !self.rows.is_empty() {
            self.selected = (self.selected + 1) % self.rows.len();
        }
    }

    pub fn prev(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = self.rows.len() - 1;
        }
    }
}

impl Widget for &Menu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Practice ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let constraints: Vec<Constraint> = std::iter::once(Constraint::Length(1))
            .chain(self.rows.iter().map(|_| Constraint::Length(3)))
            .chain(std::iter::once(Constraint::Min(0)))
            .collect();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        let hint = Paragraph::new(Line::from(Span::styled(
            "Pick an exercise",
            Style::default().fg(colors.text_pending()),
        )))
        .alignment(Alignment::Center);
        hint.render(layout[0], buf);

        for (i, row) in self.rows.iter().enumerate() {
            let is_selected = i == self.selected;
            let indicator = if is_selected { " > " } else { "   " };

            let name_style = Style::default()
                .fg(if is_selected {
                    colors.accent()
                } else {
                    colors.fg()
                })
                .add_modifier(if is_selected {
                    Modifier::BOLD
                } else {
                    Modifier::empty()
                });

            let mut title_spans = vec![
                Span::styled(format!("{indicator}[{}] ", row.key), name_style),
                Span::styled(row.name.clone(), name_style),
                Span::styled(
                    format!("  {}", row.progress),
                    Style::default().fg(colors.success()),
                ),
            ];
            if let Some(ref level) = row.level {
                title_spans.push(Span::styled(
                    format!("  {level}"),
                    Style::default().fg(colors.warning()),
                ));
            }

            let lines = vec![
                Line::from(title_spans),
                Line::from(Span::styled(
                    format!("     {}", row.description),
                    Style::default().fg(colors.text_pending()),
                )),
            ];
            Paragraph::new(lines).render(layout[i + 1], buf);
        }
    }
}
