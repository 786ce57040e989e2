use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Widget};

use crate::ui::theme::Theme;

/// Countdown bar for the current question. Drains right-to-left and flips
/// to the warning color once the warning threshold is crossed.
pub struct TimerBar<'a> {
    pub remaining_secs: u64,
    pub fraction_remaining: f64,
    pub in_warning: bool,
    pub theme: &'a Theme,
}

impl<'a> TimerBar<'a> {
    pub fn new(
        remaining_secs: u64,
        fraction_remaining: f64,
        in_warning: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            remaining_secs,
            fraction_remaining: fraction_remaining.clamp(0.0, 1.0),
            in_warning,
            theme,
        }
    }
}

impl Widget for TimerBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Time ")
            .border_style(Style::default().fg(if self.in_warning {
                colors.warning()
            } else {
                colors.border()
            }));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let fill_color = if self.in_warning {
            colors.warning()
        } else {
            colors.bar_filled()
        };
        let filled_width = (self.fraction_remaining * inner.width as f64) as u16;
        let label = format!("{}s", self.remaining_secs);

        for x in inner.x..inner.x + inner.width {
            let style = if x < inner.x + filled_width {
                Style::default().fg(colors.bg()).bg(fill_color)
            } else {
                Style::default().fg(colors.fg()).bg(colors.bar_empty())
            };
            buf[(x, inner.y)].set_style(style);
        }

        let label_x = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        buf.set_string(label_x, inner.y, &label, Style::default().fg(colors.fg()));
    }
}
