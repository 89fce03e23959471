use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Widget;
use studydraw::engine::Totals;

use crate::ui::theme::Theme;

/// One-row bar with a centred `done/total  pct%` label.
pub struct ProgressBar<'a> {
    pub totals: Totals,
    pub theme: &'a Theme,
}

impl<'a> ProgressBar<'a> {
    pub fn new(totals: Totals, theme: &'a Theme) -> Self {
        Self { totals, theme }
    }

    fn label(&self) -> String {
        format!(
            "{}/{}  {}%",
            self.totals.done, self.totals.total, self.totals.percent
        )
    }
}

impl Widget for ProgressBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let colors = &self.theme.colors;

        let ratio = self.totals.ratio().clamp(0.0, 1.0);
        let filled_width = (ratio * area.width as f64).round() as u16;

        for x in area.x..area.x + area.width {
            let style = if x < area.x + filled_width {
                Style::default().fg(colors.bg()).bg(colors.bar_filled())
            } else {
                Style::default().fg(colors.fg()).bg(colors.bar_empty())
            };
            buf[(x, area.y)].set_style(style);
        }

        let label = self.label();
        let label_x = area.x + (area.width.saturating_sub(label.len() as u16)) / 2;
        for (i, ch) in label.chars().enumerate() {
            let x = label_x + i as u16;
            if x >= area.x + area.width {
                break;
            }
            let cell = &mut buf[(x, area.y)];
            cell.set_char(ch);
            cell.set_style(Style::default().add_modifier(Modifier::BOLD));
        }
    }
}
