use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget, Wrap};
use studydraw::engine::DrawResult;

use crate::ui::layout::centered_rect;
use crate::ui::theme::Theme;

/// Popup revealing the active draw.
pub struct DrawModal<'a> {
    pub result: &'a DrawResult,
    pub theme: &'a Theme,
}

impl<'a> DrawModal<'a> {
    pub fn new(result: &'a DrawResult, theme: &'a Theme) -> Self {
        Self { result, theme }
    }
}

impl Widget for DrawModal<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let popup = centered_rect(50, 40, area);
        Clear.render(popup, buf);

        let block = Block::bordered()
            .title(" Your next chapter ")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(popup);
        block.render(popup, buf);

        let chapter = &self.result.chapter;
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                self.result.subject.as_str(),
                Style::default().fg(colors.muted()),
            )),
            Line::from(Span::styled(
                chapter.name.as_str(),
                Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("{} priority", chapter.priority),
                Style::default().fg(colors.priority(chapter.priority)),
            )),
            Line::from(Span::styled(
                format!("drawn from {}", self.result.source),
                Style::default().fg(colors.muted()),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "[c] Complete  [r] Redraw  [Esc] Dismiss",
                Style::default().fg(colors.accent()),
            )),
        ];

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}
