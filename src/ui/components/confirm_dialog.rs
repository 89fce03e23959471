use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget, Wrap};

use crate::ui::layout::centered_rect;
use crate::ui::theme::Theme;

pub struct ConfirmDialog<'a> {
    pub message: &'a str,
    pub theme: &'a Theme,
}

impl<'a> ConfirmDialog<'a> {
    pub fn new(message: &'a str, theme: &'a Theme) -> Self {
        Self { message, theme }
    }
}

impl Widget for ConfirmDialog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let popup = centered_rect(40, 20, area);
        Clear.render(popup, buf);

        let block = Block::bordered()
            .title(" Confirm ")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(colors.warning()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(popup);
        block.render(popup, buf);

        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                self.message,
                Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("[y] ", Style::default().fg(colors.warning())),
                Span::styled("Yes   ", Style::default().fg(colors.fg())),
                Span::styled("[n] ", Style::default().fg(colors.accent())),
                Span::styled("No", Style::default().fg(colors.fg())),
            ]),
        ];
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}
