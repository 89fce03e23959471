use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};
use studydraw::engine::{Chapter, Priority, Subject};

use crate::ui::layout::scroll_offset;
use crate::ui::theme::Theme;

/// Text being typed for a new chapter, and the priority it will get.
pub struct PendingInput<'a> {
    pub name: &'a str,
    pub priority: Priority,
}

/// Full-screen chapter list for one subject with an optional input row.
pub struct ChapterEditor<'a> {
    pub subject: &'a Subject,
    pub chapters: &'a [Chapter],
    pub selected: usize,
    pub input: Option<PendingInput<'a>>,
    pub theme: &'a Theme,
}

impl Widget for ChapterEditor<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(Line::from(Span::styled(
                format!(" Edit {} chapters ", self.subject),
                Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD),
            )))
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let input_height = if self.input.is_some() { 2 } else { 0 };
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(input_height)])
            .split(inner);

        let height = layout[0].height as usize;
        let offset = scroll_offset(self.selected, height);
        let list_focused = self.input.is_none();
        let lines: Vec<Line> = self
            .chapters
            .iter()
            .enumerate()
            .skip(offset)
            .take(height)
            .map(|(i, chapter)| {
                let mut line = Line::from(vec![
                    Span::styled(
                        format!(" {:<7}", chapter.priority.as_str()),
                        Style::default().fg(colors.priority(chapter.priority)),
                    ),
                    Span::styled(chapter.name.as_str(), Style::default().fg(colors.fg())),
                ]);
                if list_focused && i == self.selected {
                    line = line.style(Style::default().bg(colors.accent_dim()));
                }
                line
            })
            .collect();
        Paragraph::new(lines).render(layout[0], buf);

        if let Some(input) = self.input {
            let lines = vec![
                Line::from(Span::styled(
                    "─".repeat(layout[1].width as usize),
                    Style::default().fg(colors.border()),
                )),
                Line::from(vec![
                    Span::styled(
                        format!(" {:<7}", input.priority.as_str()),
                        Style::default()
                            .fg(colors.priority(input.priority))
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(input.name, Style::default().fg(colors.fg())),
                    Span::styled("▏", Style::default().fg(colors.accent())),
                ]),
            ];
            Paragraph::new(lines).render(layout[1], buf);
        }
    }
}
