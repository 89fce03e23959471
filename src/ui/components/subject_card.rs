use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};
use studydraw::engine::{AppState, PriorityFilter, Subject};

use crate::ui::components::progress_bar::ProgressBar;
use crate::ui::layout::scroll_offset;
use crate::ui::theme::Theme;

/// A subject's progress bar, draw filter and chapter checklist.
pub struct SubjectCard<'a> {
    pub subject: &'a Subject,
    pub state: &'a AppState,
    pub filter: PriorityFilter,
    /// Highlighted row, only set on the focused card.
    pub selected: Option<usize>,
    pub theme: &'a Theme,
}

impl<'a> SubjectCard<'a> {
    pub fn new(subject: &'a Subject, state: &'a AppState, theme: &'a Theme) -> Self {
        Self {
            subject,
            state,
            filter: PriorityFilter::All,
            selected: None,
            theme,
        }
    }

    pub fn filter(mut self, filter: PriorityFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }
}

impl Widget for SubjectCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let focused = self.selected.is_some();

        let border = if focused {
            colors.border_focused()
        } else {
            colors.border()
        };
        let block = Block::bordered()
            .title(Line::from(Span::styled(
                format!(" {} ", self.subject),
                Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD),
            )))
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 3 {
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let subject = self.subject.as_str();
        ProgressBar::new(self.state.subject_progress(subject), self.theme).render(rows[0], buf);

        let filter_style = match self.filter {
            PriorityFilter::All => Style::default().fg(colors.muted()),
            PriorityFilter::Only(p) => Style::default().fg(colors.priority(p)),
        };
        Paragraph::new(Line::from(vec![
            Span::styled(" Draw: ", Style::default().fg(colors.muted())),
            Span::styled(self.filter.as_str(), filter_style),
        ]))
        .render(rows[1], buf);

        let chapters = self.state.list_chapters(subject);
        if chapters.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                " No chapters. Press [e] to add some.",
                Style::default().fg(colors.muted()),
            )))
            .render(rows[2], buf);
            return;
        }

        let height = rows[2].height as usize;
        let offset = scroll_offset(self.selected.unwrap_or(0), height);
        let lines: Vec<Line> = chapters
            .iter()
            .enumerate()
            .skip(offset)
            .take(height)
            .map(|(i, chapter)| {
                let done = self.state.is_completed(subject, &chapter.name);
                let (mark, name_style) = if done {
                    (
                        "[x] ",
                        Style::default()
                            .fg(colors.completed())
                            .add_modifier(Modifier::CROSSED_OUT),
                    )
                } else {
                    ("[ ] ", Style::default().fg(colors.fg()))
                };
                let mut line = Line::from(vec![
                    Span::styled(format!(" {mark}"), Style::default().fg(colors.muted())),
                    Span::styled(
                        format!("{} ", &chapter.priority.as_str()[..1]),
                        Style::default().fg(colors.priority(chapter.priority)),
                    ),
                    Span::styled(chapter.name.as_str(), name_style),
                ]);
                if self.selected == Some(i) {
                    line = line.style(Style::default().bg(colors.accent_dim()));
                }
                line
            })
            .collect();

        Paragraph::new(lines).render(rows[2], buf);
    }
}
