use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Minimum width of a subject card before cards are stacked instead.
const MIN_CARD_WIDTH: u16 = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutTier {
    Columns, // cards side by side
    Stacked, // cards one above the other
}

impl LayoutTier {
    pub fn for_cards(area: Rect, cards: usize) -> Self {
        let cards = cards.max(1) as u16;
        if area.width / cards >= MIN_CARD_WIDTH {
            LayoutTier::Columns
        } else {
            LayoutTier::Stacked
        }
    }
}

pub struct DashboardLayout {
    pub header: Rect,
    pub cards: Vec<Rect>,
    pub footer: Rect,
}

impl DashboardLayout {
    pub fn new(area: Rect, cards: usize, footer_lines: u16) -> Self {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(footer_lines.max(1)),
            ])
            .split(area);

        let tier = LayoutTier::for_cards(vertical[1], cards);
        let direction = match tier {
            LayoutTier::Columns => Direction::Horizontal,
            LayoutTier::Stacked => Direction::Vertical,
        };
        let count = cards.max(1) as u32;
        let cards = Layout::default()
            .direction(direction)
            .constraints((0..count).map(|_| Constraint::Ratio(1, count)).collect::<Vec<_>>())
            .split(vertical[1])
            .to_vec();

        Self {
            header: vertical[0],
            cards,
            footer: vertical[2],
        }
    }
}

/// First index to render so that `selected` stays inside a window of `height` rows.
pub fn scroll_offset(selected: usize, height: usize) -> usize {
    if height == 0 {
        return 0;
    }
    selected.saturating_sub(height - 1)
}

pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    if width == 0 || hints.is_empty() {
        return Vec::new();
    }

    let prefix = "  ";
    let separator = "  ";
    let mut out: Vec<String> = Vec::new();
    let mut current = prefix.to_string();
    let mut has_hint = false;

    for hint in hints {
        if hint.is_empty() {
            continue;
        }
        let candidate = if has_hint {
            format!("{current}{separator}{hint}")
        } else {
            format!("{current}{hint}")
        };
        if candidate.chars().count() <= width {
            current = candidate;
            has_hint = true;
        } else {
            if has_hint {
                out.push(current);
            }
            current = format!("{prefix}{hint}");
            has_hint = true;
        }
    }

    if has_hint {
        out.push(current);
    }
    out
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    const MIN_POPUP_WIDTH: u16 = 48;
    const MIN_POPUP_HEIGHT: u16 = 9;

    let requested_w = area.width.saturating_mul(percent_x.min(100)) / 100;
    let requested_h = area.height.saturating_mul(percent_y.min(100)) / 100;

    let target_w = requested_w.max(MIN_POPUP_WIDTH).min(area.width);
    let target_h = requested_h.max(MIN_POPUP_HEIGHT).min(area.height);

    let left = area
        .x
        .saturating_add((area.width.saturating_sub(target_w)) / 2);
    let top = area
        .y
        .saturating_add((area.height.saturating_sub(target_h)) / 2);

    Rect::new(left, top, target_w, target_h)
}
