use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, warn};

use studydraw::config::Config;
use studydraw::engine::{
    AppState, CatalogError, Chapter, DrawError, DrawSlot, DrawSource, Priority, PriorityFilter,
    Subject, Syllabus,
};
use studydraw::store::json_store::JsonStore;

use crate::ui::theme::Theme;

const NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Dashboard,
    Editor,
}

/// Destructive actions wait here for a y/n answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingConfirm {
    ResetProgress(Subject),
    RestoreDefaults(Subject),
}

impl PendingConfirm {
    pub fn message(&self) -> String {
        match self {
            PendingConfirm::ResetProgress(subject) => format!("Reset progress for {subject}?"),
            PendingConfirm::RestoreDefaults(subject) => {
                format!("Restore the default {subject} chapter list?")
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewChapter {
    pub name: String,
    pub priority: Priority,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
}

#[derive(Clone, Debug)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    shown_at: Instant,
}

impl Notice {
    fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            shown_at: Instant::now(),
        }
    }
}

pub struct App {
    pub screen: AppScreen,
    pub state: AppState,
    pub syllabus: Syllabus,
    pub slot: DrawSlot,
    pub config: Config,
    pub theme: &'static Theme,
    pub store: Option<JsonStore>,
    pub should_quit: bool,
    pub focused: usize,
    pub selected: usize,
    pub subject_filters: HashMap<Subject, PriorityFilter>,
    pub confirm: Option<PendingConfirm>,
    pub new_chapter: Option<NewChapter>,
    pub notice: Option<Notice>,
    rng: SmallRng,
}

impl App {
    pub fn new(config: Config, syllabus: Syllabus, state: AppState, store: Option<JsonStore>) -> Self {
        Self::with_rng(config, syllabus, state, store, SmallRng::from_entropy())
    }

    pub fn with_rng(
        config: Config,
        syllabus: Syllabus,
        state: AppState,
        store: Option<JsonStore>,
        rng: SmallRng,
    ) -> Self {
        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));
        Self {
            screen: AppScreen::Dashboard,
            state,
            syllabus,
            slot: DrawSlot::new(),
            config,
            theme,
            store,
            should_quit: false,
            focused: 0,
            selected: 0,
            subject_filters: HashMap::new(),
            confirm: None,
            new_chapter: None,
            notice: None,
            rng,
        }
    }

    // --- Queries ---

    pub fn subject_count(&self) -> usize {
        self.state.subjects().count()
    }

    pub fn focused_subject(&self) -> Option<&Subject> {
        self.state.subjects().nth(self.focused)
    }

    pub fn focused_chapters(&self) -> &[Chapter] {
        match self.focused_subject() {
            Some(subject) => self.state.list_chapters(subject.as_str()),
            None => &[],
        }
    }

    pub fn selected_chapter(&self) -> Option<&Chapter> {
        self.focused_chapters().get(self.selected)
    }

    pub fn filter_for(&self, subject: &Subject) -> PriorityFilter {
        self.subject_filters.get(subject).copied().unwrap_or_default()
    }

    // --- Navigation ---

    pub fn focus(&mut self, index: usize) {
        if index < self.subject_count() && index != self.focused {
            self.focused = index;
            self.selected = 0;
        }
    }

    pub fn focus_next(&mut self) {
        let count = self.subject_count();
        if count > 0 {
            self.focus((self.focused + 1) % count);
        }
    }

    pub fn focus_prev(&mut self) {
        let count = self.subject_count();
        if count > 0 {
            self.focus(if self.focused == 0 { count - 1 } else { self.focused - 1 });
        }
    }

    pub fn select_next(&mut self) {
        let len = self.focused_chapters().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let len = self.focused_chapters().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn cycle_subject_filter(&mut self) {
        if let Some(subject) = self.focused_subject().cloned() {
            let next = self.filter_for(&subject).cycle();
            self.subject_filters.insert(subject, next);
        }
    }

    pub fn cycle_combined_filter(&mut self) {
        self.config.combined_filter = self.config.combined_filter.cycle();
    }

    pub fn open_editor(&mut self) {
        if self.focused_subject().is_some() {
            self.screen = AppScreen::Editor;
            self.new_chapter = None;
        }
    }

    pub fn close_editor(&mut self) {
        self.screen = AppScreen::Dashboard;
        self.new_chapter = None;
        self.clamp_selection();
    }

    // --- Drawing ---

    pub fn draw_focused(&mut self) {
        if let Some(subject) = self.focused_subject().cloned() {
            let filter = self.filter_for(&subject);
            self.start_draw(&DrawSource::subject(subject, filter));
        }
    }

    pub fn draw_combined(&mut self) {
        self.start_draw(&DrawSource::combined(self.config.combined_filter));
    }

    fn start_draw(&mut self, source: &DrawSource) {
        let outcome = self.slot.draw(&self.state, source, &mut self.rng).map(|_| ());
        match outcome {
            Ok(()) => self.notice = None,
            Err(e) => self.report_draw_error(e),
        }
    }

    pub fn redraw(&mut self) {
        let outcome = self
            .slot
            .redraw(&self.state, &mut self.rng)
            .map(|result| result.map(|_| ()));
        if let Some(Err(e)) = outcome {
            self.report_draw_error(e);
        }
    }

    pub fn complete_draw(&mut self) {
        if let Some(result) = self.slot.complete(&self.state) {
            self.apply(result);
        }
    }

    pub fn dismiss_draw(&mut self) {
        if let Some(dismissed) = self.slot.dismiss() {
            debug!(chapter = %dismissed.chapter.name, "draw dismissed");
        }
    }

    fn report_draw_error(&mut self, e: DrawError) {
        let kind = match e {
            DrawError::EmptyPool { .. } => NoticeKind::Info,
            DrawError::UnknownSubject(_) => NoticeKind::Warning,
        };
        self.notice = Some(Notice::new(kind, capitalize(&e.to_string())));
    }

    // --- Mutations ---

    pub fn toggle_selected(&mut self) {
        let (Some(subject), Some(chapter)) = (self.focused_subject(), self.selected_chapter()) else {
            return;
        };
        let result = self.state.toggle_chapter(subject.as_str(), &chapter.name);
        self.apply(result);
    }

    pub fn delete_selected(&mut self) {
        let (Some(subject), Some(chapter)) = (self.focused_subject(), self.selected_chapter()) else {
            return;
        };
        let result = self.state.delete_chapter(subject.as_str(), &chapter.name);
        self.apply(result);
    }

    pub fn request_reset(&mut self) {
        if let Some(subject) = self.focused_subject().cloned() {
            self.confirm = Some(PendingConfirm::ResetProgress(subject));
        }
    }

    pub fn request_restore(&mut self) {
        if let Some(subject) = self.focused_subject().cloned() {
            self.confirm = Some(PendingConfirm::RestoreDefaults(subject));
        }
    }

    pub fn answer_confirm(&mut self, accepted: bool) {
        let Some(pending) = self.confirm.take() else {
            return;
        };
        if !accepted {
            return;
        }
        let result = match &pending {
            PendingConfirm::ResetProgress(subject) => self.state.reset_subject(subject.as_str()),
            PendingConfirm::RestoreDefaults(subject) => {
                self.state.restore_defaults(&self.syllabus, subject.as_str())
            }
        };
        self.apply(result);
    }

    pub fn start_new_chapter(&mut self) {
        self.new_chapter = Some(NewChapter::default());
    }

    pub fn cancel_new_chapter(&mut self) {
        self.new_chapter = None;
    }

    pub fn new_chapter_push(&mut self, ch: char) {
        if let Some(input) = self.new_chapter.as_mut() {
            input.name.push(ch);
        }
    }

    pub fn new_chapter_backspace(&mut self) {
        if let Some(input) = self.new_chapter.as_mut() {
            input.name.pop();
        }
    }

    pub fn new_chapter_cycle_priority(&mut self) {
        if let Some(input) = self.new_chapter.as_mut() {
            input.priority = input.priority.next();
        }
    }

    /// Adds the typed chapter. Blank input is ignored; a rejected name keeps the
    /// input open so it can be corrected.
    pub fn submit_new_chapter(&mut self) {
        let (Some(subject), Some(input)) = (self.focused_subject(), self.new_chapter.as_ref()) else {
            return;
        };
        if input.name.trim().is_empty() {
            return;
        }
        let priority = input.priority;
        let result = self
            .state
            .add_chapter(subject.as_str(), Chapter::new(&input.name, priority));
        let added = result.is_ok();
        self.apply(result);
        if added {
            self.new_chapter = Some(NewChapter {
                name: String::new(),
                priority,
            });
            self.selected = self.focused_chapters().len().saturating_sub(1);
        }
    }

    /// Adopts a successful result and writes it through; errors become a notice.
    fn apply(&mut self, result: Result<AppState, CatalogError>) {
        match result {
            Ok(next) => {
                self.state = next;
                self.clamp_selection();
                self.persist();
            }
            Err(e) => {
                self.notice = Some(Notice::new(NoticeKind::Warning, capitalize(&e.to_string())));
            }
        }
    }

    fn persist(&mut self) {
        if let Some(ref store) = self.store {
            if let Err(e) = store.save_state(&self.state) {
                warn!(error = %e, "failed to save state");
                self.notice = Some(Notice::new(
                    NoticeKind::Warning,
                    format!("Progress not saved: {e}"),
                ));
            }
        }
    }

    // --- Lifecycle ---

    pub fn on_tick(&mut self) {
        if self
            .notice
            .as_ref()
            .is_some_and(|n| n.shown_at.elapsed() >= NOTICE_TTL)
        {
            self.notice = None;
        }
    }

    /// Keeps the combined draw filter for the next run. Only that field is
    /// written back, so command-line overrides never end up in the file.
    pub fn quit(&mut self) {
        match Config::load() {
            Ok(mut saved) if saved.combined_filter != self.config.combined_filter => {
                saved.combined_filter = self.config.combined_filter;
                if let Err(e) = saved.save() {
                    warn!(error = %e, "failed to save config");
                }
            }
            Ok(_) => {}
            // Leave an unreadable file for the user to fix
            Err(e) => warn!(error = %e, "config not updated"),
        }
        self.should_quit = true;
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_app(store: Option<JsonStore>) -> App {
        let syllabus = Syllabus::default();
        let state = syllabus.initial_state();
        App::with_rng(
            Config::default(),
            syllabus,
            state,
            store,
            SmallRng::seed_from_u64(42),
        )
    }

    #[test]
    fn test_focus_wraps_and_resets_selection() {
        let mut app = make_app(None);
        app.select_next();
        app.select_next();
        assert_eq!(app.selected, 2);

        app.focus_prev();
        assert_eq!(app.focused_subject().unwrap().as_str(), "Chemistry");
        assert_eq!(app.selected, 0);
        app.focus_next();
        assert_eq!(app.focused_subject().unwrap().as_str(), "Physics");
    }

    #[test]
    fn test_toggle_selected_marks_chapter() {
        let mut app = make_app(None);
        app.toggle_selected();
        assert!(app.state.is_completed("Physics", "Units and Measurements"));
        app.toggle_selected();
        assert!(!app.state.is_completed("Physics", "Units and Measurements"));
    }

    #[test]
    fn test_draw_then_complete() {
        let mut app = make_app(None);
        app.draw_combined();
        let drawn = app.slot.active().cloned().unwrap();

        app.complete_draw();
        assert!(app.slot.active().is_none());
        assert!(app.state.is_completed(drawn.subject.as_str(), &drawn.chapter.name));
    }

    #[test]
    fn test_dismiss_changes_nothing() {
        let mut app = make_app(None);
        let before = app.state.clone();
        app.draw_focused();
        app.dismiss_draw();
        assert!(app.slot.active().is_none());
        assert_eq!(app.state, before);
    }

    #[test]
    fn test_empty_pool_shows_notice_and_keeps_draw() {
        let mut app = make_app(None);
        app.draw_focused();
        let active = app.slot.active().cloned();

        // Every default chapter is Medium, so a High-only draw has nothing
        app.config.combined_filter = PriorityFilter::Only(Priority::High);
        app.draw_combined();
        assert_eq!(app.slot.active().cloned(), active);
        let notice = app.notice.as_ref().unwrap();
        assert_eq!(notice.kind, NoticeKind::Info);
        assert_eq!(notice.text, "No remaining chapters in all subjects (High priority)");
    }

    #[test]
    fn test_reset_waits_for_confirmation() {
        let mut app = make_app(None);
        app.toggle_selected();
        app.request_reset();
        app.answer_confirm(false);
        assert_eq!(app.state.subject_progress("Physics").done, 1);

        app.request_reset();
        assert_eq!(
            app.confirm,
            Some(PendingConfirm::ResetProgress(Subject::new("Physics")))
        );
        app.answer_confirm(true);
        assert_eq!(app.state.subject_progress("Physics").done, 0);
        assert!(app.confirm.is_none());
    }

    #[test]
    fn test_add_duplicate_keeps_input_and_warns() {
        let mut app = make_app(None);
        app.open_editor();
        app.start_new_chapter();
        for ch in "Gravitation".chars() {
            app.new_chapter_push(ch);
        }
        app.submit_new_chapter();
        assert_eq!(app.new_chapter.as_ref().unwrap().name, "Gravitation");
        assert_eq!(app.notice.as_ref().unwrap().kind, NoticeKind::Warning);
        assert_eq!(app.focused_chapters().len(), 11);
    }

    #[test]
    fn test_add_chapter_with_priority() {
        let mut app = make_app(None);
        app.open_editor();
        app.start_new_chapter();
        for ch in "Fluids".chars() {
            app.new_chapter_push(ch);
        }
        app.new_chapter_cycle_priority();
        app.new_chapter_cycle_priority();
        app.submit_new_chapter();

        let last = app.focused_chapters().last().unwrap();
        assert_eq!(last, &Chapter::new("Fluids", Priority::High));
        assert_eq!(app.selected, 11);
        assert_eq!(app.new_chapter, Some(NewChapter { name: String::new(), priority: Priority::High }));
    }

    #[test]
    fn test_delete_selected_clamps_selection() {
        let mut app = make_app(None);
        for _ in 0..20 {
            app.select_next();
        }
        assert_eq!(app.selected, 10);
        app.toggle_selected();
        app.delete_selected();
        assert_eq!(app.focused_chapters().len(), 10);
        assert_eq!(app.selected, 9);
        assert_eq!(app.state.completed().count("Physics"), 0);
    }

    #[test]
    fn test_mutations_are_written_through() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let mut app = make_app(Some(store));
        app.toggle_selected();

        let reloaded = JsonStore::with_base_dir(dir.path().to_path_buf())
            .unwrap()
            .load_state(&app.syllabus);
        assert_eq!(reloaded, app.state);
    }

    #[test]
    fn test_save_failure_is_a_notice() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().join("data")).unwrap();
        std::fs::remove_dir_all(dir.path().join("data")).unwrap();
        let mut app = make_app(Some(store));

        app.toggle_selected();
        assert!(app.state.is_completed("Physics", "Units and Measurements"));
        let notice = app.notice.as_ref().unwrap();
        assert!(notice.text.starts_with("Progress not saved"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("no remaining"), "No remaining");
        assert_eq!(capitalize(""), "");
    }
}
