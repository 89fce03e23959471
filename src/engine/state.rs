use tracing::debug;

use crate::engine::catalog::{Catalog, CatalogError, Chapter, Subject};
use crate::engine::progress::CompletionSet;
use crate::engine::syllabus::Syllabus;

/// The persisted aggregate. Every mutation returns a fresh snapshot and leaves
/// `self` untouched, so callers decide when to persist and a failed operation
/// never has partial effects.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppState {
    catalog: Catalog,
    completed: CompletionSet,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    pub total: usize,
    pub done: usize,
    pub percent: u32,
}

impl Totals {
    pub fn new(total: usize, done: usize) -> Self {
        let percent = if total > 0 {
            ((done as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        };
        Self {
            total,
            done,
            percent,
        }
    }

    pub fn ratio(&self) -> f64 {
        if self.total > 0 {
            self.done as f64 / self.total as f64
        } else {
            0.0
        }
    }
}

impl AppState {
    pub fn new(catalog: Catalog, completed: CompletionSet) -> Self {
        Self { catalog, completed }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn completed(&self) -> &CompletionSet {
        &self.completed
    }

    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.catalog.subjects()
    }

    pub fn list_chapters(&self, subject: &str) -> &[Chapter] {
        self.catalog.chapters(subject)
    }

    pub fn is_completed(&self, subject: &str, name: &str) -> bool {
        self.completed.is_completed(subject, name)
    }

    fn known_subject(&self, subject: &str) -> Result<Subject, CatalogError> {
        self.catalog
            .subject(subject)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownSubject(subject.to_string()))
    }

    pub fn add_chapter(&self, subject: &str, chapter: Chapter) -> Result<Self, CatalogError> {
        let mut next = self.clone();
        next.catalog.add(subject, chapter)?;
        debug!(subject, "chapter added");
        Ok(next)
    }

    /// Removes the chapter and its completion record together. Absent chapters
    /// are not an error.
    pub fn delete_chapter(&self, subject: &str, name: &str) -> Result<Self, CatalogError> {
        let mut next = self.clone();
        let removed = next.catalog.remove(subject, name)?;
        next.completed.unmark(subject, name);
        debug!(subject, name, removed, "chapter deleted");
        Ok(next)
    }

    /// Replaces the subject's chapter list with the syllabus defaults. Completion
    /// records are kept, so restored chapters that were done stay done.
    pub fn restore_defaults(&self, syllabus: &Syllabus, subject: &str) -> Result<Self, CatalogError> {
        let defaults = syllabus
            .defaults_for(subject)
            .ok_or_else(|| CatalogError::UnknownSubject(subject.to_string()))?;
        let mut next = self.clone();
        next.catalog.replace(subject, defaults.to_vec())?;
        debug!(subject, chapters = defaults.len(), "defaults restored");
        Ok(next)
    }

    pub fn toggle_chapter(&self, subject: &str, name: &str) -> Result<Self, CatalogError> {
        let subject_id = self.known_subject(subject)?;
        let mut next = self.clone();
        let now_done = next.completed.toggle(&subject_id, name);
        debug!(subject, name, now_done, "completion toggled");
        Ok(next)
    }

    pub fn mark_completed(&self, subject: &str, name: &str) -> Result<Self, CatalogError> {
        let subject_id = self.known_subject(subject)?;
        let mut next = self.clone();
        if !next.completed.mark(&subject_id, name) {
            debug!(subject, name, "chapter was already complete");
        }
        Ok(next)
    }

    pub fn reset_subject(&self, subject: &str) -> Result<Self, CatalogError> {
        self.known_subject(subject)?;
        let mut next = self.clone();
        next.completed.reset(subject);
        debug!(subject, "progress reset");
        Ok(next)
    }

    pub fn subject_progress(&self, subject: &str) -> Totals {
        let chapters = self.catalog.chapters(subject);
        Totals::new(chapters.len(), self.completed.done_among(subject, chapters))
    }

    pub fn totals(&self) -> Totals {
        compute_totals(self)
    }
}

/// Progress across every subject. Only completion records that still name a
/// catalog chapter are counted.
pub fn compute_totals(state: &AppState) -> Totals {
    let (total, done) = state
        .catalog
        .iter()
        .fold((0, 0), |(total, done), (subject, chapters)| {
            (
                total + chapters.len(),
                done + state.completed.done_among(subject.as_str(), chapters),
            )
        });
    Totals::new(total, done)
}
