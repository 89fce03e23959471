use std::collections::{BTreeMap, BTreeSet};

use crate::engine::catalog::{Chapter, Subject};

/// Completed chapter names per subject. Membership only; order is irrelevant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompletionSet {
    completed: BTreeMap<Subject, BTreeSet<String>>,
}

impl CompletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self, subject: &str, name: &str) -> bool {
        self.completed
            .get(subject)
            .is_some_and(|names| names.contains(name))
    }

    pub fn names(&self, subject: &str) -> impl Iterator<Item = &str> {
        self.completed
            .get(subject)
            .into_iter()
            .flat_map(|names| names.iter().map(String::as_str))
    }

    pub fn count(&self, subject: &str) -> usize {
        self.completed.get(subject).map_or(0, BTreeSet::len)
    }

    /// Flips membership and returns the new completion state of `name`.
    pub fn toggle(&mut self, subject: &Subject, name: &str) -> bool {
        if self.unmark(subject.as_str(), name) {
            false
        } else {
            self.mark(subject, name);
            true
        }
    }

    /// Returns false when the chapter was already complete.
    pub fn mark(&mut self, subject: &Subject, name: &str) -> bool {
        self.completed
            .entry(subject.clone())
            .or_default()
            .insert(name.to_string())
    }

    // Emptied subjects are dropped so equality only sees real records.
    pub fn unmark(&mut self, subject: &str, name: &str) -> bool {
        let Some(names) = self.completed.get_mut(subject) else {
            return false;
        };
        let removed = names.remove(name);
        if names.is_empty() {
            self.completed.remove(subject);
        }
        removed
    }

    pub fn reset(&mut self, subject: &str) {
        self.completed.remove(subject);
    }

    /// Completed chapters of `chapters`, ignoring names no longer in the list.
    pub fn done_among(&self, subject: &str, chapters: &[Chapter]) -> usize {
        chapters
            .iter()
            .filter(|c| self.is_completed(subject, &c.name))
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Subject, &BTreeSet<String>)> {
        self.completed.iter()
    }
}

impl FromIterator<(Subject, BTreeSet<String>)> for CompletionSet {
    fn from_iter<T: IntoIterator<Item = (Subject, BTreeSet<String>)>>(iter: T) -> Self {
        Self {
            completed: iter
                .into_iter()
                .filter(|(_, names)| !names.is_empty())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::catalog::Priority;

    #[test]
    fn test_toggle_twice_restores_original() {
        let physics = Subject::new("Physics");
        let mut set = CompletionSet::new();
        set.mark(&physics, "Optics");
        let before = set.clone();

        assert!(set.toggle(&physics, "Gravitation"));
        assert!(!set.toggle(&physics, "Gravitation"));
        assert_eq!(set.names("Physics").collect::<Vec<_>>(), vec!["Optics"]);

        assert!(!set.toggle(&physics, "Optics"));
        assert!(set.toggle(&physics, "Optics"));
        assert_eq!(set, before);
    }

    #[test]
    fn test_mark_is_idempotent() {
        let physics = Subject::new("Physics");
        let mut set = CompletionSet::new();
        assert!(set.mark(&physics, "Optics"));
        assert!(!set.mark(&physics, "Optics"));
        assert!(set.is_completed("Physics", "Optics"));
        assert_eq!(set.count("Physics"), 1);
    }

    #[test]
    fn test_reset_clears_only_one_subject() {
        let physics = Subject::new("Physics");
        let chemistry = Subject::new("Chemistry");
        let mut set = CompletionSet::new();
        set.mark(&physics, "Optics");
        set.mark(&chemistry, "GOC");

        set.reset("Physics");
        assert_eq!(set.count("Physics"), 0);
        assert!(set.is_completed("Chemistry", "GOC"));
    }

    #[test]
    fn test_emptied_subject_equals_fresh_set() {
        let physics = Subject::new("Physics");
        let mut set = CompletionSet::new();
        set.toggle(&physics, "Optics");
        set.toggle(&physics, "Optics");
        assert_eq!(set, CompletionSet::new());

        let collected: CompletionSet = vec![(physics, BTreeSet::new())].into_iter().collect();
        assert_eq!(collected, CompletionSet::new());
    }

    #[test]
    fn test_done_among_ignores_orphans() {
        let physics = Subject::new("Physics");
        let mut set = CompletionSet::new();
        set.mark(&physics, "Optics");
        set.mark(&physics, "Deleted Long Ago");
        let chapters = vec![
            Chapter::new("Optics", Priority::Low),
            Chapter::new("Gravitation", Priority::High),
        ];
        assert_eq!(set.done_among("Physics", &chapters), 1);
        assert_eq!(set.count("Physics"), 2);
    }
}
