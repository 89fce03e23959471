use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// --- Subject ---

/// Name of a top-level grouping of chapters. Subjects come from the configured
/// syllabus; the engine never invents one.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(String);

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Subject {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Priority ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Priority::High => Priority::Medium,
            Priority::Medium => Priority::Low,
            Priority::Low => Priority::High,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown priority `{0}` (expected High, Medium or Low)")]
pub struct ParsePriorityError(pub String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Priority::High),
            "Medium" => Ok(Priority::Medium),
            "Low" => Ok(Priority::Low),
            other => Err(ParsePriorityError(other.to_string())),
        }
    }
}

// --- Chapter ---

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub name: String,
    pub priority: Priority,
}

impl Chapter {
    /// Builds a chapter with its name trimmed. Emptiness is checked on insertion.
    pub fn new(name: &str, priority: Priority) -> Self {
        Self {
            name: name.trim().to_string(),
            priority,
        }
    }
}

// --- Errors ---

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("chapter `{name}` already exists in {subject}")]
    DuplicateChapter { subject: Subject, name: String },
    #[error("chapter name is empty")]
    EmptyName,
    #[error("unknown subject `{0}`")]
    UnknownSubject(String),
}

// --- Catalog ---

/// Ordered chapter lists for every configured subject. Subject order is the
/// syllabus order and chapter order is insertion order; both are preserved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<(Subject, Vec<Chapter>)>,
}

impl Catalog {
    pub fn new(entries: Vec<(Subject, Vec<Chapter>)>) -> Self {
        Self { entries }
    }

    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.entries.iter().map(|(subject, _)| subject)
    }

    pub fn has_subject(&self, subject: &str) -> bool {
        self.entries.iter().any(|(s, _)| s.as_str() == subject)
    }

    pub fn subject(&self, subject: &str) -> Option<&Subject> {
        self.entries
            .iter()
            .find(|(s, _)| s.as_str() == subject)
            .map(|(s, _)| s)
    }

    /// Chapters of `subject` in insertion order; empty for an unknown subject.
    pub fn chapters(&self, subject: &str) -> &[Chapter] {
        self.entries
            .iter()
            .find(|(s, _)| s.as_str() == subject)
            .map(|(_, chapters)| chapters.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Subject, &[Chapter])> {
        self.entries
            .iter()
            .map(|(subject, chapters)| (subject, chapters.as_slice()))
    }

    pub fn contains(&self, subject: &str, name: &str) -> bool {
        self.chapters(subject).iter().any(|c| c.name == name)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, chapters)| chapters.len()).sum()
    }

    fn chapters_mut(&mut self, subject: &str) -> Result<&mut Vec<Chapter>, CatalogError> {
        self.entries
            .iter_mut()
            .find(|(s, _)| s.as_str() == subject)
            .map(|(_, chapters)| chapters)
            .ok_or_else(|| CatalogError::UnknownSubject(subject.to_string()))
    }

    /// Appends `chapter` to the end of the subject's list. Names are compared
    /// case-sensitively after trimming.
    pub fn add(&mut self, subject: &str, chapter: Chapter) -> Result<(), CatalogError> {
        let chapter = Chapter::new(&chapter.name, chapter.priority);
        if chapter.name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        let subject_id = self
            .subject(subject)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownSubject(subject.to_string()))?;
        let chapters = self.chapters_mut(subject)?;
        if chapters.iter().any(|c| c.name == chapter.name) {
            return Err(CatalogError::DuplicateChapter {
                subject: subject_id,
                name: chapter.name,
            });
        }
        chapters.push(chapter);
        Ok(())
    }

    /// Removes the named chapter. Returns whether anything was removed.
    pub fn remove(&mut self, subject: &str, name: &str) -> Result<bool, CatalogError> {
        let chapters = self.chapters_mut(subject)?;
        let before = chapters.len();
        chapters.retain(|c| c.name != name);
        Ok(chapters.len() != before)
    }

    pub fn replace(&mut self, subject: &str, chapters: Vec<Chapter>) -> Result<(), CatalogError> {
        *self.chapters_mut(subject)? = chapters;
        Ok(())
    }
}
