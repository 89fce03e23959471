use std::collections::HashSet;
use std::fs;

use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::catalog::{Catalog, Chapter, Priority, Subject};
use crate::engine::progress::CompletionSet;
use crate::engine::state::AppState;

pub const DEFAULT_SYLLABUS: &str = "jee";

#[derive(Embed)]
#[folder = "assets/syllabi/"]
struct SyllabusAssets;

/// File shape of a syllabus definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct SyllabusFile {
    name: String,
    #[serde(default)]
    subjects: Vec<SubjectFile>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct SubjectFile {
    name: String,
    #[serde(default)]
    chapters: Vec<ChapterFile>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ChapterFile {
    name: String,
    #[serde(default)]
    priority: Priority,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectDefaults {
    pub subject: Subject,
    pub chapters: Vec<Chapter>,
}

/// The configured, ordered set of subjects together with the default chapter
/// list each one is restored to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Syllabus {
    pub name: String,
    subjects: Vec<SubjectDefaults>,
}

impl Syllabus {
    pub fn new(name: &str, subjects: Vec<SubjectDefaults>) -> Self {
        Self {
            name: name.to_string(),
            subjects,
        }
    }

    pub fn load(name: &str) -> Option<Self> {
        // User syllabi take precedence over bundled ones
        if let Some(config_dir) = dirs::config_dir() {
            let user_path = config_dir
                .join("studydraw")
                .join("syllabi")
                .join(format!("{name}.toml"));
            if let Ok(content) = fs::read_to_string(&user_path) {
                match Self::from_toml(&content) {
                    Ok(syllabus) => return Some(syllabus),
                    Err(e) => warn!(path = %user_path.display(), error = %e, "ignoring unreadable syllabus"),
                }
            }
        }

        Self::bundled(name)
    }

    /// The embedded syllabus of that name, ignoring any user file.
    pub fn bundled(name: &str) -> Option<Self> {
        let file = SyllabusAssets::get(&format!("{name}.toml"))?;
        let parsed = std::str::from_utf8(file.data.as_ref())
            .map_err(|e| e.to_string())
            .and_then(|content| Self::from_toml(content).map_err(|e| e.to_string()));
        match parsed {
            Ok(syllabus) => Some(syllabus),
            Err(e) => {
                warn!(syllabus = name, error = %e, "bundled syllabus unreadable");
                None
            }
        }
    }

    pub fn available() -> Vec<String> {
        SyllabusAssets::iter()
            .filter_map(|f| f.strip_suffix(".toml").map(|n| n.to_string()))
            .collect()
    }

    /// Parses a syllabus, dropping repeated subjects and blank or repeated
    /// chapter names.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let file: SyllabusFile = toml::from_str(content)?;
        let mut seen_subjects = HashSet::new();
        let mut subjects = Vec::with_capacity(file.subjects.len());

        for subject_file in file.subjects {
            let subject_name = subject_file.name.trim().to_string();
            if subject_name.is_empty() || !seen_subjects.insert(subject_name.clone()) {
                warn!(syllabus = %file.name, subject = %subject_name, "skipping blank or repeated subject");
                continue;
            }

            let mut seen_chapters = HashSet::new();
            let mut chapters = Vec::with_capacity(subject_file.chapters.len());
            for ch in subject_file.chapters {
                let chapter = Chapter::new(&ch.name, ch.priority);
                if chapter.name.is_empty() || !seen_chapters.insert(chapter.name.clone()) {
                    warn!(subject = %subject_name, chapter = %chapter.name, "skipping blank or repeated chapter");
                    continue;
                }
                chapters.push(chapter);
            }

            subjects.push(SubjectDefaults {
                subject: Subject::new(subject_name),
                chapters,
            });
        }

        Ok(Self {
            name: file.name,
            subjects,
        })
    }

    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.iter().map(|s| &s.subject)
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s.subject.as_str() == subject)
    }

    pub fn defaults_for(&self, subject: &str) -> Option<&[Chapter]> {
        self.subjects
            .iter()
            .find(|s| s.subject.as_str() == subject)
            .map(|s| s.chapters.as_slice())
    }

    pub fn initial_state(&self) -> AppState {
        let catalog = Catalog::new(
            self.subjects
                .iter()
                .map(|s| (s.subject.clone(), s.chapters.clone()))
                .collect(),
        );
        AppState::new(catalog, CompletionSet::new())
    }
}

/// The bundled default syllabus. User files are only consulted through
/// [`Syllabus::load`].
impl Default for Syllabus {
    fn default() -> Self {
        Self::bundled(DEFAULT_SYLLABUS).unwrap_or_else(|| Self {
            name: DEFAULT_SYLLABUS.to_string(),
            subjects: Vec::new(),
        })
    }
}
