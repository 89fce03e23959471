use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::engine::catalog::{Catalog, Chapter, Priority, Subject};
use crate::engine::progress::CompletionSet;
use crate::engine::state::AppState;
use crate::engine::syllabus::Syllabus;

/// The persisted record. Field names are part of the on-disk contract.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    pub completed_chapters: BTreeMap<String, Vec<String>>,
    pub all_chapters: BTreeMap<String, Vec<Chapter>>,
}

/// Chapter entries as they have been written over time. Early records stored
/// bare names; those are read as Medium priority.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SavedChapter {
    Name(String),
    Record {
        name: String,
        #[serde(default)]
        priority: Priority,
    },
}

impl From<SavedChapter> for Chapter {
    fn from(saved: SavedChapter) -> Self {
        match saved {
            SavedChapter::Name(name) => Chapter {
                name,
                priority: Priority::Medium,
            },
            SavedChapter::Record { name, priority } => Chapter { name, priority },
        }
    }
}

impl SavedState {
    pub fn from_state(state: &AppState) -> Self {
        let mut completed_chapters = BTreeMap::new();
        let mut all_chapters = BTreeMap::new();
        for (subject, chapters) in state.catalog().iter() {
            all_chapters.insert(subject.to_string(), chapters.to_vec());
            completed_chapters.insert(
                subject.to_string(),
                state
                    .completed()
                    .names(subject.as_str())
                    .map(str::to_string)
                    .collect(),
            );
        }
        Self {
            completed_chapters,
            all_chapters,
        }
    }
}

pub fn encode_state(state: &AppState) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&SavedState::from_state(state))
}

/// Decodes a record against the configured syllabus.
///
/// Subjects missing from the record, or whose entry is malformed, fall back to
/// their default chapters and no completions. Subjects the syllabus does not
/// know are dropped, and a top-level field that is not an object is ignored.
/// Fails only when the record is not a JSON object.
pub fn decode_state(json: &str, syllabus: &Syllabus) -> serde_json::Result<AppState> {
    let (all_chapters, completed_chapters) = split_record(json)?;
    Ok(build_state(
        subject_map("allChapters", all_chapters),
        subject_map("completedChapters", completed_chapters),
        syllabus,
    ))
}

/// Like [`decode_state`], but also rejects an object carrying neither
/// `allChapters` nor `completedChapters`, so an unrelated JSON file cannot be
/// taken for an empty record.
pub fn decode_import(json: &str, syllabus: &Syllabus) -> serde_json::Result<AppState> {
    let (all_chapters, completed_chapters) = split_record(json)?;
    if all_chapters.is_none() && completed_chapters.is_none() {
        return Err(serde_json::Error::custom(
            "record has neither allChapters nor completedChapters",
        ));
    }
    Ok(build_state(
        subject_map("allChapters", all_chapters),
        subject_map("completedChapters", completed_chapters),
        syllabus,
    ))
}

/// The two top-level fields; `null` counts as absent.
fn split_record(json: &str) -> serde_json::Result<(Option<Value>, Option<Value>)> {
    let Value::Object(mut top) = serde_json::from_str::<Value>(json)? else {
        return Err(serde_json::Error::custom("saved state is not a JSON object"));
    };
    let mut take = |key: &str| top.remove(key).filter(|v| !v.is_null());
    Ok((take("allChapters"), take("completedChapters")))
}

fn subject_map(field: &str, value: Option<Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map,
        Some(other) => {
            warn!(field, found = %type_name(&other), "ignoring top-level field that is not an object");
            Map::new()
        }
        None => Map::new(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn build_state(
    all_chapters: Map<String, Value>,
    completed_chapters: Map<String, Value>,
    syllabus: &Syllabus,
) -> AppState {
    for name in all_chapters.keys().chain(completed_chapters.keys()) {
        if !syllabus.contains(name) {
            warn!(subject = %name, "dropping subject not in syllabus");
        }
    }

    let mut entries = Vec::new();
    let mut completed = Vec::new();
    for subject in syllabus.subjects() {
        let defaults = syllabus.defaults_for(subject.as_str()).unwrap_or(&[]);
        let chapters = match all_chapters.get(subject.as_str()) {
            Some(value) => decode_chapters(subject, value).unwrap_or_else(|| defaults.to_vec()),
            None => defaults.to_vec(),
        };
        entries.push((subject.clone(), chapters));

        if let Some(value) = completed_chapters.get(subject.as_str()) {
            match Vec::<String>::deserialize(value) {
                Ok(names) => completed.push((subject.clone(), names.into_iter().collect::<BTreeSet<_>>())),
                Err(e) => warn!(subject = %subject, error = %e, "ignoring malformed completion list"),
            }
        }
    }

    AppState::new(
        Catalog::new(entries),
        completed.into_iter().collect::<CompletionSet>(),
    )
}

fn decode_chapters(subject: &Subject, value: &Value) -> Option<Vec<Chapter>> {
    let saved = match Vec::<SavedChapter>::deserialize(value) {
        Ok(saved) => saved,
        Err(e) => {
            warn!(subject = %subject, error = %e, "malformed chapter list, using defaults");
            return None;
        }
    };

    let mut seen = HashSet::new();
    let mut chapters = Vec::with_capacity(saved.len());
    for chapter in saved.into_iter().map(Chapter::from) {
        if chapter.name.trim().is_empty() || !seen.insert(chapter.name.clone()) {
            warn!(subject = %subject, chapter = %chapter.name, "skipping blank or repeated chapter");
            continue;
        }
        chapters.push(chapter);
    }
    Some(chapters)
}
