use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::engine::catalog::{CatalogError, Chapter, ParsePriorityError, Priority, Subject};
use crate::engine::state::AppState;

// --- Filter ---

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl PriorityFilter {
    pub fn matches(self, priority: Priority) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::Only(p) => p == priority,
        }
    }

    /// All -> High -> Medium -> Low -> All
    pub fn cycle(self) -> Self {
        match self {
            PriorityFilter::All => PriorityFilter::Only(Priority::High),
            PriorityFilter::Only(Priority::Low) => PriorityFilter::All,
            PriorityFilter::Only(p) => PriorityFilter::Only(p.next()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PriorityFilter::All => "All",
            PriorityFilter::Only(p) => p.as_str(),
        }
    }
}

impl fmt::Display for PriorityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriorityFilter {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "All" {
            Ok(PriorityFilter::All)
        } else {
            s.parse().map(PriorityFilter::Only)
        }
    }
}

impl TryFrom<String> for PriorityFilter {
    type Error = ParsePriorityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PriorityFilter> for String {
    fn from(filter: PriorityFilter) -> Self {
        filter.as_str().to_string()
    }
}

// --- Scope / Source ---

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawScope {
    Subject(Subject),
    Combined,
}

/// The parameters a draw was made with. Redraw rebuilds the pool from these
/// against the live state rather than reusing the old pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawSource {
    pub scope: DrawScope,
    pub filter: PriorityFilter,
}

impl DrawSource {
    pub fn subject(subject: Subject, filter: PriorityFilter) -> Self {
        Self {
            scope: DrawScope::Subject(subject),
            filter,
        }
    }

    pub fn combined(filter: PriorityFilter) -> Self {
        Self {
            scope: DrawScope::Combined,
            filter,
        }
    }
}

impl fmt::Display for DrawSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = match &self.scope {
            DrawScope::Subject(subject) => subject.as_str(),
            DrawScope::Combined => "all subjects",
        };
        match self.filter {
            PriorityFilter::All => write!(f, "{scope}"),
            PriorityFilter::Only(p) => write!(f, "{scope} ({p} priority)"),
        }
    }
}

// --- Results / Errors ---

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawResult {
    pub subject: Subject,
    pub chapter: Chapter,
    pub source: DrawSource,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DrawError {
    #[error("no remaining chapters in {request}")]
    EmptyPool { request: DrawSource },
    #[error("unknown subject `{0}`")]
    UnknownSubject(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolEntry<'a> {
    pub subject: &'a Subject,
    pub chapter: &'a Chapter,
}

// --- Pool construction ---

/// Chapters eligible for `source`: not completed and matching the filter.
/// Ordered by subject (syllabus order) then catalog order.
pub fn build_pool<'a>(state: &'a AppState, source: &DrawSource) -> Result<Vec<PoolEntry<'a>>, DrawError> {
    let eligible = |subject: &'a Subject, chapters: &'a [Chapter]| {
        chapters
            .iter()
            .filter(move |c| {
                !state.is_completed(subject.as_str(), &c.name) && source.filter.matches(c.priority)
            })
            .map(move |chapter| PoolEntry { subject, chapter })
    };

    match &source.scope {
        DrawScope::Subject(subject) => {
            let subject = state
                .catalog()
                .subject(subject.as_str())
                .ok_or_else(|| DrawError::UnknownSubject(subject.to_string()))?;
            Ok(eligible(subject, state.list_chapters(subject.as_str())).collect())
        }
        DrawScope::Combined => Ok(state
            .catalog()
            .iter()
            .flat_map(|(subject, chapters)| eligible(subject, chapters))
            .collect()),
    }
}

// --- Selection ---

/// Picks one eligible chapter uniformly at random.
pub fn draw<R: Rng + ?Sized>(state: &AppState, source: &DrawSource, rng: &mut R) -> Result<DrawResult, DrawError> {
    let pool = build_pool(state, source)?;
    if pool.is_empty() {
        debug!(%source, "draw pool empty");
        return Err(DrawError::EmptyPool {
            request: source.clone(),
        });
    }

    let picked = pool[rng.gen_range(0..pool.len())];
    debug!(%source, pool = pool.len(), chapter = %picked.chapter.name, "chapter drawn");
    Ok(DrawResult {
        subject: picked.subject.clone(),
        chapter: picked.chapter.clone(),
        source: source.clone(),
    })
}

pub fn draw_from_subject<R: Rng + ?Sized>(
    state: &AppState,
    subject: &str,
    filter: PriorityFilter,
    rng: &mut R,
) -> Result<DrawResult, DrawError> {
    draw(state, &DrawSource::subject(Subject::new(subject), filter), rng)
}

pub fn draw_from_all<R: Rng + ?Sized>(
    state: &AppState,
    filter: PriorityFilter,
    rng: &mut R,
) -> Result<DrawResult, DrawError> {
    draw(state, &DrawSource::combined(filter), rng)
}

pub fn redraw<R: Rng + ?Sized>(state: &AppState, active: &DrawResult, rng: &mut R) -> Result<DrawResult, DrawError> {
    draw(state, &active.source, rng)
}

/// Marks the drawn chapter complete. Uses set semantics, so a chapter
/// completed elsewhere since the draw stays complete.
pub fn complete_active(state: &AppState, active: &DrawResult) -> Result<AppState, CatalogError> {
    state.mark_completed(active.subject.as_str(), &active.chapter.name)
}

// --- Active draw slot ---

/// Holds at most one revealed draw.
///
/// `Empty -draw-> Revealed`, `Revealed -redraw-> Revealed`,
/// `Revealed -complete|dismiss-> Empty`. A failed draw or redraw leaves the
/// slot as it was; redraw, complete and dismiss on an empty slot do nothing.
#[derive(Clone, Debug, Default)]
pub struct DrawSlot {
    active: Option<DrawResult>,
}

impl DrawSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&DrawResult> {
        self.active.as_ref()
    }

    pub fn is_revealed(&self) -> bool {
        self.active.is_some()
    }

    pub fn draw<R: Rng + ?Sized>(
        &mut self,
        state: &AppState,
        source: &DrawSource,
        rng: &mut R,
    ) -> Result<&DrawResult, DrawError> {
        let result = draw(state, source, rng)?;
        Ok(&*self.active.insert(result))
    }

    pub fn redraw<R: Rng + ?Sized>(
        &mut self,
        state: &AppState,
        rng: &mut R,
    ) -> Option<Result<&DrawResult, DrawError>> {
        let active = self.active.as_ref()?;
        match redraw(state, active, rng) {
            Ok(result) => Some(Ok(&*self.active.insert(result))),
            Err(e) => Some(Err(e)),
        }
    }

    /// Marks the active chapter complete and clears the slot. On error the slot
    /// keeps its draw.
    pub fn complete(&mut self, state: &AppState) -> Option<Result<AppState, CatalogError>> {
        let next = complete_active(state, self.active.as_ref()?);
        if next.is_ok() {
            self.active = None;
        }
        Some(next)
    }

    pub fn dismiss(&mut self) -> Option<DrawResult> {
        self.active.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::catalog::Catalog;
    use crate::engine::progress::CompletionSet;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn example_state() -> AppState {
        let catalog = Catalog::new(vec![
            (
                Subject::new("Physics"),
                vec![
                    Chapter::new("Gravitation", Priority::High),
                    Chapter::new("Optics", Priority::Low),
                ],
            ),
            (
                Subject::new("Chemistry"),
                vec![
                    Chapter::new("GOC", Priority::High),
                    Chapter::new("Solutions", Priority::Medium),
                ],
            ),
        ]);
        AppState::new(catalog, CompletionSet::new())
            .mark_completed("Physics", "Optics")
            .unwrap()
    }

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    fn names(pool: &[PoolEntry<'_>]) -> Vec<String> {
        pool.iter()
            .map(|e| format!("{}/{}", e.subject, e.chapter.name))
            .collect()
    }

    #[test]
    fn test_filter_parse_and_cycle() {
        assert_eq!("All".parse::<PriorityFilter>(), Ok(PriorityFilter::All));
        assert_eq!(
            "Low".parse::<PriorityFilter>(),
            Ok(PriorityFilter::Only(Priority::Low))
        );
        assert!("Everything".parse::<PriorityFilter>().is_err());

        let mut filter = PriorityFilter::All;
        let mut seen = Vec::new();
        for _ in 0..4 {
            filter = filter.cycle();
            seen.push(filter.as_str());
        }
        assert_eq!(seen, vec!["High", "Medium", "Low", "All"]);
    }

    #[test]
    fn test_subject_pool_excludes_completed() {
        let state = example_state();
        let pool = build_pool(&state, &DrawSource::subject(Subject::new("Physics"), PriorityFilter::All)).unwrap();
        assert_eq!(names(&pool), vec!["Physics/Gravitation"]);
    }

    #[test]
    fn test_combined_pool_order_and_filter() {
        let state = example_state();
        let all = build_pool(&state, &DrawSource::combined(PriorityFilter::All)).unwrap();
        assert_eq!(
            names(&all),
            vec!["Physics/Gravitation", "Chemistry/GOC", "Chemistry/Solutions"]
        );

        let high = build_pool(&state, &DrawSource::combined(PriorityFilter::Only(Priority::High))).unwrap();
        assert_eq!(names(&high), vec!["Physics/Gravitation", "Chemistry/GOC"]);
        assert_eq!(
            high.len(),
            all.iter().filter(|e| e.chapter.priority == Priority::High).count()
        );
    }

    #[test]
    fn test_single_candidate_always_drawn() {
        let state = example_state();
        let mut rng = rng();
        for _ in 0..50 {
            let result = draw_from_subject(&state, "Physics", PriorityFilter::All, &mut rng).unwrap();
            assert_eq!(result.chapter.name, "Gravitation");
            assert_eq!(
                result.source,
                DrawSource::subject(Subject::new("Physics"), PriorityFilter::All)
            );
        }
    }

    #[test]
    fn test_filtered_out_by_completion_is_empty_pool() {
        let state = example_state();
        let err = draw_from_subject(&state, "Physics", PriorityFilter::Only(Priority::Low), &mut rng()).unwrap_err();
        assert_eq!(
            err,
            DrawError::EmptyPool {
                request: DrawSource::subject(Subject::new("Physics"), PriorityFilter::Only(Priority::Low)),
            }
        );
        assert_eq!(err.to_string(), "no remaining chapters in Physics (Low priority)");
    }

    #[test]
    fn test_unknown_subject_draw_fails() {
        let state = example_state();
        assert_eq!(
            draw_from_subject(&state, "Biology", PriorityFilter::All, &mut rng()),
            Err(DrawError::UnknownSubject("Biology".to_string()))
        );
    }

    #[test]
    fn test_draws_are_uniform() {
        let chapters: Vec<Chapter> = (0..5)
            .map(|i| Chapter::new(&format!("Chapter {i}"), Priority::Medium))
            .collect();
        let state = AppState::new(
            Catalog::new(vec![(Subject::new("Maths"), chapters)]),
            CompletionSet::new(),
        );
        let mut rng = rng();
        let draws = 20_000;
        let mut counts = [0usize; 5];
        for _ in 0..draws {
            let result = draw_from_all(&state, PriorityFilter::All, &mut rng).unwrap();
            let idx: usize = result.chapter.name["Chapter ".len()..].parse().unwrap();
            counts[idx] += 1;
        }
        // Expected 4000 each; sd is about 57, allow roughly 5 sd.
        for count in counts {
            assert!((3700..=4300).contains(&count), "count {count} outside tolerance");
        }
    }

    #[test]
    fn test_redraw_uses_live_state() {
        let state = example_state();
        let mut rng = rng();
        let first = draw_from_all(&state, PriorityFilter::Only(Priority::High), &mut rng).unwrap();

        let updated = state
            .mark_completed(first.subject.as_str(), &first.chapter.name)
            .unwrap();
        for _ in 0..20 {
            let again = redraw(&updated, &first, &mut rng).unwrap();
            assert_ne!(again.chapter.name, first.chapter.name);
            assert_eq!(again.source, first.source);
        }
    }

    #[test]
    fn test_complete_active_sets_not_toggles() {
        let state = example_state();
        let stale = DrawResult {
            subject: Subject::new("Physics"),
            chapter: Chapter::new("Optics", Priority::Low),
            source: DrawSource::combined(PriorityFilter::All),
        };
        let next = complete_active(&state, &stale).unwrap();
        assert!(next.is_completed("Physics", "Optics"));
    }

    #[test]
    fn test_slot_state_machine() {
        let state = example_state();
        let mut rng = rng();
        let mut slot = DrawSlot::new();

        assert!(slot.redraw(&state, &mut rng).is_none());
        assert!(slot.complete(&state).is_none());
        assert!(slot.dismiss().is_none());

        let source = DrawSource::subject(Subject::new("Chemistry"), PriorityFilter::All);
        slot.draw(&state, &source, &mut rng).unwrap();
        assert!(slot.is_revealed());

        let redrawn = slot.redraw(&state, &mut rng).unwrap().unwrap().clone();
        assert_eq!(redrawn.source, source);
        assert_eq!(slot.active(), Some(&redrawn));

        let next = slot.complete(&state).unwrap().unwrap();
        assert!(!slot.is_revealed());
        assert!(next.is_completed("Chemistry", &redrawn.chapter.name));
    }

    #[test]
    fn test_slot_keeps_active_draw_on_empty_pool() {
        let state = example_state();
        let mut rng = rng();
        let mut slot = DrawSlot::new();
        let first = slot
            .draw(&state, &DrawSource::subject(Subject::new("Physics"), PriorityFilter::All), &mut rng)
            .unwrap()
            .clone();

        let err = slot
            .draw(&state, &DrawSource::combined(PriorityFilter::Only(Priority::Low)), &mut rng)
            .unwrap_err();
        assert!(matches!(err, DrawError::EmptyPool { .. }));
        assert_eq!(slot.active(), Some(&first));

        let done = state.mark_completed("Physics", "Gravitation").unwrap();
        assert!(slot.redraw(&done, &mut rng).unwrap().is_err());
        assert_eq!(slot.active(), Some(&first));

        assert_eq!(slot.dismiss(), Some(first));
        assert!(!slot.is_revealed());
    }
}
