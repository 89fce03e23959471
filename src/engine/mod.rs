pub mod catalog;
pub mod draw;
pub mod progress;
pub mod state;
pub mod syllabus;

pub use catalog::{Catalog, CatalogError, Chapter, Priority, Subject};
pub use draw::{DrawError, DrawResult, DrawScope, DrawSlot, DrawSource, PriorityFilter};
pub use state::{AppState, Totals, compute_totals};
pub use syllabus::Syllabus;
