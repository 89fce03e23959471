//! Study tracker core: a syllabus of subjects and chapters, completion
//! progress, and a random draw of the next unfinished chapter.
//!
//! The terminal shell in `main.rs` drives this library; everything here is
//! synchronous and free of terminal concerns so it can be tested directly.

pub mod config;
pub mod engine;
pub mod store;
pub mod telemetry;
