//! Translation pipeline: per-row agent sequence and job orchestration.
//!
//! [`RowPipeline`] runs the fixed four-stage agent sequence for a single
//! row; [`JobOrchestrator`] drives it across every row of a dataset,
//! persisting progress after each row and honoring cooperative cancellation
//! at row boundaries.

mod orchestrator;
mod row;

pub use orchestrator::{JobHandle, JobOrchestrator};
pub use row::{RowPipeline, TranslationConfig};
