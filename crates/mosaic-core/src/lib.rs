//! Data model and pure scoring/rendering logic shared across Mosaic crates.
//!
//! Holds the grid and puzzle types, attempt records with their invariants,
//! the cell-accuracy scorer, the feedback formatter that seeds refinement
//! prompts, and code extraction from model responses.

pub mod attempt;
pub mod extract;
pub mod feedback;
pub mod grid;
pub mod puzzle;
pub mod scoring;
pub mod text;

pub use attempt::{Attempt, ExampleResult, ExpertHistory, FailureKind};
pub use extract::extract_program;
pub use feedback::{render_attempt_feedback, render_problem};
pub use grid::{Grid, GridError};
pub use puzzle::{Puzzle, TestInput, TrainPair};
pub use scoring::score_example;
pub use text::truncate_tail;
