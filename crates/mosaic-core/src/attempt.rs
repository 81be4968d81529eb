//! Attempt records produced by the propose-test-refine loop.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// Sentinel used when fingerprinting a missing test prediction.
const NULL_PREDICTION_SENTINEL: &str = "<none>";

/// Separator between per-test-input sections of a fingerprint. The grid
/// rendering itself never contains consecutive newlines, so fingerprints of
/// distinct prediction sequences never collide.
const FINGERPRINT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// How a single example execution ended.
pub enum FailureKind {
    Ok,
    ShapeMismatch,
    RuntimeError,
    Timeout,
    InvalidOutput,
    NoCode,
}

impl FailureKind {
    /// Human-readable label used in feedback text.
    pub fn label(self) -> &'static str {
        match self {
            FailureKind::Ok => "ok",
            FailureKind::ShapeMismatch => "shape mismatch",
            FailureKind::RuntimeError => "runtime error",
            FailureKind::Timeout => "timeout",
            FailureKind::InvalidOutput => "invalid output",
            FailureKind::NoCode => "no code",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Outcome of running and scoring a candidate program on one training example.
///
/// Invariant: `success` holds exactly when `failure == Ok`, the soft score is
/// `1.0`, and the predicted grid equals the expected grid.
pub struct ExampleResult {
    pub success: bool,
    pub soft_score: f64,
    pub predicted: Option<Grid>,
    pub failure: FailureKind,
    /// Bounded diagnostic text (stderr tail, gateway error) for feedback.
    pub diagnostic: Option<String>,
}

impl ExampleResult {
    /// A zero-score result for an example that never produced a grid.
    pub fn failed(failure: FailureKind, diagnostic: Option<String>) -> Self {
        Self {
            success: false,
            soft_score: 0.0,
            predicted: None,
            failure,
            diagnostic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One candidate program together with its scored results, immutable once
/// recorded in an expert's history.
pub struct Attempt {
    pub program: String,
    /// Aligned to the puzzle's training examples, original order.
    pub train_results: Vec<ExampleResult>,
    /// Aligned to the puzzle's test inputs; `None` where execution failed.
    pub test_predictions: Vec<Option<Grid>>,
    pub aggregate_score: f64,
    pub all_pass: bool,
    pub iteration_index: usize,
    pub expert_id: String,
    /// Voting hint from the producing expert's configuration: when this
    /// attempt fails training but matches a passing group's fingerprint, it
    /// still reinforces that group's vote.
    pub counts_when_failed: bool,
}

impl Attempt {
    /// Builds an attempt, deriving `aggregate_score` and `all_pass` from the
    /// per-example results.
    pub fn new(
        program: String,
        train_results: Vec<ExampleResult>,
        test_predictions: Vec<Option<Grid>>,
        iteration_index: usize,
        expert_id: String,
        counts_when_failed: bool,
    ) -> Self {
        let aggregate_score = if train_results.is_empty() {
            0.0
        } else {
            train_results.iter().map(|result| result.soft_score).sum::<f64>()
                / train_results.len() as f64
        };
        let all_pass =
            !train_results.is_empty() && train_results.iter().all(|result| result.success);
        Self {
            program,
            train_results,
            test_predictions,
            aggregate_score,
            all_pass,
            iteration_index,
            expert_id,
            counts_when_failed,
        }
    }

    /// Canonical string form of the test predictions, used to group attempts
    /// that agree on every test output.
    ///
    /// Returns `None` when every prediction is null; such attempts carry no
    /// signal and are dropped by the voter.
    pub fn fingerprint(&self) -> Option<String> {
        if self.test_predictions.iter().all(Option::is_none) {
            return None;
        }
        let sections: Vec<String> = self
            .test_predictions
            .iter()
            .map(|prediction| match prediction {
                Some(grid) => grid.render(),
                None => NULL_PREDICTION_SENTINEL.to_string(),
            })
            .collect();
        Some(sections.join(FINGERPRINT_SEPARATOR))
    }
}

/// Chronological attempts recorded by one expert.
pub type ExpertHistory = Vec<Attempt>;
