//! Cell-accuracy scoring of predicted grids.

use crate::attempt::{ExampleResult, FailureKind};
use crate::grid::Grid;

/// Scores a predicted grid against the expected output.
///
/// A missing prediction keeps the failure kind the execution reported. A
/// shape mismatch is denied partial credit outright, since misaligned
/// comparisons would reward incidental matches. Equal shapes score the
/// fraction of matching cells, which is the gradient signal the feedback
/// formatter renders.
pub fn score_example(
    predicted: Option<Grid>,
    failure: FailureKind,
    diagnostic: Option<String>,
    expected: &Grid,
) -> ExampleResult {
    let Some(predicted) = predicted else {
        return ExampleResult::failed(failure, diagnostic);
    };

    if predicted.shape() != expected.shape() {
        return ExampleResult {
            success: false,
            soft_score: 0.0,
            predicted: Some(predicted),
            failure: FailureKind::ShapeMismatch,
            diagnostic,
        };
    }

    let matching = predicted
        .rows()
        .iter()
        .zip(expected.rows())
        .flat_map(|(predicted_row, expected_row)| predicted_row.iter().zip(expected_row))
        .filter(|(predicted_cell, expected_cell)| predicted_cell == expected_cell)
        .count();
    let total = expected.cell_count();

    ExampleResult {
        success: matching == total,
        soft_score: matching as f64 / total as f64,
        predicted: Some(predicted),
        failure: FailureKind::Ok,
        diagnostic,
    }
}
