//! Deterministic rendering of puzzles and attempt diagnostics.
//!
//! Two artifacts: the `<Problem>` section that opens every prompt, and the
//! per-attempt feedback block that seeds the next refinement turn.

use crate::attempt::{Attempt, ExampleResult, FailureKind};
use crate::grid::Grid;
use crate::puzzle::TrainPair;

/// Renders the problem section: numbered training examples (input then
/// output) followed by the test inputs, all in the space-separated grid
/// framing, wrapped in literal `<Problem>` tags.
pub fn render_problem(train: &[TrainPair], test_inputs: &[&Grid]) -> String {
    let mut sections = Vec::new();
    for (index, pair) in train.iter().enumerate() {
        sections.push(format!(
            "Example {}:\nInput:\n{}\nOutput:\n{}",
            index + 1,
            pair.input.render(),
            pair.output.render()
        ));
    }
    for (index, input) in test_inputs.iter().enumerate() {
        sections.push(format!("Test Input {}:\n{}", index + 1, input.render()));
    }
    format!("<Problem>\n{}\n</Problem>", sections.join("\n\n"))
}

/// Renders the per-example diagnostics for one attempt, aligned to the
/// training examples in their original order.
pub fn render_attempt_feedback(attempt: &Attempt, train: &[TrainPair]) -> String {
    let mut blocks = Vec::new();
    for (index, result) in attempt.train_results.iter().enumerate() {
        let expected = train.get(index).map(|pair| &pair.output);
        blocks.push(render_example_feedback(index, result, expected));
    }
    blocks.join("\n")
}

fn render_example_feedback(
    index: usize,
    result: &ExampleResult,
    expected: Option<&Grid>,
) -> String {
    let mut lines = Vec::new();
    if result.success {
        lines.push(format!("Example {}: solved correctly.", index + 1));
    } else {
        lines.push(format!("Example {}: not solved.", index + 1));
        match result.failure {
            FailureKind::Ok => {
                if let (Some(predicted), Some(expected)) = (result.predicted.as_ref(), expected) {
                    lines.push("Diff (matching cells show the value, mismatches show predicted/expected):".to_string());
                    lines.push(render_diff(predicted, expected));
                }
            }
            FailureKind::ShapeMismatch => {
                if let (Some(predicted), Some(expected)) = (result.predicted.as_ref(), expected) {
                    lines.push(format!(
                        "Output shape mismatch: expected {}, got {}.",
                        expected.shape_label(),
                        predicted.shape_label()
                    ));
                }
            }
            FailureKind::RuntimeError
            | FailureKind::Timeout
            | FailureKind::InvalidOutput
            | FailureKind::NoCode => {
                let detail = result
                    .diagnostic
                    .as_deref()
                    .filter(|text| !text.is_empty())
                    .unwrap_or("(no details)");
                lines.push(format!("Failure: {}: {}", result.failure.label(), detail));
            }
        }
    }
    lines.push(format!("Soft score: {:.2}.", result.soft_score));
    lines.join("\n")
}

/// Cell-by-cell diff of two equal-shape grids.
fn render_diff(predicted: &Grid, expected: &Grid) -> String {
    predicted
        .rows()
        .iter()
        .zip(expected.rows())
        .map(|(predicted_row, expected_row)| {
            predicted_row
                .iter()
                .zip(expected_row)
                .map(|(predicted_cell, expected_cell)| {
                    if predicted_cell == expected_cell {
                        predicted_cell.to_string()
                    } else {
                        format!("{predicted_cell}/{expected_cell}")
                    }
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
