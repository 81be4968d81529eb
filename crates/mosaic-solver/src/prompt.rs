//! Prompt assembly for propose-test-refine turns.

use mosaic_core::{render_attempt_feedback, Attempt, TrainPair};

/// Instructions appended after the problem section on every turn.
const INSTRUCTIONS: &str = "\
Study the transformation the examples demonstrate, then write a Python \
function `transform(grid)` that maps any input grid to its output grid. \
`grid` is a list of lists of integers 0-9; return the transformed grid in \
the same representation. Reply with the complete function inside a fenced \
code block.";

/// One full prompt: problem rendering, instructions, and (on refinement
/// turns) the feedback section for the selected past attempts.
pub fn build_prompt(problem: &str, feedback: Option<&str>) -> String {
    match feedback {
        Some(feedback) => format!("{problem}\n\n{INSTRUCTIONS}\n\n{feedback}"),
        None => format!("{problem}\n\n{INSTRUCTIONS}"),
    }
}

/// Renders the selected past attempts, in the order given, each with its
/// program text, per-example diagnostics, and aggregate score.
pub fn render_feedback_section(attempts: &[&Attempt], train: &[TrainPair]) -> String {
    let mut blocks = vec![
        "Your previous attempts did not solve every training example. Study the diagnostics and fix the transformation.".to_string(),
    ];
    for (index, attempt) in attempts.iter().enumerate() {
        blocks.push(format!(
            "Previous attempt {}:\nProgram:\n{}\n{}\nAggregate score: {:.2}.",
            index + 1,
            attempt.program,
            render_attempt_feedback(attempt, train),
            attempt.aggregate_score
        ));
    }
    blocks.join("\n\n")
}
