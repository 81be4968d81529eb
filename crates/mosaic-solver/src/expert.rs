//! One propose-test-refine expert.

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use mosaic_ai::{GenerateRequest, LlmGateway};
use mosaic_core::{
    extract_program, render_problem, score_example, truncate_tail, Attempt, ExampleResult,
    ExpertHistory, FailureKind, Puzzle, TrainPair,
};
use mosaic_sandbox::ProgramRunner;

use crate::config::ExpertConfig;
use crate::prompt::{build_prompt, render_feedback_section};

/// Bound on gateway error text carried into attempt diagnostics.
const DIAGNOSTIC_TAIL_BYTES: usize = 2_048;

/// Runs one expert to termination and returns its chronological history.
///
/// Termination, in order of precedence: an attempt passes every training
/// example; the gateway's process-wide budgets run out; `max_iterations`
/// turns have been spent. Gateway and sandbox failures are recorded as
/// zero-score attempts and the loop continues.
pub async fn run_expert(
    puzzle: &Puzzle,
    config: &ExpertConfig,
    expert_id: &str,
    seed: u64,
    gateway: &LlmGateway,
    runner: &dyn ProgramRunner,
) -> ExpertHistory {
    let mut history: ExpertHistory = Vec::new();

    for iteration in 0..config.max_iterations.max(1) {
        let turn_seed = seed.wrapping_add(iteration as u64);
        let prompt = build_turn_prompt(puzzle, config, &history, turn_seed);
        let request = GenerateRequest {
            model: config.model_id.clone(),
            prompt,
            temperature: config.temperature,
            seed: turn_seed,
            extras: config.model_extras.clone(),
        };

        let attempt = match gateway.generate(request).await {
            Ok(response) => {
                evaluate_response(&response.text, puzzle, runner, iteration, expert_id, config)
                    .await
            }
            Err(error) if error.is_budget_exhausted() => {
                tracing::debug!(expert_id, iteration, %error, "expert stopping on budget");
                break;
            }
            Err(error) => gateway_failure_attempt(puzzle, iteration, expert_id, config, &error),
        };

        tracing::debug!(
            expert_id,
            iteration,
            aggregate_score = attempt.aggregate_score,
            all_pass = attempt.all_pass,
            "recorded attempt"
        );
        let solved = attempt.all_pass;
        history.push(attempt);

        if solved {
            break;
        }
        if let Some(reason) = gateway.budget_snapshot().exhausted() {
            tracing::debug!(expert_id, iteration, reason, "expert stopping on budget");
            break;
        }
    }

    if !config.return_best_result && !history.iter().any(|attempt| attempt.all_pass) {
        return Vec::new();
    }
    history
}

fn build_turn_prompt(
    puzzle: &Puzzle,
    config: &ExpertConfig,
    history: &[Attempt],
    turn_seed: u64,
) -> String {
    let mut rng = StdRng::seed_from_u64(turn_seed);

    let train: Vec<TrainPair> = if config.shuffle_examples {
        let mut shuffled = puzzle.train.clone();
        shuffled.shuffle(&mut rng);
        shuffled
    } else {
        puzzle.train.clone()
    };
    let problem = render_problem(&train, &puzzle.test_inputs());

    let selected = select_feedback_attempts(history, config, &mut rng);
    let feedback = if selected.is_empty() {
        None
    } else {
        // Diagnostics stay aligned to the original training order even when
        // the problem rendering above is shuffled.
        Some(render_feedback_section(&selected, &puzzle.train))
    };

    build_prompt(&problem, feedback.as_deref())
}

/// Picks up to `max_solutions` past attempts for the feedback section. Best
/// attempts are preferred, a tie preferring the more recent refinement; each
/// survivor is then kept with `selection_probability`, and the result is
/// ordered worst-to-best when `improving_order` is set.
fn select_feedback_attempts<'a>(
    history: &'a [Attempt],
    config: &ExpertConfig,
    rng: &mut StdRng,
) -> Vec<&'a Attempt> {
    let mut candidates: Vec<&Attempt> = history.iter().collect();
    candidates.sort_by(|a, b| {
        b.aggregate_score
            .partial_cmp(&a.aggregate_score)
            .unwrap_or(Ordering::Equal)
            .then(b.iteration_index.cmp(&a.iteration_index))
    });
    candidates.truncate(config.max_solutions);

    let probability = config.selection_probability.clamp(0.0, 1.0);
    let mut selected: Vec<&Attempt> = candidates
        .into_iter()
        .filter(|_| rng.gen_bool(probability))
        .collect();
    if config.improving_order {
        selected.reverse();
    }
    selected
}

async fn evaluate_response(
    response: &str,
    puzzle: &Puzzle,
    runner: &dyn ProgramRunner,
    iteration: usize,
    expert_id: &str,
    config: &ExpertConfig,
) -> Attempt {
    let Some(program) = extract_program(response) else {
        return failed_attempt(
            String::new(),
            puzzle,
            FailureKind::NoCode,
            None,
            iteration,
            expert_id,
            config,
        );
    };

    let mut train_results = Vec::with_capacity(puzzle.train.len());
    for pair in &puzzle.train {
        let outcome = runner.run(&program, &pair.input).await;
        let failure = outcome.failure_kind();
        let diagnostic = outcome.diagnostic();
        train_results.push(score_example(
            outcome.predicted,
            failure,
            diagnostic,
            &pair.output,
        ));
    }

    // Test predictions are recorded whether or not training passed; the
    // voter decides what they are worth.
    let mut test_predictions = Vec::with_capacity(puzzle.test.len());
    for example in &puzzle.test {
        let outcome = runner.run(&program, &example.input).await;
        test_predictions.push(outcome.predicted);
    }

    Attempt::new(
        program,
        train_results,
        test_predictions,
        iteration,
        expert_id.to_string(),
        config.count_failed_matches,
    )
}

fn gateway_failure_attempt(
    puzzle: &Puzzle,
    iteration: usize,
    expert_id: &str,
    config: &ExpertConfig,
    error: &mosaic_ai::AiError,
) -> Attempt {
    let diagnostic = truncate_tail(&error.to_string(), DIAGNOSTIC_TAIL_BYTES);
    failed_attempt(
        String::new(),
        puzzle,
        FailureKind::RuntimeError,
        Some(diagnostic),
        iteration,
        expert_id,
        config,
    )
}

fn failed_attempt(
    program: String,
    puzzle: &Puzzle,
    failure: FailureKind,
    diagnostic: Option<String>,
    iteration: usize,
    expert_id: &str,
    config: &ExpertConfig,
) -> Attempt {
    let train_results = puzzle
        .train
        .iter()
        .map(|_| ExampleResult::failed(failure, diagnostic.clone()))
        .collect();
    Attempt::new(
        program,
        train_results,
        vec![None; puzzle.test.len()],
        iteration,
        expert_id.to_string(),
        config.count_failed_matches,
    )
}
