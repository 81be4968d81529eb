//! Public entry point: puzzle in, ranked attempts out.

use mosaic_ai::LlmGateway;
use mosaic_core::{Attempt, Puzzle};
use mosaic_sandbox::ProgramRunner;

use crate::config::SolverConfig;
use crate::ensemble::run_ensemble;
use crate::voter::{rank_attempts, RankedAttempt};

/// Solves one puzzle: runs the ensemble, flattens the histories, and ranks
/// the attempts. Pure composition; all policy lives in the coordinator, the
/// experts, and the voter. Cancelling the returned future cancels every
/// in-flight expert, gateway call, and sandbox child.
pub async fn solve(
    puzzle: &Puzzle,
    config: &SolverConfig,
    gateway: &LlmGateway,
    runner: &dyn ProgramRunner,
) -> Vec<RankedAttempt> {
    let histories = run_ensemble(puzzle, config, gateway, runner).await;
    let attempts: Vec<Attempt> = histories.into_iter().flatten().collect();
    tracing::debug!(
        attempts = attempts.len(),
        passers = attempts.iter().filter(|attempt| attempt.all_pass).count(),
        "ensemble complete, voting"
    );
    rank_attempts(&attempts, puzzle.test.len(), config.attempts_per_puzzle)
}
