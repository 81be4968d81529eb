//! Concurrent coordination of the expert ensemble.

use futures_util::future::join_all;

use mosaic_ai::LlmGateway;
use mosaic_core::{ExpertHistory, Puzzle};
use mosaic_sandbox::ProgramRunner;

use crate::config::SolverConfig;
use crate::expert::run_expert;

/// Runs every configured expert concurrently and collects their histories.
///
/// Expert `k` gets id `<config id>#<k>` and seed
/// `base_seed + k * max_iterations`, so per-iteration seed streams stay
/// disjoint across the ensemble. The experts are plain futures on the
/// caller's task: dropping the returned future cancels all of them, which is
/// how facade-level cancellation propagates. Budgets are not enforced here:
/// per-call limits live in the gateway, per-expert limits in
/// `max_iterations`.
pub async fn run_ensemble(
    puzzle: &Puzzle,
    config: &SolverConfig,
    gateway: &LlmGateway,
    runner: &dyn ProgramRunner,
) -> Vec<ExpertHistory> {
    let experts = config.experts.iter().enumerate().map(|(index, expert_config)| {
        let expert_id = format!("{}#{}", expert_config.id, index);
        let seed = config
            .base_seed
            .wrapping_add(index as u64 * expert_config.max_iterations as u64);
        async move {
            let history =
                run_expert(puzzle, expert_config, &expert_id, seed, gateway, runner).await;
            tracing::debug!(
                expert_id,
                attempts = history.len(),
                solved = history.iter().any(|attempt| attempt.all_pass),
                "expert finished"
            );
            history
        }
    });

    join_all(experts).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use mosaic_ai::{
        GatewayBudgets, GatewayOptions, LlmGateway, ModelRateLimits, ScriptedClient,
    };
    use mosaic_core::{Grid, Puzzle, TestInput, TrainPair};
    use mosaic_sandbox::{ExecOutcome, ExitReason, ProgramRunner};

    use super::run_ensemble;
    use crate::config::{ExpertConfig, SolverConfig};

    struct EchoRunner;

    #[async_trait]
    impl ProgramRunner for EchoRunner {
        async fn run(&self, _program: &str, input: &Grid) -> ExecOutcome {
            ExecOutcome {
                predicted: Some(input.clone()),
                stderr_tail: String::new(),
                reason: ExitReason::Ok,
            }
        }
    }

    fn identity_puzzle() -> Puzzle {
        let square = Grid::new(vec![vec![1, 2], vec![3, 4]]).expect("grid");
        Puzzle::new(
            vec![TrainPair {
                input: square.clone(),
                output: square.clone(),
            }],
            vec![TestInput { input: square }],
        )
    }

    #[tokio::test]
    async fn unit_experts_get_disjoint_ids_and_seed_streams() {
        let client = Arc::new(ScriptedClient::with_responses([
            "```python\nanything\n```",
            "```python\nanything\n```",
        ]));
        let mut gateway = LlmGateway::new(GatewayOptions {
            budgets: GatewayBudgets::default(),
            rate_limits: ModelRateLimits::default(),
            call_timeout_ms: 5_000,
        });
        gateway.register_client("model-a", client.clone());

        let mut first = ExpertConfig::new("alpha", "model-a");
        first.max_iterations = 10;
        let mut second = ExpertConfig::new("beta", "model-a");
        second.max_iterations = 10;
        let mut config = SolverConfig::new(vec![first, second]);
        config.base_seed = 100;

        let histories =
            run_ensemble(&identity_puzzle(), &config, &gateway, &EchoRunner).await;

        assert_eq!(histories.len(), 2);
        assert_eq!(histories[0][0].expert_id, "alpha#0");
        assert_eq!(histories[1][0].expert_id, "beta#1");

        let mut seeds: Vec<u64> = client
            .requests()
            .iter()
            .map(|request| request.seed)
            .collect();
        seeds.sort_unstable();
        assert_eq!(seeds, vec![100, 110]);
    }

    #[tokio::test]
    async fn unit_one_starved_expert_does_not_abort_the_others() {
        // Only one scripted response: the second expert's call errors, is
        // recorded as a zero-score attempt, and the first still passes.
        let client = Arc::new(ScriptedClient::with_responses(["```python\nx\n```"]));
        let mut gateway = LlmGateway::new(GatewayOptions {
            budgets: GatewayBudgets::default(),
            rate_limits: ModelRateLimits::default(),
            call_timeout_ms: 5_000,
        });
        gateway.register_client("model-a", client);

        let mut first = ExpertConfig::new("alpha", "model-a");
        first.max_iterations = 1;
        let mut second = ExpertConfig::new("beta", "model-a");
        second.max_iterations = 1;
        let config = SolverConfig::new(vec![first, second]);

        let histories =
            run_ensemble(&identity_puzzle(), &config, &gateway, &EchoRunner).await;

        assert_eq!(histories.len(), 2);
        let solved: usize = histories
            .iter()
            .filter(|history| history.iter().any(|attempt| attempt.all_pass))
            .count();
        assert_eq!(solved, 1);
        let failed: usize = histories
            .iter()
            .filter(|history| history.iter().any(|attempt| !attempt.all_pass))
            .count();
        assert_eq!(failed, 1);
    }
}
