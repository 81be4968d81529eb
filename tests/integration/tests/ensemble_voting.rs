//! Whole-solve run: three experts, scripted per-model responses, real
//! sandbox, voting across the merged histories.

use std::sync::Arc;

use mosaic_ai::{GatewayBudgets, GatewayOptions, LlmGateway, ModelRateLimits, ScriptedClient};
use mosaic_core::{Grid, Puzzle, TestInput, TrainPair};
use mosaic_sandbox::{Isolation, PythonSandbox};
use mosaic_solver::{solve, ExpertConfig, SolverConfig};

fn grid(rows: Vec<Vec<u8>>) -> Grid {
    Grid::new(rows).expect("valid grid")
}

#[tokio::test]
async fn majority_passers_win_and_a_failed_group_fills_the_second_slot() {
    // Transpose puzzle; two experts produce the correct program, the third
    // flips horizontally and fails training.
    let puzzle = Puzzle::new(
        vec![TrainPair {
            input: grid(vec![vec![0, 1], vec![0, 1]]),
            output: grid(vec![vec![0, 0], vec![1, 1]]),
        }],
        vec![TestInput {
            input: grid(vec![vec![1, 2], vec![3, 4]]),
        }],
    );

    let transpose = "```python\ndef transform(grid):\n    return [list(row) for row in zip(*grid)]\n```";
    let flip_h = "```python\ndef transform(grid):\n    return [row[::-1] for row in grid]\n```";

    let mut gateway = LlmGateway::new(GatewayOptions {
        budgets: GatewayBudgets::default(),
        rate_limits: ModelRateLimits::default(),
        call_timeout_ms: 30_000,
    });
    gateway.register_client("m1", Arc::new(ScriptedClient::with_responses([transpose])));
    gateway.register_client("m2", Arc::new(ScriptedClient::with_responses([transpose])));
    gateway.register_client("m3", Arc::new(ScriptedClient::with_responses([flip_h])));

    let experts = ["m1", "m2", "m3"]
        .into_iter()
        .enumerate()
        .map(|(index, model)| {
            let mut config = ExpertConfig::new(format!("expert-{index}"), model);
            config.max_iterations = 1;
            config
        })
        .collect();
    let config = SolverConfig::new(experts);

    let sandbox = PythonSandbox::new()
        .with_isolation(Isolation::ProcessOnly)
        .with_timeout_ms(10_000);
    let ranked = solve(&puzzle, &config, &gateway, &sandbox).await;

    assert_eq!(ranked.len(), 2);
    // The two-voter transpose group wins the first slot.
    assert_eq!(
        ranked[0].predictions,
        vec![Some(grid(vec![vec![1, 3], vec![2, 4]]))]
    );
    // Diversity-first: the passerless flip group still beats re-emitting a
    // second transpose member.
    assert_eq!(
        ranked[1].predictions,
        vec![Some(grid(vec![vec![2, 1], vec![4, 3]]))]
    );
}
