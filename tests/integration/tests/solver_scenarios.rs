//! End-to-end expert scenarios: scripted gateway responses, real Python
//! sandbox.

use std::sync::Arc;

use mosaic_ai::{
    GatewayBudgets, GatewayOptions, LlmGateway, ModelRateLimits, RateLimit, ScriptedClient,
};
use mosaic_core::{FailureKind, Grid, Puzzle, TestInput, TrainPair};
use mosaic_sandbox::{Isolation, PythonSandbox};
use mosaic_solver::{run_expert, ExpertConfig};

const TRANSPOSE_PROGRAM: &str =
    "```python\ndef transform(grid):\n    return [list(row) for row in zip(*grid)]\n```";
const ROTATE_CW_PROGRAM: &str =
    "```python\ndef transform(grid):\n    return [list(row) for row in zip(*grid[::-1])]\n```";
const FLIP_H_PROGRAM: &str =
    "```python\ndef transform(grid):\n    return [row[::-1] for row in grid]\n```";

fn grid(rows: Vec<Vec<u8>>) -> Grid {
    Grid::new(rows).expect("valid grid")
}

fn gateway_for(client: Arc<ScriptedClient>) -> LlmGateway {
    let mut gateway = LlmGateway::new(GatewayOptions {
        budgets: GatewayBudgets::default(),
        rate_limits: ModelRateLimits {
            default: RateLimit {
                burst: 4,
                per_second: 0.0,
            },
            per_model: Default::default(),
        },
        call_timeout_ms: 30_000,
    });
    gateway.register_client("model-a", client);
    gateway
}

fn expert_config(max_iterations: usize) -> ExpertConfig {
    let mut config = ExpertConfig::new("expert", "model-a");
    config.max_iterations = max_iterations;
    config
}

// Process-only isolation: firejail availability varies across hosts.
fn sandbox(timeout_ms: u64) -> PythonSandbox {
    PythonSandbox::new()
        .with_isolation(Isolation::ProcessOnly)
        .with_timeout_ms(timeout_ms)
}

#[tokio::test]
async fn immediate_passer_terminates_after_one_call() {
    let puzzle = Puzzle::new(
        vec![TrainPair {
            input: grid(vec![vec![0, 1], vec![0, 1]]),
            output: grid(vec![vec![0, 0], vec![1, 1]]),
        }],
        vec![TestInput {
            input: grid(vec![vec![1, 1], vec![0, 0]]),
        }],
    );
    let client = Arc::new(ScriptedClient::with_responses([
        TRANSPOSE_PROGRAM,
        "never requested",
    ]));
    let gateway = gateway_for(client.clone());
    let sandbox = sandbox(10_000);

    let history = run_expert(
        &puzzle,
        &expert_config(5),
        "expert#0",
        1,
        &gateway,
        &sandbox,
    )
    .await;

    assert_eq!(history.len(), 1);
    assert!(history[0].all_pass);
    assert_eq!(history[0].iteration_index, 0);
    assert_eq!(
        history[0].test_predictions[0],
        Some(grid(vec![vec![1, 0], vec![1, 0]]))
    );
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn refinement_after_a_wrong_program_uses_the_diff_feedback() {
    // Rotate-90-clockwise puzzle. The first scripted response flips
    // horizontally, which matches half the cells; the second rotates.
    let puzzle = Puzzle::new(
        vec![TrainPair {
            input: grid(vec![vec![1, 2], vec![3, 4]]),
            output: grid(vec![vec![3, 1], vec![4, 2]]),
        }],
        vec![TestInput {
            input: grid(vec![vec![5, 6], vec![7, 8]]),
        }],
    );
    let client = Arc::new(ScriptedClient::with_responses([
        FLIP_H_PROGRAM,
        ROTATE_CW_PROGRAM,
    ]));
    let gateway = gateway_for(client.clone());
    let sandbox = sandbox(10_000);

    let history = run_expert(
        &puzzle,
        &expert_config(5),
        "expert#0",
        1,
        &gateway,
        &sandbox,
    )
    .await;

    assert_eq!(history.len(), 2);
    assert!(!history[0].all_pass);
    assert!((history[0].aggregate_score - 0.5).abs() < 1e-9);
    assert!(history[1].all_pass);
    assert_eq!(history[1].iteration_index, 1);
    assert_eq!(
        history[1].test_predictions[0],
        Some(grid(vec![vec![7, 5], vec![8, 6]]))
    );

    // The refinement prompt carried the predicted/expected diff: the flip
    // put 2 where 3 was expected.
    let second_prompt = &client.requests()[1].prompt;
    assert!(second_prompt.contains("2/3"));
    assert!(second_prompt.contains("not solved"));
}

#[tokio::test]
async fn shape_mismatch_is_reported_with_both_shapes() {
    let puzzle = Puzzle::new(
        vec![TrainPair {
            input: grid(vec![vec![0, 1], vec![1, 0]]),
            output: grid(vec![vec![1, 0], vec![0, 1]]),
        }],
        vec![TestInput {
            input: grid(vec![vec![1, 1], vec![0, 0]]),
        }],
    );
    let oversized = "```python\ndef transform(grid):\n    return [[1, 1, 1], [0, 0, 0], [1, 1, 1]]\n```";
    let flip_v = "```python\ndef transform(grid):\n    return grid[::-1]\n```";
    let client = Arc::new(ScriptedClient::with_responses([oversized, flip_v]));
    let gateway = gateway_for(client.clone());
    let sandbox = sandbox(10_000);

    let history = run_expert(
        &puzzle,
        &expert_config(5),
        "expert#0",
        1,
        &gateway,
        &sandbox,
    )
    .await;

    assert!(history.len() >= 2, "expert should proceed past the mismatch");
    assert_eq!(
        history[0].train_results[0].failure,
        FailureKind::ShapeMismatch
    );
    assert_eq!(history[0].train_results[0].soft_score, 0.0);

    let second_prompt = &client.requests()[1].prompt;
    assert!(second_prompt.contains("expected 2x2, got 3x3"));
}

#[tokio::test]
async fn hung_program_times_out_and_the_expert_proceeds() {
    let puzzle = Puzzle::new(
        vec![TrainPair {
            input: grid(vec![vec![0, 1], vec![0, 1]]),
            output: grid(vec![vec![0, 0], vec![1, 1]]),
        }],
        vec![TestInput {
            input: grid(vec![vec![1, 1], vec![0, 0]]),
        }],
    );
    let spinning = "```python\ndef transform(grid):\n    while True:\n        pass\n```";
    let client = Arc::new(ScriptedClient::with_responses([
        spinning,
        TRANSPOSE_PROGRAM,
    ]));
    let gateway = gateway_for(client.clone());
    let sandbox = sandbox(500);

    let history = run_expert(
        &puzzle,
        &expert_config(5),
        "expert#0",
        1,
        &gateway,
        &sandbox,
    )
    .await;

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].train_results[0].failure, FailureKind::Timeout);
    assert_eq!(history[0].train_results[0].soft_score, 0.0);
    assert_eq!(history[0].test_predictions[0], None);
    assert!(history[1].all_pass);
    assert_eq!(client.calls(), 2);
}
