//! Configuration surface for experts and the solver.

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_max_iterations() -> usize {
    10
}

fn default_max_solutions() -> usize {
    5
}

fn default_selection_probability() -> f64 {
    1.0
}

fn default_temperature() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_attempts_per_puzzle() -> usize {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Settings for one propose-test-refine expert.
pub struct ExpertConfig {
    pub id: String,
    /// Which model the gateway routes this expert's calls to.
    pub model_id: String,
    /// Hard cap on propose-test-refine turns.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Most past attempts to include in the next prompt.
    #[serde(default = "default_max_solutions")]
    pub max_solutions: usize,
    /// Bernoulli inclusion probability per remembered attempt.
    #[serde(default = "default_selection_probability")]
    pub selection_probability: f64,
    /// Order remembered attempts worst-to-best instead of best-to-worst.
    #[serde(default)]
    pub improving_order: bool,
    /// Shuffle training examples (seeded) each iteration.
    #[serde(default)]
    pub shuffle_examples: bool,
    /// When false, the expert returns an empty history unless it found a
    /// passer.
    #[serde(default = "default_true")]
    pub return_best_result: bool,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Opaque provider options forwarded through the gateway.
    #[serde(default)]
    pub model_extras: serde_json::Map<String, Value>,
    /// Voting hint: let this expert's failed attempts reinforce a passing
    /// group that shares their fingerprint.
    #[serde(default)]
    pub count_failed_matches: bool,
}

impl ExpertConfig {
    pub fn new(id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model_id: model_id.into(),
            max_iterations: default_max_iterations(),
            max_solutions: default_max_solutions(),
            selection_probability: default_selection_probability(),
            improving_order: false,
            shuffle_examples: false,
            return_best_result: true,
            temperature: default_temperature(),
            model_extras: serde_json::Map::new(),
            count_failed_matches: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Whole-solve configuration: the expert ensemble plus ranking policy.
pub struct SolverConfig {
    pub experts: Vec<ExpertConfig>,
    /// How many final attempts the voter emits (K).
    #[serde(default = "default_attempts_per_puzzle")]
    pub attempts_per_puzzle: usize,
    #[serde(default)]
    pub base_seed: u64,
}

impl SolverConfig {
    pub fn new(experts: Vec<ExpertConfig>) -> Self {
        Self {
            experts,
            attempts_per_puzzle: default_attempts_per_puzzle(),
            base_seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ExpertConfig, SolverConfig};

    #[test]
    fn expert_config_defaults_match_the_documented_values() {
        let config: ExpertConfig =
            serde_json::from_str(r#"{"id": "a", "model_id": "model-a"}"#).expect("config");
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.max_solutions, 5);
        assert_eq!(config.selection_probability, 1.0);
        assert!(!config.improving_order);
        assert!(!config.shuffle_examples);
        assert!(config.return_best_result);
        assert_eq!(config.temperature, 1.0);
        assert!(config.model_extras.is_empty());
        assert!(!config.count_failed_matches);
    }

    #[test]
    fn solver_config_defaults_to_two_attempts() {
        let config: SolverConfig = serde_json::from_str(
            r#"{"experts": [{"id": "a", "model_id": "model-a"}]}"#,
        )
        .expect("config");
        assert_eq!(config.attempts_per_puzzle, 2);
        assert_eq!(config.base_seed, 0);
    }
}
