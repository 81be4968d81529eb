//! Puzzle ingestion types matching the ARC task JSON shape.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One training example: an input grid and the expected output grid.
pub struct TrainPair {
    pub input: Grid,
    pub output: Grid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One test example: the input grid only; the output is what the engine must
/// predict.
pub struct TestInput {
    pub input: Grid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A full puzzle: ordered training pairs plus ordered test inputs.
pub struct Puzzle {
    pub train: Vec<TrainPair>,
    pub test: Vec<TestInput>,
}

impl Puzzle {
    pub fn new(train: Vec<TrainPair>, test: Vec<TestInput>) -> Self {
        Self { train, test }
    }

    pub fn test_inputs(&self) -> Vec<&Grid> {
        self.test.iter().map(|example| &example.input).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Puzzle;

    #[test]
    fn deserializes_arc_task_json() {
        let puzzle: Puzzle = serde_json::from_str(
            r#"{
                "train": [
                    {"input": [[0,1],[1,0]], "output": [[1,0],[0,1]]}
                ],
                "test": [
                    {"input": [[1,1],[0,0]]}
                ]
            }"#,
        )
        .expect("valid puzzle json");

        assert_eq!(puzzle.train.len(), 1);
        assert_eq!(puzzle.test.len(), 1);
        assert_eq!(puzzle.test_inputs()[0].shape(), (2, 2));
    }
}
