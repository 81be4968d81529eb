//! Rectangular digit grids and their text framing.
//!
//! The same space-separated row rendering is used everywhere a grid crosses a
//! boundary: prompt rendering, feedback diffs, and the sandbox stdin/stdout
//! wire format.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest value a grid cell may hold.
pub const MAX_CELL_VALUE: u8 = 9;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid has no rows")]
    Empty,
    #[error("grid row {row} is empty")]
    EmptyRow { row: usize },
    #[error("grid row {row} has {got} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("grid cell ({row},{col}) holds {value}, outside 0-{MAX_CELL_VALUE}")]
    CellOutOfRange { row: usize, col: usize, value: u8 },
    #[error("grid token '{token}' is not a cell value")]
    InvalidToken { token: String },
}

/// A non-empty rectangular matrix of cell values in `0..=9`.
///
/// Construction always validates, including through serde, so any `Grid`
/// reachable at runtime satisfies the shape and range invariants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Grid {
    rows: Vec<Vec<u8>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<u8>>) -> Result<Self, GridError> {
        if rows.is_empty() {
            return Err(GridError::Empty);
        }
        let width = rows[0].len();
        for (row_index, row) in rows.iter().enumerate() {
            if row.is_empty() {
                return Err(GridError::EmptyRow { row: row_index });
            }
            if row.len() != width {
                return Err(GridError::RaggedRow {
                    row: row_index,
                    expected: width,
                    got: row.len(),
                });
            }
            for (col_index, &value) in row.iter().enumerate() {
                if value > MAX_CELL_VALUE {
                    return Err(GridError::CellOutOfRange {
                        row: row_index,
                        col: col_index,
                        value,
                    });
                }
            }
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    /// Shape rendered as `HxW`, the form used in feedback text.
    pub fn shape_label(&self) -> String {
        format!("{}x{}", self.height(), self.width())
    }

    pub fn cell_count(&self) -> usize {
        self.height() * self.width()
    }

    /// Renders rows as space-separated decimal digits, one line per row.
    pub fn render(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|value| value.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parses the `render` framing back into a grid.
    ///
    /// Blank lines are skipped so trailing newlines from child process output
    /// do not change the result.
    pub fn parse(text: &str) -> Result<Self, GridError> {
        let mut rows = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut row = Vec::new();
            for token in line.split_whitespace() {
                let value: u8 = token.parse().map_err(|_| GridError::InvalidToken {
                    token: token.to_string(),
                })?;
                row.push(value);
            }
            rows.push(row);
        }
        Self::new(rows)
    }
}

impl TryFrom<Vec<Vec<u8>>> for Grid {
    type Error = GridError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<Grid> for Vec<Vec<u8>> {
    fn from(grid: Grid) -> Self {
        grid.rows
    }
}
