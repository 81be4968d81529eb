//! The fixed Python harness wrapped around every candidate program.

/// Runs before any candidate code, so pseudo-random state is pinned no
/// matter what the program does at module level.
const PROLOGUE: &str = "\
import random

random.seed(0)
";

/// Reads one grid from stdin, applies `transform`, prints the result grid.
/// Candidate code must have defined `transform(grid)` by the time this runs.
const EPILOGUE: &str = r#"

def _mosaic_read_grid(stream):
    rows = []
    for line in stream.read().splitlines():
        line = line.strip()
        if line:
            rows.append([int(token) for token in line.split()])
    return rows


def _mosaic_main():
    import sys

    grid = _mosaic_read_grid(sys.stdin)
    result = transform(grid)
    lines = []
    for row in result:
        lines.append(" ".join(str(int(value)) for value in row))
    sys.stdout.write("\n".join(lines) + "\n")


_mosaic_main()
"#;

/// Composes the runnable child source: seeding prologue, candidate program,
/// I/O epilogue.
pub fn compose_program(program: &str) -> String {
    format!("{PROLOGUE}\n{program}\n{EPILOGUE}")
}
