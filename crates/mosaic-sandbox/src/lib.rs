//! Sandboxed execution of candidate transform programs.
//!
//! Model-produced code never runs in this process. Each execution writes the
//! program plus a fixed I/O harness to a temporary file and runs it as a
//! `python3` child with deterministic seeding, a wall-clock timeout, and
//! bounded stderr capture. When firejail is installed the child is
//! additionally confined with no network, a private filesystem, and rlimits
//! on memory, CPU, and process count; see [`Isolation`] for the fallback.
//! Failures are data, not errors: every run yields an [`ExecOutcome`].

mod harness;
mod runner;

pub use harness::compose_program;
pub use runner::{ExecOutcome, ExitReason, Isolation, ProgramRunner, PythonSandbox};
