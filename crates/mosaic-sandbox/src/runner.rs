use std::io::Write as _;
use std::path::Path;
use std::process::Stdio;
use std::sync::OnceLock;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::Duration;

use mosaic_core::{truncate_tail, FailureKind, Grid};

use crate::harness::compose_program;

pub const DEFAULT_TIMEOUT_MS: u64 = 1_500;
pub const DEFAULT_MEMORY_LIMIT_MB: u64 = 512;
pub const STDERR_TAIL_BYTES: usize = 2_048;

/// How strongly the child process is contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    /// Wrap the interpreter in firejail: no network, private filesystem,
    /// and rlimits on memory, CPU time, process count, and file size.
    Firejail,
    /// Plain child process. The wall-clock timeout is the only enforcement;
    /// a hostile candidate program can still exhaust host memory. Meant for
    /// hosts without firejail installed.
    ProcessOnly,
}

impl Isolation {
    /// Firejail when it is on PATH, otherwise the process-only fallback.
    pub fn detect() -> Self {
        if firejail_on_path() {
            Isolation::Firejail
        } else {
            Isolation::ProcessOnly
        }
    }
}

fn firejail_on_path() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| {
        let found = std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join("firejail").is_file()))
            .unwrap_or(false);
        if !found {
            tracing::warn!(
                "firejail not found on PATH, sandbox children run with timeout enforcement only"
            );
        }
        found
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Why a sandbox run ended.
pub enum ExitReason {
    Ok,
    NonZeroExit,
    KilledTimeout,
    UnparseableOutput,
}

#[derive(Debug, Clone, PartialEq)]
/// What one child-process execution produced. Never an error: crashes,
/// hangs, and malformed output all land here as data for the scorer.
pub struct ExecOutcome {
    pub predicted: Option<Grid>,
    pub stderr_tail: String,
    pub reason: ExitReason,
}

impl ExecOutcome {
    fn failed(reason: ExitReason, stderr_tail: impl Into<String>) -> Self {
        Self {
            predicted: None,
            stderr_tail: stderr_tail.into(),
            reason,
        }
    }

    /// The scorer-facing failure classification for this run.
    pub fn failure_kind(&self) -> FailureKind {
        match self.reason {
            ExitReason::Ok => FailureKind::Ok,
            ExitReason::NonZeroExit => FailureKind::RuntimeError,
            ExitReason::KilledTimeout => FailureKind::Timeout,
            ExitReason::UnparseableOutput => FailureKind::InvalidOutput,
        }
    }

    /// Bounded diagnostic for feedback rendering, if any was captured.
    pub fn diagnostic(&self) -> Option<String> {
        if self.stderr_tail.is_empty() {
            None
        } else {
            Some(self.stderr_tail.clone())
        }
    }
}

#[async_trait]
/// Seam between the expert loop and program execution. Production uses
/// [`PythonSandbox`]; tests substitute deterministic fakes.
pub trait ProgramRunner: Send + Sync {
    async fn run(&self, program: &str, input: &Grid) -> ExecOutcome;
}

#[derive(Debug, Clone)]
/// Executes candidate programs as `python3` child processes, wrapped in
/// firejail resource limits whenever firejail is available (see
/// [`Isolation`]).
pub struct PythonSandbox {
    python: String,
    timeout_ms: u64,
    memory_limit_mb: u64,
    isolation: Isolation,
}

impl Default for PythonSandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl PythonSandbox {
    pub fn new() -> Self {
        Self {
            python: "python3".to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            memory_limit_mb: DEFAULT_MEMORY_LIMIT_MB,
            isolation: Isolation::detect(),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms.max(1);
        self
    }

    pub fn with_interpreter(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    pub fn with_memory_limit_mb(mut self, memory_limit_mb: u64) -> Self {
        self.memory_limit_mb = memory_limit_mb.max(1);
        self
    }

    pub fn with_isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = isolation;
        self
    }

    fn build_command(&self, script: &Path) -> Command {
        match self.isolation {
            Isolation::Firejail => {
                let memory_limit_bytes = self.memory_limit_mb.saturating_mul(1_000_000);
                // CPU ceiling slightly above the wall clock so the rlimit
                // only fires on spin loops the timeout missed.
                let cpu_limit_secs = self.timeout_ms / 1_000 + 2;
                let mut command = Command::new("firejail");
                command
                    .arg("--quiet")
                    .arg("--private")
                    .arg("--private-dev")
                    .arg("--net=none")
                    .arg(format!("--rlimit-as={memory_limit_bytes}"))
                    .arg(format!("--rlimit-cpu={cpu_limit_secs}"))
                    .arg("--rlimit-nproc=16")
                    .arg("--rlimit-fsize=10000000")
                    .arg(&self.python)
                    .arg(script);
                command
            }
            Isolation::ProcessOnly => {
                let mut command = Command::new(&self.python);
                command.arg(script);
                command
            }
        }
    }
}

#[async_trait]
impl ProgramRunner for PythonSandbox {
    async fn run(&self, program: &str, input: &Grid) -> ExecOutcome {
        let source = compose_program(program);
        let mut script = match tempfile::Builder::new()
            .prefix("mosaic-")
            .suffix(".py")
            .tempfile()
        {
            Ok(file) => file,
            Err(error) => {
                return ExecOutcome::failed(
                    ExitReason::NonZeroExit,
                    format!("failed to stage program file: {error}"),
                );
            }
        };
        if let Err(error) = script.write_all(source.as_bytes()) {
            return ExecOutcome::failed(
                ExitReason::NonZeroExit,
                format!("failed to write program file: {error}"),
            );
        }

        let mut command = self.build_command(script.path());
        command
            .env("PYTHONHASHSEED", "0")
            .env("PYTHONDONTWRITEBYTECODE", "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(error) => {
                return ExecOutcome::failed(
                    ExitReason::NonZeroExit,
                    format!("failed to spawn {}: {error}", self.python),
                );
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            // A write error here means the child already exited; its status
            // and stderr tell the real story below.
            let _ = stdin
                .write_all(format!("{}\n", input.render()).as_bytes())
                .await;
        }

        let waited = tokio::time::timeout(
            Duration::from_millis(self.timeout_ms),
            child.wait_with_output(),
        )
        .await;

        let output = match waited {
            Ok(Ok(output)) => output,
            Ok(Err(error)) => {
                return ExecOutcome::failed(
                    ExitReason::NonZeroExit,
                    format!("failed to collect child output: {error}"),
                );
            }
            Err(_) => {
                tracing::debug!(timeout_ms = self.timeout_ms, "sandbox child killed at deadline");
                return ExecOutcome::failed(
                    ExitReason::KilledTimeout,
                    format!("killed after {}ms", self.timeout_ms),
                );
            }
        };

        let stderr_tail = truncate_tail(
            String::from_utf8_lossy(&output.stderr).trim_end(),
            STDERR_TAIL_BYTES,
        );
        if !output.status.success() {
            return ExecOutcome::failed(ExitReason::NonZeroExit, stderr_tail);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match Grid::parse(&stdout) {
            Ok(grid) => ExecOutcome {
                predicted: Some(grid),
                stderr_tail,
                reason: ExitReason::Ok,
            },
            Err(error) => {
                let detail = if stderr_tail.is_empty() {
                    format!("output is not a valid grid: {error}")
                } else {
                    stderr_tail
                };
                ExecOutcome::failed(ExitReason::UnparseableOutput, detail)
            }
        }
    }
}
