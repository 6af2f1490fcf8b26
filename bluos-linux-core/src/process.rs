//! Scoped execution of external tools.
//!
//! A [`CommandSpec`] describes one invocation; a [`ProcessRunner`] runs it to
//! completion and hands back the exit code and captured output. The system
//! runner reaps the child on every exit path.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while running an external tool.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {}: {stderr}", exit_label(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

// =============================================================================
// Command Description
// =============================================================================

/// One external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn envs(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env.extend(vars);
        self
    }

    /// File name of the program, e.g. `npm` for `/usr/local/bin/npm`.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Exit code and captured output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

// =============================================================================
// Runner
// =============================================================================

/// Runs external tools to completion.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Runs `spec` and returns its output, whatever the exit code.
    ///
    /// Only a failure to start the process is an error here.
    async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput, ProcessError>;
}

/// [`ProcessRunner`] that spawns real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput, ProcessError> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);

        if let Some(dir) = &spec.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        debug!(command = %spec, cwd = ?spec.current_dir, "Spawning process");

        let output = cmd.output().await.map_err(|source| ProcessError::Spawn {
            command: spec.to_string(),
            source,
        })?;

        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs `spec` and turns a non-zero exit into [`ProcessError::Failed`].
///
/// The captured stderr is logged before the error is returned.
pub async fn run_checked(
    runner: &dyn ProcessRunner,
    spec: &CommandSpec,
) -> Result<ProcessOutput, ProcessError> {
    let output = runner.run(spec).await?;

    if !output.success() {
        error!(
            "Error running {}: {}",
            spec.program_name(),
            output.stderr.trim_end()
        );
        return Err(ProcessError::Failed {
            command: spec.to_string(),
            code: output.code,
            stderr: output.stderr.trim_end().to_string(),
        });
    }

    debug!(
        command = %spec.program_name(),
        stdout_bytes = output.stdout.len(),
        "Process finished"
    );
    Ok(output)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh").arg("-c").arg(script)
    }

    #[tokio::test]
    async fn test_captures_stdout_and_stderr() {
        let output = SystemRunner
            .run(&sh("echo out; echo err >&2"))
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_reported() {
        let output = SystemRunner.run(&sh("exit 3")).await.unwrap();
        assert_eq!(output.code, Some(3));
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_run_checked_attaches_stderr() {
        let err = run_checked(&SystemRunner, &sh("echo 'no such archive' >&2; exit 2"))
            .await
            .unwrap_err();
        match err {
            ProcessError::Failed { code, stderr, .. } => {
                assert_eq!(code, Some(2));
                assert_eq!(stderr, "no such archive");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_working_directory_and_env() {
        let dir = TempDir::new().unwrap();
        let spec = sh("pwd; echo $BLUOS_TEST_VAR")
            .current_dir(dir.path())
            .envs([("BLUOS_TEST_VAR".to_string(), "set".to_string())]);

        let output = run_checked(&SystemRunner, &spec).await.unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        let mut lines = output.stdout.lines();
        assert_eq!(
            PathBuf::from(lines.next().unwrap()).canonicalize().unwrap(),
            canonical
        );
        assert_eq!(lines.next(), Some("set"));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let spec = CommandSpec::new("/nonexistent/bin/electron-builder");
        let err = SystemRunner.run(&spec).await.unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[test]
    fn test_display_and_program_name() {
        let spec = CommandSpec::new("/usr/local/bin/npm")
            .arg("install")
            .arg("electron-builder")
            .arg("--save-dev");
        assert_eq!(
            spec.to_string(),
            "/usr/local/bin/npm install electron-builder --save-dev"
        );
        assert_eq!(spec.program_name(), "npm");
    }
}
