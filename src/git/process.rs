//! git::process
//!
//! Subprocess execution for the `git` CLI and the rewrite tools.
//!
//! Every external command is captured into a [`ProcessOutput`] so callers
//! decide what a non-zero exit means. Nothing here inherits the terminal:
//! stdout and stderr are always captured.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

/// Captured result of an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Captured stdout, lossily decoded.
    pub stdout: String,
    /// Captured stderr, lossily decoded.
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the command exited with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stderr trimmed, falling back to stdout when stderr is empty.
    ///
    /// Some tools report failures on stdout only.
    pub fn diagnostic(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// Run `program` with `args` in `cwd`, capturing output.
///
/// `envs` are added on top of the inherited environment.
///
/// # Errors
///
/// Returns the spawn error when the program cannot be started. A non-zero
/// exit is not an error at this level.
pub fn run<I, S>(
    program: &str,
    args: I,
    cwd: &Path,
    envs: &[(&str, &str)],
) -> std::io::Result<ProcessOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in envs {
        command.env(key, value);
    }

    debug!(command = ?command, "running");
    let output = command.output()?;

    let result = ProcessOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    debug!(program, code = ?result.code, "finished");
    Ok(result)
}

/// Render a command line for error messages.
pub fn render(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}
