//! External tool invocation.
//!
//! The installer compiler, the signer and the archiver all run through
//! [`Cmd`]. A non-zero exit becomes [`PackError::ExternalTool`] carrying the
//! program name, exit code and captured stderr; the caller decides nothing
//! about retrying.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{PackError, Result};

/// How often a running child is polled when a timeout is set.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured output of a finished tool.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code; -1 when the tool was killed by a signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// One external tool invocation, configured builder-style.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    /// Kill the child once this much time has passed.
    timeout: Option<Duration>,
}

impl Cmd {
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            current_dir: None,
            timeout: None,
        }
    }

    /// Split a configured command line (`"signtool sign /a"`) on whitespace.
    /// Returns `None` for an empty line.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let program = words.next()?;
        Some(Self::new(program).args(words))
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    pub fn dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Kill the command if it runs longer than `timeout`.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run to completion, capturing stdout and stderr.
    pub fn run(self) -> Result<CommandResult> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }

        debug!(program = %self.program, args = ?self.args, "running");
        let child = cmd
            .spawn()
            .map_err(|e| PackError::io(PathBuf::from(&self.program), e))?;

        let result = match self.timeout {
            None => {
                let output = child
                    .wait_with_output()
                    .map_err(|e| PackError::io(PathBuf::from(&self.program), e))?;
                CommandResult {
                    status: output.status,
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                }
            }
            Some(timeout) => self.wait_with_timeout(child, timeout)?,
        };

        if !result.success() {
            return Err(PackError::ExternalTool {
                program: self.program,
                code: result.code(),
                stderr: result.stderr,
            });
        }
        Ok(result)
    }

    fn wait_with_timeout(&self, mut child: Child, timeout: Duration) -> Result<CommandResult> {
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);
        let io_err = |e| PackError::io(PathBuf::from(&self.program), e);

        let start = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait().map_err(io_err)? {
                break status;
            }
            if start.elapsed() >= timeout {
                // The child may exit between the poll and the kill.
                let _ = child.kill();
                let _ = child.wait();
                return Err(PackError::ExternalTool {
                    program: self.program.clone(),
                    code: -1,
                    stderr: format!("timed out after {}s", timeout.as_secs_f64()),
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(CommandResult {
            status,
            stdout: stdout.map(join).unwrap_or_default(),
            stderr: stderr.map(join).unwrap_or_default(),
        })
    }
}

/// Read a pipe to completion on its own thread so the child never blocks on
/// a full pipe while it is being polled.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

// =============================================================================
// Convenience functions
// =============================================================================

/// Locate a program on PATH (or verify an explicit path).
pub fn which(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

/// True when `program` resolves on PATH.
pub fn exists(program: &str) -> bool {
    which(program).is_some()
}

// =============================================================================
// Tests
// =============================================================================
