//! [`ShellRunner`] implementation over the Android Debug Bridge binary.
//!
//! Commands run as child processes with piped output.  Both pipes are
//! drained on dedicated reader threads while the parent polls the child
//! against the deadline; without the reader threads a chatty command could
//! fill a pipe and deadlock the wait.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::debug;

use super::{ShellError, ShellOutput, ShellRunner};

/// Poll granularity while waiting for the child to exit.
const WAIT_POLL: Duration = Duration::from_millis(50);

/// Runs `adb` subcommands as child processes.
pub struct AdbShell {
    program: PathBuf,
}

impl AdbShell {
    /// Uses the `adb` binary found on `PATH`.
    pub fn new() -> Self {
        Self::with_program("adb")
    }

    /// Uses an explicit binary path, for hosts where `adb` is not on `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Checks that the binary is present and answers `adb version`.
    pub fn is_available(&self) -> bool {
        matches!(
            self.run(&["version".to_string()], Duration::from_secs(5)),
            Ok(output) if output.success()
        )
    }
}

impl Default for AdbShell {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellRunner for AdbShell {
    fn run(&self, args: &[String], timeout: Duration) -> Result<ShellOutput, ShellError> {
        let program = self.program.display().to_string();
        debug!(command = %format!("{program} {}", args.join(" ")), "running shell command");

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ShellError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdout_reader = child.stdout.take().map(spawn_pipe_reader);
        let stderr_reader = child.stderr.take().map(spawn_pipe_reader);

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ShellError::Timeout { timeout });
                    }
                    std::thread::sleep(WAIT_POLL);
                }
                Err(source) => {
                    return Err(ShellError::Wait { program, source });
                }
            }
        };

        let stdout = stdout_reader
            .map(|h| h.join().unwrap_or_default())
            .unwrap_or_default();
        let stderr = stderr_reader
            .map(|h| h.join().unwrap_or_default())
            .unwrap_or_default();

        Ok(ShellOutput {
            stdout,
            stderr,
            status: status.code().unwrap_or(-1),
        })
    }
}

fn spawn_pipe_reader<R: Read + Send + 'static>(mut pipe: R) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut text = String::new();
        let _ = pipe.read_to_string(&mut text);
        text
    })
}
