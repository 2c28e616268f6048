//! Remote shell channel to the device's Android-side storage.
//!
//! Media files live on the display's own storage and are managed out-of-band
//! through a debug-bridge shell, not through the HID protocol.  The
//! [`ShellRunner`] trait is the narrow capability the media catalog needs:
//! run one command with a timeout, capture stdout/stderr/exit code.  All
//! parsing of command output stays in the catalog.

use std::time::Duration;

use thiserror::Error;

pub mod adb;

/// Captured result of one completed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code; `-1` when the process was terminated by a signal.
    pub status: i32,
}

impl ShellOutput {
    /// `true` when the command exited with status 0.
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Error type for shell execution.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The program could not be started at all.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child process failed.
    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command did not finish within the deadline and was killed.
    #[error("command timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

/// One-shot command execution with a hard deadline.
///
/// Every invocation is independent and non-pipelined; implementations must
/// kill the child when the timeout expires rather than block forever.
#[cfg_attr(test, mockall::automock)]
pub trait ShellRunner: Send + Sync {
    /// Runs the configured program with `args`, blocking up to `timeout`.
    fn run(&self, args: &[String], timeout: Duration) -> Result<ShellOutput, ShellError>;
}
