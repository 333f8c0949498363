//! The capability that actually starts processes.

use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;

use crate::template::CommandLine;

/// One finished execution of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: CommandLine,
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// Standard output followed by standard error.
    pub output: String,
}

impl Invocation {
    pub fn new(command: CommandLine, code: Option<i32>, output: impl Into<String>) -> Self {
        Self {
            command,
            code,
            output: output.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs a command once and captures its outcome.
///
/// A non-zero exit is not an error here; `Err` means the process could not be
/// run at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &CommandLine) -> std::io::Result<Invocation>;
}

#[async_trait]
impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    async fn run(&self, command: &CommandLine) -> std::io::Result<Invocation> {
        (**self).run(command).await
    }
}

/// Runs commands on the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    #[tracing::instrument(skip(self))]
    async fn run(&self, command: &CommandLine) -> std::io::Result<Invocation> {
        // Output markers are matched in English.
        let output = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(Invocation::new(command.clone(), output.status.code(), text))
    }
}
