//! Bounded retries of package manager commands with outcome classification.
//!
//! Package managers hold a system-wide lock (dpkg, rpm, snapd) and fail when
//! another process has it, or when a mirror briefly cannot be resolved. apt-get
//! and yum both report those outside issues with exit status 100, so that
//! status is retried by default. Anything else is fatal, and a per-call fatal
//! predicate can stop retries early based on the command output.

mod cancel;
mod runner;

use log::{error, info, warn};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::ManagerConfig;
use crate::error::{PackagingError, Result};
use crate::template::CommandLine;

pub use cancel::{CancelHandle, CancelToken};
#[cfg(test)]
pub use runner::MockCommandRunner;
pub use runner::{CommandRunner, Invocation, SystemRunner};

/// Exit status used by apt-get and yum for failures caused by outside issues.
pub const TRANSIENT_EXIT_CODE: i32 = 100;

/// Decides from the output that a failed command must not be retried.
/// Returns the reason.
pub type FatalCheck = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Decides that a failed execution is worth retrying.
pub type TransientCheck = Arc<dyn Fn(&Invocation) -> bool + Send + Sync>;

/// Transient check matching a single exit code.
pub fn exit_code_is(code: i32) -> TransientCheck {
    Arc::new(move |invocation: &Invocation| invocation.code == Some(code))
}

/// How one command is retried.
#[derive(Clone)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
    deadline: Option<Duration>,
    transient: TransientCheck,
    fatal: Option<FatalCheck>,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
            deadline: None,
            transient: exit_code_is(TRANSIENT_EXIT_CODE),
            fatal: None,
        }
    }

    pub fn from_config(config: &ManagerConfig) -> Self {
        Self::new(config.attempts, config.delay).with_deadline(config.deadline)
    }

    /// A single execution, no retries.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_fatal<F>(mut self, check: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.fatal = Some(Arc::new(check));
        self
    }

    pub fn with_transient(mut self, check: TransientCheck) -> Self {
        self.transient = check;
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    fn classify(&self, invocation: &Invocation) -> Attempt {
        if invocation.success() {
            return Attempt::Success;
        }
        if let Some(reason) = self.fatal.as_ref().and_then(|check| check(&invocation.output)) {
            return Attempt::Fatal(reason);
        }
        if (self.transient)(invocation) {
            return Attempt::Transient;
        }
        Attempt::Fatal(match invocation.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ManagerConfig::default())
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("attempts", &self.attempts)
            .field("delay", &self.delay)
            .field("deadline", &self.deadline)
            .field("fatal", &self.fatal.is_some())
            .finish()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Attempt {
    Success,
    Transient,
    Fatal(String),
}

/// Runs commands through a [`CommandRunner`] under a [`RetryPolicy`].
pub struct Executor<R> {
    runner: R,
    cancel: CancelToken,
}

impl<R: CommandRunner> Executor<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            cancel: CancelToken::never(),
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run `command` until it succeeds, fails fatally, or the policy gives up.
    #[tracing::instrument(skip(self, command, policy), fields(command = %command))]
    pub async fn run(&self, command: &CommandLine, policy: &RetryPolicy) -> Result<Invocation> {
        let started = Instant::now();
        let deadline = policy.deadline.map(|d| started + d);
        info!("Running: {}", command);

        let mut attempt = 1;
        loop {
            if self.cancel.is_cancelled() {
                return Err(self.cancelled(command));
            }

            let invocation = self
                .guard(command, started, deadline, self.runner.run(command))
                .await?
                .map_err(|source| {
                    error!("failed to start {}: {}", command, source);
                    PackagingError::Spawn {
                        command: command.to_string(),
                        source,
                    }
                })?;

            match policy.classify(&invocation) {
                Attempt::Success => return Ok(invocation),
                Attempt::Fatal(reason) => {
                    error!(
                        "packaging command failed: {}; cmd: {}; output: {}",
                        reason, command, invocation.output
                    );
                    return Err(PackagingError::Fatal {
                        command: command.to_string(),
                        code: invocation.code,
                        reason,
                        output: invocation.output,
                    });
                }
                Attempt::Transient if attempt >= policy.attempts => {
                    error!(
                        "packaging command failed after {} attempt(s); cmd: {}; output: {}",
                        attempt, command, invocation.output
                    );
                    return Err(PackagingError::AttemptsExceeded {
                        command: command.to_string(),
                        attempts: attempt,
                        code: invocation.code.unwrap_or(-1),
                        output: invocation.output,
                    });
                }
                Attempt::Transient => {
                    warn!(
                        "{}: attempt {}/{} failed with exit code {:?}, retrying in {:?}: {}",
                        command,
                        attempt,
                        policy.attempts,
                        invocation.code,
                        policy.delay,
                        invocation.output.trim()
                    );
                    self.guard(command, started, deadline, tokio::time::sleep(policy.delay))
                        .await?;
                    attempt += 1;
                    info!("Retrying: {}", command);
                }
            }
        }
    }

    /// Races `work` against cancellation and the deadline. Dropping `work`
    /// kills a running child process.
    async fn guard<F: Future>(
        &self,
        command: &CommandLine,
        started: Instant,
        deadline: Option<Instant>,
        work: F,
    ) -> Result<F::Output> {
        let expired = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            output = work => Ok(output),
            _ = self.cancel.cancelled() => Err(self.cancelled(command)),
            _ = expired => {
                let elapsed = started.elapsed();
                error!("giving up on {} after {:?}", command, elapsed);
                Err(PackagingError::DeadlineExceeded {
                    command: command.to_string(),
                    elapsed,
                })
            }
        }
    }

    fn cancelled(&self, command: &CommandLine) -> PackagingError {
        warn!("cancelled: {}", command);
        PackagingError::Cancelled {
            command: command.to_string(),
        }
    }
}
