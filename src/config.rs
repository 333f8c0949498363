//! Settings shared by every operation of a package manager.

use std::path::PathBuf;
use std::time::Duration;

/// Default number of executions for one command.
pub const DEFAULT_ATTEMPTS: u32 = 30;

/// Default pause between two executions of a command.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(10);

/// snapd configuration scope. Releases before 2.36 call it "core".
pub const DEFAULT_SNAP_SCOPE: &str = "system";

pub const DEFAULT_APT_PROXY_FILE: &str = "/etc/apt/apt.conf.d/95-hostpkg-proxy-settings";

pub const DEFAULT_ENVIRONMENT_FILE: &str = "/etc/environment";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Executions per command, at least one.
    pub attempts: u32,
    /// Pause between executions after a transient failure.
    pub delay: Duration,
    /// Upper bound on the wall-clock time of one command including retries.
    pub deadline: Option<Duration>,
    pub snap_scope: String,
    pub apt_proxy_file: PathBuf,
    pub environment_file: PathBuf,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            delay: DEFAULT_DELAY,
            deadline: None,
            snap_scope: DEFAULT_SNAP_SCOPE.to_string(),
            apt_proxy_file: PathBuf::from(DEFAULT_APT_PROXY_FILE),
            environment_file: PathBuf::from(DEFAULT_ENVIRONMENT_FILE),
        }
    }
}

impl ManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the attempt bound. Zero is raised to one.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_snap_scope(mut self, scope: impl Into<String>) -> Self {
        self.snap_scope = scope.into();
        self
    }

    pub fn with_apt_proxy_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.apt_proxy_file = path.into();
        self
    }

    pub fn with_environment_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.environment_file = path.into();
        self
    }
}
