//! One async method per packaging operation, whatever the host uses.

mod output;

use log::{debug, info};
use std::io::Write;

use crate::config::ManagerConfig;
use crate::error::{PackagingError, Result};
use crate::executor::{
    CancelToken, CommandRunner, Executor, Invocation, RetryPolicy, SystemRunner,
};
use crate::proxy::{ProxyCodec, ProxySettings};
use crate::template::{CommandLine, CommandSet};
use crate::variant::{Operation, Variant};

/// Drives the package manager of one [`Variant`].
pub struct PackageManager<R> {
    variant: Variant,
    config: ManagerConfig,
    codec: ProxyCodec,
    executor: Executor<R>,
}

impl PackageManager<SystemRunner> {
    /// A manager running commands on this host with default settings.
    pub fn system(variant: Variant) -> Self {
        Self::new(variant, ManagerConfig::default(), SystemRunner)
    }
}

impl<R: CommandRunner> PackageManager<R> {
    pub fn new(variant: Variant, config: ManagerConfig, runner: R) -> Self {
        Self {
            variant,
            codec: ProxyCodec::for_variant(variant, &config),
            config,
            executor: Executor::new(runner),
        }
    }

    /// Abort retry loops once `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.executor = self.executor.with_cancel(token);
        self
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Render the command for `operation` without running it.
    pub fn render(&self, operation: Operation, args: &[&str]) -> Result<CommandLine> {
        self.variant.render(operation, args)
    }

    fn policy(&self) -> RetryPolicy {
        RetryPolicy::from_config(&self.config)
    }

    async fn execute(
        &self,
        operation: Operation,
        args: &[&str],
        policy: &RetryPolicy,
    ) -> Result<Invocation> {
        let command = self.render(operation, args)?;
        debug!("{} {}: {}", self.variant, operation, command);
        self.executor.run(&command, policy).await
    }

    async fn pass_through(&self, operation: Operation, args: &[&str]) -> Result<()> {
        self.execute(operation, args, &self.policy()).await?;
        Ok(())
    }

    /// Run a command that names packages, turning "unknown package" failures
    /// into [`PackagingError::NotFound`] without retrying them.
    async fn with_packages(&self, operation: Operation, packages: &[&str]) -> Result<Invocation> {
        let policy = self.policy().with_fatal(|out| {
            output::not_found(out).map(|_| output::NOT_FOUND_REASON.to_string())
        });
        match self.execute(operation, packages, &policy).await {
            Err(PackagingError::Fatal {
                command,
                reason,
                output: out,
                ..
            }) if reason == output::NOT_FOUND_REASON => {
                let name = output::not_found(&out)
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| packages.join(", "));
                Err(PackagingError::NotFound {
                    name,
                    command,
                    output: out,
                })
            }
            other => other,
        }
    }

    /// Install what the manager itself needs to manage repositories.
    #[tracing::instrument(skip(self))]
    pub async fn install_prerequisite(&self) -> Result<()> {
        self.pass_through(Operation::InstallPrerequisite, &[]).await
    }

    /// Refresh the package index.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self) -> Result<()> {
        self.pass_through(Operation::Update, &[]).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn upgrade(&self) -> Result<()> {
        self.pass_through(Operation::Upgrade, &[]).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn install(&self, packages: &[&str]) -> Result<()> {
        self.with_packages(Operation::Install, packages).await?;
        info!("Installed {}", packages.join(" "));
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, packages: &[&str]) -> Result<()> {
        self.with_packages(Operation::Remove, packages).await?;
        Ok(())
    }

    /// Remove packages together with their configuration.
    #[tracing::instrument(skip(self))]
    pub async fn purge(&self, packages: &[&str]) -> Result<()> {
        self.with_packages(Operation::Purge, packages).await?;
        Ok(())
    }

    /// Whether the package is known to the configured sources.
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, package: &str) -> Result<bool> {
        let policy = self.policy().with_fatal(|out| {
            output::no_results(out).then(|| output::NO_RESULTS_REASON.to_string())
        });
        match self.execute(Operation::Search, &[package], &policy).await {
            Ok(invocation) => Ok(output::has_results(&invocation.output)),
            Err(PackagingError::Fatal { reason, .. }) if reason == output::NO_RESULTS_REASON => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Whether the package is installed. Runs the query exactly once; a failed
    /// query means "not installed".
    #[tracing::instrument(skip(self))]
    pub async fn is_installed(&self, package: &str) -> Result<bool> {
        match self
            .execute(Operation::IsInstalled, &[package], &RetryPolicy::once())
            .await
        {
            Ok(invocation) => Ok(!output::not_installed(&invocation.output)),
            Err(PackagingError::Fatal { .. } | PackagingError::AttemptsExceeded { .. }) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_installed(&self) -> Result<Vec<String>> {
        let invocation = self
            .execute(Operation::ListInstalled, &[], &self.policy())
            .await?;
        Ok(output::installed_packages(self.variant, &invocation.output))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_available(&self) -> Result<Vec<String>> {
        let invocation = self
            .execute(Operation::ListAvailable, &[], &self.policy())
            .await?;
        Ok(output::available_packages(self.variant, &invocation.output))
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_repository(&self, repository: &str) -> Result<()> {
        self.pass_through(Operation::AddRepository, &[repository]).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_repository(&self, repository: &str) -> Result<()> {
        self.pass_through(Operation::RemoveRepository, &[repository])
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_repositories(&self) -> Result<Vec<String>> {
        let invocation = self
            .execute(Operation::ListRepositories, &[], &self.policy())
            .await?;
        Ok(output::repositories(self.variant, &invocation.output))
    }

    /// Remove packages that are no longer needed.
    #[tracing::instrument(skip(self))]
    pub async fn cleanup(&self) -> Result<()> {
        self.pass_through(Operation::Cleanup, &[]).await
    }

    /// Proxy settings currently applied to the package manager.
    #[tracing::instrument(skip(self))]
    pub async fn get_proxy_settings(&self) -> Result<ProxySettings> {
        let args = self.codec.query_args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let invocation = match self.execute(Operation::GetProxy, &args, &self.policy()).await {
            Ok(invocation) => invocation,
            Err(PackagingError::Fatal { output: out, .. }) if output::proxy_unset(&out) => {
                debug!("no proxy configured for {}", self.variant);
                return Ok(ProxySettings::default());
            }
            Err(e) => return Err(e),
        };

        self.codec
            .decode(&invocation.output)
            .map_err(|malformed| PackagingError::MalformedOutput {
                command: invocation.command.to_string(),
                reason: malformed.to_string(),
                output: invocation.output.clone(),
            })
    }

    /// Apply every configured field of `settings`, in order. Stops at the first
    /// failing command.
    #[tracing::instrument(skip(self))]
    pub async fn set_proxy(&self, settings: &ProxySettings) -> Result<()> {
        let policy = self.policy();
        for command in self.codec.set_commands(settings) {
            self.executor.run(&command, &policy).await?;
        }
        Ok(())
    }

    /// Channel a snap is tracking, `None` when snapd reports none.
    #[tracing::instrument(skip(self))]
    pub async fn installed_channel(&self, package: &str) -> Result<Option<String>> {
        let invocation = self.with_packages(Operation::InstalledChannel, &[package]).await?;
        Ok(output::tracking_channel(&invocation.output))
    }

    #[tracing::instrument(skip(self))]
    pub async fn change_channel(&self, package: &str, channel: &str) -> Result<()> {
        self.with_packages(Operation::ChangeChannel, &[channel, package])
            .await?;
        info!("{} now tracks {}", package, channel);
        Ok(())
    }

    /// Point snapd at a store proxy: acknowledge its assertions, then select
    /// the store by id.
    #[tracing::instrument(skip(self, assertions))]
    pub async fn configure_store_proxy(&self, assertions: &str, store_id: &str) -> Result<()> {
        // Unsupported variants fail before anything is written.
        self.render(Operation::SetStoreProxy, &[&self.config.snap_scope, store_id])?;

        let mut file = tempfile::NamedTempFile::new().map_err(|source| PackagingError::Io {
            context: "failed to create assertions file".to_string(),
            source,
        })?;
        file.write_all(assertions.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| PackagingError::Io {
                context: format!("failed to write {}", file.path().display()),
                source,
            })?;

        let path = file.path().display().to_string();
        self.pass_through(Operation::AckAssertions, &[&path]).await?;
        self.pass_through(
            Operation::SetStoreProxy,
            &[&self.config.snap_scope, store_id],
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn disable_store_proxy(&self) -> Result<()> {
        self.pass_through(Operation::UnsetStoreProxy, &[&self.config.snap_scope])
            .await
    }
}
