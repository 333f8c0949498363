use anyhow::{Context, Result};
use clap::Parser;
use hostpkg::config::{DEFAULT_ATTEMPTS, DEFAULT_SNAP_SCOPE};
use hostpkg::{
    CancelHandle, ManagerConfig, Operation, PackageManager, ProxySettings, SystemRunner, Variant,
};
use log::warn;
use std::process::ExitCode;
use std::time::Duration;

/// hostpkg - drive the host package manager
///
/// One set of commands for apt, yum, zypper and snap. Transient failures
/// (another process holding the package manager lock, a flaky mirror) are
/// retried with a fixed delay.
///
/// Examples:
///   hostpkg --variant apt install git curl
///   hostpkg --variant snap render install lxd    # print the command only
#[derive(Parser, Debug)]
#[command(author, version = env!("HOSTPKG_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Package manager to drive: apt, yum (or dnf), zypper, snap
    #[arg(long, short = 'p', env = "HOSTPKG_VARIANT", global = true)]
    variant: Option<Variant>,

    /// Executions per command before giving up
    #[arg(long, env = "HOSTPKG_ATTEMPTS", default_value_t = DEFAULT_ATTEMPTS, global = true)]
    attempts: u32,

    /// Seconds to wait between two executions
    #[arg(long = "retry-delay", env = "HOSTPKG_RETRY_DELAY", default_value_t = 10, global = true)]
    retry_delay: u64,

    /// Give up on a command after this many seconds, retries included
    #[arg(long, env = "HOSTPKG_DEADLINE", value_name = "SECS", global = true)]
    deadline: Option<u64>,

    /// snapd configuration scope ("core" before snapd 2.36)
    #[arg(long = "snap-scope", env = "HOSTPKG_SNAP_SCOPE", default_value = DEFAULT_SNAP_SCOPE, global = true)]
    snap_scope: String,

    /// More output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Install packages
    Install(PackagesArgs),
    /// Remove packages
    Remove(PackagesArgs),
    /// Remove packages and their configuration
    Purge(PackagesArgs),
    /// Check whether a package is available (exit status 1 if not)
    Search(PackageArgs),
    /// Check whether a package is installed (exit status 1 if not)
    IsInstalled(PackageArgs),
    /// List installed packages
    ListInstalled,
    /// List packages available from the configured sources
    ListAvailable,
    /// Add a package repository
    AddRepo(RepoArgs),
    /// Remove a package repository
    RemoveRepo(RepoArgs),
    /// List package repositories
    ListRepos,
    /// Refresh the package index
    Update,
    /// Upgrade installed packages
    Upgrade,
    /// Remove packages that are no longer needed
    Cleanup,
    /// Show the proxy settings of the package manager
    GetProxy(GetProxyArgs),
    /// Apply proxy settings to the package manager
    SetProxy(SetProxyArgs),
    /// Show the channel a snap tracks
    Channel(PackageArgs),
    /// Make a snap track another channel
    SwitchChannel(SwitchChannelArgs),
    /// Print the command for an operation without running it
    Render(RenderArgs),
}

#[derive(clap::Args, Debug)]
struct PackagesArgs {
    #[arg(value_name = "PACKAGE", required = true)]
    packages: Vec<String>,
}

#[derive(clap::Args, Debug)]
struct PackageArgs {
    #[arg(value_name = "PACKAGE")]
    package: String,
}

#[derive(clap::Args, Debug)]
struct RepoArgs {
    #[arg(value_name = "REPOSITORY")]
    repository: String,
}

#[derive(clap::Args, Debug)]
struct GetProxyArgs {
    /// Print the settings as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct SetProxyArgs {
    #[arg(long, value_name = "URL", default_value = "")]
    http: String,
    #[arg(long, value_name = "URL", default_value = "")]
    https: String,
    #[arg(long, value_name = "URL", default_value = "")]
    ftp: String,
    /// Comma separated hosts that bypass the proxy
    #[arg(long = "no-proxy", value_name = "HOSTS", default_value = "")]
    no_proxy: String,
}

#[derive(clap::Args, Debug)]
struct SwitchChannelArgs {
    #[arg(value_name = "SNAP")]
    package: String,
    #[arg(value_name = "CHANNEL")]
    channel: String,
}

#[derive(clap::Args, Debug)]
struct RenderArgs {
    /// Operation name, e.g. install, get-proxy, change-channel
    operation: Operation,
    args: Vec<String>,
}

impl Commands {
    /// The operation this command runs, if it runs one.
    fn operation(&self) -> Option<Operation> {
        Some(match self {
            Commands::Install(_) => Operation::Install,
            Commands::Remove(_) => Operation::Remove,
            Commands::Purge(_) => Operation::Purge,
            Commands::Search(_) => Operation::Search,
            Commands::IsInstalled(_) => Operation::IsInstalled,
            Commands::ListInstalled => Operation::ListInstalled,
            Commands::ListAvailable => Operation::ListAvailable,
            Commands::AddRepo(_) => Operation::AddRepository,
            Commands::RemoveRepo(_) => Operation::RemoveRepository,
            Commands::ListRepos => Operation::ListRepositories,
            Commands::Update => Operation::Update,
            Commands::Upgrade => Operation::Upgrade,
            Commands::Cleanup => Operation::Cleanup,
            Commands::GetProxy(_) => Operation::GetProxy,
            Commands::Channel(_) => Operation::InstalledChannel,
            Commands::SwitchChannel(_) => Operation::ChangeChannel,
            Commands::SetProxy(_) | Commands::Render(_) => return None,
        })
    }

    fn is_mutating(&self) -> bool {
        match self {
            Commands::SetProxy(_) => true,
            other => other.operation().is_some_and(|op| op.is_mutating()),
        }
    }
}

impl Cli {
    fn config(&self) -> ManagerConfig {
        ManagerConfig::new()
            .with_attempts(self.attempts)
            .with_delay(Duration::from_secs(self.retry_delay))
            .with_deadline(self.deadline.map(Duration::from_secs))
            .with_snap_scope(self.snap_scope.clone())
    }

    fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[cfg(unix)]
fn is_privileged() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn is_privileged() -> bool {
    true
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn status(found: bool) -> ExitCode {
    if found {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    let variant = cli
        .variant
        .context("No package manager selected. Pass --variant or set HOSTPKG_VARIANT.")?;

    if cli.command.is_mutating() && !is_privileged() {
        warn!("Not running as root; {} will probably refuse to make changes", variant.binary());
    }

    let cancel = CancelHandle::new();
    let pm = PackageManager::new(variant, cli.config(), SystemRunner).with_cancel(cancel.token());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping");
            cancel.cancel();
        }
    });

    match cli.command {
        Commands::Install(args) => pm.install(&as_strs(&args.packages)).await?,
        Commands::Remove(args) => pm.remove(&as_strs(&args.packages)).await?,
        Commands::Purge(args) => pm.purge(&as_strs(&args.packages)).await?,
        Commands::Search(args) => return Ok(status(pm.search(&args.package).await?)),
        Commands::IsInstalled(args) => return Ok(status(pm.is_installed(&args.package).await?)),
        Commands::ListInstalled => print_lines(&pm.list_installed().await?),
        Commands::ListAvailable => print_lines(&pm.list_available().await?),
        Commands::AddRepo(args) => pm.add_repository(&args.repository).await?,
        Commands::RemoveRepo(args) => pm.remove_repository(&args.repository).await?,
        Commands::ListRepos => print_lines(&pm.list_repositories().await?),
        Commands::Update => pm.update().await?,
        Commands::Upgrade => pm.upgrade().await?,
        Commands::Cleanup => pm.cleanup().await?,
        Commands::GetProxy(args) => {
            let settings = pm.get_proxy_settings().await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                for (scheme, value) in settings.configured() {
                    println!("{}_proxy={}", scheme, value);
                }
            }
        }
        Commands::SetProxy(args) => {
            let settings = ProxySettings {
                http: args.http,
                https: args.https,
                ftp: args.ftp,
                no_proxy: args.no_proxy,
            };
            if settings.is_empty() {
                warn!("No proxy given, nothing to do");
            }
            pm.set_proxy(&settings).await?
        }
        Commands::Channel(args) => match pm.installed_channel(&args.package).await? {
            Some(channel) => println!("{}", channel),
            None => return Ok(ExitCode::FAILURE),
        },
        Commands::SwitchChannel(args) => pm.change_channel(&args.package, &args.channel).await?,
        Commands::Render(args) => {
            println!("{}", pm.render(args.operation, &as_strs(&args.args))?)
        }
    }
    Ok(ExitCode::SUCCESS)
}
