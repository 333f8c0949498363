//! Drive host package managers (apt, yum, zypper, snap) through one API.
//!
//! ```no_run
//! use hostpkg::{PackageManager, Variant};
//!
//! # async fn demo() -> hostpkg::Result<()> {
//! let apt = PackageManager::system(Variant::Apt);
//! apt.update().await?;
//! if !apt.is_installed("git").await? {
//!     apt.install(&["git"]).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod manager;
pub mod proxy;
pub mod template;
pub mod variant;

pub use config::ManagerConfig;
pub use error::{PackagingError, Result};
pub use executor::{CancelHandle, CancelToken, CommandRunner, Invocation, SystemRunner};
pub use manager::PackageManager;
pub use proxy::ProxySettings;
pub use template::{CommandLine, CommandSet};
pub use variant::{Operation, Variant};
