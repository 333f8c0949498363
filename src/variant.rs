//! Package manager families and the semantic operations they expose.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Package manager family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Apt,
    Yum,
    Zypper,
    Snap,
}

impl Variant {
    pub const ALL: [Variant; 4] = [Variant::Apt, Variant::Yum, Variant::Zypper, Variant::Snap];

    /// Name of the main binary, used for diagnostics.
    pub fn binary(&self) -> &'static str {
        match self {
            Variant::Apt => "apt-get",
            Variant::Yum => "yum",
            Variant::Zypper => "zypper",
            Variant::Snap => "snap",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Apt => write!(f, "apt"),
            Variant::Yum => write!(f, "yum"),
            Variant::Zypper => write!(f, "zypper"),
            Variant::Snap => write!(f, "snap"),
        }
    }
}

impl FromStr for Variant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "apt" => Ok(Variant::Apt),
            "yum" | "dnf" => Ok(Variant::Yum),
            "zypper" => Ok(Variant::Zypper),
            "snap" => Ok(Variant::Snap),
            _ => anyhow::bail!(
                "Unknown package manager: {}. Expected apt, yum, zypper, or snap.",
                s
            ),
        }
    }
}

/// Semantic operation understood by every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    InstallPrerequisite,
    Update,
    Upgrade,
    Install,
    Remove,
    Purge,
    Search,
    IsInstalled,
    ListAvailable,
    ListInstalled,
    AddRepository,
    RemoveRepository,
    ListRepositories,
    Cleanup,
    GetProxy,
    InstalledChannel,
    ChangeChannel,
    AckAssertions,
    SetStoreProxy,
    UnsetStoreProxy,
}

impl Operation {
    pub const ALL: [Operation; 20] = [
        Operation::InstallPrerequisite,
        Operation::Update,
        Operation::Upgrade,
        Operation::Install,
        Operation::Remove,
        Operation::Purge,
        Operation::Search,
        Operation::IsInstalled,
        Operation::ListAvailable,
        Operation::ListInstalled,
        Operation::AddRepository,
        Operation::RemoveRepository,
        Operation::ListRepositories,
        Operation::Cleanup,
        Operation::GetProxy,
        Operation::InstalledChannel,
        Operation::ChangeChannel,
        Operation::AckAssertions,
        Operation::SetStoreProxy,
        Operation::UnsetStoreProxy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::InstallPrerequisite => "install-prerequisite",
            Operation::Update => "update",
            Operation::Upgrade => "upgrade",
            Operation::Install => "install",
            Operation::Remove => "remove",
            Operation::Purge => "purge",
            Operation::Search => "search",
            Operation::IsInstalled => "is-installed",
            Operation::ListAvailable => "list-available",
            Operation::ListInstalled => "list-installed",
            Operation::AddRepository => "add-repository",
            Operation::RemoveRepository => "remove-repository",
            Operation::ListRepositories => "list-repositories",
            Operation::Cleanup => "cleanup",
            Operation::GetProxy => "get-proxy",
            Operation::InstalledChannel => "installed-channel",
            Operation::ChangeChannel => "change-channel",
            Operation::AckAssertions => "ack-assertions",
            Operation::SetStoreProxy => "set-store-proxy",
            Operation::UnsetStoreProxy => "unset-store-proxy",
        }
    }

    /// Whether the operation changes system state.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Operation::Search
                | Operation::IsInstalled
                | Operation::ListAvailable
                | Operation::ListInstalled
                | Operation::ListRepositories
                | Operation::GetProxy
                | Operation::InstalledChannel
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.name() == wanted)
            .ok_or_else(|| anyhow::anyhow!("Unknown operation: {}", s))
    }
}
