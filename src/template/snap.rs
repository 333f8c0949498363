use super::Template;
use crate::variant::Operation;

const SNAP: &str = "snap";

// Configuration commands take the snapd configuration scope ("system" on
// current snapd, "core" before 2.36) as their first argument.
pub(super) fn template(operation: Operation) -> Template {
    match operation {
        Operation::Update | Operation::Upgrade => Template::new(SNAP, "refresh"),
        Operation::Install => Template::new(SNAP, "install {..}"),
        Operation::Remove => Template::new(SNAP, "remove {..}"),
        Operation::Purge => Template::new(SNAP, "remove --purge {..}"),
        Operation::Search => Template::new(SNAP, "find {}"),
        Operation::IsInstalled => Template::new(SNAP, "list {}"),
        Operation::ListInstalled => Template::new(SNAP, "list"),
        Operation::GetProxy => Template::new(SNAP, "get {} proxy"),
        Operation::InstalledChannel => Template::new(SNAP, "info {}"),
        Operation::ChangeChannel => Template::new(SNAP, "refresh --channel={} {}"),
        Operation::AckAssertions => Template::new(SNAP, "ack {}"),
        Operation::SetStoreProxy => Template::new(SNAP, "set {} proxy.store={}"),
        Operation::UnsetStoreProxy => Template::new(SNAP, "set {} proxy.store="),
        Operation::InstallPrerequisite
        | Operation::ListAvailable
        | Operation::AddRepository
        | Operation::RemoveRepository
        | Operation::ListRepositories
        | Operation::Cleanup => Template::Unsupported,
    }
}
