use super::Template;
use crate::variant::Operation;

const ZYPPER: &str = "zypper --quiet --non-interactive";

pub(super) fn template(operation: Operation) -> Template {
    match operation {
        Operation::InstallPrerequisite => Template::new(ZYPPER, "install zypper"),
        Operation::Update => Template::new(ZYPPER, "refresh"),
        Operation::Upgrade => Template::new(ZYPPER, "update"),
        Operation::Install => Template::new(ZYPPER, "install {..}"),
        Operation::Remove => Template::new(ZYPPER, "remove {..}"),
        Operation::Purge => Template::new(ZYPPER, "remove --clean-deps {..}"),
        Operation::Search => Template::new(ZYPPER, "search -s {}"),
        Operation::IsInstalled => Template::new("rpm", "-q {}"),
        Operation::ListAvailable => Template::new(ZYPPER, "packages"),
        Operation::ListInstalled => Template::new("rpm", r"-qa --qf '%{NAME}\n'"),
        Operation::AddRepository => Template::new(ZYPPER, "addrepo --refresh {}"),
        Operation::RemoveRepository => Template::new(ZYPPER, "removerepo {}"),
        Operation::ListRepositories => Template::new(ZYPPER, "repos"),
        Operation::Cleanup => Template::new(ZYPPER, "clean --all"),
        Operation::GetProxy => Template::new("cat", "{}"),
        Operation::InstalledChannel
        | Operation::ChangeChannel
        | Operation::AckAssertions
        | Operation::SetStoreProxy
        | Operation::UnsetStoreProxy => Template::Unsupported,
    }
}
