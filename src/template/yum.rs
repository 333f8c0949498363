use super::Template;
use crate::variant::Operation;

const YUM: &str = "yum --assumeyes --debuglevel=1";
const YUM_CONFIG_MANAGER: &str = "yum-config-manager";

pub(super) fn template(operation: Operation) -> Template {
    match operation {
        Operation::InstallPrerequisite => Template::new(YUM, "install yum-utils"),
        Operation::Update => Template::new(YUM, "clean expire-cache"),
        Operation::Upgrade => Template::new(YUM, "update"),
        Operation::Install => Template::new(YUM, "install {..}"),
        Operation::Remove | Operation::Purge => Template::new(YUM, "remove {..}"),
        Operation::Search => Template::new(YUM, "list {}"),
        Operation::IsInstalled => Template::new("rpm", "-q {}"),
        Operation::ListAvailable => Template::new(YUM, "list available"),
        Operation::ListInstalled => Template::new("rpm", r"-qa --qf '%{NAME}\n'"),
        Operation::AddRepository => Template::new(YUM_CONFIG_MANAGER, "--add-repo {}"),
        Operation::RemoveRepository => Template::new(YUM_CONFIG_MANAGER, "--disable {}"),
        Operation::ListRepositories => Template::new(YUM, "repolist all"),
        Operation::Cleanup => Template::new(YUM, "clean all"),
        // The argument is the environment file holding the proxy variables.
        Operation::GetProxy => Template::new("cat", "{}"),
        Operation::InstalledChannel
        | Operation::ChangeChannel
        | Operation::AckAssertions
        | Operation::SetStoreProxy
        | Operation::UnsetStoreProxy => Template::Unsupported,
    }
}
