use super::Template;
use crate::variant::Operation;

// --force-confold keeps existing config files, --force-unsafe-io makes dpkg
// less sync-happy, --assume-yes never prompts.
const APT_GET: &str = "apt-get --option=Dpkg::Options::=--force-confold --option=Dpkg::Options::=--force-unsafe-io --assume-yes --quiet";
const APT_CACHE: &str = "apt-cache";
const ADD_APT_REPOSITORY: &str = "add-apt-repository --yes";

pub(super) fn template(operation: Operation) -> Template {
    match operation {
        Operation::InstallPrerequisite => Template::new(APT_GET, "install software-properties-common"),
        Operation::Update => Template::new(APT_GET, "update"),
        Operation::Upgrade => Template::new(APT_GET, "upgrade"),
        Operation::Install => Template::new(APT_GET, "install {..}"),
        Operation::Remove => Template::new(APT_GET, "remove {..}"),
        Operation::Purge => Template::new(APT_GET, "purge {..}"),
        Operation::Search => Template::new(APT_CACHE, "search --names-only ^{}$"),
        Operation::IsInstalled => Template::new("dpkg-query", "-s {}"),
        Operation::ListAvailable => Template::new(APT_CACHE, "pkgnames"),
        Operation::ListInstalled => Template::new("dpkg", "--get-selections"),
        Operation::AddRepository => Template::new(ADD_APT_REPOSITORY, "{}"),
        Operation::RemoveRepository => Template::new(ADD_APT_REPOSITORY, "--remove ppa:{}"),
        Operation::ListRepositories => Template::new(
            "sed",
            r#"-r -n "s|^deb(-src)? (.*)|\2|p" /etc/apt/sources.list"#,
        ),
        Operation::Cleanup => Template::new(APT_GET, "autoremove"),
        Operation::GetProxy => Template::new(
            "apt-config",
            "dump Acquire::http::Proxy Acquire::https::Proxy Acquire::ftp::Proxy",
        ),
        Operation::InstalledChannel
        | Operation::ChangeChannel
        | Operation::AckAssertions
        | Operation::SetStoreProxy
        | Operation::UnsetStoreProxy => Template::Unsupported,
    }
}
