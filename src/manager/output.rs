//! Recognizers for package manager output.
//!
//! Markers are matched against the combined output of a command run with
//! `LC_ALL=C`.

use regex::Regex;
use std::sync::LazyLock;

use crate::variant::Variant;

/// Reason attached to fatal failures caused by an unknown package.
pub(super) const NOT_FOUND_REASON: &str = "package not found";

/// Reason attached to failed searches that reported no match.
pub(super) const NO_RESULTS_REASON: &str = "no matching packages";

static NOT_FOUND: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"Unable to locate package (\S+)",
        r"No package (\S+) available",
        r"Unable to find a match:? (\S+)",
        r"'([^']+)' not found in package names",
        r"No provider of '([^']+)' found",
        r#"snap "([^"]+)" not found"#,
        r#"snap "([^"]+)" is not installed"#,
        r#"no snap found for "([^"]+)""#,
        r"Package (\S+) is not installed",
        r"not found",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid not-found pattern"))
    .collect()
});

static NO_RESULTS: &[&str] = &[
    "No matching Packages",
    "No matching items found",
    "No matching snaps",
    "no snap found",
];

static NOT_INSTALLED: &[&str] = &[
    "is not installed",
    "no matching snaps installed",
    "deinstall ok",
    "No matching Packages",
];

static SNAP_MISSING_OPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"snap "[^"]+" has no "[^"]+" configuration option"#)
        .expect("valid snap option pattern")
});

const MISSING_FILE: &str = "No such file or directory";

/// Whether `output` reports an unknown package. Returns the package name when
/// the output names it, otherwise an empty string.
pub(super) fn not_found(output: &str) -> Option<String> {
    NOT_FOUND.iter().find_map(|re| {
        re.captures(output).map(|caps| {
            caps.get(1)
                .map(|m| m.as_str().trim_end_matches(['.', ',']).to_string())
                .unwrap_or_default()
        })
    })
}

pub(super) fn no_results(output: &str) -> bool {
    NO_RESULTS.iter().any(|marker| output.contains(marker))
}

pub(super) fn not_installed(output: &str) -> bool {
    NOT_INSTALLED.iter().any(|marker| output.contains(marker))
}

/// Whether a failed proxy query means that nothing is configured yet.
pub(super) fn proxy_unset(output: &str) -> bool {
    SNAP_MISSING_OPTION.is_match(output) || output.contains(MISSING_FILE)
}

/// Channel from the `tracking:` line of `snap info`.
pub(super) fn tracking_channel(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let channel = line.trim_start().strip_prefix("tracking:")?.trim();
        (!channel.is_empty()).then(|| channel.to_string())
    })
}

/// Whether a successful search printed any result.
pub(super) fn has_results(output: &str) -> bool {
    !no_results(output) && output.lines().any(|l| !l.trim().is_empty())
}

pub(super) fn installed_packages(variant: Variant, output: &str) -> Vec<String> {
    match variant {
        Variant::Apt => dpkg_selections(output),
        Variant::Yum | Variant::Zypper => names_per_line(output),
        Variant::Snap => snap_list(output),
    }
}

pub(super) fn available_packages(variant: Variant, output: &str) -> Vec<String> {
    match variant {
        Variant::Apt => names_per_line(output),
        Variant::Yum => yum_section(output, "Available Packages"),
        Variant::Zypper => dedup(table_column(output, "Name")),
        Variant::Snap => Vec::new(),
    }
}

pub(super) fn repositories(variant: Variant, output: &str) -> Vec<String> {
    match variant {
        Variant::Apt | Variant::Snap => names_per_line(output),
        Variant::Yum => yum_repolist(output),
        Variant::Zypper => table_column(output, "Alias"),
    }
}

/// `dpkg --get-selections`: `name[:arch]<tabs>state`, only `install` kept.
fn dpkg_selections(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let state = fields.next()?;
            (state == "install").then(|| strip_arch(name).to_string())
        })
        .collect()
}

fn strip_arch(name: &str) -> &str {
    name.split_once(':').map_or(name, |(n, _)| n)
}

fn names_per_line(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// `snap list`: a `Name Version Rev ...` table.
fn snap_list(output: &str) -> Vec<String> {
    output
        .lines()
        .skip_while(|l| !l.starts_with("Name"))
        .skip(1)
        .filter_map(|l| l.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Package names listed under a `yum list` section header. Entries are
/// `name.arch version repo`; wrapped continuation lines start with spaces.
fn yum_section(output: &str, header: &str) -> Vec<String> {
    output
        .lines()
        .skip_while(|l| l.trim() != header)
        .skip(1)
        .take_while(|l| !l.ends_with("Packages"))
        .filter(|l| !l.starts_with(char::is_whitespace))
        .filter_map(|l| l.split_whitespace().next())
        .map(|entry| entry.rsplit_once('.').map_or(entry, |(n, _)| n).to_string())
        .collect()
}

/// `yum repolist all`: repository ids below the `repo id` header.
fn yum_repolist(output: &str) -> Vec<String> {
    output
        .lines()
        .skip_while(|l| !l.starts_with("repo id"))
        .skip(1)
        .filter(|l| !l.starts_with("repolist:"))
        .filter_map(|l| l.split_whitespace().next())
        .map(|id| id.trim_start_matches(['!', '*']).to_string())
        .collect()
}

/// Values of one column of a zypper `|` separated table.
fn table_column(output: &str, column: &str) -> Vec<String> {
    let mut rows = output.lines().filter(|l| l.contains('|'));
    let Some(index) = rows
        .next()
        .and_then(|header| header.split('|').position(|c| c.trim() == column))
    else {
        return Vec::new();
    };

    rows.filter_map(|row| row.split('|').nth(index))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_extracts_name() {
        assert_eq!(
            not_found("error: snap \"foo\" not found").as_deref(),
            Some("foo")
        );
        assert_eq!(
            not_found("E: Unable to locate package nosuch").as_deref(),
            Some("nosuch")
        );
        assert_eq!(
            not_found("No package ghost available.\nError: Nothing to do").as_deref(),
            Some("ghost")
        );
        assert_eq!(
            not_found("Package 'x' not found in package names. Trying capabilities.").as_deref(),
            Some("x")
        );
        assert_eq!(not_found("error: not found").as_deref(), Some(""));
        assert_eq!(not_found("E: Could not get lock"), None);
    }

    #[test]
    fn test_search_markers() {
        assert!(no_results("Error: No matching Packages to list"));
        assert!(no_results("No matching snaps for \"foo\""));
        assert!(!has_results(""));
        assert!(!has_results("\n\n"));
        assert!(has_results("vim - Vi IMproved\n"));
    }

    #[test]
    fn test_not_installed_markers() {
        assert!(not_installed("package foo is not installed"));
        assert!(not_installed("Status: deinstall ok config-files"));
        assert!(!not_installed("Status: install ok installed"));
    }

    #[test]
    fn test_proxy_unset() {
        assert!(proxy_unset(
            "error: snap \"system\" has no \"proxy\" configuration option"
        ));
        assert!(proxy_unset("cat: /etc/environment: No such file or directory"));
        assert!(!proxy_unset("error: access denied"));
    }

    #[test]
    fn test_tracking_channel() {
        let info = "name:      lxd\nsummary:   System container manager\ntracking:  latest/stable\ninstalled: 5.0 (1234) 80MB -\n";
        assert_eq!(tracking_channel(info).as_deref(), Some("latest/stable"));
        assert_eq!(tracking_channel("name: lxd\n"), None);
    }

    #[test]
    fn test_dpkg_selections() {
        let output = "adduser\t\t\t\t\tinstall\nlibc6:amd64\t\t\t\tinstall\nold-pkg\t\t\t\t\tdeinstall\n";
        assert_eq!(
            installed_packages(Variant::Apt, output),
            vec!["adduser", "libc6"]
        );
    }

    #[test]
    fn test_rpm_names() {
        let output = "bash\ncoreutils\n\n";
        assert_eq!(installed_packages(Variant::Yum, output), vec!["bash", "coreutils"]);
    }

    #[test]
    fn test_snap_list() {
        let output = "Name    Version   Rev    Tracking       Publisher   Notes\ncore20  20230801  2015   latest/stable  canonical✓  base\nlxd     5.0.2     24322  5.0/stable     canonical✓  -\n";
        assert_eq!(installed_packages(Variant::Snap, output), vec!["core20", "lxd"]);
        assert!(installed_packages(Variant::Snap, "No snaps are installed yet.").is_empty());
    }

    #[test]
    fn test_yum_available_section() {
        let output = "Loaded plugins: fastestmirror\nAvailable Packages\nGConf2.x86_64   3.2.6-8.el7   base\nbash-completion.noarch\n                1:2.1-8.el7   base\n";
        assert_eq!(
            available_packages(Variant::Yum, output),
            vec!["GConf2", "bash-completion"]
        );
    }

    #[test]
    fn test_zypper_packages_table() {
        let output = "S | Repository | Name | Version | Arch\n--+------------+------+---------+-------\n  | repo-oss   | curl | 8.0     | x86_64\n  | repo-oss   | curl | 8.0     | i586\nv | repo-oss   | vim  | 9.0     | x86_64\n";
        assert_eq!(available_packages(Variant::Zypper, output), vec!["curl", "vim"]);
    }

    #[test]
    fn test_repositories() {
        let yum = "Loaded plugins: fastestmirror\nrepo id          repo name        status\nbase/7/x86_64    CentOS-7 - Base  enabled: 10,072\n!epel            EPEL             disabled\nrepolist: 10,072\n";
        assert_eq!(repositories(Variant::Yum, yum), vec!["base/7/x86_64", "epel"]);

        let zypper = "# | Alias    | Name     | Enabled | GPG Check | Refresh\n--+----------+----------+---------+-----------+--------\n1 | repo-oss | Main OSS | Yes     | (r ) Yes  | Yes\n";
        assert_eq!(repositories(Variant::Zypper, zypper), vec!["repo-oss"]);

        let apt = "http://archive.ubuntu.com/ubuntu focal main\n";
        assert_eq!(
            repositories(Variant::Apt, apt),
            vec!["http://archive.ubuntu.com/ubuntu focal main"]
        );
    }
}
