use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::{MalformedLine, ProxySettings, Scheme};
use crate::template::CommandLine;

// Acquire::http::Proxy "http://10.0.3.1:3142";
// Acquire::http::Proxy::"localhost" "DIRECT";   (apt-config dump drops the host quotes)
static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^Acquire::(?P<scheme>[A-Za-z]+)::Proxy(?:::"?(?P<host>[^"\s]+)"?)?\s+"(?P<value>[^"]*)";\s*$"#,
    )
    .expect("valid apt proxy directive regex")
});

// Anything shaped like a proxy directive must parse as one.
static CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Acquire::[A-Za-z]+::Proxy(?:\s|::)").expect("valid apt proxy candidate regex")
});

const DIRECT: &str = "DIRECT";

/// Schemes that get a DIRECT override for every no-proxy host.
const NO_PROXY_SCHEMES: [Scheme; 2] = [Scheme::Http, Scheme::Https];

fn directive(scheme: Scheme, value: &str) -> String {
    format!("Acquire::{}::Proxy \"{}\";", scheme.key(), value)
}

fn direct_directive(scheme: Scheme, host: &str) -> String {
    format!("Acquire::{}::Proxy::\"{}\" \"{}\";", scheme.key(), host, DIRECT)
}

fn field_lines(settings: &ProxySettings, scheme: Scheme) -> Vec<String> {
    match scheme {
        Scheme::NoProxy => settings
            .no_proxy_hosts()
            .flat_map(|host| NO_PROXY_SCHEMES.iter().map(move |s| direct_directive(*s, host)))
            .collect(),
        _ => vec![directive(scheme, settings.get(scheme))],
    }
}

pub(super) fn lines(settings: &ProxySettings) -> Vec<String> {
    settings
        .configured()
        .flat_map(|(scheme, _)| field_lines(settings, scheme))
        .collect()
}

pub(super) fn set_commands(settings: &ProxySettings, path: &Path) -> Vec<CommandLine> {
    settings
        .configured()
        .map(|(scheme, _)| {
            let mut args = vec![
                "-c".to_string(),
                r#"file="$1"; shift; printf '%s\n' "$@" >> "$file""#.to_string(),
                "sh".to_string(),
                path.display().to_string(),
            ];
            args.extend(field_lines(settings, scheme));
            CommandLine::new("sh", args)
        })
        .collect()
}

pub(super) fn decode(output: &str) -> Result<ProxySettings, MalformedLine> {
    let mut settings = ProxySettings::default();
    let mut no_proxy: Vec<String> = Vec::new();

    for line in output.lines().map(str::trim) {
        if !CANDIDATE.is_match(line) {
            continue;
        }
        let Some(caps) = DIRECTIVE.captures(line) else {
            return Err(MalformedLine {
                line: line.to_string(),
                reason: "unparseable apt proxy directive",
            });
        };
        let scheme = match caps["scheme"].to_lowercase().as_str() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            "ftp" => Scheme::Ftp,
            _ => continue,
        };
        let value = &caps["value"];
        match caps.name("host") {
            Some(host) if value == DIRECT => {
                let host = host.as_str().to_string();
                if !no_proxy.contains(&host) {
                    no_proxy.push(host);
                }
            }
            // Per-host proxies have no equivalent in ProxySettings.
            Some(_) => {}
            None => settings.set(scheme, value),
        }
    }

    settings.no_proxy = no_proxy.join(",");
    Ok(settings)
}
