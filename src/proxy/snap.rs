use super::{MalformedLine, ProxySettings, Scheme};
use crate::template::CommandLine;

fn option(scheme: Scheme) -> &'static str {
    match scheme {
        Scheme::Http => "proxy.http",
        Scheme::Https => "proxy.https",
        Scheme::Ftp => "proxy.ftp",
        Scheme::NoProxy => "proxy.no-proxy",
    }
}

pub(super) fn lines(settings: &ProxySettings) -> Vec<String> {
    settings
        .configured()
        .map(|(scheme, value)| format!("{} {}", option(scheme), value))
        .collect()
}

pub(super) fn set_commands(settings: &ProxySettings, scope: &str) -> Vec<CommandLine> {
    settings
        .configured()
        .map(|(scheme, value)| {
            CommandLine::new(
                "snap",
                [
                    "set".to_string(),
                    scope.to_string(),
                    format!("{}={}", option(scheme), value),
                ],
            )
        })
        .collect()
}

/// Parses `snap get <scope> proxy` output:
///
/// ```text
/// Key          Value
/// proxy.http   localhost:8080
/// proxy.https  localhost:8181
/// ```
pub(super) fn decode(output: &str) -> Result<ProxySettings, MalformedLine> {
    let mut settings = ProxySettings::default();

    for line in output.lines().map(str::trim) {
        let mut parts = line.splitn(2, char::is_whitespace);
        let key = parts.next().unwrap_or_default();
        let Some(scheme) = Scheme::ALL.into_iter().find(|s| option(*s) == key) else {
            continue;
        };
        let value = parts.next().unwrap_or_default().trim();
        settings.set(scheme, value);
    }

    Ok(settings)
}
