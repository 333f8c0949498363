use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::{MalformedLine, ProxySettings, Scheme};
use crate::template::CommandLine;

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:export\s+)?(?P<scheme>https?|ftp|no)_proxy\s*=\s*(?P<value>.*?)\s*$")
        .expect("valid environment proxy regex")
});

// Rewrites an existing assignment in place, or appends one.
// $1 = variable, $2 = value, $3 = file
// awk reads the line from ENVIRON, since -v would expand backslash escapes.
const SET_SCRIPT: &str = r#"line="$1=\"$2\""
if grep -qs "^$1=" "$3"; then
  key="$1=" line="$line" awk 'index($0, ENVIRON["key"]) == 1 { print ENVIRON["line"]; next } { print }' "$3" > "$3.tmp" && cat "$3.tmp" > "$3" && rm -f "$3.tmp"
else
  printf '%s\n' "$line" >> "$3"
fi"#;

fn variable(scheme: Scheme) -> String {
    format!("{}_proxy", scheme.key())
}

pub(super) fn lines(settings: &ProxySettings) -> Vec<String> {
    settings
        .configured()
        .map(|(scheme, value)| format!("{}=\"{}\"", variable(scheme), value))
        .collect()
}

pub(super) fn set_commands(settings: &ProxySettings, path: &Path) -> Vec<CommandLine> {
    settings
        .configured()
        .map(|(scheme, value)| {
            CommandLine::new(
                "sh",
                [
                    "-c".to_string(),
                    SET_SCRIPT.to_string(),
                    "sh".to_string(),
                    variable(scheme),
                    value.to_string(),
                    path.display().to_string(),
                ],
            )
        })
        .collect()
}

fn unquote(value: &str) -> Option<&str> {
    for quote in ['"', '\''] {
        if let Some(rest) = value.strip_prefix(quote) {
            return rest.strip_suffix(quote);
        }
    }
    if value.ends_with(['"', '\'']) {
        return None;
    }
    Some(value)
}

pub(super) fn decode(output: &str) -> Result<ProxySettings, MalformedLine> {
    let mut settings = ProxySettings::default();

    for line in output.lines() {
        if line.trim_start().starts_with('#') {
            continue;
        }
        let Some(caps) = ASSIGNMENT.captures(line) else {
            continue;
        };
        let scheme = match caps["scheme"].to_lowercase().as_str() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            "ftp" => Scheme::Ftp,
            _ => Scheme::NoProxy,
        };
        let value = unquote(&caps["value"]).ok_or_else(|| MalformedLine {
            line: line.to_string(),
            reason: "unbalanced quotes in proxy assignment",
        })?;
        settings.set(scheme, value);
    }

    Ok(settings)
}
