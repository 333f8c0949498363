//! Proxy settings and their per-variant persisted forms.
//!
//! Each codec knows three things about one way of storing proxy settings:
//!
//! - `contents`: the text form the settings take once applied
//! - `set_commands`: one command per configured field that applies it
//! - `decode`: reads query output back into [`ProxySettings`]
//!
//! For every codec `decode(contents(s)) == s`.

mod apt;
mod env_file;
mod snap;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::config::ManagerConfig;
use crate::template::CommandLine;
use crate::variant::Variant;

/// Proxy configuration. An empty field means "not configured".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    #[serde(default)]
    pub http: String,
    #[serde(default)]
    pub https: String,
    #[serde(default)]
    pub ftp: String,
    /// Comma separated list of hosts that bypass the proxy.
    #[serde(default)]
    pub no_proxy: String,
}

impl ProxySettings {
    pub fn is_empty(&self) -> bool {
        Scheme::ALL.iter().all(|s| self.get(*s).is_empty())
    }

    pub fn get(&self, scheme: Scheme) -> &str {
        match scheme {
            Scheme::Http => &self.http,
            Scheme::Https => &self.https,
            Scheme::Ftp => &self.ftp,
            Scheme::NoProxy => &self.no_proxy,
        }
    }

    pub fn set(&mut self, scheme: Scheme, value: impl Into<String>) {
        let value = value.into();
        match scheme {
            Scheme::Http => self.http = value,
            Scheme::Https => self.https = value,
            Scheme::Ftp => self.ftp = value,
            Scheme::NoProxy => self.no_proxy = value,
        }
    }

    /// Configured fields in canonical order.
    pub fn configured(&self) -> impl Iterator<Item = (Scheme, &str)> {
        Scheme::ALL
            .into_iter()
            .map(|s| (s, self.get(s)))
            .filter(|(_, v)| !v.is_empty())
    }

    /// Hosts listed in `no_proxy`, trimmed, without empty entries.
    pub fn no_proxy_hosts(&self) -> impl Iterator<Item = &str> {
        self.no_proxy
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }
}

/// One field of [`ProxySettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
    Ftp,
    NoProxy,
}

impl Scheme {
    pub const ALL: [Scheme; 4] = [Scheme::Http, Scheme::Https, Scheme::Ftp, Scheme::NoProxy];

    /// Scheme name used in proxy keys (`http`, `https`, `ftp`, `no`).
    pub fn key(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::Ftp => "ftp",
            Scheme::NoProxy => "no",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A line of query output that looked like a proxy entry but could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    pub line: String,
    pub reason: &'static str,
}

impl fmt::Display for MalformedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.reason, self.line)
    }
}

/// How a variant stores proxy settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyCodec {
    /// `Acquire::<scheme>::Proxy "<value>";` directives in an apt.conf.d file.
    AptDirectives { path: PathBuf },
    /// `<scheme>_proxy="<value>"` lines in an environment file.
    EnvironmentFile { path: PathBuf },
    /// `proxy.<scheme>` options of snapd's configuration.
    SnapConfig { scope: String },
}

impl ProxyCodec {
    pub fn for_variant(variant: Variant, config: &ManagerConfig) -> Self {
        match variant {
            Variant::Apt => ProxyCodec::AptDirectives {
                path: config.apt_proxy_file.clone(),
            },
            Variant::Yum | Variant::Zypper => ProxyCodec::EnvironmentFile {
                path: config.environment_file.clone(),
            },
            Variant::Snap => ProxyCodec::SnapConfig {
                scope: config.snap_scope.clone(),
            },
        }
    }

    /// Arguments for the variant's proxy query template.
    pub fn query_args(&self) -> Vec<String> {
        match self {
            ProxyCodec::AptDirectives { .. } => Vec::new(),
            ProxyCodec::EnvironmentFile { path } => vec![path.display().to_string()],
            ProxyCodec::SnapConfig { scope } => vec![scope.clone()],
        }
    }

    pub fn contents(&self, settings: &ProxySettings) -> String {
        let lines = match self {
            ProxyCodec::AptDirectives { .. } => apt::lines(settings),
            ProxyCodec::EnvironmentFile { .. } => env_file::lines(settings),
            ProxyCodec::SnapConfig { .. } => snap::lines(settings),
        };
        let mut text = lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }

    /// One command per configured field, to be run in order.
    pub fn set_commands(&self, settings: &ProxySettings) -> Vec<CommandLine> {
        match self {
            ProxyCodec::AptDirectives { path } => apt::set_commands(settings, path),
            ProxyCodec::EnvironmentFile { path } => env_file::set_commands(settings, path),
            ProxyCodec::SnapConfig { scope } => snap::set_commands(settings, scope),
        }
    }

    pub fn decode(&self, output: &str) -> Result<ProxySettings, MalformedLine> {
        match self {
            ProxyCodec::AptDirectives { .. } => apt::decode(output),
            ProxyCodec::EnvironmentFile { .. } => env_file::decode(output),
            ProxyCodec::SnapConfig { .. } => snap::decode(output),
        }
    }
}
