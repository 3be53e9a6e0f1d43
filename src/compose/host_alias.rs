// ABOUTME: Host alias substituted for container addresses the orchestrating host cannot reach.
// ABOUTME: Parsed from config strings: "auto", "never", or a literal host name.

use serde::{Deserialize, Deserializer, de};
use std::fmt;
use std::str::FromStr;

/// Loopback alias Docker Desktop for Mac resolves to the host.
pub const MAC_HOST_ALIAS: &str = "docker.for.mac.localhost";

/// When gateway wiring uses a host alias instead of a container IP.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HostAliasPolicy {
    /// Use [`MAC_HOST_ALIAS`] when this process runs on macOS.
    #[default]
    Auto,
    /// Always use the given host name.
    Always(String),
    /// Always use the container IP.
    Never,
}

impl HostAliasPolicy {
    /// The alias to use on this host, if any.
    pub fn resolve(&self) -> Option<String> {
        self.resolve_for_os(std::env::consts::OS)
    }

    /// The alias to use on a host running `os`, named as in
    /// `std::env::consts::OS`.
    pub fn resolve_for_os(&self, os: &str) -> Option<String> {
        match self {
            HostAliasPolicy::Auto => (os == "macos").then(|| MAC_HOST_ALIAS.to_string()),
            HostAliasPolicy::Always(host) => Some(host.clone()),
            HostAliasPolicy::Never => None,
        }
    }
}

impl FromStr for HostAliasPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("host alias cannot be empty".to_string()),
            "auto" => Ok(HostAliasPolicy::Auto),
            "never" => Ok(HostAliasPolicy::Never),
            host if host.contains(char::is_whitespace) => {
                Err(format!("invalid host alias: {}", host))
            }
            host => Ok(HostAliasPolicy::Always(host.to_string())),
        }
    }
}

impl fmt::Display for HostAliasPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostAliasPolicy::Auto => write!(f, "auto"),
            HostAliasPolicy::Always(host) => write!(f, "{}", host),
            HostAliasPolicy::Never => write!(f, "never"),
        }
    }
}

impl<'de> Deserialize<'de> for HostAliasPolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
