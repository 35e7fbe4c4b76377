//! Backend settings in the `key = value` shape operators already use.
//!
//! | key                | example                                   |
//! |--------------------|-------------------------------------------|
//! | `enable_sentinel`  | `true`                                    |
//! | `sentinel_hosts`   | `10.0.0.1:26379,10.0.0.2:26379`           |
//! | `sentinel_names`   | `tasks,logs`                              |
//! | `sentinel_db`      | `0`                                       |
//! | `sentinel_timeout` | `0.1`                                     |
//! | `servers`          | `main:10.0.0.5:6379:0:Main,backup:10.0.0.6:6379:0` |
//! | `redis_url`        | `redis://localhost:6379/0`                |
//!
//! From the environment the same keys are read upper-cased with a `QUAY_`
//! prefix, e.g. `QUAY_SENTINEL_HOSTS`.

use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;

use crate::{DEFAULT_SYSTEM, Forum, QuayError, Result, get_redis_url};

const ENV_PREFIX: &str = "QUAY_";

/// Seconds a sentinel discovery may take unless configured otherwise
pub const DEFAULT_SENTINEL_TIMEOUT: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub enable_sentinel: bool,
    pub sentinel_hosts: Vec<(String, u16)>,
    pub sentinel_names: Vec<String>,
    pub sentinel_db: i64,
    pub sentinel_timeout: f64,
    pub servers: Vec<ServerEntry>,
    pub redis_url: Option<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            enable_sentinel: false,
            sentinel_hosts: Vec::new(),
            sentinel_names: Vec::new(),
            sentinel_db: 0,
            sentinel_timeout: DEFAULT_SENTINEL_TIMEOUT,
            servers: Vec::new(),
            redis_url: None,
        }
    }
}

/// One direct backend from a `name:host:port:db[:title]` entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerEntry {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub title: String,
}

impl ServerEntry {
    pub fn parse(entry: &str) -> Result<Self> {
        let parts: Vec<&str> = entry.trim().split(':').collect();
        if !(4..=5).contains(&parts.len()) {
            return Err(QuayError::Configuration(format!(
                "server entry must be name:host:port:db[:title], got {:?}",
                entry
            )));
        }
        let name = parts[0].to_string();
        Ok(Self {
            host: parts[1].to_string(),
            port: parse_number(parts[2], "server port")?,
            db: parse_number(parts[3], "server db")?,
            title: parts.get(4).map(|t| t.to_string()).unwrap_or_else(|| name.clone()),
            name,
        })
    }
}

impl BackendSettings {
    /// Read settings from `QUAY_*` environment variables.
    ///
    /// Without any server or sentinel keys the default system points at
    /// `QUAY_REDIS_URL`, then `REDIS_URL`, then a localhost fallback.
    pub fn from_env() -> Result<Self> {
        let map: HashMap<String, String> = std::env::vars()
            .filter_map(|(key, value)| {
                key.strip_prefix(ENV_PREFIX)
                    .map(|stripped| (stripped.to_lowercase(), value))
            })
            .collect();
        let mut settings = Self::from_map(&map)?;
        if settings.redis_url.is_none() {
            settings.redis_url = Some(get_redis_url());
        }
        Ok(settings)
    }

    /// Parse settings from lower-case keys; unknown keys are ignored
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(flag) = map.get("enable_sentinel") {
            settings.enable_sentinel = match flag.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" | "" => false,
                other => {
                    return Err(QuayError::Configuration(format!(
                        "enable_sentinel must be true or false, got {:?}",
                        other
                    )));
                }
            };
        }
        if let Some(hosts) = map.get("sentinel_hosts") {
            settings.sentinel_hosts = split_list(hosts)
                .map(parse_host_port)
                .collect::<Result<_>>()?;
        }
        if let Some(names) = map.get("sentinel_names") {
            settings.sentinel_names = split_list(names).map(str::to_string).collect();
        }
        if let Some(db) = map.get("sentinel_db") {
            settings.sentinel_db = parse_number(db, "sentinel_db")?;
        }
        if let Some(timeout) = map.get("sentinel_timeout") {
            settings.sentinel_timeout = parse_number(timeout, "sentinel_timeout")?;
        }
        if let Some(servers) = map.get("servers") {
            settings.servers = split_list(servers)
                .map(ServerEntry::parse)
                .collect::<Result<_>>()?;
        }
        if let Some(url) = map.get("redis_url").filter(|u| !u.trim().is_empty()) {
            settings.redis_url = Some(url.trim().to_string());
        }

        Ok(settings)
    }

    /// Register the configured backend(s) with a forum.
    ///
    /// Sentinel settings and the first server entry become the
    /// [`DEFAULT_SYSTEM`]; every server entry is also registered under its
    /// own name.
    pub fn apply(&self, forum: &Forum) -> Result<()> {
        if self.enable_sentinel {
            forum.configure_sentinel(
                DEFAULT_SYSTEM,
                self.sentinel_hosts.clone(),
                self.sentinel_names.clone(),
                self.sentinel_db,
                self.sentinel_timeout,
            )?;
            info!(services = ?self.sentinel_names, "Sentinel backend configured");
            return Ok(());
        }

        if let Some(first) = self.servers.first() {
            forum.configure_direct(DEFAULT_SYSTEM, &first.host, first.port, first.db)?;
            for server in &self.servers {
                forum.configure_direct(&server.name, &server.host, server.port, server.db)?;
            }
            info!(current = %first.name, servers = self.servers.len(), "Direct backends configured");
            return Ok(());
        }

        match &self.redis_url {
            Some(url) => forum.configure_url(DEFAULT_SYSTEM, url),
            None => Err(QuayError::Configuration(
                "no servers, sentinel or redis_url configured".to_string(),
            )),
        }
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_host_port(entry: &str) -> Result<(String, u16)> {
    let (host, port) = entry.rsplit_once(':').ok_or_else(|| {
        QuayError::Configuration(format!("sentinel host must be host:port, got {:?}", entry))
    })?;
    Ok((host.to_string(), parse_number(port, "sentinel port")?))
}

fn parse_number<T: std::str::FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| QuayError::Configuration(format!("{} is not a number: {:?}", what, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mode;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_sentinel_settings() {
        let settings = BackendSettings::from_map(&map(&[
            ("enable_sentinel", "True"),
            ("sentinel_hosts", "10.0.0.1:26379, 10.0.0.2:26380"),
            ("sentinel_names", "tasks,logs"),
            ("sentinel_db", "3"),
        ]))
        .unwrap();

        assert!(settings.enable_sentinel);
        assert_eq!(
            settings.sentinel_hosts,
            vec![
                ("10.0.0.1".to_string(), 26379),
                ("10.0.0.2".to_string(), 26380)
            ]
        );
        assert_eq!(settings.sentinel_names, vec!["tasks", "logs"]);
        assert_eq!(settings.sentinel_db, 3);
        assert_eq!(settings.sentinel_timeout, DEFAULT_SENTINEL_TIMEOUT);
    }

    #[test]
    fn parses_server_entries_with_optional_title() {
        let settings = BackendSettings::from_map(&map(&[(
            "servers",
            "main:10.0.0.5:6379:0:Main Box,backup:10.0.0.6:6380:1",
        )]))
        .unwrap();

        assert_eq!(settings.servers.len(), 2);
        assert_eq!(settings.servers[0].title, "Main Box");
        assert_eq!(settings.servers[1].name, "backup");
        assert_eq!(settings.servers[1].title, "backup");
        assert_eq!(settings.servers[1].port, 6380);
        assert_eq!(settings.servers[1].db, 1);
    }

    #[test]
    fn rejects_malformed_entries() {
        for pairs in [
            [("servers", "main:10.0.0.5:6379")],
            [("servers", "main:10.0.0.5:port:0")],
            [("sentinel_hosts", "10.0.0.1")],
            [("sentinel_db", "zero")],
            [("enable_sentinel", "maybe")],
        ] {
            assert!(matches!(
                BackendSettings::from_map(&map(&pairs)),
                Err(QuayError::Configuration(_))
            ));
        }
    }

    #[tokio::test]
    async fn applies_servers_as_direct_systems() {
        let settings = BackendSettings::from_map(&map(&[(
            "servers",
            "main:localhost:6379:0,backup:localhost:6379:1",
        )]))
        .unwrap();
        let forum = Forum::new();
        settings.apply(&forum).unwrap();

        assert_eq!(forum.mode(), Mode::Direct);
        assert_eq!(forum.systems(), vec!["backup", "default", "main"]);
    }

    #[tokio::test]
    async fn applies_sentinel_as_default_system() {
        let settings = BackendSettings::from_map(&map(&[
            ("enable_sentinel", "true"),
            ("sentinel_hosts", "localhost:26379"),
            ("sentinel_names", "tasks"),
        ]))
        .unwrap();
        let forum = Forum::new();
        settings.apply(&forum).unwrap();

        assert_eq!(forum.mode(), Mode::Sentinel);
        assert_eq!(forum.pick_service(DEFAULT_SYSTEM).unwrap().as_deref(), Some("tasks"));
    }

    #[test]
    fn negative_sentinel_db_is_rejected_on_apply() {
        let settings = BackendSettings::from_map(&map(&[
            ("enable_sentinel", "true"),
            ("sentinel_hosts", "localhost:26379"),
            ("sentinel_names", "tasks"),
            ("sentinel_db", "-1"),
        ]))
        .unwrap();
        let forum = Forum::new();
        assert!(matches!(
            settings.apply(&forum),
            Err(QuayError::Configuration(_))
        ));
        assert!(forum.systems().is_empty());
    }

    #[test]
    fn empty_settings_cannot_be_applied() {
        let forum = Forum::new();
        assert!(matches!(
            BackendSettings::default().apply(&forum),
            Err(QuayError::Configuration(_))
        ));
    }

    #[test]
    fn deserializes_from_structured_config() {
        let settings: BackendSettings = serde_json::from_str(
            r#"{"servers":[{"name":"main","host":"localhost","port":6379,"db":0,"title":"Main"}]}"#,
        )
        .unwrap();
        assert_eq!(settings.servers[0].name, "main");
        assert!(!settings.enable_sentinel);
        assert_eq!(settings.sentinel_timeout, DEFAULT_SENTINEL_TIMEOUT);
    }
}
