//! Host configuration.
//!
//! [`HostOptions`] controls where the host listens and how it behaves under
//! load. Options come from a [`ConfigSource`] (the process environment in
//! production, a map in tests) or from a JSON document.

use std::collections::HashMap;
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment prefix read by [`HostOptions::from_env`].
pub const ENV_PREFIX: &str = "FERROUS_HOST";

/// What a request does when every dispatch permit is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverloadPolicy {
    /// Wait until a permit frees up (backpressure)
    #[default]
    Wait,
    /// Answer the request with `503 Service Unavailable` right away
    Reject,
}

impl std::str::FromStr for OverloadPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "wait" => Ok(OverloadPolicy::Wait),
            "reject" => Ok(OverloadPolicy::Reject),
            _ => Err(ConfigError::InvalidValue {
                key: "overload_policy".to_string(),
                value: value.to_string(),
                expected: "wait or reject",
            }),
        }
    }
}

/// Listener and concurrency settings for [`WebHost`](crate::WebHost).
///
/// Every field has a default, so a partial source or JSON document is fine.
///
/// # Examples
///
/// ```
/// use ferrous_host::{HostOptions, OverloadPolicy};
///
/// let options = HostOptions::from_json(r#"{ "port": 8080, "overload_policy": "reject" }"#).unwrap();
/// assert_eq!(options.port, 8080);
/// assert_eq!(options.overload_policy, OverloadPolicy::Reject);
/// assert_eq!(options.max_concurrent_requests, 1024);
/// assert_eq!(options.socket_addr().to_string(), "0.0.0.0:8080");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostOptions {
    /// Interface to bind; all interfaces by default
    pub bind_address: IpAddr,
    /// TCP port; 0 picks an ephemeral port
    pub port: u16,
    /// Upper bound on requests dispatched at once
    pub max_concurrent_requests: usize,
    pub overload_policy: OverloadPolicy,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 80,
            max_concurrent_requests: 1024,
            overload_policy: OverloadPolicy::Wait,
        }
    }
}

impl HostOptions {
    /// Loopback on an ephemeral port. Handy for tests.
    pub fn local() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max;
        self
    }

    pub fn with_overload_policy(mut self, policy: OverloadPolicy) -> Self {
        self.overload_policy = policy;
        self
    }

    /// Reads options from a source, keeping defaults for absent keys.
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self, ConfigError> {
        let mut options = Self::default();
        if let Some(value) = source.get("bind_address") {
            options.bind_address = parse("bind_address", &value, "an IP address")?;
        }
        if let Some(value) = source.get("port") {
            options.port = parse("port", &value, "a port number")?;
        }
        if let Some(value) = source.get("max_concurrent_requests") {
            options.max_concurrent_requests =
                parse("max_concurrent_requests", &value, "a positive integer")?;
        }
        if let Some(value) = source.get("overload_policy") {
            options.overload_policy = value.parse()?;
        }
        options.validate()?;
        Ok(options)
    }

    /// Reads `FERROUS_HOST_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&EnvironmentConfigSource::with_prefix(ENV_PREFIX))
    }

    /// Parses a JSON object; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_concurrent_requests".to_string(),
                value: "0".to_string(),
                expected: "a positive integer",
            });
        }
        Ok(())
    }
}

fn parse<T: std::str::FromStr>(
    key: &str,
    value: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    })
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    /// Get a raw configuration value by lowercase key
    fn get(&self, key: &str) -> Option<String>;

    /// List all available keys
    fn keys(&self) -> Vec<String>;
}

/// Environment variable configuration source
#[derive(Debug, Default)]
pub struct EnvironmentConfigSource {
    /// Prefix to filter environment variables
    prefix: Option<String>,
}

impl EnvironmentConfigSource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl ConfigSource for EnvironmentConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        let env_key = if let Some(prefix) = &self.prefix {
            format!("{}_{}", prefix.to_uppercase(), key.to_uppercase())
        } else {
            key.to_uppercase()
        };

        env::var(&env_key).ok()
    }

    fn keys(&self) -> Vec<String> {
        env::vars()
            .filter_map(|(key, _)| {
                if let Some(prefix) = &self.prefix {
                    let prefix_upper = format!("{}_", prefix.to_uppercase());
                    key.strip_prefix(&prefix_upper).map(str::to_lowercase)
                } else {
                    Some(key.to_lowercase())
                }
            })
            .collect()
    }
}

/// In-memory configuration source
#[derive(Debug, Default, Clone)]
pub struct MapConfigSource {
    values: HashMap<String, String>,
}

impl MapConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into().to_lowercase(), value.into());
        self
    }
}

impl ConfigSource for MapConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(&key.to_lowercase()).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}
