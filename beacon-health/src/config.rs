//! Health endpoint configuration

use std::time::Duration;

use serde::Deserialize;

use crate::{HealthError, duration};

/// Address the endpoint binds when none is configured
pub const DEFAULT_ADDRESS: &str = ":8080";

/// Configuration for the health endpoint
///
/// Both values are validated when the configuration is built, so a bad
/// address or duration is reported before anything is bound. When
/// deserialized, both fields are optional strings:
///
/// ```ron
/// (address: "127.0.0.1:8080", lameduck: "5s")
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawHealthConfig")]
pub struct HealthConfig {
    /// Address to bind, `host:port`
    ///
    /// Common values:
    /// - `:8080` (all IPv4 interfaces, port 8080)
    /// - `127.0.0.1:8080` (localhost only, port 8080)
    /// - `[::1]:0` (IPv6 localhost, ephemeral port)
    address: String,

    /// How long the endpoint keeps answering after shutdown is requested
    lameduck: Duration,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHealthConfig {
    #[serde(default = "default_address")]
    address: String,

    #[serde(default = "default_lameduck")]
    lameduck: String,
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_lameduck() -> String {
    "0".to_string()
}

impl TryFrom<RawHealthConfig> for HealthConfig {
    type Error = HealthError;

    fn try_from(raw: RawHealthConfig) -> Result<Self, Self::Error> {
        Self::parse(&raw.address, &raw.lameduck)
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            lameduck: Duration::ZERO,
        }
    }
}

impl HealthConfig {
    /// Create a configuration for `address` with no lameduck period
    ///
    /// # Errors
    ///
    /// Returns [`HealthError::InvalidAddress`] if `address` is not `host:port`.
    pub fn new(address: impl Into<String>) -> Result<Self, HealthError> {
        let address = address.into();
        split_host_port(&address).map_err(|reason| HealthError::InvalidAddress {
            address: address.clone(),
            reason,
        })?;

        Ok(Self {
            address,
            lameduck: Duration::ZERO,
        })
    }

    /// Build a configuration from the raw textual values
    ///
    /// # Errors
    ///
    /// Returns [`HealthError::InvalidAddress`] or
    /// [`HealthError::InvalidLameduck`], echoing the offending value.
    pub fn parse(address: &str, lameduck: &str) -> Result<Self, HealthError> {
        let lameduck =
            duration::parse(lameduck).map_err(|source| HealthError::InvalidLameduck {
                value: lameduck.to_string(),
                source,
            })?;

        Ok(Self::new(address)?.with_lameduck(lameduck))
    }

    #[must_use]
    pub const fn with_lameduck(mut self, lameduck: Duration) -> Self {
        self.lameduck = lameduck;
        self
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub const fn lameduck(&self) -> Duration {
        self.lameduck
    }

    /// The address handed to the listener
    ///
    /// An empty host (`:8080`) means every IPv4 interface.
    #[must_use]
    pub fn bind_address(&self) -> String {
        match split_host_port(&self.address) {
            Ok(("", port)) => format!("0.0.0.0:{port}"),
            _ => self.address.clone(),
        }
    }
}

/// Split `host:port`, `:port` or `[v6]:port` into its parts
fn split_host_port(address: &str) -> Result<(&str, u16), &'static str> {
    let colon = address.rfind(':').ok_or("missing port in address")?;

    // `open` and `close` mark where stray brackets start being an error
    let (host, open, close) = if let Some(bracketed) = address.strip_prefix('[') {
        let end = bracketed.find(']').ok_or("missing ']' in address")? + 1;
        match address.as_bytes().get(end + 1) {
            None => return Err("missing port in address"),
            Some(_) if end + 1 == colon => {}
            Some(b':') => return Err("too many colons in address"),
            Some(_) => return Err("missing port in address"),
        }
        (&address[1..end], 1, end + 1)
    } else {
        let host = &address[..colon];
        if host.contains(':') {
            return Err("too many colons in address");
        }
        (host, 0, 0)
    };

    if address[open..].contains('[') {
        return Err("unexpected '[' in address");
    }
    if address[close..].contains(']') {
        return Err("unexpected ']' in address");
    }

    let port = address[colon + 1..]
        .parse::<u16>()
        .map_err(|_| "invalid port")?;

    Ok((host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HealthConfig::default();
        assert_eq!(config.address(), ":8080");
        assert_eq!(config.lameduck(), Duration::ZERO);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_splits_supported_forms() {
        assert_eq!(split_host_port(":8080"), Ok(("", 8080)));
        assert_eq!(split_host_port("localhost:53"), Ok(("localhost", 53)));
        assert_eq!(split_host_port("127.0.0.1:0"), Ok(("127.0.0.1", 0)));
        assert_eq!(split_host_port("[::1]:9090"), Ok(("::1", 9090)));
        assert_eq!(split_host_port("[fe80::1%lo]:1"), Ok(("fe80::1%lo", 1)));
    }

    #[test]
    fn test_rejects_malformed_addresses() {
        assert_eq!(split_host_port("localhost"), Err("missing port in address"));
        assert_eq!(split_host_port("::1:80"), Err("too many colons in address"));
        assert_eq!(split_host_port("[::1]"), Err("missing port in address"));
        assert_eq!(split_host_port("[::1]80"), Err("missing port in address"));
        assert_eq!(split_host_port("[::1:80"), Err("missing ']' in address"));
        assert_eq!(split_host_port("[::1]:80:1"), Err("too many colons in address"));
        assert_eq!(split_host_port("a]:80"), Err("unexpected ']' in address"));
        assert_eq!(split_host_port("host:http"), Err("invalid port"));
        assert_eq!(split_host_port("host:70000"), Err("invalid port"));
    }

    #[test]
    fn test_explicit_hosts_bind_as_written() {
        let config = HealthConfig::new("[::1]:0").unwrap();
        assert_eq!(config.bind_address(), "[::1]:0");
    }

    #[test]
    fn test_parse_echoes_bad_lameduck() {
        let err = HealthConfig::parse(":8080", "five").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unable to parse lameduck duration value: 'five': invalid duration 'five'"
        );
    }

    #[test]
    fn test_parse_echoes_bad_address() {
        let err = HealthConfig::parse("nope", "0").unwrap_err();
        assert!(matches!(err, HealthError::InvalidAddress { ref address, .. } if address == "nope"));
        assert_eq!(
            err.to_string(),
            "invalid health address 'nope': missing port in address"
        );
    }

    #[test]
    fn test_deserializes_with_defaults() {
        let config: HealthConfig = ron::from_str(r#"(lameduck: "0")"#).unwrap();
        assert_eq!(config, HealthConfig::default());

        let config: HealthConfig =
            ron::from_str(r#"(address: "127.0.0.1:9000", lameduck: "250ms")"#).unwrap();
        assert_eq!(config.address(), "127.0.0.1:9000");
        assert_eq!(config.lameduck(), Duration::from_millis(250));
    }

    #[test]
    fn test_deserialize_surfaces_validation_errors() {
        let err = ron::from_str::<HealthConfig>(r#"(lameduck: "soon")"#).unwrap_err();
        assert!(err.to_string().contains("'soon'"));
    }
}
