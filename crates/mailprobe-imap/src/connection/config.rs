//! Connection configuration types.

use std::time::Duration;

use crate::command::is_tag_char;
use crate::{Error, Result};

/// Default IMAP endpoint (Microsoft 365).
pub const DEFAULT_HOST: &str = "outlook.office365.com";

/// Default port for implicit TLS.
pub const DEFAULT_PORT: u16 = 993;

/// IMAP connection configuration.
///
/// The connection is always implicit TLS: the handshake happens before any
/// protocol text is exchanged.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server hostname, also used to verify the server certificate.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Deadline for TCP connect plus TLS handshake.
    pub connect_timeout: Duration,
    /// Deadline for each read or write.
    pub io_timeout: Duration,
    tag_prefix: char,
}

impl Config {
    /// Creates a new configuration on port 993.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        ConfigBuilder::new(host).assemble()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }

    /// Prefix for generated command tags.
    #[must_use]
    pub const fn tag_prefix(&self) -> char {
        self.tag_prefix
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_HOST)
    }
}

/// Builder for connection configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: u16,
    connect_timeout: Duration,
    io_timeout: Duration,
    tag_prefix: char,
}

impl ConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(30),
            io_timeout: Duration::from_secs(60),
            tag_prefix: 'A',
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the I/O timeout.
    #[must_use]
    pub const fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Sets the tag prefix. Checked by [`ConfigBuilder::build`].
    #[must_use]
    pub const fn tag_prefix(mut self, prefix: char) -> Self {
        self.tag_prefix = prefix;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if the tag prefix is not an IMAP tag
    /// character (`+`, `*`, space, controls and atom specials are not).
    pub fn build(self) -> Result<Config> {
        if !is_tag_char(self.tag_prefix) {
            return Err(Error::InvalidConfig(format!(
                "tag prefix {:?} cannot start an IMAP tag",
                self.tag_prefix
            )));
        }
        Ok(self.assemble())
    }

    fn assemble(self) -> Config {
        Config {
            host: self.host,
            port: self.port,
            connect_timeout: self.connect_timeout,
            io_timeout: self.io_timeout,
            tag_prefix: self.tag_prefix,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = Config::new("imap.example.com");
        assert_eq!(config.host, "imap.example.com");
        assert_eq!(config.port, 993);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.io_timeout, Duration::from_secs(60));
        assert_eq!(config.tag_prefix, 'A');
    }

    #[test]
    fn test_config_default_host() {
        let config = Config::default();
        assert_eq!(config.host, "outlook.office365.com");
        assert_eq!(config.port, 993);
    }

    #[test]
    fn test_config_builder() {
        let config = Config::builder("imap.example.com")
            .port(1993)
            .connect_timeout(Duration::from_secs(10))
            .io_timeout(Duration::from_secs(5))
            .tag_prefix('T')
            .build()
            .unwrap();

        assert_eq!(config.host, "imap.example.com");
        assert_eq!(config.port, 1993);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.io_timeout, Duration::from_secs(5));
        assert_eq!(config.tag_prefix, 'T');
    }

    #[test]
    fn test_config_rejects_bad_tag_prefix() {
        for prefix in ['+', '*', ' ', '\x07', '(', '{', '%', '"', '\\', 'é'] {
            let err = Config::builder("imap.example.com")
                .tag_prefix(prefix)
                .build()
                .unwrap_err();
            assert!(matches!(err, Error::InvalidConfig(_)), "{prefix:?} accepted");
        }
    }

    #[test]
    fn test_config_accepts_atom_tag_prefix() {
        for prefix in ['A', 'z', '7', '$', '.', ']'] {
            let config = Config::builder("imap.example.com")
                .tag_prefix(prefix)
                .build()
                .unwrap();
            assert_eq!(config.tag_prefix(), prefix);
        }
    }
}
