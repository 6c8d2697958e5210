//! Link configuration.

use std::time::Duration;

use crate::core::{
    ENV_CHUNK_SIZE, ENV_MAX_RETRANSMITS, ENV_MAX_RTO_MS, ENV_RTO_MS, INITIAL_RTO, LinkError,
    LinkResult, MAX_FRAME_PAYLOAD, MAX_RETRANSMITS, MAX_RTO, RETRANSMIT_BACKOFF,
};

/// Tunables of the stop-and-wait sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Time to wait for a control frame before retransmitting.
    ///
    /// `None` waits forever.
    pub retransmit_timeout: Option<Duration>,

    /// Upper bound of the timeout after exponential backoff.
    pub max_retransmit_timeout: Duration,

    /// Factor applied to the timeout after each expiry.
    pub backoff_multiplier: u32,

    /// Retransmissions allowed per chunk before `send` fails.
    ///
    /// `None` retries forever.
    pub max_retransmits: Option<u32>,

    /// Payload bytes per data frame.
    pub chunk_size: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            retransmit_timeout: Some(INITIAL_RTO),
            max_retransmit_timeout: MAX_RTO,
            backoff_multiplier: RETRANSMIT_BACKOFF,
            max_retransmits: Some(MAX_RETRANSMITS),
            chunk_size: MAX_FRAME_PAYLOAD,
        }
    }
}

impl LinkConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> LinkConfigBuilder {
        LinkConfigBuilder::new()
    }

    /// Configuration that blocks until acknowledged, with no timer and no
    /// retry limit.
    pub fn unbounded() -> Self {
        Self {
            retransmit_timeout: None,
            max_retransmits: None,
            ..Self::default()
        }
    }

    /// Check the configuration for values the link cannot run with.
    pub fn validate(&self) -> LinkResult<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_FRAME_PAYLOAD {
            return Err(LinkError::Config(format!(
                "chunk size must be between 1 and {MAX_FRAME_PAYLOAD}, got {}",
                self.chunk_size
            )));
        }
        if self.backoff_multiplier == 0 {
            return Err(LinkError::Config("backoff multiplier must be non-zero".into()));
        }
        if let Some(rto) = self.retransmit_timeout {
            if rto.is_zero() {
                return Err(LinkError::Config(
                    "retransmit timeout must be non-zero".into(),
                ));
            }
            if rto > self.max_retransmit_timeout {
                return Err(LinkError::Config(format!(
                    "retransmit timeout {rto:?} exceeds maximum {:?}",
                    self.max_retransmit_timeout
                )));
            }
        }
        Ok(())
    }

    /// Defaults overlaid with `FRAMELINK_*` environment variables.
    ///
    /// `FRAMELINK_MAX_RETRANSMITS=0` means unlimited. The result is
    /// validated.
    pub fn from_env() -> LinkResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with values from `lookup`, keyed by environment
    /// variable name.
    pub fn from_lookup<F>(lookup: F) -> LinkResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_RTO_MS)? {
            config.retransmit_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_MAX_RTO_MS)? {
            config.max_retransmit_timeout = Duration::from_millis(ms);
        }
        if let Some(limit) = parse_var::<u32, _>(&lookup, ENV_MAX_RETRANSMITS)? {
            config.max_retransmits = (limit > 0).then_some(limit);
        }
        if let Some(size) = parse_var::<usize, _>(&lookup, ENV_CHUNK_SIZE)? {
            config.chunk_size = size;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_var<V, F>(lookup: &F, name: &str) -> LinkResult<Option<V>>
where
    V: std::str::FromStr,
    V::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| LinkError::Config(format!("{name}={raw:?}: {e}"))),
    }
}

/// Builder for [`LinkConfig`].
#[derive(Debug, Default)]
pub struct LinkConfigBuilder {
    config: LinkConfig,
}

impl LinkConfigBuilder {
    /// Create a builder holding the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial retransmission timeout.
    pub fn retransmit_timeout(mut self, timeout: Duration) -> Self {
        self.config.retransmit_timeout = Some(timeout);
        self
    }

    /// Wait for acknowledgments without a timer.
    pub fn no_retransmit_timeout(mut self) -> Self {
        self.config.retransmit_timeout = None;
        self
    }

    /// Set the timeout cap reached through backoff.
    pub fn max_retransmit_timeout(mut self, timeout: Duration) -> Self {
        self.config.max_retransmit_timeout = timeout;
        self
    }

    /// Set the backoff multiplier.
    pub fn backoff_multiplier(mut self, multiplier: u32) -> Self {
        self.config.backoff_multiplier = multiplier;
        self
    }

    /// Set the retransmission limit per chunk.
    pub fn max_retransmits(mut self, limit: u32) -> Self {
        self.config.max_retransmits = Some(limit);
        self
    }

    /// Retransmit without limit.
    pub fn unlimited_retransmits(mut self) -> Self {
        self.config.max_retransmits = None;
        self
    }

    /// Set the payload bytes per frame.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> LinkResult<LinkConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = LinkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 8);
        assert_eq!(config.retransmit_timeout, Some(Duration::from_secs(1)));
        assert_eq!(config.max_retransmits, Some(10));
    }

    #[test]
    fn test_builder() {
        let config = LinkConfig::builder()
            .retransmit_timeout(Duration::from_millis(50))
            .max_retransmit_timeout(Duration::from_millis(400))
            .backoff_multiplier(3)
            .max_retransmits(4)
            .chunk_size(5)
            .build()
            .unwrap();

        assert_eq!(config.retransmit_timeout, Some(Duration::from_millis(50)));
        assert_eq!(config.max_retransmit_timeout, Duration::from_millis(400));
        assert_eq!(config.backoff_multiplier, 3);
        assert_eq!(config.max_retransmits, Some(4));
        assert_eq!(config.chunk_size, 5);
    }

    #[test]
    fn test_unbounded() {
        let config = LinkConfig::builder()
            .no_retransmit_timeout()
            .unlimited_retransmits()
            .build()
            .unwrap();
        assert_eq!(config, LinkConfig::unbounded());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let err = LinkConfig::builder().chunk_size(0).build().unwrap_err();
        assert!(matches!(err, LinkError::Config(_)));

        assert!(LinkConfig::builder().chunk_size(9).build().is_err());
        assert!(LinkConfig::builder().backoff_multiplier(0).build().is_err());
        assert!(
            LinkConfig::builder()
                .retransmit_timeout(Duration::ZERO)
                .build()
                .is_err()
        );
        assert!(
            LinkConfig::builder()
                .retransmit_timeout(Duration::from_secs(5))
                .max_retransmit_timeout(Duration::from_secs(1))
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_from_lookup_overlays_defaults() {
        let config = LinkConfig::from_lookup(lookup(&[
            ("FRAMELINK_RTO_MS", "250"),
            ("FRAMELINK_MAX_RETRANSMITS", "0"),
            ("FRAMELINK_CHUNK_SIZE", " 4 "),
        ]))
        .unwrap();

        assert_eq!(config.retransmit_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.max_retransmits, None);
        assert_eq!(config.chunk_size, 4);
        assert_eq!(config.max_retransmit_timeout, MAX_RTO);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = LinkConfig::from_lookup(lookup(&[("FRAMELINK_RTO_MS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("FRAMELINK_RTO_MS"));

        assert!(LinkConfig::from_lookup(lookup(&[("FRAMELINK_CHUNK_SIZE", "64")])).is_err());
    }
}
