/*
[INPUT]:  Defaults, optional config file, TRADELINK_* environment variables
[OUTPUT]: ClientConfig consumed by the connection manager
[POS]:    WebSocket layer - connection configuration and transport policy
[UPDATE]: When adding connection options or changing defaults
*/

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TradelinkError};

/// Default public endpoint of the trading WebSocket API
pub const DEFAULT_WS_URL: &str = "wss://ws.derivws.com/websockets/v3?app_id=1089";

const ENV_PREFIX: &str = "TRADELINK";

/// Connection manager configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub websocket_url: String,
    /// Failed reconnect attempts tolerated before giving up
    pub max_reconnect_attempts: u32,
    /// First reconnect delay; each further attempt doubles it
    pub reconnect_base_delay_ms: u64,
    pub heartbeat_interval_ms: u64,
    pub connection_timeout_ms: u64,
    /// Default deadline for `send_with_response`
    pub request_timeout_ms: u64,
    /// Production deployments must use `wss://`
    pub is_production: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            websocket_url: DEFAULT_WS_URL.to_string(),
            max_reconnect_attempts: 5,
            reconnect_base_delay_ms: 1_000,
            heartbeat_interval_ms: 30_000,
            connection_timeout_ms: 10_000,
            request_timeout_ms: 5_000,
            is_production: false,
        }
    }
}

impl ClientConfig {
    /// Load configuration: defaults, then `path` (if given), then `TRADELINK_*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&ClientConfig::default()).map_err(config_error)?;
        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(config_error)
    }

    pub fn reconnect_base_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_delay_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Delay before reconnect attempt `attempt` (1-based): `base * 2^(attempt-1)`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.reconnect_base_delay()
            .saturating_mul(2_u32.saturating_pow(exponent))
    }
}

fn config_error(err: config::ConfigError) -> TradelinkError {
    TradelinkError::Config(err.to_string())
}

/// Parse `url` and enforce the transport policy.
pub fn check_transport_url(url: &str, is_production: bool) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|err| TradelinkError::Config(format!("invalid WebSocket url {url:?}: {err}")))?;
    match parsed.scheme() {
        "wss" => Ok(parsed),
        "ws" if !is_production => Ok(parsed),
        "ws" => Err(TradelinkError::Config(format!(
            "insecure transport {url} is not allowed in production; use wss://"
        ))),
        other => Err(TradelinkError::Config(format!(
            "unsupported WebSocket scheme {other:?} in {url}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.request_timeout(), Duration::from_millis(5_000));
        assert!(!config.is_production);
    }

    #[rstest]
    #[case(1, 1_000)]
    #[case(2, 2_000)]
    #[case(3, 4_000)]
    #[case(5, 16_000)]
    fn test_backoff_doubles(#[case] attempt: u32, #[case] expected_ms: u64) {
        let config = ClientConfig::default();
        assert_eq!(config.backoff_delay(attempt), Duration::from_millis(expected_ms));
    }

    #[test]
    fn test_backoff_does_not_overflow() {
        let config = ClientConfig::default();
        assert!(config.backoff_delay(u32::MAX) >= config.backoff_delay(31));
    }

    #[rstest]
    #[case("wss://ws.example.com/v3", false, true)]
    #[case("wss://ws.example.com/v3", true, true)]
    #[case("ws://127.0.0.1:9000", false, true)]
    #[case("ws://ws.example.com/v3", true, false)]
    #[case("https://ws.example.com/v3", false, false)]
    fn test_transport_policy(#[case] url: &str, #[case] production: bool, #[case] ok: bool) {
        let result = check_transport_url(url, production);
        assert_eq!(result.is_ok(), ok, "{url} production={production}");
        if let Err(err) = result {
            assert!(matches!(err, TradelinkError::Config(_)));
        }
    }

    #[test]
    fn test_transport_policy_rejects_garbage() {
        let err = check_transport_url("not a url", false).unwrap_err();
        assert!(matches!(err, TradelinkError::Config(message) if message.contains("not a url")));
    }

    #[test]
    fn test_load_from_file() {
        let mut path = std::env::temp_dir();
        path.push(format!("tradelink-config-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "websocket_url = \"ws://127.0.0.1:9001\"\nmax_reconnect_attempts = 2\n",
        )
        .unwrap();

        let config = ClientConfig::load(Some(&path)).unwrap();
        assert_eq!(config.websocket_url, "ws://127.0.0.1:9001");
        assert_eq!(config.max_reconnect_attempts, 2);
        assert_eq!(config.heartbeat_interval_ms, 30_000);

        std::fs::remove_file(path).unwrap();
    }
}
