use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_STORE_CAPACITY: usize = 50;
pub const DEFAULT_HISTORY_REPLAY: usize = 10;
pub const KEEPALIVE_INTERVAL_SECS: u64 = 30; // SSE comment ping cadence
pub const RECONNECT_BASE_MS: u64 = 5_000;
pub const RECONNECT_MAX_MS: u64 = 60_000;
pub const TOAST_VISIBLE_MS: u64 = 10_000;
pub const TOAST_FADE_MS: u64 = 500; // hide → remove, leaves room for a fade-out

/// Top-level config (smsline.toml + SMSLINE_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmslineConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Messages kept in memory; the oldest is evicted beyond this.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_STORE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// How many stored messages a new client receives in its history event.
    #[serde(default = "default_history_replay")]
    pub history_replay: usize,
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            history_replay: DEFAULT_HISTORY_REPLAY,
            keepalive_secs: KEEPALIVE_INTERVAL_SECS,
        }
    }
}

/// Inbound webhook settings.
///
/// Signature checking is opt-in. When enabled, `auth_token` is the Twilio
/// account auth token and `public_url` is the externally visible origin the
/// provider signs against (e.g. `https://example.com`), since the local
/// request URL differs behind a proxy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub verify_signature: bool,
    pub auth_token: Option<String>,
    pub public_url: Option<String>,
    /// Text sent back to the sender. `None` acknowledges silently.
    pub auto_reply: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Stream endpoint the listener connects to.
    #[serde(default = "default_stream_url")]
    pub url: String,
    #[serde(default = "default_reconnect_base_ms")]
    pub reconnect_base_ms: u64,
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
    /// Give up after this many consecutive failed attempts. `None` retries forever.
    pub max_attempts: Option<u32>,
    #[serde(default = "default_toast_visible_ms")]
    pub toast_visible_ms: u64,
    #[serde(default = "default_toast_fade_ms")]
    pub toast_fade_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_stream_url(),
            reconnect_base_ms: RECONNECT_BASE_MS,
            reconnect_max_ms: RECONNECT_MAX_MS,
            max_attempts: None,
            toast_visible_ms: TOAST_VISIBLE_MS,
            toast_fade_ms: TOAST_FADE_MS,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_capacity() -> usize {
    DEFAULT_STORE_CAPACITY
}
fn default_history_replay() -> usize {
    DEFAULT_HISTORY_REPLAY
}
fn default_keepalive_secs() -> u64 {
    KEEPALIVE_INTERVAL_SECS
}
fn default_stream_url() -> String {
    format!("http://{}:{}/stream", DEFAULT_BIND, DEFAULT_PORT)
}
fn default_reconnect_base_ms() -> u64 {
    RECONNECT_BASE_MS
}
fn default_reconnect_max_ms() -> u64 {
    RECONNECT_MAX_MS
}
fn default_toast_visible_ms() -> u64 {
    TOAST_VISIBLE_MS
}
fn default_toast_fade_ms() -> u64 {
    TOAST_FADE_MS
}

impl SmslineConfig {
    /// Load config from a TOML file with SMSLINE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.smsline/smsline.toml
    ///
    /// A missing file is not an error; every field has a default.
    /// Nested keys in env vars are separated by `__`,
    /// e.g. `SMSLINE_STREAM__KEEPALIVE_SECS=15`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);
        tracing::debug!(path = %path, "loading config");

        let config: SmslineConfig = Self::figment(&path)
            .extract()
            .map_err(|e| crate::error::SmslineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(SmslineConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SMSLINE_").split("__"))
    }

    /// Reject combinations that would silently misbehave at runtime.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SmslineError;

        if self.store.capacity == 0 {
            return Err(SmslineError::Config(
                "store.capacity must be at least 1".to_string(),
            ));
        }
        if self.stream.keepalive_secs == 0 {
            return Err(SmslineError::Config(
                "stream.keepalive_secs must be at least 1".to_string(),
            ));
        }
        if self.webhook.verify_signature
            && self.webhook.auth_token.as_deref().unwrap_or("").is_empty()
        {
            return Err(SmslineError::Config(
                "webhook.verify_signature requires webhook.auth_token".to_string(),
            ));
        }
        if self.client.reconnect_base_ms == 0
            || self.client.reconnect_max_ms < self.client.reconnect_base_ms
        {
            return Err(SmslineError::Config(
                "client.reconnect_max_ms must be >= client.reconnect_base_ms > 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.smsline/smsline.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let cfg = SmslineConfig::load(Some("does-not-exist.toml")).unwrap();
            assert_eq!(cfg.gateway.port, DEFAULT_PORT);
            assert_eq!(cfg.store.capacity, 50);
            assert_eq!(cfg.stream.history_replay, 10);
            assert_eq!(cfg.stream.keepalive_secs, 30);
            assert!(!cfg.webhook.verify_signature);
            assert_eq!(cfg.client.max_attempts, None);
            Ok(())
        });
    }

    #[test]
    fn toml_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "smsline.toml",
                r#"
                [gateway]
                port = 8080

                [stream]
                keepalive_secs = 5
                "#,
            )?;
            let cfg = SmslineConfig::load(Some("smsline.toml")).unwrap();
            assert_eq!(cfg.gateway.port, 8080);
            assert_eq!(cfg.gateway.bind, DEFAULT_BIND);
            assert_eq!(cfg.stream.keepalive_secs, 5);
            assert_eq!(cfg.stream.history_replay, DEFAULT_HISTORY_REPLAY);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_nested_keys() {
        Jail::expect_with(|jail| {
            jail.set_env("SMSLINE_STORE__CAPACITY", "7");
            jail.set_env("SMSLINE_WEBHOOK__AUTH_TOKEN", "secret");
            let cfg = SmslineConfig::load(Some("none.toml")).unwrap();
            assert_eq!(cfg.store.capacity, 7);
            assert_eq!(cfg.webhook.auth_token.as_deref(), Some("secret"));
            Ok(())
        });
    }

    #[test]
    fn signature_check_without_token_is_rejected() {
        let mut cfg = SmslineConfig::default();
        cfg.webhook.verify_signature = true;
        assert!(cfg.validate().is_err());

        cfg.webhook.auth_token = Some("tok".into());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut cfg = SmslineConfig::default();
        cfg.store.capacity = 0;
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
