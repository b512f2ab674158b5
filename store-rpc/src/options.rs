use std::sync::OnceLock;

use rpc_transport::{CodecKind, Network};
use serde::{Deserialize, Serialize};
use tracing::Level;

/// Configuration keys masked in audit logs unless replaced.
pub const DEFAULT_SENSITIVE_WORDS: &[&str] = &[
    "key",
    "app_key",
    "china_app_key",
    "secret",
    "app_secret",
    "china_app_secret",
    "token",
    "access_token",
    "china_access_token",
    "name",
    "username",
    "pwd",
    "password",
];

/// Minimum severity for audit records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn level(&self) -> Level {
        match self {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    /// Whether an event at `level` passes this threshold.
    pub fn admits(&self, level: Level) -> bool {
        level <= self.level()
    }
}

/// Client construction options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Options {
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub codec: CodecKind,
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default = "default_sensitive_words")]
    pub sensitive_words: Vec<String>,
}

impl Options {
    /// Process-wide defaults, built on first use.
    pub fn defaults() -> &'static Options {
        static DEFAULTS: OnceLock<Options> = OnceLock::new();
        DEFAULTS.get_or_init(|| Options {
            network: Network::Tcp,
            codec: CodecKind::Json,
            log_level: LogLevel::Debug,
            sensitive_words: default_sensitive_words(),
        })
    }

    pub fn with_codec(mut self, codec: CodecKind) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    /// Replace the sensitive key list wholesale.
    pub fn with_sensitive_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sensitive_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_sensitive(&self, key: &str) -> bool {
        self.sensitive_words
            .iter()
            .any(|word| word.eq_ignore_ascii_case(key))
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::defaults().clone()
    }
}

fn default_sensitive_words() -> Vec<String> {
    DEFAULT_SENSITIVE_WORDS
        .iter()
        .map(|word| word.to_string())
        .collect()
}
