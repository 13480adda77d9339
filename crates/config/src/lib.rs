//! Configuration loading for `tcg-companion`.
//!
//! Settings are layered with [`figment`]:
//!
//! 1. Built-in defaults (via `#[serde(default)]`).
//! 2. The `tcg.cfg` file next to the executable, parsed by [`KeyValueFile`].
//! 3. Environment variables prefixed with `TCG_` (e.g. `TCG_OPENAI_API_KEY`).
//!
//! The resulting [`Config`] is loaded once at startup and passed by reference
//! to everything that needs it.

pub mod error;
mod provider;

pub use crate::provider::KeyValueFile;

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::Env;
use serde::de::{Deserializer, Error as _, IgnoredAny};
use serde::Deserialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

/// File name of the configuration file, looked up next to the executable.
pub const CONFIG_FILE_NAME: &str = "tcg.cfg";
/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "TCG_";

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Application configuration.
///
/// Field names on the wire are lower-case because the file provider folds key
/// case (so `CleanUpMode` and `TCG_CLEANUPMODE` land on the same field).
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// OpenAI API key. Absence is fatal; see [`Config::require_api_key`].
    #[serde(rename = "openai_api_key", default)]
    pub api_key: Option<String>,
    #[serde(rename = "logging_level", default)]
    pub log_level: LogLevel,
    /// Remove `Errors` folders once every image in them has been filed.
    #[serde(rename = "cleanupmode", default = "default_cleanup", deserialize_with = "flag")]
    pub cleanup: bool,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_max_tokens", deserialize_with = "lenient")]
    pub max_tokens: u32,
    /// Upper bound on a single recognition request, connect to last byte.
    #[serde(default = "default_timeout_secs", deserialize_with = "lenient")]
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            log_level: LogLevel::default(),
            cleanup: default_cleanup(),
            model: default_model(),
            endpoint: default_endpoint(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Builds the layered [`Figment`] for the configuration file at `path`.
    pub fn figment(path: impl AsRef<Path>) -> Result<Figment> {
        let file = KeyValueFile::read(path)?;
        Ok(Figment::new().merge(file).merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Loads configuration from the file at `path`, overlaid with `TCG_*`
    /// environment variables.
    ///
    /// A missing API key is *not* reported here, so that the log level can be
    /// honoured before the fatal error is logged.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_figment(&Self::figment(path)?)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        figment.extract().or_raise(|| ErrorKind::Invalid)
    }

    /// Returns the API key, or [`ErrorKind::MissingApiKey`] when it is absent
    /// or blank.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().map(str::trim).filter(|key| !key.is_empty()).ok_or_raise(|| ErrorKind::MissingApiKey)
    }
}

fn default_cleanup() -> bool {
    true
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Only a (case-insensitive) `true` enables a flag; any other value disables it.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
        Other(IgnoredAny),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s.trim().eq_ignore_ascii_case("true"),
        Flag::Other(_) => false,
    })
}

/// Accepts either a native value (environment variables are parsed by
/// `figment`) or a string from the `key=value` file.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient<T> {
        Value(T),
        Text(String),
    }
    match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Value(value) => Ok(value),
        Lenient::Text(s) => s.trim().parse().map_err(D::Error::custom),
    }
}

/// Log verbosity, spelled the way `tcg.cfg` users know it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

impl FromStr for LogLevel {
    type Err = std::convert::Infallible;

    /// Case-insensitive. Unrecognised levels fall back to [`LogLevel::Warning`].
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" | "TRACE" => Self::Debug,
            "INFO" => Self::Info,
            "ERROR" => Self::Error,
            "CRITICAL" | "FATAL" => Self::Critical,
            _ => Self::Warning,
        })
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        // Infallible.
        Ok(s.parse().unwrap_or_default())
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    fn from_contents(contents: &str) -> Config {
        Config::from_figment(&Figment::new().merge(KeyValueFile::from_contents(contents))).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = from_contents("");
        assert_eq!(config, Config::default());
        assert_eq!(config.log_level, LogLevel::Warning);
        assert!(config.cleanup);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_tokens, 300);
    }

    #[test]
    fn test_reads_all_keys() {
        let config = from_contents(
            "openai_api_key=sk-abc\nlogging_level=info\nCleanUpMode=False\nmodel=gpt-4o-mini\n\
             endpoint=http://localhost:8080/v1/chat/completions\nmax_tokens=500\ntimeout_secs=5\n",
        );
        assert_eq!(config.require_api_key().unwrap(), "sk-abc");
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(!config.cleanup);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.endpoint, "http://localhost:8080/v1/chat/completions");
        assert_eq!(config.max_tokens, 500);
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = from_contents("openai_api_key=sk-abc\nfavourite_card=Black Lotus");
        assert_eq!(config.api_key.as_deref(), Some("sk-abc"));
    }

    #[rstest]
    #[case("true", true)]
    #[case("TRUE", true)]
    #[case(" True ", true)]
    #[case("false", false)]
    #[case("yes", false)]
    #[case("", false)]
    fn test_cleanup_flag(#[case] value: &str, #[case] expected: bool) {
        let config = from_contents(&format!("CleanUpMode={value}"));
        assert_eq!(config.cleanup, expected);
    }

    #[rstest]
    #[case("DEBUG", LogLevel::Debug)]
    #[case("debug", LogLevel::Debug)]
    #[case("Info", LogLevel::Info)]
    #[case("WARNING", LogLevel::Warning)]
    #[case("warn", LogLevel::Warning)]
    #[case("ERROR", LogLevel::Error)]
    #[case("critical", LogLevel::Critical)]
    #[case("chatty", LogLevel::Warning)]
    fn test_log_level_parsing(#[case] value: &str, #[case] expected: LogLevel) {
        assert_eq!(value.parse::<LogLevel>().unwrap(), expected);
    }

    #[test]
    fn test_log_level_filters() {
        assert_eq!(LevelFilter::from(LogLevel::Debug), LevelFilter::DEBUG);
        assert_eq!(LevelFilter::from(LogLevel::Warning), LevelFilter::WARN);
        assert_eq!(LevelFilter::from(LogLevel::Critical), LevelFilter::ERROR);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let figment = Figment::new().merge(KeyValueFile::from_contents("max_tokens=lots"));
        let err = Config::from_figment(&figment).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid));
    }

    #[rstest]
    #[case("")]
    #[case("openai_api_key=")]
    #[case("openai_api_key=   ")]
    fn test_missing_api_key(#[case] contents: &str) {
        let err = from_contents(contents).require_api_key().unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingApiKey));
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE_NAME, "openai_api_key=from-file\nCleanUpMode=true\nmax_tokens=100")?;
            jail.set_env("TCG_OPENAI_API_KEY", "from-env");
            jail.set_env("TCG_CLEANUPMODE", "false");
            jail.set_env("TCG_MAX_TOKENS", "42");
            let config = Config::load(CONFIG_FILE_NAME).unwrap();
            assert_eq!(config.require_api_key().unwrap(), "from-env");
            assert!(!config.cleanup);
            assert_eq!(config.max_tokens, 42);
            Ok(())
        });
    }

    #[test]
    fn test_load_from_file() {
        // Inside a jail so that `TCG_*` variables from other tests can't leak in.
        Jail::expect_with(|_| {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join(CONFIG_FILE_NAME);
            std::fs::write(&path, "openai_api_key=sk-file\nlogging_level=ERROR\n").unwrap();
            let config = Config::load(&path).unwrap();
            assert_eq!(config.require_api_key().unwrap(), "sk-file");
            assert_eq!(config.log_level, LogLevel::Error);
            Ok(())
        });
    }

    #[test]
    fn test_load_missing_file() {
        Jail::expect_with(|_| {
            let config = Config::load("does-not-exist.cfg").unwrap();
            assert!(config.require_api_key().is_err());
            assert!(config.cleanup);
            Ok(())
        });
    }
}
