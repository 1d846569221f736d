use std::path::PathBuf;
use std::time::Duration;

use cinepay_models::UnrecognizedAvailability;
use serde::Deserialize;

/// All configuration for the cinepay client.
///
/// Precedence (lowest to highest): defaults → config file → env var → CLI arg.
/// CLI arg merging is done by the caller after `Config::load()`.
#[derive(Debug, Clone)]
pub struct Config {
    // Booking service
    pub api_base_url: String,
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,

    // Payment
    pub bank: String,
    pub unrecognized_availability: UnrecognizedAvailability,

    // Logging
    pub log_level: String,
    pub utc: bool,
}

/// Config file layout (~/.cinepay/config.toml). Every key is optional and
/// layers on top of the compiled-in defaults.
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    api_base_url: Option<String>,
    auth_token: Option<String>,
    request_timeout_secs: Option<u64>,
    bank: Option<String>,
    unrecognized_availability: Option<UnrecognizedAvailability>,
    log_level: Option<String>,
    utc: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            auth_token: None,
            request_timeout_secs: 30,
            bank: "bca".to_string(),
            unrecognized_availability: UnrecognizedAvailability::Fail,
            log_level: "info".to_string(),
            utc: false,
        }
    }
}

impl Config {
    /// Config directory: ~/.cinepay/
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cinepay")
    }

    /// Config file path: ~/.cinepay/config.toml
    pub fn file_path() -> PathBuf {
        Self::dir().join("config.toml")
    }

    /// Load config: defaults → config file → env vars.
    /// CLI args should be merged by the caller afterward.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Ok(contents) = std::fs::read_to_string(Self::file_path()) {
            config.apply_toml(&contents);
        }

        config.apply_env(|key| std::env::var(key).ok());

        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Layer a TOML document over the current values. A document that does
    /// not parse is ignored as a whole.
    pub fn apply_toml(&mut self, contents: &str) {
        if let Ok(file) = toml::from_str::<FileConfig>(contents) {
            self.apply_file(file);
        }
    }

    /// Layer environment variables, read through `var`, over the current values.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("CINEPAY_API_URL") { self.api_base_url = v; }
        if let Some(v) = var("CINEPAY_TOKEN") { self.auth_token = Some(v); }
        if let Some(v) = var("CINEPAY_TIMEOUT_SECS") {
            if let Ok(secs) = v.parse() { self.request_timeout_secs = secs; }
        }
        if let Some(v) = var("CINEPAY_BANK") { self.bank = v; }
        if let Some(v) = var("CINEPAY_UNRECOGNIZED_AVAILABILITY") {
            if let Ok(policy) = v.parse() { self.unrecognized_availability = policy; }
        }
        if let Some(v) = var("CINEPAY_LOG_LEVEL") { self.log_level = v; }
        if let Some(v) = var("CINEPAY_UTC") {
            self.utc = v == "1" || v.eq_ignore_ascii_case("true");
        }
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(v) = file.api_base_url { self.api_base_url = v; }
        if let Some(v) = file.auth_token { self.auth_token = Some(v); }
        if let Some(v) = file.request_timeout_secs { self.request_timeout_secs = v; }
        if let Some(v) = file.bank { self.bank = v; }
        if let Some(v) = file.unrecognized_availability { self.unrecognized_availability = v; }
        if let Some(v) = file.log_level { self.log_level = v; }
        if let Some(v) = file.utc { self.utc = v; }
    }
}
