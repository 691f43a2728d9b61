// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use stationbook_app::OverlapPolicy;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging;

pub const APP_NAME: &str = "stationbook";
const CONFIG_VERSION: i64 = 1;
const CONFIG_PATH_ENV: &str = "STATIONBOOK_CONFIG_PATH";
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            sync: SyncSettings::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(stationbook_api::DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    pub overlap: Option<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            overlap: Some(OverlapPolicy::default().as_str().to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub filter: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            filter: Some(DEFAULT_LOG_FILTER.to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [api], [sync], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1. Run `stationbook --print-example-config` for the current schema",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.api.base_url {
            stationbook_api::parse_base_url(base_url)
                .with_context(|| format!("invalid [api] section in {}", path.display()))?;
        }

        if let Some(timeout) = &self.api.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "api.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(overlap) = &self.sync.overlap
            && OverlapPolicy::parse(overlap).is_none()
        {
            bail!(
                "sync.overlap in {} must be \"last_response_wins\" or \"one_per_record\", got {:?}",
                path.display(),
                overlap
            );
        }

        if let Some(filter) = &self.log.filter {
            logging::parse_filter(filter)
                .with_context(|| format!("invalid log.filter in {}", path.display()))?;
        }

        Ok(())
    }

    /// Replaces `[api].base_url`, e.g. from `--base-url`.
    pub fn override_base_url(&mut self, raw: &str) -> Result<()> {
        stationbook_api::parse_base_url(raw).context("invalid --base-url value")?;
        self.api.base_url = Some(raw.to_owned());
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.api
            .base_url
            .as_deref()
            .unwrap_or(stationbook_api::DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn overlap_policy(&self) -> OverlapPolicy {
        self.sync
            .overlap
            .as_deref()
            .and_then(OverlapPolicy::parse)
            .unwrap_or_default()
    }

    pub fn log_filter(&self) -> &str {
        self.log.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# stationbook config\n# Place this file at: {}\n\nversion = 1\n\n[api]\n# Origin of the accounts service; requests go to <base_url>/api/accounts\nbase_url = \"{}\"\n# <N>ms, <N>s or <N>m\ntimeout = \"{}\"\n\n[sync]\n# last_response_wins: send every request, the last response decides the record\n# one_per_record: refuse a second update/delete while one is in flight\noverlap = \"{}\"\n\n[log]\n# tracing filter directive; STATIONBOOK_LOG overrides it\nfilter = \"{}\"\n",
            path.display(),
            stationbook_api::DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
            OverlapPolicy::default().as_str(),
            DEFAULT_LOG_FILTER,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        let Some(secs) = mins.checked_mul(60) else {
            bail!(
                "timeout duration {raw:?} is too large; use at most {} minutes",
                u64::MAX / 60
            );
        };
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_duration};
    use anyhow::Result;
    use stationbook_app::OverlapPolicy;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.base_url(), "http://localhost:8080");
        assert_eq!(config.timeout()?, Duration::from_secs(10));
        assert_eq!(config.overlap_policy(), OverlapPolicy::LastResponseWins);
        assert_eq!(config.log_filter(), "info");
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[api]\nbase_url = \"http://localhost:9000\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[api], [sync], and [log]"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[api]\nbase_url = \"https://accounts.example/backend/\"\ntimeout = \"750ms\"\n[sync]\noverlap = \"one_per_record\"\n[log]\nfilter = \"stationbook=debug,warn\"\n",
        )?;
        let config = Config::load(&path)?;
        assert_eq!(config.base_url(), "https://accounts.example/backend");
        assert_eq!(config.timeout()?, Duration::from_millis(750));
        assert_eq!(config.overlap_policy(), OverlapPolicy::OnePerRecord);
        assert_eq!(config.log_filter(), "stationbook=debug,warn");
        Ok(())
    }

    #[test]
    fn partial_sections_fall_back_to_defaults() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[api]\ntimeout = \"2s\"\n")?;
        let config = Config::load(&path)?;
        assert_eq!(config.base_url(), "http://localhost:8080");
        assert_eq!(config.timeout()?, Duration::from_secs(2));
        assert_eq!(config.overlap_policy(), OverlapPolicy::LastResponseWins);
        Ok(())
    }

    #[test]
    fn invalid_base_url_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[api]\nbase_url = \"ftp://files\"\n")?;
        let error = Config::load(&path).expect_err("ftp base url should fail");
        let message = format!("{error:#}");
        assert!(message.contains("invalid [api] section"));
        assert!(message.contains("unsupported scheme"));
        Ok(())
    }

    #[test]
    fn unknown_overlap_policy_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[sync]\noverlap = \"first_wins\"\n")?;
        let error = Config::load(&path).expect_err("unknown policy should fail");
        assert!(error.to_string().contains("sync.overlap"));
        Ok(())
    }

    #[test]
    fn invalid_log_filter_is_rejected() -> Result<()> {
        let (_temp, path) =
            write_config("version = 1\n[log]\nfilter = \"stationbook=loudest\"\n")?;
        let error = Config::load(&path).expect_err("bad filter should fail");
        assert!(error.to_string().contains("invalid log.filter"));
        Ok(())
    }

    #[test]
    fn timeout_rejects_non_positive_values() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[api]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("must be positive"));
        Ok(())
    }

    #[test]
    fn timeout_parses_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        let error = parse_duration("soon").expect_err("invalid duration should fail");
        assert!(error.to_string().contains("invalid"));
        Ok(())
    }

    #[test]
    fn huge_minute_timeout_is_rejected() {
        let raw = format!("{}m", u64::MAX);
        let error = parse_duration(&raw).expect_err("overflowing minutes should fail");
        assert!(error.to_string().contains("too large"));
    }

    #[test]
    fn base_url_override_is_validated() -> Result<()> {
        let mut config = Config::default();
        config.override_base_url("http://10.0.0.5:9000/")?;
        assert_eq!(config.base_url(), "http://10.0.0.5:9000");

        let error = config
            .override_base_url("not a url")
            .expect_err("bad override should fail");
        assert!(error.to_string().contains("--base-url"));
        assert_eq!(config.base_url(), "http://10.0.0.5:9000");
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("STATIONBOOK_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("STATIONBOOK_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn default_path_uses_config_toml_suffix_when_no_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("STATIONBOOK_CONFIG_PATH");
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("stationbook/config.toml"));
        Ok(())
    }

    #[test]
    fn example_config_round_trips_through_load() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        assert!(example.contains("[api]"));
        assert!(example.contains("[sync]"));
        assert!(example.contains("[log]"));

        std::fs::write(&path, &example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.base_url(), "http://localhost:8080");
        Ok(())
    }
}
