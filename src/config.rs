//! Board configuration: built-in defaults, an optional JSON file, then
//! `ORDER_BOARD_*` environment overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::dnd::ActivationConstraint;
use crate::kanban::{TimeFilter, DELIVERED_VISIBLE};
use crate::poller::DEFAULT_POLL_INTERVAL;

const ENV_PREFIX: &str = "ORDER_BOARD_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub tenant_id: String,
    pub poll_interval_secs: u64,
    pub time_filter: TimeFilter,
    pub delivered_cap: usize,
    pub toast_ttl_secs: u64,
    pub drag: ActivationConstraint,
    /// Base URL the driver links point at.
    pub origin: String,
    pub refresh_on_success: bool,
    pub mailbox_size: usize,
    /// Directory for the notification history. Kept in memory when unset.
    pub notifications_dir: Option<PathBuf>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            tenant_id: "demo".to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            time_filter: TimeFilter::Last24Hours,
            delivered_cap: DELIVERED_VISIBLE,
            toast_ttl_secs: 10,
            drag: ActivationConstraint::default(),
            origin: "http://localhost:3000".to_string(),
            refresh_on_success: false,
            mailbox_size: 64,
            notifications_dir: None,
        }
    }
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("invalid value for {ENV_PREFIX}{key}: {raw:?}"))
}

impl BoardConfig {
    /// Reads `path` when given, then applies the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file: {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("failed to parse config file: {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides looked up through `get`, keyed by full variable name.
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| get(&format!("{ENV_PREFIX}{key}"));

        if let Some(raw) = var("TENANT") {
            self.tenant_id = raw.trim().to_string();
        }
        if let Some(raw) = var("POLL_SECS") {
            self.poll_interval_secs = parse_env("POLL_SECS", &raw)?;
        }
        if let Some(raw) = var("FILTER") {
            self.time_filter = match raw.trim() {
                "24h" | "last_24_hours" => TimeFilter::Last24Hours,
                "all" | "all_time" => TimeFilter::AllTime,
                other => bail!("invalid value for {ENV_PREFIX}FILTER: {other:?} (expected 24h or all)"),
            };
        }
        if let Some(raw) = var("DELIVERED_CAP") {
            self.delivered_cap = parse_env("DELIVERED_CAP", &raw)?;
        }
        if let Some(raw) = var("TOAST_TTL_SECS") {
            self.toast_ttl_secs = parse_env("TOAST_TTL_SECS", &raw)?;
        }
        if let Some(raw) = var("ORIGIN") {
            self.origin = raw.trim().to_string();
        }
        if let Some(raw) = var("REFRESH_ON_SUCCESS") {
            self.refresh_on_success = parse_env("REFRESH_ON_SUCCESS", &raw)?;
        }
        if let Some(raw) = var("MAILBOX") {
            self.mailbox_size = parse_env("MAILBOX", &raw)?;
        }
        if let Some(raw) = var("NOTIFICATIONS_DIR") {
            self.notifications_dir = Some(PathBuf::from(raw.trim()));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.tenant_id.is_empty() {
            bail!("tenant_id must not be empty");
        }
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be at least 1");
        }
        if self.mailbox_size == 0 {
            bail!("mailbox_size must be at least 1");
        }
        if !self.origin.starts_with("http://") && !self.origin.starts_with("https://") {
            bail!("origin must be an http(s) URL, got {:?}", self.origin);
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_secs(self.toast_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BoardConfig::default();
        assert_eq!(config.poll_interval(), DEFAULT_POLL_INTERVAL);
        assert_eq!(config.poll_interval_secs, 45);
        assert_eq!(config.delivered_cap, 5);
        assert_eq!(config.drag.touch_delay, Duration::from_millis(250));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        fs::write(
            &path,
            r#"{"tenant_id": "taqueria", "time_filter": "all_time", "drag": {"touch_delay_ms": 400}}"#,
        )
        .unwrap();

        let config = BoardConfig::load(Some(&path)).unwrap();
        assert_eq!(config.tenant_id, "taqueria");
        assert_eq!(config.time_filter, TimeFilter::AllTime);
        assert_eq!(config.drag.touch_delay, Duration::from_millis(400));
        assert_eq!(config.drag.distance_px, 10.0);
        assert_eq!(config.toast_ttl_secs, 10);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = BoardConfig::default();
        config
            .apply_env(env(&[
                ("ORDER_BOARD_TENANT", "t9"),
                ("ORDER_BOARD_POLL_SECS", " 30 "),
                ("ORDER_BOARD_FILTER", "all"),
                ("ORDER_BOARD_REFRESH_ON_SUCCESS", "true"),
            ]))
            .unwrap();

        assert_eq!(config.tenant_id, "t9");
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.time_filter, TimeFilter::AllTime);
        assert!(config.refresh_on_success);
    }

    #[test]
    fn test_bad_values_are_rejected() {
        let mut config = BoardConfig::default();
        let err = config
            .apply_env(env(&[("ORDER_BOARD_POLL_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("ORDER_BOARD_POLL_SECS"));

        config.poll_interval_secs = 0;
        assert!(config.validate().is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(BoardConfig::load(Some(&path)).is_err());
    }
}
