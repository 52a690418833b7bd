use std::{env, path::PathBuf, str::FromStr, time::Duration};

use anyhow::bail;

/// Upper bound for `CRM_API_RETRIES`; backoff doubles per retry.
pub const MAX_API_RETRIES: u32 = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// When unset the server runs on the in-memory store.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env_or("APP_PORT", 3000);
        Ok(Self {
            port,
            database_url,
            host,
        })
    }

    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))
    }
}

/// Settings for the `crm-jobs` runner.
#[derive(Debug, Clone)]
pub struct JobsConfig {
    pub api_url: String,
    pub retries: u32,
    pub timeout: Duration,
    pub heartbeat_log: PathBuf,
    pub low_stock_log: PathBuf,
    pub order_reminders_log: PathBuf,
    pub report_log: PathBuf,
    pub heartbeat_every: Duration,
    pub low_stock_every: Duration,
    pub report_every: Duration,
}

impl JobsConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_url = env::var("CRM_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000/api/execute".to_string());
        Ok(Self {
            api_url,
            retries: retries(env_or("CRM_API_RETRIES", 3))?,
            timeout: Duration::from_secs(env_or("CRM_API_TIMEOUT_SECS", 10)),
            heartbeat_log: path_or("HEARTBEAT_LOG", "/tmp/crm_heartbeat_log.txt"),
            low_stock_log: path_or("LOW_STOCK_LOG", "/tmp/low_stock_updates_log.txt"),
            order_reminders_log: path_or("ORDER_REMINDERS_LOG", "/tmp/order_reminders_log.txt"),
            report_log: path_or("REPORT_LOG", "/tmp/crm_report_log.txt"),
            heartbeat_every: interval_or("HEARTBEAT_EVERY_SECS", 5 * 60)?,
            low_stock_every: interval_or("LOW_STOCK_EVERY_SECS", 12 * 60 * 60)?,
            report_every: interval_or("REPORT_EVERY_SECS", 7 * 24 * 60 * 60)?,
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

fn interval_or(key: &str, default_secs: u64) -> anyhow::Result<Duration> {
    positive_secs(key, env_or(key, default_secs))
}

fn positive_secs(key: &str, secs: u64) -> anyhow::Result<Duration> {
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}

fn retries(count: u32) -> anyhow::Result<u32> {
    if count > MAX_API_RETRIES {
        bail!("CRM_API_RETRIES must be at most {MAX_API_RETRIES}, got {count}");
    }
    Ok(count)
}

fn path_or(key: &str, default: &str) -> PathBuf {
    env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_is_rejected() {
        let err = positive_secs("REPORT_EVERY_SECS", 0).unwrap_err();
        assert_eq!(err.to_string(), "REPORT_EVERY_SECS must be greater than zero");
        assert_eq!(positive_secs("REPORT_EVERY_SECS", 60).unwrap(), Duration::from_secs(60));
    }

    #[test]
    fn retries_are_capped() {
        assert_eq!(retries(0).unwrap(), 0);
        assert_eq!(retries(MAX_API_RETRIES).unwrap(), MAX_API_RETRIES);
        assert!(retries(33).is_err());
    }
}
