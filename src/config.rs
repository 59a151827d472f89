use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::shared::SyncError;

/// Runtime settings for the sync engine, read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub api_base_url: String,
    /// Base of the public competition pages linked from the UI
    pub site_base_url: String,
    pub group_id: u64,
    /// The single hunt competition to mirror; hunt is skipped when unset
    pub hunt_competition_id: Option<u64>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    /// How long `stop` waits for an in-flight cycle before aborting it
    pub shutdown_grace: Duration,
    pub user_agent: String,
    pub config_group: String,
    pub database_url: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.wiseoldman.net/v2".to_string(),
            site_base_url: "https://wiseoldman.net".to_string(),
            group_id: 1,
            hunt_competition_id: None,
            poll_interval: Duration::from_secs(7 * 60), // 7 minutes
            request_timeout: Duration::from_secs(15),
            shutdown_grace: Duration::from_secs(10),
            user_agent: concat!("wom-sync/", env!("CARGO_PKG_VERSION")).to_string(),
            config_group: "clanevents".to_string(),
            database_url: None,
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, so tests need not touch the process env
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("WOM_API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Some(url) = get("WOM_SITE_URL") {
            config.site_base_url = url;
        }
        if let Some(group_id) = get("WOM_GROUP_ID") {
            config.group_id = parse_value("WOM_GROUP_ID", &group_id)?;
        }
        if let Some(hunt_id) = get("WOM_HUNT_COMPETITION_ID") {
            config.hunt_competition_id = Some(parse_value("WOM_HUNT_COMPETITION_ID", &hunt_id)?);
        }
        if let Some(secs) = get("WOM_POLL_INTERVAL_SECS") {
            config.poll_interval = parse_nonzero_secs("WOM_POLL_INTERVAL_SECS", &secs)?;
        }
        if let Some(secs) = get("WOM_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = parse_nonzero_secs("WOM_REQUEST_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = get("WOM_SHUTDOWN_GRACE_SECS") {
            config.shutdown_grace =
                Duration::from_secs(parse_value("WOM_SHUTDOWN_GRACE_SECS", &secs)?);
        }
        if let Some(user_agent) = get("WOM_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(group) = get("CONFIG_GROUP") {
            config.config_group = group;
        }
        config.database_url = get("DATABASE_URL");

        Ok(config)
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, SyncError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| SyncError::Config(format!("invalid value for {}: {:?}", key, raw)))
}

fn parse_nonzero_secs(key: &str, raw: &str) -> Result<Duration, SyncError> {
    let secs: u64 = parse_value(key, raw)?;
    if secs == 0 {
        return Err(SyncError::Config(format!("{} must be greater than zero", key)));
    }
    Ok(Duration::from_secs(secs))
}
