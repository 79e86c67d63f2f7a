// Path: crates/node/src/config.rs
//! Configuration for the scheduler process (`rental-node.toml`, overridable
//! by `RENTAL_*` environment variables per spec §5, "Scheduling model").

use serde::{Deserialize, Serialize};

fn default_bind_address() -> String {
    "0.0.0.0:9090".to_string()
}

/// Top-level node configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NodeConfig {
    /// Address the `/metrics`, `/healthz`, `/readyz` server binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

/// Interval, in seconds, between runs of each periodic sweep (spec §5:
/// "long-running work ... is dispatched by a periodic scheduler (cron-style,
/// minute granularity)").
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulerConfig {
    #[serde(default = "SchedulerConfig::default_cleanup_expired_invitations_secs")]
    pub cleanup_expired_invitations_secs: u64,
    #[serde(default = "SchedulerConfig::default_activate_due_contracts_secs")]
    pub activate_due_contracts_secs: u64,
    #[serde(default = "SchedulerConfig::default_expire_due_contracts_secs")]
    pub expire_due_contracts_secs: u64,
    #[serde(default = "SchedulerConfig::default_expire_old_matches_secs")]
    pub expire_old_matches_secs: u64,
    #[serde(default = "SchedulerConfig::default_match_follow_up_reminders_secs")]
    pub match_follow_up_reminders_secs: u64,
    #[serde(default = "SchedulerConfig::default_process_daily_matches_secs")]
    pub process_daily_matches_secs: u64,
    #[serde(default = "SchedulerConfig::default_process_scheduled_notifications_secs")]
    pub process_scheduled_notifications_secs: u64,
    #[serde(default = "SchedulerConfig::default_retry_failed_notifications_secs")]
    pub retry_failed_notifications_secs: u64,
    #[serde(default = "SchedulerConfig::default_rate_guard_evict_secs")]
    pub rate_guard_evict_secs: u64,
}

impl SchedulerConfig {
    fn default_cleanup_expired_invitations_secs() -> u64 {
        300
    }
    fn default_activate_due_contracts_secs() -> u64 {
        3600
    }
    fn default_expire_due_contracts_secs() -> u64 {
        3600
    }
    fn default_expire_old_matches_secs() -> u64 {
        3600
    }
    fn default_match_follow_up_reminders_secs() -> u64 {
        21_600
    }
    fn default_process_daily_matches_secs() -> u64 {
        86_400
    }
    fn default_process_scheduled_notifications_secs() -> u64 {
        60
    }
    fn default_retry_failed_notifications_secs() -> u64 {
        60
    }
    fn default_rate_guard_evict_secs() -> u64 {
        300
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cleanup_expired_invitations_secs: Self::default_cleanup_expired_invitations_secs(),
            activate_due_contracts_secs: Self::default_activate_due_contracts_secs(),
            expire_due_contracts_secs: Self::default_expire_due_contracts_secs(),
            expire_old_matches_secs: Self::default_expire_old_matches_secs(),
            match_follow_up_reminders_secs: Self::default_match_follow_up_reminders_secs(),
            process_daily_matches_secs: Self::default_process_daily_matches_secs(),
            process_scheduled_notifications_secs: Self::default_process_scheduled_notifications_secs(),
            retry_failed_notifications_secs: Self::default_retry_failed_notifications_secs(),
            rate_guard_evict_secs: Self::default_rate_guard_evict_secs(),
        }
    }
}

/// Loads configuration from an optional TOML file, then applies `RENTAL_*`
/// environment variable overrides on top.
pub fn load(path: Option<&std::path::Path>) -> anyhow::Result<NodeConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("reading config file {}: {e}", path.display()))?;
            toml::from_str(&text)
                .map_err(|e| anyhow::anyhow!("parsing config file {}: {e}", path.display()))?
        }
        None => NodeConfig::default(),
    };

    if let Ok(addr) = std::env::var("RENTAL_BIND_ADDRESS") {
        config.bind_address = addr;
    }
    apply_env_u64("RENTAL_SCHEDULER_CLEANUP_EXPIRED_INVITATIONS_SECS", &mut config.scheduler.cleanup_expired_invitations_secs);
    apply_env_u64("RENTAL_SCHEDULER_ACTIVATE_DUE_CONTRACTS_SECS", &mut config.scheduler.activate_due_contracts_secs);
    apply_env_u64("RENTAL_SCHEDULER_EXPIRE_DUE_CONTRACTS_SECS", &mut config.scheduler.expire_due_contracts_secs);
    apply_env_u64("RENTAL_SCHEDULER_EXPIRE_OLD_MATCHES_SECS", &mut config.scheduler.expire_old_matches_secs);
    apply_env_u64("RENTAL_SCHEDULER_MATCH_FOLLOW_UP_REMINDERS_SECS", &mut config.scheduler.match_follow_up_reminders_secs);
    apply_env_u64("RENTAL_SCHEDULER_PROCESS_DAILY_MATCHES_SECS", &mut config.scheduler.process_daily_matches_secs);
    apply_env_u64(
        "RENTAL_SCHEDULER_PROCESS_SCHEDULED_NOTIFICATIONS_SECS",
        &mut config.scheduler.process_scheduled_notifications_secs,
    );
    apply_env_u64("RENTAL_SCHEDULER_RETRY_FAILED_NOTIFICATIONS_SECS", &mut config.scheduler.retry_failed_notifications_secs);
    apply_env_u64("RENTAL_SCHEDULER_RATE_GUARD_EVICT_SECS", &mut config.scheduler.rate_guard_evict_secs);

    Ok(config)
}

fn apply_env_u64(key: &str, target: &mut u64) {
    if let Ok(raw) = std::env::var(key) {
        if let Ok(value) = raw.parse() {
            *target = value;
        } else {
            tracing::warn!(key, raw, "ignoring malformed environment override");
        }
    }
}
