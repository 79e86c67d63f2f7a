// Path: crates/node/src/scheduler.rs
//! Periodic sweeps for system-driven transitions and maintenance (spec §5,
//! "Scheduling model"). Each sweep runs on its own `tokio::time::interval`
//! so a slow sweep never delays the others.

use crate::config::SchedulerConfig;
use rental_services::{
    InvitationSubsystem, MatchingEngine, NotificationDispatcher, RateGuard, SignatureFlow,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Spawns one `tokio` task per sweep. The returned handles are not awaited
/// by the caller; the process runs until it receives a shutdown signal.
#[allow(clippy::too_many_arguments)]
pub fn spawn_all(
    config: &SchedulerConfig,
    invitations: InvitationSubsystem,
    signatures: SignatureFlow,
    matching: MatchingEngine,
    notifications: NotificationDispatcher,
    rate_guard: Arc<RateGuard>,
) -> Vec<tokio::task::JoinHandle<()>> {
    vec![
        spawn_sweep(
            "cleanup_expired_invitations",
            config.cleanup_expired_invitations_secs,
            move || {
                let invitations = invitations.clone();
                async move { invitations.cleanup_expired().await.map(|n| n as u64).map_err(|e| e.to_string()) }
            },
        ),
        spawn_sweep("activate_due_contracts", config.activate_due_contracts_secs, {
            let signatures = signatures.clone();
            move || {
                let signatures = signatures.clone();
                async move { signatures.activate_due().await.map_err(|e| e.to_string()) }
            }
        }),
        spawn_sweep("expire_due_contracts", config.expire_due_contracts_secs, move || {
            let signatures = signatures.clone();
            async move { signatures.expire_due().await.map_err(|e| e.to_string()) }
        }),
        spawn_sweep("process_daily_matches", config.process_daily_matches_secs, {
            let matching = matching.clone();
            move || {
                let matching = matching.clone();
                async move { matching.process_daily().await.map_err(|e| e.to_string()) }
            }
        }),
        spawn_sweep("expire_old_matches", config.expire_old_matches_secs, {
            let matching = matching.clone();
            move || {
                let matching = matching.clone();
                async move { matching.expire_old().await.map_err(|e| e.to_string()) }
            }
        }),
        spawn_sweep(
            "match_follow_up_reminders",
            config.match_follow_up_reminders_secs,
            move || {
                let matching = matching.clone();
                async move { matching.send_follow_up_reminders().await.map_err(|e| e.to_string()) }
            },
        ),
        spawn_sweep(
            "process_scheduled_notifications",
            config.process_scheduled_notifications_secs,
            {
                let notifications = notifications.clone();
                move || {
                    let notifications = notifications.clone();
                    async move { notifications.process_scheduled().await.map_err(|e| e.to_string()) }
                }
            },
        ),
        spawn_sweep(
            "retry_failed_notifications",
            config.retry_failed_notifications_secs,
            move || {
                let notifications = notifications.clone();
                async move { notifications.retry_failed().await.map_err(|e| e.to_string()) }
            },
        ),
        spawn_sweep("rate_guard_evict", config.rate_guard_evict_secs, move || {
            let rate_guard = rate_guard.clone();
            async move {
                rate_guard.evict_expired();
                Ok::<u64, String>(0)
            }
        }),
    ]
}

/// Runs `work` on a fixed interval, logging its result; a missed tick (the
/// previous run overran the interval) is skipped rather than queued, since
/// every sweep is idempotent (spec §5, "eventually consistent").
fn spawn_sweep<F, Fut>(name: &'static str, interval_secs: u64, mut work: F) -> tokio::task::JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<u64, String>> + Send,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match work().await {
                Ok(count) => {
                    if count > 0 {
                        info!(sweep = name, count, "sweep completed");
                    }
                }
                Err(error) => warn!(sweep = name, error, "sweep failed"),
            }
        }
    })
}
