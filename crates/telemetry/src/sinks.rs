// Path: crates/telemetry/src/sinks.rs
//! Defines abstract traits for metrics reporting, decoupling core logic from the backend.

use once_cell::sync::OnceCell;

// --- Static Sink Access ---

/// A no-op sink for use in tests or when telemetry is disabled.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

/// A lazily-initialized static reference to the global `MetricsSink` implementation.
pub static SINK: OnceCell<&'static dyn MetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Returns a static reference to the configured error metrics sink.
/// If no sink has been initialized, it returns a no-op sink.
pub fn error_metrics() -> &'static dyn ErrorMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns a static reference to the configured service metrics sink.
/// If no sink has been initialized, it returns a no-op sink.
pub fn service_metrics() -> &'static dyn ServiceMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns a static reference to the configured contract workflow sink.
pub fn contract_metrics() -> &'static dyn ContractMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns a static reference to the configured notification dispatch sink.
pub fn notification_metrics() -> &'static dyn NotificationMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns a static reference to the configured matching engine sink.
pub fn matching_metrics() -> &'static dyn MatchingMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns a static reference to the configured rate-guard sink.
pub fn rate_limit_metrics() -> &'static dyn RateLimitMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

// --- Trait Definitions ---

/// A sink for metrics related to the contract workflow state machine (C4/C8).
pub trait ContractMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for contracts created, labeled by contract type.
    fn inc_contracts_created(&self, contract_type: &str);
    /// Increments a counter for state transitions, labeled by from/to state.
    fn inc_state_transition(&self, from: &str, to: &str);
    /// Increments a counter for transitions rejected as out-of-order or unauthorized.
    fn inc_transition_rejected(&self, reason: &'static str);
    /// Observes the completion percentage recorded at a transition.
    fn observe_completion_percentage(&self, pct: f64);
    /// Sets the gauge for contracts currently in a non-terminal state.
    fn set_open_contracts(&self, count: u64);
}
impl ContractMetricsSink for NopSink {
    fn inc_contracts_created(&self, _contract_type: &str) {}
    fn inc_state_transition(&self, _from: &str, _to: &str) {}
    fn inc_transition_rejected(&self, _reason: &'static str) {}
    fn observe_completion_percentage(&self, _pct: f64) {}
    fn set_open_contracts(&self, _count: u64) {}
}

/// A sink for metrics related to the notification dispatcher (C2).
pub trait NotificationMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for notifications created, labeled by kind.
    fn inc_notifications_created(&self, kind: &str);
    /// Increments a counter for delivery attempts, labeled by channel and outcome.
    fn inc_delivery_attempt(&self, channel: &str, outcome: &'static str);
    /// Increments a counter for deliveries suppressed by user preference.
    fn inc_suppressed_by_preference(&self, channel: &str);
    /// Observes the latency of a single dispatch call.
    fn observe_dispatch_latency(&self, channel: &str, duration_secs: f64);
    /// Sets the gauge for notifications currently queued for retry.
    fn set_retry_queue_size(&self, size: f64);
}
impl NotificationMetricsSink for NopSink {
    fn inc_notifications_created(&self, _kind: &str) {}
    fn inc_delivery_attempt(&self, _channel: &str, _outcome: &'static str) {}
    fn inc_suppressed_by_preference(&self, _channel: &str) {}
    fn observe_dispatch_latency(&self, _channel: &str, _duration_secs: f64) {}
    fn set_retry_queue_size(&self, _size: f64) {}
}

/// A sink for metrics related to the tenant/property matching engine (C3).
pub trait MatchingMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for match requests submitted.
    fn inc_match_requests_submitted(&self);
    /// Increments a counter for match requests rejected as duplicate-active.
    fn inc_duplicate_rejected(&self);
    /// Observes a computed compatibility score.
    fn observe_compatibility_score(&self, score: f64);
    /// Increments a counter for match requests expired by the daily sweep.
    fn inc_expired(&self, count: u64);
    /// Increments a counter for follow-up reminders sent.
    fn inc_follow_up_sent(&self);
}
impl MatchingMetricsSink for NopSink {
    fn inc_match_requests_submitted(&self) {}
    fn inc_duplicate_rejected(&self) {}
    fn observe_compatibility_score(&self, _score: f64) {}
    fn inc_expired(&self, _count: u64) {}
    fn inc_follow_up_sent(&self) {}
}

/// A sink for metrics related to the rate-limit and IP-policy guard (C9).
pub trait RateLimitMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for requests rejected by the sliding-window limiter, labeled by endpoint.
    fn inc_rate_limited(&self, endpoint: &str);
    /// Increments a counter for requests rejected because the source IP is blocked.
    fn inc_blocked_ip_rejected(&self);
    /// Sets the gauge for the number of IPs currently in the blocked set.
    fn set_blocked_ip_count(&self, count: u64);
    /// Increments a counter for requests rejected by the malicious user-agent filter.
    fn inc_malicious_ua_rejected(&self);
}
impl RateLimitMetricsSink for NopSink {
    fn inc_rate_limited(&self, _endpoint: &str) {}
    fn inc_blocked_ip_rejected(&self) {}
    fn set_blocked_ip_count(&self, _count: u64) {}
    fn inc_malicious_ua_rejected(&self) {}
}

/// A sink for recording structured error metrics.
pub trait ErrorMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for a specific error, categorized by its kind and variant.
    fn inc_error(&self, kind: &'static str, variant: &'static str);
}
impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str, _variant: &'static str) {}
}

/// A sink for service-level metrics related to the generic dispatch mechanism.
pub trait ServiceMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter when a required service capability cannot be found.
    fn inc_capability_resolve_fail(&self, capability: &str);
    /// Observes the latency of a dispatched service call, labeled by service and method.
    fn observe_service_dispatch_latency(&self, service_id: &str, method: &str, duration_secs: f64);
    /// Increments a counter for errors returned from a service call, labeled by reason.
    fn inc_dispatch_error(&self, service_id: &str, method: &str, reason: &'static str);
}
impl ServiceMetricsSink for NopSink {
    fn inc_capability_resolve_fail(&self, _capability: &str) {}
    fn observe_service_dispatch_latency(
        &self,
        _service_id: &str,
        _method: &str,
        _duration_secs: f64,
    ) {
    }
    fn inc_dispatch_error(&self, _service_id: &str, _method: &str, _reason: &'static str) {}
}

/// A unified sink that implements all domain-specific traits, providing a single
/// point of implementation for metrics backends like Prometheus.
pub trait MetricsSink:
    ContractMetricsSink
    + NotificationMetricsSink
    + MatchingMetricsSink
    + RateLimitMetricsSink
    + ErrorMetricsSink
    + ServiceMetricsSink
{
}

// Blanket implementation to allow any type that implements all sub-traits
// to be used as a `MetricsSink`.
impl<T> MetricsSink for T where
    T: ContractMetricsSink
        + NotificationMetricsSink
        + MatchingMetricsSink
        + RateLimitMetricsSink
        + ErrorMetricsSink
        + ServiceMetricsSink
{
}
