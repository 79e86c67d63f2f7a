// Path: crates/telemetry/src/prometheus.rs
//! A concrete implementation of the metrics sinks using the Prometheus crate.

use crate::sinks::*;
use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_gauge, register_histogram, register_histogram_vec,
    register_int_counter, register_int_counter_vec, Gauge, Histogram, HistogramVec, IntCounter,
    IntCounterVec,
};

// --- Metric Statics ---
// We use OnceCell to hold the metric collectors. They will be initialized
// exactly once by the `install` function.

static CONTRACTS_CREATED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static CONTRACT_STATE_TRANSITIONS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static CONTRACT_TRANSITION_REJECTED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static CONTRACT_COMPLETION_PERCENTAGE: OnceCell<Histogram> = OnceCell::new();
static CONTRACTS_OPEN: OnceCell<Gauge> = OnceCell::new();

static NOTIFICATIONS_CREATED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static DELIVERY_ATTEMPTS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static SUPPRESSED_BY_PREFERENCE_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static DISPATCH_LATENCY_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static RETRY_QUEUE_SIZE: OnceCell<Gauge> = OnceCell::new();

static MATCH_REQUESTS_SUBMITTED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static MATCH_DUPLICATE_REJECTED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static MATCH_COMPATIBILITY_SCORE: OnceCell<Histogram> = OnceCell::new();
static MATCH_EXPIRED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static MATCH_FOLLOW_UP_SENT_TOTAL: OnceCell<IntCounter> = OnceCell::new();

static RATE_LIMITED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static BLOCKED_IP_REJECTED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static BLOCKED_IP_COUNT: OnceCell<Gauge> = OnceCell::new();
static MALICIOUS_UA_REJECTED_TOTAL: OnceCell<IntCounter> = OnceCell::new();

static ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static SVC_CAPABILITY_RESOLVE_FAIL_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static SVC_DISPATCH_LATENCY_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static SVC_DISPATCH_ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

/// Helper macro to reduce boilerplate for getting a metric from OnceCell.
/// This will panic if `install()` has not been called, which is intentional
/// as it indicates a critical application setup error.
macro_rules! get_metric {
    ($metric:ident) => {
        $metric
            .get()
            .expect("Prometheus sink not initialized. Call telemetry::prometheus::install() first.")
    };
}

impl ContractMetricsSink for PrometheusSink {
    fn inc_contracts_created(&self, contract_type: &str) {
        get_metric!(CONTRACTS_CREATED_TOTAL)
            .with_label_values(&[contract_type])
            .inc();
    }
    fn inc_state_transition(&self, from: &str, to: &str) {
        get_metric!(CONTRACT_STATE_TRANSITIONS_TOTAL)
            .with_label_values(&[from, to])
            .inc();
    }
    fn inc_transition_rejected(&self, reason: &'static str) {
        get_metric!(CONTRACT_TRANSITION_REJECTED_TOTAL)
            .with_label_values(&[reason])
            .inc();
    }
    fn observe_completion_percentage(&self, pct: f64) {
        get_metric!(CONTRACT_COMPLETION_PERCENTAGE).observe(pct);
    }
    fn set_open_contracts(&self, count: u64) {
        get_metric!(CONTRACTS_OPEN).set(count as f64);
    }
}

impl NotificationMetricsSink for PrometheusSink {
    fn inc_notifications_created(&self, kind: &str) {
        get_metric!(NOTIFICATIONS_CREATED_TOTAL)
            .with_label_values(&[kind])
            .inc();
    }
    fn inc_delivery_attempt(&self, channel: &str, outcome: &'static str) {
        get_metric!(DELIVERY_ATTEMPTS_TOTAL)
            .with_label_values(&[channel, outcome])
            .inc();
    }
    fn inc_suppressed_by_preference(&self, channel: &str) {
        get_metric!(SUPPRESSED_BY_PREFERENCE_TOTAL)
            .with_label_values(&[channel])
            .inc();
    }
    fn observe_dispatch_latency(&self, channel: &str, duration_secs: f64) {
        get_metric!(DISPATCH_LATENCY_SECONDS)
            .with_label_values(&[channel])
            .observe(duration_secs);
    }
    fn set_retry_queue_size(&self, size: f64) {
        get_metric!(RETRY_QUEUE_SIZE).set(size);
    }
}

impl MatchingMetricsSink for PrometheusSink {
    fn inc_match_requests_submitted(&self) {
        get_metric!(MATCH_REQUESTS_SUBMITTED_TOTAL).inc();
    }
    fn inc_duplicate_rejected(&self) {
        get_metric!(MATCH_DUPLICATE_REJECTED_TOTAL).inc();
    }
    fn observe_compatibility_score(&self, score: f64) {
        get_metric!(MATCH_COMPATIBILITY_SCORE).observe(score);
    }
    fn inc_expired(&self, count: u64) {
        get_metric!(MATCH_EXPIRED_TOTAL).inc_by(count);
    }
    fn inc_follow_up_sent(&self) {
        get_metric!(MATCH_FOLLOW_UP_SENT_TOTAL).inc();
    }
}

impl RateLimitMetricsSink for PrometheusSink {
    fn inc_rate_limited(&self, endpoint: &str) {
        get_metric!(RATE_LIMITED_TOTAL)
            .with_label_values(&[endpoint])
            .inc();
    }
    fn inc_blocked_ip_rejected(&self) {
        get_metric!(BLOCKED_IP_REJECTED_TOTAL).inc();
    }
    fn set_blocked_ip_count(&self, count: u64) {
        get_metric!(BLOCKED_IP_COUNT).set(count as f64);
    }
    fn inc_malicious_ua_rejected(&self) {
        get_metric!(MALICIOUS_UA_REJECTED_TOTAL).inc();
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str, variant: &'static str) {
        get_metric!(ERRORS_TOTAL)
            .with_label_values(&[kind, variant])
            .inc();
    }
}

impl ServiceMetricsSink for PrometheusSink {
    fn inc_capability_resolve_fail(&self, capability: &str) {
        get_metric!(SVC_CAPABILITY_RESOLVE_FAIL_TOTAL)
            .with_label_values(&[capability])
            .inc();
    }
    fn observe_service_dispatch_latency(&self, service_id: &str, method: &str, duration_secs: f64) {
        get_metric!(SVC_DISPATCH_LATENCY_SECONDS)
            .with_label_values(&[service_id, method])
            .observe(duration_secs);
    }
    fn inc_dispatch_error(&self, service_id: &str, method: &str, reason: &'static str) {
        get_metric!(SVC_DISPATCH_ERRORS_TOTAL)
            .with_label_values(&[service_id, method, reason])
            .inc();
    }
}

/// Initializes all Prometheus metrics collectors and returns a static reference to the sink.
/// This function must be called only once at application startup.
#[allow(clippy::expect_used)]
pub fn install() -> Result<&'static dyn MetricsSink, prometheus::Error> {
    CONTRACTS_CREATED_TOTAL
        .set(register_int_counter_vec!(
            "rental_contracts_created_total",
            "Total contracts created, labeled by contract type.",
            &["contract_type"]
        )?)
        .expect("static already initialized");
    CONTRACT_STATE_TRANSITIONS_TOTAL
        .set(register_int_counter_vec!(
            "rental_contract_state_transitions_total",
            "Total contract workflow state transitions.",
            &["from", "to"]
        )?)
        .expect("static already initialized");
    CONTRACT_TRANSITION_REJECTED_TOTAL
        .set(register_int_counter_vec!(
            "rental_contract_transition_rejected_total",
            "Total state transitions rejected, labeled by reason.",
            &["reason"]
        )?)
        .expect("static already initialized");
    CONTRACT_COMPLETION_PERCENTAGE
        .set(register_histogram!(
            "rental_contract_completion_percentage",
            "Completion percentage recorded at each state transition.",
            vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]
        )?)
        .expect("static already initialized");
    CONTRACTS_OPEN
        .set(register_gauge!(
            "rental_contracts_open",
            "Current number of contracts in a non-terminal state."
        )?)
        .expect("static already initialized");
    NOTIFICATIONS_CREATED_TOTAL
        .set(register_int_counter_vec!(
            "rental_notifications_created_total",
            "Total notifications created, labeled by kind.",
            &["kind"]
        )?)
        .expect("static already initialized");
    DELIVERY_ATTEMPTS_TOTAL
        .set(register_int_counter_vec!(
            "rental_notification_delivery_attempts_total",
            "Total delivery attempts, labeled by channel and outcome.",
            &["channel", "outcome"]
        )?)
        .expect("static already initialized");
    SUPPRESSED_BY_PREFERENCE_TOTAL
        .set(register_int_counter_vec!(
            "rental_notification_suppressed_by_preference_total",
            "Total deliveries suppressed by recipient preference.",
            &["channel"]
        )?)
        .expect("static already initialized");
    DISPATCH_LATENCY_SECONDS
        .set(register_histogram_vec!(
            "rental_notification_dispatch_latency_seconds",
            "Latency of a single notification dispatch call.",
            &["channel"],
            exponential_buckets(0.001, 2.0, 15)?
        )?)
        .expect("static already initialized");
    RETRY_QUEUE_SIZE
        .set(register_gauge!(
            "rental_notification_retry_queue_size",
            "Current number of notifications queued for retry."
        )?)
        .expect("static already initialized");
    MATCH_REQUESTS_SUBMITTED_TOTAL
        .set(register_int_counter!(
            "rental_match_requests_submitted_total",
            "Total match requests submitted."
        )?)
        .expect("static already initialized");
    MATCH_DUPLICATE_REJECTED_TOTAL
        .set(register_int_counter!(
            "rental_match_duplicate_rejected_total",
            "Total match requests rejected as duplicate-active."
        )?)
        .expect("static already initialized");
    MATCH_COMPATIBILITY_SCORE
        .set(register_histogram!(
            "rental_match_compatibility_score",
            "Computed compatibility scores for submitted match requests.",
            vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]
        )?)
        .expect("static already initialized");
    MATCH_EXPIRED_TOTAL
        .set(register_int_counter!(
            "rental_match_expired_total",
            "Total match requests expired by the daily sweep."
        )?)
        .expect("static already initialized");
    MATCH_FOLLOW_UP_SENT_TOTAL
        .set(register_int_counter!(
            "rental_match_follow_up_sent_total",
            "Total follow-up reminders sent."
        )?)
        .expect("static already initialized");
    RATE_LIMITED_TOTAL
        .set(register_int_counter_vec!(
            "rental_rate_limited_total",
            "Total requests rejected by the sliding-window limiter.",
            &["endpoint"]
        )?)
        .expect("static already initialized");
    BLOCKED_IP_REJECTED_TOTAL
        .set(register_int_counter!(
            "rental_blocked_ip_rejected_total",
            "Total requests rejected because the source IP is blocked."
        )?)
        .expect("static already initialized");
    BLOCKED_IP_COUNT
        .set(register_gauge!(
            "rental_blocked_ip_count",
            "Current number of IPs in the blocked set."
        )?)
        .expect("static already initialized");
    MALICIOUS_UA_REJECTED_TOTAL
        .set(register_int_counter!(
            "rental_malicious_ua_rejected_total",
            "Total requests rejected by the malicious user-agent filter."
        )?)
        .expect("static already initialized");
    ERRORS_TOTAL
        .set(register_int_counter_vec!(
            "rental_errors_total",
            "Total number of errors, categorized by type and variant.",
            &["kind", "variant"]
        )?)
        .expect("static already initialized");
    SVC_CAPABILITY_RESOLVE_FAIL_TOTAL
        .set(register_int_counter_vec!(
            "rental_svc_capability_resolve_fail_total",
            "Total failures to resolve a required service capability.",
            &["capability"]
        )?)
        .expect("static already initialized");
    SVC_DISPATCH_LATENCY_SECONDS
        .set(register_histogram_vec!(
            "rental_service_dispatch_latency_seconds",
            "Latency of dispatched calls to domain services.",
            &["service_id", "method"],
            exponential_buckets(0.0001, 2.0, 16)?
        )?)
        .expect("static already initialized");
    SVC_DISPATCH_ERRORS_TOTAL
        .set(register_int_counter_vec!(
            "rental_service_dispatch_errors_total",
            "Total errors returned from service dispatch calls.",
            &["service_id", "method", "reason"]
        )?)
        .expect("static already initialized");

    static SINK: PrometheusSink = PrometheusSink;
    Ok(&SINK)
}
