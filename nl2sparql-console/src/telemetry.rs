//! Metric names emitted by the console. Recording goes through the `metrics`
//! facade; without an installed recorder every call is a no-op.

pub const ACTION_COUNTER: &str = "console.action";
pub const ACTION_LATENCY: &str = "console.action.latency_ms";
pub const POLL_COUNTER: &str = "console.poll";
pub const TOKEN_GAUGE: &str = "console.token.seconds_remaining";

/// Outcome labels shared by actions and polls.
pub mod outcome {
    pub const SUCCESS: &str = "success";
    pub const REMOTE_FAILURE: &str = "remote_failure";
    pub const REJECTED: &str = "rejected";
    pub const STALE: &str = "stale";
    pub const DECLINED: &str = "declined";
}

pub fn record_action(action: &'static str, outcome: &'static str, elapsed_ms: Option<f64>) {
    metrics::counter!(ACTION_COUNTER, "action" => action, "outcome" => outcome).increment(1);
    if let Some(elapsed_ms) = elapsed_ms {
        metrics::histogram!(ACTION_LATENCY, "action" => action).record(elapsed_ms);
    }
}

pub fn record_poll(feed: &'static str, reason: &'static str, outcome: &'static str) {
    metrics::counter!(POLL_COUNTER, "feed" => feed, "reason" => reason, "outcome" => outcome)
        .increment(1);
}

pub fn record_token_seconds(seconds_remaining: i64) {
    metrics::gauge!(TOKEN_GAUGE).set(seconds_remaining.max(0) as f64);
}
