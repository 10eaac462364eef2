use opentelemetry::{KeyValue, metrics::UpDownCounter};
use std::sync::LazyLock;

static STATDS: LazyLock<UpDownCounter<i64>> = LazyLock::new(|| {
    logfire::i64_up_down_counter("messenger_bot_statds")
        .with_description("Messenger bot webhook and send statistics")
        .with_unit("event")
        .build()
});

fn incr_statds(metric: &'static str, value: &str) {
    STATDS.add(1, &[KeyValue::new(metric, value.to_string())]);
}

/// Counts a parsed webhook event by kind
pub fn incr_webhook_event_statds(kind: &str) {
    incr_statds("webhook_event", kind)
}

/// Counts a rejected webhook request by reason
pub fn incr_webhook_rejection_statds(reason: &str) {
    incr_statds("webhook_rejection", reason)
}

/// Counts a webhook request accepted without checking its signature
pub fn incr_webhook_unverified_statds() {
    incr_statds("webhook_unverified", "origin_not_enforced")
}

/// Counts a message that never reached the reply worker, by reason
pub fn incr_reply_dropped_statds(reason: &str) {
    incr_statds("reply_dropped", reason)
}

/// Counts an outbound Send API call by kind and outcome
pub fn incr_outbound_send_statds(kind: &str, outcome: &str) {
    STATDS.add(
        1,
        &[
            KeyValue::new("outbound_send", kind.to_string()),
            KeyValue::new("outcome", outcome.to_string()),
        ],
    );
}
