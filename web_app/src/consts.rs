pub const GRAPH_API_HOST: &str = "https://graph.facebook.com";

/// Largest webhook body accepted by the POST route
pub const MAX_WEBHOOK_BODY_BYTES: usize = 1_048_576;

/// Seconds before an outbound Graph API request gives up
pub const GRAPH_API_TIMEOUT_SECS: u64 = 10;

/// Messages waiting for a reply before new ones are dropped
pub const REPLY_QUEUE_CAPACITY: usize = 4096;
