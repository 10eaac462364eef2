use crate::config::AppConfig;
use anyhow::Context;
use messenger_bot::webhook::messenger::{
    batch::unwrap_envelope,
    client::{MessengerClient, ReqwestTransport},
    security::{self, SignatureAlgorithm},
};
use serde_json::Value;

pub fn messenger_client(app_config: &AppConfig) -> anyhow::Result<MessengerClient> {
    if app_config.is_prod() {
        println!("Using the production page access token");
    }

    let transport =
        ReqwestTransport::new(&app_config.graph_api_version, app_config.access_token()?)?;

    Ok(MessengerClient::new(Box::new(transport)))
}

pub fn read_payload(file_name: &str) -> anyhow::Result<Vec<u8>> {
    std::fs::read(file_name).with_context(|| format!("failed to read {file_name}"))
}

/// Header value Meta would send for the payload
pub fn sign_payload(secret: &str, body: &[u8], algorithm: &str) -> anyhow::Result<String> {
    let algorithm = SignatureAlgorithm::from_name(algorithm)
        .with_context(|| format!("unsupported algorithm {algorithm}, use sha1 or sha256"))?;

    security::sign(secret.as_bytes(), body, algorithm)
        .map_err(|e| anyhow::anyhow!("failed to sign payload: {e}"))
}

/// One line per parsed message and per rejected event
pub fn describe_payload(body: &[u8], object_type: &str) -> anyhow::Result<Vec<String>> {
    let envelope: Value = serde_json::from_slice(body).context("payload is not valid JSON")?;
    let batch = unwrap_envelope(&envelope, object_type)?;

    let mut lines: Vec<String> = batch
        .messages()
        .map(|message| {
            format!(
                "{kind} from {sender}",
                kind = message.kind().as_str(),
                sender = message.sender.id.as_deref().unwrap_or("<unknown>")
            )
        })
        .collect();

    lines.extend(batch.errors.iter().map(|item| {
        format!(
            "entry {} event {}: {}",
            item.entry, item.messaging, item.error
        )
    }));

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &[u8] = br#"{"object":"page","entry":[{"id":"P","time":1,"messaging":[
        {"sender":{"id":"U1"},"recipient":{"id":"P"},"message":{"mid":"m1","text":"hi"}},
        {"sender":{"id":"U1"},"recipient":{"id":"P"},"read":{"watermark":5}}
    ]}]}"#;

    #[test]
    fn test_sign_payload() {
        let header = sign_payload("secret", PAYLOAD, "sha256").unwrap();
        assert!(header.starts_with("sha256="));
        assert!(security::verify(b"secret", PAYLOAD, Some(&header)).is_ok());

        assert!(sign_payload("secret", PAYLOAD, "md5").is_err());
    }

    #[test]
    fn test_describe_payload() {
        assert_eq!(
            describe_payload(PAYLOAD, "page").unwrap(),
            vec!["received from U1".to_string(), "read from U1".to_string()]
        );
        assert!(describe_payload(PAYLOAD, "user").is_err());
    }

    #[test]
    fn test_describe_payload_reports_bad_events() {
        let payload = br#"{"object":"page","entry":[{"messaging":[{"delivery":{"mids":["m1"]}}]}]}"#;

        assert_eq!(
            describe_payload(payload, "page").unwrap(),
            vec!["entry 0 event 0: could not parse event: missing required field `delivery.watermark`".to_string()]
        );
    }
}
