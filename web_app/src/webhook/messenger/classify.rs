//! Decides which kind of event a raw messaging object represents.
//!
//! Messenger marks the kind by which top-level key is present. When several of
//! them are set, the last one in [`KIND_KEYS`] wins; the platform has always
//! resolved ambiguous events this way, so the order here is load bearing.

use super::{errors::ClassifyError, schemas::MessageKind};
use serde_json::Value;

/// Keys scanned in order; a later match overrides an earlier one.
const KIND_KEYS: [(&str, MessageKind); 4] = [
    ("message", MessageKind::Received),
    ("delivery", MessageKind::Delivered),
    ("read", MessageKind::Read),
    ("postback", MessageKind::Postback),
];

/// Returns the kind of a messaging event.
///
/// A `message` event is an [`MessageKind::Echo`] when `message.is_echo` is set,
/// otherwise [`MessageKind::Received`].
///
/// # Errors
/// [`ClassifyError::UnrecognizedEventShape`] when none of the kind keys holds a
/// non-empty value.
pub fn classify(event: &Value) -> Result<MessageKind, ClassifyError> {
    let guess = KIND_KEYS
        .iter()
        .filter(|(key, _)| event.get(*key).is_some_and(is_truthy))
        .map(|(_, kind)| *kind)
        .last()
        .ok_or(ClassifyError::UnrecognizedEventShape)?;

    if guess != MessageKind::Received {
        return Ok(guess);
    }

    let is_echo = event
        .get("message")
        .and_then(|message| message.get("is_echo"))
        .is_some_and(is_truthy);

    Ok(if is_echo {
        MessageKind::Echo
    } else {
        MessageKind::Received
    })
}

/// Whether a JSON value counts as set: null, `false`, zero and empty
/// strings, arrays or objects do not.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_single_keys() {
        let cases = [
            (json!({"message": {"mid": "m1", "text": "hi"}}), MessageKind::Received),
            (json!({"delivery": {"watermark": 1}}), MessageKind::Delivered),
            (json!({"read": {"watermark": 1}}), MessageKind::Read),
            (json!({"postback": {"payload": "GET_STARTED"}}), MessageKind::Postback),
        ];

        for (event, expected) in cases {
            assert_eq!(classify(&event), Ok(expected), "event: {event}");
        }
    }

    #[test]
    fn test_classify_last_match_wins() {
        let event = json!({
            "postback": {"payload": "P"},
            "message": {"mid": "m1"},
        });
        assert_eq!(classify(&event), Ok(MessageKind::Postback));

        let event = json!({"message": {"mid": "m1"}, "delivery": {"watermark": 1}});
        assert_eq!(classify(&event), Ok(MessageKind::Delivered));

        let event = json!({"read": {"watermark": 1}, "delivery": {"watermark": 1}});
        assert_eq!(classify(&event), Ok(MessageKind::Read));

        let event = json!({
            "message": {"mid": "m1"},
            "delivery": {"watermark": 1},
            "read": {"watermark": 1},
            "postback": {"payload": "P"},
        });
        assert_eq!(classify(&event), Ok(MessageKind::Postback));
    }

    #[test]
    fn test_classify_empty_values_do_not_match() {
        let event = json!({"message": {"mid": "m1"}, "postback": {}});
        assert_eq!(classify(&event), Ok(MessageKind::Received));

        let event = json!({"delivery": null, "read": {"watermark": 5}});
        assert_eq!(classify(&event), Ok(MessageKind::Read));
    }

    #[test]
    fn test_classify_echo_flag() {
        let echo = json!({"message": {"mid": "m1", "is_echo": true}});
        assert_eq!(classify(&echo), Ok(MessageKind::Echo));

        let not_echo = json!({"message": {"mid": "m1", "is_echo": false}});
        assert_eq!(classify(&not_echo), Ok(MessageKind::Received));

        let absent = json!({"message": {"mid": "m1"}});
        assert_eq!(classify(&absent), Ok(MessageKind::Received));
    }

    #[test]
    fn test_classify_unrecognized() {
        for event in [
            json!({}),
            json!({"optin": {"ref": "x"}}),
            json!({"message": {}}),
            json!("message"),
            json!(null),
        ] {
            assert_eq!(
                classify(&event),
                Err(ClassifyError::UnrecognizedEventShape),
                "event: {event}"
            );
        }
    }

    #[test]
    fn test_is_truthy() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1.5)));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!([0])));
        assert!(is_truthy(&json!({"a": null})));
    }
}
