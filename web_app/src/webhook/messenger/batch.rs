//! # Webhook Envelope Unwrapping
//!
//! Messenger batches events: one POST carries several entries, each with
//! several messaging events. [`unwrap_envelope`] flattens them while keeping
//! the order they were delivered in.
//!
//! A malformed event does not sink its siblings. Every failure is kept in
//! [`Batch::errors`] with the indices of the offending event; callers that
//! need all-or-nothing semantics use [`Batch::into_strict`].

use super::{
    classify::classify,
    errors::{EventError, UnwrapError},
    parser::{integer_field, parse, string_field},
    schemas::{Entry, Message},
};
use serde_json::Value;

/// A messaging event that couldn't be turned into a [`Message`]
#[derive(Debug, Clone, PartialEq)]
pub struct ItemError {
    /// Index of the entry in the envelope
    pub entry: usize,
    /// Index of the event in the entry's `messaging` list
    pub messaging: usize,
    pub error: EventError,
}

/// Result of unwrapping one webhook envelope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub entries: Vec<Entry>,
    pub errors: Vec<ItemError>,
}

impl Batch {
    /// Parsed messages in entry order, then delivery order inside each entry
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().flat_map(|entry| entry.messages.iter())
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.entries
            .into_iter()
            .flat_map(|entry| entry.messages)
            .collect()
    }

    /// Whether every messaging event parsed
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// All messages, or the first item failure when any event was malformed
    pub fn into_strict(mut self) -> Result<Vec<Message>, UnwrapError> {
        if self.errors.is_empty() {
            return Ok(self.into_messages());
        }

        let first = self.errors.swap_remove(0);
        Err(UnwrapError::Item {
            entry: first.entry,
            messaging: first.messaging,
            source: first.error,
        })
    }
}

/// Unwraps a webhook envelope into its entries and parsed messages.
///
/// # Arguments
/// * `envelope` - Decoded request body
/// * `expected_object_type` - Value `envelope.object` must have, `"page"` for pages
///
/// # Errors
/// * [`UnwrapError::WrongObjectType`] when `object` differs, before any entry is read
/// * [`UnwrapError::MalformedEnvelope`] when `entry` is missing or not a list
pub fn unwrap_envelope(envelope: &Value, expected_object_type: &str) -> Result<Batch, UnwrapError> {
    let object_type = envelope.get("object").and_then(Value::as_str);
    if object_type != Some(expected_object_type) {
        return Err(UnwrapError::WrongObjectType {
            expected: expected_object_type.to_string(),
            found: object_type.unwrap_or("<missing>").to_string(),
        });
    }

    let raw_entries = envelope
        .get("entry")
        .and_then(Value::as_array)
        .ok_or(UnwrapError::MalformedEnvelope)?;

    let mut batch = Batch::default();
    for (entry_index, raw_entry) in raw_entries.iter().enumerate() {
        let mut entry = read_entry(raw_entry);

        let events = raw_entry
            .get("messaging")
            .and_then(Value::as_array)
            .into_iter()
            .flatten();

        for (messaging_index, event) in events.enumerate() {
            match parse_event(event) {
                Ok(message) => entry.messages.push(message),
                Err(error) => batch.errors.push(ItemError {
                    entry: entry_index,
                    messaging: messaging_index,
                    error,
                }),
            }
        }

        batch.entries.push(entry);
    }

    Ok(batch)
}

/// Classifies and parses a single messaging event
pub fn parse_event(event: &Value) -> Result<Message, EventError> {
    let kind = classify(event)?;
    Ok(parse(kind, event)?)
}

fn read_entry(raw_entry: &Value) -> Entry {
    let changed_fields = raw_entry
        .get("changed_fields")
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let changes = match raw_entry.get("changes") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(changes)) => changes.clone(),
        Some(change) => vec![change.clone()],
    };

    Entry {
        id: string_field(raw_entry, "id"),
        time: integer_field(raw_entry, "time").or_else(|| integer_field(raw_entry, "timestamp")),
        changed_fields,
        changes,
        messages: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhook::messenger::{
        errors::{ClassifyError, ParseError},
        schemas::{MessageKind, MessagePayload},
    };
    use serde_json::json;

    fn text_event(mid: &str) -> Value {
        json!({
            "sender": {"id": "USER_ID"},
            "recipient": {"id": "PAGE_ID"},
            "timestamp": 1458692752478i64,
            "message": {"mid": mid, "text": "hello"},
        })
    }

    #[test]
    fn test_unwrap_envelope_preserves_order() {
        let envelope = json!({
            "object": "page",
            "entry": [
                {"id": "PAGE_ID", "time": 1458692752478i64, "messaging": [text_event("m1"), text_event("m2")]},
                {"id": "PAGE_ID", "time": 1458692752479i64, "messaging": [
                    {"sender": {"id": "USER_ID"}, "recipient": {"id": "PAGE_ID"}, "delivery": {"watermark": 1}},
                ]},
            ],
        });

        let batch = unwrap_envelope(&envelope, "page").unwrap();

        assert!(batch.is_complete());
        assert_eq!(batch.entries.len(), 2);
        assert_eq!(batch.entries[0].id.as_deref(), Some("PAGE_ID"));
        assert_eq!(batch.entries[1].time, Some(1458692752479));

        let kinds: Vec<_> = batch.messages().map(Message::kind).collect();
        assert_eq!(
            kinds,
            vec![MessageKind::Received, MessageKind::Received, MessageKind::Delivered]
        );

        let messages = batch.into_messages();
        let MessagePayload::Received(first) = &messages[0].payload else {
            panic!("expected a received message");
        };
        assert_eq!(first.mid.as_deref(), Some("m1"));
    }

    #[test]
    fn test_unwrap_envelope_wrong_object_type() {
        let envelope = json!({"object": "user", "entry": "not even a list"});

        assert_eq!(
            unwrap_envelope(&envelope, "page"),
            Err(UnwrapError::WrongObjectType {
                expected: "page".into(),
                found: "user".into(),
            })
        );

        assert_eq!(
            unwrap_envelope(&json!({"entry": []}), "page"),
            Err(UnwrapError::WrongObjectType {
                expected: "page".into(),
                found: "<missing>".into(),
            })
        );
    }

    #[test]
    fn test_unwrap_envelope_malformed_entry_list() {
        assert_eq!(
            unwrap_envelope(&json!({"object": "page"}), "page"),
            Err(UnwrapError::MalformedEnvelope)
        );
    }

    #[test]
    fn test_unwrap_envelope_collects_item_errors() {
        let envelope = json!({
            "object": "page",
            "entry": [
                {"id": "1", "messaging": [text_event("m1"), {"optin": {"ref": "x"}}]},
                {"id": "2", "messaging": [{"delivery": {"mids": []}}, text_event("m2")]},
            ],
        });

        let batch = unwrap_envelope(&envelope, "page").unwrap();

        assert!(!batch.is_complete());
        assert_eq!(batch.messages().count(), 2);
        assert_eq!(
            batch.errors,
            vec![
                ItemError {
                    entry: 0,
                    messaging: 1,
                    error: EventError::Classify(ClassifyError::UnrecognizedEventShape),
                },
                ItemError {
                    entry: 1,
                    messaging: 0,
                    error: EventError::Parse(ParseError::MissingRequiredField {
                        field: "delivery.watermark".into()
                    }),
                },
            ]
        );

        assert_eq!(
            batch.into_strict(),
            Err(UnwrapError::Item {
                entry: 0,
                messaging: 1,
                source: EventError::Classify(ClassifyError::UnrecognizedEventShape),
            })
        );
    }

    #[test]
    fn test_unwrap_envelope_strict_success() {
        let envelope = json!({
            "object": "page",
            "entry": [{"id": "1", "messaging": [text_event("m1")]}],
        });

        let messages = unwrap_envelope(&envelope, "page")
            .unwrap()
            .into_strict()
            .unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_read_entry_fields() {
        let entry = read_entry(&json!({
            "id": 1234567890u64,
            "timestamp": 1458692752478i64,
            "changed_fields": ["feed", 3, "conversations"],
            "changes": {"field": "feed"},
        }));

        assert_eq!(entry.id.as_deref(), Some("1234567890"));
        assert_eq!(entry.time, Some(1458692752478));
        assert_eq!(entry.changed_fields, vec!["feed", "conversations"]);
        assert_eq!(entry.changes, vec![json!({"field": "feed"})]);
        assert!(entry.messages.is_empty());

        let bare = read_entry(&json!({"id": "1"}));
        assert!(bare.changed_fields.is_empty());
        assert!(bare.changes.is_empty());
        assert_eq!(bare.time, None);
    }
}
