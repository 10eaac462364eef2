//! # Messaging Event Parser
//!
//! Turns a classified messaging event into a [`Message`]. Optional fields of
//! the wrong JSON type are treated as absent; required ones fail with a
//! [`ParseError`] naming the dotted path of the field.

use super::{
    classify::is_truthy,
    errors::ParseError,
    schemas::{
        Attachment, Coordinates, Delivery, EchoMessage, Entity, Fallback, Message, MessageKind,
        MessagePayload, Postback, ReadReceipt, ReceivedMessage, Referral, ReferralSource,
        Template, TemplateButton, TemplateType,
    },
};
use serde_json::Value;

/// Parses `event` as a message of the given kind.
///
/// # Arguments
/// * `kind` - Kind returned by [`super::classify::classify`]
/// * `event` - One element of an entry's `messaging` list
///
/// # Errors
/// Returns a [`ParseError`] when a required field is missing or malformed, an
/// attachment has an unknown type or a referral an unknown source.
pub fn parse(kind: MessageKind, event: &Value) -> Result<Message, ParseError> {
    let payload = match kind {
        MessageKind::Received => {
            MessagePayload::Received(parse_received(section(event, "message")?)?)
        }
        MessageKind::Echo => MessagePayload::Echo(parse_echo(section(event, "message")?)?),
        MessageKind::Delivered => {
            MessagePayload::Delivered(parse_delivery(section(event, "delivery")?)?)
        }
        MessageKind::Read => MessagePayload::Read(parse_read(section(event, "read")?)?),
        MessageKind::Postback => {
            MessagePayload::Postback(parse_postback(section(event, "postback")?)?)
        }
    };

    Ok(Message {
        sender: parse_entity(event.get("sender")),
        recipient: parse_entity(event.get("recipient")),
        timestamp: integer_field(event, "timestamp"),
        payload,
    })
}

fn section<'a>(event: &'a Value, key: &str) -> Result<&'a Value, ParseError> {
    event
        .get(key)
        .filter(|value| value.is_object())
        .ok_or_else(|| ParseError::missing(key))
}

fn parse_entity(value: Option<&Value>) -> Entity {
    Entity {
        id: value.and_then(|entity| string_field(entity, "id")),
        ..Default::default()
    }
}

fn parse_received(message: &Value) -> Result<ReceivedMessage, ParseError> {
    Ok(ReceivedMessage {
        mid: string_field(message, "mid"),
        text: string_field(message, "text"),
        quick_reply_payload: message
            .get("quick_reply")
            .and_then(|reply| string_field(reply, "payload")),
        attachments: parse_attachments(message)?,
    })
}

fn parse_echo(message: &Value) -> Result<EchoMessage, ParseError> {
    let received = parse_received(message)?;

    Ok(EchoMessage {
        mid: received.mid,
        text: received.text,
        quick_reply_payload: received.quick_reply_payload,
        attachments: received.attachments,
        app_id: string_field(message, "app_id"),
        metadata: string_field(message, "metadata"),
    })
}

fn parse_delivery(delivery: &Value) -> Result<Delivery, ParseError> {
    let mids = match delivery.get("mids") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(mids)) => mids
            .iter()
            .map(as_string)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ParseError::invalid("delivery.mids"))?,
        Some(_) => return Err(ParseError::invalid("delivery.mids")),
    };

    Ok(Delivery {
        mids,
        watermark: required_integer(delivery, "watermark", "delivery.watermark")?,
        seq: integer_field(delivery, "seq"),
    })
}

fn parse_read(read: &Value) -> Result<ReadReceipt, ParseError> {
    Ok(ReadReceipt {
        watermark: required_integer(read, "watermark", "read.watermark")?,
        seq: integer_field(read, "seqs"),
    })
}

fn parse_postback(postback: &Value) -> Result<Postback, ParseError> {
    let payload = match postback.get("payload") {
        None | Some(Value::Null) => return Err(ParseError::missing("postback.payload")),
        Some(value) => as_string(value).ok_or_else(|| ParseError::invalid("postback.payload"))?,
    };

    Ok(Postback {
        payload,
        title: string_field(postback, "title"),
        referral: parse_referral(postback)?,
    })
}

/// Reads `postback.referral`, falling back to the misspelt `referal` key older
/// integrations relied on. An empty referral object means no referral.
fn parse_referral(postback: &Value) -> Result<Option<Referral>, ParseError> {
    let raw = postback
        .get("referral")
        .filter(|value| is_truthy(value))
        .or_else(|| postback.get("referal").filter(|value| is_truthy(value)));

    let Some(raw) = raw else {
        return Ok(None);
    };

    let source = string_field(raw, "source").unwrap_or_default();
    let Some(referral_source) = ReferralSource::from_wire(&source) else {
        return Err(ParseError::UnknownReferralSource { value: source });
    };

    Ok(Some(Referral {
        source: referral_source,
        ref_param: string_field(raw, "ref"),
        ad_id: string_field(raw, "ad_id"),
    }))
}

fn parse_attachments(message: &Value) -> Result<Vec<Attachment>, ParseError> {
    match message.get("attachments") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(attachments)) => attachments
            .iter()
            .enumerate()
            .map(|(index, attachment)| {
                parse_attachment(attachment, &format!("message.attachments[{index}]"))
            })
            .collect(),
        Some(_) => Err(ParseError::invalid("message.attachments")),
    }
}

/// Parses one attachment; `path` locates it inside the event for error messages.
fn parse_attachment(attachment: &Value, path: &str) -> Result<Attachment, ParseError> {
    let kind = attachment
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("<missing>");

    match kind {
        "image" => Ok(Attachment::Image(media_url(attachment, path)?)),
        "audio" => Ok(Attachment::Audio(media_url(attachment, path)?)),
        "video" => Ok(Attachment::Video(media_url(attachment, path)?)),
        "file" => Ok(Attachment::File(media_url(attachment, path)?)),
        "location" => Ok(Attachment::Location(parse_coordinates(attachment, path)?)),
        "template" => Ok(Attachment::Template(parse_template(
            attachment.get("payload"),
        ))),
        // fallback attachments keep their fields at the top level, not under `payload`
        "fallback" => Ok(Attachment::Fallback(Fallback {
            title: string_field(attachment, "title"),
            url: string_field(attachment, "url"),
            payload: string_field(attachment, "payload"),
        })),
        other => Err(ParseError::UnknownAttachmentType {
            kind: other.to_string(),
        }),
    }
}

fn media_url(attachment: &Value, path: &str) -> Result<String, ParseError> {
    attachment
        .get("payload")
        .and_then(|payload| string_field(payload, "url"))
        .ok_or_else(|| ParseError::missing(format!("{path}.payload.url")))
}

fn parse_coordinates(attachment: &Value, path: &str) -> Result<Coordinates, ParseError> {
    let payload = attachment
        .get("payload")
        .filter(|payload| payload.is_object())
        .ok_or_else(|| ParseError::missing(format!("{path}.payload")))?;

    // current API versions nest the pair under `coordinates`
    let (source, prefix) = match payload.get("coordinates") {
        Some(nested) if payload.get("lat").is_none() && nested.is_object() => {
            (nested, format!("{path}.payload.coordinates"))
        }
        _ => (payload, format!("{path}.payload")),
    };

    Ok(Coordinates {
        lat: coordinate(source, "lat", &prefix)?,
        long: coordinate(source, "long", &prefix)?,
    })
}

fn coordinate(source: &Value, key: &str, prefix: &str) -> Result<f64, ParseError> {
    let field = format!("{prefix}.{key}");
    let value = match source.get(key) {
        None | Some(Value::Null) => return Err(ParseError::missing(field)),
        Some(value) => value,
    };

    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    number
        .filter(|number| number.is_finite())
        .ok_or_else(|| ParseError::InvalidCoordinate {
            field,
            value: value.to_string(),
        })
}

fn parse_template(payload: Option<&Value>) -> Template {
    let Some(payload) = payload else {
        return Template::default();
    };

    Template {
        template_type: string_field(payload, "template_type")
            .map(|template_type| TemplateType::from_wire(&template_type)),
        buttons: payload
            .get("buttons")
            .and_then(Value::as_array)
            .map(|buttons| buttons.iter().map(parse_template_button).collect())
            .unwrap_or_default(),
    }
}

fn parse_template_button(button: &Value) -> TemplateButton {
    TemplateButton {
        button_type: string_field(button, "type"),
        title: string_field(button, "title"),
        url: string_field(button, "url"),
        payload: string_field(button, "payload"),
    }
}

/// Strings are taken as is and numbers by their decimal form, since ids
/// arrive as either depending on the API version.
fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

pub(crate) fn string_field(object: &Value, key: &str) -> Option<String> {
    object.get(key).and_then(as_string)
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn integer_field(object: &Value, key: &str) -> Option<i64> {
    object.get(key).and_then(as_integer)
}

fn required_integer(object: &Value, key: &str, path: &str) -> Result<i64, ParseError> {
    match object.get(key) {
        None | Some(Value::Null) => Err(ParseError::missing(path)),
        Some(value) => as_integer(value).ok_or_else(|| ParseError::invalid(path)),
    }
}
