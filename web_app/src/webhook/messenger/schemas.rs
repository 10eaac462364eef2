//! # Messenger Inbound Schemas
//!
//! Typed representation of the events Messenger delivers to the page webhook.
//! Values are built by [`super::parser`] out of loosely structured JSON, so every
//! variant only holds the fields that make sense for its kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The five event kinds a messaging event can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A message written by the user
    Received,
    /// Copy of a message the page itself sent
    Echo,
    /// Delivery receipt
    Delivered,
    /// Read receipt
    Read,
    /// Button or get-started tap
    Postback,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Received => "received",
            MessageKind::Echo => "echo",
            MessageKind::Delivered => "delivered",
            MessageKind::Read => "read",
            MessageKind::Postback => "postback",
        }
    }
}

/// Sender or recipient of an event.
///
/// Webhook payloads only carry the id; the profile fields stay empty until
/// [`Entity::hydrate`] copies a fetched [`UserProfile`] into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Entity {
    /// Page scoped id
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_pic: Option<String>,
    pub locale: Option<String>,
    /// Offset from UTC in hours
    pub timezone: Option<f64>,
    pub gender: Option<String>,
    pub is_payment_enabled: Option<bool>,
    pub last_ad_referral: Option<AdReferral>,
}

impl Entity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// An entity only counts as present when it has an id
    pub fn is_present(&self) -> bool {
        self.id.is_some()
    }

    /// Copies the profile fields returned by the Graph API into this entity.
    /// The id is left untouched.
    pub fn hydrate(&mut self, profile: UserProfile) {
        self.first_name = profile.first_name;
        self.last_name = profile.last_name;
        self.profile_pic = profile.profile_pic;
        self.locale = profile.locale;
        self.timezone = profile.timezone;
        self.gender = profile.gender;
        self.is_payment_enabled = profile.is_payment_enabled;
        self.last_ad_referral = profile.last_ad_referral;
    }
}

/// User profile as answered by `GET /<user_id>?fields=...`.
///
/// Fields the API adds later are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_pic: Option<String>,
    pub locale: Option<String>,
    pub timezone: Option<f64>,
    pub gender: Option<String>,
    pub is_payment_enabled: Option<bool>,
    pub last_ad_referral: Option<AdReferral>,
}

/// Last ad the user clicked before opening the conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdReferral {
    pub source: Option<String>,
    #[serde(rename = "type")]
    pub referral_type: Option<String>,
    pub ad_id: Option<String>,
}

/// Latitude and longitude of a shared location, both finite
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub long: f64,
}

/// File or structured content attached to a message
#[derive(Debug, Clone, PartialEq)]
pub enum Attachment {
    /// Url of the image
    Image(String),
    /// Url of the audio clip
    Audio(String),
    /// Url of the video
    Video(String),
    /// Url of the file
    File(String),
    Location(Coordinates),
    Template(Template),
    /// Shared content Messenger can't represent natively (e.g. a link)
    Fallback(Fallback),
}

impl Attachment {
    /// Wire name of the attachment type
    pub fn kind_name(&self) -> &'static str {
        match self {
            Attachment::Image(_) => "image",
            Attachment::Audio(_) => "audio",
            Attachment::Video(_) => "video",
            Attachment::File(_) => "file",
            Attachment::Location(_) => "location",
            Attachment::Template(_) => "template",
            Attachment::Fallback(_) => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateType {
    Generic,
    Button,
    Receipt,
    Other(String),
}

impl TemplateType {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "generic" => TemplateType::Generic,
            "button" => TemplateType::Button,
            "receipt" => TemplateType::Receipt,
            other => TemplateType::Other(other.to_string()),
        }
    }
}

/// Structured template echoed back inside an attachment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    pub template_type: Option<TemplateType>,
    pub buttons: Vec<TemplateButton>,
}

/// Button found in an inbound template; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateButton {
    pub button_type: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fallback {
    pub title: Option<String>,
    pub url: Option<String>,
    pub payload: Option<String>,
}

/// How the user entered the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferralSource {
    /// m.me link
    Shortlink,
    /// Click-to-Messenger ad
    Ads,
    /// Parametric Messenger code
    MessengerCode,
    DiscoverTab,
}

impl ReferralSource {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "SHORTLINK" => Some(ReferralSource::Shortlink),
            "ADS" => Some(ReferralSource::Ads),
            "MESSENGER_CODE" => Some(ReferralSource::MessengerCode),
            "DISCOVER_TAB" => Some(ReferralSource::DiscoverTab),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralSource::Shortlink => "SHORTLINK",
            ReferralSource::Ads => "ADS",
            ReferralSource::MessengerCode => "MESSENGER_CODE",
            ReferralSource::DiscoverTab => "DISCOVER_TAB",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Referral {
    pub source: ReferralSource,
    /// `ref` parameter of the link or code
    pub ref_param: Option<String>,
    pub ad_id: Option<String>,
}

/// Message written by the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceivedMessage {
    pub mid: Option<String>,
    pub text: Option<String>,
    pub quick_reply_payload: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// Copy of a message sent by the page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EchoMessage {
    pub mid: Option<String>,
    pub text: Option<String>,
    pub quick_reply_payload: Option<String>,
    pub attachments: Vec<Attachment>,
    /// App that sent the original message
    pub app_id: Option<String>,
    /// Developer metadata attached when sending
    pub metadata: Option<String>,
}

/// Delivery receipt; every message before `watermark` was delivered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    pub mids: Vec<String>,
    pub watermark: i64,
    pub seq: Option<i64>,
}

/// Read receipt; every message before `watermark` was read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadReceipt {
    pub watermark: i64,
    /// Read from the `seqs` key
    pub seq: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Postback {
    pub payload: String,
    pub title: Option<String>,
    pub referral: Option<Referral>,
}

/// Kind specific content of a [`Message`]
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePayload {
    Received(ReceivedMessage),
    Echo(EchoMessage),
    Delivered(Delivery),
    Read(ReadReceipt),
    Postback(Postback),
}

/// One parsed messaging event
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub sender: Entity,
    pub recipient: Entity,
    /// Milliseconds since the epoch
    pub timestamp: Option<i64>,
    pub payload: MessagePayload,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self.payload {
            MessagePayload::Received(_) => MessageKind::Received,
            MessagePayload::Echo(_) => MessageKind::Echo,
            MessagePayload::Delivered(_) => MessageKind::Delivered,
            MessagePayload::Read(_) => MessageKind::Read,
            MessagePayload::Postback(_) => MessageKind::Postback,
        }
    }

    /// Event timestamp as a UTC datetime
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(DateTime::from_timestamp_millis)
    }

    /// Text of a received or echoed message
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            MessagePayload::Received(received) => received.text.as_deref(),
            MessagePayload::Echo(echo) => echo.text.as_deref(),
            _ => None,
        }
    }
}

/// One batch unit of the webhook envelope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    /// Page id
    pub id: Option<String>,
    pub time: Option<i64>,
    pub changed_fields: Vec<String>,
    pub changes: Vec<serde_json::Value>,
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_presence_depends_on_id() {
        assert!(!Entity::default().is_present());
        assert!(Entity::new("42").is_present());
    }

    #[test]
    fn test_entity_hydrate_keeps_id_and_ignores_unknown_fields() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"first_name":"Ada","last_name":"Lovelace","timezone":-3,"locale":"en_GB","favourite_colour":"green"}"#,
        )
        .unwrap();

        let mut entity = Entity::new("1234");
        entity.hydrate(profile);

        assert_eq!(entity.id.as_deref(), Some("1234"));
        assert_eq!(entity.first_name.as_deref(), Some("Ada"));
        assert_eq!(entity.last_name.as_deref(), Some("Lovelace"));
        assert_eq!(entity.timezone, Some(-3.0));
        assert_eq!(entity.locale.as_deref(), Some("en_GB"));
        assert_eq!(entity.gender, None);
    }

    #[test]
    fn test_message_sent_at_from_millis() {
        let message = Message {
            sender: Entity::new("1"),
            recipient: Entity::new("2"),
            timestamp: Some(1_458_692_752_478),
            payload: MessagePayload::Read(ReadReceipt {
                watermark: 1_458_668_856_253,
                seq: None,
            }),
        };

        let sent_at = message.sent_at().unwrap();
        assert_eq!(sent_at.timestamp(), 1_458_692_752);
        assert_eq!(message.kind(), MessageKind::Read);
        assert_eq!(message.text(), None);
    }

    #[test]
    fn test_referral_source_wire_names() {
        for source in [
            ReferralSource::Shortlink,
            ReferralSource::Ads,
            ReferralSource::MessengerCode,
            ReferralSource::DiscoverTab,
        ] {
            assert_eq!(ReferralSource::from_wire(source.as_str()), Some(source));
        }
        assert_eq!(ReferralSource::from_wire("shortlink"), None);
    }
}
