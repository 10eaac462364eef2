//! # Messenger Outgoing Message Schemas
//!
//! Payloads posted to the Send API (`/me/messages`) and the thread settings
//! endpoint. Every builder produces `{"recipient": {"id"}, "message": {...}}`
//! once serialized.

use serde::{Deserialize, Serialize};

/// Message to send through `POST /me/messages`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub recipient: Recipient,
    pub message: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    /// Page scoped user id
    pub id: String,
}

impl Recipient {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<OutgoingAttachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_replies: Option<Vec<QuickReply>>,
}

impl OutgoingMessage {
    fn with_content(user_id: impl Into<String>, message: MessageContent) -> Self {
        Self {
            recipient: Recipient::new(user_id),
            message,
        }
    }

    /// Plain text message
    pub fn text(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_content(
            user_id,
            MessageContent {
                text: Some(text.into()),
                ..Default::default()
            },
        )
    }

    /// Image attachment fetched by Messenger from `url`
    pub fn image(user_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self::with_content(
            user_id,
            MessageContent {
                attachment: Some(OutgoingAttachment::Image { url: url.into() }),
                ..Default::default()
            },
        )
    }

    /// Button template: a text bubble with buttons under it
    pub fn buttons(user_id: impl Into<String>, text: impl Into<String>, buttons: Vec<Button>) -> Self {
        Self::with_content(
            user_id,
            MessageContent {
                attachment: Some(OutgoingAttachment::Template(TemplatePayload::Button {
                    text: text.into(),
                    buttons,
                })),
                ..Default::default()
            },
        )
    }

    /// Generic template: a carousel of elements
    pub fn generic(user_id: impl Into<String>, elements: Vec<GenericElement>) -> Self {
        Self::with_content(
            user_id,
            MessageContent {
                attachment: Some(OutgoingAttachment::Template(TemplatePayload::Generic {
                    elements,
                })),
                ..Default::default()
            },
        )
    }

    /// Text message offering quick replies
    pub fn quick_replies(
        user_id: impl Into<String>,
        text: impl Into<String>,
        replies: Vec<QuickReply>,
    ) -> Self {
        Self::with_content(
            user_id,
            MessageContent {
                text: Some(text.into()),
                quick_replies: Some(replies),
                ..Default::default()
            },
        )
    }
}

/// Attachment of an outgoing message, serialized as `{"type", "payload"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum OutgoingAttachment {
    Image { url: String },
    Template(TemplatePayload),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "template_type", rename_all = "snake_case")]
pub enum TemplatePayload {
    Button { text: String, buttons: Vec<Button> },
    Generic { elements: Vec<GenericElement> },
}

/// Action button of a button template or generic element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Button {
    /// Opens `url` in the in-app browser
    WebUrl {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        title: String,
        url: String,
    },
    /// Sends a postback event carrying `payload` to the webhook
    Postback {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        title: String,
        payload: String,
    },
}

impl Button {
    pub fn web_url(title: impl Into<String>, url: impl Into<String>) -> Self {
        Button::WebUrl {
            title: title.into(),
            url: url.into(),
        }
    }

    pub fn postback(title: impl Into<String>, payload: impl Into<String>) -> Self {
        Button::Postback {
            title: title.into(),
            payload: payload.into(),
        }
    }
}

/// Card of a generic template. The button list is always serialized, even when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenericElement {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "is_blank")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

impl GenericElement {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn button(mut self, button: Button) -> Self {
        self.buttons.push(button);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[default]
    Text,
    /// Asks the user to share their location
    Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickReply {
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    pub payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl QuickReply {
    /// Text quick reply
    pub fn new(title: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Text,
            title: title.into(),
            payload: payload.into(),
            image_url: None,
        }
    }

    /// Quick reply asking for the user location
    pub fn location(payload: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Location,
            title: String::new(),
            payload: payload.into(),
            image_url: None,
        }
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

/// Typing indicator or read marker, posted to `/me/messages`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderActionRequest {
    pub recipient: Recipient,
    pub sender_action: SenderAction,
}

impl SenderActionRequest {
    pub fn new(user_id: impl Into<String>, sender_action: SenderAction) -> Self {
        Self {
            recipient: Recipient::new(user_id),
            sender_action,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderAction {
    TypingOn,
    TypingOff,
    MarkSeen,
}

/// Page level setting posted to `/me/thread_settings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "setting_type", rename_all = "snake_case")]
pub enum ThreadSetting {
    /// Text shown before the user starts a conversation
    Greeting { greeting: GreetingText },
    /// Get-started button of new threads
    CallToActions {
        thread_state: String,
        call_to_actions: Vec<CallToAction>,
    },
}

impl ThreadSetting {
    pub fn greeting(text: impl Into<String>) -> Self {
        ThreadSetting::Greeting {
            greeting: GreetingText { text: text.into() },
        }
    }

    pub fn get_started(payload: impl Into<String>) -> Self {
        ThreadSetting::CallToActions {
            thread_state: "new_thread".to_string(),
            call_to_actions: vec![CallToAction {
                payload: payload.into(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreetingText {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToAction {
    pub payload: String,
}

/// Response of the Send API
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SendResponse {
    pub recipient_id: Option<String>,
    pub message_id: Option<String>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}
