//! Error types raised while authenticating and decoding Messenger webhooks.
//!
//! Messages never carry the app secret or computed digests, only the names of
//! the offending fields.

use derive_more::{Display, Error, From};

/// Failures of the origin check performed on `X-Hub-Signature` headers.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[display("missing signature header")]
    MissingSignature,
    #[display("malformed signature header")]
    MalformedSignature,
    #[display("signature does not match payload")]
    SignatureMismatch,
}

impl AuthError {
    /// Short label used for metrics and structured logs
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingSignature => "missing_signature",
            AuthError::MalformedSignature => "malformed_signature",
            AuthError::SignatureMismatch => "signature_mismatch",
        }
    }
}

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyError {
    #[display("event has none of the message, delivery, read or postback keys")]
    UnrecognizedEventShape,
}

/// Failures while extracting the fields of an already classified event.
#[derive(Debug, Display, Error, Clone, PartialEq)]
pub enum ParseError {
    #[display("missing required field `{field}`")]
    MissingRequiredField { field: String },
    #[display("field `{field}` has an unexpected type")]
    InvalidField { field: String },
    #[display("unknown attachment type `{kind}`")]
    UnknownAttachmentType { kind: String },
    #[display("unknown referral source `{value}`")]
    UnknownReferralSource { value: String },
    #[display("field `{field}` is not a finite number: {value}")]
    InvalidCoordinate { field: String, value: String },
}

impl ParseError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        ParseError::MissingRequiredField {
            field: field.into(),
        }
    }

    pub(crate) fn invalid(field: impl Into<String>) -> Self {
        ParseError::InvalidField {
            field: field.into(),
        }
    }
}

/// Anything that prevents a single messaging event from becoming a message.
#[derive(Debug, Display, Error, From, Clone, PartialEq)]
pub enum EventError {
    #[display("could not classify event: {_0}")]
    Classify(ClassifyError),
    #[display("could not parse event: {_0}")]
    Parse(ParseError),
}

#[derive(Debug, Display, Error, Clone, PartialEq)]
pub enum UnwrapError {
    #[display("expected object type `{expected}`, found `{found}`")]
    WrongObjectType { expected: String, found: String },
    #[display("envelope has no entry list")]
    MalformedEnvelope,
    #[display("entry {entry}, messaging event {messaging}: {source}")]
    Item {
        entry: usize,
        messaging: usize,
        source: EventError,
    },
}
