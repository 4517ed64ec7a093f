use crate::error::EventsError;
use chrono::{DateTime, Utc};
use core_types::SessionUser;
use serde::{Deserialize, Serialize};

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// A short localized message for the person using the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub timestamp: DateTime<Utc>,
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }
}

/// Everything the auth context broadcasts to its subscribers.
///
/// Serialized as `{"type": "...", "payload": ...}`, e.g.
/// `{"type":"Notification","payload":{"timestamp":"...","kind":"success","message":"..."}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum AuthEvent {
    /// A user became the current session user.
    SignedIn(SessionUser),
    /// The current session was cleared.
    SignedOut,
    Notification(Notification),
}

impl AuthEvent {
    pub fn to_json(&self) -> Result<String, EventsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// The notification carried by this event, if any.
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            AuthEvent::Notification(notification) => Some(notification),
            _ => None,
        }
    }
}
