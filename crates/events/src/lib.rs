//! # BoviTrack Events
//!
//! The user-facing notifications raised by the client auth context
//! (sign-in, registration, sign-out) and the session events that carry them.
//!
//! Depends only on `core-types`.

pub mod error;
pub mod messages;

pub use error::EventsError;
pub use messages::{AuthEvent, Notification, NotificationKind};
