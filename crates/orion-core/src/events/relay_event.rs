//! Relay events - the messages carried between producers and consumers
//!
//! Payloads are JSON. Decoding is the validation boundary: anything that
//! fails here is a poison message and is never applied.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::entities::validate_content;
use crate::error::DomainError;
use crate::value_objects::{SubjectId, UserId};

/// Like or unlike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeAction {
    Like,
    Unlike,
}

/// Engagement event for a (user, subject) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LikeEvent {
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub action: LikeAction,
}

impl LikeEvent {
    pub fn like(user_id: UserId, subject_id: SubjectId) -> Self {
        Self {
            user_id,
            subject_id,
            action: LikeAction::Like,
        }
    }

    pub fn unlike(user_id: UserId, subject_id: SubjectId) -> Self {
        Self {
            user_id,
            subject_id,
            action: LikeAction::Unlike,
        }
    }
}

/// Golden comment admitted by the seat reservation, awaiting persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct GoldenCommentEvent {
    pub user_id: UserId,
    pub subject_id: SubjectId,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

impl GoldenCommentEvent {
    pub fn new(user_id: UserId, subject_id: SubjectId, content: impl Into<String>) -> Self {
        Self {
            user_id,
            subject_id,
            content: content.into(),
        }
    }
}

/// Which stream an event travels on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Like,
    GoldenComment,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::Like, EventKind::GoldenComment];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::GoldenComment => "golden_comment",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated relay message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    Like(LikeEvent),
    GoldenComment(GoldenCommentEvent),
}

impl RelayEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Like(_) => EventKind::Like,
            Self::GoldenComment(_) => EventKind::GoldenComment,
        }
    }

    pub fn subject_id(&self) -> SubjectId {
        match self {
            Self::Like(e) => e.subject_id,
            Self::GoldenComment(e) => e.subject_id,
        }
    }

    pub fn user_id(&self) -> UserId {
        match self {
            Self::Like(e) => e.user_id,
            Self::GoldenComment(e) => e.user_id,
        }
    }

    /// Decode and validate a payload received on the stream for `kind`
    pub fn decode(kind: EventKind, payload: &[u8]) -> Result<Self, DomainError> {
        let event = match kind {
            EventKind::Like => {
                let event: LikeEvent = serde_json::from_slice(payload).map_err(poison)?;
                Self::Like(event)
            }
            EventKind::GoldenComment => {
                let event: GoldenCommentEvent =
                    serde_json::from_slice(payload).map_err(poison)?;
                event
                    .validate()
                    .map_err(|e| DomainError::PoisonMessage(e.to_string()))?;
                validate_content(&event.content)
                    .map_err(|e| DomainError::PoisonMessage(e.to_string()))?;
                Self::GoldenComment(event)
            }
        };
        event.check_ids()?;
        Ok(event)
    }

    /// Encode as a JSON payload
    pub fn encode(&self) -> Result<Vec<u8>, DomainError> {
        let encoded = match self {
            Self::Like(e) => serde_json::to_vec(e),
            Self::GoldenComment(e) => serde_json::to_vec(e),
        };
        encoded.map_err(|e| DomainError::InternalError(format!("event encoding failed: {e}")))
    }

    /// Producer-side check so a malformed event never reaches the relay
    pub fn validate_for_publish(&self) -> Result<(), DomainError> {
        self.check_ids()
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        if let Self::GoldenComment(e) = self {
            validate_content(&e.content)?;
        }
        Ok(())
    }

    fn check_ids(&self) -> Result<(), DomainError> {
        if !self.user_id().is_storable() {
            return Err(DomainError::PoisonMessage(format!(
                "user_id {} out of range",
                self.user_id()
            )));
        }
        if !self.subject_id().is_storable() {
            return Err(DomainError::PoisonMessage(format!(
                "subject_id {} out of range",
                self.subject_id()
            )));
        }
        Ok(())
    }
}

fn poison(err: serde_json::Error) -> DomainError {
    DomainError::PoisonMessage(err.to_string())
}
