//! Relay events

mod relay_event;

pub use relay_event::{EventKind, GoldenCommentEvent, LikeAction, LikeEvent, RelayEvent};
