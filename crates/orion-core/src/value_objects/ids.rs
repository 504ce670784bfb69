//! Identifier newtypes
//!
//! Ids travel as unsigned 64-bit integers on the relay but are stored in
//! PostgreSQL `BIGINT` columns, so only `1..=i64::MAX` is storable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error when parsing an identifier from string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("invalid id format")]
    InvalidFormat,
    #[error("id out of storable range")]
    OutOfRange,
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            #[inline]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            #[inline]
            pub const fn into_inner(self) -> u64 {
                self.0
            }

            /// True when the id fits a positive `BIGINT`
            #[inline]
            pub const fn is_storable(&self) -> bool {
                self.0 >= 1 && self.0 <= i64::MAX as u64
            }

            /// Database representation. Callers must have checked
            /// [`Self::is_storable`]; out-of-range values saturate.
            #[inline]
            pub fn to_db(self) -> i64 {
                i64::try_from(self.0).unwrap_or(i64::MAX)
            }

            /// Rows never hold negative ids; a negative value maps to zero
            /// which is never storable.
            #[inline]
            pub fn from_db(id: i64) -> Self {
                Self(u64::try_from(id).unwrap_or(0))
            }

            pub fn parse(s: &str) -> Result<Self, IdParseError> {
                let id = s
                    .trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| IdParseError::InvalidFormat)?;
                if id.is_storable() {
                    Ok(id)
                } else {
                    Err(IdParseError::OutOfRange)
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(
    /// Identifies an end user (liker or comment author)
    UserId
);
define_id!(
    /// Identifies a subject (the content being liked or commented on)
    SubjectId
);
define_id!(
    /// Identifies a comment
    CommentId
);
