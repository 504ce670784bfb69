//! Redis key layout

use orion_core::value_objects::SubjectId;

/// Golden comment seat counter prefix
pub const GOLDEN_SEATS_PREFIX: &str = "golden:seats:";

/// Set of users holding a golden seat on a subject
pub const GOLDEN_AUTHORS_PREFIX: &str = "golden:authors:";

/// Set of users who like a subject
pub const SUBJECT_LIKERS_PREFIX: &str = "subject:likers:";

/// Cached subject JSON
pub const SUBJECT_INFO_PREFIX: &str = "subject:info:";

#[inline]
pub fn golden_seats(subject_id: SubjectId) -> String {
    format!("{GOLDEN_SEATS_PREFIX}{subject_id}")
}

#[inline]
pub fn golden_authors(subject_id: SubjectId) -> String {
    format!("{GOLDEN_AUTHORS_PREFIX}{subject_id}")
}

#[inline]
pub fn subject_likers(subject_id: SubjectId) -> String {
    format!("{SUBJECT_LIKERS_PREFIX}{subject_id}")
}

#[inline]
pub fn subject_info(subject_id: SubjectId) -> String {
    format!("{SUBJECT_INFO_PREFIX}{subject_id}")
}
