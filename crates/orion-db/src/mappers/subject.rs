//! Subject entity <-> model mapper

use orion_core::entities::{NewSubject, Subject};
use orion_core::value_objects::{SubjectId, UserId};

use crate::models::SubjectModel;

/// Convert SubjectModel to Subject entity
impl From<SubjectModel> for Subject {
    fn from(model: SubjectModel) -> Self {
        Subject {
            id: SubjectId::from_db(model.id),
            author_id: UserId::from_db(model.author_id),
            title: model.title,
            description: model.description,
            like_count: model.like_count,
            golden_count: model.golden_count,
            created_at: model.created_at,
        }
    }
}

/// NewSubject values for database insertion
pub struct SubjectInsert<'a> {
    pub author_id: i64,
    pub title: &'a str,
    pub description: Option<&'a str>,
}

impl<'a> SubjectInsert<'a> {
    pub fn new(subject: &'a NewSubject) -> Self {
        Self {
            author_id: subject.author_id.to_db(),
            title: &subject.title,
            description: subject.description.as_deref(),
        }
    }
}
