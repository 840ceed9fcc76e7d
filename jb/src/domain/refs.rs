//! References to other documents
//!
//! The API populates some foreign keys (`createdBy`, `jobId`, `userId`) with a
//! summary of the referenced document and leaves others as a bare id string.

use serde::{Deserialize, Serialize};

/// Anything with a document id
pub trait Identified {
    fn id(&self) -> &str;
}

/// Either a populated summary or a bare document id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref<T> {
    Populated(T),
    Id(String),
}

impl<T: Identified> Ref<T> {
    /// Id of the referenced document, populated or not
    pub fn id(&self) -> &str {
        match self {
            Ref::Populated(inner) => inner.id(),
            Ref::Id(id) => id,
        }
    }

    /// The populated summary, if the API included one
    pub fn populated(&self) -> Option<&T> {
        match self {
            Ref::Populated(inner) => Some(inner),
            Ref::Id(_) => None,
        }
    }
}
