//! Journal tags attached to positions by the user.

use crate::domain::TagId;
use serde::{Deserialize, Serialize};

/// Tag grouping used for behavioral analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagCategory {
    Setup,
    Mistake,
    Emotion,
    #[serde(other)]
    Custom,
}

/// Display metadata for a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagMeta {
    pub name: String,
    pub category: TagCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl TagMeta {
    pub fn new(name: impl Into<String>, category: TagCategory) -> Self {
        TagMeta {
            name: name.into(),
            category,
            color: None,
        }
    }

    pub fn is_mistake(&self) -> bool {
        self.category == TagCategory::Mistake
    }
}

/// A tag id together with its metadata, as supplied over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDefinition {
    pub id: TagId,
    #[serde(flatten)]
    pub meta: TagMeta,
}
