use crate::model::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker `option_id` of a value that belongs to a single rate
pub const AD_HOC_OPTION: Id = 0;

/// Content a rate points to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub id: Id,
    /// Catalog option this value is shared through, `0` for ad hoc values
    pub option_id: Id,
    pub title: String,
    pub description: String,
    pub color: String,
    pub thumbnail: String,
    pub sort: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Value {
    /// Ad hoc values live and die with the rate that owns them
    pub fn is_ad_hoc(&self) -> bool {
        self.option_id == AD_HOC_OPTION
    }

    pub fn content(&self) -> ValueContent {
        ValueContent {
            title: self.title.clone(),
            description: self.description.clone(),
            color: self.color.clone(),
            thumbnail: self.thumbnail.clone(),
            sort: self.sort,
        }
    }
}

/// Editable part of a value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueContent {
    pub title: String,
    pub description: String,
    pub color: String,
    pub thumbnail: String,
    pub sort: i32,
}
