use crate::model::{Id, PropertyOwner, RateView};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An axis of product variation, e.g. "Color"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: Id,
    pub owner: PropertyOwner,
    #[serde(flatten)]
    pub fields: PropertyFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable attributes of a property
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyFields {
    /// Display type, e.g. "select" or "radio"
    #[serde(rename = "type")]
    pub kind: String,
    pub size: i32,
    pub mode: String,
    pub name: String,
    pub title: String,
    pub sku: String,
    pub stock: i32,
    pub filtering: bool,
}

/// Property insert model
#[derive(Debug, Clone, PartialEq)]
pub struct NewProperty {
    pub owner: PropertyOwner,
    pub fields: PropertyFields,
}

/// A property with its ordered rates, as loaded for an owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyView {
    #[serde(flatten)]
    pub property: Property,
    pub rates: Vec<RateView>,
}

impl PropertyView {
    pub fn id(&self) -> Id {
        self.property.id
    }

    pub fn rate_ids(&self) -> Vec<Id> {
        self.rates.iter().map(|r| r.rate.id).collect()
    }
}
