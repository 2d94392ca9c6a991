use crate::model::{Availability, Id, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One selectable value on a property's axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub id: Id,
    pub property_id: Id,
    pub enabled: bool,
    pub price: f64,
    pub availability: Availability,
    pub sku: String,
    pub stock: i32,
    pub value_id: Id,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rate {
    pub fn apply(&mut self, fields: &RateFields) {
        self.enabled = fields.enabled;
        self.price = fields.price;
        self.availability = fields.availability;
        self.sku = fields.sku.clone();
        self.stock = fields.stock;
    }
}

/// Mutable attributes of a rate, shared by desired-state entries and inserts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateFields {
    pub enabled: bool,
    pub price: f64,
    pub availability: Availability,
    pub sku: String,
    pub stock: i32,
}

impl Default for RateFields {
    fn default() -> Self {
        Self {
            enabled: true,
            price: 0.0,
            availability: Availability::Available,
            sku: String::new(),
            stock: 0,
        }
    }
}

/// Rate insert model; the id is assigned by the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewRate {
    pub property_id: Id,
    pub fields: RateFields,
    pub value_id: Id,
}

/// A rate together with the value it points to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateView {
    #[serde(flatten)]
    pub rate: Rate,
    pub value: Value,
}
