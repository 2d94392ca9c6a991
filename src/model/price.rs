use crate::model::{Availability, Id, PropertyOwner};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A priced SKU: one rate from every property of the owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub id: Id,
    pub product_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<Id>,
    pub rate_ids: Vec<Id>,
    pub enabled: bool,
    pub price: f64,
    pub availability: Availability,
    pub sku: String,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Price {
    /// Order-independent identity of the combination this price stands for
    pub fn combination_key(&self) -> BTreeSet<Id> {
        self.rate_ids.iter().copied().collect()
    }

    pub fn apply(&mut self, edit: &PriceEdit) {
        self.enabled = edit.enabled;
        self.price = edit.price;
        self.availability = edit.availability;
        self.sku = edit.sku.clone();
        self.stock = edit.stock;
    }
}

/// Price insert model
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrice {
    pub product_id: Id,
    pub variation_id: Option<Id>,
    pub rate_ids: Vec<Id>,
    pub enabled: bool,
    pub price: f64,
    pub availability: Availability,
    pub sku: String,
    pub stock: i32,
}

impl NewPrice {
    /// A fresh, enabled, zero-priced combination for `owner`
    pub fn for_combination(owner: &PropertyOwner, rate_ids: Vec<Id>) -> Self {
        let sku = combination_sku(owner, &rate_ids);
        Self {
            product_id: owner.product_id(),
            variation_id: owner.variation_id(),
            rate_ids,
            enabled: true,
            price: 0.0,
            availability: Availability::Available,
            sku,
            stock: 0,
        }
    }
}

/// `<productId>.0.<rateId>...` in row order. The second segment is always
/// zero, for variation prices too; the variation lives on the row.
pub fn combination_sku(owner: &PropertyOwner, rate_ids: &[Id]) -> String {
    [owner.product_id(), 0]
        .iter()
        .chain(rate_ids.iter())
        .join(".")
}

/// Direct edit of an existing price, applied when the matrix keeps its shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEdit {
    pub id: Id,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub stock: i32,
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combination_sku_for_product() {
        let owner = PropertyOwner::Product { product_id: 12 };
        assert_eq!(combination_sku(&owner, &[4, 9]), "12.0.4.9");
    }

    #[test]
    fn test_variation_sku_keeps_zero_segment() {
        let owner = PropertyOwner::Variation {
            product_id: 12,
            variation_id: 5,
        };
        let price = NewPrice::for_combination(&owner, vec![1, 2, 3]);
        assert_eq!(price.sku, "12.0.1.2.3");
        assert_eq!(price.variation_id, Some(5));
        assert!(price.enabled);
        assert_eq!(price.availability, Availability::Available);
    }

    #[test]
    fn test_combination_key_ignores_order() {
        let now = chrono::Utc::now();
        let price = Price {
            id: 1,
            product_id: 1,
            variation_id: None,
            rate_ids: vec![9, 3],
            enabled: true,
            price: 0.0,
            availability: Availability::Available,
            sku: String::new(),
            stock: 0,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(price.combination_key(), [3, 9].into_iter().collect());
    }
}
