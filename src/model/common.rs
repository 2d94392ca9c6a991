use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Id = i64;

/// Stock state of a rate or a price
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
    #[default]
    Available,
    PreOrder,
    OutOfStock,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::PreOrder => "pre-order",
            Availability::OutOfStock => "out-of-stock",
        }
    }

    /// Parse a stored availability string, falling back to `Available`
    pub fn from_stored(value: &str) -> Self {
        match value {
            "pre-order" => Availability::PreOrder,
            "out-of-stock" => Availability::OutOfStock,
            _ => Availability::Available,
        }
    }
}

/// Who a property belongs to. A property hangs off a product or off one of
/// its variations, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyOwner {
    Product { product_id: Id },
    Variation { product_id: Id, variation_id: Id },
}

impl PropertyOwner {
    pub fn product_id(&self) -> Id {
        match self {
            PropertyOwner::Product { product_id } => *product_id,
            PropertyOwner::Variation { product_id, .. } => *product_id,
        }
    }

    pub fn variation_id(&self) -> Option<Id> {
        match self {
            PropertyOwner::Product { .. } => None,
            PropertyOwner::Variation { variation_id, .. } => Some(*variation_id),
        }
    }
}

impl std::fmt::Display for PropertyOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyOwner::Product { product_id } => write!(f, "product {}", product_id),
            PropertyOwner::Variation {
                product_id,
                variation_id,
            } => write!(f, "variation {} of product {}", variation_id, product_id),
        }
    }
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_wire_format() {
        assert_eq!(
            serde_json::to_string(&Availability::PreOrder).unwrap(),
            "\"pre-order\""
        );
        assert_eq!(Availability::from_stored("out-of-stock"), Availability::OutOfStock);
        assert_eq!(Availability::from_stored("garbage"), Availability::Available);
    }

    #[test]
    fn test_owner_accessors() {
        let owner = PropertyOwner::Variation {
            product_id: 7,
            variation_id: 3,
        };
        assert_eq!(owner.product_id(), 7);
        assert_eq!(owner.variation_id(), Some(3));

        let json = serde_json::to_value(owner).unwrap();
        assert_eq!(json["kind"], "variation");
        assert_eq!(
            PropertyOwner::Product { product_id: 7 }.variation_id(),
            None
        );
    }
}
