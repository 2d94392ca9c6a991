use crate::model::Id;
use serde::{Deserialize, Serialize};

/// The slice of a product the variant endpoints need
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Id,
    pub name: String,
    pub title: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    pub id: Id,
    pub product_id: Id,
    pub name: String,
    pub title: String,
    pub enabled: bool,
}
