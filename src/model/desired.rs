//! Desired variant state as submitted by the admin UI.
//!
//! Every property and rate entry says whether it is new or refers to an
//! existing row; there is no "id 0 means new" convention.

use crate::model::{Id, PriceEdit, PropertyFields, RateFields, ValueContent};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DesiredProperty {
    New {
        #[serde(flatten)]
        fields: PropertyFields,
        #[serde(default)]
        rates: Vec<DesiredRate>,
    },
    Existing {
        id: Id,
        #[serde(flatten)]
        fields: PropertyFields,
        #[serde(default)]
        rates: Vec<DesiredRate>,
    },
}

impl DesiredProperty {
    pub fn existing_id(&self) -> Option<Id> {
        match self {
            DesiredProperty::New { .. } => None,
            DesiredProperty::Existing { id, .. } => Some(*id),
        }
    }

    pub fn fields(&self) -> &PropertyFields {
        match self {
            DesiredProperty::New { fields, .. } | DesiredProperty::Existing { fields, .. } => {
                fields
            }
        }
    }

    pub fn rates(&self) -> &[DesiredRate] {
        match self {
            DesiredProperty::New { rates, .. } | DesiredProperty::Existing { rates, .. } => rates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DesiredRate {
    New {
        #[serde(flatten)]
        fields: RateFields,
        value: ValueRef,
    },
    Existing {
        id: Id,
        #[serde(flatten)]
        fields: RateFields,
        value: ValueRef,
    },
}

impl DesiredRate {
    pub fn existing_id(&self) -> Option<Id> {
        match self {
            DesiredRate::New { .. } => None,
            DesiredRate::Existing { id, .. } => Some(*id),
        }
    }

    pub fn fields(&self) -> &RateFields {
        match self {
            DesiredRate::New { fields, .. } | DesiredRate::Existing { fields, .. } => fields,
        }
    }

    pub fn value(&self) -> &ValueRef {
        match self {
            DesiredRate::New { value, .. } | DesiredRate::Existing { value, .. } => value,
        }
    }
}

/// What a desired rate points at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueRef {
    /// Content owned by the rate alone
    Inline {
        #[serde(flatten)]
        content: ValueContent,
    },
    /// A shared catalog option value
    Option { id: Id },
}

/// Body of a variant update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantsUpdate {
    #[serde(default)]
    pub properties: Vec<DesiredProperty>,
    #[serde(default)]
    pub prices: Vec<PriceEdit>,
}

impl VariantsUpdate {
    /// Rate counts of the properties that take part in the matrix
    pub fn axis_sizes(&self) -> Vec<usize> {
        self.properties
            .iter()
            .map(|p| p.rates().len())
            .filter(|n| *n > 0)
            .collect()
    }
}
