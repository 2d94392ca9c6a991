use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;

use crate::model::{
    now, Id, NewPrice, NewProperty, NewRate, Price, Product, Property, PropertyOwner,
    PropertyView, Rate, RateView, Value, ValueContent, Variation, AD_HOC_OPTION,
};
use crate::store::traits::{
    CatalogStore, PriceStore, ProductStore, PropertyStore, RateStore, ValueStore,
};

#[derive(Debug, Default)]
struct MemoryTables {
    next_id: Id,
    products: BTreeMap<Id, Product>,
    variations: BTreeMap<Id, Variation>,
    properties: BTreeMap<Id, Property>,
    rates: BTreeMap<Id, Rate>,
    values: BTreeMap<Id, Value>,
    prices: BTreeMap<Id, Price>,
    /// Derived thumbnail path per value
    thumbnails: BTreeMap<Id, String>,
}

impl MemoryTables {
    fn allocate_id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    fn rate_view(&self, rate: &Rate) -> Result<RateView> {
        let value = self.values.get(&rate.value_id).cloned().ok_or_else(|| {
            anyhow!(
                "Value {} referenced by rate {} is missing",
                rate.value_id,
                rate.id
            )
        })?;
        Ok(RateView {
            rate: rate.clone(),
            value,
        })
    }
}

/// Process-local store with the same cascade rules as the PostgreSQL schema:
/// deleting a property drops its rates, deleting a rate drops it from every
/// price combination that referenced it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<MemoryTables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_product(&self, name: &str, title: &str) -> Product {
        let mut tables = self.tables.lock();
        let product = Product {
            id: tables.allocate_id(),
            name: name.to_string(),
            title: title.to_string(),
            enabled: true,
        };
        tables.products.insert(product.id, product.clone());
        product
    }

    pub fn insert_variation(&self, product_id: Id, name: &str, title: &str) -> Variation {
        let mut tables = self.tables.lock();
        let variation = Variation {
            id: tables.allocate_id(),
            product_id,
            name: name.to_string(),
            title: title.to_string(),
            enabled: true,
        };
        tables.variations.insert(variation.id, variation.clone());
        variation
    }

    /// Insert a value shared through a catalog option
    pub fn insert_option_value(&self, option_id: Id, content: ValueContent) -> Value {
        let mut tables = self.tables.lock();
        let timestamp = now();
        let value = Value {
            id: tables.allocate_id(),
            option_id,
            title: content.title,
            description: content.description,
            color: content.color,
            thumbnail: content.thumbnail,
            sort: content.sort,
            created_at: timestamp,
            updated_at: timestamp,
        };
        tables.values.insert(value.id, value.clone());
        value
    }

    pub fn record_thumbnail(&self, value_id: Id, path: &str) {
        self.tables
            .lock()
            .thumbnails
            .insert(value_id, path.to_string());
    }

    pub fn has_thumbnail_record(&self, value_id: Id) -> bool {
        self.tables.lock().thumbnails.contains_key(&value_id)
    }

    pub fn value_exists(&self, id: Id) -> bool {
        self.tables.lock().values.contains_key(&id)
    }

    pub fn rate_count(&self) -> usize {
        self.tables.lock().rates.len()
    }

    pub fn price_count(&self) -> usize {
        self.tables.lock().prices.len()
    }
}

#[async_trait::async_trait]
impl ProductStore for MemoryStore {
    async fn get_product(&self, id: Id) -> Result<Option<Product>> {
        Ok(self.tables.lock().products.get(&id).cloned())
    }

    async fn get_variation(&self, product_id: Id, variation_id: Id) -> Result<Option<Variation>> {
        Ok(self
            .tables
            .lock()
            .variations
            .get(&variation_id)
            .filter(|v| v.product_id == product_id)
            .cloned())
    }
}

#[async_trait::async_trait]
impl PropertyStore for MemoryStore {
    async fn list_properties(&self, owner: &PropertyOwner) -> Result<Vec<PropertyView>> {
        let tables = self.tables.lock();
        tables
            .properties
            .values()
            .filter(|p| &p.owner == owner)
            .map(|property| {
                let rates = tables
                    .rates
                    .values()
                    .filter(|r| r.property_id == property.id)
                    .map(|r| tables.rate_view(r))
                    .collect::<Result<Vec<_>>>()?;
                Ok(PropertyView {
                    property: property.clone(),
                    rates,
                })
            })
            .collect()
    }

    async fn create_property(&self, property: NewProperty) -> Result<Property> {
        let mut tables = self.tables.lock();
        let timestamp = now();
        let property = Property {
            id: tables.allocate_id(),
            owner: property.owner,
            fields: property.fields,
            created_at: timestamp,
            updated_at: timestamp,
        };
        tables.properties.insert(property.id, property.clone());
        Ok(property)
    }

    async fn update_property(&self, property: &Property) -> Result<()> {
        let mut tables = self.tables.lock();
        let stored = tables
            .properties
            .get_mut(&property.id)
            .ok_or_else(|| anyhow!("Property {} does not exist", property.id))?;
        stored.fields = property.fields.clone();
        stored.updated_at = now();
        Ok(())
    }

    async fn delete_property(&self, id: Id) -> Result<bool> {
        let mut tables = self.tables.lock();
        if tables.properties.remove(&id).is_none() {
            return Ok(false);
        }
        let orphaned: Vec<Id> = tables
            .rates
            .values()
            .filter(|r| r.property_id == id)
            .map(|r| r.id)
            .collect();
        for rate_id in orphaned {
            tables.rates.remove(&rate_id);
            for price in tables.prices.values_mut() {
                price.rate_ids.retain(|r| *r != rate_id);
            }
        }
        Ok(true)
    }
}

#[async_trait::async_trait]
impl RateStore for MemoryStore {
    async fn get_rate(&self, id: Id) -> Result<Option<Rate>> {
        Ok(self.tables.lock().rates.get(&id).cloned())
    }

    async fn create_rate(&self, rate: NewRate) -> Result<Rate> {
        let mut tables = self.tables.lock();
        if !tables.properties.contains_key(&rate.property_id) {
            return Err(anyhow!("Property {} does not exist", rate.property_id));
        }
        if !tables.values.contains_key(&rate.value_id) {
            return Err(anyhow!("Value {} does not exist", rate.value_id));
        }
        let timestamp = now();
        let rate = Rate {
            id: tables.allocate_id(),
            property_id: rate.property_id,
            enabled: rate.fields.enabled,
            price: rate.fields.price,
            availability: rate.fields.availability,
            sku: rate.fields.sku,
            stock: rate.fields.stock,
            value_id: rate.value_id,
            created_at: timestamp,
            updated_at: timestamp,
        };
        tables.rates.insert(rate.id, rate.clone());
        Ok(rate)
    }

    async fn update_rate(&self, rate: &Rate) -> Result<()> {
        let mut tables = self.tables.lock();
        if !tables.values.contains_key(&rate.value_id) {
            return Err(anyhow!("Value {} does not exist", rate.value_id));
        }
        let stored = tables
            .rates
            .get_mut(&rate.id)
            .ok_or_else(|| anyhow!("Rate {} does not exist", rate.id))?;
        *stored = Rate {
            updated_at: now(),
            ..rate.clone()
        };
        Ok(())
    }

    async fn delete_rate(&self, id: Id) -> Result<bool> {
        let mut tables = self.tables.lock();
        if tables.rates.remove(&id).is_none() {
            return Ok(false);
        }
        for price in tables.prices.values_mut() {
            price.rate_ids.retain(|r| *r != id);
        }
        Ok(true)
    }
}

#[async_trait::async_trait]
impl ValueStore for MemoryStore {
    async fn get_value(&self, id: Id) -> Result<Option<Value>> {
        Ok(self.tables.lock().values.get(&id).cloned())
    }

    async fn create_ad_hoc_value(&self, content: ValueContent) -> Result<Value> {
        let mut tables = self.tables.lock();
        let timestamp = now();
        let value = Value {
            id: tables.allocate_id(),
            option_id: AD_HOC_OPTION,
            title: content.title,
            description: content.description,
            color: content.color,
            thumbnail: content.thumbnail,
            sort: content.sort,
            created_at: timestamp,
            updated_at: timestamp,
        };
        tables.values.insert(value.id, value.clone());
        Ok(value)
    }

    async fn update_value(&self, value: &Value) -> Result<()> {
        let mut tables = self.tables.lock();
        let stored = tables
            .values
            .get_mut(&value.id)
            .ok_or_else(|| anyhow!("Value {} does not exist", value.id))?;
        *stored = Value {
            updated_at: now(),
            ..value.clone()
        };
        Ok(())
    }

    async fn delete_value(&self, id: Id) -> Result<bool> {
        let mut tables = self.tables.lock();
        if tables.rates.values().any(|r| r.value_id == id) {
            return Err(anyhow!("Value {} is still referenced by a rate", id));
        }
        tables.thumbnails.remove(&id);
        Ok(tables.values.remove(&id).is_some())
    }

    async fn delete_value_thumbnail_cache(&self, value_id: Id) -> Result<bool> {
        Ok(self.tables.lock().thumbnails.remove(&value_id).is_some())
    }
}

#[async_trait::async_trait]
impl PriceStore for MemoryStore {
    async fn list_prices(&self, owner: &PropertyOwner) -> Result<Vec<Price>> {
        Ok(self
            .tables
            .lock()
            .prices
            .values()
            .filter(|p| {
                p.product_id == owner.product_id() && p.variation_id == owner.variation_id()
            })
            .cloned()
            .collect())
    }

    async fn create_price(&self, price: NewPrice) -> Result<Price> {
        let mut tables = self.tables.lock();
        if let Some(missing) = price.rate_ids.iter().find(|id| !tables.rates.contains_key(*id)) {
            return Err(anyhow!("Rate {} does not exist", missing));
        }
        let timestamp = now();
        let price = Price {
            id: tables.allocate_id(),
            product_id: price.product_id,
            variation_id: price.variation_id,
            rate_ids: price.rate_ids,
            enabled: price.enabled,
            price: price.price,
            availability: price.availability,
            sku: price.sku,
            stock: price.stock,
            created_at: timestamp,
            updated_at: timestamp,
        };
        tables.prices.insert(price.id, price.clone());
        Ok(price)
    }

    async fn update_price(&self, price: &Price) -> Result<()> {
        let mut tables = self.tables.lock();
        let stored = tables
            .prices
            .get_mut(&price.id)
            .ok_or_else(|| anyhow!("Price {} does not exist", price.id))?;
        stored.enabled = price.enabled;
        stored.price = price.price;
        stored.availability = price.availability;
        stored.sku = price.sku.clone();
        stored.stock = price.stock;
        stored.updated_at = now();
        Ok(())
    }

    async fn delete_price(&self, id: Id) -> Result<bool> {
        Ok(self.tables.lock().prices.remove(&id).is_some())
    }
}

impl CatalogStore for MemoryStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PropertyFields, RateFields};

    #[tokio::test]
    async fn test_deleting_rate_drops_it_from_prices() {
        let store = MemoryStore::new();
        let product = store.insert_product("shirt", "Shirt");
        let owner = PropertyOwner::Product {
            product_id: product.id,
        };
        let property = store
            .create_property(NewProperty {
                owner,
                fields: PropertyFields::default(),
            })
            .await
            .unwrap();
        let value = store
            .create_ad_hoc_value(ValueContent::default())
            .await
            .unwrap();
        let rate = store
            .create_rate(NewRate {
                property_id: property.id,
                fields: RateFields::default(),
                value_id: value.id,
            })
            .await
            .unwrap();
        store
            .create_price(NewPrice::for_combination(&owner, vec![rate.id]))
            .await
            .unwrap();

        assert!(store.delete_rate(rate.id).await.unwrap());
        let prices = store.list_prices(&owner).await.unwrap();
        assert_eq!(prices.len(), 1);
        assert!(prices[0].rate_ids.is_empty());
    }

    #[tokio::test]
    async fn test_value_in_use_cannot_be_deleted() {
        let store = MemoryStore::new();
        let product = store.insert_product("shirt", "Shirt");
        let property = store
            .create_property(NewProperty {
                owner: PropertyOwner::Product {
                    product_id: product.id,
                },
                fields: PropertyFields::default(),
            })
            .await
            .unwrap();
        let value = store.insert_option_value(3, ValueContent::default());
        store
            .create_rate(NewRate {
                property_id: property.id,
                fields: RateFields::default(),
                value_id: value.id,
            })
            .await
            .unwrap();

        assert!(store.delete_value(value.id).await.is_err());
    }

    #[tokio::test]
    async fn test_variation_lookup_checks_product() {
        let store = MemoryStore::new();
        let product = store.insert_product("shirt", "Shirt");
        let variation = store.insert_variation(product.id, "slim", "Slim fit");

        assert!(store
            .get_variation(product.id, variation.id)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .get_variation(product.id + 100, variation.id)
            .await
            .unwrap()
            .is_none());
    }
}
