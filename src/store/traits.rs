use crate::model::{
    Id, NewPrice, NewProperty, NewRate, Price, Product, Property, PropertyOwner, PropertyView,
    Rate, Value, ValueContent, Variation,
};
use anyhow::Result;

#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    async fn get_product(&self, id: Id) -> Result<Option<Product>>;
    async fn get_variation(&self, product_id: Id, variation_id: Id) -> Result<Option<Variation>>;
}

#[async_trait::async_trait]
pub trait PropertyStore: Send + Sync {
    /// Properties of an owner in creation order, each with its rates and their values
    async fn list_properties(&self, owner: &PropertyOwner) -> Result<Vec<PropertyView>>;
    async fn create_property(&self, property: NewProperty) -> Result<Property>;
    async fn update_property(&self, property: &Property) -> Result<()>;
    async fn delete_property(&self, id: Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait RateStore: Send + Sync {
    async fn get_rate(&self, id: Id) -> Result<Option<Rate>>;
    async fn create_rate(&self, rate: NewRate) -> Result<Rate>;
    async fn update_rate(&self, rate: &Rate) -> Result<()>;
    async fn delete_rate(&self, id: Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait ValueStore: Send + Sync {
    async fn get_value(&self, id: Id) -> Result<Option<Value>>;
    /// Create a value owned by a single rate (`option_id == 0`)
    async fn create_ad_hoc_value(&self, content: ValueContent) -> Result<Value>;
    async fn update_value(&self, value: &Value) -> Result<()>;
    async fn delete_value(&self, id: Id) -> Result<bool>;
    /// Drop the derived thumbnail record kept for a value, if any
    async fn delete_value_thumbnail_cache(&self, value_id: Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait PriceStore: Send + Sync {
    async fn list_prices(&self, owner: &PropertyOwner) -> Result<Vec<Price>>;
    async fn create_price(&self, price: NewPrice) -> Result<Price>;
    async fn update_price(&self, price: &Price) -> Result<()>;
    async fn delete_price(&self, id: Id) -> Result<bool>;
}

pub trait CatalogStore:
    ProductStore + PropertyStore + RateStore + ValueStore + PriceStore + Send + Sync
{
}
