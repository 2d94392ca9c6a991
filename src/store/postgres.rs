use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Row};
use std::collections::HashMap;

use crate::model::{
    Availability, Id, NewPrice, NewProperty, NewRate, Price, Product, Property, PropertyFields,
    PropertyOwner, PropertyView, Rate, RateView, Value, ValueContent, Variation, AD_HOC_OPTION,
};
use crate::store::traits::{
    CatalogStore, PriceStore, ProductStore, PropertyStore, RateStore, ValueStore,
};

const PROPERTY_COLUMNS: &str = "id, product_id, variation_id, type, size, mode, name, title, sku, stock, filtering, created_at, updated_at";
const VALUE_COLUMNS: &str =
    "id, option_id, title, description, color, thumbnail, sort, created_at, updated_at";
const RATE_COLUMNS: &str =
    "id, property_id, enabled, price, availability, sku, stock, value_id, created_at, updated_at";
const PRICE_COLUMNS: &str = "id, product_id, variation_id, enabled, price, availability, sku, stock, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Column and bind value selecting the rows of one owner
fn owner_filter(owner: &PropertyOwner) -> (&'static str, Id) {
    match owner {
        PropertyOwner::Product { product_id } => ("product_id", *product_id),
        PropertyOwner::Variation { variation_id, .. } => ("variation_id", *variation_id),
    }
}

fn property_fields_from_row(row: &PgRow) -> Result<PropertyFields> {
    Ok(PropertyFields {
        kind: row.try_get("type")?,
        size: row.try_get("size")?,
        mode: row.try_get("mode")?,
        name: row.try_get("name")?,
        title: row.try_get("title")?,
        sku: row.try_get("sku")?,
        stock: row.try_get("stock")?,
        filtering: row.try_get("filtering")?,
    })
}

fn value_from_row(row: &PgRow, prefix: &str) -> Result<Value> {
    let column = |name: &str| format!("{}{}", prefix, name);
    Ok(Value {
        id: row.try_get(column("id").as_str())?,
        option_id: row.try_get(column("option_id").as_str())?,
        title: row.try_get(column("title").as_str())?,
        description: row.try_get(column("description").as_str())?,
        color: row.try_get(column("color").as_str())?,
        thumbnail: row.try_get(column("thumbnail").as_str())?,
        sort: row.try_get(column("sort").as_str())?,
        created_at: row.try_get(column("created_at").as_str())?,
        updated_at: row.try_get(column("updated_at").as_str())?,
    })
}

fn rate_from_row(row: &PgRow) -> Result<Rate> {
    let availability: String = row.try_get("availability")?;
    Ok(Rate {
        id: row.try_get("id")?,
        property_id: row.try_get("property_id")?,
        enabled: row.try_get("enabled")?,
        price: row.try_get("price")?,
        availability: Availability::from_stored(&availability),
        sku: row.try_get("sku")?,
        stock: row.try_get("stock")?,
        value_id: row.try_get("value_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn price_from_row(row: &PgRow, rate_ids: Vec<Id>) -> Result<Price> {
    let availability: String = row.try_get("availability")?;
    Ok(Price {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        variation_id: row.try_get("variation_id")?,
        rate_ids,
        enabled: row.try_get("enabled")?,
        price: row.try_get("price")?,
        availability: Availability::from_stored(&availability),
        sku: row.try_get("sku")?,
        stock: row.try_get("stock")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait::async_trait]
impl ProductStore for PostgresStore {
    async fn get_product(&self, id: Id) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT id, name, title, enabled FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch product")?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Product {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            title: row.try_get("title")?,
            enabled: row.try_get("enabled")?,
        }))
    }

    async fn get_variation(&self, product_id: Id, variation_id: Id) -> Result<Option<Variation>> {
        let row = sqlx::query(
            "SELECT id, product_id, name, title, enabled FROM variations WHERE id = $1 AND product_id = $2",
        )
        .bind(variation_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch variation")?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Variation {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            name: row.try_get("name")?,
            title: row.try_get("title")?,
            enabled: row.try_get("enabled")?,
        }))
    }
}

#[async_trait::async_trait]
impl PropertyStore for PostgresStore {
    async fn list_properties(&self, owner: &PropertyOwner) -> Result<Vec<PropertyView>> {
        let (column, owner_id) = owner_filter(owner);
        let rows = sqlx::query(&format!(
            "SELECT {} FROM properties WHERE {} = $1 ORDER BY id",
            PROPERTY_COLUMNS, column
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list properties")?;

        let mut properties = Vec::with_capacity(rows.len());
        for row in &rows {
            properties.push(PropertyView {
                property: Property {
                    id: row.try_get("id")?,
                    owner: *owner,
                    fields: property_fields_from_row(row)?,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                },
                rates: Vec::new(),
            });
        }

        let property_ids: Vec<Id> = properties.iter().map(PropertyView::id).collect();
        let rate_rows = sqlx::query(
            r#"
            SELECT r.id, r.property_id, r.enabled, r.price, r.availability, r.sku, r.stock,
                   r.value_id, r.created_at, r.updated_at,
                   v.id AS v_id, v.option_id AS v_option_id, v.title AS v_title,
                   v.description AS v_description, v.color AS v_color,
                   v.thumbnail AS v_thumbnail, v.sort AS v_sort,
                   v.created_at AS v_created_at, v.updated_at AS v_updated_at
            FROM rates r
            JOIN catalog_values v ON v.id = r.value_id
            WHERE r.property_id = ANY($1)
            ORDER BY r.id
            "#,
        )
        .bind(&property_ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list rates")?;

        let positions: HashMap<Id, usize> = property_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();
        for row in &rate_rows {
            let rate = rate_from_row(row)?;
            let value = value_from_row(row, "v_")?;
            if let Some(&i) = positions.get(&rate.property_id) {
                properties[i].rates.push(RateView { rate, value });
            }
        }

        Ok(properties)
    }

    async fn create_property(&self, property: NewProperty) -> Result<Property> {
        let fields = &property.fields;
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO properties (product_id, variation_id, type, size, mode, name, title, sku, stock, filtering)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            PROPERTY_COLUMNS
        ))
        .bind(match property.owner {
            PropertyOwner::Product { product_id } => Some(product_id),
            PropertyOwner::Variation { .. } => None,
        })
        .bind(property.owner.variation_id())
        .bind(&fields.kind)
        .bind(fields.size)
        .bind(&fields.mode)
        .bind(&fields.name)
        .bind(&fields.title)
        .bind(&fields.sku)
        .bind(fields.stock)
        .bind(fields.filtering)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create property")?;

        Ok(Property {
            id: row.try_get("id")?,
            owner: property.owner,
            fields: property_fields_from_row(&row)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn update_property(&self, property: &Property) -> Result<()> {
        let fields = &property.fields;
        sqlx::query(
            r#"
            UPDATE properties
            SET type = $2, size = $3, mode = $4, name = $5, title = $6, sku = $7,
                stock = $8, filtering = $9, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(property.id)
        .bind(&fields.kind)
        .bind(fields.size)
        .bind(&fields.mode)
        .bind(&fields.name)
        .bind(&fields.title)
        .bind(&fields.sku)
        .bind(fields.stock)
        .bind(fields.filtering)
        .execute(&self.pool)
        .await
        .context("Failed to update property")?;

        Ok(())
    }

    async fn delete_property(&self, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete property")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl RateStore for PostgresStore {
    async fn get_rate(&self, id: Id) -> Result<Option<Rate>> {
        let row = sqlx::query(&format!("SELECT {} FROM rates WHERE id = $1", RATE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch rate")?;

        row.as_ref().map(rate_from_row).transpose()
    }

    async fn create_rate(&self, rate: NewRate) -> Result<Rate> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO rates (property_id, enabled, price, availability, sku, stock, value_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            RATE_COLUMNS
        ))
        .bind(rate.property_id)
        .bind(rate.fields.enabled)
        .bind(rate.fields.price)
        .bind(rate.fields.availability.as_str())
        .bind(&rate.fields.sku)
        .bind(rate.fields.stock)
        .bind(rate.value_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create rate")?;

        rate_from_row(&row)
    }

    async fn update_rate(&self, rate: &Rate) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE rates
            SET enabled = $2, price = $3, availability = $4, sku = $5, stock = $6,
                value_id = $7, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(rate.id)
        .bind(rate.enabled)
        .bind(rate.price)
        .bind(rate.availability.as_str())
        .bind(&rate.sku)
        .bind(rate.stock)
        .bind(rate.value_id)
        .execute(&self.pool)
        .await
        .context("Failed to update rate")?;

        Ok(())
    }

    async fn delete_rate(&self, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM rates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete rate")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl ValueStore for PostgresStore {
    async fn get_value(&self, id: Id) -> Result<Option<Value>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM catalog_values WHERE id = $1",
            VALUE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch value")?;

        row.as_ref().map(|r| value_from_row(r, "")).transpose()
    }

    async fn create_ad_hoc_value(&self, content: ValueContent) -> Result<Value> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO catalog_values (option_id, title, description, color, thumbnail, sort)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            VALUE_COLUMNS
        ))
        .bind(AD_HOC_OPTION)
        .bind(&content.title)
        .bind(&content.description)
        .bind(&content.color)
        .bind(&content.thumbnail)
        .bind(content.sort)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create value")?;

        value_from_row(&row, "")
    }

    async fn update_value(&self, value: &Value) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE catalog_values
            SET title = $2, description = $3, color = $4, thumbnail = $5, sort = $6,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(value.id)
        .bind(&value.title)
        .bind(&value.description)
        .bind(&value.color)
        .bind(&value.thumbnail)
        .bind(value.sort)
        .execute(&self.pool)
        .await
        .context("Failed to update value")?;

        Ok(())
    }

    async fn delete_value(&self, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM catalog_values WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete value")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_value_thumbnail_cache(&self, value_id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM value_thumbnails WHERE value_id = $1")
            .bind(value_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete value thumbnail record")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl PriceStore for PostgresStore {
    async fn list_prices(&self, owner: &PropertyOwner) -> Result<Vec<Price>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM prices
            WHERE product_id = $1 AND variation_id IS NOT DISTINCT FROM $2
            ORDER BY id
            "#,
            PRICE_COLUMNS
        ))
        .bind(owner.product_id())
        .bind(owner.variation_id())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list prices")?;

        let price_ids: Vec<Id> = rows
            .iter()
            .map(|row| row.try_get::<Id, _>("id"))
            .collect::<Result<_, _>>()?;
        let links = sqlx::query(
            "SELECT price_id, rate_id FROM price_rates WHERE price_id = ANY($1) ORDER BY price_id, position",
        )
        .bind(&price_ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list price rates")?;

        let mut rate_ids: HashMap<Id, Vec<Id>> = HashMap::new();
        for link in &links {
            rate_ids
                .entry(link.try_get("price_id")?)
                .or_default()
                .push(link.try_get("rate_id")?);
        }

        rows.iter()
            .zip(price_ids)
            .map(|(row, id)| price_from_row(row, rate_ids.remove(&id).unwrap_or_default()))
            .collect()
    }

    async fn create_price(&self, price: NewPrice) -> Result<Price> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start price transaction")?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO prices (product_id, variation_id, enabled, price, availability, sku, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            PRICE_COLUMNS
        ))
        .bind(price.product_id)
        .bind(price.variation_id)
        .bind(price.enabled)
        .bind(price.price)
        .bind(price.availability.as_str())
        .bind(&price.sku)
        .bind(price.stock)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create price")?;
        let price_id: Id = row.try_get("id")?;

        let positions: Vec<i32> = (0..price.rate_ids.len() as i32).collect();
        sqlx::query(
            r#"
            INSERT INTO price_rates (price_id, rate_id, position)
            SELECT $1, rate_id, position FROM UNNEST($2::BIGINT[], $3::INTEGER[]) AS t(rate_id, position)
            "#,
        )
        .bind(price_id)
        .bind(&price.rate_ids)
        .bind(&positions)
        .execute(&mut *tx)
        .await
        .context("Failed to link price rates")?;

        tx.commit()
            .await
            .context("Failed to commit price transaction")?;

        price_from_row(&row, price.rate_ids)
    }

    async fn update_price(&self, price: &Price) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE prices
            SET enabled = $2, price = $3, availability = $4, sku = $5, stock = $6, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(price.id)
        .bind(price.enabled)
        .bind(price.price)
        .bind(price.availability.as_str())
        .bind(&price.sku)
        .bind(price.stock)
        .execute(&self.pool)
        .await
        .context("Failed to update price")?;

        Ok(())
    }

    async fn delete_price(&self, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM prices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete price")?;

        Ok(result.rows_affected() > 0)
    }
}

impl CatalogStore for PostgresStore {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_filter_picks_owner_column() {
        assert_eq!(
            owner_filter(&PropertyOwner::Product { product_id: 3 }),
            ("product_id", 3)
        );
        assert_eq!(
            owner_filter(&PropertyOwner::Variation {
                product_id: 3,
                variation_id: 8
            }),
            ("variation_id", 8)
        );
    }
}
