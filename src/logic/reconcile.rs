use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::model::{
    DesiredProperty, DesiredRate, Id, NewProperty, NewRate, PropertyFields, PropertyOwner,
    PropertyView, RateFields, RateView, Value, ValueContent, ValueRef,
};
use crate::store::{CatalogStore, RateCache};

/// Counters describing what a reconciliation wrote
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct DiffStats {
    pub properties_created: usize,
    pub properties_updated: usize,
    pub properties_deleted: usize,
    pub rates_created: usize,
    pub rates_updated: usize,
    pub rates_deleted: usize,
}

/// Result of reconciling the properties of one owner
#[derive(Debug, Clone)]
pub struct PropertyDiff {
    /// Surviving properties first, in their stored order, then the new ones
    pub properties: Vec<PropertyView>,
    /// Set when a property or rate was created or deleted, i.e. the set of
    /// combinations changed and the price matrix must be rebuilt
    pub resized: bool,
    pub stats: DiffStats,
}

/// Brings the stored properties, rates and values of one owner in line
/// with a desired state.
///
/// Writes happen one by one as the diff is walked; a failing write aborts
/// the walk and leaves the earlier writes in place.
pub struct Reconciler<'a, S: CatalogStore + ?Sized> {
    store: &'a S,
    cache: &'a dyn RateCache,
    owner: PropertyOwner,
    stats: DiffStats,
}

impl<'a, S: CatalogStore + ?Sized> Reconciler<'a, S> {
    pub fn new(store: &'a S, cache: &'a dyn RateCache, owner: PropertyOwner) -> Self {
        Self {
            store,
            cache,
            owner,
            stats: DiffStats::default(),
        }
    }

    /// Check every `Existing` reference against the stored state before
    /// anything is written
    pub fn validate(existing: &[PropertyView], desired: &[DesiredProperty]) -> CatalogResult<()> {
        let stored: HashMap<Id, &PropertyView> = existing.iter().map(|p| (p.id(), p)).collect();
        let mut seen_properties = HashSet::new();

        for entry in desired {
            match entry {
                DesiredProperty::Existing { id, rates, .. } => {
                    let property = stored
                        .get(id)
                        .ok_or_else(|| CatalogError::not_found("property", *id))?;
                    if !seen_properties.insert(*id) {
                        return Err(CatalogError::Validation(format!(
                            "property {} is listed more than once",
                            id
                        )));
                    }

                    let stored_rates: HashSet<Id> = property.rate_ids().into_iter().collect();
                    let mut seen_rates = HashSet::new();
                    for rate_id in rates.iter().filter_map(DesiredRate::existing_id) {
                        if !stored_rates.contains(&rate_id) {
                            return Err(CatalogError::not_found("rate", rate_id));
                        }
                        if !seen_rates.insert(rate_id) {
                            return Err(CatalogError::Validation(format!(
                                "rate {} is listed more than once in property {}",
                                rate_id, id
                            )));
                        }
                    }
                }
                DesiredProperty::New { rates, .. } => {
                    if let Some(rate_id) = rates.iter().find_map(DesiredRate::existing_id) {
                        return Err(CatalogError::Validation(format!(
                            "rate {} cannot be moved into a new property",
                            rate_id
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    pub async fn reconcile(
        mut self,
        existing: Vec<PropertyView>,
        desired: Vec<DesiredProperty>,
    ) -> CatalogResult<PropertyDiff> {
        let mut resized = false;
        let mut wanted: HashMap<Id, (PropertyFields, Vec<DesiredRate>)> = HashMap::new();
        let mut created = Vec::new();
        for entry in desired {
            match entry {
                DesiredProperty::Existing { id, fields, rates } => {
                    wanted.entry(id).or_insert((fields, rates));
                }
                DesiredProperty::New { fields, rates } => created.push((fields, rates)),
            }
        }

        let mut properties = Vec::with_capacity(existing.len() + created.len());
        for current in existing {
            match wanted.remove(&current.id()) {
                Some((fields, rates)) => {
                    let (view, rates_resized) =
                        self.update_property(current, fields, &rates).await?;
                    resized |= rates_resized;
                    properties.push(view);
                }
                None => {
                    self.delete_property(current).await?;
                    resized = true;
                }
            }
        }

        for (fields, rates) in created {
            properties.push(self.create_property(fields, &rates).await?);
            resized = true;
        }

        Ok(PropertyDiff {
            properties,
            resized,
            stats: self.stats,
        })
    }

    async fn update_property(
        &mut self,
        current: PropertyView,
        fields: PropertyFields,
        desired_rates: &[DesiredRate],
    ) -> CatalogResult<(PropertyView, bool)> {
        let mut property = current.property;
        property.fields = fields;
        self.store.update_property(&property).await?;
        self.stats.properties_updated += 1;

        let (rates, resized) = self
            .reconcile_rates(property.id, current.rates, desired_rates)
            .await?;
        Ok((PropertyView { property, rates }, resized))
    }

    async fn create_property(
        &mut self,
        fields: PropertyFields,
        desired_rates: &[DesiredRate],
    ) -> CatalogResult<PropertyView> {
        let property = self
            .store
            .create_property(NewProperty {
                owner: self.owner,
                fields,
            })
            .await?;
        self.stats.properties_created += 1;
        debug!("Created property {} for {}", property.id, self.owner);

        let mut rates = Vec::with_capacity(desired_rates.len());
        for desired in desired_rates {
            rates.push(
                self.create_rate(property.id, desired.fields(), desired.value())
                    .await?,
            );
        }
        Ok(PropertyView { property, rates })
    }

    async fn delete_property(&mut self, current: PropertyView) -> CatalogResult<()> {
        let property_id = current.id();
        for rate in current.rates {
            self.delete_rate(rate).await?;
        }
        self.store.delete_property(property_id).await?;
        self.stats.properties_deleted += 1;
        debug!("Deleted property {} of {}", property_id, self.owner);
        Ok(())
    }

    async fn reconcile_rates(
        &mut self,
        property_id: Id,
        existing: Vec<RateView>,
        desired: &[DesiredRate],
    ) -> CatalogResult<(Vec<RateView>, bool)> {
        let mut resized = false;
        let mut wanted: HashMap<Id, (&RateFields, &ValueRef)> = HashMap::new();
        let mut created = Vec::new();
        for entry in desired {
            match entry {
                DesiredRate::Existing { id, fields, value } => {
                    wanted.entry(*id).or_insert((fields, value));
                }
                DesiredRate::New { fields, value } => created.push((fields, value)),
            }
        }

        let mut rates = Vec::with_capacity(existing.len() + created.len());
        for current in existing {
            match wanted.remove(&current.rate.id) {
                Some((fields, value)) => rates.push(self.update_rate(current, fields, value).await?),
                None => {
                    self.delete_rate(current).await?;
                    resized = true;
                }
            }
        }

        for (fields, value) in created {
            rates.push(self.create_rate(property_id, fields, value).await?);
            resized = true;
        }

        Ok((rates, resized))
    }

    async fn update_rate(
        &mut self,
        current: RateView,
        fields: &RateFields,
        desired_value: &ValueRef,
    ) -> CatalogResult<RateView> {
        let mut rate = current.rate;
        rate.apply(fields);

        let previous = current.value;
        let mut retired = None;
        let value = match desired_value {
            ValueRef::Inline { content } if previous.is_ad_hoc() => {
                self.rewrite_ad_hoc_value(previous, content).await?
            }
            ValueRef::Inline { content } => {
                // The shared option stays in the catalog, the rate gets its own value
                self.store.create_ad_hoc_value(content.clone()).await?
            }
            ValueRef::Option { id } if *id == previous.id => previous,
            ValueRef::Option { id } => {
                let value = self.shared_value(*id).await?;
                if previous.is_ad_hoc() {
                    retired = Some(previous.id);
                }
                value
            }
        };
        rate.value_id = value.id;

        self.store.update_rate(&rate).await?;
        self.cache.remove(rate.id).await;
        self.stats.rates_updated += 1;

        if let Some(value_id) = retired {
            self.store.delete_value(value_id).await?;
        }

        Ok(RateView { rate, value })
    }

    async fn create_rate(
        &mut self,
        property_id: Id,
        fields: &RateFields,
        desired_value: &ValueRef,
    ) -> CatalogResult<RateView> {
        let value = match desired_value {
            ValueRef::Inline { content } => self.store.create_ad_hoc_value(content.clone()).await?,
            ValueRef::Option { id } => self.shared_value(*id).await?,
        };
        let rate = self
            .store
            .create_rate(NewRate {
                property_id,
                fields: fields.clone(),
                value_id: value.id,
            })
            .await?;
        self.stats.rates_created += 1;
        Ok(RateView { rate, value })
    }

    /// Delete a rate, and its value when the rate was the value's only owner
    async fn delete_rate(&mut self, current: RateView) -> CatalogResult<()> {
        let rate_id = current.rate.id;
        self.store.delete_rate(rate_id).await?;
        self.cache.remove(rate_id).await;
        self.stats.rates_deleted += 1;

        if current.value.is_ad_hoc() {
            self.store.delete_value(current.value.id).await?;
        }
        Ok(())
    }

    async fn rewrite_ad_hoc_value(
        &mut self,
        mut value: Value,
        content: &ValueContent,
    ) -> CatalogResult<Value> {
        value.title = content.title.clone();
        value.description = content.description.clone();
        value.color = content.color.clone();
        value.sort = content.sort;

        let thumbnail_cleared = content.thumbnail.is_empty() && !value.thumbnail.is_empty();
        if thumbnail_cleared {
            value.thumbnail.clear();
        } else if !content.thumbnail.is_empty() {
            value.thumbnail = content.thumbnail.clone();
        }

        self.store.update_value(&value).await?;

        if thumbnail_cleared {
            if let Err(e) = self.store.delete_value_thumbnail_cache(value.id).await {
                warn!(
                    "Failed to drop thumbnail cache for value {}: {:#}",
                    value.id, e
                );
            }
        }
        Ok(value)
    }

    /// Load a catalog option value a rate may point at
    async fn shared_value(&self, id: Id) -> CatalogResult<Value> {
        let value = self
            .store
            .get_value(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("value", id))?;
        if value.is_ad_hoc() {
            return Err(CatalogError::Validation(format!(
                "value {} belongs to another rate and cannot be shared",
                id
            )));
        }
        Ok(value)
    }
}
