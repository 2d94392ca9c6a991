use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use log::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::logic::combinations::Combinations;
use crate::model::{Id, NewPrice, Price, PriceEdit, PropertyOwner, PropertyView, Rate};
use crate::store::{CatalogStore, RateCache};

/// Counters of one matrix regeneration
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct MatrixStats {
    pub combinations: usize,
    pub created: usize,
    pub reused: usize,
    pub purged: usize,
}

/// Keeps one price per combination of rates across an owner's properties
pub struct PriceMatrix<'a, S: CatalogStore + ?Sized> {
    store: &'a S,
    cache: &'a dyn RateCache,
    cache_ttl: Duration,
    max_combinations: usize,
    purge_stale: bool,
}

impl<'a, S: CatalogStore + ?Sized> PriceMatrix<'a, S> {
    pub fn new(
        store: &'a S,
        cache: &'a dyn RateCache,
        cache_ttl: Duration,
        max_combinations: usize,
        purge_stale: bool,
    ) -> Self {
        Self {
            store,
            cache,
            cache_ttl,
            max_combinations,
            purge_stale,
        }
    }

    /// Create a price for every combination that lacks one. Prices whose
    /// rate set no longer occurs are deleted when purging is enabled.
    pub async fn regenerate(
        &self,
        owner: &PropertyOwner,
        properties: &[PropertyView],
    ) -> CatalogResult<MatrixStats> {
        let axes: Vec<Vec<Id>> = properties.iter().map(PropertyView::rate_ids).collect();
        let combinations = Combinations::new(axes.iter().map(Vec::as_slice));

        let count = combinations.count_total();
        if count > self.max_combinations {
            return Err(CatalogError::TooManyCombinations {
                count,
                limit: self.max_combinations,
            });
        }

        let existing = self.store.list_prices(owner).await?;
        let mut by_combination: HashMap<BTreeSet<Id>, usize> = HashMap::new();
        for (index, price) in existing.iter().enumerate() {
            by_combination.entry(price.combination_key()).or_insert(index);
        }
        let mut matched = vec![false; existing.len()];

        let mut stats = MatrixStats {
            combinations: count,
            ..MatrixStats::default()
        };
        for row in combinations {
            let key: BTreeSet<Id> = row.iter().copied().collect();
            let reusable = by_combination
                .get(&key)
                .copied()
                .filter(|&index| existing[index].rate_ids.len() == row.len());

            if let Some(index) = reusable {
                matched[index] = true;
                stats.reused += 1;
                continue;
            }

            for rate_id in &row {
                self.resolve_rate(*rate_id).await?;
            }
            let price = self
                .store
                .create_price(NewPrice::for_combination(owner, row))
                .await?;
            debug!("Created price {} ({}) for {}", price.id, price.sku, owner);
            stats.created += 1;
        }

        if self.purge_stale {
            for (price, _) in existing.iter().zip(&matched).filter(|(_, m)| !**m) {
                self.store.delete_price(price.id).await?;
                stats.purged += 1;
            }
        }

        Ok(stats)
    }

    /// Apply direct price edits; every edited price must belong to `owner`
    pub async fn apply_edits(
        &self,
        owner: &PropertyOwner,
        edits: &[PriceEdit],
    ) -> CatalogResult<usize> {
        if edits.is_empty() {
            return Ok(0);
        }

        let mut prices: HashMap<Id, Price> = self
            .store
            .list_prices(owner)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        for edit in edits {
            let price = prices
                .get_mut(&edit.id)
                .ok_or_else(|| CatalogError::not_found("price", edit.id))?;
            price.apply(edit);
            self.store.update_price(price).await?;
        }
        Ok(edits.len())
    }

    /// Read-through rate lookup shared by every row of a pass
    async fn resolve_rate(&self, id: Id) -> CatalogResult<Rate> {
        if let Some(rate) = self.cache.get(id).await {
            return Ok(rate);
        }
        let rate = self
            .store
            .get_rate(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("rate", id))?;
        self.cache.set(rate.clone(), self.cache_ttl).await;
        Ok(rate)
    }
}
