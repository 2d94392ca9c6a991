use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use serde::Serialize;

use crate::config::CatalogConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::logic::combinations::combination_count;
use crate::logic::price_matrix::{MatrixStats, PriceMatrix};
use crate::logic::reconcile::{DiffStats, Reconciler};
use crate::model::{Price, PropertyOwner, PropertyView, VariantsUpdate};
use crate::store::{CatalogStore, RateCache};

/// Knobs of the variant update, taken from `[catalog]` in the config
#[derive(Debug, Clone)]
pub struct VariantSettings {
    pub max_price_combinations: usize,
    pub rate_cache_ttl: Duration,
    pub purge_stale_prices: bool,
}

impl From<&CatalogConfig> for VariantSettings {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            max_price_combinations: config.max_price_combinations,
            rate_cache_ttl: Duration::from_secs(config.rate_cache_ttl_secs),
            purge_stale_prices: config.purge_stale_prices,
        }
    }
}

impl Default for VariantSettings {
    fn default() -> Self {
        Self::from(&CatalogConfig::default())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantsView {
    pub owner: PropertyOwner,
    pub properties: Vec<PropertyView>,
    pub prices: Vec<Price>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantsOutcome {
    pub resized: bool,
    pub properties: Vec<PropertyView>,
    pub prices: Vec<Price>,
    pub changes: DiffStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<MatrixStats>,
    pub prices_edited: usize,
}

/// Entry point for reading and rewriting the variants of a product or
/// variation
pub struct VariantUpdater<S: CatalogStore + ?Sized> {
    store: Arc<S>,
    cache: Arc<dyn RateCache>,
    settings: VariantSettings,
}

impl<S: CatalogStore + ?Sized> VariantUpdater<S> {
    pub fn new(store: Arc<S>, cache: Arc<dyn RateCache>, settings: VariantSettings) -> Self {
        Self {
            store,
            cache,
            settings,
        }
    }

    /// Fail with not-found unless the product (and variation) exist
    pub async fn ensure_owner(&self, owner: &PropertyOwner) -> CatalogResult<()> {
        let product_id = owner.product_id();
        self.store
            .get_product(product_id)
            .await?
            .ok_or_else(|| CatalogError::not_found("product", product_id))?;

        if let Some(variation_id) = owner.variation_id() {
            self.store
                .get_variation(product_id, variation_id)
                .await?
                .ok_or_else(|| CatalogError::not_found("variation", variation_id))?;
        }
        Ok(())
    }

    pub async fn load(&self, owner: PropertyOwner) -> CatalogResult<VariantsView> {
        self.ensure_owner(&owner).await?;
        Ok(VariantsView {
            owner,
            properties: self.store.list_properties(&owner).await?,
            prices: self.store.list_prices(&owner).await?,
        })
    }

    /// Reconcile properties and rates, then rebuild the price matrix when
    /// the combination space changed, or apply the price edits when it did not
    pub async fn apply(
        &self,
        owner: PropertyOwner,
        update: VariantsUpdate,
    ) -> CatalogResult<VariantsOutcome> {
        self.ensure_owner(&owner).await?;

        let limit = self.settings.max_price_combinations;
        let requested = combination_count(update.axis_sizes());
        if requested > limit {
            return Err(CatalogError::TooManyCombinations {
                count: requested,
                limit,
            });
        }

        let existing = self.store.list_properties(&owner).await?;
        Reconciler::<S>::validate(&existing, &update.properties)?;

        let VariantsUpdate {
            properties: desired,
            prices: edits,
        } = update;
        let diff = Reconciler::new(&*self.store, &*self.cache, owner)
            .reconcile(existing, desired)
            .await?;
        info!(
            "Reconciled {}: resized={} {:?}",
            owner, diff.resized, diff.stats
        );

        let matrix = PriceMatrix::new(
            &*self.store,
            &*self.cache,
            self.settings.rate_cache_ttl,
            limit,
            self.settings.purge_stale_prices,
        );

        let (matrix_stats, prices_edited) = if diff.resized {
            if !edits.is_empty() {
                debug!(
                    "Ignoring {} price edits for {}: the matrix is rebuilt",
                    edits.len(),
                    owner
                );
            }
            let stats = matrix.regenerate(&owner, &diff.properties).await?;
            info!("Rebuilt price matrix of {}: {:?}", owner, stats);
            (Some(stats), 0)
        } else {
            (None, matrix.apply_edits(&owner, &edits).await?)
        };

        Ok(VariantsOutcome {
            resized: diff.resized,
            properties: diff.properties,
            prices: self.store.list_prices(&owner).await?,
            changes: diff.stats,
            matrix: matrix_stats,
            prices_edited,
        })
    }
}
