//! # Price Reconciliation
//!
//! The cart trusts the most recently supplied price. `CartStore::add` applies
//! that rule directly; catalog refreshes come through [`PriceUpdate`]s, which
//! may resolve after the shopper has already changed the cart.

use crate::cart::CartStore;
use crate::product::{Product, ProductId, VariantId};
use crate::storage::KeyValueStore;
use rust_decimal::Decimal;
use tracing::debug;

/// Latest catalog price for one `(product, variant)` selection
#[derive(Debug, Clone, PartialEq)]
pub struct PriceUpdate {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub unit_price: Decimal,
}

impl PriceUpdate {
    pub fn new(product_id: ProductId, variant_id: Option<VariantId>, unit_price: Decimal) -> Self {
        Self {
            product_id,
            variant_id,
            unit_price,
        }
    }

    /// Every selection a catalog product offers: one per variant plus the bare product
    pub fn from_product(product: &Product) -> Vec<PriceUpdate> {
        std::iter::once(PriceUpdate::new(product.id, None, product.sale_price))
            .chain(
                product
                    .variants
                    .iter()
                    .map(|v| PriceUpdate::new(product.id, Some(v.id), v.sale_price)),
            )
            .collect()
    }
}

impl<S: KeyValueStore> CartStore<S> {
    /// Apply catalog prices to lines that still exist.
    ///
    /// Updates for lines removed since the refresh started are ignored.
    /// Returns the number of lines whose price changed.
    pub fn apply_price_updates(&mut self, updates: &[PriceUpdate]) -> usize {
        let mut changed = 0;
        for update in updates {
            let Some(line) = self.line_mut(update.product_id, update.variant_id) else {
                continue;
            };
            if line.unit_price != update.unit_price {
                debug!(
                    product_id = update.product_id,
                    variant_id = ?update.variant_id,
                    "Repricing cart line {} -> {}",
                    line.unit_price,
                    update.unit_price
                );
                line.unit_price = update.unit_price;
                changed += 1;
            }
        }
        if changed > 0 {
            self.save();
        }
        changed
    }
}
