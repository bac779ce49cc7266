//! # Cart Store
//!
//! The shopping cart: one line per `(product, variant)` pair, persisted to a
//! [`KeyValueStore`] under [`CART_KEY`] after every mutation.
//!
//! The persisted shape is the storefront's historical one, a JSON array of
//! `{producto, quantity, tallaId?}` records, so carts written by older clients
//! hydrate cleanly.

use crate::product::{Product, ProductId, VariantId};
use crate::storage::{KeyValueStore, CART_KEY};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One entry in the cart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Base product
    pub product_id: ProductId,

    /// Chosen size; `None` for products without variants
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,

    /// Product name (denormalized for display)
    pub name: String,

    /// Optional image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Always at least 1 while the line exists
    pub quantity: u32,

    /// Latest known sale price for this selection
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

impl CartLine {
    /// `unit_price × quantity`
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    fn matches(&self, product_id: ProductId, variant_id: Option<VariantId>) -> bool {
        self.product_id == product_id && self.variant_id == variant_id
    }
}

/// Derived view of the cart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub item_count: u32,
}

/// The cart, owning its persistence adapter.
///
/// All mutation goes through the methods below; each one persists the full
/// line list before returning.
#[derive(Debug, Clone)]
pub struct CartStore<S: KeyValueStore> {
    storage: S,
    lines: Vec<CartLine>,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Hydrate from `storage`.
    ///
    /// A missing key gives an empty cart. Unreadable data also gives an empty
    /// cart (logged) rather than an error.
    pub fn open(storage: S) -> Self {
        let lines = match storage.get(CART_KEY) {
            Ok(Some(raw)) => decode_lines(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Could not read persisted cart, starting empty: {}", e);
                Vec::new()
            }
        };
        debug!("Hydrated cart with {} lines", lines.len());
        Self { storage, lines }
    }

    /// Add one unit of `product` (optionally a specific variant).
    ///
    /// An existing line for the same pair is incremented and repriced;
    /// otherwise a new line with quantity 1 is appended.
    pub fn add(&mut self, product: &Product, variant_id: Option<VariantId>) {
        let unit_price = product.price_for(variant_id);

        match self
            .lines
            .iter_mut()
            .find(|line| line.matches(product.id, variant_id))
        {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(1);
                line.unit_price = unit_price;
                line.name = product.name.clone();
                if product.image_url.is_some() {
                    line.image_url = product.image_url.clone();
                }
            }
            None => self.lines.push(CartLine {
                product_id: product.id,
                variant_id,
                name: product.name.clone(),
                image_url: product.image_url.clone(),
                quantity: 1,
                unit_price,
            }),
        }
        self.save();
    }

    /// Remove every line of `product_id`, whatever the variant.
    /// Returns how many lines were removed.
    pub fn remove(&mut self, product_id: ProductId) -> usize {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        let removed = before - self.lines.len();
        if removed > 0 {
            self.save();
        }
        removed
    }

    /// Remove only the line for this exact `(product, variant)` pair
    pub fn remove_variant(&mut self, product_id: ProductId, variant_id: Option<VariantId>) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| !line.matches(product_id, variant_id));
        let removed = self.lines.len() != before;
        if removed {
            self.save();
        }
        removed
    }

    /// Set the quantity of every line of `product_id`. Zero or less removes them.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i64) {
        self.update_quantity(|line| line.product_id == product_id, quantity);
    }

    /// Set the quantity of a single `(product, variant)` line. Zero or less removes it.
    pub fn set_variant_quantity(
        &mut self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: i64,
    ) {
        self.update_quantity(|line| line.matches(product_id, variant_id), quantity);
    }

    fn update_quantity(&mut self, mut selects: impl FnMut(&CartLine) -> bool, quantity: i64) {
        if quantity <= 0 {
            self.lines.retain(|line| !selects(line));
        } else {
            let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            for line in self.lines.iter_mut().filter(|line| selects(line)) {
                line.quantity = quantity;
            }
        }
        self.save();
    }

    /// Empty the cart
    pub fn clear(&mut self) {
        self.lines.clear();
        self.save();
    }

    /// `Σ(unit_price × quantity)`
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Lines in insertion order
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up the line for a `(product, variant)` pair
    pub fn line(&self, product_id: ProductId, variant_id: Option<VariantId>) -> Option<&CartLine> {
        self.lines
            .iter()
            .find(|line| line.matches(product_id, variant_id))
    }

    pub(crate) fn line_mut(
        &mut self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.matches(product_id, variant_id))
    }

    /// Total units across all lines, saturating at `u32::MAX`
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |count, line| count.saturating_add(line.quantity))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
            total: self.total(),
            item_count: self.item_count(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Write the current lines, reporting failure to the caller
    pub fn persist(&mut self) -> crate::CheckoutResult<()> {
        let encoded = encode_lines(&self.lines)?;
        self.storage.set(CART_KEY, &encoded)
    }

    /// Persist after a mutation. The in-memory cart stays authoritative if this fails.
    pub(crate) fn save(&mut self) {
        if let Err(e) = self.persist() {
            warn!("Failed to persist cart ({} lines): {}", self.lines.len(), e);
        }
    }
}

// =============================================================================
// Persisted format
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct StoredLine {
    producto: StoredProduct,
    quantity: i64,
    #[serde(rename = "tallaId", default, skip_serializing_if = "Option::is_none")]
    talla_id: Option<VariantId>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredProduct {
    id: ProductId,
    #[serde(default)]
    nombre: String,
    #[serde(
        rename = "precioVenta",
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    precio_venta: Option<Decimal>,
    // Older clients wrote the price here
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    precio: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    imagen: Option<String>,
}

impl StoredLine {
    fn into_line(self) -> Option<CartLine> {
        let unit_price = self.producto.precio_venta.or(self.producto.precio)?;
        let quantity = u32::try_from(self.quantity).ok().filter(|q| *q > 0)?;
        Some(CartLine {
            product_id: self.producto.id,
            variant_id: self.talla_id,
            name: self.producto.nombre,
            image_url: self.producto.imagen,
            quantity,
            unit_price,
        })
    }

    fn from_line(line: &CartLine) -> Self {
        Self {
            producto: StoredProduct {
                id: line.product_id,
                nombre: line.name.clone(),
                precio_venta: Some(line.unit_price),
                precio: Some(line.unit_price),
                imagen: line.image_url.clone(),
            },
            quantity: i64::from(line.quantity),
            talla_id: line.variant_id,
        }
    }
}

fn encode_lines(lines: &[CartLine]) -> crate::CheckoutResult<String> {
    let stored: Vec<StoredLine> = lines.iter().map(StoredLine::from_line).collect();
    Ok(serde_json::to_string(&stored)?)
}

/// Decode persisted lines, dropping records that cannot form a valid line
/// and merging duplicate `(product, variant)` pairs.
fn decode_lines(raw: &str) -> Vec<CartLine> {
    let records: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(records) => records,
        Err(e) => {
            warn!("Persisted cart is not valid JSON, starting empty: {}", e);
            return Vec::new();
        }
    };

    let mut lines: Vec<CartLine> = Vec::with_capacity(records.len());
    for record in records {
        let line = serde_json::from_value::<StoredLine>(record)
            .ok()
            .and_then(StoredLine::into_line);
        let Some(line) = line else {
            warn!("Dropping unreadable cart line");
            continue;
        };
        match lines
            .iter_mut()
            .find(|l| l.matches(line.product_id, line.variant_id))
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
                existing.unit_price = line.unit_price;
            }
            None => lines.push(line),
        }
    }
    lines
}
