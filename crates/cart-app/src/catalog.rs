//! # Catalog Client
//!
//! Reads active products from the storefront and turns them into cart-side
//! [`Product`]s and [`PriceUpdate`]s. Catalog failures never block the
//! cart: they are logged and the cart keeps its last known prices.

use cart_core::{
    CartStore, CheckoutError, CheckoutResult, KeyValueStore, PriceUpdate, Product, ProductId,
    Variant, VariantId,
};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Active products, relative to the backend base URL
pub const ACTIVE_PRODUCTS_PATH: &str = "/api/productos/activos";

/// Storefront catalog client
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> CheckoutResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CheckoutError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// All active products.
    ///
    /// Records without a usable price are skipped.
    #[instrument(skip(self))]
    pub async fn fetch_products(&self) -> CheckoutResult<Vec<Product>> {
        let url = format!("{}{}", self.base_url, ACTIVE_PRODUCTS_PATH);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CheckoutError::Provider {
                provider: "storefront".to_string(),
                message: format!("HTTP {} from {}", status, ACTIVE_PRODUCTS_PATH),
            });
        }

        let listing: CatalogListing = response.json().await.map_err(|e| {
            CheckoutError::Serialization(format!("Failed to parse catalog: {}", e))
        })?;

        let records = listing.into_records();
        let total = records.len();
        let products: Vec<Product> = records.into_iter().filter_map(CatalogProduct::into_product).collect();
        if products.len() < total {
            warn!("Skipped {} catalog products without a price", total - products.len());
        }
        debug!("Fetched {} active products", products.len());
        Ok(products)
    }

    /// Look up one active product
    pub async fn product(&self, product_id: ProductId) -> CheckoutResult<Option<Product>> {
        Ok(self
            .fetch_products()
            .await?
            .into_iter()
            .find(|p| p.id == product_id))
    }

    /// Latest prices for every catalog selection; empty when the catalog is unreachable
    pub async fn price_updates(&self) -> Vec<PriceUpdate> {
        match self.fetch_products().await {
            Ok(products) => products.iter().flat_map(PriceUpdate::from_product).collect(),
            Err(e) => {
                warn!("Price refresh failed, keeping cart prices: {}", e);
                Vec::new()
            }
        }
    }

    /// Refresh cart prices from the catalog. Returns how many lines changed.
    pub async fn refresh_prices<S: KeyValueStore>(&self, cart: &mut CartStore<S>) -> usize {
        let updates = self.price_updates().await;
        let changed = cart.apply_price_updates(&updates);
        info!("Price refresh updated {} cart lines", changed);
        changed
    }

    /// Like [`refresh_prices`](Self::refresh_prices), abandoned when `cancel` resolves first.
    ///
    /// A cancelled refresh leaves the cart untouched and returns `Cancelled`.
    pub async fn refresh_prices_until<S, C>(
        &self,
        cart: &mut CartStore<S>,
        cancel: C,
    ) -> CheckoutResult<usize>
    where
        S: KeyValueStore,
        C: Future<Output = ()>,
    {
        let updates = tokio::select! {
            updates = self.price_updates() => updates,
            _ = cancel => {
                info!("Price refresh cancelled");
                return Err(CheckoutError::Cancelled);
            }
        };
        Ok(cart.apply_price_updates(&updates))
    }
}

// =============================================================================
// Catalog wire types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogListing {
    Bare(Vec<CatalogProduct>),
    Wrapped { data: Vec<CatalogProduct> },
}

impl CatalogListing {
    fn into_records(self) -> Vec<CatalogProduct> {
        match self {
            CatalogListing::Bare(records) | CatalogListing::Wrapped { data: records } => records,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogProduct {
    id: ProductId,
    #[serde(default)]
    nombre: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    precio_venta: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    precio: Option<Decimal>,
    #[serde(default)]
    imagenes: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    variante: Option<Vec<CatalogVariant>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogVariant {
    #[serde(default)]
    talla: Option<CatalogSize>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    precio_venta: Option<Decimal>,
    #[serde(default)]
    stock_actual: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CatalogSize {
    id: VariantId,
    #[serde(default)]
    nombre: Option<String>,
}

impl CatalogProduct {
    fn into_product(self) -> Option<Product> {
        let variants: Vec<Variant> = self
            .variante
            .unwrap_or_default()
            .into_iter()
            .filter_map(CatalogVariant::into_variant)
            .collect();

        // A product priced only through its variants is still sellable per variant
        let sale_price = self
            .precio_venta
            .or(self.precio)
            .or_else(|| variants.iter().map(|v| v.sale_price).min())?;

        let image = self.imagenes.as_deref().and_then(first_image_url);
        let mut product = Product::new(self.id, self.nombre.unwrap_or_default(), sale_price);
        if let Some(url) = image {
            product = product.with_image(url);
        }
        Some(variants.into_iter().fold(product, Product::with_variant))
    }
}

impl CatalogVariant {
    // The size id is what the cart and the order API call the variant id
    fn into_variant(self) -> Option<Variant> {
        let talla = self.talla?;
        let price = self.precio_venta?;
        Some(Variant::new(
            talla.id,
            talla.nombre.unwrap_or_default(),
            price,
            self.stock_actual.unwrap_or(0),
        ))
    }
}

/// Images come either as URLs or as `{url, ...}` objects
fn first_image_url(images: &[serde_json::Value]) -> Option<String> {
    images.iter().find_map(|image| match image {
        serde_json::Value::String(url) => Some(url.clone()),
        other => other.get("url").and_then(|u| u.as_str()).map(str::to_string),
    })
}
