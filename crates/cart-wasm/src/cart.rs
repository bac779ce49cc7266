//! The cart as seen from JavaScript.

use crate::storage::LocalStorage;
use crate::to_js_error;
use cart_core::{CartStore, PriceUpdate, Product, ProductId, VariantId};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;

pub(crate) type SharedCart = Rc<RefCell<CartStore<LocalStorage>>>;

/// `localStorage`-backed cart
#[wasm_bindgen]
#[derive(Debug)]
pub struct WasmCart {
    store: SharedCart,
}

#[wasm_bindgen]
impl WasmCart {
    /// Hydrate from `localStorage` (an empty cart if nothing was saved)
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmCart, JsValue> {
        let storage = LocalStorage::open().map_err(to_js_error)?;
        Ok(Self {
            store: Rc::new(RefCell::new(CartStore::open(storage))),
        })
    }

    /// Add one unit. `product` is `{id, name, sale_price, image_url?, variants?}`.
    pub fn add(&mut self, product: JsValue, variant_id: Option<i32>) -> Result<(), JsValue> {
        let product: Product = serde_wasm_bindgen::from_value(product)
            .map_err(|e| JsValue::from_str(&format!("Invalid product: {}", e)))?;
        self.store
            .borrow_mut()
            .add(&product, variant_id.map(VariantId::from));
        Ok(())
    }

    /// Remove every line of a product; returns how many lines went away
    pub fn remove(&mut self, product_id: i32) -> u32 {
        let removed = self.store.borrow_mut().remove(ProductId::from(product_id));
        u32::try_from(removed).unwrap_or(u32::MAX)
    }

    #[wasm_bindgen(js_name = removeVariant)]
    pub fn remove_variant(&mut self, product_id: i32, variant_id: Option<i32>) -> bool {
        self.store
            .borrow_mut()
            .remove_variant(ProductId::from(product_id), variant_id.map(VariantId::from))
    }

    /// Set a quantity; zero or less removes. Without `variant_id` every size of the product changes.
    #[wasm_bindgen(js_name = setQuantity)]
    pub fn set_quantity(&mut self, product_id: i32, quantity: i32, variant_id: Option<i32>) {
        let product_id = ProductId::from(product_id);
        let quantity = i64::from(quantity);
        let mut store = self.store.borrow_mut();
        match variant_id {
            Some(id) => store.set_variant_quantity(product_id, Some(VariantId::from(id)), quantity),
            None => store.set_quantity(product_id, quantity),
        }
    }

    pub fn clear(&mut self) {
        self.store.borrow_mut().clear();
    }

    pub fn total(&self) -> f64 {
        decimal_to_f64(self.store.borrow().total())
    }

    /// Total as the storefront displays it
    #[wasm_bindgen(js_name = totalDisplay)]
    pub fn total_display(&self) -> String {
        cart_core::Currency::COP.format_amount(self.store.borrow().total())
    }

    #[wasm_bindgen(js_name = itemCount)]
    pub fn item_count(&self) -> u32 {
        self.store.borrow().item_count()
    }

    /// `[{productId, variantId?, name, imageUrl?, quantity, unitPrice}]`
    pub fn lines(&self) -> Result<JsValue, JsValue> {
        to_js_value(self.store.borrow().lines())
    }

    /// Apply catalog prices `[{productId, variantId?, unitPrice}]`; returns the lines changed
    #[wasm_bindgen(js_name = applyPrices)]
    pub fn apply_prices(&mut self, updates: JsValue) -> Result<u32, JsValue> {
        let updates: Vec<PriceInput> = serde_wasm_bindgen::from_value(updates)
            .map_err(|e| JsValue::from_str(&format!("Invalid price updates: {}", e)))?;
        let updates: Vec<PriceUpdate> = updates.into_iter().map(PriceInput::into_update).collect();
        let changed = self.store.borrow_mut().apply_price_updates(&updates);
        Ok(u32::try_from(changed).unwrap_or(u32::MAX))
    }
}

impl WasmCart {
    pub(crate) fn store(&self) -> Ref<'_, CartStore<LocalStorage>> {
        self.store.borrow()
    }

    pub(crate) fn shared(&self) -> SharedCart {
        Rc::clone(&self.store)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceInput {
    product_id: ProductId,
    #[serde(default)]
    variant_id: Option<VariantId>,
    #[serde(with = "rust_decimal::serde::float")]
    unit_price: Decimal,
}

impl PriceInput {
    fn into_update(self) -> PriceUpdate {
        PriceUpdate::new(self.product_id, self.variant_id, self.unit_price)
    }
}

/// Plain JS objects rather than `Map`s
pub(crate) fn to_js_value<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn decimal_to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_input() {
        let input: PriceInput =
            serde_json::from_str(r#"{"productId": 7, "variantId": 3, "unitPrice": 21000}"#).unwrap();
        let update = input.into_update();
        assert_eq!(update.variant_id, Some(3));
        assert_eq!(update.unit_price, Decimal::from(21000));

        let bare: PriceInput = serde_json::from_str(r#"{"productId": 8, "unitPrice": 9500.5}"#).unwrap();
        assert_eq!(bare.into_update().variant_id, None);
    }

    #[test]
    fn test_decimal_to_f64() {
        assert_eq!(decimal_to_f64(Decimal::new(5000050, 2)), 50000.5);
    }
}
