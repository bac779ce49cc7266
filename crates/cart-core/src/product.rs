//! # Product Types
//!
//! Catalog-side types the cart is built from.
//! A product either has size variants (each with its own price and stock)
//! or is sold as-is at its own sale price.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Backend identifier of a base product
pub type ProductId = i64;

/// Backend identifier of a size/variant (the "talla")
pub type VariantId = i64;

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    COP,
    USD,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::COP => "COP",
            Currency::USD => "USD",
        }
    }

    /// Number of decimal places the payment provider expects in minor units
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::COP | Currency::USD => 2,
        }
    }

    /// Convert a decimal amount to the smallest currency unit.
    ///
    /// Rounds half away from zero. Returns `None` when the result does not fit in an `i64`.
    pub fn to_minor_units(&self, amount: Decimal) -> Option<i64> {
        let multiplier = Decimal::from(10_i64.pow(self.decimal_places()));
        amount
            .checked_mul(multiplier)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }

    /// Convert from smallest unit back to a decimal amount
    pub fn from_minor_units(&self, amount: i64) -> Decimal {
        Decimal::new(amount, self.decimal_places())
    }

    /// Storefront display format: `$ 50.000,00` (dot thousands, comma decimals)
    pub fn format_amount(&self, amount: Decimal) -> String {
        let Some(minor) = self.to_minor_units(amount) else {
            return format!("{} {}", amount, self.as_str());
        };
        let scale = 10_u64.pow(self.decimal_places());
        let sign = if minor < 0 { "-" } else { "" };
        let magnitude = minor.unsigned_abs();

        let digits = (magnitude / scale).to_string();
        let mut integer = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                integer.push('.');
            }
            integer.push(c);
        }

        format!(
            "{}$ {},{:0width$}",
            sign,
            integer,
            magnitude % scale,
            width = self.decimal_places() as usize
        )
    }

    /// Parse an ISO code, case-insensitively
    pub fn parse(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "COP" => Some(Currency::COP),
            "USD" => Some(Currency::USD),
            _ => None,
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::COP
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchasable size/option of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// Variant (size) identifier
    pub id: VariantId,

    /// Display label (e.g. "M", "10")
    #[serde(default)]
    pub label: String,

    /// Sale price of this variant
    pub sale_price: Decimal,

    /// Units currently in stock
    #[serde(default)]
    pub stock: i64,
}

impl Variant {
    pub fn new(id: VariantId, label: impl Into<String>, sale_price: Decimal, stock: i64) -> Self {
        Self {
            id,
            label: label.into(),
            sale_price,
            stock,
        }
    }

    /// Whether an "add to cart" control should be enabled
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A product as the catalog last reported it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier
    pub id: ProductId,

    /// Display name
    pub name: String,

    /// Sale price used when the product has no variants
    pub sale_price: Decimal,

    /// First image, for cart display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Size variants; empty for products sold as-is
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<Variant>,
}

impl Product {
    /// Create a product without variants
    pub fn new(id: ProductId, name: impl Into<String>, sale_price: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            sale_price,
            image_url: None,
            variants: Vec::new(),
        }
    }

    /// Builder: set image URL
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Builder: add a variant
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variants.push(variant);
        self
    }

    /// Find a variant by id
    pub fn variant(&self, variant_id: VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    /// The price that applies to the given selection.
    ///
    /// Unknown or absent variants fall back to the product's own price.
    pub fn price_for(&self, variant_id: Option<VariantId>) -> Decimal {
        variant_id
            .and_then(|id| self.variant(id))
            .map(|v| v.sale_price)
            .unwrap_or(self.sale_price)
    }

    /// Stock rule for "add to cart" controls.
    ///
    /// Products with sizes need a known, in-stock size. Products without
    /// variants carry no stock information and are always addable.
    pub fn can_add(&self, variant_id: Option<VariantId>) -> bool {
        match variant_id {
            Some(id) => self.variant(id).is_some_and(Variant::in_stock),
            None => self.variants.is_empty(),
        }
    }

    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_minor_units() {
        let cop = Currency::COP;
        assert_eq!(cop.to_minor_units(dec!(50000)), Some(5_000_000));
        assert_eq!(cop.to_minor_units(dec!(10.99)), Some(1099));
        assert_eq!(cop.to_minor_units(dec!(0.005)), Some(1));
        assert_eq!(cop.to_minor_units(dec!(0.004)), Some(0));
        assert_eq!(cop.from_minor_units(1099), dec!(10.99));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(Currency::COP.format_amount(dec!(50000)), "$ 50.000,00");
        assert_eq!(Currency::COP.format_amount(dec!(1234567.891)), "$ 1.234.567,89");
        assert_eq!(Currency::COP.format_amount(dec!(999)), "$ 999,00");
        assert_eq!(Currency::COP.format_amount(dec!(0.5)), "$ 0,50");
        assert_eq!(Currency::COP.format_amount(dec!(-25000)), "-$ 25.000,00");
    }

    #[test]
    fn test_currency_parse_and_display() {
        assert_eq!(Currency::parse("cop"), Some(Currency::COP));
        assert_eq!(Currency::parse("EUR"), None);
        assert_eq!(Currency::COP.to_string(), "COP");
        assert_eq!(Currency::default(), Currency::COP);
    }

    #[test]
    fn test_variant_price_resolution() {
        let product = Product::new(7, "Pijama Luna", dec!(30000))
            .with_variant(Variant::new(3, "M", dec!(25000), 4))
            .with_variant(Variant::new(4, "L", dec!(27000), 0));

        assert_eq!(product.price_for(Some(3)), dec!(25000));
        assert_eq!(product.price_for(None), dec!(30000));
        assert_eq!(product.price_for(Some(99)), dec!(30000));
        assert_eq!(product.price_for(Some(4)), dec!(27000));
    }

    #[test]
    fn test_stock_rule() {
        let product = Product::new(7, "Pijama Luna", dec!(30000))
            .with_variant(Variant::new(3, "M", dec!(25000), 1))
            .with_variant(Variant::new(4, "L", dec!(27000), 0));

        assert!(product.can_add(Some(3)));
        assert!(!product.can_add(Some(4)));
        assert!(!product.can_add(Some(99)));
        // a sized product always needs a size
        assert!(!product.can_add(None));

        let plain = Product::new(8, "Antifaz", dec!(9000));
        assert!(plain.can_add(None));
        assert!(!plain.can_add(Some(3)));
    }
}
