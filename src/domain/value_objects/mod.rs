//! Value Objects for the menu catalog

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every allocated SKU starts with this house prefix.
pub const SKU_HOUSE_PREFIX: &str = "HP";

/// SKU (Stock Keeping Unit) value object.
///
/// Shaped `HP-<CAT>-<NNN>`, where `<CAT>` is the first three letters of the
/// category name in upper case and `<NNN>` a zero-padded sequence number.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    /// Allocate the next SKU for `category`, given the SKUs already in use.
    ///
    /// Category names shorter than three characters yield a shorter prefix.
    pub fn allocate<'a>(category: &str, existing: impl IntoIterator<Item = &'a Sku>) -> Self {
        let prefix = Self::prefix_for(category);
        let next = existing
            .into_iter()
            .filter(|sku| sku.0.starts_with(&prefix))
            .filter_map(Sku::sequence)
            .max()
            .unwrap_or(0)
            + 1;
        Self(format!("{prefix}-{next:03}"))
    }

    /// `HP-` followed by the first three characters of the category, upper-cased.
    pub fn prefix_for(category: &str) -> String {
        let head: String = category.chars().take(3).collect();
        format!("{SKU_HOUSE_PREFIX}-{}", head.to_uppercase())
    }

    /// Numeric suffix: the third dash-delimited token, if it parses.
    pub fn sequence(&self) -> Option<u32> {
        self.0.split('-').nth(2).and_then(|token| token.parse().ok())
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Money value object. Single-currency (USD) menu prices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn from_cents(cents: i64) -> Self { Self(Decimal::new(cents, 2)) }
    pub fn zero() -> Self { Self(Decimal::ZERO) }
    pub fn amount(&self) -> Decimal { self.0 }

    /// Round to whole cents, halves away from zero.
    pub fn round_to_cents(self) -> Self {
        Self(self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Scale by `percent` (e.g. `5` for +5%, `-5` for -5%), rounded to cents.
    pub fn scale_percent(self, percent: Decimal) -> Self {
        Self(self.0 * (Decimal::ONE_HUNDRED + percent) / Decimal::ONE_HUNDRED).round_to_cents()
    }

    pub fn plus(self, amount: Decimal) -> Self { Self(self.0 + amount).round_to_cents() }

    /// Subtract, flooring the result at zero.
    pub fn minus_floored(self, amount: Decimal) -> Self {
        Self((self.0 - amount).max(Decimal::ZERO)).round_to_cents()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.round_to_cents().0;
        if rounded.is_sign_negative() && !rounded.is_zero() {
            write!(f, "-${:.2}", rounded.abs())
        } else {
            write!(f, "${:.2}", rounded.abs())
        }
    }
}

/// Quantity value object. Never negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: u32) -> Self { Self(self.0.saturating_add(other)) }
    /// Remove stock, flooring at zero.
    pub fn subtract(&self, other: u32) -> Self { Self(self.0.saturating_sub(other)) }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}
