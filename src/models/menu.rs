//! Menu products and categories.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category id of main dishes.
pub const CATEGORY_FOOD: i64 = 1;
/// Category id of drinks.
pub const CATEGORY_DRINKS: i64 = 2;
/// Category id of side dishes and extras.
pub const CATEGORY_ADDITIONAL: i64 = 3;

/// A product on the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: i64,
    pub name: String,
    pub price: Decimal,
    /// Image URL, if one was uploaded.
    #[serde(default)]
    pub image: Option<String>,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: i64,
    pub name: String,
}
