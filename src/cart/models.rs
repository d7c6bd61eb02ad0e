use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use shalura::schema::{cart_items, carts};
use uuid::Uuid;
use validator::Validate;

use crate::product::models::{Product, ProductVariant, final_unit_price};

/// Snapshot price for a cart line: discounted product price plus the variant
/// delta when one is selected. Captured at add time and overwritten on
/// repeat-add, never re-derived on read.
pub fn line_unit_price(price: i64, discount_percent: i32, price_adjustment: i64) -> i64 {
    final_unit_price(price, discount_percent) + price_adjustment
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Cart {
    pub id: i32,
    pub user_id: Option<Uuid>,
    pub session_token: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = carts)]
pub struct NewCart {
    pub user_id: Option<Uuid>,
    pub session_token: Option<String>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItem {
    pub id: i32,
    pub cart_id: i32,
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub quantity: i32,
    pub unit_price: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = cart_items)]
pub struct NewCartItem {
    pub cart_id: i32,
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub quantity: i32,
    pub unit_price: i64,
}

#[derive(Serialize, Debug)]
pub struct CartItemDetail {
    #[serde(flatten)]
    pub item: CartItem,
    pub product: Product,
    pub variant: Option<ProductVariant>,
}

#[derive(Serialize, Debug)]
pub struct CartDetail {
    #[serde(flatten)]
    pub cart: Cart,
    pub items: Vec<CartItemDetail>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartPayload {
    pub product_id: i32,
    pub variant_id: Option<i32>,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCartItemPayload {
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_price_applies_discount_then_adjustment() {
        assert_eq!(line_unit_price(100_000, 20, 0), 80_000);
        assert_eq!(line_unit_price(100_000, 20, 5_000), 85_000);
        // negative adjustments are valid for cheaper variants
        assert_eq!(line_unit_price(100_000, 0, -10_000), 90_000);
    }
}
