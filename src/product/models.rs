use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use shalura::schema::{brands, categories, product_variants, products};
use validator::Validate;

/// Discounted unit price, rounded half-up to the whole currency unit. The
/// catalog currency carries no minor unit, so prices stay integral end to end.
pub fn final_unit_price(price: i64, discount_percent: i32) -> i64 {
    if discount_percent <= 0 {
        return price;
    }
    (price * (100 - i64::from(discount_percent)) + 50) / 100
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub discount_percent: i32,
    pub stock_quantity: i32,
    pub category_id: Option<i32>,
    pub brand_id: Option<i32>,
    pub rating: f64,
    pub review_count: i32,
    pub view_count: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Product {
    pub fn final_price(&self) -> i64 {
        final_unit_price(self.price, self.discount_percent)
    }
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = product_variants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductVariant {
    pub id: i32,
    pub product_id: i32,
    pub sku: String,
    pub name: String,
    pub value: String,
    pub price_adjustment: i64,
    pub stock_quantity: i32,
    pub sort_order: i32,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub parent_id: Option<i32>,
    pub sort_order: i32,
    pub is_active: bool,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug)]
#[diesel(table_name = brands)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Brand {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub is_active: bool,
}

#[derive(Serialize, Debug)]
pub struct ProductWithPrice {
    #[serde(flatten)]
    pub product: Product,
    pub final_price: i64,
}

impl From<Product> for ProductWithPrice {
    fn from(product: Product) -> Self {
        let final_price = product.final_price();
        ProductWithPrice {
            product,
            final_price,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct VariantWithPrice {
    #[serde(flatten)]
    pub variant: ProductVariant,
    pub final_price: i64,
}

#[derive(Serialize, Debug)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductWithPrice,
    pub product_variants: Vec<VariantWithPrice>,
}

#[derive(Insertable, Deserialize, Validate)]
#[diesel(table_name = products)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub description: String,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: i64,
    #[serde(default)]
    #[validate(range(min = 0, max = 100, message = "Discount must be between 0 and 100"))]
    pub discount_percent: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock_quantity: i32,
    pub category_id: Option<i32>,
    pub brand_id: Option<i32>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Deserialize, AsChangeset, Validate)]
#[diesel(table_name = products)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: Option<i64>,
    #[validate(range(min = 0, max = 100, message = "Discount must be between 0 and 100"))]
    pub discount_percent: Option<i32>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock_quantity: Option<i32>,
    pub category_id: Option<i32>,
    pub brand_id: Option<i32>,
    pub image_url: Option<String>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<i32>,
    pub brand: Option<i32>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub rating: Option<f64>,
    pub in_stock: Option<bool>,
    pub on_sale: Option<bool>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_applies_with_rounding() {
        assert_eq!(final_unit_price(100_000, 20), 80_000);
        // 999 * 0.67 = 669.33 rounds down
        assert_eq!(final_unit_price(999, 33), 669);
        // 125 * 0.5 = 62.5 rounds up
        assert_eq!(final_unit_price(125, 50), 63);
    }

    #[test]
    fn zero_discount_keeps_price() {
        assert_eq!(final_unit_price(100_000, 0), 100_000);
        assert_eq!(final_unit_price(7, 0), 7);
    }

    #[test]
    fn full_discount_is_free() {
        assert_eq!(final_unit_price(100_000, 100), 0);
    }
}
