use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use shalura::schema::{order_items, orders};
use uuid::Uuid;
use validator::Validate;

/// Free shipping strictly above this subtotal, flat fee at or below it.
pub const FREE_SHIPPING_THRESHOLD: i64 = 300_000;
pub const FLAT_SHIPPING_FEE: i64 = 15_000;
/// VAT, percent of subtotal.
pub const TAX_RATE_PERCENT: i64 = 11;
pub const ESTIMATED_DELIVERY_DAYS: i64 = 5;

pub fn shipping_cost(subtotal: i64) -> i64 {
    if subtotal > FREE_SHIPPING_THRESHOLD {
        0
    } else {
        FLAT_SHIPPING_FEE
    }
}

pub fn tax_amount(subtotal: i64) -> i64 {
    (subtotal * TAX_RATE_PERCENT + 50) / 100
}

pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..9].to_uppercase();
    format!("ORD-{}-{}", now.timestamp_millis(), suffix)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "processing" => Some(OrderStatus::Processing),
            "shipped" => Some(OrderStatus::Shipped),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// The status moves forward only; cancellation is allowed until the order
    /// ships.
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Order {
    pub id: i32,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    pub shipping_address_id: Uuid,
    pub billing_address_id: Uuid,
    pub shipping_address: String,
    pub billing_address: String,
    pub notes: Option<String>,
    pub estimated_delivery: NaiveDateTime,
    pub cancelled_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub order_number: String,
    pub user_id: Uuid,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    pub shipping_address_id: Uuid,
    pub billing_address_id: Uuid,
    pub shipping_address: String,
    pub billing_address: String,
    pub notes: Option<String>,
    pub estimated_delivery: NaiveDateTime,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(Order))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub quantity: i32,
    pub unit_price: i64,
    pub total_price: i64,
    pub image_url: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItem {
    pub order_id: i32,
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub quantity: i32,
    pub unit_price: i64,
    pub total_price: i64,
    pub image_url: Option<String>,
}

/// Per-line snapshot gathered while walking the cart, before the order row
/// exists to hang items off.
pub struct LineSnapshot {
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub quantity: i32,
    pub unit_price: i64,
    pub total_price: i64,
    pub image_url: Option<String>,
}

impl LineSnapshot {
    pub fn into_order_item(self, order_id: i32) -> NewOrderItem {
        NewOrderItem {
            order_id,
            product_id: self.product_id,
            variant_id: self.variant_id,
            product_name: self.product_name,
            variant_name: self.variant_name,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_price: self.total_price,
            image_url: self.image_url,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    pub shipping_address_id: Uuid,
    pub billing_address_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Payment method is required"))]
    pub payment_method: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::models::final_unit_price;
    use chrono::TimeZone;

    #[test]
    fn shipping_is_free_only_above_threshold() {
        assert_eq!(shipping_cost(160_000), FLAT_SHIPPING_FEE);
        assert_eq!(shipping_cost(FREE_SHIPPING_THRESHOLD), FLAT_SHIPPING_FEE);
        assert_eq!(shipping_cost(FREE_SHIPPING_THRESHOLD + 1), 0);
    }

    #[test]
    fn tax_is_eleven_percent_rounded() {
        assert_eq!(tax_amount(160_000), 17_600);
        assert_eq!(tax_amount(0), 0);
        // 11% of 95 = 10.45 rounds down
        assert_eq!(tax_amount(95), 10);
        // 11% of 50 = 5.5 rounds up
        assert_eq!(tax_amount(50), 6);
    }

    #[test]
    fn checkout_totals_compose() {
        // two units of a 100000 product at 20% off
        let unit = final_unit_price(100_000, 20);
        let subtotal = unit * 2;
        assert_eq!(subtotal, 160_000);

        let shipping = shipping_cost(subtotal);
        assert_eq!(shipping, 15_000);

        let tax = tax_amount(subtotal);
        assert_eq!(tax, 17_600);

        assert_eq!(subtotal + shipping + tax, 192_600);
    }

    #[test]
    fn cancellation_window_closes_at_shipping() {
        assert!(OrderStatus::Pending.can_cancel());
        assert!(OrderStatus::Confirmed.can_cancel());
        assert!(OrderStatus::Processing.can_cancel());
        assert!(!OrderStatus::Shipped.can_cancel());
        assert!(!OrderStatus::Completed.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("returned"), None);
    }

    #[test]
    fn order_number_embeds_timestamp_and_suffix() {
        let now = Utc.timestamp_millis_opt(1_750_000_000_000).single().unwrap();
        let number = generate_order_number(now);

        let parts: Vec<&str> = number.splitn(3, '-').collect();
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1], "1750000000000");
        assert_eq!(parts[2].len(), 9);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }
}
