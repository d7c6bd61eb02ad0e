use super::models::{
    CreateOrderPayload, ESTIMATED_DELIVERY_DAYS, LineSnapshot, NewOrder, Order, OrderDetail,
    OrderItem, OrderStatus, Pagination, PaymentStatus, generate_order_number, shipping_cost,
    tax_amount,
};
use crate::auth::models::AccessTokenClaims;
use crate::cart::models::CartItem;
use crate::product::models::{Product, ProductVariant};
use crate::user::models::UserAddress;
use crate::utils::error::ApiError;
use crate::utils::types::{ApiResult, Pool};
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde_json::{Value, json};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_PAGE_SIZE: i64 = 10;

async fn load_order_detail(
    conn: &mut AsyncPgConnection,
    order_id: i32,
    user_id: Uuid,
) -> Result<Option<OrderDetail>, ApiError> {
    use shalura::schema::{order_items, orders};

    let order: Option<Order> = orders::table
        .filter(orders::id.eq(order_id))
        .filter(orders::user_id.eq(user_id))
        .select(Order::as_select())
        .first(conn)
        .await
        .optional()?;

    let Some(order) = order else {
        return Ok(None);
    };

    let items: Vec<OrderItem> = order_items::table
        .filter(order_items::order_id.eq(order.id))
        .order(order_items::id.asc())
        .select(OrderItem::as_select())
        .load(conn)
        .await?;

    Ok(Some(OrderDetail { order, items }))
}

/// Checkout. One transaction end to end: the cart walk, stock re-checks and
/// decrements, the order and item inserts, and the cart wipe either all land
/// or none do.
pub async fn create_order(
    State(pool): State<Pool>,
    claims: AccessTokenClaims,
    Json(payload): Json<CreateOrderPayload>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    use shalura::schema::{cart_items, carts, order_items, orders, product_variants, products,
        user_addresses};

    payload.validate()?;

    let user_id = claims.user_id()?;
    let mut conn = pool.get().await?;

    let order_id = conn
        .transaction::<i32, ApiError, _>(|conn| {
            Box::pin(async move {
                let cart_id: Option<i32> = carts::table
                    .filter(carts::user_id.eq(user_id))
                    .select(carts::id)
                    .first(conn)
                    .await
                    .optional()?;
                let Some(cart_id) = cart_id else {
                    return Err(ApiError::EmptyCart);
                };

                let lines: Vec<(CartItem, Product, Option<ProductVariant>)> = cart_items::table
                    .filter(cart_items::cart_id.eq(cart_id))
                    .inner_join(products::table)
                    .left_join(product_variants::table)
                    .select(<(CartItem, Product, Option<ProductVariant>)>::as_select())
                    .order(cart_items::created_at.asc())
                    .load(conn)
                    .await?;
                if lines.is_empty() {
                    return Err(ApiError::EmptyCart);
                }

                let shipping_addr: Option<UserAddress> = user_addresses::table
                    .filter(user_addresses::id.eq(payload.shipping_address_id))
                    .filter(user_addresses::user_id.eq(user_id))
                    .select(UserAddress::as_select())
                    .first(conn)
                    .await
                    .optional()?;
                let shipping_addr = shipping_addr.ok_or_else(|| {
                    ApiError::InvalidReference("Invalid shipping address".to_owned())
                })?;

                let billing_addr = match payload.billing_address_id {
                    Some(billing_id) => {
                        let addr: Option<UserAddress> = user_addresses::table
                            .filter(user_addresses::id.eq(billing_id))
                            .filter(user_addresses::user_id.eq(user_id))
                            .select(UserAddress::as_select())
                            .first(conn)
                            .await
                            .optional()?;
                        addr.ok_or_else(|| {
                            ApiError::InvalidReference("Invalid billing address".to_owned())
                        })?
                    }
                    None => shipping_addr.clone(),
                };

                let mut subtotal: i64 = 0;
                let mut snapshots: Vec<LineSnapshot> = Vec::with_capacity(lines.len());

                for (line, product, variant) in &lines {
                    // Stock may have moved since the line was added; re-check
                    // against freshly locked rows.
                    let locked_product: Product = products::table
                        .find(line.product_id)
                        .select(Product::as_select())
                        .for_update()
                        .first(conn)
                        .await?;
                    let available = match line.variant_id {
                        Some(variant_id) => {
                            let locked_variant: ProductVariant = product_variants::table
                                .find(variant_id)
                                .select(ProductVariant::as_select())
                                .for_update()
                                .first(conn)
                                .await?;
                            locked_variant.stock_quantity
                        }
                        None => locked_product.stock_quantity,
                    };
                    if available < line.quantity {
                        return Err(ApiError::InsufficientStock(product.name.clone()));
                    }

                    let line_total = line.unit_price * i64::from(line.quantity);
                    subtotal += line_total;

                    snapshots.push(LineSnapshot {
                        product_id: line.product_id,
                        variant_id: line.variant_id,
                        product_name: product.name.clone(),
                        variant_name: variant.as_ref().map(|v| v.value.clone()),
                        quantity: line.quantity,
                        unit_price: line.unit_price,
                        total_price: line_total,
                        image_url: product.image_url.clone(),
                    });

                    // Variant lines move both counters; the parent product
                    // keeps the aggregate.
                    if let Some(variant_id) = line.variant_id {
                        diesel::update(product_variants::table.find(variant_id))
                            .set(
                                product_variants::stock_quantity
                                    .eq(product_variants::stock_quantity - line.quantity),
                            )
                            .execute(conn)
                            .await?;
                    }
                    diesel::update(products::table.find(line.product_id))
                        .set(products::stock_quantity.eq(products::stock_quantity - line.quantity))
                        .execute(conn)
                        .await?;
                }

                let shipping = shipping_cost(subtotal);
                let tax = tax_amount(subtotal);
                let now = Utc::now();

                let order: Order = diesel::insert_into(orders::table)
                    .values(&NewOrder {
                        order_number: generate_order_number(now),
                        user_id,
                        status: OrderStatus::Pending.as_str().to_owned(),
                        payment_status: PaymentStatus::Pending.as_str().to_owned(),
                        payment_method: payload.payment_method,
                        subtotal,
                        shipping_cost: shipping,
                        tax_amount: tax,
                        total_amount: subtotal + shipping + tax,
                        shipping_address_id: shipping_addr.id,
                        billing_address_id: billing_addr.id,
                        shipping_address: shipping_addr.formatted(),
                        billing_address: billing_addr.formatted(),
                        notes: payload.notes,
                        estimated_delivery: (now
                            + chrono::Duration::days(ESTIMATED_DELIVERY_DAYS))
                        .naive_utc(),
                    })
                    .returning(Order::as_returning())
                    .get_result(conn)
                    .await?;

                let items: Vec<_> = snapshots
                    .into_iter()
                    .map(|snapshot| snapshot.into_order_item(order.id))
                    .collect();
                diesel::insert_into(order_items::table)
                    .values(&items)
                    .execute(conn)
                    .await?;

                diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(cart_id)))
                    .execute(conn)
                    .await?;

                tracing::info!(order_number = %order.order_number, "order placed");

                Ok(order.id)
            })
        })
        .await?;

    let detail = load_order_detail(&mut conn, order_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order".to_owned()))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "order": detail,
            "message": "Order created successfully",
        })),
    ))
}

pub async fn get_orders(
    State(pool): State<Pool>,
    claims: AccessTokenClaims,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<Value>> {
    use shalura::schema::orders;

    let user_id = claims.user_id()?;
    let mut conn = pool.get().await?;

    let page = pagination.page.unwrap_or(1).max(1);
    let limit = pagination.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
    let offset = (page - 1) * limit;

    let total: i64 = orders::table
        .filter(orders::user_id.eq(user_id))
        .count()
        .get_result(&mut conn)
        .await?;

    let rows: Vec<Order> = orders::table
        .filter(orders::user_id.eq(user_id))
        .order(orders::created_at.desc())
        .limit(limit)
        .offset(offset)
        .select(Order::as_select())
        .load(&mut conn)
        .await?;

    let items: Vec<OrderItem> = OrderItem::belonging_to(&rows)
        .select(OrderItem::as_select())
        .load(&mut conn)
        .await?;

    let details: Vec<OrderDetail> = items
        .grouped_by(&rows)
        .into_iter()
        .zip(rows)
        .map(|(items, order)| OrderDetail { order, items })
        .collect();

    Ok(Json(json!({
        "success": true,
        "count": total,
        "totalPages": (total + limit - 1) / limit,
        "currentPage": page,
        "orders": details,
    })))
}

pub async fn get_order(
    State(pool): State<Pool>,
    claims: AccessTokenClaims,
    Path(id): Path<i32>,
) -> ApiResult<Json<Value>> {
    let mut conn = pool.get().await?;

    let detail = load_order_detail(&mut conn, id, claims.user_id()?)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order".to_owned()))?;

    Ok(Json(json!({ "success": true, "order": detail })))
}

/// Cancellation restocks every line (exact inverse of placement) and stamps
/// the order, in one transaction.
pub async fn cancel_order(
    State(pool): State<Pool>,
    claims: AccessTokenClaims,
    Path(id): Path<i32>,
) -> ApiResult<Json<Value>> {
    use shalura::schema::{order_items, orders, product_variants, products};

    let user_id = claims.user_id()?;
    let mut conn = pool.get().await?;

    conn.transaction::<(), ApiError, _>(|conn| {
        Box::pin(async move {
            let order: Option<Order> = orders::table
                .filter(orders::id.eq(id))
                .filter(orders::user_id.eq(user_id))
                .select(Order::as_select())
                .for_update()
                .first(conn)
                .await
                .optional()?;
            let order = order.ok_or(ApiError::InvalidTransition)?;

            let cancellable = OrderStatus::parse(&order.status)
                .map(|status| status.can_cancel())
                .unwrap_or(false);
            if !cancellable {
                return Err(ApiError::InvalidTransition);
            }

            let items: Vec<OrderItem> = order_items::table
                .filter(order_items::order_id.eq(order.id))
                .select(OrderItem::as_select())
                .load(conn)
                .await?;

            for item in &items {
                if let Some(variant_id) = item.variant_id {
                    diesel::update(product_variants::table.find(variant_id))
                        .set(
                            product_variants::stock_quantity
                                .eq(product_variants::stock_quantity + item.quantity),
                        )
                        .execute(conn)
                        .await?;
                }
                diesel::update(products::table.find(item.product_id))
                    .set(products::stock_quantity.eq(products::stock_quantity + item.quantity))
                    .execute(conn)
                    .await?;
            }

            diesel::update(orders::table.find(order.id))
                .set((
                    orders::status.eq(OrderStatus::Cancelled.as_str()),
                    orders::cancelled_at.eq(Utc::now().naive_utc()),
                ))
                .execute(conn)
                .await?;

            tracing::info!(order_number = %order.order_number, "order cancelled");

            Ok(())
        })
    })
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Order cancelled successfully",
    })))
}
