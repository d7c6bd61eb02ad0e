use super::models::{
    AddToCartPayload, Cart, CartDetail, CartItem, CartItemDetail, NewCart, NewCartItem,
    UpdateCartItemPayload, line_unit_price,
};
use crate::auth::models::OptionalClaims;
use crate::product::models::{Product, ProductVariant};
use crate::utils::error::ApiError;
use crate::utils::types::{ApiResult, Pool};
use axum::extract::{Json, Path, State};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde_json::{Value, json};
use uuid::Uuid;
use validator::Validate;

pub const SESSION_COOKIE: &str = "session_id";
const SESSION_COOKIE_DAYS: i64 = 7;

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(SESSION_COOKIE_DAYS))
        .build()
}

fn session_token_from(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_owned())
}

/// Find-or-create the caller's cart: keyed by user when signed in, else by
/// the session token, else a fresh cart under a newly minted token. The
/// minted token is returned so the handler can hand it back as a cookie.
pub(crate) async fn resolve_cart(
    conn: &mut AsyncPgConnection,
    user_id: Option<Uuid>,
    session_token: Option<String>,
) -> Result<(Cart, Option<String>), ApiError> {
    use shalura::schema::carts;

    if let Some(user_id) = user_id {
        let existing: Option<Cart> = carts::table
            .filter(carts::user_id.eq(user_id))
            .select(Cart::as_select())
            .first(conn)
            .await
            .optional()?;
        if let Some(cart) = existing {
            return Ok((cart, None));
        }

        let cart = diesel::insert_into(carts::table)
            .values(&NewCart {
                user_id: Some(user_id),
                session_token: None,
            })
            .returning(Cart::as_returning())
            .get_result(conn)
            .await?;
        return Ok((cart, None));
    }

    if let Some(token) = session_token {
        let existing: Option<Cart> = carts::table
            .filter(carts::session_token.eq(&token))
            .select(Cart::as_select())
            .first(conn)
            .await
            .optional()?;
        if let Some(cart) = existing {
            return Ok((cart, None));
        }

        // The client already holds this token; key the fresh cart by it.
        let cart = diesel::insert_into(carts::table)
            .values(&NewCart {
                user_id: None,
                session_token: Some(token),
            })
            .returning(Cart::as_returning())
            .get_result(conn)
            .await?;
        return Ok((cart, None));
    }

    let token = Uuid::new_v4().simple().to_string();
    let cart = diesel::insert_into(carts::table)
        .values(&NewCart {
            user_id: None,
            session_token: Some(token.clone()),
        })
        .returning(Cart::as_returning())
        .get_result(conn)
        .await?;

    Ok((cart, Some(token)))
}

/// Lookup without creating, for mutations that only make sense against an
/// existing cart.
async fn find_cart(
    conn: &mut AsyncPgConnection,
    user_id: Option<Uuid>,
    session_token: Option<String>,
) -> Result<Option<Cart>, ApiError> {
    use shalura::schema::carts;

    let mut query = carts::table.into_boxed();
    query = match (user_id, session_token) {
        (Some(user_id), _) => query.filter(carts::user_id.eq(user_id)),
        (None, Some(token)) => query.filter(carts::session_token.eq(token)),
        (None, None) => return Ok(None),
    };

    Ok(query
        .select(Cart::as_select())
        .first(conn)
        .await
        .optional()?)
}

async fn load_cart_items(
    conn: &mut AsyncPgConnection,
    cart_id: i32,
) -> Result<Vec<CartItemDetail>, ApiError> {
    use shalura::schema::{cart_items, product_variants, products};

    let rows: Vec<(CartItem, Product, Option<ProductVariant>)> = cart_items::table
        .filter(cart_items::cart_id.eq(cart_id))
        .inner_join(products::table)
        .left_join(product_variants::table)
        .select(<(CartItem, Product, Option<ProductVariant>)>::as_select())
        .order(cart_items::created_at.asc())
        .load(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(item, product, variant)| CartItemDetail {
            item,
            product,
            variant,
        })
        .collect())
}

pub async fn get_cart(
    State(pool): State<Pool>,
    claims: OptionalClaims,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<Value>)> {
    let mut conn = pool.get().await?;

    let (cart, minted) =
        resolve_cart(&mut conn, claims.user_id(), session_token_from(&jar)).await?;
    let items = load_cart_items(&mut conn, cart.id).await?;

    let jar = match minted {
        Some(token) => jar.add(session_cookie(token)),
        None => jar,
    };

    Ok((
        jar,
        Json(json!({ "success": true, "cart": CartDetail { cart, items } })),
    ))
}

pub async fn add_to_cart(
    State(pool): State<Pool>,
    claims: OptionalClaims,
    jar: CookieJar,
    Json(payload): Json<AddToCartPayload>,
) -> ApiResult<(CookieJar, Json<Value>)> {
    use shalura::schema::{cart_items, product_variants, products};

    payload.validate()?;

    let user_id = claims.user_id();
    let session_token = session_token_from(&jar);
    let mut conn = pool.get().await?;

    let (cart, minted) = conn
        .transaction::<(Cart, Option<String>), ApiError, _>(|conn| {
            Box::pin(async move {
                // Lock the stock rows up front so concurrent adds against the
                // same product serialize on the check.
                let product: Option<Product> = products::table
                    .find(payload.product_id)
                    .filter(products::is_active.eq(true))
                    .select(Product::as_select())
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                let product =
                    product.ok_or_else(|| ApiError::NotFound("Product".to_owned()))?;

                let variant = match payload.variant_id {
                    Some(variant_id) => {
                        let variant: Option<ProductVariant> = product_variants::table
                            .find(variant_id)
                            .select(ProductVariant::as_select())
                            .for_update()
                            .first(conn)
                            .await
                            .optional()?;
                        match variant {
                            Some(variant) if variant.product_id == product.id => Some(variant),
                            _ => {
                                return Err(ApiError::InvalidReference(
                                    "Invalid variant".to_owned(),
                                ));
                            }
                        }
                    }
                    None => None,
                };

                let available = variant
                    .as_ref()
                    .map(|variant| variant.stock_quantity)
                    .unwrap_or(product.stock_quantity);
                if available < payload.quantity {
                    let what = match &variant {
                        Some(_) => "selected variant".to_owned(),
                        None => product.name.clone(),
                    };
                    return Err(ApiError::InsufficientStock(what));
                }

                let (cart, minted) = resolve_cart(conn, user_id, session_token).await?;

                let unit_price = line_unit_price(
                    product.price,
                    product.discount_percent,
                    variant.as_ref().map(|v| v.price_adjustment).unwrap_or(0),
                );

                let mut existing = cart_items::table
                    .filter(cart_items::cart_id.eq(cart.id))
                    .filter(cart_items::product_id.eq(product.id))
                    .into_boxed();
                existing = match payload.variant_id {
                    Some(variant_id) => existing.filter(cart_items::variant_id.eq(variant_id)),
                    None => existing.filter(cart_items::variant_id.is_null()),
                };
                let existing: Option<CartItem> = existing
                    .select(CartItem::as_select())
                    .first(conn)
                    .await
                    .optional()?;

                match existing {
                    // Repeat add: bump quantity, overwrite the snapshot price.
                    Some(line) => {
                        diesel::update(cart_items::table.find(line.id))
                            .set((
                                cart_items::quantity.eq(line.quantity + payload.quantity),
                                cart_items::unit_price.eq(unit_price),
                            ))
                            .execute(conn)
                            .await?;
                    }
                    None => {
                        diesel::insert_into(cart_items::table)
                            .values(&NewCartItem {
                                cart_id: cart.id,
                                product_id: product.id,
                                variant_id: payload.variant_id,
                                quantity: payload.quantity,
                                unit_price,
                            })
                            .execute(conn)
                            .await?;
                    }
                }

                Ok((cart, minted))
            })
        })
        .await?;

    let items = load_cart_items(&mut conn, cart.id).await?;

    let jar = match minted {
        Some(token) => jar.add(session_cookie(token)),
        None => jar,
    };

    Ok((
        jar,
        Json(json!({
            "success": true,
            "cart": CartDetail { cart, items },
            "message": "Item added to cart",
        })),
    ))
}

pub async fn update_cart_item(
    State(pool): State<Pool>,
    claims: OptionalClaims,
    jar: CookieJar,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCartItemPayload>,
) -> ApiResult<Json<Value>> {
    use shalura::schema::{cart_items, product_variants, products};

    payload.validate()?;

    let user_id = claims.user_id();
    let session_token = session_token_from(&jar);
    let mut conn = pool.get().await?;

    let item = conn
        .transaction::<CartItem, ApiError, _>(|conn| {
            Box::pin(async move {
                let cart = find_cart(conn, user_id, session_token)
                    .await?
                    .ok_or_else(|| ApiError::NotFound("Cart item".to_owned()))?;

                let line: Option<CartItem> = cart_items::table
                    .find(id)
                    .filter(cart_items::cart_id.eq(cart.id))
                    .select(CartItem::as_select())
                    .first(conn)
                    .await
                    .optional()?;
                let line = line.ok_or_else(|| ApiError::NotFound("Cart item".to_owned()))?;

                // Re-check stock against the line's already-chosen rows.
                let product: Product = products::table
                    .find(line.product_id)
                    .select(Product::as_select())
                    .for_update()
                    .first(conn)
                    .await?;
                let available = match line.variant_id {
                    Some(variant_id) => {
                        let variant: ProductVariant = product_variants::table
                            .find(variant_id)
                            .select(ProductVariant::as_select())
                            .for_update()
                            .first(conn)
                            .await?;
                        variant.stock_quantity
                    }
                    None => product.stock_quantity,
                };
                if available < payload.quantity {
                    return Err(ApiError::InsufficientStock(product.name));
                }

                let item = diesel::update(cart_items::table.find(line.id))
                    .set(cart_items::quantity.eq(payload.quantity))
                    .returning(CartItem::as_returning())
                    .get_result(conn)
                    .await?;

                Ok(item)
            })
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "cartItem": item,
        "message": "Cart updated",
    })))
}

pub async fn remove_cart_item(
    State(pool): State<Pool>,
    claims: OptionalClaims,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> ApiResult<Json<Value>> {
    use shalura::schema::cart_items;

    let mut conn = pool.get().await?;

    let cart = find_cart(&mut conn, claims.user_id(), session_token_from(&jar))
        .await?
        .ok_or_else(|| ApiError::NotFound("Cart item".to_owned()))?;

    let deleted = diesel::delete(
        cart_items::table
            .find(id)
            .filter(cart_items::cart_id.eq(cart.id)),
    )
    .execute(&mut conn)
    .await?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Cart item".to_owned()));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Item removed from cart",
    })))
}

pub async fn clear_cart(
    State(pool): State<Pool>,
    claims: OptionalClaims,
    jar: CookieJar,
) -> ApiResult<Json<Value>> {
    use shalura::schema::cart_items;

    let mut conn = pool.get().await?;

    // Clearing a cart that was never created is a no-op, not an error.
    if let Some(cart) = find_cart(&mut conn, claims.user_id(), session_token_from(&jar)).await? {
        diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(cart.id)))
            .execute(&mut conn)
            .await?;
    }

    Ok(Json(json!({ "success": true, "message": "Cart cleared" })))
}
