use super::models::{
    Brand, Category, NewProduct, Product, ProductDetail, ProductListQuery, ProductVariant,
    ProductWithPrice, UpdateProduct, VariantWithPrice,
};
use crate::auth::models::AccessTokenClaims;
use crate::utils::error::ApiError;
use crate::utils::types::{ApiResult, Pool};
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use diesel::dsl::sql;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool};
use diesel_async::RunQueryDsl;
use serde_json::{Value, json};
use shalura::schema::products;
use validator::Validate;

const DEFAULT_PAGE_SIZE: i64 = 12;
const FEATURED_LIMIT: i64 = 8;

/// SQL twin of `final_unit_price`; integer division matches the Rust rounding.
const FINAL_PRICE_SQL: &str =
    "CASE WHEN discount_percent > 0 THEN (price * (100 - discount_percent) + 50) / 100 ELSE price END";

fn catalog_query(params: &ProductListQuery) -> products::BoxedQuery<'static, Pg> {
    let mut query = products::table
        .filter(products::is_active.eq(true))
        .into_boxed();

    if let Some(category) = params.category {
        query = query.filter(products::category_id.eq(category));
    }
    if let Some(brand) = params.brand {
        query = query.filter(products::brand_id.eq(brand));
    }
    if let Some(min_price) = params.min_price {
        query = query.filter(sql::<Bool>(&format!("{FINAL_PRICE_SQL} >= ")).bind::<BigInt, _>(min_price));
    }
    if let Some(max_price) = params.max_price {
        query = query.filter(sql::<Bool>(&format!("{FINAL_PRICE_SQL} <= ")).bind::<BigInt, _>(max_price));
    }
    if let Some(rating) = params.rating {
        query = query.filter(products::rating.ge(rating));
    }
    if params.in_stock == Some(true) {
        query = query.filter(products::stock_quantity.gt(0));
    }
    if params.on_sale == Some(true) {
        query = query.filter(products::discount_percent.gt(0));
    }
    if params.featured == Some(true) {
        query = query.filter(products::is_featured.eq(true));
    }
    if let Some(term) = &params.search {
        let pattern = format!("%{}%", term);
        query = query.filter(
            products::name
                .ilike(pattern.clone())
                .or(products::description.ilike(pattern)),
        );
    }

    query
}

pub async fn get_products(
    State(pool): State<Pool>,
    Query(params): Query<ProductListQuery>,
) -> ApiResult<Json<Value>> {
    let mut conn = pool.get().await?;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
    let offset = (page - 1) * limit;

    let total: i64 = catalog_query(&params)
        .count()
        .get_result(&mut conn)
        .await?;

    let page_query = catalog_query(&params).select(Product::as_select());
    let ascending = matches!(params.sort_order.as_deref(), Some("asc") | Some("ASC"));
    let page_query = match (params.sort_by.as_deref(), ascending) {
        (Some("price"), true) => page_query.order(products::price.asc()),
        (Some("price"), false) => page_query.order(products::price.desc()),
        (Some("rating"), true) => page_query.order(products::rating.asc()),
        (Some("rating"), false) => page_query.order(products::rating.desc()),
        (Some("name"), true) => page_query.order(products::name.asc()),
        (Some("name"), false) => page_query.order(products::name.desc()),
        (Some("review_count"), true) => page_query.order(products::review_count.asc()),
        (Some("review_count"), false) => page_query.order(products::review_count.desc()),
        (_, true) => page_query.order(products::created_at.asc()),
        (_, false) => page_query.order(products::created_at.desc()),
    };

    let rows: Vec<Product> = page_query
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
        .await?;

    let products_json: Vec<ProductWithPrice> =
        rows.into_iter().map(ProductWithPrice::from).collect();

    Ok(Json(json!({
        "success": true,
        "count": total,
        "totalPages": (total + limit - 1) / limit,
        "currentPage": page,
        "products": products_json,
    })))
}

pub async fn get_product_by_id(
    State(pool): State<Pool>,
    Path(id): Path<i32>,
) -> ApiResult<Json<Value>> {
    use shalura::schema::product_variants;

    let mut conn = pool.get().await?;

    let product: Product = products::table
        .find(id)
        .select(Product::as_select())
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Product".to_owned()))?;

    diesel::update(products::table.find(id))
        .set(products::view_count.eq(products::view_count + 1))
        .execute(&mut conn)
        .await?;

    let variants: Vec<ProductVariant> = product_variants::table
        .filter(product_variants::product_id.eq(id))
        .order(product_variants::sort_order.asc())
        .select(ProductVariant::as_select())
        .load(&mut conn)
        .await?;

    let base_price = product.final_price();
    let detail = ProductDetail {
        product: ProductWithPrice::from(product),
        product_variants: variants
            .into_iter()
            .map(|variant| VariantWithPrice {
                final_price: base_price + variant.price_adjustment,
                variant,
            })
            .collect(),
    };

    Ok(Json(json!({ "success": true, "product": detail })))
}

pub async fn get_featured_products(State(pool): State<Pool>) -> ApiResult<Json<Value>> {
    let mut conn = pool.get().await?;

    let rows: Vec<Product> = products::table
        .filter(products::is_featured.eq(true))
        .filter(products::is_active.eq(true))
        .filter(products::stock_quantity.gt(0))
        .order(products::created_at.desc())
        .limit(FEATURED_LIMIT)
        .select(Product::as_select())
        .load(&mut conn)
        .await?;

    let products_json: Vec<ProductWithPrice> =
        rows.into_iter().map(ProductWithPrice::from).collect();

    Ok(Json(json!({ "success": true, "products": products_json })))
}

pub async fn get_categories(State(pool): State<Pool>) -> ApiResult<Json<Value>> {
    use shalura::schema::categories;

    let mut conn = pool.get().await?;

    let rows: Vec<Category> = categories::table
        .filter(categories::is_active.eq(true))
        .order((categories::sort_order.asc(), categories::name.asc()))
        .select(Category::as_select())
        .load(&mut conn)
        .await?;

    Ok(Json(json!({ "success": true, "categories": rows })))
}

pub async fn get_brands(State(pool): State<Pool>) -> ApiResult<Json<Value>> {
    use shalura::schema::brands;

    let mut conn = pool.get().await?;

    let rows: Vec<Brand> = brands::table
        .filter(brands::is_active.eq(true))
        .order(brands::name.asc())
        .select(Brand::as_select())
        .load(&mut conn)
        .await?;

    Ok(Json(json!({ "success": true, "brands": rows })))
}

pub async fn create_product(
    State(pool): State<Pool>,
    claims: AccessTokenClaims,
    Json(payload): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    claims.require_admin()?;
    payload.validate()?;

    let mut conn = pool.get().await?;

    let product: Product = diesel::insert_into(products::table)
        .values(&payload)
        .returning(Product::as_returning())
        .get_result(&mut conn)
        .await?;

    tracing::info!(product_id = product.id, "product created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "product": ProductWithPrice::from(product) })),
    ))
}

pub async fn update_product(
    State(pool): State<Pool>,
    claims: AccessTokenClaims,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProduct>,
) -> ApiResult<Json<Value>> {
    claims.require_admin()?;
    payload.validate()?;

    let mut conn = pool.get().await?;

    let product: Option<Product> = diesel::update(products::table.find(id))
        .set(&payload)
        .returning(Product::as_returning())
        .get_result(&mut conn)
        .await
        .optional()?;

    let product = product.ok_or_else(|| ApiError::NotFound("Product".to_owned()))?;

    Ok(Json(
        json!({ "success": true, "product": ProductWithPrice::from(product) }),
    ))
}

/// Soft delete: the row stays for historical orders, the listing hides it.
pub async fn delete_product(
    State(pool): State<Pool>,
    claims: AccessTokenClaims,
    Path(id): Path<i32>,
) -> ApiResult<Json<Value>> {
    claims.require_admin()?;

    let mut conn = pool.get().await?;

    let updated = diesel::update(products::table.find(id))
        .set(products::is_active.eq(false))
        .execute(&mut conn)
        .await?;

    if updated == 0 {
        return Err(ApiError::NotFound("Product".to_owned()));
    }

    Ok(Json(
        json!({ "success": true, "message": "Product deleted successfully" }),
    ))
}
