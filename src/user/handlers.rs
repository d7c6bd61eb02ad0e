use super::models::{NewAddressPayload, NewUserAddress, UpdateAddressPayload, UserAddress};
use crate::auth::models::AccessTokenClaims;
use crate::utils::error::ApiError;
use crate::utils::types::{ApiResult, Pool};
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde_json::{Value, json};
use uuid::Uuid;
use validator::Validate;

pub async fn get_addresses(
    State(pool): State<Pool>,
    claims: AccessTokenClaims,
) -> ApiResult<Json<Value>> {
    use shalura::schema::user_addresses;

    let mut conn = pool.get().await?;

    let addresses: Vec<UserAddress> = user_addresses::table
        .filter(user_addresses::user_id.eq(claims.user_id()?))
        .order((
            user_addresses::is_default.desc(),
            user_addresses::created_at.desc(),
        ))
        .select(UserAddress::as_select())
        .load(&mut conn)
        .await?;

    Ok(Json(json!({ "success": true, "addresses": addresses })))
}

pub async fn create_address(
    State(pool): State<Pool>,
    claims: AccessTokenClaims,
    Json(payload): Json<NewAddressPayload>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    use shalura::schema::user_addresses;

    payload.validate()?;

    let user_id = claims.user_id()?;
    let mut conn = pool.get().await?;

    let address = conn
        .transaction::<UserAddress, ApiError, _>(|conn| {
            Box::pin(async move {
                if payload.is_default {
                    diesel::update(
                        user_addresses::table.filter(user_addresses::user_id.eq(user_id)),
                    )
                    .set(user_addresses::is_default.eq(false))
                    .execute(conn)
                    .await?;
                }

                let new_address = NewUserAddress {
                    id: Uuid::new_v4(),
                    user_id,
                    label: payload.label,
                    address_line: payload.address_line,
                    city: payload.city,
                    postal_code: payload.postal_code,
                    country: payload.country,
                    is_default: payload.is_default,
                };

                let address = diesel::insert_into(user_addresses::table)
                    .values(&new_address)
                    .returning(UserAddress::as_returning())
                    .get_result(conn)
                    .await?;

                Ok(address)
            })
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "address": address })),
    ))
}

pub async fn update_address(
    State(pool): State<Pool>,
    claims: AccessTokenClaims,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAddressPayload>,
) -> ApiResult<Json<Value>> {
    use shalura::schema::user_addresses;

    let user_id = claims.user_id()?;
    let mut conn = pool.get().await?;

    let address = conn
        .transaction::<UserAddress, ApiError, _>(|conn| {
            Box::pin(async move {
                let owned: Option<Uuid> = user_addresses::table
                    .filter(user_addresses::id.eq(id))
                    .filter(user_addresses::user_id.eq(user_id))
                    .select(user_addresses::id)
                    .first(conn)
                    .await
                    .optional()?;
                if owned.is_none() {
                    return Err(ApiError::NotFound("Address".to_owned()));
                }

                if payload.is_default == Some(true) {
                    diesel::update(
                        user_addresses::table.filter(user_addresses::user_id.eq(user_id)),
                    )
                    .set(user_addresses::is_default.eq(false))
                    .execute(conn)
                    .await?;
                }

                let address = diesel::update(user_addresses::table.find(id))
                    .set(&payload)
                    .returning(UserAddress::as_returning())
                    .get_result(conn)
                    .await?;

                Ok(address)
            })
        })
        .await?;

    Ok(Json(json!({ "success": true, "address": address })))
}

pub async fn delete_address(
    State(pool): State<Pool>,
    claims: AccessTokenClaims,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    use shalura::schema::user_addresses;

    let mut conn = pool.get().await?;

    let deleted = diesel::delete(
        user_addresses::table
            .filter(user_addresses::id.eq(id))
            .filter(user_addresses::user_id.eq(claims.user_id()?)),
    )
    .execute(&mut conn)
    .await?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Address".to_owned()));
    }

    Ok(Json(
        json!({ "success": true, "message": "Address deleted" }),
    ))
}
