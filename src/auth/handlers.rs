use super::models::{
    AUTH_COOKIE, AccessTokenClaims, LoginPayload, NewUser, ROLE_CUSTOMER, RegisterPayload,
    SafeUser, UpdateProfilePayload, UpdateUser, User, issue_token, token_ttl_hours,
};
use crate::utils::error::ApiError;
use crate::utils::types::{ApiResult, Pool};
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use bcrypt::{DEFAULT_COST, hash, verify};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::{Value, json};
use uuid::Uuid;
use validator::Validate;

fn auth_cookie(token: String) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(token_ttl_hours()))
        .build()
}

async fn hash_password(password: String) -> Result<String, ApiError> {
    let hashed = tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST)).await??;
    Ok(hashed)
}

async fn verify_password(password: String, password_hash: String) -> Result<bool, ApiError> {
    let matches =
        tokio::task::spawn_blocking(move || verify(password, &password_hash)).await??;
    Ok(matches)
}

pub async fn register(
    State(pool): State<Pool>,
    jar: CookieJar,
    Json(payload): Json<RegisterPayload>,
) -> ApiResult<(StatusCode, CookieJar, Json<Value>)> {
    use shalura::schema::users;

    payload.validate()?;

    let mut conn = pool.get().await?;

    let existing: Option<Uuid> = users::table
        .filter(users::email.eq(&payload.email))
        .select(users::id)
        .first(&mut conn)
        .await
        .optional()?;
    if existing.is_some() {
        return Err(ApiError::Validation("Email already registered".to_owned()));
    }

    let password_hash = hash_password(payload.password).await?;

    let new_user = NewUser {
        id: Uuid::new_v4(),
        name: payload.name,
        email: payload.email,
        password_hash,
        phone: payload.phone,
        role: ROLE_CUSTOMER.to_owned(),
    };

    let user: SafeUser = diesel::insert_into(users::table)
        .values(&new_user)
        .returning(SafeUser::as_returning())
        .get_result(&mut conn)
        .await?;

    tracing::info!(user_id = %user.id, "user registered");

    let token = issue_token(user.id, &user.email, &user.role)?;
    let jar = jar.add(auth_cookie(token.clone()));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(json!({ "success": true, "token": token, "user": user })),
    ))
}

pub async fn login(
    State(pool): State<Pool>,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> ApiResult<(CookieJar, Json<Value>)> {
    use shalura::schema::users;

    payload.validate()?;

    let mut conn = pool.get().await?;

    let user: Option<User> = users::table
        .filter(users::email.eq(&payload.email))
        .select(User::as_select())
        .first(&mut conn)
        .await
        .optional()?;

    let user = match user {
        Some(user) if user.is_active => user,
        _ => return Err(ApiError::Unauthorized("Invalid credentials".to_owned())),
    };

    if !verify_password(payload.password, user.password_hash.clone()).await? {
        tracing::warn!(user_id = %user.id, "failed login attempt");
        return Err(ApiError::Unauthorized("Invalid credentials".to_owned()));
    }

    let token = issue_token(user.id, &user.email, &user.role)?;
    let jar = jar.add(auth_cookie(token.clone()));

    let safe = users::table
        .find(user.id)
        .select(SafeUser::as_select())
        .get_result(&mut conn)
        .await?;

    Ok((
        jar,
        Json(json!({ "success": true, "token": token, "user": safe })),
    ))
}

pub async fn logout(jar: CookieJar) -> ApiResult<(CookieJar, Json<Value>)> {
    let jar = jar.remove(Cookie::build((AUTH_COOKIE, "")).path("/"));
    Ok((
        jar,
        Json(json!({ "success": true, "message": "Logged out" })),
    ))
}

pub async fn me(State(pool): State<Pool>, claims: AccessTokenClaims) -> ApiResult<Json<Value>> {
    use shalura::schema::users;

    let mut conn = pool.get().await?;

    let user: Option<SafeUser> = users::table
        .find(claims.user_id()?)
        .select(SafeUser::as_select())
        .first(&mut conn)
        .await
        .optional()?;

    let user = user.ok_or_else(|| ApiError::NotFound("User".to_owned()))?;

    Ok(Json(json!({ "success": true, "user": user })))
}

pub async fn update_profile(
    State(pool): State<Pool>,
    claims: AccessTokenClaims,
    Json(payload): Json<UpdateProfilePayload>,
) -> ApiResult<Json<Value>> {
    use shalura::schema::users;

    payload.validate()?;

    let user_id = claims.user_id()?;
    let mut conn = pool.get().await?;

    let user: User = users::table
        .find(user_id)
        .select(User::as_select())
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::NotFound("User".to_owned()))?;

    let password_hash = match payload.new_password {
        Some(new_password) => {
            let current = payload.current_password.ok_or_else(|| {
                ApiError::Validation("Current password is required".to_owned())
            })?;
            if !verify_password(current, user.password_hash.clone()).await? {
                return Err(ApiError::Unauthorized("Invalid credentials".to_owned()));
            }
            Some(hash_password(new_password).await?)
        }
        None => None,
    };

    if payload.name.is_none() && payload.phone.is_none() && password_hash.is_none() {
        let unchanged = users::table
            .find(user_id)
            .select(SafeUser::as_select())
            .get_result(&mut conn)
            .await?;
        return Ok(Json(json!({ "success": true, "user": unchanged })));
    }

    let changes = UpdateUser {
        name: payload.name,
        phone: payload.phone,
        password_hash,
    };

    let updated: SafeUser = diesel::update(users::table.find(user_id))
        .set(&changes)
        .returning(SafeUser::as_returning())
        .get_result(&mut conn)
        .await?;

    Ok(Json(json!({ "success": true, "user": updated })))
}
