use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use shalura::schema::users;
use std::env;
use uuid::Uuid;
use validator::Validate;

use crate::utils::error::ApiError;

pub const AUTH_COOKIE: &str = "token";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_CUSTOMER: &str = "customer";

const NOT_AUTHORIZED: &str = "Not authorized to access this route";

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Projection of `users` without the password hash; safe to serialize.
#[derive(Queryable, Selectable, Serialize, Debug)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SafeUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: String,
}

#[derive(AsChangeset)]
#[diesel(table_name = users)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub current_password: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessTokenClaims {
    pub fn user_id(&self) -> Result<Uuid, ApiError> {
        Uuid::parse_str(&self.sub).map_err(|_| ApiError::Unauthorized(NOT_AUTHORIZED.to_owned()))
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role != ROLE_ADMIN {
            return Err(ApiError::Forbidden(format!(
                "User role {} is not authorized to access this route",
                self.role
            )));
        }
        Ok(())
    }
}

fn jwt_secret() -> Result<String, ApiError> {
    env::var("JWT_SECRET").map_err(|_| ApiError::Internal("JWT_SECRET must be set".to_owned()))
}

pub fn token_ttl_hours() -> i64 {
    env::var("JWT_EXPIRES_HOURS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(24)
}

pub fn issue_token(user_id: Uuid, email: &str, role: &str) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = AccessTokenClaims {
        sub: user_id.to_string(),
        email: email.to_owned(),
        role: role.to_owned(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::hours(token_ttl_hours())).timestamp(),
    };
    encode_token(&claims, &jwt_secret()?)
}

fn encode_token(claims: &AccessTokenClaims, secret: &str) -> Result<String, ApiError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
}

fn decode_token_with(token: &str, secret: &str) -> Result<AccessTokenClaims, ApiError> {
    decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized(NOT_AUTHORIZED.to_owned()))
}

pub fn decode_token(token: &str) -> Result<AccessTokenClaims, ApiError> {
    decode_token_with(token, &jwt_secret()?)
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned);

    bearer.or_else(|| {
        let jar = CookieJar::from_headers(&parts.headers);
        jar.get(AUTH_COOKIE).map(|cookie| cookie.value().to_owned())
    })
}

impl<S> FromRequestParts<S> for AccessTokenClaims
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts)
            .ok_or_else(|| ApiError::Unauthorized(NOT_AUTHORIZED.to_owned()))?;
        decode_token(&token)
    }
}

/// Claims for endpoints that serve both guests and signed-in users. A missing
/// or invalid token degrades to `None` instead of rejecting the request.
#[derive(Debug)]
pub struct OptionalClaims(pub Option<AccessTokenClaims>);

impl OptionalClaims {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().and_then(|claims| claims.user_id().ok())
    }
}

impl<S> FromRequestParts<S> for OptionalClaims
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = token_from_parts(parts).and_then(|token| decode_token(&token).ok());
        Ok(OptionalClaims(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(exp_offset: i64) -> AccessTokenClaims {
        let now = Utc::now().timestamp();
        AccessTokenClaims {
            sub: "7f4df9f6-5f7d-4f06-9a2b-0d7e66e0a001".to_owned(),
            email: "shopper@example.com".to_owned(),
            role: ROLE_CUSTOMER.to_owned(),
            iat: now,
            exp: now + exp_offset,
        }
    }

    #[test]
    fn token_round_trips() {
        let token = encode_token(&claims(3600), "test-secret").unwrap();
        let decoded = decode_token_with(&token, "test-secret").unwrap();

        assert_eq!(decoded.sub, "7f4df9f6-5f7d-4f06-9a2b-0d7e66e0a001");
        assert_eq!(decoded.email, "shopper@example.com");
        assert_eq!(decoded.role, ROLE_CUSTOMER);
        assert!(decoded.user_id().is_ok());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = encode_token(&claims(-3600), "test-secret").unwrap();
        assert!(decode_token_with(&token, "test-secret").is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = encode_token(&claims(3600), "test-secret").unwrap();
        assert!(decode_token_with(&token, "other-secret").is_err());
    }

    #[test]
    fn customer_role_is_not_admin() {
        assert!(claims(3600).require_admin().is_err());

        let mut admin = claims(3600);
        admin.role = ROLE_ADMIN.to_owned();
        assert!(admin.require_admin().is_ok());
    }
}
