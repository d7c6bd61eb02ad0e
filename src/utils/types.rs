use diesel_async::{AsyncPgConnection, pooled_connection::AsyncDieselConnectionManager};

pub type Pool = bb8::Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

pub type ApiResult<T> = std::result::Result<T, crate::utils::error::ApiError>;
