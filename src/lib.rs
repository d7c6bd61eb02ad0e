use diesel::prelude::*;
use diesel::result::{ConnectionError, ConnectionResult};
use std::env;

pub mod schema;

/// Synchronous connection used for running embedded migrations at startup.
/// Request handlers go through the async pool in `pool.rs` instead.
pub fn establish_connection() -> ConnectionResult<PgConnection> {
    let db_url = env::var("DATABASE_URL")
        .map_err(|_| ConnectionError::BadConnection("DATABASE_URL must be set".to_owned()))?;
    PgConnection::establish(&db_url)
}
