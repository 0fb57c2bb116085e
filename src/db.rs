use std::env;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

/// Every handler borrows a connection inside `web::block`, so the pool caps
/// how many requests can touch the database at once. `DATABASE_POOL_SIZE`
/// overrides r2d2's default of 10.
pub fn create_pool(database_url: &str) -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let mut builder = Pool::builder();
    if let Ok(raw) = env::var("DATABASE_POOL_SIZE") {
        let size: u32 = raw.parse().expect("DATABASE_POOL_SIZE must be a number");
        builder = builder.max_size(size);
    }
    builder
        .build(manager)
        .expect("Failed to create database connection pool")
}
