mod env;
mod postgres_connect;
mod sqlx_postgres;

pub use env::DatabaseEnv;
pub use sqlx_postgres::SqlxSchema;
