/// Schema contract for a Postgres-backed object.
///
/// Implementors own their DDL: the table definition, the indexes that
/// carry the table's invariants, and the matching drop statement. The
/// `init_database!` macro replays these against the pool at startup.
pub trait SqlxSchema: Send + Sync + Unpin + Clone + std::fmt::Debug {
    const TABLE_NAME: &'static str;
    const ID_COLUMN_NAME: &'static str;
    const COLUMNS: &'static [&'static str];
    const INDEXES_SQL: &'static [&'static str];

    fn table_name() -> &'static str { Self::TABLE_NAME }
    fn id_column_name() -> &'static str { Self::ID_COLUMN_NAME }
    fn columns() -> &'static [&'static str] { Self::COLUMNS }
    fn indexes_sql() -> &'static [&'static str] { Self::INDEXES_SQL }

    /// Example: "CREATE TABLE IF NOT EXISTS users (id UUID PRIMARY KEY, ...);"
    fn create_table_sql() -> String;

    /// Example: "DROP TABLE IF EXISTS users CASCADE;"
    fn drop_table_sql() -> String;
}
