use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::types::Uuid;
use sqlx::PgPool;
use tokio::sync::Mutex;

/// Read-only view over the activity counters owned by the rest of the
/// product. The engine never touches collaborator tables itself; the
/// hosting application decides what each signal name means.
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Whether `user_id` identifies a real user.
    async fn user_exists(&self, user_id: Uuid) -> Result<bool>;

    /// Current value of the named counter, scoped to `user_id`.
    async fn count(&self, signal: &str, user_id: Uuid) -> Result<i64>;
}

/// The collaborator table and scope column backing one signal.
#[derive(Debug, Clone)]
pub struct SignalTarget {
    pub table: String,
    pub scope_column: String,
}

/// Postgres-backed signal source. The signal-name -> table mapping is
/// host configuration handed in at construction; an unmapped signal is a
/// configuration error reported through the normal per-rule recovery
/// path, not a panic.
pub struct PgSignalSource {
    pool: Arc<PgPool>,
    user_table: String,
    signals: HashMap<String, SignalTarget>,
}

impl PgSignalSource {
    pub fn new(pool: Arc<PgPool>, user_table: &str) -> Self {
        Self {
            pool,
            user_table: user_table.to_string(),
            signals: HashMap::new(),
        }
    }

    pub fn with_signal(mut self, signal: &str, table: &str, scope_column: &str) -> Self {
        self.signals.insert(
            signal.to_string(),
            SignalTarget {
                table: table.to_string(),
                scope_column: scope_column.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl SignalSource for PgSignalSource {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM \"{}\" WHERE id = $1)",
            self.user_table
        );
        let exists = sqlx::query_scalar::<_, bool>(&sql)
            .bind(user_id)
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(exists)
    }

    async fn count(&self, signal: &str, user_id: Uuid) -> Result<i64> {
        let target = self.signals.get(signal).ok_or_else(|| {
            anyhow!("[PgSignalSource::count] no table mapped for signal {:?}", signal)
        })?;
        let sql = format!(
            "SELECT COUNT(*) FROM \"{}\" WHERE \"{}\" = $1",
            target.table, target.scope_column
        );
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(user_id)
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(count)
    }
}

/// In-memory counters for tests and host prototyping. An unset counter
/// reads as zero.
#[derive(Default)]
pub struct MemorySignalSource {
    inner: Mutex<MemorySignals>,
}

#[derive(Default)]
struct MemorySignals {
    users: HashSet<Uuid>,
    counts: HashMap<(Uuid, String), i64>,
}

impl MemorySignalSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_user(&self, user_id: Uuid) {
        self.inner.lock().await.users.insert(user_id);
    }

    pub async fn set_count(&self, user_id: Uuid, signal: &str, value: i64) {
        self.inner
            .lock()
            .await
            .counts
            .insert((user_id, signal.to_string()), value);
    }
}

#[async_trait]
impl SignalSource for MemorySignalSource {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.inner.lock().await.users.contains(&user_id))
    }

    async fn count(&self, signal: &str, user_id: Uuid) -> Result<i64> {
        let inner = self.inner.lock().await;
        Ok(inner
            .counts
            .get(&(user_id, signal.to_string()))
            .copied()
            .unwrap_or(0))
    }
}
