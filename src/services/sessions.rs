//! Session stores behind the `tower-sessions` layer
//!
//! The layer owns the session lifecycle (cookie, id, expiry, save at the
//! end of each request); these types only persist its records.

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tower_sessions::{
    session::{Id, Record},
    session_store, SessionStore,
};

use crate::error::{AppError, AppResult};

fn backend(err: redis::RedisError) -> session_store::Error {
    session_store::Error::Backend(err.to_string())
}

fn is_live(record: &Record, now: OffsetDateTime) -> bool {
    record.expiry_date > now
}

/// Session records stored as JSON under `session:{id}` with a Redis TTL
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisSessionStore").finish_non_exhaustive()
    }
}

impl RedisSessionStore {
    /// Connect to Redis and check the connection
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { conn })
    }

    fn key(id: &Id) -> String {
        format!("session:{}", id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut conn = self.conn.clone();
        while conn
            .exists::<_, bool>(Self::key(&record.id))
            .await
            .map_err(backend)?
        {
            record.id = Id::default();
        }
        self.save(record).await
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let ttl = (record.expiry_date - OffsetDateTime::now_utc()).whole_seconds();
        if ttl <= 0 {
            return self.delete(&record.id).await;
        }

        let raw = serde_json::to_string(record)
            .map_err(|e| session_store::Error::Encode(e.to_string()))?;

        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(Self::key(&record.id), raw, ttl as u64)
            .await
            .map_err(backend)
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(Self::key(id)).await.map_err(backend)?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        let record: Record = serde_json::from_str(&raw)
            .map_err(|e| session_store::Error::Decode(e.to_string()))?;

        Ok(is_live(&record, OffsetDateTime::now_utc()).then_some(record))
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(Self::key(id)).await.map_err(backend)
    }
}

/// Session records kept in process memory.
///
/// Expired records are never returned, and every save sweeps them out so an
/// idle server does not keep abandoned logins around.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    records: Arc<RwLock<HashMap<Id, Record>>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut records = self.records.write().await;
        while records.contains_key(&record.id) {
            record.id = Id::default();
        }
        let now = OffsetDateTime::now_utc();
        records.retain(|_, r| is_live(r, now));
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let mut records = self.records.write().await;
        let now = OffsetDateTime::now_utc();
        records.retain(|_, r| is_live(r, now));
        if is_live(record, now) {
            records.insert(record.id, record.clone());
        } else {
            records.remove(&record.id);
        }
        Ok(())
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .records
            .read()
            .await
            .get(id)
            .filter(|r| is_live(r, now))
            .cloned())
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        self.records.write().await.remove(id);
        Ok(())
    }
}

/// The store selected by `session.store`
#[derive(Debug, Clone)]
pub enum AppSessionStore {
    Redis(RedisSessionStore),
    Memory(MemorySessionStore),
}

#[async_trait]
impl SessionStore for AppSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        match self {
            AppSessionStore::Redis(store) => store.create(record).await,
            AppSessionStore::Memory(store) => store.create(record).await,
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        match self {
            AppSessionStore::Redis(store) => store.save(record).await,
            AppSessionStore::Memory(store) => store.save(record).await,
        }
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        match self {
            AppSessionStore::Redis(store) => store.load(id).await,
            AppSessionStore::Memory(store) => store.load(id).await,
        }
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        match self {
            AppSessionStore::Redis(store) => store.delete(id).await,
            AppSessionStore::Memory(store) => store.delete(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;

    fn record(ttl: Duration) -> Record {
        Record {
            id: Id::default(),
            data: HashMap::new(),
            expiry_date: OffsetDateTime::now_utc() + ttl,
        }
    }

    #[tokio::test]
    async fn test_memory_store_round_trip_and_delete() {
        let store = MemorySessionStore::default();
        let mut rec = record(Duration::minutes(1));
        rec.data
            .insert("principal".to_string(), serde_json::json!({"id": "42"}));

        store.create(&mut rec).await.unwrap();
        let loaded = store.load(&rec.id).await.unwrap().unwrap();
        assert_eq!(loaded.data, rec.data);

        store.delete(&rec.id).await.unwrap();
        assert!(store.load(&rec.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_hides_expired_records() {
        let store = MemorySessionStore::default();
        let rec = record(Duration::seconds(-5));

        store
            .records
            .write()
            .await
            .insert(rec.id, rec.clone());
        assert!(store.load(&rec.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_purges_expired_records_on_save() {
        let store = MemorySessionStore::default();
        for _ in 0..3 {
            let rec = record(Duration::seconds(-5));
            store.records.write().await.insert(rec.id, rec);
        }

        let live = record(Duration::minutes(1));
        store.save(&live).await.unwrap();

        let records = store.records.read().await;
        assert_eq!(records.len(), 1);
        assert!(records.contains_key(&live.id));
    }

    #[tokio::test]
    async fn test_saving_an_expired_record_drops_it() {
        let store = MemorySessionStore::default();
        let mut rec = record(Duration::minutes(1));
        store.create(&mut rec).await.unwrap();

        rec.expiry_date = OffsetDateTime::now_utc() - Duration::seconds(1);
        store.save(&rec).await.unwrap();
        assert!(store.records.read().await.is_empty());
    }
}
