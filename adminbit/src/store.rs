use crate::error::StoreError;
use crate::record::Record;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Persistence seam of the engine. Every operation is atomic from the caller's
/// point of view: it either fully applies and reports the stored state, or
/// fails with a [`StoreError`] leaving the collection as it was.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Full current contents of the named collection, empty for a name the
    /// store has never seen.
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Record>, StoreError>;

    /// Appends a record and echoes the stored row. A record arriving with
    /// id 0 gets the next free id assigned store-side.
    async fn insert(&self, collection: &str, record: Record) -> Result<Record, StoreError>;

    /// Replaces the record with the given id in place. The stored id always
    /// wins over whatever id the payload carries.
    async fn update(&self, collection: &str, id: u64, record: Record) -> Result<Record, StoreError>;

    /// Removes the record with the given id; an absent id fails with
    /// [`StoreError::NotFound`], which callers tolerate as a no-op.
    async fn remove(&self, collection: &str, id: u64) -> Result<(), StoreError>;
}

/// In-memory mock store standing in for a real persistence layer: plain
/// vectors behind a lock, with artificial latency per operation and a
/// fail-next hook so store failures are exercisable in tests.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Record>>>,
    latency: Duration,
    fail_next: AtomicBool,
}

impl MemoryStore {
    pub fn new(latency: Duration) -> Self {
        Self { collections: RwLock::new(HashMap::new()), latency, fail_next: AtomicBool::new(false) }
    }

    /// Store pre-loaded with the demo rows of the four builtin collections.
    pub fn seeded(latency: Duration) -> Self {
        let mut collections = HashMap::new();
        collections.insert("users".to_string(), seed_users());
        collections.insert("products".to_string(), seed_products());
        collections.insert("orders".to_string(), seed_orders());
        collections.insert("categories".to_string(), seed_categories());
        Self { collections: RwLock::new(collections), latency, fail_next: AtomicBool::new(false) }
    }

    /// Makes the next operation fail with [`StoreError::Unavailable`].
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    async fn simulate_io(&self) -> Result<(), StoreError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected store failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
        self.simulate_io().await?;
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn insert(&self, collection: &str, mut record: Record) -> Result<Record, StoreError> {
        self.simulate_io().await?;
        let mut collections = self.collections.write().await;
        let rows = collections.entry(collection.to_string()).or_default();
        if record.id == 0 {
            record.id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        }
        rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, collection: &str, id: u64, mut record: Record) -> Result<Record, StoreError> {
        self.simulate_io().await?;
        let mut collections = self.collections.write().await;
        let row = collections
            .get_mut(collection)
            .and_then(|rows| rows.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| StoreError::NotFound { collection: collection.to_string(), id })?;
        record.id = id;
        *row = record.clone();
        Ok(record)
    }

    async fn remove(&self, collection: &str, id: u64) -> Result<(), StoreError> {
        self.simulate_io().await?;
        let mut collections = self.collections.write().await;
        let rows = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound { collection: collection.to_string(), id })?;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        if rows.len() == before {
            return Err(StoreError::NotFound { collection: collection.to_string(), id });
        }
        Ok(())
    }
}

fn seed_users() -> Vec<Record> {
    vec![
        Record::new(1).with("name", "John Doe").with("email", "john@example.com").with("created_at", "2024-01-15"),
        Record::new(2).with("name", "Jane Smith").with("email", "jane@example.com").with("created_at", "2024-01-16"),
        Record::new(3).with("name", "Bob Johnson").with("email", "bob@example.com").with("created_at", "2024-01-17"),
    ]
}

fn seed_products() -> Vec<Record> {
    vec![
        Record::new(1).with("name", "Product A").with("price", 29.99).with("category", "Electronics").with("stock", 100i64),
        Record::new(2).with("name", "Product B").with("price", 49.99).with("category", "Books").with("stock", 50i64),
        Record::new(3).with("name", "Product C").with("price", 19.99).with("category", "Clothing").with("stock", 200i64),
    ]
}

fn seed_orders() -> Vec<Record> {
    vec![
        Record::new(1).with("user_id", 1i64).with("total", 79.98).with("status", "completed").with("created_at", "2024-01-18"),
        Record::new(2).with("user_id", 2i64).with("total", 49.99).with("status", "pending").with("created_at", "2024-01-19"),
    ]
}

fn seed_categories() -> Vec<Record> {
    vec![
        Record::new(1).with("name", "Electronics").with("description", "Electronic devices"),
        Record::new(2).with("name", "Books").with("description", "Books and literature"),
        Record::new(3).with("name", "Clothing").with("description", "Apparel and accessories"),
    ]
}
