// Record store backed by an embedded SQLite database

use crate::record::Record;
use crate::store::{RecordStore, validate_collection_name};
use eyre::{Context, Result, eyre};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Same contract as `JsonStore`, one table for every collection.
///
/// A collection with no rows loads as empty, so `init` only has to make sure
/// the schema exists.
pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = Connection::open(path.as_ref()).context("Failed to open SQLite database")?;
        info!(path = ?path.as_ref(), "Opened SQLite record store");
        Self::with_connection(db)
    }

    /// In-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        Self::with_connection(db)
    }

    fn with_connection(db: Connection) -> Result<Self> {
        // Writers from other connections wait this long for the write lock
        db.busy_timeout(BUSY_TIMEOUT)?;
        Self::create_schema(&db)?;
        Ok(Self { db: Mutex::new(db) })
    }

    fn create_schema(db: &Connection) -> Result<()> {
        debug!("Creating database schema");

        db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                collection TEXT NOT NULL,
                position INTEGER NOT NULL,
                id INTEGER NOT NULL,
                data_json TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_records_position ON records(collection, position);
            "#,
        )?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| eyre!("SQLite connection lock poisoned"))
    }

    fn load_with(db: &Connection, collection: &str) -> Result<Vec<String>> {
        let mut stmt = db.prepare("SELECT data_json FROM records WHERE collection = ?1 ORDER BY position")?;
        let rows = stmt.query_map([collection], |row| row.get::<_, String>(0))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn replace_tx<T: Record>(tx: &Transaction, collection: &str, records: &[T]) -> Result<()> {
        tx.execute("DELETE FROM records WHERE collection = ?1", [collection])?;

        for (position, record) in records.iter().enumerate() {
            let data_json = serde_json::to_string(record).context("Failed to serialize record")?;
            tx.execute(
                "INSERT INTO records (collection, position, id, data_json) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![collection, position as i64, record.id() as i64, data_json],
            )?;
        }

        Ok(())
    }

    fn decode<T: Record>(rows: Vec<String>) -> Result<Vec<T>> {
        rows.iter()
            .map(|json| serde_json::from_str(json).context("Failed to deserialize record from database"))
            .collect()
    }
}

impl RecordStore for SqliteStore {
    fn load<T: Record>(&self) -> Result<Vec<T>> {
        let collection = T::collection_name();
        validate_collection_name(collection)?;

        let db = self.conn()?;
        let records = Self::decode(Self::load_with(&db, collection)?)?;
        debug!(collection, count = records.len(), "Loaded collection from database");
        Ok(records)
    }

    fn save<T: Record>(&self, records: &[T]) -> Result<()> {
        let collection = T::collection_name();
        validate_collection_name(collection)?;

        let mut db = self.conn()?;
        let tx = db.transaction_with_behavior(TransactionBehavior::Immediate)?;
        Self::replace_tx(&tx, collection, records)?;
        tx.commit()?;
        Ok(())
    }

    fn init<T: Record>(&self) -> Result<()> {
        validate_collection_name(T::collection_name())?;
        let db = self.conn()?;
        Self::create_schema(&db)
    }

    fn transact<T, R, E, F>(&self, f: F) -> std::result::Result<R, E>
    where
        T: Record,
        E: From<eyre::Report>,
        F: FnOnce(&mut Vec<T>) -> std::result::Result<R, E>,
    {
        let collection = T::collection_name();
        validate_collection_name(collection)?;

        let mut db = self.conn()?;
        // Take the write lock before reading so concurrent writers queue instead of deadlocking
        let tx = db
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(eyre::Report::from)?;

        let mut records: Vec<T> = Self::decode(Self::load_with(&tx, collection)?)?;
        // Dropping `tx` on error rolls back
        let result = f(&mut records)?;

        Self::replace_tx(&tx, collection, &records)?;
        tx.commit().map_err(eyre::Report::from)?;

        debug!(collection, count = records.len(), "Committed collection");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::next_id;
    use serde::{Deserialize, Serialize};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestRecord {
        id: u64,
        name: String,
    }

    impl Record for TestRecord {
        fn id(&self) -> u64 {
            self.id
        }

        fn collection_name() -> &'static str {
            "test_records"
        }
    }

    fn rec(id: u64, name: &str) -> TestRecord {
        TestRecord {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_open_creates_database_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("coursestore.db");

        let store = SqliteStore::open(&path).unwrap();
        store.init::<TestRecord>().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_and_load_preserve_order() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.save(&[rec(3, "third"), rec(1, "first"), rec(2, "授業")]).unwrap();
        let loaded: Vec<TestRecord> = store.load().unwrap();

        assert_eq!(loaded, vec![rec(3, "third"), rec(1, "first"), rec(2, "授業")]);
    }

    #[test]
    fn test_save_replaces_collection() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.save(&[rec(1, "a"), rec(2, "b")]).unwrap();
        store.save(&[rec(2, "b")]).unwrap();

        assert_eq!(store.load::<TestRecord>().unwrap(), vec![rec(2, "b")]);
    }

    #[test]
    fn test_transact_commit_and_rollback() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.init::<TestRecord>().unwrap();

        store
            .transact(|records: &mut Vec<TestRecord>| -> Result<()> {
                let id = next_id(records);
                records.push(rec(id, "kept"));
                Ok(())
            })
            .unwrap();

        let result = store.transact(|records: &mut Vec<TestRecord>| -> Result<()> {
            records.clear();
            Err(eyre!("rejected"))
        });
        assert!(result.is_err());

        assert_eq!(store.load::<TestRecord>().unwrap(), vec![rec(1, "kept")]);
    }

    #[test]
    fn test_concurrent_connections_queue_writers() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("coursestore.db");
        SqliteStore::open(&path).unwrap().init::<TestRecord>().unwrap();

        let writers = 16;
        let barrier = Arc::new(Barrier::new(writers));
        let handles: Vec<_> = (0..writers)
            .map(|i| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    // Each writer has its own connection, like separate processes
                    let store = SqliteStore::open(&path).unwrap();
                    barrier.wait();
                    store.transact(|records: &mut Vec<TestRecord>| -> Result<()> {
                        let id = next_id(records);
                        records.push(rec(id, &format!("writer {}", i)));
                        Ok(())
                    })
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let mut ids: Vec<u64> = store.load::<TestRecord>().unwrap().iter().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, (1..=writers as u64).collect::<Vec<_>>());
    }
}
