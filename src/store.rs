// Record store abstraction and the JSON document backend

use crate::document;
use crate::error::{CourseError, CourseResult, Entity};
use crate::record::Record;
use eyre::{Context, Result, eyre};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Persistence for named collections of homogeneous records.
///
/// Every `save` replaces the whole collection. `transact` is the only way
/// managers mutate a collection: it loads the current snapshot, hands it to
/// the closure and saves it back only if the closure succeeds, all while
/// holding the collection's writer lock.
pub trait RecordStore: Send + Sync {
    /// Load every record of `T`'s collection in stored order
    fn load<T: Record>(&self) -> Result<Vec<T>>;

    /// Overwrite `T`'s collection with `records`
    fn save<T: Record>(&self, records: &[T]) -> Result<()>;

    /// Create an empty collection for `T` unless one already exists
    fn init<T: Record>(&self) -> Result<()>;

    /// One read-modify-write cycle on `T`'s collection with a single writer at a time
    fn transact<T, R, E, F>(&self, f: F) -> std::result::Result<R, E>
    where
        T: Record,
        E: From<eyre::Report>,
        F: FnOnce(&mut Vec<T>) -> std::result::Result<R, E>;
}

/// Store backed by one JSON document per collection: `{dir}/{collection}.json`
pub struct JsonStore {
    base_path: PathBuf,
    locks: Mutex<HashMap<&'static str, Arc<Mutex<()>>>>,
}

impl JsonStore {
    /// Open a store rooted at `path`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;

        info!(path = ?base_path, "Opened JSON record store");
        Ok(Self {
            base_path,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Get the base path of this store
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of the document holding `collection`
    pub fn document_path(&self, collection: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", collection))
    }

    fn lock_path(&self, collection: &str) -> PathBuf {
        self.base_path.join(format!("{}.lock", collection))
    }

    fn collection_lock(&self, collection: &'static str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().map_err(|_| eyre!("Store lock table poisoned"))?;
        Ok(locks.entry(collection).or_default().clone())
    }

    /// Exclusive advisory lock shared with other processes using the same directory
    fn lock_file(&self, collection: &str) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path(collection))
            .context("Failed to open collection lock file")?;

        // Lock is released when the file is dropped
        file.lock_exclusive().context("Failed to acquire file lock")?;
        Ok(file)
    }
}

impl RecordStore for JsonStore {
    fn load<T: Record>(&self) -> Result<Vec<T>> {
        let collection = T::collection_name();
        validate_collection_name(collection)?;
        document::read_collection(&self.document_path(collection), collection)
    }

    fn save<T: Record>(&self, records: &[T]) -> Result<()> {
        let collection = T::collection_name();
        validate_collection_name(collection)?;
        document::write_collection(&self.document_path(collection), collection, records)
    }

    fn init<T: Record>(&self) -> Result<()> {
        let collection = T::collection_name();
        validate_collection_name(collection)?;

        let path = self.document_path(collection);
        if path.exists() {
            debug!(collection, "Collection document already present");
            return Ok(());
        }

        document::write_collection::<T>(&path, collection, &[])?;
        info!(collection, path = ?path, "Created empty collection document");
        Ok(())
    }

    fn transact<T, R, E, F>(&self, f: F) -> std::result::Result<R, E>
    where
        T: Record,
        E: From<eyre::Report>,
        F: FnOnce(&mut Vec<T>) -> std::result::Result<R, E>,
    {
        let collection = T::collection_name();

        let lock = self.collection_lock(collection)?;
        let _guard = lock
            .lock()
            .map_err(|_| eyre!("Collection lock poisoned: {}", collection))?;
        let _file_lock = self.lock_file(collection)?;

        let mut records = self.load::<T>()?;
        let result = f(&mut records)?;
        self.save(&records)?;

        debug!(collection, count = records.len(), "Committed collection");
        Ok(result)
    }
}

/// Remove the record with `id` from `T`'s collection
///
/// Fails with `NotFound(entity)` and leaves the collection untouched when no record has that id.
pub fn delete_record<T: Record, S: RecordStore>(store: &S, id: u64, entity: Entity) -> CourseResult<()> {
    store.transact(|records: &mut Vec<T>| {
        let before = records.len();
        records.retain(|r| r.id() != id);

        if records.len() == before {
            debug!(collection = T::collection_name(), id, "Delete target not found");
            return Err(CourseError::NotFound(entity));
        }

        info!(collection = T::collection_name(), id, "Deleted record");
        Ok(())
    })
}

pub(crate) fn validate_collection_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(eyre!("Collection name cannot be empty"));
    }
    if name.len() > 64 {
        return Err(eyre!("Collection name too long: {} (max 64 chars)", name));
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(eyre!(
            "Invalid collection name: {} (must be alphanumeric with _/-)",
            name
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::next_id;
    use serde::{Deserialize, Serialize};
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
    fn test_store_open_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("data");

        let store = JsonStore::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.base_path(), dir.as_path());
    }

    #[test]
    fn test_load_absent_collection_is_error() {
        let temp = TempDir::new().unwrap();
        let store = JsonStore::open(temp.path()).unwrap();

        assert!(store.load::<TestRecord>().is_err());
    }

    #[test]
    fn test_init_creates_empty_document_once() {
        let temp = TempDir::new().unwrap();
        let store = JsonStore::open(temp.path()).unwrap();

        store.init::<TestRecord>().unwrap();
        let path = store.document_path("test_records");
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\n  \"test_records\": []\n}");
        assert!(store.load::<TestRecord>().unwrap().is_empty());

        store.save(&[rec(1, "kept")]).unwrap();
        store.init::<TestRecord>().unwrap();
        assert_eq!(store.load::<TestRecord>().unwrap(), vec![rec(1, "kept")]);
    }

    #[test]
    fn test_save_replaces_whole_collection() {
        let temp = TempDir::new().unwrap();
        let store = JsonStore::open(temp.path()).unwrap();

        store.save(&[rec(1, "a"), rec(2, "b")]).unwrap();
        store.save(&[rec(3, "c")]).unwrap();

        assert_eq!(store.load::<TestRecord>().unwrap(), vec![rec(3, "c")]);
    }

    #[test]
    fn test_transact_commits_on_success() {
        let temp = TempDir::new().unwrap();
        let store = JsonStore::open(temp.path()).unwrap();
        store.init::<TestRecord>().unwrap();

        let id = store
            .transact(|records: &mut Vec<TestRecord>| -> Result<u64> {
                let id = next_id(records);
                records.push(rec(id, "new"));
                Ok(id)
            })
            .unwrap();

        assert_eq!(id, 1);
        assert_eq!(store.load::<TestRecord>().unwrap(), vec![rec(1, "new")]);
    }

    #[test]
    fn test_transact_writes_nothing_on_error() {
        let temp = TempDir::new().unwrap();
        let store = JsonStore::open(temp.path()).unwrap();
        store.save(&[rec(1, "original")]).unwrap();
        let before = fs::read(store.document_path("test_records")).unwrap();

        let result = store.transact(|records: &mut Vec<TestRecord>| -> Result<()> {
            records.clear();
            Err(eyre!("rejected"))
        });

        assert!(result.is_err());
        assert_eq!(fs::read(store.document_path("test_records")).unwrap(), before);
    }

    #[test]
    fn test_concurrent_transacts_do_not_lose_updates() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(JsonStore::open(temp.path()).unwrap());
        store.init::<TestRecord>().unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .transact(|records: &mut Vec<TestRecord>| -> Result<()> {
                            let id = next_id(records);
                            records.push(rec(id, &format!("writer {}", i)));
                            Ok(())
                        })
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let records = store.load::<TestRecord>().unwrap();
        let mut ids: Vec<u64> = records.iter().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn test_delete_record_removes_exactly_one() {
        let temp = TempDir::new().unwrap();
        let store = JsonStore::open(temp.path()).unwrap();
        store.save(&[rec(1, "a"), rec(2, "b"), rec(3, "c")]).unwrap();

        delete_record::<TestRecord, _>(&store, 2, Entity::Comment).unwrap();
        assert_eq!(store.load::<TestRecord>().unwrap(), vec![rec(1, "a"), rec(3, "c")]);

        let again = delete_record::<TestRecord, _>(&store, 2, Entity::Comment);
        assert!(matches!(again, Err(CourseError::NotFound(Entity::Comment))));
        assert_eq!(store.load::<TestRecord>().unwrap().len(), 2);
    }

    #[test]
    fn test_validation_collection_name() {
        assert!(validate_collection_name("valid_name").is_ok());
        assert!(validate_collection_name("valid-name").is_ok());

        assert!(validate_collection_name("invalid/name").is_err());
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name(&"a".repeat(65)).is_err());
    }
}
