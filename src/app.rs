// Wiring: configuration -> store + catalog -> managers

use crate::catalog::{Catalog, ClassQuery};
use crate::comments::CommentManager;
use crate::config::{Backend, Config};
use crate::document;
use crate::encourage::{self, CommandGenerator, Unavailable};
use crate::error::CourseResult;
use crate::favorites::FavoriteManager;
use crate::models::{ClassRecord, Comment, Favorite, TimetableEntry};
use crate::record::Record;
use crate::sqlite::SqliteStore;
use crate::store::{JsonStore, RecordStore};
use crate::timetable::TimetableManager;
use eyre::{Context, Result};
use std::fs;
use tracing::info;

/// The configured backend, chosen at runtime
pub enum AnyStore {
    Json(JsonStore),
    Sqlite(SqliteStore),
}

impl AnyStore {
    pub fn open(config: &Config) -> Result<Self> {
        match config.backend {
            Backend::Json => Ok(AnyStore::Json(JsonStore::open(&config.data_dir)?)),
            Backend::Sqlite => {
                fs::create_dir_all(&config.data_dir).context("Failed to create data directory")?;
                Ok(AnyStore::Sqlite(SqliteStore::open(config.sqlite_path())?))
            }
        }
    }
}

impl RecordStore for AnyStore {
    fn load<T: Record>(&self) -> Result<Vec<T>> {
        match self {
            AnyStore::Json(s) => s.load(),
            AnyStore::Sqlite(s) => s.load(),
        }
    }

    fn save<T: Record>(&self, records: &[T]) -> Result<()> {
        match self {
            AnyStore::Json(s) => s.save(records),
            AnyStore::Sqlite(s) => s.save(records),
        }
    }

    fn init<T: Record>(&self) -> Result<()> {
        match self {
            AnyStore::Json(s) => s.init::<T>(),
            AnyStore::Sqlite(s) => s.init::<T>(),
        }
    }

    fn transact<T, R, E, F>(&self, f: F) -> std::result::Result<R, E>
    where
        T: Record,
        E: From<eyre::Report>,
        F: FnOnce(&mut Vec<T>) -> std::result::Result<R, E>,
    {
        match self {
            AnyStore::Json(s) => s.transact(f),
            AnyStore::Sqlite(s) => s.transact(f),
        }
    }
}

/// Create every mutable collection, plus an empty catalog if there is none yet
pub fn init_data<S: RecordStore>(store: &S, config: &Config) -> Result<()> {
    store.init::<Favorite>()?;
    store.init::<Comment>()?;
    store.init::<TimetableEntry>()?;

    let catalog_path = config.catalog_path();
    if !catalog_path.exists() {
        if let Some(parent) = catalog_path.parent() {
            fs::create_dir_all(parent).context("Failed to create catalog directory")?;
        }
        document::write_atomic(&catalog_path, b"[]")?;
        info!(path = ?catalog_path, "Created empty class catalog");
    }

    Ok(())
}

/// Entry point for the request boundary: owns the store, the catalog and the config
pub struct Scheduler<S: RecordStore> {
    store: S,
    catalog: Catalog,
    config: Config,
}

impl Scheduler<AnyStore> {
    /// Open the configured backend and load the class catalog
    pub fn open(config: Config) -> Result<Self> {
        let store = AnyStore::open(&config)?;
        let catalog = Catalog::load(&config.catalog_path())?;
        info!(classes = catalog.len(), backend = ?config.backend, "Scheduler ready");
        Ok(Self::new(store, catalog, config))
    }
}

impl<S: RecordStore> Scheduler<S> {
    pub fn new(store: S, catalog: Catalog, config: Config) -> Self {
        Self { store, catalog, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn classes(&self, query: &ClassQuery) -> Vec<ClassRecord> {
        self.catalog.list(query)
    }

    pub fn favorites(&self) -> FavoriteManager<'_, S> {
        FavoriteManager::new(&self.store, &self.catalog)
    }

    pub fn comments(&self) -> CommentManager<'_, S> {
        CommentManager::new(&self.store)
    }

    pub fn timetable(&self) -> TimetableManager<'_, S> {
        TimetableManager::new(&self.store, &self.catalog)
    }

    /// Encouragement comment for a class; never fails once the class is found
    pub fn encourage(&self, class_id: u64) -> CourseResult<String> {
        let class = self.catalog.require(class_id)?;
        let settings = &self.config.encourage;

        let text = match CommandGenerator::from_config(settings) {
            Some(generator) => encourage::encourage(&generator, class, &settings.fallback),
            None => encourage::encourage(&Unavailable, class, &settings.fallback),
        };
        Ok(text)
    }
}
