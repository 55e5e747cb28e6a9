//! The [Store] lives in a single JSON file inside the application directory:
//!  - reads take a shared lock and writes an exclusive lock on a sibling lock file;
//!  - writes go to a temporary file which is renamed over the store;
//!  - importing another store first copies the current one to a fixed backup file.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use tokio::fs::File;
use tracing::{debug, info, instrument};

use crate::fs::operations::{replace_with_backup, write_atomically};

use super::store::Store;

pub const DATABASE_FILE_NAME: &str = "ticktrack.json";
pub const BACKUP_FILE_NAME: &str = "ticktrack.backup.json";
const LOCK_FILE_NAME: &str = "ticktrack.lock";

pub struct Database {
    dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Where the replaced store was copied, if there was one.
    pub backup: Option<PathBuf>,
}

impl Database {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(DATABASE_FILE_NAME)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.dir.join(BACKUP_FILE_NAME)
    }

    async fn lock(&self, exclusive: bool) -> Result<File> {
        let file = File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(self.dir.join(LOCK_FILE_NAME))
            .await?;
        if exclusive {
            file.lock_exclusive()?;
        } else {
            file.lock_shared()?;
        }
        Ok(file)
    }

    /// Loads the store. A missing file is an empty store.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Store> {
        let lock = self.lock(false).await?;
        let result = read_store(&self.path()).await;
        lock.unlock_async().await?;
        result
    }

    #[instrument(skip(self, store))]
    pub async fn save(&self, store: &Store) -> Result<()> {
        let lock = self.lock(true).await?;
        let result = write_store(&self.path(), store).await;
        lock.unlock_async().await?;
        result
    }

    /// Loads the store, applies `change` and saves the result, holding the exclusive lock
    /// throughout. Nothing is written if `change` fails.
    pub async fn update<T>(&self, change: impl FnOnce(&mut Store) -> Result<T>) -> Result<T> {
        let lock = self.lock(true).await?;
        let result = async {
            let mut store = read_store(&self.path()).await?;
            let value = change(&mut store)?;
            write_store(&self.path(), &store).await?;
            Ok(value)
        }
        .await;
        lock.unlock_async().await?;
        result
    }

    /// Copies the store file to `destination`. Exporting before anything was saved writes an
    /// empty store.
    #[instrument(skip(self))]
    pub async fn export_to(&self, destination: &Path) -> Result<()> {
        let lock = self.lock(false).await?;
        let result: Result<()> = async {
            let store = read_store(&self.path()).await?;
            write_atomically(destination, &serde_json::to_vec_pretty(&store)?)
                .await
                .with_context(|| format!("Failed to write {destination:?}"))?;
            Ok(())
        }
        .await;
        lock.unlock_async().await?;
        result?;
        info!("Exported store to {destination:?}");
        Ok(())
    }

    /// Replaces the store with the file at `source`. The source must parse as a store, otherwise
    /// nothing changes. The current store is kept at [Database::backup_path].
    #[instrument(skip(self))]
    pub async fn import_from(&self, source: &Path) -> Result<ImportOutcome> {
        read_existing_store(source)
            .await
            .with_context(|| format!("{source:?} is not a valid ticktrack database"))?;

        let lock = self.lock(true).await?;
        let result = replace_with_backup(source, &self.path(), &self.backup_path()).await;
        lock.unlock_async().await?;

        let backed_up = result.with_context(|| format!("Failed to import {source:?}"))?;
        info!("Imported store from {source:?}, backup made: {backed_up}");
        Ok(ImportOutcome {
            backup: backed_up.then(|| self.backup_path()),
        })
    }
}

async fn read_store(path: &Path) -> Result<Store> {
    match read_existing_store(path).await {
        Err(e)
            if e
                .downcast_ref::<std::io::Error>()
                .is_some_and(|e| e.kind() == ErrorKind::NotFound) =>
        {
            debug!("No store at {path:?}, starting empty");
            Ok(Store::new())
        }
        result => result,
    }
}

async fn read_existing_store(path: &Path) -> Result<Store> {
    let contents = tokio::fs::read(path).await?;
    let store = serde_json::from_slice(&contents)
        .with_context(|| format!("Failed to parse store {path:?}"))?;
    Ok(store)
}

async fn write_store(path: &Path, store: &Store) -> Result<()> {
    let contents = serde_json::to_vec_pretty(store)?;
    write_atomically(path, &contents)
        .await
        .with_context(|| format!("Failed to write store {path:?}"))?;
    debug!("Saved store to {path:?}");
    Ok(())
}
