//! JSON file-based store.
//!
//! This module provides a single-user [`RemoteStore`] backed by a human-readable JSON
//! file, for development and for trying the tracker without a hosted project. It uses
//! atomic file writes (write-to-temp + rename) so a crash never leaves a corrupt file.
//! It is a separate backend, not a cache of the hosted store.
//!
//! # Performance Characteristics
//!
//! - **Read**: loads the entire file into memory once
//! - **Write**: serializes and writes the entire dataset on every mutation
//! - **Best for**: a personal logbook of a few thousand fillups

use crate::domain::error::{MileyError, Result};
use crate::domain::SessionUser;
use crate::storage::backend::RemoteStore;
use crate::storage::models::{
    FillupChanges, FillupRow, NewFillupRow, NewVehicleRow, VehicleRow,
};
use crate::storage::tables::Tables;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current on-disk format version.
const FORMAT_VERSION: u32 = 1;

/// JSON storage container format.
///
/// This is the top-level structure serialized to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreData {
    /// Version of the storage format for future migrations.
    version: u32,

    #[serde(flatten)]
    tables: Tables,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            tables: Tables::default(),
        }
    }
}

/// JSON file store.
///
/// The whole dataset is kept in memory and persisted after each successful mutation.
/// All rows are read and written as `user`, the fixed local account.
///
/// # File Format
///
/// ```json
/// {
///   "version": 1,
///   "motorcycles": [
///     { "id": "4f0c…", "user_id": "local", "name": "Commuter", "model": "Splendor", "created_at": "2024-03-01T10:00:00Z" }
///   ],
///   "fillups": [
///     { "id": "9a1e…", "user_id": "local", "motorcycle_id": "4f0c…", "date": "2024-03-05",
///       "odometer": 15230, "liters": 4.5, "cost": 472.5, "pump_name": null }
///   ]
/// }
/// ```
pub struct JsonStore {
    /// Path to the JSON file on disk.
    file_path: PathBuf,

    /// In-memory data, loaded on creation.
    data: StoreData,

    /// The local account every row belongs to.
    user: SessionUser,
}

impl JsonStore {
    /// Creates or opens a JSON store.
    ///
    /// If the file exists, loads existing data. Otherwise starts empty; the file is
    /// created on the first write. Parent directories are created automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory creation fails
    /// - File exists but contains invalid JSON
    /// - File permissions prevent reading
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use miley::domain::SessionUser;
    /// use miley::storage::JsonStore;
    /// use std::path::PathBuf;
    ///
    /// let user = SessionUser { id: "local".into(), email: None };
    /// let store = JsonStore::open(PathBuf::from("/tmp/miley.json"), user)?;
    /// # Ok::<(), miley::domain::MileyError>(())
    /// ```
    pub fn open(file_path: PathBuf, user: SessionUser) -> Result<Self> {
        tracing::debug!(path = ?file_path, "opening JSON store");

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = if file_path.exists() {
            Self::load_from_file(&file_path)?
        } else {
            tracing::debug!("initializing new empty store");
            StoreData::default()
        };

        tracing::debug!(
            vehicle_count = data.tables.motorcycles.len(),
            fillup_count = data.tables.fillups.len(),
            "store opened"
        );

        Ok(Self {
            file_path,
            data,
            user,
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Loads store data from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid JSON, or was
    /// written by a newer format version.
    fn load_from_file(path: &Path) -> Result<StoreData> {
        let contents = std::fs::read_to_string(path)?;
        let data: StoreData = serde_json::from_str(&contents)
            .map_err(|e| MileyError::Storage(format!("failed to parse JSON: {e}")))?;

        if data.version > FORMAT_VERSION {
            return Err(MileyError::Storage(format!(
                "unsupported store version {} (expected {FORMAT_VERSION})",
                data.version
            )));
        }

        Ok(data)
    }

    /// Saves store data to disk using an atomic write.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be written or renamed.
    fn save_to_file(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.data)
            .map_err(|e| MileyError::Storage(format!("failed to serialize JSON: {e}")))?;

        let tmp_path = self.file_path.with_extension("tmp");

        tracing::trace!(tmp_path = ?tmp_path, "writing to temporary file");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.file_path)?;

        tracing::debug!(path = ?self.file_path, "store saved");
        Ok(())
    }

    /// Applies `mutate` to the tables and persists the result.
    ///
    /// The in-memory tables are only replaced once the file write has succeeded, so a
    /// failed write leaves both the file and memory at the previous state.
    fn commit<T>(&mut self, mutate: impl FnOnce(&mut Tables, &str) -> Result<T>) -> Result<T> {
        let previous = self.data.tables.clone();
        let result = mutate(&mut self.data.tables, &self.user.id)?;

        if let Err(e) = self.save_to_file() {
            self.data.tables = previous;
            return Err(e);
        }

        Ok(result)
    }
}

impl RemoteStore for JsonStore {
    fn current_user(&self) -> Result<SessionUser> {
        Ok(self.user.clone())
    }

    fn list_vehicles(&self) -> Result<Vec<VehicleRow>> {
        let _span = tracing::debug_span!("json_list_vehicles").entered();
        Ok(self.data.tables.vehicles_of(&self.user.id))
    }

    fn list_fillups(&self) -> Result<Vec<FillupRow>> {
        let _span = tracing::debug_span!("json_list_fillups").entered();
        Ok(self.data.tables.fillups_of(&self.user.id))
    }

    fn insert_vehicle(&mut self, row: &NewVehicleRow) -> Result<VehicleRow> {
        let _span = tracing::debug_span!("json_insert_vehicle", name = %row.name).entered();
        self.commit(|tables, user| tables.insert_vehicle(user, row))
    }

    fn insert_fillup(&mut self, row: &NewFillupRow) -> Result<FillupRow> {
        let _span = tracing::debug_span!(
            "json_insert_fillup",
            vehicle_id = %row.motorcycle_id,
            odometer = row.odometer
        )
        .entered();
        self.commit(|tables, user| tables.insert_fillup(user, row))
    }

    fn update_fillup(&mut self, id: &str, changes: &FillupChanges) -> Result<FillupRow> {
        let _span = tracing::debug_span!("json_update_fillup", id = %id).entered();
        self.commit(|tables, user| tables.update_fillup(user, id, changes))
    }

    fn delete_fillups_for_vehicle(&mut self, vehicle_id: &str) -> Result<()> {
        let _span =
            tracing::debug_span!("json_delete_fillups_for_vehicle", vehicle_id = %vehicle_id)
                .entered();
        let removed =
            self.commit(|tables, user| Ok(tables.delete_fillups_for_vehicle(user, vehicle_id)))?;
        tracing::debug!(removed, "fillups deleted");
        Ok(())
    }

    fn delete_vehicle(&mut self, id: &str) -> Result<()> {
        let _span = tracing::debug_span!("json_delete_vehicle", id = %id).entered();
        let removed = self.commit(|tables, user| tables.delete_vehicle(user, id))?;
        tracing::debug!(removed, "vehicle deleted");
        Ok(())
    }

    fn delete_fillup(&mut self, id: &str) -> Result<()> {
        let _span = tracing::debug_span!("json_delete_fillup", id = %id).entered();
        let removed = self.commit(|tables, user| Ok(tables.delete_fillup(user, id)))?;
        tracing::debug!(removed, "fillup deleted");
        Ok(())
    }

    fn sign_out(&mut self) -> Result<()> {
        tracing::debug!(user_id = %self.user.id, "local store has no session to end");
        Ok(())
    }
}
