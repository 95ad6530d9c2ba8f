//! Remote store abstraction.
//!
//! This module defines the [`RemoteStore`] trait, the only path by which records enter
//! or leave the application. The hosted store enforces ownership through row-level
//! security, so every method acts on the signed-in user's rows only.
//!
//! # Design Philosophy
//!
//! The trait is minimal and maps one-to-one onto the requests the application issues;
//! it is not a generic query builder. Each call is a single request, and callers that
//! need several (the cascade delete) issue them one after another.

use crate::domain::error::Result;
use crate::domain::SessionUser;
use crate::storage::models::{
    FillupChanges, FillupRow, NewFillupRow, NewVehicleRow, VehicleRow,
};
use std::fmt;

/// The two collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Vehicles,
    Fillups,
}

impl Collection {
    /// Table name used by the store.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Vehicles => "motorcycles",
            Self::Fillups => "fillups",
        }
    }

    /// Column the collection is listed by, always ascending.
    #[must_use]
    pub const fn order_column(self) -> &'static str {
        match self {
            Self::Vehicles => "created_at",
            Self::Fillups => "date",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Abstraction over the record store and its authentication session.
///
/// # Implementations
///
/// - [`PostgrestStore`](crate::storage::PostgrestStore): the hosted store over HTTP
/// - [`JsonStore`](crate::storage::JsonStore): a single-user JSON file
/// - [`MemoryStore`](crate::storage::MemoryStore): in-memory, with failure injection
///
/// # Examples
///
/// ```
/// use miley::domain::SessionUser;
/// use miley::storage::{MemoryStore, RemoteStore};
/// use miley::storage::models::NewVehicleRow;
///
/// let user = SessionUser { id: "u1".into(), email: None };
/// let mut store = MemoryStore::new(user);
/// store.insert_vehicle(&NewVehicleRow {
///     user_id: "u1".into(),
///     name: "Commuter".into(),
///     model: None,
/// })?;
/// assert_eq!(store.list_vehicles()?.len(), 1);
/// # Ok::<(), miley::domain::MileyError>(())
/// ```
pub trait RemoteStore {
    /// Returns the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no session or the auth service rejects it.
    fn current_user(&self) -> Result<SessionUser>;

    /// Lists the user's vehicles ordered by creation time, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn list_vehicles(&self) -> Result<Vec<VehicleRow>>;

    /// Lists the user's fillups ordered by date, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn list_fillups(&self) -> Result<Vec<FillupRow>>;

    /// Inserts a vehicle and returns the stored row with its assigned id and timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert is rejected.
    fn insert_vehicle(&mut self, row: &NewVehicleRow) -> Result<VehicleRow>;

    /// Inserts a fillup and returns the stored row with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert is rejected.
    fn insert_fillup(&mut self, row: &NewFillupRow) -> Result<FillupRow>;

    /// Overwrites every editable field of fillup `id` and returns the updated row.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is rejected or no row matches `id`.
    fn update_fillup(&mut self, id: &str, changes: &FillupChanges) -> Result<FillupRow>;

    /// Deletes every fillup referencing `vehicle_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete is rejected.
    fn delete_fillups_for_vehicle(&mut self, vehicle_id: &str) -> Result<()>;

    /// Deletes vehicle `id`. Its fillups are not touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete is rejected.
    fn delete_vehicle(&mut self, id: &str) -> Result<()>;

    /// Deletes fillup `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete is rejected.
    fn delete_fillup(&mut self, id: &str) -> Result<()>;

    /// Terminates the authenticated session.
    ///
    /// # Errors
    ///
    /// Returns an error if the auth service rejects the request.
    fn sign_out(&mut self) -> Result<()>;
}
