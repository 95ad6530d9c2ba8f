//! In-memory store with failure injection.
//!
//! [`MemoryStore`] behaves like the hosted store but keeps everything in process and
//! can be told to fail specific requests. It records every request it receives, which
//! makes the order of multi-request operations (the cascade delete) observable.

use crate::domain::error::{MileyError, Result};
use crate::domain::SessionUser;
use crate::storage::backend::RemoteStore;
use crate::storage::models::{
    FillupChanges, FillupRow, NewFillupRow, NewVehicleRow, VehicleRow,
};
use crate::storage::tables::Tables;
use std::cell::RefCell;
use std::collections::HashSet;

/// Individual store requests that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Request {
    CurrentUser,
    ListVehicles,
    ListFillups,
    InsertVehicle,
    InsertFillup,
    UpdateFillup,
    DeleteFillupsForVehicle,
    DeleteVehicle,
    DeleteFillup,
    SignOut,
}

/// In-memory [`RemoteStore`].
#[derive(Debug)]
pub struct MemoryStore {
    tables: Tables,
    user: SessionUser,
    failing: HashSet<Request>,
    log: RefCell<Vec<Request>>,
    signed_out: bool,
}

impl MemoryStore {
    /// Creates an empty store with `user` signed in.
    #[must_use]
    pub fn new(user: SessionUser) -> Self {
        Self {
            tables: Tables::default(),
            user,
            failing: HashSet::new(),
            log: RefCell::new(Vec::new()),
            signed_out: false,
        }
    }

    /// Makes every subsequent `request` fail with a remote error.
    pub fn fail_on(&mut self, request: Request) {
        self.failing.insert(request);
    }

    /// Lets `request` succeed again.
    pub fn recover(&mut self, request: Request) {
        self.failing.remove(&request);
    }

    /// Requests received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.log.borrow().clone()
    }

    /// Direct read access to the stored rows of every user.
    #[must_use]
    pub const fn tables(&self) -> &Tables {
        &self.tables
    }

    /// Direct write access to the stored rows, for simulating changes made elsewhere.
    pub fn tables_mut(&mut self) -> &mut Tables {
        &mut self.tables
    }

    /// Whether [`RemoteStore::sign_out`] has succeeded.
    #[must_use]
    pub const fn is_signed_out(&self) -> bool {
        self.signed_out
    }

    fn begin(&self, request: Request) -> Result<()> {
        self.log.borrow_mut().push(request);

        if self.failing.contains(&request) {
            return Err(MileyError::Remote {
                status: 503,
                message: format!("simulated failure of {request:?}"),
            });
        }
        if self.signed_out && request != Request::SignOut {
            return Err(MileyError::Auth("not signed in".to_string()));
        }
        Ok(())
    }
}

impl RemoteStore for MemoryStore {
    fn current_user(&self) -> Result<SessionUser> {
        self.begin(Request::CurrentUser)?;
        Ok(self.user.clone())
    }

    fn list_vehicles(&self) -> Result<Vec<VehicleRow>> {
        self.begin(Request::ListVehicles)?;
        Ok(self.tables.vehicles_of(&self.user.id))
    }

    fn list_fillups(&self) -> Result<Vec<FillupRow>> {
        self.begin(Request::ListFillups)?;
        Ok(self.tables.fillups_of(&self.user.id))
    }

    fn insert_vehicle(&mut self, row: &NewVehicleRow) -> Result<VehicleRow> {
        self.begin(Request::InsertVehicle)?;
        self.tables.insert_vehicle(&self.user.id, row)
    }

    fn insert_fillup(&mut self, row: &NewFillupRow) -> Result<FillupRow> {
        self.begin(Request::InsertFillup)?;
        self.tables.insert_fillup(&self.user.id, row)
    }

    fn update_fillup(&mut self, id: &str, changes: &FillupChanges) -> Result<FillupRow> {
        self.begin(Request::UpdateFillup)?;
        self.tables.update_fillup(&self.user.id, id, changes)
    }

    fn delete_fillups_for_vehicle(&mut self, vehicle_id: &str) -> Result<()> {
        self.begin(Request::DeleteFillupsForVehicle)?;
        self.tables.delete_fillups_for_vehicle(&self.user.id, vehicle_id);
        Ok(())
    }

    fn delete_vehicle(&mut self, id: &str) -> Result<()> {
        self.begin(Request::DeleteVehicle)?;
        self.tables.delete_vehicle(&self.user.id, id)?;
        Ok(())
    }

    fn delete_fillup(&mut self, id: &str) -> Result<()> {
        self.begin(Request::DeleteFillup)?;
        self.tables.delete_fillup(&self.user.id, id);
        Ok(())
    }

    fn sign_out(&mut self) -> Result<()> {
        self.begin(Request::SignOut)?;
        self.signed_out = true;
        Ok(())
    }
}
