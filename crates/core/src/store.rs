// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The persistence boundary.
//!
//! Workflows never talk to a database directly. They hand a closure to
//! [`WorkflowStore::atomically`], which runs it against a [`UnitOfWork`]
//! and commits every write the closure made, or none of them.
//!
//! Every entity carries a `version`. `update_*` methods write only if the
//! stored version still equals the version on the value passed in, and
//! return the entity with its version bumped. A mismatch is reported as
//! [`CoreError::Conflict`].

use showroom_audit::{AuditEvent, Subject};
use showroom_domain::{
    DomainError, NewParty, NewSale, NewTestDrive, NewTransaction, Party, PartyId, Role, Sale,
    SaleId, SaleStatus, TestDrive, TestDriveId, TestDriveStatus, Transaction, TransactionId,
    TransactionRef, TransactionStatus, Vehicle, VehicleDetails, VehicleId, VehicleStatus,
};

use crate::error::CoreError;

/// Filter for vehicle listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VehicleFilter {
    pub status: Option<VehicleStatus>,
    /// Include soft-removed vehicles.
    pub include_removed: bool,
}

impl VehicleFilter {
    #[must_use]
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        (self.include_removed || !vehicle.removed)
            && self.status.is_none_or(|status| vehicle.status == status)
    }
}

/// Filter for sale listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaleFilter {
    pub status: Option<SaleStatus>,
    pub vehicle_id: Option<VehicleId>,
    pub customer_id: Option<PartyId>,
}

impl SaleFilter {
    #[must_use]
    pub fn matches(&self, sale: &Sale) -> bool {
        self.status.is_none_or(|status| sale.status == status)
            && self.vehicle_id.is_none_or(|id| sale.vehicle_id == id)
            && self.customer_id.is_none_or(|id| sale.customer_id == id)
    }
}

/// Filter for transaction listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub status: Option<TransactionStatus>,
    pub sale_id: Option<SaleId>,
}

impl TransactionFilter {
    #[must_use]
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.status.is_none_or(|status| transaction.status == status)
            && self.sale_id.is_none_or(|id| transaction.sale_id == id)
    }
}

/// Filter for test-drive listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestDriveFilter {
    pub status: Option<TestDriveStatus>,
    pub vehicle_id: Option<VehicleId>,
    pub customer_id: Option<PartyId>,
}

impl TestDriveFilter {
    #[must_use]
    pub fn matches(&self, test_drive: &TestDrive) -> bool {
        self.status.is_none_or(|status| test_drive.status == status)
            && self.vehicle_id.is_none_or(|id| test_drive.vehicle_id == id)
            && self.customer_id.is_none_or(|id| test_drive.customer_id == id)
    }
}

/// Reads and writes available inside one atomic unit.
///
/// Listings return rows ordered by id.
pub trait UnitOfWork {
    fn find_party(&mut self, id: PartyId) -> Result<Option<Party>, CoreError>;
    /// Errors with `Conflict` if the email is already registered.
    fn insert_party(&mut self, party: &NewParty) -> Result<Party, CoreError>;
    fn list_parties(&mut self, role: Option<Role>) -> Result<Vec<Party>, CoreError>;
    /// Sets the party's active flag. Errors with `PartyNotFound` if the
    /// party does not exist.
    fn set_party_active(&mut self, id: PartyId, active: bool) -> Result<Party, CoreError>;

    /// Claims the vehicle exclusively for the rest of the unit.
    ///
    /// Must be called before the vehicle's status is read to decide whether
    /// an operation is legal. Returns `VehicleNotFound` if the vehicle does
    /// not exist or has been removed.
    fn lock_vehicle(&mut self, id: VehicleId) -> Result<Vehicle, CoreError>;
    fn find_vehicle(&mut self, id: VehicleId) -> Result<Option<Vehicle>, CoreError>;
    /// Errors with `Conflict` if the VIN is already registered.
    fn insert_vehicle(&mut self, details: &VehicleDetails) -> Result<Vehicle, CoreError>;
    fn update_vehicle(&mut self, vehicle: &Vehicle) -> Result<Vehicle, CoreError>;
    fn list_vehicles(&mut self, filter: &VehicleFilter) -> Result<Vec<Vehicle>, CoreError>;

    /// Returns the status of a vehicle still in inventory.
    ///
    /// # Errors
    ///
    /// Returns `VehicleNotFound` for missing or removed vehicles.
    fn vehicle_status(&mut self, id: VehicleId) -> Result<VehicleStatus, CoreError> {
        match self.find_vehicle(id)? {
            Some(vehicle) if !vehicle.removed => Ok(vehicle.status),
            _ => Err(DomainError::VehicleNotFound(id).into()),
        }
    }

    /// Overwrites a vehicle's status without consulting the lifecycle table.
    ///
    /// Callers validate the transition first.
    ///
    /// # Errors
    ///
    /// Returns `VehicleNotFound` for missing or removed vehicles, or
    /// `Conflict` if the vehicle changed since it was read.
    fn set_vehicle_status(
        &mut self,
        id: VehicleId,
        status: VehicleStatus,
    ) -> Result<Vehicle, CoreError> {
        let vehicle: Vehicle = match self.find_vehicle(id)? {
            Some(vehicle) if !vehicle.removed => vehicle,
            _ => return Err(DomainError::VehicleNotFound(id).into()),
        };
        self.update_vehicle(&Vehicle { status, ..vehicle })
    }

    fn find_sale(&mut self, id: SaleId) -> Result<Option<Sale>, CoreError>;
    fn insert_sale(&mut self, sale: &NewSale) -> Result<Sale, CoreError>;
    fn update_sale(&mut self, sale: &Sale) -> Result<Sale, CoreError>;
    fn delete_sale(&mut self, sale: &Sale) -> Result<(), CoreError>;
    fn list_sales(&mut self, filter: &SaleFilter) -> Result<Vec<Sale>, CoreError>;

    fn find_transaction(&mut self, id: TransactionId) -> Result<Option<Transaction>, CoreError>;
    /// Errors with `Conflict` if the reference is already used.
    fn insert_transaction(&mut self, transaction: &NewTransaction)
    -> Result<Transaction, CoreError>;
    fn update_transaction(&mut self, transaction: &Transaction) -> Result<Transaction, CoreError>;
    fn transactions_for_sale(&mut self, sale: SaleId) -> Result<Vec<Transaction>, CoreError>;
    fn transaction_ref_exists(&mut self, reference: &TransactionRef) -> Result<bool, CoreError>;
    fn list_transactions(
        &mut self,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, CoreError>;

    fn find_test_drive(&mut self, id: TestDriveId) -> Result<Option<TestDrive>, CoreError>;
    fn insert_test_drive(&mut self, test_drive: &NewTestDrive) -> Result<TestDrive, CoreError>;
    fn update_test_drive(&mut self, test_drive: &TestDrive) -> Result<TestDrive, CoreError>;
    /// Every booking of the vehicle, whatever its status.
    fn test_drives_for_vehicle(&mut self, vehicle: VehicleId)
    -> Result<Vec<TestDrive>, CoreError>;
    fn list_test_drives(&mut self, filter: &TestDriveFilter) -> Result<Vec<TestDrive>, CoreError>;

    /// Appends an event and returns it with its assigned id.
    fn append_audit_event(&mut self, event: &AuditEvent) -> Result<AuditEvent, CoreError>;
    /// Events filed under `subject`, oldest first.
    fn audit_events(&mut self, subject: &Subject) -> Result<Vec<AuditEvent>, CoreError>;
}

/// A store that can run units of work.
pub trait WorkflowStore {
    /// Runs `work` as one atomic unit.
    ///
    /// Writes become visible only if `work` returns `Ok`; any error rolls
    /// back everything the unit wrote.
    ///
    /// # Errors
    ///
    /// Returns the error `work` returned, or a `Storage` error if the unit
    /// could not be opened or committed.
    fn atomically<T, F>(&self, work: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, CoreError>;

    /// Runs `work` for reading only. Nothing it writes is kept.
    ///
    /// # Errors
    ///
    /// Returns the error `work` returned, or a `Storage` error.
    fn snapshot<T, F>(&self, work: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, CoreError>;
}
