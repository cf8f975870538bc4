// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! [`UnitOfWork`] over an open `SQLite` transaction.

use diesel::SqliteConnection;
use showroom::{
    CoreError, SaleFilter, TestDriveFilter, TransactionFilter, UnitOfWork, VehicleFilter,
};
use showroom_audit::{AuditEvent, Subject};
use showroom_domain::{
    DomainError, NewParty, NewSale, NewTestDrive, NewTransaction, Party, PartyId, Role, Sale,
    SaleId, TestDrive, TestDriveId, Transaction, TransactionId, TransactionRef, Vehicle,
    VehicleDetails, VehicleId,
};

use crate::error::PersistenceError;
use crate::{mutations, queries};

/// A unit of work bound to a connection that is inside a transaction.
///
/// The transaction is opened with `BEGIN IMMEDIATE`, so the unit holds the
/// database write lock from its first statement to commit or rollback.
pub struct SqliteUnit<'c> {
    pub(crate) conn: &'c mut SqliteConnection,
}

/// Maps a unique violation to a conflict naming the taken value.
fn taken(what: String) -> impl FnOnce(PersistenceError) -> CoreError {
    move |err| match err {
        PersistenceError::UniqueViolation(_) => {
            CoreError::Conflict(format!("{what} is already registered"))
        }
        other => other.into(),
    }
}

/// Explains why a compare-and-swap write touched no rows.
fn stale(
    entity: &str,
    id: i64,
    expected: i64,
    found: Option<i64>,
    missing: DomainError,
) -> CoreError {
    match found {
        Some(found) => CoreError::Conflict(format!(
            "{entity} {id} was modified concurrently (expected version {expected}, found {found})"
        )),
        None => missing.into(),
    }
}

impl UnitOfWork for SqliteUnit<'_> {
    fn find_party(&mut self, id: PartyId) -> Result<Option<Party>, CoreError> {
        Ok(queries::parties::find_party(self.conn, id)?)
    }

    fn insert_party(&mut self, party: &NewParty) -> Result<Party, CoreError> {
        mutations::parties::insert_party(self.conn, party)
            .map_err(taken(format!("email '{}'", party.email)))
    }

    fn list_parties(&mut self, role: Option<Role>) -> Result<Vec<Party>, CoreError> {
        Ok(queries::parties::list_parties(self.conn, role)?)
    }

    fn set_party_active(&mut self, id: PartyId, active: bool) -> Result<Party, CoreError> {
        if mutations::parties::set_party_active(self.conn, id, active)? == 0 {
            return Err(DomainError::PartyNotFound(id).into());
        }
        queries::parties::find_party(self.conn, id)?
            .ok_or_else(|| DomainError::PartyNotFound(id).into())
    }

    fn lock_vehicle(&mut self, id: VehicleId) -> Result<Vehicle, CoreError> {
        // BEGIN IMMEDIATE already holds the write lock for the whole unit.
        match queries::vehicles::find_vehicle(self.conn, id)? {
            Some(vehicle) if !vehicle.removed => Ok(vehicle),
            _ => Err(DomainError::VehicleNotFound(id).into()),
        }
    }

    fn find_vehicle(&mut self, id: VehicleId) -> Result<Option<Vehicle>, CoreError> {
        Ok(queries::vehicles::find_vehicle(self.conn, id)?)
    }

    fn insert_vehicle(&mut self, details: &VehicleDetails) -> Result<Vehicle, CoreError> {
        mutations::vehicles::insert_vehicle(self.conn, details)
            .map_err(taken(format!("VIN '{}'", details.vin)))
    }

    fn update_vehicle(&mut self, vehicle: &Vehicle) -> Result<Vehicle, CoreError> {
        let written: usize = mutations::vehicles::update_vehicle(self.conn, vehicle)
            .map_err(taken(format!("VIN '{}'", vehicle.details.vin)))?;
        if written == 0 {
            let found: Option<i64> = queries::vehicles::vehicle_version(self.conn, vehicle.id)?;
            return Err(stale(
                "vehicle",
                vehicle.id.value(),
                vehicle.version,
                found,
                DomainError::VehicleNotFound(vehicle.id),
            ));
        }
        Ok(Vehicle {
            version: vehicle.version + 1,
            ..vehicle.clone()
        })
    }

    fn list_vehicles(&mut self, filter: &VehicleFilter) -> Result<Vec<Vehicle>, CoreError> {
        Ok(queries::vehicles::list_vehicles(self.conn, filter)?)
    }

    fn find_sale(&mut self, id: SaleId) -> Result<Option<Sale>, CoreError> {
        Ok(queries::sales::find_sale(self.conn, id)?)
    }

    fn insert_sale(&mut self, sale: &NewSale) -> Result<Sale, CoreError> {
        Ok(mutations::sales::insert_sale(self.conn, sale)?)
    }

    fn update_sale(&mut self, sale: &Sale) -> Result<Sale, CoreError> {
        if mutations::sales::update_sale(self.conn, sale)? == 0 {
            let found: Option<i64> = queries::sales::sale_version(self.conn, sale.id)?;
            return Err(stale(
                "sale",
                sale.id.value(),
                sale.version,
                found,
                DomainError::SaleNotFound(sale.id),
            ));
        }
        Ok(Sale {
            version: sale.version + 1,
            ..sale.clone()
        })
    }

    fn delete_sale(&mut self, sale: &Sale) -> Result<(), CoreError> {
        if mutations::sales::delete_sale(self.conn, sale)? == 0 {
            let found: Option<i64> = queries::sales::sale_version(self.conn, sale.id)?;
            return Err(stale(
                "sale",
                sale.id.value(),
                sale.version,
                found,
                DomainError::SaleNotFound(sale.id),
            ));
        }
        Ok(())
    }

    fn list_sales(&mut self, filter: &SaleFilter) -> Result<Vec<Sale>, CoreError> {
        Ok(queries::sales::list_sales(self.conn, filter)?)
    }

    fn find_transaction(&mut self, id: TransactionId) -> Result<Option<Transaction>, CoreError> {
        Ok(queries::transactions::find_transaction(self.conn, id)?)
    }

    fn insert_transaction(
        &mut self,
        transaction: &NewTransaction,
    ) -> Result<Transaction, CoreError> {
        mutations::transactions::insert_transaction(self.conn, transaction).map_err(taken(
            format!("transaction reference '{}'", transaction.reference),
        ))
    }

    fn update_transaction(&mut self, transaction: &Transaction) -> Result<Transaction, CoreError> {
        let written: usize = mutations::transactions::update_transaction(self.conn, transaction)
            .map_err(taken(format!(
                "transaction reference '{}'",
                transaction.reference
            )))?;
        if written == 0 {
            let found: Option<i64> =
                queries::transactions::transaction_version(self.conn, transaction.id)?;
            return Err(stale(
                "transaction",
                transaction.id.value(),
                transaction.version,
                found,
                DomainError::TransactionNotFound(transaction.id),
            ));
        }
        Ok(Transaction {
            version: transaction.version + 1,
            ..transaction.clone()
        })
    }

    fn transactions_for_sale(&mut self, sale: SaleId) -> Result<Vec<Transaction>, CoreError> {
        self.list_transactions(&TransactionFilter {
            status: None,
            sale_id: Some(sale),
        })
    }

    fn transaction_ref_exists(&mut self, reference: &TransactionRef) -> Result<bool, CoreError> {
        Ok(queries::transactions::reference_exists(self.conn, reference)?)
    }

    fn list_transactions(
        &mut self,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, CoreError> {
        Ok(queries::transactions::list_transactions(self.conn, filter)?)
    }

    fn find_test_drive(&mut self, id: TestDriveId) -> Result<Option<TestDrive>, CoreError> {
        Ok(queries::test_drives::find_test_drive(self.conn, id)?)
    }

    fn insert_test_drive(&mut self, test_drive: &NewTestDrive) -> Result<TestDrive, CoreError> {
        Ok(mutations::test_drives::insert_test_drive(
            self.conn, test_drive,
        )?)
    }

    fn update_test_drive(&mut self, test_drive: &TestDrive) -> Result<TestDrive, CoreError> {
        if mutations::test_drives::update_test_drive(self.conn, test_drive)? == 0 {
            let found: Option<i64> =
                queries::test_drives::test_drive_version(self.conn, test_drive.id)?;
            return Err(stale(
                "test_drive",
                test_drive.id.value(),
                test_drive.version,
                found,
                DomainError::TestDriveNotFound(test_drive.id),
            ));
        }
        Ok(TestDrive {
            version: test_drive.version + 1,
            ..test_drive.clone()
        })
    }

    fn test_drives_for_vehicle(
        &mut self,
        vehicle: VehicleId,
    ) -> Result<Vec<TestDrive>, CoreError> {
        self.list_test_drives(&TestDriveFilter {
            status: None,
            vehicle_id: Some(vehicle),
            customer_id: None,
        })
    }

    fn list_test_drives(&mut self, filter: &TestDriveFilter) -> Result<Vec<TestDrive>, CoreError> {
        Ok(queries::test_drives::list_test_drives(self.conn, filter)?)
    }

    fn append_audit_event(&mut self, event: &AuditEvent) -> Result<AuditEvent, CoreError> {
        Ok(mutations::audit::append_audit_event(self.conn, event)?)
    }

    fn audit_events(&mut self, subject: &Subject) -> Result<Vec<AuditEvent>, CoreError> {
        Ok(queries::audit::events_for_subject(self.conn, subject)?)
    }
}
