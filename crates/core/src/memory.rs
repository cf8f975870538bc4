// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! An in-process [`WorkflowStore`].
//!
//! Units are serialised behind a mutex. Each unit works on a scratch copy of
//! the committed state, which replaces the committed state only when the
//! unit succeeds.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use showroom_audit::{AuditEvent, Subject};
use showroom_domain::{
    DomainError, NewParty, NewSale, NewTestDrive, NewTransaction, Party, PartyId, Role, Sale,
    SaleId, SaleStatus, TestDrive, TestDriveId, TestDriveStatus, Transaction, TransactionId,
    TransactionRef, TransactionStatus, Vehicle, VehicleDetails, VehicleId, VehicleStatus,
};

use crate::error::CoreError;
use crate::store::{
    SaleFilter, TestDriveFilter, TransactionFilter, UnitOfWork, VehicleFilter, WorkflowStore,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    parties: BTreeMap<PartyId, Party>,
    vehicles: BTreeMap<VehicleId, Vehicle>,
    sales: BTreeMap<SaleId, Sale>,
    transactions: BTreeMap<TransactionId, Transaction>,
    test_drives: BTreeMap<TestDriveId, TestDrive>,
    audit_events: Vec<AuditEvent>,
    party_seq: i64,
    vehicle_seq: i64,
    sale_seq: i64,
    transaction_seq: i64,
    test_drive_seq: i64,
}

/// In-memory store used by tests and by the server when no database is given.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, CoreError> {
        self.state
            .lock()
            .map_err(|_| CoreError::Storage(String::from("in-memory store lock poisoned")))
    }
}

impl WorkflowStore for InMemoryStore {
    fn atomically<T, F>(&self, work: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, CoreError>,
    {
        let mut committed = self.lock()?;
        let mut scratch: MemoryState = committed.clone();
        let result: T = work(&mut MemoryUnit {
            state: &mut scratch,
        })?;
        *committed = scratch;
        Ok(result)
    }

    fn snapshot<T, F>(&self, work: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, CoreError>,
    {
        let committed = self.lock()?;
        let mut scratch: MemoryState = committed.clone();
        drop(committed);
        work(&mut MemoryUnit {
            state: &mut scratch,
        })
    }
}

struct MemoryUnit<'a> {
    state: &'a mut MemoryState,
}

fn version_conflict(entity: &str, id: i64, expected: i64, found: i64) -> CoreError {
    CoreError::Conflict(format!(
        "{entity} {id} was modified concurrently (expected version {expected}, found {found})"
    ))
}

impl UnitOfWork for MemoryUnit<'_> {
    fn find_party(&mut self, id: PartyId) -> Result<Option<Party>, CoreError> {
        Ok(self.state.parties.get(&id).cloned())
    }

    fn insert_party(&mut self, party: &NewParty) -> Result<Party, CoreError> {
        if self
            .state
            .parties
            .values()
            .any(|p| p.email.eq_ignore_ascii_case(&party.email))
        {
            return Err(CoreError::Conflict(format!(
                "email '{}' is already registered",
                party.email
            )));
        }
        self.state.party_seq += 1;
        let stored = Party {
            id: PartyId::new(self.state.party_seq),
            name: party.name.clone(),
            email: party.email.clone(),
            role: party.role,
            active: true,
        };
        self.state.parties.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn list_parties(&mut self, role: Option<Role>) -> Result<Vec<Party>, CoreError> {
        Ok(self
            .state
            .parties
            .values()
            .filter(|p| role.is_none_or(|r| p.role == r))
            .cloned()
            .collect())
    }

    fn set_party_active(&mut self, id: PartyId, active: bool) -> Result<Party, CoreError> {
        let party: &mut Party = self
            .state
            .parties
            .get_mut(&id)
            .ok_or(DomainError::PartyNotFound(id))?;
        party.active = active;
        Ok(party.clone())
    }

    fn lock_vehicle(&mut self, id: VehicleId) -> Result<Vehicle, CoreError> {
        // The whole unit already holds the store mutex.
        match self.state.vehicles.get(&id) {
            Some(vehicle) if !vehicle.removed => Ok(vehicle.clone()),
            _ => Err(DomainError::VehicleNotFound(id).into()),
        }
    }

    fn find_vehicle(&mut self, id: VehicleId) -> Result<Option<Vehicle>, CoreError> {
        Ok(self.state.vehicles.get(&id).cloned())
    }

    fn insert_vehicle(&mut self, details: &VehicleDetails) -> Result<Vehicle, CoreError> {
        if self
            .state
            .vehicles
            .values()
            .any(|v| v.details.vin == details.vin)
        {
            return Err(CoreError::Conflict(format!(
                "VIN '{}' is already registered",
                details.vin
            )));
        }
        self.state.vehicle_seq += 1;
        let stored = Vehicle {
            id: VehicleId::new(self.state.vehicle_seq),
            details: details.clone(),
            status: VehicleStatus::Available,
            removed: false,
            version: 1,
        };
        self.state.vehicles.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn update_vehicle(&mut self, vehicle: &Vehicle) -> Result<Vehicle, CoreError> {
        if self
            .state
            .vehicles
            .values()
            .any(|v| v.id != vehicle.id && v.details.vin == vehicle.details.vin)
        {
            return Err(CoreError::Conflict(format!(
                "VIN '{}' is already registered",
                vehicle.details.vin
            )));
        }
        let slot = self
            .state
            .vehicles
            .get_mut(&vehicle.id)
            .ok_or(DomainError::VehicleNotFound(vehicle.id))?;
        if slot.version != vehicle.version {
            return Err(version_conflict(
                "vehicle",
                vehicle.id.value(),
                vehicle.version,
                slot.version,
            ));
        }
        *slot = Vehicle {
            version: vehicle.version + 1,
            ..vehicle.clone()
        };
        Ok(slot.clone())
    }

    fn list_vehicles(&mut self, filter: &VehicleFilter) -> Result<Vec<Vehicle>, CoreError> {
        Ok(self
            .state
            .vehicles
            .values()
            .filter(|v| filter.matches(v))
            .cloned()
            .collect())
    }

    fn find_sale(&mut self, id: SaleId) -> Result<Option<Sale>, CoreError> {
        Ok(self.state.sales.get(&id).cloned())
    }

    fn insert_sale(&mut self, sale: &NewSale) -> Result<Sale, CoreError> {
        self.state.sale_seq += 1;
        let stored = Sale {
            id: SaleId::new(self.state.sale_seq),
            vehicle_id: sale.vehicle_id,
            customer_id: sale.customer_id,
            sales_person_id: sale.sales_person_id,
            status: SaleStatus::Pending,
            sale_price: sale.sale_price,
            notes: sale.notes.clone(),
            created_at: sale.created_at,
            completed_at: None,
            version: 1,
        };
        self.state.sales.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn update_sale(&mut self, sale: &Sale) -> Result<Sale, CoreError> {
        let slot = self
            .state
            .sales
            .get_mut(&sale.id)
            .ok_or(DomainError::SaleNotFound(sale.id))?;
        if slot.version != sale.version {
            return Err(version_conflict(
                "sale",
                sale.id.value(),
                sale.version,
                slot.version,
            ));
        }
        *slot = Sale {
            version: sale.version + 1,
            ..sale.clone()
        };
        Ok(slot.clone())
    }

    fn delete_sale(&mut self, sale: &Sale) -> Result<(), CoreError> {
        let stored_version: i64 = self
            .state
            .sales
            .get(&sale.id)
            .map(|s| s.version)
            .ok_or(DomainError::SaleNotFound(sale.id))?;
        if stored_version != sale.version {
            return Err(version_conflict(
                "sale",
                sale.id.value(),
                sale.version,
                stored_version,
            ));
        }
        self.state.sales.remove(&sale.id);
        Ok(())
    }

    fn list_sales(&mut self, filter: &SaleFilter) -> Result<Vec<Sale>, CoreError> {
        Ok(self
            .state
            .sales
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    fn find_transaction(&mut self, id: TransactionId) -> Result<Option<Transaction>, CoreError> {
        Ok(self.state.transactions.get(&id).cloned())
    }

    fn insert_transaction(
        &mut self,
        transaction: &NewTransaction,
    ) -> Result<Transaction, CoreError> {
        if self.transaction_ref_exists(&transaction.reference)? {
            return Err(CoreError::Conflict(format!(
                "transaction reference '{}' is already used",
                transaction.reference
            )));
        }
        self.state.transaction_seq += 1;
        let stored = Transaction {
            id: TransactionId::new(self.state.transaction_seq),
            sale_id: transaction.sale_id,
            amount: transaction.amount,
            payment_method: transaction.payment_method,
            status: TransactionStatus::Pending,
            processed_by: transaction.processed_by,
            processed_at: None,
            reference: transaction.reference.clone(),
            notes: transaction.notes.clone(),
            created_at: transaction.created_at,
            version: 1,
        };
        self.state.transactions.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn update_transaction(&mut self, transaction: &Transaction) -> Result<Transaction, CoreError> {
        if self
            .state
            .transactions
            .values()
            .any(|t| t.id != transaction.id && t.reference == transaction.reference)
        {
            return Err(CoreError::Conflict(format!(
                "transaction reference '{}' is already used",
                transaction.reference
            )));
        }
        let slot = self
            .state
            .transactions
            .get_mut(&transaction.id)
            .ok_or(DomainError::TransactionNotFound(transaction.id))?;
        if slot.version != transaction.version {
            return Err(version_conflict(
                "transaction",
                transaction.id.value(),
                transaction.version,
                slot.version,
            ));
        }
        *slot = Transaction {
            version: transaction.version + 1,
            ..transaction.clone()
        };
        Ok(slot.clone())
    }

    fn transactions_for_sale(&mut self, sale: SaleId) -> Result<Vec<Transaction>, CoreError> {
        self.list_transactions(&TransactionFilter {
            status: None,
            sale_id: Some(sale),
        })
    }

    fn transaction_ref_exists(&mut self, reference: &TransactionRef) -> Result<bool, CoreError> {
        Ok(self
            .state
            .transactions
            .values()
            .any(|t| &t.reference == reference))
    }

    fn list_transactions(
        &mut self,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, CoreError> {
        Ok(self
            .state
            .transactions
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    fn find_test_drive(&mut self, id: TestDriveId) -> Result<Option<TestDrive>, CoreError> {
        Ok(self.state.test_drives.get(&id).cloned())
    }

    fn insert_test_drive(&mut self, test_drive: &NewTestDrive) -> Result<TestDrive, CoreError> {
        self.state.test_drive_seq += 1;
        let stored = TestDrive {
            id: TestDriveId::new(self.state.test_drive_seq),
            vehicle_id: test_drive.vehicle_id,
            customer_id: test_drive.customer_id,
            scheduled_time: test_drive.scheduled_time,
            status: TestDriveStatus::Pending,
            notes: test_drive.notes.clone(),
            customer_feedback: None,
            created_at: test_drive.created_at,
            version: 1,
        };
        self.state.test_drives.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn update_test_drive(&mut self, test_drive: &TestDrive) -> Result<TestDrive, CoreError> {
        let slot = self
            .state
            .test_drives
            .get_mut(&test_drive.id)
            .ok_or(DomainError::TestDriveNotFound(test_drive.id))?;
        if slot.version != test_drive.version {
            return Err(version_conflict(
                "test drive",
                test_drive.id.value(),
                test_drive.version,
                slot.version,
            ));
        }
        *slot = TestDrive {
            version: test_drive.version + 1,
            ..test_drive.clone()
        };
        Ok(slot.clone())
    }

    fn test_drives_for_vehicle(
        &mut self,
        vehicle: VehicleId,
    ) -> Result<Vec<TestDrive>, CoreError> {
        self.list_test_drives(&TestDriveFilter {
            vehicle_id: Some(vehicle),
            ..TestDriveFilter::default()
        })
    }

    fn list_test_drives(&mut self, filter: &TestDriveFilter) -> Result<Vec<TestDrive>, CoreError> {
        Ok(self
            .state
            .test_drives
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    fn append_audit_event(&mut self, event: &AuditEvent) -> Result<AuditEvent, CoreError> {
        let event_id: i64 = i64::try_from(self.state.audit_events.len())
            .map_err(|e| CoreError::Storage(e.to_string()))?
            + 1;
        let stored: AuditEvent = event.clone().with_event_id(event_id);
        self.state.audit_events.push(stored.clone());
        Ok(stored)
    }

    fn audit_events(&mut self, subject: &Subject) -> Result<Vec<AuditEvent>, CoreError> {
        Ok(self
            .state
            .audit_events
            .iter()
            .filter(|e| &e.subject == subject)
            .cloned()
            .collect())
    }
}
