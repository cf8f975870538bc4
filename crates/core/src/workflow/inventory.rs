// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Vehicle inventory.
//!
//! Inventory owns registration, descriptive updates, soft removal and the
//! service bay. Reservation and sale are driven by the sale and payment
//! workflows; nothing here can move a vehicle into or out of `reserved`
//! or `sold`.

use serde_json::{Value, json};
use showroom_audit::{Actor, Cause, Subject};
use showroom_domain::{
    DomainError, Lifecycle, Vehicle, VehicleDetails, VehicleId, VehicleStatus,
    validate_vehicle_details,
};
use tracing::info;

use super::{AuditEntry, Context, record};
use crate::clock::Clock;
use crate::error::CoreError;
use crate::store::{UnitOfWork, VehicleFilter, WorkflowStore};

pub struct Inventory<'a, S, C> {
    store: &'a S,
    clock: &'a C,
}

fn vehicle_subject(id: VehicleId) -> Subject {
    Subject::new("vehicle", id.value())
}

impl<'a, S: WorkflowStore, C: Clock> Inventory<'a, S, C> {
    pub(crate) const fn new(store: &'a S, clock: &'a C) -> Self {
        Self { store, clock }
    }

    /// Adds a vehicle to inventory as `available`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for bad details and `Conflict` if the VIN is
    /// already registered.
    pub fn register(
        &self,
        actor: &Actor,
        cause: &Cause,
        details: VehicleDetails,
    ) -> Result<Vehicle, CoreError> {
        validate_vehicle_details(&details)?;
        let ctx = Context::new(self.clock, actor, cause);

        let vehicle: Vehicle = self.store.atomically(|uow| {
            let vehicle: Vehicle = uow.insert_vehicle(&details)?;
            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "RegisterVehicle",
                    details: Some(format!(
                        "{} {} {}",
                        vehicle.details.year, vehicle.details.make, vehicle.details.model
                    )),
                    subject: vehicle_subject(vehicle.id),
                    before: Value::Null,
                    after: json!(vehicle),
                },
            )?;
            Ok(vehicle)
        })?;

        info!(vehicle_id = %vehicle.id, vin = %vehicle.details.vin, "Registered vehicle");
        Ok(vehicle)
    }

    /// Replaces the descriptive fields of a vehicle. Status is untouched.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for missing or removed vehicles, `InvalidInput`
    /// for bad details, and `Conflict` if the new VIN is taken.
    pub fn update_details(
        &self,
        actor: &Actor,
        cause: &Cause,
        id: VehicleId,
        details: VehicleDetails,
    ) -> Result<Vehicle, CoreError> {
        validate_vehicle_details(&details)?;
        let ctx = Context::new(self.clock, actor, cause);

        self.store.atomically(|uow| {
            let before: Vehicle = uow.lock_vehicle(id)?;
            let after: Vehicle = uow.update_vehicle(&Vehicle {
                details,
                ..before.clone()
            })?;
            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "UpdateVehicleDetails",
                    details: None,
                    subject: vehicle_subject(id),
                    before: json!(before),
                    after: json!(after),
                },
            )?;
            Ok(after)
        })
    }

    /// Takes a vehicle out of inventory. The row is kept.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for missing or already removed vehicles, and
    /// `InvalidState` while the vehicle is reserved or sold.
    pub fn remove(
        &self,
        actor: &Actor,
        cause: &Cause,
        id: VehicleId,
    ) -> Result<Vehicle, CoreError> {
        let ctx = Context::new(self.clock, actor, cause);

        let removed: Vehicle = self.store.atomically(|uow| {
            let before: Vehicle = uow.lock_vehicle(id)?;
            before.require_removable()?;
            let after: Vehicle = uow.update_vehicle(&Vehicle {
                removed: true,
                ..before.clone()
            })?;
            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "RemoveVehicle",
                    details: None,
                    subject: vehicle_subject(id),
                    before: json!(before),
                    after: json!(after),
                },
            )?;
            Ok(after)
        })?;

        info!(vehicle_id = %id, "Removed vehicle from inventory");
        Ok(removed)
    }

    /// Moves an available vehicle into the service bay.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for missing or removed vehicles and `InvalidState`
    /// unless the vehicle is available.
    pub fn send_to_service(
        &self,
        actor: &Actor,
        cause: &Cause,
        id: VehicleId,
    ) -> Result<Vehicle, CoreError> {
        let ctx = Context::new(self.clock, actor, cause);
        self.store.atomically(|uow| {
            move_through_service(uow, &ctx, id, VehicleStatus::Service, "SendToService")
        })
    }

    /// Returns a vehicle from the service bay to the lot.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for missing or removed vehicles and `InvalidState`
    /// unless the vehicle is in service.
    pub fn return_from_service(
        &self,
        actor: &Actor,
        cause: &Cause,
        id: VehicleId,
    ) -> Result<Vehicle, CoreError> {
        let ctx = Context::new(self.clock, actor, cause);
        self.store.atomically(|uow| {
            move_through_service(uow, &ctx, id, VehicleStatus::Available, "ReturnFromService")
        })
    }

    /// Fetches a vehicle still in inventory.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for missing or removed vehicles.
    pub fn get(&self, id: VehicleId) -> Result<Vehicle, CoreError> {
        self.store.snapshot(|uow| match uow.find_vehicle(id)? {
            Some(vehicle) if !vehicle.removed => Ok(vehicle),
            _ => Err(DomainError::VehicleNotFound(id).into()),
        })
    }

    /// Returns the availability of a vehicle still in inventory.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for missing or removed vehicles.
    pub fn status(&self, id: VehicleId) -> Result<VehicleStatus, CoreError> {
        self.store.snapshot(|uow| uow.vehicle_status(id))
    }

    /// Lists vehicles matching the filter.
    ///
    /// # Errors
    ///
    /// Returns a `Storage` error if the store cannot be read.
    pub fn list(&self, filter: &VehicleFilter) -> Result<Vec<Vehicle>, CoreError> {
        self.store.snapshot(|uow| uow.list_vehicles(filter))
    }
}

fn move_through_service(
    uow: &mut dyn UnitOfWork,
    ctx: &Context<'_>,
    id: VehicleId,
    to: VehicleStatus,
    action: &'static str,
) -> Result<Vehicle, CoreError> {
    let before: Vehicle = uow.lock_vehicle(id)?;

    // reserved -> available is a legal edge, but not one the service bay owns.
    let expected_from: VehicleStatus = match to {
        VehicleStatus::Service => VehicleStatus::Available,
        _ => VehicleStatus::Service,
    };
    if before.status != expected_from {
        return Err(DomainError::InvalidStatusTransition {
            entity: VehicleStatus::ENTITY,
            from: before.status.as_str().to_string(),
            to: to.as_str().to_string(),
            reason: format!("vehicle must be {} for this operation", expected_from.as_str()),
        }
        .into());
    }
    before.status.validate_transition(to)?;

    let after: Vehicle = uow.set_vehicle_status(id, to)?;
    record(
        uow,
        ctx,
        AuditEntry {
            action,
            details: Some(format!("{} -> {}", before.status.as_str(), to.as_str())),
            subject: vehicle_subject(id),
            before: json!(before),
            after: json!(after),
        },
    )?;
    info!(vehicle_id = %id, status = to.as_str(), "Vehicle service status changed");
    Ok(after)
}
