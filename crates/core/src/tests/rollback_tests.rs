// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use showroom_audit::Subject;
use showroom_domain::{
    DomainError, Sale, SaleStatus, Transaction, TransactionStatus, Vehicle, VehicleStatus,
};

use super::helpers::{Fixture, actor_for, assert_kind, create_test_cause};
use crate::{CoreError, ErrorKind, WorkflowStore};

#[test]
fn test_failed_unit_leaves_no_partial_writes() {
    let fx = Fixture::new();
    let vehicle: Vehicle = fx.vehicle();

    let result: Result<(), CoreError> = fx.showroom.store().atomically(|uow| {
        uow.set_vehicle_status(vehicle.id, VehicleStatus::Reserved)?;
        Err(DomainError::SaleNotFound(showroom_domain::SaleId::new(1)).into())
    });

    assert!(result.is_err());
    assert_eq!(
        fx.showroom.inventory().status(vehicle.id).unwrap(),
        VehicleStatus::Available
    );
}

#[test]
fn test_cascade_failure_rolls_back_transaction_write() {
    let fx = Fixture::new();
    let vehicle: Vehicle = fx.vehicle();
    let sale: Sale = fx.approved_sale(&vehicle);
    let payment: Transaction = fx.pending_payment(&sale);
    let trail_before = fx
        .showroom
        .audit_trail(&Subject::new("transaction", payment.id.value()))
        .unwrap();

    // Move the sale on behind the workflow's back.
    fx.showroom
        .store()
        .atomically(|uow| {
            let current = uow.find_sale(sale.id)?.unwrap();
            uow.update_sale(&Sale {
                status: SaleStatus::Canceled,
                ..current
            })
        })
        .unwrap();

    let result =
        fx.showroom
            .payments()
            .process(&actor_for(&fx.cashier), &create_test_cause(), payment.id);

    assert_kind(result, ErrorKind::InvalidState);
    let after: Transaction = fx.showroom.payments().get(payment.id).unwrap();
    assert_eq!(after.status, TransactionStatus::Pending);
    assert_eq!(after.processed_at, None);
    assert_eq!(after.version, payment.version);
    assert_eq!(
        fx.showroom
            .audit_trail(&Subject::new("transaction", payment.id.value()))
            .unwrap(),
        trail_before
    );
}

#[test]
fn test_stale_version_surfaces_conflict() {
    let fx = Fixture::new();
    let vehicle: Vehicle = fx.vehicle();

    fx.showroom
        .inventory()
        .send_to_service(&actor_for(&fx.sales), &create_test_cause(), vehicle.id)
        .unwrap();

    let result = fx
        .showroom
        .store()
        .atomically(|uow| uow.update_vehicle(&vehicle));

    assert_kind(result, ErrorKind::Conflict);
    assert_eq!(
        fx.showroom.inventory().status(vehicle.id).unwrap(),
        VehicleStatus::Service
    );
}

#[test]
fn test_snapshot_discards_writes() {
    let fx = Fixture::new();
    let vehicle: Vehicle = fx.vehicle();

    fx.showroom
        .store()
        .snapshot(|uow| uow.set_vehicle_status(vehicle.id, VehicleStatus::Sold))
        .unwrap();

    assert_eq!(
        fx.showroom.inventory().status(vehicle.id).unwrap(),
        VehicleStatus::Available
    );
}
