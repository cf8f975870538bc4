// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The dealership workflows running against `SQLite`.

use showroom::{
    BookingDraft, ErrorKind, PaymentDraft, SaleDraft, TransactionFilter, WorkflowStore,
};
use showroom_audit::{AuditEvent, Subject};
use showroom_domain::{
    PaymentMethod, Sale, SaleStatus, TestDrive, TestDriveStatus, Transaction, TransactionStatus,
    Vehicle, VehicleStatus,
};
use time::Duration;

use super::{Fixture, NOW, actor_for, create_test_cause, create_test_details, money};

impl Fixture {
    fn vehicle(&self) -> Vehicle {
        self.showroom
            .inventory()
            .register(&actor_for(&self.sales), &create_test_cause(), create_test_details())
            .unwrap()
    }

    fn approved_sale(&self, vehicle: &Vehicle) -> Sale {
        let sale: Sale = self
            .showroom
            .sales()
            .create(
                &actor_for(&self.sales),
                &create_test_cause(),
                SaleDraft {
                    vehicle_id: vehicle.id,
                    customer_id: self.customer.id,
                    sales_person_id: self.sales.id,
                    sale_price: money(2_700_000),
                    notes: None,
                },
            )
            .unwrap();
        self.showroom
            .sales()
            .update_status(
                &actor_for(&self.sales),
                &create_test_cause(),
                sale.id,
                SaleStatus::Approved,
            )
            .unwrap()
    }

    fn payment(&self, sale: &Sale) -> Transaction {
        self.showroom
            .payments()
            .create(
                &actor_for(&self.cashier),
                &create_test_cause(),
                PaymentDraft {
                    sale_id: sale.id,
                    amount: sale.sale_price,
                    payment_method: PaymentMethod::Financing,
                    processed_by: self.cashier.id,
                    notes: None,
                },
            )
            .unwrap()
    }
}

#[test]
fn test_purchase_and_refund_cascade() {
    let fx = Fixture::new();
    let cashier = actor_for(&fx.cashier);
    let cause = create_test_cause();

    let vehicle: Vehicle = fx.vehicle();
    let sale: Sale = fx.approved_sale(&vehicle);
    assert_eq!(
        fx.showroom.inventory().status(vehicle.id).unwrap(),
        VehicleStatus::Reserved
    );

    let payment: Transaction = fx.payment(&sale);
    assert!(payment.reference.as_str().starts_with("TXN-"));

    let processed: Transaction = fx
        .showroom
        .payments()
        .process(&cashier, &cause, payment.id)
        .unwrap();
    assert_eq!(processed.status, TransactionStatus::Completed);
    assert_eq!(processed.processed_at, Some(NOW));
    assert_eq!(
        fx.showroom.sales().get(sale.id).unwrap().status,
        SaleStatus::Completed
    );
    assert_eq!(
        fx.showroom.inventory().status(vehicle.id).unwrap(),
        VehicleStatus::Sold
    );

    let refunded: Transaction = fx
        .showroom
        .payments()
        .refund(&cashier, &cause, payment.id)
        .unwrap();
    assert_eq!(refunded.status, TransactionStatus::Refunded);
    assert_eq!(
        fx.showroom.sales().get(sale.id).unwrap().status,
        SaleStatus::Canceled
    );
    assert_eq!(
        fx.showroom.inventory().status(vehicle.id).unwrap(),
        VehicleStatus::Available
    );

    // The vehicle can be sold again.
    let second: Sale = fx.approved_sale(&vehicle);
    assert_eq!(second.status, SaleStatus::Approved);
}

#[test]
fn test_failed_cascade_leaves_database_untouched() {
    let fx = Fixture::new();
    let vehicle: Vehicle = fx.vehicle();
    let sale: Sale = fx.approved_sale(&vehicle);
    let payment: Transaction = fx.payment(&sale);

    // Cancel the sale directly in storage so processing the payment fails
    // part-way through its cascade.
    fx.showroom
        .store()
        .atomically(|uow| {
            let stored: Sale = uow.find_sale(sale.id)?.unwrap();
            uow.update_sale(&Sale {
                status: SaleStatus::Canceled,
                ..stored
            })
        })
        .unwrap();

    let result = fx
        .showroom
        .payments()
        .process(&actor_for(&fx.cashier), &create_test_cause(), payment.id);
    assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidState);

    let stored: Transaction = fx.showroom.payments().get(payment.id).unwrap();
    assert_eq!(stored.status, TransactionStatus::Pending);
    assert_eq!(stored.version, payment.version);
    assert_eq!(
        fx.showroom.inventory().status(vehicle.id).unwrap(),
        VehicleStatus::Reserved
    );

    let trail: Vec<AuditEvent> = fx
        .showroom
        .audit_trail(&Subject::new("transaction", payment.id.value()))
        .unwrap();
    assert!(
        trail.iter().all(|e| e.action.name != "ProcessTransaction"),
        "rolled back operations leave no audit event"
    );
}

#[test]
fn test_second_open_payment_is_rejected() {
    let fx = Fixture::new();
    let vehicle: Vehicle = fx.vehicle();
    let sale: Sale = fx.approved_sale(&vehicle);
    fx.payment(&sale);

    let result = fx.showroom.payments().create(
        &actor_for(&fx.cashier),
        &create_test_cause(),
        PaymentDraft {
            sale_id: sale.id,
            amount: money(100),
            payment_method: PaymentMethod::Cash,
            processed_by: fx.cashier.id,
            notes: None,
        },
    );
    assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidState);

    let payments: Vec<Transaction> = fx
        .showroom
        .payments()
        .list(&TransactionFilter {
            status: None,
            sale_id: Some(sale.id),
        })
        .unwrap();
    assert_eq!(payments.len(), 1);
}

#[test]
fn test_canceling_sale_fails_pending_payment_and_releases_vehicle() {
    let fx = Fixture::new();
    let vehicle: Vehicle = fx.vehicle();
    let sale: Sale = fx.approved_sale(&vehicle);
    let payment: Transaction = fx.payment(&sale);

    let canceled: Sale = fx
        .showroom
        .sales()
        .update_status(
            &actor_for(&fx.sales),
            &create_test_cause(),
            sale.id,
            SaleStatus::Canceled,
        )
        .unwrap();
    assert_eq!(canceled.status, SaleStatus::Canceled);
    assert_eq!(
        fx.showroom.payments().get(payment.id).unwrap().status,
        TransactionStatus::Failed
    );
    assert_eq!(
        fx.showroom.inventory().status(vehicle.id).unwrap(),
        VehicleStatus::Available
    );
}

#[test]
fn test_test_drive_buffer_is_enforced() {
    let fx = Fixture::new();
    let customer = actor_for(&fx.customer);
    let cause = create_test_cause();
    let vehicle: Vehicle = fx.vehicle();
    let at = NOW + Duration::days(1);

    let booking: TestDrive = fx
        .showroom
        .test_drives()
        .create(
            &customer,
            &cause,
            BookingDraft {
                vehicle_id: vehicle.id,
                customer_id: fx.customer.id,
                scheduled_time: at,
                notes: None,
            },
        )
        .unwrap();
    assert_eq!(booking.scheduled_time, at);

    let clash = fx.showroom.test_drives().create(
        &customer,
        &cause,
        BookingDraft {
            vehicle_id: vehicle.id,
            customer_id: fx.customer.id,
            scheduled_time: at + Duration::minutes(119),
            notes: None,
        },
    );
    assert_eq!(clash.unwrap_err().kind(), ErrorKind::Conflict);

    let later: TestDrive = fx
        .showroom
        .test_drives()
        .create(
            &customer,
            &cause,
            BookingDraft {
                vehicle_id: vehicle.id,
                customer_id: fx.customer.id,
                scheduled_time: at + Duration::hours(2),
                notes: None,
            },
        )
        .unwrap();
    assert_eq!(later.status, TestDriveStatus::Pending);

    // Once canceled, the first slot is free again.
    fx.showroom
        .test_drives()
        .cancel(&customer, &cause, booking.id)
        .unwrap();
    fx.showroom
        .test_drives()
        .create(
            &customer,
            &cause,
            BookingDraft {
                vehicle_id: vehicle.id,
                customer_id: fx.customer.id,
                scheduled_time: at - Duration::minutes(30),
                notes: None,
            },
        )
        .unwrap();
}

#[test]
fn test_audit_trail_is_persisted_in_order() {
    let fx = Fixture::new();
    let vehicle: Vehicle = fx.vehicle();
    let sales = actor_for(&fx.sales);
    let cause = create_test_cause();
    fx.showroom
        .inventory()
        .send_to_service(&sales, &cause, vehicle.id)
        .unwrap();
    fx.showroom
        .inventory()
        .return_from_service(&sales, &cause, vehicle.id)
        .unwrap();

    let trail: Vec<AuditEvent> = fx
        .showroom
        .audit_trail(&Subject::new("vehicle", vehicle.id.value()))
        .unwrap();
    let names: Vec<&str> = trail.iter().map(|e| e.action.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["RegisterVehicle", "SendToService", "ReturnFromService"]
    );
    assert!(trail.iter().all(|e| e.event_id.is_some()));
    assert_eq!(trail[1].actor, sales);
    assert_eq!(trail[1].recorded_at, "2026-03-01T09:00:00Z");
}

#[test]
fn test_registration_conflicts_surface_as_conflict() {
    let fx = Fixture::new();
    let details = create_test_details();
    let sales = actor_for(&fx.sales);
    let cause = create_test_cause();
    fx.showroom
        .inventory()
        .register(&sales, &cause, details.clone())
        .unwrap();
    let result = fx.showroom.inventory().register(&sales, &cause, details);
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Conflict);

    let bootstrap = fx
        .showroom
        .parties()
        .bootstrap_admin(&cause, "Second Admin", "second@showroom.test");
    assert_eq!(bootstrap.unwrap_err().kind(), ErrorKind::InvalidState);
}
