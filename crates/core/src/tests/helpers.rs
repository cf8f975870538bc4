// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::atomic::{AtomicU32, Ordering};

use showroom_audit::{Actor, Cause};
use showroom_domain::{
    Money, NewParty, Party, PaymentMethod, Role, Sale, SaleStatus, Transaction, TransactionStatus,
    Vehicle, VehicleDetails, VehicleStatus,
};
use time::OffsetDateTime;
use time::macros::datetime;

use crate::{
    CoreError, ErrorKind, FixedClock, InMemoryStore, PaymentDraft, SaleDraft, SaleFilter,
    Showroom, TransactionFilter, VehicleFilter, WorkflowStore,
};

pub const NOW: OffsetDateTime = datetime!(2026-03-01 09:00 UTC);

static VIN_COUNTER: AtomicU32 = AtomicU32::new(1);

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Test request"))
}

pub fn actor_for(party: &Party) -> Actor {
    Actor::new(party.id.to_string(), party.role.as_str().to_string())
}

pub fn money(cents: i64) -> Money {
    Money::from_cents("amount", cents).unwrap()
}

pub fn create_test_details() -> VehicleDetails {
    let seq: u32 = VIN_COUNTER.fetch_add(1, Ordering::SeqCst);
    VehicleDetails {
        make: String::from("Honda"),
        model: String::from("Accord"),
        year: 2021,
        vin: format!("1HGCM82633A{seq:06}"),
        color: Some(String::from("Blue")),
        license_plate: None,
        price: money(2_400_000),
        mileage: 32_000,
        description: None,
    }
}

pub fn assert_kind<T: std::fmt::Debug>(result: Result<T, CoreError>, kind: ErrorKind) {
    match result {
        Err(err) => assert_eq!(err.kind(), kind, "unexpected error: {err}"),
        Ok(value) => panic!("expected {kind:?}, got Ok({value:?})"),
    }
}

/// A showroom with one party of each role.
pub struct Fixture {
    pub showroom: Showroom<InMemoryStore, FixedClock>,
    pub admin: Party,
    pub sales: Party,
    pub cashier: Party,
    pub customer: Party,
}

impl Fixture {
    pub fn new() -> Self {
        Self::at(NOW)
    }

    pub fn at(now: OffsetDateTime) -> Self {
        let showroom = Showroom::new(InMemoryStore::new(), FixedClock::new(now));
        let cause = create_test_cause();
        let admin: Party = showroom
            .parties()
            .bootstrap_admin(&cause, "Avery Admin", "admin@showroom.test")
            .unwrap();
        let admin_actor = actor_for(&admin);
        let register = |name: &str, email: &str, role: Role| -> Party {
            showroom
                .parties()
                .register(
                    &admin_actor,
                    &cause,
                    NewParty {
                        name: name.to_string(),
                        email: email.to_string(),
                        role,
                    },
                )
                .unwrap()
        };
        let sales = register("Sam Sales", "sam@showroom.test", Role::Sales);
        let cashier = register("Cass Cashier", "cass@showroom.test", Role::Cashier);
        let customer = register("Casey Customer", "casey@example.com", Role::Customer);

        Self {
            showroom,
            admin,
            sales,
            cashier,
            customer,
        }
    }

    pub fn register_customer(&self, name: &str, email: &str) -> Party {
        self.showroom
            .parties()
            .register(
                &actor_for(&self.admin),
                &create_test_cause(),
                NewParty {
                    name: name.to_string(),
                    email: email.to_string(),
                    role: Role::Customer,
                },
            )
            .unwrap()
    }

    pub fn vehicle(&self) -> Vehicle {
        self.showroom
            .inventory()
            .register(
                &actor_for(&self.sales),
                &create_test_cause(),
                create_test_details(),
            )
            .unwrap()
    }

    pub fn draft(&self, vehicle: &Vehicle) -> SaleDraft {
        SaleDraft {
            vehicle_id: vehicle.id,
            customer_id: self.customer.id,
            sales_person_id: self.sales.id,
            sale_price: money(2_350_000),
            notes: None,
        }
    }

    pub fn pending_sale(&self, vehicle: &Vehicle) -> Sale {
        self.showroom
            .sales()
            .create(
                &actor_for(&self.sales),
                &create_test_cause(),
                self.draft(vehicle),
            )
            .unwrap()
    }

    pub fn approved_sale(&self, vehicle: &Vehicle) -> Sale {
        let sale: Sale = self.pending_sale(vehicle);
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

    pub fn payment_draft(&self, sale: &Sale) -> PaymentDraft {
        PaymentDraft {
            sale_id: sale.id,
            amount: sale.sale_price,
            payment_method: PaymentMethod::Card,
            processed_by: self.cashier.id,
            notes: None,
        }
    }

    pub fn pending_payment(&self, sale: &Sale) -> Transaction {
        self.showroom
            .payments()
            .create(
                &actor_for(&self.cashier),
                &create_test_cause(),
                self.payment_draft(sale),
            )
            .unwrap()
    }

    /// Registers a vehicle and takes it all the way to sold.
    pub fn sold_vehicle(&self) -> (Vehicle, Sale, Transaction) {
        let vehicle: Vehicle = self.vehicle();
        let sale: Sale = self.approved_sale(&vehicle);
        let payment: Transaction = self.pending_payment(&sale);
        let processed: Transaction = self
            .showroom
            .payments()
            .process(&actor_for(&self.cashier), &create_test_cause(), payment.id)
            .unwrap();
        let vehicle: Vehicle = self.showroom.inventory().get(vehicle.id).unwrap();
        let sale: Sale = self.showroom.sales().get(sale.id).unwrap();
        (vehicle, sale, processed)
    }
}

/// Checks the cross-entity invariants over everything in the store.
pub fn assert_consistent<S: WorkflowStore>(store: &S) {
    store
        .snapshot(|uow| {
            let vehicles = uow.list_vehicles(&VehicleFilter {
                include_removed: true,
                ..VehicleFilter::default()
            })?;
            for vehicle in vehicles {
                let sales: Vec<Sale> = uow.list_sales(&SaleFilter {
                    vehicle_id: Some(vehicle.id),
                    ..SaleFilter::default()
                })?;
                let has_completed = sales.iter().any(|s| s.status == SaleStatus::Completed);
                let has_open = sales.iter().any(|s| s.status.holds_vehicle());

                assert_eq!(
                    vehicle.status == VehicleStatus::Sold,
                    has_completed,
                    "vehicle {} sold iff it has a completed sale",
                    vehicle.id
                );
                if vehicle.status == VehicleStatus::Reserved {
                    assert!(has_open && !has_completed, "vehicle {} reserved", vehicle.id);
                }
                if vehicle.status == VehicleStatus::Available {
                    assert!(!has_open, "available vehicle {} has an open sale", vehicle.id);
                }

                for sale in sales.iter().filter(|s| s.status == SaleStatus::Completed) {
                    let completed = uow
                        .list_transactions(&TransactionFilter {
                            status: Some(TransactionStatus::Completed),
                            sale_id: Some(sale.id),
                        })?
                        .len();
                    assert_eq!(completed, 1, "completed sale {} payments", sale.id);
                    assert!(sale.completed_at.is_some());
                }
            }
            Ok(())
        })
        .unwrap();
}
