// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod concurrency_tests;
mod workflow_tests;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use showroom::{FixedClock, Showroom};
use showroom_audit::{Actor, Cause};
use showroom_domain::{Money, NewParty, Party, Role, VehicleDetails};
use time::OffsetDateTime;
use time::macros::datetime;

use crate::Persistence;

pub const NOW: OffsetDateTime = datetime!(2026-03-01 09:00 UTC);

static VIN_COUNTER: AtomicU32 = AtomicU32::new(1);
static FILE_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("test-actor"), String::from("system"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("test-cause"), String::from("Test operation"))
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
        make: String::from("Toyota"),
        model: String::from("Camry"),
        year: 2022,
        vin: format!("4T1BF1FK5CU{seq:06}"),
        color: Some(String::from("Silver")),
        license_plate: Some(String::from("SHW-001")),
        price: money(2_800_000),
        mileage: 12_500,
        description: Some(String::from("One owner")),
    }
}

/// A database file path unique to this test run.
pub fn temp_db_path(label: &str) -> PathBuf {
    let seq: u32 = FILE_COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!(
        "showroom_{label}_{}_{seq}.db",
        std::process::id()
    ))
}

/// Removes a database file and its WAL side files.
pub fn remove_db_files(path: &std::path::Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.as_os_str().to_owned();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

/// A showroom on a fresh in-memory database with one party of each role.
pub struct Fixture {
    pub showroom: Showroom<Persistence, FixedClock>,
    pub admin: Party,
    pub sales: Party,
    pub cashier: Party,
    pub customer: Party,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_store(Persistence::new_in_memory().unwrap())
    }

    pub fn with_store(store: Persistence) -> Self {
        let showroom = Showroom::new(store, FixedClock::new(NOW));
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
}
