// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Races between separate connections to one database file.
//!
//! Each thread goes through its own `Persistence` handle half of the time,
//! so serialisation comes from `SQLite`'s write lock and not only from the
//! handle's mutex.

use std::path::PathBuf;
use std::sync::Barrier;
use std::thread;

use showroom::{BookingDraft, CoreError, ErrorKind, FixedClock, SaleDraft, SaleFilter, Showroom};
use showroom_domain::{Sale, TestDrive, Vehicle, VehicleStatus};
use time::Duration;

use super::{
    Fixture, NOW, actor_for, create_test_cause, create_test_details, money, remove_db_files,
    temp_db_path,
};
use crate::Persistence;

const RACERS: usize = 6;

struct Shared {
    path: PathBuf,
    fx: Fixture,
    other: Showroom<Persistence, FixedClock>,
}

impl Shared {
    fn open(label: &str) -> Self {
        let path: PathBuf = temp_db_path(label);
        remove_db_files(&path);
        let fx = Fixture::with_store(Persistence::new_with_file(&path).unwrap());
        let other = Showroom::new(
            Persistence::new_with_file(&path).unwrap(),
            FixedClock::new(NOW),
        );
        Self { path, fx, other }
    }

    fn showroom(&self, racer: usize) -> &Showroom<Persistence, FixedClock> {
        if racer % 2 == 0 {
            &self.fx.showroom
        } else {
            &self.other
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        remove_db_files(&self.path);
    }
}

fn tally<T>(results: Vec<Result<T, CoreError>>) -> (usize, Vec<ErrorKind>) {
    let mut wins: usize = 0;
    let mut losses: Vec<ErrorKind> = Vec::new();
    for result in results {
        match result {
            Ok(_) => wins += 1,
            Err(err) => losses.push(err.kind()),
        }
    }
    (wins, losses)
}

#[test]
fn test_only_one_sale_reserves_a_vehicle() {
    let shared = Shared::open("sale_race");
    let vehicle: Vehicle = shared
        .fx
        .showroom
        .inventory()
        .register(
            &actor_for(&shared.fx.sales),
            &create_test_cause(),
            create_test_details(),
        )
        .unwrap();
    let barrier = Barrier::new(RACERS);

    let results: Vec<Result<Sale, CoreError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..RACERS)
            .map(|racer| {
                let shared = &shared;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    shared.showroom(racer).sales().create(
                        &actor_for(&shared.fx.sales),
                        &create_test_cause(),
                        SaleDraft {
                            vehicle_id: vehicle.id,
                            customer_id: shared.fx.customer.id,
                            sales_person_id: shared.fx.sales.id,
                            sale_price: money(2_650_000),
                            notes: None,
                        },
                    )
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let (wins, losses) = tally(results);
    assert_eq!(wins, 1, "exactly one sale may reserve the vehicle");
    assert!(
        losses.iter().all(|kind| *kind == ErrorKind::InvalidState),
        "losers must see the vehicle as unavailable: {losses:?}"
    );

    let sales: Vec<Sale> = shared
        .other
        .sales()
        .list(&SaleFilter {
            vehicle_id: Some(vehicle.id),
            ..SaleFilter::default()
        })
        .unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(
        shared.other.inventory().status(vehicle.id).unwrap(),
        VehicleStatus::Reserved
    );
}

#[test]
fn test_only_one_booking_claims_a_slot() {
    let shared = Shared::open("booking_race");
    let vehicle: Vehicle = shared
        .fx
        .showroom
        .inventory()
        .register(
            &actor_for(&shared.fx.sales),
            &create_test_cause(),
            create_test_details(),
        )
        .unwrap();
    let barrier = Barrier::new(RACERS);
    let slot = NOW + Duration::days(2);

    let results: Vec<Result<TestDrive, CoreError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..RACERS)
            .map(|racer| {
                let shared = &shared;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    // Every request lands within the buffer of every other.
                    let offset = Duration::minutes(i64::try_from(racer).unwrap() * 10);
                    shared.showroom(racer).test_drives().create(
                        &actor_for(&shared.fx.customer),
                        &create_test_cause(),
                        BookingDraft {
                            vehicle_id: vehicle.id,
                            customer_id: shared.fx.customer.id,
                            scheduled_time: slot + offset,
                            notes: None,
                        },
                    )
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let (wins, losses) = tally(results);
    assert_eq!(wins, 1, "exactly one booking may hold the slot");
    assert!(
        losses.iter().all(|kind| *kind == ErrorKind::Conflict),
        "losers must see a scheduling conflict: {losses:?}"
    );
}
