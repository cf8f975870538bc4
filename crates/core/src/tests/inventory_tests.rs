// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use showroom_domain::{Vehicle, VehicleDetails, VehicleId, VehicleStatus};

use super::helpers::{Fixture, actor_for, assert_kind, create_test_cause, create_test_details};
use crate::{ErrorKind, VehicleFilter};

#[test]
fn test_registered_vehicle_starts_available() {
    let fx = Fixture::new();

    let vehicle: Vehicle = fx.vehicle();

    assert_eq!(vehicle.status, VehicleStatus::Available);
    assert!(!vehicle.removed);
    assert_eq!(vehicle.version, 1);
}

#[test]
fn test_duplicate_vin_conflicts() {
    let fx = Fixture::new();
    let vehicle: Vehicle = fx.vehicle();

    let result = fx.showroom.inventory().register(
        &actor_for(&fx.admin),
        &create_test_cause(),
        vehicle.details.clone(),
    );

    assert_kind(result, ErrorKind::Conflict);
}

#[test]
fn test_invalid_details_are_rejected() {
    let fx = Fixture::new();
    let mut details: VehicleDetails = create_test_details();
    details.year = 1700;

    let result =
        fx.showroom
            .inventory()
            .register(&actor_for(&fx.admin), &create_test_cause(), details);

    assert_kind(result, ErrorKind::InvalidInput);
}

#[test]
fn test_detail_update_never_touches_status() {
    let fx = Fixture::new();
    let vehicle: Vehicle = fx.vehicle();
    fx.pending_sale(&vehicle);
    let mut details: VehicleDetails = vehicle.details.clone();
    details.mileage = 32_150;
    details.color = Some(String::from("Midnight Blue"));

    let updated: Vehicle = fx
        .showroom
        .inventory()
        .update_details(
            &actor_for(&fx.sales),
            &create_test_cause(),
            vehicle.id,
            details,
        )
        .unwrap();

    assert_eq!(updated.status, VehicleStatus::Reserved);
    assert_eq!(updated.details.mileage, 32_150);
}

#[test]
fn test_service_round_trip() {
    let fx = Fixture::new();
    let vehicle: Vehicle = fx.vehicle();
    let actor = actor_for(&fx.sales);

    let in_service: Vehicle = fx
        .showroom
        .inventory()
        .send_to_service(&actor, &create_test_cause(), vehicle.id)
        .unwrap();
    assert_eq!(in_service.status, VehicleStatus::Service);

    let back: Vehicle = fx
        .showroom
        .inventory()
        .return_from_service(&actor, &create_test_cause(), vehicle.id)
        .unwrap();
    assert_eq!(back.status, VehicleStatus::Available);
}

#[test]
fn test_reserved_vehicle_cannot_use_service_transitions() {
    let fx = Fixture::new();
    let vehicle: Vehicle = fx.vehicle();
    fx.pending_sale(&vehicle);
    let actor = actor_for(&fx.sales);

    assert_kind(
        fx.showroom
            .inventory()
            .send_to_service(&actor, &create_test_cause(), vehicle.id),
        ErrorKind::InvalidState,
    );
    assert_kind(
        fx.showroom
            .inventory()
            .return_from_service(&actor, &create_test_cause(), vehicle.id),
        ErrorKind::InvalidState,
    );
    assert_eq!(
        fx.showroom.inventory().status(vehicle.id).unwrap(),
        VehicleStatus::Reserved
    );
}

#[test]
fn test_remove_hides_vehicle_from_workflows() {
    let fx = Fixture::new();
    let vehicle: Vehicle = fx.vehicle();

    let removed: Vehicle = fx
        .showroom
        .inventory()
        .remove(&actor_for(&fx.admin), &create_test_cause(), vehicle.id)
        .unwrap();

    assert!(removed.removed);
    assert_kind(fx.showroom.inventory().get(vehicle.id), ErrorKind::NotFound);
    assert_kind(
        fx.showroom.inventory().status(vehicle.id),
        ErrorKind::NotFound,
    );
    assert_kind(
        fx.showroom.sales().create(
            &actor_for(&fx.sales),
            &create_test_cause(),
            fx.draft(&vehicle),
        ),
        ErrorKind::NotFound,
    );

    let all = fx
        .showroom
        .inventory()
        .list(&VehicleFilter {
            include_removed: true,
            ..VehicleFilter::default()
        })
        .unwrap();
    assert_eq!(all.len(), 1);
    assert!(
        fx.showroom
            .inventory()
            .list(&VehicleFilter::default())
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_sold_vehicle_cannot_be_removed() {
    let fx = Fixture::new();
    let (vehicle, _, _) = fx.sold_vehicle();

    let result =
        fx.showroom
            .inventory()
            .remove(&actor_for(&fx.admin), &create_test_cause(), vehicle.id);

    assert_kind(result, ErrorKind::InvalidState);
}

#[test]
fn test_status_of_unknown_vehicle_is_not_found() {
    let fx = Fixture::new();

    assert_kind(
        fx.showroom.inventory().status(VehicleId::new(31_337)),
        ErrorKind::NotFound,
    );
}

#[test]
fn test_list_filters_by_status() {
    let fx = Fixture::new();
    let reserved: Vehicle = fx.vehicle();
    fx.vehicle();
    fx.pending_sale(&reserved);

    let listed = fx
        .showroom
        .inventory()
        .list(&VehicleFilter {
            status: Some(VehicleStatus::Reserved),
            ..VehicleFilter::default()
        })
        .unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, reserved.id);
}
