// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    DomainError, Money, NewParty, Role, VehicleDetails, validate_future_time,
    validate_party_fields, validate_payment_amount, validate_vehicle_details,
};
use time::Duration;
use time::macros::datetime;

fn create_test_details() -> VehicleDetails {
    VehicleDetails {
        make: String::from("Toyota"),
        model: String::from("Corolla"),
        year: 2022,
        vin: String::from("JTDBR32E720012345"),
        color: Some(String::from("Silver")),
        license_plate: None,
        price: Money::from_cents("price", 2_150_000).unwrap(),
        mileage: 18_400,
        description: None,
    }
}

#[test]
fn test_validate_vehicle_details_accepts_valid_vehicle() {
    assert!(validate_vehicle_details(&create_test_details()).is_ok());
}

#[test]
fn test_validate_vehicle_details_rejects_blank_make() {
    let mut details: VehicleDetails = create_test_details();
    details.make = String::from("   ");
    assert!(matches!(
        validate_vehicle_details(&details),
        Err(DomainError::InvalidVehicleDetails { field: "make", .. })
    ));
}

#[test]
fn test_validate_vehicle_details_rejects_short_vin() {
    let mut details: VehicleDetails = create_test_details();
    details.vin = String::from("ABC123");
    assert!(matches!(
        validate_vehicle_details(&details),
        Err(DomainError::InvalidVehicleDetails { field: "vin", .. })
    ));
}

#[test]
fn test_validate_vehicle_details_rejects_negative_mileage() {
    let mut details: VehicleDetails = create_test_details();
    details.mileage = -1;
    assert!(validate_vehicle_details(&details).is_err());
}

#[test]
fn test_validate_future_time_is_strict() {
    let now = datetime!(2026-04-01 12:00 UTC);
    assert!(validate_future_time(now + Duration::seconds(1), now).is_ok());
    assert!(matches!(
        validate_future_time(now, now),
        Err(DomainError::ScheduledTimeNotInFuture { .. })
    ));
    assert!(validate_future_time(now - Duration::hours(1), now).is_err());
}

#[test]
fn test_validate_payment_amount_rejects_zero() {
    assert!(validate_payment_amount(Money::ZERO).is_err());
    assert!(validate_payment_amount(Money::from_cents("amount", 1).unwrap()).is_ok());
}

#[test]
fn test_validate_party_fields() {
    let mut party = NewParty {
        name: String::from("Sam Reyes"),
        email: String::from("sam@showroom.test"),
        role: Role::Sales,
    };
    assert!(validate_party_fields(&party).is_ok());

    party.email = String::from("sam-at-showroom");
    assert!(matches!(
        validate_party_fields(&party),
        Err(DomainError::InvalidEmail(_))
    ));

    party.email = String::from("sam@showroom.test");
    party.name = String::new();
    assert!(matches!(
        validate_party_fields(&party),
        Err(DomainError::InvalidName(_))
    ));
}
