// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::OffsetDateTime;

use crate::error::DomainError;
use crate::money::Money;
use crate::party::NewParty;
use crate::vehicle::VehicleDetails;

const VIN_LENGTH: usize = 17;

/// Validates that a scheduled time lies strictly after `now`.
///
/// # Errors
///
/// Returns `DomainError::ScheduledTimeNotInFuture` if `scheduled_time <= now`.
pub fn validate_future_time(
    scheduled_time: OffsetDateTime,
    now: OffsetDateTime,
) -> Result<(), DomainError> {
    if scheduled_time > now {
        Ok(())
    } else {
        Err(DomainError::ScheduledTimeNotInFuture {
            scheduled_time,
            now,
        })
    }
}

/// Validates a payment amount.
///
/// # Errors
///
/// Returns `DomainError::InvalidMoney` if the amount is zero.
pub fn validate_payment_amount(amount: Money) -> Result<(), DomainError> {
    if amount.is_zero() {
        return Err(DomainError::InvalidMoney {
            field: "amount",
            reason: String::from("payment amount must be positive"),
        });
    }
    Ok(())
}

/// Validates the fields of a party about to be registered.
///
/// Uniqueness of the email is enforced by the store.
///
/// # Errors
///
/// Returns an error if:
/// - The name is blank
/// - The email is blank or does not look like `local@domain`
pub fn validate_party_fields(party: &NewParty) -> Result<(), DomainError> {
    if party.name.trim().is_empty() {
        return Err(DomainError::InvalidName(String::from(
            "Name cannot be empty",
        )));
    }

    let email: &str = party.email.trim();
    if email.is_empty() {
        return Err(DomainError::InvalidEmail(String::from(
            "Email cannot be empty",
        )));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(DomainError::InvalidEmail(format!(
            "'{email}' is not a valid address"
        ))),
    }
}

/// Validates descriptive vehicle fields.
///
/// # Errors
///
/// Returns `DomainError::InvalidVehicleDetails` naming the first bad field.
pub fn validate_vehicle_details(details: &VehicleDetails) -> Result<(), DomainError> {
    if details.make.trim().is_empty() {
        return Err(invalid_detail("make", "cannot be empty"));
    }
    if details.model.trim().is_empty() {
        return Err(invalid_detail("model", "cannot be empty"));
    }
    if !(1886..=2100).contains(&details.year) {
        return Err(invalid_detail(
            "year",
            &format!("must be between 1886 and 2100, got {}", details.year),
        ));
    }
    if details.vin.len() != VIN_LENGTH || !details.vin.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid_detail(
            "vin",
            &format!("must be {VIN_LENGTH} alphanumeric characters"),
        ));
    }
    if details.mileage < 0 {
        return Err(invalid_detail("mileage", "must not be negative"));
    }
    Ok(())
}

fn invalid_detail(field: &'static str, reason: &str) -> DomainError {
    DomainError::InvalidVehicleDetails {
        field,
        reason: reason.to_string(),
    }
}
