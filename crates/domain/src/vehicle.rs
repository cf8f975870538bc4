// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Vehicle inventory types and the availability lifecycle.
//!
//! A vehicle's status is owned by inventory but driven by the sale and
//! payment workflows. Status never changes through a detail update; it
//! moves only along the transitions listed in [`VehicleStatus::TRANSITIONS`].

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DomainError;
use crate::ids::VehicleId;
use crate::lifecycle::Lifecycle;
use crate::money::Money;

/// Availability of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    /// On the lot and free to sell or test drive.
    Available,
    /// Held by a pending or approved sale.
    Reserved,
    /// A sale for the vehicle has completed.
    Sold,
    /// In the service bay.
    Service,
}

impl VehicleStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Sold => "sold",
            Self::Service => "service",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "available" => Ok(Self::Available),
            "reserved" => Ok(Self::Reserved),
            "sold" => Ok(Self::Sold),
            "service" => Ok(Self::Service),
            _ => Err(DomainError::InvalidStatus {
                entity: Self::ENTITY,
                value: s.to_string(),
            }),
        }
    }

    /// Checks that the vehicle can be claimed by a sale or a test drive.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::VehicleNotAvailable` for any other status.
    pub const fn require_available(self, vehicle: VehicleId) -> Result<(), DomainError> {
        match self {
            Self::Available => Ok(()),
            status => Err(DomainError::VehicleNotAvailable { vehicle, status }),
        }
    }
}

impl Lifecycle for VehicleStatus {
    const ENTITY: &'static str = "vehicle";

    const TRANSITIONS: &'static [(Self, Self)] = &[
        (Self::Available, Self::Reserved),
        (Self::Reserved, Self::Sold),
        (Self::Reserved, Self::Available),
        (Self::Sold, Self::Available),
        (Self::Available, Self::Service),
        (Self::Service, Self::Available),
    ];

    fn as_str(&self) -> &'static str {
        Self::as_str(self)
    }
}

impl FromStr for VehicleStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

/// Descriptive fields of a vehicle. Never carries status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleDetails {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vin: String,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub price: Money,
    pub mileage: i64,
    pub description: Option<String>,
}

/// A vehicle in inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vehicle {
    pub id: VehicleId,
    #[serde(flatten)]
    pub details: VehicleDetails,
    pub status: VehicleStatus,
    /// Soft-removal flag. Removed vehicles are invisible to workflows.
    pub removed: bool,
    pub version: i64,
}

impl Vehicle {
    /// Checks that the vehicle may be soft-removed.
    ///
    /// Only vehicles on the lot or in service can leave inventory; anything
    /// tied to a sale must be released first.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::VehicleNotRemovable` while reserved or sold.
    pub const fn require_removable(&self) -> Result<(), DomainError> {
        match self.status {
            VehicleStatus::Available | VehicleStatus::Service => Ok(()),
            status => Err(DomainError::VehicleNotRemovable {
                vehicle: self.id,
                status,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            VehicleStatus::Available,
            VehicleStatus::Reserved,
            VehicleStatus::Sold,
            VehicleStatus::Service,
        ] {
            assert_eq!(VehicleStatus::parse_str(status.as_str()), Ok(status));
        }
        assert!(VehicleStatus::parse_str("scrapped").is_err());
    }

    #[test]
    fn test_no_vehicle_status_is_terminal() {
        assert!(!VehicleStatus::Available.is_terminal());
        assert!(!VehicleStatus::Reserved.is_terminal());
        assert!(!VehicleStatus::Sold.is_terminal());
        assert!(!VehicleStatus::Service.is_terminal());
    }

    #[test]
    fn test_sale_driven_transitions() {
        assert!(
            VehicleStatus::Available
                .validate_transition(VehicleStatus::Reserved)
                .is_ok()
        );
        assert!(
            VehicleStatus::Reserved
                .validate_transition(VehicleStatus::Sold)
                .is_ok()
        );
        assert!(
            VehicleStatus::Sold
                .validate_transition(VehicleStatus::Available)
                .is_ok()
        );
    }

    #[test]
    fn test_sold_vehicle_cannot_be_reserved_again() {
        let result = VehicleStatus::Sold.validate_transition(VehicleStatus::Reserved);
        assert!(matches!(
            result,
            Err(DomainError::InvalidStatusTransition {
                entity: "vehicle",
                ..
            })
        ));
    }

    #[test]
    fn test_service_bay_cannot_be_reserved() {
        assert!(
            VehicleStatus::Service
                .validate_transition(VehicleStatus::Reserved)
                .is_err()
        );
        assert!(
            VehicleStatus::Service
                .require_available(VehicleId::new(1))
                .is_err()
        );
    }
}
