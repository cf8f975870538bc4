// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use showroom_domain::{Vehicle, VehicleDetails, VehicleId, VehicleStatus};
use tracing::{debug, info};

use crate::diesel_schema::vehicles;
use crate::error::PersistenceError;
use crate::sqlite::get_last_insert_rowid;

/// Inserts a vehicle as available, at version 1.
///
/// # Errors
///
/// Returns `UniqueViolation` if the VIN is already registered.
pub fn insert_vehicle(
    conn: &mut SqliteConnection,
    details: &VehicleDetails,
) -> Result<Vehicle, PersistenceError> {
    diesel::insert_into(vehicles::table)
        .values((
            vehicles::make.eq(&details.make),
            vehicles::model.eq(&details.model),
            vehicles::year.eq(details.year),
            vehicles::vin.eq(&details.vin),
            vehicles::color.eq(details.color.as_deref()),
            vehicles::license_plate.eq(details.license_plate.as_deref()),
            vehicles::price_cents.eq(details.price.cents()),
            vehicles::mileage.eq(details.mileage),
            vehicles::description.eq(details.description.as_deref()),
            vehicles::status.eq(VehicleStatus::Available.as_str()),
            vehicles::is_removed.eq(0),
            vehicles::version.eq(1_i64),
        ))
        .execute(conn)?;

    let vehicle_id: i64 = get_last_insert_rowid(conn)?;
    info!(vehicle_id, vin = %details.vin, "Vehicle registered");

    Ok(Vehicle {
        id: VehicleId::new(vehicle_id),
        details: details.clone(),
        status: VehicleStatus::Available,
        removed: false,
        version: 1,
    })
}

/// Writes every column of `vehicle` if its version is still current.
///
/// # Errors
///
/// Returns `UniqueViolation` if the new VIN belongs to another vehicle.
pub fn update_vehicle(
    conn: &mut SqliteConnection,
    vehicle: &Vehicle,
) -> Result<usize, PersistenceError> {
    debug!(
        vehicle_id = vehicle.id.value(),
        version = vehicle.version,
        status = vehicle.status.as_str(),
        "Updating vehicle"
    );
    let details: &VehicleDetails = &vehicle.details;
    Ok(diesel::update(
        vehicles::table
            .filter(vehicles::vehicle_id.eq(vehicle.id.value()))
            .filter(vehicles::version.eq(vehicle.version)),
    )
    .set((
        vehicles::make.eq(&details.make),
        vehicles::model.eq(&details.model),
        vehicles::year.eq(details.year),
        vehicles::vin.eq(&details.vin),
        vehicles::color.eq(details.color.as_deref()),
        vehicles::license_plate.eq(details.license_plate.as_deref()),
        vehicles::price_cents.eq(details.price.cents()),
        vehicles::mileage.eq(details.mileage),
        vehicles::description.eq(details.description.as_deref()),
        vehicles::status.eq(vehicle.status.as_str()),
        vehicles::is_removed.eq(i32::from(vehicle.removed)),
        vehicles::version.eq(vehicle.version + 1),
    ))
    .execute(conn)?)
}
