// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use showroom::VehicleFilter;
use showroom_domain::{Vehicle, VehicleId};

use crate::data_models::VehicleRow;
use crate::diesel_schema::vehicles;
use crate::error::PersistenceError;

/// Retrieves a vehicle by id, including soft-removed vehicles.
///
/// # Errors
///
/// Returns an error if the query fails or the row is malformed.
pub fn find_vehicle(
    conn: &mut SqliteConnection,
    id: VehicleId,
) -> Result<Option<Vehicle>, PersistenceError> {
    vehicles::table
        .filter(vehicles::vehicle_id.eq(id.value()))
        .select(VehicleRow::as_select())
        .first(conn)
        .optional()?
        .map(VehicleRow::into_vehicle)
        .transpose()
}

/// Returns the stored version of a vehicle, if the row exists.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn vehicle_version(
    conn: &mut SqliteConnection,
    id: VehicleId,
) -> Result<Option<i64>, PersistenceError> {
    Ok(vehicles::table
        .filter(vehicles::vehicle_id.eq(id.value()))
        .select(vehicles::version)
        .first::<i64>(conn)
        .optional()?)
}

/// Lists vehicles matching `filter`.
///
/// # Errors
///
/// Returns an error if the query fails or a row is malformed.
pub fn list_vehicles(
    conn: &mut SqliteConnection,
    filter: &VehicleFilter,
) -> Result<Vec<Vehicle>, PersistenceError> {
    let mut query = vehicles::table
        .select(VehicleRow::as_select())
        .order(vehicles::vehicle_id.asc())
        .into_boxed();
    if !filter.include_removed {
        query = query.filter(vehicles::is_removed.eq(0));
    }
    if let Some(status) = filter.status {
        query = query.filter(vehicles::status.eq(status.as_str()));
    }
    query
        .load(conn)?
        .into_iter()
        .map(VehicleRow::into_vehicle)
        .collect()
}
