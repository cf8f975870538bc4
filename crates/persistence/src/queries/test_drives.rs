// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use showroom::TestDriveFilter;
use showroom_domain::{TestDrive, TestDriveId};

use crate::data_models::TestDriveRow;
use crate::diesel_schema::test_drives;
use crate::error::PersistenceError;

/// Retrieves a test drive by id.
///
/// # Errors
///
/// Returns an error if the query fails or the row is malformed.
pub fn find_test_drive(
    conn: &mut SqliteConnection,
    id: TestDriveId,
) -> Result<Option<TestDrive>, PersistenceError> {
    test_drives::table
        .filter(test_drives::test_drive_id.eq(id.value()))
        .select(TestDriveRow::as_select())
        .first(conn)
        .optional()?
        .map(TestDriveRow::into_test_drive)
        .transpose()
}

/// Returns the stored version of a test drive, if the row exists.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn test_drive_version(
    conn: &mut SqliteConnection,
    id: TestDriveId,
) -> Result<Option<i64>, PersistenceError> {
    Ok(test_drives::table
        .filter(test_drives::test_drive_id.eq(id.value()))
        .select(test_drives::version)
        .first::<i64>(conn)
        .optional()?)
}

/// Lists test drives matching `filter`.
///
/// # Errors
///
/// Returns an error if the query fails or a row is malformed.
pub fn list_test_drives(
    conn: &mut SqliteConnection,
    filter: &TestDriveFilter,
) -> Result<Vec<TestDrive>, PersistenceError> {
    let mut query = test_drives::table
        .select(TestDriveRow::as_select())
        .order(test_drives::test_drive_id.asc())
        .into_boxed();
    if let Some(status) = filter.status {
        query = query.filter(test_drives::status.eq(status.as_str()));
    }
    if let Some(vehicle_id) = filter.vehicle_id {
        query = query.filter(test_drives::vehicle_id.eq(vehicle_id.value()));
    }
    if let Some(customer_id) = filter.customer_id {
        query = query.filter(test_drives::customer_id.eq(customer_id.value()));
    }
    query
        .load(conn)?
        .into_iter()
        .map(TestDriveRow::into_test_drive)
        .collect()
}
