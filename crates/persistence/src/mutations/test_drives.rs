// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use showroom_domain::{NewTestDrive, TestDrive, TestDriveId, TestDriveStatus};
use tracing::{debug, info};

use crate::data_models::format_timestamp;
use crate::diesel_schema::test_drives;
use crate::error::PersistenceError;
use crate::sqlite::get_last_insert_rowid;

/// Inserts a pending test drive at version 1.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_test_drive(
    conn: &mut SqliteConnection,
    test_drive: &NewTestDrive,
) -> Result<TestDrive, PersistenceError> {
    diesel::insert_into(test_drives::table)
        .values((
            test_drives::vehicle_id.eq(test_drive.vehicle_id.value()),
            test_drives::customer_id.eq(test_drive.customer_id.value()),
            test_drives::scheduled_time.eq(format_timestamp(test_drive.scheduled_time)?),
            test_drives::status.eq(TestDriveStatus::Pending.as_str()),
            test_drives::notes.eq(test_drive.notes.as_deref()),
            test_drives::created_at.eq(format_timestamp(test_drive.created_at)?),
            test_drives::version.eq(1_i64),
        ))
        .execute(conn)?;

    let test_drive_id: i64 = get_last_insert_rowid(conn)?;
    info!(
        test_drive_id,
        vehicle_id = test_drive.vehicle_id.value(),
        "Test drive booked"
    );

    Ok(TestDrive {
        id: TestDriveId::new(test_drive_id),
        vehicle_id: test_drive.vehicle_id,
        customer_id: test_drive.customer_id,
        scheduled_time: test_drive.scheduled_time,
        status: TestDriveStatus::Pending,
        notes: test_drive.notes.clone(),
        customer_feedback: None,
        created_at: test_drive.created_at,
        version: 1,
    })
}

/// Writes the mutable columns of `test_drive` if its version is still current.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_test_drive(
    conn: &mut SqliteConnection,
    test_drive: &TestDrive,
) -> Result<usize, PersistenceError> {
    debug!(
        test_drive_id = test_drive.id.value(),
        version = test_drive.version,
        status = test_drive.status.as_str(),
        "Updating test drive"
    );
    Ok(diesel::update(
        test_drives::table
            .filter(test_drives::test_drive_id.eq(test_drive.id.value()))
            .filter(test_drives::version.eq(test_drive.version)),
    )
    .set((
        test_drives::scheduled_time.eq(format_timestamp(test_drive.scheduled_time)?),
        test_drives::status.eq(test_drive.status.as_str()),
        test_drives::notes.eq(test_drive.notes.as_deref()),
        test_drives::customer_feedback.eq(test_drive.customer_feedback.as_deref()),
        test_drives::version.eq(test_drive.version + 1),
    ))
    .execute(conn)?)
}
