// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test-drive bookings and the slot conflict rule.
//!
//! Bookings that are pending or approved hold their vehicle for a window
//! of [`TEST_DRIVE_BUFFER`] on either side of the scheduled time. Two such
//! bookings for the same vehicle may not be strictly closer than the buffer;
//! bookings exactly one buffer apart are allowed.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Duration, OffsetDateTime};

use crate::error::DomainError;
use crate::ids::{PartyId, TestDriveId, VehicleId};
use crate::lifecycle::Lifecycle;

/// Minimum spacing between two active bookings of the same vehicle.
pub const TEST_DRIVE_BUFFER: Duration = Duration::hours(2);

/// Lifecycle state of a test-drive booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestDriveStatus {
    Pending,
    Approved,
    Completed,
    Canceled,
}

impl TestDriveStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "completed" => Ok(Self::Completed),
            "canceled" => Ok(Self::Canceled),
            _ => Err(DomainError::InvalidStatus {
                entity: Self::ENTITY,
                value: s.to_string(),
            }),
        }
    }

    /// Returns true if a booking in this state occupies its time slot.
    #[must_use]
    pub const fn holds_slot(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }
}

impl Lifecycle for TestDriveStatus {
    const ENTITY: &'static str = "test_drive";

    const TRANSITIONS: &'static [(Self, Self)] = &[
        (Self::Pending, Self::Approved),
        (Self::Approved, Self::Completed),
        (Self::Pending, Self::Canceled),
        (Self::Approved, Self::Canceled),
    ];

    fn as_str(&self) -> &'static str {
        Self::as_str(self)
    }
}

impl FromStr for TestDriveStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

/// A test-drive booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestDrive {
    pub id: TestDriveId,
    pub vehicle_id: VehicleId,
    pub customer_id: PartyId,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_time: OffsetDateTime,
    pub status: TestDriveStatus,
    pub notes: Option<String>,
    pub customer_feedback: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub version: i64,
}

impl TestDrive {
    /// Checks that the booking can still be changed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::TestDriveClosed` once completed or canceled.
    pub fn require_open(&self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::TestDriveClosed {
                test_drive: self.id,
                status: self.status.as_str().to_string(),
            });
        }
        Ok(())
    }
}

/// A booking about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTestDrive {
    pub vehicle_id: VehicleId,
    pub customer_id: PartyId,
    pub scheduled_time: OffsetDateTime,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Returns true if two scheduled times are strictly closer than the buffer.
#[must_use]
pub fn slots_overlap(a: OffsetDateTime, b: OffsetDateTime) -> bool {
    (a - b).abs() < TEST_DRIVE_BUFFER
}

/// Finds the first active booking that collides with `scheduled_time`.
///
/// Bookings that no longer hold their slot are ignored, as is `exclude`
/// (the booking being moved, if any).
#[must_use]
pub fn find_conflict<'a>(
    bookings: &'a [TestDrive],
    scheduled_time: OffsetDateTime,
    exclude: Option<TestDriveId>,
) -> Option<&'a TestDrive> {
    bookings.iter().find(|booking| {
        Some(booking.id) != exclude
            && booking.status.holds_slot()
            && slots_overlap(booking.scheduled_time, scheduled_time)
    })
}

/// Checks a proposed slot for `vehicle` against its existing bookings.
///
/// # Errors
///
/// Returns `DomainError::TestDriveConflict` naming the booking that holds the slot.
pub fn check_slot_free(
    vehicle: VehicleId,
    bookings: &[TestDrive],
    scheduled_time: OffsetDateTime,
) -> Result<(), DomainError> {
    match find_conflict(bookings, scheduled_time, None) {
        Some(existing) => Err(DomainError::TestDriveConflict {
            vehicle,
            existing: existing.id,
            existing_time: existing.scheduled_time,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn booking(id: i64, at: OffsetDateTime, status: TestDriveStatus) -> TestDrive {
        TestDrive {
            id: TestDriveId::new(id),
            vehicle_id: VehicleId::new(1),
            customer_id: PartyId::new(9),
            scheduled_time: at,
            status,
            notes: None,
            customer_feedback: None,
            created_at: datetime!(2026-03-01 09:00 UTC),
            version: 1,
        }
    }

    #[test]
    fn test_ninety_minutes_apart_overlaps() {
        let t = datetime!(2026-03-10 10:00 UTC);
        assert!(slots_overlap(t, t + Duration::minutes(90)));
        assert!(slots_overlap(t + Duration::minutes(90), t));
    }

    #[test]
    fn test_exactly_two_hours_apart_is_free() {
        let t = datetime!(2026-03-10 10:00 UTC);
        assert!(!slots_overlap(t, t + Duration::hours(2)));
        assert!(!slots_overlap(t, t - Duration::hours(2)));
    }

    #[test]
    fn test_canceled_booking_releases_slot() {
        let t = datetime!(2026-03-10 10:00 UTC);
        let bookings = vec![booking(1, t, TestDriveStatus::Canceled)];
        assert!(check_slot_free(VehicleId::new(1), &bookings, t).is_ok());
    }

    #[test]
    fn test_approved_booking_holds_slot() {
        let t = datetime!(2026-03-10 10:00 UTC);
        let bookings = vec![
            booking(1, t - Duration::hours(5), TestDriveStatus::Pending),
            booking(2, t + Duration::minutes(30), TestDriveStatus::Approved),
        ];
        assert_eq!(
            check_slot_free(VehicleId::new(1), &bookings, t),
            Err(DomainError::TestDriveConflict {
                vehicle: VehicleId::new(1),
                existing: TestDriveId::new(2),
                existing_time: t + Duration::minutes(30),
            })
        );
    }

    #[test]
    fn test_find_conflict_skips_excluded_booking() {
        let t = datetime!(2026-03-10 10:00 UTC);
        let bookings = vec![booking(4, t, TestDriveStatus::Pending)];
        assert!(find_conflict(&bookings, t, Some(TestDriveId::new(4))).is_none());
        assert!(find_conflict(&bookings, t, None).is_some());
    }

    #[test]
    fn test_closed_bookings_cannot_change() {
        let t = datetime!(2026-03-10 10:00 UTC);
        assert!(booking(1, t, TestDriveStatus::Approved).require_open().is_ok());
        assert!(matches!(
            booking(1, t, TestDriveStatus::Completed).require_open(),
            Err(DomainError::TestDriveClosed { .. })
        ));
    }
}
