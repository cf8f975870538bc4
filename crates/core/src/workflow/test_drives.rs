// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The test-drive scheduler.
//!
//! Bookings are independent of the sale lifecycle: they never change a
//! vehicle's status. A new booking must keep clear of every other pending
//! or approved booking of the same vehicle by the buffer window; the
//! vehicle is locked for the whole check-then-insert.

use serde_json::{Value, json};
use showroom_audit::{Actor, Cause, Subject};
use showroom_domain::{
    DomainError, Lifecycle, NewTestDrive, PartyId, Role, TestDrive, TestDriveId, TestDriveStatus,
    Vehicle, VehicleId, check_slot_free, validate_future_time,
};
use time::OffsetDateTime;
use tracing::{info, warn};

use super::{AuditEntry, Context, load_test_drive, record, resolve_party};
use crate::clock::Clock;
use crate::error::CoreError;
use crate::store::{TestDriveFilter, UnitOfWork, WorkflowStore};

/// Input for a new booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    pub vehicle_id: VehicleId,
    pub customer_id: PartyId,
    pub scheduled_time: OffsetDateTime,
    pub notes: Option<String>,
}

pub struct TestDrives<'a, S, C> {
    store: &'a S,
    clock: &'a C,
}

fn test_drive_subject(id: TestDriveId) -> Subject {
    Subject::new("test_drive", id.value())
}

impl<'a, S: WorkflowStore, C: Clock> TestDrives<'a, S, C> {
    pub(crate) const fn new(store: &'a S, clock: &'a C) -> Self {
        Self { store, clock }
    }

    /// Books a test drive.
    ///
    /// # Errors
    ///
    /// Returns, in order of checking:
    /// - `NotFound` if the vehicle is missing or removed
    /// - `InvalidState` if the vehicle is not available
    /// - `NotFound` if the customer does not resolve to a customer party
    /// - `InvalidInput` unless the time is strictly in the future
    /// - `Conflict` if another pending or approved booking of the vehicle
    ///   is less than two hours away
    pub fn create(
        &self,
        actor: &Actor,
        cause: &Cause,
        draft: BookingDraft,
    ) -> Result<TestDrive, CoreError> {
        let ctx = Context::new(self.clock, actor, cause);

        let booking: TestDrive = self.store.atomically(|uow| {
            let vehicle: Vehicle = uow.lock_vehicle(draft.vehicle_id)?;
            vehicle.status.require_available(vehicle.id)?;
            resolve_party(uow, draft.customer_id, &[Role::Customer], "customer")?;
            validate_future_time(draft.scheduled_time, ctx.now)?;

            let existing: Vec<TestDrive> = uow.test_drives_for_vehicle(vehicle.id)?;
            if let Err(conflict) = check_slot_free(vehicle.id, &existing, draft.scheduled_time) {
                warn!(
                    vehicle_id = %vehicle.id,
                    scheduled_time = %draft.scheduled_time,
                    "Rejected overlapping test drive"
                );
                return Err(conflict.into());
            }

            let booking: TestDrive = uow.insert_test_drive(&NewTestDrive {
                vehicle_id: vehicle.id,
                customer_id: draft.customer_id,
                scheduled_time: draft.scheduled_time,
                notes: draft.notes,
                created_at: ctx.now,
            })?;
            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "CreateTestDrive",
                    details: Some(format!("scheduled {}", booking.scheduled_time)),
                    subject: test_drive_subject(booking.id),
                    before: Value::Null,
                    after: json!(booking),
                },
            )?;
            Ok(booking)
        })?;

        info!(
            test_drive_id = %booking.id,
            vehicle_id = %booking.vehicle_id,
            "Booked test drive"
        );
        Ok(booking)
    }

    /// Moves a booking to a new time.
    ///
    /// The new slot is not checked against other bookings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` unless the new time is in the future,
    /// `NotFound` if the booking does not exist, and `InvalidState` if it is
    /// completed or canceled.
    pub fn reschedule(
        &self,
        actor: &Actor,
        cause: &Cause,
        id: TestDriveId,
        scheduled_time: OffsetDateTime,
    ) -> Result<TestDrive, CoreError> {
        let ctx = Context::new(self.clock, actor, cause);
        validate_future_time(scheduled_time, ctx.now)?;

        self.store.atomically(|uow| {
            let before: TestDrive = load_test_drive(uow, id)?;
            before.require_open()?;
            let after: TestDrive = uow.update_test_drive(&TestDrive {
                scheduled_time,
                ..before.clone()
            })?;
            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "RescheduleTestDrive",
                    details: Some(format!(
                        "{} -> {}",
                        before.scheduled_time, after.scheduled_time
                    )),
                    subject: test_drive_subject(id),
                    before: json!(before),
                    after: json!(after),
                },
            )?;
            Ok(after)
        })
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the booking does not exist and `InvalidState`
    /// unless it is pending.
    pub fn approve(
        &self,
        actor: &Actor,
        cause: &Cause,
        id: TestDriveId,
    ) -> Result<TestDrive, CoreError> {
        self.transition(actor, cause, id, TestDriveStatus::Approved, "ApproveTestDrive")
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the booking does not exist and `InvalidState`
    /// unless it is approved.
    pub fn complete(
        &self,
        actor: &Actor,
        cause: &Cause,
        id: TestDriveId,
    ) -> Result<TestDrive, CoreError> {
        self.transition(actor, cause, id, TestDriveStatus::Completed, "CompleteTestDrive")
    }

    /// Cancels a booking and frees its slot.
    ///
    /// Cancelling an already canceled booking succeeds and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the booking does not exist and `InvalidState`
    /// if it is completed.
    pub fn cancel(
        &self,
        actor: &Actor,
        cause: &Cause,
        id: TestDriveId,
    ) -> Result<TestDrive, CoreError> {
        let ctx = Context::new(self.clock, actor, cause);

        self.store.atomically(|uow| {
            let before: TestDrive = load_test_drive(uow, id)?;
            let after: TestDrive = match before.status {
                TestDriveStatus::Canceled => before.clone(),
                TestDriveStatus::Completed => {
                    return Err(DomainError::TestDriveClosed {
                        test_drive: id,
                        status: before.status.as_str().to_string(),
                    }
                    .into());
                }
                TestDriveStatus::Pending | TestDriveStatus::Approved => {
                    before.status.validate_transition(TestDriveStatus::Canceled)?;
                    uow.update_test_drive(&TestDrive {
                        status: TestDriveStatus::Canceled,
                        ..before.clone()
                    })?
                }
            };
            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "CancelTestDrive",
                    details: (before.status == TestDriveStatus::Canceled)
                        .then(|| String::from("already canceled")),
                    subject: test_drive_subject(id),
                    before: json!(before),
                    after: json!(after),
                },
            )?;
            Ok(after)
        })
    }

    /// Stores customer feedback and notes. No lifecycle effect.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the booking does not exist.
    pub fn record_feedback(
        &self,
        actor: &Actor,
        cause: &Cause,
        id: TestDriveId,
        feedback: Option<String>,
        notes: Option<String>,
    ) -> Result<TestDrive, CoreError> {
        let ctx = Context::new(self.clock, actor, cause);

        self.store.atomically(|uow| {
            let before: TestDrive = load_test_drive(uow, id)?;
            let after: TestDrive = uow.update_test_drive(&TestDrive {
                customer_feedback: feedback.or_else(|| before.customer_feedback.clone()),
                notes: notes.or_else(|| before.notes.clone()),
                ..before.clone()
            })?;
            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "RecordTestDriveFeedback",
                    details: None,
                    subject: test_drive_subject(id),
                    before: json!(before),
                    after: json!(after),
                },
            )?;
            Ok(after)
        })
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the booking does not exist.
    pub fn get(&self, id: TestDriveId) -> Result<TestDrive, CoreError> {
        self.store.snapshot(|uow| load_test_drive(uow, id))
    }

    /// # Errors
    ///
    /// Returns a `Storage` error if the store cannot be read.
    pub fn list(&self, filter: &TestDriveFilter) -> Result<Vec<TestDrive>, CoreError> {
        self.store.snapshot(|uow| uow.list_test_drives(filter))
    }

    fn transition(
        &self,
        actor: &Actor,
        cause: &Cause,
        id: TestDriveId,
        to: TestDriveStatus,
        action: &'static str,
    ) -> Result<TestDrive, CoreError> {
        let ctx = Context::new(self.clock, actor, cause);

        let booking: TestDrive = self
            .store
            .atomically(|uow| apply_transition(uow, &ctx, id, to, action))?;
        info!(test_drive_id = %id, status = to.as_str(), "Test drive status updated");
        Ok(booking)
    }
}

fn apply_transition(
    uow: &mut dyn UnitOfWork,
    ctx: &Context<'_>,
    id: TestDriveId,
    to: TestDriveStatus,
    action: &'static str,
) -> Result<TestDrive, CoreError> {
    let before: TestDrive = load_test_drive(uow, id)?;
    before.status.validate_transition(to)?;
    let after: TestDrive = uow.update_test_drive(&TestDrive {
        status: to,
        ..before.clone()
    })?;
    record(
        uow,
        ctx,
        AuditEntry {
            action,
            details: Some(format!("{} -> {}", before.status.as_str(), to.as_str())),
            subject: test_drive_subject(id),
            before: json!(before),
            after: json!(after),
        },
    )?;
    Ok(after)
}
