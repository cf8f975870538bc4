// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::OffsetDateTime;

use crate::ids::{PartyId, SaleId, TestDriveId, TransactionId, VehicleId};
use crate::vehicle::VehicleStatus;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Vehicle does not exist or has been removed from inventory.
    VehicleNotFound(VehicleId),
    /// Sale does not exist.
    SaleNotFound(SaleId),
    /// Payment transaction does not exist.
    TransactionNotFound(TransactionId),
    /// Test drive booking does not exist.
    TestDriveNotFound(TestDriveId),
    /// Party does not exist or is inactive.
    PartyNotFound(PartyId),
    /// Party exists but does not hold the role the operation requires.
    PartyRoleMismatch {
        /// The party that was resolved.
        party: PartyId,
        /// The role (or roles) the operation requires.
        expected: &'static str,
    },
    /// An administrator already exists, so bootstrapping is closed.
    AdminAlreadyExists,
    /// Deactivating this administrator would leave none active.
    LastActiveAdmin(PartyId),
    /// Vehicle is not in the `available` state.
    VehicleNotAvailable {
        /// The vehicle.
        vehicle: VehicleId,
        /// The status the vehicle is currently in.
        status: VehicleStatus,
    },
    /// Vehicle cannot be removed from inventory in its current state.
    VehicleNotRemovable {
        /// The vehicle.
        vehicle: VehicleId,
        /// The status the vehicle is currently in.
        status: VehicleStatus,
    },
    /// A status change is not permitted by the lifecycle table.
    InvalidStatusTransition {
        /// The entity whose status was being changed.
        entity: &'static str,
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
        /// Why the transition was rejected.
        reason: String,
    },
    /// Only pending sales may be deleted.
    SaleNotPending {
        /// The sale.
        sale: SaleId,
        /// The status the sale is currently in.
        status: String,
    },
    /// Payments may only be taken against approved sales.
    SaleNotApproved {
        /// The sale.
        sale: SaleId,
        /// The status the sale is currently in.
        status: String,
    },
    /// A sale cannot be completed without exactly one settled payment.
    SaleNotSettled {
        /// The sale.
        sale: SaleId,
        /// How many completed payments exist for the sale.
        completed_payments: usize,
    },
    /// The sale already has a pending or completed payment.
    OpenTransactionExists {
        /// The sale.
        sale: SaleId,
        /// The payment that is still open.
        transaction: TransactionId,
    },
    /// The test drive is already completed or canceled.
    TestDriveClosed {
        /// The booking.
        test_drive: TestDriveId,
        /// The status the booking is currently in.
        status: String,
    },
    /// Another active booking for the vehicle falls inside the buffer window.
    TestDriveConflict {
        /// The vehicle.
        vehicle: VehicleId,
        /// The booking that holds the slot.
        existing: TestDriveId,
        /// The scheduled time of the booking that holds the slot.
        existing_time: OffsetDateTime,
    },
    /// The scheduled time is not strictly after the current time.
    ScheduledTimeNotInFuture {
        /// The requested time.
        scheduled_time: OffsetDateTime,
        /// The time the request was evaluated at.
        now: OffsetDateTime,
    },
    /// Monetary value is invalid.
    InvalidMoney {
        /// The field carrying the value.
        field: &'static str,
        /// Description of the problem.
        reason: String,
    },
    /// Vehicle detail field is invalid.
    InvalidVehicleDetails {
        /// The field that was invalid.
        field: &'static str,
        /// Description of the problem.
        reason: String,
    },
    /// Party name is empty or invalid.
    InvalidName(String),
    /// Party email is empty or invalid.
    InvalidEmail(String),
    /// Role string is not recognised.
    InvalidRole(String),
    /// Payment method string is not recognised.
    InvalidPaymentMethod(String),
    /// Status string is not recognised for the entity.
    InvalidStatus {
        /// The entity the status belongs to.
        entity: &'static str,
        /// The unrecognised value.
        value: String,
    },
    /// Transaction reference is empty or malformed.
    InvalidReference(String),
}

impl std::fmt::Display for DomainError {
    #[allow(clippy::too_many_lines)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VehicleNotFound(id) => write!(f, "Vehicle {id} not found"),
            Self::SaleNotFound(id) => write!(f, "Sale {id} not found"),
            Self::TransactionNotFound(id) => write!(f, "Transaction {id} not found"),
            Self::TestDriveNotFound(id) => write!(f, "Test drive {id} not found"),
            Self::PartyNotFound(id) => write!(f, "Party {id} not found"),
            Self::PartyRoleMismatch { party, expected } => {
                write!(f, "Party {party} does not hold the {expected} role")
            }
            Self::AdminAlreadyExists => write!(f, "An administrator is already registered"),
            Self::LastActiveAdmin(id) => {
                write!(f, "Party {id} is the last active administrator")
            }
            Self::VehicleNotAvailable { vehicle, status } => write!(
                f,
                "Vehicle {vehicle} is not available (current status: {})",
                status.as_str()
            ),
            Self::VehicleNotRemovable { vehicle, status } => write!(
                f,
                "Vehicle {vehicle} cannot be removed while {}",
                status.as_str()
            ),
            Self::InvalidStatusTransition {
                entity,
                from,
                to,
                reason,
            } => write!(
                f,
                "Invalid {entity} status transition from '{from}' to '{to}': {reason}"
            ),
            Self::SaleNotPending { sale, status } => write!(
                f,
                "Sale {sale} can only be deleted while pending (current status: {status})"
            ),
            Self::SaleNotApproved { sale, status } => write!(
                f,
                "Sale {sale} must be approved before taking payment (current status: {status})"
            ),
            Self::SaleNotSettled {
                sale,
                completed_payments,
            } => write!(
                f,
                "Sale {sale} requires exactly one completed payment to complete (found {completed_payments})"
            ),
            Self::OpenTransactionExists { sale, transaction } => write!(
                f,
                "Sale {sale} already has open payment {transaction}"
            ),
            Self::TestDriveClosed { test_drive, status } => {
                write!(f, "Test drive {test_drive} is already {status}")
            }
            Self::TestDriveConflict {
                vehicle,
                existing,
                existing_time,
            } => write!(
                f,
                "Vehicle {vehicle} is already booked for test drive {existing} at {existing_time}"
            ),
            Self::ScheduledTimeNotInFuture {
                scheduled_time,
                now,
            } => write!(
                f,
                "Scheduled time {scheduled_time} must be after the current time {now}"
            ),
            Self::InvalidMoney { field, reason } => write!(f, "Invalid {field}: {reason}"),
            Self::InvalidVehicleDetails { field, reason } => {
                write!(f, "Invalid vehicle {field}: {reason}")
            }
            Self::InvalidName(msg) => write!(f, "Invalid name: {msg}"),
            Self::InvalidEmail(msg) => write!(f, "Invalid email: {msg}"),
            Self::InvalidRole(role) => write!(f, "Invalid role: '{role}'"),
            Self::InvalidPaymentMethod(method) => {
                write!(f, "Invalid payment method: '{method}'")
            }
            Self::InvalidStatus { entity, value } => {
                write!(f, "Invalid {entity} status: '{value}'")
            }
            Self::InvalidReference(msg) => write!(f, "Invalid transaction reference: {msg}"),
        }
    }
}

impl std::error::Error for DomainError {}
