// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Requests carry raw values (cents, status strings, numeric ids); the
//! handlers parse them into domain types. Responses flatten domain
//! entities into plain JSON-friendly fields.

use serde::{Deserialize, Serialize};
use showroom_audit::AuditEvent;
use showroom_domain::{Party, Sale, TestDrive, Transaction, Vehicle};
use thiserror::Error;
use time::OffsetDateTime;

/// Request shape problems detected before any domain rule runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// An identifier was zero or negative.
    #[error("{field} must be a positive identifier (got {value})")]
    NonPositiveId { field: &'static str, value: i64 },

    /// An update request did not name anything to change.
    #[error("update must change at least one field")]
    EmptyUpdate { field: &'static str },

    /// A subject kind is not one the audit trail records.
    #[error("unknown audit subject kind '{kind}'")]
    UnknownSubjectKind { kind: String },
}

impl RequestError {
    /// The request field the error refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::NonPositiveId { field, .. } | Self::EmptyUpdate { field } => field,
            Self::UnknownSubjectKind { .. } => "subject_kind",
        }
    }
}

/// Checks that a raw identifier could name a stored row.
///
/// # Errors
///
/// Returns `RequestError::NonPositiveId` for zero or negative values.
pub const fn require_id(field: &'static str, value: i64) -> Result<i64, RequestError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(RequestError::NonPositiveId { field, value })
    }
}

// ---------------------------------------------------------------------------
// Parties
// ---------------------------------------------------------------------------

/// API request to register the first administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapAdminRequest {
    pub name: String,
    pub email: String,
}

/// API request to register a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterPartyRequest {
    pub name: String,
    pub email: String,
    /// One of `admin`, `sales`, `cashier`, `customer`.
    pub role: String,
}

/// A registered party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyResponse {
    pub party_id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub active: bool,
}

impl From<&Party> for PartyResponse {
    fn from(party: &Party) -> Self {
        Self {
            party_id: party.id.value(),
            name: party.name.clone(),
            email: party.email.clone(),
            role: party.role.as_str().to_string(),
            active: party.active,
        }
    }
}

// ---------------------------------------------------------------------------
// Vehicles
// ---------------------------------------------------------------------------

/// Descriptive vehicle fields, used both to register a vehicle and to
/// replace an existing vehicle's details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleDetailsRequest {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vin: String,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    /// List price in cents.
    pub price_cents: i64,
    pub mileage: i64,
    pub description: Option<String>,
}

/// Query for listing vehicles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListVehiclesRequest {
    pub status: Option<String>,
    #[serde(default)]
    pub include_removed: bool,
}

/// A vehicle as seen through the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleResponse {
    pub vehicle_id: i64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vin: String,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub price_cents: i64,
    pub mileage: i64,
    pub description: Option<String>,
    pub status: String,
    pub removed: bool,
    pub version: i64,
}

impl From<&Vehicle> for VehicleResponse {
    fn from(vehicle: &Vehicle) -> Self {
        let details = &vehicle.details;
        Self {
            vehicle_id: vehicle.id.value(),
            make: details.make.clone(),
            model: details.model.clone(),
            year: details.year,
            vin: details.vin.clone(),
            color: details.color.clone(),
            license_plate: details.license_plate.clone(),
            price_cents: details.price.cents(),
            mileage: details.mileage,
            description: details.description.clone(),
            status: vehicle.status.as_str().to_string(),
            removed: vehicle.removed,
            version: vehicle.version,
        }
    }
}

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

/// API request to open a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSaleRequest {
    pub vehicle_id: i64,
    pub customer_id: i64,
    /// Defaults to the acting party when absent.
    pub sales_person_id: Option<i64>,
    pub sale_price_cents: i64,
    pub notes: Option<String>,
}

/// API request to move a sale to another status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSaleStatusRequest {
    pub status: String,
}

/// API request to edit a sale's price or notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSaleRequest {
    pub sale_price_cents: Option<i64>,
    pub notes: Option<String>,
}

/// Query for listing sales.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSalesRequest {
    pub status: Option<String>,
    pub vehicle_id: Option<i64>,
    pub customer_id: Option<i64>,
}

/// A sale as seen through the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleResponse {
    pub sale_id: i64,
    pub vehicle_id: i64,
    pub customer_id: i64,
    pub sales_person_id: i64,
    pub status: String,
    pub sale_price_cents: i64,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub version: i64,
}

impl From<&Sale> for SaleResponse {
    fn from(sale: &Sale) -> Self {
        Self {
            sale_id: sale.id.value(),
            vehicle_id: sale.vehicle_id.value(),
            customer_id: sale.customer_id.value(),
            sales_person_id: sale.sales_person_id.value(),
            status: sale.status.as_str().to_string(),
            sale_price_cents: sale.sale_price.cents(),
            notes: sale.notes.clone(),
            created_at: sale.created_at,
            completed_at: sale.completed_at,
            version: sale.version,
        }
    }
}

/// Confirms a deleted sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSaleResponse {
    pub sale_id: i64,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// API request to record a payment against a sale.
///
/// The acting cashier is recorded as the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub sale_id: i64,
    pub amount_cents: i64,
    /// One of `cash`, `card`, `bank_transfer`, `financing`.
    pub payment_method: String,
    pub notes: Option<String>,
}

/// API request to edit a payment's status, reference or notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTransactionRequest {
    pub status: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// Query for listing payments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTransactionsRequest {
    pub status: Option<String>,
    pub sale_id: Option<i64>,
}

/// A payment as seen through the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub transaction_id: i64,
    pub sale_id: i64,
    pub amount_cents: i64,
    pub payment_method: String,
    pub status: String,
    pub processed_by: i64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub processed_at: Option<OffsetDateTime>,
    pub reference: String,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub version: i64,
}

impl From<&Transaction> for TransactionResponse {
    fn from(transaction: &Transaction) -> Self {
        Self {
            transaction_id: transaction.id.value(),
            sale_id: transaction.sale_id.value(),
            amount_cents: transaction.amount.cents(),
            payment_method: transaction.payment_method.as_str().to_string(),
            status: transaction.status.as_str().to_string(),
            processed_by: transaction.processed_by.value(),
            processed_at: transaction.processed_at,
            reference: transaction.reference.as_str().to_string(),
            notes: transaction.notes.clone(),
            created_at: transaction.created_at,
            version: transaction.version,
        }
    }
}

// ---------------------------------------------------------------------------
// Test drives
// ---------------------------------------------------------------------------

/// API request to book a test drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTestDriveRequest {
    pub vehicle_id: i64,
    /// Defaults to the acting party when absent.
    pub customer_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_time: OffsetDateTime,
    pub notes: Option<String>,
}

/// API request to move a booking to a new time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleTestDriveRequest {
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_time: OffsetDateTime,
}

/// API request to record what the customer thought.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDriveFeedbackRequest {
    pub customer_feedback: Option<String>,
    pub notes: Option<String>,
}

/// Query for listing bookings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTestDrivesRequest {
    pub status: Option<String>,
    pub vehicle_id: Option<i64>,
    pub customer_id: Option<i64>,
}

/// A booking as seen through the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDriveResponse {
    pub test_drive_id: i64,
    pub vehicle_id: i64,
    pub customer_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_time: OffsetDateTime,
    pub status: String,
    pub notes: Option<String>,
    pub customer_feedback: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub version: i64,
}

impl From<&TestDrive> for TestDriveResponse {
    fn from(test_drive: &TestDrive) -> Self {
        Self {
            test_drive_id: test_drive.id.value(),
            vehicle_id: test_drive.vehicle_id.value(),
            customer_id: test_drive.customer_id.value(),
            scheduled_time: test_drive.scheduled_time,
            status: test_drive.status.as_str().to_string(),
            notes: test_drive.notes.clone(),
            customer_feedback: test_drive.customer_feedback.clone(),
            created_at: test_drive.created_at,
            version: test_drive.version,
        }
    }
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// One entry of an entity's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEventResponse {
    pub event_id: Option<i64>,
    pub actor_id: String,
    pub actor_type: String,
    pub cause_id: String,
    pub cause_description: String,
    pub action_name: String,
    pub action_details: Option<String>,
    pub subject_kind: String,
    pub subject_id: i64,
    /// JSON snapshot of the entity before the action.
    pub before_snapshot: String,
    /// JSON snapshot of the entity after the action.
    pub after_snapshot: String,
    pub recorded_at: String,
}

impl From<&AuditEvent> for AuditEventResponse {
    fn from(event: &AuditEvent) -> Self {
        Self {
            event_id: event.event_id,
            actor_id: event.actor.id.clone(),
            actor_type: event.actor.actor_type.clone(),
            cause_id: event.cause.id.clone(),
            cause_description: event.cause.description.clone(),
            action_name: event.action.name.clone(),
            action_details: event.action.details.clone(),
            subject_kind: event.subject.kind.clone(),
            subject_id: event.subject.id,
            before_snapshot: event.before.data.clone(),
            after_snapshot: event.after.data.clone(),
            recorded_at: event.recorded_at.clone(),
        }
    }
}
