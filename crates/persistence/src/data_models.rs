// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row types and their mapping to domain values.
//!
//! Timestamps are stored as RFC 3339 text, money as integer minor units and
//! booleans as `0`/`1` integers.

use std::str::FromStr;

use diesel::prelude::*;
use showroom_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot, Subject};
use showroom_domain::{
    Money, Party, PartyId, PaymentMethod, Role, Sale, SaleId, SaleStatus, TestDrive, TestDriveId,
    TestDriveStatus, Transaction, TransactionId, TransactionRef, TransactionStatus, Vehicle,
    VehicleDetails, VehicleId, VehicleStatus,
};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::diesel_schema::{audit_events, parties, sales, test_drives, transactions, vehicles};
use crate::error::PersistenceError;

/// Formats a timestamp for storage.
///
/// # Errors
///
/// Returns an error if the timestamp cannot be represented in RFC 3339.
pub fn format_timestamp(value: OffsetDateTime) -> Result<String, PersistenceError> {
    value
        .format(&Rfc3339)
        .map_err(|e| PersistenceError::QueryFailed(format!("cannot format timestamp: {e}")))
}

fn parse_timestamp(
    table: &'static str,
    id: i64,
    value: &str,
) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|e| PersistenceError::CorruptRow {
        table,
        id,
        reason: format!("bad timestamp '{value}': {e}"),
    })
}

fn parse_column<T>(table: &'static str, id: i64, value: &str) -> Result<T, PersistenceError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| PersistenceError::CorruptRow {
        table,
        id,
        reason: e.to_string(),
    })
}

fn money_column(table: &'static str, id: i64, cents: i64) -> Result<Money, PersistenceError> {
    Money::try_from(cents).map_err(|e| PersistenceError::CorruptRow {
        table,
        id,
        reason: e.to_string(),
    })
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = parties)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PartyRow {
    pub party_id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_active: i32,
}

impl PartyRow {
    pub fn into_party(self) -> Result<Party, PersistenceError> {
        Ok(Party {
            id: PartyId::new(self.party_id),
            role: parse_column::<Role>("parties", self.party_id, &self.role)?,
            name: self.name,
            email: self.email,
            active: self.is_active != 0,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = vehicles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VehicleRow {
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
    pub is_removed: i32,
    pub version: i64,
}

impl VehicleRow {
    pub fn into_vehicle(self) -> Result<Vehicle, PersistenceError> {
        let id: i64 = self.vehicle_id;
        Ok(Vehicle {
            id: VehicleId::new(id),
            details: VehicleDetails {
                make: self.make,
                model: self.model,
                year: self.year,
                vin: self.vin,
                color: self.color,
                license_plate: self.license_plate,
                price: money_column("vehicles", id, self.price_cents)?,
                mileage: self.mileage,
                description: self.description,
            },
            status: parse_column::<VehicleStatus>("vehicles", id, &self.status)?,
            removed: self.is_removed != 0,
            version: self.version,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = sales)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SaleRow {
    pub sale_id: i64,
    pub vehicle_id: i64,
    pub customer_id: i64,
    pub sales_person_id: i64,
    pub status: String,
    pub sale_price_cents: i64,
    pub notes: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub version: i64,
}

impl SaleRow {
    pub fn into_sale(self) -> Result<Sale, PersistenceError> {
        let id: i64 = self.sale_id;
        Ok(Sale {
            id: SaleId::new(id),
            vehicle_id: VehicleId::new(self.vehicle_id),
            customer_id: PartyId::new(self.customer_id),
            sales_person_id: PartyId::new(self.sales_person_id),
            status: parse_column::<SaleStatus>("sales", id, &self.status)?,
            sale_price: money_column("sales", id, self.sale_price_cents)?,
            notes: self.notes,
            created_at: parse_timestamp("sales", id, &self.created_at)?,
            completed_at: self
                .completed_at
                .as_deref()
                .map(|value| parse_timestamp("sales", id, value))
                .transpose()?,
            version: self.version,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionRow {
    pub transaction_id: i64,
    pub sale_id: i64,
    pub amount_cents: i64,
    pub payment_method: String,
    pub status: String,
    pub processed_by: i64,
    pub processed_at: Option<String>,
    pub reference: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub version: i64,
}

impl TransactionRow {
    pub fn into_transaction(self) -> Result<Transaction, PersistenceError> {
        let id: i64 = self.transaction_id;
        Ok(Transaction {
            id: TransactionId::new(id),
            sale_id: SaleId::new(self.sale_id),
            amount: money_column("transactions", id, self.amount_cents)?,
            payment_method: parse_column::<PaymentMethod>(
                "transactions",
                id,
                &self.payment_method,
            )?,
            status: parse_column::<TransactionStatus>("transactions", id, &self.status)?,
            processed_by: PartyId::new(self.processed_by),
            processed_at: self
                .processed_at
                .as_deref()
                .map(|value| parse_timestamp("transactions", id, value))
                .transpose()?,
            reference: TransactionRef::from_stored(self.reference),
            notes: self.notes,
            created_at: parse_timestamp("transactions", id, &self.created_at)?,
            version: self.version,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = test_drives)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TestDriveRow {
    pub test_drive_id: i64,
    pub vehicle_id: i64,
    pub customer_id: i64,
    pub scheduled_time: String,
    pub status: String,
    pub notes: Option<String>,
    pub customer_feedback: Option<String>,
    pub created_at: String,
    pub version: i64,
}

impl TestDriveRow {
    pub fn into_test_drive(self) -> Result<TestDrive, PersistenceError> {
        let id: i64 = self.test_drive_id;
        Ok(TestDrive {
            id: TestDriveId::new(id),
            vehicle_id: VehicleId::new(self.vehicle_id),
            customer_id: PartyId::new(self.customer_id),
            scheduled_time: parse_timestamp("test_drives", id, &self.scheduled_time)?,
            status: parse_column::<TestDriveStatus>("test_drives", id, &self.status)?,
            notes: self.notes,
            customer_feedback: self.customer_feedback,
            created_at: parse_timestamp("test_drives", id, &self.created_at)?,
            version: self.version,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = audit_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuditEventRow {
    pub event_id: i64,
    pub actor_id: String,
    pub actor_type: String,
    pub cause_id: String,
    pub cause_description: String,
    pub action_name: String,
    pub action_details: Option<String>,
    pub subject_kind: String,
    pub subject_id: i64,
    pub before_snapshot_json: String,
    pub after_snapshot_json: String,
    pub recorded_at: String,
}

impl AuditEventRow {
    pub fn into_event(self) -> AuditEvent {
        AuditEvent::new(
            Actor::new(self.actor_id, self.actor_type),
            Cause::new(self.cause_id, self.cause_description),
            Action::new(self.action_name, self.action_details),
            Subject::new(&self.subject_kind, self.subject_id),
            StateSnapshot::new(self.before_snapshot_json),
            StateSnapshot::new(self.after_snapshot_json),
            self.recorded_at,
        )
        .with_event_id(self.event_id)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_timestamps_round_trip_through_text() {
        let at: OffsetDateTime = datetime!(2026-03-01 09:30:15 UTC);
        let stored: String = format_timestamp(at).unwrap();
        assert_eq!(stored, "2026-03-01T09:30:15Z");
        assert_eq!(parse_timestamp("sales", 1, &stored).unwrap(), at);
    }

    #[test]
    fn test_unknown_status_is_reported_as_corrupt_row() {
        let row = VehicleRow {
            vehicle_id: 7,
            make: String::from("Honda"),
            model: String::from("Accord"),
            year: 2021,
            vin: String::from("1HGCM82633A004352"),
            color: None,
            license_plate: None,
            price_cents: 100,
            mileage: 0,
            description: None,
            status: String::from("scrapped"),
            is_removed: 0,
            version: 1,
        };
        match row.into_vehicle() {
            Err(PersistenceError::CorruptRow { table, id, .. }) => {
                assert_eq!(table, "vehicles");
                assert_eq!(id, 7);
            }
            other => panic!("expected corrupt row, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_price_is_reported_as_corrupt_row() {
        let row = SaleRow {
            sale_id: 3,
            vehicle_id: 1,
            customer_id: 2,
            sales_person_id: 3,
            status: String::from("pending"),
            sale_price_cents: -1,
            notes: None,
            created_at: String::from("2026-03-01T09:00:00Z"),
            completed_at: None,
            version: 1,
        };
        assert!(matches!(
            row.into_sale(),
            Err(PersistenceError::CorruptRow { table: "sales", .. })
        ));
    }
}
