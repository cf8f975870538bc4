// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod error;
mod ids;
mod lifecycle;
mod money;
mod party;
mod sale;
mod test_drive;
mod transaction;
mod validation;
mod vehicle;

#[cfg(test)]
mod tests;

pub use error::DomainError;
pub use ids::{PartyId, SaleId, TestDriveId, TransactionId, VehicleId};
pub use lifecycle::Lifecycle;
pub use money::Money;
pub use party::{NewParty, Party, Role};
pub use sale::{NewSale, Sale, SaleStatus};
pub use test_drive::{
    NewTestDrive, TEST_DRIVE_BUFFER, TestDrive, TestDriveStatus, check_slot_free, find_conflict,
    slots_overlap,
};
pub use transaction::{
    NewTransaction, PaymentMethod, Transaction, TransactionRef, TransactionStatus,
};
pub use validation::{
    validate_future_time, validate_party_fields, validate_payment_amount,
    validate_vehicle_details,
};
pub use vehicle::{Vehicle, VehicleDetails, VehicleStatus};
