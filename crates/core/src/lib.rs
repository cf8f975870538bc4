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
#![allow(clippy::multiple_crate_versions)]

//! Sale, payment, inventory and test-drive workflows.
//!
//! The workflows in [`Showroom`] keep vehicle availability, sale lifecycle,
//! payment state and test-drive bookings consistent with one another. All
//! storage goes through [`WorkflowStore`]; [`InMemoryStore`] is the
//! in-process implementation.

mod clock;
mod error;
mod memory;
mod store;
mod workflow;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, ErrorKind};
pub use memory::InMemoryStore;
pub use store::{
    SaleFilter, TestDriveFilter, TransactionFilter, UnitOfWork, VehicleFilter, WorkflowStore,
};
pub use workflow::{
    BookingDraft, Inventory, Parties, PaymentDraft, PaymentUpdate, Payments, SaleDraft,
    SaleUpdate, Sales, Showroom, TestDrives,
};
