// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for the Showroom dealership system.
//!
//! The API layer sits between transport (HTTP) and the workflows in
//! `showroom`. It owns three concerns:
//!
//! - resolving who is calling ([`authenticate_stub`]),
//! - deciding whether they may do what they ask ([`AuthorizationService`]),
//! - translating requests into domain types and errors into [`ApiError`].
//!
//! Handlers are generic over the store and clock, so the same code runs
//! against `SQLite` in the server and against in-memory stores in tests.

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

mod auth;
mod error;
mod handlers;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedActor, AuthorizationService, Operation, authenticate_stub};
pub use error::{ApiError, AuthError, translate_core_error, translate_domain_error};
pub use handlers::{
    approve_test_drive, audit_trail, bootstrap_admin, cancel_test_drive, complete_test_drive,
    create_sale, create_test_drive, create_transaction, deactivate_party, delete_sale, get_sale,
    get_test_drive, get_transaction, get_vehicle, list_parties, list_sales, list_test_drives,
    list_transactions, list_vehicles, process_transaction, record_test_drive_feedback,
    refund_transaction, register_party, register_vehicle, remove_vehicle, reschedule_test_drive,
    return_vehicle_from_service, send_vehicle_to_service, update_sale, update_sale_status,
    update_transaction, update_vehicle,
};
pub use request_response::{
    AuditEventResponse, BootstrapAdminRequest, CreateSaleRequest, CreateTestDriveRequest,
    CreateTransactionRequest, DeleteSaleResponse, ListSalesRequest, ListTestDrivesRequest,
    ListTransactionsRequest, ListVehiclesRequest, PartyResponse, RegisterPartyRequest,
    RequestError, RescheduleTestDriveRequest, SaleResponse, TestDriveFeedbackRequest,
    TestDriveResponse, TransactionResponse, UpdateSaleRequest, UpdateSaleStatusRequest,
    UpdateTransactionRequest, VehicleDetailsRequest, VehicleResponse,
};
pub use showroom_domain::Role;
