// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Role checks for every gated operation.

use showroom_domain::{PartyId, Role};
use time::Duration;

use crate::{
    ApiError, AuthenticatedActor, AuthorizationService, CreateTestDriveRequest,
    ListTestDrivesRequest, ListVehiclesRequest, Operation, RegisterPartyRequest,
    TestDriveResponse, VehicleResponse, authenticate_stub, cancel_test_drive, create_test_drive,
    deactivate_party, delete_sale, get_test_drive, list_test_drives, list_vehicles,
    refund_transaction, register_party, register_vehicle, remove_vehicle,
};

use super::helpers::{ApiFixture, NOW, create_test_cause, create_vehicle_request};

fn actor(role: Role) -> AuthenticatedActor {
    AuthenticatedActor::new(PartyId::new(7), role)
}

fn allowed(operation: Operation) -> Vec<Role> {
    [Role::Admin, Role::Sales, Role::Cashier, Role::Customer]
        .into_iter()
        .filter(|role| AuthorizationService::authorize(&actor(*role), operation).is_ok())
        .collect()
}

#[test]
fn test_role_table() {
    use showroom_domain::Role::{Admin, Cashier, Customer, Sales};

    assert_eq!(allowed(Operation::RegisterVehicle), vec![Admin, Sales]);
    assert_eq!(allowed(Operation::UpdateVehicle), vec![Admin, Sales]);
    assert_eq!(allowed(Operation::ServiceVehicle), vec![Admin, Sales]);
    assert_eq!(allowed(Operation::RemoveVehicle), vec![Admin]);
    assert_eq!(allowed(Operation::CreateSale), vec![Admin, Sales]);
    assert_eq!(allowed(Operation::UpdateSale), vec![Admin, Sales]);
    assert_eq!(allowed(Operation::DeleteSale), vec![Admin]);
    assert_eq!(allowed(Operation::CreateTransaction), vec![Admin, Cashier]);
    assert_eq!(allowed(Operation::UpdateTransaction), vec![Admin, Cashier]);
    assert_eq!(allowed(Operation::ProcessTransaction), vec![Admin, Cashier]);
    assert_eq!(allowed(Operation::RefundTransaction), vec![Admin]);
    assert_eq!(
        allowed(Operation::CreateTestDrive),
        vec![Admin, Sales, Cashier, Customer]
    );
    assert_eq!(allowed(Operation::ManageTestDrive), vec![Admin, Sales]);
    assert_eq!(allowed(Operation::RegisterParty), vec![Admin]);
    assert_eq!(allowed(Operation::DeactivateParty), vec![Admin]);
    assert_eq!(allowed(Operation::ReadSales), vec![Admin, Sales, Cashier]);
    assert_eq!(allowed(Operation::ReadTransactions), vec![Admin, Cashier]);
}

#[test]
fn test_unauthorized_error_names_action_and_roles() {
    let err = AuthorizationService::authorize(&actor(Role::Sales), Operation::RefundTransaction)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unauthorized: 'refund_transaction' requires admin role"
    );
}

#[test]
fn test_customer_books_only_for_self() {
    let customer = actor(Role::Customer);
    assert!(AuthorizationService::authorize_book_test_drive(&customer, customer.id).is_ok());
    assert!(
        AuthorizationService::authorize_book_test_drive(&customer, PartyId::new(99)).is_err()
    );
    assert!(
        AuthorizationService::authorize_book_test_drive(&actor(Role::Sales), PartyId::new(99))
            .is_ok()
    );
}

#[test]
fn test_cashier_cannot_register_vehicle_and_nothing_is_written() {
    let fx = ApiFixture::new();
    let result = register_vehicle(
        &fx.showroom,
        create_vehicle_request(),
        &fx.cashier,
        &create_test_cause(),
    );
    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));

    let vehicles: Vec<VehicleResponse> =
        list_vehicles(&fx.showroom, &ListVehiclesRequest::default(), &fx.admin).unwrap();
    assert!(vehicles.is_empty());
}

#[test]
fn test_sales_cannot_remove_vehicle() {
    let fx = ApiFixture::new();
    let vehicle = register_vehicle(
        &fx.showroom,
        create_vehicle_request(),
        &fx.sales,
        &create_test_cause(),
    )
    .unwrap();

    let result = remove_vehicle(
        &fx.showroom,
        vehicle.vehicle_id,
        &fx.sales,
        &create_test_cause(),
    );
    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_only_admin_deletes_sales_and_refunds() {
    let fx = ApiFixture::new();
    let cause = create_test_cause();

    // Authorization is decided before the ids are resolved.
    assert!(matches!(
        delete_sale(&fx.showroom, 1, &fx.sales, &cause),
        Err(ApiError::Unauthorized { .. })
    ));
    assert!(matches!(
        refund_transaction(&fx.showroom, 1, &fx.cashier, &cause),
        Err(ApiError::Unauthorized { .. })
    ));
}

#[test]
fn test_non_admin_cannot_register_party() {
    let fx = ApiFixture::new();
    let result = register_party(
        &fx.showroom,
        RegisterPartyRequest {
            name: String::from("Eve"),
            email: String::from("eve@example.com"),
            role: String::from("admin"),
        },
        &fx.sales,
        &create_test_cause(),
    );
    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

fn book(fx: &ApiFixture, booker: &AuthenticatedActor, customer: Option<i64>) -> TestDriveResponse {
    let vehicle = register_vehicle(
        &fx.showroom,
        create_vehicle_request(),
        &fx.sales,
        &create_test_cause(),
    )
    .unwrap();
    create_test_drive(
        &fx.showroom,
        CreateTestDriveRequest {
            vehicle_id: vehicle.vehicle_id,
            customer_id: customer,
            scheduled_time: NOW + Duration::days(1),
            notes: None,
        },
        booker,
        &create_test_cause(),
    )
    .unwrap()
}

#[test]
fn test_customer_cancels_own_booking_only() {
    let fx = ApiFixture::new();
    let cause = create_test_cause();
    let booking = book(&fx, &fx.customer, None);
    assert_eq!(booking.customer_id, fx.customer.id.value());

    let result = cancel_test_drive(
        &fx.showroom,
        booking.test_drive_id,
        &fx.other_customer,
        &cause,
    );
    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));

    let canceled = cancel_test_drive(&fx.showroom, booking.test_drive_id, &fx.customer, &cause)
        .unwrap();
    assert_eq!(canceled.status, "canceled");
}

#[test]
fn test_customer_cannot_book_for_another_customer() {
    let fx = ApiFixture::new();
    let vehicle = register_vehicle(
        &fx.showroom,
        create_vehicle_request(),
        &fx.sales,
        &create_test_cause(),
    )
    .unwrap();
    let result = create_test_drive(
        &fx.showroom,
        CreateTestDriveRequest {
            vehicle_id: vehicle.vehicle_id,
            customer_id: Some(fx.other_customer.id.value()),
            scheduled_time: NOW + Duration::days(1),
            notes: None,
        },
        &fx.customer,
        &create_test_cause(),
    );
    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_customers_see_only_their_own_bookings() {
    let fx = ApiFixture::new();
    let mine = book(&fx, &fx.customer, None);
    book(&fx, &fx.sales, Some(fx.other_customer.id.value()));

    let listed: Vec<TestDriveResponse> =
        list_test_drives(&fx.showroom, &ListTestDrivesRequest::default(), &fx.customer).unwrap();
    assert_eq!(listed, vec![mine.clone()]);

    let all: Vec<TestDriveResponse> =
        list_test_drives(&fx.showroom, &ListTestDrivesRequest::default(), &fx.sales).unwrap();
    assert_eq!(all.len(), 2);

    let snooping = list_test_drives(
        &fx.showroom,
        &ListTestDrivesRequest {
            customer_id: Some(fx.other_customer.id.value()),
            ..ListTestDrivesRequest::default()
        },
        &fx.customer,
    );
    assert!(matches!(snooping, Err(ApiError::Unauthorized { .. })));

    assert!(get_test_drive(&fx.showroom, mine.test_drive_id, &fx.other_customer).is_err());
    assert!(get_test_drive(&fx.showroom, mine.test_drive_id, &fx.customer).is_ok());
}

#[test]
fn test_authenticate_stub_checks_directory() {
    let fx = ApiFixture::new();
    let sales_id: i64 = fx.sales.id.value();

    let resolved = authenticate_stub(&fx.showroom, sales_id, Role::Sales).unwrap();
    assert_eq!(resolved, fx.sales);

    assert!(matches!(
        authenticate_stub(&fx.showroom, sales_id, Role::Admin),
        Err(ApiError::AuthenticationFailed { .. })
    ));
    assert!(matches!(
        authenticate_stub(&fx.showroom, 9_999, Role::Customer),
        Err(ApiError::AuthenticationFailed { .. })
    ));
}

#[test]
fn test_authenticate_stub_rejects_deactivated_party() {
    let fx = ApiFixture::new();
    let customer_id: i64 = fx.customer.id.value();

    let party = deactivate_party(&fx.showroom, customer_id, &fx.admin, &create_test_cause())
        .unwrap();
    assert!(!party.active);

    assert!(matches!(
        authenticate_stub(&fx.showroom, customer_id, Role::Customer),
        Err(ApiError::AuthenticationFailed { .. })
    ));
}

#[test]
fn test_deactivate_party_requires_admin() {
    let fx = ApiFixture::new();
    let customer_id: i64 = fx.customer.id.value();

    let result = deactivate_party(&fx.showroom, customer_id, &fx.sales, &create_test_cause());

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
    assert!(authenticate_stub(&fx.showroom, customer_id, Role::Customer).is_ok());
}
