// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handlers.
//!
//! Each handler authorizes the actor, translates the request into domain
//! types, calls the matching workflow and translates the result back.
//! Authorization always happens before any state is written.

use showroom::{
    BookingDraft, Clock, PaymentDraft, PaymentUpdate, SaleDraft, SaleFilter, SaleUpdate, Showroom,
    TestDriveFilter, TransactionFilter, VehicleFilter, WorkflowStore,
};
use showroom_audit::{Actor, AuditEvent, Cause, Subject};
use showroom_domain::{
    Money, NewParty, Party, PartyId, PaymentMethod, Role, Sale, SaleId, SaleStatus, TestDrive,
    TestDriveId, TestDriveStatus, Transaction, TransactionId, TransactionRef, TransactionStatus,
    Vehicle, VehicleDetails, VehicleId, VehicleStatus,
};
use tracing::{debug, info};

use crate::auth::{AuthenticatedActor, AuthorizationService, Operation};
use crate::error::{ApiError, translate_core_error, translate_domain_error};
use crate::request_response::{
    AuditEventResponse, BootstrapAdminRequest, CreateSaleRequest, CreateTestDriveRequest,
    CreateTransactionRequest, DeleteSaleResponse, ListSalesRequest, ListTestDrivesRequest,
    ListTransactionsRequest, ListVehiclesRequest, PartyResponse, RegisterPartyRequest,
    RequestError, RescheduleTestDriveRequest, SaleResponse, TestDriveFeedbackRequest,
    TestDriveResponse, TransactionResponse, UpdateSaleRequest, UpdateSaleStatusRequest,
    UpdateTransactionRequest, VehicleDetailsRequest, VehicleResponse, require_id,
};

/// Audit subject kinds that can be queried.
const SUBJECT_KINDS: &[&str] = &["vehicle", "party", "sale", "transaction", "test_drive"];

fn vehicle_id(value: i64) -> Result<VehicleId, ApiError> {
    Ok(VehicleId::new(require_id("vehicle_id", value)?))
}

fn sale_id(value: i64) -> Result<SaleId, ApiError> {
    Ok(SaleId::new(require_id("sale_id", value)?))
}

fn transaction_id(value: i64) -> Result<TransactionId, ApiError> {
    Ok(TransactionId::new(require_id("transaction_id", value)?))
}

fn test_drive_id(value: i64) -> Result<TestDriveId, ApiError> {
    Ok(TestDriveId::new(require_id("test_drive_id", value)?))
}

fn party_id(field: &'static str, value: i64) -> Result<PartyId, ApiError> {
    Ok(PartyId::new(require_id(field, value)?))
}

fn money(field: &'static str, cents: i64) -> Result<Money, ApiError> {
    Money::from_cents(field, cents).map_err(translate_domain_error)
}

/// Parses an optional status (or other enumerated) string.
fn parse_optional<T>(value: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: std::str::FromStr<Err = showroom_domain::DomainError>,
{
    value
        .map(str::parse::<T>)
        .transpose()
        .map_err(translate_domain_error)
}

fn vehicle_details(request: VehicleDetailsRequest) -> Result<VehicleDetails, ApiError> {
    Ok(VehicleDetails {
        make: request.make,
        model: request.model,
        year: request.year,
        vin: request.vin,
        color: request.color,
        license_plate: request.license_plate,
        price: money("price", request.price_cents)?,
        mileage: request.mileage,
        description: request.description,
    })
}

// ---------------------------------------------------------------------------
// Parties
// ---------------------------------------------------------------------------

/// Registers the first administrator.
///
/// No authentication is required: the call only succeeds while the system
/// has no administrator.
///
/// # Errors
///
/// Returns an error if:
/// - An administrator already exists
/// - The name or email is invalid, or the email is taken
pub fn bootstrap_admin<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    request: &BootstrapAdminRequest,
    cause: &Cause,
) -> Result<PartyResponse, ApiError> {
    let party: Party = showroom
        .parties()
        .bootstrap_admin(cause, &request.name, &request.email)
        .map_err(translate_core_error)?;
    Ok(PartyResponse::from(&party))
}

/// Registers a party (staff member or customer).
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an admin
/// - The role, name or email is invalid, or the email is taken
pub fn register_party<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    request: RegisterPartyRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<PartyResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::RegisterParty)?;

    let role: Role = request.role.parse().map_err(translate_domain_error)?;
    let actor: Actor = authenticated_actor.to_audit_actor();
    let party: Party = showroom
        .parties()
        .register(
            &actor,
            cause,
            NewParty {
                name: request.name,
                email: request.email,
                role,
            },
        )
        .map_err(translate_core_error)?;
    Ok(PartyResponse::from(&party))
}

/// Lists parties, optionally restricted to one role.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the role is unknown.
pub fn list_parties<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    role: Option<&str>,
    authenticated_actor: &AuthenticatedActor,
) -> Result<Vec<PartyResponse>, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::ListParties)?;

    let role: Option<Role> = parse_optional(role)?;
    let parties: Vec<Party> = showroom
        .parties()
        .list(role)
        .map_err(translate_core_error)?;
    Ok(parties.iter().map(PartyResponse::from).collect())
}

/// Deactivates a party.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an admin
/// - The party does not exist
/// - The party is the last active administrator
pub fn deactivate_party<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<PartyResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::DeactivateParty)?;

    let id: PartyId = party_id("party_id", id)?;
    let actor: Actor = authenticated_actor.to_audit_actor();
    let party: Party = showroom
        .parties()
        .deactivate(&actor, cause, id)
        .map_err(translate_core_error)?;
    info!(party_id = %party.id, actor_id = %authenticated_actor.id, "Party deactivated");
    Ok(PartyResponse::from(&party))
}

// ---------------------------------------------------------------------------
// Vehicles
// ---------------------------------------------------------------------------

/// Adds a vehicle to inventory as `available`.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not admin or sales
/// - A detail field is invalid
/// - The VIN is already registered
pub fn register_vehicle<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    request: VehicleDetailsRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<VehicleResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::RegisterVehicle)?;

    let details: VehicleDetails = vehicle_details(request)?;
    let vehicle: Vehicle = showroom
        .inventory()
        .register(&authenticated_actor.to_audit_actor(), cause, details)
        .map_err(translate_core_error)?;
    Ok(VehicleResponse::from(&vehicle))
}

/// Replaces a vehicle's descriptive fields. Status is not touched.
///
/// # Errors
///
/// Returns an error if the actor is not admin or sales, the vehicle does not
/// exist, a field is invalid, or the new VIN is taken.
pub fn update_vehicle<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    request: VehicleDetailsRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<VehicleResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::UpdateVehicle)?;

    let id: VehicleId = vehicle_id(id)?;
    let details: VehicleDetails = vehicle_details(request)?;
    let vehicle: Vehicle = showroom
        .inventory()
        .update_details(&authenticated_actor.to_audit_actor(), cause, id, details)
        .map_err(translate_core_error)?;
    Ok(VehicleResponse::from(&vehicle))
}

/// Removes a vehicle from inventory.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the vehicle does not exist,
/// or a sale holds it.
pub fn remove_vehicle<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<VehicleResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::RemoveVehicle)?;

    let vehicle: Vehicle = showroom
        .inventory()
        .remove(&authenticated_actor.to_audit_actor(), cause, vehicle_id(id)?)
        .map_err(translate_core_error)?;
    Ok(VehicleResponse::from(&vehicle))
}

/// Moves an available vehicle into the service bay.
///
/// # Errors
///
/// Returns an error if the actor is not admin or sales, or the vehicle is
/// not `available`.
pub fn send_vehicle_to_service<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<VehicleResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::ServiceVehicle)?;

    let vehicle: Vehicle = showroom
        .inventory()
        .send_to_service(&authenticated_actor.to_audit_actor(), cause, vehicle_id(id)?)
        .map_err(translate_core_error)?;
    Ok(VehicleResponse::from(&vehicle))
}

/// Returns a serviced vehicle to the lot.
///
/// # Errors
///
/// Returns an error if the actor is not admin or sales, or the vehicle is
/// not in service.
pub fn return_vehicle_from_service<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<VehicleResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::ServiceVehicle)?;

    let vehicle: Vehicle = showroom
        .inventory()
        .return_from_service(&authenticated_actor.to_audit_actor(), cause, vehicle_id(id)?)
        .map_err(translate_core_error)?;
    Ok(VehicleResponse::from(&vehicle))
}

/// # Errors
///
/// Returns an error if the vehicle does not exist or was removed.
pub fn get_vehicle<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<VehicleResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::ReadVehicles)?;

    let vehicle: Vehicle = showroom
        .inventory()
        .get(vehicle_id(id)?)
        .map_err(translate_core_error)?;
    Ok(VehicleResponse::from(&vehicle))
}

/// # Errors
///
/// Returns an error if the status filter is not a vehicle status.
pub fn list_vehicles<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    request: &ListVehiclesRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<Vec<VehicleResponse>, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::ReadVehicles)?;

    let filter = VehicleFilter {
        status: parse_optional::<VehicleStatus>(request.status.as_deref())?,
        include_removed: request.include_removed,
    };
    let vehicles: Vec<Vehicle> = showroom
        .inventory()
        .list(&filter)
        .map_err(translate_core_error)?;
    Ok(vehicles.iter().map(VehicleResponse::from).collect())
}

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

/// Opens a pending sale and reserves the vehicle.
///
/// The sales person defaults to the acting party.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not admin or sales
/// - The vehicle is not `available`
/// - The customer or sales person does not resolve
/// - The price is negative
pub fn create_sale<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    request: CreateSaleRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<SaleResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::CreateSale)?;

    let sales_person_id: PartyId = match request.sales_person_id {
        Some(id) => party_id("sales_person_id", id)?,
        None => authenticated_actor.id,
    };
    let draft = SaleDraft {
        vehicle_id: vehicle_id(request.vehicle_id)?,
        customer_id: party_id("customer_id", request.customer_id)?,
        sales_person_id,
        sale_price: money("sale_price", request.sale_price_cents)?,
        notes: request.notes,
    };

    let sale: Sale = showroom
        .sales()
        .create(&authenticated_actor.to_audit_actor(), cause, draft)
        .map_err(translate_core_error)?;
    Ok(SaleResponse::from(&sale))
}

/// Moves a sale through its lifecycle, cascading to the vehicle and to
/// pending payments.
///
/// # Errors
///
/// Returns an error if the actor is not admin or sales, the status is
/// unknown, or the transition is not permitted.
pub fn update_sale_status<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    request: &UpdateSaleStatusRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<SaleResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::UpdateSale)?;

    let status: SaleStatus = request.status.parse().map_err(translate_domain_error)?;
    let sale: Sale = showroom
        .sales()
        .update_status(&authenticated_actor.to_audit_actor(), cause, sale_id(id)?, status)
        .map_err(translate_core_error)?;

    info!(sale_id = id, status = status.as_str(), "Sale status updated via API");
    Ok(SaleResponse::from(&sale))
}

/// Edits a sale's price or notes.
///
/// # Errors
///
/// Returns an error if the actor is not admin or sales, nothing would
/// change, or the sale does not exist.
pub fn update_sale<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    request: UpdateSaleRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<SaleResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::UpdateSale)?;

    if request.sale_price_cents.is_none() && request.notes.is_none() {
        return Err(RequestError::EmptyUpdate { field: "sale" }.into());
    }
    let update = SaleUpdate {
        sale_price: request
            .sale_price_cents
            .map(|cents| money("sale_price", cents))
            .transpose()?,
        notes: request.notes,
    };

    let sale: Sale = showroom
        .sales()
        .update_details(&authenticated_actor.to_audit_actor(), cause, sale_id(id)?, update)
        .map_err(translate_core_error)?;
    Ok(SaleResponse::from(&sale))
}

/// Deletes a pending sale and frees its vehicle.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the sale is not pending.
pub fn delete_sale<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<DeleteSaleResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::DeleteSale)?;

    showroom
        .sales()
        .delete(&authenticated_actor.to_audit_actor(), cause, sale_id(id)?)
        .map_err(translate_core_error)?;
    Ok(DeleteSaleResponse {
        sale_id: id,
        message: format!("Deleted sale {id}"),
    })
}

/// # Errors
///
/// Returns an error if the actor may not read sales or the sale does not
/// exist.
pub fn get_sale<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<SaleResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::ReadSales)?;

    let sale: Sale = showroom
        .sales()
        .get(sale_id(id)?)
        .map_err(translate_core_error)?;
    Ok(SaleResponse::from(&sale))
}

/// # Errors
///
/// Returns an error if the actor may not read sales or a filter is invalid.
pub fn list_sales<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    request: &ListSalesRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<Vec<SaleResponse>, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::ReadSales)?;

    let filter = SaleFilter {
        status: parse_optional::<SaleStatus>(request.status.as_deref())?,
        vehicle_id: request.vehicle_id.map(vehicle_id).transpose()?,
        customer_id: request
            .customer_id
            .map(|id| party_id("customer_id", id))
            .transpose()?,
    };
    let sales: Vec<Sale> = showroom
        .sales()
        .list(&filter)
        .map_err(translate_core_error)?;
    Ok(sales.iter().map(SaleResponse::from).collect())
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Records a pending payment against an approved sale.
///
/// The acting party is recorded as the processor.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not admin or cashier
/// - The sale is not approved or already has an open payment
/// - The amount is not positive or the method is unknown
pub fn create_transaction<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    request: CreateTransactionRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<TransactionResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::CreateTransaction)?;

    let payment_method: PaymentMethod = request
        .payment_method
        .parse()
        .map_err(translate_domain_error)?;
    let draft = PaymentDraft {
        sale_id: sale_id(request.sale_id)?,
        amount: money("amount", request.amount_cents)?,
        payment_method,
        processed_by: authenticated_actor.id,
        notes: request.notes,
    };

    let transaction: Transaction = showroom
        .payments()
        .create(&authenticated_actor.to_audit_actor(), cause, draft)
        .map_err(translate_core_error)?;
    Ok(TransactionResponse::from(&transaction))
}

/// Settles a pending payment, completing the sale and marking the vehicle
/// sold in the same unit.
///
/// # Errors
///
/// Returns an error if the actor is not admin or cashier or the payment is
/// not pending.
pub fn process_transaction<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<TransactionResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::ProcessTransaction)?;

    let transaction: Transaction = showroom
        .payments()
        .process(&authenticated_actor.to_audit_actor(), cause, transaction_id(id)?)
        .map_err(translate_core_error)?;

    info!(
        transaction_id = id,
        status = transaction.status.as_str(),
        "Transaction processed via API"
    );
    Ok(TransactionResponse::from(&transaction))
}

/// Refunds a completed payment, canceling the sale and returning the
/// vehicle to the lot.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the payment is not
/// completed.
pub fn refund_transaction<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<TransactionResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::RefundTransaction)?;

    let transaction: Transaction = showroom
        .payments()
        .refund(&authenticated_actor.to_audit_actor(), cause, transaction_id(id)?)
        .map_err(translate_core_error)?;
    Ok(TransactionResponse::from(&transaction))
}

/// Edits a payment's status, reference or notes.
///
/// A status change runs the same cascade as the dedicated endpoints, so
/// setting `refunded` requires the refund role.
///
/// # Errors
///
/// Returns an error if the actor lacks the role, nothing would change, a
/// field is invalid, or the status change is not permitted.
pub fn update_transaction<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    request: UpdateTransactionRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<TransactionResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::UpdateTransaction)?;

    if request.status.is_none() && request.reference.is_none() && request.notes.is_none() {
        return Err(RequestError::EmptyUpdate {
            field: "transaction",
        }
        .into());
    }
    let status: Option<TransactionStatus> = parse_optional(request.status.as_deref())?;
    if status == Some(TransactionStatus::Refunded) {
        AuthorizationService::authorize(authenticated_actor, Operation::RefundTransaction)?;
    }
    let update = PaymentUpdate {
        status,
        reference: request
            .reference
            .as_deref()
            .map(TransactionRef::parse)
            .transpose()
            .map_err(translate_domain_error)?,
        notes: request.notes,
    };

    let transaction: Transaction = showroom
        .payments()
        .update(&authenticated_actor.to_audit_actor(), cause, transaction_id(id)?, update)
        .map_err(translate_core_error)?;
    Ok(TransactionResponse::from(&transaction))
}

/// # Errors
///
/// Returns an error if the actor may not read payments or the payment does
/// not exist.
pub fn get_transaction<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<TransactionResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::ReadTransactions)?;

    let transaction: Transaction = showroom
        .payments()
        .get(transaction_id(id)?)
        .map_err(translate_core_error)?;
    Ok(TransactionResponse::from(&transaction))
}

/// # Errors
///
/// Returns an error if the actor may not read payments or a filter is
/// invalid.
pub fn list_transactions<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    request: &ListTransactionsRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<Vec<TransactionResponse>, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::ReadTransactions)?;

    let filter = TransactionFilter {
        status: parse_optional::<TransactionStatus>(request.status.as_deref())?,
        sale_id: request.sale_id.map(sale_id).transpose()?,
    };
    let transactions: Vec<Transaction> = showroom
        .payments()
        .list(&filter)
        .map_err(translate_core_error)?;
    Ok(transactions.iter().map(TransactionResponse::from).collect())
}

// ---------------------------------------------------------------------------
// Test drives
// ---------------------------------------------------------------------------

/// Books a test drive.
///
/// The customer defaults to the acting party; customers may only book for
/// themselves.
///
/// # Errors
///
/// Returns an error if:
/// - A customer books on someone else's behalf
/// - The time is not in the future
/// - Another active booking of the vehicle is within two hours
pub fn create_test_drive<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    request: CreateTestDriveRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<TestDriveResponse, ApiError> {
    let customer_id: PartyId = match request.customer_id {
        Some(id) => party_id("customer_id", id)?,
        None => authenticated_actor.id,
    };
    AuthorizationService::authorize_book_test_drive(authenticated_actor, customer_id)?;

    let draft = BookingDraft {
        vehicle_id: vehicle_id(request.vehicle_id)?,
        customer_id,
        scheduled_time: request.scheduled_time,
        notes: request.notes,
    };
    let test_drive: TestDrive = showroom
        .test_drives()
        .create(&authenticated_actor.to_audit_actor(), cause, draft)
        .map_err(translate_core_error)?;
    Ok(TestDriveResponse::from(&test_drive))
}

/// Moves a booking to a new time.
///
/// # Errors
///
/// Returns an error if the actor is not admin or sales, the booking is
/// closed, or the new time is not in the future.
pub fn reschedule_test_drive<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    request: &RescheduleTestDriveRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<TestDriveResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::ManageTestDrive)?;

    let test_drive: TestDrive = showroom
        .test_drives()
        .reschedule(
            &authenticated_actor.to_audit_actor(),
            cause,
            test_drive_id(id)?,
            request.scheduled_time,
        )
        .map_err(translate_core_error)?;
    Ok(TestDriveResponse::from(&test_drive))
}

/// # Errors
///
/// Returns an error if the actor is not admin or sales, or the booking is
/// not pending.
pub fn approve_test_drive<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<TestDriveResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::ManageTestDrive)?;

    let test_drive: TestDrive = showroom
        .test_drives()
        .approve(&authenticated_actor.to_audit_actor(), cause, test_drive_id(id)?)
        .map_err(translate_core_error)?;
    Ok(TestDriveResponse::from(&test_drive))
}

/// # Errors
///
/// Returns an error if the actor is not admin or sales, or the booking is
/// not approved.
pub fn complete_test_drive<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<TestDriveResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::ManageTestDrive)?;

    let test_drive: TestDrive = showroom
        .test_drives()
        .complete(&authenticated_actor.to_audit_actor(), cause, test_drive_id(id)?)
        .map_err(translate_core_error)?;
    Ok(TestDriveResponse::from(&test_drive))
}

/// Cancels a booking, freeing its slot.
///
/// The booking is read first so that a customer can be matched against its
/// owner; the read and the cancel are separate units, but ownership never
/// changes after creation.
///
/// # Errors
///
/// Returns an error if the actor is neither staff allowed to cancel nor the
/// booking's customer, or the booking is completed.
pub fn cancel_test_drive<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<TestDriveResponse, ApiError> {
    let id: TestDriveId = test_drive_id(id)?;
    let booking: TestDrive = showroom
        .test_drives()
        .get(id)
        .map_err(translate_core_error)?;
    AuthorizationService::authorize_cancel_test_drive(authenticated_actor, &booking)?;

    let test_drive: TestDrive = showroom
        .test_drives()
        .cancel(&authenticated_actor.to_audit_actor(), cause, id)
        .map_err(translate_core_error)?;
    Ok(TestDriveResponse::from(&test_drive))
}

/// Records customer feedback and staff notes on a booking.
///
/// # Errors
///
/// Returns an error if the actor is not admin or sales, nothing would
/// change, or the booking does not exist.
pub fn record_test_drive_feedback<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    request: TestDriveFeedbackRequest,
    authenticated_actor: &AuthenticatedActor,
    cause: &Cause,
) -> Result<TestDriveResponse, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::ManageTestDrive)?;

    if request.customer_feedback.is_none() && request.notes.is_none() {
        return Err(RequestError::EmptyUpdate {
            field: "test_drive",
        }
        .into());
    }
    let test_drive: TestDrive = showroom
        .test_drives()
        .record_feedback(
            &authenticated_actor.to_audit_actor(),
            cause,
            test_drive_id(id)?,
            request.customer_feedback,
            request.notes,
        )
        .map_err(translate_core_error)?;
    Ok(TestDriveResponse::from(&test_drive))
}

/// # Errors
///
/// Returns an error if the booking does not exist or belongs to another
/// customer.
pub fn get_test_drive<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<TestDriveResponse, ApiError> {
    let test_drive: TestDrive = showroom
        .test_drives()
        .get(test_drive_id(id)?)
        .map_err(translate_core_error)?;
    AuthorizationService::authorize_read_test_drive(authenticated_actor, &test_drive)?;
    Ok(TestDriveResponse::from(&test_drive))
}

/// Lists bookings. Customers only ever see their own.
///
/// # Errors
///
/// Returns an error if a customer asks for another customer's bookings, a
/// cashier asks at all, or a filter is invalid.
pub fn list_test_drives<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    request: &ListTestDrivesRequest,
    authenticated_actor: &AuthenticatedActor,
) -> Result<Vec<TestDriveResponse>, ApiError> {
    let requested: Option<PartyId> = request
        .customer_id
        .map(|id| party_id("customer_id", id))
        .transpose()?;

    let customer_id: Option<PartyId> = if authenticated_actor.role == Role::Customer {
        if requested.is_some_and(|id| id != authenticated_actor.id) {
            return Err(ApiError::Unauthorized {
                action: String::from("read_other_customer_test_drives"),
                required_role: String::from("admin or sales"),
            });
        }
        Some(authenticated_actor.id)
    } else {
        AuthorizationService::authorize(authenticated_actor, Operation::ReadTestDrives)?;
        requested
    };

    let filter = TestDriveFilter {
        status: parse_optional::<TestDriveStatus>(request.status.as_deref())?,
        vehicle_id: request.vehicle_id.map(vehicle_id).transpose()?,
        customer_id,
    };
    let test_drives: Vec<TestDrive> = showroom
        .test_drives()
        .list(&filter)
        .map_err(translate_core_error)?;

    debug!(
        count = test_drives.len(),
        role = authenticated_actor.role.as_str(),
        "Listed test drives"
    );
    Ok(test_drives.iter().map(TestDriveResponse::from).collect())
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// Returns every audit event recorded against one entity, oldest first.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the subject kind is
/// unknown.
pub fn audit_trail<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    kind: &str,
    id: i64,
    authenticated_actor: &AuthenticatedActor,
) -> Result<Vec<AuditEventResponse>, ApiError> {
    AuthorizationService::authorize(authenticated_actor, Operation::ReadAuditTrail)?;

    if !SUBJECT_KINDS.contains(&kind) {
        return Err(RequestError::UnknownSubjectKind {
            kind: kind.to_string(),
        }
        .into());
    }
    let id: i64 = require_id("subject_id", id)?;
    let events: Vec<AuditEvent> = showroom
        .audit_trail(&Subject::new(kind, id))
        .map_err(translate_core_error)?;
    Ok(events.iter().map(AuditEventResponse::from).collect())
}
