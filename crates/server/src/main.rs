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
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use showroom::{Showroom, SystemClock};
use showroom_api::{
    ApiError, AuditEventResponse, AuthenticatedActor, BootstrapAdminRequest, CreateSaleRequest,
    CreateTestDriveRequest, CreateTransactionRequest, DeleteSaleResponse, ListSalesRequest,
    ListTestDrivesRequest, ListTransactionsRequest, ListVehiclesRequest, PartyResponse,
    RegisterPartyRequest, RescheduleTestDriveRequest, Role, SaleResponse,
    TestDriveFeedbackRequest, TestDriveResponse, TransactionResponse, UpdateSaleRequest,
    UpdateSaleStatusRequest, UpdateTransactionRequest, VehicleDetailsRequest, VehicleResponse,
    authenticate_stub,
};
use showroom_audit::Cause;
use showroom_persistence::{Persistence, PersistenceError};
use thiserror::Error;
use tracing::{error, info, warn};

/// Showroom Server - HTTP server for the Showroom dealership system
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// How long a write waits for another connection's lock, in milliseconds
    #[arg(long, default_value_t = 5000)]
    busy_timeout_ms: u64,
}

/// Reasons the server fails to start.
#[derive(Debug, Error)]
enum StartupError {
    #[error("failed to open database: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

type AppShowroom = Showroom<Persistence, SystemClock>;

/// Application state shared across handlers.
///
/// The store serialises units of work itself, so the showroom is shared
/// without an outer lock.
#[derive(Clone)]
struct AppState {
    showroom: Arc<AppShowroom>,
}

/// Who is calling and why. Present on every state-changing request.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct CommandContext {
    /// The party performing this action.
    actor_id: i64,
    /// The role the party claims.
    actor_role: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
}

impl CommandContext {
    fn cause(&self) -> Cause {
        Cause::new(self.cause_id.clone(), self.cause_description.clone())
    }
}

/// A request body: the command context plus the operation's own fields.
#[derive(Debug, Deserialize)]
struct Command<T> {
    #[serde(flatten)]
    context: CommandContext,
    #[serde(flatten)]
    request: T,
}

/// API request for bootstrapping the first administrator.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct BootstrapApiRequest {
    cause_id: String,
    cause_description: String,
    name: String,
    email: String,
}

/// Identity passed on read requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ActorQuery {
    actor_id: i64,
    actor_role: String,
}

/// Query for listing parties.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct ListPartiesQuery {
    role: Option<String>,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Machine-readable error category.
    kind: String,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error category.
    kind: &'static str,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            kind: self.kind.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let (status, kind) = match err {
            ApiError::AuthenticationFailed { .. } => {
                (StatusCode::UNAUTHORIZED, "authentication_failed")
            }
            ApiError::Unauthorized { .. } => (StatusCode::FORBIDDEN, "unauthorized"),
            ApiError::ResourceNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::InvalidState { .. } => (StatusCode::CONFLICT, "invalid_state"),
            ApiError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "invalid_input"),
            ApiError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };
        Self {
            status,
            kind,
            message: err.to_string(),
        }
    }
}

/// Parses a role string into a Role enum.
fn parse_role(role_str: &str) -> Result<Role, HttpError> {
    role_str.parse::<Role>().map_err(|_| HttpError {
        status: StatusCode::BAD_REQUEST,
        kind: "invalid_input",
        message: format!(
            "Invalid role: '{role_str}'. Must be 'admin', 'sales', 'cashier' or 'customer'"
        ),
    })
}

fn authenticate(
    showroom: &AppShowroom,
    actor_id: i64,
    actor_role: &str,
) -> Result<AuthenticatedActor, HttpError> {
    let role: Role = parse_role(actor_role)?;
    Ok(authenticate_stub(showroom, actor_id, role)?)
}

/// Runs store-bound work off the async executor.
///
/// Every workflow call takes the database write lock and may wait on the
/// busy timeout, so it must not run on a runtime worker thread.
async fn blocking<T, F>(app_state: &AppState, work: F) -> Result<T, HttpError>
where
    T: Send + 'static,
    F: FnOnce(&AppShowroom) -> Result<T, HttpError> + Send + 'static,
{
    let showroom: Arc<AppShowroom> = Arc::clone(&app_state.showroom);
    tokio::task::spawn_blocking(move || work(&showroom))
        .await
        .map_err(|err| {
            error!(error = %err, "Blocking task failed");
            HttpError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                kind: "internal",
                message: String::from("request task failed"),
            }
        })?
}

/// Runs a state-changing API call for an authenticated actor.
async fn command<T, R, F>(app_state: &AppState, body: Command<T>, work: F) -> Result<R, HttpError>
where
    T: Send + 'static,
    R: Send + 'static,
    F: FnOnce(&AppShowroom, T, &AuthenticatedActor, &Cause) -> Result<R, ApiError>
        + Send
        + 'static,
{
    blocking(app_state, move |showroom| {
        let actor: AuthenticatedActor =
            authenticate(showroom, body.context.actor_id, &body.context.actor_role)?;
        let cause: Cause = body.context.cause();
        Ok(work(showroom, body.request, &actor, &cause)?)
    })
    .await
}

/// Runs a read-only API call for an authenticated actor.
async fn query<R, F>(app_state: &AppState, actor: ActorQuery, work: F) -> Result<R, HttpError>
where
    R: Send + 'static,
    F: FnOnce(&AppShowroom, &AuthenticatedActor) -> Result<R, ApiError> + Send + 'static,
{
    blocking(app_state, move |showroom| {
        let actor: AuthenticatedActor = authenticate(showroom, actor.actor_id, &actor.actor_role)?;
        Ok(work(showroom, &actor)?)
    })
    .await
}

/// Wraps a context-only body so action endpoints share [`command`].
fn bare(context: CommandContext) -> Command<()> {
    Command {
        context,
        request: (),
    }
}

// ---------------------------------------------------------------------------
// Parties
// ---------------------------------------------------------------------------

/// Handler for POST `/bootstrap`.
///
/// Registers the first administrator. Fails once one exists.
async fn handle_bootstrap(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<BootstrapApiRequest>,
) -> Result<(StatusCode, Json<PartyResponse>), HttpError> {
    info!(email = %req.email, "Handling bootstrap request");

    let party: PartyResponse = blocking(&app_state, move |showroom| {
        let cause = Cause::new(req.cause_id, req.cause_description);
        let request = BootstrapAdminRequest {
            name: req.name,
            email: req.email,
        };
        Ok(showroom_api::bootstrap_admin(showroom, &request, &cause)?)
    })
    .await?;

    info!(party_id = party.party_id, "Bootstrapped administrator");
    Ok((StatusCode::CREATED, Json(party)))
}

/// Handler for POST `/parties`.
async fn handle_register_party(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Command<RegisterPartyRequest>>,
) -> Result<(StatusCode, Json<PartyResponse>), HttpError> {
    info!(
        actor_id = req.context.actor_id,
        role = %req.request.role,
        "Handling register_party request"
    );
    let party: PartyResponse = command(&app_state, req, showroom_api::register_party).await?;
    Ok((StatusCode::CREATED, Json(party)))
}

/// Handler for GET `/parties`.
async fn handle_list_parties(
    AxumState(app_state): AxumState<AppState>,
    Query(actor): Query<ActorQuery>,
    Query(filter): Query<ListPartiesQuery>,
) -> Result<Json<Vec<PartyResponse>>, HttpError> {
    let parties = query(&app_state, actor, move |showroom, actor| {
        showroom_api::list_parties(showroom, filter.role.as_deref(), actor)
    })
    .await?;
    Ok(Json(parties))
}

/// Handler for POST `/parties/{id}/deactivate`.
async fn handle_deactivate_party(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Json(context): Json<CommandContext>,
) -> Result<Json<PartyResponse>, HttpError> {
    info!(party_id = id, "Handling deactivate_party request");
    let party = command(&app_state, bare(context), move |showroom, (), actor, cause| {
        showroom_api::deactivate_party(showroom, id, actor, cause)
    })
    .await?;
    Ok(Json(party))
}

// ---------------------------------------------------------------------------
// Vehicles
// ---------------------------------------------------------------------------

/// Handler for POST `/vehicles`.
async fn handle_register_vehicle(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Command<VehicleDetailsRequest>>,
) -> Result<(StatusCode, Json<VehicleResponse>), HttpError> {
    info!(
        actor_id = req.context.actor_id,
        vin = %req.request.vin,
        "Handling register_vehicle request"
    );
    let vehicle: VehicleResponse =
        command(&app_state, req, showroom_api::register_vehicle).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// Handler for GET `/vehicles`.
async fn handle_list_vehicles(
    AxumState(app_state): AxumState<AppState>,
    Query(actor): Query<ActorQuery>,
    Query(filter): Query<ListVehiclesRequest>,
) -> Result<Json<Vec<VehicleResponse>>, HttpError> {
    let vehicles = query(&app_state, actor, move |showroom, actor| {
        showroom_api::list_vehicles(showroom, &filter, actor)
    })
    .await?;
    Ok(Json(vehicles))
}

/// Handler for GET `/vehicles/{id}`.
async fn handle_get_vehicle(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Query(actor): Query<ActorQuery>,
) -> Result<Json<VehicleResponse>, HttpError> {
    let vehicle = query(&app_state, actor, move |showroom, actor| {
        showroom_api::get_vehicle(showroom, id, actor)
    })
    .await?;
    Ok(Json(vehicle))
}

/// Handler for PUT `/vehicles/{id}`.
async fn handle_update_vehicle(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<Command<VehicleDetailsRequest>>,
) -> Result<Json<VehicleResponse>, HttpError> {
    info!(vehicle_id = id, "Handling update_vehicle request");
    let vehicle = command(&app_state, req, move |showroom, request, actor, cause| {
        showroom_api::update_vehicle(showroom, id, request, actor, cause)
    })
    .await?;
    Ok(Json(vehicle))
}

/// Handler for POST `/vehicles/{id}/remove`.
async fn handle_remove_vehicle(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Json(context): Json<CommandContext>,
) -> Result<Json<VehicleResponse>, HttpError> {
    info!(vehicle_id = id, "Handling remove_vehicle request");
    let vehicle = command(&app_state, bare(context), move |showroom, (), actor, cause| {
        showroom_api::remove_vehicle(showroom, id, actor, cause)
    })
    .await?;
    Ok(Json(vehicle))
}

/// Handler for POST `/vehicles/{id}/service`.
async fn handle_send_to_service(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Json(context): Json<CommandContext>,
) -> Result<Json<VehicleResponse>, HttpError> {
    let vehicle = command(&app_state, bare(context), move |showroom, (), actor, cause| {
        showroom_api::send_vehicle_to_service(showroom, id, actor, cause)
    })
    .await?;
    Ok(Json(vehicle))
}

/// Handler for POST `/vehicles/{id}/return`.
async fn handle_return_from_service(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Json(context): Json<CommandContext>,
) -> Result<Json<VehicleResponse>, HttpError> {
    let vehicle = command(&app_state, bare(context), move |showroom, (), actor, cause| {
        showroom_api::return_vehicle_from_service(showroom, id, actor, cause)
    })
    .await?;
    Ok(Json(vehicle))
}

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

/// Handler for POST `/sales`.
async fn handle_create_sale(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Command<CreateSaleRequest>>,
) -> Result<(StatusCode, Json<SaleResponse>), HttpError> {
    info!(
        actor_id = req.context.actor_id,
        vehicle_id = req.request.vehicle_id,
        customer_id = req.request.customer_id,
        "Handling create_sale request"
    );
    let sale: SaleResponse = command(&app_state, req, showroom_api::create_sale).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// Handler for GET `/sales`.
async fn handle_list_sales(
    AxumState(app_state): AxumState<AppState>,
    Query(actor): Query<ActorQuery>,
    Query(filter): Query<ListSalesRequest>,
) -> Result<Json<Vec<SaleResponse>>, HttpError> {
    let sales = query(&app_state, actor, move |showroom, actor| {
        showroom_api::list_sales(showroom, &filter, actor)
    })
    .await?;
    Ok(Json(sales))
}

/// Handler for GET `/sales/{id}`.
async fn handle_get_sale(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Query(actor): Query<ActorQuery>,
) -> Result<Json<SaleResponse>, HttpError> {
    let sale = query(&app_state, actor, move |showroom, actor| {
        showroom_api::get_sale(showroom, id, actor)
    })
    .await?;
    Ok(Json(sale))
}

/// Handler for PUT `/sales/{id}`.
async fn handle_update_sale(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<Command<UpdateSaleRequest>>,
) -> Result<Json<SaleResponse>, HttpError> {
    let sale = command(&app_state, req, move |showroom, request, actor, cause| {
        showroom_api::update_sale(showroom, id, request, actor, cause)
    })
    .await?;
    Ok(Json(sale))
}

/// Handler for POST `/sales/{id}/status`.
async fn handle_update_sale_status(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<Command<UpdateSaleStatusRequest>>,
) -> Result<Json<SaleResponse>, HttpError> {
    info!(
        sale_id = id,
        status = %req.request.status,
        "Handling update_sale_status request"
    );
    let sale = command(&app_state, req, move |showroom, request, actor, cause| {
        showroom_api::update_sale_status(showroom, id, &request, actor, cause)
    })
    .await?;
    Ok(Json(sale))
}

/// Handler for POST `/sales/{id}/delete`.
async fn handle_delete_sale(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Json(context): Json<CommandContext>,
) -> Result<Json<DeleteSaleResponse>, HttpError> {
    info!(sale_id = id, "Handling delete_sale request");
    let deleted = command(&app_state, bare(context), move |showroom, (), actor, cause| {
        showroom_api::delete_sale(showroom, id, actor, cause)
    })
    .await?;
    Ok(Json(deleted))
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Handler for POST `/transactions`.
async fn handle_create_transaction(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Command<CreateTransactionRequest>>,
) -> Result<(StatusCode, Json<TransactionResponse>), HttpError> {
    info!(
        actor_id = req.context.actor_id,
        sale_id = req.request.sale_id,
        "Handling create_transaction request"
    );
    let transaction: TransactionResponse =
        command(&app_state, req, showroom_api::create_transaction).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Handler for GET `/transactions`.
async fn handle_list_transactions(
    AxumState(app_state): AxumState<AppState>,
    Query(actor): Query<ActorQuery>,
    Query(filter): Query<ListTransactionsRequest>,
) -> Result<Json<Vec<TransactionResponse>>, HttpError> {
    let transactions = query(&app_state, actor, move |showroom, actor| {
        showroom_api::list_transactions(showroom, &filter, actor)
    })
    .await?;
    Ok(Json(transactions))
}

/// Handler for GET `/transactions/{id}`.
async fn handle_get_transaction(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Query(actor): Query<ActorQuery>,
) -> Result<Json<TransactionResponse>, HttpError> {
    let transaction = query(&app_state, actor, move |showroom, actor| {
        showroom_api::get_transaction(showroom, id, actor)
    })
    .await?;
    Ok(Json(transaction))
}

/// Handler for PUT `/transactions/{id}`.
async fn handle_update_transaction(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<Command<UpdateTransactionRequest>>,
) -> Result<Json<TransactionResponse>, HttpError> {
    let transaction = command(&app_state, req, move |showroom, request, actor, cause| {
        showroom_api::update_transaction(showroom, id, request, actor, cause)
    })
    .await?;
    Ok(Json(transaction))
}

/// Handler for POST `/transactions/{id}/process`.
async fn handle_process_transaction(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Json(context): Json<CommandContext>,
) -> Result<Json<TransactionResponse>, HttpError> {
    info!(transaction_id = id, "Handling process_transaction request");
    let transaction = command(&app_state, bare(context), move |showroom, (), actor, cause| {
        showroom_api::process_transaction(showroom, id, actor, cause)
    })
    .await?;
    Ok(Json(transaction))
}

/// Handler for POST `/transactions/{id}/refund`.
async fn handle_refund_transaction(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Json(context): Json<CommandContext>,
) -> Result<Json<TransactionResponse>, HttpError> {
    info!(transaction_id = id, "Handling refund_transaction request");
    let transaction = command(&app_state, bare(context), move |showroom, (), actor, cause| {
        showroom_api::refund_transaction(showroom, id, actor, cause)
    })
    .await?;
    Ok(Json(transaction))
}

// ---------------------------------------------------------------------------
// Test drives
// ---------------------------------------------------------------------------

/// Handler for POST `/test_drives`.
async fn handle_create_test_drive(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Command<CreateTestDriveRequest>>,
) -> Result<(StatusCode, Json<TestDriveResponse>), HttpError> {
    info!(
        actor_id = req.context.actor_id,
        vehicle_id = req.request.vehicle_id,
        "Handling create_test_drive request"
    );
    let booking: TestDriveResponse =
        command(&app_state, req, showroom_api::create_test_drive).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Handler for GET `/test_drives`.
async fn handle_list_test_drives(
    AxumState(app_state): AxumState<AppState>,
    Query(actor): Query<ActorQuery>,
    Query(filter): Query<ListTestDrivesRequest>,
) -> Result<Json<Vec<TestDriveResponse>>, HttpError> {
    let bookings = query(&app_state, actor, move |showroom, actor| {
        showroom_api::list_test_drives(showroom, &filter, actor)
    })
    .await?;
    Ok(Json(bookings))
}

/// Handler for GET `/test_drives/{id}`.
async fn handle_get_test_drive(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Query(actor): Query<ActorQuery>,
) -> Result<Json<TestDriveResponse>, HttpError> {
    let booking = query(&app_state, actor, move |showroom, actor| {
        showroom_api::get_test_drive(showroom, id, actor)
    })
    .await?;
    Ok(Json(booking))
}

/// Handler for POST `/test_drives/{id}/reschedule`.
async fn handle_reschedule_test_drive(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<Command<RescheduleTestDriveRequest>>,
) -> Result<Json<TestDriveResponse>, HttpError> {
    let booking = command(&app_state, req, move |showroom, request, actor, cause| {
        showroom_api::reschedule_test_drive(showroom, id, &request, actor, cause)
    })
    .await?;
    Ok(Json(booking))
}

/// Handler for POST `/test_drives/{id}/approve`.
async fn handle_approve_test_drive(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Json(context): Json<CommandContext>,
) -> Result<Json<TestDriveResponse>, HttpError> {
    let booking = command(&app_state, bare(context), move |showroom, (), actor, cause| {
        showroom_api::approve_test_drive(showroom, id, actor, cause)
    })
    .await?;
    Ok(Json(booking))
}

/// Handler for POST `/test_drives/{id}/complete`.
async fn handle_complete_test_drive(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Json(context): Json<CommandContext>,
) -> Result<Json<TestDriveResponse>, HttpError> {
    let booking = command(&app_state, bare(context), move |showroom, (), actor, cause| {
        showroom_api::complete_test_drive(showroom, id, actor, cause)
    })
    .await?;
    Ok(Json(booking))
}

/// Handler for POST `/test_drives/{id}/cancel`.
async fn handle_cancel_test_drive(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Json(context): Json<CommandContext>,
) -> Result<Json<TestDriveResponse>, HttpError> {
    let booking = command(&app_state, bare(context), move |showroom, (), actor, cause| {
        showroom_api::cancel_test_drive(showroom, id, actor, cause)
    })
    .await?;
    Ok(Json(booking))
}

/// Handler for POST `/test_drives/{id}/feedback`.
async fn handle_test_drive_feedback(
    AxumState(app_state): AxumState<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<Command<TestDriveFeedbackRequest>>,
) -> Result<Json<TestDriveResponse>, HttpError> {
    let booking = command(&app_state, req, move |showroom, request, actor, cause| {
        showroom_api::record_test_drive_feedback(showroom, id, request, actor, cause)
    })
    .await?;
    Ok(Json(booking))
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// Handler for GET `/audit/{kind}/{id}`.
///
/// Returns the audit trail of one entity, oldest first.
async fn handle_audit_trail(
    AxumState(app_state): AxumState<AppState>,
    Path((kind, id)): Path<(String, i64)>,
    Query(actor): Query<ActorQuery>,
) -> Result<Json<Vec<AuditEventResponse>>, HttpError> {
    let events = query(&app_state, actor, move |showroom, actor| {
        showroom_api::audit_trail(showroom, &kind, id, actor)
    })
    .await?;
    Ok(Json(events))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/bootstrap", post(handle_bootstrap))
        .route(
            "/parties",
            post(handle_register_party).get(handle_list_parties),
        )
        .route("/parties/{id}/deactivate", post(handle_deactivate_party))
        .route(
            "/vehicles",
            post(handle_register_vehicle).get(handle_list_vehicles),
        )
        .route(
            "/vehicles/{id}",
            get(handle_get_vehicle).put(handle_update_vehicle),
        )
        .route("/vehicles/{id}/remove", post(handle_remove_vehicle))
        .route("/vehicles/{id}/service", post(handle_send_to_service))
        .route("/vehicles/{id}/return", post(handle_return_from_service))
        .route("/sales", post(handle_create_sale).get(handle_list_sales))
        .route("/sales/{id}", get(handle_get_sale).put(handle_update_sale))
        .route("/sales/{id}/status", post(handle_update_sale_status))
        .route("/sales/{id}/delete", post(handle_delete_sale))
        .route(
            "/transactions",
            post(handle_create_transaction).get(handle_list_transactions),
        )
        .route(
            "/transactions/{id}",
            get(handle_get_transaction).put(handle_update_transaction),
        )
        .route(
            "/transactions/{id}/process",
            post(handle_process_transaction),
        )
        .route("/transactions/{id}/refund", post(handle_refund_transaction))
        .route(
            "/test_drives",
            post(handle_create_test_drive).get(handle_list_test_drives),
        )
        .route("/test_drives/{id}", get(handle_get_test_drive))
        .route(
            "/test_drives/{id}/reschedule",
            post(handle_reschedule_test_drive),
        )
        .route("/test_drives/{id}/approve", post(handle_approve_test_drive))
        .route(
            "/test_drives/{id}/complete",
            post(handle_complete_test_drive),
        )
        .route("/test_drives/{id}/cancel", post(handle_cancel_test_drive))
        .route(
            "/test_drives/{id}/feedback",
            post(handle_test_drive_feedback),
        )
        .route("/audit/{kind}/{id}", get(handle_audit_trail))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Showroom Server");

    // Initialize persistence (in-memory or file-based based on CLI argument)
    let busy_timeout: Duration = Duration::from_millis(args.busy_timeout_ms);
    let persistence: Persistence = if let Some(db_path) = &args.database {
        info!(
            busy_timeout_ms = args.busy_timeout_ms,
            "Using file-based database at: {}", db_path
        );
        Persistence::new_with_file_and_busy_timeout(db_path, busy_timeout)?
    } else {
        warn!("Using in-memory database; all data is lost on shutdown");
        Persistence::new_in_memory()?
    };

    let app_state: AppState = AppState {
        showroom: Arc::new(Showroom::new(persistence, SystemClock)),
    };

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    /// Helper to create test app state with in-memory persistence.
    fn create_test_app_state() -> AppState {
        let persistence: Persistence =
            Persistence::new_in_memory().expect("Failed to create in-memory persistence");
        AppState {
            showroom: Arc::new(Showroom::new(persistence, SystemClock)),
        }
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap()
        };
        (status, value)
    }

    /// Merges the actor and cause fields into a request body.
    fn as_actor(actor_id: i64, role: &str, mut body: Value) -> Value {
        let fields = body.as_object_mut().unwrap();
        fields.insert(String::from("actor_id"), json!(actor_id));
        fields.insert(String::from("actor_role"), json!(role));
        fields.insert(String::from("cause_id"), json!("test-cause"));
        fields.insert(String::from("cause_description"), json!("HTTP test"));
        body
    }

    struct Staff {
        admin: i64,
        sales: i64,
        cashier: i64,
        customer: i64,
    }

    async fn bootstrap(app: &Router) -> Staff {
        let (status, admin) = send(
            app,
            "POST",
            "/bootstrap",
            Some(json!({
                "cause_id": "setup",
                "cause_description": "First run",
                "name": "Avery Admin",
                "email": "admin@showroom.test",
            })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::CREATED);
        let admin: i64 = admin["party_id"].as_i64().unwrap();

        let mut ids = Vec::new();
        for (name, email, role) in [
            ("Sam Sales", "sam@showroom.test", "sales"),
            ("Cass Cashier", "cass@showroom.test", "cashier"),
            ("Casey Customer", "casey@example.com", "customer"),
        ] {
            let (status, party) = send(
                app,
                "POST",
                "/parties",
                Some(as_actor(
                    admin,
                    "admin",
                    json!({ "name": name, "email": email, "role": role }),
                )),
            )
            .await;
            assert_eq!(status, HttpStatusCode::CREATED);
            ids.push(party["party_id"].as_i64().unwrap());
        }

        Staff {
            admin,
            sales: ids[0],
            cashier: ids[1],
            customer: ids[2],
        }
    }

    fn vehicle_body(vin: &str) -> Value {
        json!({
            "make": "Mazda",
            "model": "CX-5",
            "year": 2024,
            "vin": vin,
            "color": "Red",
            "license_plate": null,
            "price_cents": 3_100_000,
            "mileage": 120,
            "description": null,
        })
    }

    async fn register_vehicle(app: &Router, staff: &Staff, vin: &str) -> i64 {
        let (status, vehicle) = send(
            app,
            "POST",
            "/vehicles",
            Some(as_actor(staff.sales, "sales", vehicle_body(vin))),
        )
        .await;
        assert_eq!(status, HttpStatusCode::CREATED);
        vehicle["vehicle_id"].as_i64().unwrap()
    }

    #[test]
    fn test_cli_defaults() {
        let args = Args::try_parse_from(["showroom-server"]).unwrap();
        assert_eq!(args.port, 8080);
        assert_eq!(args.busy_timeout_ms, 5000);
        assert_eq!(args.bind, "127.0.0.1");
        assert!(args.database.is_none());
    }

    #[tokio::test]
    async fn test_purchase_and_refund_over_http() {
        let app: Router = build_router(create_test_app_state());
        let staff = bootstrap(&app).await;
        let vehicle_id = register_vehicle(&app, &staff, "JM3KFBCM1R0000001").await;

        let (status, sale) = send(
            &app,
            "POST",
            "/sales",
            Some(as_actor(
                staff.sales,
                "sales",
                json!({
                    "vehicle_id": vehicle_id,
                    "customer_id": staff.customer,
                    "sales_person_id": null,
                    "sale_price_cents": 3_000_000,
                    "notes": null,
                }),
            )),
        )
        .await;
        assert_eq!(status, HttpStatusCode::CREATED);
        let sale_id = sale["sale_id"].as_i64().unwrap();

        let (status, sale) = send(
            &app,
            "POST",
            &format!("/sales/{sale_id}/status"),
            Some(as_actor(staff.sales, "sales", json!({ "status": "approved" }))),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(sale["status"], "approved");

        let (status, payment) = send(
            &app,
            "POST",
            "/transactions",
            Some(as_actor(
                staff.cashier,
                "cashier",
                json!({
                    "sale_id": sale_id,
                    "amount_cents": 3_000_000,
                    "payment_method": "bank_transfer",
                    "notes": null,
                }),
            )),
        )
        .await;
        assert_eq!(status, HttpStatusCode::CREATED);
        let transaction_id = payment["transaction_id"].as_i64().unwrap();

        let (status, processed) = send(
            &app,
            "POST",
            &format!("/transactions/{transaction_id}/process"),
            Some(as_actor(staff.cashier, "cashier", json!({}))),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(processed["status"], "completed");

        let (_, vehicle) = send(
            &app,
            "GET",
            &format!(
                "/vehicles/{vehicle_id}?actor_id={}&actor_role=customer",
                staff.customer
            ),
            None,
        )
        .await;
        assert_eq!(vehicle["status"], "sold");

        // Cashiers may not refund.
        let (status, error) = send(
            &app,
            "POST",
            &format!("/transactions/{transaction_id}/refund"),
            Some(as_actor(staff.cashier, "cashier", json!({}))),
        )
        .await;
        assert_eq!(status, HttpStatusCode::FORBIDDEN);
        assert_eq!(error["kind"], "unauthorized");

        let (status, refunded) = send(
            &app,
            "POST",
            &format!("/transactions/{transaction_id}/refund"),
            Some(as_actor(staff.admin, "admin", json!({}))),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(refunded["status"], "refunded");

        let (_, vehicle) = send(
            &app,
            "GET",
            &format!(
                "/vehicles/{vehicle_id}?actor_id={}&actor_role=customer",
                staff.customer
            ),
            None,
        )
        .await;
        assert_eq!(vehicle["status"], "available");

        let (status, trail) = send(
            &app,
            "GET",
            &format!(
                "/audit/transaction/{transaction_id}?actor_id={}&actor_role=admin",
                staff.admin
            ),
            None,
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        let actions: Vec<&str> = trail
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["action_name"].as_str().unwrap())
            .collect();
        assert_eq!(
            actions,
            vec![
                "CreateTransaction",
                "ProcessTransaction",
                "RefundTransaction"
            ]
        );
    }

    #[tokio::test]
    async fn test_authentication_failures() {
        let app: Router = build_router(create_test_app_state());
        let staff = bootstrap(&app).await;

        // The claimed role must match the directory.
        let (status, error) = send(
            &app,
            "POST",
            "/vehicles",
            Some(as_actor(staff.customer, "sales", vehicle_body("JM3KFBCM1R0000002"))),
        )
        .await;
        assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
        assert_eq!(error["kind"], "authentication_failed");

        let (status, _) = send(
            &app,
            "POST",
            "/vehicles",
            Some(as_actor(staff.sales, "mechanic", vehicle_body("JM3KFBCM1R0000002"))),
        )
        .await;
        assert_eq!(status, HttpStatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "GET",
            "/vehicles?actor_id=999&actor_role=customer",
            None,
        )
        .await;
        assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unauthorized_action_does_not_mutate_state() {
        let app: Router = build_router(create_test_app_state());
        let staff = bootstrap(&app).await;

        let (status, _) = send(
            &app,
            "POST",
            "/vehicles",
            Some(as_actor(
                staff.cashier,
                "cashier",
                vehicle_body("JM3KFBCM1R0000003"),
            )),
        )
        .await;
        assert_eq!(status, HttpStatusCode::FORBIDDEN);

        let (status, vehicles) = send(
            &app,
            "GET",
            &format!(
                "/vehicles?actor_id={}&actor_role=admin&include_removed=true",
                staff.admin
            ),
            None,
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(vehicles.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_deactivated_party_cannot_authenticate() {
        let app: Router = build_router(create_test_app_state());
        let staff = bootstrap(&app).await;
        let uri: String = format!("/parties/{}/deactivate", staff.customer);

        let (status, _) = send(
            &app,
            "POST",
            &uri,
            Some(as_actor(staff.sales, "sales", json!({}))),
        )
        .await;
        assert_eq!(status, HttpStatusCode::FORBIDDEN);

        let (status, party) = send(
            &app,
            "POST",
            &uri,
            Some(as_actor(staff.admin, "admin", json!({}))),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(party["active"], false);

        let (status, error) = send(
            &app,
            "GET",
            &format!("/vehicles?actor_id={}&actor_role=customer", staff.customer),
            None,
        )
        .await;
        assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
        assert_eq!(error["kind"], "authentication_failed");
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let app: Router = build_router(create_test_app_state());
        let staff = bootstrap(&app).await;
        let vehicle_id = register_vehicle(&app, &staff, "JM3KFBCM1R0000004").await;

        let (status, error) = send(
            &app,
            "GET",
            &format!("/sales/4242?actor_id={}&actor_role=admin", staff.admin),
            None,
        )
        .await;
        assert_eq!(status, HttpStatusCode::NOT_FOUND);
        assert_eq!(error["kind"], "not_found");

        // Duplicate VIN.
        let (status, error) = send(
            &app,
            "POST",
            "/vehicles",
            Some(as_actor(staff.sales, "sales", vehicle_body("JM3KFBCM1R0000004"))),
        )
        .await;
        assert_eq!(status, HttpStatusCode::CONFLICT);
        assert_eq!(error["kind"], "conflict");

        // Returning a vehicle that is not in service.
        let (status, error) = send(
            &app,
            "POST",
            &format!("/vehicles/{vehicle_id}/return"),
            Some(as_actor(staff.sales, "sales", json!({}))),
        )
        .await;
        assert_eq!(status, HttpStatusCode::CONFLICT);
        assert_eq!(error["kind"], "invalid_state");

        let (status, error) = send(
            &app,
            "POST",
            "/sales",
            Some(as_actor(
                staff.sales,
                "sales",
                json!({
                    "vehicle_id": vehicle_id,
                    "customer_id": staff.customer,
                    "sales_person_id": null,
                    "sale_price_cents": -5,
                    "notes": null,
                }),
            )),
        )
        .await;
        assert_eq!(status, HttpStatusCode::BAD_REQUEST);
        assert_eq!(error["kind"], "invalid_input");

        // A second bootstrap is refused.
        let (status, _) = send(
            &app,
            "POST",
            "/bootstrap",
            Some(json!({
                "cause_id": "again",
                "cause_description": "Second run",
                "name": "Other Admin",
                "email": "other@showroom.test",
            })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_test_drive_conflict_over_http() {
        let app: Router = build_router(create_test_app_state());
        let staff = bootstrap(&app).await;
        let vehicle_id = register_vehicle(&app, &staff, "JM3KFBCM1R0000005").await;

        let book = |time: &str| {
            as_actor(
                staff.customer,
                "customer",
                json!({
                    "vehicle_id": vehicle_id,
                    "customer_id": null,
                    "scheduled_time": time,
                    "notes": null,
                }),
            )
        };

        let (status, booking) = send(
            &app,
            "POST",
            "/test_drives",
            Some(book("2099-06-01T10:00:00Z")),
        )
        .await;
        assert_eq!(status, HttpStatusCode::CREATED);
        assert_eq!(booking["customer_id"], staff.customer);

        let (status, error) = send(
            &app,
            "POST",
            "/test_drives",
            Some(book("2099-06-01T11:30:00Z")),
        )
        .await;
        assert_eq!(status, HttpStatusCode::CONFLICT);
        assert_eq!(error["kind"], "conflict");

        let (status, _) = send(
            &app,
            "POST",
            "/test_drives",
            Some(book("2099-06-01T13:00:00Z")),
        )
        .await;
        assert_eq!(status, HttpStatusCode::CREATED);

        let (status, mine) = send(
            &app,
            "GET",
            &format!(
                "/test_drives?actor_id={}&actor_role=customer",
                staff.customer
            ),
            None,
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(mine.as_array().unwrap().len(), 2);
    }
}
