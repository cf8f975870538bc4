// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.

use showroom::{Clock, ErrorKind, Showroom, WorkflowStore};
use showroom_audit::Actor;
use showroom_domain::{Party, PartyId, Role, TestDrive};

use crate::error::{ApiError, AuthError};

/// An authenticated party with the role it acts under.
///
/// Staff roles (admin, sales, cashier) act on behalf of the dealership;
/// customers act only on their own bookings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The party performing the request.
    pub id: PartyId,
    /// The role assigned to this party.
    pub role: Role,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    #[must_use]
    pub const fn new(id: PartyId, role: Role) -> Self {
        Self { id, role }
    }

    /// Converts this authenticated actor into an audit Actor.
    ///
    /// This is used when recording audit events to attribute actions
    /// to the authenticated party.
    #[must_use]
    pub fn to_audit_actor(&self) -> Actor {
        Actor::new(self.id.to_string(), self.role.as_str().to_string())
    }
}

/// Every operation the API gates on role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RegisterParty,
    DeactivateParty,
    ListParties,
    RegisterVehicle,
    UpdateVehicle,
    ServiceVehicle,
    RemoveVehicle,
    ReadVehicles,
    CreateSale,
    UpdateSale,
    DeleteSale,
    ReadSales,
    CreateTransaction,
    UpdateTransaction,
    ProcessTransaction,
    RefundTransaction,
    ReadTransactions,
    CreateTestDrive,
    ManageTestDrive,
    CancelTestDrive,
    ReadTestDrives,
    ReadAuditTrail,
}

const ANY: &[Role] = &[Role::Admin, Role::Sales, Role::Cashier, Role::Customer];
const ADMIN: &[Role] = &[Role::Admin];
const ADMIN_SALES: &[Role] = &[Role::Admin, Role::Sales];
const ADMIN_CASHIER: &[Role] = &[Role::Admin, Role::Cashier];
const STAFF: &[Role] = &[Role::Admin, Role::Sales, Role::Cashier];

impl Operation {
    /// The action name reported when authorization fails.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RegisterParty => "register_party",
            Self::DeactivateParty => "deactivate_party",
            Self::ListParties => "list_parties",
            Self::RegisterVehicle => "register_vehicle",
            Self::UpdateVehicle => "update_vehicle",
            Self::ServiceVehicle => "service_vehicle",
            Self::RemoveVehicle => "remove_vehicle",
            Self::ReadVehicles => "read_vehicles",
            Self::CreateSale => "create_sale",
            Self::UpdateSale => "update_sale",
            Self::DeleteSale => "delete_sale",
            Self::ReadSales => "read_sales",
            Self::CreateTransaction => "create_transaction",
            Self::UpdateTransaction => "update_transaction",
            Self::ProcessTransaction => "process_transaction",
            Self::RefundTransaction => "refund_transaction",
            Self::ReadTransactions => "read_transactions",
            Self::CreateTestDrive => "create_test_drive",
            Self::ManageTestDrive => "manage_test_drive",
            Self::CancelTestDrive => "cancel_test_drive",
            Self::ReadTestDrives => "read_test_drives",
            Self::ReadAuditTrail => "read_audit_trail",
        }
    }

    /// Roles that may perform the operation on any record.
    ///
    /// Customers are additionally allowed to book, cancel and read their own
    /// test drives; see [`AuthorizationService`].
    #[must_use]
    pub const fn allowed_roles(self) -> &'static [Role] {
        match self {
            Self::RegisterParty
            | Self::DeactivateParty
            | Self::ListParties
            | Self::RemoveVehicle
            | Self::DeleteSale
            | Self::RefundTransaction
            | Self::ReadAuditTrail => ADMIN,
            Self::RegisterVehicle
            | Self::UpdateVehicle
            | Self::ServiceVehicle
            | Self::CreateSale
            | Self::UpdateSale
            | Self::ManageTestDrive
            | Self::CancelTestDrive
            | Self::ReadTestDrives => ADMIN_SALES,
            Self::CreateTransaction | Self::UpdateTransaction | Self::ProcessTransaction => {
                ADMIN_CASHIER
            }
            Self::ReadSales => STAFF,
            Self::ReadTransactions => ADMIN_CASHIER,
            Self::ReadVehicles | Self::CreateTestDrive => ANY,
        }
    }
}

fn describe(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<&str>>()
        .join(" or ")
}

/// Authorization service for enforcing role-based access control.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Checks that the actor's role appears in the operation's role list.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` naming the required roles.
    pub fn authorize(actor: &AuthenticatedActor, operation: Operation) -> Result<(), AuthError> {
        let roles: &[Role] = operation.allowed_roles();
        if roles.contains(&actor.role) {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                action: operation.name().to_string(),
                required_role: describe(roles),
            })
        }
    }

    /// Checks that the actor may book a test drive for `customer`.
    ///
    /// Staff may book for anyone; customers only for themselves.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` if a customer books for someone else.
    pub fn authorize_book_test_drive(
        actor: &AuthenticatedActor,
        customer: PartyId,
    ) -> Result<(), AuthError> {
        Self::authorize(actor, Operation::CreateTestDrive)?;
        if actor.role == Role::Customer && actor.id != customer {
            return Err(AuthError::Unauthorized {
                action: String::from("create_test_drive_for_other_customer"),
                required_role: describe(STAFF),
            });
        }
        Ok(())
    }

    /// Checks that the actor may cancel `booking`.
    ///
    /// Admin and sales staff may cancel any booking; a customer may cancel
    /// their own.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` otherwise.
    pub fn authorize_cancel_test_drive(
        actor: &AuthenticatedActor,
        booking: &TestDrive,
    ) -> Result<(), AuthError> {
        if actor.role == Role::Customer && actor.id == booking.customer_id {
            return Ok(());
        }
        Self::authorize(actor, Operation::CancelTestDrive)
    }

    /// Checks that the actor may read `booking`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` for customers reading another
    /// customer's booking, and for cashiers.
    pub fn authorize_read_test_drive(
        actor: &AuthenticatedActor,
        booking: &TestDrive,
    ) -> Result<(), AuthError> {
        if actor.role == Role::Customer && actor.id == booking.customer_id {
            return Ok(());
        }
        Self::authorize(actor, Operation::ReadTestDrives)
    }
}

/// Resolves the claimed identity against the party directory.
///
/// This is a stub: the caller names a party and a role, and the claim is
/// accepted if the party exists, is active and holds exactly that role.
/// No credential is checked.
///
/// # Errors
///
/// Returns `ApiError::AuthenticationFailed` if the party is unknown, inactive
/// or holds a different role, and `ApiError::Internal` if the directory
/// cannot be read.
pub fn authenticate_stub<S: WorkflowStore, C: Clock>(
    showroom: &Showroom<S, C>,
    party_id: i64,
    claimed_role: Role,
) -> Result<AuthenticatedActor, ApiError> {
    let party: Party = match showroom.parties().get(PartyId::new(party_id)) {
        Ok(party) => party,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(AuthError::AuthenticationFailed {
                reason: format!("unknown party {party_id}"),
            }
            .into());
        }
        Err(err) => {
            return Err(ApiError::Internal {
                message: err.to_string(),
            });
        }
    };

    if !party.active {
        return Err(AuthError::AuthenticationFailed {
            reason: format!("party {party_id} is inactive"),
        }
        .into());
    }
    if party.role != claimed_role {
        return Err(AuthError::AuthenticationFailed {
            reason: format!(
                "party {party_id} does not hold the {} role",
                claimed_role.as_str()
            ),
        }
        .into());
    }

    Ok(AuthenticatedActor::new(party.id, party.role))
}
