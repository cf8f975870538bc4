// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use showroom::CoreError;
use showroom_domain::DomainError;

use crate::request_response::RequestError;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role (or roles) required for this action.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed - the actor does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The entity is not in a state that permits the operation.
    InvalidState {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// Another writer got there first, or a unique value is taken.
    ///
    /// The whole request may be retried.
    Conflict {
        /// A human-readable description of the conflict.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::InvalidState { rule, message } => {
                write!(f, "Invalid state ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::Conflict { message } => write!(f, "Conflict: {message}"),
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        Self::InvalidInput {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

fn not_found(resource_type: &str, message: String) -> ApiError {
    ApiError::ResourceNotFound {
        resource_type: resource_type.to_string(),
        message,
    }
}

fn invalid_state(rule: &str, message: String) -> ApiError {
    ApiError::InvalidState {
        rule: rule.to_string(),
        message,
    }
}

fn invalid_input(field: &str, message: String) -> ApiError {
    ApiError::InvalidInput {
        field: field.to_string(),
        message,
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let message: String = err.to_string();
    match err {
        DomainError::VehicleNotFound(_) => not_found("Vehicle", message),
        DomainError::SaleNotFound(_) => not_found("Sale", message),
        DomainError::TransactionNotFound(_) => not_found("Transaction", message),
        DomainError::TestDriveNotFound(_) => not_found("Test drive", message),
        DomainError::PartyNotFound(_) | DomainError::PartyRoleMismatch { .. } => {
            not_found("Party", message)
        }
        DomainError::AdminAlreadyExists => invalid_state("single_bootstrap", message),
        DomainError::LastActiveAdmin(_) => invalid_state("active_admin_required", message),
        DomainError::VehicleNotAvailable { .. } => invalid_state("vehicle_available", message),
        DomainError::VehicleNotRemovable { .. } => invalid_state("vehicle_removable", message),
        DomainError::InvalidStatusTransition { entity, .. } => {
            invalid_state(&format!("{entity}_lifecycle"), message)
        }
        DomainError::SaleNotPending { .. } => invalid_state("sale_pending", message),
        DomainError::SaleNotApproved { .. } => invalid_state("sale_approved", message),
        DomainError::SaleNotSettled { .. } => invalid_state("sale_settled", message),
        DomainError::OpenTransactionExists { .. } => {
            invalid_state("single_open_transaction", message)
        }
        DomainError::TestDriveClosed { .. } => invalid_state("test_drive_open", message),
        DomainError::TestDriveConflict { .. } => ApiError::Conflict { message },
        DomainError::ScheduledTimeNotInFuture { .. } => invalid_input("scheduled_time", message),
        DomainError::InvalidMoney { field, .. }
        | DomainError::InvalidVehicleDetails { field, .. } => invalid_input(field, message),
        DomainError::InvalidName(_) => invalid_input("name", message),
        DomainError::InvalidEmail(_) => invalid_input("email", message),
        DomainError::InvalidRole(_) => invalid_input("role", message),
        DomainError::InvalidPaymentMethod(_) => invalid_input("payment_method", message),
        DomainError::InvalidStatus { .. } => invalid_input("status", message),
        DomainError::InvalidReference(_) => invalid_input("reference", message),
    }
}

/// Translates a core error into an API error.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::Conflict(message) => ApiError::Conflict { message },
        CoreError::Storage(msg) => ApiError::Internal {
            message: format!("Storage error: {msg}"),
        },
    }
}
