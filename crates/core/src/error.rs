// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use showroom_domain::DomainError;

/// Errors returned by workflow operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// A concurrent writer got there first, or a unique key is taken.
    ///
    /// Retrying the whole operation from scratch is safe.
    Conflict(String),
    /// The backing store failed.
    Storage(String),
}

/// Caller-facing classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    InvalidInput,
    Conflict,
    Storage,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidState => "invalid_state",
            Self::InvalidInput => "invalid_input",
            Self::Conflict => "conflict",
            Self::Storage => "storage",
        }
    }
}

impl CoreError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DomainViolation(err) => domain_error_kind(err),
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

const fn domain_error_kind(err: &DomainError) -> ErrorKind {
    match err {
        DomainError::VehicleNotFound(_)
        | DomainError::SaleNotFound(_)
        | DomainError::TransactionNotFound(_)
        | DomainError::TestDriveNotFound(_)
        | DomainError::PartyNotFound(_)
        | DomainError::PartyRoleMismatch { .. } => ErrorKind::NotFound,
        DomainError::AdminAlreadyExists
        | DomainError::LastActiveAdmin(_)
        | DomainError::VehicleNotAvailable { .. }
        | DomainError::VehicleNotRemovable { .. }
        | DomainError::InvalidStatusTransition { .. }
        | DomainError::SaleNotPending { .. }
        | DomainError::SaleNotApproved { .. }
        | DomainError::SaleNotSettled { .. }
        | DomainError::OpenTransactionExists { .. }
        | DomainError::TestDriveClosed { .. } => ErrorKind::InvalidState,
        DomainError::TestDriveConflict { .. } => ErrorKind::Conflict,
        DomainError::ScheduledTimeNotInFuture { .. }
        | DomainError::InvalidMoney { .. }
        | DomainError::InvalidVehicleDetails { .. }
        | DomainError::InvalidName(_)
        | DomainError::InvalidEmail(_)
        | DomainError::InvalidRole(_)
        | DomainError::InvalidPaymentMethod(_)
        | DomainError::InvalidStatus { .. }
        | DomainError::InvalidReference(_) => ErrorKind::InvalidInput,
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::Storage(msg) => write!(f, "Storage error: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DomainViolation(err) => Some(err),
            Self::Conflict(_) | Self::Storage(_) => None,
        }
    }
}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}
