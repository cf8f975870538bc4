// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Parties and their roles.
//!
//! A party is anyone the dealership deals with: staff members who sell,
//! take payments, or administer the system, and the customers they serve.
//! Every party holds exactly one role.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DomainError;
use crate::ids::PartyId;

/// The role a party holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Administrators with corrective authority over every workflow.
    Admin,
    /// Sales staff who create and manage sale agreements.
    Sales,
    /// Cashiers who take and process payments.
    Cashier,
    /// Customers who buy vehicles and book test drives.
    Customer,
}

impl Role {
    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Sales => "sales",
            Self::Cashier => "cashier",
            Self::Customer => "customer",
        }
    }

    /// Returns true for every role except `Customer`.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        !matches!(self, Self::Customer)
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "sales" => Ok(Self::Sales),
            "cashier" => Ok(Self::Cashier),
            "customer" => Ok(Self::Customer),
            _ => Err(DomainError::InvalidRole(s.to_string())),
        }
    }
}

/// A registered party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
    pub id: PartyId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
}

impl Party {
    /// Checks that the party is active and holds one of `roles`.
    ///
    /// # Errors
    ///
    /// Returns `PartyNotFound` for inactive parties and `PartyRoleMismatch`
    /// when the role does not match.
    pub fn require_role(&self, roles: &[Role], expected: &'static str) -> Result<(), DomainError> {
        if !self.active {
            return Err(DomainError::PartyNotFound(self.id));
        }
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(DomainError::PartyRoleMismatch {
                party: self.id,
                expected,
            })
        }
    }
}

/// Data required to register a party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParty {
    pub name: String,
    pub email: String,
    pub role: Role,
}
