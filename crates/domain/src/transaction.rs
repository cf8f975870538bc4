// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Payment transactions.
//!
//! A transaction is a single payment against an approved sale. Settling it
//! completes the sale; refunding it reverses the sale. There is no payment
//! gateway, so processing a payment settles it at once.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

use crate::error::DomainError;
use crate::ids::{PartyId, SaleId, TransactionId};
use crate::lifecycle::Lifecycle;
use crate::money::Money;

const REFERENCE_PREFIX: &str = "TXN-";
const MAX_REFERENCE_LEN: usize = 64;

/// How a payment is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Financing,
}

impl PaymentMethod {
    /// Returns the string representation of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::Financing => "financing",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "bank_transfer" => Ok(Self::BankTransfer),
            "financing" => Ok(Self::Financing),
            _ => Err(DomainError::InvalidPaymentMethod(s.to_string())),
        }
    }
}

/// Lifecycle state of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl TransactionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            _ => Err(DomainError::InvalidStatus {
                entity: Self::ENTITY,
                value: s.to_string(),
            }),
        }
    }

    /// Returns true for payments that block another payment on the same sale.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Completed)
    }
}

impl Lifecycle for TransactionStatus {
    const ENTITY: &'static str = "transaction";

    const TRANSITIONS: &'static [(Self, Self)] = &[
        (Self::Pending, Self::Completed),
        (Self::Pending, Self::Failed),
        (Self::Completed, Self::Refunded),
    ];

    fn as_str(&self) -> &'static str {
        Self::as_str(self)
    }
}

impl FromStr for TransactionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

/// Human-readable, unique payment reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionRef(String);

impl TransactionRef {
    /// Builds a generated reference of the form `TXN-XXXXXXXX`.
    #[must_use]
    pub fn generate(seed: u32) -> Self {
        Self(format!("{REFERENCE_PREFIX}{seed:08X}"))
    }

    /// Validates a caller-supplied reference.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidReference` if the reference is empty,
    /// contains whitespace, or is longer than 64 characters.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        if value.is_empty() {
            return Err(DomainError::InvalidReference(String::from(
                "reference cannot be empty",
            )));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidReference(format!(
                "'{value}' contains whitespace"
            )));
        }
        if value.len() > MAX_REFERENCE_LEN {
            return Err(DomainError::InvalidReference(format!(
                "reference exceeds {MAX_REFERENCE_LEN} characters"
            )));
        }
        Ok(Self(value.to_string()))
    }

    /// Wraps a reference read back from storage.
    #[must_use]
    pub const fn from_stored(value: String) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransactionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A payment transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub sale_id: SaleId,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    pub processed_by: PartyId,
    #[serde(with = "time::serde::rfc3339::option")]
    pub processed_at: Option<OffsetDateTime>,
    pub reference: TransactionRef,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub version: i64,
}

/// A transaction about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub sale_id: SaleId,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub processed_by: PartyId,
    pub reference: TransactionRef,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_parse() {
        assert_eq!(
            "bank_transfer".parse::<PaymentMethod>(),
            Ok(PaymentMethod::BankTransfer)
        );
        assert_eq!(
            "cheque".parse::<PaymentMethod>(),
            Err(DomainError::InvalidPaymentMethod(String::from("cheque")))
        );
    }

    #[test]
    fn test_transaction_lifecycle() {
        assert!(
            TransactionStatus::Pending
                .validate_transition(TransactionStatus::Completed)
                .is_ok()
        );
        assert!(
            TransactionStatus::Completed
                .validate_transition(TransactionStatus::Refunded)
                .is_ok()
        );
        assert!(
            TransactionStatus::Pending
                .validate_transition(TransactionStatus::Refunded)
                .is_err()
        );
        assert!(TransactionStatus::Failed.is_terminal());
        assert!(TransactionStatus::Refunded.is_terminal());
        assert!(!TransactionStatus::Completed.is_terminal());
    }

    #[test]
    fn test_open_statuses() {
        assert!(TransactionStatus::Pending.is_open());
        assert!(TransactionStatus::Completed.is_open());
        assert!(!TransactionStatus::Failed.is_open());
        assert!(!TransactionStatus::Refunded.is_open());
    }

    #[test]
    fn test_generated_reference_format() {
        assert_eq!(TransactionRef::generate(0xAB).as_str(), "TXN-000000AB");
        assert_eq!(TransactionRef::generate(u32::MAX).as_str(), "TXN-FFFFFFFF");
    }

    #[test]
    fn test_reference_validation() {
        assert!(TransactionRef::parse("WIRE-2026-0042").is_ok());
        assert!(TransactionRef::parse("").is_err());
        assert!(TransactionRef::parse("TXN 1").is_err());
        assert!(TransactionRef::parse(&"X".repeat(65)).is_err());
    }
}
