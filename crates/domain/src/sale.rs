// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Sale agreements and their lifecycle.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

use crate::error::DomainError;
use crate::ids::{PartyId, SaleId, VehicleId};
use crate::lifecycle::Lifecycle;
use crate::money::Money;

/// Lifecycle state of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Agreed in principle; the vehicle is reserved.
    Pending,
    /// Approved; payment may be taken.
    Approved,
    /// Paid for; the vehicle is sold.
    Completed,
    /// Abandoned or reversed by a refund.
    Canceled,
}

impl SaleStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "completed" => Ok(Self::Completed),
            "canceled" => Ok(Self::Canceled),
            _ => Err(DomainError::InvalidStatus {
                entity: Self::ENTITY,
                value: s.to_string(),
            }),
        }
    }

    /// Returns true while the sale holds its vehicle in reserve.
    #[must_use]
    pub const fn holds_vehicle(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }

    /// Validates the reversal of a completed sale.
    ///
    /// `completed -> canceled` is not in the regular table. It is reachable
    /// only when the sale's payment is refunded.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStatusTransition` unless the sale is completed.
    pub fn validate_reversal(self) -> Result<(), DomainError> {
        if self == Self::Completed {
            return Ok(());
        }
        Err(DomainError::InvalidStatusTransition {
            entity: Self::ENTITY,
            from: self.as_str().to_string(),
            to: Self::Canceled.as_str().to_string(),
            reason: "only a completed sale can be reversed by refund".to_string(),
        })
    }
}

impl Lifecycle for SaleStatus {
    const ENTITY: &'static str = "sale";

    const TRANSITIONS: &'static [(Self, Self)] = &[
        (Self::Pending, Self::Approved),
        (Self::Pending, Self::Canceled),
        (Self::Approved, Self::Completed),
        (Self::Approved, Self::Canceled),
    ];

    fn as_str(&self) -> &'static str {
        Self::as_str(self)
    }
}

impl FromStr for SaleStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

/// A sale agreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sale {
    pub id: SaleId,
    pub vehicle_id: VehicleId,
    pub customer_id: PartyId,
    pub sales_person_id: PartyId,
    pub status: SaleStatus,
    pub sale_price: Money,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub version: i64,
}

impl Sale {
    /// Checks that the sale can still be deleted.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SaleNotPending` for any status but pending.
    pub fn require_pending(&self) -> Result<(), DomainError> {
        if self.status == SaleStatus::Pending {
            Ok(())
        } else {
            Err(DomainError::SaleNotPending {
                sale: self.id,
                status: self.status.as_str().to_string(),
            })
        }
    }

    /// Checks that payment may be taken against the sale.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SaleNotApproved` for any status but approved.
    pub fn require_approved(&self) -> Result<(), DomainError> {
        if self.status == SaleStatus::Approved {
            Ok(())
        } else {
            Err(DomainError::SaleNotApproved {
                sale: self.id,
                status: self.status.as_str().to_string(),
            })
        }
    }
}

/// A sale about to be inserted. The store assigns id and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub vehicle_id: VehicleId,
    pub customer_id: PartyId,
    pub sales_person_id: PartyId,
    pub sale_price: Money,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
}
