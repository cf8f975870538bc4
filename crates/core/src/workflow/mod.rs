// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Workflow coordination.
//!
//! Each workflow operation runs as one unit of work: it locks what it must,
//! checks every lifecycle rule it depends on, writes every entity it
//! touches, and appends exactly one audit event, all inside a single call
//! to [`WorkflowStore::atomically`].

mod inventory;
mod parties;
mod payments;
mod sales;
mod test_drives;

pub use inventory::Inventory;
pub use parties::Parties;
pub use payments::{PaymentDraft, PaymentUpdate, Payments};
pub use sales::{SaleDraft, SaleUpdate, Sales};
pub use test_drives::{BookingDraft, TestDrives};

use serde_json::Value;
use showroom_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot, Subject};
use showroom_domain::{
    DomainError, Party, PartyId, Role, Sale, SaleId, TestDrive, TestDriveId, Transaction,
    TransactionId,
};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::CoreError;
use crate::store::{UnitOfWork, WorkflowStore};

/// Entry point to every workflow over one store.
#[derive(Debug)]
pub struct Showroom<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: WorkflowStore, C: Clock> Showroom<S, C> {
    #[must_use]
    pub const fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    #[must_use]
    pub const fn parties(&self) -> Parties<'_, S, C> {
        Parties::new(&self.store, &self.clock)
    }

    #[must_use]
    pub const fn inventory(&self) -> Inventory<'_, S, C> {
        Inventory::new(&self.store, &self.clock)
    }

    #[must_use]
    pub const fn sales(&self) -> Sales<'_, S, C> {
        Sales::new(&self.store, &self.clock)
    }

    #[must_use]
    pub const fn payments(&self) -> Payments<'_, S, C> {
        Payments::new(&self.store, &self.clock)
    }

    #[must_use]
    pub const fn test_drives(&self) -> TestDrives<'_, S, C> {
        TestDrives::new(&self.store, &self.clock)
    }

    /// Returns every audit event filed under `subject`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a `Storage` error if the store cannot be read.
    pub fn audit_trail(&self, subject: &Subject) -> Result<Vec<AuditEvent>, CoreError> {
        self.store.snapshot(|uow| uow.audit_events(subject))
    }
}

/// Who is acting, why, and when.
pub(crate) struct Context<'a> {
    pub actor: &'a Actor,
    pub cause: &'a Cause,
    pub now: OffsetDateTime,
}

impl<'a> Context<'a> {
    pub(crate) fn new<C: Clock>(clock: &C, actor: &'a Actor, cause: &'a Cause) -> Self {
        Self {
            actor,
            cause,
            now: clock.now(),
        }
    }
}

/// The audit record for one operation.
pub(crate) struct AuditEntry {
    pub action: &'static str,
    pub details: Option<String>,
    pub subject: Subject,
    pub before: Value,
    pub after: Value,
}

/// Appends the operation's audit event to the unit.
pub(crate) fn record(
    uow: &mut dyn UnitOfWork,
    ctx: &Context<'_>,
    entry: AuditEntry,
) -> Result<(), CoreError> {
    let recorded_at: String = ctx
        .now
        .format(&Rfc3339)
        .map_err(|e| CoreError::Storage(format!("failed to format audit timestamp: {e}")))?;

    let event: AuditEvent = AuditEvent::new(
        ctx.actor.clone(),
        ctx.cause.clone(),
        Action::new(entry.action.to_string(), entry.details),
        entry.subject,
        StateSnapshot::new(entry.before.to_string()),
        StateSnapshot::new(entry.after.to_string()),
        recorded_at,
    );
    let stored: AuditEvent = uow.append_audit_event(&event)?;
    debug!(
        event_id = ?stored.event_id,
        action = entry.action,
        subject_kind = %stored.subject.kind,
        subject_id = stored.subject.id,
        "Recorded audit event"
    );
    Ok(())
}

/// Resolves a party that must be active and hold one of `roles`.
pub(crate) fn resolve_party(
    uow: &mut dyn UnitOfWork,
    id: PartyId,
    roles: &[Role],
    expected: &'static str,
) -> Result<Party, CoreError> {
    let party: Party = uow
        .find_party(id)?
        .ok_or(DomainError::PartyNotFound(id))?;
    party.require_role(roles, expected)?;
    Ok(party)
}

pub(crate) fn load_sale(uow: &mut dyn UnitOfWork, id: SaleId) -> Result<Sale, CoreError> {
    uow.find_sale(id)?
        .ok_or_else(|| DomainError::SaleNotFound(id).into())
}

pub(crate) fn load_transaction(
    uow: &mut dyn UnitOfWork,
    id: TransactionId,
) -> Result<Transaction, CoreError> {
    uow.find_transaction(id)?
        .ok_or_else(|| DomainError::TransactionNotFound(id).into())
}

pub(crate) fn load_test_drive(
    uow: &mut dyn UnitOfWork,
    id: TestDriveId,
) -> Result<TestDrive, CoreError> {
    uow.find_test_drive(id)?
        .ok_or_else(|| DomainError::TestDriveNotFound(id).into())
}
