// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The payment workflow.
//!
//! Settling a payment completes its sale and marks the vehicle sold.
//! Refunding it cancels the sale and returns the vehicle to the lot. Both
//! cascades write the transaction first and then check each downstream
//! transition against its lifecycle table, so a sale that moved on in the
//! meantime rolls the whole unit back.

use serde_json::json;
use showroom_audit::{Actor, Cause, Subject};
use showroom_domain::{
    DomainError, Lifecycle, Money, NewTransaction, PartyId, PaymentMethod, Role, Sale, SaleId,
    SaleStatus, Transaction, TransactionId, TransactionRef, TransactionStatus, Vehicle,
    VehicleStatus, validate_payment_amount,
};
use tracing::{info, warn};

use super::{AuditEntry, Context, load_sale, load_transaction, record, resolve_party};
use crate::clock::Clock;
use crate::error::CoreError;
use crate::store::{TransactionFilter, UnitOfWork, WorkflowStore};

/// How many random references are tried before giving up.
const MAX_REFERENCE_ATTEMPTS: usize = 5;

/// Input for a new payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDraft {
    pub sale_id: SaleId,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub processed_by: PartyId,
    pub notes: Option<String>,
}

/// Changes to an existing payment. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentUpdate {
    pub status: Option<TransactionStatus>,
    pub reference: Option<TransactionRef>,
    pub notes: Option<String>,
}

pub struct Payments<'a, S, C> {
    store: &'a S,
    clock: &'a C,
}

fn transaction_subject(id: TransactionId) -> Subject {
    Subject::new("transaction", id.value())
}

/// Everything a cascade touched.
struct Settlement {
    transaction: Transaction,
    sale: Sale,
    vehicle: Vehicle,
}

impl<'a, S: WorkflowStore, C: Clock> Payments<'a, S, C> {
    pub(crate) const fn new(store: &'a S, clock: &'a C) -> Self {
        Self { store, clock }
    }

    /// Records a pending payment against an approved sale.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `NotFound` if the sale does not exist or the processor is not an
    ///   admin or cashier
    /// - `InvalidState` if the sale is not approved or already has a
    ///   pending or completed payment
    /// - `InvalidInput` if the amount is zero
    /// - `Conflict` if no unique reference could be allocated
    pub fn create(
        &self,
        actor: &Actor,
        cause: &Cause,
        draft: PaymentDraft,
    ) -> Result<Transaction, CoreError> {
        let ctx = Context::new(self.clock, actor, cause);

        let transaction: Transaction = self.store.atomically(|uow| {
            let sale: Sale = load_sale(uow, draft.sale_id)?;
            resolve_party(
                uow,
                draft.processed_by,
                &[Role::Admin, Role::Cashier],
                "admin or cashier",
            )?;
            sale.require_approved()?;
            if let Some(open) = uow
                .transactions_for_sale(sale.id)?
                .into_iter()
                .find(|t| t.status.is_open())
            {
                return Err(DomainError::OpenTransactionExists {
                    sale: sale.id,
                    transaction: open.id,
                }
                .into());
            }
            validate_payment_amount(draft.amount)?;

            let reference: TransactionRef = allocate_reference(uow)?;
            let transaction: Transaction = uow.insert_transaction(&NewTransaction {
                sale_id: sale.id,
                amount: draft.amount,
                payment_method: draft.payment_method,
                processed_by: draft.processed_by,
                reference,
                notes: draft.notes,
                created_at: ctx.now,
            })?;

            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "CreateTransaction",
                    details: Some(format!(
                        "{} {} via {}",
                        transaction.reference,
                        transaction.amount,
                        transaction.payment_method.as_str()
                    )),
                    subject: transaction_subject(transaction.id),
                    before: serde_json::Value::Null,
                    after: json!(transaction),
                },
            )?;
            Ok(transaction)
        })?;

        info!(
            transaction_id = %transaction.id,
            sale_id = %transaction.sale_id,
            reference = %transaction.reference,
            "Created pending transaction"
        );
        Ok(transaction)
    }

    /// Processes a pending payment.
    ///
    /// A settled payment completes its sale and marks the vehicle sold, in
    /// the same unit.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the transaction does not exist and
    /// `InvalidState` if it is not pending or its sale is not approved.
    pub fn process(
        &self,
        actor: &Actor,
        cause: &Cause,
        id: TransactionId,
    ) -> Result<Transaction, CoreError> {
        let ctx = Context::new(self.clock, actor, cause);

        let transaction: Transaction = self.store.atomically(|uow| {
            let before: Transaction = load_transaction(uow, id)?;
            let settlement: Settlement = settle(uow, &ctx, before.clone())?;
            let after: Transaction = settlement.transaction.clone();

            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "ProcessTransaction",
                    details: Some(format!("{} -> {}", before.reference, after.status.as_str())),
                    subject: transaction_subject(id),
                    before: json!({ "transaction": before }),
                    after: settlement_snapshot(&after, Some(&settlement)),
                },
            )?;
            Ok(after)
        })?;

        info!(
            transaction_id = %id,
            sale_id = %transaction.sale_id,
            status = transaction.status.as_str(),
            "Processed transaction"
        );
        Ok(transaction)
    }

    /// Refunds a completed payment, cancelling its sale and returning the
    /// vehicle to the lot.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the transaction does not exist and
    /// `InvalidState` unless it is completed.
    pub fn refund(
        &self,
        actor: &Actor,
        cause: &Cause,
        id: TransactionId,
    ) -> Result<Transaction, CoreError> {
        let ctx = Context::new(self.clock, actor, cause);

        let transaction: Transaction = self.store.atomically(|uow| {
            let before: Transaction = load_transaction(uow, id)?;
            let settlement: Settlement = reverse(uow, before.clone())?;
            let after: Transaction = settlement.transaction.clone();

            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "RefundTransaction",
                    details: Some(format!("{} refunded {}", before.reference, before.amount)),
                    subject: transaction_subject(id),
                    before: json!({ "transaction": before }),
                    after: settlement_snapshot(&after, Some(&settlement)),
                },
            )?;
            Ok(after)
        })?;

        warn!(
            transaction_id = %id,
            sale_id = %transaction.sale_id,
            "Refunded transaction, sale canceled"
        );
        Ok(transaction)
    }

    /// Applies reference, notes and status changes to a payment.
    ///
    /// Moving to `completed` or `refunded` runs the same cascade as
    /// [`Self::process`] or [`Self::refund`]. Moving to `failed` touches only
    /// the payment.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the transaction does not exist, `InvalidState`
    /// for transitions the lifecycle does not list, and `Conflict` if the new
    /// reference is already used.
    pub fn update(
        &self,
        actor: &Actor,
        cause: &Cause,
        id: TransactionId,
        update: PaymentUpdate,
    ) -> Result<Transaction, CoreError> {
        let ctx = Context::new(self.clock, actor, cause);

        self.store.atomically(|uow| {
            let before: Transaction = load_transaction(uow, id)?;
            let mut working: Transaction = before.clone();

            if let Some(reference) = update.reference {
                if reference != before.reference && uow.transaction_ref_exists(&reference)? {
                    return Err(CoreError::Conflict(format!(
                        "transaction reference '{reference}' is already used"
                    )));
                }
                working.reference = reference;
            }
            if let Some(notes) = update.notes {
                working.notes = Some(notes);
            }

            let (after, touched) = match update.status {
                Some(TransactionStatus::Completed) => {
                    let settlement: Settlement = settle(uow, &ctx, working)?;
                    (settlement.transaction.clone(), Some(settlement))
                }
                Some(TransactionStatus::Refunded) => {
                    let settlement: Settlement = reverse(uow, working)?;
                    (settlement.transaction.clone(), Some(settlement))
                }
                Some(to) => {
                    working.status.validate_transition(to)?;
                    let updated: Transaction = uow.update_transaction(&Transaction {
                        status: to,
                        ..working
                    })?;
                    (updated, None)
                }
                None => (uow.update_transaction(&working)?, None),
            };

            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "UpdateTransaction",
                    details: update
                        .status
                        .map(|to| format!("{} -> {}", before.status.as_str(), to.as_str())),
                    subject: transaction_subject(id),
                    before: json!({ "transaction": before }),
                    after: settlement_snapshot(&after, touched.as_ref()),
                },
            )?;
            Ok(after)
        })
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the transaction does not exist.
    pub fn get(&self, id: TransactionId) -> Result<Transaction, CoreError> {
        self.store.snapshot(|uow| load_transaction(uow, id))
    }

    /// # Errors
    ///
    /// Returns a `Storage` error if the store cannot be read.
    pub fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, CoreError> {
        self.store.snapshot(|uow| uow.list_transactions(filter))
    }
}

fn allocate_reference(uow: &mut dyn UnitOfWork) -> Result<TransactionRef, CoreError> {
    for _ in 0..MAX_REFERENCE_ATTEMPTS {
        let candidate: TransactionRef = TransactionRef::generate(rand::random::<u32>());
        if !uow.transaction_ref_exists(&candidate)? {
            return Ok(candidate);
        }
        warn!(reference = %candidate, "Transaction reference collision, retrying");
    }
    Err(CoreError::Conflict(format!(
        "could not allocate a unique transaction reference after {MAX_REFERENCE_ATTEMPTS} attempts"
    )))
}

/// Completes the payment, its sale and its vehicle.
fn settle(
    uow: &mut dyn UnitOfWork,
    ctx: &Context<'_>,
    transaction: Transaction,
) -> Result<Settlement, CoreError> {
    let sale: Sale = load_sale(uow, transaction.sale_id)?;
    let vehicle: Vehicle = uow.lock_vehicle(sale.vehicle_id)?;

    transaction
        .status
        .validate_transition(TransactionStatus::Completed)?;
    let transaction: Transaction = uow.update_transaction(&Transaction {
        status: TransactionStatus::Completed,
        processed_at: Some(ctx.now),
        ..transaction
    })?;

    sale.status.validate_transition(SaleStatus::Completed)?;
    let sale: Sale = uow.update_sale(&Sale {
        status: SaleStatus::Completed,
        completed_at: Some(ctx.now),
        ..sale
    })?;

    vehicle.status.validate_transition(VehicleStatus::Sold)?;
    let vehicle: Vehicle = uow.update_vehicle(&Vehicle {
        status: VehicleStatus::Sold,
        ..vehicle
    })?;

    Ok(Settlement {
        transaction,
        sale,
        vehicle,
    })
}

/// Refunds the payment, reverses its sale and releases its vehicle.
fn reverse(uow: &mut dyn UnitOfWork, transaction: Transaction) -> Result<Settlement, CoreError> {
    let sale: Sale = load_sale(uow, transaction.sale_id)?;
    let vehicle: Vehicle = uow.lock_vehicle(sale.vehicle_id)?;

    transaction
        .status
        .validate_transition(TransactionStatus::Refunded)?;
    let transaction: Transaction = uow.update_transaction(&Transaction {
        status: TransactionStatus::Refunded,
        ..transaction
    })?;

    sale.status.validate_reversal()?;
    let sale: Sale = uow.update_sale(&Sale {
        status: SaleStatus::Canceled,
        completed_at: None,
        ..sale
    })?;

    vehicle.status.validate_transition(VehicleStatus::Available)?;
    let vehicle: Vehicle = uow.update_vehicle(&Vehicle {
        status: VehicleStatus::Available,
        ..vehicle
    })?;

    Ok(Settlement {
        transaction,
        sale,
        vehicle,
    })
}

fn settlement_snapshot(
    transaction: &Transaction,
    settlement: Option<&Settlement>,
) -> serde_json::Value {
    settlement.map_or_else(
        || json!({ "transaction": transaction }),
        |s| {
            json!({
                "transaction": transaction,
                "sale": s.sale,
                "vehicle": s.vehicle,
            })
        },
    )
}
