// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The sale workflow.
//!
//! A sale reserves its vehicle from the moment it is created. Cancelling or
//! deleting it releases the vehicle; completing it marks the vehicle sold.

use serde_json::{Value, json};
use showroom_audit::{Actor, Cause, Subject};
use showroom_domain::{
    DomainError, Lifecycle, Money, NewSale, PartyId, Role, Sale, SaleId, SaleStatus, Transaction,
    TransactionStatus, Vehicle, VehicleId, VehicleStatus,
};
use tracing::{info, warn};

use super::{AuditEntry, Context, load_sale, record, resolve_party};
use crate::clock::Clock;
use crate::error::CoreError;
use crate::store::{SaleFilter, UnitOfWork, WorkflowStore};

/// Input for a new sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleDraft {
    pub vehicle_id: VehicleId,
    pub customer_id: PartyId,
    pub sales_person_id: PartyId,
    pub sale_price: Money,
    pub notes: Option<String>,
}

/// Field changes for an existing sale. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleUpdate {
    pub sale_price: Option<Money>,
    pub notes: Option<String>,
}

pub struct Sales<'a, S, C> {
    store: &'a S,
    clock: &'a C,
}

fn sale_subject(id: SaleId) -> Subject {
    Subject::new("sale", id.value())
}

impl<'a, S: WorkflowStore, C: Clock> Sales<'a, S, C> {
    pub(crate) const fn new(store: &'a S, clock: &'a C) -> Self {
        Self { store, clock }
    }

    /// Creates a pending sale and reserves its vehicle.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `NotFound` if the vehicle is missing or removed
    /// - `InvalidState` if the vehicle is not available
    /// - `NotFound` if the customer or sales person does not resolve to a
    ///   party with the `customer` or `sales` role
    pub fn create(
        &self,
        actor: &Actor,
        cause: &Cause,
        draft: SaleDraft,
    ) -> Result<Sale, CoreError> {
        let ctx = Context::new(self.clock, actor, cause);

        let sale: Sale = self.store.atomically(|uow| {
            let vehicle: Vehicle = uow.lock_vehicle(draft.vehicle_id)?;
            vehicle.status.require_available(vehicle.id)?;
            resolve_party(uow, draft.customer_id, &[Role::Customer], "customer")?;
            resolve_party(uow, draft.sales_person_id, &[Role::Sales], "sales")?;
            vehicle.status.validate_transition(VehicleStatus::Reserved)?;

            let sale: Sale = uow.insert_sale(&NewSale {
                vehicle_id: draft.vehicle_id,
                customer_id: draft.customer_id,
                sales_person_id: draft.sales_person_id,
                sale_price: draft.sale_price,
                notes: draft.notes,
                created_at: ctx.now,
            })?;
            let reserved: Vehicle = uow.update_vehicle(&Vehicle {
                status: VehicleStatus::Reserved,
                ..vehicle.clone()
            })?;

            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "CreateSale",
                    details: Some(format!("price {}", sale.sale_price)),
                    subject: sale_subject(sale.id),
                    before: json!({ "vehicle": vehicle }),
                    after: json!({ "sale": sale, "vehicle": reserved }),
                },
            )?;
            Ok(sale)
        })?;

        info!(
            sale_id = %sale.id,
            vehicle_id = %sale.vehicle_id,
            customer_id = %sale.customer_id,
            "Created sale, vehicle reserved"
        );
        Ok(sale)
    }

    /// Moves a sale along its lifecycle.
    ///
    /// - `approved`: status write only.
    /// - `completed`: requires exactly one completed payment; stamps
    ///   `completed_at` and marks the vehicle sold.
    /// - `canceled`: releases the vehicle and fails every pending payment.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the sale does not exist and `InvalidState` for
    /// any transition the sale lifecycle does not list.
    pub fn update_status(
        &self,
        actor: &Actor,
        cause: &Cause,
        id: SaleId,
        to: SaleStatus,
    ) -> Result<Sale, CoreError> {
        let ctx = Context::new(self.clock, actor, cause);

        let sale: Sale = self.store.atomically(|uow| {
            let before: Sale = load_sale(uow, id)?;
            let vehicle: Vehicle = uow.lock_vehicle(before.vehicle_id)?;
            before.status.validate_transition(to)?;

            let (after, vehicle_after, failed) = match to {
                SaleStatus::Completed => {
                    let (sale, vehicle) = complete_sale(uow, &ctx, &before, &vehicle)?;
                    (sale, vehicle, Vec::new())
                }
                SaleStatus::Canceled => cancel_sale(uow, &before, &vehicle)?,
                SaleStatus::Pending | SaleStatus::Approved => {
                    let sale: Sale = uow.update_sale(&Sale {
                        status: to,
                        ..before.clone()
                    })?;
                    (sale, vehicle.clone(), Vec::new())
                }
            };

            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "UpdateSaleStatus",
                    details: Some(format!(
                        "{} -> {}",
                        before.status.as_str(),
                        to.as_str()
                    )),
                    subject: sale_subject(id),
                    before: json!({ "sale": before, "vehicle": vehicle }),
                    after: json!({
                        "sale": after,
                        "vehicle": vehicle_after,
                        "failed_transactions": failed,
                    }),
                },
            )?;
            Ok(after)
        })?;

        info!(sale_id = %id, status = to.as_str(), "Sale status updated");
        Ok(sale)
    }

    /// Deletes a pending sale and releases its vehicle.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the sale does not exist and `InvalidState`
    /// unless it is pending.
    pub fn delete(&self, actor: &Actor, cause: &Cause, id: SaleId) -> Result<(), CoreError> {
        let ctx = Context::new(self.clock, actor, cause);

        self.store.atomically(|uow| {
            let sale: Sale = load_sale(uow, id)?;
            sale.require_pending()?;
            let vehicle: Vehicle = uow.lock_vehicle(sale.vehicle_id)?;
            vehicle.status.validate_transition(VehicleStatus::Available)?;

            let released: Vehicle = uow.update_vehicle(&Vehicle {
                status: VehicleStatus::Available,
                ..vehicle.clone()
            })?;
            uow.delete_sale(&sale)?;

            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "DeleteSale",
                    details: None,
                    subject: sale_subject(id),
                    before: json!({ "sale": sale, "vehicle": vehicle }),
                    after: json!({ "sale": Value::Null, "vehicle": released }),
                },
            )
        })?;

        info!(sale_id = %id, "Deleted pending sale, vehicle released");
        Ok(())
    }

    /// Changes price and notes. No lifecycle effect.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the sale does not exist.
    pub fn update_details(
        &self,
        actor: &Actor,
        cause: &Cause,
        id: SaleId,
        update: SaleUpdate,
    ) -> Result<Sale, CoreError> {
        let ctx = Context::new(self.clock, actor, cause);

        self.store.atomically(|uow| {
            let before: Sale = load_sale(uow, id)?;
            let after: Sale = uow.update_sale(&Sale {
                sale_price: update.sale_price.unwrap_or(before.sale_price),
                notes: update.notes.or_else(|| before.notes.clone()),
                ..before.clone()
            })?;
            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "UpdateSaleDetails",
                    details: None,
                    subject: sale_subject(id),
                    before: json!(before),
                    after: json!(after),
                },
            )?;
            Ok(after)
        })
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the sale does not exist.
    pub fn get(&self, id: SaleId) -> Result<Sale, CoreError> {
        self.store.snapshot(|uow| load_sale(uow, id))
    }

    /// # Errors
    ///
    /// Returns a `Storage` error if the store cannot be read.
    pub fn list(&self, filter: &SaleFilter) -> Result<Vec<Sale>, CoreError> {
        self.store.snapshot(|uow| uow.list_sales(filter))
    }
}

/// Manual completion. Only a sale whose payment has already settled may
/// complete this way.
///
/// Processing a payment completes its sale in the same unit, so an approved
/// sale never has a settled payment here and this returns `SaleNotSettled`.
fn complete_sale(
    uow: &mut dyn UnitOfWork,
    ctx: &Context<'_>,
    sale: &Sale,
    vehicle: &Vehicle,
) -> Result<(Sale, Vehicle), CoreError> {
    let completed_payments: usize = uow
        .transactions_for_sale(sale.id)?
        .iter()
        .filter(|t| t.status == TransactionStatus::Completed)
        .count();
    if completed_payments != 1 {
        return Err(DomainError::SaleNotSettled {
            sale: sale.id,
            completed_payments,
        }
        .into());
    }
    vehicle.status.validate_transition(VehicleStatus::Sold)?;

    let completed: Sale = uow.update_sale(&Sale {
        status: SaleStatus::Completed,
        completed_at: Some(ctx.now),
        ..sale.clone()
    })?;
    let sold: Vehicle = uow.update_vehicle(&Vehicle {
        status: VehicleStatus::Sold,
        ..vehicle.clone()
    })?;
    Ok((completed, sold))
}

fn cancel_sale(
    uow: &mut dyn UnitOfWork,
    sale: &Sale,
    vehicle: &Vehicle,
) -> Result<(Sale, Vehicle, Vec<Transaction>), CoreError> {
    vehicle.status.validate_transition(VehicleStatus::Available)?;

    let mut failed: Vec<Transaction> = Vec::new();
    for transaction in uow.transactions_for_sale(sale.id)? {
        if transaction.status != TransactionStatus::Pending {
            continue;
        }
        transaction
            .status
            .validate_transition(TransactionStatus::Failed)?;
        warn!(
            transaction_id = %transaction.id,
            sale_id = %sale.id,
            "Failing pending payment of canceled sale"
        );
        failed.push(uow.update_transaction(&Transaction {
            status: TransactionStatus::Failed,
            ..transaction
        })?);
    }

    let canceled: Sale = uow.update_sale(&Sale {
        status: SaleStatus::Canceled,
        ..sale.clone()
    })?;
    let released: Vehicle = uow.update_vehicle(&Vehicle {
        status: VehicleStatus::Available,
        ..vehicle.clone()
    })?;
    Ok((canceled, released, failed))
}
