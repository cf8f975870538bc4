// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use showroom_domain::{NewTransaction, Transaction, TransactionId, TransactionStatus};
use tracing::{debug, info};

use crate::data_models::format_timestamp;
use crate::diesel_schema::transactions;
use crate::error::PersistenceError;
use crate::sqlite::get_last_insert_rowid;

/// Inserts a pending transaction at version 1.
///
/// # Errors
///
/// Returns `UniqueViolation` if the reference is already used.
pub fn insert_transaction(
    conn: &mut SqliteConnection,
    transaction: &NewTransaction,
) -> Result<Transaction, PersistenceError> {
    diesel::insert_into(transactions::table)
        .values((
            transactions::sale_id.eq(transaction.sale_id.value()),
            transactions::amount_cents.eq(transaction.amount.cents()),
            transactions::payment_method.eq(transaction.payment_method.as_str()),
            transactions::status.eq(TransactionStatus::Pending.as_str()),
            transactions::processed_by.eq(transaction.processed_by.value()),
            transactions::reference.eq(transaction.reference.as_str()),
            transactions::notes.eq(transaction.notes.as_deref()),
            transactions::created_at.eq(format_timestamp(transaction.created_at)?),
            transactions::version.eq(1_i64),
        ))
        .execute(conn)?;

    let transaction_id: i64 = get_last_insert_rowid(conn)?;
    info!(
        transaction_id,
        sale_id = transaction.sale_id.value(),
        reference = %transaction.reference,
        "Transaction created"
    );

    Ok(Transaction {
        id: TransactionId::new(transaction_id),
        sale_id: transaction.sale_id,
        amount: transaction.amount,
        payment_method: transaction.payment_method,
        status: TransactionStatus::Pending,
        processed_by: transaction.processed_by,
        processed_at: None,
        reference: transaction.reference.clone(),
        notes: transaction.notes.clone(),
        created_at: transaction.created_at,
        version: 1,
    })
}

/// Writes the mutable columns of `transaction` if its version is still current.
///
/// # Errors
///
/// Returns `UniqueViolation` if the new reference belongs to another transaction.
pub fn update_transaction(
    conn: &mut SqliteConnection,
    transaction: &Transaction,
) -> Result<usize, PersistenceError> {
    debug!(
        transaction_id = transaction.id.value(),
        version = transaction.version,
        status = transaction.status.as_str(),
        "Updating transaction"
    );
    let processed_at: Option<String> = transaction
        .processed_at
        .map(format_timestamp)
        .transpose()?;
    Ok(diesel::update(
        transactions::table
            .filter(transactions::transaction_id.eq(transaction.id.value()))
            .filter(transactions::version.eq(transaction.version)),
    )
    .set((
        transactions::status.eq(transaction.status.as_str()),
        transactions::processed_by.eq(transaction.processed_by.value()),
        transactions::processed_at.eq(processed_at),
        transactions::reference.eq(transaction.reference.as_str()),
        transactions::notes.eq(transaction.notes.as_deref()),
        transactions::version.eq(transaction.version + 1),
    ))
    .execute(conn)?)
}
