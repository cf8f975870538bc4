// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::dsl::exists;
use diesel::prelude::*;
use showroom::TransactionFilter;
use showroom_domain::{Transaction, TransactionId, TransactionRef};

use crate::data_models::TransactionRow;
use crate::diesel_schema::transactions;
use crate::error::PersistenceError;

/// Retrieves a transaction by id.
///
/// # Errors
///
/// Returns an error if the query fails or the row is malformed.
pub fn find_transaction(
    conn: &mut SqliteConnection,
    id: TransactionId,
) -> Result<Option<Transaction>, PersistenceError> {
    transactions::table
        .filter(transactions::transaction_id.eq(id.value()))
        .select(TransactionRow::as_select())
        .first(conn)
        .optional()?
        .map(TransactionRow::into_transaction)
        .transpose()
}

/// Returns the stored version of a transaction, if the row exists.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn transaction_version(
    conn: &mut SqliteConnection,
    id: TransactionId,
) -> Result<Option<i64>, PersistenceError> {
    Ok(transactions::table
        .filter(transactions::transaction_id.eq(id.value()))
        .select(transactions::version)
        .first::<i64>(conn)
        .optional()?)
}

/// Returns true if any transaction already carries `reference`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn reference_exists(
    conn: &mut SqliteConnection,
    reference: &TransactionRef,
) -> Result<bool, PersistenceError> {
    Ok(diesel::select(exists(
        transactions::table.filter(transactions::reference.eq(reference.as_str())),
    ))
    .get_result::<bool>(conn)?)
}

/// Lists transactions matching `filter`.
///
/// # Errors
///
/// Returns an error if the query fails or a row is malformed.
pub fn list_transactions(
    conn: &mut SqliteConnection,
    filter: &TransactionFilter,
) -> Result<Vec<Transaction>, PersistenceError> {
    let mut query = transactions::table
        .select(TransactionRow::as_select())
        .order(transactions::transaction_id.asc())
        .into_boxed();
    if let Some(status) = filter.status {
        query = query.filter(transactions::status.eq(status.as_str()));
    }
    if let Some(sale_id) = filter.sale_id {
        query = query.filter(transactions::sale_id.eq(sale_id.value()));
    }
    query
        .load(conn)?
        .into_iter()
        .map(TransactionRow::into_transaction)
        .collect()
}
