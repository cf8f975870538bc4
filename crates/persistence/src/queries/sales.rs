// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use showroom::SaleFilter;
use showroom_domain::{Sale, SaleId};

use crate::data_models::SaleRow;
use crate::diesel_schema::sales;
use crate::error::PersistenceError;

/// Retrieves a sale by id.
///
/// # Errors
///
/// Returns an error if the query fails or the row is malformed.
pub fn find_sale(
    conn: &mut SqliteConnection,
    id: SaleId,
) -> Result<Option<Sale>, PersistenceError> {
    sales::table
        .filter(sales::sale_id.eq(id.value()))
        .select(SaleRow::as_select())
        .first(conn)
        .optional()?
        .map(SaleRow::into_sale)
        .transpose()
}

/// Returns the stored version of a sale, if the row exists.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn sale_version(
    conn: &mut SqliteConnection,
    id: SaleId,
) -> Result<Option<i64>, PersistenceError> {
    Ok(sales::table
        .filter(sales::sale_id.eq(id.value()))
        .select(sales::version)
        .first::<i64>(conn)
        .optional()?)
}

/// Lists sales matching `filter`.
///
/// # Errors
///
/// Returns an error if the query fails or a row is malformed.
pub fn list_sales(
    conn: &mut SqliteConnection,
    filter: &SaleFilter,
) -> Result<Vec<Sale>, PersistenceError> {
    let mut query = sales::table
        .select(SaleRow::as_select())
        .order(sales::sale_id.asc())
        .into_boxed();
    if let Some(status) = filter.status {
        query = query.filter(sales::status.eq(status.as_str()));
    }
    if let Some(vehicle_id) = filter.vehicle_id {
        query = query.filter(sales::vehicle_id.eq(vehicle_id.value()));
    }
    if let Some(customer_id) = filter.customer_id {
        query = query.filter(sales::customer_id.eq(customer_id.value()));
    }
    query.load(conn)?.into_iter().map(SaleRow::into_sale).collect()
}
