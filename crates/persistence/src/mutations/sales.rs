// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use showroom_domain::{NewSale, Sale, SaleId, SaleStatus};
use tracing::{debug, info};

use crate::data_models::format_timestamp;
use crate::diesel_schema::sales;
use crate::error::PersistenceError;
use crate::sqlite::get_last_insert_rowid;

/// Inserts a pending sale at version 1.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_sale(conn: &mut SqliteConnection, sale: &NewSale) -> Result<Sale, PersistenceError> {
    diesel::insert_into(sales::table)
        .values((
            sales::vehicle_id.eq(sale.vehicle_id.value()),
            sales::customer_id.eq(sale.customer_id.value()),
            sales::sales_person_id.eq(sale.sales_person_id.value()),
            sales::status.eq(SaleStatus::Pending.as_str()),
            sales::sale_price_cents.eq(sale.sale_price.cents()),
            sales::notes.eq(sale.notes.as_deref()),
            sales::created_at.eq(format_timestamp(sale.created_at)?),
            sales::version.eq(1_i64),
        ))
        .execute(conn)?;

    let sale_id: i64 = get_last_insert_rowid(conn)?;
    info!(sale_id, vehicle_id = sale.vehicle_id.value(), "Sale created");

    Ok(Sale {
        id: SaleId::new(sale_id),
        vehicle_id: sale.vehicle_id,
        customer_id: sale.customer_id,
        sales_person_id: sale.sales_person_id,
        status: SaleStatus::Pending,
        sale_price: sale.sale_price,
        notes: sale.notes.clone(),
        created_at: sale.created_at,
        completed_at: None,
        version: 1,
    })
}

/// Writes the mutable columns of `sale` if its version is still current.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_sale(conn: &mut SqliteConnection, sale: &Sale) -> Result<usize, PersistenceError> {
    debug!(
        sale_id = sale.id.value(),
        version = sale.version,
        status = sale.status.as_str(),
        "Updating sale"
    );
    let completed_at: Option<String> = sale.completed_at.map(format_timestamp).transpose()?;
    Ok(diesel::update(
        sales::table
            .filter(sales::sale_id.eq(sale.id.value()))
            .filter(sales::version.eq(sale.version)),
    )
    .set((
        sales::status.eq(sale.status.as_str()),
        sales::sale_price_cents.eq(sale.sale_price.cents()),
        sales::notes.eq(sale.notes.as_deref()),
        sales::completed_at.eq(completed_at),
        sales::version.eq(sale.version + 1),
    ))
    .execute(conn)?)
}

/// Deletes `sale` if its version is still current.
///
/// # Errors
///
/// Returns an error if the delete fails, including when transactions still
/// reference the sale.
pub fn delete_sale(conn: &mut SqliteConnection, sale: &Sale) -> Result<usize, PersistenceError> {
    info!(sale_id = sale.id.value(), "Deleting sale");
    Ok(diesel::delete(
        sales::table
            .filter(sales::sale_id.eq(sale.id.value()))
            .filter(sales::version.eq(sale.version)),
    )
    .execute(conn)?)
}
