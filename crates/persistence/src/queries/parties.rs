// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use showroom_domain::{Party, PartyId, Role};
use tracing::debug;

use crate::data_models::PartyRow;
use crate::diesel_schema::parties;
use crate::error::PersistenceError;

/// Retrieves a party by id.
///
/// # Errors
///
/// Returns an error if the query fails or the row is malformed.
/// Returns `Ok(None)` if the party does not exist.
pub fn find_party(
    conn: &mut SqliteConnection,
    id: PartyId,
) -> Result<Option<Party>, PersistenceError> {
    debug!(party_id = id.value(), "Looking up party");
    parties::table
        .filter(parties::party_id.eq(id.value()))
        .select(PartyRow::as_select())
        .first(conn)
        .optional()?
        .map(PartyRow::into_party)
        .transpose()
}

/// Lists parties, optionally restricted to one role.
///
/// # Errors
///
/// Returns an error if the query fails or a row is malformed.
pub fn list_parties(
    conn: &mut SqliteConnection,
    role: Option<Role>,
) -> Result<Vec<Party>, PersistenceError> {
    let mut query = parties::table
        .select(PartyRow::as_select())
        .order(parties::party_id.asc())
        .into_boxed();
    if let Some(role) = role {
        query = query.filter(parties::role.eq(role.as_str()));
    }
    query
        .load(conn)?
        .into_iter()
        .map(PartyRow::into_party)
        .collect()
}
