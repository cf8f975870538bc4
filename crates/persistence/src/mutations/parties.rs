// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use showroom_domain::{NewParty, Party, PartyId};
use tracing::{debug, info};

use crate::diesel_schema::parties;
use crate::error::PersistenceError;
use crate::sqlite::get_last_insert_rowid;

/// Inserts a party. New parties are always active.
///
/// # Errors
///
/// Returns `UniqueViolation` if the email is already registered (compared
/// case-insensitively).
pub fn insert_party(
    conn: &mut SqliteConnection,
    party: &NewParty,
) -> Result<Party, PersistenceError> {
    diesel::insert_into(parties::table)
        .values((
            parties::name.eq(&party.name),
            parties::email.eq(&party.email),
            parties::role.eq(party.role.as_str()),
            parties::is_active.eq(1),
        ))
        .execute(conn)?;

    let party_id: i64 = get_last_insert_rowid(conn)?;
    info!(party_id, role = party.role.as_str(), "Party created");

    Ok(Party {
        id: PartyId::new(party_id),
        name: party.name.clone(),
        email: party.email.clone(),
        role: party.role,
        active: true,
    })
}

/// Sets a party's active flag.
///
/// # Errors
///
/// Returns an error if the statement fails. Returns `Ok(0)` if the party
/// does not exist.
pub fn set_party_active(
    conn: &mut SqliteConnection,
    id: PartyId,
    active: bool,
) -> Result<usize, PersistenceError> {
    debug!(party_id = id.value(), active, "Setting party active flag");
    Ok(diesel::update(parties::table.filter(parties::party_id.eq(id.value())))
        .set(parties::is_active.eq(i32::from(active)))
        .execute(conn)?)
}
