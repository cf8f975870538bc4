// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use showroom_audit::AuditEvent;
use tracing::debug;

use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;
use crate::sqlite::get_last_insert_rowid;

/// Appends an audit event and returns it with its assigned id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn append_audit_event(
    conn: &mut SqliteConnection,
    event: &AuditEvent,
) -> Result<AuditEvent, PersistenceError> {
    diesel::insert_into(audit_events::table)
        .values((
            audit_events::actor_id.eq(&event.actor.id),
            audit_events::actor_type.eq(&event.actor.actor_type),
            audit_events::cause_id.eq(&event.cause.id),
            audit_events::cause_description.eq(&event.cause.description),
            audit_events::action_name.eq(&event.action.name),
            audit_events::action_details.eq(event.action.details.as_deref()),
            audit_events::subject_kind.eq(&event.subject.kind),
            audit_events::subject_id.eq(event.subject.id),
            audit_events::before_snapshot_json.eq(&event.before.data),
            audit_events::after_snapshot_json.eq(&event.after.data),
            audit_events::recorded_at.eq(&event.recorded_at),
        ))
        .execute(conn)?;

    let event_id: i64 = get_last_insert_rowid(conn)?;
    debug!(event_id, action = %event.action.name, "Audit event persisted");

    Ok(event.clone().with_event_id(event_id))
}
