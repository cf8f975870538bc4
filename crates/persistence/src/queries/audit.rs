// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use showroom_audit::{AuditEvent, Subject};
use tracing::debug;

use crate::data_models::AuditEventRow;
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

/// Retrieves the audit events filed under `subject`, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn events_for_subject(
    conn: &mut SqliteConnection,
    subject: &Subject,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    debug!(kind = %subject.kind, id = subject.id, "Loading audit trail");
    let rows: Vec<AuditEventRow> = audit_events::table
        .filter(audit_events::subject_kind.eq(&subject.kind))
        .filter(audit_events::subject_id.eq(subject.id))
        .select(AuditEventRow::as_select())
        .order(audit_events::event_id.asc())
        .load(conn)?;
    Ok(rows.into_iter().map(AuditEventRow::into_event).collect())
}
