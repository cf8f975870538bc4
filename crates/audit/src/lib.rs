// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

//! Audit trail types.
//!
//! Every successful workflow operation records exactly one [`AuditEvent`]
//! in the same atomic unit as the writes it describes. Events are
//! append-only: once stored they are never updated or deleted.

#[cfg(test)]
mod tests;

/// The party performing an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// The party identifier, as text.
    pub id: String,
    /// The role the party acted under (e.g. "sales", "cashier").
    pub actor_type: String,
}

impl Actor {
    /// Creates a new Actor.
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self { id, actor_type }
    }
}

/// The request or trigger behind an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause {
    /// A unique identifier for this cause (e.g. request ID).
    pub id: String,
    /// A description of the cause.
    pub description: String,
}

impl Cause {
    /// Creates a new Cause.
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// What was done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// The name of the action (e.g. "`ProcessTransaction`").
    pub name: String,
    /// Optional additional details about the action.
    pub details: Option<String>,
}

impl Action {
    /// Creates a new Action.
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// The entity an event is filed under.
///
/// Cascading operations touch several entities; the subject is the one the
/// caller addressed (the transaction for a refund, the sale for a cancel).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subject {
    /// Entity kind: "vehicle", "sale", "transaction", "test_drive" or "party".
    pub kind: String,
    /// The entity identifier.
    pub id: i64,
}

impl Subject {
    /// Creates a new Subject.
    #[must_use]
    pub fn new(kind: &str, id: i64) -> Self {
        Self {
            kind: kind.to_string(),
            id,
        }
    }
}

/// Serialized state of the touched entities at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    /// JSON text.
    pub data: String,
}

impl StateSnapshot {
    /// Creates a new `StateSnapshot`.
    #[must_use]
    pub const fn new(data: String) -> Self {
        Self { data }
    }

    /// Snapshot for the side of a change where nothing existed.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            data: String::from("null"),
        }
    }
}

/// An immutable audit event representing a state transition.
///
/// Captures:
/// - Who performed the action (actor)
/// - Why it was performed (cause)
/// - What action was performed (action)
/// - Which entity it was performed on (subject)
/// - The state before and after the transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Assigned by the store on append; `None` before persistence.
    pub event_id: Option<i64>,
    pub actor: Actor,
    pub cause: Cause,
    pub action: Action,
    pub subject: Subject,
    pub before: StateSnapshot,
    pub after: StateSnapshot,
    /// RFC 3339 time the event was recorded.
    pub recorded_at: String,
}

impl AuditEvent {
    /// Creates a new, not yet persisted `AuditEvent`.
    #[must_use]
    pub const fn new(
        actor: Actor,
        cause: Cause,
        action: Action,
        subject: Subject,
        before: StateSnapshot,
        after: StateSnapshot,
        recorded_at: String,
    ) -> Self {
        Self {
            event_id: None,
            actor,
            cause,
            action,
            subject,
            before,
            after,
            recorded_at,
        }
    }

    /// Returns the event with the identifier assigned by the store.
    #[must_use]
    pub fn with_event_id(self, event_id: i64) -> Self {
        Self {
            event_id: Some(event_id),
            ..self
        }
    }
}
