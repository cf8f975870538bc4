// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Table-driven status lifecycles.
//!
//! Every status enum in the domain declares its legal transitions as a
//! static table. Workflows validate a change against the table before any
//! write happens; anything not listed is rejected.

use crate::error::DomainError;

/// A status enum whose legal transitions are listed in a static table.
pub trait Lifecycle: Copy + PartialEq + 'static {
    /// Entity name used in error messages (e.g. `"sale"`).
    const ENTITY: &'static str;

    /// Every permitted `(from, to)` pair.
    const TRANSITIONS: &'static [(Self, Self)];

    /// Returns the persisted string form of the status.
    fn as_str(&self) -> &'static str;

    /// Returns true if the table permits moving from `self` to `to`.
    fn can_transition_to(self, to: Self) -> bool {
        Self::TRANSITIONS.contains(&(self, to))
    }

    /// Returns true if no transition leaves this status.
    fn is_terminal(self) -> bool {
        !Self::TRANSITIONS.iter().any(|(from, _)| *from == self)
    }

    /// Validates a transition against the table.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStatusTransition` if the pair is not listed.
    fn validate_transition(self, to: Self) -> Result<(), DomainError> {
        if self.can_transition_to(to) {
            return Ok(());
        }

        let reason: &str = if self.is_terminal() {
            "cannot transition from terminal state"
        } else {
            "transition not permitted by status lifecycle rules"
        };

        Err(DomainError::InvalidStatusTransition {
            entity: Self::ENTITY,
            from: self.as_str().to_string(),
            to: to.as_str().to_string(),
            reason: reason.to_string(),
        })
    }
}
