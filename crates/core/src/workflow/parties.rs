// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde_json::{Value, json};
use showroom_audit::{Actor, Cause, Subject};
use showroom_domain::{DomainError, NewParty, Party, PartyId, Role, validate_party_fields};
use tracing::info;

use super::{AuditEntry, Context, record};
use crate::clock::Clock;
use crate::error::CoreError;
use crate::store::WorkflowStore;

/// The party registry: resolves identities and roles.
pub struct Parties<'a, S, C> {
    store: &'a S,
    clock: &'a C,
}

impl<'a, S: WorkflowStore, C: Clock> Parties<'a, S, C> {
    pub(crate) const fn new(store: &'a S, clock: &'a C) -> Self {
        Self { store, clock }
    }

    /// Registers a new, active party.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank name or malformed email, and
    /// `Conflict` if the email is already registered.
    pub fn register(
        &self,
        actor: &Actor,
        cause: &Cause,
        party: NewParty,
    ) -> Result<Party, CoreError> {
        validate_party_fields(&party)?;
        let ctx = Context::new(self.clock, actor, cause);

        let stored: Party = self.store.atomically(|uow| {
            let stored: Party = uow.insert_party(&party)?;
            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "RegisterParty",
                    details: Some(format!("role {}", stored.role.as_str())),
                    subject: Subject::new("party", stored.id.value()),
                    before: Value::Null,
                    after: json!({
                        "name": stored.name,
                        "email": stored.email,
                        "role": stored.role,
                    }),
                },
            )?;
            Ok(stored)
        })?;

        info!(party_id = %stored.id, role = stored.role.as_str(), "Registered party");
        Ok(stored)
    }

    /// Registers the first administrator.
    ///
    /// Only succeeds while no administrator exists; the check and the insert
    /// happen in one unit, so concurrent bootstraps cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` once an administrator exists, and `InvalidInput`
    /// for invalid name or email.
    pub fn bootstrap_admin(
        &self,
        cause: &Cause,
        name: &str,
        email: &str,
    ) -> Result<Party, CoreError> {
        let party = NewParty {
            name: name.to_string(),
            email: email.to_string(),
            role: Role::Admin,
        };
        validate_party_fields(&party)?;
        let system = Actor::new(String::from("system"), String::from("bootstrap"));
        let ctx = Context::new(self.clock, &system, cause);

        let stored: Party = self.store.atomically(|uow| {
            if !uow.list_parties(Some(Role::Admin))?.is_empty() {
                return Err(DomainError::AdminAlreadyExists.into());
            }
            let stored: Party = uow.insert_party(&party)?;
            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "BootstrapAdmin",
                    details: None,
                    subject: Subject::new("party", stored.id.value()),
                    before: Value::Null,
                    after: json!({
                        "name": stored.name,
                        "email": stored.email,
                        "role": stored.role,
                    }),
                },
            )?;
            Ok(stored)
        })?;

        info!(party_id = %stored.id, "Bootstrapped first administrator");
        Ok(stored)
    }

    /// Deactivates a party. Inactive parties cannot authenticate and no
    /// longer resolve as customer, sales person or payment processor.
    ///
    /// Deactivating an already inactive party leaves it inactive.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the party does not exist, and `InvalidState`
    /// if it is the last active administrator.
    pub fn deactivate(
        &self,
        actor: &Actor,
        cause: &Cause,
        id: PartyId,
    ) -> Result<Party, CoreError> {
        let ctx = Context::new(self.clock, actor, cause);

        let stored: Party = self.store.atomically(|uow| {
            let before: Party = uow
                .find_party(id)?
                .ok_or(DomainError::PartyNotFound(id))?;
            if before.active && before.role == Role::Admin {
                let other_admins: usize = uow
                    .list_parties(Some(Role::Admin))?
                    .iter()
                    .filter(|p| p.active && p.id != id)
                    .count();
                if other_admins == 0 {
                    return Err(DomainError::LastActiveAdmin(id).into());
                }
            }

            let after: Party = uow.set_party_active(id, false)?;
            record(
                uow,
                &ctx,
                AuditEntry {
                    action: "DeactivateParty",
                    details: Some(format!("role {}", after.role.as_str())),
                    subject: Subject::new("party", id.value()),
                    before: json!({ "active": before.active }),
                    after: json!({ "active": after.active }),
                },
            )?;
            Ok(after)
        })?;

        info!(party_id = %id, role = stored.role.as_str(), "Deactivated party");
        Ok(stored)
    }

    /// Returns true if at least one active administrator exists.
    ///
    /// # Errors
    ///
    /// Returns a `Storage` error if the store cannot be read.
    pub fn has_admin(&self) -> Result<bool, CoreError> {
        self.store.snapshot(|uow| {
            Ok(uow
                .list_parties(Some(Role::Admin))?
                .iter()
                .any(|p| p.active))
        })
    }

    /// Looks up a party.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the party does not exist.
    pub fn get(&self, id: PartyId) -> Result<Party, CoreError> {
        self.store.snapshot(|uow| {
            uow.find_party(id)?
                .ok_or_else(|| DomainError::PartyNotFound(id).into())
        })
    }

    /// Lists parties, optionally narrowed to one role.
    ///
    /// # Errors
    ///
    /// Returns a `Storage` error if the store cannot be read.
    pub fn list(&self, role: Option<Role>) -> Result<Vec<Party>, CoreError> {
        self.store.snapshot(|uow| uow.list_parties(role))
    }
}
