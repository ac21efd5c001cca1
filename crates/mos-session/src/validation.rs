//! Self-check of the placement tables
//!
//! Walks base entries and scope table and verifies they describe one
//! consistent tree below the model root.

use crate::table::Table;
use mos_model::PlacementId;
use std::fmt::Display;

/// Failed self-check, naming the violated check
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("self-check ({check}) failed: {message}")]
pub struct SelfCheckFailure {
    /// Check code, grouped as 0.x basics, 1.x elements, 2.x scopes, 4.x storage
    pub check: &'static str,
    /// What was found
    pub message: String,
}

impl SelfCheckFailure {
    fn new(check: &'static str, message: impl Display) -> Self {
        Self {
            check,
            message: message.to_string(),
        }
    }
}

/// Consistency validator for [`Table`]
#[derive(Debug, Clone, Copy)]
pub(crate) struct IndexValidator {
    max_depth: usize,
}

impl IndexValidator {
    #[inline]
    pub(crate) fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Run all checks, stopping at the first failure
    pub(crate) fn verify(self, table: &Table) -> Result<(), SelfCheckFailure> {
        Self::check_basics(table)?;
        self.check_elements(table)?;
        Self::check_scopes(table)?;
        Self::check_storage(table)
    }

    fn check_basics(table: &Table) -> Result<(), SelfCheckFailure> {
        let root = table.root_id();
        let Some(entry) = table.entry(root) else {
            return Err(SelfCheckFailure::new("0.1", "model root not registered"));
        };
        if !entry.element.is_valid() {
            return Err(SelfCheckFailure::new(
                "0.2",
                format_args!("model root {} fails its self-check", entry.element),
            ));
        }
        if entry.scope != root {
            return Err(SelfCheckFailure::new("0.3", "model root is not its own scope"));
        }
        Ok(())
    }

    fn check_elements(self, table: &Table) -> Result<(), SelfCheckFailure> {
        let root = table.root_id();
        for (id, entry) in table.entries() {
            if entry.element.id() != *id {
                return Err(SelfCheckFailure::new(
                    "1.1",
                    format_args!("entry {id} holds placement {}", entry.element.id()),
                ));
            }
            if *id == root {
                continue;
            }
            if !table.contains(entry.scope) {
                return Err(SelfCheckFailure::new(
                    "1.2",
                    format_args!("scope {} of {id} is not registered", entry.scope),
                ));
            }
            if !table.contents(entry.scope).contains(id) {
                return Err(SelfCheckFailure::new(
                    "1.3",
                    format_args!("{id} missing from the members of its scope {}", entry.scope),
                ));
            }
            self.check_ascension(table, *id)?;
        }
        Ok(())
    }

    fn check_ascension(self, table: &Table, start: PlacementId) -> Result<(), SelfCheckFailure> {
        let root = table.root_id();
        let mut current = start;
        for _ in 0..self.max_depth {
            if current == root {
                return Ok(());
            }
            current = match table.entry(current) {
                Some(entry) => entry.scope,
                None => {
                    return Err(SelfCheckFailure::new(
                        "1.4",
                        format_args!("scope chain of {start} breaks at {current}"),
                    ))
                }
            };
        }
        Err(SelfCheckFailure::new(
            "1.5",
            format_args!(
                "scope chain of {start} does not reach the root within {} steps",
                self.max_depth
            ),
        ))
    }

    fn check_scopes(table: &Table) -> Result<(), SelfCheckFailure> {
        for (scope, members) in table.scopes() {
            if !table.contains(*scope) {
                return Err(SelfCheckFailure::new(
                    "2.1",
                    format_args!("scope {scope} has members but is not registered"),
                ));
            }
            if members.is_empty() {
                return Err(SelfCheckFailure::new(
                    "2.2",
                    format_args!("empty member list recorded for {scope}"),
                ));
            }
            for member in members {
                match table.entry(*member) {
                    None => {
                        return Err(SelfCheckFailure::new(
                            "2.3",
                            format_args!("member {member} of {scope} is not registered"),
                        ))
                    }
                    Some(entry) if entry.scope != *scope => {
                        return Err(SelfCheckFailure::new(
                            "2.4",
                            format_args!(
                                "member {member} listed in {scope} but placed into {}",
                                entry.scope
                            ),
                        ))
                    }
                    Some(_) if *member == table.root_id() => {
                        return Err(SelfCheckFailure::new(
                            "2.5",
                            "model root listed as a scope member",
                        ))
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    fn check_storage(table: &Table) -> Result<(), SelfCheckFailure> {
        let members = table.member_count();
        if table.len() != members + 1 {
            return Err(SelfCheckFailure::new(
                "4.1",
                format_args!(
                    "{} entries registered, but {members} scope memberships recorded",
                    table.len()
                ),
            ));
        }
        Ok(())
    }
}
