//! Placement tables backing the index
//!
//! Two maps: the base entries (placement plus enclosing scope) and the
//! reverse scope table listing the members of every non-empty scope.
//! The root entry names itself as its scope and is never listed as a member.

use crate::error::{SessionError, SessionResult};
use mos_model::{Placement, PlacementId};
use std::collections::HashMap;

/// Registered placement with its enclosing scope
#[derive(Debug)]
pub(crate) struct Entry {
    pub(crate) element: Placement,
    pub(crate) scope: PlacementId,
}

/// Storage of registered placements
#[derive(Debug)]
pub(crate) struct Table {
    /// Base entries: id -> placement and scope
    entries: HashMap<PlacementId, Entry>,

    /// Reverse index: scope id -> member ids (only non-empty scopes)
    contents: HashMap<PlacementId, Vec<PlacementId>>,

    root: PlacementId,
}

impl Table {
    /// Create tables holding just the root
    pub(crate) fn new(root: Placement) -> Self {
        let root_id = root.id();
        let mut entries = HashMap::new();
        entries.insert(
            root_id,
            Entry {
                element: root,
                scope: root_id,
            },
        );
        Self {
            entries,
            contents: HashMap::new(),
            root: root_id,
        }
    }

    #[inline]
    pub(crate) fn root_id(&self) -> PlacementId {
        self.root
    }

    /// Root placement; its entry is never removed
    #[inline]
    pub(crate) fn root(&self) -> &Placement {
        &self.entries[&self.root].element
    }

    /// Number of entries, root included
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of scope memberships recorded
    pub(crate) fn member_count(&self) -> usize {
        self.contents.values().map(Vec::len).sum()
    }

    #[inline]
    pub(crate) fn contains(&self, id: PlacementId) -> bool {
        self.entries.contains_key(&id)
    }

    #[inline]
    pub(crate) fn entry(&self, id: PlacementId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    #[inline]
    pub(crate) fn fetch_mut(&mut self, id: PlacementId) -> Option<&mut Placement> {
        self.entries.get_mut(&id).map(|entry| &mut entry.element)
    }

    /// Members of a scope; empty for leaves and unknown ids
    #[inline]
    pub(crate) fn contents(&self, scope: PlacementId) -> &[PlacementId] {
        self.contents.get(&scope).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&PlacementId, &Entry)> {
        self.entries.iter()
    }

    pub(crate) fn scopes(&self) -> impl Iterator<Item = (&PlacementId, &Vec<PlacementId>)> {
        self.contents.iter()
    }

    /// Register a placement as member of `scope`
    ///
    /// Caller guarantees `scope` is registered and the id is new.
    pub(crate) fn add_entry(&mut self, element: Placement, scope: PlacementId) -> PlacementId {
        let id = element.id();
        debug_assert!(self.contains(scope));
        debug_assert!(!self.contains(id));

        self.entries.insert(id, Entry { element, scope });
        self.contents.entry(scope).or_default().push(id);
        id
    }

    /// Remove a single placement without members
    ///
    /// # Errors
    /// `NonEmptyScope` while the placement still has members
    pub(crate) fn remove_entry(&mut self, id: PlacementId) -> SessionResult<bool> {
        let Some(entry) = self.entries.get(&id) else {
            return Ok(false);
        };
        let members = self.contents(id).len();
        if members > 0 {
            return Err(SessionError::NonEmptyScope { id, members });
        }

        let scope = entry.scope;
        self.entries.remove(&id);
        self.remove_from_scope(scope, id);
        Ok(true)
    }

    /// Remove a scope together with everything below it
    ///
    /// Returns the number of removed placements.
    pub(crate) fn remove_all(&mut self, scope: PlacementId) -> usize {
        if !self.contains(scope) {
            return 0;
        }
        let removed = self.remove_all_from_scope(scope);
        let parent = self.entries.remove(&scope).map(|entry| entry.scope);
        if let Some(parent) = parent {
            self.remove_from_scope(parent, scope);
        }
        removed + 1
    }

    /// Remove everything below `scope`, keeping `scope` itself
    pub(crate) fn remove_all_from_scope(&mut self, scope: PlacementId) -> usize {
        let mut removed = 0;
        let mut pending = self.contents.remove(&scope).unwrap_or_default();
        while let Some(member) = pending.pop() {
            if let Some(nested) = self.contents.remove(&member) {
                pending.extend(nested);
            }
            if self.entries.remove(&member).is_some() {
                removed += 1;
            }
        }
        removed
    }

    fn remove_from_scope(&mut self, scope: PlacementId, id: PlacementId) {
        if let Some(members) = self.contents.get_mut(&scope) {
            if let Some(pos) = members.iter().position(|m| *m == id) {
                members.swap_remove(pos);
            }
            if members.is_empty() {
                self.contents.remove(&scope);
            }
        }
    }
}
