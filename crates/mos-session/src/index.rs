//! Placement index
//!
//! Provides [`PlacementIndex`], the registry of all placements within a
//! session. Every registered placement is member of exactly one scope; the
//! model root is its own scope. Lookups by id are O(1).

use crate::config::{SelfCheck, SessionConfig};
use crate::error::{SessionError, SessionResult};
use crate::reference::PlacementRef;
use crate::table::Table;
use crate::validation::{IndexValidator, SelfCheckFailure};
use mos_model::{ModelRoot, Placement, PlacementId, PlacementView, Subject};
use std::iter::FusedIterator;

/// Registry of placements, organised into nested scopes
///
/// # Invariants
/// - the root is always present and is its own scope
/// - every other placement has exactly one registered scope
/// - a placement with members can not be removed singly
#[derive(Debug)]
pub struct PlacementIndex {
    table: Table,
    self_check: SelfCheck,
    max_path_depth: usize,
}

impl PlacementIndex {
    /// Create index around the given root placement
    #[must_use]
    pub fn new(root: Placement) -> Self {
        Self::with_config(root, &SessionConfig::default())
    }

    /// Create index using self-check policy and depth limit from `config`
    #[must_use]
    pub fn with_config(root: Placement, config: &SessionConfig) -> Self {
        tracing::info!("Initialising placement index with root {}", root);
        Self {
            table: Table::new(root),
            self_check: config.effective_self_check(),
            max_path_depth: config.max_path_depth,
        }
    }

    /// Root placement
    #[must_use]
    pub fn root(&self) -> &Placement {
        self.table.root()
    }

    /// Identity of the root placement
    #[inline]
    #[must_use]
    pub fn root_id(&self) -> PlacementId {
        self.table.root_id()
    }

    /// Typed reference onto the root
    #[inline]
    #[must_use]
    pub fn root_ref(&self) -> PlacementRef<ModelRoot> {
        PlacementRef::from_checked(self.root_id())
    }

    /// Upper bound for scope chains walked upwards
    #[inline]
    #[must_use]
    pub fn max_path_depth(&self) -> usize {
        self.max_path_depth
    }

    /// Number of registered placements, root excluded
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len() - 1
    }

    /// Check if nothing but the root is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the id is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, id: PlacementId) -> bool {
        self.table.contains(id)
    }

    /// All registered ids, root included, in no particular order
    pub fn ids(&self) -> impl Iterator<Item = PlacementId> + '_ {
        self.table.entries().map(|(id, _)| *id)
    }

    /// Look up a placement
    ///
    /// # Errors
    /// `NotInSession` if the id is not registered
    pub fn find(&self, id: PlacementId) -> SessionResult<&Placement> {
        self.table
            .entry(id)
            .map(|entry| &entry.element)
            .ok_or(SessionError::NotInSession { id })
    }

    /// Look up a placement for modification of its pin
    ///
    /// # Errors
    /// `NotInSession` if the id is not registered
    pub fn find_mut(&mut self, id: PlacementId) -> SessionResult<&mut Placement> {
        self.table
            .fetch_mut(id)
            .ok_or(SessionError::NotInSession { id })
    }

    /// Look up a placement, viewing its object as `T`
    ///
    /// # Errors
    /// - `NotInSession` if the id is not registered
    /// - `PlacementTypeMismatch` if the object can not be viewed as `T`
    pub fn find_as<T: Subject + ?Sized>(
        &self,
        id: PlacementId,
    ) -> SessionResult<PlacementView<'_, T>> {
        let placement = self.find(id)?;
        PlacementView::try_new(placement).ok_or_else(|| SessionError::PlacementTypeMismatch {
            id,
            expected: T::type_name(),
            actual: placement.subject().kind(),
        })
    }

    /// Placement of the scope enclosing `id`
    ///
    /// The root yields itself.
    ///
    /// # Errors
    /// `NotInSession` if the id is not registered
    pub fn get_scope(&self, id: PlacementId) -> SessionResult<&Placement> {
        let scope = self.get_scope_id(id)?;
        self.find(scope)
    }

    /// Identity of the scope enclosing `id`
    ///
    /// # Errors
    /// `NotInSession` if the id is not registered
    pub fn get_scope_id(&self, id: PlacementId) -> SessionResult<PlacementId> {
        self.table
            .entry(id)
            .map(|entry| entry.scope)
            .ok_or(SessionError::NotInSession { id })
    }

    /// Placements directly within the scope of `id`
    ///
    /// Lazy; order unspecified. Empty for placements without members.
    ///
    /// # Errors
    /// `NotInSession` if the id is not registered
    pub fn get_referrers(&self, id: PlacementId) -> SessionResult<Referrers<'_>> {
        if !self.contains(id) {
            return Err(SessionError::NotInSession { id });
        }
        Ok(Referrers {
            table: &self.table,
            members: self.table.contents(id).iter(),
        })
    }

    /// Number of placements directly within the scope of `id`
    #[inline]
    #[must_use]
    pub fn member_count(&self, id: PlacementId) -> usize {
        self.table.contents(id).len()
    }

    /// Register a placement as member of `scope`
    ///
    /// Takes ownership; the placement keeps its identity, which is returned.
    ///
    /// # Errors
    /// `InvalidScope` if `scope` is not registered
    pub fn insert(
        &mut self,
        placement: Placement,
        scope: PlacementId,
    ) -> SessionResult<PlacementId> {
        if !self.contains(scope) {
            return Err(SessionError::InvalidScope(format!(
                "can not attach {placement}: scope {scope} is not registered"
            )));
        }
        tracing::debug!("Inserting {} into scope {}", placement, scope.short());
        let id = self.table.add_entry(placement, scope);
        self.after_mutation();
        Ok(id)
    }

    /// Register a placement, returning a reference typed as `T`
    ///
    /// # Errors
    /// - `PlacementTypeMismatch` if the object is not compatible with `T`;
    ///   the index stays unchanged
    /// - `InvalidScope` if `scope` is not registered
    pub fn insert_as<T: Subject + ?Sized>(
        &mut self,
        placement: Placement,
        scope: PlacementId,
    ) -> SessionResult<PlacementRef<T>> {
        if !placement.is_compatible::<T>() {
            return Err(SessionError::PlacementTypeMismatch {
                id: placement.id(),
                expected: T::type_name(),
                actual: placement.subject().kind(),
            });
        }
        let id = self.insert(placement, scope)?;
        Ok(PlacementRef::from_checked(id))
    }

    /// Remove a single placement
    ///
    /// Returns `false` if the id was not registered.
    ///
    /// # Errors
    /// - `ModelRoot` for the root
    /// - `NonEmptyScope` while the placement still has members
    pub fn remove(&mut self, id: PlacementId) -> SessionResult<bool> {
        if id == self.root_id() {
            return Err(SessionError::ModelRoot { id });
        }
        let removed = self.table.remove_entry(id)?;
        if removed {
            tracing::debug!("Removed placement {}", id.short());
            self.after_mutation();
        }
        Ok(removed)
    }

    /// Remove a scope with everything below it
    ///
    /// For the root this purges all contents, keeping the root.
    /// Returns the number of removed placements.
    ///
    /// # Errors
    /// `NotInSession` if the id is not registered
    pub fn clear_scope(&mut self, id: PlacementId) -> SessionResult<usize> {
        if id == self.root_id() {
            return Ok(self.clear());
        }
        if !self.contains(id) {
            return Err(SessionError::NotInSession { id });
        }
        let removed = self.table.remove_all(id);
        tracing::debug!("Cleared scope {} ({} placements)", id.short(), removed);
        self.after_mutation();
        Ok(removed)
    }

    /// Remove everything but the root
    ///
    /// Returns the number of removed placements.
    pub fn clear(&mut self) -> usize {
        let root = self.root_id();
        let removed = self.table.remove_all_from_scope(root);
        tracing::info!("Purged placement index ({} placements)", removed);
        self.after_mutation();
        removed
    }

    /// Verify internal consistency
    ///
    /// # Errors
    /// Returns the first failed check
    pub fn verify(&self) -> Result<(), SelfCheckFailure> {
        IndexValidator::new(self.max_path_depth).verify(&self.table)
    }

    /// Verify internal consistency, logging a failure
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self.verify() {
            Ok(()) => true,
            Err(failure) => {
                tracing::error!("Placement index corrupted: {}", failure);
                false
            }
        }
    }

    fn after_mutation(&self) {
        if self.self_check != SelfCheck::OnMutation {
            return;
        }
        if let Err(failure) = self.verify() {
            tracing::error!("Placement index corrupted: {}", failure);
            #[cfg(feature = "strict-debug")]
            panic!("placement index corrupted: {failure}");
        }
    }
}

/// Lazy iteration over the members of a scope
#[derive(Debug, Clone)]
pub struct Referrers<'a> {
    table: &'a Table,
    members: std::slice::Iter<'a, PlacementId>,
}

impl<'a> Iterator for Referrers<'a> {
    type Item = &'a Placement;

    fn next(&mut self) -> Option<Self::Item> {
        let table = self.table;
        self.members
            .by_ref()
            .find_map(|id| table.entry(*id).map(|entry| &entry.element))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.members.size_hint().1)
    }
}

impl FusedIterator for Referrers<'_> {}
