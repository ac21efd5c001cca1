//! Scopes
//!
//! A [`Scope`] is the region of the model anchored at one placement: the
//! placement itself plus everything registered below it.

use crate::error::{SessionError, SessionResult};
use crate::index::PlacementIndex;
use crate::reference::PlacementRef;
use mos_model::{Placement, PlacementId};
use std::fmt::{self, Display, Formatter};
use std::iter::FusedIterator;

/// Region of the model anchored at a placement
///
/// Equality is anchor identity. [`Scope::INVALID`] anchors nowhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Scope {
    anchor: PlacementRef,
}

impl Scope {
    /// Scope anchored nowhere
    pub const INVALID: Self = Self {
        anchor: PlacementRef::unbound(),
    };

    /// Scope anchored at a registered placement
    ///
    /// # Errors
    /// `NotInSession` if the id is not registered
    pub fn new(index: &PlacementIndex, anchor: PlacementId) -> SessionResult<Self> {
        index.find(anchor)?;
        Ok(Self::at(anchor))
    }

    /// Scope enclosing the given placement
    ///
    /// # Errors
    /// `NotInSession` if the id is not registered
    pub fn containing(index: &PlacementIndex, id: PlacementId) -> SessionResult<Self> {
        index.get_scope_id(id).map(Self::at)
    }

    /// Scope anchored at the model root
    #[must_use]
    pub fn root(index: &PlacementIndex) -> Self {
        Self::at(index.root_id())
    }

    #[inline]
    pub(crate) fn at(anchor: PlacementId) -> Self {
        Self {
            anchor: PlacementRef::from(anchor),
        }
    }

    /// Reference to the anchor placement
    #[inline]
    #[must_use]
    pub fn anchor(&self) -> PlacementRef {
        self.anchor
    }

    /// Identity of the anchor; `None` for [`Scope::INVALID`]
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<PlacementId> {
        self.anchor.id()
    }

    /// Anchor placement
    ///
    /// # Errors
    /// - `BottomPlacementRef` for [`Scope::INVALID`]
    /// - `NotInSession` if the anchor has left the index
    pub fn top<'i>(&self, index: &'i PlacementIndex) -> SessionResult<&'i Placement> {
        Ok(self.anchor.resolve(index)?.placement())
    }

    /// Check if the anchor is registered
    #[inline]
    #[must_use]
    pub fn is_valid(&self, index: &PlacementIndex) -> bool {
        self.id().is_some_and(|id| index.contains(id))
    }

    /// Check if anchored at the model root
    #[inline]
    #[must_use]
    pub fn is_root(&self, index: &PlacementIndex) -> bool {
        self.id() == Some(index.root_id())
    }

    /// Enclosing scope
    ///
    /// # Errors
    /// - `NoParentScope` at the root
    /// - `InvalidScope` for [`Scope::INVALID`]
    /// - `NotInSession` if the anchor has left the index
    pub fn parent(&self, index: &PlacementIndex) -> SessionResult<Self> {
        let id = self
            .id()
            .ok_or_else(|| SessionError::InvalidScope("unanchored scope has no parent".into()))?;
        if id == index.root_id() {
            return Err(SessionError::NoParentScope { id });
        }
        Self::containing(index, id)
    }

    /// Lazy walk from this scope up to the root, both inclusive
    ///
    /// Ends early if the chain breaks or exceeds the configured depth.
    #[must_use]
    pub fn ascend<'i>(&self, index: &'i PlacementIndex) -> Ascend<'i> {
        Ascend {
            index,
            next: self.id(),
            remaining: index.max_path_depth(),
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => f.write_str(&id.short()),
            None => f.write_str("?"),
        }
    }
}

/// Iterator returned by [`Scope::ascend`]
#[derive(Debug, Clone)]
pub struct Ascend<'i> {
    index: &'i PlacementIndex,
    next: Option<PlacementId>,
    remaining: usize,
}

impl Iterator for Ascend<'_> {
    type Item = Scope;

    fn next(&mut self) -> Option<Scope> {
        let id = self.next.take()?;
        if !self.index.contains(id) {
            return None;
        }
        if self.remaining == 0 {
            tracing::warn!("Scope chain exceeds maximum depth at {}", id.short());
            return None;
        }
        self.remaining -= 1;
        if id != self.index.root_id() {
            self.next = self.index.get_scope_id(id).ok();
        }
        Some(Scope::at(id))
    }
}

impl FusedIterator for Ascend<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use mos_model::{Clip, Fork, ModelRoot, Time};

    struct Chain {
        index: PlacementIndex,
        outer: PlacementId,
        inner: PlacementId,
        clip: PlacementId,
    }

    fn chain(config: &SessionConfig) -> Chain {
        let mut index =
            PlacementIndex::with_config(Placement::new(ModelRoot::new("test")), config);
        let root = index.root_id();
        let outer = index.insert(Placement::new(Fork::new("outer")), root).unwrap();
        let inner = index.insert(Placement::new(Fork::new("inner")), outer).unwrap();
        let clip = index
            .insert(Placement::new(Clip::new("c", Time::from_secs(1))), inner)
            .unwrap();
        Chain {
            index,
            outer,
            inner,
            clip,
        }
    }

    #[test]
    fn parent_walks_one_level() {
        let c = chain(&SessionConfig::default());
        let scope = Scope::containing(&c.index, c.clip).unwrap();
        assert_eq!(scope.id(), Some(c.inner));
        assert_eq!(scope.parent(&c.index).unwrap().id(), Some(c.outer));

        let root = Scope::root(&c.index);
        assert!(root.is_root(&c.index));
        assert!(matches!(
            root.parent(&c.index),
            Err(SessionError::NoParentScope { .. })
        ));
    }

    #[test]
    fn ascend_reaches_root() {
        let c = chain(&SessionConfig::default());
        let ids: Vec<_> = Scope::new(&c.index, c.clip)
            .unwrap()
            .ascend(&c.index)
            .filter_map(|s| s.id())
            .collect();
        assert_eq!(ids, vec![c.clip, c.inner, c.outer, c.index.root_id()]);
    }

    #[test]
    fn ascend_respects_depth_limit() {
        let c = chain(&SessionConfig::default().with_max_path_depth(2));
        let scope = Scope::new(&c.index, c.clip).unwrap();
        assert_eq!(scope.ascend(&c.index).count(), 2);
    }

    #[test]
    fn invalid_scope() {
        let c = chain(&SessionConfig::default());
        assert!(!Scope::INVALID.is_valid(&c.index));
        assert_eq!(Scope::INVALID.ascend(&c.index).count(), 0);
        assert!(matches!(
            Scope::INVALID.parent(&c.index),
            Err(SessionError::InvalidScope(_))
        ));
        assert!(Scope::new(&c.index, PlacementId::fresh()).is_err());
        assert_eq!(Scope::INVALID.to_string(), "?");
    }

    #[test]
    fn top_resolves_anchor() {
        let c = chain(&SessionConfig::default());
        let scope = Scope::new(&c.index, c.inner).unwrap();
        assert_eq!(scope.top(&c.index).unwrap().id(), c.inner);
    }
}
