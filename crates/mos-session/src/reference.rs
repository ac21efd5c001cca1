//! Placement references
//!
//! A [`PlacementRef`] is a small, copyable handle naming a registered
//! placement by identity. It holds no ownership; every access resolves
//! through the [`PlacementIndex`], so a reference to a removed placement
//! turns dangling instead of keeping it alive.

use crate::error::{SessionError, SessionResult};
use crate::index::PlacementIndex;
use mos_model::{MObject, Placement, PlacementId, PlacementView, Subject};
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Typed, non-owning reference to a registered placement
///
/// `T` records the type the referenced object was checked against when the
/// reference was bound. A default-constructed reference is unbound.
pub struct PlacementRef<T: ?Sized = dyn MObject> {
    id: Option<PlacementId>,
    _subject: PhantomData<fn() -> *const T>,
}

impl<T: ?Sized> PlacementRef<T> {
    /// Unbound reference
    #[inline]
    #[must_use]
    pub const fn unbound() -> Self {
        Self {
            id: None,
            _subject: PhantomData,
        }
    }

    /// Reference to an id already checked against `T`
    #[inline]
    pub(crate) const fn from_checked(id: PlacementId) -> Self {
        Self {
            id: Some(id),
            _subject: PhantomData,
        }
    }

    /// Identity of the referenced placement
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<PlacementId> {
        self.id
    }

    /// Check if the reference names a placement at all
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.id.is_some()
    }

    /// Drop the binding
    #[inline]
    pub fn reset(&mut self) {
        self.id = None;
    }
}

impl<T: Subject + ?Sized> PlacementRef<T> {
    /// Bind to a registered placement, checking its type
    ///
    /// # Errors
    /// - `NotInSession` if the id is not registered
    /// - `PlacementTypeMismatch` if the object can not be viewed as `T`
    pub fn bind(index: &PlacementIndex, id: PlacementId) -> SessionResult<Self> {
        index.find_as::<T>(id)?;
        Ok(Self::from_checked(id))
    }

    /// Reference to the given placement, checking its type
    ///
    /// The placement need not be registered yet; resolving the reference
    /// fails until it is.
    ///
    /// # Errors
    /// `PlacementTypeMismatch` if the object can not be viewed as `T`
    pub fn from_placement(placement: &Placement) -> SessionResult<Self> {
        if !placement.is_compatible::<T>() {
            return Err(SessionError::PlacementTypeMismatch {
                id: placement.id(),
                expected: T::type_name(),
                actual: placement.subject().kind(),
            });
        }
        Ok(Self::from_checked(placement.id()))
    }

    /// Rebind the same placement under another type
    ///
    /// # Errors
    /// - `BottomPlacementRef` if unbound
    /// - whatever [`bind`](PlacementRef::bind) reports for `U`
    pub fn recast<U: Subject + ?Sized>(
        &self,
        index: &PlacementIndex,
    ) -> SessionResult<PlacementRef<U>> {
        let id = self.id.ok_or(SessionError::BottomPlacementRef)?;
        PlacementRef::bind(index, id)
    }

    /// Check if the reference currently resolves
    #[must_use]
    pub fn is_valid(&self, index: &PlacementIndex) -> bool {
        self.resolve(index).is_ok()
    }

    /// Resolve to the referenced placement, viewed as `T`
    ///
    /// # Errors
    /// - `BottomPlacementRef` if unbound
    /// - `NotInSession` if the placement has been removed
    pub fn resolve<'i>(&self, index: &'i PlacementIndex) -> SessionResult<PlacementView<'i, T>> {
        let id = self.id.ok_or(SessionError::BottomPlacementRef)?;
        index.find_as::<T>(id)
    }

    /// Resolve for modification of the placement's pin
    ///
    /// # Errors
    /// Same as [`resolve`](Self::resolve)
    pub fn resolve_mut<'i>(
        &self,
        index: &'i mut PlacementIndex,
    ) -> SessionResult<&'i mut Placement> {
        let id = self.id.ok_or(SessionError::BottomPlacementRef)?;
        index.find_as::<T>(id)?;
        index.find_mut(id)
    }

    /// Number of owners sharing the referenced object; 0 if not resolvable
    #[must_use]
    pub fn use_count(&self, index: &PlacementIndex) -> usize {
        self.resolve(index)
            .map_or(0, |view| view.placement().use_count())
    }
}

impl<T: ?Sized> Default for PlacementRef<T> {
    fn default() -> Self {
        Self::unbound()
    }
}

impl<T: ?Sized> Clone for PlacementRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for PlacementRef<T> {}

impl<T: ?Sized, U: ?Sized> PartialEq<PlacementRef<U>> for PlacementRef<T> {
    fn eq(&self, other: &PlacementRef<U>) -> bool {
        self.id == other.id
    }
}

impl<T: ?Sized> Eq for PlacementRef<T> {}

impl<T: ?Sized> PartialEq<PlacementId> for PlacementRef<T> {
    fn eq(&self, other: &PlacementId) -> bool {
        self.id == Some(*other)
    }
}

impl<T: ?Sized> Hash for PlacementRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for PlacementRef<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PlacementRef").field(&self.id).finish()
    }
}

impl<T: ?Sized> Display for PlacementRef<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "PRef({})", id.short()),
            None => f.write_str("PRef-NIL"),
        }
    }
}

impl From<PlacementId> for PlacementRef {
    /// Untyped reference; every object is compatible with `dyn MObject`
    fn from(id: PlacementId) -> Self {
        Self::from_checked(id)
    }
}

/// Anything naming a placement by identity
pub trait Locate {
    /// Identity of the named placement
    ///
    /// # Errors
    /// Returns error if the source does not name any placement
    fn locate(&self) -> SessionResult<PlacementId>;
}

impl Locate for PlacementId {
    fn locate(&self) -> SessionResult<PlacementId> {
        Ok(*self)
    }
}

impl Locate for Placement {
    fn locate(&self) -> SessionResult<PlacementId> {
        Ok(self.id())
    }
}

impl<T: ?Sized> Locate for PlacementRef<T> {
    fn locate(&self) -> SessionResult<PlacementId> {
        self.id.ok_or(SessionError::BottomPlacementRef)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mos_model::{Clip, Effect, ModelRoot, Time};

    fn setup() -> (PlacementIndex, PlacementId) {
        let mut index = PlacementIndex::new(Placement::new(ModelRoot::new("test")));
        let root = index.root_id();
        let clip = index
            .insert(Placement::new(Clip::new("a", Time::from_secs(2))), root)
            .unwrap();
        (index, clip)
    }

    #[test]
    fn unbound_reference() {
        let (index, _) = setup();
        let r = PlacementRef::<Clip>::default();
        assert!(!r.is_bound());
        assert!(!r.is_valid(&index));
        assert!(matches!(r.resolve(&index), Err(SessionError::BottomPlacementRef)));
        assert_eq!(r.use_count(&index), 0);
        assert_eq!(r.to_string(), "PRef-NIL");
    }

    #[test]
    fn bind_checks_type() {
        let (index, clip) = setup();
        let r = PlacementRef::<Clip>::bind(&index, clip).unwrap();
        assert_eq!(r.resolve(&index).unwrap().length, Time::from_secs(2));
        assert!(matches!(
            PlacementRef::<Effect>::bind(&index, clip),
            Err(SessionError::PlacementTypeMismatch { .. })
        ));
        assert!(matches!(
            PlacementRef::<Clip>::bind(&index, PlacementId::fresh()),
            Err(SessionError::NotInSession { .. })
        ));
    }

    #[test]
    fn recast_between_views() {
        let (index, clip) = setup();
        let generic: PlacementRef = clip.into();
        let typed: PlacementRef<Clip> = generic.recast(&index).unwrap();
        assert_eq!(typed, generic);
        assert!(generic.recast::<Effect>(&index).is_err());
        assert!(PlacementRef::<Clip>::unbound().recast::<Clip>(&index).is_err());
    }

    #[test]
    fn dangles_after_removal() {
        let (mut index, clip) = setup();
        let r = PlacementRef::<Clip>::bind(&index, clip).unwrap();
        assert!(index.remove(clip).unwrap());
        assert!(r.is_bound());
        assert!(!r.is_valid(&index));
        assert!(matches!(r.resolve(&index), Err(SessionError::NotInSession { .. })));
    }

    #[test]
    fn resolve_mut_updates_pin() {
        let (mut index, clip) = setup();
        let r = PlacementRef::<Clip>::bind(&index, clip).unwrap();
        r.resolve_mut(&mut index).unwrap().pin_mut().fix_at(Time::from_secs(4));
        let placement = r.resolve(&index).unwrap().placement();
        assert_eq!(placement.resolve().start, Time::from_secs(4));
    }

    #[test]
    fn equality_ignores_view_type() {
        let (index, clip) = setup();
        let typed = PlacementRef::<Clip>::bind(&index, clip).unwrap();
        let generic: PlacementRef = clip.into();
        assert_eq!(typed, generic);
        assert_eq!(typed, clip);
        assert_ne!(typed, PlacementRef::<Clip>::unbound());
        assert_eq!(PlacementRef::<Clip>::unbound(), PlacementRef::<Effect>::unbound());
    }

    #[test]
    fn locate_sources() {
        let (index, clip) = setup();
        assert_eq!(clip.locate(), Ok(clip));
        assert_eq!(index.find(clip).unwrap().locate(), Ok(clip));
        assert_eq!(PlacementRef::<dyn MObject>::from(clip).locate(), Ok(clip));
        assert_eq!(
            PlacementRef::<Clip>::unbound().locate(),
            Err(SessionError::BottomPlacementRef)
        );
    }
}
