//! Owning object references
//!
//! An [`MObjectRef`] combines a [`PlacementRef`] with shared ownership of
//! the placed object. While active it keeps the object alive, even after the
//! placement has left the index; access through the session however checks
//! that the placement is still registered.

use crate::error::{SessionError, SessionResult};
use crate::index::PlacementIndex;
use crate::reference::{Locate, PlacementRef};
use mos_model::{MObject, Placement, PlacementId, PlacementView, Subject, Time};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Active reference onto a placed object
///
/// Starts inactive; [`activate`](Self::activate) binds it and extends
/// ownership of the object by one. Inactive references never compare equal.
pub struct MObjectRef<T: ?Sized = dyn MObject> {
    placement: PlacementRef<T>,
    subject: Option<Arc<T>>,
}

impl<T: ?Sized> MObjectRef<T> {
    /// Inactive reference
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            placement: PlacementRef::unbound(),
            subject: None,
        }
    }

    /// Release the object and drop the binding
    pub fn close(&mut self) {
        self.placement.reset();
        self.subject = None;
    }

    /// Check if bound and sharing ownership
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.subject.is_some()
    }

    /// Number of owners sharing the object; 0 while inactive
    #[inline]
    #[must_use]
    pub fn use_count(&self) -> usize {
        self.subject.as_ref().map_or(0, Arc::strong_count)
    }

    /// Identity of the referenced placement; `None` while inactive
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<PlacementId> {
        self.subject.as_ref().and(self.placement.id())
    }

    /// Underlying placement reference
    #[inline]
    #[must_use]
    pub fn placement_ref(&self) -> PlacementRef<T> {
        self.placement
    }

    /// Shared ownership of the object, bypassing the session check
    #[inline]
    #[must_use]
    pub fn shared(&self) -> Option<&Arc<T>> {
        self.subject.as_ref()
    }

    /// Access the referenced object
    ///
    /// # Errors
    /// - `BottomMObjectRef` while inactive
    /// - `NotInSession` if the placement has left the index
    pub fn subject<'a>(&'a self, index: &PlacementIndex) -> SessionResult<&'a T> {
        let subject = self
            .subject
            .as_deref()
            .ok_or(SessionError::BottomMObjectRef)?;
        let id = self.placement.locate()?;
        if !index.contains(id) {
            return Err(SessionError::NotInSession { id });
        }
        Ok(subject)
    }

    /// Object sharing between two references, regardless of placement
    #[must_use]
    pub fn is_shared_pointee<U: ?Sized>(&self, other: &MObjectRef<U>) -> bool {
        match (&self.subject, &other.subject) {
            (Some(a), Some(b)) => Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>(),
            _ => false,
        }
    }
}

impl<T: Subject + ?Sized> MObjectRef<T> {
    /// Bind to the placement named by `source`
    ///
    /// Rebinding to the currently referenced placement is a no-op while that
    /// placement is registered. On failure the reference stays as it was.
    ///
    /// # Errors
    /// - `BottomPlacementRef` / `BottomMObjectRef` for an unbound source
    /// - `NotInSession` if the placement is not registered
    /// - `InvalidPlacementRef` if the object can not be viewed as `T`
    pub fn activate<L: Locate + ?Sized>(
        &mut self,
        index: &PlacementIndex,
        source: &L,
    ) -> SessionResult<&mut Self> {
        let id = source.locate()?;
        if self.id() == Some(id) && index.contains(id) {
            return Ok(self);
        }
        let subject = index
            .find(id)?
            .share::<T>()
            .ok_or(SessionError::InvalidPlacementRef {
                id,
                expected: T::type_name(),
            })?;

        self.placement = PlacementRef::from_checked(id);
        self.subject = Some(subject);
        Ok(self)
    }

    /// Referenced placement, viewed as `T`
    ///
    /// # Errors
    /// - `BottomMObjectRef` while inactive
    /// - `NotInSession` if the placement has left the index
    pub fn placement<'i>(&self, index: &'i PlacementIndex) -> SessionResult<PlacementView<'i, T>> {
        if !self.is_active() {
            return Err(SessionError::BottomMObjectRef);
        }
        self.placement.resolve(index)
    }

    /// Resolved start time of the referenced placement
    ///
    /// # Errors
    /// Same as [`placement`](Self::placement)
    pub fn start_time(&self, index: &PlacementIndex) -> SessionResult<Time> {
        Ok(self.placement(index)?.placement().resolve().start)
    }

    /// Check if the referenced object can also be viewed as `U`
    #[must_use]
    pub fn is_compatible<U: Subject + ?Sized>(&self, index: &PlacementIndex) -> bool {
        self.placement(index)
            .is_ok_and(|view| view.placement().is_compatible::<U>())
    }

    /// Insert `placement` into the scope of the referenced placement
    ///
    /// Returns an active reference onto the inserted placement.
    ///
    /// # Errors
    /// - `BottomMObjectRef` while inactive
    /// - `InvalidPlacementRef` if the new object can not be viewed as `U`;
    ///   nothing is inserted
    /// - `InvalidScope` if the referenced placement has left the index
    pub fn attach<U: Subject + ?Sized>(
        &self,
        index: &mut PlacementIndex,
        placement: Placement,
    ) -> SessionResult<MObjectRef<U>> {
        let scope = self.id().ok_or(SessionError::BottomMObjectRef)?;
        if !placement.is_compatible::<U>() {
            return Err(SessionError::InvalidPlacementRef {
                id: placement.id(),
                expected: U::type_name(),
            });
        }
        let id = index.insert(placement, scope)?;
        let mut child = MObjectRef::new();
        child.activate(index, &id)?;
        Ok(child)
    }

    /// Remove the referenced placement with everything below it, then close
    ///
    /// Returns the number of removed placements; 0 if inactive or no longer
    /// registered. Purging the root clears the session.
    ///
    /// # Errors
    /// Propagates index failures
    pub fn purge(&mut self, index: &mut PlacementIndex) -> SessionResult<usize> {
        let removed = match self.id() {
            Some(id) if index.contains(id) => index.clear_scope(id)?,
            _ => 0,
        };
        self.close();
        Ok(removed)
    }

    /// Both references lead to placements of the same object, placed alike
    #[must_use]
    pub fn is_equivalent_placement<U: Subject + ?Sized>(
        &self,
        other: &MObjectRef<U>,
        index: &PlacementIndex,
    ) -> bool {
        match (self.placement(index), other.placement(index)) {
            (Ok(a), Ok(b)) => a.placement().is_same_def(b.placement()),
            _ => false,
        }
    }
}

impl<T: ?Sized> Default for MObjectRef<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for MObjectRef<T> {
    fn clone(&self) -> Self {
        Self {
            placement: self.placement,
            subject: self.subject.clone(),
        }
    }
}

impl<T: ?Sized> Locate for MObjectRef<T> {
    fn locate(&self) -> SessionResult<PlacementId> {
        self.id().ok_or(SessionError::BottomMObjectRef)
    }
}

impl<T: ?Sized, U: ?Sized> PartialEq<MObjectRef<U>> for MObjectRef<T> {
    fn eq(&self, other: &MObjectRef<U>) -> bool {
        self.id().is_some() && self.id() == other.id()
    }
}

impl<T: ?Sized, U: ?Sized> PartialEq<PlacementRef<U>> for MObjectRef<T> {
    fn eq(&self, other: &PlacementRef<U>) -> bool {
        self.id().is_some() && self.id() == other.id()
    }
}

impl<T: ?Sized, U: ?Sized> PartialEq<MObjectRef<U>> for PlacementRef<T> {
    fn eq(&self, other: &MObjectRef<U>) -> bool {
        other == self
    }
}

impl<T: ?Sized> PartialEq<PlacementId> for MObjectRef<T> {
    fn eq(&self, other: &PlacementId) -> bool {
        self.id() == Some(*other)
    }
}

impl<T: ?Sized> fmt::Debug for MObjectRef<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MObjectRef")
            .field("id", &self.id())
            .field("use_count", &self.use_count())
            .finish()
    }
}

impl<T: ?Sized> Display for MObjectRef<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "MRef({})", id.short()),
            None => f.write_str("MRef-NIL"),
        }
    }
}
