//! Placement: a positioned instance of a media object
//!
//! Defines [`Placement`], which shares ownership of one [`MObject`] and
//! carries its [`LocatingPin`], and [`PlacementView`], the typed borrowed view
//! produced by checked lookups.

use crate::id::PlacementId;
use crate::locating::{ExplicitPlacement, LocatingPin};
use crate::mobject::{MObject, Subject};
use std::fmt::{self, Display, Formatter};
use std::ops::Deref;
use std::sync::Arc;

/// Positioned, identity-bearing handle onto a media object
///
/// # Invariants
/// - `id` never changes; a [`duplicate`](Self::duplicate) gets a new one
/// - the dynamic type of the subject is fixed at construction
#[derive(Debug)]
pub struct Placement {
    id: PlacementId,
    subject: Arc<dyn MObject>,
    pin: LocatingPin,
}

impl Placement {
    /// Place a freshly created object
    #[must_use]
    pub fn new<T: MObject>(subject: T) -> Self {
        Self::from_shared(Arc::new(subject))
    }

    /// Place an object already shared elsewhere
    #[must_use]
    pub fn from_shared(subject: Arc<dyn MObject>) -> Self {
        Self {
            id: PlacementId::fresh(),
            subject,
            pin: LocatingPin::new(),
        }
    }

    /// Builder-style pin setup
    #[must_use]
    pub fn located(mut self, setup: impl FnOnce(&mut LocatingPin)) -> Self {
        setup(&mut self.pin);
        self
    }

    /// Identity of this placement
    #[inline]
    #[must_use]
    pub fn id(&self) -> PlacementId {
        self.id
    }

    /// The placed object, generically typed
    #[inline]
    #[must_use]
    pub fn subject(&self) -> &(dyn MObject + 'static) {
        &*self.subject
    }

    /// Shared handle onto the placed object
    #[inline]
    #[must_use]
    pub fn shared_subject(&self) -> &Arc<dyn MObject> {
        &self.subject
    }

    /// View the placed object as `T`, if compatible
    #[inline]
    #[must_use]
    pub fn subject_as<T: Subject + ?Sized>(&self) -> Option<&T> {
        T::view(&*self.subject)
    }

    /// Check whether the placed object can be viewed as `T`
    #[inline]
    #[must_use]
    pub fn is_compatible<T: Subject + ?Sized>(&self) -> bool {
        T::is_compatible(&*self.subject)
    }

    /// Extend ownership of the placed object, viewed as `T`
    #[inline]
    #[must_use]
    pub fn share<T: Subject + ?Sized>(&self) -> Option<Arc<T>> {
        T::share(&self.subject)
    }

    /// Number of owners currently sharing the placed object
    #[inline]
    #[must_use]
    pub fn use_count(&self) -> usize {
        Arc::strong_count(&self.subject)
    }

    /// Positioning constraints
    #[inline]
    #[must_use]
    pub fn pin(&self) -> &LocatingPin {
        &self.pin
    }

    /// Mutable positioning constraints
    #[inline]
    pub fn pin_mut(&mut self) -> &mut LocatingPin {
        &mut self.pin
    }

    /// Resolve the locating chain
    #[inline]
    #[must_use]
    pub fn resolve(&self) -> ExplicitPlacement {
        self.pin.resolve()
    }

    /// Second placement of the same object, with a new identity
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            id: PlacementId::fresh(),
            subject: Arc::clone(&self.subject),
            pin: self.pin.clone(),
        }
    }

    /// Same object, placed the same way (identity ignored)
    #[must_use]
    pub fn is_same_def(&self, other: &Placement) -> bool {
        self.is_shared_pointee(other) && self.pin == other.pin
    }

    /// Both placements share the very same object
    #[inline]
    #[must_use]
    pub fn is_shared_pointee(&self, other: &Placement) -> bool {
        Arc::ptr_eq(&self.subject, &other.subject)
    }

    /// Self-check of placement and placed object
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.subject.is_valid()
    }
}

impl Display for Placement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Placement<{}>@{}", self.subject.short_id(), self.id.short())
    }
}

/// Checked, typed view onto a placement held elsewhere
///
/// Dereferences to the placed object viewed as `T`.
pub struct PlacementView<'a, T: ?Sized> {
    placement: &'a Placement,
    subject: &'a T,
}

impl<'a, T: Subject + ?Sized> PlacementView<'a, T> {
    /// Create view, if the placed object is compatible with `T`
    #[must_use]
    pub fn try_new(placement: &'a Placement) -> Option<Self> {
        placement
            .subject_as::<T>()
            .map(|subject| Self { placement, subject })
    }
}

impl<'a, T: ?Sized> PlacementView<'a, T> {
    /// The underlying placement
    #[inline]
    #[must_use]
    pub fn placement(&self) -> &'a Placement {
        self.placement
    }

    /// The placed object as `T`
    #[inline]
    #[must_use]
    pub fn subject(&self) -> &'a T {
        self.subject
    }

    /// Identity of the underlying placement
    #[inline]
    #[must_use]
    pub fn id(&self) -> PlacementId {
        self.placement.id()
    }
}

impl<T: ?Sized> Deref for PlacementView<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.subject
    }
}

impl<T: ?Sized> Clone for PlacementView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for PlacementView<'_, T> {}

impl<T: ?Sized> fmt::Debug for PlacementView<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlacementView")
            .field("placement", self.placement)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locating::Time;
    use crate::mobject::{Clip, Fork};

    fn test_clip() -> Placement {
        Placement::new(Clip::new("test", Time::from_secs(5)))
    }

    #[test]
    fn duplicate_shares_object_with_new_identity() {
        let p = test_clip().located(|pin| {
            pin.fix_at(Time::from_secs(10));
        });
        let dup = p.duplicate();

        assert_ne!(p.id(), dup.id());
        assert!(p.is_shared_pointee(&dup));
        assert!(p.is_same_def(&dup));
        assert_eq!(p.use_count(), 2);
    }

    #[test]
    fn same_def_requires_equal_pin() {
        let p = test_clip();
        let mut dup = p.duplicate();
        dup.pin_mut().shift_by(Time::from_secs(1));
        assert!(!p.is_same_def(&dup));
    }

    #[test]
    fn typed_view_checks_compatibility() {
        let p = test_clip();
        let view = PlacementView::<Clip>::try_new(&p).unwrap();
        assert_eq!(view.media, "test");
        assert_eq!(view.id(), p.id());
        assert!(PlacementView::<Fork>::try_new(&p).is_none());
        assert!(PlacementView::<dyn MObject>::try_new(&p).is_some());
    }

    #[test]
    fn share_counts_owners() {
        let p = test_clip();
        let owned = p.share::<Clip>().unwrap();
        assert_eq!(p.use_count(), 2);
        drop(owned);
        assert_eq!(p.use_count(), 1);
    }

    #[test]
    fn resolve_follows_pin() {
        let p = test_clip().located(|pin| {
            pin.fix_at(Time::from_secs(3)).wire_to("out");
        });
        let exp = p.resolve();
        assert_eq!(exp.start, Time::from_secs(3));
        assert_eq!(exp.pipe.as_deref(), Some("out"));
    }

    #[test]
    fn display_names_subject() {
        let p = test_clip();
        assert!(p.to_string().starts_with("Placement<Clip(test)>@"));
    }
}
