//! Media objects
//!
//! Defines the [`MObject`] trait implemented by everything that can be placed
//! into a session, the [`Subject`] trait for checked views onto a generically
//! held object, and the closed set of session object kinds.

use crate::id::PlacementId;
use crate::locating::Time;
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// Type-erasure support for [`MObject`]
///
/// Implemented for every sized `'static` type; the supertrait bound makes
/// these methods reachable through `dyn MObject`.
pub trait AsAny: Any + Send + Sync {
    /// Borrow as [`Any`]
    fn as_any(&self) -> &dyn Any;

    /// Convert shared ownership into [`Any`] ownership
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Anything that can be placed into the session
///
/// The dynamic type of an object is fixed once it is wrapped into a
/// placement; it may only be viewed through [`Subject`] afterwards.
pub trait MObject: AsAny + Debug {
    /// Stable kind tag
    fn kind(&self) -> &'static str;

    /// Short human readable identification
    fn short_id(&self) -> String;

    /// Object self-check
    fn is_valid(&self) -> bool {
        true
    }

    /// Scope attached at this object's place
    ///
    /// Non-`None` for objects which bind a sub-structure placed elsewhere,
    /// which makes that sub-structure reachable along more than one path.
    fn attached_scope(&self) -> Option<PlacementId> {
        None
    }
}

/// Type an [`MObject`] can be viewed as
///
/// Implemented for `dyn MObject` (every object is compatible) and for every
/// concrete [`MObject`] (compatible only with itself). Views are checked;
/// incompatible requests yield `None`.
pub trait Subject: 'static {
    /// Name used in diagnostics
    fn type_name() -> &'static str;

    /// Borrow the object as `Self`
    fn view<'a>(obj: &'a (dyn MObject + 'static)) -> Option<&'a Self>;

    /// Share ownership of the object as `Self`
    fn share(obj: &Arc<dyn MObject>) -> Option<Arc<Self>>;

    /// Check compatibility without producing a view
    #[inline]
    fn is_compatible(obj: &(dyn MObject + 'static)) -> bool {
        Self::view(obj).is_some()
    }
}

impl Subject for dyn MObject {
    fn type_name() -> &'static str {
        "MObject"
    }

    fn view<'a>(obj: &'a (dyn MObject + 'static)) -> Option<&'a Self> {
        Some(obj)
    }

    fn share(obj: &Arc<dyn MObject>) -> Option<Arc<Self>> {
        Some(Arc::clone(obj))
    }
}

impl<T: MObject> Subject for T {
    fn type_name() -> &'static str {
        std::any::type_name::<T>()
    }

    fn view<'a>(obj: &'a (dyn MObject + 'static)) -> Option<&'a Self> {
        obj.as_any().downcast_ref::<T>()
    }

    fn share(obj: &Arc<dyn MObject>) -> Option<Arc<Self>> {
        Arc::clone(obj).into_any().downcast::<T>().ok()
    }
}

/// Root of the session model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRoot {
    /// Session name
    pub name: String,
}

impl ModelRoot {
    /// Create named root
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl MObject for ModelRoot {
    fn kind(&self) -> &'static str {
        "root"
    }

    fn short_id(&self) -> String {
        format!("Root({})", self.name)
    }
}

/// Track-like container: a fork in the processing structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fork {
    /// Fork name
    pub name: String,
}

impl Fork {
    /// Create named fork
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl MObject for Fork {
    fn kind(&self) -> &'static str {
        "fork"
    }

    fn short_id(&self) -> String {
        format!("Fork({})", self.name)
    }

    fn is_valid(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Media clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    /// Source media name
    pub media: String,

    /// Media length
    pub length: Time,
}

impl Clip {
    /// Create clip of given media
    #[must_use]
    pub fn new(media: impl Into<String>, length: Time) -> Self {
        Self {
            media: media.into(),
            length,
        }
    }
}

impl MObject for Clip {
    fn kind(&self) -> &'static str {
        "clip"
    }

    fn short_id(&self) -> String {
        format!("Clip({})", self.media)
    }

    fn is_valid(&self) -> bool {
        self.length > Time::ZERO
    }
}

/// Processing effect attached to a scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    /// Plugin identifier
    pub plugin: String,
}

impl Effect {
    /// Create effect for plugin
    #[must_use]
    pub fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
        }
    }
}

impl MObject for Effect {
    fn kind(&self) -> &'static str {
        "effect"
    }

    fn short_id(&self) -> String {
        format!("Effect({})", self.plugin)
    }
}

/// Attachment of a sequence sub-structure at a further place
///
/// The bound sequence keeps its own single scope in the index; the binding
/// only records that navigation may reach it through here as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Placement of the bound sequence
    pub sequence: PlacementId,
}

impl Binding {
    /// Bind the sequence placed under `sequence`
    #[must_use]
    pub fn new(sequence: PlacementId) -> Self {
        Self { sequence }
    }
}

impl MObject for Binding {
    fn kind(&self) -> &'static str {
        "binding"
    }

    fn short_id(&self) -> String {
        format!("Binding({})", self.sequence.short())
    }

    fn attached_scope(&self) -> Option<PlacementId> {
        Some(self.sequence)
    }
}
