//! Error types for the session store
//!
//! Every failure is surfaced to the caller as a typed [`SessionError`];
//! nothing is recovered inside the store.

use mos_model::PlacementId;

/// Result alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Session store error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Identity unknown, or no longer present in the index
    #[error("placement {id} is not registered within the session")]
    NotInSession { id: PlacementId },

    /// Typed lookup found an incompatible object
    #[error("placement {id} holds a {actual}, which can not be viewed as {expected}")]
    PlacementTypeMismatch {
        id: PlacementId,
        expected: &'static str,
        actual: &'static str,
    },

    /// Removal of a placement which still has children
    #[error("placement {id} constitutes a non-empty scope ({members} members)")]
    NonEmptyScope { id: PlacementId, members: usize },

    /// Dereference of an unbound placement reference
    #[error("placement reference is unbound")]
    BottomPlacementRef,

    /// Member access through an inactive object reference
    #[error("MObject reference not activated")]
    BottomMObjectRef,

    /// Reference activation rejected by the compatibility check
    #[error("placement {id} can not be referenced as {expected}")]
    InvalidPlacementRef {
        id: PlacementId,
        expected: &'static str,
    },

    /// Scope not locatable within the current model
    #[error("invalid scope: {0}")]
    InvalidScope(String),

    /// Navigation or inspection of an empty scope path
    #[error("{operation} an empty scope path")]
    EmptyScopePath { operation: &'static str },

    /// Parent requested for the model root
    #[error("scope {id} is the model root and has no parent")]
    NoParentScope { id: PlacementId },

    /// Removal of the model root
    #[error("refusing to remove the model root {id}")]
    ModelRoot { id: PlacementId },
}

impl SessionError {
    /// Reference does not (or no longer) lead to a registered placement
    #[inline]
    #[must_use]
    pub fn is_dangling(&self) -> bool {
        matches!(
            self,
            Self::NotInSession { .. } | Self::BottomPlacementRef | Self::BottomMObjectRef
        )
    }

    /// Failure of scope discovery or path navigation
    #[inline]
    #[must_use]
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::InvalidScope(_) | Self::EmptyScopePath { .. } | Self::NoParentScope { .. }
        )
    }

    /// Failure of a dynamic type check
    #[inline]
    #[must_use]
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            Self::PlacementTypeMismatch { .. } | Self::InvalidPlacementRef { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let id = PlacementId::fresh();
        assert!(SessionError::NotInSession { id }.is_dangling());
        assert!(SessionError::BottomMObjectRef.is_dangling());
        assert!(!SessionError::NonEmptyScope { id, members: 1 }.is_dangling());
        assert!(SessionError::NoParentScope { id }.is_navigation());
        assert!(SessionError::EmptyScopePath { operation: "Navigating" }.is_navigation());
        assert!(SessionError::InvalidPlacementRef { id, expected: "Clip" }.is_type_error());
    }

    #[test]
    fn messages_name_the_placement() {
        let id = PlacementId::new([0x11; 16]);
        let msg = SessionError::NonEmptyScope { id, members: 2 }.to_string();
        assert!(msg.contains(&id.to_string()));
        assert!(msg.contains("2 members"));
    }
}
