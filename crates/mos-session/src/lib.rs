//! MOS Session Store
//!
//! Placement index, references and scope navigation for one editing session.
//!
//! # Overview
//!
//! - **PlacementIndex**: registry of placements organised into nested scopes
//! - **PlacementRef**: copyable, non-owning typed reference
//! - **MObjectRef**: reference sharing ownership of the placed object
//! - **Scope** / **ScopePath**: regions of the model and routes to them
//! - **QueryFocus**: current location of interest, kept on a frame stack
//!
//! All references resolve through an explicitly passed [`PlacementIndex`].
//!
//! # Example
//!
//! ```rust
//! use mos_model::{Clip, Fork, Placement, Time};
//! use mos_session::{MObjectRef, Scope, Session, SessionConfig};
//!
//! let mut session = Session::new(SessionConfig::default());
//! let root = session.index().root_id();
//!
//! let track = session
//!     .index_mut()
//!     .insert(Placement::new(Fork::new("video")), root)
//!     .unwrap();
//! let clip = session
//!     .index_mut()
//!     .insert(Placement::new(Clip::new("take1.mov", Time::from_secs(4))), track)
//!     .unwrap();
//!
//! let mut clip_ref = MObjectRef::<Clip>::new();
//! clip_ref.activate(session.index(), &clip).unwrap();
//! assert_eq!(clip_ref.subject(session.index()).unwrap().media, "take1.mov");
//!
//! let mut focus = session.query_focus();
//! focus
//!     .shift(&session, Scope::new(session.index(), clip).unwrap())
//!     .unwrap();
//! assert_eq!(focus.current_path().len(), 3);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod focus;
mod index;
mod mobject_ref;
mod reference;
mod scope;
mod scope_path;
mod session;
mod table;
mod validation;

// Re-exports
pub use config::{ConfigError, SelfCheck, SessionConfig};
pub use error::{SessionError, SessionResult};
pub use focus::{QueryFocus, QueryFocusStack};
pub use index::{PlacementIndex, Referrers};
pub use mobject_ref::MObjectRef;
pub use reference::{Locate, PlacementRef};
pub use scope::{Ascend, Scope};
pub use scope_path::ScopePath;
pub use session::Session;
pub use validation::SelfCheckFailure;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for session operations
    pub use crate::{
        Locate, MObjectRef, PlacementIndex, PlacementRef, QueryFocus, Scope, ScopePath, Session,
        SessionConfig, SessionError, SessionResult,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
