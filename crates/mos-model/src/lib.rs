//! MOS Object Model
//!
//! Identity-bearing placements of media objects.
//!
//! # Core Concepts
//!
//! - [`PlacementId`]: opaque 16-byte identity, never reused within a process
//! - [`MObject`]: anything that can be placed into the session
//! - [`Subject`]: checked "view as" for a generically held [`MObject`]
//! - [`Placement`]: shares ownership of one object and positions it via a [`LocatingPin`]
//! - [`PlacementView`]: typed, borrowed view produced by checked lookups
//!
//! # Example
//!
//! ```rust
//! use mos_model::{Clip, MObject, Placement, Time};
//!
//! let placement = Placement::new(Clip::new("interview.mov", Time::from_secs(90)))
//!     .located(|pin| {
//!         pin.fix_at(Time::from_secs(10));
//!     });
//!
//! assert!(placement.is_compatible::<Clip>());
//! assert!(placement.is_compatible::<dyn MObject>());
//! assert_eq!(placement.resolve().start, Time::from_secs(10));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod id;
mod locating;
mod mobject;
mod placement;

// Re-exports
pub use id::{ModelError, PlacementId};
pub use locating::{ExplicitPlacement, LocatingPin, Pin, Time};
pub use mobject::{AsAny, Binding, Clip, Effect, Fork, MObject, ModelRoot, Subject};
pub use placement::{Placement, PlacementView};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
