//! Locating pins
//!
//! A placement carries a [`LocatingPin`]: an ordered chain of positioning
//! constraints. Resolving the chain yields an [`ExplicitPlacement`].

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::ops::Add;

/// Point in session time, in microseconds
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Time(i64);

impl Time {
    /// Session origin
    pub const ZERO: Self = Self(0);

    /// Create from microsecond ticks
    #[inline]
    #[must_use]
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Create from whole seconds
    #[inline]
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * 1_000_000)
    }

    /// Microsecond ticks
    #[inline]
    #[must_use]
    pub const fn micros(self) -> i64 {
        self.0
    }
}

impl Add for Time {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let secs = self.0.div_euclid(1_000_000);
        let micros = self.0.rem_euclid(1_000_000);
        write!(f, "{secs}.{micros:06}s")
    }
}

/// Single positioning constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "pin")]
pub enum Pin {
    /// Fix the start at an absolute time
    Fixed { start: Time },

    /// Shift the start by an offset
    Relative { offset: Time },

    /// Route output to the named pipe
    Wiring { pipe: String },
}

/// Ordered chain of positioning constraints
///
/// Later pins refine earlier ones: a `Fixed` pin resets the start,
/// `Relative` pins accumulate, the last `Wiring` pin wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatingPin {
    chain: Vec<Pin>,
}

impl LocatingPin {
    /// Empty chain
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a constraint
    pub fn push(&mut self, pin: Pin) -> &mut Self {
        self.chain.push(pin);
        self
    }

    /// Append a fixed start time
    pub fn fix_at(&mut self, start: Time) -> &mut Self {
        self.push(Pin::Fixed { start })
    }

    /// Append a relative offset
    pub fn shift_by(&mut self, offset: Time) -> &mut Self {
        self.push(Pin::Relative { offset })
    }

    /// Append a wiring target
    pub fn wire_to(&mut self, pipe: impl Into<String>) -> &mut Self {
        self.push(Pin::Wiring { pipe: pipe.into() })
    }

    /// Drop all constraints
    pub fn reset(&mut self) {
        self.chain.clear();
    }

    /// Constraints in application order
    #[inline]
    #[must_use]
    pub fn pins(&self) -> &[Pin] {
        &self.chain
    }

    /// Number of constraints
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Check if no constraint is present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Fold the chain into an explicit position
    #[must_use]
    pub fn resolve(&self) -> ExplicitPlacement {
        self.chain
            .iter()
            .fold(ExplicitPlacement::default(), |mut acc, pin| {
                match pin {
                    Pin::Fixed { start } => acc.start = *start,
                    Pin::Relative { offset } => acc.start = acc.start + *offset,
                    Pin::Wiring { pipe } => acc.pipe = Some(pipe.clone()),
                }
                acc
            })
    }
}

/// Fully resolved position of a placement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplicitPlacement {
    /// Start time
    pub start: Time,

    /// Output pipe, if wired
    pub pipe: Option<String>,
}
