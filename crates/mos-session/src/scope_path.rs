//! Scope paths
//!
//! A [`ScopePath`] records the route from the model root down to some leaf
//! scope. Because a sequence may be bound at several places, the same leaf
//! can be reached along different routes; navigation keeps as much of the
//! current route as possible.

use crate::error::{SessionError, SessionResult};
use crate::index::PlacementIndex;
use crate::scope::Scope;
use std::fmt::{self, Display, Formatter};

/// Route of scopes from the root down to a leaf
///
/// Stored root first. The empty path is [`ScopePath::INVALID`]; a path
/// holding just the root is valid for navigation but not [`is_valid`](Self::is_valid).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopePath {
    path: Vec<Scope>,
}

impl ScopePath {
    /// Empty path
    pub const INVALID: Self = Self { path: Vec::new() };

    /// Path holding just the root
    #[must_use]
    pub fn new(index: &PlacementIndex) -> Self {
        Self {
            path: vec![Scope::root(index)],
        }
    }

    /// Path from the root down to `leaf`
    ///
    /// An unanchored leaf yields [`ScopePath::INVALID`].
    ///
    /// # Errors
    /// `InvalidScope` if the leaf is not reachable from the root
    pub fn from_leaf(index: &PlacementIndex, leaf: Scope) -> SessionResult<Self> {
        if leaf == Scope::INVALID {
            return Ok(Self::INVALID);
        }
        let mut path = Self::new(index);
        path.navigate(index, leaf)?;
        Ok(path)
    }

    /// Check if the path leads below the root
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.path.len() > 1
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Check if the path holds just the root
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.path.len() == 1
    }

    /// Number of scopes, root included
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.path.len()
    }

    /// Scopes from the leaf up to the root
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Scope> + ExactSizeIterator {
        self.path.iter().rev()
    }

    /// Scopes from the root down to the leaf
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Scope] {
        &self.path
    }

    /// Innermost scope
    ///
    /// # Errors
    /// `EmptyScopePath` on the empty path
    pub fn leaf(&self) -> SessionResult<Scope> {
        self.path
            .last()
            .copied()
            .ok_or(SessionError::EmptyScopePath {
                operation: "Inspecting",
            })
    }

    /// Check if `scope` is the innermost scope
    ///
    /// # Errors
    /// `EmptyScopePath` on the empty path
    pub fn ends_at(&self, scope: &Scope) -> SessionResult<bool> {
        Ok(self.leaf()? == *scope)
    }

    /// Check if `scope` lies on the path
    ///
    /// [`Scope::INVALID`] is contained in every path.
    #[must_use]
    pub fn contains(&self, scope: &Scope) -> bool {
        *scope == Scope::INVALID || self.path.contains(scope)
    }

    /// Check if `other` is a prefix of this path
    ///
    /// The empty path is contained in every path.
    #[must_use]
    pub fn contains_path(&self, other: &ScopePath) -> bool {
        other.path.len() <= self.path.len() && self.path.starts_with(&other.path)
    }

    /// Longest route shared by both paths
    #[must_use]
    pub fn common_prefix(a: &ScopePath, b: &ScopePath) -> ScopePath {
        let path = a
            .path
            .iter()
            .zip(&b.path)
            .take_while(|(x, y)| x == y)
            .map(|(x, _)| *x)
            .collect();
        ScopePath { path }
    }

    /// Check if the paths part ways right below the root
    ///
    /// Empty paths are disjoint to everything; root-only paths to nothing.
    #[must_use]
    pub fn disjoint(a: &ScopePath, b: &ScopePath) -> bool {
        if a.is_empty() || b.is_empty() {
            return true;
        }
        if a.path[0] != b.path[0] {
            return true;
        }
        match (a.path.get(1), b.path.get(1)) {
            (Some(x), Some(y)) => x != y,
            _ => false,
        }
    }

    /// Reset to the root
    pub fn clear(&mut self, index: &PlacementIndex) {
        self.path.clear();
        self.path.push(Scope::root(index));
    }

    /// Drop the innermost scope, returning the new leaf
    ///
    /// Returns [`Scope::INVALID`] once the path becomes empty.
    ///
    /// # Errors
    /// `EmptyScopePath` on the empty path
    pub fn move_up(&mut self) -> SessionResult<Scope> {
        if self.path.pop().is_none() {
            return Err(SessionError::EmptyScopePath {
                operation: "Navigating",
            });
        }
        Ok(self.path.last().copied().unwrap_or(Scope::INVALID))
    }

    /// Cut the path back to the root, returning the root
    ///
    /// # Errors
    /// `EmptyScopePath` on the empty path
    pub fn go_root(&mut self) -> SessionResult<Scope> {
        let root = self.path.first().copied().ok_or(SessionError::EmptyScopePath {
            operation: "Navigating",
        })?;
        self.path.truncate(1);
        Ok(root)
    }

    /// Re-route the path to end at `target`
    ///
    /// Keeps the deepest still-valid part of the current route that leads
    /// towards `target`, including routes through bindings of a shared
    /// sequence. Otherwise falls back to the plain parent chain. On failure
    /// the path is unchanged.
    ///
    /// # Errors
    /// - `EmptyScopePath` on the empty path
    /// - `InvalidScope` if `target` is not registered or its chain is broken
    pub fn navigate(&mut self, index: &PlacementIndex, target: Scope) -> SessionResult<()> {
        if self.is_empty() {
            return Err(SessionError::EmptyScopePath {
                operation: "Navigating",
            });
        }
        if !target.is_valid(index) {
            return Err(SessionError::InvalidScope(format!(
                "navigation target {target} is not registered"
            )));
        }
        if self.ends_at(&target)? {
            return Ok(());
        }

        let raw = Self::discover(index, target)?;
        self.path = self.splice(index, &raw).unwrap_or(raw);
        Ok(())
    }

    /// Plain parent chain from the root down to `target`
    fn discover(index: &PlacementIndex, target: Scope) -> SessionResult<Vec<Scope>> {
        let mut raw: Vec<Scope> = target.ascend(index).collect();
        raw.reverse();
        if raw.first() != Some(&Scope::root(index)) {
            return Err(SessionError::InvalidScope(format!(
                "scope {target} is not connected to the model root"
            )));
        }
        Ok(raw)
    }

    /// Graft `raw` onto the deepest usable element of the current route
    ///
    /// A graft may not revisit a scope already on the kept route, and the
    /// result may not exceed the configured path depth.
    fn splice(&self, index: &PlacementIndex, raw: &[Scope]) -> Option<Vec<Scope>> {
        let intact = self
            .path
            .iter()
            .take_while(|scope| scope.is_valid(index))
            .count();

        (0..intact).rev().find_map(|i| {
            let current = self.path[i];
            let graft = if let Some(j) = raw.iter().position(|s| *s == current) {
                &raw[j + 1..]
            } else {
                let attached = current
                    .top(index)
                    .ok()
                    .and_then(|placement| placement.subject().attached_scope())?;
                let j = raw.iter().position(|s| s.id() == Some(attached))?;
                &raw[j..]
            };
            let kept = &self.path[..=i];
            if kept.len() + graft.len() > index.max_path_depth()
                || graft.iter().any(|scope| kept.contains(scope))
            {
                return None;
            }
            let mut path = kept.to_vec();
            path.extend_from_slice(graft);
            Some(path)
        })
    }
}

impl Display for ScopePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("!");
        }
        if self.is_root() {
            return f.write_str("/");
        }
        for scope in &self.path[1..] {
            write!(f, "/{scope}")?;
        }
        Ok(())
    }
}

impl IntoIterator for ScopePath {
    type Item = Scope;
    type IntoIter = std::iter::Rev<std::vec::IntoIter<Scope>>;

    /// Scopes from the leaf up to the root
    fn into_iter(self) -> Self::IntoIter {
        self.path.into_iter().rev()
    }
}
