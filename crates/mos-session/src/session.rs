//! Session
//!
//! Owns the placement index and the focus stack of one editing session.
//! A session is confined to a single thread.

use crate::config::SessionConfig;
use crate::focus::{QueryFocus, QueryFocusStack};
use crate::index::PlacementIndex;
use crate::scope::Scope;
use mos_model::{ModelRoot, Placement};
use std::cell::{RefCell, RefMut};

/// One editing session
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    index: PlacementIndex,
    focus: RefCell<QueryFocusStack>,
}

impl Session {
    /// Create session with an empty model
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let root = Placement::new(ModelRoot::new(config.root_name.clone()));
        let index = PlacementIndex::with_config(root, &config);
        let focus = RefCell::new(QueryFocusStack::new(&index));
        tracing::info!("Session \"{}\" created", config.root_name);
        Self {
            config,
            index,
            focus,
        }
    }

    /// Session configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Placement index
    #[inline]
    #[must_use]
    pub fn index(&self) -> &PlacementIndex {
        &self.index
    }

    /// Placement index, for mutation
    #[inline]
    pub fn index_mut(&mut self) -> &mut PlacementIndex {
        &mut self.index
    }

    /// Scope of the model root
    #[inline]
    #[must_use]
    pub fn root_scope(&self) -> Scope {
        Scope::root(&self.index)
    }

    /// Attach to the current query focus
    #[inline]
    #[must_use]
    pub fn query_focus(&self) -> QueryFocus {
        QueryFocus::attach(self)
    }

    /// Number of focus frames
    #[must_use]
    pub fn focus_depth(&self) -> usize {
        self.focus.borrow().len()
    }

    /// Drop focus frames no handle is attached to
    ///
    /// An unattached bottom frame falls back to the root. Returns the
    /// remaining number of frames.
    pub fn prune_focus(&self) -> usize {
        let mut stack = self.focus.borrow_mut();
        stack.pop_unused(&self.index);
        stack.len()
    }

    /// Remove everything but the root and reset the focus
    ///
    /// Returns the number of removed placements. Outstanding focus handles
    /// are detached from the stack.
    pub fn clear(&mut self) -> usize {
        let removed = self.index.clear();
        self.focus.get_mut().clear(&self.index);
        removed
    }

    pub(crate) fn focus_stack(&self) -> RefMut<'_, QueryFocusStack> {
        self.focus.borrow_mut()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
