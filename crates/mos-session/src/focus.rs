//! Query focus
//!
//! The session keeps a stack of [`ScopePath`] frames describing the current
//! location of interest. A [`QueryFocus`] handle is attached to one frame;
//! the stack drops frames nobody is attached to any more.

use crate::error::{SessionError, SessionResult};
use crate::index::PlacementIndex;
use crate::scope::Scope;
use crate::scope_path::ScopePath;
use crate::session::Session;
use std::cell::RefCell;
use std::rc::Rc;

type Frame = Rc<RefCell<ScopePath>>;

/// Stack of focus frames
///
/// Never empty: the bottom frame persists and falls back to the root once
/// no handle is attached to it.
#[derive(Debug)]
pub struct QueryFocusStack {
    frames: Vec<Frame>,
}

impl QueryFocusStack {
    /// Stack holding a single root frame
    #[must_use]
    pub fn new(index: &PlacementIndex) -> Self {
        Self {
            frames: vec![Rc::new(RefCell::new(ScopePath::new(index)))],
        }
    }

    /// Number of frames
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if no frame is present; never the case outside of [`clear`](Self::clear)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Handles attached to the frame at `level` (0 is the bottom)
    #[must_use]
    pub fn frame_refs(&self, level: usize) -> Option<usize> {
        self.frames.get(level).map(|frame| Rc::strong_count(frame) - 1)
    }

    /// Path of the topmost frame
    #[must_use]
    pub fn top_path(&self) -> ScopePath {
        self.frames
            .last()
            .map(|frame| frame.borrow().clone())
            .unwrap_or_default()
    }

    /// Attach to the topmost frame, after dropping unused ones
    pub(crate) fn attach_top(&mut self, index: &PlacementIndex) -> Frame {
        self.pop_unused(index);
        self.frames
            .last()
            .map(Rc::clone)
            .unwrap_or_else(|| self.reset_bottom(index))
    }

    /// Open a new frame, routed from the current top towards `scope`
    ///
    /// # Errors
    /// Navigation failures; the stack stays unchanged
    pub(crate) fn push(&mut self, index: &PlacementIndex, scope: Scope) -> SessionResult<Frame> {
        self.pop_unused(index);
        let mut path = self.top_path();
        if path.is_empty() {
            path = ScopePath::new(index);
        }
        path.navigate(index, scope)?;

        let frame = Rc::new(RefCell::new(path));
        self.frames.push(Rc::clone(&frame));
        tracing::debug!("Pushed focus frame {} at level {}", frame.borrow(), self.len() - 1);
        Ok(frame)
    }

    /// Level of `frame` within the stack
    fn level_of(&self, frame: &Frame) -> Option<usize> {
        self.frames.iter().position(|f| Rc::ptr_eq(f, frame))
    }

    /// Frame right below `frame`
    fn below(&self, frame: &Frame) -> SessionResult<Frame> {
        match self.level_of(frame) {
            Some(level) if level > 0 => Ok(Rc::clone(&self.frames[level - 1])),
            _ => Err(SessionError::EmptyScopePath {
                operation: "Popping",
            }),
        }
    }

    /// Drop the topmost frame
    ///
    /// Handles still attached to it keep their path but are detached.
    ///
    /// # Errors
    /// `EmptyScopePath` when only the bottom frame is left
    pub fn pop(&mut self) -> SessionResult<()> {
        if self.frames.len() <= 1 {
            return Err(SessionError::EmptyScopePath {
                operation: "Popping",
            });
        }
        if let Some(frame) = self.frames.pop() {
            if Rc::strong_count(&frame) > 1 {
                tracing::warn!("Popping focus frame {} still in use", frame.borrow());
            }
        }
        Ok(())
    }

    /// Drop unattached frames from the top; reset an unattached bottom frame
    pub fn pop_unused(&mut self, index: &PlacementIndex) {
        while self.frames.len() > 1 && Self::is_unused(self.frames.last()) {
            self.frames.pop();
        }
        if let [bottom] = self.frames.as_slice() {
            if Rc::strong_count(bottom) == 1 {
                bottom.borrow_mut().clear(index);
            }
        }
    }

    /// Reset to a single fresh root frame
    ///
    /// Attached handles keep their paths but are detached.
    pub fn clear(&mut self, index: &PlacementIndex) {
        self.frames.clear();
        self.reset_bottom(index);
    }

    fn is_unused(frame: Option<&Frame>) -> bool {
        frame.is_some_and(|f| Rc::strong_count(f) == 1)
    }

    fn reset_bottom(&mut self, index: &PlacementIndex) -> Frame {
        let frame = Rc::new(RefCell::new(ScopePath::new(index)));
        self.frames.push(Rc::clone(&frame));
        frame
    }
}

/// Handle onto the current location of interest
///
/// Attached to one frame of the session's [`QueryFocusStack`]; dropping the
/// handle releases the frame.
#[derive(Debug)]
pub struct QueryFocus {
    frame: Frame,
}

impl QueryFocus {
    /// Attach to the current focus
    #[must_use]
    pub fn attach(session: &Session) -> Self {
        let frame = session.focus_stack().attach_top(session.index());
        Self { frame }
    }

    /// Open a new focus frame on top, starting at `scope`
    ///
    /// # Errors
    /// Navigation failures; the stack stays unchanged
    pub fn push(session: &Session, scope: Scope) -> SessionResult<Self> {
        let frame = session.focus_stack().push(session.index(), scope)?;
        Ok(Self { frame })
    }

    /// Innermost scope of the focus
    ///
    /// # Errors
    /// `EmptyScopePath` if the path was emptied
    pub fn current_scope(&self) -> SessionResult<Scope> {
        self.frame.borrow().leaf()
    }

    /// Snapshot of the focus path
    #[must_use]
    pub fn current_path(&self) -> ScopePath {
        self.frame.borrow().clone()
    }

    /// Re-route the focus to `target`
    ///
    /// # Errors
    /// Navigation failures; the focus stays unchanged
    pub fn shift(&mut self, session: &Session, target: Scope) -> SessionResult<&mut Self> {
        self.frame.borrow_mut().navigate(session.index(), target)?;
        Ok(self)
    }

    /// Route from `target` up to the root, as the focus would take it
    ///
    /// The focus itself does not move.
    ///
    /// # Errors
    /// Navigation failures
    pub fn locate(
        &self,
        session: &Session,
        target: Scope,
    ) -> SessionResult<impl Iterator<Item = Scope>> {
        let mut probe = self.current_path();
        probe.navigate(session.index(), target)?;
        Ok(probe.into_iter())
    }

    /// Move the focus one scope up
    ///
    /// # Errors
    /// - `NoParentScope` when focused on the root
    /// - `EmptyScopePath` if the path was emptied
    pub fn ascend(&mut self, session: &Session) -> SessionResult<Scope> {
        let mut path = self.frame.borrow_mut();
        if path.is_root() {
            return Err(SessionError::NoParentScope {
                id: session.index().root_id(),
            });
        }
        path.move_up()
    }

    /// Move the focus back to the root
    pub fn reset(&mut self, session: &Session) -> &mut Self {
        self.frame.borrow_mut().clear(session.index());
        self
    }

    /// Return to the frame below, releasing the current one
    ///
    /// # Errors
    /// `EmptyScopePath` when attached to the bottom frame or a frame no
    /// longer on the stack; the handle stays attached
    pub fn pop(&mut self, session: &Session) -> SessionResult<()> {
        let mut stack = session.focus_stack();
        self.frame = stack.below(&self.frame)?;
        stack.pop_unused(session.index());
        Ok(())
    }
}

impl Clone for QueryFocus {
    /// Second handle onto the same frame
    fn clone(&self) -> Self {
        Self {
            frame: Rc::clone(&self.frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use mos_model::{Fork, Placement, PlacementId};

    fn session() -> (Session, PlacementId, PlacementId) {
        let mut session = Session::new(SessionConfig::default());
        let root = session.index().root_id();
        let a = session
            .index_mut()
            .insert(Placement::new(Fork::new("a")), root)
            .unwrap();
        let b = session
            .index_mut()
            .insert(Placement::new(Fork::new("b")), a)
            .unwrap();
        (session, a, b)
    }

    #[test]
    fn fresh_stack_is_root() {
        let (session, _, _) = session();
        let mut stack = QueryFocusStack::new(session.index());
        assert_eq!(stack.len(), 1);
        assert!(stack.top_path().is_root());
        assert_eq!(stack.frame_refs(0), Some(0));
        assert!(stack.pop().is_err());
    }

    #[test]
    fn unattached_bottom_resets_to_root() {
        let (session, _, b) = session();
        {
            let mut focus = QueryFocus::attach(&session);
            focus
                .shift(&session, Scope::new(session.index(), b).unwrap())
                .unwrap();
            assert_eq!(focus.current_path().len(), 3);

            let second = QueryFocus::attach(&session);
            assert_eq!(second.current_scope(), focus.current_scope());
            assert_eq!(session.focus_stack().frame_refs(0), Some(2));
        }
        let focus = QueryFocus::attach(&session);
        assert!(focus.current_path().is_root());
    }

    #[test]
    fn push_and_release_frames() {
        let (session, a, b) = session();
        let mut base = QueryFocus::attach(&session);
        base.shift(&session, Scope::new(session.index(), a).unwrap())
            .unwrap();

        let target = Scope::new(session.index(), b).unwrap();
        let mut pushed = QueryFocus::push(&session, target).unwrap();
        assert_eq!(session.focus_depth(), 2);
        assert_eq!(pushed.current_path().len(), 3);

        pushed.pop(&session).unwrap();
        assert_eq!(session.focus_depth(), 1);
        assert_eq!(pushed.current_scope().unwrap().id(), Some(a));
        assert!(pushed.pop(&session).is_err());
        drop(base);
        assert_eq!(pushed.current_scope().unwrap().id(), Some(a));
    }

    #[test]
    fn dropped_handle_releases_frame() {
        let (session, _, b) = session();
        let keep = QueryFocus::attach(&session);
        {
            let target = Scope::new(session.index(), b).unwrap();
            let _pushed = QueryFocus::push(&session, target).unwrap();
            assert_eq!(session.focus_depth(), 2);
        }
        let again = QueryFocus::attach(&session);
        assert_eq!(session.focus_depth(), 1);
        assert!(again.current_path().is_root());
        drop(keep);
    }

    #[test]
    fn locate_does_not_move_focus() {
        let (session, a, b) = session();
        let focus = QueryFocus::attach(&session);
        let route: Vec<_> = focus
            .locate(&session, Scope::new(session.index(), b).unwrap())
            .unwrap()
            .filter_map(|s| s.id())
            .collect();
        assert_eq!(route, vec![b, a, session.index().root_id()]);
        assert!(focus.current_path().is_root());
    }

    #[test]
    fn ascend_stops_at_root() {
        let (session, a, b) = session();
        let mut focus = QueryFocus::attach(&session);
        focus
            .shift(&session, Scope::new(session.index(), b).unwrap())
            .unwrap();
        assert_eq!(focus.ascend(&session).unwrap().id(), Some(a));
        focus.ascend(&session).unwrap();
        assert!(matches!(
            focus.ascend(&session),
            Err(SessionError::NoParentScope { .. })
        ));
        focus
            .shift(&session, Scope::new(session.index(), b).unwrap())
            .unwrap();
        assert!(focus.reset(&session).current_path().is_root());
    }

    #[test]
    fn failed_push_leaves_stack_unchanged() {
        let (session, _, _) = session();
        let _focus = QueryFocus::attach(&session);
        assert!(matches!(
            QueryFocus::push(&session, Scope::INVALID),
            Err(SessionError::InvalidScope(_))
        ));
        assert_eq!(session.focus_depth(), 1);
    }
}
