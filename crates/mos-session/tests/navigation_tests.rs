use mos_model::PlacementId;
use mos_session::{QueryFocus, Scope, ScopePath, SessionError};
use mos_test_utils::{foreign_scope, setup_test_session, TestScopes};
use pretty_assertions::assert_eq;

fn route(path: &ScopePath) -> Vec<PlacementId> {
    path.as_slice().iter().filter_map(Scope::id).collect()
}

#[test]
fn test_scope_discovery() {
    let (session, ids) = setup_test_session();
    let index = session.index();

    let start = Scope::containing(index, ids.sub1).unwrap();
    assert_eq!(start.id(), Some(ids.fork));

    let chain: Vec<_> = TestScopes::scope(&session, ids.sub1)
        .ascend(index)
        .filter_map(|s| s.id())
        .collect();
    assert_eq!(chain, vec![ids.sub1, ids.fork, ids.sequence, index.root_id()]);

    let parent = start.parent(index).unwrap();
    assert_eq!(parent.id(), Some(ids.sequence));
    assert!(parent.parent(index).unwrap().is_root(index));
}

#[test]
fn test_path_through_bindings() {
    let (session, ids) = setup_test_session();
    let index = session.index();
    let root = index.root_id();
    let scope = |id| TestScopes::scope(&session, id);

    let mut path = ScopePath::from_leaf(index, scope(ids.binding1)).unwrap();
    assert_eq!(route(&path), vec![root, ids.timeline1, ids.binding1]);

    path.navigate(index, scope(ids.sub1)).unwrap();
    assert_eq!(
        route(&path),
        vec![root, ids.timeline1, ids.binding1, ids.sequence, ids.fork, ids.sub1]
    );

    path.navigate(index, scope(ids.effect)).unwrap();
    assert_eq!(
        route(&path),
        vec![root, ids.timeline1, ids.binding1, ids.sequence, ids.effect]
    );

    path.navigate(index, scope(ids.binding2)).unwrap();
    path.navigate(index, scope(ids.sub2)).unwrap();
    assert_eq!(
        route(&path),
        vec![root, ids.timeline2, ids.binding2, ids.sequence, ids.fork, ids.sub2]
    );

    let plain = ScopePath::from_leaf(index, scope(ids.sub2)).unwrap();
    assert_eq!(route(&plain), vec![root, ids.sequence, ids.fork, ids.sub2]);
    assert_ne!(plain, path);
    assert!(ScopePath::disjoint(&plain, &path));
}

#[test]
fn test_invalid_navigation_target() {
    let (session, ids) = setup_test_session();
    let index = session.index();
    let mut path = ScopePath::from_leaf(index, TestScopes::scope(&session, ids.clip)).unwrap();
    let before = path.clone();

    let result = path.navigate(index, foreign_scope());
    assert!(matches!(result, Err(SessionError::InvalidScope(_))));
    assert!(result.unwrap_err().is_navigation());
    assert_eq!(path, before);
}

#[test]
fn test_focus_stack_lifecycle() {
    let (session, ids) = setup_test_session();
    let scope = |id| TestScopes::scope(&session, id);
    assert_eq!(session.focus_depth(), 1);

    let mut focus = session.query_focus();
    assert!(focus.current_path().is_root());
    focus.shift(&session, scope(ids.binding1)).unwrap();
    focus.shift(&session, scope(ids.sub1)).unwrap();
    assert_eq!(focus.current_scope().unwrap(), scope(ids.sub1));

    {
        let mut side = QueryFocus::push(&session, scope(ids.effect)).unwrap();
        assert_eq!(session.focus_depth(), 2);
        assert!(side.current_path().contains(&scope(ids.binding1)));

        // a second handle attaches to the pushed frame
        let same = session.query_focus();
        assert_eq!(same.current_scope().unwrap(), scope(ids.effect));

        side.shift(&session, scope(ids.clip)).unwrap();
        assert_eq!(same.current_scope().unwrap(), scope(ids.clip));
    }

    // released frames vanish on the next access
    let again = session.query_focus();
    assert_eq!(session.focus_depth(), 1);
    assert_eq!(again.current_scope().unwrap(), scope(ids.sub1));
    drop(again);
    drop(focus);

    assert!(session.query_focus().current_path().is_root());
}

#[test]
fn test_focus_locate_keeps_route() {
    let (session, ids) = setup_test_session();
    let scope = |id| TestScopes::scope(&session, id);

    let mut focus = session.query_focus();
    focus.shift(&session, scope(ids.binding2)).unwrap();

    let found: Vec<_> = focus
        .locate(&session, scope(ids.sub1))
        .unwrap()
        .filter_map(|s| s.id())
        .collect();
    assert_eq!(
        found,
        vec![
            ids.sub1,
            ids.fork,
            ids.sequence,
            ids.binding2,
            ids.timeline2,
            session.index().root_id()
        ]
    );
    assert_eq!(focus.current_scope().unwrap(), scope(ids.binding2));
}

#[test]
fn test_focus_pop_restores_previous() {
    let (session, ids) = setup_test_session();
    let scope = |id| TestScopes::scope(&session, id);

    let mut base = session.query_focus();
    base.shift(&session, scope(ids.timeline1)).unwrap();

    let mut inner = QueryFocus::push(&session, scope(ids.clip)).unwrap();
    assert_eq!(session.focus_depth(), 2);
    inner.pop(&session).unwrap();
    assert_eq!(session.focus_depth(), 1);
    assert_eq!(inner.current_scope().unwrap(), scope(ids.timeline1));

    let err = inner.pop(&session).unwrap_err();
    assert!(matches!(err, SessionError::EmptyScopePath { .. }));
    drop(base);
}

#[test]
fn test_session_clear_detaches_focus() {
    let (mut session, ids) = setup_test_session();
    let mut focus = session.query_focus();
    focus
        .shift(&session, TestScopes::scope(&session, ids.sub2))
        .unwrap();

    assert_eq!(session.clear(), ids.all().len());
    let fresh = session.query_focus();
    assert!(fresh.current_path().is_root());
    assert_eq!(session.focus_depth(), 1);

    // the detached handle can be re-routed, but not into removed scopes
    assert!(focus.shift(&session, Scope::INVALID).is_err());
    focus.reset(&session);
    assert!(focus.current_path().is_root());
}
