//! Testing utilities for MOS workspace
//!
//! Shared test objects, fixtures, and assertions.

#![allow(missing_docs)]

use mos_model::{Binding, Clip, Effect, Fork, MObject, Placement, PlacementId, Time};
use mos_session::{PlacementIndex, Scope, SelfCheck, Session, SessionConfig};

/// Plain test object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyMO {
    pub tag: u32,
}

impl MObject for DummyMO {
    fn kind(&self) -> &'static str {
        "dummy"
    }

    fn short_id(&self) -> String {
        format!("DummyMO({})", self.tag)
    }
}

/// Test object of a second kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSubMO1 {
    pub label: String,
}

impl MObject for TestSubMO1 {
    fn kind(&self) -> &'static str {
        "test-sub-1"
    }

    fn short_id(&self) -> String {
        format!("TestSubMO1({})", self.label)
    }
}

/// Test object of a third kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSubMO2 {
    pub label: String,
}

impl MObject for TestSubMO2 {
    fn kind(&self) -> &'static str {
        "test-sub-2"
    }

    fn short_id(&self) -> String {
        format!("TestSubMO2({})", self.label)
    }
}

/// Identities within the standard test model
///
/// ```text
/// root ┬ timeline1 ┬ binding1 ⇢ sequence
///      │           └ clip
///      ├ timeline2 ─ binding2 ⇢ sequence
///      └ sequence  ┬ fork ┬ sub1 (start element)
///                  │      └ sub2
///                  └ effect
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TestScopes {
    pub timeline1: PlacementId,
    pub timeline2: PlacementId,
    pub binding1: PlacementId,
    pub binding2: PlacementId,
    pub clip: PlacementId,
    pub sequence: PlacementId,
    pub fork: PlacementId,
    pub sub1: PlacementId,
    pub sub2: PlacementId,
    pub effect: PlacementId,
}

impl TestScopes {
    /// Every identity of the model, root excluded
    pub fn all(&self) -> [PlacementId; 10] {
        [
            self.timeline1,
            self.timeline2,
            self.binding1,
            self.binding2,
            self.clip,
            self.sequence,
            self.fork,
            self.sub1,
            self.sub2,
            self.effect,
        ]
    }

    /// Scope anchored at `id`
    pub fn scope(session: &Session, id: PlacementId) -> Scope {
        Scope::new(session.index(), id).unwrap()
    }
}

pub fn test_config() -> SessionConfig {
    SessionConfig::new()
        .with_root_name("test-session")
        .with_self_check(SelfCheck::OnMutation)
}

pub fn create_test_session() -> Session {
    Session::new(test_config())
}

pub fn create_test_clip(media: &str) -> Placement {
    Placement::new(Clip::new(media, Time::from_secs(10)))
}

pub fn create_test_fork(name: &str) -> Placement {
    Placement::new(Fork::new(name))
}

pub fn create_dummy(tag: u32) -> Placement {
    Placement::new(DummyMO { tag })
}

pub fn create_sub1(label: &str) -> Placement {
    Placement::new(TestSubMO1 {
        label: label.to_string(),
    })
}

pub fn create_sub2(label: &str) -> Placement {
    Placement::new(TestSubMO2 {
        label: label.to_string(),
    })
}

/// Populate `index` with the standard test model
pub fn build_test_scopes(index: &mut PlacementIndex) -> TestScopes {
    let root = index.root_id();
    let timeline1 = index.insert(create_test_fork("timeline1"), root).unwrap();
    let timeline2 = index.insert(create_test_fork("timeline2"), root).unwrap();
    let sequence = index.insert(create_test_fork("sequence"), root).unwrap();

    let binding1 = index
        .insert(Placement::new(Binding::new(sequence)), timeline1)
        .unwrap();
    let binding2 = index
        .insert(Placement::new(Binding::new(sequence)), timeline2)
        .unwrap();
    let clip = index.insert(create_test_clip("clip"), timeline1).unwrap();

    let fork = index.insert(create_test_fork("fork"), sequence).unwrap();
    let sub1 = index.insert(create_sub1("start"), fork).unwrap();
    let sub2 = index.insert(create_sub2("other"), fork).unwrap();
    let effect = index
        .insert(Placement::new(Effect::new("blur")), sequence)
        .unwrap();

    TestScopes {
        timeline1,
        timeline2,
        binding1,
        binding2,
        clip,
        sequence,
        fork,
        sub1,
        sub2,
        effect,
    }
}

/// Fresh session holding the standard test model
pub fn setup_test_session() -> (Session, TestScopes) {
    let mut session = create_test_session();
    let scopes = build_test_scopes(session.index_mut());
    (session, scopes)
}

/// Scope that is valid in a throwaway session only
pub fn foreign_scope() -> Scope {
    let mut other = create_test_session();
    let root = other.index().root_id();
    let id = other
        .index_mut()
        .insert(create_test_fork("foreign"), root)
        .unwrap();
    Scope::new(other.index(), id).unwrap()
}

/// Assert that the index passes its self-check
pub fn assert_index_valid(index: &PlacementIndex) {
    if let Err(failure) = index.verify() {
        panic!("placement index corrupted: {failure}");
    }
}
