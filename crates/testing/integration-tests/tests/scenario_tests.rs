//! End-to-end stage scenarios on a single property.

use integration_tests::Session;
use rv_decl::{DeclId, FunctionId, PropertyId};
use rv_persistent::PersistentDeclaration;
use rv_stage::{Stage, StageError, StageErrorKind};

const G1: FunctionId = FunctionId(1);
const G2: FunctionId = FunctionId(2);

/// Creates `P` at stage 0 and sets its getter to `G1` at stage 1.
fn scenario_a(session: &mut Session) -> PropertyId {
    let id = session.property("P").unwrap();
    let stages = &session.stages;
    assert_eq!(session.store.property(id).unwrap().getter(stages), Ok(None));

    stages.advance().unwrap();
    let property = session.store.property_mut(id).unwrap();
    assert_eq!(property.set_getter(stages, Some(G1)), Ok(true));
    id
}

/// Continues with `G2` at stage 2.
fn scenario_b(session: &mut Session) -> PropertyId {
    let id = scenario_a(session);
    let stages = &session.stages;
    stages.advance().unwrap();
    let property = session.store.property_mut(id).unwrap();
    assert_eq!(property.set_getter(stages, Some(G2)), Ok(true));
    id
}

#[test]
fn test_scenario_a_write_after_advance() {
    let mut session = Session::new();
    let id = scenario_a(&mut session);

    let property = session.store.property(id).unwrap();
    assert_eq!(property.lifecycle().created_on, Stage(0));
    assert_eq!(property.lifecycle().last_modified, Stage(1));
    assert_eq!(property.getter(&session.stages), Ok(Some(G1)));
}

#[test]
fn test_scenario_b_historical_read() {
    let mut session = Session::new();
    let id = scenario_b(&mut session);
    let stages = &session.stages;

    let property = session.store.property(id).unwrap();
    assert_eq!(
        property.persistent().carrier_stages().collect::<Vec<_>>(),
        [Stage(0), Stage(1), Stage(2)]
    );
    assert_eq!(property.lifecycle().last_modified, Stage(2));
    assert_eq!(property.getter(stages), Ok(Some(G2)));
    assert_eq!(stages.with_stage(Stage(1), || property.getter(stages)), Ok(Some(G1)));
    assert_eq!(stages.with_stage(Stage(0), || property.getter(stages)), Ok(None));
    assert_eq!(stages.current_stage(), Stage(2));
}

#[test]
fn test_scenario_c_use_after_remove() {
    let mut session = Session::new();
    let id = scenario_b(&mut session);
    session.store.remove(&session.stages, DeclId::Property(id)).unwrap();
    let stages = &session.stages;

    let property = session.store.property(id).unwrap();
    assert_eq!(property.lifecycle().removed_on, Stage(2));

    let err = property.getter(stages).unwrap_err();
    assert_eq!(err.kind(), StageErrorKind::UseAfterRemove);
    stages.advance().unwrap();
    let err = property.setter(stages).unwrap_err();
    assert_eq!(
        err,
        StageError::UseAfterRemove {
            stage: Stage(3),
            removed_on: Stage(2),
        }
    );

    assert_eq!(stages.with_stage(Stage(1), || property.getter(stages)), Ok(Some(G1)));

    let property = session.store.property_mut(id).unwrap();
    let err = property.set_getter(stages, None).unwrap_err();
    assert_eq!(err.kind(), StageErrorKind::UseAfterRemove);
}

#[test]
fn test_scenario_d_non_increasing_advance() {
    let session = Session::new();
    let stages = &session.stages;
    stages.advance_to(Stage(3)).unwrap();

    for target in [Stage(3), Stage(2), Stage(0)] {
        let err = stages.advance_to(target).unwrap_err();
        assert_eq!(err.kind(), StageErrorKind::BackwardStage);
    }
    assert_eq!(stages.current_stage(), Stage(3));
}

#[test]
fn test_removed_history_dump() {
    let mut session = Session::new();
    let id = scenario_b(&mut session);
    session.store.mark_lowered(Stage(1));
    session.store.remove(&session.stages, DeclId::Property(id)).unwrap();

    let property = session.store.property(id).unwrap();
    expect_test::expect![[r#"
        created stage 0, modified stage 2, lowered stage 1, removed stage 2
          stage 0
          stage 1
          stage 2 (head)
    "#]]
    .assert_eq(&property.history().to_string());
}

#[test]
fn test_sessions_are_independent() {
    let mut first = Session::new();
    let mut second = Session::new();
    let a = first.property("a").unwrap();
    let b = second.property("b").unwrap();
    first.stages.advance_to(Stage(5)).unwrap();

    assert_eq!(second.stages.current_stage(), Stage(0));
    let in_second = second.store.property(b).unwrap();
    let result = first
        .stages
        .with_stage(Stage(2), || Ok::<_, StageError>(in_second.getter(&second.stages)));
    assert_eq!(result, Ok(Ok(None)));

    let in_first = first.store.property(a).unwrap();
    assert_eq!(in_first.getter(&first.stages), Ok(None));
}
