//! Write-path properties of the persistent engine.

use integration_tests::Session;
use proptest::prelude::*;
use rv_decl::{Annotation, Annotations, ClassId, FunctionId, SharedList, Visibility};
use rv_persistent::PersistentDeclaration;
use rv_stage::{Stage, StageError};

#[test]
fn test_identical_write_is_skipped() {
    let mut session = Session::new();
    let id = session.property("size").unwrap();
    let stages = &session.stages;
    let property = session.store.property_mut(id).unwrap();
    property.set_getter(stages, Some(FunctionId(4))).unwrap();

    stages.advance_to(Stage(3)).unwrap();
    assert_eq!(property.set_getter(stages, Some(FunctionId(4))), Ok(false));
    assert_eq!(property.set_visibility(stages, Visibility::Public), Ok(false));
    assert_eq!(property.lifecycle().last_modified, Stage(0));
    assert_eq!(property.persistent().history_len(), 0);
}

#[test]
fn test_shared_lists_compare_by_identity() {
    let mut session = Session::new();
    let id = session.property("tagged").unwrap();
    let stages = &session.stages;
    let property = session.store.property_mut(id).unwrap();

    let annotations = Annotations::from_vec(vec![Annotation {
        class: ClassId(0),
        arguments: SharedList::empty(),
    }]);
    property.set_annotations(stages, annotations.clone()).unwrap();
    stages.advance().unwrap();

    assert_eq!(property.set_annotations(stages, annotations.clone()), Ok(false));
    assert_eq!(property.persistent().history_len(), 0);

    // Equal contents in a fresh allocation count as a change.
    let copy: Annotations = annotations.iter().cloned().collect();
    assert_eq!(copy, annotations);
    assert_eq!(property.set_annotations(stages, copy), Ok(true));
    assert_eq!(property.persistent().history_len(), 1);
}

#[test]
fn test_same_stage_writes_share_one_carrier() {
    let mut session = Session::new();
    let id = session.property("count").unwrap();
    let stages = &session.stages;
    stages.advance().unwrap();
    let property = session.store.property_mut(id).unwrap();

    property.set_getter(stages, Some(FunctionId(1))).unwrap();
    assert_eq!(property.persistent().history_len(), 1);
    property.set_getter(stages, Some(FunctionId(2))).unwrap();
    property.set_setter(stages, Some(FunctionId(3))).unwrap();
    assert_eq!(property.persistent().history_len(), 1);
    assert_eq!(property.lifecycle().last_modified, Stage(1));
}

#[test]
fn test_write_in_later_stage_appends_one_carrier() {
    let mut session = Session::new();
    let id = session.function("run").unwrap();
    let stages = &session.stages;
    let function = session.store.function_mut(id).unwrap();

    for stage in 1..=4 {
        stages.advance().unwrap();
        let before = function.persistent().history_len();
        function.set_visibility(stages, if stage % 2 == 0 { Visibility::Public } else { Visibility::Internal }).unwrap();
        assert_eq!(function.persistent().history_len(), before + 1);
        assert_eq!(function.lifecycle().last_modified, Stage(stage));
    }
}

#[derive(Clone, Debug)]
enum Step {
    Advance,
    SetGetter(Option<u32>),
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        1 => Just(Step::Advance),
        3 => prop::option::of(0u32..4).prop_map(Step::SetGetter),
    ]
}

proptest! {
    #[test]
    fn historical_reads_are_stable(steps in prop::collection::vec(arb_step(), 0..40)) {
        let mut session = Session::new();
        let id = session.property("p").unwrap();
        let stages = &session.stages;
        let property = session.store.property_mut(id).unwrap();

        // Value visible at the end of each stage, indexed by stage.
        let mut expected: Vec<Option<u32>> = vec![None];
        let mut snapshots = 0;
        let mut dirty = false;

        for step in steps {
            match step {
                Step::Advance => {
                    stages.advance().unwrap();
                    expected.push(*expected.last().unwrap());
                    dirty = false;
                }
                Step::SetGetter(value) => {
                    let value = value.map(FunctionId);
                    let current = expected.last().copied().flatten().map(FunctionId);
                    let changed = property.set_getter(stages, value).unwrap();
                    prop_assert_eq!(changed, current != value);
                    if changed && !dirty && stages.current_stage() > Stage::INITIAL {
                        snapshots += 1;
                        dirty = true;
                    }
                    *expected.last_mut().unwrap() = value.map(|function| function.0);
                }
            }
        }

        prop_assert_eq!(property.persistent().history_len(), snapshots);
        for (stage, value) in (0u32..).zip(&expected) {
            let read = stages.with_stage(Stage(stage), || property.getter(stages));
            prop_assert_eq!(read, Ok::<_, StageError>(value.map(FunctionId)));
        }
    }
}
