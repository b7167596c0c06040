//! Dependency ordering and data-level chaining between stages

use crate::prelude::*;
use gw_adapters::PostCall;
use gw_core::{ChainInput, Stage, StageId, StageStatus, UnitStatus};

#[tokio::test]
async fn two_stage_chained_workflow_runs_to_completion() {
    let h = harness();
    let simulate = data_stage("simulate", &["a", "b"])
        .abort_loop_on_submit(false)
        .build()
        .unwrap();
    let merge = Stage::builder("merge", "run-merge")
        .chain(ChainInput::single(StageId(0)).include("*.root"))
        .abort_loop_on_submit(false)
        .build()
        .unwrap();
    let mut wf = running_workflow(vec![simulate, merge]);

    // first tick: the simulate stage fans out, nothing downstream yet
    let _ = h.driver.tick(&mut wf).await;
    assert_eq!(wf.stage(StageId(0)).unwrap().units().len(), 2);
    assert!(wf.stage(StageId(1)).unwrap().units().is_empty());

    h.executor.succeed(&exec(1), &["a.root", "a.log"]);
    h.executor.succeed(&exec(2), &["b.root"]);

    // upstream completes; the chain unit appears, fed by masked output
    let _ = h.driver.tick(&mut wf).await;
    assert_eq!(wf.stage(StageId(0)).unwrap().status(), StageStatus::Completed);
    let merge_units = wf.stage(StageId(1)).unwrap().units();
    assert_eq!(merge_units.len(), 1);
    assert_eq!(merge_units[0].spec.input_items, vec!["a.root", "b.root"]);

    h.executor.succeed(&exec(3), &["merged.root"]);
    let _ = h.driver.tick(&mut wf).await;
    assert_eq!(wf.status(), StageStatus::Completed);

    // both stages announced their completion to the post-processor
    let stage_hooks = h
        .post
        .calls()
        .iter()
        .filter(|c| matches!(c, PostCall::Stage { .. }))
        .count();
    assert_eq!(stage_hooks, 2);
}

#[tokio::test]
async fn gated_stage_waits_for_the_whole_upstream_stage() {
    let h = harness();
    let simulate = data_stage("simulate", &["a", "b"])
        .abort_loop_on_submit(false)
        .build()
        .unwrap();
    let analyse = data_stage("analyse", &["n1", "n2"])
        .requires(StageId(0))
        .abort_loop_on_submit(false)
        .build()
        .unwrap();
    let mut wf = running_workflow(vec![simulate, analyse]);

    // half-finished upstream keeps the gate closed
    let _ = h.driver.tick(&mut wf).await;
    h.executor.succeed(&exec(1), &[]);
    let _ = h.driver.tick(&mut wf).await;
    assert!(wf.stage(StageId(1)).unwrap().units().is_empty());

    h.executor.succeed(&exec(2), &[]);
    let _ = h.driver.tick(&mut wf).await;
    assert_eq!(wf.stage(StageId(1)).unwrap().units().len(), 2);
    assert_eq!(wf.stage(StageId(1)).unwrap().n_status(UnitStatus::Submitted), 2);
}

#[tokio::test]
async fn chain_delay_postpones_downstream_submission() {
    let h = harness();
    let simulate = data_stage("simulate", &["a"])
        .abort_loop_on_submit(false)
        .build()
        .unwrap();
    let analyse = data_stage("analyse", &["n"])
        .requires(StageId(0))
        .chain_delay(10)
        .abort_loop_on_submit(false)
        .build()
        .unwrap();
    let mut wf = running_workflow(vec![simulate, analyse]);

    let _ = h.driver.tick(&mut wf).await;
    h.executor.succeed(&exec(1), &[]);
    let _ = h.driver.tick(&mut wf).await;

    // the gate is open but the delay holds submissions back
    assert_eq!(wf.stage(StageId(1)).unwrap().n_status(UnitStatus::Hold), 1);

    h.clock.advance(9 * 60);
    let _ = h.driver.tick(&mut wf).await;
    assert_eq!(wf.stage(StageId(1)).unwrap().n_status(UnitStatus::Hold), 1);

    h.clock.advance(60);
    let _ = h.driver.tick(&mut wf).await;
    assert_eq!(wf.stage(StageId(1)).unwrap().n_status(UnitStatus::Submitted), 1);
}

#[tokio::test]
async fn per_unit_chain_tracks_each_parent() {
    let h = harness();
    let simulate = data_stage("simulate", &["a", "b", "c"])
        .abort_loop_on_submit(false)
        .build()
        .unwrap();
    let reco = Stage::builder("reco", "run-reco")
        .chain(ChainInput::new(StageId(0)))
        .abort_loop_on_submit(false)
        .build()
        .unwrap();
    let mut wf = running_workflow(vec![simulate, reco]);

    let _ = h.driver.tick(&mut wf).await;
    for n in 1..=3 {
        let artifact = format!("out-{n}.root");
        h.executor.succeed(&exec(n), &[artifact.as_str()]);
    }
    let _ = h.driver.tick(&mut wf).await;

    let reco_stage = wf.stage(StageId(1)).unwrap();
    assert_eq!(reco_stage.units().len(), 3);
    for (i, unit) in reco_stage.units().iter().enumerate() {
        assert_eq!(unit.spec.input_items, vec![format!("out-{}.root", i + 1)]);
    }
}
