//! Failure handling: retry ladder, bad units, resets and cleanup

use crate::prelude::*;
use gw_core::{ChainInput, RetryPolicy, Stage, StageId, StageStatus, UnitId, UnitStatus};

fn tight_retry() -> RetryPolicy {
    RetryPolicy {
        run_limit: 2,
        minor_run_limit: 1,
        major_run_limit: 1,
        rebroker_on_fail: true,
    }
}

#[tokio::test]
async fn exhausted_retry_budget_marks_the_unit_bad() {
    let h = harness();
    let stage = data_stage("sim", &["a"])
        .target("site-a")
        .retry(tight_retry())
        .abort_loop_on_submit(false)
        .build()
        .unwrap();
    let mut wf = running_workflow(vec![stage]);

    let _ = h.driver.tick(&mut wf).await;
    // one minor, one major, then the budget is gone
    for n in 1..=3 {
        h.executor.fail(&exec(n), "node crashed");
        let _ = h.driver.tick(&mut wf).await;
    }

    let unit = &wf.stage(StageId(0)).unwrap().units()[0];
    assert_eq!(unit.status(), UnitStatus::Bad);
    assert_eq!(unit.minor_resub_count, 1);
    assert_eq!(unit.major_resub_count, 1);
    assert_eq!(wf.stage(StageId(0)).unwrap().status(), StageStatus::Bad);
    assert_eq!(h.executor.submit_count(), 3);
}

#[tokio::test]
async fn rebrokering_rules_out_the_failed_site() {
    let h = harness();
    let stage = data_stage("sim", &["a"])
        .target("site-a")
        .retry(RetryPolicy {
            run_limit: 8,
            minor_run_limit: 0,
            major_run_limit: 3,
            rebroker_on_fail: true,
        })
        .abort_loop_on_submit(false)
        .build()
        .unwrap();
    let mut wf = running_workflow(vec![stage]);

    let _ = h.driver.tick(&mut wf).await;
    h.executor.fail(&exec(1), "node crashed");
    let _ = h.driver.tick(&mut wf).await;

    // zero minor budget: the first retry already rebrokers
    let spec = h.executor.spec_for(&exec(2)).unwrap();
    assert_eq!(spec.target, None);
    assert_eq!(spec.excluded_targets, vec!["site-a"]);
}

#[tokio::test]
async fn reset_recovers_a_bad_unit_and_the_workflow_completes() {
    let h = harness();
    let stage = data_stage("sim", &["a"])
        .retry(tight_retry())
        .abort_loop_on_submit(false)
        .build()
        .unwrap();
    let mut wf = running_workflow(vec![stage]);

    let _ = h.driver.tick(&mut wf).await;
    for n in 1..=3 {
        h.executor.fail(&exec(n), "node crashed");
        let _ = h.driver.tick(&mut wf).await;
    }
    assert_eq!(wf.stage(StageId(0)).unwrap().status(), StageStatus::Bad);

    let reset = wf.reset_units_by_status(UnitStatus::Bad);
    assert_eq!(reset, vec![(StageId(0), UnitId(0))]);
    assert_eq!(wf.stage(StageId(0)).unwrap().status(), StageStatus::Running);

    // the recovered unit runs again with a fresh budget
    let _ = h.driver.tick(&mut wf).await;
    h.executor.succeed(&exec(4), &["out.root"]);
    let _ = h.driver.tick(&mut wf).await;
    assert_eq!(wf.status(), StageStatus::Completed);

    // history survived every retry for later cleanup
    let unit = &wf.stage(StageId(0)).unwrap().units()[0];
    assert_eq!(unit.prev_executions().len(), 4);

    let purged = h.driver.remove_superseded(&mut wf).await;
    assert_eq!(purged, 4);
}

#[tokio::test]
async fn resetting_an_upstream_unit_cascades_downstream() {
    let h = harness();
    let simulate = data_stage("sim", &["a"]).abort_loop_on_submit(false).build().unwrap();
    let merge = Stage::builder("merge", "run-merge")
        .chain(ChainInput::single(StageId(0)))
        .abort_loop_on_submit(false)
        .build()
        .unwrap();
    let mut wf = running_workflow(vec![simulate, merge]);

    // run the chain to full completion
    let _ = h.driver.tick(&mut wf).await;
    h.executor.succeed(&exec(1), &["a.root"]);
    let _ = h.driver.tick(&mut wf).await;
    h.executor.succeed(&exec(2), &["merged.root"]);
    let _ = h.driver.tick(&mut wf).await;
    assert_eq!(wf.status(), StageStatus::Completed);

    // reset the upstream unit: the chained unit must be rebuilt too
    let reset = wf.reset_unit(StageId(0), UnitId(0));
    assert_eq!(reset.len(), 2);
    assert_eq!(wf.status(), StageStatus::Running);

    let _ = h.driver.tick(&mut wf).await;
    h.executor.succeed(&exec(3), &["a-v2.root"]);
    let _ = h.driver.tick(&mut wf).await;

    let merge_unit = &wf.stage(StageId(1)).unwrap().units()[0];
    assert_eq!(merge_unit.spec.input_items, vec!["a-v2.root"]);

    h.executor.succeed(&exec(4), &["merged-v2.root"]);
    let _ = h.driver.tick(&mut wf).await;
    assert_eq!(wf.status(), StageStatus::Completed);
}

#[tokio::test]
async fn unit_faults_never_block_sibling_units() {
    let h = harness();
    let stage = data_stage("sim", &["a", "b"])
        .retry(tight_retry())
        .abort_loop_on_submit(false)
        .build()
        .unwrap();
    let mut wf = running_workflow(vec![stage]);

    let _ = h.driver.tick(&mut wf).await;

    // unit a fails its way to bad while unit b keeps running
    for n in [1u64, 3, 4] {
        h.executor.fail(&exec(n), "node crashed");
        let _ = h.driver.tick(&mut wf).await;
    }
    h.executor.succeed(&exec(2), &["out.root"]);
    let _ = h.driver.tick(&mut wf).await;

    let stage = wf.stage(StageId(0)).unwrap();
    assert_eq!(stage.n_status(UnitStatus::Bad), 1);
    assert_eq!(stage.n_status(UnitStatus::Completed), 1);
}
