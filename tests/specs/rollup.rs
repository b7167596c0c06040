//! Status rollup as observed end-to-end

use crate::prelude::*;
use gw_core::{RetryPolicy, StageId, StageStatus, UnitStatus};

fn no_retry() -> RetryPolicy {
    RetryPolicy {
        run_limit: 0,
        minor_run_limit: 0,
        major_run_limit: 0,
        rebroker_on_fail: true,
    }
}

#[tokio::test]
async fn mixed_stage_reports_running_until_everything_settles() {
    let h = harness();
    let stage = data_stage("sim", &["a", "b"])
        .abort_loop_on_submit(false)
        .build()
        .unwrap();
    let mut wf = running_workflow(vec![stage]);

    let _ = h.driver.tick(&mut wf).await;
    h.executor.succeed(&exec(1), &[]);
    let _ = h.driver.tick(&mut wf).await;

    // {completed, submitted} is still a running stage
    assert_eq!(wf.stage(StageId(0)).unwrap().status(), StageStatus::Running);
    assert_eq!(wf.status(), StageStatus::Running);

    h.executor.succeed(&exec(2), &[]);
    let _ = h.driver.tick(&mut wf).await;
    assert_eq!(wf.status(), StageStatus::Completed);
}

#[tokio::test]
async fn holds_are_reported_before_bads() {
    let h = harness();
    let stage = data_stage("sim", &["a", "b"])
        .retry(no_retry())
        .abort_loop_on_submit(false)
        .build()
        .unwrap();
    let mut wf = running_workflow(vec![stage]);
    // room for only one submission: the second unit stays on hold
    wf.concurrency = 1;

    let _ = h.driver.tick(&mut wf).await;
    h.executor.fail(&exec(1), "node crashed");
    let _ = h.driver.tick(&mut wf).await;

    let stage = wf.stage(StageId(0)).unwrap();
    assert_eq!(stage.n_status(UnitStatus::Bad), 1);
    assert_eq!(stage.n_status(UnitStatus::Hold), 1);
    // a held unit outranks a bad one in the rollup
    assert_eq!(stage.status(), StageStatus::Running);
}

#[tokio::test]
async fn bad_outranks_completed_once_nothing_is_moving() {
    let h = harness();
    let stage = data_stage("sim", &["a", "b"])
        .retry(no_retry())
        .abort_loop_on_submit(false)
        .build()
        .unwrap();
    let mut wf = running_workflow(vec![stage]);

    let _ = h.driver.tick(&mut wf).await;
    h.executor.fail(&exec(1), "node crashed");
    h.executor.succeed(&exec(2), &[]);
    let _ = h.driver.tick(&mut wf).await;

    let stage = wf.stage(StageId(0)).unwrap();
    assert_eq!(stage.n_status(UnitStatus::Bad), 1);
    assert_eq!(stage.n_status(UnitStatus::Completed), 1);
    assert_eq!(stage.status(), StageStatus::Bad);
}

#[tokio::test]
async fn paused_workflow_reports_pause() {
    let h = harness();
    let stage = data_stage("sim", &["a"]).build().unwrap();
    let mut wf = running_workflow(vec![stage]);

    let _ = h.driver.tick(&mut wf).await;
    wf.pause();
    assert_eq!(wf.status(), StageStatus::Pause);

    // resuming picks the work back up
    wf.run().unwrap();
    assert_eq!(wf.status(), StageStatus::Running);
}
