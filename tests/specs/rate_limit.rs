//! Backpressure: abort-on-submit and the workflow submission budget

use crate::prelude::*;
use gw_core::{StageId, UnitStatus, Workflow};

#[tokio::test]
async fn abort_on_submit_makes_one_submission_per_tick() {
    let h = harness();
    let stage = data_stage("sim", &["a", "b", "c", "d", "e"]).build().unwrap();
    let mut wf = Workflow::new("wf");
    wf.append_stage(stage).unwrap();
    wf.concurrency = 100;
    wf.run().unwrap();

    for expected in 1..=5 {
        let report = h.driver.tick(&mut wf).await;
        assert_eq!(report.submissions, 1);
        assert_eq!(h.executor.submit_count(), expected);
    }

    // everything is out: a further tick submits nothing
    let report = h.driver.tick(&mut wf).await;
    assert_eq!(report.submissions, 0);
    assert_eq!(h.executor.submit_count(), 5);
}

#[tokio::test]
async fn no_work_is_lost_across_aborted_ticks() {
    let h = harness();
    let stage = data_stage("sim", &["a", "b", "c"]).build().unwrap();
    let mut wf = Workflow::new("wf");
    wf.append_stage(stage).unwrap();
    wf.concurrency = 100;
    wf.run().unwrap();

    for _ in 0..3 {
        let _ = h.driver.tick(&mut wf).await;
    }
    let names: Vec<String> = h.executor.submitted().iter().map(|s| s.name.clone()).collect();
    assert_eq!(names, vec!["sim-a", "sim-b", "sim-c"]);
}

#[tokio::test]
async fn concurrency_budget_is_never_exceeded() {
    let h = harness();
    let stage = data_stage("sim", &["a", "b", "c", "d"])
        .abort_loop_on_submit(false)
        .build()
        .unwrap();
    let mut wf = running_workflow(vec![stage]);
    wf.concurrency = 2;

    for round in 0..4u64 {
        let _ = h.driver.tick(&mut wf).await;
        assert!(wf.n_active() <= 2, "budget exceeded on round {round}");
        // retire one live execution each round
        if (round as usize) < h.executor.submit_count() {
            h.executor.succeed(&exec(round + 1), &[]);
        }
    }

    let _ = h.driver.tick(&mut wf).await;
    let _ = h.driver.tick(&mut wf).await;
    assert_eq!(wf.n_status(UnitStatus::Completed) + wf.n_active(), 4);
}

#[tokio::test]
async fn zero_concurrency_submits_nothing() {
    let h = harness();
    let stage = data_stage("sim", &["a"]).build().unwrap();
    let mut wf = Workflow::new("wf");
    wf.append_stage(stage).unwrap();
    wf.run().unwrap();

    let _ = h.driver.tick(&mut wf).await;
    assert_eq!(h.executor.submit_count(), 0);
    // the unit exists and is simply held back
    assert_eq!(wf.stage(StageId(0)).unwrap().n_status(UnitStatus::Hold), 1);
}

#[tokio::test]
async fn threaded_stage_floods_within_its_pool() {
    let h = harness();
    let stage = data_stage("sim", &["a", "b", "c", "d", "e", "f"])
        .threaded_submission(3)
        .build()
        .unwrap();
    let mut wf = running_workflow(vec![stage]);

    let report = h.driver.tick(&mut wf).await;
    assert_eq!(report.submissions, 6);
    assert!(!report.aborted);
    assert_eq!(wf.n_active(), 6);
}
