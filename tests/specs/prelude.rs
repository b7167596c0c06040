//! Shared builders for the behavioral specs

use gw_adapters::{FakeExecutor, FakePartitioner, FakePostProcessor};
use gw_core::{DataSet, ExecutionId, FakeClock, Stage, StageBuilder, Workflow};
use gw_engine::Driver;

pub type SpecDriver = Driver<FakeExecutor, FakePartitioner, FakePostProcessor, FakeClock>;

pub struct Harness {
    pub driver: SpecDriver,
    pub executor: FakeExecutor,
    pub post: FakePostProcessor,
    pub clock: FakeClock,
}

pub fn harness() -> Harness {
    let executor = FakeExecutor::new();
    let post = FakePostProcessor::new();
    let clock = FakeClock::new();
    let driver = Driver::with_clock(
        executor.clone(),
        FakePartitioner::new(),
        post.clone(),
        clock.clone(),
    );
    Harness {
        driver,
        executor,
        post,
        clock,
    }
}

/// A stage fed by a plain dataset, one unit per item
pub fn data_stage(name: &str, items: &[&str]) -> StageBuilder {
    Stage::builder(name, "run").data(DataSet::from_items("raw", items.to_vec()))
}

/// A confirmed, running workflow with a generous submission budget
pub fn running_workflow(stages: Vec<Stage>) -> Workflow {
    let mut wf = Workflow::new("wf");
    for stage in stages {
        wf.append_stage(stage).unwrap();
    }
    wf.concurrency = 100;
    wf.check_all_stages = true;
    wf.run().unwrap();
    wf
}

/// The fake executor's n-th execution id
pub fn exec(n: u64) -> ExecutionId {
    ExecutionId(format!("exec-{n}"))
}
