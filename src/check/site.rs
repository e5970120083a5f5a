use std::future::Future;

use futures::stream::{self, StreamExt};

use super::matrix::{Instruction, SitePlan};
use super::outcome::TestOutcome;

/// Runs a single instruction to an outcome. Failures are outcomes, never
/// errors.
pub trait Executor {
    fn execute(&self, instruction: &Instruction) -> impl Future<Output = TestOutcome>;
}

/// All outcomes of one pass over a site, in instruction order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteResult {
    pub name: String,
    pub outcomes: Vec<TestOutcome>,
    pub success_count: usize,
    pub fail_count: usize,
}

impl SiteResult {
    pub fn new(name: String, outcomes: Vec<TestOutcome>) -> Self {
        let success_count = outcomes.iter().filter(|o| o.success).count();
        let fail_count = outcomes.len() - success_count;
        Self {
            name,
            outcomes,
            success_count,
            fail_count,
        }
    }
}

/// Run every instruction of `plan`, at most `parallelism` at a time.
/// Outcomes keep instruction order regardless of completion order.
pub async fn run_site<E: Executor>(plan: &SitePlan, executor: &E, parallelism: usize) -> SiteResult {
    log::info!(
        "Testing site {} ({} checks)",
        plan.name,
        plan.instructions.len()
    );

    let outcomes: Vec<TestOutcome> = stream::iter(&plan.instructions)
        .map(|instruction| async move {
            executor
                .execute(instruction)
                .await
                .described(&instruction.describe())
        })
        .buffered(parallelism.max(1))
        .collect()
        .await;

    let result = SiteResult::new(plan.name.clone(), outcomes);
    log::info!(
        "Site {}: {} passed, {} failed",
        result.name,
        result.success_count,
        result.fail_count
    );
    result
}
