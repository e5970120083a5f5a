use std::time::Duration;

use futures::stream::{self, StreamExt};

use super::matrix::SitePlan;
use super::site::{Executor, SiteResult, run_site};

/// Pause between the first pass and re-testing failed sites.
pub const SETTLE_INTERVAL: Duration = Duration::from_secs(10);

/// Final results of a run, sites with the most failures first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub sites: Vec<SiteResult>,
    pub success_count: usize,
    pub fail_count: usize,
    pub retried_site_count: usize,
}

impl RunSummary {
    fn new(sites: Vec<SiteResult>, retried_site_count: usize) -> Self {
        let success_count = sites.iter().map(|s| s.success_count).sum();
        let fail_count = sites.iter().map(|s| s.fail_count).sum();
        Self {
            sites,
            success_count,
            fail_count,
            retried_site_count,
        }
    }
}

/// Runs all sites, then re-runs each site with failures once, from scratch.
pub struct Orchestrator<'a, E> {
    executor: &'a E,
    parallelism: usize,
    settle_interval: Duration,
}

impl<'a, E: Executor> Orchestrator<'a, E> {
    pub fn new(executor: &'a E, parallelism: usize) -> Self {
        Self {
            executor,
            parallelism: parallelism.max(1),
            settle_interval: SETTLE_INTERVAL,
        }
    }

    pub fn with_settle_interval(mut self, settle_interval: Duration) -> Self {
        self.settle_interval = settle_interval;
        self
    }

    pub async fn run(&self, plans: &[SitePlan]) -> RunSummary {
        let mut results = self.run_sites(plans.iter()).await;

        let failed: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, result)| result.fail_count > 0)
            .map(|(index, _)| index)
            .collect();

        if !failed.is_empty() {
            log::info!(
                "{} site(s) with failures, re-testing in {:?}",
                failed.len(),
                self.settle_interval
            );
            tokio::time::sleep(self.settle_interval).await;

            let retried = self.run_sites(failed.iter().map(|&index| &plans[index])).await;
            for (&index, result) in failed.iter().zip(retried) {
                results[index] = result;
            }
        }

        results.sort_by(|a, b| b.fail_count.cmp(&a.fail_count));
        RunSummary::new(results, failed.len())
    }

    async fn run_sites<'p>(&self, plans: impl Iterator<Item = &'p SitePlan>) -> Vec<SiteResult> {
        stream::iter(plans)
            .map(|plan| run_site(plan, self.executor, self.parallelism))
            .buffered(self.parallelism)
            .collect()
            .await
    }
}
