//! Batch orchestrator: fetches many member profiles concurrently.
//!
//! Every tag is an independent request with its own remediation step.
//! One tag failing never aborts the others; failures are collected in the
//! report next to the members that did come back.

use crate::config::AppConfig;
use crate::error::Result;
use crate::models::Member;
use crate::scraper::{ChocolateClashScraper, PageSource};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

pub struct Pipeline<S> {
    config: AppConfig,
    scraper: Arc<ChocolateClashScraper<S>>,
}

impl Pipeline<crate::scraper::http_client::HttpClient> {
    pub fn new(config: AppConfig) -> Result<Self> {
        let scraper = ChocolateClashScraper::new(&config.scraper)?;
        Ok(Self::with_scraper(config, scraper))
    }
}

impl<S: PageSource + 'static> Pipeline<S> {
    pub fn with_scraper(config: AppConfig, scraper: ChocolateClashScraper<S>) -> Self {
        Self {
            config,
            scraper: Arc::new(scraper),
        }
    }

    pub async fn run(&self, tags: &[String]) -> PipelineReport {
        let started = Instant::now();
        let cfg = &self.config.scraper;
        let sem = Arc::new(Semaphore::new(self.config.pipeline.concurrency.max(1)));
        let mut handles = Vec::new();

        info!(
            "=== Fetching {} members (concurrency {}) ===",
            tags.len(),
            self.config.pipeline.concurrency
        );

        for tag in tags {
            let task_tag = tag.clone();
            let scraper = Arc::clone(&self.scraper);
            let sem = Arc::clone(&sem);
            let (actions, attacks, fix) = (cfg.actions_limit, cfg.attacks_limit, cfg.fix_war_pid);

            let handle = tokio::spawn(async move {
                let _permit = sem.acquire_owned().await;
                scraper.get_member(&task_tag, actions, attacks, fix).await
            });

            handles.push((tag.clone(), handle));
        }

        let mut report = PipelineReport::default();
        for (tag, handle) in handles {
            match handle.await {
                Ok(Ok(member)) => {
                    info!("{}: {} attacks", tag, member.attacks.len());
                    report.members.push(member);
                }
                Ok(Err(e)) => {
                    warn!("{}: {:#}", tag, e);
                    report.failures.push((tag, e.to_string()));
                }
                Err(e) => {
                    error!("Task panic for {}: {}", tag, e);
                    report.failures.push((tag, e.to_string()));
                }
            }
        }

        report.elapsed = started.elapsed();
        info!(
            "=== Done: {} members | {} errors | {:.2?} ===",
            report.members.len(),
            report.failures.len(),
            report.elapsed
        );
        report
    }
}

#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Members in the order their tags were given.
    pub members: Vec<Member>,
    /// `(tag, error message)` for every request that failed.
    pub failures: Vec<(String, String)>,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::League;
    use crate::scraper::parsers::tests::MEMBER_PAGE;
    use crate::scraper::tests::{FakeSource, MEMBER_URL};

    fn pipeline(source: FakeSource) -> Pipeline<FakeSource> {
        let mut config = AppConfig::default();
        config.scraper.fix_war_pid = false;
        config.pipeline.concurrency = 2;
        let scraper = ChocolateClashScraper::with_source(League::Fwa, source).unwrap();
        Pipeline::with_scraper(config, scraper)
    }

    #[test]
    fn test_failures_do_not_abort_batch() {
        let p = pipeline(FakeSource::default().page(MEMBER_URL, MEMBER_PAGE));
        let tags = vec!["#PRQL2VJR".to_string(), "#MISSING".to_string()];

        let report = tokio_test::block_on(p.run(&tags));

        assert_eq!(report.members.len(), 1);
        assert_eq!(report.members[0].tag, "#PRQL2VJR");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "#MISSING");
        assert!(report.failures[0].1.contains("404"));
    }

    #[tokio::test]
    async fn test_repeated_tags_all_fetched() {
        let p = pipeline(FakeSource::default().page(MEMBER_URL, MEMBER_PAGE));
        let tags = vec!["#PRQL2VJR".to_string(); 3];
        let report = p.run(&tags).await;
        assert_eq!(report.members.len(), 3);
        assert!(report.failures.is_empty());
    }
}
