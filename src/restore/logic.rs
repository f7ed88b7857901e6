// glrestore/src/restore/logic.rs
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::report::write_report_file;
use crate::classify::{ClassificationTable, ObjectClassifier};
use crate::config::{AppConfig, PollSettings, RunMode};
use crate::cost::{self, CostEstimate};
use crate::errors::{AppError, Result};
use crate::store::{ObjectLocation, ObjectStore, RestoreOutcome, SpeedTier};
use crate::utils::format::{elapsed, usd};

#[derive(Debug, Default, PartialEq)]
pub struct RestoreSummary {
    pub initiated: Vec<ObjectLocation>,
    pub already_in_progress: Vec<ObjectLocation>,
    pub failed: Vec<(ObjectLocation, String)>,
}

#[derive(Debug, PartialEq)]
pub enum RunOutcome {
    Reported { rows: usize },
    Restored {
        summary: RestoreSummary,
        /// Number of status polls made, when waiting was requested.
        polls: Option<u32>,
    },
}

/// Classifies, estimates, and then either reports or restores.
pub struct RestoreOrchestrator<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    config: &'a AppConfig,
}

impl<'a, S: ObjectStore + ?Sized> RestoreOrchestrator<'a, S> {
    pub fn new(store: &'a S, config: &'a AppConfig) -> Self {
        Self { store, config }
    }

    fn classifier(&self) -> ObjectClassifier<'a, S> {
        ObjectClassifier::new(self.store, self.config.classify_errors)
    }

    pub async fn run(&self, locations: &[ObjectLocation]) -> Result<RunOutcome> {
        info!("Classifying {} object(s)...", locations.len());
        let table = self.classifier().classify(locations).await?;
        print_status_summary(&table);

        let estimate = cost::estimate(&table, &self.config.policy);
        print_cost_estimate(&estimate, self.config.policy.days, self.config.policy.speed);

        match &self.config.mode {
            RunMode::Report { output } => {
                write_report_file(output, &table)?;
                println!("📝 Report written to {}; no restore requests issued.", output.display());
                Ok(RunOutcome::Reported { rows: table.len() })
            }
            RunMode::Restore { wait } => {
                let targets: Vec<ObjectLocation> =
                    table.actionable().map(|r| r.location.clone()).collect();
                if targets.is_empty() {
                    println!("Nothing to restore.");
                    return Ok(RunOutcome::Restored {
                        summary: RestoreSummary::default(),
                        polls: None,
                    });
                }

                let summary = self.issue_restores(&targets).await;
                // Failed requests never start restoring, so only the rest are awaited.
                let requested: Vec<ObjectLocation> = summary
                    .initiated
                    .iter()
                    .chain(&summary.already_in_progress)
                    .cloned()
                    .collect();
                let polls = match wait {
                    Some(_) if requested.is_empty() => {
                        warn!("No restore is in progress; not waiting");
                        None
                    }
                    Some(settings) => Some(self.wait_for_restores(&requested, settings).await?),
                    None => None,
                };
                Ok(RunOutcome::Restored { summary, polls })
            }
        }
    }

    /// One request per target. A failed request is logged and the rest
    /// still go out; classification failures, by contrast, abort the run
    /// unless the skip policy is configured.
    pub async fn issue_restores(&self, targets: &[ObjectLocation]) -> RestoreSummary {
        let policy = &self.config.policy;
        let mut summary = RestoreSummary::default();

        for location in targets {
            match self
                .store
                .request_restore(location, policy.days, policy.speed)
                .await
            {
                Ok(RestoreOutcome::Initiated) => {
                    debug!("Restore initiated for {}", location);
                    summary.initiated.push(location.clone());
                }
                Ok(RestoreOutcome::AlreadyInProgress) => {
                    info!("Restore already in progress for {}", location);
                    summary.already_in_progress.push(location.clone());
                }
                Err(e) => {
                    warn!("Restore request failed for {}: {}", location, e);
                    summary.failed.push((location.clone(), e.to_string()));
                }
            }
        }

        println!(
            "🔄 Restore requests: {} initiated, {} already in progress, {} failed ({} days, {} tier)",
            summary.initiated.len(),
            summary.already_in_progress.len(),
            summary.failed.len(),
            policy.days,
            policy.speed
        );
        summary
    }

    /// Re-classifies until nothing is left restoring. `targets` should be
    /// objects with a restore underway. The first pass covers every target;
    /// later passes only the ones still restoring. Objects
    /// whose status could not be read (skip policy) stay pending.
    pub async fn wait_for_restores(
        &self,
        targets: &[ObjectLocation],
        settings: &PollSettings,
    ) -> Result<u32> {
        let started = Instant::now();
        let classifier = self.classifier();
        let mut pending = targets.to_vec();
        let mut polls = 0u32;

        loop {
            polls += 1;
            let table = classifier.classify(&pending).await?;
            let classified: HashSet<&ObjectLocation> =
                table.records().iter().map(|r| &r.location).collect();
            let restoring: HashSet<&ObjectLocation> =
                table.restoring().map(|r| &r.location).collect();
            pending.retain(|loc| restoring.contains(loc) || !classified.contains(loc));

            info!(
                "[{}] {} of {} object(s) still restoring",
                elapsed(started.elapsed()),
                pending.len(),
                targets.len()
            );
            if pending.is_empty() {
                println!(
                    "✅ {} restore(s) finished after {}",
                    targets.len(),
                    elapsed(started.elapsed())
                );
                return Ok(polls);
            }
            if let Some(max) = settings.max_polls {
                if polls >= max {
                    return Err(AppError::PollLimit {
                        polls,
                        remaining: pending.len(),
                    });
                }
            }
            tokio::time::sleep(settings.interval).await;
        }
    }
}

fn print_status_summary(table: &ClassificationTable) {
    if table.is_empty() {
        println!("No objects found.");
        return;
    }
    println!("Found {} object(s):", table.len());
    for (status, count) in table.status_counts() {
        println!("  {:<24} {}", status.as_str(), count);
    }
}

fn print_cost_estimate(estimate: &CostEstimate, days: i32, chosen: SpeedTier) {
    println!(
        "Estimated cost to restore {} object(s) ({:.3} GB) for {} day(s):",
        estimate.num_objects, estimate.total_size_gb, days
    );
    for tier in SpeedTier::ALL {
        let marker = if tier == chosen { "*" } else { " " };
        println!(
            " {} {:<10} requests {:>10}  retrieval {:>10}  subtotal {:>10}",
            marker,
            tier.as_str(),
            usd(estimate.request_cost[&tier]),
            usd(estimate.data_cost[&tier]),
            usd(estimate.tier_total(tier))
        );
    }
    println!("   storage of restored copies {}", usd(estimate.extended_storage_cost));
    println!("   total ({}) {}", chosen, usd(estimate.chosen_tier_total));
}
