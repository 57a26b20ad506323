//! # Pipeline Driver
//!
//! Pulls primes off the tail of the chain and splices a new filter behind
//! each one. When the bound is reached it broadcasts shutdown and joins every
//! worker, so nothing spawned by a run outlives it.

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{check_max_value, Bound, SieveConfig};
use crate::eratosthenes::{isqrt, prime_count};
use crate::error::{Result, SieveError};
use crate::report::RunSummary;
use crate::sampling::{PrimeSample, Sampler};

use super::events::{SieveEvent, SieveEventKind};
use super::filter::spawn_filter;
use super::generator::spawn_generator;
use super::shutdown::Shutdown;
use super::stage::{StageReport, StageRole, StageTable};

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct SieveOutcome {
    /// Every discovered prime, in discovery order
    pub primes: Vec<u64>,
    pub samples: Vec<PrimeSample>,
    pub summary: RunSummary,
    /// Final topology; every stage is `Stopped`
    pub stages: StageTable,
    /// Generator report first, then one per filter in chain order
    pub stage_reports: Vec<StageReport>,
}

/// Join the generator and every filter, marking joined stages `Stopped`.
///
/// All handles are awaited before the first failure is returned, so no
/// worker is left detached.
async fn join_workers(
    generator: JoinHandle<StageReport>,
    filters: Vec<JoinHandle<StageReport>>,
    table: &mut StageTable,
) -> Result<Vec<StageReport>> {
    let generator = generator.await;
    let filters = join_all(filters).await;

    let mut reports = Vec::with_capacity(filters.len() + 1);
    let mut first_failure = None;
    for joined in std::iter::once(generator).chain(filters) {
        match joined {
            Ok(report) => {
                if let StageRole::Filter { index, .. } = report.role {
                    table.mark_stopped(index);
                }
                reports.push(report);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Pipeline worker did not finish cleanly");
                first_failure.get_or_insert(e);
            }
        }
    }

    match first_failure {
        Some(e) => Err(SieveError::Worker(e)),
        None => Ok(reports),
    }
}

/// The concurrent sieve
pub struct Sieve {
    config: SieveConfig,
    event_tx: Option<mpsc::Sender<SieveEvent>>,
}

impl Sieve {
    /// Create a sieve from a validated config
    pub fn new(config: SieveConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            event_tx: None,
        })
    }

    /// Set event channel for streaming progress
    pub fn with_event_channel(mut self, tx: mpsc::Sender<SieveEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn config(&self) -> &SieveConfig {
        &self.config
    }

    async fn emit(&self, kind: SieveEventKind) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(SieveEvent::new(kind)).await;
        }
    }

    /// Number of primes to discover, and the largest prime worth a stage
    fn plan(&self) -> Result<(usize, Option<u64>)> {
        match self.config.bound {
            Bound::Count(n) => Ok((n, None)),
            Bound::MaxValue(max) => {
                let limit = check_max_value(max)?;
                // Past sqrt(max) every survivor is already prime.
                Ok((prime_count(limit), Some(isqrt(max))))
            }
        }
    }

    /// Run the pipeline until the bound is reached
    #[tracing::instrument(skip(self), fields(bound = ?self.config.bound))]
    pub async fn run(&self) -> Result<SieveOutcome> {
        let (wanted, splice_limit) = self.plan()?;
        let mut sampler = Sampler::new(wanted, self.config.sampling_percent)?;
        let capacity = self.config.channel_capacity;

        tracing::info!(
            wanted,
            samples = sampler.sample_count(),
            capacity,
            "Starting sieve"
        );

        let shutdown = Shutdown::new();
        let (mut current, generator) = spawn_generator(capacity, shutdown.subscribe());

        let mut table = StageTable::new();
        let mut filters: Vec<JoinHandle<StageReport>> = Vec::new();
        let mut primes = Vec::with_capacity(wanted);
        let mut samples = Vec::with_capacity(sampler.sample_count());

        while primes.len() < wanted {
            let Some(prime) = current.recv().await else {
                tracing::warn!(found = primes.len(), wanted, "Candidate stream ended early");
                break;
            };
            primes.push(prime);
            let index = primes.len();

            if sampler.should_report(index) {
                samples.push(PrimeSample { index, prime });
                self.emit(SieveEventKind::PrimeSampled { index, prime })
                    .await;
            }

            // Nothing reads past the last prime.
            if index == wanted {
                break;
            }
            if splice_limit.is_some_and(|limit| prime > limit) {
                continue;
            }

            let stage = table.push(prime);
            let (next, handle) =
                spawn_filter(stage, prime, current, capacity, shutdown.subscribe());
            current = next;
            filters.push(handle);

            tracing::debug!(stage, prime, "Spliced filter stage");
            self.emit(SieveEventKind::StageSpawned {
                index: stage,
                prime,
            })
            .await;
        }

        shutdown.trigger();
        table.begin_draining();
        self.emit(SieveEventKind::ShutdownRequested {
            stages: table.len(),
        })
        .await;
        drop(current);

        let stage_reports = join_workers(generator, filters, &mut table).await?;

        if primes.len() < wanted {
            return Err(SieveError::PipelineClosed {
                found: primes.len(),
                wanted,
            });
        }

        let summary = RunSummary {
            bound: self.config.bound,
            total_primes: primes.len(),
            sampled: samples.len(),
            sampling_percent: self.config.sampling_percent,
            largest_prime: primes.last().copied(),
            stages: table.len(),
        };

        self.emit(SieveEventKind::Completed {
            primes: summary.total_primes,
            samples: summary.sampled,
        })
        .await;
        tracing::info!(
            primes = summary.total_primes,
            sampled = summary.sampled,
            stages = summary.stages,
            largest = ?summary.largest_prime,
            "Sieve finished"
        );

        Ok(SieveOutcome {
            primes,
            samples,
            summary,
            stages: table,
            stage_reports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::shutdown::Shutdown;
    use crate::pipeline::stage::{StageExit, StageState};

    fn config(bound: Bound, percent: f64) -> SieveConfig {
        SieveConfig {
            bound,
            sampling_percent: percent,
            ..SieveConfig::default()
        }
    }

    #[tokio::test]
    async fn test_first_ten_primes() {
        let sieve = Sieve::new(config(Bound::Count(10), 100.0)).unwrap();
        let outcome = sieve.run().await.unwrap();

        assert_eq!(outcome.primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert_eq!(outcome.samples.len(), 10);
        assert_eq!(outcome.samples[3], PrimeSample { index: 4, prime: 7 });
        // No stage is spliced behind the final prime
        assert_eq!(outcome.stages.primes(), vec![2, 3, 5, 7, 11, 13, 17, 19, 23]);
    }

    #[tokio::test]
    async fn test_every_stage_stops() {
        let sieve = Sieve::new(config(Bound::Count(25), 0.0)).unwrap();
        let outcome = sieve.run().await.unwrap();

        assert!(outcome.stages.all_stopped());
        assert!(outcome
            .stages
            .iter()
            .all(|s| s.state == StageState::Stopped));
        assert_eq!(outcome.stage_reports.len(), outcome.stages.len() + 1);
        assert_eq!(outcome.stage_reports[0].role, StageRole::Generator);
        assert!(outcome
            .stage_reports
            .iter()
            .all(|r| r.exit == StageExit::Cancelled));
    }

    #[tokio::test]
    async fn test_value_bound_caps_depth() {
        let sieve = Sieve::new(config(Bound::MaxValue(100), 100.0)).unwrap();
        let outcome = sieve.run().await.unwrap();

        assert_eq!(outcome.primes.len(), 25);
        assert_eq!(outcome.primes.last(), Some(&97));
        // Only primes up to sqrt(100) need a stage
        assert_eq!(outcome.stages.primes(), vec![2, 3, 5, 7]);
    }

    #[tokio::test]
    async fn test_value_bound_below_two() {
        let sieve = Sieve::new(config(Bound::MaxValue(1), 5.0)).unwrap();
        let outcome = sieve.run().await.unwrap();

        assert!(outcome.primes.is_empty());
        assert!(outcome.stages.is_empty());
        assert_eq!(outcome.summary.largest_prime, None);
    }

    #[tokio::test]
    async fn test_event_stream() {
        let (tx, mut rx) = mpsc::channel(64);
        let sieve = Sieve::new(config(Bound::Count(4), 50.0))
            .unwrap()
            .with_event_channel(tx);
        sieve.run().await.unwrap();
        drop(sieve);

        let mut kinds = Vec::new();
        while let Some(event) = rx.recv().await {
            kinds.push(event.kind);
        }

        assert_eq!(
            kinds,
            vec![
                SieveEventKind::StageSpawned { index: 0, prime: 2 },
                SieveEventKind::PrimeSampled { index: 2, prime: 3 },
                SieveEventKind::StageSpawned { index: 1, prime: 3 },
                SieveEventKind::StageSpawned { index: 2, prime: 5 },
                SieveEventKind::PrimeSampled { index: 4, prime: 7 },
                SieveEventKind::ShutdownRequested { stages: 3 },
                SieveEventKind::Completed {
                    primes: 4,
                    samples: 2
                },
            ]
        );
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(Sieve::new(config(Bound::Count(0), 5.0)).is_err());
        assert!(Sieve::new(config(Bound::Count(10), 101.0)).is_err());

        let sieve = Sieve::new(config(Bound::Count(10), 5.0)).unwrap();
        assert_eq!(sieve.config().bound, Bound::Count(10));
    }

    #[test]
    fn test_rejects_oversized_value_bound() {
        let result = Sieve::new(config(Bound::MaxValue(1_000_000_000_000_000_000), 5.0));
        assert!(matches!(result, Err(SieveError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_oversized_bound_fails_at_run_without_allocating() {
        // Skip `new` so the bound reaches `run` unvalidated.
        let sieve = Sieve {
            config: config(Bound::MaxValue(u64::MAX), 5.0),
            event_tx: None,
        };
        let result = sieve.run().await;
        assert!(matches!(result, Err(SieveError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_panicked_worker_is_reported_after_joining_all() {
        let shutdown = Shutdown::new();
        let (rx, generator) = spawn_generator(1, shutdown.subscribe());
        let mut table = StageTable::new();
        table.push(2);
        table.push(3);

        let failing = tokio::spawn(async {
            let report: Option<StageReport> = None;
            report.expect("stage failed")
        });
        let (tx, input) = mpsc::channel(1);
        let (out, healthy) = spawn_filter(1, 3, input, 1, shutdown.subscribe());

        shutdown.trigger();
        table.begin_draining();
        let result = join_workers(generator, vec![failing, healthy], &mut table).await;

        assert!(matches!(result, Err(SieveError::Worker(ref e)) if e.is_panic()));
        // The healthy stage after the panicked one was still joined
        assert_eq!(table.get(1).map(|s| s.state), Some(StageState::Stopped));
        assert_eq!(table.get(0).map(|s| s.state), Some(StageState::Draining));
        drop((rx, tx, out));
    }
}
