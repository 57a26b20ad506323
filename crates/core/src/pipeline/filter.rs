//! # Filter
//!
//! One filter per discovered prime. Values arrive in ascending order and
//! leave in the same order, minus the multiples of the stage's prime.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::shutdown::ShutdownSignal;
use super::stage::{StageExit, StageReport, StageRole};

/// Whether `value` survives a stage keyed on `prime`
#[inline]
pub fn passes(value: u64, prime: u64) -> bool {
    value % prime != 0
}

/// Spawn a filter stage reading from `input`.
///
/// Returns the stage's outbound channel and a handle resolving to its report.
pub fn spawn_filter(
    index: usize,
    prime: u64,
    mut input: mpsc::Receiver<u64>,
    capacity: usize,
    mut shutdown: ShutdownSignal,
) -> (mpsc::Receiver<u64>, JoinHandle<StageReport>) {
    debug_assert!(prime >= 2, "filter stages are keyed on primes");
    let (tx, rx) = mpsc::channel::<u64>(capacity);

    let handle = tokio::spawn(async move {
        let mut report = StageReport::new(StageRole::Filter { index, prime });

        let exit = loop {
            let value = tokio::select! {
                biased;
                _ = shutdown.recv() => break StageExit::Cancelled,
                next = input.recv() => match next {
                    Some(value) => value,
                    None => break StageExit::UpstreamClosed,
                },
            };
            report.received += 1;

            if !passes(value, prime) {
                report.dropped += 1;
                continue;
            }

            tokio::select! {
                biased;
                _ = shutdown.recv() => break StageExit::Cancelled,
                sent = tx.send(value) => {
                    if sent.is_err() {
                        break StageExit::DownstreamClosed;
                    }
                    report.forwarded += 1;
                }
            }
        };

        tracing::trace!(index, prime, ?exit, "Filter stopped");
        report.finish(exit)
    });

    (rx, handle)
}
