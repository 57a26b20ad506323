//! # Generator
//!
//! Emits the candidate stream `2, 3, 4, ...` onto a bounded channel. Each
//! send waits for room downstream, so production is paced by the chain.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::shutdown::ShutdownSignal;
use super::stage::{StageExit, StageReport, StageRole};

/// First value of the candidate stream
pub const FIRST_CANDIDATE: u64 = 2;

/// Spawn the generator task.
///
/// Returns the receiving end of the candidate stream and a handle that
/// resolves to the generator's report once it stops.
pub fn spawn_generator(
    capacity: usize,
    mut shutdown: ShutdownSignal,
) -> (mpsc::Receiver<u64>, JoinHandle<StageReport>) {
    let (tx, rx) = mpsc::channel::<u64>(capacity);

    let handle = tokio::spawn(async move {
        let mut report = StageReport::new(StageRole::Generator);
        let mut next = FIRST_CANDIDATE;

        let exit = loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break StageExit::Cancelled,
                sent = tx.send(next) => {
                    if sent.is_err() {
                        break StageExit::DownstreamClosed;
                    }
                    report.forwarded += 1;
                    match next.checked_add(1) {
                        Some(n) => next = n,
                        None => break StageExit::Exhausted,
                    }
                }
            }
        };

        tracing::trace!(?exit, emitted = report.forwarded, "Generator stopped");
        report.finish(exit)
    });

    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::super::shutdown::Shutdown;
    use super::*;

    #[tokio::test]
    async fn test_emits_ascending_from_two() {
        let shutdown = Shutdown::new();
        let (mut rx, handle) = spawn_generator(1, shutdown.subscribe());

        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(rx.recv().await.unwrap());
        }
        assert_eq!(seen, vec![2, 3, 4, 5, 6]);

        shutdown.trigger();
        let report = handle.await.unwrap();
        assert_eq!(report.exit, StageExit::Cancelled);
        assert_eq!(report.received, 0);
    }

    #[tokio::test]
    async fn test_stops_when_receiver_dropped() {
        let shutdown = Shutdown::new();
        let (rx, handle) = spawn_generator(4, shutdown.subscribe());
        drop(rx);

        let report = handle.await.unwrap();
        assert_eq!(report.exit, StageExit::DownstreamClosed);
    }
}
