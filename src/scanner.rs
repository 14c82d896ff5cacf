use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::clamp_workers;
use crate::probe::{ProbeOptions, Prober};
use crate::types::HostFacts;

/// Live counters for one sweep, shared with whoever wants to poll progress
/// while the pool is running.
#[derive(Clone, Debug)]
pub struct SweepProgress {
    pub hosts_total: Arc<AtomicU64>,
    pub probed: Arc<AtomicU64>,
    pub found: Arc<AtomicU64>,
    pub errors: Arc<AtomicU64>,
    pub records: Arc<Mutex<Vec<HostFacts>>>,
}

impl SweepProgress {
    pub fn new() -> Self {
        Self {
            hosts_total: Arc::new(AtomicU64::new(0)),
            probed: Arc::new(AtomicU64::new(0)),
            found: Arc::new(AtomicU64::new(0)),
            errors: Arc::new(AtomicU64::new(0)),
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Default for SweepProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// What one sweep produced, including how it ended.
#[derive(Debug)]
pub struct SweepOutcome {
    pub records: Vec<HostFacts>,
    pub probed: u64,
    pub errors: u64,
    pub cancelled: bool,
}

/// Probe every candidate host with up to `workers` concurrent probes.
///
/// - A `Semaphore` bounds concurrent probes; each task holds an owned
///   permit until it finishes.
/// - Cancellation is cooperative: once the token fires no new probe is
///   started, in-flight probes drain, and the outcome is flagged.
/// - Probe errors are counted and contained; they never abort the pool.
pub async fn sweep(
    prober: Arc<dyn Prober>,
    hosts: &[Ipv4Addr],
    opts: ProbeOptions,
    workers: usize,
    cancel: CancellationToken,
    progress: SweepProgress,
) -> SweepOutcome {
    progress
        .hosts_total
        .store(hosts.len() as u64, Ordering::Relaxed);

    let sem = Arc::new(Semaphore::new(clamp_workers(workers)));
    let mut set = JoinSet::new();

    for &ip in hosts {
        if cancel.is_cancelled() {
            break;
        }
        let permit = sem
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore in scope");
        let prober = prober.clone();
        let opts = opts.clone();
        let cancel = cancel.clone();
        let progress = progress.clone();

        set.spawn(async move {
            let _permit = permit; // keep permit until task completes

            if cancel.is_cancelled() {
                return;
            }

            match prober.probe(ip, &opts).await {
                Ok(Some(facts)) => {
                    progress.found.fetch_add(1, Ordering::Relaxed);
                    let mut guard = progress.records.lock().await;
                    guard.push(facts);
                }
                Ok(None) => {
                    // Silence is the common case; nothing to record.
                }
                Err(e) => {
                    progress.errors.fetch_add(1, Ordering::Relaxed);
                    debug!(%ip, error = %e, "probe failed");
                }
            }
            progress.probed.fetch_add(1, Ordering::Relaxed);
        });
    }

    while let Some(_joined) = set.join_next().await {}

    let records = progress.records.lock().await.clone();
    SweepOutcome {
        records,
        probed: progress.probed.load(Ordering::Relaxed),
        errors: progress.errors.load(Ordering::Relaxed),
        cancelled: cancel.is_cancelled(),
    }
}
