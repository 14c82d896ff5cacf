use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use ipnet::Ipv4Net;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::classify;
use crate::config::{clamp_workers, ScanSettings};
use crate::errors::ScanError;
use crate::netdetect::{self, IfaceSource, OsIfaceSource};
use crate::oui;
use crate::probe::{ProbeOptions, Prober};
use crate::scanner::{self, SweepProgress};
use crate::store::{self, SnapshotStore};
use crate::types::{DeviceRecord, DeviceSnapshot, HostFacts, SnapshotMeta};

/// Finished jobs kept around for status queries before eviction kicks in.
pub const MAX_JOB_HISTORY: usize = 16;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Done,
    Error,
}

impl JobState {
    fn is_active(self) -> bool {
        matches!(self, JobState::Pending | JobState::Running)
    }
}

/// One scan execution, tracked independently of the snapshot it may
/// eventually publish.
#[derive(Debug)]
struct ScanJob {
    id: Uuid,
    /// Insertion order, the eviction key. Wall-clock timestamps can tie.
    seq: u64,
    state: JobState,
    cancel_requested: bool,
    message: Option<String>,
    created_at: u64,
    finished_at: Option<u64>,
    deep: bool,
    cancel: CancellationToken,
    progress: SweepProgress,
}

impl ScanJob {
    fn to_status(&self) -> JobStatus {
        JobStatus {
            id: self.id,
            state: self.state,
            cancel_requested: self.cancel_requested,
            message: self.message.clone(),
            created_at: self.created_at,
            finished_at: self.finished_at,
            deep: self.deep,
            progress: ProgressStatus {
                hosts_total: self.progress.hosts_total.load(Ordering::Relaxed),
                probed: self.progress.probed.load(Ordering::Relaxed),
                found: self.progress.found.load(Ordering::Relaxed),
            },
        }
    }
}

/// Read-only view of one job, as served to status callers.
#[derive(Serialize, Debug, Clone)]
pub struct JobStatus {
    pub id: Uuid,
    pub state: JobState,
    pub cancel_requested: bool,
    pub message: Option<String>,
    pub created_at: u64,
    pub finished_at: Option<u64>,
    pub deep: bool,
    pub progress: ProgressStatus,
}

#[derive(Serialize, Debug, Clone, Copy)]
pub struct ProgressStatus {
    pub hosts_total: u64,
    pub probed: u64,
    pub found: u64,
}

/// Everything a job needs resolved before it may be created.
#[derive(Debug)]
struct ScanPlan {
    iface_name: String,
    network: Ipv4Net,
    gateway: Option<Ipv4Addr>,
    hosts: Vec<Ipv4Addr>,
    deep: bool,
    workers: usize,
}

/// Owns the job registry and the single-flight scan policy.
///
/// At most one job is `pending`/`running` at any time. Only the job's own
/// background task moves its state; `cancel` just raises the flag and fires
/// the token.
pub struct JobManager {
    jobs: RwLock<HashMap<Uuid, ScanJob>>,
    next_seq: AtomicU64,
    store: Arc<SnapshotStore>,
    prober: Arc<dyn Prober>,
    ifaces: Arc<dyn IfaceSource>,
    settings: ScanSettings,
}

impl JobManager {
    pub fn new(settings: ScanSettings, prober: Arc<dyn Prober>) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            store: Arc::new(SnapshotStore::new()),
            prober,
            ifaces: Arc::new(OsIfaceSource),
            settings,
        }
    }

    /// Swap the interface lookup for a non-OS one.
    pub fn with_iface_source(mut self, ifaces: Arc<dyn IfaceSource>) -> Self {
        self.ifaces = ifaces;
        self
    }

    /// Start a scan. Configuration problems are rejected here, before any
    /// job record exists; a second active scan is a conflict.
    pub async fn start(self: &Arc<Self>, deep: bool, workers: usize) -> Result<Uuid, ScanError> {
        let plan = self.resolve_plan(deep, workers)?;

        // Conflict check and insert happen under one write lock so two
        // concurrent starts can never both pass.
        let mut jobs = self.jobs.write().await;
        if let Some(active) = jobs.values().find(|j| j.state.is_active()) {
            return Err(ScanError::Conflict(format!(
                "scan job {} is already active",
                active.id
            )));
        }
        evict_finished(&mut jobs);

        let id = Uuid::new_v4();
        let job = ScanJob {
            id,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            state: JobState::Pending,
            cancel_requested: false,
            message: None,
            created_at: now_ms(),
            finished_at: None,
            deep,
            cancel: CancellationToken::new(),
            progress: SweepProgress::new(),
        };
        let cancel = job.cancel.clone();
        let progress = job.progress.clone();
        jobs.insert(id, job);
        drop(jobs);

        let manager = Arc::clone(self);
        tokio::spawn(async move {
            manager.run_job(id, plan, cancel, progress).await;
        });
        Ok(id)
    }

    /// Request cancellation. Succeeds for any known job, including ones
    /// that already finished on their own; the flag and token only have an
    /// effect while the job is active.
    pub async fn cancel(&self, id: Uuid) -> Result<(), ScanError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| ScanError::NotFound(format!("job {id}")))?;
        if job.state.is_active() {
            job.cancel_requested = true;
            job.cancel.cancel();
            info!(%id, "cancellation requested");
        }
        Ok(())
    }

    pub async fn status(&self, id: Uuid) -> Result<JobStatus, ScanError> {
        let jobs = self.jobs.read().await;
        jobs.get(&id)
            .map(ScanJob::to_status)
            .ok_or_else(|| ScanError::NotFound(format!("job {id}")))
    }

    /// Latest published snapshot, independent of any in-flight job.
    pub async fn devices(&self) -> DeviceSnapshot {
        self.store.current().await
    }

    /// Resolve interface, target network and candidate hosts. The interface
    /// is always looked up, so a bad forced name fails right here; a
    /// configured network override replaces the interface's own network.
    fn resolve_plan(&self, deep: bool, workers: usize) -> Result<ScanPlan, ScanError> {
        if workers == 0 {
            return Err(ScanError::config("workers must be at least 1"));
        }
        let workers = clamp_workers(workers);

        let info = self.ifaces.resolve(self.settings.iface.as_deref())?;
        let network = self.settings.network.unwrap_or(info.network);
        let skip = network.contains(&info.ip).then_some(info.ip);
        Ok(ScanPlan {
            hosts: netdetect::enumerate_hosts(network, skip),
            iface_name: info.name,
            network,
            gateway: info.gateway,
            deep,
            workers,
        })
    }

    async fn run_job(
        self: Arc<Self>,
        id: Uuid,
        plan: ScanPlan,
        cancel: CancellationToken,
        progress: SweepProgress,
    ) {
        self.set_state(id, JobState::Running).await;
        info!(
            %id,
            iface = %plan.iface_name,
            network = %plan.network,
            hosts = plan.hosts.len(),
            deep = plan.deep,
            workers = plan.workers,
            "scan started"
        );

        let opts = ProbeOptions::from_settings(&self.settings, &plan.iface_name, plan.deep);
        let outcome =
            scanner::sweep(self.prober.clone(), &plan.hosts, opts, plan.workers, cancel, progress)
                .await;

        if outcome.cancelled {
            // A cancelled scan is a clean stop: nothing is published, the
            // previous snapshot stays canonical.
            info!(%id, probed = outcome.probed, "scan cancelled");
            self.finish(id, JobState::Done, None).await;
            return;
        }

        if !plan.hosts.is_empty() && outcome.errors >= plan.hosts.len() as u64 {
            let message = format!("all {} probes failed", plan.hosts.len());
            warn!(%id, "{message}");
            self.finish(id, JobState::Error, Some(message)).await;
            return;
        }

        let snapshot = build_snapshot(outcome.records, &plan);
        if let Some(path) = &self.settings.output {
            // Persistence is best-effort and never fails the job.
            if let Err(e) = store::save_snapshot(path, &snapshot) {
                warn!(%id, error = %e, "snapshot not persisted");
            }
        }
        let found = snapshot.devices.len();
        self.store.publish(snapshot).await;
        info!(%id, found, "scan finished");
        self.finish(id, JobState::Done, None).await;
    }

    async fn set_state(&self, id: Uuid, state: JobState) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&id) {
            job.state = state;
        }
    }

    async fn finish(&self, id: Uuid, state: JobState, message: Option<String>) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&id) {
            job.state = state;
            job.message = message;
            job.finished_at = Some(now_ms());
        }
    }
}

/// Drop the oldest finished jobs until the registry fits the history bound.
/// Active jobs are never evicted.
fn evict_finished(jobs: &mut HashMap<Uuid, ScanJob>) {
    while jobs.len() >= MAX_JOB_HISTORY {
        let oldest = jobs
            .values()
            .filter(|j| !j.state.is_active())
            .min_by_key(|j| j.seq)
            .map(|j| j.id);
        match oldest {
            Some(id) => {
                jobs.remove(&id);
            }
            None => break,
        }
    }
}

fn build_snapshot(records: Vec<HostFacts>, plan: &ScanPlan) -> DeviceSnapshot {
    let mut devices: Vec<DeviceRecord> = records
        .into_iter()
        .map(|facts| {
            let vendor = oui::lookup(&facts.mac).to_string();
            let class = classify::classify(&vendor, &facts);
            DeviceRecord {
                ip: facts.ip,
                mac: facts.mac,
                vendor,
                ttl: facts.ttl,
                open_ports: facts.open_ports,
                ssdp_hit: facts.ssdp_hit,
                class,
            }
        })
        .collect();
    devices.sort_by_key(|d| u32::from(d.ip));

    DeviceSnapshot {
        meta: SnapshotMeta {
            deep: plan.deep,
            generated_at: Some(store::now_rfc3339()),
            network: Some(plan.network.to_string()),
            iface: Some(plan.iface_name.clone()),
            gateway: plan.gateway.map(|g| g.to_string()),
        },
        devices,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
