use std::path::PathBuf;
use std::time::Duration;

use ipnet::Ipv4Net;

pub const DEFAULT_WORKERS: usize = 64;
pub const MAX_WORKERS: usize = 1024;

pub const DEFAULT_ARP_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_PING_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 500;
pub const DEFAULT_SSDP_TIMEOUT_MS: u64 = 1500;

/// Tunables shared by every scan a process runs.
///
/// Per-request knobs (deep mode, worker count) travel with the job instead;
/// everything here is fixed at startup from CLI flags or defaults.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Interface to scan from; autodetected when unset.
    pub iface: Option<String>,
    /// Target network override; derived from the interface when unset.
    pub network: Option<Ipv4Net>,
    /// TCP ports probed per host in deep mode.
    pub ports: Vec<u16>,
    pub arp_timeout: Duration,
    pub ping_timeout: Duration,
    pub connect_timeout: Duration,
    pub ssdp_timeout: Duration,
    /// Snapshot file written after each successful scan, when set.
    pub output: Option<PathBuf>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            iface: None,
            network: None,
            ports: crate::ports::default_probe_ports(),
            arp_timeout: Duration::from_millis(DEFAULT_ARP_TIMEOUT_MS),
            ping_timeout: Duration::from_millis(DEFAULT_PING_TIMEOUT_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            ssdp_timeout: Duration::from_millis(DEFAULT_SSDP_TIMEOUT_MS),
            output: None,
        }
    }
}

impl ScanSettings {
    pub fn with_arp_timeout_ms(mut self, ms: u64) -> Self {
        self.arp_timeout = Duration::from_millis(ms);
        self
    }
}

/// Clamp a requested worker count into the supported range.
///
/// Zero is rejected upstream as a configuration error; this only bounds
/// positive values.
pub fn clamp_workers(workers: usize) -> usize {
    workers.clamp(1, MAX_WORKERS)
}
