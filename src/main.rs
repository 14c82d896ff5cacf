use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lanmap_rs::config::{ScanSettings, DEFAULT_ARP_TIMEOUT_MS, DEFAULT_WORKERS};
use lanmap_rs::jobs::{JobManager, JobState};
use lanmap_rs::netdetect;
use lanmap_rs::ports;
use lanmap_rs::probe::NetProber;
use lanmap_rs::server::{self, AppState};
use lanmap_rs::types::DeviceSnapshot;

/// Discover and classify the devices on your LAN, from the terminal or a
/// small embedded dashboard.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "lanmap-rs",
    version,
    about = "Async LAN device discovery and classification with a small embedded web API.",
    long_about = None
)]
struct Cli {
    /// Network interface to scan from. If omitted, auto-detect.
    #[arg(long)]
    iface: Option<String>,

    /// Target network in CIDR form (e.g., 192.168.1.0/24). If omitted,
    /// derived from the interface.
    #[arg(long)]
    targets: Option<String>,

    /// Deep scan: add ping TTL, TCP port checks and SSDP discovery.
    #[arg(long, default_value_t = false)]
    deep: bool,

    /// Max concurrent host probes.
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// ARP resolution timeout per host, in milliseconds.
    #[arg(long = "arp-timeout-ms", default_value_t = DEFAULT_ARP_TIMEOUT_MS)]
    arp_timeout_ms: u64,

    /// Path to a ports list file for deep scans (ports and ranges,
    /// comma/newline separated). Defaults to the built-in signature set.
    #[arg(long)]
    ports: Option<PathBuf>,

    /// Snapshot file rewritten after each successful scan.
    #[arg(long, default_value = "lanmap_results.json")]
    output: PathBuf,

    /// Serve the HTTP API and dashboard on this address instead of running
    /// a one-shot scan (e.g., 127.0.0.1:8080).
    #[arg(long)]
    serve: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn to_settings(&self) -> Result<ScanSettings> {
        let network = match self.targets.as_deref() {
            Some(s) => Some(netdetect::parse_cidr(s)?),
            None => None,
        };
        let port_list = match &self.ports {
            Some(path) => ports::load_ports_or_default(path),
            None => ports::default_probe_ports(),
        };
        Ok(ScanSettings {
            iface: self.iface.clone(),
            network,
            ports: port_list,
            output: Some(self.output.clone()),
            ..ScanSettings::default()
        }
        .with_arp_timeout_ms(self.arp_timeout_ms))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let settings = cli.to_settings()?;

    println!("lanmap-rs configuration:");
    println!(
        "  iface        : {}",
        cli.iface.as_deref().unwrap_or("<auto-detect>")
    );
    println!(
        "  targets      : {}",
        settings
            .network
            .map(|n| n.to_string())
            .unwrap_or_else(|| "<interface network>".to_string())
    );
    println!("  deep         : {}", cli.deep);
    println!("  workers      : {}", cli.workers);
    println!("  probe ports  : {}", settings.ports.len());
    println!("  output       : {}", cli.output.display());

    let manager = Arc::new(JobManager::new(settings, Arc::new(NetProber)));

    if let Some(bind) = cli.serve.as_deref() {
        println!("  serve        : http://{bind}");
        return server::serve(bind, AppState::new(manager)).await;
    }

    run_once(manager, cli.deep, cli.workers).await
}

/// Run a single scan in the foreground, with Ctrl-C mapped to job
/// cancellation rather than process death.
async fn run_once(manager: Arc<JobManager>, deep: bool, workers: usize) -> Result<()> {
    let id = manager.start(deep, workers).await?;

    let cancel_mgr = manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\ncancelling scan...");
            let _ = cancel_mgr.cancel(id).await;
        }
    });

    let status = loop {
        let status = manager.status(id).await?;
        match status.state {
            JobState::Done | JobState::Error => break status,
            JobState::Pending | JobState::Running => {
                print!(
                    "\rprobed {:>4}/{} hosts, {} found",
                    status.progress.probed, status.progress.hosts_total, status.progress.found
                );
                let _ = std::io::stdout().flush();
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
        }
    };
    println!();

    if status.state == JobState::Error {
        bail!(status.message.unwrap_or_else(|| "scan failed".to_string()));
    }
    if status.cancel_requested {
        println!("scan cancelled; keeping the previous snapshot.");
        return Ok(());
    }

    let snapshot = manager.devices().await;
    print_devices_table(&snapshot);
    Ok(())
}

fn print_devices_table(snapshot: &DeviceSnapshot) {
    let meta = &snapshot.meta;
    println!(
        "\nDevices: {}  (network: {}, iface: {}, gateway: {}, deep: {})",
        snapshot.devices.len(),
        meta.network.as_deref().unwrap_or("-"),
        meta.iface.as_deref().unwrap_or("-"),
        meta.gateway.as_deref().unwrap_or("-"),
        meta.deep
    );
    if snapshot.devices.is_empty() {
        return;
    }

    let mut ip_w = "ip".len();
    let mut mac_w = "mac".len();
    let mut vendor_w = "vendor".len();
    let mut ports_w = "ports".len();
    let mut class_w = "class".len();
    let rows: Vec<(String, &str, String, String, String, String)> = snapshot
        .devices
        .iter()
        .map(|d| {
            let ip = d.ip.to_string();
            let mut vendor = d.vendor.clone();
            if vendor.len() > 32 {
                vendor.truncate(32);
            }
            let ttl = d.ttl.map_or_else(|| "-".to_string(), |t| t.to_string());
            let ports = if d.open_ports.is_empty() {
                "-".to_string()
            } else {
                d.open_ports
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            };
            let class = d.class.to_string();
            (ip, d.mac.as_str(), vendor, ttl, ports, class)
        })
        .collect();
    for (ip, mac, vendor, _ttl, ports, class) in &rows {
        ip_w = ip_w.max(ip.len());
        mac_w = mac_w.max(mac.len());
        vendor_w = vendor_w.max(vendor.len());
        ports_w = ports_w.max(ports.len());
        class_w = class_w.max(class.len());
    }
    let ttl_w = "ttl".len();

    println!(
        "{:<ip_w$}  {:<mac_w$}  {:<vendor_w$}  {:>ttl_w$}  {:<ports_w$}  {:<class_w$}",
        "ip", "mac", "vendor", "ttl", "ports", "class"
    );
    println!(
        "{:-<ip_w$}  {:-<mac_w$}  {:-<vendor_w$}  {:-<ttl_w$}  {:-<ports_w$}  {:-<class_w$}",
        "", "", "", "", "", ""
    );
    for (ip, mac, vendor, ttl, ports, class) in &rows {
        println!(
            "{:<ip_w$}  {:<mac_w$}  {:<vendor_w$}  {:>ttl_w$}  {:<ports_w$}  {:<class_w$}",
            ip, mac, vendor, ttl, ports, class
        );
    }
}
