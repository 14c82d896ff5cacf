use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::config::ScanSettings;
use crate::errors::ScanError;
use crate::oui;
use crate::types::HostFacts;

/// Unicast M-SEARCH solicitation. Some IoT devices, TVs and media boxes
/// answer it even when sent directly instead of multicast.
const SSDP_SEARCH: &str = "M-SEARCH * HTTP/1.1\r\n\
    HOST:239.255.255.250:1900\r\n\
    MAN:\"ssdp:discover\"\r\n\
    MX:1\r\n\
    ST:ssdp:all\r\n\r\n";

const SSDP_PORT: u16 = 1900;

/// Ceiling on simultaneous connect attempts against one host. Keeps the
/// socket count bounded even for huge operator-supplied port lists.
const MAX_HOST_CONNECTS: usize = 64;

/// Per-probe knobs, fixed for the duration of one sweep and shared by all
/// of its workers.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub iface: String,
    pub deep: bool,
    pub ports: Arc<Vec<u16>>,
    pub arp_timeout: Duration,
    pub ping_timeout: Duration,
    pub connect_timeout: Duration,
    pub ssdp_timeout: Duration,
}

impl ProbeOptions {
    pub fn from_settings(settings: &ScanSettings, iface: impl Into<String>, deep: bool) -> Self {
        Self {
            iface: iface.into(),
            deep,
            ports: Arc::new(settings.ports.clone()),
            arp_timeout: settings.arp_timeout,
            ping_timeout: settings.ping_timeout,
            connect_timeout: settings.connect_timeout,
            ssdp_timeout: settings.ssdp_timeout,
        }
    }
}

/// One-host discovery probe.
///
/// Implementations must treat silence as `Ok(None)`; `Err` is reserved for
/// infrastructure failures the caller may want to count.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(
        &self,
        ip: Ipv4Addr,
        opts: &ProbeOptions,
    ) -> Result<Option<HostFacts>, ScanError>;
}

/// The production prober: ARP resolution always, then the deep sub-probes
/// when asked. Each deep sub-probe is independently best-effort and only
/// degrades the record on failure.
pub struct NetProber;

#[async_trait]
impl Prober for NetProber {
    async fn probe(
        &self,
        ip: Ipv4Addr,
        opts: &ProbeOptions,
    ) -> Result<Option<HostFacts>, ScanError> {
        let Some(mac) = resolve_mac(ip, opts).await? else {
            return Ok(None);
        };
        debug!(%ip, %mac, "host responded to arp");

        let mut facts = HostFacts::resolved(ip, mac);
        if opts.deep {
            facts.ttl = ping_ttl(ip, opts.ping_timeout).await;
            facts.open_ports = scan_ports(ip, &opts.ports, opts.connect_timeout).await;
            facts.ssdp_hit = Some(ssdp_probe(ip, opts.ssdp_timeout).await);
            trace!(
                %ip,
                ttl = ?facts.ttl,
                open = facts.open_ports.len(),
                ssdp = ?facts.ssdp_hit,
                "deep probes finished"
            );
        }
        Ok(Some(facts))
    }
}

/// ARP-resolve one address. `Ok(None)` when nothing answers in time, which
/// is the common case across most of the address space.
async fn resolve_mac(ip: Ipv4Addr, opts: &ProbeOptions) -> Result<Option<String>, ScanError> {
    let mut client = libarp::client::ArpClient::new_with_iface_name(&opts.iface)
        .map_err(|e| ScanError::probe(format!("arp client on {}: {e}", opts.iface)))?;
    match client.ip_to_mac(ip, Some(opts.arp_timeout)).await {
        Ok(mac) => Ok(Some(oui::normalize_mac(&mac.to_string()))),
        Err(_) => Ok(None),
    }
}

/// Echo-probe one address and pull the TTL off the reply.
async fn ping_ttl(ip: Ipv4Addr, wait: Duration) -> Option<u8> {
    let payload = [0u8; 56];
    match timeout(wait, surge_ping::ping(IpAddr::V4(ip), &payload)).await {
        Ok(Ok((surge_ping::IcmpPacket::V4(reply), _rtt))) => reply.get_ttl().into(),
        _ => None,
    }
}

/// Connect-scan the probe set, returning accepted ports sorted ascending.
/// At most `MAX_HOST_CONNECTS` connects are in flight at once.
async fn scan_ports(ip: Ipv4Addr, ports: &[u16], per_port: Duration) -> Vec<u16> {
    let sem = Arc::new(Semaphore::new(MAX_HOST_CONNECTS));
    let mut set = JoinSet::new();
    for &port in ports {
        let permit = sem
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore in scope");
        set.spawn(async move {
            let _permit = permit;
            let addr = SocketAddr::from((ip, port));
            match timeout(per_port, TcpStream::connect(addr)).await {
                Ok(Ok(_stream)) => Some(port),
                _ => None,
            }
        });
    }

    let mut open = Vec::new();
    while let Some(joined) = set.join_next().await {
        if let Ok(Some(port)) = joined {
            open.push(port);
        }
    }
    open.sort_unstable();
    open
}

/// Solicit a unicast SSDP response; true when anything comes back.
async fn ssdp_probe(ip: Ipv4Addr, wait: Duration) -> bool {
    ssdp_exchange(ip, wait).await.unwrap_or(false)
}

async fn ssdp_exchange(ip: Ipv4Addr, wait: Duration) -> std::io::Result<bool> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
    socket.send_to(SSDP_SEARCH.as_bytes(), (ip, SSDP_PORT)).await?;
    let mut buf = [0u8; 2048];
    match timeout(wait, socket.recv_from(&mut buf)).await {
        Ok(Ok((n, _peer))) => Ok(n > 0),
        _ => Ok(false),
    }
}
