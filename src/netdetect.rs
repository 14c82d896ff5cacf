use if_addrs::{get_if_addrs, IfAddr};
use ipnet::Ipv4Net;
use std::net::Ipv4Addr;

use crate::errors::ScanError;

/// The interface a scan runs from, with everything derived from it.
#[derive(Debug, Clone)]
pub struct IfaceInfo {
    pub name: String,
    pub ip: Ipv4Addr,
    /// Truncated network, e.g. `192.168.1.0/24` for ip `192.168.1.42/24`.
    pub network: Ipv4Net,
    pub gateway: Option<Ipv4Addr>,
}

/// Where scan planning gets its interface facts from.
pub trait IfaceSource: Send + Sync {
    /// Resolve the named interface, or pick a default when `name` is `None`.
    fn resolve(&self, name: Option<&str>) -> Result<IfaceInfo, ScanError>;
}

/// `IfaceSource` backed by the live OS interface table.
pub struct OsIfaceSource;

impl IfaceSource for OsIfaceSource {
    fn resolve(&self, name: Option<&str>) -> Result<IfaceInfo, ScanError> {
        match name {
            Some(n) => interface_by_name(n),
            None => default_interface(),
        }
    }
}

/// Interface name prefixes that are never scan candidates.
const VIRTUAL_PREFIXES: &[&str] = &["docker", "veth", "br-", "virbr", "tun", "tap"];

/// Pick the first physical-looking interface with a usable IPv4 address.
pub fn default_interface() -> Result<IfaceInfo, ScanError> {
    for (name, ip, netmask) in ipv4_candidates()? {
        if looks_virtual(&name) {
            continue;
        }
        return build_info(name, ip, netmask);
    }
    Err(ScanError::config("no usable IPv4 interface found"))
}

/// Resolve a specific interface by name.
pub fn interface_by_name(name: &str) -> Result<IfaceInfo, ScanError> {
    for (cand, ip, netmask) in ipv4_candidates()? {
        if cand == name {
            return build_info(cand, ip, netmask);
        }
    }
    Err(ScanError::config(format!(
        "interface {name} has no usable IPv4 address"
    )))
}

/// Parse a CIDR target override, e.g. `192.168.1.0/24`.
pub fn parse_cidr(s: &str) -> Result<Ipv4Net, ScanError> {
    s.trim()
        .parse::<Ipv4Net>()
        .map(|n| n.trunc())
        .map_err(|e| ScanError::config(format!("invalid CIDR {s}: {e}")))
}

/// Expand a network into probe targets, excluding the network and broadcast
/// addresses and, when given, the local host's own address.
pub fn enumerate_hosts(net: Ipv4Net, skip: Option<Ipv4Addr>) -> Vec<Ipv4Addr> {
    let start = u32::from(net.network());
    let end = u32::from(net.broadcast());
    if end - start <= 1 {
        // /31 and /32 have no host addresses
        return Vec::new();
    }
    (start + 1..end)
        .map(Ipv4Addr::from)
        .filter(|ip| Some(*ip) != skip)
        .collect()
}

/// Best-effort default gateway lookup from the kernel routing table,
/// optionally restricted to one interface. Returns `None` off Linux.
pub fn default_gateway(iface: Option<&str>) -> Option<Ipv4Addr> {
    #[cfg(target_os = "linux")]
    {
        let table = std::fs::read_to_string("/proc/net/route").ok()?;
        parse_route_table(&table, iface)
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = iface;
        None
    }
}

fn looks_virtual(name: &str) -> bool {
    VIRTUAL_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// All non-loopback IPv4 interface addresses as (name, ip, netmask).
fn ipv4_candidates() -> Result<Vec<(String, Ipv4Addr, Ipv4Addr)>, ScanError> {
    let mut out = Vec::new();
    for iface in get_if_addrs()? {
        if let IfAddr::V4(v4) = iface.addr {
            if v4.ip.is_loopback() || v4.ip.is_link_local() {
                continue;
            }
            out.push((iface.name, v4.ip, v4.netmask));
        }
    }
    Ok(out)
}

fn build_info(name: String, ip: Ipv4Addr, netmask: Ipv4Addr) -> Result<IfaceInfo, ScanError> {
    let prefix = netmask_prefix(netmask);
    let network = Ipv4Net::new(ip, prefix)
        .map_err(|e| ScanError::config(format!("bad netmask {netmask} on {name}: {e}")))?
        .trunc();
    let gateway = default_gateway(Some(&name));
    Ok(IfaceInfo { name, ip, network, gateway })
}

fn netmask_prefix(netmask: Ipv4Addr) -> u8 {
    u32::from(netmask).count_ones() as u8
}

/// Scan `/proc/net/route` text for the default route's gateway.
///
/// Addresses in that table are little-endian hex, so `192.168.1.1` appears
/// as `0101A8C0`.
fn parse_route_table(table: &str, iface: Option<&str>) -> Option<Ipv4Addr> {
    for line in table.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            continue;
        }
        if let Some(want) = iface {
            if fields[0] != want {
                continue;
            }
        }
        if fields[1] != "00000000" || fields[2] == "00000000" {
            continue;
        }
        if let Some(gw) = parse_hex_ipv4(fields[2]) {
            return Some(gw);
        }
    }
    None
}

fn parse_hex_ipv4(hex: &str) -> Option<Ipv4Addr> {
    let raw = u32::from_str_radix(hex, 16).ok()?;
    Some(Ipv4Addr::from(raw.swap_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn netmask_to_prefix() {
        assert_eq!(netmask_prefix(Ipv4Addr::new(255, 255, 255, 0)), 24);
        assert_eq!(netmask_prefix(Ipv4Addr::new(255, 255, 0, 0)), 16);
        assert_eq!(netmask_prefix(Ipv4Addr::new(255, 255, 255, 252)), 30);
    }

    #[test]
    fn parse_cidr_truncates_host_bits() {
        let net = parse_cidr("192.168.1.42/24").unwrap();
        assert_eq!(net.to_string(), "192.168.1.0/24");
        assert!(parse_cidr("not-a-cidr").is_err());
        assert!(parse_cidr("192.168.1.0/33").is_err());
    }

    #[test]
    fn enumerate_excludes_network_and_broadcast() {
        let net = "192.168.1.0/30".parse::<Ipv4Net>().unwrap();
        // /30 -> 4 addresses: .0 network, .1 host, .2 host, .3 broadcast
        let hosts = enumerate_hosts(net, None);
        assert_eq!(
            hosts,
            vec![Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 2)]
        );
    }

    #[test]
    fn enumerate_skips_local_address() {
        let net = "10.0.0.0/29".parse::<Ipv4Net>().unwrap();
        let local = Ipv4Addr::new(10, 0, 0, 5);
        let hosts = enumerate_hosts(net, Some(local));
        assert_eq!(hosts.len(), 5);
        assert!(!hosts.contains(&local));
    }

    #[test]
    fn enumerate_full_class_c() {
        let net = "192.168.1.0/24".parse::<Ipv4Net>().unwrap();
        let hosts = enumerate_hosts(net, None);
        assert_eq!(hosts.len(), 254);
        assert!(!hosts.contains(&Ipv4Addr::new(192, 168, 1, 0)));
        assert!(!hosts.contains(&Ipv4Addr::new(192, 168, 1, 255)));
    }

    #[test]
    fn tiny_networks_have_no_hosts() {
        let net = "192.168.1.1/32".parse::<Ipv4Net>().unwrap();
        assert!(enumerate_hosts(net, None).is_empty());
        let net = "192.168.1.0/31".parse::<Ipv4Net>().unwrap();
        assert!(enumerate_hosts(net, None).is_empty());
    }

    #[test]
    fn route_table_gateway() {
        let table = "Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\n\
                     eth0\t00000000\t0101A8C0\t0003\t0\t0\t100\t00000000\n\
                     eth0\t0001A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\n";
        assert_eq!(
            parse_route_table(table, None),
            Some(Ipv4Addr::new(192, 168, 1, 1))
        );
        assert_eq!(
            parse_route_table(table, Some("eth0")),
            Some(Ipv4Addr::new(192, 168, 1, 1))
        );
        assert_eq!(parse_route_table(table, Some("wlan0")), None);
    }

    #[test]
    fn route_table_without_default_route() {
        let table = "Iface\tDestination\tGateway \tFlags\n\
                     eth0\t0001A8C0\t00000000\t0001\n";
        assert_eq!(parse_route_table(table, None), None);
    }

    #[test]
    fn hex_ipv4_is_little_endian() {
        assert_eq!(parse_hex_ipv4("0101A8C0"), Some(Ipv4Addr::new(192, 168, 1, 1)));
        assert_eq!(parse_hex_ipv4("FE01A8C0"), Some(Ipv4Addr::new(192, 168, 1, 254)));
        assert_eq!(parse_hex_ipv4("xyz"), None);
    }

    #[test]
    fn virtual_names_are_skipped() {
        assert!(looks_virtual("docker0"));
        assert!(looks_virtual("veth12ab"));
        assert!(looks_virtual("br-77aa"));
        assert!(!looks_virtual("eth0"));
        assert!(!looks_virtual("wlan0"));
    }
}
