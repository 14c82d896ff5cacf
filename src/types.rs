use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// Coarse device category assigned by the classifier.
///
/// Serialized as the fixed display labels the dashboard and the snapshot
/// file use, so the JSON is stable independent of variant names.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    #[serde(rename = "Router (gateway)")]
    Router,
    #[serde(rename = "Switch/AP")]
    SwitchAp,
    #[serde(rename = "Ordenador")]
    Computer,
    #[serde(rename = "Móvil")]
    Mobile,
    #[serde(rename = "TV / Consola")]
    TvConsole,
    #[serde(rename = "Impresora")]
    Printer,
    #[serde(rename = "IoT Device")]
    Iot,
    #[serde(rename = "Desconocido")]
    Unknown,
}

impl DeviceClass {
    pub fn label(&self) -> &'static str {
        match self {
            DeviceClass::Router => "Router (gateway)",
            DeviceClass::SwitchAp => "Switch/AP",
            DeviceClass::Computer => "Ordenador",
            DeviceClass::Mobile => "Móvil",
            DeviceClass::TvConsole => "TV / Consola",
            DeviceClass::Printer => "Impresora",
            DeviceClass::Iot => "IoT Device",
            DeviceClass::Unknown => "Desconocido",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the class legend exposed for presentation use.
#[derive(Serialize, Debug, Clone, Copy)]
pub struct LegendEntry {
    pub class: DeviceClass,
    pub icon: &'static str,
    pub color: &'static str,
}

/// Fixed class → icon/color mapping consumed by the UI.
pub const CLASS_LEGEND: &[LegendEntry] = &[
    LegendEntry { class: DeviceClass::Router, icon: "/icons/router.svg", color: "#e74c3c" },
    LegendEntry { class: DeviceClass::SwitchAp, icon: "/icons/switch.svg", color: "#e67e22" },
    LegendEntry { class: DeviceClass::Computer, icon: "/icons/pc.svg", color: "#3498db" },
    LegendEntry { class: DeviceClass::Mobile, icon: "/icons/mobile.svg", color: "#9b59b6" },
    LegendEntry { class: DeviceClass::TvConsole, icon: "/icons/tv.svg", color: "#1abc9c" },
    LegendEntry { class: DeviceClass::Printer, icon: "/icons/printer.svg", color: "#f1c40f" },
    LegendEntry { class: DeviceClass::Iot, icon: "/icons/iot.svg", color: "#2ecc71" },
    LegendEntry { class: DeviceClass::Unknown, icon: "/icons/unknown.svg", color: "#95a5a6" },
];

/// Raw facts collected for one responding host, before vendor lookup and
/// classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFacts {
    pub ip: Ipv4Addr,
    /// Lowercase colon-separated hardware address.
    pub mac: String,
    pub ttl: Option<u8>,
    pub open_ports: Vec<u16>,
    pub ssdp_hit: Option<bool>,
}

impl HostFacts {
    /// A shallow-mode record: address resolution only.
    pub fn resolved(ip: Ipv4Addr, mac: impl Into<String>) -> Self {
        Self {
            ip,
            mac: mac.into(),
            ttl: None,
            open_ports: Vec::new(),
            ssdp_hit: None,
        }
    }
}

/// One classified device in the result snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub ip: Ipv4Addr,
    pub mac: String,
    pub vendor: String,
    pub ttl: Option<u8>,
    pub open_ports: Vec<u16>,
    pub ssdp_hit: Option<bool>,
    pub class: DeviceClass,
}

/// Scan-level metadata stored alongside the device list.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotMeta {
    pub deep: bool,
    /// RFC 3339 completion time; absent until a scan has completed.
    pub generated_at: Option<String>,
    pub network: Option<String>,
    pub iface: Option<String>,
    pub gateway: Option<String>,
}

/// The complete result set produced by one scan, replacing the previous set
/// atomically on success.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSnapshot {
    #[serde(rename = "_meta")]
    pub meta: SnapshotMeta,
    pub devices: Vec<DeviceRecord>,
}

impl DeviceSnapshot {
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
