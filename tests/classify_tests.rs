use std::net::Ipv4Addr;

use lanmap_rs::classify::classify;
use lanmap_rs::oui;
use lanmap_rs::types::{DeviceClass, HostFacts};

fn shallow(ip: [u8; 4], mac: &str) -> HostFacts {
    HostFacts::resolved(Ipv4Addr::from(ip), mac)
}

fn deep(ip: [u8; 4], mac: &str, ttl: Option<u8>, ports: &[u16], ssdp: bool) -> HostFacts {
    HostFacts {
        ip: Ipv4Addr::from(ip),
        mac: mac.to_string(),
        ttl,
        open_ports: ports.to_vec(),
        ssdp_hit: Some(ssdp),
    }
}

/// Resolve the vendor the same way the scan pipeline does before
/// classifying.
fn classify_via_lookup(facts: &HostFacts) -> (&'static str, DeviceClass) {
    let vendor = oui::lookup(&facts.mac);
    (vendor, classify(vendor, facts))
}

#[test]
fn shallow_hosts_without_deep_signals_are_unknown() {
    // A gateway and an ESP module look identical after a shallow sweep:
    // only the vendor differs, and no rule trusts vendor alone here.
    let gw = shallow([192, 168, 1, 1], "58:d3:12:70:30:bc");
    let (vendor, class) = classify_via_lookup(&gw);
    assert_eq!(vendor, "Unknown");
    assert_eq!(class, DeviceClass::Unknown);

    let esp = shallow([192, 168, 1, 10], "0c:b8:15:75:d0:0b");
    let (vendor, class) = classify_via_lookup(&esp);
    assert_eq!(vendor, "Espressif Inc.");
    assert_eq!(class, DeviceClass::Unknown);
}

#[test]
fn deep_signals_upgrade_the_gateway_to_router() {
    let gw = deep([192, 168, 1, 1], "58:d3:12:70:30:bc", Some(64), &[80, 443], false);
    let (_, class) = classify_via_lookup(&gw);
    assert_eq!(class, DeviceClass::Router);
}

#[test]
fn deep_signals_upgrade_the_quiet_esp_module_to_iot() {
    let esp = deep([192, 168, 1, 10], "0c:b8:15:75:d0:0b", Some(255), &[], false);
    let (_, class) = classify_via_lookup(&esp);
    assert_eq!(class, DeviceClass::Iot);
}

#[test]
fn classifier_is_total_and_stable_over_odd_inputs() {
    let labels = [
        "Router (gateway)",
        "Switch/AP",
        "Ordenador",
        "Móvil",
        "TV / Consola",
        "Impresora",
        "IoT Device",
        "Desconocido",
    ];
    let macs = ["", "zz", "0c:b8:15:75:d0:0b", "da:a1:19:00:11:22"];
    let ttls = [None, Some(0), Some(64), Some(128), Some(255)];
    let port_sets: [&[u16]; 4] = [&[], &[80], &[9100, 32400], &[1, 22, 443, 8009, 65535]];
    let vendors = ["", "Unknown", "ACME Industrial", "Espressif Inc."];

    for mac in macs {
        for ttl in ttls {
            for ports in port_sets {
                for ssdp in [None, Some(false), Some(true)] {
                    for vendor in vendors {
                        let facts = HostFacts {
                            ip: Ipv4Addr::new(10, 1, 2, 3),
                            mac: mac.to_string(),
                            ttl,
                            open_ports: ports.to_vec(),
                            ssdp_hit: ssdp,
                        };
                        let first = classify(vendor, &facts);
                        assert!(labels.contains(&first.label()));
                        assert_eq!(classify(vendor, &facts), first);
                    }
                }
            }
        }
    }
}

#[test]
fn class_serializes_as_display_labels() {
    let pairs = [
        (DeviceClass::Router, "\"Router (gateway)\""),
        (DeviceClass::SwitchAp, "\"Switch/AP\""),
        (DeviceClass::Computer, "\"Ordenador\""),
        (DeviceClass::Mobile, "\"Móvil\""),
        (DeviceClass::TvConsole, "\"TV / Consola\""),
        (DeviceClass::Printer, "\"Impresora\""),
        (DeviceClass::Iot, "\"IoT Device\""),
        (DeviceClass::Unknown, "\"Desconocido\""),
    ];
    for (class, wire) in pairs {
        assert_eq!(serde_json::to_string(&class).unwrap(), wire);
        let back: DeviceClass = serde_json::from_str(wire).unwrap();
        assert_eq!(back, class);
        assert_eq!(format!("\"{class}\""), wire);
    }
}
