//! Heuristic device classification.
//!
//! Rules live in an ordered table and are evaluated first-match-wins, so
//! precedence is explicit and each rule can be exercised on its own. The
//! function is pure: same vendor and facts always yield the same class.

use std::ops::RangeInclusive;

use crate::oui;
use crate::ports::{contains_any, PRINTER_PORTS, TV_PORTS};
use crate::types::{DeviceClass, HostFacts};

/// TTL band left by Linux/embedded network gear (base 64, a few hops down).
const ROUTERISH_TTL: RangeInclusive<u8> = 58..=66;
/// TTL band left by desktop operating systems (base 128).
const DESKTOP_TTL: RangeInclusive<u8> = 120..=130;
/// TTL band left by minimal embedded stacks (base 255).
const EMBEDDED_TTL: RangeInclusive<u8> = 240..=255;

pub const INFRA_VENDORS: &[&str] = &[
    "cisco", "ubiquiti", "tplink", "tp-link", "netgear", "mikrotik", "aruba", "juniper", "d-link",
    "huawei", "zyxel",
];
pub const IOT_VENDORS: &[&str] = &[
    "espressif", "tuya", "sonoff", "shelly", "tapo", "hikvision", "ring", "dahua",
];
pub const MOBILE_VENDORS: &[&str] = &[
    "apple", "samsung", "xiaomi", "huawei", "oppo", "oneplus", "motorola", "sony", "google",
];
pub const MEDIA_VENDORS: &[&str] = &[
    "lg", "roku", "vizio", "hisense", "tcl", "philips", "panasonic", "nintendo",
];
pub const PRINTER_VENDORS: &[&str] = &["hewlett", "epson", "canon", "brother", "lexmark", "kyocera"];

/// Signals one rule may inspect. Vendor is pre-lowercased.
struct Signals<'a> {
    vendor: &'a str,
    mac: &'a str,
    ttl: Option<u8>,
    open_ports: &'a [u16],
    ssdp: bool,
}

struct Rule {
    class: DeviceClass,
    matches: fn(&Signals) -> bool,
}

/// Priority-ordered rule table. A record matching none of these is
/// `Desconocido`.
static RULES: &[Rule] = &[
    // A web-administered box answering with a near-64 TTL is the gateway
    // or something shaped like one.
    Rule {
        class: DeviceClass::Router,
        matches: |s| ttl_in(s.ttl, ROUTERISH_TTL) && contains_any(s.open_ports, &[80, 443]),
    },
    Rule {
        class: DeviceClass::SwitchAp,
        matches: |s| vendor_matches(s.vendor, INFRA_VENDORS),
    },
    // Embedded-stack TTL with nothing listening narrows IoT modules down
    // from the rest of the vendor's product line.
    Rule {
        class: DeviceClass::Iot,
        matches: |s| {
            ttl_in(s.ttl, EMBEDDED_TTL)
                && s.open_ports.is_empty()
                && vendor_matches(s.vendor, IOT_VENDORS)
        },
    },
    Rule {
        class: DeviceClass::Computer,
        matches: |s| ttl_in(s.ttl, DESKTOP_TTL),
    },
    // Randomized client MACs are overwhelmingly phones and tablets.
    Rule {
        class: DeviceClass::Mobile,
        matches: |s| oui::is_locally_administered(s.mac) || vendor_matches(s.vendor, MOBILE_VENDORS),
    },
    Rule {
        class: DeviceClass::TvConsole,
        matches: |s| {
            contains_any(s.open_ports, TV_PORTS) || (s.ssdp && vendor_matches(s.vendor, MEDIA_VENDORS))
        },
    },
    Rule {
        class: DeviceClass::Printer,
        matches: |s| {
            contains_any(s.open_ports, PRINTER_PORTS) || vendor_matches(s.vendor, PRINTER_VENDORS)
        },
    },
];

/// Map one host's collected facts and resolved vendor to a device class.
pub fn classify(vendor: &str, facts: &HostFacts) -> DeviceClass {
    let vendor_lower = vendor.to_ascii_lowercase();
    let signals = Signals {
        vendor: &vendor_lower,
        mac: &facts.mac,
        ttl: facts.ttl,
        open_ports: &facts.open_ports,
        ssdp: facts.ssdp_hit.unwrap_or(false),
    };
    RULES
        .iter()
        .find(|rule| (rule.matches)(&signals))
        .map(|rule| rule.class)
        .unwrap_or(DeviceClass::Unknown)
}

fn ttl_in(ttl: Option<u8>, band: RangeInclusive<u8>) -> bool {
    ttl.is_some_and(|t| band.contains(&t))
}

fn vendor_matches(vendor: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| vendor.contains(k))
}
