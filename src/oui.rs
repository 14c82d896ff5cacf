use std::collections::HashMap;

use once_cell::sync::Lazy;

pub const UNKNOWN_VENDOR: &str = "Unknown";

/// Built-in OUI seed table, uppercase colon-separated 24-bit prefixes.
///
/// Deliberately small: it covers the manufacturers the classifier keys on
/// plus a few common LAN residents. Missing prefixes resolve to `Unknown`.
const OUI_TABLE: &[(&str, &str)] = &[
    // Wi-Fi / network infrastructure
    ("00:40:96", "Cisco Systems, Inc"),
    ("58:97:1E", "Cisco Systems, Inc"),
    ("24:A4:3C", "Ubiquiti Inc"),
    ("F0:9F:C2", "Ubiquiti Inc"),
    ("80:2A:A8", "Ubiquiti Inc"),
    ("50:C7:BF", "TP-Link Systems Inc"),
    ("C0:25:E9", "TP-Link Systems Inc"),
    ("20:E5:2A", "Netgear"),
    ("9C:3D:CF", "Netgear"),
    ("4C:5E:0C", "MikroTik"),
    ("E4:8D:8C", "MikroTik"),
    ("24:DE:C6", "Aruba, a Hewlett Packard Enterprise Company"),
    ("F8:C0:01", "Juniper Networks"),
    ("14:D6:4D", "D-Link International"),
    ("00:E0:FC", "Huawei Technologies Co., Ltd"),
    ("00:A0:C5", "Zyxel Communications Corporation"),
    // Phones, tablets, laptops
    ("F0:18:98", "Apple, Inc"),
    ("AC:BC:32", "Apple, Inc"),
    ("3C:22:FB", "Apple, Inc"),
    ("8C:F5:A3", "Samsung Electronics Co., Ltd"),
    ("5C:0A:5B", "Samsung Electronics Co., Ltd"),
    ("64:09:80", "Xiaomi Communications Co Ltd"),
    ("28:6C:07", "Xiaomi Communications Co Ltd"),
    ("F4:F5:D8", "Google, Inc"),
    ("1C:F2:9A", "Google, Inc"),
    ("00:13:A9", "Sony Corporation"),
    ("C0:EE:FB", "OnePlus Technology Co., Ltd"),
    ("F8:CF:C5", "Motorola Mobility LLC"),
    // Embedded / IoT modules and cameras
    ("0C:B8:15", "Espressif Inc."),
    ("24:0A:C4", "Espressif Inc."),
    ("A4:CF:12", "Espressif Inc."),
    ("84:CC:A8", "Espressif Inc."),
    ("BC:DD:C2", "Espressif Inc."),
    ("10:D5:61", "Tuya Smart Inc"),
    ("44:19:B6", "Hangzhou Hikvision Digital Technology Co., Ltd"),
    ("C0:56:E3", "Hangzhou Hikvision Digital Technology Co., Ltd"),
    ("3C:EF:8C", "Zhejiang Dahua Technology Co., Ltd"),
    ("54:E0:19", "Ring LLC"),
    // Printers
    ("3C:D9:2B", "Hewlett Packard"),
    ("94:57:A5", "Hewlett Packard"),
    ("64:EB:8C", "Seiko Epson Corporation"),
    ("00:1E:8F", "Canon Inc"),
    ("18:0C:AC", "Canon Inc"),
    ("00:80:77", "Brother Industries, Ltd"),
    ("30:05:5C", "Brother Industries, Ltd"),
    // TVs and streaming boxes
    ("A8:23:FE", "LG Electronics"),
    ("B0:A7:37", "Roku, Inc"),
    ("00:17:88", "Philips Lighting BV"),
    // Computers and NICs
    ("A0:36:9F", "Intel Corporate"),
    ("00:1B:21", "Intel Corporate"),
    ("D4:BE:D9", "Dell Inc"),
    ("B8:27:EB", "Raspberry Pi Foundation"),
    ("DC:A6:32", "Raspberry Pi Trading Ltd"),
    ("E4:5F:01", "Raspberry Pi Trading Ltd"),
    ("00:E0:4C", "Realtek Semiconductor Corp"),
];

static OUI_MAP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| OUI_TABLE.iter().copied().collect());

/// Resolve a MAC address to its manufacturer name, `Unknown` on miss.
///
/// Accepts colon, dash and dot separated forms in either case.
pub fn lookup(mac: &str) -> &'static str {
    match oui_prefix(mac) {
        Some(prefix) => OUI_MAP.get(prefix.as_str()).copied().unwrap_or(UNKNOWN_VENDOR),
        None => UNKNOWN_VENDOR,
    }
}

/// Canonical lowercase colon-separated form, as stored in device records.
/// Inputs that do not contain a full 48-bit address are passed through
/// lowercased.
pub fn normalize_mac(raw: &str) -> String {
    let hex: String = raw.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    if hex.len() != 12 {
        return raw.trim().to_ascii_lowercase();
    }
    let lower = hex.to_ascii_lowercase();
    let mut out = String::with_capacity(17);
    for (i, chunk) in lower.as_bytes().chunks(2).enumerate() {
        if i > 0 {
            out.push(':');
        }
        out.push(chunk[0] as char);
        out.push(chunk[1] as char);
    }
    out
}

/// True when the MAC has the locally-administered bit set (bit 1 of the
/// first octet). Randomized client addresses set it, burned-in ones do not.
pub fn is_locally_administered(mac: &str) -> bool {
    let hex: Vec<char> = mac.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    if hex.len() < 2 {
        return false;
    }
    let first: String = hex[..2].iter().collect();
    match u8::from_str_radix(&first, 16) {
        Ok(octet) => octet & 0x02 != 0,
        Err(_) => false,
    }
}

fn oui_prefix(mac: &str) -> Option<String> {
    let hex: Vec<char> = mac.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    if hex.len() < 6 {
        return None;
    }
    let upper: String = hex[..6].iter().collect::<String>().to_ascii_uppercase();
    Some(format!("{}:{}:{}", &upper[0..2], &upper[2..4], &upper[4..6]))
}
