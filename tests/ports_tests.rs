use lanmap_rs::ports::{
    contains_any, default_probe_ports, parse_ports_str, NAS_PORTS, PRINTER_PORTS, TV_PORTS,
};

#[test]
fn parse_single_and_ranges_and_comments() {
    let input = r#"
        # signature ports
        22
        80  # http
        443 # https
        8000-8002
        8001  # duplicate
        # blank line follows

    "#;

    let ports = parse_ports_str(input).expect("parse ok");
    // Dedup, preserve insertion order of first appearance in each range/line
    assert_eq!(ports, vec![22, 80, 443, 8000, 8001, 8002]);
}

#[test]
fn parse_accepts_comma_lists() {
    let ports = parse_ports_str("515,631,9100").expect("parse ok");
    assert_eq!(ports, vec![515, 631, 9100]);
}

#[test]
fn invalid_port_rejected() {
    assert!(parse_ports_str("0\n").is_err());
    assert!(parse_ports_str("65536").is_err());
    assert!(parse_ports_str("80-22").is_err());
}

#[test]
fn default_probe_set_contains_every_signature_port() {
    let defaults = default_probe_ports();
    for p in PRINTER_PORTS.iter().chain(NAS_PORTS).chain(TV_PORTS) {
        assert!(defaults.contains(p), "missing {p}");
    }
    assert!(contains_any(&defaults, &[80]));
    assert!(contains_any(&defaults, &[445]));
}
