use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// TCP ports whose presence marks a network printer (LPD, IPP, JetDirect).
pub const PRINTER_PORTS: &[u16] = &[515, 631, 9100];

/// TCP ports typical of NAS and media-library boxes.
pub const NAS_PORTS: &[u16] = &[5000, 5001, 32400];

/// TCP ports exposed by smart TVs, casting sticks and consoles.
pub const TV_PORTS: &[u16] = &[5500, 7000, 8008, 8009, 8200, 8443, 32469];

/// Default per-host probe set for deep scans: the classification signature
/// ports plus ssh/web/smb, sorted ascending.
pub fn default_probe_ports() -> Vec<u16> {
    let mut set: BTreeSet<u16> = [22u16, 80, 443, 445].into_iter().collect();
    set.extend(PRINTER_PORTS.iter().copied());
    set.extend(NAS_PORTS.iter().copied());
    set.extend(TV_PORTS.iter().copied());
    set.into_iter().collect()
}

/// True when any of `open` appears in `wanted`.
pub fn contains_any(open: &[u16], wanted: &[u16]) -> bool {
    open.iter().any(|p| wanted.contains(p))
}

/// Parse a ports list into deduplicated TCP ports (1..=65535).
///
/// Accepted tokens, separated by commas and/or whitespace across any number
/// of lines: a single port (`80`), an inclusive range (`8000-8010`).
/// Everything after `#` on a line is a comment.
pub fn parse_ports_str(s: &str) -> Result<Vec<u16>> {
    let mut out: Vec<u16> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for (idx, raw_line) in s.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.split('#').next().unwrap_or("");
        let tokens = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty());

        for token in tokens {
            if let Some((a, b)) = token.split_once('-') {
                let start = parse_port_str(a.trim())
                    .with_context(|| format!("line {line_no}: invalid start in range: {token}"))?;
                let end = parse_port_str(b.trim())
                    .with_context(|| format!("line {line_no}: invalid end in range: {token}"))?;
                if start > end {
                    bail!("line {line_no}: invalid range {start}-{end} (start > end)");
                }
                for p in start..=end {
                    if seen.insert(p) {
                        out.push(p);
                    }
                }
            } else {
                let p = parse_port_str(token)
                    .with_context(|| format!("line {line_no}: invalid port value: {token}"))?;
                if seen.insert(p) {
                    out.push(p);
                }
            }
        }
    }

    Ok(out)
}

/// Load a ports list from a file path. Errors if the file cannot be read or parsed.
pub fn load_ports_from_path(path: impl AsRef<Path>) -> Result<Vec<u16>> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("failed to read ports file: {}", path.as_ref().display()))?;
    parse_ports_str(&content)
}

/// Load a ports list from a file, falling back to the default probe set when
/// the file is missing, unreadable or empty.
pub fn load_ports_or_default(path: impl AsRef<Path>) -> Vec<u16> {
    match load_ports_from_path(&path) {
        Ok(v) if !v.is_empty() => v,
        _ => default_probe_ports(),
    }
}

fn parse_port_str(s: &str) -> Result<u16> {
    let val: u32 = s
        .parse::<u32>()
        .with_context(|| format!("not a number: {s}"))?;
    if val == 0 || val > 65535 {
        bail!("port out of range: {val}");
    }
    Ok(val as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_ports() {
        let input = "80\n22\n   443  \n";
        let ports = parse_ports_str(input).unwrap();
        assert_eq!(ports, vec![80, 22, 443]);
    }

    #[test]
    fn parse_comma_separated_tokens() {
        let input = "80, 443, 8000-8002";
        let ports = parse_ports_str(input).unwrap();
        assert_eq!(ports, vec![80, 443, 8000, 8001, 8002]);
    }

    #[test]
    fn parse_ranges_and_dedup() {
        let input = "8000-8002\n80\n8001\n";
        let ports = parse_ports_str(input).unwrap();
        assert_eq!(ports, vec![8000, 8001, 8002, 80]);
    }

    #[test]
    fn parse_with_comments_and_whitespace() {
        let input = r#"
            # signature ports
            631  # ipp
            9100 # jetdirect
            8008-8009   # cast

            # blank lines and spaces should be fine
        "#;
        let ports = parse_ports_str(input).unwrap();
        assert_eq!(ports, vec![631, 9100, 8008, 8009]);
    }

    #[test]
    fn invalid_values_error() {
        assert!(parse_ports_str("70000\n").is_err());
        assert!(parse_ports_str("0").is_err());
        assert!(parse_ports_str("9100-631").is_err());
    }

    #[test]
    fn default_probe_set_is_sorted_and_covers_signatures() {
        let d = default_probe_ports();
        assert!(d.windows(2).all(|w| w[0] < w[1]));
        assert!(d.contains(&80) && d.contains(&443) && d.contains(&445));
        for p in PRINTER_PORTS.iter().chain(NAS_PORTS).chain(TV_PORTS) {
            assert!(d.contains(p), "missing signature port {p}");
        }
    }

    #[test]
    fn contains_any_membership() {
        assert!(contains_any(&[22, 9100], PRINTER_PORTS));
        assert!(!contains_any(&[22, 80], PRINTER_PORTS));
        assert!(!contains_any(&[], TV_PORTS));
    }
}
