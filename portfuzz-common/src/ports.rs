//! Grammar for the `-p`/`--ports` flag:
//!
//! comma-separated tokens, each either a single unsigned integer or a
//! `LOW-HIGH` range; values above `0xFFFF` are clamped; ranges expand
//! inclusively and duplicates are permitted.

const MAX_PORT: u32 = 0xFFFF;

/// Parses a port-range spec into the ordered (possibly duplicated) list of
/// port addresses it denotes. An empty or missing spec means "no list" and
/// is represented by the caller as `None`, not by this function.
pub fn parse_ports(spec: &str) -> Result<Vec<u32>, String> {
    let mut ports = Vec::new();
    for token in spec.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.split_once('-') {
            Some((low, high)) => {
                let low = parse_port_value(low)?;
                let high = parse_port_value(high)?;
                if low > high {
                    return Err(format!("invalid port range '{token}': {low:#x} > {high:#x}"));
                }
                ports.extend(low..=high);
            }
            None => ports.push(parse_port_value(token)?),
        }
    }
    Ok(ports)
}

fn parse_port_value(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| e.to_string())?
    } else {
        s.parse::<u32>().map_err(|e| e.to_string())?
    };
    Ok(value.min(MAX_PORT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_mixed_tokens() {
        let ports = parse_ports("0x70,0x80-0x82,0x90").unwrap();
        assert_eq!(ports, vec![0x70, 0x80, 0x81, 0x82, 0x90]);
    }

    #[test]
    fn clamps_above_0xffff() {
        let ports = parse_ports("0xFFFE-0x1FFFF").unwrap();
        assert_eq!(ports, vec![0xFFFE, 0xFFFF]);
    }

    #[test]
    fn empty_spec_yields_empty_list() {
        assert_eq!(parse_ports("").unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn single_value() {
        assert_eq!(parse_ports("0x3F8").unwrap(), vec![0x3F8]);
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(parse_ports("0x80-0x10").is_err());
    }

    #[test]
    fn allows_duplicates_across_tokens() {
        assert_eq!(parse_ports("0x10,0x10").unwrap(), vec![0x10, 0x10]);
    }
}
