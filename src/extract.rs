//! IPv4 address extraction and classification.
//!
//! Each log line is scanned for the first dotted quad. The pattern is purely
//! syntactic (`999.1.1.1` matches); octet ranges are enforced when the match
//! is parsed into an [`Ipv4Addr`].

use std::net::{AddrParseError, IpAddr, Ipv4Addr};
use std::sync::LazyLock;

use regex::Regex;

/// ASCII digits only; `\d` would also match other Unicode decimal digits.
static IPV4_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}")
        .expect("IPv4 pattern is a valid regex")
});

/// Returns the first IPv4-looking substring of `line`, if any.
///
/// Lines with several addresses yield only the first one.
pub fn extract_ipv4(line: &str) -> Option<&str> {
    IPV4_PATTERN.find(line).map(|m| m.as_str())
}

/// Whether `ip` is a public IPv4 address.
///
/// Rejects loopback, link-local unicast (169.254.0.0/16), link-local multicast
/// (224.0.0.0/24) and the private ranges 10.0.0.0/8, 172.16.0.0/12 and
/// 192.168.0.0/16. IPv6 addresses are never public here.
pub fn classify_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_ipv4(v4),
        IpAddr::V6(_) => false,
    }
}

fn is_public_ipv4(ip: Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();
    if ip.is_loopback() || ip.is_link_local() {
        return false;
    }
    // link-local multicast
    if a == 224 && b == 0 && c == 0 {
        return false;
    }
    !ip.is_private()
}

/// Parses an extracted dotted quad and keeps it only if public.
///
/// Returns `Ok(None)` for syntactically valid but non-public addresses and
/// `Err` for out-of-range octets such as `999.1.1.1`.
pub fn parse_public_ipv4(text: &str) -> Result<Option<Ipv4Addr>, AddrParseError> {
    let ip: Ipv4Addr = text.parse()?;
    Ok(classify_public(IpAddr::V4(ip)).then_some(ip))
}
