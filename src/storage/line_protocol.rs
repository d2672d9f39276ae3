//! InfluxDB line protocol encoding.
//!
//! Every point is written as
//! `<measurement>,city=..,country_code=..,geohash=..,host=..,ip=.. count=1i <timestamp>`
//! with tag keys in sorted order.

use std::fmt::Write;

use crate::geoip::GeoPoint;

/// Unit of the trailing timestamp.
///
/// Points always carry whole seconds; the unit only changes how they are
/// written. The HTTP API is told `precision=s`, while a UDP listener has no
/// way to learn the unit and reads its configured precision (nanoseconds by
/// default).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Seconds,
    Nanoseconds,
}

impl Precision {
    /// Value for the `precision` query parameter of `/write`
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Seconds => "s",
            Precision::Nanoseconds => "ns",
        }
    }

    fn scale(&self, unix_seconds: i64) -> i64 {
        match self {
            Precision::Seconds => unix_seconds,
            Precision::Nanoseconds => unix_seconds.saturating_mul(1_000_000_000),
        }
    }
}

/// Appends the line protocol form of `point` to `out` (no trailing newline).
pub fn encode_point(
    measurement: &str,
    point: &GeoPoint,
    precision: Precision,
    out: &mut String,
) {
    out.push_str(&escape_measurement(measurement));

    let ip = point.ip.to_string();
    // Sorted by key
    let tags = [
        ("city", point.city.as_str()),
        ("country_code", point.country_code.as_str()),
        ("geohash", point.geohash.as_str()),
        ("host", point.host.as_str()),
        ("ip", ip.as_str()),
    ];
    for (key, value) in tags {
        // Empty tag values are invalid in line protocol
        if value.is_empty() {
            continue;
        }
        out.push(',');
        out.push_str(key);
        out.push('=');
        out.push_str(&escape_tag(value));
    }

    let _ = write!(
        out,
        " count=1i {}",
        precision.scale(point.observed_at.timestamp())
    );
}

/// Encodes a batch, one point per line.
pub fn encode_batch(measurement: &str, points: &[GeoPoint], precision: Precision) -> String {
    let mut out = String::with_capacity(points.len() * 128);
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        encode_point(measurement, point, precision, &mut out);
    }
    out
}

/// Encodes a batch into payloads no larger than `max_bytes`.
///
/// A single point longer than `max_bytes` still gets its own payload.
pub fn encode_chunked(
    measurement: &str,
    points: &[GeoPoint],
    precision: Precision,
    max_bytes: usize,
) -> Vec<String> {
    let mut payloads = Vec::new();
    let mut current = String::new();
    let mut line = String::new();

    for point in points {
        line.clear();
        encode_point(measurement, point, precision, &mut line);
        if !current.is_empty() && current.len() + 1 + line.len() > max_bytes {
            payloads.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(&line);
    }
    if !current.is_empty() {
        payloads.push(current);
    }
    payloads
}

fn escape_measurement(value: &str) -> String {
    escape(value, &[',', ' '])
}

fn escape_tag(value: &str) -> String {
    escape(value, &[',', '=', ' '])
}

fn escape(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\n' | '\r' => out.push(' '),
            c if special.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}
