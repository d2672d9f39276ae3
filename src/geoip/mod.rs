//! GeoIP lookup using a MaxMind GeoLite2 City database.
//!
//! This module resolves public IPv4 addresses into [`GeoPoint`] records:
//! country code, city (falling back to the country name), a geohash of the
//! coordinates and the local hostname.

mod host;
mod loader;
mod lookup;
mod types;

// Re-export public API
pub use lookup::{build_point, GeoResolver, Resolver};
pub use types::{CityFields, GeoIpMetadata, GeoPoint};
