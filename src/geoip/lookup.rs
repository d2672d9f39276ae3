//! IP address lookup and geo point derivation.
//!
//! The database handle is opened once at startup and held for the lifetime of
//! the pipeline; lookups are in-memory.

use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

use chrono::Utc;
use geohash::Coord;
use maxminddb::Reader;

use super::host::local_hostname;
use super::loader::load_from_file;
use super::types::{CityFields, GeoPoint};
use crate::error_handling::{InitializationError, LookupError};

/// Resolves a public address into a [`GeoPoint`].
///
/// Implemented by [`GeoResolver`] for MaxMind databases; the pipeline only
/// depends on this trait.
pub trait Resolver {
    /// Looks up `ip` and builds the enriched record.
    fn resolve(&self, ip: Ipv4Addr) -> Result<GeoPoint, LookupError>;
}

/// MaxMind City database resolver.
pub struct GeoResolver {
    reader: Reader<Vec<u8>>,
    precision: usize,
}

impl GeoResolver {
    /// Opens the City database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::GeoIpError` if the file cannot be read or
    /// is not a valid MaxMind database.
    pub async fn open(path: &Path, precision: usize) -> Result<Self, InitializationError> {
        let (reader, metadata) = load_from_file(path)
            .await
            .map_err(|e| InitializationError::GeoIpError(format!("{:#}", e)))?;
        log::info!(
            "GeoIP database loaded: {} ({}, {})",
            metadata.source,
            metadata.database_type,
            metadata.version
        );
        Ok(Self { reader, precision })
    }

    fn lookup_city(&self, ip: Ipv4Addr) -> Result<CityFields, LookupError> {
        // maxminddb 0.27 API: lookup() returns Result<LookupResult, MaxMindDbError>
        let city_lookup = self
            .reader
            .lookup(IpAddr::V4(ip))
            .map_err(|e| LookupError::Decode {
                ip: ip.to_string(),
                reason: e.to_string(),
            })?;

        if !city_lookup.has_data() {
            return Err(LookupError::NotFound(ip.to_string()));
        }

        let city_result: maxminddb::geoip2::City = match city_lookup.decode() {
            Ok(Some(city)) => city,
            Ok(None) => return Err(LookupError::NotFound(ip.to_string())),
            Err(e) => {
                return Err(LookupError::Decode {
                    ip: ip.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        Ok(CityFields {
            city_name: city_result.city.names.english.map(|s| s.to_string()),
            country_name: city_result.country.names.english.map(|s| s.to_string()),
            country_code: city_result.country.iso_code.map(|s| s.to_string()),
            latitude: city_result.location.latitude,
            longitude: city_result.location.longitude,
        })
    }
}

impl Resolver for GeoResolver {
    fn resolve(&self, ip: Ipv4Addr) -> Result<GeoPoint, LookupError> {
        let fields = self.lookup_city(ip)?;
        let host = local_hostname()?;
        build_point(ip, fields, host, self.precision)
    }
}

/// Derives a [`GeoPoint`] from raw City fields.
///
/// The city falls back to the country name when the city name is missing or
/// empty; if both are missing the entry is unusable. Entries without
/// coordinates are hashed at (0, 0), so they share the `s000...` cell.
pub fn build_point(
    ip: Ipv4Addr,
    fields: CityFields,
    host: String,
    precision: usize,
) -> Result<GeoPoint, LookupError> {
    let city = fields
        .city_name
        .filter(|name| !name.is_empty())
        .or(fields.country_name.filter(|name| !name.is_empty()))
        .ok_or_else(|| LookupError::MissingLocationName(ip.to_string()))?;

    let (latitude, longitude) = match (fields.latitude, fields.longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => {
            log::debug!("GeoIP entry for {} has no coordinates; hashing (0, 0)", ip);
            (0.0, 0.0)
        }
    };

    let geohash = geohash::encode(
        Coord {
            x: longitude,
            y: latitude,
        },
        precision,
    )
    .map_err(|e| LookupError::Geohash {
        ip: ip.to_string(),
        reason: e.to_string(),
    })?;

    Ok(GeoPoint {
        geohash,
        host,
        ip,
        country_code: fields.country_code.unwrap_or_default(),
        city,
        observed_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mountain_view() -> CityFields {
        CityFields {
            city_name: Some("Mountain View".to_string()),
            country_name: Some("United States".to_string()),
            country_code: Some("US".to_string()),
            latitude: Some(37.386),
            longitude: Some(-122.0838),
        }
    }

    #[test]
    fn test_build_point_uses_city_name() {
        let ip = Ipv4Addr::new(8, 8, 8, 8);
        let point = build_point(ip, mountain_view(), "web-1".into(), 12).unwrap();
        assert_eq!(point.city, "Mountain View");
        assert_eq!(point.country_code, "US");
        assert_eq!(point.host, "web-1");
        assert_eq!(point.ip, ip);
        assert_eq!(point.geohash.len(), 12);
        assert!(point.geohash.starts_with("9q9"));
    }

    #[test]
    fn test_build_point_falls_back_to_country_name() {
        let mut fields = mountain_view();
        fields.city_name = Some(String::new());
        let point = build_point(Ipv4Addr::new(8, 8, 8, 8), fields, "h".into(), 12).unwrap();
        assert_eq!(point.city, "United States");

        let mut fields = mountain_view();
        fields.city_name = None;
        let point = build_point(Ipv4Addr::new(8, 8, 8, 8), fields, "h".into(), 12).unwrap();
        assert_eq!(point.city, "United States");
    }

    #[test]
    fn test_build_point_without_any_name_fails() {
        let mut fields = mountain_view();
        fields.city_name = None;
        fields.country_name = Some(String::new());
        let result = build_point(Ipv4Addr::new(8, 8, 8, 8), fields, "h".into(), 12);
        assert!(matches!(result, Err(LookupError::MissingLocationName(_))));
    }

    #[test]
    fn test_build_point_without_coordinates_uses_origin() {
        let mut fields = mountain_view();
        fields.longitude = None;
        let point = build_point(Ipv4Addr::new(8, 8, 8, 8), fields, "h".into(), 12).unwrap();
        assert_eq!(point.geohash, "s00000000000");
        assert_eq!(point.city, "Mountain View");
    }

    #[test]
    fn test_build_point_is_deterministic() {
        let ip = Ipv4Addr::new(8, 8, 8, 8);
        let first = build_point(ip, mountain_view(), "h".into(), 12).unwrap();
        let second = build_point(ip, mountain_view(), "h".into(), 12).unwrap();
        assert_eq!(first.geohash, second.geohash);
        assert_eq!(first.city, second.city);
        assert_eq!(first.country_code, second.country_code);
    }

    #[test]
    fn test_build_point_precision_is_prefix() {
        let ip = Ipv4Addr::new(8, 8, 8, 8);
        let long = build_point(ip, mountain_view(), "h".into(), 12).unwrap();
        let short = build_point(ip, mountain_view(), "h".into(), 5).unwrap();
        assert_eq!(short.geohash.len(), 5);
        assert!(long.geohash.starts_with(&short.geohash));
    }

    #[test]
    fn test_build_point_missing_country_code_is_empty() {
        let mut fields = mountain_view();
        fields.country_code = None;
        let point = build_point(Ipv4Addr::new(8, 8, 8, 8), fields, "h".into(), 12).unwrap();
        assert_eq!(point.country_code, "");
    }

    #[tokio::test]
    async fn test_open_missing_database_is_error() {
        let result = GeoResolver::open(Path::new("nonexistent/GeoLite2-City.mmdb"), 12).await;
        assert!(matches!(result, Err(InitializationError::GeoIpError(_))));
    }
}
