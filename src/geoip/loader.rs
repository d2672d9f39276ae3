//! GeoIP database loading from local files.

use anyhow::{Context, Result};
use maxminddb::Reader;
use std::path::Path;

use super::types::GeoIpMetadata;

/// Loads a GeoIP database from a local file path.
///
/// The whole file is read into memory once; lookups never touch the disk again.
pub(crate) async fn load_from_file(path: &Path) -> Result<(Reader<Vec<u8>>, GeoIpMetadata)> {
    log::info!("Loading GeoIP database from: {}", path.display());

    let db_bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read GeoIP database from {}", path.display()))?;

    let reader = Reader::from_source(db_bytes)
        .with_context(|| format!("Failed to parse GeoIP database from {}", path.display()))?;

    let metadata = extract_metadata(&reader, &path.to_string_lossy());

    Ok((reader, metadata))
}

/// Extracts metadata from a GeoIP database
pub(crate) fn extract_metadata<T: AsRef<[u8]>>(reader: &Reader<T>, source: &str) -> GeoIpMetadata {
    GeoIpMetadata {
        source: source.to_string(),
        version: format!("build_{}", reader.metadata.build_epoch),
        database_type: reader.metadata.database_type.clone(),
    }
}
