//! Store writer interface and transport selection.

use std::future::Future;

use crate::config::{DbSettings, Transport};
use crate::error_handling::{InitializationError, WriteError};
use crate::geoip::GeoPoint;
use crate::initialization::init_client;

use super::http::HttpWriter;
use super::udp::UdpWriter;

/// Delivers a batch of points to the store.
///
/// Called from a single task; implementations may keep per-process state
/// (like the schema flag) behind `&mut self` without locking.
pub trait PointWriter {
    fn write(&mut self, batch: &[GeoPoint]) -> impl Future<Output = Result<(), WriteError>> + Send;
}

/// The configured transport.
pub enum StoreWriter {
    Udp(UdpWriter),
    Http(HttpWriter),
}

impl StoreWriter {
    /// Builds the writer selected by `db.transport`.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError` if the HTTP client or UDP socket cannot be set up.
    pub async fn connect(db: &DbSettings) -> Result<Self, InitializationError> {
        let client = init_client(db)?;
        match db.transport {
            Transport::Udp => Ok(StoreWriter::Udp(UdpWriter::connect(client, db).await?)),
            Transport::Http => {
                log::info!("Writing points to {}/write", db.http_base_url());
                Ok(StoreWriter::Http(HttpWriter::new(client, db)))
            }
        }
    }
}

impl PointWriter for StoreWriter {
    async fn write(&mut self, batch: &[GeoPoint]) -> Result<(), WriteError> {
        match self {
            StoreWriter::Udp(writer) => writer.write(batch).await,
            StoreWriter::Http(writer) => writer.write(batch).await,
        }
    }
}
