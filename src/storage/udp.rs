//! Fire-and-forget writes over the InfluxDB UDP listener.

use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::config::{DbSettings, MAX_UDP_PAYLOAD_BYTES};
use crate::error_handling::{InitializationError, WriteError};
use crate::geoip::GeoPoint;

use super::line_protocol::{encode_chunked, Precision};
use super::schema::SchemaProvisioner;
use super::writer::PointWriter;

/// Sends line protocol datagrams to `db.host:db.port`.
///
/// Delivery is not confirmed; only local socket errors are reported. The
/// schema is still provisioned over HTTP before the first send.
pub struct UdpWriter {
    socket: UdpSocket,
    measurement: String,
    schema: SchemaProvisioner,
}

impl UdpWriter {
    /// Binds an ephemeral local socket and connects it to the UDP listener.
    pub async fn connect(client: reqwest::Client, db: &DbSettings) -> Result<Self, InitializationError> {
        let target = resolve(&db.udp_addr()).await?;
        let local: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };

        let socket = UdpSocket::bind(local)
            .await
            .map_err(InitializationError::UdpSocketError)?;
        socket
            .connect(target)
            .await
            .map_err(InitializationError::UdpSocketError)?;
        log::info!("Sending points to udp://{}", target);

        Ok(UdpWriter {
            socket,
            measurement: db.measurement.clone(),
            schema: SchemaProvisioner::new(client, db),
        })
    }

    pub fn schema_provisioned(&self) -> bool {
        self.schema.is_provisioned()
    }
}

async fn resolve(addr: &str) -> Result<SocketAddr, InitializationError> {
    let mut addrs = tokio::net::lookup_host(addr)
        .await
        .map_err(InitializationError::UdpSocketError)?;
    addrs.next().ok_or_else(|| {
        InitializationError::UdpSocketError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} did not resolve to any address", addr),
        ))
    })
}

impl PointWriter for UdpWriter {
    async fn write(&mut self, batch: &[GeoPoint]) -> Result<(), WriteError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.schema.ensure_schema().await?;

        // The listener cannot be told the unit and defaults to nanoseconds
        let payloads = encode_chunked(
            &self.measurement,
            batch,
            Precision::Nanoseconds,
            MAX_UDP_PAYLOAD_BYTES,
        );
        for payload in &payloads {
            self.socket.send(payload.as_bytes()).await?;
        }
        log::debug!(
            "Sent {} points in {} datagram(s)",
            batch.len(),
            payloads.len()
        );
        Ok(())
    }
}
