//! Confirmed writes through the InfluxDB HTTP API.

use crate::config::DbSettings;
use crate::error_handling::WriteError;
use crate::geoip::GeoPoint;

use super::line_protocol::{encode_batch, Precision};
use super::schema::{truncate_body, SchemaProvisioner};
use super::writer::PointWriter;

/// Posts line protocol batches to `/write` and waits for the store's answer.
pub struct HttpWriter {
    client: reqwest::Client,
    write_url: String,
    database: String,
    retention_policy: String,
    measurement: String,
    credentials: Option<(String, String)>,
    schema: SchemaProvisioner,
}

impl HttpWriter {
    pub fn new(client: reqwest::Client, db: &DbSettings) -> Self {
        HttpWriter {
            schema: SchemaProvisioner::new(client.clone(), db),
            client,
            write_url: format!("{}/write", db.http_base_url()),
            database: db.database.clone(),
            retention_policy: db.retention_policy.name.clone(),
            measurement: db.measurement.clone(),
            credentials: db
                .credentials()
                .map(|(u, p)| (u.to_string(), p.to_string())),
        }
    }

    pub fn schema_provisioned(&self) -> bool {
        self.schema.is_provisioned()
    }
}

impl PointWriter for HttpWriter {
    async fn write(&mut self, batch: &[GeoPoint]) -> Result<(), WriteError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.schema.ensure_schema().await?;

        let body = encode_batch(&self.measurement, batch, Precision::Seconds);
        let mut request = self
            .client
            .post(&self.write_url)
            .query(&[
                ("db", self.database.as_str()),
                ("rp", self.retention_policy.as_str()),
                ("precision", Precision::Seconds.as_str()),
            ])
            .body(body);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WriteError::Rejected {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        log::debug!("Wrote {} points over HTTP ({})", batch.len(), status);
        Ok(())
    }
}
