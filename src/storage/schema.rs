//! Lazy database and retention policy provisioning.
//!
//! The provisioned flag lives in [`SchemaProvisioner`] and is only touched
//! through `&mut self`, so it is checked and set on the single write path.

use serde::Deserialize;

use crate::config::{DbSettings, MAX_ERROR_BODY_LEN};
use crate::error_handling::SchemaError;

/// Body of an InfluxDB `/query` response.
///
/// Statement failures come back as HTTP 200 with an `error` member.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    error: Option<String>,
}

/// Creates the target database and retention policy at most once.
pub struct SchemaProvisioner {
    client: reqwest::Client,
    query_url: String,
    database: String,
    retention_name: String,
    retention_value: String,
    credentials: Option<(String, String)>,
    provisioned: bool,
}

impl SchemaProvisioner {
    pub fn new(client: reqwest::Client, db: &DbSettings) -> Self {
        SchemaProvisioner {
            client,
            query_url: format!("{}/query", db.http_base_url()),
            database: db.database.clone(),
            retention_name: db.retention_policy.name.clone(),
            retention_value: db.retention_policy.value.clone(),
            credentials: db
                .credentials()
                .map(|(u, p)| (u.to_string(), p.to_string())),
            provisioned: false,
        }
    }

    pub fn is_provisioned(&self) -> bool {
        self.provisioned
    }

    /// Creates the database and its default retention policy unless already done.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if either statement fails. The flag stays unset.
    pub async fn ensure_schema(&mut self) -> Result<(), SchemaError> {
        if self.provisioned {
            return Ok(());
        }

        self.execute(create_database_statement(&self.database))
            .await?;
        self.execute(create_retention_policy_statement(
            &self.retention_name,
            &self.database,
            &self.retention_value,
        ))
        .await?;

        self.provisioned = true;
        log::info!(
            "Provisioned database {} with default retention policy {} ({})",
            self.database,
            self.retention_name,
            self.retention_value
        );
        Ok(())
    }

    async fn execute(&self, statement: String) -> Result<(), SchemaError> {
        log::debug!("Executing schema statement: {}", statement);

        let mut request = self
            .client
            .post(&self.query_url)
            .form(&[("q", statement.as_str())]);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => return Err(SchemaError::Request { statement, source }),
        };
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(SchemaError::Rejected {
                statement,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        if let Some(error) = embedded_error(&body) {
            return Err(SchemaError::Rejected {
                statement,
                status: status.as_u16(),
                body: error,
            });
        }
        Ok(())
    }
}

/// Quotes an InfluxQL identifier.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

pub(crate) fn create_database_statement(database: &str) -> String {
    format!("CREATE DATABASE {}", quote_ident(database))
}

pub(crate) fn create_retention_policy_statement(name: &str, database: &str, duration: &str) -> String {
    format!(
        "CREATE RETENTION POLICY {} ON {} DURATION {} REPLICATION 1 DEFAULT",
        quote_ident(name),
        quote_ident(database),
        duration
    )
}

fn embedded_error(body: &str) -> Option<String> {
    let response: QueryResponse = serde_json::from_str(body).ok()?;
    response
        .error
        .or_else(|| response.results.into_iter().find_map(|r| r.error))
}

pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LEN {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
