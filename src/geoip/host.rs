//! Local hostname, resolved once per process.

use std::sync::OnceLock;

use crate::error_handling::LookupError;

static LOCAL_HOSTNAME: OnceLock<String> = OnceLock::new();

/// Returns the local hostname.
///
/// Only a successful resolution is cached, so a transient failure is retried
/// on the next call.
pub fn local_hostname() -> Result<String, LookupError> {
    if let Some(host) = LOCAL_HOSTNAME.get() {
        return Ok(host.clone());
    }

    let host = hostname::get()
        .map_err(|e| LookupError::Hostname(e.to_string()))?
        .to_string_lossy()
        .into_owned();
    if host.is_empty() {
        return Err(LookupError::Hostname("empty hostname".to_string()));
    }

    Ok(LOCAL_HOSTNAME.get_or_init(|| host).clone())
}
