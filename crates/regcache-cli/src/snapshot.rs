//! `regcache snapshot`: one full pull, printed as compact JSON.

use anyhow::Result;
use regcache_common::{HttpRegistryTransport, HttpTransportConfig, RegistryTransport};
use std::time::Duration;

/// Fetches the authority's complete registry and writes it to stdout.
///
/// Nothing else is written to stdout, so the output can be piped to `jq`.
pub async fn run_snapshot(authority_url: String, timeout_ms: u64) -> Result<()> {
    let transport = HttpRegistryTransport::new(
        HttpTransportConfig::new(authority_url).with_request_timeout(Duration::from_millis(timeout_ms)),
    )?;

    let snapshot = transport.fetch_full_registry().await?;
    println!("{}", serde_json::to_string(&snapshot)?);

    Ok(())
}
