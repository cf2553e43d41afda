// Copyright 2025 Regcache Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `regcache watch`: a long-running cache with periodic summaries.

use anyhow::Result;
use regcache_client::{CacheConfig, CachedServiceRegistry, ClientConfig, RegistryClient};
use regcache_common::{HttpRegistryTransport, HttpTransportConfig, RegistryTransport};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Settings for one `watch` run.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub authority_url: String,
    pub delta_interval: Duration,
    pub print_every: Duration,
    /// `(service_name, instance_id)` to cancel at the authority on exit.
    pub identity: Option<(String, String)>,
}

/// Runs the cache until Ctrl-C, then shuts it down.
pub async fn run_watch(options: WatchOptions) -> Result<()> {
    let transport: Arc<dyn RegistryTransport> =
        Arc::new(HttpRegistryTransport::new(HttpTransportConfig::new(&options.authority_url))?);
    let cache_config = CacheConfig::default().with_delta_interval(options.delta_interval);

    info!(
        "Watching registry at {} (delta interval {:?})",
        options.authority_url, options.delta_interval
    );

    match options.identity {
        Some((service_name, instance_id)) => {
            let config = ClientConfig::new(service_name, instance_id).with_cache_config(cache_config);
            let client = RegistryClient::new(config, transport);
            client.start();
            report_until_interrupted(client.registry(), options.print_every).await?;
            client.shutdown().await;
        }
        None => {
            let registry = CachedServiceRegistry::new(transport, cache_config);
            registry.initialize();
            report_until_interrupted(&registry, options.print_every).await?;
            registry.shutdown();
            registry.wait_stopped().await;
        }
    }

    info!("Watch stopped");
    Ok(())
}

async fn report_until_interrupted(registry: &CachedServiceRegistry, print_every: Duration) -> Result<()> {
    let mut ticker = tokio::time::interval(print_every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    // Polled first so the SIGINT handler is installed before any output.
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            biased;
            signal = &mut interrupted => {
                signal?;
                info!("Interrupted; shutting down");
                return Ok(());
            }
            _ = ticker.tick() => {
                info!("{}", summarize(registry).await);
                info!("Stats: {}", serde_json::to_string(&registry.stats().await)?);
            }
        }
    }
}

/// One line per service, `NAME: count`, sorted by name.
pub async fn summarize(registry: &CachedServiceRegistry) -> String {
    let view = registry.get_registry().await;
    if view.is_empty() {
        return format!("Registry empty (stamp {})", registry.stamp());
    }

    let services: Vec<String> = view
        .service_names()
        .into_iter()
        .map(|name| {
            let count = view.service(&name).map(|instances| instances.len()).unwrap_or(0);
            format!("{}: {}", name, count)
        })
        .collect();

    format!(
        "Registry stamp {}, {} instances [{}]",
        registry.stamp(),
        view.total_instance_count(),
        services.join(", ")
    )
}
