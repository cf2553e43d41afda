//! # Regcache CLI Entry Point
//!
//! ## Usage
//!
//! ```bash
//! # Follow an authority, logging a summary every 10 seconds
//! regcache watch http://127.0.0.1:8761/ --interval-secs 5 --print-every-secs 10
//!
//! # Same, and send a cancel notice for this instance on Ctrl-C
//! regcache watch http://127.0.0.1:8761/ --service-name ORDER-SERVICE --instance-id order-1
//!
//! # Print the authority's full registry (raw JSON)
//! regcache snapshot http://127.0.0.1:8761/ | jq 'keys'
//!
//! # The URL may come from the environment instead
//! REGCACHE_AUTHORITY_URL=http://127.0.0.1:8761/ regcache snapshot
//! ```

use anyhow::Result;
use argh::FromArgs;
use regcache_cli::snapshot::run_snapshot;
use regcache_cli::watch::{run_watch, WatchOptions};
use regcache_cli::{resolve_authority_url, AUTHORITY_URL_ENV};
use std::time::Duration;

#[derive(FromArgs)]
/// Regcache - client-side service registry cache
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Watch(WatchArgs),
    Snapshot(SnapshotArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "watch")]
/// keep a live cache of an authority and log its contents
struct WatchArgs {
    /// authority URL (falls back to REGCACHE_AUTHORITY_URL)
    ///
    /// Must include the http:// or https:// prefix.
    #[argh(positional)]
    authority_url: Option<String>,

    /// seconds between delta pulls
    #[argh(option, long = "interval-secs", default = "30")]
    interval_secs: u64,

    /// seconds between registry summaries
    #[argh(option, long = "print-every-secs", default = "10")]
    print_every_secs: u64,

    /// service name to cancel at the authority on exit
    #[argh(option, long = "service-name")]
    service_name: Option<String>,

    /// instance id to cancel at the authority on exit
    #[argh(option, long = "instance-id")]
    instance_id: Option<String>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "snapshot")]
/// print the authority's full registry as JSON
struct SnapshotArgs {
    /// authority URL (falls back to REGCACHE_AUTHORITY_URL)
    #[argh(positional)]
    authority_url: Option<String>,

    /// request timeout in milliseconds
    #[argh(option, long = "timeout-ms", default = "5000")]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // snapshot: keep stdout clean for piping
    if !matches!(cli.command, Commands::Snapshot(_)) {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let env_url = std::env::var(AUTHORITY_URL_ENV).ok();

    match cli.command {
        Commands::Watch(args) => {
            let authority_url = resolve_authority_url(args.authority_url, env_url)?;
            if args.interval_secs == 0 || args.print_every_secs == 0 {
                return Err(anyhow::anyhow!("Intervals must be at least one second"));
            }

            let identity = match (args.service_name, args.instance_id) {
                (Some(service), Some(instance)) => Some((service, instance)),
                (None, None) => None,
                _ => {
                    return Err(anyhow::anyhow!(
                        "--service-name and --instance-id must be given together"
                    ))
                }
            };

            run_watch(WatchOptions {
                authority_url,
                delta_interval: Duration::from_secs(args.interval_secs),
                print_every: Duration::from_secs(args.print_every_secs),
                identity,
            })
            .await
        }
        Commands::Snapshot(args) => {
            let authority_url = resolve_authority_url(args.authority_url, env_url)?;
            run_snapshot(authority_url, args.timeout_ms).await
        }
    }
}
