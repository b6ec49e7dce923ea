//! vault-kv - command-line front end for the caching KV v2 client
//!
//! Connection settings come from the environment (see [`Config::from_env`]);
//! results are printed to stdout as JSON and logs go to stderr.

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vault_kv::search::SearchOptions;
use vault_kv::{spawn_cleanup_task, Config, SearchEngine, SecretStoreClient};

#[derive(Debug, Parser)]
#[command(name = "vault-kv", version, about = "Caching client for KV v2 secret stores")]
struct Cli {
    /// Namespace to operate in, overriding VAULT_NAMESPACE
    #[arg(long, global = true)]
    namespace: Option<String>,

    /// KV v2 mount, overriding VAULT_MOUNT
    #[arg(long, global = true)]
    mount: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check that the server is reachable, initialized and unsealed
    Health,
    /// List key-value mounts
    Mounts,
    /// List the children of a folder
    List {
        #[arg(default_value = "")]
        path: String,
    },
    /// Read a secret
    Read { path: String },
    /// Write a secret from a JSON object
    Write { path: String, data: String },
    /// Delete a secret and all its versions
    Delete { path: String },
    /// Search names and secret contents for a substring
    Search {
        query: String,
        /// Folder to start from
        #[arg(long, default_value = "")]
        base: String,
        #[arg(long, default_value_t = vault_kv::search::DEFAULT_MAX_RESULTS)]
        max_results: usize,
        #[arg(long, default_value_t = vault_kv::search::DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "vault_kv=info", can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vault_kv=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(mount) = cli.mount {
        config.mount = mount;
    }
    if cli.namespace.is_some() {
        config.namespace = cli.namespace.filter(|ns| !ns.is_empty());
    }
    info!(
        "Configuration loaded: address={}, mount={}, namespace={:?}, list_ttl={}s, secret_ttl={}s",
        config.address,
        config.mount,
        config.namespace,
        config.list_cache_ttl,
        config.secret_cache_ttl
    );

    let client = Arc::new(
        SecretStoreClient::from_config(&config).context("Failed to create secret store client")?,
    );
    let cleanup_handle = spawn_cleanup_task(client.caches().clone(), config.cleanup_interval);

    let outcome = run(cli.command, &client, &config).await;

    cleanup_handle.abort();
    outcome
}

async fn run(command: Command, client: &Arc<SecretStoreClient>, config: &Config) -> anyhow::Result<()> {
    match command {
        Command::Health => {
            let status = client.test_connection().await;
            print_json(&status)?;
            if !status.ok {
                bail!("Server at {} is not usable", config.address);
            }
        }
        Command::Mounts => {
            let mounts = client.list_mounts().await.context("Failed to list mounts")?;
            print_json(&mounts)?;
        }
        Command::List { path } => {
            let entries = client
                .list_secrets(&path)
                .await
                .with_context(|| format!("Failed to list '{}'", path))?;
            print_json(&entries)?;
        }
        Command::Read { path } => {
            let secret = client
                .read_secret(&path)
                .await
                .with_context(|| format!("Failed to read '{}'", path))?;
            print_json(&secret)?;
        }
        Command::Write { path, data } => {
            client
                .write_secret_json(&path, &data)
                .await
                .with_context(|| format!("Failed to write '{}'", path))?;
            print_json(&json!({ "written": path }))?;
        }
        Command::Delete { path } => {
            client
                .delete_secret(&path)
                .await
                .with_context(|| format!("Failed to delete '{}'", path))?;
            print_json(&json!({ "deleted": path }))?;
        }
        Command::Search {
            query,
            base,
            max_results,
            max_depth,
        } => {
            let engine = SearchEngine::new(client.clone(), config.search_concurrency);
            let options = SearchOptions::new(base)
                .with_max_results(max_results)
                .with_max_depth(max_depth);
            let token = CancellationToken::new();

            let search = engine.search(&query, options, &token);
            tokio::pin!(search);
            let results = tokio::select! {
                results = &mut search => results,
                _ = shutdown_signal() => {
                    token.cancel();
                    search.await
                }
            };

            if results.cancelled {
                warn!("Search cancelled, printing partial results");
            }
            print_json(&results)?;
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{}", rendered);
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, cancelling...");
        }
        _ = terminate => {
            info!("Received SIGTERM, cancelling...");
        }
    }
}
