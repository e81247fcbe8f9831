mod output;

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use kapi_http::{keys_api, HttpConfig};
use kapi_types::{DeleteOptions, SetOptions, WatcherOptions};

#[derive(Parser, Debug)]
#[command(name = "kapi", about = "Keys API client")]
struct Cli {
    #[arg(long)]
    config: Option<std::path::PathBuf>,
    /// Server base URL, repeatable; replaces configured endpoints
    #[arg(long = "endpoint")]
    endpoints: Vec<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the value of a key
    Get { key: String },
    /// Print a key and its whole subtree
    Rget { key: String },
    Set {
        key: String,
        value: String,
        /// Expire the key after this many seconds
        #[arg(long, default_value_t = 0)]
        ttl: u64,
        #[arg(long, default_value = "")]
        prev_value: String,
        #[arg(long, default_value_t = 0)]
        prev_index: u64,
    },
    /// Set a key that must not exist yet
    Mk { key: String, value: String },
    /// Set a key that must already exist
    Update { key: String, value: String },
    Rm {
        key: String,
        #[arg(long)]
        recursive: bool,
        #[arg(long, default_value = "")]
        prev_value: String,
        #[arg(long, default_value_t = 0)]
        prev_index: u64,
    },
    /// Print change events as they happen
    Watch {
        key: String,
        #[arg(long)]
        recursive: bool,
        /// Start after this index instead of now
        #[arg(long, default_value_t = 0)]
        after_index: u64,
        /// Stop after this many events; 0 means never
        #[arg(long, default_value_t = 0)]
        count: u64,
    },
}

#[derive(Debug, Deserialize)]
struct ObservabilityConfig {
    log_level: String,
    log_format: String,
}

#[derive(Debug, Deserialize)]
struct Config {
    client: HttpConfig,
    observability: ObservabilityConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut figment = Figment::new().merge(Toml::string(include_str!("../../../config/default.toml")));

    if let Some(ref config_path) = cli.config {
        figment = figment.merge(Toml::file_exact(config_path));
    }

    let mut config: Config = figment
        .merge(Env::prefixed("KAPI_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    if !cli.endpoints.is_empty() {
        config.client.endpoints = cli.endpoints.clone();
    }

    match config.observability.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(&config.observability.log_level)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(&config.observability.log_level)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    tracing::debug!(endpoints = ?config.client.endpoints, prefix = %config.client.prefix, "client configured");

    let keys = keys_api(&config.client).context("failed to build client")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Command::Get { key } => {
            let resp = keys.get(&key, &cancel).await.with_context(|| format!("get {key}"))?;
            if let Some(node) = resp.node {
                println!("{}", node.value);
            }
        }
        Command::Rget { key } => {
            let resp = keys.rget(&key, &cancel).await.with_context(|| format!("rget {key}"))?;
            if let Some(node) = resp.node {
                print!("{}", output::tree(&node));
            }
        }
        Command::Set { key, value, ttl, prev_value, prev_index } => {
            let opts = SetOptions {
                prev_value,
                prev_index,
                ttl: Duration::from_secs(ttl),
                ..Default::default()
            };
            let resp = keys
                .set(&key, &value, &opts, &cancel)
                .await
                .with_context(|| format!("set {key}"))?;
            println!("{}", output::event_line(&resp));
        }
        Command::Mk { key, value } => {
            let resp = keys.create(&key, &value, &cancel).await.with_context(|| format!("mk {key}"))?;
            println!("{}", output::event_line(&resp));
        }
        Command::Update { key, value } => {
            let resp = keys
                .update(&key, &value, &cancel)
                .await
                .with_context(|| format!("update {key}"))?;
            println!("{}", output::event_line(&resp));
        }
        Command::Rm { key, recursive, prev_value, prev_index } => {
            let opts = DeleteOptions { prev_value, prev_index, recursive };
            let resp = keys
                .delete(&key, &opts, &cancel)
                .await
                .with_context(|| format!("rm {key}"))?;
            println!("{}", output::event_line(&resp));
        }
        Command::Watch { key, recursive, after_index, count } => {
            let opts = WatcherOptions { wait_index: after_index, recursive };
            let mut watcher = keys.watcher(&key, &opts);
            let mut seen = 0u64;
            while count == 0 || seen < count {
                let resp = watcher
                    .next(&cancel)
                    .await
                    .with_context(|| format!("watch {key} at index {}", watcher.wait_index()))?;
                println!("{}", output::event_line(&resp));
                seen += 1;
            }
        }
    }

    Ok(())
}
