//! vss-cli: command line client for KUKSA.val servers.
//!
//! Talks to the server over WebSocket or gRPC, selected by `--protocol` or
//! the `protocol` key of the config file.
//!
//! ## Usage
//!
//! ```bash
//! # Walkthrough: set/get ABS, read Vehicle.Speed metadata, follow Vehicle.Speed
//! vss-cli
//!
//! # Single operations
//! vss-cli --protocol grpc get Vehicle.Speed
//! vss-cli set Vehicle.ADAS.ABS.IsEnabled true --attribute targetValue
//! vss-cli metadata Vehicle.Speed
//! vss-cli --token ~/certs/all-read-write.token subscribe Vehicle.Speed
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vss_client::{connect, Attribute, ClientConfig, Protocol, VssBackend};

/// Path used by the walkthrough's set/get steps
const ABS_PATH: &str = "Vehicle.ADAS.ABS.IsEnabled";

/// Path used by the walkthrough's metadata and subscribe steps
const SPEED_PATH: &str = "Vehicle.Speed";

/// Vehicle signal command line client
#[derive(Parser, Debug)]
#[command(name = "vss-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (default: ./kuksa-client.json if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Transport: ws or grpc (rpc is accepted as grpc); overrides the config file
    #[arg(long)]
    protocol: Option<Protocol>,

    /// Token, or path to a token file; used when the config has none
    #[arg(long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read a signal
    Get {
        path: String,
        /// value, targetValue or metadata
        #[arg(long, short, default_value = "value")]
        attribute: Attribute,
    },
    /// Write a signal
    Set {
        path: String,
        value: String,
        /// value or targetValue
        #[arg(long, short, default_value = "value")]
        attribute: Attribute,
    },
    /// Print a signal's metadata
    Metadata { path: String },
    /// Print updates until Ctrl+C
    Subscribe {
        path: String,
        #[arg(long, short, default_value = "value")]
        attribute: Attribute,
    },
    /// Run the walkthrough (default)
    Demo,
}

fn init_logging() -> Result<()> {
    let level = std::env::var("VSS_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("VSS_JSON_LOGS")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if json {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging()?;

    info!("Starting vss-cli v{}", vss_client::VERSION);

    let mut config =
        ClientConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(protocol) = args.protocol {
        config.protocol = protocol;
    }
    info!("Configuration:\n{}", config);

    let backend = connect(&config).await.context("Connection error")?;
    backend
        .authorize(args.token.as_deref())
        .await
        .context("Authorization error")?;

    let result = match args.command.unwrap_or(Command::Demo) {
        Command::Get { path, attribute } => get(backend.as_ref(), &path, attribute).await,
        Command::Set {
            path,
            value,
            attribute,
        } => backend
            .set_value(&path, &value, attribute)
            .await
            .with_context(|| format!("Failed to set {} of {}", attribute, path)),
        Command::Metadata { path } => get(backend.as_ref(), &path, Attribute::Metadata).await,
        Command::Subscribe { path, attribute } => {
            follow(backend.as_ref(), &path, attribute).await
        }
        Command::Demo => {
            demo(backend.as_ref()).await;
            Ok(())
        }
    };

    backend.close().await;
    result
}

async fn get(backend: &dyn VssBackend, path: &str, attribute: Attribute) -> Result<()> {
    let values = backend
        .get_value(path, attribute)
        .await
        .with_context(|| format!("Failed to get {} of {}", attribute, path))?;
    for value in values {
        println!("{}", value);
    }
    Ok(())
}

/// Print updates for `path` until the stream ends or Ctrl+C, then unsubscribe.
async fn follow(backend: &dyn VssBackend, path: &str, attribute: Attribute) -> Result<()> {
    let mut subscription = backend
        .subscribe(path, attribute)
        .await
        .with_context(|| format!("Failed to subscribe to {}", path))?;
    info!(subscription_id = %subscription.id, "{} subscribed", path);

    loop {
        tokio::select! {
            update = subscription.updates.recv() => match update {
                Some(update) => println!("{} {}: {}", update.path.as_deref().unwrap_or(path), attribute, update.value),
                None => {
                    warn!("Subscription to {} ended", path);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, unsubscribing");
                break;
            }
        }
    }

    backend
        .unsubscribe(&subscription.id)
        .await
        .context("Failed to unsubscribe")
}

/// Walkthrough of every operation; failures are logged and skipped.
async fn demo(backend: &dyn VssBackend) {
    for attribute in [Attribute::Value, Attribute::TargetValue] {
        match backend.set_value(ABS_PATH, "true", attribute).await {
            Ok(()) => info!("{} {} set: true", ABS_PATH, attribute),
            Err(e) => error!("Set value error: {}", e),
        }
        match backend.get_value(ABS_PATH, attribute).await {
            Ok(values) => {
                for value in values {
                    info!("{} {}: {}", ABS_PATH, attribute, value);
                }
            }
            Err(e) => error!("Get value error: {}", e),
        }
    }

    match backend.get_metadata(SPEED_PATH).await {
        Ok(metadata) => {
            for entry in metadata {
                info!("{} metadata: {}", SPEED_PATH, entry);
            }
        }
        Err(e) => error!("Error while getting metadata: {}", e),
    }

    if let Err(e) = follow(backend, SPEED_PATH, Attribute::Value).await {
        error!("Subscription error: {:#}", e);
    }
}
