//! Fractl — run a wallet connection session over mock adapters.
//!
//! Builds a coordinator over one mock adapter per namespace, connects
//! through a connector picker, watches the connected account, and
//! disconnects again. Every status and connection-table change is printed
//! as one JSON notification per line.
//!
//! Usage:
//!   fractl                                   # eip155 + cosmos, first connector
//!   fractl --namespace cosmos --namespace eip155
//!   fractl --connector keplr                 # pick a connector by id
//!   fractl --config demo.jsonc --timeout-ms 500
//!   fractl --fail eip155                     # scripted connect rejection

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use fractl_core::{ConnectorById, Coordinator, FirstConnector, Selection};
use fractl_mock::{DemoConfig, MockConfig};
use fractl_protocol::{AdapterError, Connection, FractlError, FractlNotification, Notifications};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fractl", about = "Fractl — cross-namespace wallet connection coordinator")]
struct Cli {
    /// JSON or JSONC config file (coordinator settings and mock namespaces)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Namespace to register, in order (repeatable). Replaces the config's list.
    #[arg(long = "namespace")]
    namespaces: Vec<String>,

    /// Connector id to pick (defaults to the first connector offered)
    #[arg(long)]
    connector: Option<String>,

    /// Deadline for adapter calls, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Simulated wallet latency for every namespace, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Namespace whose connect is rejected by the user
    #[arg(long)]
    fail: Option<String>,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    /// Write logs to a file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_tracing(cli: &Cli) {
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    if let Some(ref log_path) = cli.log_file {
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let file = match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
        {
            Ok(file) => file,
            Err(e) => {
                eprintln!("Failed to open log file {}: {e}", log_path.display());
                std::process::exit(1);
            }
        };

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Merge CLI overrides into the file (or sample) config.
fn resolve_config(cli: &Cli) -> DemoConfig {
    let mut config = match &cli.config {
        Some(path) => match DemoConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{e}");
                std::process::exit(1);
            }
        },
        None => DemoConfig::sample(),
    };

    if !cli.namespaces.is_empty() {
        let known = std::mem::take(&mut config.namespaces);
        let samples = DemoConfig::sample().namespaces;
        config.namespaces = cli
            .namespaces
            .iter()
            .map(|ns| {
                known
                    .iter()
                    .chain(samples.iter())
                    .find(|c| &c.namespace == ns)
                    .cloned()
                    .unwrap_or_else(|| MockConfig::new(ns.clone()))
            })
            .collect();
    }

    if let Some(timeout_ms) = cli.timeout_ms {
        config.coordinator = config
            .coordinator
            .with_call_timeout(Duration::from_millis(timeout_ms));
    }

    for ns in &mut config.namespaces {
        if let Some(delay_ms) = cli.delay_ms {
            ns.connect_delay_ms = delay_ms;
        }
        if cli.fail.as_deref() == Some(ns.namespace.as_str()) {
            ns.fail_connect = Some(AdapterError::UserRejected);
        }
    }

    config
}

fn emit(method: &str, params: serde_json::Value) {
    let notification = FractlNotification::new(method, Some(params));
    if let Ok(line) = serde_json::to_string(&notification) {
        println!("{line}");
    }
}

fn fail(context: &str, e: &FractlError) -> ! {
    error!("{context}: {e}");
    emit("error", json!({ "context": context, "error": e }));
    std::process::exit(1);
}

async fn connect(coordinator: &Coordinator, connector: Option<&str>) -> Result<Connection, FractlError> {
    match connector {
        Some(id) => coordinator.connect_with_picker(&ConnectorById(id.to_string())).await,
        None => coordinator.connect_with_picker(&FirstConnector).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = resolve_config(&cli);
    let (coordinator, _adapters) = match config.build() {
        Ok(built) => built,
        Err(e) => fail("configuration", &e),
    };

    let _status = coordinator.subscribe_status(|status| {
        emit(Notifications::STATUS_CHANGED, json!({ "status": status }));
    });
    let _connections = coordinator.subscribe_connections(|connections| {
        emit(Notifications::CONNECTIONS_CHANGED, json!({ "connections": connections }));
    });

    info!("Namespaces: {}", coordinator.namespaces().join(", "));
    emit("coordinator/connectors", json!({ "connectors": coordinator.connectors() }));

    let connection = match connect(&coordinator, cli.connector.as_deref()).await {
        Ok(connection) => connection,
        Err(e) => fail("connect", &e),
    };

    if let Some(address) = connection.primary_address() {
        match coordinator
            .watch_account(Some(connection.namespace()), address)
            .await
        {
            Ok(account) => {
                let _account = account.subscribe(|data| {
                    emit(Notifications::ACCOUNT_CHANGED, json!({ "account": data }));
                });
                emit(Notifications::ACCOUNT_CHANGED, json!({ "account": account.get() }));
            }
            Err(e) => error!("watchAccount failed: {e}"),
        }
    }

    if let Err(e) = coordinator.disconnect(Selection::any()).await {
        fail("disconnect", &e);
    }

    info!("Session finished ({})", coordinator.state());
}
