//! Definer hub binary.
//!
//! Loads persisted state (or initializes from the local hostname), listens for
//! protocol connections, runs the interactive console on stdin and saves state
//! again on SIGINT/SIGTERM.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroUsize,
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use clap::Parser;
use definer_core::{DedupKey, Dispatcher, DispatcherConfig, Router, Snapshot, Store};
use definer_server::{
    DriverConfig, EmulatedLink, FileStore, ServerDriver, ServerError, TcpTransport, console,
    serve, shutdown_signal,
};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

/// Home-automation hub node
#[derive(Debug, Parser)]
#[command(name = "definer", version, about)]
struct Args {
    /// Persisted state file
    #[arg(long, default_value = "./definer.toml")]
    state: PathBuf,

    /// Listen address
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    bind: IpAddr,

    /// Listen port, overriding the persisted router port
    #[arg(long)]
    port: Option<u16>,

    /// Dial timeout for peers and devices, in milliseconds
    #[arg(long, default_value_t = 5000)]
    dial_timeout_ms: u64,

    /// Frame write timeout, in milliseconds
    #[arg(long, default_value_t = 5000)]
    write_timeout_ms: u64,

    /// Request read timeout for accepted connections, in milliseconds
    #[arg(long, default_value_t = 30_000)]
    read_timeout_ms: u64,

    /// Time in-flight connections get to finish at shutdown, in milliseconds
    #[arg(long, default_value_t = 5000)]
    shutdown_grace_ms: u64,

    /// Duplicate detection key: `id` or `origin-and-id`
    #[arg(long, default_value = "id")]
    dedup_key: DedupKey,

    /// Remember at most this many packets (unbounded when absent)
    #[arg(long)]
    dedup_capacity: Option<NonZeroUsize>,

    /// Do not read commands from stdin
    #[arg(long)]
    no_console: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            dial_timeout: Duration::from_millis(self.dial_timeout_ms),
            write_timeout: Duration::from_millis(self.write_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            shutdown_grace: Duration::from_millis(self.shutdown_grace_ms),
            dispatcher: DispatcherConfig {
                dedup_key: self.dedup_key,
                dedup_capacity: self.dedup_capacity,
            },
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(error = %err, "failed to start runtime");
            return ExitCode::FAILURE;
        },
    };

    let result = runtime.block_on(run(args));
    // A console blocked on stdin must not hold the process open.
    runtime.shutdown_timeout(Duration::from_millis(250));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "definer stopped");
            ExitCode::FAILURE
        },
    }
}

async fn run(args: Args) -> Result<(), ServerError> {
    let store = Arc::new(FileStore::new(&args.state));
    let mut snapshot = match store.load()? {
        Some(snapshot) => {
            tracing::info!(path = %args.state.display(), "state loaded");
            snapshot
        },
        None => {
            let hostname = local_hostname()?;
            tracing::info!(path = %args.state.display(), %hostname, "no saved state, starting fresh");
            Snapshot::new(Router::new(hostname))
        },
    };
    if let Some(port) = args.port {
        snapshot.router.port = port;
    }

    let addr = SocketAddr::new(args.bind, snapshot.router.port);
    let transport = TcpTransport::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr: addr.to_string(), source })?;
    tracing::info!(addr = %transport.local_addr()?, identity = snapshot.router.identity(), "listening");

    let config = args.driver_config();
    let dispatcher = Dispatcher::from_snapshot(snapshot, &config.dispatcher);
    let driver = ServerDriver::new(dispatcher, Arc::new(transport), Arc::new(EmulatedLink), config);

    driver.start_link().await;

    if !args.no_console {
        let console_driver = driver.clone();
        let console_store: Arc<dyn Store> = store.clone();
        tokio::spawn(async move {
            console::run(console_driver, console_store, BufReader::new(tokio::io::stdin())).await;
        });
    }

    serve(driver.clone(), shutdown_signal()).await;

    store.save(&driver.snapshot().await)?;
    tracing::info!(path = %args.state.display(), "state saved, exiting");
    Ok(())
}

fn local_hostname() -> Result<String, ServerError> {
    let hostname = hostname::get()
        .map_err(|err| ServerError::Hostname(err.to_string()))?
        .into_string()
        .map_err(|_| ServerError::Hostname("hostname is not valid UTF-8".to_string()))?;
    Ok(format!("{hostname}.local"))
}
