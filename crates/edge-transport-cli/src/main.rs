//! Command-line interface for edge transport libraries.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edge_transport::config::env_vars;
use edge_transport::{Connection, EdgeData, Resolver, TransportConfig};

/// Edge Transport - Load and exercise pluggable transport libraries.
#[derive(Parser, Debug)]
#[command(name = "edge-transport")]
#[command(author, version, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Load a transport library and report its capabilities.
    Inspect {
        /// Path to the transport library.
        #[arg(required = true)]
        library: PathBuf,
    },

    /// Run a connection session described by a configuration file.
    Run {
        /// TOML configuration file.
        #[arg(short, long)]
        config: PathBuf,

        /// Library path, overrides the configuration.
        #[arg(short, long)]
        library: Option<PathBuf>,

        /// Text to send once connected.
        #[arg(short, long)]
        send: Option<String>,

        /// Run device discovery before connecting.
        #[arg(long)]
        discover: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Inspect { library } => inspect(library),
        Command::Run {
            config,
            library,
            send,
            discover,
        } => run(config, library, send, discover),
    }
}

fn init_logging(verbose: bool) {
    let json_logging = std::env::var(env_vars::LOG_JSON)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_ansi(std::io::stderr().is_terminal())
            .with_writer(std::io::stderr)
            .init();
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn inspect(library: PathBuf) -> Result<()> {
    let resolver = Resolver::new();
    let loaded = resolver
        .load(&library)
        .with_context(|| format!("Failed to load {}", library.display()))?;

    let table = loaded.table();
    println!("Library:  {}", library.display());
    println!("set_info: {}", yes_no(table.supports_set_info()));
    println!("get_info: {}", yes_no(table.supports_get_info()));
    drop(loaded);

    let mut conn = Connection::create_with(&resolver, &library)
        .with_context(|| format!("Failed to create a connection from {}", library.display()))?;

    match conn.get_info("name") {
        Ok(name) => println!("name:     {}", name),
        Err(e) => tracing::debug!("No transport name available: {}", e),
    }

    let connected = conn.is_connected()?;
    println!("is_connected: {}", connected);

    conn.release().context("Failed to release the connection")?;
    Ok(())
}

fn run(
    config_path: PathBuf,
    library: Option<PathBuf>,
    send: Option<String>,
    discover: bool,
) -> Result<()> {
    let mut config = TransportConfig::from_file(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    config.apply_env();
    if let Some(library) = library {
        config.library = Some(library);
    }

    let mut conn = Connection::from_config(&config).context("Failed to create the connection")?;
    tracing::info!("Transport loaded from {}", config.library_path()?.display());

    conn.set_event_handler(|event| match event.payload_str() {
        Some(text) if !text.is_empty() => {
            tracing::info!("Event {:?}: {}", event.kind, text)
        }
        _ => tracing::info!("Event {:?} ({} bytes)", event.kind, event.payload.len()),
    })?;

    let session = run_session(&conn, send, discover);
    let released = conn.release();

    session?;
    released.context("Failed to release the connection")?;
    Ok(())
}

fn run_session(conn: &Connection, send: Option<String>, discover: bool) -> Result<()> {
    conn.start().context("start failed")?;

    if discover {
        conn.start_discovery().context("start_discovery failed")?;
        conn.stop_discovery().context("stop_discovery failed")?;
    }

    conn.connect().context("connect failed")?;
    tracing::info!("is_connected: {}", conn.is_connected()?);

    if let Some(text) = send {
        let data = EdgeData::from_bytes(text.into_bytes())?;
        conn.send_data(&data).context("send_data failed")?;
        tracing::info!("Sent {} bytes", data.total_len());
    }

    conn.disconnect().context("disconnect failed")?;
    conn.stop().context("stop failed")?;
    Ok(())
}
