//! CLI entry point for mks-rga
//!
//! # Usage
//!
//! Query the instrument:
//! ```bash
//! mks-rga --address 10.0.0.12:10014 info
//! mks-rga --address 10.0.0.12:10014 send DetectorInfo 0
//! ```
//!
//! Record bar chart scans as JSON lines until Ctrl+C:
//! ```bash
//! mks-rga --config mks-rga.toml record
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use figment::providers::Serialized;
use mks_rga::config::{Settings, DEFAULT_CONFIG_FILE};
use mks_rga::logging::{self, LoggingConfig, OutputFormat};
use mks_rga::recorder::{DataFrame, Recorder};
use mks_rga::{transport, Command, Response, Session};
use std::path::PathBuf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::info;

#[derive(Parser)]
#[command(name = "mks-rga")]
#[command(about = "Client for MKS residual gas analyzers", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, short, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Instrument address (host:port), overrides the configuration
    #[arg(long, short)]
    address: Option<String>,

    /// Sensor serial number to select after the handshake (query commands only)
    #[arg(long)]
    sensor: Option<String>,

    /// Log output format: pretty, compact or json
    #[arg(long, default_value = "compact")]
    log_format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the greeting, sensor state and sensor info
    Info,

    /// List the sensors reachable through the connection
    Sensors,

    /// Send one raw command and print the decoded reply
    Send {
        /// Command name, e.g. `DetectorInfo`
        name: String,
        /// Arguments, sent verbatim
        args: Vec<String>,
    },

    /// Run the bar chart recorder and print one JSON frame per scan
    Record,

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut figment = Settings::figment(&cli.config);
    if let Some(address) = &cli.address {
        figment = figment.merge(Serialized::default("connection.address", address));
    }
    let settings = Settings::from_figment(figment).context("Failed to load configuration")?;

    let logging_config = LoggingConfig::from_settings(&settings)
        .map_err(anyhow::Error::msg)?
        .with_format(cli.log_format);
    logging::init(logging_config).map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&settings)?);
            Ok(())
        }
        Commands::Record => record(&settings).await,
        Commands::Info => {
            let mut session = open(&settings, cli.sensor.as_deref()).await?;
            print_response(&session.execute(&Command::SensorState).await?);
            print_response(&session.info().await?);
            Ok(())
        }
        Commands::Sensors => {
            let mut session = open(&settings, cli.sensor.as_deref()).await?;
            print_response(&session.sensors().await?);
            Ok(())
        }
        Commands::Send { name, args } => {
            let mut session = open(&settings, cli.sensor.as_deref()).await?;
            let response = session
                .execute_raw(&name, &args)
                .await
                .with_context(|| format!("{name} failed"))?;
            print_response(&response);
            Ok(())
        }
    }
}

async fn connect(settings: &Settings) -> Result<Session<TcpStream>> {
    let stream = transport::connect(
        &settings.connection.address,
        settings.connection.connect_timeout(),
    )
    .await
    .with_context(|| format!("Failed to connect to {}", settings.connection.address))?;
    Ok(Session::new(stream).with_read_timeout(settings.connection.read_timeout()))
}

async fn open(settings: &Settings, sensor: Option<&str>) -> Result<Session<TcpStream>> {
    let mut session = connect(settings).await?;
    let greeting = session.handshake().await.context("Handshake failed")?;
    print_response(&greeting);

    if let Some(serial) = sensor {
        session
            .select(serial)
            .await
            .with_context(|| format!("Failed to select sensor {serial}"))?;
    }
    Ok(session)
}

async fn record(settings: &Settings) -> Result<()> {
    let session = connect(settings).await?;

    let (tx, mut frames) = mpsc::channel::<DataFrame>(16);
    let mut recorder = Recorder::new(
        settings.recording.clone(),
        settings.recording.app_name.clone(),
    );
    recorder
        .start(session, tx)
        .await
        .context("Failed to start recording")?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
            frame = frames.recv() => match frame {
                Some(frame) => println!("{}", frame.to_json()?),
                None => break,
            },
        }
    }

    // The loop may already have ended on its own
    if let Err(err) = recorder.stop().await {
        info!(error = %err, "recorder already stopped");
    }
    Ok(())
}

fn print_response(response: &Response) {
    print!("{response}");
}
