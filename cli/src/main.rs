// mobius-cli — command-line control of Mobius aquarium controllers
//
// Cross-platform (macOS, Linux, Windows) front end for mobius-core over the
// host's Bluetooth LE adapter.

mod ble;
mod config;
mod indicator;

use anyhow::{Context, Result};
use ble::BtleTransport;
use clap::{Parser, Subcommand};
use colored::*;
use indicator::ConsoleIndicator;
use mobius_core::{MobiusClient, MobiusError, Session, ThreadPacer};

type Client = MobiusClient<BtleTransport, ConsoleIndicator, ThreadPacer>;

#[derive(Parser)]
#[command(name = "mobius")]
#[command(about = "Mobius BLE controller tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Device address (defaults to the configured default_address)
    #[arg(short, long, global = true)]
    address: Option<String>,

    /// Log protocol activity at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List nearby Mobius devices
    Scan {
        /// Scan rounds before giving up
        #[arg(short, long)]
        rounds: Option<usize>,
    },
    /// Read or change the active scene
    Scene {
        #[command(subcommand)]
        action: SceneAction,
    },
    /// Switch to the feed scene
    Feed,
    /// Return to the programmed schedule
    Schedule,
    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum SceneAction {
    Get,
    Set { id: u16 },
}

#[derive(Subcommand)]
enum ConfigAction {
    Set { key: String, value: String },
    Get { key: String },
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;
    let verbose = cli.verbose || config.verbose;

    let default_filter = if verbose {
        "mobius=debug,mobius_core=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    match cli.command {
        Commands::Scan { rounds } => cmd_scan(&config, rounds, verbose),
        Commands::Scene { action } => cmd_scene(&config, cli.address, action, verbose),
        Commands::Feed => cmd_feed(&config, cli.address, verbose),
        Commands::Schedule => cmd_schedule(&config, cli.address, verbose),
        Commands::Config { action } => cmd_config(config, action),
    }
}

fn open_client(config: &config::Config, verbose: bool) -> Result<Client> {
    let transport = BtleTransport::new(config.adapter_index)?;
    MobiusClient::with_capabilities(
        transport,
        ConsoleIndicator::new(!verbose),
        ThreadPacer,
        config.engine.clone(),
    )
    .context("Invalid engine configuration")
}

fn resolve_address(address: Option<String>, config: &config::Config) -> Result<String> {
    address
        .or_else(|| config.default_address.clone())
        .context("No device address. Pass --address or run `mobius config set default_address <addr>`")
}

/// Connect, run `op`, and always disconnect afterwards
fn with_session<T>(
    config: &config::Config,
    address: Option<String>,
    verbose: bool,
    op: impl FnOnce(&mut Client, &mut Session) -> Result<T, MobiusError>,
) -> Result<T> {
    let address = resolve_address(address, config)?;
    let mut client = open_client(config, verbose)?;

    println!("Connecting to {}...", address.bright_cyan());
    let connected = client.connect(&address);
    client.indicator().finish();
    let mut session = connected.with_context(|| format!("Failed to connect to {}", address))?;
    println!("  {} Connected", "✓".green());

    let result = op(&mut client, &mut session);
    client.indicator().finish();

    if !client.disconnect(&mut session) {
        eprintln!("  {} {} may still be connected", "!".yellow(), address);
    }
    Ok(result?)
}

fn cmd_scan(config: &config::Config, rounds: Option<usize>, verbose: bool) -> Result<()> {
    let rounds = rounds.unwrap_or(config.engine.name_scan_rounds);
    let mut client = open_client(config, verbose)?;

    println!("{}", "Scanning for Mobius devices...".bold());
    let found = client.scan(rounds);
    client.indicator().finish();
    let found = found.context("Scan failed")?;

    if found.is_empty() {
        println!("{}", "No devices found.".dimmed());
        return Ok(());
    }

    println!("{} ({} found)", "Devices".bold(), found.len());
    println!();
    for address in found {
        let marker = if config.default_address.as_deref() == Some(address.as_str()) {
            " (default)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("  {} {}{}", "•".bright_green(), address.bright_cyan(), marker);
    }

    Ok(())
}

fn cmd_scene(
    config: &config::Config,
    address: Option<String>,
    action: SceneAction,
    verbose: bool,
) -> Result<()> {
    match action {
        SceneAction::Get => {
            let scene = with_session(config, address, verbose, |client, session| {
                client.get_current_scene(session)
            })
            .context("Failed to read the current scene")?;
            println!("Current scene: {}", scene.to_string().bright_yellow());
        }

        SceneAction::Set { id } => {
            with_session(config, address, verbose, |client, session| {
                client.set_scene(session, id)
            })
            .with_context(|| format!("Failed to set scene {}", id))?;
            println!("{} Scene set to {}", "✓".green(), id.to_string().bright_yellow());
        }
    }

    Ok(())
}

fn cmd_feed(config: &config::Config, address: Option<String>, verbose: bool) -> Result<()> {
    with_session(config, address, verbose, |client, session| {
        client.set_feed_scene(session)
    })
    .context("Failed to start the feed scene")?;
    println!("{} Feed scene started", "✓".green());
    Ok(())
}

fn cmd_schedule(config: &config::Config, address: Option<String>, verbose: bool) -> Result<()> {
    with_session(config, address, verbose, |client, session| {
        client.run_schedule(session)
    })
    .context("Failed to resume the schedule")?;
    println!("{} Schedule resumed", "✓".green());
    Ok(())
}

fn cmd_config(mut config: config::Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            println!("{} Set {} = {}", "✓".green(), key.bright_cyan(), value);
        }

        ConfigAction::Get { key } => {
            if let Some(value) = config.get(&key) {
                println!("{} = {}", key.bright_cyan(), value);
            } else if config.list().iter().any(|(k, _)| *k == key) {
                println!("{} = {}", key.bright_cyan(), "(unset)".dimmed());
            } else {
                anyhow::bail!("Unknown config key: {}", key);
            }
        }

        ConfigAction::List => {
            println!("{}", "Configuration".bold());
            println!();

            for (key, value) in config.list() {
                println!("  {:<20} {}", key.bright_cyan(), value);
            }

            println!();
            println!(
                "Config file: {}",
                config::Config::config_file()?.display().to_string().dimmed()
            );
        }
    }

    Ok(())
}
