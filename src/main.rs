use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use media_device_select::config::{Config, ConfigLoader};
use media_device_select::control::DeviceSelect;
use media_device_select::logging::{self, LoggingConfig};
use media_device_select::media::{DeviceCatalog, MediaKind, label_for};
use media_device_select::preferences::PreferenceStore;
use media_device_select::service::{SignalHandler, SignalType};
use media_device_select::system::{FileStore, InventoryProvider, StandardFileSystem};

type Loader = ConfigLoader<StandardFileSystem>;
type Provider = InventoryProvider<StandardFileSystem>;
type Store = FileStore<StandardFileSystem>;

#[derive(Parser)]
#[command(name = "media-device-select")]
#[command(about = "Pick audio/video devices and remember the choice across sessions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List devices of one kind with their display labels
    ListDevices {
        /// audioinput, audiooutput or videoinput
        #[arg(short, long)]
        kind: String,
        /// Show device ids
        #[arg(short, long)]
        verbose: bool,
    },
    /// Report whether device labels are visible for a kind
    CheckPermission {
        #[arg(short, long)]
        kind: String,
    },
    /// Show the stored preference for a kind
    ShowPreference {
        #[arg(short, long)]
        kind: String,
    },
    /// Select a device by label and remember it
    Select {
        #[arg(short, long)]
        kind: String,
        /// Display label of the device to select
        #[arg(short, long)]
        label: String,
    },
    /// Keep a control synchronized with the device inventory until interrupted
    Watch {
        #[arg(short, long)]
        kind: String,
    },
    /// Validate configuration file
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loader = ConfigLoader::for_path(cli.config.as_deref())?;
    let config = loader.load_config()?;

    let (_log_guard, _) =
        logging::initialize_logging(LoggingConfig::from_general(&config.general, cli.verbose))?;

    info!("Configuration loaded from {}", loader.get_config_path().display());

    match cli.command {
        Commands::ListDevices { kind, verbose } => list_devices(&config, &kind, verbose).await,
        Commands::CheckPermission { kind } => check_permission(&config, &kind).await,
        Commands::ShowPreference { kind } => show_preference(&config, &kind),
        Commands::Select { kind, label } => select_device(&config, &kind, &label).await,
        Commands::Watch { kind } => watch(&loader, config, &kind).await,
        Commands::CheckConfig => check_config(&config),
    }
}

fn parse_kind(kind: &str) -> Result<MediaKind> {
    kind.parse::<MediaKind>()
}

fn provider(config: &Config) -> Result<Arc<Provider>> {
    Ok(Arc::new(InventoryProvider::new_production(
        config.inventory_path()?,
    )))
}

fn preferences(config: &Config) -> Result<PreferenceStore<Store>> {
    Ok(PreferenceStore::with_prefix(
        FileStore::new_production(config.preferences_path()?),
        config.storage.key_prefix.clone(),
    ))
}

fn control(
    config: &Config,
    kind: MediaKind,
) -> Result<(Arc<Provider>, DeviceSelect<Provider, Store>)> {
    let provider = provider(config)?;
    let control = DeviceSelect::new(kind, Arc::clone(&provider), preferences(config)?)?;
    Ok((provider, control))
}

fn print_entries(control: &DeviceSelect<Provider, Store>) {
    for entry in control.entries() {
        println!(
            "  {} {}",
            if entry.selected { "*" } else { " " },
            entry.display_text
        );
    }
}

async fn list_devices(config: &Config, kind: &str, verbose: bool) -> Result<()> {
    let kind = parse_kind(kind)?;
    let catalog = DeviceCatalog::new(provider(config)?);
    let devices = catalog.list_devices(kind).await?;

    println!("Available {} devices:", kind);
    if devices.is_empty() {
        println!("  No {} devices found!", kind);
        return Ok(());
    }

    for (i, device) in devices.iter().enumerate() {
        if device.is_placeholder() {
            continue;
        }
        if verbose {
            println!("  {}. {} [{}]", i + 1, label_for(device, i), device.device_id);
        } else {
            println!("  {}. {}", i + 1, label_for(device, i));
        }
    }

    Ok(())
}

async fn check_permission(config: &Config, kind: &str) -> Result<()> {
    let kind = parse_kind(kind)?;
    let catalog = DeviceCatalog::new(provider(config)?);

    if catalog.permission_granted(kind).await? {
        println!("✓ {} device labels are visible", kind);
    } else {
        println!("✗ {} device labels are withheld (permission not granted)", kind);
    }
    Ok(())
}

fn show_preference(config: &Config, kind: &str) -> Result<()> {
    let kind = parse_kind(kind)?;
    let prefs = preferences(config)?;

    match prefs.load(kind)? {
        Some(label) => println!("Preferred {} device: {}", kind, label),
        None => println!("No preferred {} device stored", kind),
    }
    Ok(())
}

async fn select_device(config: &Config, kind: &str, label: &str) -> Result<()> {
    let kind = parse_kind(kind)?;
    let (_provider, control) = control(config, kind)?;

    control.attach().await?;

    if control.selected_label().as_deref() != Some(label) && !control.select_by_label(label) {
        control.teardown()?;
        anyhow::bail!("No {} device labelled '{}'", kind, label);
    }
    control.persist()?;
    control.teardown()?;

    println!("✓ Selected {} device: {}", kind, label);
    Ok(())
}

fn poll_interval(config: &Config) -> tokio::time::Interval {
    tokio::time::interval(Duration::from_millis(
        config.inventory.poll_interval_ms.max(100),
    ))
}

/// SIGHUP: pick up configuration edits that apply without a restart
fn reload(loader: &Loader, config: &mut Config, poll: &mut tokio::time::Interval) {
    let reloaded = match loader.reload_config(config) {
        Ok(Some(reloaded)) => reloaded,
        Ok(None) => return,
        Err(e) => {
            warn!("Keeping current configuration: {:#}", e);
            return;
        }
    };

    if reloaded.inventory.poll_interval_ms != config.inventory.poll_interval_ms {
        info!(
            "Inventory poll interval now {}ms",
            reloaded.inventory.poll_interval_ms
        );
        *poll = poll_interval(&reloaded);
    }
    if reloaded.storage != config.storage || reloaded.inventory.path != config.inventory.path {
        warn!("Storage and inventory paths apply after restarting watch");
    }
    *config = reloaded;
}

async fn watch(loader: &Loader, mut config: Config, kind: &str) -> Result<()> {
    let kind = parse_kind(kind)?;
    let (provider, control) = control(&config, kind)?;

    control
        .attach()
        .await
        .with_context(|| format!("Failed to attach {} control", kind))?;
    control.ready().await;

    println!("Watching {} devices (Ctrl+C to stop):", kind);
    print_entries(&control);

    let (signal_tx, mut signal_rx) = mpsc::unbounded_channel::<SignalType>();
    let signal_handler = SignalHandler::new(signal_tx);
    tokio::spawn(async move {
        if let Err(e) = signal_handler.listen_for_signals().await {
            error!("Signal handler error: {}", e);
        }
    });

    let event_loop = {
        let control = control.clone();
        tokio::spawn(async move { control.run().await })
    };

    let mut poll = poll_interval(&config);
    let mut last_revision = control.selection_revision();

    loop {
        tokio::select! {
            _ = poll.tick() => {
                provider.poll_for_changes();
            }
            signal = signal_rx.recv() => match signal {
                Some(SignalType::Rescan) => {
                    reload(loader, &mut config, &mut poll);
                    provider.trigger_device_change();
                }
                Some(SignalType::Shutdown) | None => break,
            },
        }

        let revision = control.selection_revision();
        if revision != last_revision {
            last_revision = revision;
            println!("Selection changed:");
            print_entries(&control);
        }
    }

    control.teardown()?;
    event_loop.await.context("Event loop task failed")??;

    println!("Watch stopped");
    Ok(())
}

fn check_config(config: &Config) -> Result<()> {
    println!("Configuration validation:");
    println!("  ✓ Configuration file parsed successfully");
    println!("  ✓ Log level: {}", config.general.log_level);
    if config.general.log_to_file {
        println!(
            "  ✓ Log files kept for {} days",
            config.general.log_retention_days
        );
    }
    println!("  ✓ Preferences: {}", config.preferences_path()?.display());
    println!("  ✓ Inventory: {}", config.inventory_path()?.display());
    if !config.storage.key_prefix.is_empty() {
        println!("  ✓ Preference key prefix: {}", config.storage.key_prefix);
    }
    Ok(())
}
