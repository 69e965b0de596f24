//! Command-line interface
//!
//! One-shot commands operate on the current topology and exit. `run` is the
//! resident mode: it restores remembered curves, then watches for monitors being
//! connected and re-applies their curves until the process is terminated.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use gammakeeper::{
    config::SettingsStore,
    controller::GammaController,
    error::get_user_friendly_error,
    gamma::{DEFAULT_GAMMA, GdiDeviceContextApi, GammaEngine, MAX_GAMMA, MIN_GAMMA},
    identity::SystemMonitorSource,
    monitor::{ChangeReconciler, DEFAULT_DEBOUNCE_WINDOW, DisplayWatcher},
    utils::{AutoStartManager, SingleInstanceGuard},
};
use std::sync::{Arc, mpsc};
use tracing::{info, warn};

type SystemController = GammaController<SystemMonitorSource, GdiDeviceContextApi>;

#[derive(Parser)]
#[command(name = "gammakeeper")]
#[command(author, version, about = "Per-monitor gamma control that survives reconnects")]
#[command(long_about = "
Adjusts the hardware gamma ramp of each monitor and remembers the value by the
monitor's serial number, so it is re-applied when the monitor is reconnected.

Examples:
  gammakeeper list                      # Monitors, serials and current gamma
  gammakeeper get                       # Gamma of the monitor last adjusted
  gammakeeper set ABC1234 1.2           # Select by serial...
  gammakeeper set \\\\.\\DISPLAY2 0.9       # ...device name...
  gammakeeper set \"DELL U2720Q\" 1.1     # ...or friendly name
  gammakeeper reset                     # All monitors back to linear
  gammakeeper run                       # Stay resident and re-apply on connect
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List attached monitors
    #[command(visible_alias = "ls")]
    List,
    /// Show a monitor's current gamma
    Get {
        /// Serial number, device name or friendly name; the monitor last adjusted
        /// when omitted
        monitor: Option<String>,
    },
    /// Set and remember a monitor's gamma
    Set {
        /// Serial number, device name or friendly name
        monitor: String,
        /// Gamma value, clamped to 0.4..=2.8
        #[arg(allow_negative_numbers = true)]
        gamma: f64,
    },
    /// Reset one monitor, or all of them, to the linear curve
    Reset {
        /// Serial number, device name or friendly name; all monitors when omitted
        monitor: Option<String>,
    },
    /// Apply remembered curves to every attached monitor
    Restore,
    /// Stay resident and re-apply remembered curves when monitors connect
    Run {
        /// Started at login; suppress console output
        #[arg(long)]
        minimized: bool,
    },
    /// Start the resident mode at login
    Autostart {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Re-apply remembered curves when a monitor is connected
    #[command(name = "apply-on-connect")]
    ApplyOnConnect {
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn enabled(self) -> bool {
        self == Self::On
    }
}

fn controller() -> SystemController {
    GammaController::new(
        Arc::new(GammaEngine::system()),
        Arc::new(SettingsStore::open()),
    )
}

/// Execute a parsed command
pub fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::List => {
            list(&controller());
            Ok(())
        }
        Commands::Get { monitor } => {
            let controller = controller();
            let selector = match monitor {
                Some(selector) => selector,
                None => controller
                    .settings()
                    .last_selected_serial()
                    .context("No monitor given and none adjusted yet; pass a serial or device name")?,
            };
            let monitor = controller.engine().find_monitor(&selector)?;
            println!("{:.2}", controller.engine().get_gamma(&monitor));
            Ok(())
        }
        Commands::Set { monitor, gamma } => set(&controller(), &monitor, gamma),
        Commands::Reset { monitor: Some(monitor) } => set(&controller(), &monitor, DEFAULT_GAMMA),
        Commands::Reset { monitor: None } => {
            let controller = controller();
            let total = controller.engine().get_monitors().len();
            let reset = controller.reset_all();
            println!("Reset {reset}/{total} monitors");
            if reset < total {
                bail!("{} monitors could not be reset", total - reset);
            }
            Ok(())
        }
        Commands::Restore => {
            let applied = controller().restore_all();
            println!("Restored {applied} remembered curves");
            Ok(())
        }
        Commands::Run { minimized } => run_resident(minimized),
        Commands::Autostart { state } => {
            let manager = AutoStartManager::default();
            if state.enabled() {
                manager.enable().context("Failed to enable auto-start")?;
            } else {
                manager.disable().context("Failed to disable auto-start")?;
            }
            SettingsStore::open().set_run_at_startup(state.enabled());
            println!("Auto-start {}", if state.enabled() { "enabled" } else { "disabled" });
            Ok(())
        }
        Commands::ApplyOnConnect { state } => {
            SettingsStore::open().set_apply_on_connect(state.enabled());
            println!(
                "Apply-on-connect {}",
                if state.enabled() { "enabled" } else { "disabled" }
            );
            Ok(())
        }
    }
}

fn list(controller: &SystemController) {
    let monitors = controller.engine().get_monitors();
    if monitors.is_empty() {
        println!("No attached monitors found");
        return;
    }

    let settings = controller.settings();
    let last_selected = settings.last_selected_serial();
    for monitor in &monitors {
        let serial = if monitor.has_serial() { monitor.serial_number.as_str() } else { "-" };
        let remembered = if settings.is_monitor_known(&monitor.serial_number) {
            format!("{:.2}", settings.get_monitor_gamma(&monitor.serial_number))
        } else {
            "-".to_string()
        };
        let marker = if last_selected.as_deref() == Some(monitor.serial_number.as_str()) {
            '*'
        } else {
            ' '
        };
        println!(
            "{marker} {:<16} {:<24} serial {:<16} gamma {:.2} remembered {}{}",
            monitor.device_name,
            monitor.display_name(),
            serial,
            controller.engine().get_gamma(monitor),
            remembered,
            if monitor.is_primary { "  (primary)" } else { "" },
        );
    }
}

fn set(controller: &SystemController, selector: &str, gamma: f64) -> Result<()> {
    if !gamma.is_finite() {
        bail!("Gamma must be a number between {MIN_GAMMA} and {MAX_GAMMA}");
    }
    let monitor = controller.engine().find_monitor(selector)?;
    if !controller.set_and_remember(&monitor, gamma) {
        bail!("Could not apply gamma {gamma:.2} to {monitor}; see the log for details");
    }
    println!("{monitor}: gamma {:.2}", controller.engine().get_gamma(&monitor));
    if !monitor.has_serial() {
        warn!("{monitor} has no serial number; the value applies to this session only");
    }
    Ok(())
}

/// Keep the run-at-startup preference in line with the registry
fn sync_autostart_preference(settings: &SettingsStore) {
    match AutoStartManager::default().is_enabled() {
        Ok(enabled) if enabled != settings.run_at_startup() => {
            info!("Auto-start registry state is {enabled}, updating preference");
            settings.set_run_at_startup(enabled);
        }
        Ok(_) => {}
        Err(e) => warn!("Failed to read auto-start state: {e}"),
    }
}

fn run_resident(minimized: bool) -> Result<()> {
    let _instance = SingleInstanceGuard::new().map_err(|e| {
        eprintln!("{}", get_user_friendly_error(&e));
        e
    })?;

    let engine = Arc::new(GammaEngine::system());
    let settings = Arc::new(SettingsStore::open());
    sync_autostart_preference(&settings);

    let controller = GammaController::new(Arc::clone(&engine), Arc::clone(&settings));
    let restored = controller.restore_all();

    let (signal_tx, signal_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();
    let _reconciler = ChangeReconciler::new(Arc::clone(&engine), event_tx, DEFAULT_DEBOUNCE_WINDOW)
        .spawn(signal_rx);

    // The watcher owns a clone; this one keeps the reconciler alive if it fails
    let _signal_tx = signal_tx.clone();
    match DisplayWatcher::new(signal_tx).start() {
        Ok(_) => info!("Watching for display changes"),
        Err(e) => {
            warn!("{e}");
            if !minimized {
                eprintln!("{}", get_user_friendly_error(&e));
            }
        }
    }

    if !minimized {
        println!(
            "GammaKeeper running: restored {restored} curves, apply-on-connect {}",
            if settings.apply_on_connect() { "on" } else { "off" }
        );
    }

    controller.run(&event_rx);
    Ok(())
}
