//! tilewin
//!
//! Tiles the focused X11 window into fixed screen regions, and watches focus
//! and title changes of the active window.

mod config;
mod error;
mod shared;
mod wm;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wm::{FocusReport, FocusTracker, PlacementManager, TileMode, X11Session};

#[derive(Debug, Parser)]
#[command(name = "tilewin", version, about = "Tile and watch the active X11 window")]
struct Cli {
    /// Config file to use instead of ~/.config/tilewin/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Move and resize the active window
    Tile {
        /// Choose how to tile the active window
        #[arg(short, long, value_enum)]
        mode: TileMode,

        /// Center the window without resizing it
        #[arg(long)]
        noresize: bool,
    },
    /// Print the active window and its title every time either changes
    Watch {
        /// Print one JSON object per line
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so `watch` output can be piped
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tilewin=info,warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = config::Config::load(cli.config.as_deref())
        .context("Failed to load configuration")?;

    let mut session = X11Session::connect().context("Failed to connect to X server")?;

    let result = match cli.command {
        Command::Tile { mode, noresize } => {
            if noresize && mode != TileMode::Center {
                warn!("--noresize only applies to center, ignoring");
            }
            PlacementManager::new(config.tiling)
                .tile_active_window(&mut session, mode, noresize)
                .map(|_| ())
                .context("Failed to tile active window")
        }
        Command::Watch { json } => watch(session, json || config.watch.json),
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

/// Print focus transitions until the X connection dies
fn watch(session: X11Session, json: bool) -> Result<()> {
    session
        .watch_root()
        .context("Failed to select property changes on the root window")?;
    info!("Watching focus changes");

    let mut tracker = FocusTracker::new(session);
    let stdout = std::io::stdout();

    let result = tracker.run(|window, title| {
        let report = FocusReport { window, title };
        let line = if json {
            serde_json::to_string(&report).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
        } else {
            report.to_string()
        };

        let mut out = stdout.lock();
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            warn!("Failed to write focus change: {}", e);
        }
    });

    warn!("Focus watcher stopped, last known state: {:?}", tracker.state());
    result.context("Lost connection to the X server")
}
