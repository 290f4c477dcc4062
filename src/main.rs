use clap::Parser;
use rotary_mixer::config::{resolve_config_path, ConfigManager};
use rotary_mixer::notifier::LogNotifier;
use rotary_mixer::port::{available_ports, SystemPortOpener};
use rotary_mixer::session::SerialSession;
use rotary_mixer::AppResult;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{debug, error, info, warn};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Drive per-application volume sliders from a serial rotary encoder.",
    long_about = "Reads encoder turns and button presses from a serial device, applies them to the sliders listed in a YAML config file, and keeps that file in sync. Edits to the file are picked up while running."
)]
struct Args {
    /// Path to the YAML config file. Falls back to $ROTARY_MIXER_CONFIG,
    /// then ./config.yaml, then the per-user config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,

    /// Print the serial ports present on this system and exit.
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_level = if args.verbose {
        "info,rotary_mixer=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .init();

    if let Err(e) = run(args).await {
        error!(error = %e, "Fatal error");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> AppResult<()> {
    if args.list_ports {
        for name in available_ports()? {
            println!("{name}");
        }
        return Ok(());
    }

    let path = resolve_config_path(args.config);
    let config = Arc::new(ConfigManager::new(path, Arc::new(LogNotifier)));
    config.load()?;

    let watcher = config.spawn_watcher()?;
    let saver = config.spawn_periodic_save(config.save_interval());

    let session = SerialSession::new(Arc::clone(&config), Arc::new(SystemPortOpener));
    let mut moves = session.subscribe_to_slider_moves();
    let consumer = tokio::spawn(async move {
        while let Some(event) = moves.recv().await {
            info!(slider = %event.slider_id, volume = event.percent_value, "Slider moved");
        }
    });

    // The watcher renews the connection once the file names a working port.
    if let Err(e) = session.start() {
        warn!(error = %e, "Failed to start serial session");
    }

    shutdown_signal().await;

    session.stop().await;
    watcher.stop().await;
    saver.stop().await;
    consumer.abort();

    if config.is_dirty() {
        debug!("Saving pending changes before exit");
        config.save()?;
    }
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Signal received, starting graceful shutdown...");
}
