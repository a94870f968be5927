//! # wlsession - compositor session core
//!
//! Runs the session core headless against the recording transport. Useful
//! for smoke-testing configuration and frame pacing without a display.

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use tokio::signal;

use wlsession::render::HeadlessBackend;
use wlsession::transport::RecordingTransport;
use wlsession::config::SOCKET_NAME_FLAG;
use wlsession::{logging, runtime, Compositor, SessionConfig};

/// Events the headless recorder keeps before dropping the oldest
const RECORDED_EVENT_LIMIT: usize = 4096;

#[derive(Parser)]
#[command(name = "wlsession")]
#[command(about = "Compositor session core: clients, surfaces, focus, clipboard and output")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/wlsession/session.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Listening socket name, overriding the configuration file
    #[arg(long = "wayland-socket-name", value_name = "NAME")]
    wayland_socket_name: Option<String>,

    /// Disable the hardware integration path
    #[arg(long, default_value_t = false)]
    headless: bool,

    /// Stop after presenting this many frames
    #[arg(long, value_name = "N")]
    frames: Option<u64>,
}

/// Override config with CLI flags
fn apply_cli_overrides(config: SessionConfig, cli: &Cli) -> SessionConfig {
    let mut config = match cli.wayland_socket_name.as_deref() {
        Some(name) => {
            info!("🔌 Socket name overridden on the command line");
            config.with_socket_override(&[SOCKET_NAME_FLAG, name])
        }
        None => config,
    };
    if cli.headless {
        config.render.hardware_integration = false;
        info!("🚫 Hardware integration disabled via CLI flag");
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.debug);

    info!("🚀 Starting wlsession");
    info!("📄 Version: {}", wlsession::VERSION);
    if let Some(commit) = option_env!("WLSESSION_GIT_COMMIT") {
        info!("🔖 Build: {} ({})", commit, option_env!("WLSESSION_BUILD_DATE").unwrap_or("unknown date"));
    }

    // Load configuration
    let config = match SessionConfig::load(&cli.config) {
        Ok(config) => {
            info!("✅ Configuration loaded from: {}", cli.config);
            config
        }
        Err(e) => {
            error!("❌ Failed to load configuration: {:#}", e);
            info!("📝 Using default configuration");
            SessionConfig::default()
        }
    };

    if config.general.debug && !cli.debug {
        log::set_max_level(logging::level(true));
    }

    let config = apply_cli_overrides(config, &cli);
    config.validate().context("Invalid configuration")?;

    let backend = HeadlessBackend::new(config.render.api, config.render.hardware_integration);
    let transport = RecordingTransport::new().with_event_limit(RECORDED_EVENT_LIMIT);
    let compositor = Compositor::new(config, None, Box::new(transport), Box::new(backend));

    let (handle, rx) = runtime::channel();
    let mut session = tokio::spawn(runtime::run(compositor, rx, cli.frames));

    // Set up signal handling
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            info!("📨 Received SIGTERM, shutting down gracefully");
            if handle.shutdown().is_err() {
                warn!("⚠️ Session already stopped");
            }
        }
        _ = sigint.recv() => {
            info!("📨 Received SIGINT (Ctrl+C), shutting down gracefully");
            if handle.shutdown().is_err() {
                warn!("⚠️ Session already stopped");
            }
        }
        result = &mut session => {
            let compositor = result.context("Session task panicked")?;
            info!("👋 Session ended after {} frames", compositor.frame_sequence());
            return Ok(());
        }
    }

    let compositor = session.await.context("Session task panicked")?;
    info!("👋 Session ended after {} frames", compositor.frame_sequence());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overridden(args: &[&str]) -> SessionConfig {
        let cli = Cli::try_parse_from(args).unwrap();
        apply_cli_overrides(SessionConfig::default(), &cli)
    }

    #[test]
    fn test_socket_name_equals_form() {
        let config = overridden(&["wlsession", "--wayland-socket-name=wayland-7"]);
        assert_eq!(config.general.socket_name.as_deref(), Some("wayland-7"));
    }

    #[test]
    fn test_socket_name_separate_value() {
        let config = overridden(&["wlsession", "--wayland-socket-name", "wayland-7"]);
        assert_eq!(config.general.socket_name.as_deref(), Some("wayland-7"));
    }

    #[test]
    fn test_no_socket_flag_keeps_config() {
        let mut config = SessionConfig::default();
        config.general.socket_name = Some("from-file".to_string());
        let cli = Cli::try_parse_from(["wlsession", "--headless"]).unwrap();

        let config = apply_cli_overrides(config, &cli);
        assert_eq!(config.general.socket_name.as_deref(), Some("from-file"));
        assert!(!config.render.hardware_integration);
    }
}
