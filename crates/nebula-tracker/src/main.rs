//! Spawn tracker binary for Nebula Relics.
//!
//! Loads calibration data, publishes the forecast once a second, and
//! redraws it on stdout until interrupted. Logs go to stderr.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `nebula-config.yaml` (or `NEBULA_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the spawn predictor from the calibration data
//! 4. Build the presentation driver (first forecast is computed here)
//! 5. Render the initial frame; stop here if `NEBULA_ONCE` is set
//! 6. Schedule the driver on the tokio timer
//! 7. Redraw on every published forecast until Ctrl-C

mod error;
mod output;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use nebula_core::clock::{Clock, SystemClock};
use nebula_core::config::{LoggingConfig, TrackerConfig};
use nebula_core::driver::PresentationDriver;
use nebula_core::predictor::SpawnPredictor;
use nebula_core::schedule::TokioScheduler;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::TrackerError;
use crate::output::FrameRenderer;

/// Environment variable naming the config file.
const CONFIG_PATH_ENV: &str = "NEBULA_CONFIG";

/// Default config file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "nebula-config.yaml";

/// Environment variable requesting a single frame.
const ONCE_ENV: &str = "NEBULA_ONCE";

/// Application entry point for the spawn tracker.
///
/// # Errors
///
/// Returns an error if configuration, predictor construction, scheduling,
/// or writing a frame fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so remember whether
    //    defaults were used and report it afterwards.
    let config_path = config_path();
    let (config, from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("nebula-tracker starting");
    if from_file {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        reference_epoch = %config.predictor.reference_epoch,
        phase_offset = config.predictor.phase_offset,
        rotation_len = config.predictor.rotation.len(),
        tick_interval_ms = config.driver.tick_interval_ms,
        timezone = %config.display.timezone,
        "Calibration"
    );

    // 3. Build the predictor.
    let predictor = SpawnPredictor::new(&config.predictor).map_err(TrackerError::from)?;

    // 4. Build the driver.
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let driver = Arc::new(PresentationDriver::new(predictor, clock));

    // 5. Render the initial frame.
    let stdout = std::io::stdout();
    let renderer = FrameRenderer::new(config.display.clone(), stdout.is_terminal());
    renderer.emit(&driver.snapshot(), &mut stdout.lock())?;

    if once_requested() {
        info!("Single frame requested, exiting");
        return Ok(());
    }

    // 6. Schedule the driver.
    let scheduler = TokioScheduler::current().map_err(TrackerError::from)?;
    let period = Duration::from_millis(config.driver.tick_interval_ms);
    let mut rx = driver.subscribe();
    let handle = driver.start(&scheduler, period);
    info!(period = ?period, "Presentation driver started");

    // 7. Redraw on change until interrupted.
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    error!("Forecast channel closed");
                    break;
                }
                let forecast = rx.borrow_and_update().clone();
                renderer.emit(&forecast, &mut stdout.lock())?;
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!(error = %e, "Failed to listen for Ctrl-C");
                }
                break;
            }
        }
    }

    drop(handle);
    info!("nebula-tracker stopped");
    Ok(())
}

/// Resolve the config file path from `NEBULA_CONFIG` or the default.
fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load the tracker configuration.
///
/// A missing file is not an error: defaults apply, with environment
/// overrides still honoured. Returns whether the file was read.
fn load_config(path: &Path) -> Result<(TrackerConfig, bool), TrackerError> {
    if path.exists() {
        Ok((TrackerConfig::from_file(path)?, true))
    } else {
        Ok((TrackerConfig::parse("")?, false))
    }
}

/// Install the global tracing subscriber on stderr.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Whether `NEBULA_ONCE` asks for a single frame.
fn once_requested() -> bool {
    std::env::var(ONCE_ENV).is_ok_and(|value| is_truthy(&value))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn truthy_values() {
        for value in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(is_truthy(value), "{value:?}");
        }
        for value in ["", "0", "false", "no", "off", "2"] {
            assert!(!is_truthy(value), "{value:?}");
        }
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let (config, from_file) =
            load_config(Path::new("does-not-exist/nebula-config.yaml")).unwrap();
        assert!(!from_file);
        assert_eq!(config.driver, TrackerConfig::default().driver);
        assert_eq!(config.display, TrackerConfig::default().display);
    }

    #[test]
    fn project_config_file_loads() {
        let path =
            Path::new(env!("CARGO_MANIFEST_DIR")).join("../../nebula-config.yaml");
        if path.exists() {
            let (config, from_file) = load_config(&path).unwrap();
            assert!(from_file);
            assert_eq!(config.predictor.rotation.len(), 4);
        }
    }
}
