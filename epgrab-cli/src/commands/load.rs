//! Load command: run the full configuration lifecycle.
//!
//! Creates the config file if missing, parses and migrates it, applies any
//! command-line overrides for this run only, validates, fills defaults, and
//! prints the effective configuration. This is the entry point a scheduled
//! grab runs before downloading anything.

use std::path::PathBuf;

use clap::Args;
use epgrab::config::{
    extract_location_from_lineupid, ConfigManager, Overrides, ZipOverride, ZipSource,
};
use epgrab::logging::{self, default_log_file};
use epgrab::retention::RetentionConfig;

use crate::error::CliError;

/// Arguments for the load command.
#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Override the zipcode/postal code for this run (not persisted)
    #[arg(long)]
    pub zip: Option<String>,

    /// Override the number of guide days for this run
    #[arg(long)]
    pub days: Option<u32>,

    /// Override the lineup id for this run
    #[arg(long)]
    pub lineupid: Option<String>,

    /// Override the cache refresh window in hours for this run
    #[arg(long)]
    pub refresh: Option<u32>,

    /// Force language detection on or off for this run
    #[arg(long)]
    pub langdetect: Option<bool>,

    /// Mirror log output to the console
    #[arg(long)]
    pub console: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Run the load command.
pub fn run(args: LoadArgs, config_file: PathBuf) -> Result<(), CliError> {
    let log_dir = logging::default_log_dir();
    let _guard = logging::init_logging(&log_dir, default_log_file(), true, args.console, args.debug)
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    tracing::info!("epgrab {} starting", epgrab::VERSION);
    tracing::info!("Configuration file: {}", config_file.display());

    let overrides = build_overrides(&args);

    let mut manager = ConfigManager::new(config_file);
    manager.load(&overrides)?;
    manager.log_config_summary();

    // Apply the retention policy to our own rotated logs.
    let retention = manager.retention_config();
    prune_logs(&log_dir, &retention);

    print_summary(&manager);
    Ok(())
}

/// Translate command-line arguments into per-run overrides.
///
/// An explicit --zip wins. Without one, an OTA --lineupid carries its own
/// postal/ZIP code (CAN-OTAJ3B1M4 contains J3B1M4), so that becomes the
/// zipcode override with extraction provenance. Any remaining disagreement
/// between the two is caught by the consistency check during load.
fn build_overrides(args: &LoadArgs) -> Overrides {
    let zipcode = match (&args.zip, &args.lineupid) {
        (Some(code), _) => Some(ZipOverride {
            code: code.replace(' ', "").to_uppercase(),
            source: ZipSource::CommandLine,
        }),
        (None, Some(lineupid)) => {
            extract_location_from_lineupid(lineupid).map(|code| ZipOverride {
                code: code.replace(' ', ""),
                source: ZipSource::Extracted {
                    from: lineupid.clone(),
                },
            })
        }
        (None, None) => None,
    };

    Overrides {
        zipcode,
        days: args.days,
        langdetect: args.langdetect,
        refresh_hours: args.refresh,
        lineupid: args.lineupid.clone(),
    }
}

fn prune_logs(log_dir: &std::path::Path, retention: &RetentionConfig) {
    if !retention.rotation_enabled {
        return;
    }
    match logging::prune_rotated_logs(log_dir, default_log_file(), retention.keep_files) {
        Ok(0) => {}
        Ok(removed) => tracing::info!("Pruned {} rotated log file(s)", removed),
        Err(e) => tracing::warn!("Log pruning failed: {}", e),
    }
}

fn print_summary(manager: &ConfigManager) {
    let settings = manager.settings();
    let lineup = manager.lineup_config();
    let retention = manager.retention_config();

    println!("Configuration loaded successfully.");
    println!();
    println!("  zipcode:   {}", settings.get_str("zipcode"));
    println!(
        "  lineup:    {} ({})",
        lineup.lineup_id, lineup.description
    );
    println!(
        "  country:   {} [{}]",
        lineup.country.full_name(),
        lineup.country.as_str()
    );
    println!("  days:      {}", settings.str_or("days", "1"));
    println!("  refresh:   {} hours", settings.refresh_hours());
    println!(
        "  retention: guide {} days, logs {} days, xmltv {} days",
        settings.str_or("redays", "1"),
        retention.log_retention_days,
        retention.xmltv_retention_days
    );

    if !manager.config_changes().is_empty() {
        println!();
        println!("Changes this run:");
        for (id, change) in manager.config_changes() {
            println!("  {}: {}", id, change);
        }
    }
}
