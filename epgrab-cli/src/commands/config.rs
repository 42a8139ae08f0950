//! Configuration management CLI commands.
//!
//! Provides `config get`, `config list`, `config path`, and `config upgrade`
//! commands for inspecting and migrating the settings file from the command
//! line. Mutation goes through the same migration path as a normal load, so
//! `upgrade` creates the same timestamped backup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use epgrab::config::{
    analyze, parse_file, Migrator, Section, SettingKey, SCHEMA_VERSION,
};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Setting id (e.g., zipcode, lineupid, redays)
        id: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,

    /// Migrate the configuration file to the current version
    ///
    /// Removes deprecated and unknown settings and rewrites the file in
    /// canonical order. Creates a timestamped backup before modifying.
    Upgrade {
        /// Show what would be changed without modifying the file
        #[arg(long)]
        dry_run: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_file: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { id } => run_get(&id, config_file),
        ConfigCommands::List => run_list(config_file),
        ConfigCommands::Path => run_path(config_file),
        ConfigCommands::Upgrade { dry_run } => run_upgrade(dry_run, config_file),
    }
}

/// Get a configuration value.
fn run_get(id: &str, config_file: &Path) -> Result<(), CliError> {
    let key: SettingKey = id.parse().map_err(|_| {
        CliError::Config(epgrab::error::ConfigError::RequiredSetting(format!(
            "Unknown setting id '{}'. Use 'epgrab config list' to see available settings.",
            id
        )))
    })?;

    let parsed = parse_file(config_file)?;
    match parsed.get(key.name()).flatten() {
        Some(value) => println!("{}", value),
        None => println!("(not set)"),
    }

    Ok(())
}

/// List all configuration settings, grouped by section.
fn run_list(config_file: &Path) -> Result<(), CliError> {
    let parsed = parse_file(config_file)?;
    let values: BTreeMap<&str, Option<&str>> = parsed
        .settings
        .iter()
        .map(|s| (s.id.as_str(), s.value.as_deref()))
        .collect();

    println!("Configuration Settings (version {})", parsed.version);
    println!("===================================");

    for section in Section::all() {
        println!();
        println!("[{}]", section.title());
        for key in SettingKey::in_section(*section) {
            match values.get(key.name()) {
                Some(Some(value)) => println!("  {} = {}", key.name(), value),
                Some(None) => println!("  {} = (empty)", key.name()),
                None => println!("  {} = (not set)", key.name()),
            }
        }
    }

    Ok(())
}

/// Show the configuration file path.
fn run_path(config_file: &Path) -> Result<(), CliError> {
    println!("{}", config_file.display());
    Ok(())
}

/// Migrate the configuration file to the current version.
fn run_upgrade(dry_run: bool, config_file: &Path) -> Result<(), CliError> {
    if !config_file.exists() {
        println!("No configuration file found at {}", config_file.display());
        println!("Run 'epgrab load' to create one with defaults.");
        return Ok(());
    }

    let parsed = parse_file(config_file)?;
    let plan = analyze(&parsed);

    if !plan.is_needed() {
        println!("Configuration is up to date (version {}).", parsed.version);
        return Ok(());
    }

    println!("Configuration Migration Analysis");
    println!("================================");
    println!();

    if !plan.deprecated.is_empty() {
        println!("Deprecated settings to remove ({}):", plan.deprecated.len());
        for id in &plan.deprecated {
            println!("  - {}", id);
        }
        println!();
    }

    if !plan.unknown.is_empty() {
        println!("Unknown settings to remove ({}):", plan.unknown.len());
        for id in &plan.unknown {
            println!("  - {}", id);
        }
        println!();
    }

    if plan.ordering_needed {
        println!("Settings will be rewritten in canonical order.");
        println!();
    }

    if dry_run {
        println!("[DRY RUN] No changes made.");
        return Ok(());
    }

    let valid: BTreeMap<String, String> = parsed
        .settings
        .iter()
        .filter(|s| SettingKey::is_valid(&s.id))
        .map(|s| (s.id.clone(), s.value.clone().unwrap_or_default()))
        .collect();

    let mut migrator = Migrator::new();
    if !migrator.perform_migration(config_file, &valid, &plan) {
        return Err(CliError::Config(epgrab::error::ConfigError::Migration(
            "migration failed; the previous configuration was kept".to_string(),
        )));
    }

    println!("Migration complete!");
    if let Some(backup) = migrator.backup_file() {
        println!("Backup created: {}", backup.display());
    }
    println!(
        "Removed {} deprecated/unknown setting(s), now at version {}.",
        plan.removed_ids().len(),
        SCHEMA_VERSION
    );

    Ok(())
}

/// Resolve the config file path from an optional CLI override.
pub fn resolve_config_file(config_file: Option<PathBuf>) -> PathBuf {
    config_file.unwrap_or_else(epgrab::config::config_file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("epgrab.xml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_resolve_config_file_prefers_override() {
        let custom = PathBuf::from("/tmp/custom.xml");
        assert_eq!(resolve_config_file(Some(custom.clone())), custom);
        assert_eq!(
            resolve_config_file(None),
            epgrab::config::config_file_path()
        );
    }

    #[test]
    fn test_get_unknown_id_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "<settings version=\"5\"/>");
        assert!(run_get("frobnicate", &path).is_err());
        assert!(run_get("zipcode", &path).is_ok());
    }

    #[test]
    fn test_upgrade_dry_run_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let contents = r#"<settings version="4">
  <setting id="zipcode" value="90210"/>
  <setting id="useragent" value="old"/>
</settings>"#;
        let path = write_config(&dir, contents);

        run_upgrade(true, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), contents);
    }

    #[test]
    fn test_upgrade_migrates_and_creates_backup() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"<settings version="4">
  <setting id="zipcode" value="90210"/>
  <setting id="useragent" value="old"/>
</settings>"#,
        );

        run_upgrade(false, &path).unwrap();

        let parsed = parse_file(&path).unwrap();
        assert_eq!(parsed.version, SCHEMA_VERSION);
        assert!(parsed.get("useragent").is_none());

        let backups = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .contains(".backup.")
            })
            .count();
        assert_eq!(backups, 1);
    }
}
