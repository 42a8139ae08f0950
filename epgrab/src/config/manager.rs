//! Configuration lifecycle orchestration.
//!
//! [`ConfigManager::load`] runs the whole sequence: default-file creation,
//! parse, migration, command-line overrides, consistency and range
//! validation, default filling, and file persistence. Overrides apply to the
//! in-memory settings only; the file keeps the user's values, gaining at most
//! newly added defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::lineup::{self, Country, LineupConfig};
use crate::retention::RetentionConfig;

use super::migrate::{self, Migrator};
use super::parser;
use super::schema::{SettingKey, SCHEMA_VERSION};
use super::settings::{coerce, Settings};
use super::{defaults, validate};

/// Where an overriding zipcode came from, for change-note wording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZipSource {
    CommandLine,
    /// Extracted from a lineup id (given here) rather than typed directly.
    Extracted { from: String },
}

/// A zipcode override with provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipOverride {
    pub code: String,
    pub source: ZipSource,
}

/// Per-run overrides. Applied in memory only, never written to the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub zipcode: Option<ZipOverride>,
    pub days: Option<u32>,
    pub langdetect: Option<bool>,
    pub refresh_hours: Option<u32>,
    pub lineupid: Option<String>,
}

/// Loads, validates, and maintains the configuration file.
pub struct ConfigManager {
    config_file: PathBuf,
    settings: Settings,
    version: String,
    config_changes: BTreeMap<String, String>,
    migrator: Migrator,
}

impl ConfigManager {
    pub fn new(config_file: impl Into<PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
            settings: Settings::new(),
            version: SCHEMA_VERSION.to_string(),
            config_changes: BTreeMap::new(),
            migrator: Migrator::new(),
        }
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Settings as of the last [`load`](Self::load).
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Schema version the file declared before migration.
    pub fn file_version(&self) -> &str {
        &self.version
    }

    /// Change notes ("before → after (reason)") accumulated during load.
    pub fn config_changes(&self) -> &BTreeMap<String, String> {
        &self.config_changes
    }

    /// Run the full load sequence and return the validated settings.
    pub fn load(&mut self, overrides: &Overrides) -> Result<&Settings, ConfigError> {
        if !self.config_file.exists() {
            defaults::create_default_config(&self.config_file)?;
        }

        self.parse_and_migrate()?;

        let original_zipcode = self.settings.get_str("zipcode").trim().to_string();
        let original_lineupid = self.settings.str_or("lineupid", "auto").trim().to_string();
        self.config_changes = BTreeMap::new();

        self.apply_overrides(overrides, &original_zipcode, &original_lineupid);

        let consistency_changes = validate::check_consistency(&mut self.settings)?;
        self.config_changes.extend(consistency_changes);

        validate::check_required(&self.settings)?;
        validate::validate_refresh_hours(&mut self.settings);
        validate::validate_retention_policies(&mut self.settings);

        self.fill_defaults_and_update_file();

        Ok(&self.settings)
    }

    fn parse_and_migrate(&mut self) -> Result<(), ConfigError> {
        let parsed = parser::parse_file(&self.config_file)?;
        self.version = parsed.version.clone();

        // Coerce the valid settings into the in-memory map.
        self.settings = Settings::new();
        for raw in parsed.settings.iter().filter(|s| SettingKey::is_valid(&s.id)) {
            let value = coerce(&raw.id, raw.value.as_deref());
            tracing::debug!("Processed setting: {} = {:?}", raw.id, value);
            self.settings.insert(raw.id.clone(), value);
        }

        let plan = migrate::analyze(&parsed);
        if plan.is_needed() {
            let mut reason = Vec::new();
            let removed = plan.removed_ids();
            if !removed.is_empty() {
                reason.push(format!(
                    "removed {} deprecated/unknown settings",
                    removed.len()
                ));
            }
            if plan.ordering_needed {
                reason.push("reordered settings for consistency".to_string());
            }
            tracing::info!("Configuration update needed: {}", reason.join(", "));

            // Raw file values, not coerced ones, go back to disk.
            let valid: BTreeMap<String, String> = parsed
                .settings
                .iter()
                .filter(|s| SettingKey::is_valid(&s.id))
                .map(|s| (s.id.clone(), s.value.clone().unwrap_or_default()))
                .collect();
            self.migrator.perform_migration(&self.config_file, &valid, &plan);
        }

        Ok(())
    }

    fn apply_overrides(
        &mut self,
        overrides: &Overrides,
        original_zipcode: &str,
        original_lineupid: &str,
    ) {
        if let Some(zip) = &overrides.zipcode {
            self.apply_zipcode_override(zip, original_zipcode);
        }
        if let Some(days) = overrides.days {
            let original = self.settings.str_or("days", "1").to_string();
            self.note_override("days", &original, &days.to_string());
            self.settings.set_str("days", days.to_string());
        }
        if let Some(langdetect) = overrides.langdetect {
            let original = self.settings.get_bool("langdetect").to_string();
            self.note_override("langdetect", &original, &langdetect.to_string());
            self.settings.set_bool("langdetect", langdetect);
        }
        if let Some(refresh) = overrides.refresh_hours {
            let original = self.settings.str_or("refresh", "48").to_string();
            self.note_override("refresh", &original, &refresh.to_string());
            self.settings.set_str("refresh", refresh.to_string());
        }
        if let Some(lineupid) = &overrides.lineupid {
            self.note_override("lineupid", original_lineupid, lineupid);
            self.settings.set_str("lineupid", lineupid.clone());
        }
    }

    fn apply_zipcode_override(&mut self, zip: &ZipOverride, original_zipcode: &str) {
        if original_zipcode.is_empty() {
            let note = match &zip.source {
                ZipSource::Extracted { from } => {
                    format!("(empty) → {} (extracted from {})", zip.code, from)
                }
                ZipSource::CommandLine => {
                    format!("(empty) → {} (from command line)", zip.code)
                }
            };
            self.config_changes.insert("zipcode".to_string(), note);
        } else if original_zipcode != zip.code {
            match &zip.source {
                ZipSource::Extracted { from } => {
                    self.config_changes.insert(
                        "zipcode".to_string(),
                        format!("{} → {} (extracted from {})", original_zipcode, zip.code, from),
                    );
                    tracing::warn!("Configuration mismatch detected and resolved:");
                    tracing::warn!("  Configured zipcode: {}", original_zipcode);
                    tracing::warn!(
                        "  LineupID contains: {} (from {})",
                        zip.code.replace(' ', ""),
                        from
                    );
                    tracing::warn!(
                        "  Resolution: Using zipcode from lineupid ({} takes precedence)",
                        from
                    );
                }
                ZipSource::CommandLine => {
                    self.config_changes.insert(
                        "zipcode".to_string(),
                        format!("{} → {} (overridden)", original_zipcode, zip.code),
                    );
                }
            }
        }
        self.settings.set_str("zipcode", zip.code.clone());
    }

    fn note_override(&mut self, id: &str, original: &str, new: &str) {
        if original != new {
            self.config_changes
                .insert(id.to_string(), format!("{} → {}", original, new));
        }
    }

    /// Fill schema defaults in memory and persist the newly added ones.
    ///
    /// Persistence re-reads the file so only genuinely missing settings are
    /// added; override values never leak to disk.
    fn fill_defaults_and_update_file(&mut self) {
        let added = self.settings.fill_missing_defaults();
        if added.is_empty() {
            return;
        }

        let added_list: Vec<String> = added.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        tracing::info!(
            "Added missing settings with defaults: {}",
            added_list.join(", ")
        );

        if migrate::update_config_with_defaults(&self.config_file, &added) {
            self.notify_config_upgrade();
        }
    }

    fn notify_config_upgrade(&self) {
        tracing::warn!("{}", "=".repeat(60));
        tracing::warn!("CONFIGURATION UPGRADED TO VERSION {}", SCHEMA_VERSION);
        if let Some(backup) = self.migrator.backup_file() {
            tracing::warn!("Backup created: {}", backup.display());
        }
        tracing::warn!("Updated settings: (configuration file)");
        tracing::warn!("{}", "=".repeat(60));
    }

    /// Country inferred from the zipcode format.
    pub fn country(&self) -> Country {
        validate::country_from_zipcode(self.settings.get_str("zipcode"))
    }

    /// Resolved lineup identity for the loaded settings.
    pub fn lineup_config(&self) -> LineupConfig {
        let zipcode = self
            .settings
            .get_str("zipcode")
            .replace(' ', "")
            .to_uppercase();
        lineup::lineup_config(self.settings.str_or("lineupid", "auto"), &zipcode, self.country())
    }

    /// Computed retention policy for the loaded settings.
    pub fn retention_config(&self) -> RetentionConfig {
        RetentionConfig::from_settings(&self.settings)
    }

    /// Log the effective configuration at startup.
    pub fn log_config_summary(&self) {
        tracing::info!("Configuration values processed:");

        let lineup = self.lineup_config();
        let retention = self.retention_config();

        match self.config_changes.get("zipcode") {
            Some(change) => tracing::info!("  zipcode: {}", change),
            None => tracing::info!("  zipcode: {}", self.settings.get_str("zipcode")),
        }

        if let Some(change) = self.config_changes.get("lineupid") {
            tracing::info!("  lineupid: {}", change);
        } else if lineup.auto_detected {
            tracing::info!(
                "  lineupid: {} → {} (auto-detection)",
                lineup.original_config,
                lineup.lineup_id
            );
        } else {
            tracing::info!("  lineupid: {} → {}", lineup.original_config, lineup.lineup_id);
        }

        let country = self.country();
        tracing::info!(
            "  country: {} [{}] (auto-detected from zipcode)",
            country.full_name(),
            country.as_str()
        );
        tracing::debug!(
            "  device: {} (auto-detected for optional &device= URL parameter)",
            lineup.device_type.as_str()
        );
        tracing::info!("  description: {}", lineup.description);
        tracing::info!(
            "  xdetails (download extended data): {}",
            self.settings.get_bool("xdetails")
        );
        tracing::info!(
            "  xdesc (use extended descriptions): {}",
            self.settings.get_bool("xdesc")
        );
        tracing::info!(
            "  langdetect (automatic language detection): {}",
            self.settings.get_bool("langdetect")
        );

        retention.log_summary();
        self.log_feature_logic();
    }

    fn log_feature_logic(&self) {
        let xdetails = self.settings.get_bool("xdetails");
        let xdesc = self.settings.get_bool("xdesc");

        if xdesc && !xdetails {
            tracing::info!("xdesc=true detected - automatically enabling extended details download");
        } else if xdetails && !xdesc {
            tracing::info!("xdetails=true - downloading extended data but using basic descriptions");
        } else if xdetails && xdesc {
            tracing::info!("Both xdetails and xdesc enabled - full extended functionality");
        } else {
            tracing::info!("Extended features disabled - using basic guide data only");
        }

        if self.settings.get_bool("langdetect") {
            tracing::info!("Language detection enabled - will auto-detect French/English/Spanish");
        } else {
            tracing::info!("Language detection disabled - all content will be marked as English");
        }
    }
}
