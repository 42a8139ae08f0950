//! Configuration migration: deprecated-setting cleanup, backups, rollback.
//!
//! Old config versions carried settings that are now renamed, auto-detected,
//! or gone. Migration classifies every id in the file, removes what no longer
//! belongs, and rewrites the file in canonical form. Every mutating step is
//! recoverable: a timestamped backup always precedes the rewrite, the result
//! is re-parsed before being trusted, and a failed rewrite rolls back to the
//! backup. Migration failure never aborts a load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::ConfigError;

use super::parser::{self, ParsedConfig};
use super::schema::{self, SettingKey, SCHEMA_VERSION};
use super::writer;

/// Renamed or superseded settings. The replacement is informational; values
/// do not carry over because the semantics changed.
const DEPRECATED_RENAMES: &[(&str, &str)] = &[
    ("auto_lineup", "lineupid"),
    ("lineupcode", "lineupid"),
    ("lineup", "lineupid"),
    ("device", "lineupid"),
    ("logrotate_enabled", "logrotate"),
    ("logrotate_interval", "logrotate"),
    ("logrotate_keep", "relogs"),
    ("log_rotation", "logrotate"),
    ("log_retention", "relogs"),
    ("xmltv_backup_retention", "rexmltv"),
];

/// How a setting id found in the file is treated during migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingClassification {
    /// Current schema setting; kept.
    Valid,
    /// Deprecated with a named successor; removed.
    DeprecatedRenamed(&'static str),
    /// Matches a retired setting family (desc00-desc99, useragent); removed.
    DeprecatedPattern,
    /// Never part of any schema version; removed with a warning.
    Unknown,
}

/// Classify a setting id against the current schema and deprecation tables.
pub fn classify(id: &str) -> SettingClassification {
    if SettingKey::is_valid(id) {
        return SettingClassification::Valid;
    }
    if let Some((_, replacement)) = DEPRECATED_RENAMES.iter().find(|(old, _)| *old == id) {
        return SettingClassification::DeprecatedRenamed(replacement);
    }
    if id == "useragent" || is_desc_setting(id) {
        return SettingClassification::DeprecatedPattern;
    }
    SettingClassification::Unknown
}

/// Old per-line description settings: "desc" followed by exactly two digits.
fn is_desc_setting(id: &str) -> bool {
    id.len() == 6 && id.starts_with("desc") && id[4..].bytes().all(|b| b.is_ascii_digit())
}

/// What a migration pass would change.
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    pub deprecated: Vec<String>,
    pub unknown: Vec<String>,
    pub ordering_needed: bool,
}

impl MigrationPlan {
    pub fn is_needed(&self) -> bool {
        !self.deprecated.is_empty() || !self.unknown.is_empty() || self.ordering_needed
    }

    /// All ids slated for removal, deprecated first.
    pub fn removed_ids(&self) -> Vec<String> {
        let mut ids = self.deprecated.clone();
        ids.extend(self.unknown.iter().cloned());
        ids
    }
}

/// Analyze a parsed file for migration needs without touching it.
pub fn analyze(parsed: &ParsedConfig) -> MigrationPlan {
    let mut plan = MigrationPlan::default();

    for setting in &parsed.settings {
        match classify(&setting.id) {
            SettingClassification::Valid => {}
            SettingClassification::DeprecatedRenamed(replacement) => {
                tracing::debug!(
                    "Deprecated setting found: {} (superseded by {}, will be removed)",
                    setting.id,
                    replacement
                );
                plan.deprecated.push(setting.id.clone());
            }
            SettingClassification::DeprecatedPattern => {
                tracing::debug!("Deprecated setting found: {} (will be removed)", setting.id);
                plan.deprecated.push(setting.id.clone());
            }
            SettingClassification::Unknown => {
                tracing::warn!(
                    "Unknown configuration setting: {} = {:?} (will be removed)",
                    setting.id,
                    setting.value
                );
                plan.unknown.push(setting.id.clone());
            }
        }
    }

    let valid_order: Vec<String> = parsed
        .order()
        .into_iter()
        .filter(|id| SettingKey::is_valid(id))
        .map(str::to_string)
        .collect();
    plan.ordering_needed =
        valid_order != schema::canonical_order(valid_order.iter().map(String::as_str));

    plan
}

/// Executes migrations with backup and rollback.
#[derive(Debug, Default)]
pub struct Migrator {
    backup_file: Option<PathBuf>,
}

impl Migrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the backup created by the last migration, if any.
    pub fn backup_file(&self) -> Option<&Path> {
        self.backup_file.as_deref()
    }

    /// Copy the config file to `{path}.backup.{timestamp}`.
    pub fn create_backup(&mut self, config_file: &Path) -> Result<PathBuf, ConfigError> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let mut backup = config_file.as_os_str().to_os_string();
        backup.push(format!(".backup.{}", timestamp));
        let backup = PathBuf::from(backup);

        std::fs::copy(config_file, &backup)?;
        tracing::info!("Created configuration backup: {}", backup.display());
        self.backup_file = Some(backup.clone());
        Ok(backup)
    }

    /// Rewrite the config file to the cleaned, canonically ordered form.
    ///
    /// Returns true on success. Any failure is logged and leaves the caller
    /// running on the pre-migration file: either the write never happened, or
    /// the backup was restored.
    pub fn perform_migration(
        &mut self,
        config_file: &Path,
        valid_settings: &BTreeMap<String, String>,
        plan: &MigrationPlan,
    ) -> bool {
        let removed = plan.removed_ids();

        if plan.is_needed() {
            if let Err(e) = self.create_backup(config_file) {
                tracing::error!("Failed to create backup: {}", e);
                tracing::error!("Continuing with existing configuration...");
                return false;
            }
        }

        if let Err(e) = writer::write_clean_config(config_file, valid_settings) {
            tracing::error!("Error updating configuration file: {}", e);
            self.rollback(config_file);
            tracing::error!("Continuing with existing configuration...");
            return false;
        }

        if !self.validate_result(config_file) {
            self.rollback(config_file);
            tracing::error!("Continuing with existing configuration...");
            return false;
        }

        let mut changes = Vec::new();
        if !removed.is_empty() {
            changes.push(format!(
                "removed {} deprecated/unknown settings",
                removed.len()
            ));
        }
        if plan.ordering_needed {
            changes.push("reordered settings for consistency".to_string());
        }
        tracing::info!("Configuration updated successfully: {}", changes.join(", "));
        if !removed.is_empty() {
            tracing::info!("  Removed settings: {}", removed.join(", "));
            tracing::info!(
                "Configuration cleanup: removed {} deprecated settings: {}",
                removed.len(),
                removed.join(", ")
            );
        }
        tracing::info!(
            "  Updated to version {} with unified retention policies",
            SCHEMA_VERSION
        );

        true
    }

    /// Re-parse the migrated file and sanity-check the result.
    fn validate_result(&self, config_file: &Path) -> bool {
        let parsed = match parser::parse_file(config_file) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!("Migration validation failed: {}", e);
                return false;
            }
        };

        if parsed.version != SCHEMA_VERSION {
            tracing::warn!(
                "Migration validation: version is not \"{}\"",
                SCHEMA_VERSION
            );
        }
        if parsed.settings.is_empty() {
            tracing::error!("Migration validation failed: no settings found");
            return false;
        }

        tracing::debug!(
            "Migration validation passed: {} settings found",
            parsed.settings.len()
        );
        true
    }

    /// Restore the config file from the migration backup.
    pub fn rollback(&self, config_file: &Path) -> bool {
        let Some(backup) = &self.backup_file else {
            tracing::error!("Cannot rollback: no backup file available");
            return false;
        };
        if !backup.exists() {
            tracing::error!("Cannot rollback: backup file not found: {}", backup.display());
            return false;
        }
        match std::fs::copy(backup, config_file) {
            Ok(_) => {
                tracing::info!("Configuration rolled back from backup: {}", backup.display());
                true
            }
            Err(e) => {
                tracing::error!("Failed to rollback configuration: {}", e);
                false
            }
        }
    }
}

/// Persist newly added defaults without persisting runtime values.
///
/// Re-reads the file so user edits and original raw values are preserved
/// exactly; only settings absent from the file are added. Returns true on
/// success; failure is logged and non-fatal.
pub fn update_config_with_defaults(config_file: &Path, added: &[(String, String)]) -> bool {
    let parsed = match parser::parse_file(config_file) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!("Error updating configuration file with defaults: {}", e);
            return false;
        }
    };

    let mut existing: BTreeMap<String, String> = parsed
        .settings
        .iter()
        .filter(|s| SettingKey::is_valid(&s.id))
        .map(|s| (s.id.clone(), s.value.clone().unwrap_or_default()))
        .collect();

    let mut added_count = 0;
    for (id, value) in added {
        if !existing.contains_key(id) {
            tracing::debug!("Adding new setting to config file: {} = {}", id, value);
            existing.insert(id.clone(), value.clone());
            added_count += 1;
        }
    }

    if let Err(e) = writer::write_clean_config(config_file, &existing) {
        tracing::error!("Error updating configuration file with defaults: {}", e);
        return false;
    }

    tracing::info!(
        "Configuration file updated: preserved {} existing settings, added {} new settings",
        existing.len() - added_count,
        added_count
    );
    true
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
    fn test_classify() {
        assert_eq!(classify("zipcode"), SettingClassification::Valid);
        assert_eq!(
            classify("lineupcode"),
            SettingClassification::DeprecatedRenamed("lineupid")
        );
        assert_eq!(
            classify("log_retention"),
            SettingClassification::DeprecatedRenamed("relogs")
        );
        assert_eq!(classify("desc01"), SettingClassification::DeprecatedPattern);
        assert_eq!(classify("desc99"), SettingClassification::DeprecatedPattern);
        assert_eq!(classify("useragent"), SettingClassification::DeprecatedPattern);
        // Not exactly two digits
        assert_eq!(classify("desc1"), SettingClassification::Unknown);
        assert_eq!(classify("desc123"), SettingClassification::Unknown);
        assert_eq!(classify("mystery"), SettingClassification::Unknown);
    }

    #[test]
    fn test_analyze_clean_current_file_needs_nothing() {
        let parsed = parser::parse_str(
            r#"<settings version="5">
                 <setting id="zipcode">92101</setting>
                 <setting id="lineupid">auto</setting>
                 <setting id="days">1</setting>
               </settings>"#,
        )
        .unwrap();
        let plan = analyze(&parsed);
        assert!(!plan.is_needed());
    }

    #[test]
    fn test_analyze_flags_deprecated_unknown_and_ordering() {
        let parsed = parser::parse_str(
            r#"<settings version="5">
                 <setting id="days">1</setting>
                 <setting id="zipcode">92101</setting>
                 <setting id="lineupcode">OTA92101</setting>
                 <setting id="frobnicate">x</setting>
               </settings>"#,
        )
        .unwrap();
        let plan = analyze(&parsed);
        assert_eq!(plan.deprecated, vec!["lineupcode"]);
        assert_eq!(plan.unknown, vec!["frobnicate"]);
        assert!(plan.ordering_needed);
        assert!(plan.is_needed());
    }

    #[test]
    fn test_analyze_clean_old_version_needs_nothing() {
        // Version alone never justifies a rewrite; the stamp rides along
        // only when deprecated keys or ordering already require one.
        let parsed = parser::parse_str(
            r#"<settings version="4">
                 <setting id="zipcode" value="92101"/>
                 <setting id="lineupid" value="auto"/>
                 <setting id="days" value="1"/>
               </settings>"#,
        )
        .unwrap();
        let plan = analyze(&parsed);
        assert!(!plan.is_needed());
        assert!(plan.removed_ids().is_empty());
    }

    #[test]
    fn test_create_backup_uses_timestamped_name() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "<settings version=\"5\"/>");

        let mut migrator = Migrator::new();
        let backup = migrator.create_backup(&path).unwrap();

        let name = backup.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("epgrab.xml.backup."));
        let suffix = name.strip_prefix("epgrab.xml.backup.").unwrap();
        // YYYYMMDD_HHMMSS
        assert_eq!(suffix.len(), 15);
        assert_eq!(&suffix[8..9], "_");
        assert_eq!(
            std::fs::read_to_string(&backup).unwrap(),
            "<settings version=\"5\"/>"
        );
    }

    #[test]
    fn test_perform_migration_removes_and_stamps_version() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"<settings version="4">
                 <setting id="zipcode" value="92101"/>
                 <setting id="lineupcode" value="OTA92101"/>
               </settings>"#,
        );

        let parsed = parser::parse_file(&path).unwrap();
        let plan = analyze(&parsed);
        assert_eq!(plan.deprecated, vec!["lineupcode"]);

        let valid: BTreeMap<String, String> =
            [("zipcode".to_string(), "92101".to_string())].into();
        let mut migrator = Migrator::new();
        assert!(migrator.perform_migration(&path, &valid, &plan));

        let migrated = parser::parse_file(&path).unwrap();
        assert_eq!(migrated.version, "5");
        assert!(migrated.get("lineupcode").is_none());
        assert_eq!(migrated.get("zipcode"), Some(Some("92101")));
        assert!(migrator.backup_file().unwrap().exists());
    }

    #[test]
    fn test_migration_is_idempotent_no_second_backup() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"<settings version="4">
                 <setting id="zipcode" value="92101"/>
                 <setting id="useragent" value="old"/>
               </settings>"#,
        );

        let plan = analyze(&parser::parse_file(&path).unwrap());
        let valid: BTreeMap<String, String> =
            [("zipcode".to_string(), "92101".to_string())].into();
        let mut migrator = Migrator::new();
        assert!(migrator.perform_migration(&path, &valid, &plan));
        let after_first = std::fs::read_to_string(&path).unwrap();

        // A second analysis of the migrated file finds nothing to do.
        let second_plan = analyze(&parser::parse_file(&path).unwrap());
        assert!(!second_plan.is_needed());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), after_first);

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

    #[test]
    fn test_rollback_restores_backup() {
        let dir = TempDir::new().unwrap();
        let original = r#"<settings version="5"><setting id="zipcode">92101</setting></settings>"#;
        let path = write_config(&dir, original);

        let mut migrator = Migrator::new();
        migrator.create_backup(&path).unwrap();
        std::fs::write(&path, "garbage").unwrap();

        assert!(migrator.rollback(&path));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_rollback_without_backup_fails() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "<settings version=\"5\"/>");
        assert!(!Migrator::new().rollback(&path));
    }

    #[test]
    fn test_update_config_with_defaults_preserves_user_values() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"<settings version="5">
                 <setting id="zipcode">92101</setting>
                 <setting id="days">7</setting>
               </settings>"#,
        );

        let added = vec![
            ("refresh".to_string(), "48".to_string()),
            ("days".to_string(), "1".to_string()),
        ];
        assert!(update_config_with_defaults(&path, &added));

        let parsed = parser::parse_file(&path).unwrap();
        // User value wins over the default
        assert_eq!(parsed.get("days"), Some(Some("7")));
        assert_eq!(parsed.get("refresh"), Some(Some("48")));
        assert_eq!(parsed.get("zipcode"), Some(Some("92101")));
    }
}
