//! Configuration lifecycle: parse, validate, migrate, persist.
//!
//! The settings file is versioned XML (`<settings version="5">`). A load
//! pass parses the file, migrates away deprecated settings (with backup),
//! applies per-run overrides in memory, enforces the zipcode/lineupid
//! invariant, range-checks the rest, and fills schema defaults.

mod defaults;
mod manager;
mod migrate;
mod parser;
mod schema;
mod settings;
mod validate;
mod writer;

pub use defaults::{config_directory, config_file_path, create_default_config, DEFAULT_CONFIG};
pub use manager::{ConfigManager, Overrides, ZipOverride, ZipSource};
pub use migrate::{
    analyze, classify, update_config_with_defaults, MigrationPlan, Migrator,
    SettingClassification,
};
pub use parser::{parse_file, parse_str, ParsedConfig, RawSetting};
pub use schema::{canonical_order, Section, SettingKey, ValueType, SCHEMA_VERSION};
pub use settings::{coerce, parse_bool, SettingValue, Settings};
pub use validate::{
    check_consistency, check_required, country_from_zipcode, extract_location_from_lineupid,
    is_valid_retention_value, validate_postal_code, validate_refresh_hours,
    validate_retention_policies,
};
pub use writer::{to_config_string, write_clean_config};
