//! Cache and retention policy computation.
//!
//! Turns the validated retention settings (logrotate, relogs, rexmltv) into
//! the concrete numbers the rotation machinery needs: whether rotation is
//! enabled, at what interval, how many rotated files to keep, and the
//! retention windows in days. Pure computation; validation and default
//! substitution happen earlier, in config validation.

use std::fmt;

use crate::config::Settings;

/// Log rotation interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationInterval {
    Daily,
    Weekly,
    Monthly,
}

impl RotationInterval {
    fn from_setting(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(RotationInterval::Daily),
            "weekly" => Some(RotationInterval::Weekly),
            "monthly" => Some(RotationInterval::Monthly),
            _ => None,
        }
    }

    /// Days covered by one rotated file.
    fn days_per_file(&self) -> u32 {
        match self {
            RotationInterval::Daily => 1,
            RotationInterval::Weekly => 7,
            RotationInterval::Monthly => 30,
        }
    }
}

impl fmt::Display for RotationInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RotationInterval::Daily => "daily",
            RotationInterval::Weekly => "weekly",
            RotationInterval::Monthly => "monthly",
        };
        f.write_str(s)
    }
}

/// Computed retention policy. A retention of 0 days means unlimited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionConfig {
    pub rotation_enabled: bool,
    pub rotation_interval: RotationInterval,
    /// Rotated log files to keep; 0 means keep everything.
    pub keep_files: u32,
    pub log_retention_days: u32,
    pub xmltv_retention_days: u32,
}

impl RetentionConfig {
    /// Derive the policy from validated settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let logrotate = settings.str_or("logrotate", "true").trim().to_lowercase();

        let (rotation_enabled, rotation_interval) = match logrotate.as_str() {
            "false" => (false, RotationInterval::Daily),
            "true" => (true, RotationInterval::Daily),
            other => (
                true,
                RotationInterval::from_setting(other).unwrap_or(RotationInterval::Daily),
            ),
        };

        let log_retention_days =
            retention_to_days(settings.str_or("relogs", "30"), rotation_interval);
        // XMLTV backups rotate daily regardless of the log interval.
        let xmltv_retention_days =
            retention_to_days(settings.str_or("rexmltv", "7"), RotationInterval::Daily);

        RetentionConfig {
            rotation_enabled,
            rotation_interval,
            keep_files: days_to_keep_files(log_retention_days, rotation_interval),
            log_retention_days,
            xmltv_retention_days,
        }
    }

    /// Log the effective policy at startup.
    pub fn log_summary(&self) {
        tracing::info!("Cache and retention policies:");
        if self.rotation_enabled {
            tracing::info!(
                "  logrotate: enabled ({}, {} days retention)",
                self.rotation_interval,
                self.log_retention_days
            );
        } else {
            tracing::info!("  logrotate: disabled");
        }
        tracing::info!(
            "  rexmltv: {} days (XMLTV backup retention)",
            self.xmltv_retention_days
        );
    }
}

/// Convert a retention expression to days: a number stands for itself,
/// period words map to their length, `unlimited` is 0, and anything else
/// defaults based on the rotation interval.
pub fn retention_to_days(value: &str, interval: RotationInterval) -> u32 {
    let value = value.trim().to_lowercase();
    if let Ok(days) = value.parse::<u32>() {
        return days;
    }
    match value.as_str() {
        "weekly" => 7,
        "monthly" => 30,
        "quarterly" => 90,
        "unlimited" => 0,
        _ => match interval {
            RotationInterval::Daily => 30,
            RotationInterval::Weekly => 90,
            RotationInterval::Monthly => 365,
        },
    }
}

/// Number of rotated files that cover `retention_days` at `interval`.
/// 0 days (unlimited) keeps 0 = everything; otherwise at least one file.
pub fn days_to_keep_files(retention_days: u32, interval: RotationInterval) -> u32 {
    if retention_days == 0 {
        return 0;
    }
    (retention_days / interval.days_per_file()).max(1)
}
