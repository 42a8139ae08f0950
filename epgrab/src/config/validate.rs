//! Consistency and range validation for the settings map.
//!
//! Two severity tiers, kept deliberately asymmetric: identity settings
//! (zipcode, lineupid) fail loudly because guessing the wrong location
//! produces a plausible-looking but wrong guide, while cosmetic settings
//! (refresh, logrotate, relogs, rexmltv, redays) degrade to their documented
//! defaults with a warning and never abort the load.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ConfigError;
use crate::lineup::Country;

use super::settings::Settings;

/// OTA lineup pattern: `COUNTRY-OTA<LOCATION>[-DEFAULT]`.
fn ota_lineup_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(CAN|USA)-OTA([A-Z0-9]+)(?:-DEFAULT)?$").expect("valid OTA pattern")
    })
}

/// Canadian postal pattern: letter-digit-letter-digit-letter-digit.
fn canadian_postal_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][0-9][A-Z][0-9][A-Z][0-9]$").expect("valid postal pattern"))
}

/// Validate a postal/ZIP code and classify its country.
///
/// Returns `(country, cleaned_code)` where the cleaned code is uppercase and
/// space-free, or `None` when the code matches neither recognized format.
pub fn validate_postal_code(postal_code: &str) -> Option<(Country, String)> {
    let clean: String = postal_code
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if clean.len() == 5 && clean.bytes().all(|b| b.is_ascii_digit()) {
        Some((Country::Usa, clean))
    } else if canadian_postal_regex().is_match(&clean) {
        Some((Country::Can, clean))
    } else {
        None
    }
}

/// Infer country from an already-accepted zipcode: all digits means USA.
pub fn country_from_zipcode(zipcode: &str) -> Country {
    let clean: String = zipcode.chars().filter(|c| !c.is_whitespace()).collect();
    if !clean.is_empty() && clean.bytes().all(|b| b.is_ascii_digit()) {
        Country::Usa
    } else {
        Country::Can
    }
}

/// Extract the postal/ZIP code embedded in an OTA-format lineup id.
///
/// Canadian codes come back display-formatted ("J3B 1M4"); callers compare
/// and store them space-free.
pub fn extract_location_from_lineupid(lineupid: &str) -> Option<String> {
    let caps = ota_lineup_regex().captures(lineupid.trim())?;
    let country = caps[1].to_uppercase();
    let location = caps[2].to_uppercase();

    match country.as_str() {
        "CAN" if canadian_postal_regex().is_match(&location) => {
            Some(format!("{} {}", &location[..3], &location[3..]))
        }
        "USA" if location.len() == 5 && location.bytes().all(|b| b.is_ascii_digit()) => {
            Some(location)
        }
        _ => None,
    }
}

/// Enforce the zipcode/lineupid invariant.
///
/// A genuine conflict (both set, different locations) is fatal. A one-sided
/// gap (lineupid encodes a location, zipcode empty) is auto-merged and
/// reported as a change note.
pub fn check_consistency(
    settings: &mut Settings,
) -> Result<BTreeMap<String, String>, ConfigError> {
    let zipcode = settings.get_str("zipcode").trim().to_string();
    let lineupid = settings.str_or("lineupid", "auto").trim().to_string();
    let mut changes = BTreeMap::new();

    if lineupid.eq_ignore_ascii_case("auto") {
        return Ok(changes);
    }

    let Some(extracted) = extract_location_from_lineupid(&lineupid) else {
        return Ok(changes);
    };
    let clean_extracted = extracted.replace(' ', "").to_uppercase();

    if !zipcode.is_empty() {
        let clean_zipcode = zipcode.replace(' ', "").to_uppercase();
        if clean_extracted != clean_zipcode {
            tracing::error!("Configuration mismatch detected:");
            tracing::error!("  Configured zipcode: {}", zipcode);
            tracing::error!(
                "  LineupID contains: {} (extracted from {})",
                clean_extracted,
                lineupid
            );
            tracing::error!("  These must match for consistent operation");
            return Err(ConfigError::Consistency {
                zipcode,
                lineupid,
                extracted: clean_extracted,
            });
        }
        tracing::debug!(
            "Configuration consistency verified: zipcode \"{}\" matches lineupid \"{}\"",
            zipcode,
            lineupid
        );
    } else {
        // Lineupid carries a location but zipcode is empty: adopt it.
        settings.set_str("zipcode", clean_extracted.clone());
        changes.insert(
            "zipcode".to_string(),
            format!("(empty) → {} (extracted from {})", clean_extracted, lineupid),
        );
        tracing::info!(
            "Auto-extracted zipcode from lineupid: {} → {}",
            lineupid,
            clean_extracted
        );
    }

    Ok(changes)
}

/// Check required settings. Fatal when zipcode is missing, or when
/// auto-detection is requested with a zipcode in no recognized format.
pub fn check_required(settings: &Settings) -> Result<(), ConfigError> {
    let zipcode = settings.get_str("zipcode").trim();
    if zipcode.is_empty() {
        tracing::error!("Zipcode is required but not found in configuration");
        return Err(ConfigError::RequiredSetting(
            "Missing required zipcode in configuration".to_string(),
        ));
    }

    let lineupid = settings.str_or("lineupid", "auto").trim();
    if lineupid.eq_ignore_ascii_case("auto") && validate_postal_code(zipcode).is_none() {
        tracing::error!("Auto-detection (lineupid=auto) requires a valid ZIP/postal code");
        tracing::error!("Current zipcode: \"{}\"", zipcode);
        tracing::error!("Expected formats: US ZIP 90210, Canadian postal J3B1M4 or J3B 1M4");
        return Err(ConfigError::RequiredSetting(format!(
            "Invalid zipcode \"{}\" for auto-detection. Auto-detection requires a valid \
             US ZIP (12345) or Canadian postal (A1A1A1)",
            zipcode
        )));
    }

    Ok(())
}

/// Range-check the refresh window (0–168 hours). Non-fatal.
pub fn validate_refresh_hours(settings: &mut Settings) {
    let refresh = settings.str_or("refresh", "48").trim().to_string();
    match refresh.parse::<i64>() {
        Ok(hours) if (0..=168).contains(&hours) => {}
        Ok(hours) => {
            tracing::warn!("Invalid refresh hours {}, using default 48", hours);
            settings.set_str("refresh", "48");
        }
        Err(_) => {
            tracing::warn!("Invalid refresh setting \"{}\", using default 48", refresh);
            settings.set_str("refresh", "48");
        }
    }
}

/// A retention expression is a day count in [0, 3650] or a period word.
pub fn is_valid_retention_value(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    if let Ok(days) = value.parse::<i64>() {
        return (0..=3650).contains(&days);
    }
    matches!(
        value.to_lowercase().as_str(),
        "weekly" | "monthly" | "quarterly" | "unlimited"
    )
}

/// Validate the cache/retention settings, substituting defaults on
/// violations. Non-fatal by design.
pub fn validate_retention_policies(settings: &mut Settings) {
    let logrotate = settings.str_or("logrotate", "true").trim().to_lowercase();
    if matches!(
        logrotate.as_str(),
        "true" | "false" | "daily" | "weekly" | "monthly"
    ) {
        settings.set_str("logrotate", logrotate);
    } else {
        tracing::warn!("Invalid logrotate value \"{}\", using default \"true\"", logrotate);
        settings.set_str("logrotate", "true");
    }

    let relogs = settings.str_or("relogs", "30").trim().to_string();
    if !is_valid_retention_value(&relogs) {
        tracing::warn!("Invalid relogs value \"{}\", using default \"30\"", relogs);
        settings.set_str("relogs", "30");
    }

    let rexmltv = settings.str_or("rexmltv", "7").trim().to_string();
    if !is_valid_retention_value(&rexmltv) {
        tracing::warn!("Invalid rexmltv value \"{}\", using default \"7\"", rexmltv);
        settings.set_str("rexmltv", "7");
    }

    // Cache retention must cover the requested guide window.
    let days: u32 = settings.str_or("days", "1").trim().parse().unwrap_or(1);
    let redays = settings.str_or("redays", "").trim().to_string();
    if redays.is_empty() {
        // Absent entirely; inherit the guide window.
        settings.set_str("redays", days.to_string());
        return;
    }
    match redays.parse::<u32>() {
        Ok(redays) if redays >= days => {
            if redays > days * 3 {
                tracing::debug!(
                    "redays ({}) is much higher than days ({}) - see documentation for \
                     optimization tips",
                    redays,
                    days
                );
            }
        }
        Ok(redays) => {
            tracing::warn!(
                "redays ({}) must be >= days ({}), adjusting redays to {}",
                redays,
                days,
                days
            );
            settings.set_str("redays", days.to_string());
        }
        Err(_) => {
            tracing::warn!("Invalid redays value, setting to match days ({})", days);
            settings.set_str("redays", days.to_string());
        }
    }
}
