//! Lineup id normalization, auto-detection, and listing-site URL generation.
//!
//! Lineup ids come in three shapes: `auto` (detect from the zipcode), the
//! listing-site form (`CAN-OTAJ3B1M4`), and the complete API form
//! (`CAN-OTAJ3B1M4-DEFAULT`, `CAN-0005993-X`). Normalization always produces
//! the API form; everything else here derives from it.

use std::sync::OnceLock;

use chrono::{Local, TimeZone, Timelike};
use regex::Regex;

use crate::geocode::LocationResolver;

/// Supported guide regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Country {
    Usa,
    Can,
}

impl Country {
    /// Wire form used in lineup ids and API parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Country::Usa => "USA",
            Country::Can => "CAN",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            Country::Usa => "United States",
            Country::Can => "Canada",
        }
    }

    /// Listing-site root for manual lineup lookup.
    pub fn listing_site(&self) -> &'static str {
        match self {
            Country::Usa => "https://www.tvtv.us/",
            Country::Can => "https://www.tvtv.ca/",
        }
    }
}

/// Receiver type encoded in the lineup id suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// Over-the-air broadcast.
    Ota,
    /// Cable or satellite provider.
    CableSatellite,
}

impl DeviceType {
    /// Wire form used in the `device` API parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Ota => "-",
            DeviceType::CableSatellite => "X",
        }
    }
}

/// Resolved lineup identity derived from the configured lineupid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineupConfig {
    /// Complete API-form lineup id.
    pub lineup_id: String,
    /// Always the literal string `lineupId`; the API expects it verbatim.
    pub headend_id: &'static str,
    pub device_type: DeviceType,
    pub description: String,
    /// True when the id was generated from the zipcode rather than configured.
    pub auto_detected: bool,
    /// The configured value before normalization.
    pub original_config: String,
    pub country: Country,
    pub postal_code: String,
}

/// How the listing-site URL for an auto-detected lineup was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationStatus {
    /// City and province resolved; the URL points at the exact lineup page.
    AutoResolved,
    /// Resolution failed; the URL is the bare listing site for manual lookup.
    UnableToResolve,
}

/// Auto-detected lineup ids plus the listing-site URL for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoLineupConfig {
    /// Listing-site form (no `-DEFAULT` suffix).
    pub tvtv_lineup_id: String,
    /// Complete API form.
    pub api_lineup_id: String,
    pub tvtv_url: String,
    pub country: Country,
    pub postal_code: String,
    pub resolved_city: Option<String>,
    pub resolved_province: Option<String>,
    pub location_status: LocationStatus,
}

/// Normalize a configured lineupid to the complete API form.
pub fn normalize_lineup_id(lineupid: &str, country: Country, postal_code: &str) -> String {
    let lineupid = lineupid.trim();
    if lineupid.is_empty() || lineupid.eq_ignore_ascii_case("auto") {
        format!("{}-OTA{}-DEFAULT", country.as_str(), postal_code)
    } else if !lineupid.ends_with("-DEFAULT") && !lineupid.ends_with("-X") {
        // Listing-site form; the API wants the -DEFAULT suffix.
        format!("{}-DEFAULT", lineupid)
    } else {
        lineupid.to_string()
    }
}

/// Detect the receiver type from a normalized lineup id.
pub fn detect_device_type(lineup_id: &str) -> DeviceType {
    if lineup_id.contains("OTA") {
        DeviceType::Ota
    } else if lineup_id.ends_with("-X") {
        DeviceType::CableSatellite
    } else {
        DeviceType::Ota
    }
}

/// Human-readable description for a normalized lineup id.
pub fn generate_description(lineup_id: &str, country: Country) -> String {
    let country_name = country.full_name();
    if lineup_id.contains("OTA") {
        format!("Local Over the Air Broadcast ({})", country_name)
    } else if lineup_id.ends_with("-X") {
        format!("Cable/Satellite Provider ({})", country_name)
    } else {
        format!("TV Lineup ({})", country_name)
    }
}

/// Resolve the full lineup identity for a configured lineupid.
pub fn lineup_config(lineupid: &str, postal_code: &str, country: Country) -> LineupConfig {
    let auto_detected = lineupid.trim().is_empty() || lineupid.trim().eq_ignore_ascii_case("auto");
    let lineup_id = normalize_lineup_id(lineupid, country, postal_code);
    let device_type = detect_device_type(&lineup_id);
    let description = generate_description(&lineup_id, country);

    if auto_detected {
        tracing::info!("Auto-detected lineupID: {} → {}", lineupid, lineup_id);
    } else {
        tracing::info!("Normalized lineupID: {} → {}", lineupid, lineup_id);
    }
    tracing::debug!(
        "Lineup details: device={}, description='{}'",
        device_type.as_str(),
        description
    );

    LineupConfig {
        lineup_id,
        headend_id: "lineupId",
        device_type,
        description,
        auto_detected,
        original_config: lineupid.to_string(),
        country,
        postal_code: postal_code.to_string(),
    }
}

/// Auto-detect the OTA lineup for a postal code, with a best-effort direct
/// listing-site URL. Resolution failure degrades to the bare site root.
pub fn auto_lineup_config(
    resolver: &mut LocationResolver,
    postal_code: &str,
    country: Country,
) -> AutoLineupConfig {
    tracing::debug!(
        "Attempting automatic resolution for {}, {}",
        postal_code,
        country.as_str()
    );

    let tvtv_lineup_id = format!("{}-OTA{}", country.as_str(), postal_code);
    let api_lineup_id = format!("{}-DEFAULT", tvtv_lineup_id);

    let resolved = resolver.resolve_location(postal_code, country);

    let (tvtv_url, status, city, province) = match resolved {
        Some((city, province)) => {
            let province_url = province.to_lowercase();
            let city_url = city_url_slug(&city);
            let postal_for_url = match country {
                Country::Can => postal_code.to_lowercase().replace(' ', ""),
                Country::Usa => postal_code.to_string(),
            };
            let url = format!(
                "{}{}/{}/{}/lu{}",
                country.listing_site(),
                province_url,
                city_url,
                postal_for_url,
                tvtv_lineup_id
            );
            tracing::debug!("Resolution successful - {}, {} → {}", city, province, url);
            (url, LocationStatus::AutoResolved, Some(city), Some(province))
        }
        None => {
            tracing::debug!(
                "Unable to resolve location for {} - manual lookup required",
                postal_code
            );
            (
                country.listing_site().to_string(),
                LocationStatus::UnableToResolve,
                None,
                None,
            )
        }
    };

    AutoLineupConfig {
        tvtv_lineup_id,
        api_lineup_id,
        tvtv_url,
        country,
        postal_code: postal_code.to_string(),
        resolved_city: city,
        resolved_province: province,
        location_status: status,
    }
}

/// Guide grid API URL for verifying a lineup.
///
/// `timestamp` defaults to the current time aligned down to a 3-hour block
/// (0, 3, 6, ... 21 local), matching the service's grid granularity.
pub fn grid_api_url(config: &AutoLineupConfig, timestamp: Option<i64>) -> String {
    let timestamp = timestamp.unwrap_or_else(current_block_timestamp);
    format!(
        "https://tvlistings.gracenote.com/api/grid?aid=orbebb&country={}&postalCode={}&time={}&timespan=3&isOverride=true&userId=-&lineupId={}&headendId=lineupId",
        config.country.as_str(),
        config.postal_code,
        timestamp,
        config.api_lineup_id
    )
}

/// Current local time aligned down to the enclosing 3-hour block, as a Unix
/// timestamp.
pub fn current_block_timestamp() -> i64 {
    let now = Local::now();
    let block_hour = (now.hour() / 3) * 3;
    now.date_naive()
        .and_hms_opt(block_hour, 0, 0)
        .and_then(|dt| Local.from_local_datetime(&dt).single())
        .map(|dt| dt.timestamp())
        .unwrap_or_else(|| now.timestamp())
}

/// Slugify a city name for listing-site URLs: lowercase, spaces and
/// apostrophes to hyphens, accents folded, everything else stripped.
pub fn city_url_slug(city: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    static INVALID: OnceLock<Regex> = OnceLock::new();
    static HYPHEN_RUNS: OnceLock<Regex> = OnceLock::new();

    let separators =
        SEPARATORS.get_or_init(|| Regex::new(r"['\s]+").expect("valid separator pattern"));
    let invalid = INVALID.get_or_init(|| Regex::new(r"[^a-z0-9-]").expect("valid strip pattern"));
    let hyphen_runs = HYPHEN_RUNS.get_or_init(|| Regex::new(r"-+").expect("valid hyphen pattern"));

    let lowered = city.to_lowercase();
    let hyphenated = separators.replace_all(&lowered, "-");
    let folded = fold_accents(&hyphenated);
    let stripped = invalid.replace_all(&folded, "");
    let collapsed = hyphen_runs.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}

/// Fold the accented characters that appear in Canadian place names.
fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' => 'a',
            'è' | 'é' | 'ê' | 'ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
            'ù' | 'ú' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Display form of a postal code: Canadian codes get their space back.
pub fn format_postal_for_display(postal_code: &str, country: Country) -> String {
    if country == Country::Can && postal_code.len() == 6 {
        format!("{} {}", &postal_code[..3], &postal_code[3..])
    } else {
        postal_code.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::{NoopGeocoder, PostalGeocoder, PostalRecord};

    struct FixedGeocoder;

    impl PostalGeocoder for FixedGeocoder {
        fn lookup(&self, _postal: &str, _country: Country) -> Option<PostalRecord> {
            Some(PostalRecord {
                place_name: Some("Saint-Jean-sur-Richelieu".to_string()),
                community_name: Some("Montérégie".to_string()),
                county_name: None,
                state_code: Some("QC".to_string()),
                state_name: Some("Quebec".to_string()),
            })
        }
    }

    #[test]
    fn test_normalize_lineup_id_forms() {
        assert_eq!(
            normalize_lineup_id("auto", Country::Can, "J3B1M4"),
            "CAN-OTAJ3B1M4-DEFAULT"
        );
        assert_eq!(
            normalize_lineup_id("", Country::Usa, "90210"),
            "USA-OTA90210-DEFAULT"
        );
        // Listing-site form gets the API suffix
        assert_eq!(
            normalize_lineup_id("CAN-OTAJ3B1M4", Country::Can, "J3B1M4"),
            "CAN-OTAJ3B1M4-DEFAULT"
        );
        // Complete forms pass through
        assert_eq!(
            normalize_lineup_id("CAN-OTAJ3B1M4-DEFAULT", Country::Can, "J3B1M4"),
            "CAN-OTAJ3B1M4-DEFAULT"
        );
        assert_eq!(
            normalize_lineup_id("CAN-0005993-X", Country::Can, "J3B1M4"),
            "CAN-0005993-X"
        );
    }

    #[test]
    fn test_detect_device_type() {
        assert_eq!(detect_device_type("CAN-OTAJ3B1M4-DEFAULT"), DeviceType::Ota);
        assert_eq!(
            detect_device_type("CAN-0005993-X"),
            DeviceType::CableSatellite
        );
        assert_eq!(detect_device_type("USA-1234567-DEFAULT"), DeviceType::Ota);
    }

    #[test]
    fn test_lineup_config_marks_auto_detection() {
        let config = lineup_config("auto", "90210", Country::Usa);
        assert!(config.auto_detected);
        assert_eq!(config.lineup_id, "USA-OTA90210-DEFAULT");
        assert_eq!(config.headend_id, "lineupId");
        assert_eq!(config.original_config, "auto");

        let config = lineup_config("CAN-0005993-X", "J3B1M4", Country::Can);
        assert!(!config.auto_detected);
        assert_eq!(config.description, "Cable/Satellite Provider (Canada)");
    }

    #[test]
    fn test_city_url_slug() {
        assert_eq!(city_url_slug("San Diego"), "san-diego");
        assert_eq!(
            city_url_slug("Saint-Jean-sur-Richelieu"),
            "saint-jean-sur-richelieu"
        );
        assert_eq!(city_url_slug("Montréal"), "montreal");
        assert_eq!(city_url_slug("L'Île-Perrot"), "l-ile-perrot");
        assert_eq!(city_url_slug("Québec City (Centre)"), "quebec-city-centre");
        assert_eq!(city_url_slug("  "), "");
    }

    #[test]
    fn test_auto_lineup_resolved_builds_direct_url() {
        let mut resolver = LocationResolver::new(Box::new(FixedGeocoder), false);
        let config = auto_lineup_config(&mut resolver, "J3B1M4", Country::Can);

        assert_eq!(config.tvtv_lineup_id, "CAN-OTAJ3B1M4");
        assert_eq!(config.api_lineup_id, "CAN-OTAJ3B1M4-DEFAULT");
        assert_eq!(config.location_status, LocationStatus::AutoResolved);
        assert_eq!(
            config.tvtv_url,
            "https://www.tvtv.ca/qc/monteregie/j3b1m4/luCAN-OTAJ3B1M4"
        );
    }

    #[test]
    fn test_auto_lineup_unresolved_degrades_to_site_root() {
        let mut resolver = LocationResolver::new(Box::new(NoopGeocoder), false);
        let config = auto_lineup_config(&mut resolver, "90210", Country::Usa);

        assert_eq!(config.location_status, LocationStatus::UnableToResolve);
        assert_eq!(config.tvtv_url, "https://www.tvtv.us/");
        assert!(config.resolved_city.is_none());
    }

    #[test]
    fn test_grid_api_url_parameters() {
        let mut resolver = LocationResolver::new(Box::new(NoopGeocoder), false);
        let config = auto_lineup_config(&mut resolver, "90210", Country::Usa);
        let url = grid_api_url(&config, Some(1_700_000_000));

        assert!(url.starts_with("https://tvlistings.gracenote.com/api/grid?"));
        assert!(url.contains("country=USA"));
        assert!(url.contains("postalCode=90210"));
        assert!(url.contains("time=1700000000"));
        assert!(url.contains("lineupId=USA-OTA90210-DEFAULT"));
        assert!(url.contains("headendId=lineupId"));
    }

    #[test]
    fn test_format_postal_for_display() {
        assert_eq!(format_postal_for_display("J3B1M4", Country::Can), "J3B 1M4");
        assert_eq!(format_postal_for_display("90210", Country::Usa), "90210");
    }
}
