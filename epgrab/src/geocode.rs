//! Postal-code geocoding behind a narrow adapter trait.
//!
//! Lineup auto-detection only needs `(city, province)` for a postal code.
//! The [`PostalGeocoder`] trait is the seam for whatever backing data source
//! provides that; [`LocationResolver`] layers caching, the Canadian partial
//! retry, and the city-name hierarchy on top so backends stay dumb.

use std::collections::HashMap;

use crate::lineup::Country;

/// One geocoding record for a postal code. Fields mirror common postal
/// datasets; any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostalRecord {
    pub place_name: Option<String>,
    pub community_name: Option<String>,
    pub county_name: Option<String>,
    pub state_code: Option<String>,
    pub state_name: Option<String>,
}

impl PostalRecord {
    /// True when the record carries no usable location fields.
    pub fn is_blank(&self) -> bool {
        field(&self.place_name).is_none()
            && field(&self.state_code).is_none()
            && field(&self.state_name).is_none()
    }
}

/// Backend lookup for postal-code records. `postal` is space-free uppercase.
pub trait PostalGeocoder {
    fn lookup(&self, postal: &str, country: Country) -> Option<PostalRecord>;
}

/// Backend that never resolves anything. Auto-detection then degrades to
/// manual lookup instructions.
pub struct NoopGeocoder;

impl PostalGeocoder for NoopGeocoder {
    fn lookup(&self, _postal: &str, _country: Country) -> Option<PostalRecord> {
        None
    }
}

/// Caching resolver from postal code to `(city, province_code)`.
pub struct LocationResolver {
    geocoder: Box<dyn PostalGeocoder>,
    cache: HashMap<(String, Country), Option<(String, String)>>,
    debug: bool,
}

impl LocationResolver {
    /// `debug` mirrors resolution steps to stdout for interactive lineup
    /// testing; normal operation logs at debug level instead.
    pub fn new(geocoder: Box<dyn PostalGeocoder>, debug: bool) -> Self {
        Self {
            geocoder,
            cache: HashMap::new(),
            debug,
        }
    }

    /// Resolve a postal code to `(city, province_code)`.
    ///
    /// Canadian codes retry with the 3-character forward sortation area when
    /// the full code finds nothing. Failures are cached so repeated lookups
    /// of an unresolvable code stay cheap.
    pub fn resolve_location(
        &mut self,
        postal_code: &str,
        country: Country,
    ) -> Option<(String, String)> {
        let clean: String = postal_code.replace(' ', "").to_uppercase();
        let cache_key = (clean.clone(), country);
        if let Some(cached) = self.cache.get(&cache_key) {
            self.debug_log(&format!(
                "Using cached result for {}_{}: {:?}",
                clean,
                country.as_str(),
                cached
            ));
            return cached.clone();
        }

        self.debug_log(&format!("Querying geocoder for {}", clean));
        let mut record = self
            .geocoder
            .lookup(&clean, country)
            .filter(|r| !r.is_blank());

        // Canadian full codes are sparse in postal datasets; the forward
        // sortation area (first 3 characters) usually resolves.
        if record.is_none() && country == Country::Can && clean.len() >= 3 {
            let partial = &clean[..3];
            self.debug_log(&format!(
                "Full code failed, trying partial code: {}",
                partial
            ));
            record = self
                .geocoder
                .lookup(partial, country)
                .filter(|r| !r.is_blank());
        }

        let resolved = record.and_then(|r| {
            let city = extract_city(&r, country)?;
            let province = field(&r.state_code)?;
            self.debug_log(&format!("Resolved - city: {}, province: {}", city, province));
            Some((city, province))
        });

        if resolved.is_none() {
            self.debug_log(&format!("Location resolution failed for {}", clean));
        }
        self.cache.insert(cache_key, resolved.clone());
        resolved
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    fn debug_log(&self, message: &str) {
        if self.debug {
            println!("DEBUG: {}", message);
        } else {
            tracing::debug!("{}", message);
        }
    }
}

/// Pick the most generic city name the record offers.
///
/// Canada: community_name, then county_name, then a cleaned place_name.
/// USA: place_name is usually already generic, county_name as fallback.
fn extract_city(record: &PostalRecord, country: Country) -> Option<String> {
    match country {
        Country::Can => field(&record.community_name)
            .or_else(|| field(&record.county_name))
            .or_else(|| field(&record.place_name).map(|p| generic_city_name(&p))),
        Country::Usa => field(&record.place_name).or_else(|| field(&record.county_name)),
    }
}

/// Strip neighbourhood qualifiers from a detailed place name, e.g.
/// "Edmonton (North Downtown)" or "Saint-Jean-sur-Richelieu Central".
fn generic_city_name(city: &str) -> String {
    let mut name = match city.split_once('(') {
        Some((prefix, _)) => prefix.trim(),
        None => city.trim(),
    };

    const DIRECTIONAL_SUFFIXES: &[&str] = &[
        " East",
        " West",
        " North",
        " South",
        " Central",
        " Northeast",
        " Northwest",
        " Southeast",
        " Southwest",
        " Downtown",
        " Uptown",
        " Midtown",
    ];
    for suffix in DIRECTIONAL_SUFFIXES {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped.trim_end();
            break;
        }
    }
    name.to_string()
}

/// Normalize an optional field: trimmed, non-empty, not a dataset NaN marker.
fn field(value: &Option<String>) -> Option<String> {
    let value = value.as_deref()?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") || value.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scripted backend keyed by exact postal code.
    struct ScriptedGeocoder {
        responses: HashMap<String, PostalRecord>,
    }

    impl ScriptedGeocoder {
        fn new(responses: impl IntoIterator<Item = (&'static str, PostalRecord)>) -> Self {
            Self {
                responses: responses
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            }
        }
    }

    impl PostalGeocoder for ScriptedGeocoder {
        fn lookup(&self, postal: &str, _country: Country) -> Option<PostalRecord> {
            self.responses.get(postal).cloned()
        }
    }

    fn can_record(community: &str, state: &str) -> PostalRecord {
        PostalRecord {
            community_name: Some(community.to_string()),
            state_code: Some(state.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_uses_community_name_for_canada() {
        let geocoder = ScriptedGeocoder::new([("J3B1M4", can_record("Montérégie", "QC"))]);
        let mut resolver = LocationResolver::new(Box::new(geocoder), false);

        assert_eq!(
            resolver.resolve_location("j3b 1m4", Country::Can),
            Some(("Montérégie".to_string(), "QC".to_string()))
        );
    }

    #[test]
    fn test_resolve_retries_canadian_partial_code() {
        let geocoder = ScriptedGeocoder::new([("J3B", can_record("Saint-Jean", "QC"))]);
        let mut resolver = LocationResolver::new(Box::new(geocoder), false);

        assert_eq!(
            resolver.resolve_location("J3B1M4", Country::Can),
            Some(("Saint-Jean".to_string(), "QC".to_string()))
        );
    }

    #[test]
    fn test_resolve_usa_prefers_place_name_no_partial_retry() {
        let geocoder = ScriptedGeocoder::new([(
            "90210",
            PostalRecord {
                place_name: Some("Beverly Hills".to_string()),
                state_code: Some("CA".to_string()),
                ..Default::default()
            },
        )]);
        let mut resolver = LocationResolver::new(Box::new(geocoder), false);

        assert_eq!(
            resolver.resolve_location("90210", Country::Usa),
            Some(("Beverly Hills".to_string(), "CA".to_string()))
        );

        let geocoder = ScriptedGeocoder::new([]);
        let mut resolver = LocationResolver::new(Box::new(geocoder), false);
        assert_eq!(resolver.resolve_location("99999", Country::Usa), None);
    }

    #[test]
    fn test_failures_are_cached() {
        let geocoder = ScriptedGeocoder::new([]);
        let mut resolver = LocationResolver::new(Box::new(geocoder), false);

        assert_eq!(resolver.resolve_location("90210", Country::Usa), None);
        assert_eq!(resolver.resolve_location("90210", Country::Usa), None);
        assert_eq!(resolver.cache_size(), 1);
    }

    #[test]
    fn test_blank_and_nan_records_do_not_resolve() {
        let geocoder = ScriptedGeocoder::new([(
            "90210",
            PostalRecord {
                place_name: Some("nan".to_string()),
                state_code: Some("NaN".to_string()),
                ..Default::default()
            },
        )]);
        let mut resolver = LocationResolver::new(Box::new(geocoder), false);
        assert_eq!(resolver.resolve_location("90210", Country::Usa), None);
    }

    #[test]
    fn test_generic_city_name_cleanup() {
        assert_eq!(generic_city_name("Edmonton (North Downtown)"), "Edmonton");
        assert_eq!(
            generic_city_name("Saint-Jean-sur-Richelieu Central"),
            "Saint-Jean-sur-Richelieu"
        );
        assert_eq!(generic_city_name("Calgary"), "Calgary");
    }
}
