//! Validated settings map and type coercion.
//!
//! [`Settings`] is the in-memory form of the config file after coercion:
//! string settings stay strings, boolean settings become `bool`. Lookup order
//! is irrelevant here; canonical ordering only matters when serializing
//! (see [`super::writer`]).

use std::collections::BTreeMap;
use std::str::FromStr;

use super::schema::{SettingKey, ValueType};

/// A coerced setting value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Str(String),
    Bool(bool),
}

/// Parse a boolean from a config string.
/// Accepts true/1/yes/on (case-insensitive); everything else is false.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Coerce a raw value to the type the schema expects for `id`.
///
/// Unknown ids pass through as strings (they only exist transiently, before
/// migration removes them). A missing value coerces to the empty string.
pub fn coerce(id: &str, raw: Option<&str>) -> SettingValue {
    match SettingKey::from_str(id).map(|k| k.value_type()) {
        Ok(ValueType::Bool) => SettingValue::Bool(parse_bool(raw.unwrap_or(""))),
        _ => SettingValue::Str(raw.unwrap_or("").to_string()),
    }
}

/// The validated, internally consistent settings map.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: BTreeMap<String, SettingValue>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, value: SettingValue) {
        self.values.insert(id.into(), value);
    }

    pub fn set_str(&mut self, id: &str, value: impl Into<String>) {
        self.values.insert(id.to_string(), SettingValue::Str(value.into()));
    }

    pub fn set_bool(&mut self, id: &str, value: bool) {
        self.values.insert(id.to_string(), SettingValue::Bool(value));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&SettingValue> {
        self.values.get(id)
    }

    /// String value of a setting, or `""` when absent or boolean-typed.
    pub fn get_str(&self, id: &str) -> &str {
        match self.values.get(id) {
            Some(SettingValue::Str(s)) => s,
            _ => "",
        }
    }

    /// String value with a fallback for absent settings.
    pub fn str_or<'a>(&'a self, id: &str, default: &'a str) -> &'a str {
        match self.values.get(id) {
            Some(SettingValue::Str(s)) => s,
            _ => default,
        }
    }

    /// Boolean value of a setting; absent or string-typed settings are false.
    pub fn get_bool(&self, id: &str) -> bool {
        matches!(self.values.get(id), Some(SettingValue::Bool(true)))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Fill missing settings with schema defaults.
    ///
    /// Returns the (id, default) pairs that were actually added, so the
    /// caller can decide whether the file needs updating.
    pub fn fill_missing_defaults(&mut self) -> Vec<(String, String)> {
        let mut added = Vec::new();
        for key in SettingKey::all() {
            let Some(default) = key.default_value() else {
                continue;
            };
            if !self.values.contains_key(key.name()) {
                self.insert(key.name(), coerce(key.name(), Some(default)));
                added.push((key.name().to_string(), default.to_string()));
                tracing::debug!("Set default: {} = {}", key.name(), default);
            }
        }
        added
    }

    /// Explicit station list, or `None` when unfiltered.
    pub fn station_list(&self) -> Option<Vec<String>> {
        let slist = self.get_str("slist").trim();
        if slist.is_empty() {
            return None;
        }
        let stations: Vec<String> = slist
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        (!stations.is_empty()).then_some(stations)
    }

    /// True when either extended-details or extended-description is enabled.
    pub fn needs_extended_download(&self) -> bool {
        self.get_bool("xdetails") || self.get_bool("xdesc")
    }

    /// Cache refresh window in hours; falls back to 48 on unparsable values.
    pub fn refresh_hours(&self) -> u32 {
        match self.str_or("refresh", "48").trim().parse() {
            Ok(hours) => hours,
            Err(_) => {
                tracing::warn!("Invalid refresh setting, using default 48 hours");
                48
            }
        }
    }
}
