//! Static registry of recognized settings.
//!
//! Every setting the grabber understands is listed here exactly once, with
//! its expected value type, documented default, section grouping, and
//! canonical file ordering. The parser, validator, writer, and migrator all
//! consult this table; nothing else hard-codes setting names.

use std::str::FromStr;

/// Current schema version written to new and migrated files.
pub const SCHEMA_VERSION: &str = "5";

/// Expected value type for a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Str,
    Bool,
}

/// Named section of the config file, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    BasicGuide,
    StationFiltering,
    ExtendedDetails,
    DisplayOptions,
    Tvheadend,
    CacheRetention,
}

impl Section {
    /// Sections in the order they appear in the file.
    pub fn all() -> &'static [Section] {
        &[
            Section::BasicGuide,
            Section::StationFiltering,
            Section::ExtendedDetails,
            Section::DisplayOptions,
            Section::Tvheadend,
            Section::CacheRetention,
        ]
    }

    /// Comment header written above the section.
    pub fn title(&self) -> &'static str {
        match self {
            Section::BasicGuide => "Basic guide settings",
            Section::StationFiltering => "Station filtering",
            Section::ExtendedDetails => "Extended details and language detection",
            Section::DisplayOptions => "Display options",
            Section::Tvheadend => "TVheadend integration",
            Section::CacheRetention => "Cache and retention policies",
        }
    }
}

/// Recognized configuration settings.
///
/// Variant order is the canonical file order; [`SettingKey::all`] relies on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Zipcode,
    LineupId,
    Days,
    StationList,
    StationTitle,
    ExtendedDetails,
    ExtendedDescription,
    LangDetect,
    EpGenre,
    EpIcon,
    TvhOff,
    TvhUser,
    TvhPass,
    TvhUrl,
    TvhPort,
    TvhMatch,
    ChMatch,
    RetentionDays,
    RefreshHours,
    LogRotate,
    LogRetention,
    XmltvRetention,
}

impl SettingKey {
    /// All keys in canonical file order.
    pub fn all() -> &'static [SettingKey] {
        &[
            SettingKey::Zipcode,
            SettingKey::LineupId,
            SettingKey::Days,
            SettingKey::StationList,
            SettingKey::StationTitle,
            SettingKey::ExtendedDetails,
            SettingKey::ExtendedDescription,
            SettingKey::LangDetect,
            SettingKey::EpGenre,
            SettingKey::EpIcon,
            SettingKey::TvhOff,
            SettingKey::TvhUser,
            SettingKey::TvhPass,
            SettingKey::TvhUrl,
            SettingKey::TvhPort,
            SettingKey::TvhMatch,
            SettingKey::ChMatch,
            SettingKey::RetentionDays,
            SettingKey::RefreshHours,
            SettingKey::LogRotate,
            SettingKey::LogRetention,
            SettingKey::XmltvRetention,
        ]
    }

    /// The setting id as it appears in the XML file.
    pub fn name(&self) -> &'static str {
        match self {
            SettingKey::Zipcode => "zipcode",
            SettingKey::LineupId => "lineupid",
            SettingKey::Days => "days",
            SettingKey::StationList => "slist",
            SettingKey::StationTitle => "stitle",
            SettingKey::ExtendedDetails => "xdetails",
            SettingKey::ExtendedDescription => "xdesc",
            SettingKey::LangDetect => "langdetect",
            SettingKey::EpGenre => "epgenre",
            SettingKey::EpIcon => "epicon",
            SettingKey::TvhOff => "tvhoff",
            SettingKey::TvhUser => "usern",
            SettingKey::TvhPass => "passw",
            SettingKey::TvhUrl => "tvhurl",
            SettingKey::TvhPort => "tvhport",
            SettingKey::TvhMatch => "tvhmatch",
            SettingKey::ChMatch => "chmatch",
            SettingKey::RetentionDays => "redays",
            SettingKey::RefreshHours => "refresh",
            SettingKey::LogRotate => "logrotate",
            SettingKey::LogRetention => "relogs",
            SettingKey::XmltvRetention => "rexmltv",
        }
    }

    /// Expected value type after coercion.
    pub fn value_type(&self) -> ValueType {
        match self {
            SettingKey::StationTitle
            | SettingKey::ExtendedDetails
            | SettingKey::ExtendedDescription
            | SettingKey::LangDetect
            | SettingKey::TvhOff
            | SettingKey::TvhMatch
            | SettingKey::ChMatch => ValueType::Bool,
            _ => ValueType::Str,
        }
    }

    /// Default value used when filling a missing setting.
    ///
    /// `zipcode` has no default: it is required and never auto-filled.
    pub fn default_value(&self) -> Option<&'static str> {
        match self {
            SettingKey::Zipcode => None,
            SettingKey::LineupId => Some("auto"),
            SettingKey::Days => Some("1"),
            SettingKey::StationList => Some(""),
            SettingKey::StationTitle => Some("false"),
            SettingKey::ExtendedDetails => Some("true"),
            SettingKey::ExtendedDescription => Some("true"),
            SettingKey::LangDetect => Some("true"),
            SettingKey::EpGenre => Some("3"),
            SettingKey::EpIcon => Some("1"),
            SettingKey::TvhOff => Some("true"),
            SettingKey::TvhUser => Some(""),
            SettingKey::TvhPass => Some(""),
            SettingKey::TvhUrl => Some("127.0.0.1"),
            SettingKey::TvhPort => Some("9981"),
            SettingKey::TvhMatch => Some("true"),
            SettingKey::ChMatch => Some("true"),
            SettingKey::RetentionDays => Some("1"),
            SettingKey::RefreshHours => Some("48"),
            SettingKey::LogRotate => Some("true"),
            SettingKey::LogRetention => Some("30"),
            SettingKey::XmltvRetention => Some("7"),
        }
    }

    /// Section this key belongs to.
    pub fn section(&self) -> Section {
        match self {
            SettingKey::Zipcode | SettingKey::LineupId | SettingKey::Days => Section::BasicGuide,
            SettingKey::StationList | SettingKey::StationTitle => Section::StationFiltering,
            SettingKey::ExtendedDetails
            | SettingKey::ExtendedDescription
            | SettingKey::LangDetect => Section::ExtendedDetails,
            SettingKey::EpGenre | SettingKey::EpIcon => Section::DisplayOptions,
            SettingKey::TvhOff
            | SettingKey::TvhUser
            | SettingKey::TvhPass
            | SettingKey::TvhUrl
            | SettingKey::TvhPort
            | SettingKey::TvhMatch
            | SettingKey::ChMatch => Section::Tvheadend,
            SettingKey::RetentionDays
            | SettingKey::RefreshHours
            | SettingKey::LogRotate
            | SettingKey::LogRetention
            | SettingKey::XmltvRetention => Section::CacheRetention,
        }
    }

    /// Keys of one section, in section-internal order.
    pub fn in_section(section: Section) -> impl Iterator<Item = SettingKey> {
        Self::all().iter().copied().filter(move |k| k.section() == section)
    }

    /// Whether `id` names a recognized setting.
    pub fn is_valid(id: &str) -> bool {
        SettingKey::from_str(id).is_ok()
    }
}

impl FromStr for SettingKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::all()
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or(())
    }
}

/// Canonical ordering for an arbitrary set of valid ids: schema order first,
/// then anything outside the schema alphabetically.
pub fn canonical_order<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let present: Vec<String> = ids.map(str::to_string).collect();
    let mut ordered: Vec<String> = SettingKey::all()
        .iter()
        .map(|k| k.name().to_string())
        .filter(|name| present.iter().any(|id| id == name))
        .collect();
    let mut extras: Vec<String> = present
        .into_iter()
        .filter(|id| !SettingKey::is_valid(id))
        .collect();
    extras.sort();
    ordered.extend(extras);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_keys_round_trip_names() {
        for key in SettingKey::all() {
            assert_eq!(key.name().parse::<SettingKey>().unwrap(), *key);
        }
    }

    #[test]
    fn test_zipcode_has_no_default() {
        assert!(SettingKey::Zipcode.default_value().is_none());
        for key in SettingKey::all().iter().filter(|k| **k != SettingKey::Zipcode) {
            assert!(key.default_value().is_some(), "{} missing default", key.name());
        }
    }

    #[test]
    fn test_sections_cover_every_key() {
        let mut count = 0;
        for section in Section::all() {
            count += SettingKey::in_section(*section).count();
        }
        assert_eq!(count, SettingKey::all().len());
    }

    #[test]
    fn test_canonical_order_puts_extras_last_alphabetically() {
        let ids = ["zulu", "days", "alpha", "zipcode"];
        let ordered = canonical_order(ids.iter().copied());
        assert_eq!(ordered, vec!["zipcode", "days", "alpha", "zulu"]);
    }
}
