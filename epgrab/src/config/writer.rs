//! Canonical XML serialization for the settings file.
//!
//! Renders a deterministic document: fixed declaration, `<settings
//! version="5">`, settings grouped into the schema sections with one comment
//! header each, then an alphabetical "Other settings" tail for anything
//! outside the schema. Empty values render as empty elements.
//!
//! `write_clean_config` overwrites the file in place. Callers that care about
//! the previous contents must back the file up first (the migrator does); a
//! crash mid-write can truncate the file, which is acceptable because a
//! backup always precedes a mutating write.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use crate::error::ConfigError;

use super::schema::{Section, SettingKey, SCHEMA_VERSION};

/// Serialize `settings` (id → file string) to canonical XML.
pub fn to_config_string(settings: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    let _ = writeln!(out, "<settings version=\"{}\">", SCHEMA_VERSION);

    let mut written: Vec<&str> = Vec::new();

    for section in Section::all() {
        let section_keys: Vec<SettingKey> = SettingKey::in_section(*section)
            .filter(|k| settings.contains_key(k.name()))
            .collect();
        if section_keys.is_empty() {
            continue;
        }

        let _ = writeln!(out, "\n  <!-- {} -->", section.title());
        for key in section_keys {
            write_setting(&mut out, key.name(), &settings[key.name()]);
            written.push(key.name());
        }
    }

    // Anything outside the known schema, alphabetically.
    let mut extras: Vec<&str> = settings
        .keys()
        .map(String::as_str)
        .filter(|id| !written.contains(id))
        .collect();
    extras.sort_unstable();

    if !extras.is_empty() {
        out.push_str("\n  <!-- Other settings -->\n");
        for id in extras {
            write_setting(&mut out, id, &settings[id]);
        }
    }

    out.push_str("</settings>\n");
    out
}

/// Render the canonical document and overwrite `path`.
pub fn write_clean_config(
    path: &Path,
    settings: &BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, to_config_string(settings))?;
    Ok(())
}

fn write_setting(out: &mut String, id: &str, value: &str) {
    if value.trim().is_empty() {
        let _ = writeln!(out, "  <setting id=\"{}\"></setting>", escape_xml(id));
    } else {
        let _ = writeln!(
            out,
            "  <setting id=\"{}\">{}</setting>",
            escape_xml(id),
            escape_xml(value)
        );
    }
}

/// Minimal XML text/attribute escaping.
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parser::parse_str;

    fn sample_settings() -> BTreeMap<String, String> {
        [
            ("zipcode", "92101"),
            ("lineupid", "auto"),
            ("days", "7"),
            ("slist", ""),
            ("logrotate", "weekly"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_output_is_deterministic_and_sectioned() {
        let settings = sample_settings();
        let a = to_config_string(&settings);
        let b = to_config_string(&settings);
        assert_eq!(a, b);

        assert!(a.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n"));
        assert!(a.contains("<settings version=\"5\">"));
        assert!(a.contains("<!-- Basic guide settings -->"));
        assert!(a.contains("<!-- Cache and retention policies -->"));
        // zipcode before days, per canonical order
        let zip = a.find("id=\"zipcode\"").unwrap();
        let days = a.find("id=\"days\"").unwrap();
        assert!(zip < days);
    }

    #[test]
    fn test_empty_values_render_as_empty_elements() {
        let a = to_config_string(&sample_settings());
        assert!(a.contains("<setting id=\"slist\"></setting>"));
    }

    #[test]
    fn test_unknown_ids_go_to_other_settings_alphabetically() {
        let mut settings = sample_settings();
        settings.insert("zeta".to_string(), "2".to_string());
        settings.insert("alpha".to_string(), "1".to_string());

        let a = to_config_string(&settings);
        let other = a.find("<!-- Other settings -->").unwrap();
        let alpha = a.find("id=\"alpha\"").unwrap();
        let zeta = a.find("id=\"zeta\"").unwrap();
        assert!(other < alpha && alpha < zeta);
    }

    #[test]
    fn test_values_are_escaped() {
        let mut settings = BTreeMap::new();
        settings.insert("usern".to_string(), "a<b>&\"c\"".to_string());
        let a = to_config_string(&settings);
        assert!(a.contains("a&lt;b&gt;&amp;&quot;c&quot;"));
    }

    #[test]
    fn test_round_trip_preserves_values() {
        let settings = sample_settings();
        let parsed = parse_str(&to_config_string(&settings)).unwrap();

        for (id, value) in &settings {
            let expected = if value.is_empty() { None } else { Some(value.as_str()) };
            assert_eq!(parsed.get(id), Some(expected), "setting {id}");
        }
        assert_eq!(parsed.settings.len(), settings.len());
    }
}
