//! XML parsing for the versioned settings file.
//!
//! Produces raw string settings in file order; type coercion happens later
//! in [`super::settings`]. This is the single place that understands the
//! version-specific value extraction rules.

use std::path::Path;

use crate::error::ConfigError;

use super::schema::SCHEMA_VERSION;

/// One setting as it appears in the file, before coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSetting {
    pub id: String,
    /// `None` for empty or self-closing elements.
    pub value: Option<String>,
}

/// Parse result: raw settings in file order plus the declared schema version.
#[derive(Debug, Clone)]
pub struct ParsedConfig {
    pub settings: Vec<RawSetting>,
    pub version: String,
}

impl ParsedConfig {
    /// File-order ids, used for the canonical-ordering check.
    pub fn order(&self) -> Vec<&str> {
        self.settings.iter().map(|s| s.id.as_str()).collect()
    }

    /// Raw value of a setting, if present in the file.
    pub fn get(&self, id: &str) -> Option<Option<&str>> {
        self.settings
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.value.as_deref())
    }
}

/// Parse the configuration file at `path`.
///
/// Fatal on malformed XML or a root element other than `<settings>`.
pub fn parse_file(path: &Path) -> Result<ParsedConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    parse_str(&contents).map_err(|reason| ConfigError::Parse {
        path: path.to_path_buf(),
        reason,
    })
}

/// Parse configuration XML from a string.
pub fn parse_str(xml: &str) -> Result<ParsedConfig, String> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| e.to_string())?;

    let root = doc.root_element();
    if root.tag_name().name() != "settings" {
        return Err(format!(
            "root element must be <settings>, found <{}>",
            root.tag_name().name()
        ));
    }

    // Missing version means a pre-versioning file; treat it as current.
    let version = root
        .attribute("version")
        .unwrap_or(SCHEMA_VERSION)
        .to_string();

    let mut settings = Vec::new();
    for node in root.children().filter(|n| n.is_element()) {
        if node.tag_name().name() != "setting" {
            continue;
        }
        let Some(id) = node.attribute("id") else {
            tracing::warn!("Ignoring <setting> element without id attribute");
            continue;
        };

        let value = extract_value(&node, &version);
        tracing::debug!("Config setting: {} = {:?}", id, value);
        settings.push(RawSetting {
            id: id.to_string(),
            value,
        });
    }

    Ok(ParsedConfig { settings, version })
}

/// Version-specific value extraction.
///
/// Version "2" stored the value as element text. Version 3 and later use a
/// `value` attribute with element text as a fallback; an empty string in
/// either place means "not set".
fn extract_value(node: &roxmltree::Node, version: &str) -> Option<String> {
    if version == "2" {
        return node.text().map(str::to_string).filter(|s| !s.is_empty());
    }
    node.attribute("value")
        .map(str::to_string)
        .or_else(|| node.text().map(str::to_string))
        .filter(|s| !s.is_empty())
}
