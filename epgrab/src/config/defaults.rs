//! Default configuration template and file locations.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Template written when no configuration file exists yet.
///
/// The sample zipcode gives first-run users a working file; the rest matches
/// the schema defaults except for the more generous `days`/`redays` of 7.
pub const DEFAULT_CONFIG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<settings version="5">
  <!-- Basic guide settings -->
  <setting id="zipcode">92101</setting>
  <setting id="lineupid">auto</setting>
  <setting id="days">7</setting>

  <!-- Station filtering -->
  <setting id="slist"></setting>
  <setting id="stitle">false</setting>

  <!-- Extended details and language detection -->
  <setting id="xdetails">true</setting>
  <setting id="xdesc">true</setting>
  <setting id="langdetect">true</setting>

  <!-- Display options -->
  <setting id="epgenre">3</setting>
  <setting id="epicon">1</setting>

  <!-- TVheadend integration -->
  <setting id="tvhoff">true</setting>
  <setting id="usern"></setting>
  <setting id="passw"></setting>
  <setting id="tvhurl">127.0.0.1</setting>
  <setting id="tvhport">9981</setting>
  <setting id="tvhmatch">true</setting>
  <setting id="chmatch">true</setting>

  <!-- Cache and retention policies -->
  <setting id="redays">7</setting>
  <setting id="refresh">48</setting>
  <setting id="logrotate">true</setting>
  <setting id="relogs">30</setting>
  <setting id="rexmltv">7</setting>
</settings>
"#;

/// Write the default template to `path`, creating parent directories.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    tracing::info!("Creating default configuration: {}", path.display());
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    Ok(())
}

/// Directory holding the grabber's config and state (~/.epgrab).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".epgrab")
}

/// Default configuration file path (~/.epgrab/epgrab.xml).
pub fn config_file_path() -> PathBuf {
    config_directory().join("epgrab.xml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_default_config_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/epgrab.xml");

        create_default_config(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("<settings version=\"5\">"));
        assert!(contents.contains("<setting id=\"zipcode\">92101</setting>"));
    }

    #[test]
    fn test_config_file_path_under_config_directory() {
        assert!(config_file_path().starts_with(config_directory()));
    }
}
