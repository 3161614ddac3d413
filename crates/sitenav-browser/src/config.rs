//! Browser configuration.
//!
//! Every field has a default, so a TOML file only needs the keys it
//! changes:
//!
//! ```toml
//! home_url = "file://local/"
//!
//! [extensions]
//! text = ["txt", "md", "log"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use sitenav_types::error::{Result, SitenavError};

use crate::url::Url;

/// Extension lists that drive page-type selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionTable {
    pub image: Vec<String>,
    pub archive: Vec<String>,
    pub sound: Vec<String>,
    pub text: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ExtensionTable {
    fn default() -> Self {
        Self {
            image: strings(&["jpg", "jpeg", "gif", "png"]),
            archive: strings(&["zip", "jar", "tar"]),
            sound: strings(&["wav", "snd", "mp3", "m4a"]),
            text: strings(&["txt", "md", "java", "rs", "toml", "json", "csv", "log"]),
        }
    }
}

/// Top-level browser configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Page shown by `Browser::go_home`.
    pub home_url: String,
    /// Name given to loader threads.
    pub loader_thread_name: String,
    /// First line of every exception page.
    pub console_header: String,
    pub extensions: ExtensionTable,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            home_url: "mem://demo/".to_string(),
            loader_thread_name: "sitenav-loader".to_string(),
            console_header: format!(
                "sitenav Exception Console, version {}",
                env!("CARGO_PKG_VERSION")
            ),
            extensions: ExtensionTable::default(),
        }
    }
}

impl BrowserConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: BrowserConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML text.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SitenavError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        Url::parse(&self.home_url)
            .map_err(|e| SitenavError::Config(format!("home_url: {e}")))?;
        if self.loader_thread_name.is_empty() {
            return Err(SitenavError::Config(
                "loader_thread_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BrowserConfig::default();
        assert_eq!(config.home_url, "mem://demo/");
        assert_eq!(config.loader_thread_name, "sitenav-loader");
        assert!(config.console_header.starts_with("sitenav Exception Console"));
        assert!(config.extensions.image.contains(&"png".to_string()));
        assert!(config.extensions.archive.contains(&"jar".to_string()));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = BrowserConfig::from_toml_str(
            r#"
            home_url = "file://local/index.txt"

            [extensions]
            text = ["log"]
            "#,
        )
        .unwrap();
        assert_eq!(config.home_url, "file://local/index.txt");
        assert_eq!(config.extensions.text, vec!["log".to_string()]);
        assert_eq!(config.extensions.image, ExtensionTable::default().image);
        assert_eq!(config.loader_thread_name, "sitenav-loader");
    }

    #[test]
    fn invalid_home_url_rejected() {
        let err = BrowserConfig::from_toml_str(r#"home_url = "not a url""#).unwrap_err();
        assert!(err.to_string().contains("home_url"));
    }

    #[test]
    fn malformed_toml_rejected() {
        let err = BrowserConfig::from_toml_str("home_url = [").unwrap_err();
        assert!(matches!(err, SitenavError::TomlParse(_)));
    }

    #[test]
    fn toml_round_trip() {
        let config = BrowserConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(BrowserConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitenav.toml");
        std::fs::write(&path, "loader_thread_name = \"fetch\"\n").unwrap();
        let config = BrowserConfig::load(&path).unwrap();
        assert_eq!(config.loader_thread_name, "fetch");
    }
}
