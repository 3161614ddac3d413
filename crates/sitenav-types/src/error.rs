//! Error types for sitenav.

use std::io;

/// Errors produced by the resource browser and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum SitenavError {
    #[error("invalid URL: {0}")]
    Url(String),

    #[error("site error: {0}")]
    Site(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("page error: {0}")]
    Page(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SitenavError {
    /// Messages of this error and every error in its `source()` chain,
    /// outermost first.
    pub fn chain(&self) -> Vec<String> {
        let mut out = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push(err.to_string());
            source = std::error::Error::source(err);
        }
        out
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SitenavError>;
