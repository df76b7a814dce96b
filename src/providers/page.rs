use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use url::Url;

use crate::providers::PageSource;

// @const: Inline script element with its body captured
static INLINE_SCRIPT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>(.*?)</script\s*>").unwrap()
});

/// A page whose HTML has already been rendered, e.g. saved from a browser
#[derive(Debug, Clone)]
pub struct StaticPage {
    url: String,
    html: String,
}

impl StaticPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    /// Load a saved page; its URL is the `file://` URL of the path
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let html = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read page: {}", path.display()))?;

        let url = tokio::fs::canonicalize(path)
            .await
            .ok()
            .and_then(|absolute| Url::from_file_path(absolute).ok())
            .map(|url| url.to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(url, html))
    }

    /// Bodies of all inline scripts in document order
    pub fn inline_scripts(&self) -> impl Iterator<Item = &str> {
        INLINE_SCRIPT_REGEX
            .captures_iter(&self.html)
            .filter_map(|caps| caps.get(1))
            .map(|body| body.as_str())
    }
}

#[async_trait]
impl PageSource for StaticPage {
    async fn inline_script(&self, prefix: &str) -> Result<Option<String>> {
        Ok(self
            .inline_scripts()
            .filter(|body| body.trim_start().starts_with(prefix))
            .last()
            .map(|body| body.trim_start().to_string()))
    }

    fn url(&self) -> String {
        self.url.clone()
    }
}
