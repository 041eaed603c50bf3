// Serving configuration module
// Immutable, validated settings shared by every request

use super::types::{CacheSetting, GzipSetting, ServeSection};
use crate::http::cache::{cache_control_value, DEFAULT_MAX_AGE};
use crate::http::HeaderSet;
use hyper::header::{CACHE_CONTROL, SERVER};
use regex::Regex;

/// Container used when neither the request nor the configuration names one
pub const DEFAULT_CONTAINER: &str = "nodefiles";

/// Default `Server` identification
pub fn default_server_info() -> String {
    format!("blobserve/{}", crate::VERSION)
}

/// When to substitute a precompressed `.gz` sibling
#[derive(Debug, Clone, Default)]
pub enum GzipPolicy {
    #[default]
    Off,
    On,
    /// Enabled for content types matching the pattern
    Matching(Regex),
}

impl GzipPolicy {
    /// Whether gzip variants may be served for `content_type`
    pub fn allows(&self, content_type: &str) -> bool {
        match self {
            Self::Off => false,
            Self::On => true,
            Self::Matching(pattern) => pattern.is_match(content_type),
        }
    }
}

/// Serving configuration, fixed at construction
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub container: String,
    /// `Cache-Control` max-age; `None` disables the header
    pub cache: Option<u32>,
    /// Statically configured custom headers
    pub headers: HeaderSet,
    pub gzip: GzipPolicy,
    pub server_info: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            container: DEFAULT_CONTAINER.to_string(),
            cache: Some(DEFAULT_MAX_AGE),
            headers: HeaderSet::new(),
            gzip: GzipPolicy::Off,
            server_info: default_server_info(),
        }
    }
}

impl ServeConfig {
    #[must_use]
    pub fn with_container(mut self, container: &str) -> Self {
        self.container = container.to_string();
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Option<u32>) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderSet) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_gzip(mut self, gzip: GzipPolicy) -> Self {
        self.gzip = gzip;
        self
    }

    #[must_use]
    pub fn with_server_info(mut self, server_info: &str) -> Self {
        self.server_info = server_info.to_string();
        self
    }

    /// First header layer: server identification and cache policy
    pub fn default_headers(&self) -> HeaderSet {
        let mut headers = HeaderSet::new();
        headers.insert(SERVER, &self.server_info);
        if let Some(max_age) = self.cache {
            headers.insert(CACHE_CONTROL, cache_control_value(max_age));
        }
        headers
    }
}

impl TryFrom<&ServeSection> for ServeConfig {
    type Error = String;

    fn try_from(section: &ServeSection) -> Result<Self, Self::Error> {
        let cache = match section.cache {
            CacheSetting::Enabled(true) => Some(DEFAULT_MAX_AGE),
            CacheSetting::Enabled(false) => None,
            CacheSetting::MaxAge(max_age) => Some(max_age),
        };

        let gzip = match &section.gzip {
            GzipSetting::Enabled(false) => GzipPolicy::Off,
            GzipSetting::Enabled(true) => GzipPolicy::On,
            GzipSetting::Pattern(pattern) => GzipPolicy::Matching(
                Regex::new(pattern).map_err(|e| format!("Invalid gzip pattern '{pattern}': {e}"))?,
            ),
        };

        let headers = HeaderSet::try_from_pairs(
            section
                .headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        )?;

        let container = if section.container.is_empty() {
            DEFAULT_CONTAINER.to_string()
        } else {
            section.container.clone()
        };

        Ok(Self {
            container,
            cache,
            headers,
            gzip,
            server_info: section
                .server_info
                .clone()
                .unwrap_or_else(default_server_info),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn section(cache: CacheSetting, gzip: GzipSetting) -> ServeSection {
        ServeSection {
            container: "site".to_string(),
            cache,
            headers: HashMap::from([("X-Frame-Options".to_string(), "DENY".to_string())]),
            gzip,
            server_info: None,
        }
    }

    #[test]
    fn test_default_headers() {
        let config = ServeConfig::default().with_server_info("test/1.0");
        let headers = config.default_headers();
        assert_eq!(headers.get(SERVER), Some("test/1.0"));
        assert_eq!(headers.get(CACHE_CONTROL), Some("max-age=3600"));

        let headers = config.with_cache(None).default_headers();
        assert!(!headers.contains(CACHE_CONTROL));
    }

    #[test]
    fn test_cache_setting() {
        let off = ServeConfig::try_from(&section(
            CacheSetting::Enabled(false),
            GzipSetting::Enabled(false),
        ))
        .unwrap();
        assert_eq!(off.cache, None);

        let on = ServeConfig::try_from(&section(
            CacheSetting::Enabled(true),
            GzipSetting::Enabled(false),
        ))
        .unwrap();
        assert_eq!(on.cache, Some(DEFAULT_MAX_AGE));

        let custom = ServeConfig::try_from(&section(
            CacheSetting::MaxAge(60),
            GzipSetting::Enabled(false),
        ))
        .unwrap();
        assert_eq!(custom.cache, Some(60));
        assert_eq!(custom.headers.get("x-frame-options"), Some("DENY"));
        assert!(custom.server_info.starts_with("blobserve/"));
    }

    #[test]
    fn test_gzip_policy() {
        let config = ServeConfig::try_from(&section(
            CacheSetting::Enabled(true),
            GzipSetting::Pattern("^text/|javascript".to_string()),
        ))
        .unwrap();
        assert!(config.gzip.allows("text/css"));
        assert!(config.gzip.allows("application/javascript"));
        assert!(!config.gzip.allows("image/png"));

        assert!(GzipPolicy::On.allows("image/png"));
        assert!(!GzipPolicy::Off.allows("text/css"));
    }

    #[test]
    fn test_invalid_gzip_pattern() {
        let err = ServeConfig::try_from(&section(
            CacheSetting::Enabled(true),
            GzipSetting::Pattern("(".to_string()),
        ))
        .unwrap_err();
        assert!(err.contains("Invalid gzip pattern"));
    }
}
