use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Scraper configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ScraperConfig {
    /// Optional third-party fetch proxy used ahead of the direct fetch
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Reader service used when the page itself is blocked
    #[serde(default)]
    pub reader: ReaderConfig,
    /// User agent sent with page requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            proxy: ProxyConfig::default(),
            reader: ReaderConfig::default(),
            user_agent: default_user_agent(),
        }
    }
}

/// Configuration for the fetch proxy
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProxyConfig {
    /// Proxy endpoint, e.g. "https://proxy.example.com/v1"
    #[serde(default)]
    pub url: Option<String>,
    /// API key passed to the proxy as `api_key`
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ProxyConfig {
    /// The proxy only takes part when both endpoint and key are set
    pub fn is_enabled(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.url) && filled(&self.api_key)
    }
}

/// Configuration for the readability proxy
#[derive(Debug, Deserialize, Clone)]
pub struct ReaderConfig {
    /// Base URL of the reader, the target is appended as `/http://<host/path>`
    #[serde(default = "default_reader_base_url")]
    pub base_url: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            base_url: default_reader_base_url(),
        }
    }
}

// Default value functions
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36".to_string()
}

fn default_reader_base_url() -> String {
    "https://r.jina.ai".to_string()
}

impl ScraperConfig {
    /// Load configuration from file and environment variables
    ///
    /// See [`load_config`] for the lookup order.
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
///
/// Configuration is loaded with the following priority (highest to lowest):
/// 1. Environment variables with RECIPE_SCRAPER__ prefix
/// 2. config.toml file in current directory
/// 3. Legacy SCRAPER_PROXY_URL / SCRAPER_PROXY_KEY / SCRAPING_API_KEY variables
/// 4. Default values
///
/// Environment variable format: RECIPE_SCRAPER__PROXY__API_KEY
pub fn load_config() -> Result<ScraperConfig, ConfigError> {
    let mut builder = Config::builder();

    // Legacy variables act as defaults so that prefixed variables win
    if let Some(url) = non_empty_var("SCRAPER_PROXY_URL") {
        builder = builder.set_default("proxy.url", url)?;
    }
    if let Some(key) = non_empty_var("SCRAPER_PROXY_KEY").or_else(|| non_empty_var("SCRAPING_API_KEY")) {
        builder = builder.set_default("proxy.api_key", key)?;
    }

    let settings = builder
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        .add_source(
            Environment::with_prefix("RECIPE_SCRAPER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = ScraperConfig::default();
        assert_eq!(config.reader.base_url, "https://r.jina.ai");
        assert!(config.user_agent.contains("Chrome"));
        assert!(config.proxy.url.is_none());
        assert!(!config.proxy.is_enabled());
    }

    #[test]
    fn test_proxy_requires_url_and_key() {
        let mut proxy = ProxyConfig {
            url: Some("https://proxy.example.com".to_string()),
            api_key: None,
        };
        assert!(!proxy.is_enabled());

        proxy.api_key = Some("   ".to_string());
        assert!(!proxy.is_enabled());

        proxy.api_key = Some("secret".to_string());
        assert!(proxy.is_enabled());
    }

    #[test]
    fn test_load_config_without_file() {
        // No config file and no prefixed variables still yields a usable config
        let result = load_config();
        assert!(result.is_ok());
    }
}
