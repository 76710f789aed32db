//! Loader for unblock configuration with YAML + environment overlays.
//!
//! Precedence, lowest first:
//!
//! 1. built-in defaults (zone `unblocker`, engine `google`, ...)
//! 2. vendor variables `BRIGHT_DATA_API_KEY`, `BRIGHT_DATA_ZONE`,
//!    `BRIGHT_DATA_DEFAULT_ENGINE`
//! 3. YAML files and inline snippets, in the order they were attached
//! 4. `UNBLOCK__<SECTION>__<KEY>` variables
//!
//! After merging, `${VAR}` placeholders inside string values are expanded.
use config::{Config, ConfigError, Environment, File};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const DEFAULT_API_BASE: &str = "https://api.brightdata.com/";
pub const DEFAULT_ZONE: &str = "unblocker";
pub const DEFAULT_ENGINE: &str = "google";
pub const DEFAULT_MAX_RESULTS: u32 = 10;
pub const DEFAULT_PREVIEW_CHARS: usize = 1000;

/// Vendor variables and the config keys they seed.
const VENDOR_ENV: [(&str, &str); 3] = [
    ("BRIGHT_DATA_API_KEY", "unlocker.api_key"),
    ("BRIGHT_DATA_ZONE", "unlocker.zone"),
    ("BRIGHT_DATA_DEFAULT_ENGINE", "search.engine"),
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnblockConfig {
    #[serde(default)]
    pub unlocker: UnlockerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the unlocking API.
#[derive(Clone, Deserialize)]
pub struct UnlockerConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_zone")]
    pub zone: String,
    #[serde(default = "default_api_base")]
    pub base_url: String,
}

impl Default for UnlockerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            zone: default_zone(),
            base_url: default_api_base(),
        }
    }
}

impl fmt::Debug for UnlockerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnlockerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("zone", &self.zone)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Engine name; unknown names fall back to google at use time.
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default = "default_max_results", deserialize_with = "number_or_string")]
    pub max_results: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Characters of page content shown in crawl tool output, at most 1000.
    #[serde(default = "default_preview_chars", deserialize_with = "number_or_string")]
    pub preview_chars: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `text` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            filter: default_log_filter(),
            dir: None,
            stderr: false,
        }
    }
}

fn default_zone() -> String {
    DEFAULT_ZONE.into()
}
fn default_api_base() -> String {
    DEFAULT_API_BASE.into()
}
fn default_engine() -> String {
    DEFAULT_ENGINE.into()
}
fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}
fn default_preview_chars() -> usize {
    DEFAULT_PREVIEW_CHARS
}
fn default_log_format() -> String {
    "text".into()
}
fn default_log_filter() -> String {
    "info".into()
}

/// Environment overrides arrive as strings; accept either form.
fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Typed(T),
        Text(String),
    }

    match Raw::<T>::deserialize(deserializer)? {
        Raw::Typed(v) => Ok(v),
        Raw::Text(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// `$XDG_CONFIG_HOME/unblock/unblock.yaml` or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("unblock").join("unblock.yaml"))
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct UnblockConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    vendor_env: bool,
}

impl Default for UnblockConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl UnblockConfigLoader {
    /// Start with defaults, vendor variables and `UNBLOCK__` overrides.
    ///
    /// ```
    /// use unblock_config::UnblockConfigLoader;
    ///
    /// let config = UnblockConfigLoader::new()
    ///     .without_vendor_env()
    ///     .with_yaml_str("unlocker:\n  api_key: secret\n  zone: serp")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.unlocker.api_key.as_deref(), Some("secret"));
    /// assert_eq!(config.unlocker.zone, "serp");
    /// assert_eq!(config.search.max_results, 10);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            vendor_env: true,
        }
    }

    /// Skip the `BRIGHT_DATA_*` variables.
    pub fn without_vendor_env(mut self) -> Self {
        self.vendor_env = false;
        self
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may not exist, e.g. [`default_config_path`].
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// ```
    /// use unblock_config::UnblockConfigLoader;
    ///
    /// let config = UnblockConfigLoader::new()
    ///     .without_vendor_env()
    ///     .with_yaml_str("search:\n  engine: bing\ncrawl:\n  preview_chars: 200")
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(config.unlocker.api_key.is_none());
    /// assert_eq!(config.unlocker.zone, "unblocker");
    /// assert_eq!(config.search.engine, "bing");
    /// assert_eq!(config.crawl.preview_chars, 200);
    /// ```
    pub fn load(self) -> Result<UnblockConfig, ConfigError> {
        let mut builder = self.builder;

        if self.vendor_env {
            for (var, key) in VENDOR_ENV {
                if let Some(value) = std::env::var(var).ok().filter(|v| !v.trim().is_empty()) {
                    builder = builder.set_default(key, value)?;
                }
            }
        }

        // Added last so it overrides every file source.
        let cfg = builder
            .add_source(Environment::with_prefix("UNBLOCK").separator("__"))
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
