//! Application configuration.
//!
//! Every parameter is declared once in [`PARAMS`]. The same table drives the
//! command-line flags, the layered value resolution and the printed summary,
//! so adding a parameter means adding one row here and one field on
//! [`Config`].
//!
//! Resolution order, lowest to highest priority:
//!
//! ```text
//! table default  <  ~/.api/api.env  <  environment (API_*)  <  CLI flag
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches};
use serde::Deserialize;
use strum::Display;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::debug;

use crate::error::{Result, ServiceError};

/// Prefix shared by all environment variables.
pub const ENV_PREFIX: &str = "API_";

/// Directory (under `$HOME`) holding the optional config file.
pub const CONFIG_DIR_NAME: &str = ".api";

/// Config file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "api.env";

/// Accepted values for `log-level`.
pub const LOG_LEVELS: &[&str] = &[
    "panic", "fatal", "error", "warn", "warning", "info", "debug", "trace",
];

/// Value type of a configuration parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ParamKind {
    /// Free-form text.
    String,
    /// Unsigned integer.
    Int,
    /// `true` / `false`.
    Bool,
    /// Comma-separated list of text values.
    List,
}

/// One row of the configuration schema.
#[derive(Debug, Clone, Copy)]
pub struct ConfigParam {
    /// Flag name, also the base of the env var name.
    pub key: &'static str,
    /// Value type.
    pub kind: ParamKind,
    /// Default value in its textual form.
    pub default: &'static str,
    /// Help text shown by `--help`.
    pub help: &'static str,
    /// Excluded from the printed configuration.
    pub sensitive: bool,
}

impl ConfigParam {
    /// Environment variable bound to this parameter, e.g. `API_LOG_LEVEL`.
    pub fn env_var(&self) -> String {
        format!("{}{}", ENV_PREFIX, self.bare_name())
    }

    /// Upper-cased key without prefix, e.g. `LOG_LEVEL`.
    fn bare_name(&self) -> String {
        self.key.to_uppercase().replace('-', "_")
    }

    /// Build the command-line flag for this parameter.
    pub fn to_arg(&self) -> Arg {
        let arg = Arg::new(self.key)
            .long(self.key)
            .help(self.help)
            .default_value(self.default)
            .global(true);

        match self.kind {
            ParamKind::String => arg,
            ParamKind::Int => arg.value_parser(clap::value_parser!(u64)),
            // A value must be attached (`--flag=false`) so the next word is
            // never taken as the value.
            ParamKind::Bool => arg
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_parser(clap::value_parser!(bool)),
            ParamKind::List => arg.action(ArgAction::Append).value_delimiter(','),
        }
    }
}

/// The configuration schema.
pub const PARAMS: &[ConfigParam] = &[
    ConfigParam {
        key: "log-level",
        kind: ParamKind::String,
        default: "info",
        help: "Logging level, one of 'panic', 'fatal', 'error', 'warn', 'info', 'debug', 'trace'",
        sensitive: false,
    },
    ConfigParam {
        key: "log-format",
        kind: ParamKind::String,
        default: "json",
        help: "Log output format, 'json' or 'text'",
        sensitive: false,
    },
    ConfigParam {
        key: "server-address",
        kind: ParamKind::String,
        default: "127.0.0.1",
        help: "The address that the web server will be listening to",
        sensitive: false,
    },
    ConfigParam {
        key: "server-port",
        kind: ParamKind::Int,
        default: "8080",
        help: "The port that the web server will be listening to",
        sensitive: false,
    },
    ConfigParam {
        key: "shutdown-timeout",
        kind: ParamKind::Int,
        default: "10",
        help: "The timeout (in seconds) for the server to shut down",
        sensitive: false,
    },
    ConfigParam {
        key: "upstream-url",
        kind: ParamKind::String,
        default: "https://xkcd.com",
        help: "Base URL of the comic metadata source",
        sensitive: false,
    },
    ConfigParam {
        key: "cors-allow-origins",
        kind: ParamKind::List,
        default: "*",
        help: "Allow origins for CORS configuration",
        sensitive: false,
    },
    ConfigParam {
        key: "cors-allow-methods",
        kind: ParamKind::List,
        default: "GET,POST,PUT,DELETE",
        help: "List of CORS methods that are allowed",
        sensitive: false,
    },
    ConfigParam {
        key: "cors-allow-headers",
        kind: ParamKind::List,
        default: "Origin,Content-Type",
        help: "List of CORS headers that are allowed",
        sensitive: false,
    },
    ConfigParam {
        key: "cors-expose-headers",
        kind: ParamKind::List,
        default: "Content-Length",
        help: "List of CORS headers that are exposed",
        sensitive: false,
    },
    ConfigParam {
        key: "cors-allow-credentials",
        kind: ParamKind::Bool,
        default: "false",
        help: "Whether to allow credentials to CORS",
        sensitive: false,
    },
    ConfigParam {
        key: "cors-max-age",
        kind: ParamKind::Int,
        default: "1",
        help: "Maximum age (in hours) pertaining to CORS configuration",
        sensitive: false,
    },
];

/// Command-line flags for every schema parameter.
pub fn flag_args() -> Vec<Arg> {
    PARAMS.iter().map(ConfigParam::to_arg).collect()
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable text.
    Text,
}

/// Resolved application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Logging ===
    /// Log level.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    // === Server ===
    /// Listen address (IP or hostname).
    pub server_address: String,

    /// Listen port.
    pub server_port: u16,

    /// Seconds allowed for in-flight requests after a shutdown signal.
    pub shutdown_timeout: u64,

    // === Upstream ===
    /// Base URL of the comic metadata source.
    pub upstream_url: String,

    // === CORS ===
    /// Allowed origins; `*` allows any.
    pub cors_allow_origins: Vec<String>,

    /// Allowed methods.
    pub cors_allow_methods: Vec<String>,

    /// Allowed request headers.
    pub cors_allow_headers: Vec<String>,

    /// Response headers exposed to the browser.
    pub cors_expose_headers: Vec<String>,

    /// Whether credentials are allowed.
    pub cors_allow_credentials: bool,

    /// Preflight cache lifetime in hours.
    pub cors_max_age: u64,
}

impl Config {
    /// Load configuration from every source, reading .env file first.
    pub fn load(matches: &ArgMatches) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut loader = ConfigLoader::new();
        if let Some(path) = default_config_file() {
            loader = loader.with_file(&path)?;
        }

        loader.with_env(std::env::vars()).with_flags(matches).build()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(format!("unknown log level '{}'", self.log_level));
        }

        if self.server_port == 0 {
            return Err("SERVER_PORT must be greater than 0".to_string());
        }

        if self.upstream_url.trim().is_empty() {
            return Err("UPSTREAM_URL is required".to_string());
        }

        url::Url::parse(&self.upstream_url)
            .map_err(|e| format!("UPSTREAM_URL is not a valid URL: {}", e))?;

        if self.cors_allow_credentials && self.allows_any_origin() {
            return Err(
                "CORS_ALLOW_CREDENTIALS cannot be combined with a wildcard origin".to_string(),
            );
        }

        self.cors_layer().map(|_| ())
    }

    /// `tracing` filter directive for the configured level.
    pub fn filter_directive(&self) -> &'static str {
        match self.log_level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "warn" | "warning" => "warn",
            "error" | "fatal" | "panic" => "error",
            _ => "info",
        }
    }

    /// Shutdown drain timeout.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    fn allows_any_origin(&self) -> bool {
        self.cors_allow_origins.iter().any(|origin| origin == "*")
    }

    /// Build the CORS layer described by the `cors-*` parameters.
    pub fn cors_layer(&self) -> std::result::Result<CorsLayer, String> {
        let max_age = self
            .cors_max_age
            .checked_mul(3600)
            .ok_or_else(|| "CORS_MAX_AGE is too large".to_string())?;

        let origins = if self.allows_any_origin() {
            AllowOrigin::any()
        } else {
            let list = self
                .cors_allow_origins
                .iter()
                .map(|origin| {
                    HeaderValue::from_str(origin)
                        .map_err(|_| format!("invalid CORS origin '{}'", origin))
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            AllowOrigin::list(list)
        };

        let methods = self
            .cors_allow_methods
            .iter()
            .map(|method| {
                method
                    .parse::<Method>()
                    .map_err(|_| format!("invalid CORS method '{}'", method))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(parse_header_names(&self.cors_allow_headers)?)
            .expose_headers(parse_header_names(&self.cors_expose_headers)?)
            .allow_credentials(self.cors_allow_credentials)
            .max_age(Duration::from_secs(max_age)))
    }

    /// Textual value of a schema parameter.
    pub fn value_of(&self, key: &str) -> Option<String> {
        let list = |values: &[String]| format!("[{}]", values.join(" "));

        let value = match key {
            "log-level" => self.log_level.clone(),
            "log-format" => self.log_format.to_string(),
            "server-address" => self.server_address.clone(),
            "server-port" => self.server_port.to_string(),
            "shutdown-timeout" => self.shutdown_timeout.to_string(),
            "upstream-url" => self.upstream_url.clone(),
            "cors-allow-origins" => list(&self.cors_allow_origins),
            "cors-allow-methods" => list(&self.cors_allow_methods),
            "cors-allow-headers" => list(&self.cors_allow_headers),
            "cors-expose-headers" => list(&self.cors_expose_headers),
            "cors-allow-credentials" => self.cors_allow_credentials.to_string(),
            "cors-max-age" => self.cors_max_age.to_string(),
            _ => return None,
        };

        Some(value)
    }

    /// Render every non-sensitive parameter as `key: value` lines.
    pub fn render(&self) -> String {
        render_params(self, PARAMS)
    }
}

fn render_params(config: &Config, params: &[ConfigParam]) -> String {
    params
        .iter()
        .filter(|param| !param.sensitive)
        .map(|param| {
            format!(
                "{}: {}\n",
                param.key,
                config.value_of(param.key).unwrap_or_default()
            )
        })
        .collect()
}

fn parse_header_names(names: &[String]) -> std::result::Result<Vec<HeaderName>, String> {
    names
        .iter()
        .map(|name| {
            name.parse::<HeaderName>()
                .map_err(|_| format!("invalid CORS header '{}'", name))
        })
        .collect()
}

/// `~/.api/api.env`, if a home directory is known.
pub fn default_config_file() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    })
}

/// Layered resolution of raw parameter values, keyed by env var name.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    values: BTreeMap<String, String>,
}

impl ConfigLoader {
    /// Start from the schema defaults.
    pub fn new() -> Self {
        let values = PARAMS
            .iter()
            .map(|param| (param.env_var(), param.default.to_string()))
            .collect();

        Self { values }
    }

    /// Overlay values from a dotenv-style file. A missing file is skipped.
    pub fn with_file(mut self, path: &Path) -> Result<Self> {
        let entries = match dotenvy::from_path_iter(path) {
            Ok(entries) => entries,
            Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found");
                return Ok(self);
            }
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let (key, value) = entry?;
            self.set(&key, value);
        }

        Ok(self)
    }

    /// Overlay `API_*` variables.
    pub fn with_env<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if key.starts_with(ENV_PREFIX) {
                self.set(&key, value);
            }
        }
        self
    }

    /// Overlay flags that were given explicitly on the command line.
    pub fn with_flags(mut self, matches: &ArgMatches) -> Self {
        for param in PARAMS {
            if matches.value_source(param.key) != Some(ValueSource::CommandLine) {
                continue;
            }

            if let Some(raw) = matches.get_raw(param.key) {
                let value = raw
                    .map(|v| v.to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join(",");
                self.values.insert(param.env_var(), value);
            }
        }
        self
    }

    /// Raw value currently resolved for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        PARAMS
            .iter()
            .find(|param| param.key == key)
            .and_then(|param| self.values.get(&param.env_var()))
            .map(String::as_str)
    }

    /// Deserialize and validate.
    pub fn build(self) -> Result<Config> {
        let config: Config = envy::prefixed(ENV_PREFIX).from_iter(self.values)?;
        config.validate().map_err(ServiceError::InvalidConfig)?;
        Ok(config)
    }

    /// Accepts both `API_LOG_LEVEL` and `LOG_LEVEL`; unknown keys are ignored.
    fn set(&mut self, key: &str, value: String) {
        let known = PARAMS
            .iter()
            .find(|param| param.env_var() == key || param.bare_name() == key);

        if let Some(param) = known {
            self.values.insert(param.env_var(), value);
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
