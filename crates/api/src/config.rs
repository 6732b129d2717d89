//! Application configuration loaded from environment variables.

use std::str::FromStr;

use cache::EntryOptions;
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Encoder used for failure envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerializerKind {
    /// Field names fixed by serde attributes on a wire type.
    #[default]
    Typed,
    /// Field names rewritten from the canonical names by a naming policy.
    Policy,
}

impl FromStr for SerializerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "typed" => Ok(SerializerKind::Typed),
            "policy" => Ok(SerializerKind::Policy),
            other => Err(format!("unknown serializer '{other}'")),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` or `pretty` (default: `pretty`)
/// - `SERIALIZER`: failure encoder, `typed` or `policy` (default: `typed`)
/// - `CULTURE`: localizer culture (default: `"en"`)
/// - `DATABASE_URL`: PostgreSQL event log; in-memory when unset
/// - `SENSITIVE_PATHS`: comma separated paths whose bodies are never logged
/// - `MAX_BODY_BYTES`: request body buffering limit (default: `1048576`)
/// - `CACHE_TTL_SECONDS`: lifetime of cache-aside entries, `0` keeps them
///   until invalidated (default: `300`)
///
/// Unparseable values fall back to their default with a warning.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub serializer: SerializerKind,
    pub culture: String,
    pub database_url: Option<String>,
    pub sensitive_paths: Vec<String>,
    pub max_body_bytes: usize,
    pub cache_ttl_seconds: u64,
}

const DEFAULT_SENSITIVE_PATH: &str = "/api/tokens/";
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: text("HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "PORT", defaults.port),
            log_level: text("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parsed(&lookup, "LOG_FORMAT", defaults.log_format),
            serializer: parsed(&lookup, "SERIALIZER", defaults.serializer),
            culture: text("CULTURE").unwrap_or(defaults.culture),
            database_url: text("DATABASE_URL"),
            sensitive_paths: text("SENSITIVE_PATHS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or(defaults.sensitive_paths),
            max_body_bytes: parsed(&lookup, "MAX_BODY_BYTES", defaults.max_body_bytes),
            cache_ttl_seconds: parsed(&lookup, "CACHE_TTL_SECONDS", defaults.cache_ttl_seconds),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Options for entries written by cache-aside reads.
    ///
    /// A lifetime too large for a duration falls back to the default one.
    pub fn cache_options(&self) -> EntryOptions {
        match self.cache_ttl_seconds {
            0 => EntryOptions::default(),
            secs => EntryOptions::expire_after(ttl_seconds(secs).unwrap_or_else(|| {
                tracing::warn!(
                    key = "CACHE_TTL_SECONDS",
                    value = secs,
                    "cache lifetime out of range, using default"
                );
                chrono::Duration::seconds(DEFAULT_CACHE_TTL_SECONDS as i64)
            })),
        }
    }

    /// Tracing filter built from `log_level`. An unparseable directive
    /// falls back to `info`.
    pub fn log_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.log_level).unwrap_or_else(|error| {
            tracing::warn!(key = "RUST_LOG", value = %self.log_level, %error, "invalid filter, using default");
            EnvFilter::new("info")
        })
    }
}

fn ttl_seconds(secs: u64) -> Option<chrono::Duration> {
    i64::try_from(secs).ok().and_then(chrono::Duration::try_seconds)
}

pub(crate) fn is_sensitive_path(sensitive: &[String], path: &str) -> bool {
    let path = path.trim_end_matches('/');
    sensitive.iter().any(|p| {
        let p = p.trim_end_matches('/');
        path == p || path.strip_prefix(p).is_some_and(|rest| rest.starts_with('/'))
    })
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "invalid configuration value, using default");
                default
            }
        },
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            serializer: SerializerKind::Typed,
            culture: "en".to_string(),
            database_url: None,
            sensitive_paths: vec![DEFAULT_SENSITIVE_PATH.to_string()],
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
        }
    }
}
