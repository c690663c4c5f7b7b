use mediabuy_core::search::{DEFAULT_SEARCH_LIMIT, EXPORT_MAX_ROWS, MAX_SEARCH_LIMIT};

/// Invalid or missing environment configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Which [`Store`](mediabuy_db::Store) implementation backs the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Paging limits the action handlers apply to search and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub default_limit: i64,
    pub max_limit: i64,
    pub export_max_rows: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_SEARCH_LIMIT,
            max_limit: MAX_SEARCH_LIMIT,
            export_max_rows: EXPORT_MAX_ROWS,
        }
    }
}

/// Process configuration, read once at startup.
///
/// Everything has a local-development default except `DATABASE_URL`, which
/// the postgres backend needs.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to listen on.
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to call the API.
    pub cors_origins: Vec<String>,
    /// Per-request deadline; slower requests get 408.
    pub request_timeout_secs: u64,
    pub store_backend: StoreBackend,
    /// Required when `store_backend` is Postgres.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub log_format: LogFormat,
    pub engine: EngineSettings,
}

impl ServerConfig {
    /// Read the process environment.
    ///
    /// | Variable               | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `3000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `STORE_BACKEND`        | `postgres`              |
    /// | `DATABASE_URL`         | (required for postgres) |
    /// | `DB_MAX_CONNECTIONS`   | `20`                    |
    /// | `SEARCH_DEFAULT_LIMIT` | `50`                    |
    /// | `SEARCH_MAX_LIMIT`     | `500`                   |
    /// | `EXPORT_MAX_ROWS`      | `10000`                 |
    /// | `LOG_FORMAT`           | `text`                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_var(&lookup, "PORT", 3000, "a valid port number")?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 =
            parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 30, "a whole number of seconds")?;

        let store_backend = match lookup("STORE_BACKEND").as_deref().map(str::trim) {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "STORE_BACKEND",
                    value: other.to_string(),
                    expected: "'postgres' or 'memory'",
                })
            }
        };

        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let db_max_connections: u32 =
            parse_var(&lookup, "DB_MAX_CONNECTIONS", 20, "a positive integer")?;

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    value: other.to_string(),
                    expected: "'text' or 'json'",
                })
            }
        };

        let default_limit: i64 = parse_var(
            &lookup,
            "SEARCH_DEFAULT_LIMIT",
            DEFAULT_SEARCH_LIMIT,
            "a positive integer",
        )?;
        let max_limit: i64 =
            parse_var(&lookup, "SEARCH_MAX_LIMIT", MAX_SEARCH_LIMIT, "a positive integer")?;
        let export_max_rows: i64 =
            parse_var(&lookup, "EXPORT_MAX_ROWS", EXPORT_MAX_ROWS, "a positive integer")?;

        if default_limit < 1 || default_limit > max_limit {
            return Err(ConfigError::Invalid {
                var: "SEARCH_DEFAULT_LIMIT",
                value: default_limit.to_string(),
                expected: "between 1 and SEARCH_MAX_LIMIT",
            });
        }
        if export_max_rows < 1 {
            return Err(ConfigError::Invalid {
                var: "EXPORT_MAX_ROWS",
                value: export_max_rows.to_string(),
                expected: "a positive integer",
            });
        }

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            store_backend,
            database_url,
            db_max_connections,
            log_format,
            engine: EngineSettings {
                default_limit,
                max_limit,
                export_max_rows,
            },
        })
    }
}

fn parse_var<F, T>(
    lookup: &F,
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            value: raw,
            expected,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn memory_backend_needs_no_database_url() {
        let config = load(&[("STORE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.port, 3000);
        assert_eq!(config.engine, EngineSettings::default());
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("DATABASE_URL"));
        let config = load(&[("DATABASE_URL", "postgres://localhost/mediabuy")]).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Postgres);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = load(&[("STORE_BACKEND", "memory"), ("PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));

        let err = load(&[("STORE_BACKEND", "sqlite")]).unwrap_err();
        assert!(err.to_string().starts_with("STORE_BACKEND must be"));
    }

    #[test]
    fn default_limit_cannot_exceed_max() {
        let err = load(&[
            ("STORE_BACKEND", "memory"),
            ("SEARCH_DEFAULT_LIMIT", "100"),
            ("SEARCH_MAX_LIMIT", "20"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "SEARCH_DEFAULT_LIMIT", .. }));
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = load(&[
            ("STORE_BACKEND", "memory"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,,"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
