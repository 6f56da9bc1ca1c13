use std::env;
use std::str::FromStr;

use tracing::warn;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: String,
    pub service_name: String,
    /// OTLP/HTTP collector endpoint. Span export is disabled when unset.
    pub otlp_endpoint: Option<String>,
    pub log_json: bool,
    pub seed_items: bool,
    /// Variables that failed to parse and fell back to their default.
    /// Config is read before the subscriber exists, so these are reported
    /// later through [`Config::log_warnings`].
    pub warnings: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let mut warnings = Vec::new();
        Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://test.db".to_string()),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5, &mut warnings),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "crud-service".to_string()),
            otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|endpoint| !endpoint.trim().is_empty()),
            log_json: env::var("LOG_FORMAT")
                .map(|format| format.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            seed_items: parse_var("ITEMS_SEED", true, &mut warnings),
            warnings,
        }
    }

    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            warn!("{}", warning);
        }
    }
}

fn parse_var<T: FromStr + Copy + std::fmt::Debug>(
    name: &str,
    default: T,
    warnings: &mut Vec<String>,
) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warnings.push(format!(
                "Unparseable value {raw:?} for {name}, using default {default:?}"
            ));
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_falls_back_on_garbage() {
        let mut warnings = Vec::new();
        env::set_var("CRUD_SERVICE_TEST_NUMBER", "not-a-number");
        assert_eq!(parse_var("CRUD_SERVICE_TEST_NUMBER", 7u32, &mut warnings), 7);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("CRUD_SERVICE_TEST_NUMBER"));
        assert!(warnings[0].contains("not-a-number"));

        env::set_var("CRUD_SERVICE_TEST_NUMBER", " 12 ");
        assert_eq!(parse_var("CRUD_SERVICE_TEST_NUMBER", 7u32, &mut warnings), 12);
        assert_eq!(warnings.len(), 1);
        env::remove_var("CRUD_SERVICE_TEST_NUMBER");
    }

    #[test]
    fn test_parse_var_missing_uses_default() {
        let mut warnings = Vec::new();
        assert!(parse_var("CRUD_SERVICE_TEST_UNSET_FLAG", true, &mut warnings));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_bad_bool_is_reported() {
        let mut warnings = Vec::new();
        env::set_var("CRUD_SERVICE_TEST_FLAG", "yes please");
        assert!(parse_var("CRUD_SERVICE_TEST_FLAG", true, &mut warnings));
        assert_eq!(warnings.len(), 1);
        env::remove_var("CRUD_SERVICE_TEST_FLAG");
    }
}
