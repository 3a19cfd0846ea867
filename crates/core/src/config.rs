use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::planner::RouteRanking;
use crate::responses::ResponseCatalog;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["waypoint.toml", "config/waypoint.toml"];

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub dialog: DialogConfig,
    pub providers: ProvidersConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DialogConfig {
    pub locale: String,
    pub page_size: usize,
    pub require_origin_before_search: bool,
    pub session_idle_timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProvidersConfig {
    pub timeout_ms: u64,
    pub search_radius_meters: f64,
    pub route_ranking: RouteRanking,
    pub fixture_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub locale: Option<String>,
    pub page_size: Option<usize>,
    pub log_level: Option<String>,
    pub route_ranking: Option<RouteRanking>,
    pub fixture_path: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dialog: DialogConfig {
                locale: "en".to_string(),
                page_size: 5,
                require_origin_before_search: true,
                session_idle_timeout_secs: 1_800,
            },
            providers: ProvidersConfig {
                timeout_ms: 5_000,
                search_radius_meters: 5_000.0,
                route_ranking: RouteRanking::ProviderOrder,
                fixture_path: None,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl ProvidersConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl DialogConfig {
    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_timeout_secs)
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(dialog) = patch.dialog {
            if let Some(locale) = dialog.locale {
                self.dialog.locale = locale;
            }
            if let Some(page_size) = dialog.page_size {
                self.dialog.page_size = page_size;
            }
            if let Some(require_origin) = dialog.require_origin_before_search {
                self.dialog.require_origin_before_search = require_origin;
            }
            if let Some(idle_secs) = dialog.session_idle_timeout_secs {
                self.dialog.session_idle_timeout_secs = idle_secs;
            }
        }

        if let Some(providers) = patch.providers {
            if let Some(timeout_ms) = providers.timeout_ms {
                self.providers.timeout_ms = timeout_ms;
            }
            if let Some(radius) = providers.search_radius_meters {
                self.providers.search_radius_meters = radius;
            }
            if let Some(route_ranking) = providers.route_ranking {
                self.providers.route_ranking = route_ranking;
            }
            if let Some(fixture_path) = providers.fixture_path {
                self.providers.fixture_path = Some(fixture_path);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("WAYPOINT_DIALOG_LOCALE") {
            self.dialog.locale = value;
        }
        if let Some(value) = read_env("WAYPOINT_DIALOG_PAGE_SIZE") {
            self.dialog.page_size = parse_usize("WAYPOINT_DIALOG_PAGE_SIZE", &value)?;
        }
        if let Some(value) = read_env("WAYPOINT_DIALOG_REQUIRE_ORIGIN") {
            self.dialog.require_origin_before_search =
                parse_bool("WAYPOINT_DIALOG_REQUIRE_ORIGIN", &value)?;
        }
        if let Some(value) = read_env("WAYPOINT_DIALOG_SESSION_IDLE_TIMEOUT_SECS") {
            self.dialog.session_idle_timeout_secs =
                parse_u64("WAYPOINT_DIALOG_SESSION_IDLE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("WAYPOINT_PROVIDERS_TIMEOUT_MS") {
            self.providers.timeout_ms = parse_u64("WAYPOINT_PROVIDERS_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = read_env("WAYPOINT_PROVIDERS_SEARCH_RADIUS_METERS") {
            self.providers.search_radius_meters =
                parse_f64("WAYPOINT_PROVIDERS_SEARCH_RADIUS_METERS", &value)?;
        }
        if let Some(value) = read_env("WAYPOINT_PROVIDERS_ROUTE_RANKING") {
            self.providers.route_ranking =
                value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "WAYPOINT_PROVIDERS_ROUTE_RANKING".to_string(),
                    value: value.clone(),
                })?;
        }
        if let Some(value) = read_env("WAYPOINT_PROVIDERS_FIXTURE_PATH") {
            self.providers.fixture_path = Some(PathBuf::from(value));
        }

        let log_level =
            read_env("WAYPOINT_LOGGING_LEVEL").or_else(|| read_env("WAYPOINT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("WAYPOINT_LOGGING_FORMAT").or_else(|| read_env("WAYPOINT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(locale) = overrides.locale {
            self.dialog.locale = locale;
        }
        if let Some(page_size) = overrides.page_size {
            self.dialog.page_size = page_size;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(route_ranking) = overrides.route_ranking {
            self.providers.route_ranking = route_ranking;
        }
        if let Some(fixture_path) = overrides.fixture_path {
            self.providers.fixture_path = Some(fixture_path);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_dialog(&self.dialog)?;
        validate_providers(&self.providers)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_dialog(dialog: &DialogConfig) -> Result<(), ConfigError> {
    let catalog = ResponseCatalog::embedded()
        .map_err(|error| ConfigError::Validation(format!("response catalog is broken: {error}")))?;
    if !catalog.supports(&dialog.locale) {
        return Err(ConfigError::Validation(format!(
            "dialog.locale `{}` is not supported (expected one of {})",
            dialog.locale,
            catalog.locales().join("|")
        )));
    }

    if dialog.page_size == 0 || dialog.page_size > 10 {
        return Err(ConfigError::Validation("dialog.page_size must be in range 1..=10".to_string()));
    }

    if dialog.session_idle_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "dialog.session_idle_timeout_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_providers(providers: &ProvidersConfig) -> Result<(), ConfigError> {
    if providers.timeout_ms == 0 || providers.timeout_ms > 60_000 {
        return Err(ConfigError::Validation(
            "providers.timeout_ms must be in range 1..=60000".to_string(),
        ));
    }

    if !providers.search_radius_meters.is_finite() || providers.search_radius_meters <= 0.0 {
        return Err(ConfigError::Validation(
            "providers.search_radius_meters must be a positive number".to_string(),
        ));
    }

    if let Some(path) = &providers.fixture_path {
        if !path.exists() {
            return Err(ConfigError::Validation(format!(
                "providers.fixture_path `{}` does not exist",
                path.display()
            )));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    dialog: Option<DialogPatch>,
    providers: Option<ProvidersPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DialogPatch {
    locale: Option<String>,
    page_size: Option<usize>,
    require_origin_before_search: Option<bool>,
    session_idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ProvidersPatch {
    timeout_ms: Option<u64>,
    search_radius_meters: Option<f64>,
    route_ranking: Option<RouteRanking>,
    fixture_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::planner::RouteRanking;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;
        ensure(config.dialog.locale == "en", "default locale should be en")?;
        ensure(config.dialog.page_size == 5, "default page size should be 5")?;
        ensure(config.dialog.require_origin_before_search, "origin policy should default on")?;
        ensure(
            config.providers.route_ranking == RouteRanking::ProviderOrder,
            "routes should keep provider order by default",
        )?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_WAYPOINT_LOCALE", "de");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("waypoint.toml");
            fs::write(
                &path,
                r#"
[dialog]
locale = "${TEST_WAYPOINT_LOCALE}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.dialog.locale == "de", "locale should be loaded from environment")
        })();

        clear_vars(&["TEST_WAYPOINT_LOCALE"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("WAYPOINT_LOG_LEVEL", "warn");
        env::set_var("WAYPOINT_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )
        })();

        clear_vars(&["WAYPOINT_LOG_LEVEL", "WAYPOINT_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("WAYPOINT_DIALOG_PAGE_SIZE", "4");
        env::set_var("WAYPOINT_PROVIDERS_ROUTE_RANKING", "fastest");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("waypoint.toml");
            fs::write(
                &path,
                r#"
[dialog]
page_size = 3
locale = "fr"

[providers]
timeout_ms = 1500

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    page_size: Some(7),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.dialog.page_size == 7, "override page size should win")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.dialog.locale == "fr", "file locale should win over default")?;
            ensure(config.providers.timeout_ms == 1_500, "file timeout should win over default")?;
            ensure(
                config.providers.route_ranking == RouteRanking::Fastest,
                "env route ranking should win over default",
            )
        })();

        clear_vars(&["WAYPOINT_DIALOG_PAGE_SIZE", "WAYPOINT_PROVIDERS_ROUTE_RANKING"]);
        result
    }

    #[test]
    fn unsupported_locale_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("WAYPOINT_DIALOG_LOCALE", "tlh");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("dialog.locale")
            );
            ensure(has_message, "validation failure should mention dialog.locale")
        })();

        clear_vars(&["WAYPOINT_DIALOG_LOCALE"]);
        result
    }

    #[test]
    fn malformed_env_override_is_reported_with_its_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("WAYPOINT_PROVIDERS_TIMEOUT_MS", "soon");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected env override failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::InvalidEnvOverride { ref key, .. }
                        if key == "WAYPOINT_PROVIDERS_TIMEOUT_MS"
                ),
                "error should name the offending variable",
            )
        })();

        clear_vars(&["WAYPOINT_PROVIDERS_TIMEOUT_MS"]);
        result
    }

    #[test]
    fn page_size_out_of_range_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = match AppConfig::load(LoadOptions {
            overrides: ConfigOverrides { page_size: Some(0), ..ConfigOverrides::default() },
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("expected page size validation failure".to_string()),
            Err(error) => error,
        };
        ensure(
            matches!(error, ConfigError::Validation(ref message) if message.contains("page_size")),
            "validation failure should mention page_size",
        )
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let missing = dir.path().join("absent.toml");

        let error = match AppConfig::load(LoadOptions {
            config_path: Some(missing.clone()),
            require_file: true,
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("expected missing file failure".to_string()),
            Err(error) => error,
        };
        ensure(
            matches!(error, ConfigError::MissingConfigFile(ref path) if *path == missing),
            "missing file should be reported",
        )
    }
}
