pub mod chat;
pub mod config;
pub mod replay;

use std::path::{Path, PathBuf};

use serde::Serialize;
use waypoint_agent::DialogOrchestrator;
use waypoint_core::config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
use waypoint_core::fixtures::FixtureCatalog;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            concat!(
                "{{\"command\":\"unknown\",\"status\":\"error\",",
                "\"error_class\":\"serialization\",\"message\":\"{}\"}}"
            ),
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Loads config with an optional `--fixtures` override, so validation checks
/// the fixture path the command will actually use.
fn load_config(
    config_path: Option<&Path>,
    fixtures: Option<PathBuf>,
) -> Result<AppConfig, ConfigError> {
    AppConfig::load(LoadOptions {
        config_path: config_path.map(Path::to_path_buf),
        require_file: config_path.is_some(),
        overrides: ConfigOverrides { fixture_path: fixtures, ..ConfigOverrides::default() },
    })
}

fn build_orchestrator(config: &AppConfig) -> Result<DialogOrchestrator, String> {
    let fixtures = match &config.providers.fixture_path {
        Some(path) => FixtureCatalog::load(path),
        None => FixtureCatalog::demo(),
    }
    .map_err(|error| error.to_string())?;

    DialogOrchestrator::from_fixtures(config, fixtures).map_err(|error| error.to_string())
}
