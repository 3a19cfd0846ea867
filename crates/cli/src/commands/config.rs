use std::env;
use std::fs;
use std::path::Path;

use toml::Value;
use waypoint_core::config::{resolve_config_path, AppConfig, LoadOptions};

use crate::commands::CommandResult;

pub fn run(config_path: Option<&Path>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions {
        config_path: config_path.map(Path::to_path_buf),
        require_file: config_path.is_some(),
        ..LoadOptions::default()
    }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };

    let file_path = resolve_config_path(config_path);
    let file_doc = load_config_file_doc(file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, file_doc.as_ref(), file_path.as_deref())
    };

    let fixture_path = config
        .providers
        .fixture_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<bundled demo>".to_string());

    let fields = [
        ("dialog.locale", config.dialog.locale.clone(), &["WAYPOINT_DIALOG_LOCALE"][..]),
        (
            "dialog.page_size",
            config.dialog.page_size.to_string(),
            &["WAYPOINT_DIALOG_PAGE_SIZE"][..],
        ),
        (
            "dialog.require_origin_before_search",
            config.dialog.require_origin_before_search.to_string(),
            &["WAYPOINT_DIALOG_REQUIRE_ORIGIN"][..],
        ),
        (
            "dialog.session_idle_timeout_secs",
            config.dialog.session_idle_timeout_secs.to_string(),
            &["WAYPOINT_DIALOG_SESSION_IDLE_TIMEOUT_SECS"][..],
        ),
        (
            "providers.timeout_ms",
            config.providers.timeout_ms.to_string(),
            &["WAYPOINT_PROVIDERS_TIMEOUT_MS"][..],
        ),
        (
            "providers.search_radius_meters",
            config.providers.search_radius_meters.to_string(),
            &["WAYPOINT_PROVIDERS_SEARCH_RADIUS_METERS"][..],
        ),
        (
            "providers.route_ranking",
            format!("{:?}", config.providers.route_ranking),
            &["WAYPOINT_PROVIDERS_ROUTE_RANKING"][..],
        ),
        ("providers.fixture_path", fixture_path, &["WAYPOINT_PROVIDERS_FIXTURE_PATH"][..]),
        (
            "logging.level",
            config.logging.level.clone(),
            &["WAYPOINT_LOGGING_LEVEL", "WAYPOINT_LOG_LEVEL"][..],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            &["WAYPOINT_LOGGING_FORMAT", "WAYPOINT_LOG_FORMAT"][..],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value, env_keys) in fields {
        lines.push(render_line(key_path, &value, source(key_path, env_keys)));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::contains_path;

    #[test]
    fn finds_nested_keys_only() {
        let doc = "[dialog]\npage_size = 3\n".parse::<Value>().expect("valid toml");
        assert!(contains_path(&doc, "dialog.page_size"));
        assert!(!contains_path(&doc, "dialog.locale"));
        assert!(!contains_path(&doc, "logging.level"));
    }
}
