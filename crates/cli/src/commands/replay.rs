use std::path::PathBuf;

use tracing::info;
use waypoint_agent::{replay, ReplayScript};

use crate::commands::{build_orchestrator, load_config, CommandResult};
use crate::logging::init_logging;

#[derive(Debug, Clone)]
pub struct ReplayArgs {
    pub script: PathBuf,
    pub fixtures: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Exit codes: 0 when every expectation holds, 3 on expectation failures,
/// 2 when the config, fixtures or script cannot be loaded.
pub fn run(args: &ReplayArgs) -> CommandResult {
    let config = match load_config(args.config.as_deref(), args.fixtures.clone()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "replay",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };
    init_logging(&config);

    let script = match ReplayScript::load(&args.script) {
        Ok(script) => script,
        Err(error) => {
            return CommandResult::failure("replay", "script_invalid", error.to_string(), 2);
        }
    };

    let orchestrator = match build_orchestrator(&config) {
        Ok(orchestrator) => orchestrator,
        Err(message) => return CommandResult::failure("replay", "fixtures_invalid", message, 2),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "replay",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                1,
            );
        }
    };

    let report = runtime.block_on(replay(&orchestrator, &script));
    info!(
        event_name = "cli.replay.finished",
        script = %report.script,
        passed = report.passed(),
        "replay command finished"
    );

    if report.passed() {
        CommandResult::success(
            "replay",
            format!("{}: {} steps passed", report.script, report.steps.len()),
        )
    } else {
        CommandResult::failure(
            "replay",
            "expectation_failed",
            format!(
                "{}: {} failures\n{}",
                report.script,
                report.failure_count(),
                report.failure_lines().join("\n")
            ),
            3,
        )
    }
}
