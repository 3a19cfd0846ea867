use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use waypoint_agent::{Reply, SkillHost, TurnInput};
use waypoint_core::cards::{Card, CardElement};
use waypoint_core::domain::Coordinates;

use crate::commands::{build_orchestrator, load_config, CommandResult};
use crate::logging::init_logging;

const LOCATION_USAGE: &str = "usage: /location <lat>,<lon>";

pub fn run(config_path: Option<&Path>, fixtures: Option<PathBuf>) -> CommandResult {
    let config = match load_config(config_path, fixtures) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };
    init_logging(&config);

    let orchestrator = match build_orchestrator(&config) {
        Ok(orchestrator) => orchestrator,
        Err(message) => return CommandResult::failure("chat", "fixtures_invalid", message, 2),
    };
    let host = SkillHost::new(Arc::new(orchestrator), config.dialog.session_idle_timeout());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    match converse(&host, stdin.lock(), &mut stdout) {
        Ok(turns) => CommandResult::success("chat", format!("session ended after {turns} turns")),
        Err(error) => CommandResult::failure("chat", "io", format!("{error:#}"), 1),
    }
}

/// Drives one conversation from `input` until EOF or `/quit`, writing each
/// reply to `output`. Returns the number of turns sent.
pub fn converse(host: &SkillHost, input: impl BufRead, output: &mut impl Write) -> Result<usize> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to initialize async runtime")?;
    let conversation = runtime.block_on(host.start_conversation());

    let greeting = runtime.block_on(host.handle(conversation, TurnInput::Utterance(String::new())));
    write_replies(output, &greeting)?;

    let mut turns = 0;
    for line in input.lines() {
        let line = line.context("failed to read from stdin")?;
        let line = line.trim();
        if line == "/quit" {
            break;
        }

        let turn = if let Some(rest) = line.strip_prefix("/location") {
            match parse_coordinates(rest) {
                Some(coordinates) => TurnInput::Location(coordinates),
                None => {
                    writeln!(output, "{LOCATION_USAGE}").context("failed to write reply")?;
                    continue;
                }
            }
        } else {
            TurnInput::Utterance(line.to_string())
        };

        let replies = runtime.block_on(host.handle(conversation, turn));
        write_replies(output, &replies)?;
        turns += 1;
    }

    Ok(turns)
}

fn parse_coordinates(text: &str) -> Option<Coordinates> {
    let (latitude, longitude) = text.trim().split_once(',')?;
    let coordinates =
        Coordinates::new(latitude.trim().parse().ok()?, longitude.trim().parse().ok()?);
    coordinates.is_valid().then_some(coordinates)
}

fn write_replies(output: &mut impl Write, replies: &[Reply]) -> Result<()> {
    for reply in replies {
        match reply {
            Reply::Message(message) => {
                if let Some(text) = &message.text {
                    writeln!(output, "bot> {text}")?;
                }
                for card in &message.cards {
                    write_card(output, card)?;
                }
            }
            Reply::Event(event) => {
                writeln!(output, "[event:{:?}] {}", event.kind(), event.uri())?;
            }
        }
    }
    output.flush().context("failed to flush reply")
}

fn write_card(output: &mut impl Write, card: &Card) -> Result<()> {
    writeln!(output, "  [{}] {}", card.id.as_str(), card.title)?;
    for element in &card.body {
        match element {
            CardElement::Text { text } => writeln!(output, "    {text}")?,
            CardElement::Fact { label, value } => writeln!(output, "    {label}: {value}")?,
            CardElement::Choice { ordinal, label, detail } => {
                writeln!(output, "    {ordinal}. {label} ({detail})")?
            }
            CardElement::Action { label, .. } => writeln!(output, "    > {label}")?,
        }
    }
    Ok(())
}
