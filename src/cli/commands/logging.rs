use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Index is the verbosity count that `-v` flags would produce.
const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// `MEMBER_PORTAL_LOG_LEVEL` takes a level name or its verbosity count.
fn parse_level(level: &str) -> Result<u8, String> {
    let level = level.trim();
    let count = match level.parse::<usize>() {
        Ok(count) => count,
        Err(_) => LEVELS
            .iter()
            .position(|name| name.eq_ignore_ascii_case(level))
            .ok_or_else(|| format!("invalid log level {level:?}, expected one of {LEVELS:?}"))?,
    };

    u8::try_from(count)
        .ok()
        .filter(|count| usize::from(*count) < LEVELS.len())
        .ok_or_else(|| format!("log level {count} out of range 0-{}", LEVELS.len() - 1))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("MEMBER_PORTAL_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(ValueParser::new(parse_level)),
    )
}
