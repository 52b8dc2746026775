//! Command-line interface

use crate::config::HarnessConfig;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;
use upgrade_proposal::CatalogueMode;

/// Subcommand to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Apply the catalogue and report
    Run,
    /// Load everything and report dependency issues without running
    Check,
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Subcommand
    pub action: Action,
    /// Config file
    pub config: PathBuf,
    /// Force logging on
    pub logging: bool,
    /// Print the JSON summary instead of the text report
    pub json: bool,
    /// Treat every proposal as already deployed
    pub replay: bool,
    /// Emit logs as JSON
    pub json_logs: bool,
}

impl Invocation {
    /// Apply flag overrides to a loaded config
    pub fn apply(&self, config: &mut HarnessConfig) {
        if self.logging {
            config.logging = true;
        }
        if self.replay {
            config.mode = CatalogueMode::Replay;
        }
    }
}

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .default_value("harness.toml")
        .value_parser(value_parser!(PathBuf))
        .help("Harness configuration file")
}

fn logging_arg() -> Arg {
    Arg::new("logging")
        .long("logging")
        .env("LOGGING")
        .action(ArgAction::SetTrue)
        .help("Emit informational diagnostics")
}

fn json_logs_arg() -> Arg {
    Arg::new("json-logs")
        .long("json-logs")
        .action(ArgAction::SetTrue)
        .help("Emit logs as JSON")
}

/// Build the command
#[must_use]
pub fn command() -> Command {
    Command::new("upgrade-harness")
        .version(upgrade_core::VERSION)
        .about("Apply a proposal catalogue and validate the resulting state")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Run every proposal through deploy, setup, validate and teardown")
                .arg(config_arg())
                .arg(logging_arg())
                .arg(json_logs_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the run summary as JSON"),
                )
                .arg(
                    Arg::new("replay")
                        .long("replay")
                        .action(ArgAction::SetTrue)
                        .help("Treat every proposal as already deployed"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Check catalogue dependencies without running")
                .arg(config_arg())
                .arg(logging_arg())
                .arg(json_logs_arg()),
        )
}

/// Parse arguments
///
/// # Errors
/// Returns the clap error for invalid input, `--help` and `--version`
pub fn parse_from<I, T>(args: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    match matches.subcommand() {
        Some(("run", args)) => Ok(invocation(Action::Run, args)),
        Some(("check", args)) => Ok(invocation(Action::Check, args)),
        _ => Err(command().error(
            clap::error::ErrorKind::MissingSubcommand,
            "a subcommand is required",
        )),
    }
}

fn invocation(action: Action, args: &ArgMatches) -> Invocation {
    let flag = |id: &str| {
        args.try_get_one::<bool>(id)
            .ok()
            .flatten()
            .copied()
            .unwrap_or(false)
    };
    Invocation {
        action,
        config: args
            .get_one::<PathBuf>("config")
            .cloned()
            .unwrap_or_else(|| PathBuf::from("harness.toml")),
        logging: flag("logging"),
        json: flag("json"),
        replay: flag("replay"),
        json_logs: flag("json-logs"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn run_flags() {
        let invocation =
            parse_from(["upgrade-harness", "run", "--config", "ci.toml", "--json", "--replay"])
                .unwrap();
        assert_eq!(invocation.action, Action::Run);
        assert_eq!(invocation.config, PathBuf::from("ci.toml"));
        assert!(invocation.json);
        assert!(invocation.replay);
        assert!(!invocation.json_logs);
    }

    #[test]
    fn check_has_no_run_flags() {
        let invocation = parse_from(["upgrade-harness", "check"]).unwrap();
        assert_eq!(invocation.action, Action::Check);
        assert_eq!(invocation.config, PathBuf::from("harness.toml"));
        assert!(!invocation.json);
        assert!(parse_from(["upgrade-harness", "check", "--json"]).is_err());
    }

    #[test]
    fn overrides_apply_to_config() {
        let invocation = parse_from(["upgrade-harness", "run", "--replay", "--logging"]).unwrap();
        let mut config = HarnessConfig::default();
        invocation.apply(&mut config);
        assert!(config.logging);
        assert_eq!(config.mode, CatalogueMode::Replay);
    }
}
