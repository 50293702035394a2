mod cli;
mod dispatch;
mod output;
mod stdout_io;

use std::process::ExitCode;

use clap::{Parser, error::ErrorKind};
use kickback_core::CoreError;
use stdout_io::write_stdout_text;

const ROOT_HELP: &str = "Kickback - credit card cash-back recommender

Usage:
  kickback <command>

Start here:
  kickback catalog list
  kickback card add <card-def-id>
  kickback recommend <category> <amount>
";

const TOP_LEVEL_HELP: &str = "Kickback — credit card cash-back recommender

USAGE: kickback <command>

Set up your wallet:
  1. kickback catalog list                                Browse supported card definitions
  2. kickback card add <card-def-id>                      Add a card you own
  3. kickback card billing-day <user-card-id> <day>       Match your statement closing day

Ask before you pay:
  kickback recommend <category> <amount>                  Rank your cards for a spend
  kickback log <user-card-id> --amount A --category C     Record the spend you made

Review what you earned:
  kickback history list [--card id] [--month YYYY-MM]     Recorded spends with totals
  kickback history export <path>                          CSV export of the full history

Keep your data yours:
  kickback backup export <path>                           JSON backup of cards and spends
  kickback backup import <path>                           Merge a backup back in (safe to retry)

Cap warnings appear inline on recommendations: a card close to a reward
cap earns less than its headline rate until the cycle resets.

Run `kickback <command> --help` for command usage.
";

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(code) => code,
    }
}

fn run() -> Result<ExitCode, ExitCode> {
    let raw_args = std::env::args().collect::<Vec<String>>();
    if raw_args.len() == 1 {
        if write_stdout_text(ROOT_HELP).is_err() {
            return Err(ExitCode::from(2));
        }
        return Ok(ExitCode::SUCCESS);
    }
    let parsed = cli::Cli::try_parse();
    let cli = match parsed {
        Ok(value) => value,
        Err(err) => {
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) {
                if matches!(
                    err.kind(),
                    ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) && is_top_level_help_request(&raw_args)
                {
                    if write_stdout_text(TOP_LEVEL_HELP).is_err() {
                        return Err(ExitCode::from(2));
                    }
                } else if write_stdout_text(&err.to_string()).is_err() {
                    return Err(ExitCode::from(2));
                }
                return Ok(ExitCode::SUCCESS);
            }
            let command_hint = if matches!(
                err.kind(),
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::InvalidValue
                    | ErrorKind::ValueValidation
                    | ErrorKind::WrongNumberOfValues
                    | ErrorKind::UnknownArgument
                    | ErrorKind::InvalidSubcommand
            ) {
                command_path_from_args(&raw_args)
            } else {
                None
            };
            let clean_message = strip_clap_boilerplate(&err.to_string());
            let parse_error =
                CoreError::invalid_argument_for_command(&clean_message, command_hint.as_deref());
            let mode = infer_requested_output_mode(&raw_args);
            if output::print_failure(&parse_error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            return Err(ExitCode::from(1));
        }
    };
    let mode = output::mode_for_command(&cli.command);

    let dispatched = dispatch::dispatch(&cli);
    match dispatched {
        Ok(success) => {
            if output::print_success(&success, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            if output::print_failure(&error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(exit_code_for_error(&error))
        }
    }
}

fn is_top_level_help_request(raw_args: &[String]) -> bool {
    raw_args.len() == 2 && matches!(raw_args[1].as_str(), "--help" | "-h")
}

/// Strips clap's trailing boilerplate (Usage line, "For more information"
/// hint) so the error contract's recovery steps are the single source of
/// guidance.
fn strip_clap_boilerplate(message: &str) -> String {
    let trimmed = if let Some(pos) = message.find("\n\nUsage:") {
        &message[..pos]
    } else if let Some(pos) = message.find("\nFor more information") {
        &message[..pos]
    } else {
        message
    };
    trimmed.trim_end().to_string()
}

/// Builds the subcommand path from raw CLI args for use in help hints.
fn command_path_from_args(raw_args: &[String]) -> Option<String> {
    let non_flags: Vec<&str> = raw_args
        .iter()
        .skip(1)
        .filter(|value| !value.starts_with('-'))
        .map(String::as_str)
        .collect();
    if non_flags.is_empty() {
        return None;
    }

    let hint = match non_flags.as_slice() {
        ["catalog", "list", ..] => Some("catalog list"),
        ["catalog", ..] => Some("catalog"),
        ["card", "add", ..] => Some("card add"),
        ["card", "list", ..] => Some("card list"),
        ["card", "remove", ..] => Some("card remove"),
        ["card", "billing-day", ..] => Some("card billing-day"),
        ["card", "enable", ..] => Some("card enable"),
        ["card", "disable", ..] => Some("card disable"),
        ["card", ..] => Some("card"),
        ["recommend", ..] => Some("recommend"),
        ["log", ..] => Some("log"),
        ["history", "list", ..] => Some("history list"),
        ["history", "edit", ..] => Some("history edit"),
        ["history", "remove", ..] => Some("history remove"),
        ["history", "export", ..] => Some("history export"),
        ["history", ..] => Some("history"),
        ["backup", "export", ..] => Some("backup export"),
        ["backup", "import", ..] => Some("backup import"),
        ["backup", ..] => Some("backup"),
        _ => None,
    };
    hint.map(std::string::ToString::to_string)
}

fn exit_code_for_error(error: &CoreError) -> ExitCode {
    if is_internal_error(error) {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

fn infer_requested_output_mode(raw_args: &[String]) -> output::OutputMode {
    if raw_args.iter().skip(1).any(|value| value == "--json") {
        return output::OutputMode::Json;
    }
    output::OutputMode::Text
}

fn is_internal_error(error: &CoreError) -> bool {
    error.code.starts_with("internal_")
        || matches!(
            error.code.as_str(),
            "ledger_init_permission_denied"
                | "ledger_locked"
                | "ledger_corrupt"
                | "migration_failed"
                | "ledger_init_failed"
        )
}

#[cfg(test)]
mod tests {
    use super::{command_path_from_args, is_internal_error, strip_clap_boilerplate};
    use kickback_core::CoreError;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn command_hints_follow_the_subcommand_path() {
        let hint = command_path_from_args(&args(&["kickback", "card", "billing-day", "card_1"]));
        assert_eq!(hint.as_deref(), Some("card billing-day"));

        let hint = command_path_from_args(&args(&["kickback", "history", "list", "--month", "x"]));
        assert_eq!(hint.as_deref(), Some("history list"));
    }

    #[test]
    fn clap_boilerplate_is_stripped_from_parse_errors() {
        let message = "error: invalid value\n\nUsage: kickback recommend <CATEGORY> <AMOUNT>";
        assert_eq!(strip_clap_boilerplate(message), "error: invalid value");
    }

    #[test]
    fn infrastructure_errors_map_to_exit_code_two() {
        assert!(is_internal_error(&CoreError::internal_serialization("x")));
        assert!(is_internal_error(&CoreError::ledger_corrupt(
            std::path::Path::new("/tmp/ledger.db")
        )));
        assert!(!is_internal_error(&CoreError::card_not_found("card_1")));
    }
}
