use kickback_core::commands;
use kickback_core::{CoreResult, SuccessEnvelope};

use crate::cli::{BackupCommand, CardCommand, CatalogCommand, Cli, Commands, HistoryCommand};

pub fn dispatch(cli: &Cli) -> CoreResult<SuccessEnvelope> {
    match &cli.command {
        Commands::Catalog { command } => match command {
            CatalogCommand::List { .. } => commands::catalog::list(),
        },
        Commands::Card { command } => match command {
            CardCommand::Add {
                card_def_id,
                billing_day,
                ..
            } => commands::cards::add(card_def_id, *billing_day),
            CardCommand::List { .. } => commands::cards::list(),
            CardCommand::Remove { user_card_id, .. } => commands::cards::remove(user_card_id),
            CardCommand::BillingDay {
                user_card_id, day, ..
            } => commands::cards::billing_day(user_card_id, *day),
            CardCommand::Enable { user_card_id, .. } => {
                commands::cards::set_enabled(user_card_id, true)
            }
            CardCommand::Disable { user_card_id, .. } => {
                commands::cards::set_enabled(user_card_id, false)
            }
        },
        Commands::Recommend {
            category, amount, ..
        } => commands::recommend::run(category, *amount),
        Commands::Log {
            user_card_id,
            amount,
            category,
            note,
            reward,
            at,
            ..
        } => commands::history::log(
            user_card_id,
            *amount,
            category,
            note.as_deref(),
            *reward,
            at.as_ref().map(|value| value.as_str()),
        ),
        Commands::History { command } => match command {
            HistoryCommand::List { card, month, .. } => commands::history::list(
                card.as_deref(),
                month.as_ref().map(|value| value.as_str()),
            ),
            HistoryCommand::Edit {
                txn_id,
                amount,
                reward,
                note,
                ..
            } => commands::history::edit(txn_id, *amount, *reward, note.as_deref()),
            HistoryCommand::Remove { txn_id, .. } => commands::history::remove(txn_id),
            HistoryCommand::Export { path, .. } => commands::history::export(path),
        },
        Commands::Backup { command } => match command {
            BackupCommand::Export { path, .. } => commands::backup::export(path),
            BackupCommand::Import { path, .. } => commands::backup::import(path),
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::cli::parse_from;

    use super::dispatch;

    #[test]
    fn catalog_list_dispatches_without_touching_the_ledger() {
        let parsed = parse_from(["kickback", "catalog", "list"]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            let response = dispatch(&cli);
            assert!(response.is_ok());
            if let Ok(success) = response {
                assert_eq!(success.command, "catalog list");
            }
        }
    }

    #[test]
    fn bare_group_commands_are_not_dispatchable() {
        for args in [
            vec!["kickback", "card"],
            vec!["kickback", "history"],
            vec!["kickback", "backup"],
            vec!["kickback", "catalog"],
        ] {
            assert!(parse_from(args).is_err());
        }
    }

    #[test]
    fn unknown_subcommands_fail_to_parse() {
        assert!(parse_from(["kickback", "wallet"]).is_err());
        assert!(parse_from(["kickback", "card", "upgrade", "card_1"]).is_err());
    }
}
