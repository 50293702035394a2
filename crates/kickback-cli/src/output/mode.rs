use crate::cli::{BackupCommand, CardCommand, CatalogCommand, Commands, HistoryCommand};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    let json = match command {
        Commands::Catalog { command } => match command {
            CatalogCommand::List { json } => *json,
        },
        Commands::Card { command } => match command {
            CardCommand::Add { json, .. }
            | CardCommand::List { json }
            | CardCommand::Remove { json, .. }
            | CardCommand::BillingDay { json, .. }
            | CardCommand::Enable { json, .. }
            | CardCommand::Disable { json, .. } => *json,
        },
        Commands::Recommend { json, .. } | Commands::Log { json, .. } => *json,
        Commands::History { command } => match command {
            HistoryCommand::List { json, .. }
            | HistoryCommand::Edit { json, .. }
            | HistoryCommand::Remove { json, .. }
            | HistoryCommand::Export { json, .. } => *json,
        },
        Commands::Backup { command } => match command {
            BackupCommand::Export { json, .. } | BackupCommand::Import { json, .. } => *json,
        },
    };

    if json { OutputMode::Json } else { OutputMode::Text }
}
