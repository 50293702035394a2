use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoDate(pub String);

impl IsoDate {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn parse_iso_date(value: &str) -> Result<IsoDate, String> {
    if value.len() != 10 {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return Err("date must use YYYY-MM-DD format".to_string());
        }
    }

    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        return Err("date must use valid calendar values".to_string());
    }

    Ok(IsoDate(value.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Month(pub String);

impl Month {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn parse_month(value: &str) -> Result<Month, String> {
    if value.len() != 7 {
        return Err("month must use YYYY-MM format".to_string());
    }

    let bytes = value.as_bytes();
    if bytes[4] != b'-' {
        return Err("month must use YYYY-MM format".to_string());
    }
    for index in [0usize, 1, 2, 3, 5, 6] {
        if !bytes[index].is_ascii_digit() {
            return Err("month must use YYYY-MM format".to_string());
        }
    }

    let month_number = value[5..].parse::<u32>().unwrap_or(0);
    if !(1..=12).contains(&month_number) {
        return Err("month must be between 01 and 12".to_string());
    }

    Ok(Month(value.to_string()))
}

#[derive(Debug, Parser)]
#[command(
    name = "kickback",
    version,
    about = "credit card cash-back recommender",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Browse the supported card catalog
    #[command(arg_required_else_help = true)]
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Manage your owned cards
    #[command(arg_required_else_help = true)]
    Card {
        #[command(subcommand)]
        command: CardCommand,
    },
    /// Rank your cards for a spend: best cash-back first
    Recommend {
        /// Spending category (e.g. dining, groceries, online)
        category: String,
        /// Spend amount
        amount: f64,
        #[arg(long)]
        json: bool,
    },
    /// Record a spend against one of your cards
    Log {
        /// Owned card id (see `kickback card list`)
        user_card_id: String,
        /// Spend amount
        #[arg(long)]
        amount: f64,
        /// Spending category
        #[arg(long)]
        category: String,
        /// Free-text note
        #[arg(long)]
        note: Option<String>,
        /// Credited reward override; defaults to the calculator's estimate
        #[arg(long)]
        reward: Option<f64>,
        /// Spend date (YYYY-MM-DD); defaults to now
        #[arg(long, value_parser = parse_iso_date)]
        at: Option<IsoDate>,
        #[arg(long)]
        json: bool,
    },
    /// Inspect and maintain recorded spends
    #[command(arg_required_else_help = true)]
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
    /// Export or import a JSON backup of your ledger
    #[command(arg_required_else_help = true)]
    Backup {
        #[command(subcommand)]
        command: BackupCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum CatalogCommand {
    /// List every card definition kickback knows about
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum CardCommand {
    /// Add a card from the catalog to your wallet
    Add {
        /// Catalog definition id (see `kickback catalog list`)
        card_def_id: String,
        /// Statement closing day (1-31); defaults to the catalog value
        #[arg(long)]
        billing_day: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// List your owned cards
    List {
        #[arg(long)]
        json: bool,
    },
    /// Remove an owned card and its recorded transactions
    Remove {
        user_card_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Change an owned card's statement closing day
    BillingDay {
        user_card_id: String,
        /// New closing day (1-31)
        day: u32,
        #[arg(long)]
        json: bool,
    },
    /// Include a card in recommendations again
    Enable {
        user_card_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Exclude a card from recommendations without removing it
    Disable {
        user_card_id: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List recorded spends, newest first
    List {
        /// Restrict to one owned card id
        #[arg(long)]
        card: Option<String>,
        /// Restrict to one calendar month (YYYY-MM)
        #[arg(long, value_parser = parse_month)]
        month: Option<Month>,
        #[arg(long)]
        json: bool,
    },
    /// Edit a recorded spend; edited values are taken as ground truth
    Edit {
        txn_id: String,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        reward: Option<f64>,
        /// New note; pass an empty string to clear it
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Delete a recorded spend
    Remove {
        txn_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Write the full history to a CSV file
    Export {
        /// Destination file path
        path: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Write a JSON backup of cards and transactions
    Export {
        /// Destination file path
        path: String,
        #[arg(long)]
        json: bool,
    },
    /// Merge a JSON backup into the ledger (overwrite by id)
    Import {
        /// Backup file path
        path: String,
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
pub fn parse_from<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

#[cfg(test)]
mod tests {
    use super::{parse_from, parse_iso_date, parse_month};

    #[test]
    fn iso_date_parser_rejects_malformed_values() {
        assert!(parse_iso_date("2026-04-31").is_err());
        assert!(parse_iso_date("2026-4-01").is_err());
        assert!(parse_iso_date("tomorrow").is_err());
        assert!(parse_iso_date("2026-04-30").is_ok());
    }

    #[test]
    fn month_parser_rejects_malformed_values() {
        assert!(parse_month("2026-13").is_err());
        assert!(parse_month("2026-4").is_err());
        assert!(parse_month("April").is_err());
        assert!(parse_month("2026-04").is_ok());
    }

    #[test]
    fn recommend_takes_positional_category_and_amount() {
        let parsed = parse_from(["kickback", "recommend", "dining", "450.0"]);
        assert!(parsed.is_ok());
    }

    #[test]
    fn log_requires_amount_and_category_flags() {
        let missing = parse_from(["kickback", "log", "card_1"]);
        assert!(missing.is_err());

        let full = parse_from([
            "kickback",
            "log",
            "card_1",
            "--amount",
            "120",
            "--category",
            "gas",
            "--at",
            "2026-03-14",
        ]);
        assert!(full.is_ok());
    }

    #[test]
    fn card_subcommands_parse() {
        for args in [
            vec!["kickback", "card", "add", "atlas-voyager"],
            vec!["kickback", "card", "add", "atlas-voyager", "--billing-day", "9"],
            vec!["kickback", "card", "list", "--json"],
            vec!["kickback", "card", "remove", "card_1"],
            vec!["kickback", "card", "billing-day", "card_1", "12"],
            vec!["kickback", "card", "enable", "card_1"],
            vec!["kickback", "card", "disable", "card_1"],
        ] {
            assert!(parse_from(args).is_ok());
        }
    }

    #[test]
    fn history_and_backup_subcommands_parse() {
        for args in [
            vec!["kickback", "history", "list", "--month", "2026-02"],
            vec!["kickback", "history", "edit", "txn_1", "--reward", "12.5"],
            vec!["kickback", "history", "remove", "txn_1"],
            vec!["kickback", "history", "export", "rows.csv"],
            vec!["kickback", "backup", "export", "backup.json"],
            vec!["kickback", "backup", "import", "backup.json", "--json"],
        ] {
            assert!(parse_from(args).is_ok());
        }
    }
}
