use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CoreError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

impl CoreError {
    pub fn new(code: &str, message: &str, recovery_steps: Vec<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::invalid_argument_for_command(message, None)
    }

    pub fn invalid_argument_for_command(message: &str, command: Option<&str>) -> Self {
        let help_hint = match command {
            Some(cmd) => format!("Run `kickback {cmd} --help` for usage."),
            None => "Run `kickback --help` for usage.".to_string(),
        };
        let error = Self::new("invalid_argument", message, vec![help_hint]);
        if let Some(cmd) = command {
            return error.with_data(json!({
                "command_hint": cmd,
            }));
        }
        error
    }

    pub fn card_definition_missing(card_def_id: &str) -> Self {
        Self::new(
            "card_definition_missing",
            &format!("Card definition `{card_def_id}` is not in the catalog."),
            vec![
                "Run `kickback catalog list` to see supported card definitions.".to_string(),
                "Remove the card with `kickback card remove <user-card-id>` if the definition was retired."
                    .to_string(),
            ],
        )
        .with_data(json!({
            "card_def_id": card_def_id,
        }))
    }

    pub fn card_not_found(user_card_id: &str) -> Self {
        Self::new(
            "card_not_found",
            &format!("Owned card `{user_card_id}` was not found."),
            vec![
                "Run `kickback card list` to find a valid card id.".to_string(),
                "Add a card with `kickback card add <card-def-id>`.".to_string(),
            ],
        )
        .with_data(json!({
            "user_card_id": user_card_id,
        }))
    }

    pub fn transaction_not_found(txn_id: &str) -> Self {
        Self::new(
            "transaction_not_found",
            &format!("Transaction `{txn_id}` was not found."),
            vec!["Run `kickback history list` to find a valid transaction id.".to_string()],
        )
        .with_data(json!({
            "txn_id": txn_id,
        }))
    }

    pub fn invalid_backup_format(path: &str, detail: &str) -> Self {
        Self::new(
            "invalid_backup_format",
            &format!("Backup file `{path}` is not a valid kickback backup: {detail}"),
            vec![
                "Export a fresh backup with `kickback backup export <path>` to see the expected shape."
                    .to_string(),
                "Fix the listed problem in the file and rerun `kickback backup import <path>`."
                    .to_string(),
            ],
        )
    }

    pub fn unsupported_backup_version(version: i64) -> Self {
        Self::new(
            "unsupported_backup_version",
            &format!("Backup document version {version} is not supported."),
            vec!["Re-export the backup with a matching kickback release.".to_string()],
        )
        .with_data(json!({
            "version": version,
        }))
    }

    pub fn export_write_failed(path: &str, detail: &str) -> Self {
        Self::new(
            "export_write_failed",
            &format!("Could not write export file `{path}`: {detail}"),
            vec![format!(
                "Choose a writable destination path instead of `{path}` and retry."
            )],
        )
    }

    pub fn backup_read_failed(path: &str, detail: &str) -> Self {
        Self::new(
            "backup_read_failed",
            &format!("Could not read backup file `{path}`: {detail}"),
            vec!["Check the path and file permissions, then retry the import.".to_string()],
        )
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("internal_serialization_error", message, Vec::new())
    }

    pub fn internal_catalog(detail: &str) -> Self {
        Self::new(
            "internal_catalog_error",
            &format!("Bundled card catalog failed to load: {detail}"),
            Vec::new(),
        )
    }

    pub fn ledger_init_permission_denied(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_init_permission_denied",
            &format!("Cannot initialize ledger at `{location}`: {detail}"),
            vec![format!(
                "Grant write access to `{location}` or set `KICKBACK_HOME` to a writable directory."
            )],
        )
    }

    pub fn ledger_locked(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_locked",
            &format!("Ledger database is locked at `{location}`."),
            vec![format!(
                "Close other processes using `{location}` so the lock is released."
            )],
        )
    }

    pub fn ledger_corrupt(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_corrupt",
            &format!("Ledger database appears corrupt at `{location}`."),
            vec![format!(
                "Replace `{location}` with a valid SQLite ledger file or restore from backup."
            )],
        )
    }

    pub fn migration_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "migration_failed",
            &format!("Ledger migration failed at `{location}`: {detail}"),
            vec!["Resolve conflicting schema objects referenced in the error details.".to_string()],
        )
    }

    pub fn ledger_init_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_init_failed",
            &format!("Ledger initialization failed at `{location}`: {detail}"),
            Vec::new(),
        )
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
