use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::TransactionBehavior;

use crate::commands::common::load_setup;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{BackupDocument, BackupExportData, BackupImportData, BackupPayload};
use crate::engine::cycle::instant_from_epoch_ms;
use crate::state::{map_sqlite_error, open_connection};
use crate::store;
use crate::{CoreError, CoreResult};

pub const BACKUP_VERSION: i64 = 1;

pub fn export(path: &str) -> CoreResult<SuccessEnvelope> {
    export_with_options(path, None)
}

#[doc(hidden)]
pub fn export_with_options(
    path: &str,
    home_override: Option<&Path>,
) -> CoreResult<SuccessEnvelope> {
    let setup = load_setup(home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;

    let user_cards = store::list_user_cards(&connection, &db_path)?;
    let transactions = store::list_all_transactions(&connection, &db_path)?;

    let exported_at = instant_from_epoch_ms(store::now_epoch_ms())
        .map(|instant| instant.and_utc().to_rfc3339())
        .unwrap_or_default();
    let document = BackupDocument {
        version: BACKUP_VERSION,
        exported_at: exported_at.clone(),
        data: BackupPayload {
            user_cards,
            transactions,
        },
    };

    let body = serde_json::to_string_pretty(&document)
        .map_err(|error| CoreError::internal_serialization(&error.to_string()))?;
    fs::write(path, body).map_err(|error| CoreError::export_write_failed(path, &error.to_string()))?;

    success(
        "backup export",
        BackupExportData {
            path: path.to_string(),
            exported_at,
            user_cards: document.data.user_cards.len() as i64,
            transactions: document.data.transactions.len() as i64,
        },
    )
}

pub fn import(path: &str) -> CoreResult<SuccessEnvelope> {
    import_with_options(path, None)
}

/// Merge-by-id import: existing records are overwritten, unknown records
/// inserted, so replaying the same document is a no-op the second time.
/// Transactions referencing cards in neither the ledger nor the document
/// are imported anyway and counted as orphans.
#[doc(hidden)]
pub fn import_with_options(
    path: &str,
    home_override: Option<&Path>,
) -> CoreResult<SuccessEnvelope> {
    let body = fs::read_to_string(path)
        .map_err(|error| CoreError::backup_read_failed(path, &error.to_string()))?;
    let document: BackupDocument = serde_json::from_str(&body)
        .map_err(|error| CoreError::invalid_backup_format(path, &error.to_string()))?;

    if document.version != BACKUP_VERSION {
        return Err(CoreError::unsupported_backup_version(document.version));
    }
    validate_payload(path, &document.data)?;

    let setup = load_setup(home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let mut connection = open_connection(&db_path)?;

    let mut known_card_ids: HashSet<String> = store::list_user_cards(&connection, &db_path)?
        .into_iter()
        .map(|card| card.id)
        .collect();
    for card in &document.data.user_cards {
        known_card_ids.insert(card.id.clone());
    }

    let write = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    let mut user_cards_inserted = 0_i64;
    let mut user_cards_updated = 0_i64;
    for card in &document.data.user_cards {
        if store::upsert_user_card(&write, &db_path, card)? {
            user_cards_inserted += 1;
        } else {
            user_cards_updated += 1;
        }
    }

    let mut transactions_inserted = 0_i64;
    let mut transactions_updated = 0_i64;
    let mut orphaned_transactions = 0_i64;
    for transaction in &document.data.transactions {
        if !known_card_ids.contains(&transaction.owner_card_id) {
            orphaned_transactions += 1;
        }
        if store::upsert_transaction(&write, &db_path, transaction)? {
            transactions_inserted += 1;
        } else {
            transactions_updated += 1;
        }
    }

    write
        .commit()
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    success(
        "backup import",
        BackupImportData {
            path: path.to_string(),
            user_cards_inserted,
            user_cards_updated,
            transactions_inserted,
            transactions_updated,
            orphaned_transactions,
        },
    )
}

fn validate_payload(path: &str, payload: &BackupPayload) -> CoreResult<()> {
    for card in &payload.user_cards {
        if card.id.trim().is_empty() {
            return Err(CoreError::invalid_backup_format(
                path,
                "a user card has an empty id",
            ));
        }
        if !(1..=31).contains(&card.billing_cycle_day) {
            return Err(CoreError::invalid_backup_format(
                path,
                &format!(
                    "user card `{}` has billing day {} outside 1-31",
                    card.id, card.billing_cycle_day
                ),
            ));
        }
    }

    for transaction in &payload.transactions {
        if transaction.id.trim().is_empty() {
            return Err(CoreError::invalid_backup_format(
                path,
                "a transaction has an empty id",
            ));
        }
        if transaction.owner_card_id.trim().is_empty() {
            return Err(CoreError::invalid_backup_format(
                path,
                &format!("transaction `{}` has an empty owner card id", transaction.id),
            ));
        }
    }

    Ok(())
}
