use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use ulid::Ulid;

use crate::CoreResult;
use crate::engine::types::{Transaction, UserCard};
use crate::state::map_sqlite_error;

pub fn new_user_card_id() -> String {
    format!("card_{}", Ulid::new())
}

pub fn new_transaction_id() -> String {
    format!("txn_{}", Ulid::new())
}

pub fn now_timestamp() -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH);
    match now {
        Ok(duration) => format!("{}", duration.as_secs()),
        Err(_) => "0".to_string(),
    }
}

pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as i64)
        .unwrap_or(0)
}

pub fn insert_user_card(
    connection: &Connection,
    db_path: &Path,
    card: &UserCard,
) -> CoreResult<()> {
    let timestamp = now_timestamp();
    connection
        .execute(
            "INSERT INTO internal_user_cards (
                user_card_id,
                card_def_id,
                billing_cycle_day,
                is_enabled,
                created_at,
                updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &card.id,
                &card.card_def_id,
                card.billing_cycle_day,
                i64::from(card.is_enabled),
                &timestamp,
                &timestamp
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}

pub fn upsert_user_card(
    connection: &Connection,
    db_path: &Path,
    card: &UserCard,
) -> CoreResult<bool> {
    let timestamp = now_timestamp();
    let existing = find_user_card(connection, db_path, &card.id)?;
    connection
        .execute(
            "INSERT INTO internal_user_cards (
                user_card_id,
                card_def_id,
                billing_cycle_day,
                is_enabled,
                created_at,
                updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT (user_card_id) DO UPDATE SET
                card_def_id = excluded.card_def_id,
                billing_cycle_day = excluded.billing_cycle_day,
                is_enabled = excluded.is_enabled,
                updated_at = excluded.updated_at",
            params![
                &card.id,
                &card.card_def_id,
                card.billing_cycle_day,
                i64::from(card.is_enabled),
                &timestamp
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(existing.is_none())
}

pub fn list_user_cards(connection: &Connection, db_path: &Path) -> CoreResult<Vec<UserCard>> {
    let mut statement = connection
        .prepare(
            "SELECT user_card_id, card_def_id, billing_cycle_day, is_enabled
             FROM internal_user_cards
             ORDER BY created_at ASC, user_card_id ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map([], user_card_from_row)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rows = Vec::new();
    for row in rows_iter {
        rows.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(rows)
}

pub fn find_user_card(
    connection: &Connection,
    db_path: &Path,
    user_card_id: &str,
) -> CoreResult<Option<UserCard>> {
    connection
        .query_row(
            "SELECT user_card_id, card_def_id, billing_cycle_day, is_enabled
             FROM internal_user_cards
             WHERE user_card_id = ?1 LIMIT 1",
            [user_card_id],
            user_card_from_row,
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

pub fn update_billing_day(
    connection: &Connection,
    db_path: &Path,
    user_card_id: &str,
    billing_cycle_day: u32,
) -> CoreResult<bool> {
    let changed = connection
        .execute(
            "UPDATE internal_user_cards
             SET billing_cycle_day = ?2, updated_at = ?3
             WHERE user_card_id = ?1",
            params![user_card_id, billing_cycle_day, now_timestamp()],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(changed > 0)
}

pub fn set_enabled(
    connection: &Connection,
    db_path: &Path,
    user_card_id: &str,
    enabled: bool,
) -> CoreResult<bool> {
    let changed = connection
        .execute(
            "UPDATE internal_user_cards
             SET is_enabled = ?2, updated_at = ?3
             WHERE user_card_id = ?1",
            params![user_card_id, i64::from(enabled), now_timestamp()],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(changed > 0)
}

/// Deletes an owned card and all of its transactions in one write
/// transaction, so a removed card never strands history rows.
pub fn delete_user_card(
    connection: &mut Connection,
    db_path: &Path,
    user_card_id: &str,
) -> CoreResult<Option<i64>> {
    let write = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let transactions_removed = write
        .execute(
            "DELETE FROM internal_transactions WHERE user_card_id = ?1",
            [user_card_id],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let cards_removed = write
        .execute(
            "DELETE FROM internal_user_cards WHERE user_card_id = ?1",
            [user_card_id],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    write
        .commit()
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    if cards_removed == 0 {
        return Ok(None);
    }
    Ok(Some(transactions_removed as i64))
}

pub fn insert_transaction(
    connection: &Connection,
    db_path: &Path,
    transaction: &Transaction,
) -> CoreResult<()> {
    connection
        .execute(
            "INSERT INTO internal_transactions (
                txn_id,
                user_card_id,
                spent_at_ms,
                amount,
                category,
                reward_amount,
                note
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &transaction.id,
                &transaction.owner_card_id,
                transaction.timestamp,
                transaction.amount,
                &transaction.category,
                transaction.reward_amount,
                &transaction.note
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}

pub fn upsert_transaction(
    connection: &Connection,
    db_path: &Path,
    transaction: &Transaction,
) -> CoreResult<bool> {
    let existing = find_transaction(connection, db_path, &transaction.id)?;
    connection
        .execute(
            "INSERT INTO internal_transactions (
                txn_id,
                user_card_id,
                spent_at_ms,
                amount,
                category,
                reward_amount,
                note
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (txn_id) DO UPDATE SET
                user_card_id = excluded.user_card_id,
                spent_at_ms = excluded.spent_at_ms,
                amount = excluded.amount,
                category = excluded.category,
                reward_amount = excluded.reward_amount,
                note = excluded.note",
            params![
                &transaction.id,
                &transaction.owner_card_id,
                transaction.timestamp,
                transaction.amount,
                &transaction.category,
                transaction.reward_amount,
                &transaction.note
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(existing.is_none())
}

pub fn find_transaction(
    connection: &Connection,
    db_path: &Path,
    txn_id: &str,
) -> CoreResult<Option<Transaction>> {
    connection
        .query_row(
            "SELECT txn_id, user_card_id, spent_at_ms, amount, category, reward_amount, note
             FROM internal_transactions
             WHERE txn_id = ?1 LIMIT 1",
            [txn_id],
            transaction_from_row,
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

pub fn update_transaction(
    connection: &Connection,
    db_path: &Path,
    transaction: &Transaction,
) -> CoreResult<bool> {
    let changed = connection
        .execute(
            "UPDATE internal_transactions
             SET amount = ?2, reward_amount = ?3, note = ?4
             WHERE txn_id = ?1",
            params![
                &transaction.id,
                transaction.amount,
                transaction.reward_amount,
                &transaction.note
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(changed > 0)
}

pub fn delete_transaction(
    connection: &Connection,
    db_path: &Path,
    txn_id: &str,
) -> CoreResult<bool> {
    let changed = connection
        .execute("DELETE FROM internal_transactions WHERE txn_id = ?1", [txn_id])
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(changed > 0)
}

/// Full history for one owned card, oldest first. The engine's cap
/// accounting narrows this to the active cycle window itself.
pub fn list_transactions_for_card(
    connection: &Connection,
    db_path: &Path,
    user_card_id: &str,
) -> CoreResult<Vec<Transaction>> {
    let mut statement = connection
        .prepare(
            "SELECT txn_id, user_card_id, spent_at_ms, amount, category, reward_amount, note
             FROM internal_transactions
             WHERE user_card_id = ?1
             ORDER BY spent_at_ms ASC, txn_id ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map([user_card_id], transaction_from_row)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rows = Vec::new();
    for row in rows_iter {
        rows.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(rows)
}

#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub user_card_id: Option<String>,
    /// Closed epoch-millisecond range.
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
}

/// History rows joined with their owning card's definition id, newest
/// first. The join is a LEFT JOIN: transactions whose card was removed
/// outside the cascade path (e.g. restored from a backup) still list,
/// with no definition id.
pub fn list_history(
    connection: &Connection,
    db_path: &Path,
    filter: &HistoryFilter,
) -> CoreResult<Vec<(Transaction, Option<String>)>> {
    let mut statement = connection
        .prepare(
            "SELECT
                t.txn_id,
                t.user_card_id,
                t.spent_at_ms,
                t.amount,
                t.category,
                t.reward_amount,
                t.note,
                c.card_def_id
             FROM internal_transactions t
             LEFT JOIN internal_user_cards c ON c.user_card_id = t.user_card_id
             WHERE (?1 IS NULL OR t.user_card_id = ?1)
               AND (?2 IS NULL OR t.spent_at_ms >= ?2)
               AND (?3 IS NULL OR t.spent_at_ms <= ?3)
             ORDER BY t.spent_at_ms DESC, t.txn_id DESC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map(
            params![&filter.user_card_id, filter.from_ms, filter.to_ms],
            |row| {
                let transaction = transaction_from_row(row)?;
                let card_def_id: Option<String> = row.get(7)?;
                Ok((transaction, card_def_id))
            },
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rows = Vec::new();
    for row in rows_iter {
        rows.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(rows)
}

pub fn list_all_transactions(
    connection: &Connection,
    db_path: &Path,
) -> CoreResult<Vec<Transaction>> {
    let mut statement = connection
        .prepare(
            "SELECT txn_id, user_card_id, spent_at_ms, amount, category, reward_amount, note
             FROM internal_transactions
             ORDER BY spent_at_ms ASC, txn_id ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map([], transaction_from_row)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rows = Vec::new();
    for row in rows_iter {
        rows.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(rows)
}

fn user_card_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserCard> {
    let is_enabled: i64 = row.get(3)?;
    Ok(UserCard {
        id: row.get(0)?,
        card_def_id: row.get(1)?,
        billing_cycle_day: row.get::<_, i64>(2)?.clamp(1, 31) as u32,
        is_enabled: is_enabled != 0,
    })
}

fn transaction_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        owner_card_id: row.get(1)?,
        timestamp: row.get(2)?,
        amount: row.get(3)?,
        category: row.get(4)?,
        reward_amount: row.get(5)?,
        note: row.get(6)?,
    })
}
