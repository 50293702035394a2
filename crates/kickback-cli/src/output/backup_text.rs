use std::io;

use serde_json::Value;

use super::format;

pub fn render_backup_export(data: &Value) -> io::Result<String> {
    let path = data
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other("backup export output requires a path"))?;
    let user_cards = data.get("user_cards").and_then(Value::as_i64).unwrap_or(0);
    let transactions = data
        .get("transactions")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    let mut lines = vec![format!("Backup written to {path}."), String::new()];
    lines.extend(format::key_value_rows(
        &[
            ("Cards", user_cards.to_string()),
            ("Transactions", transactions.to_string()),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

pub fn render_backup_import(data: &Value) -> io::Result<String> {
    let path = data
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other("backup import output requires a path"))?;

    let cards_inserted = data
        .get("user_cards_inserted")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let cards_updated = data
        .get("user_cards_updated")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let transactions_inserted = data
        .get("transactions_inserted")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let transactions_updated = data
        .get("transactions_updated")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let orphans = data
        .get("orphaned_transactions")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    let mut lines = vec![format!("Backup merged from {path}."), String::new()];
    lines.extend(format::key_value_rows(
        &[
            (
                "Cards",
                format!("{cards_inserted} added, {cards_updated} refreshed"),
            ),
            (
                "Transactions",
                format!("{transactions_inserted} added, {transactions_updated} refreshed"),
            ),
        ],
        2,
    ));

    if orphans > 0 {
        lines.push(String::new());
        lines.push(format!(
            "{orphans} imported transactions reference cards that no longer exist; they are kept and shown as removed cards in history."
        ));
    }

    Ok(lines.join("\n"))
}
