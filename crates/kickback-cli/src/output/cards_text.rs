use std::io;

use serde_json::Value;

use super::format::{self, Align, Column};

pub fn render_card_list(data: &Value) -> io::Result<String> {
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("card list output requires rows"))?;

    if rows.is_empty() {
        return Ok([
            "You don't own any cards yet.",
            "",
            "Browse the catalog with `kickback catalog list`, then add one",
            "with `kickback card add <card-def-id>`.",
        ]
        .join("\n"));
    }

    let mut lines = vec![format!("Your cards ({}):", rows.len()), String::new()];

    let columns = [
        Column {
            name: "Id",
            align: Align::Left,
        },
        Column {
            name: "Card",
            align: Align::Left,
        },
        Column {
            name: "Bank",
            align: Align::Left,
        },
        Column {
            name: "Closing Day",
            align: Align::Right,
        },
        Column {
            name: "Status",
            align: Align::Left,
        },
    ];

    let table_rows = rows
        .iter()
        .map(|row| {
            let definition_missing = row
                .get("definition_missing")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let name = if definition_missing {
                format!(
                    "(unknown definition {})",
                    row.get("card_def_id").and_then(Value::as_str).unwrap_or("?")
                )
            } else {
                row.get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string()
            };
            let enabled = row
                .get("is_enabled")
                .and_then(Value::as_bool)
                .unwrap_or(true);
            vec![
                row.get("user_card_id")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                name,
                row.get("bank")
                    .and_then(Value::as_str)
                    .unwrap_or("-")
                    .to_string(),
                row.get("billing_cycle_day")
                    .and_then(Value::as_u64)
                    .map(|day| day.to_string())
                    .unwrap_or_else(|| "?".to_string()),
                if enabled { "enabled" } else { "disabled" }.to_string(),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    lines.extend(format::render_table(&columns, &table_rows));

    if rows.iter().any(|row| {
        row.get("definition_missing")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }) {
        lines.push(String::new());
        lines.push(
            "Cards with unknown definitions are skipped by `kickback recommend`.".to_string(),
        );
    }

    Ok(lines.join("\n"))
}

pub fn render_card_mutation(data: &Value) -> io::Result<String> {
    let message = data
        .get("message")
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other("card mutation output requires a message"))?;

    let mut lines = vec![message.to_string()];
    if let Some(user_card_id) = data.get("user_card_id").and_then(Value::as_str) {
        lines.push(String::new());
        lines.extend(format::key_value_rows(
            &[("Card id", user_card_id.to_string())],
            2,
        ));
    }

    Ok(lines.join("\n"))
}
