use std::io;

use serde_json::Value;

use super::format::{self, Align, Column};

pub fn render_log(data: &Value) -> io::Result<String> {
    let transaction = data
        .get("transaction")
        .ok_or_else(|| io::Error::other("log output requires a transaction"))?;

    let card_name = transaction
        .get("card_name")
        .and_then(Value::as_str)
        .unwrap_or("your card");
    let amount = transaction
        .get("amount")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let category = transaction
        .get("category")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let reward = transaction
        .get("reward_amount")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let txn_id = transaction
        .get("txn_id")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    let overridden = data
        .get("reward_overridden")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let reward_source = if overridden { "as given" } else { "estimated" };

    let mut lines = vec![
        format!("Recorded {amount:.2} on {card_name} ({category})."),
        String::new(),
    ];
    lines.extend(format::key_value_rows(
        &[
            ("Transaction", txn_id.to_string()),
            ("Reward", format!("{reward:.2} ({reward_source})")),
        ],
        2,
    ));

    match data.get("warning").and_then(Value::as_str) {
        Some("cap_exhausted") => {
            lines.push(String::new());
            lines.push("The reward cap for this cycle was already exhausted.".to_string());
        }
        Some("approaching_cap") => {
            lines.push(String::new());
            lines.push("This spend ran into the cycle's reward cap.".to_string());
        }
        _ => {}
    }

    Ok(lines.join("\n"))
}

pub fn render_history(data: &Value) -> io::Result<String> {
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("history output requires rows"))?;

    if rows.is_empty() {
        return Ok([
            "No recorded spends match.",
            "",
            "Record one with `kickback log <user-card-id> --amount A --category C`.",
        ]
        .join("\n"));
    }

    let mut heading = format!("Recorded spends ({})", rows.len());
    if let Some(month) = data.get("month_filter").and_then(Value::as_str) {
        heading.push_str(&format!(" in {month}"));
    }
    if let Some(card) = data.get("card_filter").and_then(Value::as_str) {
        heading.push_str(&format!(" for {card}"));
    }
    heading.push(':');

    let mut lines = vec![heading, String::new()];

    let columns = [
        Column {
            name: "When",
            align: Align::Left,
        },
        Column {
            name: "Id",
            align: Align::Left,
        },
        Column {
            name: "Card",
            align: Align::Left,
        },
        Column {
            name: "Category",
            align: Align::Left,
        },
        Column {
            name: "Amount",
            align: Align::Right,
        },
        Column {
            name: "Reward",
            align: Align::Right,
        },
    ];

    let table_rows = rows
        .iter()
        .map(|row| {
            vec![
                row.get("spent_at")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                row.get("txn_id")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                row.get("card_name")
                    .and_then(Value::as_str)
                    .unwrap_or("(removed card)")
                    .to_string(),
                row.get("category")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                format!(
                    "{:.2}",
                    row.get("amount").and_then(Value::as_f64).unwrap_or(0.0)
                ),
                format!(
                    "{:.2}",
                    row.get("reward_amount")
                        .and_then(Value::as_f64)
                        .unwrap_or(0.0)
                ),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    lines.extend(format::render_table(&columns, &table_rows));

    if let Some(summary) = data.get("summary") {
        let total_spend = summary
            .get("total_spend")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let total_reward = summary
            .get("total_reward")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        lines.push(String::new());
        lines.push("Totals:".to_string());
        lines.extend(format::key_value_rows(
            &[
                ("Spend", format!("{total_spend:.2}")),
                ("Reward", format!("{total_reward:.2}")),
            ],
            2,
        ));
    }

    Ok(lines.join("\n"))
}

pub fn render_history_mutation(data: &Value) -> io::Result<String> {
    let message = data
        .get("message")
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other("history mutation output requires a message"))?;
    let txn_id = data
        .get("txn_id")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    Ok(format!("{message}\n\n  Transaction  {txn_id}"))
}

pub fn render_history_export(data: &Value) -> io::Result<String> {
    let path = data
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other("history export output requires a path"))?;
    let rows_written = data
        .get("rows_written")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    Ok(format!("Wrote {rows_written} rows to {path}."))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{render_history, render_log};

    #[test]
    fn log_output_shows_reward_source_and_cap_warnings() {
        let data = json!({
            "transaction": {
                "txn_id": "txn_1",
                "user_card_id": "card_1",
                "card_name": "Harborline Fuel Rewards",
                "spent_at": "2026-03-14 12:00",
                "timestamp_ms": 1,
                "amount": 120.0,
                "category": "gas",
                "reward_amount": 4.2
            },
            "warning": "approaching_cap",
            "reward_overridden": false
        });

        let rendered = render_log(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("Recorded 120.00 on Harborline Fuel Rewards (gas)."));
            assert!(text.contains("4.20 (estimated)"));
            assert!(text.contains("ran into the cycle's reward cap"));
        }
    }

    #[test]
    fn history_rows_render_with_totals_and_orphan_fallback() {
        let data = json!({
            "rows": [
                {
                    "txn_id": "txn_1",
                    "user_card_id": "card_gone",
                    "spent_at": "2026-01-02 09:30",
                    "timestamp_ms": 1,
                    "amount": 80.0,
                    "category": "dining",
                    "reward_amount": 2.4
                }
            ],
            "summary": { "transaction_count": 1, "total_spend": 80.0, "total_reward": 2.4 }
        });

        let rendered = render_history(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("Recorded spends (1):"));
            assert!(text.contains("(removed card)"));
            assert!(text.contains("Totals:"));
            assert!(text.contains("Spend   80.00"));
        }
    }

    #[test]
    fn empty_history_points_at_the_log_command() {
        let rendered = render_history(&json!({ "rows": [], "summary": {} }));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("No recorded spends match."));
            assert!(text.contains("kickback log"));
        }
    }
}
