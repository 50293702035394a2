use std::io;

use serde_json::Value;

pub fn render_recommend(data: &Value) -> io::Result<String> {
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("recommend output requires rows"))?;

    let category = data
        .get("category")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let amount = data.get("amount").and_then(Value::as_f64).unwrap_or(0.0);

    if rows.is_empty() {
        let mut lines = vec![format!("No cards to rank for {category} {amount:.2}.")];
        lines.push(String::new());
        lines.push("Add a card with `kickback card add <card-def-id>` first.".to_string());
        append_skipped(&mut lines, data);
        return Ok(lines.join("\n"));
    }

    let mut lines = vec![format!(
        "Best card for {category} {amount:.2} ({} ranked):",
        rows.len()
    )];

    for (index, row) in rows.iter().enumerate() {
        let name = row
            .get("card_name")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let bank = row.get("bank").and_then(Value::as_str).unwrap_or("unknown");
        let reward = row
            .get("estimated_reward")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let rate = row
            .get("effective_rate")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        lines.push(String::new());
        lines.push(format!(
            "  {}. {name} ({bank}) — earn {reward:.2} at {rate:.2}%",
            index + 1
        ));

        if let Some(scheme) = row.get("scheme_name").and_then(Value::as_str) {
            lines.push(format!("     via opt-in scheme: {scheme}"));
        }

        match row.get("warning").and_then(Value::as_str) {
            Some("cap_exhausted") => {
                lines.push("     warning: reward cap exhausted for this cycle".to_string());
            }
            Some("approaching_cap") => {
                lines.push("     warning: close to the reward cap for this cycle".to_string());
            }
            _ => {}
        }

        if let Some(cap_info) = row.get("cap_info").and_then(Value::as_array) {
            for cap in cap_info {
                let remaining = cap
                    .get("remaining")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0);
                let total = cap.get("total").and_then(Value::as_f64).unwrap_or(0.0);
                let group = cap
                    .get("cap_group_id")
                    .and_then(Value::as_str)
                    .unwrap_or("cap");
                lines.push(format!("     {group}: {remaining:.2} of {total:.2} left"));
            }
        }

        if let Some(breakdown) = row.get("breakdown").and_then(Value::as_array) {
            let parts = breakdown
                .iter()
                .map(|part| {
                    let rate = part.get("rate").and_then(Value::as_f64).unwrap_or(0.0);
                    let capped = part
                        .get("capped")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    let note = part.get("note").and_then(Value::as_str);
                    let mut text = format!("{rate}%");
                    if capped {
                        text.push_str(" (capped)");
                    }
                    if let Some(note) = note {
                        text.push_str(&format!(" [{note}]"));
                    }
                    text
                })
                .collect::<Vec<String>>();
            if parts.len() > 1 {
                lines.push(format!("     parts: {}", parts.join(" + ")));
            }
        }
    }

    append_skipped(&mut lines, data);

    Ok(lines.join("\n"))
}

fn append_skipped(lines: &mut Vec<String>, data: &Value) {
    let Some(skipped) = data.get("skipped").and_then(Value::as_array) else {
        return;
    };
    if skipped.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push("Skipped:".to_string());
    for row in skipped {
        let user_card_id = row
            .get("user_card_id")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let message = row
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("configuration error");
        lines.push(format!("  {user_card_id}: {message}"));
    }
}
