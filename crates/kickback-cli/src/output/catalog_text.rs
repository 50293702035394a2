use std::io;

use serde_json::Value;

pub fn render_catalog(data: &Value) -> io::Result<String> {
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("catalog output requires rows"))?;

    if rows.is_empty() {
        return Ok("The bundled catalog is empty.".to_string());
    }

    let mut lines = vec![format!("Supported cards ({}):", rows.len())];

    for row in rows {
        let name = row.get("name").and_then(Value::as_str).unwrap_or("unknown");
        let bank = row.get("bank").and_then(Value::as_str).unwrap_or("unknown");
        let id = row
            .get("card_def_id")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let billing_day = row
            .get("default_billing_day")
            .and_then(Value::as_u64)
            .unwrap_or(1);

        lines.push(String::new());
        lines.push(format!("  {name} — {bank}"));
        lines.push(format!("    id: {id}  default billing day: {billing_day}"));

        if let Some(rules) = row.get("rules").and_then(Value::as_array) {
            for rule in rules {
                let category = rule
                    .get("category")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                let rate = rule.get("total_rate").and_then(Value::as_f64).unwrap_or(0.0);
                let period = rule
                    .get("period")
                    .and_then(Value::as_str)
                    .unwrap_or("monthly");
                let capped = rule
                    .get("capped")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let cap_marker = if capped { ", capped" } else { "" };
                lines.push(format!("    {category}: {rate}% ({period}{cap_marker})"));
            }
        }

        if let Some(schemes) = row.get("scheme_names").and_then(Value::as_array) {
            let names = schemes
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<&str>>();
            if !names.is_empty() {
                lines.push(format!("    opt-in schemes: {}", names.join(", ")));
            }
        }
    }

    lines.push(String::new());
    lines.push("Add one with `kickback card add <id>`.".to_string());

    Ok(lines.join("\n"))
}
