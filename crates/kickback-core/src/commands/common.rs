use std::path::Path;

use chrono::NaiveDate;

use crate::contracts::types::TransactionRow;
use crate::engine::cycle::{day_end, day_start, epoch_ms_from_instant, instant_from_epoch_ms};
use crate::engine::types::Transaction;
use crate::setup::{SetupContext, ensure_initialized, ensure_initialized_at};
use crate::{CoreError, CoreResult};

pub(crate) fn load_setup(home_override: Option<&Path>) -> CoreResult<SetupContext> {
    if let Some(home) = home_override {
        return ensure_initialized_at(home);
    }
    ensure_initialized()
}

pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let exponent = i32::try_from(decimals).unwrap_or(2);
    let factor = 10_f64.powi(exponent);
    (value * factor).round() / factor
}

pub(crate) fn format_instant_ms(epoch_ms: i64) -> String {
    instant_from_epoch_ms(epoch_ms)
        .map(|instant| instant.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub(crate) fn normalize_category(raw: &str, command: &str) -> CoreResult<String> {
    let category = raw.trim().to_lowercase();
    if category.is_empty() {
        return Err(CoreError::invalid_argument_for_command(
            "Category must not be empty.",
            Some(command),
        ));
    }
    Ok(category)
}

pub(crate) fn validate_amount(amount: f64, command: &str) -> CoreResult<()> {
    if !amount.is_finite() {
        return Err(CoreError::invalid_argument_for_command(
            "Amount must be a finite number.",
            Some(command),
        ));
    }
    Ok(())
}

pub(crate) fn validate_billing_day(day: u32, command: &str) -> CoreResult<()> {
    if !(1..=31).contains(&day) {
        return Err(CoreError::invalid_argument_for_command(
            "Billing day must be between 1 and 31.",
            Some(command),
        ));
    }
    Ok(())
}

/// Closed epoch-millisecond bounds of a `YYYY-MM` month.
pub(crate) fn month_bounds(month: &str, command: &str) -> CoreResult<(i64, i64)> {
    let parsed = parse_month(month);
    let Some((year, month_number)) = parsed else {
        return Err(CoreError::invalid_argument_for_command(
            "Month must use YYYY-MM format with a real calendar month.",
            Some(command),
        ));
    };

    let first = NaiveDate::from_ymd_opt(year, month_number, 1);
    let last = last_day_of(year, month_number);
    match (first, last) {
        (Some(first), Some(last)) => Ok((
            epoch_ms_from_instant(day_start(first)),
            epoch_ms_from_instant(day_end(last)),
        )),
        _ => Err(CoreError::invalid_argument_for_command(
            "Month must use YYYY-MM format with a real calendar month.",
            Some(command),
        )),
    }
}

pub(crate) fn transaction_row(
    transaction: &Transaction,
    card_name: Option<String>,
) -> TransactionRow {
    TransactionRow {
        txn_id: transaction.id.clone(),
        user_card_id: transaction.owner_card_id.clone(),
        card_name,
        spent_at: format_instant_ms(transaction.timestamp),
        timestamp_ms: transaction.timestamp,
        amount: transaction.amount,
        category: transaction.category.clone(),
        reward_amount: transaction.reward_amount,
        note: transaction.note.clone(),
    }
}

fn parse_month(value: &str) -> Option<(i32, u32)> {
    if value.len() != 7 {
        return None;
    }
    let bytes = value.as_bytes();
    if bytes[4] != b'-' {
        return None;
    }
    for index in [0usize, 1, 2, 3, 5, 6] {
        if !bytes[index].is_ascii_digit() {
            return None;
        }
    }

    let year = value[..4].parse::<i32>().ok()?;
    let month = value[5..].parse::<u32>().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((year, month))
}

fn last_day_of(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).map(|first| first - chrono::Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::{month_bounds, normalize_category, round_to, validate_billing_day};
    use crate::engine::cycle::instant_from_epoch_ms;

    #[test]
    fn month_bounds_cover_the_whole_month() {
        let bounds = month_bounds("2026-02", "history list");
        assert!(bounds.is_ok());
        if let Ok((from_ms, to_ms)) = bounds {
            let from = instant_from_epoch_ms(from_ms).map(|i| i.to_string());
            let to = instant_from_epoch_ms(to_ms).map(|i| i.to_string());
            assert_eq!(from.as_deref(), Some("2026-02-01 00:00:00"));
            assert_eq!(to.as_deref(), Some("2026-02-28 23:59:59.999"));
        }
    }

    #[test]
    fn month_bounds_reject_malformed_input() {
        for raw in ["2026-2", "2026/02", "2026-13", "feb-2026"] {
            assert!(month_bounds(raw, "history list").is_err());
        }
    }

    #[test]
    fn categories_are_trimmed_and_lowercased() {
        let category = normalize_category("  Dining ", "recommend");
        assert!(category.is_ok());
        if let Ok(category) = category {
            assert_eq!(category, "dining");
        }
        assert!(normalize_category("   ", "recommend").is_err());
    }

    #[test]
    fn billing_day_bounds_are_enforced() {
        assert!(validate_billing_day(1, "card add").is_ok());
        assert!(validate_billing_day(31, "card add").is_ok());
        assert!(validate_billing_day(0, "card add").is_err());
        assert!(validate_billing_day(32, "card add").is_err());
    }

    #[test]
    fn round_to_two_decimals_matches_display_expectations() {
        assert!((round_to(12.345, 2) - 12.35).abs() < f64::EPSILON);
        assert!((round_to(12.0, 2) - 12.0).abs() < f64::EPSILON);
    }
}
