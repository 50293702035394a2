#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use kickback_core::commands::cards;
use kickback_core::commands::history::{self, HistoryListOptions, LogRunOptions};
use kickback_core::commands::recommend::{self, RecommendRunOptions};
use kickback_core::SuccessEnvelope;
use serde_json::Value;
use tempfile::{Builder, TempDir};

pub fn temp_home_in_tmp(prefix: &str) -> std::io::Result<(TempDir, PathBuf)> {
    let dir = Builder::new().prefix(prefix).tempdir_in("/tmp")?;
    let home = dir.path().join("ledger-home");
    fs::create_dir_all(&home)?;
    Ok((dir, home))
}

pub fn envelope_data(result: Result<SuccessEnvelope, kickback_core::CoreError>) -> Value {
    assert!(result.is_ok());
    if let Ok(envelope) = result {
        return envelope.data;
    }
    Value::Null
}

/// Adds an owned card and returns its generated id.
pub fn add_card(home: &Path, card_def_id: &str, billing_day: Option<u32>) -> String {
    let data = envelope_data(cards::add_with_options(card_def_id, billing_day, Some(home)));
    data["user_card_id"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

pub fn log_spend(home: &Path, user_card_id: &str, amount: f64, category: &str) -> Value {
    envelope_data(history::log_with_options(LogRunOptions {
        user_card_id: user_card_id.to_string(),
        amount,
        category: category.to_string(),
        note: None,
        reward: None,
        at: None,
        home_override: Some(home),
    }))
}

pub fn log_spend_with_reward(
    home: &Path,
    user_card_id: &str,
    amount: f64,
    category: &str,
    reward: f64,
) -> Value {
    envelope_data(history::log_with_options(LogRunOptions {
        user_card_id: user_card_id.to_string(),
        amount,
        category: category.to_string(),
        note: None,
        reward: Some(reward),
        at: None,
        home_override: Some(home),
    }))
}

pub fn recommend_payload(home: &Path, category: &str, amount: f64) -> Value {
    envelope_data(recommend::run_with_options(RecommendRunOptions {
        category: category.to_string(),
        amount,
        home_override: Some(home),
    }))
}

pub fn recommend_rows(home: &Path, category: &str, amount: f64) -> Vec<Value> {
    recommend_payload(home, category, amount)["rows"]
        .as_array()
        .cloned()
        .unwrap_or_default()
}

pub fn history_rows(home: &Path, user_card_id: Option<&str>) -> Vec<Value> {
    let data = envelope_data(history::list_with_options(HistoryListOptions {
        user_card_id: user_card_id.map(str::to_string),
        month: None,
        home_override: Some(home),
    }));
    data["rows"].as_array().cloned().unwrap_or_default()
}

pub fn row_for_card<'a>(rows: &'a [Value], user_card_id: &str) -> Option<&'a Value> {
    rows.iter()
        .find(|row| row["user_card_id"].as_str() == Some(user_card_id))
}
