use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::catalog::Catalog;
use crate::commands::common::{
    load_setup, month_bounds, normalize_category, round_to, transaction_row, validate_amount,
};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{
    HistoryData, HistoryExportData, HistoryMutationData, HistorySummary, LogData,
};
use crate::engine::cycle::{epoch_ms_from_instant, instant_from_epoch_ms};
use crate::engine::recommend::recommend;
use crate::engine::types::Transaction;
use crate::state::open_connection;
use crate::store::{self, HistoryFilter};
use crate::{CoreError, CoreResult};

#[derive(Debug, Default)]
pub struct LogRunOptions<'a> {
    pub user_card_id: String,
    pub amount: f64,
    pub category: String,
    pub note: Option<String>,
    /// Overrides the calculator's estimate as the credited reward.
    pub reward: Option<f64>,
    /// `YYYY-MM-DD` spend date; defaults to the current instant.
    pub at: Option<String>,
    pub home_override: Option<&'a Path>,
}

pub fn log(
    user_card_id: &str,
    amount: f64,
    category: &str,
    note: Option<&str>,
    reward: Option<f64>,
    at: Option<&str>,
) -> CoreResult<SuccessEnvelope> {
    log_with_options(LogRunOptions {
        user_card_id: user_card_id.to_string(),
        amount,
        category: category.to_string(),
        note: note.map(str::to_string),
        reward,
        at: at.map(str::to_string),
        home_override: None,
    })
}

/// Records a spend. The credited reward defaults to the calculator's
/// estimate at the spend instant and becomes ground truth for later cap
/// accounting; `reward` overrides it (e.g. the bank credited a promo).
#[doc(hidden)]
pub fn log_with_options(options: LogRunOptions<'_>) -> CoreResult<SuccessEnvelope> {
    validate_amount(options.amount, "log")?;
    if let Some(reward) = options.reward {
        validate_amount(reward, "log")?;
    }
    let category = normalize_category(&options.category, "log")?;
    let spent_at_ms = match options.at.as_deref() {
        Some(date) => spend_instant_ms(date)?,
        None => store::now_epoch_ms(),
    };

    let catalog = Catalog::builtin()?;
    let setup = load_setup(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;

    let Some(card) = store::find_user_card(&connection, &db_path, &options.user_card_id)? else {
        return Err(CoreError::card_not_found(&options.user_card_id));
    };

    // Cap usage is evaluated at the spend instant, so backdated records
    // draw down the cycle they actually landed in.
    let reference = instant_from_epoch_ms(spent_at_ms).unwrap_or_default();
    let history = store::list_transactions_for_card(&connection, &db_path, &card.id)?;

    let (reward_amount, warning, card_name) = match options.reward {
        Some(reward) => {
            let card_name = catalog.find(&card.card_def_id).map(|def| def.name.clone());
            (round_to(reward, 2), None, card_name)
        }
        None => {
            let recommendation =
                recommend(&catalog, &card, &category, options.amount, &history, reference)?;
            (
                round_to(recommendation.estimated_reward, 2),
                recommendation.warning.map(|warning| warning.as_str().to_string()),
                Some(recommendation.card_name),
            )
        }
    };

    let transaction = Transaction {
        id: store::new_transaction_id(),
        owner_card_id: card.id.clone(),
        timestamp: spent_at_ms,
        amount: options.amount,
        category,
        reward_amount,
        note: options.note.filter(|note| !note.trim().is_empty()),
    };
    store::insert_transaction(&connection, &db_path, &transaction)?;

    success(
        "log",
        LogData {
            transaction: transaction_row(&transaction, card_name),
            warning,
            reward_overridden: options.reward.is_some(),
        },
    )
}

#[derive(Debug, Default)]
pub struct HistoryListOptions<'a> {
    pub user_card_id: Option<String>,
    /// `YYYY-MM` month filter.
    pub month: Option<String>,
    pub home_override: Option<&'a Path>,
}

pub fn list(user_card_id: Option<&str>, month: Option<&str>) -> CoreResult<SuccessEnvelope> {
    list_with_options(HistoryListOptions {
        user_card_id: user_card_id.map(str::to_string),
        month: month.map(str::to_string),
        home_override: None,
    })
}

#[doc(hidden)]
pub fn list_with_options(options: HistoryListOptions<'_>) -> CoreResult<SuccessEnvelope> {
    let catalog = Catalog::builtin()?;
    let setup = load_setup(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;

    if let Some(user_card_id) = options.user_card_id.as_deref()
        && store::find_user_card(&connection, &db_path, user_card_id)?.is_none()
    {
        return Err(CoreError::card_not_found(user_card_id));
    }

    let mut filter = HistoryFilter {
        user_card_id: options.user_card_id.clone(),
        ..HistoryFilter::default()
    };
    if let Some(month) = options.month.as_deref() {
        let (from_ms, to_ms) = month_bounds(month, "history list")?;
        filter.from_ms = Some(from_ms);
        filter.to_ms = Some(to_ms);
    }

    let joined = store::list_history(&connection, &db_path, &filter)?;
    let mut total_spend = 0.0;
    let mut total_reward = 0.0;
    let rows = joined
        .into_iter()
        .map(|(transaction, card_def_id)| {
            total_spend += transaction.amount;
            total_reward += transaction.reward_amount;
            let card_name = card_def_id
                .as_deref()
                .and_then(|id| catalog.find(id))
                .map(|definition| definition.name.clone());
            transaction_row(&transaction, card_name)
        })
        .collect::<Vec<_>>();

    let summary = HistorySummary {
        transaction_count: rows.len() as i64,
        total_spend: round_to(total_spend, 2),
        total_reward: round_to(total_reward, 2),
    };

    success(
        "history list",
        HistoryData {
            card_filter: options.user_card_id,
            month_filter: options.month,
            rows,
            summary,
        },
    )
}

#[derive(Debug, Default)]
pub struct HistoryEditOptions<'a> {
    pub txn_id: String,
    pub amount: Option<f64>,
    pub reward: Option<f64>,
    /// An empty string clears the note.
    pub note: Option<String>,
    pub home_override: Option<&'a Path>,
}

pub fn edit(
    txn_id: &str,
    amount: Option<f64>,
    reward: Option<f64>,
    note: Option<&str>,
) -> CoreResult<SuccessEnvelope> {
    edit_with_options(HistoryEditOptions {
        txn_id: txn_id.to_string(),
        amount,
        reward,
        note: note.map(str::to_string),
        home_override: None,
    })
}

/// Explicit user edit. Edited values are taken as ground truth; the
/// reward is never recomputed against the card's current rules.
#[doc(hidden)]
pub fn edit_with_options(options: HistoryEditOptions<'_>) -> CoreResult<SuccessEnvelope> {
    if options.amount.is_none() && options.reward.is_none() && options.note.is_none() {
        return Err(CoreError::invalid_argument_for_command(
            "Pass at least one of --amount, --reward, or --note.",
            Some("history edit"),
        ));
    }
    if let Some(amount) = options.amount {
        validate_amount(amount, "history edit")?;
    }
    if let Some(reward) = options.reward {
        validate_amount(reward, "history edit")?;
    }

    let setup = load_setup(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;

    let Some(mut transaction) = store::find_transaction(&connection, &db_path, &options.txn_id)?
    else {
        return Err(CoreError::transaction_not_found(&options.txn_id));
    };

    let mut changed: Vec<&str> = Vec::new();
    if let Some(amount) = options.amount {
        transaction.amount = amount;
        changed.push("amount");
    }
    if let Some(reward) = options.reward {
        transaction.reward_amount = round_to(reward, 2);
        changed.push("reward");
    }
    if let Some(note) = options.note {
        transaction.note = Some(note).filter(|note| !note.trim().is_empty());
        changed.push("note");
    }

    store::update_transaction(&connection, &db_path, &transaction)?;

    success(
        "history edit",
        HistoryMutationData {
            txn_id: options.txn_id,
            message: format!("Updated {}.", changed.join(", ")),
        },
    )
}

pub fn remove(txn_id: &str) -> CoreResult<SuccessEnvelope> {
    remove_with_options(txn_id, None)
}

#[doc(hidden)]
pub fn remove_with_options(
    txn_id: &str,
    home_override: Option<&Path>,
) -> CoreResult<SuccessEnvelope> {
    let setup = load_setup(home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;

    if !store::delete_transaction(&connection, &db_path, txn_id)? {
        return Err(CoreError::transaction_not_found(txn_id));
    }

    success(
        "history remove",
        HistoryMutationData {
            txn_id: txn_id.to_string(),
            message: "Transaction removed.".to_string(),
        },
    )
}

pub fn export(path: &str) -> CoreResult<SuccessEnvelope> {
    export_with_options(path, None)
}

#[doc(hidden)]
pub fn export_with_options(
    path: &str,
    home_override: Option<&Path>,
) -> CoreResult<SuccessEnvelope> {
    let catalog = Catalog::builtin()?;
    let setup = load_setup(home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;

    let joined = store::list_history(&connection, &db_path, &HistoryFilter::default())?;

    let mut writer = csv::Writer::from_path(path)
        .map_err(|error| CoreError::export_write_failed(path, &error.to_string()))?;
    writer
        .write_record([
            "txn_id",
            "user_card_id",
            "card_name",
            "spent_at",
            "amount",
            "category",
            "reward_amount",
            "note",
        ])
        .map_err(|error| CoreError::export_write_failed(path, &error.to_string()))?;

    let mut rows_written = 0_i64;
    for (transaction, card_def_id) in joined {
        let card_name = card_def_id
            .as_deref()
            .and_then(|id| catalog.find(id))
            .map(|definition| definition.name.clone())
            .unwrap_or_default();
        let row = transaction_row(&transaction, None);
        let amount_text = format!("{:.2}", row.amount);
        let reward_text = format!("{:.2}", row.reward_amount);
        writer
            .write_record([
                row.txn_id.as_str(),
                row.user_card_id.as_str(),
                card_name.as_str(),
                row.spent_at.as_str(),
                amount_text.as_str(),
                row.category.as_str(),
                reward_text.as_str(),
                row.note.as_deref().unwrap_or(""),
            ])
            .map_err(|error| CoreError::export_write_failed(path, &error.to_string()))?;
        rows_written += 1;
    }

    writer
        .flush()
        .map_err(|error| CoreError::export_write_failed(path, &error.to_string()))?;

    success(
        "history export",
        HistoryExportData {
            path: path.to_string(),
            rows_written,
        },
    )
}

/// Noon on the given day, so the record lands inside every resolver
/// window that covers the date regardless of boundary time handling.
fn spend_instant_ms(date: &str) -> CoreResult<i64> {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(12, 0, 0));
    match parsed {
        Some(instant) => Ok(epoch_ms_from_instant(instant)),
        None => Err(CoreError::invalid_argument_for_command(
            "Spend date must use YYYY-MM-DD format with a real calendar date.",
            Some("log"),
        )),
    }
}
