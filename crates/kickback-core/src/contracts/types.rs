use serde::{Deserialize, Serialize};

use crate::engine::types::{Transaction, UserCard};

#[derive(Debug, Clone, Serialize)]
pub struct CatalogRuleRow {
    pub category: String,
    pub period: String,
    pub total_rate: f64,
    pub capped: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogCardRow {
    pub card_def_id: String,
    pub name: String,
    pub bank: String,
    pub default_billing_day: u32,
    pub rules: Vec<CatalogRuleRow>,
    pub scheme_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogData {
    pub rows: Vec<CatalogCardRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnedCardRow {
    pub user_card_id: String,
    pub card_def_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    pub billing_cycle_day: u32,
    pub is_enabled: bool,
    pub definition_missing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardsData {
    pub rows: Vec<OwnedCardRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardMutationData {
    pub user_card_id: String,
    pub card_def_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions_removed: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapStatusRow {
    pub cap_group_id: String,
    pub remaining: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BreakdownRow {
    pub rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub capped: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationRow {
    pub user_card_id: String,
    pub card_def_id: String,
    pub card_name: String,
    pub bank: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme_name: Option<String>,
    pub estimated_reward: f64,
    pub effective_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub cap_info: Vec<CapStatusRow>,
    pub breakdown: Vec<BreakdownRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedCardRow {
    pub user_card_id: String,
    pub card_def_id: String,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendData {
    pub category: String,
    pub amount: f64,
    pub rows: Vec<RecommendationRow>,
    pub skipped: Vec<SkippedCardRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionRow {
    pub txn_id: String,
    pub user_card_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_name: Option<String>,
    pub spent_at: String,
    pub timestamp_ms: i64,
    pub amount: f64,
    pub category: String,
    pub reward_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistorySummary {
    pub transaction_count: i64,
    pub total_spend: f64,
    pub total_reward: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_filter: Option<String>,
    pub rows: Vec<TransactionRow>,
    pub summary: HistorySummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogData {
    pub transaction: TransactionRow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub reward_overridden: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryMutationData {
    pub txn_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryExportData {
    pub path: String,
    pub rows_written: i64,
}

/// On-disk backup document. The shape is part of the crate's contract:
/// `{version, exportedAt, data: {userCards, transactions}}` with camelCase
/// record fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub version: i64,
    pub exported_at: String,
    pub data: BackupPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    pub user_cards: Vec<UserCard>,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupExportData {
    pub path: String,
    pub exported_at: String,
    pub user_cards: i64,
    pub transactions: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupImportData {
    pub path: String,
    pub user_cards_inserted: i64,
    pub user_cards_updated: i64,
    pub transactions_inserted: i64,
    pub transactions_updated: i64,
    /// Imported transactions whose owning card is in neither the ledger
    /// nor the backup. Tolerated, never dropped.
    pub orphaned_transactions: i64,
}
