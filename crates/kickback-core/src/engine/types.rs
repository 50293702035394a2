use serde::{Deserialize, Serialize};

/// Reset cycle for reward caps: a plain calendar month, or the card's
/// statement cycle anchored to its billing (closing) day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    Monthly,
    StatementCycle,
}

impl PeriodKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::StatementCycle => "statement_cycle",
        }
    }
}

/// A card the user owns. `billing_cycle_day` is the statement closing
/// day-of-month (1-31) and is user-editable after the card is added.
///
/// Serializes with the backup document field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCard {
    pub id: String,
    pub card_def_id: String,
    pub billing_cycle_day: u32,
    pub is_enabled: bool,
}

/// A recorded spend. `reward_amount` is the reward credited at record
/// time (or a later explicit edit) and is treated as ground truth by cap
/// accounting; it is never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub owner_card_id: String,
    /// Epoch milliseconds, UTC.
    pub timestamp: i64,
    pub amount: f64,
    pub category: String,
    pub reward_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapWarning {
    /// A referenced cap was already fully consumed before this spend.
    Exhausted,
    /// The reward was clamped below its uncapped total by a cap's
    /// remaining balance.
    Approaching,
}

impl CapWarning {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exhausted => "cap_exhausted",
            Self::Approaching => "approaching_cap",
        }
    }
}

/// Remaining balance of one shared cap at evaluation time, before the
/// candidate spend. `remaining` is floored at zero for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct CapStatus {
    pub cap_group_id: String,
    pub remaining: f64,
    pub total: f64,
}

/// One evaluated reward part, in rule order.
#[derive(Debug, Clone, PartialEq)]
pub struct PartBreakdown {
    pub rate: f64,
    pub note: Option<String>,
    pub capped: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub user_card_id: String,
    pub card_def_id: String,
    pub card_name: String,
    pub bank: String,
    /// Set when a named sub-scheme outperforms the card's default rules.
    pub scheme_name: Option<String>,
    pub estimated_reward: f64,
    pub effective_rate: f64,
    pub warning: Option<CapWarning>,
    pub cap_info: Vec<CapStatus>,
    pub breakdown: Vec<PartBreakdown>,
}
