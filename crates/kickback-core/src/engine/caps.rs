use crate::catalog::{GENERAL_CATEGORY, RewardRule, select_rule};
use crate::engine::cycle::{CycleRange, instant_from_epoch_ms};
use crate::engine::types::Transaction;

/// Reward already credited inside `window`, optionally restricted to one
/// recorded category. Pure over the supplied slice; the caller is
/// responsible for fetching the owner's history.
pub fn consumed_amount(
    transactions: &[Transaction],
    window: &CycleRange,
    category_filter: Option<&str>,
) -> f64 {
    transactions
        .iter()
        .filter(|transaction| in_window(transaction, window))
        .filter(|transaction| {
            category_filter.is_none_or(|category| transaction.category == category)
        })
        .map(|transaction| transaction.reward_amount)
        .sum()
}

/// Usage of one shared cap across every category that feeds it.
///
/// A transaction counts toward the cap when the rule its recorded category
/// resolves to (exact match, else the `general` fallback) carries a part in
/// the cap group. Routing through rule selection is what makes a cap on
/// the `general` rule pool spends from otherwise-unmatched categories.
pub fn pooled_consumption(
    rules: &[RewardRule],
    cap_group_id: &str,
    transactions: &[Transaction],
    window: &CycleRange,
) -> f64 {
    let sharing = rules
        .iter()
        .filter(|rule| rule_feeds_cap(rule, cap_group_id))
        .collect::<Vec<&RewardRule>>();

    // A cap scoped to one specific category never collects spend routed
    // through the general fallback, so the plain category filter suffices.
    if let [rule] = sharing.as_slice()
        && rule.category != GENERAL_CATEGORY
    {
        return consumed_amount(transactions, window, Some(rule.category.as_str()));
    }

    transactions
        .iter()
        .filter(|transaction| in_window(transaction, window))
        .filter(|transaction| {
            select_rule(rules, &transaction.category)
                .is_some_and(|rule| rule_feeds_cap(rule, cap_group_id))
        })
        .map(|transaction| transaction.reward_amount)
        .sum()
}

pub(crate) fn rule_feeds_cap(rule: &RewardRule, cap_group_id: &str) -> bool {
    rule.reward_parts
        .iter()
        .any(|part| part.cap_group_id.as_deref() == Some(cap_group_id))
}

fn in_window(transaction: &Transaction, window: &CycleRange) -> bool {
    instant_from_epoch_ms(transaction.timestamp).is_some_and(|instant| window.contains(instant))
}
