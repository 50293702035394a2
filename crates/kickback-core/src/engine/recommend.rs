use chrono::NaiveDateTime;

use crate::catalog::{CardDefinition, Catalog, RewardRule, select_rule};
use crate::engine::caps::pooled_consumption;
use crate::engine::cycle::resolve_cycle;
use crate::engine::types::{
    CapStatus, CapWarning, PartBreakdown, Recommendation, Transaction, UserCard,
};
use crate::{CoreError, CoreResult};

/// Estimates the reward `user_card` would earn on a single spend.
///
/// Rule selection prefers an exact category match and falls back to the
/// `general` rule; a card with neither simply offers no reward. Every part
/// of the selected rule contributes `amount * rate / 100`, clamped by its
/// shared cap's remaining balance for the active cycle. When the card
/// defines named sub-schemes, each scheme is evaluated the same way and
/// the best-performing rule set wins.
///
/// Fails only when the owned card references a catalog definition that no
/// longer exists; every expected business condition (cap hit, no matching
/// rule, non-positive amount) is encoded in the result.
///
/// Pure over its inputs: identical history snapshots and an identical
/// `now` yield an identical result.
pub fn recommend(
    catalog: &Catalog,
    user_card: &UserCard,
    category: &str,
    amount: f64,
    history: &[Transaction],
    now: NaiveDateTime,
) -> CoreResult<Recommendation> {
    let Some(definition) = catalog.find(&user_card.card_def_id) else {
        return Err(CoreError::card_definition_missing(&user_card.card_def_id));
    };

    let mut best = evaluate_rule_set(
        definition,
        &definition.rules,
        None,
        user_card,
        category,
        amount,
        history,
        now,
    );
    for scheme in &definition.sub_schemes {
        let candidate = evaluate_rule_set(
            definition,
            &scheme.rules,
            Some(scheme.name.as_str()),
            user_card,
            category,
            amount,
            history,
            now,
        );
        if candidate.estimated_reward > best.estimated_reward {
            best = candidate;
        }
    }

    Ok(Recommendation {
        user_card_id: user_card.id.clone(),
        card_def_id: definition.id.clone(),
        card_name: definition.name.clone(),
        bank: definition.bank.clone(),
        scheme_name: best.scheme_name,
        estimated_reward: best.estimated_reward,
        effective_rate: best.effective_rate,
        warning: best.warning,
        cap_info: best.cap_info,
        breakdown: best.breakdown,
    })
}

struct RuleSetOutcome {
    scheme_name: Option<String>,
    estimated_reward: f64,
    effective_rate: f64,
    warning: Option<CapWarning>,
    cap_info: Vec<CapStatus>,
    breakdown: Vec<PartBreakdown>,
}

impl RuleSetOutcome {
    fn zero(scheme_name: Option<&str>) -> Self {
        Self {
            scheme_name: scheme_name.map(str::to_string),
            estimated_reward: 0.0,
            effective_rate: 0.0,
            warning: None,
            cap_info: Vec::new(),
            breakdown: Vec::new(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn evaluate_rule_set(
    definition: &CardDefinition,
    rules: &[RewardRule],
    scheme_name: Option<&str>,
    user_card: &UserCard,
    category: &str,
    amount: f64,
    history: &[Transaction],
    now: NaiveDateTime,
) -> RuleSetOutcome {
    let Some(rule) = select_rule(rules, category) else {
        return RuleSetOutcome::zero(scheme_name);
    };

    if amount <= 0.0 {
        // Boundary case, not an error: nothing to earn, nothing to warn
        // about, and no division by zero computing the rate.
        let breakdown = rule
            .reward_parts
            .iter()
            .map(|part| PartBreakdown {
                rate: part.rate,
                note: part.note.clone(),
                capped: false,
            })
            .collect();
        return RuleSetOutcome {
            breakdown,
            ..RuleSetOutcome::zero(scheme_name)
        };
    }

    let mut estimated_reward = 0.0;
    let mut uncapped_total = 0.0;
    let mut any_exhausted = false;
    let mut cap_info: Vec<CapStatus> = Vec::new();
    let mut breakdown = Vec::with_capacity(rule.reward_parts.len());

    for part in &rule.reward_parts {
        let raw_contribution = amount * part.rate / 100.0;
        uncapped_total += raw_contribution;

        let mut effective_contribution = raw_contribution;
        let mut capped = false;

        if let Some(cap_group_id) = part.cap_group_id.as_deref()
            && let Some(cap) = definition.cap(cap_group_id)
        {
            let window = resolve_cycle(
                user_card.billing_cycle_day,
                cap.period.unwrap_or(rule.period),
                now,
            );
            let consumed = pooled_consumption(rules, cap_group_id, history, &window);
            let remaining = cap.max_reward - consumed;

            if remaining <= 0.0 {
                effective_contribution = 0.0;
                capped = true;
                any_exhausted = true;
            } else if raw_contribution > remaining {
                effective_contribution = remaining;
                capped = true;
            }

            if !cap_info
                .iter()
                .any(|status| status.cap_group_id == cap_group_id)
            {
                cap_info.push(CapStatus {
                    cap_group_id: cap_group_id.to_string(),
                    remaining: remaining.max(0.0),
                    total: cap.max_reward,
                });
            }
        }

        estimated_reward += effective_contribution;
        breakdown.push(PartBreakdown {
            rate: part.rate,
            note: part.note.clone(),
            capped,
        });
    }

    // Exhausted outranks approaching; the two never appear together.
    let warning = if any_exhausted {
        Some(CapWarning::Exhausted)
    } else if uncapped_total - estimated_reward > f64::EPSILON {
        Some(CapWarning::Approaching)
    } else {
        None
    };

    RuleSetOutcome {
        scheme_name: scheme_name.map(str::to_string),
        estimated_reward,
        effective_rate: estimated_reward / amount * 100.0,
        warning,
        cap_info,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::recommend;
    use crate::catalog::Catalog;
    use crate::engine::cycle::epoch_ms_from_instant;
    use crate::engine::types::{CapWarning, Transaction, UserCard};

    fn at_noon(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .unwrap_or_default()
    }

    fn owned(card_def_id: &str, billing_cycle_day: u32) -> UserCard {
        UserCard {
            id: format!("card_{card_def_id}"),
            card_def_id: card_def_id.to_string(),
            billing_cycle_day,
            is_enabled: true,
        }
    }

    fn spend(id: &str, instant: NaiveDateTime, category: &str, reward: f64) -> Transaction {
        Transaction {
            id: id.to_string(),
            owner_card_id: "card_x".to_string(),
            timestamp: epoch_ms_from_instant(instant),
            amount: reward * 50.0,
            category: category.to_string(),
            reward_amount: reward,
            note: None,
        }
    }

    fn test_catalog() -> Option<Catalog> {
        let text = r#"[
            {
                "id": "cap-card",
                "name": "Cap Card",
                "bank": "Test Bank",
                "defaultBillingCycleDay": 1,
                "rules": [
                    { "category": "general", "period": "monthly", "rewardParts": [{ "rate": 1.0 }] },
                    {
                        "category": "online",
                        "period": "monthly",
                        "rewardParts": [{ "rate": 2.0, "capGroupId": "bonus" }]
                    }
                ],
                "capDefinitions": [{ "id": "bonus", "maxReward": 1000.0 }]
            }
        ]"#;
        Catalog::from_json(text).ok()
    }

    #[test]
    fn non_positive_amounts_yield_zero_reward_and_rate() {
        let catalog = Catalog::builtin().ok();
        assert!(catalog.is_some());
        if let Some(catalog) = catalog {
            for amount in [0.0, -25.0] {
                let result = recommend(
                    &catalog,
                    &owned("meridian-everyday", 1),
                    "groceries",
                    amount,
                    &[],
                    at_noon(2026, 4, 10),
                );
                assert!(result.is_ok());
                if let Ok(recommendation) = result {
                    assert_eq!(recommendation.estimated_reward, 0.0);
                    assert_eq!(recommendation.effective_rate, 0.0);
                    assert!(recommendation.warning.is_none());
                }
            }
        }
    }

    #[test]
    fn uncapped_rule_earns_the_exact_sum_of_part_rates() {
        let catalog = Catalog::builtin().ok();
        assert!(catalog.is_some());
        if let Some(catalog) = catalog {
            let result = recommend(
                &catalog,
                &owned("meridian-everyday", 1),
                "groceries",
                1000.0,
                &[],
                at_noon(2026, 4, 10),
            );
            assert!(result.is_ok());
            if let Ok(recommendation) = result {
                // 1% base + 2% bonus with an untouched cap
                assert!((recommendation.estimated_reward - 30.0).abs() < f64::EPSILON);
                assert!((recommendation.effective_rate - 3.0).abs() < f64::EPSILON);
                assert!(recommendation.warning.is_none());
                assert_eq!(recommendation.breakdown.len(), 2);
                assert!(!recommendation.breakdown[0].capped);
                assert!(!recommendation.breakdown[1].capped);
            }
        }
    }

    #[test]
    fn clamped_part_earns_the_remaining_cap_and_warns_approaching() {
        let catalog = test_catalog();
        assert!(catalog.is_some());
        if let Some(catalog) = catalog {
            // 950 of the 1000 cap consumed earlier this month; a 5000 spend
            // at 2% raws 100 but only 50 remains.
            let history = vec![spend("txn_1", at_noon(2026, 4, 2), "online", 950.0)];
            let result = recommend(
                &catalog,
                &owned("cap-card", 1),
                "online",
                5000.0,
                &history,
                at_noon(2026, 4, 20),
            );
            assert!(result.is_ok());
            if let Ok(recommendation) = result {
                assert!((recommendation.estimated_reward - 50.0).abs() < f64::EPSILON);
                assert_eq!(recommendation.warning, Some(CapWarning::Approaching));
                assert_eq!(recommendation.breakdown.len(), 1);
                assert!(recommendation.breakdown[0].capped);
                assert_eq!(recommendation.cap_info.len(), 1);
                assert!((recommendation.cap_info[0].remaining - 50.0).abs() < f64::EPSILON);
                assert!((recommendation.cap_info[0].total - 1000.0).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn exhausted_cap_zeroes_the_part_and_outranks_approaching() {
        let catalog = test_catalog();
        assert!(catalog.is_some());
        if let Some(catalog) = catalog {
            let history = vec![spend("txn_1", at_noon(2026, 4, 2), "online", 1000.0)];
            let result = recommend(
                &catalog,
                &owned("cap-card", 1),
                "online",
                5000.0,
                &history,
                at_noon(2026, 4, 20),
            );
            assert!(result.is_ok());
            if let Ok(recommendation) = result {
                assert_eq!(recommendation.estimated_reward, 0.0);
                assert_eq!(recommendation.effective_rate, 0.0);
                assert_eq!(recommendation.warning, Some(CapWarning::Exhausted));
                assert!(recommendation.breakdown[0].capped);
                assert_eq!(recommendation.cap_info[0].remaining, 0.0);
            }
        }
    }

    #[test]
    fn last_cycle_spend_does_not_count_against_this_cycle() {
        let catalog = test_catalog();
        assert!(catalog.is_some());
        if let Some(catalog) = catalog {
            let history = vec![spend("txn_1", at_noon(2026, 3, 28), "online", 1000.0)];
            let result = recommend(
                &catalog,
                &owned("cap-card", 1),
                "online",
                5000.0,
                &history,
                at_noon(2026, 4, 20),
            );
            assert!(result.is_ok());
            if let Ok(recommendation) = result {
                assert!((recommendation.estimated_reward - 100.0).abs() < f64::EPSILON);
                assert!(recommendation.warning.is_none());
            }
        }
    }

    #[test]
    fn unmatched_category_falls_back_to_the_general_rule() {
        let catalog = Catalog::builtin().ok();
        assert!(catalog.is_some());
        if let Some(catalog) = catalog {
            let result = recommend(
                &catalog,
                &owned("meridian-everyday", 1),
                "skydiving",
                1000.0,
                &[],
                at_noon(2026, 4, 10),
            );
            assert!(result.is_ok());
            if let Ok(recommendation) = result {
                assert!((recommendation.estimated_reward - 10.0).abs() < f64::EPSILON);
                assert!((recommendation.effective_rate - 1.0).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn missing_definition_is_a_configuration_error_not_a_crash() {
        let catalog = Catalog::builtin().ok();
        assert!(catalog.is_some());
        if let Some(catalog) = catalog {
            let result = recommend(
                &catalog,
                &owned("retired-card", 1),
                "dining",
                100.0,
                &[],
                at_noon(2026, 4, 10),
            );
            assert!(result.is_err());
            if let Err(error) = result {
                assert_eq!(error.code, "card_definition_missing");
            }
        }
    }

    #[test]
    fn best_sub_scheme_wins_and_surfaces_its_name() {
        let catalog = Catalog::builtin().ok();
        assert!(catalog.is_some());
        if let Some(catalog) = catalog {
            // Default rules pay 1.2% on streaming via general; the
            // Streaming Plus scheme pays 5%.
            let result = recommend(
                &catalog,
                &owned("solstice-select", 20),
                "streaming",
                1000.0,
                &[],
                at_noon(2026, 4, 10),
            );
            assert!(result.is_ok());
            if let Ok(recommendation) = result {
                assert_eq!(recommendation.scheme_name.as_deref(), Some("Streaming Plus"));
                assert!((recommendation.estimated_reward - 50.0).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn default_rules_win_when_no_scheme_beats_them() {
        let catalog = Catalog::builtin().ok();
        assert!(catalog.is_some());
        if let Some(catalog) = catalog {
            // On a plain category the default 1.2% beats both schemes' 0.8%.
            let result = recommend(
                &catalog,
                &owned("solstice-select", 20),
                "groceries",
                1000.0,
                &[],
                at_noon(2026, 4, 10),
            );
            assert!(result.is_ok());
            if let Ok(recommendation) = result {
                assert!(recommendation.scheme_name.is_none());
                assert!((recommendation.estimated_reward - 12.0).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn shared_cap_pools_consumption_across_categories() {
        let catalog = Catalog::builtin().ok();
        assert!(catalog.is_some());
        if let Some(catalog) = catalog {
            // voyager_bonus is shared by overseas and online; overseas
            // spend earlier in the cycle tightens the online estimate.
            let history = vec![spend("txn_1", at_noon(2026, 10, 1), "overseas", 1460.0)];
            let result = recommend(
                &catalog,
                &owned("atlas-voyager", 5),
                "online",
                5000.0,
                &history,
                at_noon(2026, 10, 4),
            );
            assert!(result.is_ok());
            if let Ok(recommendation) = result {
                // base 1% = 50 plus min(2% = 100, 1500 - 1460 = 40)
                assert!((recommendation.estimated_reward - 90.0).abs() < f64::EPSILON);
                assert_eq!(recommendation.warning, Some(CapWarning::Approaching));
            }
        }
    }

    #[test]
    fn identical_inputs_produce_identical_results() {
        let catalog = Catalog::builtin().ok();
        assert!(catalog.is_some());
        if let Some(catalog) = catalog {
            let history = vec![spend("txn_1", at_noon(2026, 4, 2), "groceries", 40.0)];
            let card = owned("meridian-everyday", 1);
            let now = at_noon(2026, 4, 20);

            let first = recommend(&catalog, &card, "groceries", 2500.0, &history, now);
            let second = recommend(&catalog, &card, "groceries", 2500.0, &history, now);
            assert!(first.is_ok());
            assert!(second.is_ok());
            if let (Ok(first), Ok(second)) = (first, second) {
                assert_eq!(first, second);
            }
        }
    }
}
