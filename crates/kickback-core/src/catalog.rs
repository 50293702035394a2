use serde::Deserialize;

use crate::engine::types::PeriodKind;
use crate::{CoreError, CoreResult};

const CARDS_JSON: &str = include_str!("catalog/cards.json");

/// Every rule set falls back to this category when no rule matches the
/// requested spend category.
pub const GENERAL_CATEGORY: &str = "general";

/// One percentage contribution of a rule. When `cap_group_id` is set the
/// contribution draws down that shared cap's remaining balance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardPart {
    pub rate: f64,
    #[serde(default)]
    pub cap_group_id: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardRule {
    pub category: String,
    pub period: PeriodKind,
    pub reward_parts: Vec<RewardPart>,
}

/// A shared cap. Multiple parts across different rules may reference the
/// same id; their usage pools. `period` overrides the rule's period when
/// the cap resets on a different cycle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapDefinition {
    pub id: String,
    pub max_reward: f64,
    #[serde(default)]
    pub period: Option<PeriodKind>,
}

/// A named alternative rule set the cardholder must opt into.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardScheme {
    pub id: String,
    pub name: String,
    pub rules: Vec<RewardRule>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDefinition {
    pub id: String,
    pub name: String,
    pub bank: String,
    pub default_billing_cycle_day: u32,
    pub rules: Vec<RewardRule>,
    #[serde(default)]
    pub sub_schemes: Vec<CardScheme>,
    #[serde(default)]
    pub cap_definitions: Vec<CapDefinition>,
}

impl CardDefinition {
    pub fn cap(&self, cap_group_id: &str) -> Option<&CapDefinition> {
        self.cap_definitions
            .iter()
            .find(|definition| definition.id == cap_group_id)
    }
}

/// Immutable reference data, loaded once and passed by reference into the
/// engine and commands. Never mutated after load.
#[derive(Debug, Clone)]
pub struct Catalog {
    definitions: Vec<CardDefinition>,
}

impl Catalog {
    pub fn builtin() -> CoreResult<Self> {
        Self::from_json(CARDS_JSON)
    }

    pub fn from_json(text: &str) -> CoreResult<Self> {
        let definitions: Vec<CardDefinition> =
            serde_json::from_str(text).map_err(|error| CoreError::internal_catalog(&error.to_string()))?;
        let catalog = Self { definitions };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn find(&self, card_def_id: &str) -> Option<&CardDefinition> {
        self.definitions
            .iter()
            .find(|definition| definition.id == card_def_id)
    }

    pub fn definitions(&self) -> &[CardDefinition] {
        &self.definitions
    }

    fn validate(&self) -> CoreResult<()> {
        for definition in &self.definitions {
            if self
                .definitions
                .iter()
                .filter(|other| other.id == definition.id)
                .count()
                > 1
            {
                return Err(CoreError::internal_catalog(&format!(
                    "duplicate card definition id `{}`",
                    definition.id
                )));
            }

            if !(1..=31).contains(&definition.default_billing_cycle_day) {
                return Err(CoreError::internal_catalog(&format!(
                    "card `{}` has default billing day {} outside 1-31",
                    definition.id, definition.default_billing_cycle_day
                )));
            }

            validate_rule_set(&definition.id, &definition.rules)?;
            for scheme in &definition.sub_schemes {
                validate_rule_set(&format!("{}/{}", definition.id, scheme.id), &scheme.rules)?;
            }

            for cap in &definition.cap_definitions {
                if definition
                    .cap_definitions
                    .iter()
                    .filter(|other| other.id == cap.id)
                    .count()
                    > 1
                {
                    return Err(CoreError::internal_catalog(&format!(
                        "card `{}` defines cap `{}` more than once",
                        definition.id, cap.id
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Explicit rule selection with a defined priority: exact category match
/// first, then the `general` fallback, then none.
pub fn select_rule<'a>(rules: &'a [RewardRule], category: &str) -> Option<&'a RewardRule> {
    rules
        .iter()
        .find(|rule| rule.category == category)
        .or_else(|| rules.iter().find(|rule| rule.category == GENERAL_CATEGORY))
}

fn validate_rule_set(owner: &str, rules: &[RewardRule]) -> CoreResult<()> {
    if !rules.iter().any(|rule| rule.category == GENERAL_CATEGORY) {
        return Err(CoreError::internal_catalog(&format!(
            "rule set `{owner}` has no `general` fallback rule"
        )));
    }

    for rule in rules {
        if rules
            .iter()
            .filter(|other| other.category == rule.category)
            .count()
            > 1
        {
            return Err(CoreError::internal_catalog(&format!(
                "rule set `{owner}` has more than one rule for category `{}`",
                rule.category
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Catalog, GENERAL_CATEGORY, select_rule};

    #[test]
    fn builtin_catalog_parses_and_passes_validation() {
        let catalog = Catalog::builtin();
        assert!(catalog.is_ok());
        if let Ok(catalog) = catalog {
            assert!(!catalog.definitions().is_empty());
            assert!(catalog.find("meridian-everyday").is_some());
            assert!(catalog.find("no-such-card").is_none());
        }
    }

    #[test]
    fn builtin_catalog_exercises_the_full_reward_model() {
        let catalog = Catalog::builtin().ok();
        assert!(catalog.is_some());
        if let Some(catalog) = catalog {
            let multi_part = catalog.definitions().iter().any(|definition| {
                definition
                    .rules
                    .iter()
                    .any(|rule| rule.reward_parts.len() > 1)
            });
            let pooled_cap = catalog.definitions().iter().any(|definition| {
                definition.cap_definitions.iter().any(|cap| {
                    definition
                        .rules
                        .iter()
                        .filter(|rule| {
                            rule.reward_parts
                                .iter()
                                .any(|part| part.cap_group_id.as_deref() == Some(cap.id.as_str()))
                        })
                        .count()
                        > 1
                })
            });
            let schemes = catalog
                .definitions()
                .iter()
                .any(|definition| !definition.sub_schemes.is_empty());
            let cap_period_override = catalog.definitions().iter().any(|definition| {
                definition
                    .cap_definitions
                    .iter()
                    .any(|cap| cap.period.is_some())
            });

            assert!(multi_part);
            assert!(pooled_cap);
            assert!(schemes);
            assert!(cap_period_override);
        }
    }

    #[test]
    fn select_rule_prefers_exact_match_over_general() {
        let catalog = Catalog::builtin().ok();
        assert!(catalog.is_some());
        if let Some(catalog) = catalog {
            let Some(definition) = catalog.find("meridian-everyday") else {
                return;
            };

            let exact = select_rule(&definition.rules, "groceries");
            assert!(exact.is_some_and(|rule| rule.category == "groceries"));

            let fallback = select_rule(&definition.rules, "skydiving");
            assert!(fallback.is_some_and(|rule| rule.category == GENERAL_CATEGORY));
        }
    }

    #[test]
    fn catalog_without_general_rule_is_rejected() {
        let text = r#"[
            {
                "id": "broken",
                "name": "Broken",
                "bank": "Broken Bank",
                "defaultBillingCycleDay": 1,
                "rules": [
                    { "category": "dining", "period": "monthly", "rewardParts": [{ "rate": 1.0 }] }
                ]
            }
        ]"#;

        let result = Catalog::from_json(text);
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "internal_catalog_error");
        }
    }

    #[test]
    fn catalog_with_duplicate_category_rules_is_rejected() {
        let text = r#"[
            {
                "id": "broken",
                "name": "Broken",
                "bank": "Broken Bank",
                "defaultBillingCycleDay": 1,
                "rules": [
                    { "category": "general", "period": "monthly", "rewardParts": [{ "rate": 1.0 }] },
                    { "category": "general", "period": "monthly", "rewardParts": [{ "rate": 2.0 }] }
                ]
            }
        ]"#;

        assert!(Catalog::from_json(text).is_err());
    }
}
