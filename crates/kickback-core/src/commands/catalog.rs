use crate::catalog::{Catalog, RewardRule};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{CatalogCardRow, CatalogData, CatalogRuleRow};
use crate::CoreResult;

/// Lists the supported card definitions. Reads only the bundled catalog;
/// the ledger is not touched.
pub fn list() -> CoreResult<SuccessEnvelope> {
    let catalog = Catalog::builtin()?;

    let rows = catalog
        .definitions()
        .iter()
        .map(|definition| CatalogCardRow {
            card_def_id: definition.id.clone(),
            name: definition.name.clone(),
            bank: definition.bank.clone(),
            default_billing_day: definition.default_billing_cycle_day,
            rules: definition.rules.iter().map(rule_row).collect(),
            scheme_names: definition
                .sub_schemes
                .iter()
                .map(|scheme| scheme.name.clone())
                .collect(),
        })
        .collect::<Vec<CatalogCardRow>>();

    success("catalog list", CatalogData { rows })
}

fn rule_row(rule: &RewardRule) -> CatalogRuleRow {
    CatalogRuleRow {
        category: rule.category.clone(),
        period: rule.period.as_str().to_string(),
        total_rate: rule.reward_parts.iter().map(|part| part.rate).sum(),
        capped: rule
            .reward_parts
            .iter()
            .any(|part| part.cap_group_id.is_some()),
    }
}
