use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::commands::common::{load_setup, normalize_category, round_to, validate_amount};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{
    BreakdownRow, CapStatusRow, RecommendData, RecommendationRow, SkippedCardRow,
};
use crate::engine::cycle::instant_from_epoch_ms;
use crate::engine::recommend::recommend;
use crate::engine::types::Recommendation;
use crate::state::open_connection;
use crate::store;
use crate::CoreResult;

#[derive(Debug, Default)]
pub struct RecommendRunOptions<'a> {
    pub category: String,
    pub amount: f64,
    pub home_override: Option<&'a Path>,
}

pub fn run(category: &str, amount: f64) -> CoreResult<SuccessEnvelope> {
    run_with_options(RecommendRunOptions {
        category: category.to_string(),
        amount,
        home_override: None,
    })
}

/// The ranker: evaluates every enabled owned card and sorts by estimated
/// reward. A card whose definition fell out of the catalog is reported in
/// `skipped` instead of failing the whole pass.
#[doc(hidden)]
pub fn run_with_options(options: RecommendRunOptions<'_>) -> CoreResult<SuccessEnvelope> {
    validate_amount(options.amount, "recommend")?;
    let category = normalize_category(&options.category, "recommend")?;

    let catalog = Catalog::builtin()?;
    let setup = load_setup(options.home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;

    // One shared reference instant keeps every card's cycle resolution
    // consistent within a single ranking pass.
    let now = instant_from_epoch_ms(store::now_epoch_ms()).unwrap_or_default();

    let mut rows: Vec<RecommendationRow> = Vec::new();
    let mut skipped: Vec<SkippedCardRow> = Vec::new();

    for card in store::list_user_cards(&connection, &db_path)? {
        if !card.is_enabled {
            continue;
        }

        let history = store::list_transactions_for_card(&connection, &db_path, &card.id)?;
        match recommend(&catalog, &card, &category, options.amount, &history, now) {
            Ok(recommendation) => rows.push(recommendation_row(recommendation)),
            Err(error) => skipped.push(SkippedCardRow {
                user_card_id: card.id.clone(),
                card_def_id: card.card_def_id.clone(),
                code: error.code.clone(),
                message: error.message.clone(),
            }),
        }
    }

    rows.sort_by(|left, right| {
        right
            .estimated_reward
            .total_cmp(&left.estimated_reward)
            .then_with(|| right.effective_rate.total_cmp(&left.effective_rate))
            .then_with(|| left.card_name.cmp(&right.card_name))
            .then_with(|| left.user_card_id.cmp(&right.user_card_id))
    });

    success(
        "recommend",
        RecommendData {
            category,
            amount: options.amount,
            rows,
            skipped,
        },
    )
}

fn recommendation_row(recommendation: Recommendation) -> RecommendationRow {
    RecommendationRow {
        user_card_id: recommendation.user_card_id,
        card_def_id: recommendation.card_def_id,
        card_name: recommendation.card_name,
        bank: recommendation.bank,
        scheme_name: recommendation.scheme_name,
        estimated_reward: round_to(recommendation.estimated_reward, 2),
        effective_rate: round_to(recommendation.effective_rate, 2),
        warning: recommendation.warning.map(|warning| warning.as_str().to_string()),
        cap_info: recommendation
            .cap_info
            .into_iter()
            .map(|status| CapStatusRow {
                cap_group_id: status.cap_group_id,
                remaining: round_to(status.remaining, 2),
                total: status.total,
            })
            .collect(),
        breakdown: recommendation
            .breakdown
            .into_iter()
            .map(|part| BreakdownRow {
                rate: part.rate,
                note: part.note,
                capped: part.capped,
            })
            .collect(),
    }
}
