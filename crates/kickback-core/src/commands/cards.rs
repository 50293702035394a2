use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::commands::common::{load_setup, validate_billing_day};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{CardMutationData, CardsData, OwnedCardRow};
use crate::engine::types::UserCard;
use crate::state::open_connection;
use crate::store;
use crate::{CoreError, CoreResult};

pub fn add(card_def_id: &str, billing_day: Option<u32>) -> CoreResult<SuccessEnvelope> {
    add_with_options(card_def_id, billing_day, None)
}

#[doc(hidden)]
pub fn add_with_options(
    card_def_id: &str,
    billing_day: Option<u32>,
    home_override: Option<&Path>,
) -> CoreResult<SuccessEnvelope> {
    let catalog = Catalog::builtin()?;
    let Some(definition) = catalog.find(card_def_id) else {
        return Err(CoreError::card_definition_missing(card_def_id));
    };

    let billing_cycle_day = billing_day.unwrap_or(definition.default_billing_cycle_day);
    validate_billing_day(billing_cycle_day, "card add")?;

    let setup = load_setup(home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;

    let card = UserCard {
        id: store::new_user_card_id(),
        card_def_id: definition.id.clone(),
        billing_cycle_day,
        is_enabled: true,
    };
    store::insert_user_card(&connection, &db_path, &card)?;

    success(
        "card add",
        CardMutationData {
            user_card_id: card.id,
            card_def_id: definition.id.clone(),
            message: format!(
                "Added {} ({}) with billing day {billing_cycle_day}.",
                definition.name, definition.bank
            ),
            transactions_removed: None,
        },
    )
}

pub fn list() -> CoreResult<SuccessEnvelope> {
    list_with_options(None)
}

#[doc(hidden)]
pub fn list_with_options(home_override: Option<&Path>) -> CoreResult<SuccessEnvelope> {
    let catalog = Catalog::builtin()?;
    let setup = load_setup(home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;

    let rows = store::list_user_cards(&connection, &db_path)?
        .into_iter()
        .map(|card| {
            let definition = catalog.find(&card.card_def_id);
            OwnedCardRow {
                user_card_id: card.id,
                card_def_id: card.card_def_id,
                name: definition.map(|def| def.name.clone()),
                bank: definition.map(|def| def.bank.clone()),
                billing_cycle_day: card.billing_cycle_day,
                is_enabled: card.is_enabled,
                definition_missing: definition.is_none(),
            }
        })
        .collect::<Vec<OwnedCardRow>>();

    success("card list", CardsData { rows })
}

pub fn remove(user_card_id: &str) -> CoreResult<SuccessEnvelope> {
    remove_with_options(user_card_id, None)
}

#[doc(hidden)]
pub fn remove_with_options(
    user_card_id: &str,
    home_override: Option<&Path>,
) -> CoreResult<SuccessEnvelope> {
    let setup = load_setup(home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let mut connection = open_connection(&db_path)?;

    let Some(card) = store::find_user_card(&connection, &db_path, user_card_id)? else {
        return Err(CoreError::card_not_found(user_card_id));
    };

    let Some(transactions_removed) =
        store::delete_user_card(&mut connection, &db_path, user_card_id)?
    else {
        return Err(CoreError::card_not_found(user_card_id));
    };

    success(
        "card remove",
        CardMutationData {
            user_card_id: user_card_id.to_string(),
            card_def_id: card.card_def_id,
            message: format!(
                "Removed card `{user_card_id}` and {transactions_removed} recorded transactions."
            ),
            transactions_removed: Some(transactions_removed),
        },
    )
}

pub fn billing_day(user_card_id: &str, day: u32) -> CoreResult<SuccessEnvelope> {
    billing_day_with_options(user_card_id, day, None)
}

#[doc(hidden)]
pub fn billing_day_with_options(
    user_card_id: &str,
    day: u32,
    home_override: Option<&Path>,
) -> CoreResult<SuccessEnvelope> {
    validate_billing_day(day, "card billing-day")?;

    let setup = load_setup(home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;

    let Some(card) = store::find_user_card(&connection, &db_path, user_card_id)? else {
        return Err(CoreError::card_not_found(user_card_id));
    };
    store::update_billing_day(&connection, &db_path, user_card_id, day)?;

    success(
        "card billing-day",
        CardMutationData {
            user_card_id: user_card_id.to_string(),
            card_def_id: card.card_def_id,
            message: format!("Billing day for `{user_card_id}` is now {day}."),
            transactions_removed: None,
        },
    )
}

pub fn set_enabled(user_card_id: &str, enabled: bool) -> CoreResult<SuccessEnvelope> {
    set_enabled_with_options(user_card_id, enabled, None)
}

#[doc(hidden)]
pub fn set_enabled_with_options(
    user_card_id: &str,
    enabled: bool,
    home_override: Option<&Path>,
) -> CoreResult<SuccessEnvelope> {
    let setup = load_setup(home_override)?;
    let db_path = PathBuf::from(&setup.db_path);
    let connection = open_connection(&db_path)?;

    let Some(card) = store::find_user_card(&connection, &db_path, user_card_id)? else {
        return Err(CoreError::card_not_found(user_card_id));
    };
    store::set_enabled(&connection, &db_path, user_card_id, enabled)?;

    let command = if enabled { "card enable" } else { "card disable" };
    let state = if enabled { "enabled" } else { "disabled" };
    success(
        command,
        CardMutationData {
            user_card_id: user_card_id.to_string(),
            card_def_id: card.card_def_id,
            message: format!("Card `{user_card_id}` is now {state}."),
            transactions_removed: None,
        },
    )
}
