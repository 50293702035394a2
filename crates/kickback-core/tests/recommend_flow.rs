mod support;

use kickback_core::commands::cards;
use kickback_core::commands::recommend::{self, RecommendRunOptions};
use support::testkit::{add_card, log_spend, recommend_payload, recommend_rows, row_for_card, temp_home_in_tmp};

#[test]
fn ranks_cards_by_estimated_reward_for_the_requested_category() {
    let temp = temp_home_in_tmp("kickback-recommend-rank");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let meridian = add_card(&home, "meridian-everyday", None);
        let plainfield = add_card(&home, "plainfield-flat", None);
        assert!(!meridian.is_empty());
        assert!(!plainfield.is_empty());

        let rows = recommend_rows(&home, "groceries", 1000.0);
        assert_eq!(rows.len(), 2);
        // 3% groceries beats the 2% flat card
        assert_eq!(rows[0]["user_card_id"].as_str(), Some(meridian.as_str()));
        assert_eq!(rows[0]["estimated_reward"], 30.0);
        assert_eq!(rows[0]["effective_rate"], 3.0);
        assert_eq!(rows[1]["estimated_reward"], 20.0);
        assert!(rows[0]["warning"].is_null());
    }
}

#[test]
fn cap_consumption_tightens_later_recommendations() {
    let temp = temp_home_in_tmp("kickback-recommend-caps");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let meridian = add_card(&home, "meridian-everyday", None);

        // 1% base + 2% capped bonus on a 10000 spend: 300 credited, which
        // leaves 300 of the 600 bonus cap for this cycle.
        let logged = log_spend(&home, &meridian, 10_000.0, "groceries");
        assert_eq!(logged["transaction"]["reward_amount"], 300.0);

        let rows = recommend_rows(&home, "groceries", 20_000.0);
        let row = row_for_card(&rows, &meridian);
        assert!(row.is_some());
        if let Some(row) = row {
            // base 200 plus the remaining 300 of the bonus cap
            assert_eq!(row["estimated_reward"], 500.0);
            assert_eq!(row["warning"].as_str(), Some("approaching_cap"));
            let cap_info = row["cap_info"].as_array().cloned().unwrap_or_default();
            assert_eq!(cap_info.len(), 1);
            assert_eq!(cap_info[0]["remaining"], 300.0);
            assert_eq!(cap_info[0]["total"], 600.0);
        }
    }
}

#[test]
fn exhausted_shared_cap_warns_on_every_category_that_feeds_it() {
    let temp = temp_home_in_tmp("kickback-recommend-exhausted");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let meridian = add_card(&home, "meridian-everyday", None);
        let plainfield = add_card(&home, "plainfield-flat", None);

        log_spend(&home, &meridian, 10_000.0, "groceries");
        log_spend(&home, &meridian, 15_000.0, "groceries");
        // 300 + 450 credited; the 600 bonus cap is now exhausted

        let rows = recommend_rows(&home, "groceries", 1000.0);
        let meridian_row = row_for_card(&rows, &meridian);
        assert!(meridian_row.is_some());
        if let Some(row) = meridian_row {
            assert_eq!(row["estimated_reward"], 10.0);
            assert_eq!(row["warning"].as_str(), Some("cap_exhausted"));
            let breakdown = row["breakdown"].as_array().cloned().unwrap_or_default();
            assert_eq!(breakdown.len(), 2);
            assert_eq!(breakdown[1]["capped"], true);
        }

        // the flat 2% card overtakes the capped-out 3% card
        assert_eq!(rows[0]["user_card_id"].as_str(), Some(plainfield.as_str()));

        // dining shares the same cap group, so it is exhausted too
        let dining_rows = recommend_rows(&home, "dining", 1000.0);
        let dining_row = row_for_card(&dining_rows, &meridian);
        assert!(dining_row.is_some());
        if let Some(row) = dining_row {
            assert_eq!(row["warning"].as_str(), Some("cap_exhausted"));
        }
    }
}

#[test]
fn disabled_cards_are_left_out_of_the_ranking() {
    let temp = temp_home_in_tmp("kickback-recommend-disabled");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let meridian = add_card(&home, "meridian-everyday", None);
        let plainfield = add_card(&home, "plainfield-flat", None);

        let disabled = cards::set_enabled_with_options(&plainfield, false, Some(&home));
        assert!(disabled.is_ok());

        let rows = recommend_rows(&home, "dining", 500.0);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["user_card_id"].as_str(), Some(meridian.as_str()));
    }
}

#[test]
fn sub_scheme_name_is_surfaced_when_it_wins() {
    let temp = temp_home_in_tmp("kickback-recommend-scheme");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let solstice = add_card(&home, "solstice-select", None);

        let rows = recommend_rows(&home, "streaming", 1000.0);
        let row = row_for_card(&rows, &solstice);
        assert!(row.is_some());
        if let Some(row) = row {
            assert_eq!(row["scheme_name"].as_str(), Some("Streaming Plus"));
            assert_eq!(row["estimated_reward"], 50.0);
        }

        let plain_rows = recommend_rows(&home, "groceries", 1000.0);
        let plain_row = row_for_card(&plain_rows, &solstice);
        assert!(plain_row.is_some());
        if let Some(row) = plain_row {
            assert!(row["scheme_name"].is_null());
            assert_eq!(row["estimated_reward"], 12.0);
        }
    }
}

#[test]
fn non_positive_amounts_rank_with_zero_rewards_and_no_warnings() {
    let temp = temp_home_in_tmp("kickback-recommend-zero");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        add_card(&home, "meridian-everyday", None);

        let payload = recommend_payload(&home, "groceries", 0.0);
        let rows = payload["rows"].as_array().cloned().unwrap_or_default();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["estimated_reward"], 0.0);
        assert_eq!(rows[0]["effective_rate"], 0.0);
        assert!(rows[0]["warning"].is_null());
    }
}

#[test]
fn recommend_rejects_non_finite_amounts_and_blank_categories() {
    let temp = temp_home_in_tmp("kickback-recommend-invalid");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let non_finite = recommend::run_with_options(RecommendRunOptions {
            category: "dining".to_string(),
            amount: f64::NAN,
            home_override: Some(&home),
        });
        assert!(non_finite.is_err());
        if let Err(error) = non_finite {
            assert_eq!(error.code, "invalid_argument");
        }

        let blank = recommend::run_with_options(RecommendRunOptions {
            category: "   ".to_string(),
            amount: 100.0,
            home_override: Some(&home),
        });
        assert!(blank.is_err());
    }
}
