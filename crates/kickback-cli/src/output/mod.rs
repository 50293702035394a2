mod backup_text;
mod cards_text;
mod catalog_text;
mod error_text;
mod format;
mod history_text;
mod json;
mod mode;
mod recommend_text;

use std::io;

use kickback_core::{CoreError, SuccessEnvelope};

pub use mode::{OutputMode, mode_for_command};

pub fn print_success(success: &SuccessEnvelope, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Text => render_text_success(success)?,
        OutputMode::Json => json::render_success_json(success)?,
    };
    println!("{body}");
    Ok(())
}

pub fn print_failure(error: &CoreError, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Json => json::render_error_json(error)?,
        OutputMode::Text => error_text::render_error(error),
    };
    println!("{body}");
    Ok(())
}

fn render_text_success(success: &SuccessEnvelope) -> io::Result<String> {
    match success.command.as_str() {
        "catalog list" => catalog_text::render_catalog(&success.data),
        "card list" => cards_text::render_card_list(&success.data),
        "card add" | "card remove" | "card billing-day" | "card enable" | "card disable" => {
            cards_text::render_card_mutation(&success.data)
        }
        "recommend" => recommend_text::render_recommend(&success.data),
        "log" => history_text::render_log(&success.data),
        "history list" => history_text::render_history(&success.data),
        "history edit" | "history remove" => history_text::render_history_mutation(&success.data),
        "history export" => history_text::render_history_export(&success.data),
        "backup export" => backup_text::render_backup_export(&success.data),
        "backup import" => backup_text::render_backup_import(&success.data),
        _ => Err(io::Error::other(format!(
            "unsupported text output command `{}`",
            success.command
        ))),
    }
}
