use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::engine::types::PeriodKind;

/// Closed instant range of one active reward cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl CycleRange {
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Resolves the cycle window that is active at `reference`.
///
/// `monthly` covers the reference instant's calendar month and ignores the
/// anchor day. `statement_cycle` treats `anchor_day` as the statement
/// closing day: the window runs from the day after the previous closing
/// date to the end of the coming closing date. A reference on the closing
/// day itself still belongs to the cycle that closes that day.
///
/// Closing days beyond a short month's length clamp to the month's last
/// valid day (Feb 31 -> Feb 28/29).
pub fn resolve_cycle(anchor_day: u32, period: PeriodKind, reference: NaiveDateTime) -> CycleRange {
    let date = reference.date();
    match period {
        PeriodKind::Monthly => CycleRange {
            start: day_start(first_day_of_month(date)),
            end: day_end(last_day_of_month(date)),
        },
        PeriodKind::StatementCycle => {
            let in_current_month =
                date.day() <= closing_date_in(date.year(), date.month(), anchor_day).day();
            let (closing_year, closing_month) = if in_current_month {
                (date.year(), date.month())
            } else {
                next_month(date.year(), date.month())
            };

            let closing = closing_date_in(closing_year, closing_month, anchor_day);
            let (prior_year, prior_month) = prior_month(closing_year, closing_month);
            let previous_closing = closing_date_in(prior_year, prior_month, anchor_day);

            CycleRange {
                start: day_start(previous_closing + Duration::days(1)),
                end: day_end(closing),
            }
        }
    }
}

pub fn instant_from_epoch_ms(epoch_ms: i64) -> Option<NaiveDateTime> {
    chrono::DateTime::from_timestamp_millis(epoch_ms).map(|instant| instant.naive_utc())
}

pub fn epoch_ms_from_instant(instant: NaiveDateTime) -> i64 {
    instant.and_utc().timestamp_millis()
}

pub fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).unwrap_or(NaiveDateTime::MIN)
}

/// Last covered instant of `date` at millisecond resolution, so that
/// epoch-millisecond record timestamps landing anywhere on the closing day
/// stay inside the window.
pub fn day_end(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or(NaiveDateTime::MAX)
}

fn closing_date_in(year: i32, month: u32, anchor_day: u32) -> NaiveDate {
    let day = anchor_day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let day = days_in_month(date.year(), date.month());
    NaiveDate::from_ymd_opt(date.year(), date.month(), day).unwrap_or(date)
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

fn prior_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 { (year - 1, 12) } else { (year, month - 1) }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 31,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
