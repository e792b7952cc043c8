//! Vues dérivées de l'historique : l'historique lui-même n'est jamais modifié.

use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use cashwin_db::models::{Draw, Slot};

use crate::error::{EngineError, EngineResult};

/// Copie triée par (date, franja). Le tri est stable : les doublons gardent
/// leur ordre d'insertion.
pub fn chronological(draws: &[Draw]) -> Vec<Draw> {
    let mut sorted = draws.to_vec();
    sorted.sort_by_key(|d| d.chrono_key());
    sorted
}

/// Numéros distincts dans l'ordre de première apparition.
pub fn distinct_numbers(draws: &[Draw]) -> Vec<u32> {
    let mut seen = HashSet::new();
    draws
        .iter()
        .filter(|d| seen.insert(d.number))
        .map(|d| d.number)
        .collect()
}

/// Dates distinctes, triées.
pub fn distinct_dates(draws: &[Draw]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = draws.iter().map(|d| d.date).collect();
    dates.sort();
    dates.dedup();
    dates
}

pub fn parse_date(raw: &str) -> EngineResult<NaiveDate> {
    cashwin_db::models::parse_date(raw).map_err(|_| EngineError::DateParseFailure {
        raw: raw.to_string(),
    })
}

pub fn draw(date: &str, slot: Slot, number: u32) -> Draw {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap_or_default();
    Draw::new(date, slot, number)
}

/// `n_days` journées complètes (5 franjas) à partir du 2024-01-01, numéros 0-9.
pub fn make_test_draws(n_days: usize) -> Vec<Draw> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    (0..n_days)
        .flat_map(|day| {
            let date = start + Days::new(day as u64);
            Slot::ALL.into_iter().map(move |slot| {
                let number = ((day * 7 + slot.index() * 3) % 10) as u32;
                Draw::new(date, slot, number)
            })
        })
        .collect()
}

/// Un tirage par jour (franja mañana), numéros 1, 2, 3, 4, 5, 1, 2, ...
pub fn make_cycle_draws(n_days: usize) -> Vec<Draw> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    (0..n_days)
        .map(|day| Draw::new(start + Days::new(day as u64), Slot::Morning, (day % 5) as u32 + 1))
        .collect()
}
