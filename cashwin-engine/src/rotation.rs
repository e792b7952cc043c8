use cashwin_db::models::Draw;

use crate::history::{distinct_dates, distinct_numbers};

/// Rotation d'un numéro : moyenne des écarts (en jours) entre ses dates
/// d'apparition distinctes, arrondie à 2 décimales. `None` avec moins de deux dates.
pub fn rotation(draws: &[Draw], number: u32) -> Option<f64> {
    let occurrences: Vec<Draw> = draws.iter().filter(|d| d.number == number).cloned().collect();
    let dates = distinct_dates(&occurrences);
    if dates.len() < 2 {
        return None;
    }

    let gaps: Vec<i64> = dates.windows(2).map(|w| (w[1] - w[0]).num_days()).collect();
    let mean = gaps.iter().sum::<i64>() as f64 / gaps.len() as f64;
    Some(round2(mean))
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotationEntry {
    pub number: u32,
    pub rotation: f64,
    pub active: bool,
}

/// Rotation de chaque numéro vu au moins deux jours différents, triée par
/// rotation croissante.
pub fn rotation_table(draws: &[Draw], threshold: f64) -> Vec<RotationEntry> {
    let mut entries: Vec<RotationEntry> = distinct_numbers(draws)
        .into_iter()
        .filter_map(|number| {
            rotation(draws, number).map(|r| RotationEntry {
                number,
                rotation: r,
                active: r <= threshold,
            })
        })
        .collect();
    entries.sort_by(|a, b| {
        a.rotation
            .partial_cmp(&b.rotation)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.number.cmp(&b.number))
    });
    entries
}

/// Numéros actifs (rotation ≤ seuil), dans l'ordre de première apparition.
pub fn active_numbers(draws: &[Draw], threshold: f64) -> Vec<u32> {
    let rotations: Vec<(u32, Option<f64>)> = distinct_numbers(draws)
        .into_iter()
        .map(|n| (n, rotation(draws, n)))
        .collect();

    rotations
        .into_iter()
        .filter(|(_, r)| r.is_some_and(|r| r <= threshold))
        .map(|(n, _)| n)
        .collect()
}
