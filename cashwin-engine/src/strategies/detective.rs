use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use cashwin_db::models::Draw;

use crate::error::{EngineResult, check_float, check_int};
use crate::history::distinct_numbers;
use crate::strategies::short_term::{Weighting, ranked_scores};

/// Fenêtre fixe du facteur « racha ».
pub const STREAK_WINDOW_DAYS: usize = 10;
/// Surprise attribuée à un numéro jamais sorti avant la date cible.
pub const NEVER_SEEN_SURPRISE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectiveParams {
    #[serde(rename = "numero_candidatos")]
    pub candidates: usize,
    #[serde(rename = "peso_racha")]
    pub streak_weight: f64,
    #[serde(rename = "peso_sorpresa")]
    pub surprise_weight: f64,
    #[serde(rename = "peso_consistencia")]
    pub consistency_weight: f64,
}

impl Default for DetectiveParams {
    fn default() -> Self {
        Self {
            candidates: 5,
            streak_weight: 1.5,
            surprise_weight: 0.7,
            consistency_weight: 0.3,
        }
    }
}

impl DetectiveParams {
    pub fn validate(&self) -> EngineResult<()> {
        check_int("numero_candidatos", self.candidates, 3, 20, "[3, 20]")?;
        check_float("peso_racha", self.streak_weight, 0.0, 5.0, "[0, 5]")?;
        check_float("peso_sorpresa", self.surprise_weight, 0.0, 5.0, "[0, 5]")?;
        check_float("peso_consistencia", self.consistency_weight, 0.0, 5.0, "[0, 5]")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectiveScore {
    pub number: u32,
    pub streak: f64,
    pub surprise: f64,
    pub consistency: f64,
    pub total: f64,
}

/// Détail des trois facteurs pour chaque numéro connu, classé par score final
/// décroissant. Seuls les tirages antérieurs à `target` comptent.
pub fn breakdown(draws: &[Draw], target: NaiveDate, params: &DetectiveParams) -> Vec<DetectiveScore> {
    let numbers = distinct_numbers(draws);
    if numbers.is_empty() {
        return Vec::new();
    }

    let recent: Vec<&Draw> = draws.iter().filter(|d| d.date < target).collect();

    // Rang inversé dans le classement court terme : le premier vaut N, le dernier 1.
    let streak_ranking = ranked_scores(draws, target, STREAK_WINDOW_DAYS, Weighting::Exponential);
    let n = streak_ranking.len();
    let streak: HashMap<u32, f64> = streak_ranking
        .iter()
        .enumerate()
        .map(|(pos, (number, _))| (*number, (n - pos) as f64))
        .collect();

    let mut last_seen: HashMap<u32, NaiveDate> = HashMap::new();
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for d in &recent {
        let last = last_seen.entry(d.number).or_insert(d.date);
        if d.date > *last {
            *last = d.date;
        }
        *counts.entry(d.number).or_insert(0) += 1;
    }
    let total_draws = recent.len();

    let mut scores: Vec<DetectiveScore> = numbers
        .into_iter()
        .map(|number| {
            let p_streak = streak.get(&number).copied().unwrap_or(0.0);
            let p_surprise = last_seen
                .get(&number)
                .map(|&d| (target - d).num_days() as f64)
                .unwrap_or(NEVER_SEEN_SURPRISE);
            let p_consistency = if total_draws == 0 {
                0.0
            } else {
                counts.get(&number).copied().unwrap_or(0) as f64 / total_draws as f64 * 100.0
            };
            let total = p_streak * params.streak_weight
                + p_surprise * params.surprise_weight
                + p_consistency * params.consistency_weight;
            DetectiveScore {
                number,
                streak: p_streak,
                surprise: p_surprise,
                consistency: p_consistency,
                total,
            }
        })
        .collect();

    scores.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
    scores
}

pub fn score(draws: &[Draw], target: NaiveDate, params: &DetectiveParams) -> Vec<u32> {
    breakdown(draws, target, params)
        .into_iter()
        .take(params.candidates)
        .map(|s| s.number)
        .collect()
}
