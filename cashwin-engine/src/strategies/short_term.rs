use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use cashwin_db::models::Draw;

use crate::error::{EngineResult, check_int};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum Weighting {
    #[default]
    #[serde(rename = "Exponencial")]
    Exponential,
    #[serde(rename = "Lineal")]
    Linear,
}

impl Weighting {
    /// Poids d'un tirage vieux de `days_elapsed` jours dans une fenêtre de `window` jours.
    pub fn weight(self, window: usize, days_elapsed: i64) -> u64 {
        let window = window as i64;
        match self {
            Weighting::Linear => (window + 1 - days_elapsed).max(1) as u64,
            Weighting::Exponential => {
                let exponent = (window - days_elapsed).max(0) as i32;
                1.5f64.powi(exponent).ceil() as u64
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortTermParams {
    #[serde(rename = "ventana_dias")]
    pub window_days: usize,
    #[serde(rename = "numero_candidatos")]
    pub candidates: usize,
    #[serde(rename = "tipo_ponderacion")]
    pub weighting: Weighting,
}

impl Default for ShortTermParams {
    fn default() -> Self {
        Self {
            window_days: 10,
            candidates: 5,
            weighting: Weighting::Exponential,
        }
    }
}

impl ShortTermParams {
    pub fn validate(&self) -> EngineResult<()> {
        check_int("ventana_dias", self.window_days, 3, 30, "[3, 30]")?;
        check_int("numero_candidatos", self.candidates, 3, 20, "[3, 20]")
    }
}

/// Scores cumulés par numéro sur les `window_days` jours précédant `target`
/// (le jour cible exclu), du plus fort au plus faible. À égalité, l'ordre de
/// première apparition est conservé.
pub fn ranked_scores(draws: &[Draw], target: NaiveDate, window_days: usize, weighting: Weighting) -> Vec<(u32, u64)> {
    let Some(window_start) = target.checked_sub_days(Days::new(window_days as u64)) else {
        return Vec::new();
    };

    let mut scores: Vec<(u32, u64)> = Vec::new();
    let mut index: HashMap<u32, usize> = HashMap::new();

    for d in draws.iter().filter(|d| d.date >= window_start && d.date < target) {
        let days_elapsed = (target - d.date).num_days();
        let w = weighting.weight(window_days, days_elapsed);
        match index.get(&d.number) {
            Some(&i) => scores[i].1 += w,
            None => {
                index.insert(d.number, scores.len());
                scores.push((d.number, w));
            }
        }
    }

    scores.sort_by(|a, b| b.1.cmp(&a.1));
    scores
}

pub fn score(draws: &[Draw], target: NaiveDate, params: &ShortTermParams) -> Vec<u32> {
    ranked_scores(draws, target, params.window_days, params.weighting)
        .into_iter()
        .take(params.candidates)
        .map(|(n, _)| n)
        .collect()
}
