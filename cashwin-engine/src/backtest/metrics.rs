use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use cashwin_db::models::Slot;

use super::BacktestRecord;
use crate::rotation::round2;

/// Précision en pourcentage, `None` quand aucun tirage n'a été évalué.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Precision(pub Option<f64>);

impl Precision {
    pub fn from_counts(hits: usize, total: usize) -> Self {
        if total == 0 {
            return Precision(None);
        }
        Precision(Some(round2(hits as f64 / total as f64 * 100.0)))
    }

    /// Valeur dans [0, 100] ; 0 sans données.
    pub fn percent(self) -> f64 {
        self.0.unwrap_or(0.0)
    }

    pub fn has_data(self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(p) => write!(f, "{:.2}%", p),
            None => write!(f, "sin datos"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub hits: usize,
    pub precision: Precision,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotMetrics {
    pub slot: Slot,
    pub hits: usize,
    pub count: usize,
    pub precision: Precision,
}

pub fn summarize(records: &[BacktestRecord]) -> Summary {
    let total = records.len();
    let hits = records.iter().filter(|r| r.hit).count();
    Summary {
        total,
        hits,
        precision: Precision::from_counts(hits, total),
    }
}

/// Précision par franja, dans l'ordre de la journée ; seules les franjas évaluées apparaissent.
pub fn per_slot(records: &[BacktestRecord]) -> Vec<SlotMetrics> {
    Slot::ALL
        .iter()
        .filter_map(|&slot| {
            let count = records.iter().filter(|r| r.slot == slot).count();
            if count == 0 {
                return None;
            }
            let hits = records.iter().filter(|r| r.slot == slot && r.hit).count();
            Some(SlotMetrics {
                slot,
                hits,
                count,
                precision: Precision::from_counts(hits, count),
            })
        })
        .collect()
}

/// Nombre de réussites par date, en ordre chronologique.
pub fn daily_hits(records: &[BacktestRecord]) -> Vec<(NaiveDate, usize)> {
    let mut by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for r in records {
        *by_day.entry(r.date).or_insert(0) += usize::from(r.hit);
    }
    by_day.into_iter().collect()
}
