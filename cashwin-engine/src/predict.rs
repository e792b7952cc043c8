use chrono::NaiveDate;
use serde::Serialize;

use cashwin_db::models::{Draw, Slot};

use crate::error::EngineResult;
use crate::history::{chronological, distinct_numbers};
use crate::selector::{MIN_CANDIDATES, PredictionMode, select};
use crate::strategies::{ScoringContext, Strategy};
use crate::weights::RiskWeights;

/// État d'une session de prédiction en direct. Les poids partent de zéro à
/// chaque création ou `reset` ; ils ne sont jamais partagés avec un backtest.
#[derive(Debug, Clone, Default)]
pub struct Session {
    weights: RiskWeights,
}

impl Session {
    pub fn new(history: &[Draw]) -> Self {
        let mut session = Self::default();
        session.reset(history);
        session
    }

    pub fn reset(&mut self, history: &[Draw]) {
        self.weights = RiskWeights::zeroed(&distinct_numbers(&chronological(history)));
    }

    pub fn weights(&self) -> &RiskWeights {
        &self.weights
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotPrediction {
    pub slot: Slot,
    pub numbers: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    /// Aucun tirage antérieur à la date visée.
    NoData,
    /// La stratégie a produit trop peu de candidats.
    InsufficientCandidates { candidates: Vec<u32>, needed: usize },
    Ready {
        candidates: Vec<u32>,
        slots: Vec<SlotPrediction>,
    },
}

/// Prédiction ponctuelle pour toutes les franjas de `target`, à partir des
/// seuls tirages datés avant `target`.
pub fn predict(
    history: &[Draw],
    target: NaiveDate,
    strategy: &Strategy,
    session: &Session,
    mode: PredictionMode,
) -> EngineResult<PredictionOutcome> {
    strategy.validate()?;

    let prior: Vec<Draw> = chronological(history)
        .into_iter()
        .filter(|d| d.date < target)
        .collect();
    if prior.is_empty() {
        return Ok(PredictionOutcome::NoData);
    }

    let ctx = ScoringContext {
        history: &prior,
        target,
        weights: session.weights(),
    };
    let candidates = strategy.candidates(&ctx);

    let needed = MIN_CANDIDATES.max(mode.min_candidates());
    if candidates.len() < needed {
        return Ok(PredictionOutcome::InsufficientCandidates { candidates, needed });
    }

    let slots = Slot::ALL
        .iter()
        .map(|&slot| {
            select(&candidates, slot.index(), mode).map(|numbers| SlotPrediction { slot, numbers })
        })
        .collect::<EngineResult<Vec<_>>>()?;

    Ok(PredictionOutcome::Ready { candidates, slots })
}
