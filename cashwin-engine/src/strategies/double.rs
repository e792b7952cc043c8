use serde::{Deserialize, Serialize};

use cashwin_db::models::Draw;

use crate::error::{EngineResult, check_int};
use crate::history::distinct_numbers;
use crate::rotation::active_numbers;
use crate::weights::RiskWeights;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubleParams {
    /// Rotation maximale (jours) pour qu'un numéro soit « actif ».
    #[serde(rename = "umbral_rotacion")]
    pub rotation_threshold: usize,
    #[serde(rename = "numero_candidatos")]
    pub candidates: usize,
}

impl Default for DoubleParams {
    fn default() -> Self {
        Self {
            rotation_threshold: 4,
            candidates: 7,
        }
    }
}

impl DoubleParams {
    pub fn validate(&self) -> EngineResult<()> {
        check_int("umbral_rotacion", self.rotation_threshold, 1, 15, "[1, 15]")?;
        check_int("numero_candidatos", self.candidates, 3, 20, "[3, 20]")
    }
}

/// Numéros actifs classés par poids de risque décroissant. Sans numéro actif,
/// on se rabat sur tous les numéros déjà vus dans `draws`, classés de la même
/// façon. La table de poids ne fournit que le classement, jamais le vivier.
pub fn score(draws: &[Draw], weights: &RiskWeights, params: &DoubleParams) -> Vec<u32> {
    if draws.is_empty() {
        return Vec::new();
    }

    let mut pool = active_numbers(draws, params.rotation_threshold as f64);
    if pool.is_empty() {
        log::debug!("Aucun numéro actif (seuil {}), repli sur tous les numéros", params.rotation_threshold);
        pool = distinct_numbers(draws);
    }

    weights
        .rank(&pool)
        .into_iter()
        .take(params.candidates)
        .collect()
}
