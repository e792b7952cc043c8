use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// En dessous, aucune prédiction n'est émise pour le tirage.
pub const MIN_CANDIDATES: usize = 3;

/// Nombre de numéros proposés par franja.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PredictionMode {
    /// Trois candidats consécutifs de la liste, par rotation.
    #[default]
    Triple,
    /// Un seul candidat par franja (ancien mode).
    Single,
}

impl PredictionMode {
    pub fn min_candidates(self) -> usize {
        match self {
            PredictionMode::Triple => 3,
            PredictionMode::Single => 1,
        }
    }
}

/// Numéros proposés pour la franja d'index `slot_index` à partir d'une liste
/// classée. En mode triple : {c[i], c[i+1], c[i+2]} modulo M, dédoublonné et trié.
pub fn select(candidates: &[u32], slot_index: usize, mode: PredictionMode) -> EngineResult<Vec<u32>> {
    let m = candidates.len();
    if m < mode.min_candidates() {
        return Err(EngineError::DataInsufficient {
            needed: mode.min_candidates(),
            found: m,
        });
    }

    match mode {
        PredictionMode::Triple => {
            let picked: BTreeSet<u32> = (0..3).map(|j| candidates[(slot_index + j) % m]).collect();
            Ok(picked.into_iter().collect())
        }
        PredictionMode::Single => Ok(vec![candidates[slot_index % m]]),
    }
}
