pub mod affinity;
pub mod detective;
pub mod double;
pub mod echo;
pub mod short_term;

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use cashwin_db::models::Draw;

use crate::error::EngineResult;
use crate::weights::RiskWeights;

pub use affinity::AffinityParams;
pub use detective::DetectiveParams;
pub use double::DoubleParams;
pub use echo::EchoParams;
pub use short_term::{ShortTermParams, Weighting};

/// Stratégie choisie et ses paramètres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "estrategia")]
pub enum Strategy {
    #[serde(rename = "corto_plazo")]
    ShortTerm(ShortTermParams),
    #[serde(rename = "doble")]
    Double(DoubleParams),
    #[serde(rename = "detective")]
    Detective(DetectiveParams),
    #[serde(rename = "afinidad")]
    Affinity(AffinityParams),
    #[serde(rename = "eco")]
    Echo(EchoParams),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyKind {
    ShortTerm,
    Double,
    Detective,
    Affinity,
    Echo,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::ShortTerm,
        StrategyKind::Double,
        StrategyKind::Detective,
        StrategyKind::Affinity,
        StrategyKind::Echo,
    ];

    pub fn default_strategy(self) -> Strategy {
        match self {
            StrategyKind::ShortTerm => Strategy::ShortTerm(ShortTermParams::default()),
            StrategyKind::Double => Strategy::Double(DoubleParams::default()),
            StrategyKind::Detective => Strategy::Detective(DetectiveParams::default()),
            StrategyKind::Affinity => Strategy::Affinity(AffinityParams::default()),
            StrategyKind::Echo => Strategy::Echo(EchoParams::default()),
        }
    }
}

/// Ce qu'un score a le droit de voir : l'historique strictement antérieur au
/// tirage visé, en ordre chronologique.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub history: &'a [Draw],
    pub target: NaiveDate,
    pub weights: &'a RiskWeights,
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::ShortTerm(_) => StrategyKind::ShortTerm,
            Strategy::Double(_) => StrategyKind::Double,
            Strategy::Detective(_) => StrategyKind::Detective,
            Strategy::Affinity(_) => StrategyKind::Affinity,
            Strategy::Echo(_) => StrategyKind::Echo,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::ShortTerm(_) => "Corto plazo",
            Strategy::Double(_) => "Doble estrategia",
            Strategy::Detective(_) => "Detective",
            Strategy::Affinity(_) => "Afinidad",
            Strategy::Echo(_) => "Eco",
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        match self {
            Strategy::ShortTerm(p) => p.validate(),
            Strategy::Double(p) => p.validate(),
            Strategy::Detective(p) => p.validate(),
            Strategy::Affinity(p) => p.validate(),
            Strategy::Echo(p) => p.validate(),
        }
    }

    /// Seule la double stratégie lit et fait évoluer les poids de risque.
    pub fn uses_risk_weights(&self) -> bool {
        matches!(self, Strategy::Double(_))
    }

    /// Liste classée de candidats ; vide si l'historique ne suffit pas.
    pub fn candidates(&self, ctx: &ScoringContext<'_>) -> Vec<u32> {
        match self {
            Strategy::ShortTerm(p) => short_term::score(ctx.history, ctx.target, p),
            Strategy::Double(p) => double::score(ctx.history, ctx.weights, p),
            Strategy::Detective(p) => detective::score(ctx.history, ctx.target, p),
            Strategy::Affinity(p) => affinity::score(ctx.history, p),
            Strategy::Echo(p) => echo::score(ctx.history, p),
        }
    }

    /// Résumé des paramètres pour l'affichage.
    pub fn describe(&self) -> String {
        match self {
            Strategy::ShortTerm(p) => format!(
                "ventana={}d, candidatos={}, ponderación={:?}",
                p.window_days, p.candidates, p.weighting
            ),
            Strategy::Double(p) => format!("umbral={}d, candidatos={}", p.rotation_threshold, p.candidates),
            Strategy::Detective(p) => format!(
                "candidatos={}, racha={}, sorpresa={}, consistencia={}",
                p.candidates, p.streak_weight, p.surprise_weight, p.consistency_weight
            ),
            Strategy::Affinity(p) => format!("candidatos={}, confianza≥{}", p.candidates, p.confidence_threshold),
            Strategy::Echo(p) => format!("retraso={} sorteos", p.delay_draws),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.describe())
    }
}

pub fn all_strategies() -> Vec<Strategy> {
    StrategyKind::ALL.iter().map(|k| k.default_strategy()).collect()
}

pub fn save_strategy(strategy: &Strategy, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(strategy)?;
    std::fs::write(path, json).with_context(|| format!("Impossible d'écrire {:?}", path))?;
    Ok(())
}

pub fn load_strategy(path: &Path) -> Result<Strategy> {
    let json = std::fs::read_to_string(path).with_context(|| format!("Impossible de lire {:?}", path))?;
    let strategy: Strategy =
        serde_json::from_str(&json).with_context(|| format!("JSON invalide dans {:?}", path))?;
    Ok(strategy)
}
