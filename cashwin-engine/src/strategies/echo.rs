use serde::{Deserialize, Serialize};

use cashwin_db::models::Draw;

use crate::error::{EngineResult, check_int};
use crate::history::distinct_numbers;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoParams {
    #[serde(rename = "retraso_sorteos")]
    pub delay_draws: usize,
}

impl Default for EchoParams {
    fn default() -> Self {
        Self { delay_draws: 3 }
    }
}

impl EchoParams {
    pub fn validate(&self) -> EngineResult<()> {
        check_int("retraso_sorteos", self.delay_draws, 1, 10, "[1, 10]")
    }
}

/// Numéros distincts des `delay_draws` derniers tirages (ordre chronologique),
/// sans classement.
pub fn score(draws: &[Draw], params: &EchoParams) -> Vec<u32> {
    let n = params.delay_draws;
    if n == 0 || draws.len() < n {
        return Vec::new();
    }
    distinct_numbers(&draws[draws.len() - n..])
}
