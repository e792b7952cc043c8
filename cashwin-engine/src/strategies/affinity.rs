use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cashwin_db::models::Draw;

use crate::error::{EngineResult, check_int};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityParams {
    #[serde(rename = "numero_candidatos")]
    pub candidates: usize,
    /// Nombre minimal de fois où un suiveur doit avoir suivi le dernier numéro.
    #[serde(rename = "umbral_confianza")]
    pub confidence_threshold: usize,
}

impl Default for AffinityParams {
    fn default() -> Self {
        Self {
            candidates: 5,
            confidence_threshold: 2,
        }
    }
}

impl AffinityParams {
    pub fn validate(&self) -> EngineResult<()> {
        check_int("numero_candidatos", self.candidates, 3, 20, "[3, 20]")?;
        check_int("umbral_confianza", self.confidence_threshold, 1, 10, "[1, 10]")
    }
}

/// Pour chaque numéro, combien de fois chaque autre numéro est sorti juste après.
/// Les suiveurs gardent leur ordre de première apparition.
#[derive(Debug, Clone, Default)]
pub struct SuccessorMap {
    followers: HashMap<u32, Vec<(u32, usize)>>,
}

impl SuccessorMap {
    /// `draws` doit être en ordre chronologique.
    pub fn build(draws: &[Draw]) -> Self {
        let mut followers: HashMap<u32, Vec<(u32, usize)>> = HashMap::new();
        for pair in draws.windows(2) {
            let counter = followers.entry(pair[0].number).or_default();
            match counter.iter_mut().find(|(n, _)| *n == pair[1].number) {
                Some((_, count)) => *count += 1,
                None => counter.push((pair[1].number, 1)),
            }
        }
        Self { followers }
    }

    pub fn followers(&self, number: u32) -> &[(u32, usize)] {
        self.followers.get(&number).map(Vec::as_slice).unwrap_or(&[])
    }
}

pub fn score(draws: &[Draw], params: &AffinityParams) -> Vec<u32> {
    let Some(last) = draws.last() else {
        return Vec::new();
    };

    let map = SuccessorMap::build(draws);
    let mut followers: Vec<(u32, usize)> = map
        .followers(last.number)
        .iter()
        .filter(|(_, count)| *count >= params.confidence_threshold)
        .copied()
        .collect();
    followers.sort_by(|a, b| b.1.cmp(&a.1));

    followers
        .into_iter()
        .take(params.candidates)
        .map(|(n, _)| n)
        .collect()
}
