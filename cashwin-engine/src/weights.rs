use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Poids de risque façon d'Alembert : +1 sur l'échec du candidat principal,
/// -1 (plancher 0) sur le numéro réussi.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    order: Vec<u32>,
    weights: HashMap<u32, u32>,
}

impl RiskWeights {
    /// Table à zéro pour chaque numéro, dans l'ordre donné.
    pub fn zeroed(numbers: &[u32]) -> Self {
        let mut table = Self::default();
        for &n in numbers {
            table.ensure(n);
        }
        table
    }

    fn ensure(&mut self, number: u32) -> &mut u32 {
        if !self.weights.contains_key(&number) {
            self.order.push(number);
        }
        self.weights.entry(number).or_insert(0)
    }

    pub fn get(&self, number: u32) -> u32 {
        self.weights.get(&number).copied().unwrap_or(0)
    }

    /// Numéros connus, dans l'ordre d'initialisation.
    pub fn numbers(&self) -> &[u32] {
        &self.order
    }

    pub fn record_hit(&mut self, actual: u32) {
        let w = self.ensure(actual);
        *w = w.saturating_sub(1);
    }

    pub fn record_miss(&mut self, primary: u32) {
        *self.ensure(primary) += 1;
    }

    /// Applique la règle de mise à jour pour un tirage évalué.
    /// `prediction` doit être triée : son premier élément est le candidat principal.
    pub fn update(&mut self, prediction: &[u32], actual: u32, hit: bool) {
        if hit {
            self.record_hit(actual);
        } else if let Some(&primary) = prediction.first() {
            self.record_miss(primary);
        }
    }

    /// Trie `numbers` par poids décroissant ; tri stable sur l'ordre reçu.
    pub fn rank(&self, numbers: &[u32]) -> Vec<u32> {
        let mut ranked = numbers.to_vec();
        ranked.sort_by(|a, b| self.get(*b).cmp(&self.get(*a)));
        ranked
    }
}
