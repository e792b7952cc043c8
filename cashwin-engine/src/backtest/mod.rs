pub mod compare;
pub mod metrics;

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use cashwin_db::models::{Draw, Slot};

use crate::error::{EngineError, EngineResult, check_int};
use crate::history::{chronological, distinct_dates, distinct_numbers};
use crate::selector::{MIN_CANDIDATES, PredictionMode, select};
use crate::strategies::{ScoringContext, Strategy};
use crate::weights::RiskWeights;
use metrics::{SlotMetrics, Summary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub mode: PredictionMode,
    /// En dessous de ce nombre de candidats, le tirage est ignoré.
    pub min_candidates: usize,
    /// Taille minimale de l'historique complet pour lancer un backtest.
    pub min_history: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            mode: PredictionMode::Triple,
            min_candidates: MIN_CANDIDATES,
            min_history: 20,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> EngineResult<()> {
        check_int("min_candidates", self.min_candidates, 1, 20, "[1, 20]")
    }

    fn effective_min_candidates(&self) -> usize {
        self.min_candidates.max(self.mode.min_candidates())
    }
}

/// Une ligne par tirage évalué.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRecord {
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "franja")]
    pub slot: Slot,
    #[serde(rename = "predicho")]
    pub predicted: Vec<u32>,
    #[serde(rename = "real")]
    pub actual: u32,
    #[serde(rename = "acierto")]
    pub hit: bool,
    /// Tirages écoulés depuis la dernière réussite sur ce numéro (réussites seulement).
    #[serde(rename = "sorteos_espera")]
    pub wait: Option<u32>,
    /// Tirages ratés d'affilée avant cette réussite, tous numéros confondus.
    #[serde(rename = "racha_general")]
    pub streak: Option<u32>,
}

/// Tirage exclu des métriques faute de candidats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDraw {
    pub date: NaiveDate,
    pub slot: Slot,
    pub candidates: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub strategy: Strategy,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub records: Vec<BacktestRecord>,
    pub skipped: Vec<SkippedDraw>,
    /// Poids de risque en fin de rejeu (tous à zéro hors stratégie doble).
    pub weights: RiskWeights,
}

impl BacktestReport {
    pub fn summary(&self) -> Summary {
        metrics::summarize(&self.records)
    }

    pub fn per_slot(&self) -> Vec<SlotMetrics> {
        metrics::per_slot(&self.records)
    }

    pub fn daily_hits(&self) -> Vec<(NaiveDate, usize)> {
        metrics::daily_hits(&self.records)
    }
}

/// État propre à une exécution : créé à zéro au début, jamais réutilisé.
#[derive(Debug, Clone)]
pub struct ReplayState {
    pub weights: RiskWeights,
    waits: HashMap<u32, u32>,
    global_misses: u32,
}

impl ReplayState {
    pub fn new(numbers: &[u32]) -> Self {
        Self {
            weights: RiskWeights::zeroed(numbers),
            waits: numbers.iter().map(|&n| (n, 0)).collect(),
            global_misses: 0,
        }
    }

    pub fn wait(&self, number: u32) -> u32 {
        self.waits.get(&number).copied().unwrap_or(0)
    }

    pub fn global_misses(&self) -> u32 {
        self.global_misses
    }

    /// Met à jour les compteurs d'attente et retourne (attente, série) lus
    /// avant la mise à jour, pour une réussite uniquement.
    fn observe(&mut self, actual: u32, hit: bool) -> (Option<u32>, Option<u32>) {
        let wait = self.wait(actual);
        let streak = self.global_misses;

        if hit {
            self.global_misses = 0;
            self.waits.insert(actual, 0);
        } else {
            self.global_misses += 1;
        }
        for w in self.waits.values_mut() {
            *w += 1;
        }

        if hit { (Some(wait), Some(streak)) } else { (None, None) }
    }
}

/// Période par défaut : de la 11e date la plus récente à la dernière.
pub fn default_range(draws: &[Draw]) -> Option<(NaiveDate, NaiveDate)> {
    let dates = distinct_dates(draws);
    let end = *dates.last()?;
    let start = if dates.len() > 10 { dates[dates.len() - 11] } else { dates[0] };
    Some((start, end))
}

/// Rejoue chaque tirage de `[start, end]` dans l'ordre chronologique. Pour le
/// tirage en position k, la stratégie ne voit que les positions 0..k.
pub fn run_backtest(
    history: &[Draw],
    start: NaiveDate,
    end: NaiveDate,
    strategy: &Strategy,
    config: &BacktestConfig,
) -> EngineResult<BacktestReport> {
    strategy.validate()?;
    config.validate()?;
    if start > end {
        return Err(EngineError::InvalidDateRange { start, end });
    }
    if history.len() < config.min_history {
        return Err(EngineError::DataInsufficient {
            needed: config.min_history,
            found: history.len(),
        });
    }

    let sorted = chronological(history);
    let mut state = ReplayState::new(&distinct_numbers(&sorted));
    let min_candidates = config.effective_min_candidates();

    let mut records = Vec::new();
    let mut skipped = Vec::new();

    for (k, draw) in sorted.iter().enumerate() {
        if draw.date < start {
            continue;
        }
        if draw.date > end {
            break;
        }

        let ctx = ScoringContext {
            history: &sorted[..k],
            target: draw.date,
            weights: &state.weights,
        };
        let candidates = strategy.candidates(&ctx);
        if candidates.len() < min_candidates {
            log::debug!(
                "{} {} ignoré : {} candidats sur {} requis",
                draw.date,
                draw.slot,
                candidates.len(),
                min_candidates
            );
            skipped.push(SkippedDraw {
                date: draw.date,
                slot: draw.slot,
                candidates: candidates.len(),
            });
            continue;
        }

        let predicted = select(&candidates, draw.slot.index(), config.mode)?;
        let hit = predicted.contains(&draw.number);
        let (wait, streak) = state.observe(draw.number, hit);
        if strategy.uses_risk_weights() {
            state.weights.update(&predicted, draw.number, hit);
        }

        records.push(BacktestRecord {
            date: draw.date,
            slot: draw.slot,
            predicted,
            actual: draw.number,
            hit,
            wait,
            streak,
        });
    }

    log::info!(
        "Backtest {} du {} au {} : {} évalués, {} ignorés",
        strategy.name(),
        start,
        end,
        records.len(),
        skipped.len()
    );

    Ok(BacktestReport {
        strategy: strategy.clone(),
        start,
        end,
        records,
        skipped,
        weights: state.weights,
    })
}

pub fn save_report(report: &BacktestReport, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("Impossible d'écrire {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{draw, make_cycle_draws, make_test_draws};
    use crate::strategies::{DoubleParams, EchoParams, ShortTermParams, StrategyKind, Weighting};

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn cycle_strategy() -> Strategy {
        Strategy::ShortTerm(ShortTermParams {
            window_days: 10,
            candidates: 5,
            weighting: Weighting::Linear,
        })
    }

    #[test]
    fn test_end_to_end_cycle() {
        let draws = make_cycle_draws(25);
        let (start, end) = (day("2024-01-16"), day("2024-01-25"));
        let report = run_backtest(&draws, start, end, &cycle_strategy(), &BacktestConfig::default()).unwrap();

        assert_eq!(report.records.len(), 10);
        assert!(report.skipped.is_empty());
        // Les quatre derniers numéros vus sont classés en tête : [k-1, k-2, k-3, k-4, k-5].
        // La franja mañana (index 0) prend les trois premiers, le numéro réel (k-5) n'y est pas.
        for r in &report.records {
            assert_eq!(r.slot, Slot::Morning);
            assert_eq!(r.predicted.len(), 3);
            assert!(!r.hit, "{} : {:?} contient {}", r.date, r.predicted, r.actual);
        }
        let summary = report.summary();
        assert_eq!(summary.hits, 0);
        assert_eq!(summary.precision.percent(), 0.0);
        assert!(summary.precision.has_data());
    }

    #[test]
    fn test_end_to_end_cycle_ranks_recent_first() {
        let draws = make_cycle_draws(25);
        let sorted = chronological(&draws);
        let k = 20;
        let weights = RiskWeights::default();
        let ctx = ScoringContext {
            history: &sorted[..k],
            target: sorted[k].date,
            weights: &weights,
        };
        let candidates = cycle_strategy().candidates(&ctx);
        let last_seen: Vec<u32> = sorted[..k].iter().rev().take(5).map(|d| d.number).collect();
        assert_eq!(candidates, last_seen);
    }

    #[test]
    fn test_determinism() {
        let draws = make_test_draws(40);
        let (start, end) = default_range(&draws).unwrap();
        for strategy in crate::strategies::all_strategies() {
            let a = run_backtest(&draws, start, end, &strategy, &BacktestConfig::default()).unwrap();
            let b = run_backtest(&draws, start, end, &strategy, &BacktestConfig::default()).unwrap();
            assert_eq!(a, b, "{} non déterministe", strategy.name());
        }
    }

    #[test]
    fn test_no_lookahead() {
        let draws = make_test_draws(30);
        let sorted = chronological(&draws);
        let k = 100;

        let mut mutated = sorted.clone();
        for d in mutated.iter_mut().skip(k) {
            d.number = (d.number + 37) % 50;
        }
        mutated.truncate(k + 20);

        let numbers = distinct_numbers(&sorted);
        let weights = RiskWeights::zeroed(&numbers);
        for strategy in crate::strategies::all_strategies() {
            let ctx = |h: &[Draw]| {
                strategy.candidates(&ScoringContext {
                    history: &h[..k],
                    target: h[k].date,
                    weights: &weights,
                })
            };
            assert_eq!(ctx(&sorted[..]), ctx(&mutated[..]), "{} voit le futur", strategy.name());
        }
    }

    /// Un numéro neuf par jour : aucun numéro n'a de rotation, la doble se rabat
    /// sur les numéros déjà vus.
    fn fresh_numbers(n_days: u64) -> Vec<Draw> {
        let start = day("2024-01-01");
        (0..n_days)
            .map(|i| Draw::new(start + chrono::Days::new(i), Slot::Morning, i as u32))
            .collect()
    }

    /// Les tirages datés après `end` reçoivent des numéros jamais vus.
    fn mutate_after(draws: &[Draw], end: NaiveDate) -> Vec<Draw> {
        draws
            .iter()
            .map(|d| if d.date > end { Draw { number: d.number + 100, ..d.clone() } } else { d.clone() })
            .collect()
    }

    #[test]
    fn test_future_draws_do_not_change_past_records() {
        let fixtures = [
            (make_test_draws(30), day("2024-01-10"), day("2024-01-20")),
            (fresh_numbers(25), day("2024-01-02"), day("2024-01-12")),
        ];
        let config = BacktestConfig::default();

        for (draws, start, end) in &fixtures {
            let truncated: Vec<Draw> = draws.iter().filter(|d| d.date <= *end).cloned().collect();
            let altered = mutate_after(draws, *end);
            for strategy in crate::strategies::all_strategies() {
                let full = run_backtest(draws, *start, *end, &strategy, &config).unwrap();
                let other = run_backtest(&altered, *start, *end, &strategy, &config).unwrap();
                assert_eq!(full.records, other.records, "{} voit le futur", strategy.name());
                assert_eq!(full.skipped, other.skipped, "{} voit le futur", strategy.name());

                if truncated.len() >= config.min_history {
                    let cut = run_backtest(&truncated, *start, *end, &strategy, &config).unwrap();
                    assert_eq!(full.records, cut.records, "{} voit le futur", strategy.name());
                }
            }
        }
    }

    #[test]
    fn test_double_fallback_only_uses_past_numbers() {
        let draws = fresh_numbers(25);
        let strategy = StrategyKind::Double.default_strategy();
        let config = BacktestConfig::default();
        let report = run_backtest(&draws, day("2024-01-02"), day("2024-01-12"), &strategy, &config).unwrap();

        // 01-02 et 01-03 : un puis deux numéros connus seulement.
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.records.len(), 9);
        for r in &report.records {
            assert!(!r.hit, "{} : {:?} contient {}", r.date, r.predicted, r.actual);
            assert!(r.predicted.iter().all(|&n| n < r.actual));
        }
    }

    #[test]
    fn test_double_ignores_later_draw_in_range() {
        let draws = fresh_numbers(25);
        let mut altered = draws.clone();
        altered[2].number = 99;
        let strategy = StrategyKind::Double.default_strategy();
        let config = BacktestConfig::default();

        let a = run_backtest(&draws, day("2024-01-02"), day("2024-01-02"), &strategy, &config).unwrap();
        let b = run_backtest(&altered, day("2024-01-02"), day("2024-01-02"), &strategy, &config).unwrap();
        assert_eq!(a.records, b.records);
        assert_eq!(a.skipped, b.skipped);
        // Seul le 0 est connu avant le 01-02.
        assert_eq!(a.skipped.len(), 1);
        assert_eq!(a.skipped[0].candidates, 1);
    }

    #[test]
    fn test_skipped_draws_excluded_from_metrics() {
        // Eco sur 3 tirages qui répètent le même numéro : un seul candidat.
        let mut draws = make_cycle_draws(20);
        for d in draws.iter_mut().skip(15) {
            d.number = 9;
        }
        let strategy = Strategy::Echo(EchoParams { delay_draws: 3 });
        let report = run_backtest(&draws, day("2024-01-01"), day("2024-01-20"), &strategy, &BacktestConfig::default()).unwrap();

        let summary = report.summary();
        assert_eq!(summary.total + report.skipped.len(), 20);
        // Les 3 premiers tirages n'ont pas assez d'historique, puis 9,9,9 ne donne qu'un candidat.
        assert!(report.skipped.iter().any(|s| s.date == day("2024-01-01") && s.candidates == 0));
        assert!(report.skipped.iter().any(|s| s.date == day("2024-01-19") && s.candidates == 1));
        assert_eq!(summary.total, report.records.len());
    }

    #[test]
    fn test_all_skipped_gives_no_data() {
        let draws = make_cycle_draws(20);
        // confiance 10 jamais atteinte sur 20 tirages
        let strategy = Strategy::Affinity(crate::strategies::AffinityParams {
            candidates: 5,
            confidence_threshold: 10,
        });
        let report = run_backtest(&draws, day("2024-01-01"), day("2024-01-20"), &strategy, &BacktestConfig::default()).unwrap();
        let summary = report.summary();
        assert_eq!(summary.total, 0);
        assert_eq!(report.skipped.len(), 20);
        assert!(!summary.precision.has_data());
        assert_eq!(summary.precision.percent(), 0.0);
    }

    #[test]
    fn test_wait_and_streak_counters() {
        let mut state = ReplayState::new(&[1, 2, 3]);
        assert_eq!(state.observe(1, false), (None, None));
        assert_eq!(state.observe(2, false), (None, None));
        assert_eq!(state.global_misses(), 2);
        // 3 attend depuis 2 tirages, 2 échecs globaux avant
        assert_eq!(state.observe(3, true), (Some(2), Some(2)));
        assert_eq!(state.global_misses(), 0);
        assert_eq!(state.wait(3), 1);
        assert_eq!(state.wait(1), 3);
        assert_eq!(state.observe(3, true), (Some(1), Some(0)));
    }

    /// Cycle 5, 4, 3, 2, 1 : le 5 reste en tête et prend +1 à chaque échec.
    fn reverse_cycle(n_days: usize) -> Vec<Draw> {
        make_cycle_draws(n_days)
            .into_iter()
            .map(|d| Draw { number: 6 - d.number, ..d })
            .collect()
    }

    #[test]
    fn test_risk_weights_follow_outcomes() {
        let draws = reverse_cycle(25);
        let strategy = Strategy::Double(DoubleParams {
            rotation_threshold: 5,
            candidates: 5,
        });
        let config = BacktestConfig {
            mode: PredictionMode::Single,
            ..BacktestConfig::default()
        };
        let report = run_backtest(&draws, day("2024-01-21"), day("2024-01-25"), &strategy, &config).unwrap();

        let predicted: Vec<&Vec<u32>> = report.records.iter().map(|r| &r.predicted).collect();
        assert!(predicted.iter().all(|p| p.as_slice() == [5]));
        let hits: Vec<bool> = report.records.iter().map(|r| r.hit).collect();
        assert_eq!(hits, vec![true, false, false, false, false]);
        // Réussite à zéro : plancher. Puis quatre échecs du candidat principal.
        assert_eq!(report.weights.get(5), 4);
        assert!([1, 2, 3, 4].iter().all(|&n| report.weights.get(n) == 0));
    }

    #[test]
    fn test_risk_weights_untouched_for_other_strategies() {
        let draws = reverse_cycle(25);
        let config = BacktestConfig {
            mode: PredictionMode::Single,
            ..BacktestConfig::default()
        };
        let report = run_backtest(&draws, day("2024-01-21"), day("2024-01-25"), &cycle_strategy(), &config).unwrap();
        assert!(report.records.iter().any(|r| !r.hit));
        assert!(report.weights.numbers().iter().all(|&n| report.weights.get(n) == 0));
    }

    #[test]
    fn test_fresh_state_per_run() {
        let draws = reverse_cycle(25);
        let strategy = StrategyKind::Double.default_strategy();
        let (start, end) = default_range(&draws).unwrap();
        let first = run_backtest(&draws, start, end, &strategy, &BacktestConfig::default()).unwrap();
        let second = run_backtest(&draws, start, end, &strategy, &BacktestConfig::default()).unwrap();
        assert_eq!(first.weights, second.weights);
        assert_eq!(first.records, second.records);
    }

    #[test]
    fn test_single_mode() {
        let draws = make_test_draws(30);
        let (start, end) = default_range(&draws).unwrap();
        let config = BacktestConfig {
            mode: PredictionMode::Single,
            ..BacktestConfig::default()
        };
        let report = run_backtest(&draws, start, end, &cycle_strategy(), &config).unwrap();
        assert!(report.records.iter().all(|r| r.predicted.len() == 1));
        assert!(report.records.iter().all(|r| r.hit == (r.predicted[0] == r.actual)));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let draws = make_test_draws(30);
        let strategy = cycle_strategy();
        let config = BacktestConfig::default();

        assert_eq!(
            run_backtest(&draws, day("2024-01-20"), day("2024-01-10"), &strategy, &config).unwrap_err(),
            EngineError::InvalidDateRange {
                start: day("2024-01-20"),
                end: day("2024-01-10")
            }
        );

        let short: Vec<Draw> = draws.iter().take(10).cloned().collect();
        assert_eq!(
            run_backtest(&short, day("2024-01-01"), day("2024-01-02"), &strategy, &config).unwrap_err(),
            EngineError::DataInsufficient { needed: 20, found: 10 }
        );

        let bad = Strategy::ShortTerm(ShortTermParams {
            candidates: 1,
            ..ShortTermParams::default()
        });
        assert!(matches!(
            run_backtest(&draws, day("2024-01-10"), day("2024-01-20"), &bad, &config),
            Err(EngineError::ParameterInvalid { name: "numero_candidatos", .. })
        ));
    }

    #[test]
    fn test_same_day_slots_see_earlier_slots() {
        let mut draws = make_cycle_draws(20);
        draws.push(draw("2024-01-20", Slot::Night, 42));
        let strategy = Strategy::Echo(EchoParams { delay_draws: 3 });
        let report = run_backtest(&draws, day("2024-01-20"), day("2024-01-20"), &strategy, &BacktestConfig::default()).unwrap();
        assert_eq!(report.records.len(), 2);
        // La franja noche voit le tirage mañana du même jour.
        let night = report.records.iter().find(|r| r.slot == Slot::Night).unwrap();
        assert!(night.predicted.contains(&5));
    }

    #[test]
    fn test_default_range() {
        let draws = make_test_draws(30);
        let (start, end) = default_range(&draws).unwrap();
        assert_eq!(end, day("2024-01-30"));
        assert_eq!(start, day("2024-01-20"));
        assert_eq!(default_range(&[]), None);

        let few = make_test_draws(4);
        assert_eq!(default_range(&few).unwrap().0, day("2024-01-01"));
    }

    #[test]
    fn test_save_report() {
        let draws = make_cycle_draws(25);
        let report = run_backtest(&draws, day("2024-01-16"), day("2024-01-25"), &cycle_strategy(), &BacktestConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backtest.json");
        save_report(&report, &path).unwrap();
        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"acierto\""));
        let loaded: BacktestReport = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, report);
    }
}
