use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;

use cashwin_db::models::Draw;

use super::metrics::Summary;
use super::{BacktestConfig, run_backtest};
use crate::strategies::Strategy;

#[derive(Debug, Clone, Serialize)]
pub struct StrategyComparison {
    pub strategy: Strategy,
    pub summary: Summary,
    pub skipped: usize,
}

/// Rejoue chaque stratégie sur la même période, en parallèle. Chaque exécution
/// part d'un état neuf. Résultat trié par précision décroissante ; une
/// stratégie en erreur est journalisée puis écartée.
pub fn compare_strategies(
    history: &[Draw],
    start: NaiveDate,
    end: NaiveDate,
    strategies: &[Strategy],
    config: &BacktestConfig,
) -> Vec<StrategyComparison> {
    let pb = ProgressBar::new(strategies.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}") {
        pb.set_style(style.progress_chars("=> "));
    }

    let mut results: Vec<StrategyComparison> = strategies
        .par_iter()
        .filter_map(|strategy| {
            let result = run_backtest(history, start, end, strategy, config);
            pb.inc(1);
            match result {
                Ok(report) => Some(StrategyComparison {
                    summary: report.summary(),
                    skipped: report.skipped.len(),
                    strategy: report.strategy,
                }),
                Err(e) => {
                    log::warn!("{} écartée : {}", strategy.name(), e);
                    None
                }
            }
        })
        .collect();
    pb.finish_and_clear();

    results.sort_by(|a, b| {
        b.summary
            .precision
            .percent()
            .partial_cmp(&a.summary.precision.percent())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results
}
