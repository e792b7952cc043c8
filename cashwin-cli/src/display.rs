use chrono::NaiveDate;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use textplots::Plot;

use cashwin_db::models::{Draw, NumberStats, SlotStats};
use cashwin_engine::backtest::BacktestReport;
use cashwin_engine::backtest::compare::StrategyComparison;
use cashwin_engine::predict::PredictionOutcome;
use cashwin_engine::rotation::RotationEntry;
use cashwin_engine::strategies::Strategy;

use crate::import::ImportResult;

const LAST_RECORDS: usize = 50;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join_numbers(numbers: &[u32]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_draws(draws: &[(usize, &Draw)]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["#", "Fecha", "Franja", "Numéro"]);
    for (i, draw) in draws {
        table.add_row(vec![
            i.to_string(),
            draw.date.to_string(),
            draw.slot.to_string(),
            format!("{:2}", draw.number),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Importés          : {}", result.imported);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

pub fn display_stats(number_stats: &[NumberStats], slot_stats: &[SlotStats], window: usize) {
    println!("\n📊 Statistiques sur les {} derniers tirages\n", window);

    println!("── Numéros ──");
    let mut table = new_table(vec!["Numéro", "Fréquence", "Retard", "Dernière sortie"]);
    for stat in number_stats {
        table.add_row(vec![
            format!("{:2}", stat.number),
            stat.frequency.to_string(),
            stat.gap.to_string(),
            stat.last_seen.map(|d| d.to_string()).unwrap_or_else(|| "—".to_string()),
        ]);
    }
    println!("{table}");

    println!("\n── Franjas ──");
    let mut table = new_table(vec!["Franja", "Tirages"]);
    for stat in slot_stats {
        table.add_row(vec![stat.slot.to_string(), stat.count.to_string()]);
    }
    println!("{table}");
}

pub fn display_rotation(entries: &[RotationEntry], active: &[u32], threshold: f64) {
    println!("\n🔄 Rotation des numéros (seuil {} jours)\n", threshold);

    if entries.is_empty() {
        println!("  (Aucun numéro sorti à deux dates différentes)");
        return;
    }

    let mut table = new_table(vec!["Numéro", "Rotation (jours)", "Actif"]);
    for entry in entries {
        let (label, color) = if entry.active {
            ("oui", Color::Green)
        } else {
            ("non", Color::White)
        };
        table.add_row(vec![
            Cell::new(format!("{:2}", entry.number)),
            Cell::new(format!("{:.2}", entry.rotation)),
            Cell::new(label).fg(color),
        ]);
    }
    println!("{table}");

    println!("\nNuméros actifs : {}", join_numbers(active));
}

pub fn display_prediction(strategy: &Strategy, date: NaiveDate, outcome: &PredictionOutcome) {
    println!("\n🎯 Prédiction du {} : {}\n", date, strategy);

    match outcome {
        PredictionOutcome::NoData => {
            println!("Aucun tirage antérieur au {}. Importez ou ajoutez des résultats.", date);
        }
        PredictionOutcome::InsufficientCandidates { candidates, needed } => {
            println!(
                "Pas assez de candidats : {} obtenus, {} requis ({}).",
                candidates.len(),
                needed,
                join_numbers(candidates)
            );
        }
        PredictionOutcome::Ready { candidates, slots } => {
            println!("Candidats classés : {}\n", join_numbers(candidates));
            let mut table = new_table(vec!["Franja", "Numéros"]);
            for s in slots {
                table.add_row(vec![s.slot.to_string(), join_numbers(&s.numbers)]);
            }
            println!("{table}");
        }
    }
}

pub fn display_backtest(report: &BacktestReport) {
    let summary = report.summary();
    println!(
        "\n== Backtest {} du {} au {} ==\n",
        report.strategy, report.start, report.end
    );
    println!("  Tirages évalués : {}", summary.total);
    println!("  Réussites       : {}", summary.hits);
    println!("  Précision       : {}", summary.precision);
    if !report.skipped.is_empty() {
        println!("  Ignorés (candidats insuffisants) : {}", report.skipped.len());
    }

    if summary.total == 0 {
        return;
    }

    println!("\n── Par franja ──");
    let mut table = new_table(vec!["Franja", "Réussites", "Tirages", "Précision"]);
    for m in report.per_slot() {
        table.add_row(vec![
            m.slot.to_string(),
            m.hits.to_string(),
            m.count.to_string(),
            m.precision.to_string(),
        ]);
    }
    println!("{table}");

    println!("\n── {} derniers tirages ──", LAST_RECORDS.min(report.records.len()));
    let mut table = new_table(vec!["Fecha", "Franja", "Prédit", "Réel", "Résultat", "Attente", "Série"]);
    for r in report.records.iter().rev().take(LAST_RECORDS) {
        let (label, color) = if r.hit {
            ("✓", Color::Green)
        } else {
            ("✗", Color::Red)
        };
        let opt = |v: Option<u32>| v.map(|x| x.to_string()).unwrap_or_default();
        table.add_row(vec![
            Cell::new(r.date),
            Cell::new(r.slot),
            Cell::new(join_numbers(&r.predicted)),
            Cell::new(format!("{:2}", r.actual)),
            Cell::new(label).fg(color),
            Cell::new(opt(r.wait)),
            Cell::new(opt(r.streak)),
        ]);
    }
    println!("{table}");

    display_daily_chart(&report.daily_hits());
}

pub fn display_daily_chart(daily: &[(NaiveDate, usize)]) {
    println!("\n== Réussites par jour ==\n");

    let Some(&(first, _)) = daily.first() else {
        println!("  (Pas de données à afficher)");
        return;
    };

    let points: Vec<(f32, f32)> = daily
        .iter()
        .map(|(d, hits)| ((*d - first).num_days() as f32, *hits as f32))
        .collect();
    let x_max = points.last().map(|p| p.0).unwrap_or(0.0).max(1.0);
    let y_max = points.iter().map(|p| p.1).fold(0.0f32, f32::max) + 1.0;

    let shape = textplots::Shape::Lines(&points);
    let mut chart = textplots::Chart::new_with_y_range(120, 40, 0.0, x_max, 0.0, y_max);
    println!("{}", chart.lineplot(&shape));
    println!("  (jours depuis le {})", first);
}

pub fn display_comparison(results: &[StrategyComparison], start: NaiveDate, end: NaiveDate) {
    println!("\n== Comparaison des stratégies du {} au {} ==\n", start, end);

    if results.is_empty() {
        println!("  (Aucune stratégie n'a pu être évaluée)");
        return;
    }

    let mut table = new_table(vec!["#", "Stratégie", "Paramètres", "Évalués", "Réussites", "Précision", "Ignorés"]);
    for (i, r) in results.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            r.strategy.name().to_string(),
            r.strategy.describe(),
            r.summary.total.to_string(),
            r.summary.hits.to_string(),
            r.summary.precision.to_string(),
            r.skipped.to_string(),
        ]);
    }
    println!("{table}");
}
