mod display;
mod import;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};

use cashwin_db::db::{DrawStore, db_path};
use cashwin_db::models::{Draw, Slot, validate_number};
use cashwin_engine::backtest::compare::compare_strategies;
use cashwin_engine::backtest::{BacktestConfig, default_range, run_backtest, save_report};
use cashwin_engine::history::parse_date;
use cashwin_engine::predict::{Session, predict};
use cashwin_engine::rotation::{active_numbers, rotation_table};
use cashwin_engine::selector::PredictionMode;
use cashwin_engine::stats::{compute_stats, slot_stats};
use cashwin_engine::strategies::{Strategy, StrategyKind, Weighting, all_strategies, load_strategy, save_strategy};

use crate::display::{
    display_backtest, display_comparison, display_draws, display_import_summary, display_prediction,
    display_rotation, display_stats,
};

#[derive(Parser)]
#[command(name = "cashwin", about = "Prévisions et backtest des tirages par franja")]
struct Cli {
    /// Fichier des résultats (défaut : data/resultados.json)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les résultats depuis un CSV (fecha,franja,numero) ; remplace l'historique
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Afficher le chemin du fichier des résultats
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: usize,
    },

    /// Ajouter un tirage manuellement
    Add,

    /// Supprimer un tirage par sa position (voir `list`)
    Delete { index: usize },

    /// Fréquences, retards et activité par franja
    Stats {
        /// Fenêtre d'analyse (nombre de tirages, tout l'historique par défaut)
        #[arg(short, long)]
        window: Option<usize>,
    },

    /// Rotation des numéros et numéros actifs
    Rotation {
        /// Seuil de rotation (jours)
        #[arg(short, long, default_value = "4")]
        umbral: f64,
    },

    /// Prédire les numéros de chaque franja pour une date
    Predict {
        #[command(flatten)]
        strategy: StrategyArgs,

        /// Date visée (AAAA-MM-JJ, aujourd'hui par défaut)
        #[arg(short, long)]
        date: Option<String>,

        #[arg(short, long, value_enum, default_value = "triple")]
        mode: PredictionMode,
    },

    /// Rejouer une stratégie sur une période passée
    Backtest {
        #[command(flatten)]
        strategy: StrategyArgs,

        /// Début de la période (AAAA-MM-JJ)
        #[arg(long)]
        from: Option<String>,

        /// Fin de la période (AAAA-MM-JJ)
        #[arg(long)]
        to: Option<String>,

        #[arg(short, long, value_enum, default_value = "triple")]
        mode: PredictionMode,

        /// Exporter le rapport complet en JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Sauvegarder la stratégie utilisée (réutilisable avec --config)
        #[arg(long)]
        save_config: Option<PathBuf>,
    },

    /// Comparer toutes les stratégies sur la même période
    Compare {
        #[command(flatten)]
        overrides: ParamOverrides,

        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,

        #[arg(short, long, value_enum, default_value = "triple")]
        mode: PredictionMode,
    },
}

/// Choix de la stratégie et surcharge de ses paramètres.
#[derive(Args, Debug, Clone)]
struct StrategyArgs {
    #[arg(short, long, value_enum, default_value = "short-term")]
    strategy: StrategyKind,

    /// Sélection complète chargée depuis un JSON (ignore les autres options)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ParamOverrides,
}

impl StrategyArgs {
    fn build(&self) -> Result<Strategy> {
        match &self.config {
            Some(path) => load_strategy(path),
            None => Ok(self.overrides.apply(self.strategy.default_strategy())),
        }
    }
}

/// Surcharges de paramètres, appliquées aux seules variantes concernées.
#[derive(Args, Debug, Clone)]
struct ParamOverrides {
    #[arg(long)]
    ventana_dias: Option<usize>,

    #[arg(long)]
    numero_candidatos: Option<usize>,

    #[arg(long, value_enum)]
    tipo_ponderacion: Option<Weighting>,

    #[arg(long)]
    umbral_rotacion: Option<usize>,

    #[arg(long)]
    peso_racha: Option<f64>,

    #[arg(long)]
    peso_sorpresa: Option<f64>,

    #[arg(long)]
    peso_consistencia: Option<f64>,

    #[arg(long)]
    umbral_confianza: Option<usize>,

    #[arg(long)]
    retraso_sorteos: Option<usize>,
}

impl ParamOverrides {
    /// Applique les surcharges pertinentes pour la variante reçue.
    fn apply(&self, mut strategy: Strategy) -> Strategy {
        match &mut strategy {
            Strategy::ShortTerm(p) => {
                if let Some(v) = self.ventana_dias {
                    p.window_days = v;
                }
                if let Some(v) = self.numero_candidatos {
                    p.candidates = v;
                }
                if let Some(v) = self.tipo_ponderacion {
                    p.weighting = v;
                }
            }
            Strategy::Double(p) => {
                if let Some(v) = self.umbral_rotacion {
                    p.rotation_threshold = v;
                }
                if let Some(v) = self.numero_candidatos {
                    p.candidates = v;
                }
            }
            Strategy::Detective(p) => {
                if let Some(v) = self.numero_candidatos {
                    p.candidates = v;
                }
                if let Some(v) = self.peso_racha {
                    p.streak_weight = v;
                }
                if let Some(v) = self.peso_sorpresa {
                    p.surprise_weight = v;
                }
                if let Some(v) = self.peso_consistencia {
                    p.consistency_weight = v;
                }
            }
            Strategy::Affinity(p) => {
                if let Some(v) = self.numero_candidatos {
                    p.candidates = v;
                }
                if let Some(v) = self.umbral_confianza {
                    p.confidence_threshold = v;
                }
            }
            Strategy::Echo(p) => {
                if let Some(v) = self.retraso_sorteos {
                    p.delay_draws = v;
                }
            }
        }
        strategy
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let path = cli.data.unwrap_or_else(db_path);
    let mut store = DrawStore::open(&path)?;
    if store.rejected() > 0 {
        println!("({} enregistrements invalides ignorés dans {})", store.rejected(), path.display());
    }

    match cli.command {
        Command::Import { file } => cmd_import(&mut store, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&store, last),
        Command::Add => cmd_add(&mut store),
        Command::Delete { index } => cmd_delete(&mut store, index),
        Command::Stats { window } => cmd_stats(&store, window),
        Command::Rotation { umbral } => cmd_rotation(&store, umbral),
        Command::Predict { strategy, date, mode } => cmd_predict(&store, &strategy, date.as_deref(), mode),
        Command::Backtest {
            strategy,
            from,
            to,
            mode,
            output,
            save_config,
        } => cmd_backtest(&store, &strategy, from.as_deref(), to.as_deref(), mode, output, save_config),
        Command::Compare {
            overrides,
            from,
            to,
            mode,
        } => cmd_compare(&store, &overrides, from.as_deref(), to.as_deref(), mode),
    }
}

fn cmd_import(store: &mut DrawStore, file: &PathBuf) -> Result<()> {
    let result = import::import_csv(store, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(store: &DrawStore, last: usize) -> Result<()> {
    if store.count() == 0 {
        println!("Historique vide. Lancez d'abord : cashwin import");
        return Ok(());
    }
    display_draws(&store.last(last));
    Ok(())
}

fn cmd_delete(store: &mut DrawStore, index: usize) -> Result<()> {
    let removed = store.delete(index)?;
    println!("Tirage supprimé : {} {} {}", removed.date, removed.slot, removed.number);
    Ok(())
}

fn cmd_stats(store: &DrawStore, window: Option<usize>) -> Result<()> {
    if store.count() == 0 {
        println!("Historique vide. Lancez d'abord : cashwin import");
        return Ok(());
    }
    let effective_window = window.unwrap_or(store.count()).min(store.count());
    let numbers = compute_stats(store.draws(), Some(effective_window));
    let slots = slot_stats(store.draws(), Some(effective_window));
    display_stats(&numbers, &slots, effective_window);
    Ok(())
}

fn cmd_rotation(store: &DrawStore, threshold: f64) -> Result<()> {
    if store.count() == 0 {
        println!("Historique vide. Lancez d'abord : cashwin import");
        return Ok(());
    }
    let entries = rotation_table(store.draws(), threshold);
    let active = active_numbers(store.draws(), threshold);
    display_rotation(&entries, &active, threshold);
    Ok(())
}

fn cmd_predict(store: &DrawStore, args: &StrategyArgs, date: Option<&str>, mode: PredictionMode) -> Result<()> {
    let strategy = args.build()?;
    let target = match date {
        Some(raw) => parse_date(raw)?,
        None => Local::now().date_naive(),
    };

    let session = Session::new(store.draws());
    let outcome = predict(store.draws(), target, &strategy, &session, mode)?;
    display_prediction(&strategy, target, &outcome);
    Ok(())
}

/// Période demandée, complétée par la période par défaut.
fn resolve_range(store: &DrawStore, from: Option<&str>, to: Option<&str>) -> Result<(NaiveDate, NaiveDate)> {
    let Some((default_start, default_end)) = default_range(store.draws()) else {
        bail!("Historique vide. Lancez d'abord : cashwin import");
    };
    let start = from.map(parse_date).transpose()?.unwrap_or(default_start);
    let end = to.map(parse_date).transpose()?.unwrap_or(default_end);
    Ok((start, end))
}

fn cmd_backtest(
    store: &DrawStore,
    args: &StrategyArgs,
    from: Option<&str>,
    to: Option<&str>,
    mode: PredictionMode,
    output: Option<PathBuf>,
    save_config: Option<PathBuf>,
) -> Result<()> {
    let strategy = args.build()?;
    let (start, end) = resolve_range(store, from, to)?;
    let config = BacktestConfig {
        mode,
        ..BacktestConfig::default()
    };

    let report = run_backtest(store.draws(), start, end, &strategy, &config)?;
    display_backtest(&report);

    if let Some(path) = output {
        save_report(&report, &path)?;
        println!("\nRapport sauvegardé dans : {}", path.display());
    }
    if let Some(path) = save_config {
        save_strategy(&strategy, &path)?;
        println!("Stratégie sauvegardée dans : {}", path.display());
    }
    Ok(())
}

fn cmd_compare(
    store: &DrawStore,
    overrides: &ParamOverrides,
    from: Option<&str>,
    to: Option<&str>,
    mode: PredictionMode,
) -> Result<()> {
    let (start, end) = resolve_range(store, from, to)?;
    let config = BacktestConfig {
        mode,
        ..BacktestConfig::default()
    };
    let strategies: Vec<Strategy> = all_strategies().into_iter().map(|s| overrides.apply(s)).collect();

    println!("Comparaison de {} stratégies sur {} tirages...", strategies.len(), store.count());
    let results = compare_strategies(store.draws(), start, end, &strategies, &config);
    display_comparison(&results, start, end);
    Ok(())
}

fn cmd_add(store: &mut DrawStore) -> Result<()> {
    println!("Ajout d'un tirage manuellement\n");

    let raw_date = prompt("Date (AAAA-MM-JJ, vide = aujourd'hui) : ")?;
    let date = if raw_date.is_empty() {
        Local::now().date_naive()
    } else {
        parse_date(&raw_date)?
    };
    let slot = prompt_slot()?;
    let number = prompt_number()?;

    let draw = Draw::new(date, slot, number);

    println!("\nTirage à insérer :");
    display_draws(&[(store.count(), &draw)]);

    let confirm = prompt("\nConfirmer l'insertion ? (o/n) : ")?;
    if confirm.trim().to_lowercase() == "o" {
        if store.insert(draw)? {
            println!("Tirage inséré avec succès.");
        } else {
            println!("Ce tirage existe déjà (doublon ignoré).");
        }
    } else {
        println!("Insertion annulée.");
    }

    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    Ok(input.trim().to_string())
}

fn prompt_slot() -> Result<Slot> {
    let names: Vec<&str> = Slot::ALL.iter().map(|s| s.name()).collect();
    loop {
        let input = prompt(&format!("Franja ({}) : ", names.join(", ")))?;
        match input.parse::<Slot>() {
            Ok(slot) => return Ok(slot),
            Err(e) => println!("{}. Réessayez.", e),
        }
    }
}

fn prompt_number() -> Result<u32> {
    loop {
        let input = prompt("Numéro gagnant : ")?;
        match input.parse::<i64>().map_err(anyhow::Error::from).and_then(validate_number) {
            Ok(n) => return Ok(n),
            Err(_) => println!("Numéro invalide (entier positif). Réessayez."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashwin_engine::strategies::ShortTermParams;

    fn args(extra: &[&str]) -> StrategyArgs {
        let mut argv = vec!["cashwin", "predict"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Predict { strategy, .. } => strategy,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_default_strategy_args() {
        let strategy = args(&[]).build().unwrap();
        assert_eq!(strategy, Strategy::ShortTerm(ShortTermParams::default()));
    }

    #[test]
    fn test_overrides_apply_to_selected_variant() {
        let strategy = args(&["--strategy", "short-term", "--ventana-dias", "15", "--tipo-ponderacion", "linear"])
            .build()
            .unwrap();
        assert_eq!(
            strategy,
            Strategy::ShortTerm(ShortTermParams {
                window_days: 15,
                candidates: 5,
                weighting: Weighting::Linear,
            })
        );
    }

    #[test]
    fn test_overrides_ignore_other_variants() {
        let a = args(&["--strategy", "echo", "--ventana-dias", "15", "--retraso-sorteos", "5"]);
        match a.build().unwrap() {
            Strategy::Echo(p) => assert_eq!(p.delay_draws, 5),
            other => panic!("variante inattendue : {:?}", other),
        }
    }

    #[test]
    fn test_config_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("estrategia.json");
        std::fs::write(&path, r#"{"estrategia": "eco", "retraso_sorteos": 4}"#).unwrap();

        let config = path.to_string_lossy().to_string();
        let a = args(&["--strategy", "double", "--config", &config]);
        match a.build().unwrap() {
            Strategy::Echo(p) => assert_eq!(p.delay_draws, 4),
            other => panic!("variante inattendue : {:?}", other),
        }
    }

    fn compare_overrides(extra: &[&str]) -> Result<ParamOverrides, clap::Error> {
        let mut argv = vec!["cashwin", "compare"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv)?.command {
            Command::Compare { overrides, .. } => Ok(overrides),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_compare_rejects_strategy_choice() {
        assert!(compare_overrides(&["--strategy", "echo"]).is_err());
        assert!(compare_overrides(&["--config", "estrategia.json"]).is_err());
    }

    #[test]
    fn test_compare_overrides_reach_every_strategy() {
        let overrides = compare_overrides(&["--numero-candidatos", "9", "--retraso-sorteos", "6"]).unwrap();
        let strategies: Vec<Strategy> = all_strategies().into_iter().map(|s| overrides.apply(s)).collect();
        for strategy in &strategies {
            match strategy {
                Strategy::ShortTerm(p) => assert_eq!(p.candidates, 9),
                Strategy::Double(p) => assert_eq!(p.candidates, 9),
                Strategy::Detective(p) => assert_eq!(p.candidates, 9),
                Strategy::Affinity(p) => assert_eq!(p.candidates, 9),
                Strategy::Echo(p) => assert_eq!(p.delay_draws, 6),
            }
        }
    }

    #[test]
    fn test_resolve_range_defaults_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DrawStore::open(&dir.path().join("r.json")).unwrap();
        assert!(resolve_range(&store, None, None).is_err());

        store
            .replace_all(cashwin_engine::history::make_test_draws(20))
            .unwrap();
        let (start, end) = resolve_range(&store, None, None).unwrap();
        assert_eq!(start.to_string(), "2024-01-10");
        assert_eq!(end.to_string(), "2024-01-20");

        let (start, _) = resolve_range(&store, Some("2024-01-05"), None).unwrap();
        assert_eq!(start.to_string(), "2024-01-05");
        assert!(resolve_range(&store, Some("05/01/2024"), None).is_err());
    }
}
