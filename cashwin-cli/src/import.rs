use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use cashwin_db::db::DrawStore;
use cashwin_db::models::{Draw, RawRecord};

pub struct ImportResult {
    pub total_records: u32,
    pub imported: u32,
    pub errors: u32,
}

/// Lit un CSV `fecha,franja,numero`. Les lignes invalides sont comptées, jamais
/// corrigées ; toutes les lignes valides sont gardées, doublons compris.
fn read_draws<R: Read>(reader: R) -> (Vec<Draw>, ImportResult) {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut result = ImportResult {
        total_records: 0,
        imported: 0,
        errors: 0,
    };
    let mut draws: Vec<Draw> = Vec::new();

    for record in reader.deserialize::<RawRecord>() {
        result.total_records += 1;
        let parsed = record.map_err(anyhow::Error::from).and_then(RawRecord::into_draw);
        match parsed {
            Ok(draw) => {
                draws.push(draw);
                result.imported += 1;
            }
            Err(e) => {
                log::warn!("Ligne {} ignorée : {:#}", result.total_records + 1, e);
                result.errors += 1;
            }
        }
    }

    (draws, result)
}

/// Remplace tout l'historique par le contenu du fichier.
pub fn import_csv(store: &mut DrawStore, path: &Path) -> Result<ImportResult> {
    let file = std::fs::File::open(path).with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    let (draws, result) = read_draws(file);
    store.replace_all(draws)?;
    Ok(result)
}
