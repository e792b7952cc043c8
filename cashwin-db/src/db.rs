use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::models::{Draw, RawRecord};

pub fn db_path() -> PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("resultados.json");
    path
}

/// Stockage plat des tirages : le fichier est lu en entier à l'ouverture et
/// réécrit en entier à chaque mutation.
#[derive(Debug)]
pub struct DrawStore {
    path: PathBuf,
    draws: Vec<Draw>,
    rejected: usize,
}

impl DrawStore {
    /// Ouvre le fichier. Un fichier absent donne un historique vide ; les
    /// enregistrements invalides sont ignorés et comptés.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                path: path.to_path_buf(),
                draws: Vec::new(),
                rejected: 0,
            });
        }

        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire {:?}", path))?;
        let values: Vec<serde_json::Value> = serde_json::from_str(&json)
            .with_context(|| format!("JSON invalide dans {:?}", path))?;

        let mut draws = Vec::with_capacity(values.len());
        let mut rejected = 0;
        for (i, value) in values.into_iter().enumerate() {
            let parsed = serde_json::from_value::<RawRecord>(value)
                .map_err(anyhow::Error::from)
                .and_then(RawRecord::into_draw);
            match parsed {
                Ok(draw) => draws.push(draw),
                Err(e) => {
                    log::warn!("Enregistrement {} ignoré : {:#}", i, e);
                    rejected += 1;
                }
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            draws,
            rejected,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tirages dans l'ordre d'insertion.
    pub fn draws(&self) -> &[Draw] {
        &self.draws
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn count(&self) -> usize {
        self.draws.len()
    }

    /// Ajoute un tirage. Retourne `false` si un enregistrement identique existe déjà.
    pub fn insert(&mut self, draw: Draw) -> Result<bool> {
        if self.draws.contains(&draw) {
            return Ok(false);
        }
        self.draws.push(draw);
        self.save()?;
        Ok(true)
    }

    /// Supprime le tirage à la position `index` (ordre d'insertion).
    pub fn delete(&mut self, index: usize) -> Result<Draw> {
        if index >= self.draws.len() {
            bail!("Position {} hors limites (0-{})", index, self.draws.len().saturating_sub(1));
        }
        let removed = self.draws.remove(index);
        self.save()?;
        Ok(removed)
    }

    /// Remplace tout l'historique (chargement en masse).
    pub fn replace_all(&mut self, draws: Vec<Draw>) -> Result<()> {
        self.draws = draws;
        self.save()
    }

    /// Les `limit` derniers tirages insérés, le plus récent d'abord, avec leur position.
    pub fn last(&self, limit: usize) -> Vec<(usize, &Draw)> {
        self.draws.iter().enumerate().rev().take(limit).collect()
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(&self.draws)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Impossible d'écrire {:?}", self.path))?;
        log::info!("{} tirages sauvegardés dans {:?}", self.draws.len(), self.path);
        Ok(())
    }
}
