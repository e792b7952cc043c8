use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Franjas horaires d'une journée, dans l'ordre du tirage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    #[serde(rename = "mañana")]
    Morning,
    #[serde(rename = "mediodía")]
    Midday,
    #[serde(rename = "tarde")]
    Afternoon,
    #[serde(rename = "noche")]
    Night,
    #[serde(rename = "madrugada")]
    Dawn,
}

impl Slot {
    pub const ALL: [Slot; 5] = [
        Slot::Morning,
        Slot::Midday,
        Slot::Afternoon,
        Slot::Night,
        Slot::Dawn,
    ];

    /// Position de la franja dans la journée (0 = mañana).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Slot::Morning => "mañana",
            Slot::Midday => "mediodía",
            Slot::Afternoon => "tarde",
            Slot::Night => "noche",
            Slot::Dawn => "madrugada",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Slot {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mañana" | "manana" => Ok(Slot::Morning),
            "mediodía" | "mediodia" => Ok(Slot::Midday),
            "tarde" => Ok(Slot::Afternoon),
            "noche" => Ok(Slot::Night),
            "madrugada" => Ok(Slot::Dawn),
            other => bail!("Franja inconnue : '{}'", other),
        }
    }
}

/// Un tirage historique : date, franja et numéro gagnant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "franja")]
    pub slot: Slot,
    #[serde(rename = "numero")]
    pub number: u32,
}

impl Draw {
    pub fn new(date: NaiveDate, slot: Slot, number: u32) -> Self {
        Self { date, slot, number }
    }

    /// Clé d'ordre chronologique : (date, position de la franja).
    pub fn chrono_key(&self) -> (NaiveDate, usize) {
        (self.date, self.slot.index())
    }
}

/// Enregistrement tel qu'il arrive du fichier ou du CSV, avant validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub fecha: String,
    pub franja: String,
    pub numero: i64,
}

impl RawRecord {
    pub fn into_draw(self) -> Result<Draw> {
        let date = parse_date(&self.fecha)?;
        let slot: Slot = self.franja.parse()?;
        let number = validate_number(self.numero)?;
        Ok(Draw { date, slot, number })
    }
}

/// Parse une date ISO `AAAA-MM-JJ`. Un horodatage avec séparateur `T` est
/// tronqué à sa partie date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let day = raw.split('T').next().unwrap_or_default().trim();
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .with_context(|| format!("Format de date invalide: '{}'", raw))
}

pub fn validate_number(n: i64) -> Result<u32> {
    if n < 0 {
        bail!("Numéro négatif : {}", n);
    }
    u32::try_from(n).with_context(|| format!("Numéro hors limites : {}", n))
}

#[derive(Debug, Clone)]
pub struct NumberStats {
    pub number: u32,
    pub frequency: u32,
    /// Tirages écoulés depuis la dernière apparition.
    pub gap: u32,
    pub last_seen: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct SlotStats {
    pub slot: Slot,
    pub count: u32,
}
