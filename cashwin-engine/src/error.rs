use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("données insuffisantes : {found} tirages, {needed} requis")]
    DataInsufficient { needed: usize, found: usize },

    #[error("paramètre {name} invalide : {value} (attendu {range})")]
    ParameterInvalid {
        name: &'static str,
        value: String,
        range: &'static str,
    },

    #[error("date invalide : '{raw}'")]
    DateParseFailure { raw: String },

    #[error("période invalide : début {start} après fin {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Vérifie qu'un paramètre entier est dans `[min, max]`.
pub(crate) fn check_int(name: &'static str, value: usize, min: usize, max: usize, range: &'static str) -> EngineResult<()> {
    if value < min || value > max {
        return Err(EngineError::ParameterInvalid {
            name,
            value: value.to_string(),
            range,
        });
    }
    Ok(())
}

pub(crate) fn check_float(name: &'static str, value: f64, min: f64, max: f64, range: &'static str) -> EngineResult<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(EngineError::ParameterInvalid {
            name,
            value: value.to_string(),
            range,
        });
    }
    Ok(())
}
