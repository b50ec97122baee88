//! Trade submission validation.
//!
//! Narrows an untyped JSON object into a [`ValidatedTrade`]. Fields are
//! checked in a fixed order and the first violation is returned.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use super::error::JournalError;
use super::pnl::{self, Outcome};

/// Inbound submission as received from the client.
pub type RawSubmission = Map<String, Value>;

pub mod fields {
    pub const CRYPTO_NAME: &str = "cryptoName";
    pub const ENTRY_DATE: &str = "entryDate";
    pub const EXIT_DATE: &str = "exitDate";
    pub const ENTRY_PRICE: &str = "entryPrice";
    pub const EXIT_PRICE: &str = "exitPrice";
    pub const POSITION_SIZE: &str = "positionSize";
    pub const PNL: &str = "pnl";
    pub const REASON: &str = "reason";
    pub const NOTES: &str = "notes";
}

use fields::*;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTrade {
    pub crypto_name: String,
    pub entry_date: DateTime<Utc>,
    pub exit_date: Option<DateTime<Utc>>,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub position_size: f64,
    pub pnl: f64,
    pub outcome: Outcome,
    pub reason: String,
    pub notes: Option<String>,
}

pub fn validate(candidate: &RawSubmission) -> Result<ValidatedTrade, JournalError> {
    let crypto_name = required_text(candidate, CRYPTO_NAME)?;
    let entry_date = required_date(candidate, ENTRY_DATE)?;
    let entry_price = required_number(candidate, ENTRY_PRICE)?;
    let position_size = required_number(candidate, POSITION_SIZE)?;
    let reason = required_text(candidate, REASON)?;

    let exit_date = optional_date(candidate, EXIT_DATE)?;
    let exit_price = optional_number(candidate, EXIT_PRICE)?;
    if exit_date.is_some() != exit_price.is_some() {
        return Err(JournalError::IncompleteExit);
    }
    if let Some(exit_date) = exit_date {
        if exit_date < entry_date {
            return Err(JournalError::ExitBeforeEntry);
        }
    }

    let notes = optional_text(candidate, NOTES)?;

    let (computed_pnl, _) = pnl::compute(entry_price, exit_price, position_size);
    let supplied_pnl = optional_number(candidate, PNL)?;
    let pnl = match (exit_price, supplied_pnl) {
        (Some(_), Some(supplied)) => supplied,
        _ => computed_pnl,
    };
    // Finite inputs can still overflow, e.g. (1e308 - -1e308) * 2.
    if !pnl.is_finite() {
        return Err(JournalError::invalid_number(PNL));
    }

    Ok(ValidatedTrade {
        crypto_name,
        entry_date,
        exit_date,
        entry_price,
        exit_price,
        position_size,
        pnl,
        outcome: Outcome::from_pnl(pnl),
        reason,
        notes,
    })
}

/// Parses the timestamp formats accepted for trade dates. Naive values are
/// taken as UTC.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Missing keys, `null` and blank strings all count as absent.
fn present<'a>(candidate: &'a RawSubmission, field: &str) -> Option<&'a Value> {
    match candidate.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => Some(value),
    }
}

fn required_text(candidate: &RawSubmission, field: &str) -> Result<String, JournalError> {
    optional_text(candidate, field)?.ok_or_else(|| JournalError::missing(field))
}

fn optional_text(candidate: &RawSubmission, field: &str) -> Result<Option<String>, JournalError> {
    match present(candidate, field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(_) => Err(JournalError::InvalidField {
            field: field.to_string(),
        }),
    }
}

fn required_number(candidate: &RawSubmission, field: &str) -> Result<f64, JournalError> {
    optional_number(candidate, field)?.ok_or_else(|| JournalError::missing(field))
}

fn optional_number(candidate: &RawSubmission, field: &str) -> Result<Option<f64>, JournalError> {
    let Some(value) = present(candidate, field) else {
        return Ok(None);
    };
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(JournalError::invalid_number(field)),
    }
}

fn required_date(candidate: &RawSubmission, field: &str) -> Result<DateTime<Utc>, JournalError> {
    optional_date(candidate, field)?.ok_or_else(|| JournalError::missing(field))
}

fn optional_date(
    candidate: &RawSubmission,
    field: &str,
) -> Result<Option<DateTime<Utc>>, JournalError> {
    match present(candidate, field) {
        None => Ok(None),
        Some(Value::String(s)) => parse_timestamp(s).map(Some).ok_or_else(|| {
            JournalError::InvalidDate {
                field: field.to_string(),
            }
        }),
        Some(_) => Err(JournalError::InvalidDate {
            field: field.to_string(),
        }),
    }
}
