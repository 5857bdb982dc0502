//! Field parsing and validation for imported rows

use chrono::NaiveDate;
use csv::{Reader, StringRecord};

use crate::ImportError;

/// Normalize the header row: trimmed and lower case
pub fn normalize_headers<R: std::io::Read>(rdr: &mut Reader<R>) -> Result<(), ImportError> {
    let headers: StringRecord = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    rdr.set_headers(headers);
    Ok(())
}

pub fn required(value: &str, field: &'static str) -> Result<String, ImportError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ImportError::MissingField(field));
    }
    Ok(value.to_string())
}

/// Check the rough shape of an email address: local@domain.tld
pub fn email(value: &str) -> Result<String, ImportError> {
    let value = required(value, "email")?;
    let invalid = || ImportError::InvalidEmail(value.clone());

    if value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }
    Ok(value.to_lowercase())
}

/// Dates are either ISO (2024-01-31) or day first (31/01/2024)
pub fn date(value: &str) -> Result<Option<NaiveDate>, ImportError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .map(Some)
        .map_err(|_| ImportError::InvalidDate(value.to_string()))
}

/// Parse a positive amount. A comma is taken as decimal
/// separator if there is no dot.
pub fn amount(value: &str) -> Result<f64, ImportError> {
    let raw: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let number = if raw.contains(',') && !raw.contains('.') {
        raw.replace(',', ".")
    } else {
        raw.clone()
    };
    match number.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err(ImportError::InvalidAmount(value.trim().to_string())),
    }
}

/// Reduce a phone number to digits, keeping a leading `+`.
/// Common separators are dropped, anything else is an error.
pub fn phone(value: &str) -> Result<String, ImportError> {
    let value = value.trim();
    let mut phone = String::new();
    for (i, c) in value.chars().enumerate() {
        match c {
            '+' if i == 0 => phone.push(c),
            '0'..='9' => phone.push(c),
            ' ' | '-' | '(' | ')' | '.' => {}
            _ => return Err(ImportError::InvalidPhone(value.to_string())),
        }
    }
    if phone == "+" {
        return Err(ImportError::InvalidPhone(value.to_string()));
    }
    Ok(phone)
}
