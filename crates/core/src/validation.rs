//! Field-level validation shared by every action handler.
//!
//! Individual checks return `Result<(), String>` with a display-safe message;
//! [`FieldErrors`] collects them so a create or update reports every
//! violation at once instead of stopping at the first.

use std::sync::LazyLock;

use regex::Regex;
use validator::ValidateEmail;

use crate::error::CoreError;
use crate::types::Date;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum length of names and other short identity fields.
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum length of free-text fields (descriptions, observations).
pub const MAX_TEXT_LENGTH: usize = 2_000;

/// Provider commission bounds, in percent.
pub const MIN_COMMISSION: f64 = 0.0;
pub const MAX_COMMISSION: f64 = 100.0;

/// Provider payment-terms bounds, in days.
pub const MIN_PAYMENT_DAYS: i64 = 0;
pub const MAX_PAYMENT_DAYS: i64 = 365;

/// Theme duration bounds, in seconds.
pub const MIN_THEME_DURATION: i64 = 0;
pub const MAX_THEME_DURATION: i64 = 3_600;

static RUT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}(?:\.\d{3}){2}|\d{7,8})-([0-9kK])$").expect("valid RUT pattern")
});

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9][0-9 ()\-]{6,19}$").expect("valid phone pattern")
});

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

/// Accumulates violations across all fields of one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors {
    errors: Vec<String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Record the error of a failed check; ignore a passing one.
    pub fn check(&mut self, result: Result<(), String>) {
        if let Err(message) = result {
            self.errors.push(message);
        }
    }

    /// Merge another collector, prefixing each message (e.g. `detalles[0].`).
    pub fn extend_prefixed(&mut self, prefix: &str, other: FieldErrors) {
        self.errors
            .extend(other.errors.into_iter().map(|e| format!("{prefix}{e}")));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.errors
    }

    pub fn into_result(self) -> Result<(), CoreError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(self.errors))
        }
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// A required text field must be present, non-blank and within `max_len`.
pub fn validate_required_text(field: &str, value: Option<&str>, max_len: usize) -> Result<(), String> {
    match value.map(str::trim) {
        None | Some("") => Err(format!("{field} is required")),
        Some(v) => validate_max_length(field, v, max_len),
    }
}

pub fn validate_max_length(field: &str, value: &str, max_len: usize) -> Result<(), String> {
    if value.chars().count() > max_len {
        return Err(format!("{field} exceeds maximum length of {max_len} characters"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Identity and contact formats
// ---------------------------------------------------------------------------

/// Compute the modulo-11 check digit of a RUT body.
pub fn rut_check_digit(body: u32) -> char {
    let mut sum = 0u32;
    let mut factor = 2u32;
    let mut rest = body;
    while rest > 0 {
        sum += (rest % 10) * factor;
        rest /= 10;
        factor = if factor == 7 { 2 } else { factor + 1 };
    }
    match 11 - (sum % 11) {
        11 => '0',
        10 => 'K',
        d => char::from_digit(d, 10).unwrap_or('0'),
    }
}

/// Validate a Chilean tax id (`12.345.678-5` or `12345678-5`), including
/// its check digit.
pub fn validate_rut(rut: &str) -> Result<(), String> {
    let rut = rut.trim();
    let Some(caps) = RUT_PATTERN.captures(rut) else {
        return Err(format!(
            "rut '{rut}' has an invalid format (expected 12.345.678-5)"
        ));
    };

    let body: u32 = caps[1]
        .replace('.', "")
        .parse()
        .map_err(|_| format!("rut '{rut}' has an invalid format (expected 12.345.678-5)"))?;
    let given = caps[2].to_ascii_uppercase().chars().next().unwrap_or(' ');

    if rut_check_digit(body) != given {
        return Err(format!("rut '{rut}' has an invalid check digit"));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.trim().validate_email() {
        Ok(())
    } else {
        Err(format!("email '{email}' is not a valid address"))
    }
}

pub fn validate_phone(phone: &str) -> Result<(), String> {
    if PHONE_PATTERN.is_match(phone.trim()) {
        Ok(())
    } else {
        Err(format!("telefono '{phone}' is not a valid phone number"))
    }
}

// ---------------------------------------------------------------------------
// Numbers and dates
// ---------------------------------------------------------------------------

pub fn validate_non_negative(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{field} must be greater than or equal to 0"));
    }
    Ok(())
}

pub fn validate_positive(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("{field} must be greater than 0"));
    }
    Ok(())
}

/// Inclusive range check.
pub fn validate_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), String> {
    if !value.is_finite() || value < min || value > max {
        return Err(format!("{field} must be between {min} and {max}"));
    }
    Ok(())
}

pub fn validate_date_order(start: Date, end: Date) -> Result<(), String> {
    if start > end {
        return Err(format!(
            "fecha_inicio ({start}) must be on or before fecha_fin ({end})"
        ));
    }
    Ok(())
}
