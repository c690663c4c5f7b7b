//! Reading caller-supplied parameters.
//!
//! Params arrive as a loose JSON object. A key counts as absent when it is
//! missing or `null`. Typed reads accept the natural JSON type and its
//! string spelling (`"1500"` for a number), so callers translating free text
//! don't have to be exact about JSON types.

use serde_json::Value;

use mediabuy_core::types::{Date, DbId};
use mediabuy_core::validation::FieldErrors;

use crate::envelope::ActionError;

pub type Params = serde_json::Map<String, Value>;

/// Whether `key` is supplied with a non-null value.
pub fn is_present(params: &Params, key: &str) -> bool {
    params.get(key).is_some_and(|v| !v.is_null())
}

/// The subset of `required` that is absent from `params`, in order.
pub fn missing_params(params: &Params, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|key| !is_present(params, key))
        .map(|key| key.to_string())
        .collect()
}

/// Read an id-like parameter that must be present.
pub fn require_id(params: &Params, key: &str) -> Result<DbId, ActionError> {
    match params.get(key) {
        None | Some(Value::Null) => Err(ActionError::invalid(format!("{key} is required"))),
        Some(value) => as_int(value)
            .filter(|id| *id > 0)
            .ok_or_else(|| ActionError::invalid(format!("{key} must be a positive integer id"))),
    }
}

/// Boolean switch such as `force`. Absent or unrecognized means `false`.
pub fn flag(params: &Params, key: &str) -> bool {
    match params.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}

/// Plain text from a param, trimmed. Blank text is treated as absent.
pub fn text_value(params: &Params, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok().filter(|f: &f64| f.is_finite()),
        _ => None,
    }
}

pub(crate) fn as_date(value: &Value) -> Option<Date> {
    let s = value.as_str()?.trim();
    Date::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| {
        // Accept full timestamps by their calendar day.
        let day = s.get(..10)?;
        let rest = s.get(10..11)?;
        if rest == "T" || rest == " " {
            Date::parse_from_str(day, "%Y-%m-%d").ok()
        } else {
            None
        }
    })
}

/// Typed access to params that records type mismatches as field errors.
///
/// Each getter returns `None` both when the key is absent and when the value
/// has the wrong type; in the latter case an error is recorded so the
/// handler can report it with the rest of its validation.
pub struct ParamReader<'a> {
    params: &'a Params,
    errors: FieldErrors,
}

impl<'a> ParamReader<'a> {
    pub fn new(params: &'a Params) -> Self {
        Self {
            params,
            errors: FieldErrors::new(),
        }
    }

    pub fn params(&self) -> &'a Params {
        self.params
    }

    /// Present, non-null and not blank text.
    pub fn has(&self, key: &str) -> bool {
        match self.params.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    fn raw(&self, key: &str) -> Option<&'a Value> {
        match self.params.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(v) => Some(v),
        }
    }

    pub fn text(&mut self, key: &str) -> Option<String> {
        let value = self.raw(key)?;
        match value {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => text_value(self.params, key),
            _ => {
                self.errors.push(format!("{key} must be text"));
                None
            }
        }
    }

    pub fn int(&mut self, key: &str) -> Option<i64> {
        let value = self.raw(key)?;
        let parsed = as_int(value);
        if parsed.is_none() {
            self.errors.push(format!("{key} must be an integer"));
        }
        parsed
    }

    pub fn float(&mut self, key: &str) -> Option<f64> {
        let value = self.raw(key)?;
        let parsed = as_float(value);
        if parsed.is_none() {
            self.errors.push(format!("{key} must be a number"));
        }
        parsed
    }

    pub fn date(&mut self, key: &str) -> Option<Date> {
        let value = self.raw(key)?;
        let parsed = as_date(value);
        if parsed.is_none() {
            self.errors.push(format!("{key} must be a date (YYYY-MM-DD)"));
        }
        parsed
    }

    /// A positive integer reference to another record.
    pub fn id(&mut self, key: &str) -> Option<DbId> {
        let value = self.raw(key)?;
        let parsed = as_int(value).filter(|id| *id > 0);
        if parsed.is_none() {
            self.errors.push(format!("{key} must be a positive integer id"));
        }
        parsed
    }

    /// A list of ids. A single id is accepted as a one-element list.
    pub fn id_list(&mut self, key: &str) -> Option<Vec<DbId>> {
        let value = self.raw(key)?;
        let items: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            single => vec![single],
        };
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            match as_int(item).filter(|id| *id > 0) {
                Some(id) => ids.push(id),
                None => {
                    self.errors.push(format!("{key} must contain only positive integer ids"));
                    return None;
                }
            }
        }
        Some(ids)
    }

    /// The raw array under `key`, or an error when it is not an array.
    pub fn array(&mut self, key: &str) -> Option<&'a Vec<Value>> {
        match self.raw(key)? {
            Value::Array(items) => Some(items),
            _ => {
                self.errors.push(format!("{key} must be a list"));
                None
            }
        }
    }

    pub fn errors_mut(&mut self) -> &mut FieldErrors {
        &mut self.errors
    }

    pub fn finish(self) -> FieldErrors {
        self.errors
    }
}
