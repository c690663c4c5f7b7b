//! Purchase order numbering: `ORD-YYYYMMDD-####`, one sequence per day.
//!
//! The next number is derived from the highest number already issued for
//! the day. Reading that number and inserting the new order are separate
//! store calls, so concurrent creators can compute the same value.

use crate::error::CoreError;
use crate::types::Date;

pub const ORDER_NUMBER_PREFIX: &str = "ORD";

/// Highest sequence representable with four digits.
pub const MAX_DAILY_SEQUENCE: u32 = 9_999;

/// The `ORD-YYYYMMDD-` prefix shared by every order issued on `date`.
pub fn day_prefix(date: Date) -> String {
    format!("{ORDER_NUMBER_PREFIX}-{}-", date.format("%Y%m%d"))
}

pub fn format_order_number(date: Date, sequence: u32) -> String {
    format!("{}{sequence:04}", day_prefix(date))
}

/// Extract the sequence from a number issued on `date`.
///
/// Returns `None` for numbers from other days or with a malformed suffix.
pub fn parse_sequence(number: &str, date: Date) -> Option<u32> {
    let suffix = number.strip_prefix(&day_prefix(date))?;
    if suffix.len() != 4 || !suffix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Compute the number following `last_issued` (the highest number issued on
/// `date`, if any).
pub fn next_order_number(date: Date, last_issued: Option<&str>) -> Result<String, CoreError> {
    let last = last_issued
        .and_then(|n| parse_sequence(n, date))
        .unwrap_or(0);
    if last >= MAX_DAILY_SEQUENCE {
        return Err(CoreError::SequenceExhausted(day_prefix(date)));
    }
    Ok(format_order_number(date, last + 1))
}

/// Whether `number` has the `ORD-YYYYMMDD-####` shape.
pub fn is_well_formed(number: &str) -> bool {
    let parts: Vec<&str> = number.split('-').collect();
    matches!(
        parts.as_slice(),
        [prefix, day, seq]
            if *prefix == ORDER_NUMBER_PREFIX
                && day.len() == 8
                && seq.len() == 4
                && day.chars().chain(seq.chars()).all(|c| c.is_ascii_digit())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> Date {
        Date::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn first_number_of_the_day_is_one() {
        assert_eq!(next_order_number(day(), None).unwrap(), "ORD-20261016-0001");
    }

    #[test]
    fn increments_the_highest_issued_number() {
        assert_eq!(
            next_order_number(day(), Some("ORD-20261016-0041")).unwrap(),
            "ORD-20261016-0042"
        );
    }

    #[test]
    fn numbers_from_other_days_restart_the_sequence() {
        assert_eq!(
            next_order_number(day(), Some("ORD-20261015-0099")).unwrap(),
            "ORD-20261016-0001"
        );
    }

    #[test]
    fn exhausted_sequence_is_an_error() {
        assert_eq!(
            next_order_number(day(), Some("ORD-20261016-9999")),
            Err(CoreError::SequenceExhausted("ORD-20261016-".to_string()))
        );
    }

    #[test]
    fn parse_rejects_malformed_suffix() {
        assert_eq!(parse_sequence("ORD-20261016-12", day()), None);
        assert_eq!(parse_sequence("ORD-20261016-00a1", day()), None);
        assert_eq!(parse_sequence("ORD-20261016-0007", day()), Some(7));
    }

    #[test]
    fn well_formed_shape() {
        assert!(is_well_formed("ORD-20261016-0001"));
        assert!(!is_well_formed("ORD-2026106-0001"));
        assert!(!is_well_formed("PO-20261016-0001"));
    }
}
