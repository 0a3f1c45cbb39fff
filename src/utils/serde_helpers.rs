use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Deserializes a value, treating empty strings as None.
/// The backend stores some optional fields (receipt URLs, employee links) as "".
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrValue<T> {
        String(String),
        Value(T),
    }

    match Option::<StringOrValue<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(StringOrValue::String(s)) if s.is_empty() => Ok(None),
        Some(StringOrValue::String(s)) => T::deserialize(serde::de::value::StringDeserializer::<D::Error>::new(s)).map(Some),
        Some(StringOrValue::Value(v)) => Ok(Some(v)),
    }
}

/// Parses a user-entered currency amount.
///
/// Thousands separators and a leading `$` are tolerated; anything else that
/// isn't a plain decimal number is a validation error rather than zero.
pub fn parse_amount(field: &str, input: &str) -> Result<Decimal> {
    let cleaned: String = input
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    if cleaned.is_empty() {
        return Err(Error::validation(field, "a numeric amount is required"));
    }

    Decimal::from_str(&cleaned)
        .map_err(|_| Error::validation(field, format!("'{}' is not a numeric amount", input.trim())))
}

/// Parses an amount that must be strictly greater than zero.
pub fn parse_positive_amount(field: &str, input: &str) -> Result<Decimal> {
    let amount = parse_amount(field, input)?;
    if amount <= Decimal::ZERO {
        return Err(Error::validation(field, "amount must be greater than zero"));
    }
    Ok(amount)
}

/// Requires a non-blank value and returns it trimmed.
pub fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(Error::validation(field, "this field is required"))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amounts_tolerate_currency_formatting() {
        assert_eq!(parse_amount("base_salary", " $5,000.50 ").unwrap(), dec!(5000.50));
    }

    #[test]
    fn unparsable_amounts_are_validation_errors() {
        for input in ["", "abc", "12..5", "NaN"] {
            match parse_amount("amount", input) {
                Err(Error::Validation { field, .. }) => assert_eq!(field.as_deref(), Some("amount")),
                other => panic!("expected validation error for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn positive_amounts_reject_zero_and_negatives() {
        assert!(parse_positive_amount("amount", "0").is_err());
        assert!(parse_positive_amount("amount", "-12.50").is_err());
        assert_eq!(parse_positive_amount("amount", "0.01").unwrap(), dec!(0.01));
    }

    #[test]
    fn empty_strings_deserialize_as_none() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default, deserialize_with = "empty_string_as_none")]
            receipt_url: Option<String>,
        }

        let row: Row = serde_json::from_str(r#"{"receipt_url": ""}"#).unwrap();
        assert!(row.receipt_url.is_none());
        let row: Row = serde_json::from_str(r#"{"receipt_url": "https://r/1.png"}"#).unwrap();
        assert_eq!(row.receipt_url.as_deref(), Some("https://r/1.png"));
        let row: Row = serde_json::from_str(r#"{"receipt_url": null}"#).unwrap();
        assert!(row.receipt_url.is_none());
    }
}
